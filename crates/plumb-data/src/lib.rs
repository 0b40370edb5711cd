//! Data-file loading for plumb-core: reads [`PlumbingConfig`] from RON, TOML
//! or JSON.
//!
//! [`PlumbingConfig`]: plumb_core::config::PlumbingConfig

pub mod loader;

pub use loader::{
    CONFIG_BASE_NAME, DataLoadError, Format, detect_format, find_config, load_config, load_config_from_dir,
    parse_config,
};
