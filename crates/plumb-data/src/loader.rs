//! Reads a [`PlumbingConfig`] from a RON, TOML or JSON file and rejects
//! settings the solver and placement code cannot work with.

use plumb_core::config::PlumbingConfig;
use std::path::{Path, PathBuf};

/// Base name looked up by [`load_config_from_dir`].
pub const CONFIG_BASE_NAME: &str = "plumbing";

// ===========================================================================
// Errors
// ===========================================================================

/// Why a plumbing configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// Extension is not `ron`, `toml` or `json`.
    #[error("{} is not a .ron, .toml or .json file", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Two files claim the same base name.
    #[error("both {} and {} define the plumbing config", first.display(), second.display())]
    ConflictingFormats { first: PathBuf, second: PathBuf },

    #[error("{format:?} syntax error in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: Format,
        message: String,
    },

    /// Well-formed, but a setting is out of range.
    #[error("{field} in {} {reason}", path.display())]
    InvalidValue {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

// ===========================================================================
// Formats
// ===========================================================================

/// Text formats a config file may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order used by [`find_config`].
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Pick the format from the file extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Format::from_extension)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// The one `{base_name}.<ext>` file in `dir`, for any supported extension.
///
/// `Ok(None)` when there is none; two or more is a conflict.
pub fn find_config(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|candidate| candidate.is_file());

    let Some(first) = present.next() else {
        return Ok(None);
    };
    match present.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats { first, second }),
        None => Ok(Some(first)),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Parse and range-check config text. `path` only labels errors.
pub fn parse_config(content: &str, format: Format, path: &Path) -> Result<PlumbingConfig, DataLoadError> {
    let parsed: Result<PlumbingConfig, String> = match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    let config = parsed.map_err(|message| DataLoadError::Parse {
        path: path.to_path_buf(),
        format,
        message,
    })?;
    validate_config(&config, path)?;
    Ok(config)
}

/// Load one config file. Settings it leaves out keep their defaults.
pub fn load_config(path: &Path) -> Result<PlumbingConfig, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, format, path)?;
    log::debug!("loaded plumbing config from {}", path.display());
    Ok(config)
}

/// Load `plumbing.{ron,toml,json}` from `dir`, or the defaults if there is
/// no such file.
pub fn load_config_from_dir(dir: &Path) -> Result<PlumbingConfig, DataLoadError> {
    match find_config(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_config(&path),
        None => {
            log::debug!("no plumbing config in {}, using defaults", dir.display());
            Ok(PlumbingConfig::default())
        }
    }
}

fn validate_config(config: &PlumbingConfig, path: &Path) -> Result<(), DataLoadError> {
    let invalid = |field: &'static str, reason: String| DataLoadError::InvalidValue {
        path: path.to_path_buf(),
        field,
        reason,
    };
    if config.connection_margin < 0 {
        return Err(invalid(
            "connection_margin",
            format!("must not be negative, got {}", config.connection_margin),
        ));
    }
    if config.free_space_search_limit <= 0 {
        return Err(invalid(
            "free_space_search_limit",
            format!("must be positive, got {}", config.free_space_search_limit),
        ));
    }
    if let Some(rate) = config.flow_per_surface
        && !(rate.is_finite() && rate >= 0.0)
    {
        return Err(invalid(
            "flow_per_surface",
            format!("must be finite and not negative, got {rate}"),
        ));
    }
    if !(config.min_surface.is_finite() && config.min_surface >= 0.0) {
        return Err(invalid(
            "min_surface",
            format!("must be finite and not negative, got {}", config.min_surface),
        ));
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
