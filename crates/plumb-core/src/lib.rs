//! Plumb Core -- the fluid plumbing network of an assembled vehicle.
//!
//! Machines (tanks, engines, pumps) are joined by pipes, either directly or
//! through junctions. The network lives in two views that must agree: a 2D
//! integer grid used for placement, and a connectivity graph walked by the
//! per-tick flow solver.
//!
//! # Identity and rebuild
//!
//! Pipes and junctions are addressed by permanent ids ([`id::PipeId`],
//! [`id::JunctionId`]) that are never reused. Internally they sit in dense
//! slot storage, and every structural mutation ends with one rebuild pass
//! that re-derives the slot handles from the ids:
//!
//! ```rust,ignore
//! let j = plumbing.create_pipe_junction();
//! let pipe = plumbing.create_pipe();
//! plumbing.get_pipe_mut(pipe).unwrap().mb = Some(tank);
//! plumbing.connect_junction(pipe, j)?;
//! plumbing.update_pipes(dt, &mut vehicle);
//! ```
//!
//! # Key Types
//!
//! - [`plumbing::VehiclePlumbing`] -- Storage, lookup, mutation and rebuild.
//! - [`pipe::Pipe`] / [`junction::PipeJunction`] -- The network entities.
//! - [`element::PlumbingElement`] -- Borrowed view over a machine or junction
//!   for grid code.
//! - [`machine::PlumbingMachine`] / [`machine::PlumbingHost`] -- What the
//!   network needs from machines and from the vehicle that owns them.
//! - [`solver`] -- Per-tick flow computation.
//! - [`spatial`] -- Overlap queries, free-space search and checked placement.
//! - [`serialize`] -- Versioned snapshots via bitcode.

pub mod config;
pub mod element;
pub mod grid;
pub mod id;
pub mod junction;
pub mod machine;
pub mod pipe;
pub mod plumbing;
pub mod serialize;
pub mod solver;
pub mod spatial;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::PlumbingConfig;
pub use element::PlumbingElement;
pub use id::{ElementId, JunctionId, MachineId, PipeId};
pub use plumbing::{PlumbingError, VehiclePlumbing};
