//! Snapshot export and import for a plumbing network.
//!
//! A snapshot holds only the persisted relationships: ids, endpoints, port
//! names, surfaces, waypoints, junction placement and junction port order.
//! Slot handles and per-tick flows are derived state and are rebuilt or
//! reset on import. Binary encoding uses `bitcode` behind a versioned header.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::{GridPos, Rotation};
use crate::id::{JunctionId, MachineId, PipeId};
use crate::junction::PipeJunction;
use crate::pipe::Pipe;
use crate::plumbing::VehiclePlumbing;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a plumbing snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x9105_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors from decoding or importing a snapshot. Import never yields a
/// partially restored network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("pipe id {0:?} appears more than once")]
    DuplicatePipeId(PipeId),
    #[error("junction id {0:?} appears more than once")]
    DuplicateJunctionId(JunctionId),
    #[error("pipe id {0:?} was never allocated by the snapshot's counter")]
    UnallocatedPipeId(PipeId),
    #[error("junction id {0:?} was never allocated by the snapshot's counter")]
    UnallocatedJunctionId(JunctionId),
    #[error("pipe {pipe:?} references missing junction {junction:?}")]
    DanglingJunction { pipe: PipeId, junction: JunctionId },
    #[error("pipe {pipe:?} and junction {junction:?} disagree about their link")]
    BrokenBackReference { pipe: PipeId, junction: JunctionId },
    #[error("junction pipe {0:?} also names a machine on its junction side")]
    MachineOnJunctionSide(PipeId),
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl SnapshotHeader {
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Persisted fields of one pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeRecord {
    pub id: PipeId,
    pub ma: Option<MachineId>,
    pub mb: Option<MachineId>,
    pub junction: Option<JunctionId>,
    pub port_a: String,
    pub port_b: String,
    pub surface: f32,
    pub waypoints: Vec<GridPos>,
}

/// Persisted fields of one junction. `pipes` is in port order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionRecord {
    pub id: JunctionId,
    /// `None` for a junction that is off the grid.
    pub pos: Option<GridPos>,
    pub rotation: Rotation,
    pub pipes: Vec<PipeId>,
}

/// Everything needed to restore a network, including both id counters so
/// ids stay unique across save and load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlumbingSnapshot {
    pub header: SnapshotHeader,
    pub next_pipe_id: u64,
    pub next_junction_id: u64,
    pub pipes: Vec<PipeRecord>,
    pub junctions: Vec<JunctionRecord>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_snapshot(snapshot: &PlumbingSnapshot) -> Result<(), DeserializeError> {
    snapshot.header.validate()?;

    let mut pipes = BTreeMap::new();
    for record in &snapshot.pipes {
        if record.id.0 >= snapshot.next_pipe_id {
            return Err(DeserializeError::UnallocatedPipeId(record.id));
        }
        if pipes.insert(record.id, record).is_some() {
            return Err(DeserializeError::DuplicatePipeId(record.id));
        }
    }
    let mut junctions = BTreeMap::new();
    for record in &snapshot.junctions {
        if record.id.0 >= snapshot.next_junction_id {
            return Err(DeserializeError::UnallocatedJunctionId(record.id));
        }
        if junctions.insert(record.id, record).is_some() {
            return Err(DeserializeError::DuplicateJunctionId(record.id));
        }
    }

    for record in &snapshot.pipes {
        let Some(junction_id) = record.junction else {
            continue;
        };
        if record.ma.is_some() {
            return Err(DeserializeError::MachineOnJunctionSide(record.id));
        }
        let junction = junctions.get(&junction_id).ok_or(DeserializeError::DanglingJunction {
            pipe: record.id,
            junction: junction_id,
        })?;
        if !junction.pipes.contains(&record.id) {
            return Err(DeserializeError::BrokenBackReference {
                pipe: record.id,
                junction: junction_id,
            });
        }
    }

    for junction in &snapshot.junctions {
        let mut seen = BTreeSet::new();
        for &pipe_id in &junction.pipes {
            let linked = pipes.get(&pipe_id).is_some_and(|p| p.junction == Some(junction.id));
            if !linked || !seen.insert(pipe_id) {
                return Err(DeserializeError::BrokenBackReference {
                    pipe: pipe_id,
                    junction: junction.id,
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

impl VehiclePlumbing {
    /// Capture the persisted state, pipes and junctions in id order.
    pub fn export(&self) -> PlumbingSnapshot {
        PlumbingSnapshot {
            header: SnapshotHeader::default(),
            next_pipe_id: self.next_pipe_id().0,
            next_junction_id: self.next_junction_id().0,
            pipes: self
                .pipes()
                .map(|p| PipeRecord {
                    id: p.id(),
                    ma: p.ma(),
                    mb: p.mb,
                    junction: p.junction_id(),
                    port_a: p.port_a.clone(),
                    port_b: p.port_b.clone(),
                    surface: p.surface,
                    waypoints: p.waypoints.clone(),
                })
                .collect(),
            junctions: self
                .junctions()
                .map(|j| JunctionRecord {
                    id: j.id(),
                    pos: j.pos,
                    rotation: j.rotation,
                    pipes: j.pipe_ids().to_vec(),
                })
                .collect(),
        }
    }

    /// Restore a network from a snapshot with the default configuration.
    ///
    /// The snapshot is validated as a whole first; on error nothing is
    /// built. Flows start at zero and slot handles are rebuilt.
    pub fn import(snapshot: PlumbingSnapshot) -> Result<Self, DeserializeError> {
        validate_snapshot(&snapshot)?;

        let pipes = snapshot
            .pipes
            .into_iter()
            .map(|record| {
                let mut pipe = Pipe::new(record.id);
                pipe.set_ma_unchecked(record.ma);
                pipe.mb = record.mb;
                pipe.set_junction_id(record.junction);
                pipe.port_a = record.port_a;
                pipe.port_b = record.port_b;
                pipe.surface = record.surface;
                pipe.waypoints = record.waypoints;
                pipe
            })
            .collect();
        let junctions = snapshot
            .junctions
            .into_iter()
            .map(|record| {
                let mut junction = PipeJunction::new(record.id);
                junction.pos = record.pos;
                junction.rotation = record.rotation;
                for pipe in record.pipes {
                    junction.push_pipe_id(pipe);
                }
                junction
            })
            .collect();

        let plumbing = Self::restore(
            Default::default(),
            snapshot.next_pipe_id,
            snapshot.next_junction_id,
            pipes,
            junctions,
        );
        log::debug!(
            "imported plumbing: {} pipe(s), {} junction(s)",
            plumbing.pipe_count(),
            plumbing.junction_count()
        );
        Ok(plumbing)
    }

    /// Encode the network as a binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(&self.export()).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode a network from a binary blob.
    ///
    /// Checks the header before importing; returns an error, never panics,
    /// on foreign or corrupted data.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: PlumbingSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        Self::import(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
