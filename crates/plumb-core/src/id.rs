use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Slot handle of a pipe in dense storage. Valid only until the next
    /// structural mutation of the owning network.
    pub struct PipeKey;

    /// Slot handle of a junction in dense storage. Valid only until the next
    /// structural mutation of the owning network.
    pub struct JunctionKey;
}

/// Permanent identity of a pipe. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipeId(pub u64);

/// Permanent identity of a pipe junction. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JunctionId(pub u64);

/// Identifies a machine in the vehicle's part hierarchy. Owned by the vehicle,
/// not by the plumbing network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u64);

/// Retainable identity of anything that occupies the plumbing grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementId {
    Machine(MachineId),
    Junction(JunctionId),
}

impl From<MachineId> for ElementId {
    fn from(id: MachineId) -> Self {
        ElementId::Machine(id)
    }
}

impl From<JunctionId> for ElementId {
    fn from(id: JunctionId) -> Self {
        ElementId::Junction(id)
    }
}
