//! Pipes: fluid connections between two machines, or a junction and a machine.

use crate::grid::GridPos;
use crate::id::{JunctionId, JunctionKey, MachineId, PipeId};
use crate::plumbing::PlumbingError;

/// Surface given to freshly created pipes.
pub const DEFAULT_SURFACE: f32 = 1.0;

/// A fluid connection.
///
/// A pipe joins either a machine to a machine, or a junction to a machine.
/// When a junction is present it sits on the "a" side and `ma` is empty;
/// junction-to-junction links are not representable. While a pipe is being
/// drawn in the editor either machine may still be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    id: PipeId,
    /// Machine on the "a" side. Set through [`Pipe::set_ma`], which keeps it
    /// empty on junction pipes.
    ma: Option<MachineId>,
    pub mb: Option<MachineId>,
    junction_id: Option<JunctionId>,
    /// Frame-scoped handle derived from `junction_id` by the rebuild pass.
    junction: Option<JunctionKey>,
    pub port_a: String,
    pub port_b: String,
    /// Cross-section, used as the flow distribution weight.
    pub surface: f32,
    /// Signed rate for the current tick, positive from a to b.
    pub flow: f32,
    /// Editor-only routing points, persisted for display continuity.
    pub waypoints: Vec<GridPos>,
}

impl Pipe {
    pub(crate) fn new(id: PipeId) -> Self {
        Self {
            id,
            ma: None,
            mb: None,
            junction_id: None,
            junction: None,
            port_a: String::new(),
            port_b: String::new(),
            surface: DEFAULT_SURFACE,
            flow: 0.0,
            waypoints: Vec::new(),
        }
    }

    pub fn id(&self) -> PipeId {
        self.id
    }

    pub fn ma(&self) -> Option<MachineId> {
        self.ma
    }

    /// Set the "a" side machine. Rejected on a junction pipe when `machine`
    /// is `Some`, since the junction owns that side.
    pub fn set_ma(&mut self, machine: Option<MachineId>) -> Result<(), PlumbingError> {
        if machine.is_some() && self.junction_id.is_some() {
            return Err(PlumbingError::JunctionOnMachineSide(self.id));
        }
        self.ma = machine;
        Ok(())
    }

    /// Unchecked setter for callers that already know the pipe is free.
    pub(crate) fn set_ma_unchecked(&mut self, machine: Option<MachineId>) {
        self.ma = machine;
    }

    pub fn junction_id(&self) -> Option<JunctionId> {
        self.junction_id
    }

    /// Slot handle of the junction, valid until the next structural mutation.
    pub fn junction_key(&self) -> Option<JunctionKey> {
        self.junction
    }

    pub(crate) fn set_junction_id(&mut self, junction: Option<JunctionId>) {
        self.junction_id = junction;
    }

    pub(crate) fn set_junction_key(&mut self, key: Option<JunctionKey>) {
        self.junction = key;
    }

    /// Both ends are machines.
    pub fn is_machine_to_machine(&self) -> bool {
        self.junction_id.is_none() && self.ma.is_some() && self.mb.is_some()
    }

    /// True if either end is the given machine.
    pub fn connects(&self, machine: MachineId) -> bool {
        self.ma == Some(machine) || self.mb == Some(machine)
    }

    /// The machine and port on the opposite end from `machine`.
    pub fn other_end(&self, machine: MachineId) -> Option<(MachineId, &str)> {
        if self.ma == Some(machine) {
            self.mb.map(|m| (m, self.port_b.as_str()))
        } else if self.mb == Some(machine) {
            self.ma.map(|m| (m, self.port_a.as_str()))
        } else {
            None
        }
    }

    /// Swap the roles of the two ends. Not a structural mutation.
    ///
    /// Rejected for pipes attached to a junction, which must stay on the
    /// "a" side.
    pub fn invert(&mut self) -> Result<(), PlumbingError> {
        if self.junction_id.is_some() {
            return Err(PlumbingError::InvertJunctionPipe(self.id));
        }
        std::mem::swap(&mut self.ma, &mut self.mb);
        std::mem::swap(&mut self.port_a, &mut self.port_b);
        self.waypoints.reverse();
        self.flow = -self.flow;
        Ok(())
    }
}
