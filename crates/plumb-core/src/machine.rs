//! Seams to the vehicle and its machines.
//!
//! Machines belong to the vehicle's part hierarchy, not to the plumbing
//! network. The network only ever holds [`MachineId`]s and resolves them
//! through a [`PlumbingHost`] on each access, the same way it resolves its
//! own pipes and junctions through ids.

use crate::grid::{GridPos, GridRect, GridSize, PortPosition, Rotation};
use crate::id::MachineId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// A named attachment point where a pipe may terminate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidPort {
    pub name: String,
    /// Anchor inside the unrotated footprint of its owner.
    pub pos: PortPosition,
}

impl FluidPort {
    pub fn new(name: impl Into<String>, pos: PortPosition) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }
}

// ---------------------------------------------------------------------------
// Machine trait
// ---------------------------------------------------------------------------

/// A vehicle part capability exposing fluid ports.
///
/// Flow values are rates (volume per second). The solver reads
/// `available_flow` and `accept_flow` once per port per tick and writes the
/// realized rate back through `push_flow`.
pub trait PlumbingMachine {
    fn id(&self) -> MachineId;

    fn fluid_ports(&self) -> &[FluidPort];

    fn plumbing_pos(&self) -> GridPos;

    fn plumbing_rotation(&self) -> Rotation;

    /// Unrotated footprint on the plumbing grid. A zero size means the
    /// machine has no plumbing and takes no grid space.
    fn plumbing_size(&self) -> GridSize;

    /// Rate at which the machine can push fluid out through `port`.
    fn available_flow(&self, port: &str) -> f32;

    /// Rate at which the machine can take fluid in through `port`.
    fn accept_flow(&self, port: &str) -> f32;

    /// Apply the realized rate for this tick. Positive values flow into the
    /// machine, negative values out of it.
    fn push_flow(&mut self, port: &str, rate: f32, dt: f32);

    fn has_plumbing(&self) -> bool {
        !self.plumbing_size().is_empty()
    }

    fn find_port(&self, name: &str) -> Option<&FluidPort> {
        self.fluid_ports().iter().find(|p| p.name == name)
    }

    /// Occupied rectangle after rotation.
    fn plumbing_rect(&self) -> GridRect {
        GridRect::new(
            self.plumbing_pos(),
            self.plumbing_size().rotated(self.plumbing_rotation()),
        )
    }
}

// ---------------------------------------------------------------------------
// Host trait
// ---------------------------------------------------------------------------

/// The vehicle that owns the machines a plumbing network connects.
pub trait PlumbingHost {
    /// Every machine of the vehicle, in a stable order.
    fn machine_ids(&self) -> Vec<MachineId>;

    fn machine(&self, id: MachineId) -> Option<&dyn PlumbingMachine>;

    fn machine_mut(&mut self, id: MachineId) -> Option<&mut dyn PlumbingMachine>;
}
