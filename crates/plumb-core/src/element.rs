//! A uniform read-only view over machines and junctions for grid code.
//!
//! Elements borrow both the network and the vehicle that produced them, so
//! the borrow checker ends their life before any structural mutation. Keep
//! an [`ElementId`] instead when something must be remembered across edits.

use std::fmt;

use crate::grid::{GridPos, GridRect, GridSize, PortPosition, Rotation};
use crate::id::{ElementId, JunctionId, MachineId};
use crate::junction::PipeJunction;
use crate::machine::{FluidPort, PlumbingMachine};

/// One thing that occupies the plumbing grid, or nothing.
#[derive(Clone, Copy, Default)]
pub enum PlumbingElement<'a> {
    #[default]
    Empty,
    Machine(&'a dyn PlumbingMachine),
    Junction(&'a PipeJunction),
}

impl fmt::Debug for PlumbingElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlumbingElement::Empty => f.write_str("Empty"),
            PlumbingElement::Machine(m) => f.debug_tuple("Machine").field(&m.id()).finish(),
            PlumbingElement::Junction(j) => f.debug_tuple("Junction").field(&j.id()).finish(),
        }
    }
}

impl<'a> PlumbingElement<'a> {
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            PlumbingElement::Empty => None,
            PlumbingElement::Machine(m) => Some(ElementId::Machine(m.id())),
            PlumbingElement::Junction(j) => Some(ElementId::Junction(j.id())),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PlumbingElement::Empty)
    }

    /// Every port with its grid-space anchor, after rotation and translation.
    pub fn ports(&self) -> Vec<(FluidPort, PortPosition)> {
        match self {
            PlumbingElement::Empty => Vec::new(),
            PlumbingElement::Machine(m) => {
                let rotation = m.plumbing_rotation();
                let size = m.plumbing_size();
                let pos = m.plumbing_pos();
                m.fluid_ports()
                    .iter()
                    .map(|port| {
                        let at = rotation.rotate_point(port.pos, size).translated(pos);
                        (port.clone(), at)
                    })
                    .collect()
            }
            PlumbingElement::Junction(j) => j
                .ports()
                .into_iter()
                .map(|port| {
                    let at = j.place_port(port.pos);
                    (port, at)
                })
                .collect(),
        }
    }

    /// Footprint grown by `margin` cells per side, optionally rotated.
    pub fn size(&self, margin: i32, rotate: bool) -> GridSize {
        match self {
            PlumbingElement::Empty => GridSize::ZERO,
            PlumbingElement::Machine(m) => {
                let base = m.plumbing_size();
                let grown = GridSize::new(base.width + 2 * margin, base.height + 2 * margin);
                if rotate {
                    grown.rotated(m.plumbing_rotation())
                } else {
                    grown
                }
            }
            PlumbingElement::Junction(j) => j.size(margin, rotate),
        }
    }

    pub fn pos(&self) -> GridPos {
        match self {
            PlumbingElement::Empty => GridPos::ORIGIN,
            PlumbingElement::Machine(m) => m.plumbing_pos(),
            PlumbingElement::Junction(j) => j.pos.unwrap_or(GridPos::ORIGIN),
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            PlumbingElement::Empty => Rotation::None,
            PlumbingElement::Machine(m) => m.plumbing_rotation(),
            PlumbingElement::Junction(j) => j.rotation,
        }
    }

    /// Occupied rectangle, grown by `margin` cells per side. Empty for
    /// [`PlumbingElement::Empty`] and for a junction that is off the grid.
    pub fn rect(&self, margin: i32) -> GridRect {
        match self {
            PlumbingElement::Empty => GridRect::default(),
            PlumbingElement::Junction(j) => j.rect().map(|r| r.expanded(margin)).unwrap_or_default(),
            PlumbingElement::Machine(_) => GridRect::new(self.pos(), self.size(0, true)).expanded(margin),
        }
    }

    pub fn as_machine(&self) -> Option<&'a dyn PlumbingMachine> {
        match *self {
            PlumbingElement::Machine(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_junction(&self) -> Option<&'a PipeJunction> {
        match *self {
            PlumbingElement::Junction(j) => Some(j),
            _ => None,
        }
    }
}

impl PartialEq for PlumbingElement<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.element_id() == other.element_id()
    }
}

impl PartialEq<MachineId> for PlumbingElement<'_> {
    fn eq(&self, other: &MachineId) -> bool {
        self.element_id() == Some(ElementId::Machine(*other))
    }
}

impl PartialEq<JunctionId> for PlumbingElement<'_> {
    fn eq(&self, other: &JunctionId) -> bool {
        self.element_id() == Some(ElementId::Junction(*other))
    }
}

impl PartialEq<ElementId> for PlumbingElement<'_> {
    fn eq(&self, other: &ElementId) -> bool {
        self.element_id() == Some(*other)
    }
}
