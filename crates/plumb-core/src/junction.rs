//! Pipe junctions: machine-less nodes that split and merge flow.
//!
//! A junction grows with its port count. Ports are numbered by the order in
//! which pipes were attached; even ports sit on the top edge and odd ports
//! on the bottom edge, two per column.
//!
//! A junction created without a position is off the grid: it takes part in
//! flow but occupies no cells until it is placed.

use crate::grid::{GridPos, GridRect, GridSize, PortPosition, Rotation};
use crate::id::{JunctionId, PipeId, PipeKey};
use crate::machine::FluidPort;

/// A connection point with no storage of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeJunction {
    id: JunctionId,
    /// Top-left cell, or `None` while the junction is not on the grid.
    pub pos: Option<GridPos>,
    pub rotation: Rotation,
    /// Incident pipes in port order. This is the persisted relationship.
    pipes_id: Vec<PipeId>,
    /// Frame-scoped handles derived from `pipes_id`, same order.
    pipes: Vec<PipeKey>,
}

impl PipeJunction {
    pub(crate) fn new(id: JunctionId) -> Self {
        Self {
            id,
            pos: None,
            rotation: Rotation::None,
            pipes_id: Vec::new(),
            pipes: Vec::new(),
        }
    }

    pub fn id(&self) -> JunctionId {
        self.id
    }

    /// Incident pipe ids in port order.
    pub fn pipe_ids(&self) -> &[PipeId] {
        &self.pipes_id
    }

    /// Incident pipe handles in port order, valid until the next structural
    /// mutation.
    pub fn pipe_keys(&self) -> &[PipeKey] {
        &self.pipes
    }

    pub fn is_placed(&self) -> bool {
        self.pos.is_some()
    }

    pub fn port_count(&self) -> usize {
        self.pipes_id.len()
    }

    /// Port number of an incident pipe.
    pub fn port_id(&self, pipe: PipeId) -> Option<usize> {
        self.pipes_id.iter().position(|&p| p == pipe)
    }

    pub(crate) fn push_pipe_id(&mut self, pipe: PipeId) {
        self.pipes_id.push(pipe);
    }

    /// Drop a pipe from the port list, keeping the order of the rest.
    pub(crate) fn remove_pipe_id(&mut self, pipe: PipeId) -> bool {
        let before = self.pipes_id.len();
        self.pipes_id.retain(|&p| p != pipe);
        self.pipes_id.len() != before
    }

    pub(crate) fn set_pipe_keys(&mut self, keys: Vec<PipeKey>) {
        self.pipes = keys;
    }

    // -- Geometry --

    fn base_size(port_count: usize) -> GridSize {
        let columns = port_count.div_ceil(2).max(1);
        GridSize::new(columns as i32, 1)
    }

    /// Footprint, grown by `margin` cells on every side and optionally
    /// rotated.
    pub fn size(&self, margin: i32, rotate: bool) -> GridSize {
        self.size_for_ports(self.port_count(), margin, rotate)
    }

    /// Footprint the junction would have with `port_count` ports.
    pub fn size_for_ports(&self, port_count: usize, margin: i32, rotate: bool) -> GridSize {
        let base = Self::base_size(port_count);
        let base = GridSize::new(base.width + 2 * margin, base.height + 2 * margin);
        if rotate {
            base.rotated(self.rotation)
        } else {
            base
        }
    }

    /// Occupied rectangle on the grid, `None` while unplaced.
    pub fn rect(&self) -> Option<GridRect> {
        self.pos.map(|pos| GridRect::new(pos, self.size(0, true)))
    }

    fn local_port_position(index: usize) -> PortPosition {
        let column = (index / 2) as f32;
        let y = if index % 2 == 0 { 0.0 } else { 1.0 };
        PortPosition::new(column + 0.5, y)
    }

    /// Grid-space anchor of the port an incident pipe is attached to.
    pub fn port_position(&self, pipe: PipeId) -> Option<PortPosition> {
        let index = self.port_id(pipe)?;
        Some(self.place_port(Self::local_port_position(index)))
    }

    /// Rotate and translate a local port anchor into grid space. An unplaced
    /// junction reports anchors relative to its own corner.
    pub(crate) fn place_port(&self, local: PortPosition) -> PortPosition {
        let base = Self::base_size(self.port_count());
        let origin = self.pos.unwrap_or(GridPos::ORIGIN);
        self.rotation.rotate_point(local, base).translated(origin)
    }

    /// Synthetic ports named by port number, in local coordinates.
    pub fn ports(&self) -> Vec<FluidPort> {
        (0..self.port_count())
            .map(|i| FluidPort::new(i.to_string(), Self::local_port_position(i)))
            .collect()
    }
}
