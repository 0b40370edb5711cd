//! Placement queries over the plumbing grid.
//!
//! Machines report their own footprint through the [`PlumbingHost`];
//! junctions are owned by the network. Queries build transient
//! [`PlumbingElement`] views over both and never cache them.

use crate::element::PlumbingElement;
use crate::grid::{GridPos, GridRect, GridSize, Rotation};
use crate::id::{ElementId, JunctionId, MachineId, PipeId};
use crate::machine::PlumbingHost;
use crate::plumbing::{PlumbingError, VehiclePlumbing, rejected};

impl VehiclePlumbing {
    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every machine with plumbing, in host order, then every placed junction
    /// by id. Junctions that are off the grid are not elements.
    pub fn get_all_elements<'a>(&'a self, host: &'a dyn PlumbingHost) -> Vec<PlumbingElement<'a>> {
        let mut elements: Vec<PlumbingElement<'a>> = host
            .machine_ids()
            .into_iter()
            .filter_map(|id| host.machine(id))
            .filter(|m| m.has_plumbing())
            .map(PlumbingElement::Machine)
            .collect();
        elements.extend(self.junctions().filter(|j| j.is_placed()).map(PlumbingElement::Junction));
        elements
    }

    /// Elements whose rectangle intersects the area spanned by `start` and
    /// `end` (the larger corner is exclusive), skipping anything in `ignore`.
    ///
    /// With `expand`, each element's rectangle is first grown by the
    /// connection margin, which is what dropping a new part next to existing
    /// ones must respect.
    pub fn grid_aabb_check<'a>(
        &'a self,
        host: &'a dyn PlumbingHost,
        start: GridPos,
        end: GridPos,
        ignore: &[ElementId],
        expand: bool,
    ) -> Vec<PlumbingElement<'a>> {
        self.grid_rect_check(host, GridRect::from_corners(start, end), ignore, expand)
    }

    /// [`grid_aabb_check`](Self::grid_aabb_check) with an explicit rectangle.
    pub fn grid_rect_check<'a>(
        &'a self,
        host: &'a dyn PlumbingHost,
        area: GridRect,
        ignore: &[ElementId],
        expand: bool,
    ) -> Vec<PlumbingElement<'a>> {
        let margin = if expand { self.config().connection_margin } else { 0 };
        self.get_all_elements(host)
            .into_iter()
            .filter(|e| e.element_id().is_some_and(|id| !ignore.contains(&id)))
            .filter(|e| e.rect(margin).intersects(&area))
            .collect()
    }

    /// `Ok` if `area` overlaps no element outside `ignore`, otherwise the
    /// first element in the way.
    pub fn can_place(
        &self,
        host: &dyn PlumbingHost,
        area: GridRect,
        ignore: &[ElementId],
    ) -> Result<(), PlumbingError> {
        match self
            .grid_rect_check(host, area, ignore, false)
            .first()
            .and_then(|e| e.element_id())
        {
            Some(blocker) => Err(PlumbingError::Occupied(blocker)),
            None => Ok(()),
        }
    }

    /// First free top-left corner for a `size` area, scanning rows from the
    /// origin within the configured search limit.
    pub fn find_free_space(&self, host: &dyn PlumbingHost, size: GridSize) -> Result<GridPos, PlumbingError> {
        let occupied: Vec<GridRect> = self
            .get_all_elements(host)
            .iter()
            .map(|e| e.rect(0))
            .filter(|r| !r.is_empty())
            .collect();
        let limit = self.config().free_space_search_limit;

        for y in 0..limit {
            let mut x = 0;
            while x < limit {
                let candidate = GridRect::new(GridPos::new(x, y), size);
                match occupied.iter().find(|r| r.intersects(&candidate)) {
                    // Every x before the blocker's right edge still hits it.
                    Some(blocker) => x = blocker.end().x.max(x + 1),
                    None => return Ok(candidate.pos),
                }
            }
        }

        log::warn!(
            "no free {}x{} plumbing area within {limit}x{limit}",
            size.width,
            size.height
        );
        Err(PlumbingError::NoFreeSpace {
            width: size.width,
            height: size.height,
        })
    }

    /// Smallest rectangle covering every machine with plumbing and every
    /// junction. `None` when there is nothing on the grid.
    pub fn get_plumbing_bounds(&self, host: &dyn PlumbingHost) -> Option<GridRect> {
        self.get_all_elements(host)
            .iter()
            .map(|e| e.rect(0))
            .filter(|r| !r.is_empty())
            .reduce(|acc, r| acc.union(&r))
    }

    /// Size of the area covered by the plumbing of the given machines, such
    /// as all machines of one part. Zero if none of them has plumbing.
    pub fn get_plumbing_size_of(&self, host: &dyn PlumbingHost, machines: &[MachineId]) -> GridSize {
        machines
            .iter()
            .filter_map(|&id| host.machine(id))
            .filter(|m| m.has_plumbing())
            .map(|m| m.plumbing_rect())
            .reduce(|acc, r| acc.union(&r))
            .map(|r| r.size)
            .unwrap_or(GridSize::ZERO)
    }

    // -----------------------------------------------------------------------
    // Checked placement
    // -----------------------------------------------------------------------

    /// Create a junction at `pos` if its footprint is free.
    pub fn add_junction_at(
        &mut self,
        host: &dyn PlumbingHost,
        pos: GridPos,
        rotation: Rotation,
    ) -> Result<JunctionId, PlumbingError> {
        let area = GridRect::new(pos, GridSize::new(1, 1).rotated(rotation));
        self.can_place(host, area, &[]).map_err(|e| rejected("place", e))?;
        let id = self.create_pipe_junction();
        if let Some(j) = self.get_junction_mut(id) {
            j.pos = Some(pos);
            j.rotation = rotation;
        }
        Ok(id)
    }

    /// Create a junction at the first free position.
    pub fn add_junction_in_free_space(&mut self, host: &dyn PlumbingHost) -> Result<JunctionId, PlumbingError> {
        let pos = self.find_free_space(host, GridSize::new(1, 1))?;
        self.add_junction_at(host, pos, Rotation::None)
    }

    /// Move or rotate a junction if its new footprint is free. Also places a
    /// junction that is not on the grid yet.
    pub fn move_junction(
        &mut self,
        host: &dyn PlumbingHost,
        id: JunctionId,
        pos: GridPos,
        rotation: Rotation,
    ) -> Result<(), PlumbingError> {
        let junction = self
            .get_junction(id)
            .ok_or_else(|| rejected("move", PlumbingError::JunctionNotFound(id)))?;
        let area = GridRect::new(pos, junction.size(0, false).rotated(rotation));
        self.can_place(host, area, &[ElementId::Junction(id)])
            .map_err(|e| rejected("move", e))?;
        if let Some(j) = self.get_junction_mut(id) {
            j.pos = Some(pos);
            j.rotation = rotation;
        }
        Ok(())
    }

    /// [`connect_junction`](Self::connect_junction), refusing when the extra
    /// port would grow a placed junction into another element.
    pub fn attach_to_junction(
        &mut self,
        host: &dyn PlumbingHost,
        pipe: PipeId,
        junction: JunctionId,
    ) -> Result<(), PlumbingError> {
        let j = self
            .get_junction(junction)
            .ok_or_else(|| rejected("attach", PlumbingError::JunctionNotFound(junction)))?;
        if let Some(pos) = j.pos {
            let grown = GridRect::new(pos, j.size_for_ports(j.port_count() + 1, 0, true));
            self.can_place(host, grown, &[ElementId::Junction(junction)])
                .map_err(|e| rejected("attach", e))?;
        }
        self.connect_junction(pipe, junction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
