use crate::config::PlumbingConfig;
use crate::id::*;
use crate::junction::PipeJunction;
use crate::pipe::Pipe;
use slotmap::DenseSlotMap;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors reported at the mutation and query boundary of a plumbing network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlumbingError {
    #[error("pipe not found: {0:?}")]
    PipeNotFound(PipeId),
    #[error("junction not found: {0:?}")]
    JunctionNotFound(JunctionId),
    #[error("machine not found: {0:?}")]
    MachineNotFound(MachineId),
    #[error("pipe {pipe:?} is already attached to junction {junction:?}")]
    AlreadyAttached { pipe: PipeId, junction: JunctionId },
    #[error("pipe {0:?} has a machine on the side a junction would take")]
    JunctionOnMachineSide(PipeId),
    #[error("pipe {0:?} is not attached to a junction")]
    NotAttached(PipeId),
    #[error("pipe {0:?} is attached to a junction and cannot be inverted")]
    InvertJunctionPipe(PipeId),
    #[error("placement overlaps {0:?}")]
    Occupied(ElementId),
    #[error("no free {width}x{height} area within the search limit")]
    NoFreeSpace { width: i32, height: i32 },
}

pub(crate) fn rejected(op: &str, err: PlumbingError) -> PlumbingError {
    log::warn!("plumbing {op} rejected: {err}");
    err
}

// ---------------------------------------------------------------------------
// VehiclePlumbing
// ---------------------------------------------------------------------------

/// All pipes and junctions of one vehicle.
///
/// Pipes and junctions are lightweight, so they live in dense storage and are
/// addressed by permanent ids through an id-to-slot index. Every structural
/// mutation (adding or removing a pipe or junction, or changing which
/// junction a pipe is attached to) finishes with [`VehiclePlumbing::rebuild`],
/// which re-derives every slot handle from the ids.
///
/// References handed out by the accessors borrow the network, so they cannot
/// survive a mutation. Slot handles ([`PipeKey`], [`JunctionKey`]) can, but
/// are only meaningful until the next structural mutation; use ids to keep
/// track of an entity across edits.
#[derive(Debug, Clone)]
pub struct VehiclePlumbing {
    pipes: DenseSlotMap<PipeKey, Pipe>,
    junctions: DenseSlotMap<JunctionKey, PipeJunction>,
    pipe_index: BTreeMap<PipeId, PipeKey>,
    junction_index: BTreeMap<JunctionId, JunctionKey>,
    /// Next pipe id to allocate. Only ever increases.
    next_pipe_id: u64,
    /// Next junction id to allocate. Only ever increases.
    next_junction_id: u64,
    config: PlumbingConfig,
}

impl Default for VehiclePlumbing {
    fn default() -> Self {
        Self::new()
    }
}

impl VehiclePlumbing {
    /// Create an empty network with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PlumbingConfig::default())
    }

    pub fn with_config(config: PlumbingConfig) -> Self {
        Self {
            pipes: DenseSlotMap::with_key(),
            junctions: DenseSlotMap::with_key(),
            pipe_index: BTreeMap::new(),
            junction_index: BTreeMap::new(),
            next_pipe_id: 0,
            next_junction_id: 0,
            config,
        }
    }

    /// Rebuild a network from persisted parts. Callers validate the parts
    /// first; this only inserts and restores the slot handles.
    pub(crate) fn restore(
        config: PlumbingConfig,
        next_pipe_id: u64,
        next_junction_id: u64,
        pipes: Vec<Pipe>,
        junctions: Vec<PipeJunction>,
    ) -> Self {
        let mut plumbing = Self::with_config(config);
        plumbing.next_pipe_id = next_pipe_id;
        plumbing.next_junction_id = next_junction_id;
        for pipe in pipes {
            let id = pipe.id();
            let key = plumbing.pipes.insert(pipe);
            plumbing.pipe_index.insert(id, key);
        }
        for junction in junctions {
            let id = junction.id();
            let key = plumbing.junctions.insert(junction);
            plumbing.junction_index.insert(id, key);
        }
        plumbing.rebuild();
        plumbing
    }

    pub fn config(&self) -> &PlumbingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PlumbingConfig) {
        self.config = config;
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn get_pipe(&self, id: PipeId) -> Option<&Pipe> {
        self.pipe_index.get(&id).and_then(|&k| self.pipes.get(k))
    }

    /// Mutable access to the non-structural fields of a pipe. The "a" side
    /// machine is only writable through [`Pipe::set_ma`], which refuses it on
    /// junction pipes.
    pub fn get_pipe_mut(&mut self, id: PipeId) -> Option<&mut Pipe> {
        let key = *self.pipe_index.get(&id)?;
        self.pipes.get_mut(key)
    }

    pub fn get_junction(&self, id: JunctionId) -> Option<&PipeJunction> {
        self.junction_index.get(&id).and_then(|&k| self.junctions.get(k))
    }

    /// Mutable access to the placement of a junction. Placement is not
    /// checked here; see `move_junction` for the checked variant.
    pub fn get_junction_mut(&mut self, id: JunctionId) -> Option<&mut PipeJunction> {
        let key = *self.junction_index.get(&id)?;
        self.junctions.get_mut(key)
    }

    /// Resolve a slot handle. Stale handles resolve to `None`.
    pub fn pipe_by_key(&self, key: PipeKey) -> Option<&Pipe> {
        self.pipes.get(key)
    }

    /// Resolve a slot handle. Stale handles resolve to `None`.
    pub fn junction_by_key(&self, key: JunctionKey) -> Option<&PipeJunction> {
        self.junctions.get(key)
    }

    pub fn pipe_key(&self, id: PipeId) -> Option<PipeKey> {
        self.pipe_index.get(&id).copied()
    }

    pub fn junction_key(&self, id: JunctionId) -> Option<JunctionKey> {
        self.junction_index.get(&id).copied()
    }

    /// All pipes, ordered by id.
    pub fn pipes(&self) -> impl Iterator<Item = &Pipe> {
        self.pipe_index.values().filter_map(|&k| self.pipes.get(k))
    }

    /// All junctions, ordered by id.
    pub fn junctions(&self) -> impl Iterator<Item = &PipeJunction> {
        self.junction_index.values().filter_map(|&k| self.junctions.get(k))
    }

    pub fn pipe_ids(&self) -> Vec<PipeId> {
        self.pipe_index.keys().copied().collect()
    }

    pub fn junction_ids(&self) -> Vec<JunctionId> {
        self.junction_index.keys().copied().collect()
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.len()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    /// The id the next `create_pipe` will return.
    pub fn next_pipe_id(&self) -> PipeId {
        PipeId(self.next_pipe_id)
    }

    /// The id the next `create_pipe_junction` will return.
    pub fn next_junction_id(&self) -> JunctionId {
        JunctionId(self.next_junction_id)
    }

    /// Ids of every pipe with an end on `machine`.
    pub fn pipes_of_machine(&self, machine: MachineId) -> Vec<PipeId> {
        self.pipes()
            .filter(|p| p.connects(machine))
            .map(|p| p.id())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Structural mutations
    // -----------------------------------------------------------------------

    /// Append a blank pipe with a fresh id.
    ///
    /// Structural: slot handles obtained before the call must be re-fetched.
    pub fn create_pipe(&mut self) -> PipeId {
        let id = PipeId(self.next_pipe_id);
        self.next_pipe_id += 1;
        let key = self.pipes.insert(Pipe::new(id));
        self.pipe_index.insert(id, key);
        self.rebuild();
        log::debug!("created pipe {id:?}");
        id
    }

    /// Append an empty junction with a fresh id. It starts off the grid;
    /// `move_junction` places it, or use `add_junction_at` to create and
    /// place in one checked step.
    ///
    /// Structural: slot handles obtained before the call must be re-fetched.
    pub fn create_pipe_junction(&mut self) -> JunctionId {
        let id = JunctionId(self.next_junction_id);
        self.next_junction_id += 1;
        let key = self.junctions.insert(PipeJunction::new(id));
        self.junction_index.insert(id, key);
        self.rebuild();
        log::debug!("created junction {id:?}");
        id
    }

    /// Create a pipe running from `a`'s `port_a` to `b`'s `port_b`.
    pub fn connect_machines(
        &mut self,
        a: MachineId,
        port_a: &str,
        b: MachineId,
        port_b: &str,
        surface: f32,
    ) -> PipeId {
        let id = self.create_pipe();
        if let Some(pipe) = self.get_pipe_mut(id) {
            pipe.set_ma_unchecked(Some(a));
            pipe.mb = Some(b);
            pipe.port_a = port_a.to_owned();
            pipe.port_b = port_b.to_owned();
            pipe.surface = surface;
        }
        id
    }

    /// Attach a pipe's "a" side to a junction, taking the next port number.
    pub fn connect_junction(&mut self, pipe: PipeId, junction: JunctionId) -> Result<(), PlumbingError> {
        let pipe_key = self
            .pipe_key(pipe)
            .ok_or_else(|| rejected("connect", PlumbingError::PipeNotFound(pipe)))?;
        let junction_key = self
            .junction_key(junction)
            .ok_or_else(|| rejected("connect", PlumbingError::JunctionNotFound(junction)))?;

        let p = &mut self.pipes[pipe_key];
        if let Some(existing) = p.junction_id() {
            return Err(rejected(
                "connect",
                PlumbingError::AlreadyAttached {
                    pipe,
                    junction: existing,
                },
            ));
        }
        if p.ma().is_some() {
            return Err(rejected("connect", PlumbingError::JunctionOnMachineSide(pipe)));
        }
        p.set_junction_id(Some(junction));
        self.junctions[junction_key].push_pipe_id(pipe);
        self.rebuild();
        log::debug!("attached pipe {pipe:?} to junction {junction:?}");
        Ok(())
    }

    /// Detach a pipe from its junction. The junction stays, even if empty.
    pub fn disconnect_junction(&mut self, pipe: PipeId) -> Result<JunctionId, PlumbingError> {
        let pipe_key = self
            .pipe_key(pipe)
            .ok_or_else(|| rejected("disconnect", PlumbingError::PipeNotFound(pipe)))?;
        let junction = self.pipes[pipe_key]
            .junction_id()
            .ok_or_else(|| rejected("disconnect", PlumbingError::NotAttached(pipe)))?;

        self.pipes[pipe_key].set_junction_id(None);
        if let Some(j) = self.get_junction_mut(junction) {
            j.remove_pipe_id(pipe);
        }
        self.rebuild();
        log::debug!("detached pipe {pipe:?} from junction {junction:?}");
        Ok(junction)
    }

    /// Remove a pipe. Its junction, if any, is kept and loses one port.
    pub fn remove_pipe(&mut self, id: PipeId) -> Result<(), PlumbingError> {
        if !self.remove_pipe_entry(id) {
            return Err(rejected("remove", PlumbingError::PipeNotFound(id)));
        }
        self.rebuild();
        log::debug!("removed pipe {id:?}");
        Ok(())
    }

    /// Remove a junction and every pipe attached to it. Returns the ids of
    /// the removed pipes in former port order.
    pub fn remove_junction(&mut self, id: JunctionId) -> Result<Vec<PipeId>, PlumbingError> {
        let key = self
            .junction_index
            .remove(&id)
            .ok_or_else(|| rejected("remove", PlumbingError::JunctionNotFound(id)))?;
        let removed: Vec<PipeId> = self
            .junctions
            .remove(key)
            .map(|j| j.pipe_ids().to_vec())
            .unwrap_or_default();

        for &pipe in &removed {
            if let Some(pipe_key) = self.pipe_index.remove(&pipe) {
                self.pipes.remove(pipe_key);
            }
        }
        self.rebuild();
        log::debug!("removed junction {id:?} and {} pipe(s)", removed.len());
        Ok(removed)
    }

    /// Remove every pipe touching a machine that left the vehicle. Returns
    /// the removed ids in id order.
    pub fn remove_machine(&mut self, machine: MachineId) -> Vec<PipeId> {
        let removed = self.pipes_of_machine(machine);
        for &pipe in &removed {
            self.remove_pipe_entry(pipe);
        }
        self.rebuild();
        if !removed.is_empty() {
            log::debug!("removed {} pipe(s) of machine {machine:?}", removed.len());
        }
        removed
    }

    /// Drop a pipe from storage and from its junction's port list, without
    /// rebuilding.
    fn remove_pipe_entry(&mut self, id: PipeId) -> bool {
        let Some(key) = self.pipe_index.remove(&id) else {
            return false;
        };
        if let Some(pipe) = self.pipes.remove(key)
            && let Some(junction) = pipe.junction_id()
            && let Some(j) = self.get_junction_mut(junction)
        {
            j.remove_pipe_id(id);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Rebuild
    // -----------------------------------------------------------------------

    /// Re-derive every slot handle from the id fields.
    ///
    /// Runs after every structural mutation. Junction port order is taken
    /// from the persisted id list unchanged.
    pub(crate) fn rebuild(&mut self) {
        self.rebuild_pipe_keys();
        self.rebuild_junction_keys();
        log::trace!(
            "rebuilt plumbing: {} pipe(s), {} junction(s)",
            self.pipes.len(),
            self.junctions.len()
        );
    }

    fn rebuild_pipe_keys(&mut self) {
        let index = &self.junction_index;
        for pipe in self.pipes.values_mut() {
            let key = pipe.junction_id().and_then(|j| index.get(&j).copied());
            pipe.set_junction_key(key);
        }
    }

    fn rebuild_junction_keys(&mut self) {
        let index = &self.pipe_index;
        for junction in self.junctions.values_mut() {
            let keys = junction
                .pipe_ids()
                .iter()
                .filter_map(|p| index.get(p).copied())
                .collect();
            junction.set_pipe_keys(keys);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{check_consistency, is_consistent};

    fn junction_pipe(plumbing: &mut VehiclePlumbing, junction: JunctionId, machine: u64) -> PipeId {
        let pipe = plumbing.create_pipe();
        plumbing.get_pipe_mut(pipe).unwrap().mb = Some(MachineId(machine));
        plumbing.connect_junction(pipe, junction).unwrap();
        pipe
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    #[test]
    fn ids_are_distinct_and_never_reused() {
        let mut plumbing = VehiclePlumbing::new();
        let a = plumbing.create_pipe();
        let b = plumbing.create_pipe();
        plumbing.remove_pipe(b).unwrap();
        let c = plumbing.create_pipe();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(c > b);

        let j1 = plumbing.create_pipe_junction();
        plumbing.remove_junction(j1).unwrap();
        let j2 = plumbing.create_pipe_junction();
        assert!(j2 > j1);
    }

    #[test]
    fn lookup_after_create() {
        let mut plumbing = VehiclePlumbing::new();
        let id = plumbing.create_pipe();
        assert_eq!(plumbing.get_pipe(id).map(|p| p.id()), Some(id));
        let j = plumbing.create_pipe_junction();
        assert_eq!(plumbing.get_junction(j).map(|j| j.id()), Some(j));
        assert_eq!(plumbing.next_pipe_id(), PipeId(id.0 + 1));
    }

    #[test]
    fn lookup_after_remove_is_not_found() {
        let mut plumbing = VehiclePlumbing::new();
        let a = plumbing.connect_machines(MachineId(1), "out", MachineId(2), "in", 1.0);
        let b = plumbing.connect_machines(MachineId(2), "out", MachineId(3), "in", 2.5);
        let before = plumbing.get_pipe(b).unwrap().clone();

        plumbing.remove_pipe(a).unwrap();

        assert!(plumbing.get_pipe(a).is_none());
        assert_eq!(plumbing.get_pipe(b), Some(&before));
        assert!(plumbing.get_pipe(PipeId(999)).is_none());
    }

    #[test]
    fn stale_key_resolves_to_none() {
        let mut plumbing = VehiclePlumbing::new();
        let a = plumbing.create_pipe();
        let key = plumbing.pipe_key(a).unwrap();
        plumbing.remove_pipe(a).unwrap();
        let _b = plumbing.create_pipe();
        assert!(plumbing.pipe_by_key(key).is_none());
    }

    // -----------------------------------------------------------------------
    // Junction relationships
    // -----------------------------------------------------------------------

    #[test]
    fn connect_junction_links_both_directions() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let p = junction_pipe(&mut plumbing, j, 1);

        let pipe = plumbing.get_pipe(p).unwrap();
        assert_eq!(pipe.junction_id(), Some(j));
        assert_eq!(pipe.junction_key(), plumbing.junction_key(j));
        let junction = plumbing.get_junction(j).unwrap();
        assert_eq!(junction.pipe_ids(), &[p]);
        assert_eq!(junction.pipe_keys(), &[plumbing.pipe_key(p).unwrap()]);
        assert!(is_consistent(&plumbing));
    }

    #[test]
    fn connect_rejects_second_junction() {
        let mut plumbing = VehiclePlumbing::new();
        let j1 = plumbing.create_pipe_junction();
        let j2 = plumbing.create_pipe_junction();
        let p = junction_pipe(&mut plumbing, j1, 1);

        let err = plumbing.connect_junction(p, j2).unwrap_err();
        assert_eq!(err, PlumbingError::AlreadyAttached { pipe: p, junction: j1 });
        assert!(plumbing.get_junction(j2).unwrap().pipe_ids().is_empty());
    }

    #[test]
    fn connect_rejects_machine_on_junction_side() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let p = plumbing.connect_machines(MachineId(1), "out", MachineId(2), "in", 1.0);
        assert_eq!(
            plumbing.connect_junction(p, j),
            Err(PlumbingError::JunctionOnMachineSide(p))
        );
        assert_eq!(plumbing.get_pipe(p).unwrap().junction_id(), None);
    }

    #[test]
    fn connect_rejects_unknown_ids() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let p = plumbing.create_pipe();
        assert_eq!(
            plumbing.connect_junction(PipeId(77), j),
            Err(PlumbingError::PipeNotFound(PipeId(77)))
        );
        assert_eq!(
            plumbing.connect_junction(p, JunctionId(77)),
            Err(PlumbingError::JunctionNotFound(JunctionId(77)))
        );
    }

    #[test]
    fn disconnect_keeps_junction() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let p = junction_pipe(&mut plumbing, j, 1);

        assert_eq!(plumbing.disconnect_junction(p), Ok(j));
        assert!(plumbing.get_junction(j).unwrap().pipe_ids().is_empty());
        assert_eq!(plumbing.get_pipe(p).unwrap().junction_key(), None);
        assert_eq!(plumbing.disconnect_junction(p), Err(PlumbingError::NotAttached(p)));
        assert!(is_consistent(&plumbing));
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    #[test]
    fn remove_pipe_never_removes_junction() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let p = junction_pipe(&mut plumbing, j, 1);

        plumbing.remove_pipe(p).unwrap();

        let junction = plumbing.get_junction(j).unwrap();
        assert_eq!(junction.port_count(), 0);
        assert!(is_consistent(&plumbing));
    }

    #[test]
    fn remove_missing_pipe_reports_not_found() {
        let mut plumbing = VehiclePlumbing::new();
        let p = plumbing.create_pipe();
        assert_eq!(plumbing.remove_pipe(PipeId(5)), Err(PlumbingError::PipeNotFound(PipeId(5))));
        plumbing.remove_pipe(p).unwrap();
        assert_eq!(plumbing.remove_pipe(p), Err(PlumbingError::PipeNotFound(p)));
    }

    #[test]
    fn remove_junction_cascades_to_pipes() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let pipes: Vec<PipeId> = (0..4).map(|m| junction_pipe(&mut plumbing, j, m)).collect();
        let bystander = plumbing.connect_machines(MachineId(8), "a", MachineId(9), "b", 1.0);

        let removed = plumbing.remove_junction(j).unwrap();

        assert_eq!(removed, pipes);
        for p in pipes {
            assert!(plumbing.get_pipe(p).is_none());
        }
        assert!(plumbing.get_junction(j).is_none());
        assert!(plumbing.get_pipe(bystander).is_some());
        assert_eq!(plumbing.remove_junction(j), Err(PlumbingError::JunctionNotFound(j)));
        assert!(is_consistent(&plumbing));
    }

    #[test]
    fn port_order_survives_unrelated_removals() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let other = plumbing.create_pipe_junction();
        let p0 = junction_pipe(&mut plumbing, j, 0);
        let q = junction_pipe(&mut plumbing, other, 5);
        let p1 = junction_pipe(&mut plumbing, j, 1);
        let p2 = junction_pipe(&mut plumbing, j, 2);

        plumbing.remove_pipe(q).unwrap();
        plumbing.remove_junction(other).unwrap();
        plumbing.remove_pipe(p1).unwrap();

        let junction = plumbing.get_junction(j).unwrap();
        assert_eq!(junction.pipe_ids(), &[p0, p2]);
        let keyed: Vec<PipeId> = junction
            .pipe_keys()
            .iter()
            .map(|&k| plumbing.pipe_by_key(k).unwrap().id())
            .collect();
        assert_eq!(keyed, vec![p0, p2]);
    }

    #[test]
    fn remove_machine_cascades_to_its_pipes() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let a = plumbing.connect_machines(MachineId(1), "out", MachineId(2), "in", 1.0);
        let b = junction_pipe(&mut plumbing, j, 1);
        let c = plumbing.connect_machines(MachineId(2), "out", MachineId(3), "in", 1.0);

        let removed = plumbing.remove_machine(MachineId(1));

        assert_eq!(removed, vec![a, b]);
        assert!(plumbing.get_pipe(c).is_some());
        assert!(plumbing.get_junction(j).unwrap().pipe_ids().is_empty());
        assert!(plumbing.remove_machine(MachineId(42)).is_empty());
        assert!(is_consistent(&plumbing));
    }

    // -----------------------------------------------------------------------
    // Rebuild
    // -----------------------------------------------------------------------

    #[test]
    fn rebuild_restores_consistency_after_every_operation() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        assert!(is_consistent(&plumbing));
        let mut pipes = Vec::new();
        for m in 0..6 {
            pipes.push(junction_pipe(&mut plumbing, j, m));
            assert!(is_consistent(&plumbing), "{:?}", check_consistency(&plumbing));
        }
        for p in pipes.iter().step_by(2) {
            plumbing.remove_pipe(*p).unwrap();
            assert!(is_consistent(&plumbing), "{:?}", check_consistency(&plumbing));
        }
        plumbing.remove_junction(j).unwrap();
        assert!(is_consistent(&plumbing));
        assert_eq!(plumbing.pipe_count(), 0);
    }

    #[test]
    fn pipes_iterate_in_id_order() {
        let mut plumbing = VehiclePlumbing::new();
        let ids: Vec<PipeId> = (0..5).map(|_| plumbing.create_pipe()).collect();
        plumbing.remove_pipe(ids[1]).unwrap();
        let seen: Vec<PipeId> = plumbing.pipes().map(|p| p.id()).collect();
        assert_eq!(seen, vec![ids[0], ids[2], ids[3], ids[4]]);
        assert_eq!(plumbing.pipe_ids(), seen);
    }
}
