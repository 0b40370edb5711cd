//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use crate::grid::{GridPos, GridSize, PortPosition, Rotation};
use crate::id::{JunctionId, MachineId, PipeId};
use crate::machine::{FluidPort, PlumbingHost, PlumbingMachine};
use crate::plumbing::VehiclePlumbing;

// ===========================================================================
// Test machine
// ===========================================================================

/// A machine with fixed per-port rates that records what the solver pushes.
#[derive(Debug, Clone)]
pub struct TestTank {
    pub id: MachineId,
    pub pos: GridPos,
    pub size: GridSize,
    pub rotation: Rotation,
    pub ports: Vec<FluidPort>,
    /// Rate each port can push out.
    pub available: BTreeMap<String, f32>,
    /// Rate each port can take in.
    pub accept: BTreeMap<String, f32>,
    /// Last rate pushed through each port (positive = in).
    pub last_rate: BTreeMap<String, f32>,
    /// Net volume moved through each port since creation (positive = in).
    pub volume: BTreeMap<String, f32>,
}

impl TestTank {
    /// A 1x1 tank at the origin with no ports.
    pub fn new(id: MachineId) -> Self {
        Self {
            id,
            pos: GridPos::ORIGIN,
            size: GridSize::new(1, 1),
            rotation: Rotation::None,
            ports: Vec::new(),
            available: BTreeMap::new(),
            accept: BTreeMap::new(),
            last_rate: BTreeMap::new(),
            volume: BTreeMap::new(),
        }
    }

    pub fn at(mut self, pos: GridPos, size: GridSize) -> Self {
        self.pos = pos;
        self.size = size;
        self
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_port(mut self, name: &str, pos: PortPosition) -> Self {
        self.ports.push(FluidPort::new(name, pos));
        self
    }

    /// Port `name` pushes out up to `rate`.
    pub fn supplying(mut self, name: &str, rate: f32) -> Self {
        self.ensure_port(name);
        self.available.insert(name.to_owned(), rate);
        self
    }

    /// Port `name` takes in up to `rate`.
    pub fn accepting(mut self, name: &str, rate: f32) -> Self {
        self.ensure_port(name);
        self.accept.insert(name.to_owned(), rate);
        self
    }

    fn ensure_port(&mut self, name: &str) {
        if self.find_port(name).is_none() {
            self.ports.push(FluidPort::new(name, PortPosition::new(0.5, 0.0)));
        }
    }

    pub fn last_rate(&self, port: &str) -> f32 {
        self.last_rate.get(port).copied().unwrap_or(0.0)
    }

    pub fn volume(&self, port: &str) -> f32 {
        self.volume.get(port).copied().unwrap_or(0.0)
    }
}

impl PlumbingMachine for TestTank {
    fn id(&self) -> MachineId {
        self.id
    }

    fn fluid_ports(&self) -> &[FluidPort] {
        &self.ports
    }

    fn plumbing_pos(&self) -> GridPos {
        self.pos
    }

    fn plumbing_rotation(&self) -> Rotation {
        self.rotation
    }

    fn plumbing_size(&self) -> GridSize {
        self.size
    }

    fn available_flow(&self, port: &str) -> f32 {
        self.available.get(port).copied().unwrap_or(0.0)
    }

    fn accept_flow(&self, port: &str) -> f32 {
        self.accept.get(port).copied().unwrap_or(0.0)
    }

    fn push_flow(&mut self, port: &str, rate: f32, dt: f32) {
        self.last_rate.insert(port.to_owned(), rate);
        *self.volume.entry(port.to_owned()).or_insert(0.0) += rate * dt;
    }
}

// ===========================================================================
// Test vehicle
// ===========================================================================

/// A vehicle made only of [`TestTank`]s, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TestVehicle {
    order: Vec<MachineId>,
    tanks: BTreeMap<MachineId, TestTank>,
}

impl TestVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tank(&mut self, tank: TestTank) -> MachineId {
        let id = tank.id;
        if self.tanks.insert(id, tank).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn remove_tank(&mut self, id: MachineId) -> Option<TestTank> {
        self.order.retain(|&m| m != id);
        self.tanks.remove(&id)
    }

    pub fn tank(&self, id: MachineId) -> &TestTank {
        &self.tanks[&id]
    }

    pub fn tank_mut(&mut self, id: MachineId) -> &mut TestTank {
        self.tanks.get_mut(&id).expect("unknown test tank")
    }
}

impl PlumbingHost for TestVehicle {
    fn machine_ids(&self) -> Vec<MachineId> {
        self.order.clone()
    }

    fn machine(&self, id: MachineId) -> Option<&dyn PlumbingMachine> {
        self.tanks.get(&id).map(|t| t as &dyn PlumbingMachine)
    }

    fn machine_mut(&mut self, id: MachineId) -> Option<&mut dyn PlumbingMachine> {
        self.tanks.get_mut(&id).map(|t| t as &mut dyn PlumbingMachine)
    }
}

// ===========================================================================
// Network builders
// ===========================================================================

/// Create a pipe from `junction` to `machine`'s `port`.
pub fn attach_machine_pipe(
    plumbing: &mut VehiclePlumbing,
    junction: JunctionId,
    machine: MachineId,
    port: &str,
    surface: f32,
) -> PipeId {
    let pipe = plumbing.create_pipe();
    if let Some(p) = plumbing.get_pipe_mut(pipe) {
        p.mb = Some(machine);
        p.port_b = port.to_owned();
        p.surface = surface;
    }
    plumbing
        .connect_junction(pipe, junction)
        .expect("attach pipe to junction");
    pipe
}

/// A source tank supplying `supply` through "out" and one consumer per
/// surface accepting `accept` through "in", all around one junction.
///
/// Returns the junction, the source pipe, and the consumer pipes in order.
pub fn build_junction_star(
    vehicle: &mut TestVehicle,
    plumbing: &mut VehiclePlumbing,
    supply: f32,
    accept: f32,
    surfaces: &[f32],
) -> (JunctionId, PipeId, Vec<PipeId>) {
    let base = vehicle.machine_ids().len() as u64 + 100;
    let source = vehicle.add_tank(
        TestTank::new(MachineId(base))
            .at(GridPos::new(0, 0), GridSize::new(2, 2))
            .supplying("out", supply),
    );
    let junction = plumbing.create_pipe_junction();
    if let Some(j) = plumbing.get_junction_mut(junction) {
        j.pos = Some(GridPos::new(3, 0));
    }
    let source_pipe = attach_machine_pipe(plumbing, junction, source, "out", 1.0);
    let mut outlets = Vec::with_capacity(surfaces.len());
    for (i, &surface) in surfaces.iter().enumerate() {
        let consumer = vehicle.add_tank(
            TestTank::new(MachineId(base + 1 + i as u64))
                .at(GridPos::new(6 + 3 * i as i32, 0), GridSize::new(2, 2))
                .accepting("in", accept),
        );
        outlets.push(attach_machine_pipe(plumbing, junction, consumer, "in", surface));
    }
    (junction, source_pipe, outlets)
}

/// Relative comparison for solver results.
pub fn approx_eq(a: f32, b: f32) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-5 * scale
}
