//! Plumbing network example: a fuel tank feeding two engines.
//!
//! Implements the machine and vehicle traits for a tiny rocket, lays out a
//! junction in free space, draws pipes, then runs the solver until the tank
//! is dry. Also shows a placement that gets rejected and a save/load round
//! trip.
//!
//! Run with: `cargo run -p plumb-examples --example plumbing_network`

use plumb_core::grid::{GridPos, GridSize, PortPosition, Rotation};
use plumb_core::machine::{FluidPort, PlumbingHost, PlumbingMachine};
use plumb_core::{MachineId, PlumbingConfig, VehiclePlumbing};

// ===========================================================================
// Machines
// ===========================================================================

/// A tank that drains at up to `max_rate`.
struct Tank {
    id: MachineId,
    pos: GridPos,
    ports: Vec<FluidPort>,
    contents: f32,
    max_rate: f32,
}

/// An engine that burns a fixed amount per second.
struct Engine {
    id: MachineId,
    pos: GridPos,
    ports: Vec<FluidPort>,
    demand: f32,
    burned: f32,
}

impl PlumbingMachine for Tank {
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
        Rotation::None
    }
    fn plumbing_size(&self) -> GridSize {
        GridSize::new(3, 2)
    }
    fn available_flow(&self, _port: &str) -> f32 {
        self.max_rate.min(self.contents.max(0.0))
    }
    fn accept_flow(&self, _port: &str) -> f32 {
        0.0
    }
    fn push_flow(&mut self, _port: &str, rate: f32, dt: f32) {
        self.contents += rate * dt;
    }
}

impl PlumbingMachine for Engine {
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
        Rotation::Cw180
    }
    fn plumbing_size(&self) -> GridSize {
        GridSize::new(2, 2)
    }
    fn available_flow(&self, _port: &str) -> f32 {
        0.0
    }
    fn accept_flow(&self, _port: &str) -> f32 {
        self.demand
    }
    fn push_flow(&mut self, _port: &str, rate: f32, dt: f32) {
        self.burned += rate * dt;
    }
}

// ===========================================================================
// Vehicle
// ===========================================================================

struct Rocket {
    tank: Tank,
    engines: Vec<Engine>,
}

impl PlumbingHost for Rocket {
    fn machine_ids(&self) -> Vec<MachineId> {
        std::iter::once(self.tank.id)
            .chain(self.engines.iter().map(|e| e.id))
            .collect()
    }

    fn machine(&self, id: MachineId) -> Option<&dyn PlumbingMachine> {
        if self.tank.id == id {
            return Some(&self.tank as &dyn PlumbingMachine);
        }
        self.engines
            .iter()
            .find(|e| e.id == id)
            .map(|e| e as &dyn PlumbingMachine)
    }

    fn machine_mut(&mut self, id: MachineId) -> Option<&mut dyn PlumbingMachine> {
        if self.tank.id == id {
            return Some(&mut self.tank as &mut dyn PlumbingMachine);
        }
        self.engines
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e as &mut dyn PlumbingMachine)
    }
}

fn main() {
    let mut rocket = Rocket {
        tank: Tank {
            id: MachineId(1),
            pos: GridPos::new(0, 0),
            ports: vec![FluidPort::new("out", PortPosition::new(1.5, 2.0))],
            contents: 40.0,
            max_rate: 8.0,
        },
        engines: vec![
            Engine {
                id: MachineId(2),
                pos: GridPos::new(0, 4),
                ports: vec![FluidPort::new("in", PortPosition::new(1.0, 2.0))],
                demand: 3.0,
                burned: 0.0,
            },
            Engine {
                id: MachineId(3),
                pos: GridPos::new(3, 4),
                ports: vec![FluidPort::new("in", PortPosition::new(1.0, 2.0))],
                demand: 6.0,
                burned: 0.0,
            },
        ],
    };

    let config = PlumbingConfig {
        flow_per_surface: Some(5.0),
        ..PlumbingConfig::default()
    };
    let mut plumbing = VehiclePlumbing::with_config(config);

    // --- Layout ---

    let junction = plumbing
        .add_junction_in_free_space(&rocket)
        .expect("rocket leaves room for a junction");
    println!(
        "Junction {:?} placed at {:?}",
        junction,
        plumbing.get_junction(junction).and_then(|j| j.pos)
    );

    for (machine, port, surface) in [(1, "out", 2.0), (2, "in", 1.0), (3, "in", 1.0)] {
        let pipe = plumbing.create_pipe();
        if let Some(p) = plumbing.get_pipe_mut(pipe) {
            p.mb = Some(MachineId(machine));
            p.port_b = port.to_owned();
            p.surface = surface;
        }
        plumbing
            .attach_to_junction(&rocket, pipe, junction)
            .expect("junction has room to grow");
    }

    match plumbing.add_junction_at(&rocket, GridPos::new(1, 1), Rotation::None) {
        Ok(_) => println!("Unexpectedly placed a junction inside the tank"),
        Err(err) => println!("Placement inside the tank rejected: {err}"),
    }

    for element in plumbing.get_all_elements(&rocket) {
        println!("  {:?} occupies {:?}", element, element.rect(0));
        for (port, at) in element.ports() {
            println!("    port '{}' at ({:.1}, {:.1})", port.name, at.x, at.y);
        }
    }

    // --- Run ---

    let dt = 0.5;
    for tick in 1..=12 {
        plumbing.update_pipes(dt, &mut rocket);
        let flows: Vec<String> = plumbing.pipes().map(|p| format!("{:.2}", p.flow)).collect();
        println!(
            "Tick {tick:2}: tank {:5.2} | flows [{}] | burned {:5.2} / {:5.2}",
            rocket.tank.contents,
            flows.join(", "),
            rocket.engines[0].burned,
            rocket.engines[1].burned,
        );
    }

    // --- Save / load ---

    let bytes = plumbing.serialize().expect("snapshot encodes");
    let restored = VehiclePlumbing::deserialize(&bytes).expect("snapshot decodes");
    println!(
        "Snapshot: {} bytes, {} pipe(s), {} junction(s) restored",
        bytes.len(),
        restored.pipe_count(),
        restored.junction_count()
    );
}
