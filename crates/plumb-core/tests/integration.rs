//! End-to-end tests against the public API of plumb-core.

use plumb_core::grid::{GridPos, GridRect, GridSize, PortPosition, Rotation};
use plumb_core::test_utils::*;
use plumb_core::validation::{check_overlaps, is_consistent};
use plumb_core::{ElementId, MachineId, PlumbingElement, PlumbingError, VehiclePlumbing};

/// Fuel tank feeding two engines through a junction, plus a direct line to
/// an auxiliary tank.
fn fuel_system() -> (TestVehicle, VehiclePlumbing) {
    let mut vehicle = TestVehicle::new();
    vehicle.add_tank(
        TestTank::new(MachineId(1))
            .at(GridPos::new(0, 0), GridSize::new(3, 2))
            .with_port("out", PortPosition::new(3.0, 1.0))
            .with_port("aux", PortPosition::new(1.5, 0.0))
            .supplying("out", 9.0)
            .supplying("aux", 1.0),
    );
    vehicle.add_tank(
        TestTank::new(MachineId(2))
            .at(GridPos::new(8, 0), GridSize::new(2, 2))
            .accepting("in", 10.0),
    );
    vehicle.add_tank(
        TestTank::new(MachineId(3))
            .at(GridPos::new(8, 3), GridSize::new(2, 2))
            .accepting("in", 10.0),
    );
    vehicle.add_tank(
        TestTank::new(MachineId(4))
            .at(GridPos::new(0, 5), GridSize::new(1, 1))
            .accepting("in", 0.25),
    );

    let mut plumbing = VehiclePlumbing::new();
    plumbing.connect_machines(MachineId(1), "aux", MachineId(4), "in", 1.0);
    let j = plumbing.add_junction_at(&vehicle, GridPos::new(5, 1), Rotation::None).unwrap();
    for (machine, port, surface) in [(1, "out", 2.0), (2, "in", 1.0), (3, "in", 2.0)] {
        let pipe = plumbing.create_pipe();
        let p = plumbing.get_pipe_mut(pipe).unwrap();
        p.mb = Some(MachineId(machine));
        p.port_b = port.to_owned();
        p.surface = surface;
        plumbing.attach_to_junction(&vehicle, pipe, j).unwrap();
    }
    (vehicle, plumbing)
}

#[test]
fn fuel_system_splits_and_conserves() {
    let (mut vehicle, mut plumbing) = fuel_system();
    plumbing.update_pipes(0.5, &mut vehicle);

    assert!(approx_eq(vehicle.tank(MachineId(1)).last_rate("out"), -9.0));
    assert!(approx_eq(vehicle.tank(MachineId(2)).last_rate("in"), 3.0));
    assert!(approx_eq(vehicle.tank(MachineId(3)).last_rate("in"), 6.0));
    assert!(approx_eq(vehicle.tank(MachineId(4)).last_rate("in"), 0.25));
    assert!(approx_eq(vehicle.tank(MachineId(3)).volume("in"), 3.0));
}

#[test]
fn elements_expose_grid_space_ports() {
    let (vehicle, plumbing) = fuel_system();
    let elements = plumbing.get_all_elements(&vehicle);
    assert_eq!(elements.len(), 5);

    let tank = elements.iter().find(|e| **e == MachineId(1)).unwrap();
    let ports = tank.ports();
    assert_eq!(ports[0].1, PortPosition::new(3.0, 1.0));

    let junction = elements.iter().find_map(PlumbingElement::as_junction).unwrap();
    assert_eq!(junction.port_count(), 3);
    assert_eq!(junction.rect(), Some(GridRect::new(GridPos::new(5, 1), GridSize::new(2, 1))));
    assert_eq!(check_overlaps(&plumbing, &vehicle), vec![]);
}

#[test]
fn deleting_a_machine_cascades_to_its_pipes() {
    let (mut vehicle, mut plumbing) = fuel_system();
    let before = plumbing.pipe_count();

    vehicle.remove_tank(MachineId(1));
    let removed = plumbing.remove_machine(MachineId(1));

    assert_eq!(removed.len(), 2);
    assert_eq!(plumbing.pipe_count(), before - 2);
    assert!(is_consistent(&plumbing));

    plumbing.update_pipes(1.0, &mut vehicle);
    assert!(plumbing.pipes().all(|p| p.flow == 0.0));
}

#[test]
fn placement_respects_existing_parts() {
    let (vehicle, mut plumbing) = fuel_system();

    assert_eq!(
        plumbing.add_junction_at(&vehicle, GridPos::new(8, 4), Rotation::None),
        Err(PlumbingError::Occupied(ElementId::Machine(MachineId(3))))
    );
    let bounds = plumbing.get_plumbing_bounds(&vehicle).unwrap();
    assert_eq!(bounds, GridRect::new(GridPos::new(0, 0), GridSize::new(10, 6)));

    let free = plumbing.find_free_space(&vehicle, GridSize::new(3, 3)).unwrap();
    let area = GridRect::new(free, GridSize::new(3, 3));
    assert!(plumbing.grid_rect_check(&vehicle, area, &[], false).is_empty());
}

#[test]
fn snapshot_survives_a_session() {
    let (mut vehicle, mut plumbing) = fuel_system();
    plumbing.update_pipes(1.0, &mut vehicle);

    let bytes = plumbing.serialize().unwrap();
    let mut restored = VehiclePlumbing::deserialize(&bytes).unwrap();
    assert_eq!(restored.export(), plumbing.export());

    restored.update_pipes(1.0, &mut vehicle);
    let flows: Vec<f32> = restored.pipes().map(|p| p.flow).collect();
    let expected: Vec<f32> = plumbing.pipes().map(|p| p.flow).collect();
    assert_eq!(flows, expected);
}
