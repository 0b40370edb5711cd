//! Per-tick flow computation.
//!
//! Each tick settles in two phases, always in id order:
//!
//! 1. Machine-to-machine pipes. Forward and backward rates are each the
//!    smaller of what one end offers and the other end accepts, capped by
//!    the pipe's surface capacity; the pipe carries the difference.
//! 2. Junctions. A pipe whose machine offers fluid feeds the junction; every
//!    other pipe is an outlet. Inflow is shared among outlets in proportion
//!    to surface, redistributing around outlets that fill up. A junction
//!    stores nothing, so when outlets cannot take everything the inflows are
//!    throttled by the same factor and outflow always equals inflow.
//!
//! Machine state is read fresh every tick and pipe flows are not fed back,
//! so constant inputs give constant flows.

use crate::id::{JunctionId, MachineId, PipeId};
use crate::machine::PlumbingHost;
use crate::plumbing::{PlumbingError, VehiclePlumbing};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Totals of one junction redistribution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JunctionFlow {
    /// Rate entering the junction.
    pub inflow: f32,
    /// Rate leaving the junction. Equal to `inflow` up to rounding.
    pub outflow: f32,
    /// Volume moved through the junction this tick.
    pub volume: f32,
}

/// One incident pipe as seen by the junction balance.
#[derive(Debug, Clone, Copy)]
struct JunctionPort {
    pipe: PipeId,
    surface: f32,
    /// Rate offered toward the junction. Positive marks an inflow pipe.
    supply: f32,
    /// Rate the outlet can carry away.
    capacity: f32,
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Share `total` across outlets given as `(surface, capacity)` pairs, in
/// proportion to surface and never giving an outlet more than its capacity.
///
/// Outlets whose surface is at or below `min_surface` get nothing. The sum
/// of the result is `total` unless every eligible outlet is saturated. A
/// zero total outgoing surface yields all zeros.
pub fn distribute_by_surface(total: f32, outlets: &[(f32, f32)], min_surface: f32) -> Vec<f32> {
    let mut shares = vec![0.0f32; outlets.len()];
    if !(total > 0.0) {
        return shares;
    }
    let mut open: Vec<usize> = outlets
        .iter()
        .enumerate()
        .filter(|&(_, &(surface, capacity))| surface > min_surface && surface.is_finite() && capacity > 0.0)
        .map(|(i, _)| i)
        .collect();
    let mut remaining = total;

    while remaining > 0.0 && !open.is_empty() {
        let open_surface: f32 = open.iter().map(|&i| outlets[i].0).sum();
        if !(open_surface > 0.0) {
            break;
        }
        let saturated: Vec<usize> = open
            .iter()
            .copied()
            .filter(|&i| {
                let (surface, capacity) = outlets[i];
                remaining * surface / open_surface >= capacity - shares[i]
            })
            .collect();

        if saturated.is_empty() {
            for &i in &open {
                shares[i] += remaining * outlets[i].0 / open_surface;
            }
            break;
        }
        for i in saturated {
            remaining -= outlets[i].1 - shares[i];
            shares[i] = outlets[i].1;
            open.retain(|&j| j != i);
        }
        remaining = remaining.max(0.0);
    }
    shares
}

/// Signed flow per port (negative = toward the junction) and the totals.
fn balance(ports: &[JunctionPort], min_surface: f32) -> (Vec<f32>, f32, f32) {
    let total_in: f32 = ports.iter().map(|p| p.supply).filter(|&s| s > 0.0).sum();

    let outlets: Vec<usize> = (0..ports.len()).filter(|&i| ports[i].supply <= 0.0).collect();
    let pairs: Vec<(f32, f32)> = outlets.iter().map(|&i| (ports[i].surface, ports[i].capacity)).collect();
    let shares = distribute_by_surface(total_in, &pairs, min_surface);
    let delivered: f32 = shares.iter().sum();

    let scale = if total_in > 0.0 { delivered / total_in } else { 0.0 };
    let mut flows: Vec<f32> = ports
        .iter()
        .map(|p| if p.supply > 0.0 { -p.supply * scale } else { 0.0 })
        .collect();
    for (slot, share) in outlets.into_iter().zip(shares) {
        flows[slot] = share;
    }
    (flows, total_in * scale, delivered)
}

/// Clamp a machine-reported rate to a finite, non-negative value.
fn sanitize(machine: MachineId, port: &str, value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        log::warn!("machine {machine:?} port '{port}' reported non-finite rate {value}");
        0.0
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

impl VehiclePlumbing {
    /// Advance every pipe by one tick. Writes only `flow` fields and pushes
    /// the realized rates to the machines; never changes structure.
    pub fn update_pipes(&mut self, dt: f32, host: &mut dyn PlumbingHost) {
        let mut direct = Vec::new();
        let mut open = Vec::new();
        for pipe in self.pipes() {
            if pipe.is_machine_to_machine() {
                direct.push(pipe.id());
            } else if pipe.junction_id().is_none() {
                open.push(pipe.id());
            }
        }

        for id in open {
            if let Some(pipe) = self.get_pipe_mut(id) {
                pipe.flow = 0.0;
            }
        }
        for id in direct {
            self.settle_direct(id, dt, host);
        }
        for junction in self.junction_ids() {
            self.settle_junction(junction, dt, host);
        }
        log::trace!("updated {} pipe(s) over {dt}s", self.pipe_count());
    }

    fn settle_direct(&mut self, id: PipeId, dt: f32, host: &mut dyn PlumbingHost) {
        let Some(pipe) = self.get_pipe(id) else {
            return;
        };
        let (Some(a), Some(b)) = (pipe.ma(), pipe.mb) else {
            return;
        };
        let port_a = pipe.port_a.clone();
        let port_b = pipe.port_b.clone();
        let capacity = self.config().pipe_capacity(pipe.surface);

        let (avail_a, accept_a) = match host.machine(a) {
            Some(m) => (
                sanitize(a, &port_a, m.available_flow(&port_a)),
                sanitize(a, &port_a, m.accept_flow(&port_a)),
            ),
            None => (0.0, 0.0),
        };
        let (avail_b, accept_b) = match host.machine(b) {
            Some(m) => (
                sanitize(b, &port_b, m.available_flow(&port_b)),
                sanitize(b, &port_b, m.accept_flow(&port_b)),
            ),
            None => (0.0, 0.0),
        };
        let forward = avail_a.min(accept_b).min(capacity);
        let backward = avail_b.min(accept_a).min(capacity);
        let flow = if host.machine(a).is_some() && host.machine(b).is_some() {
            forward - backward
        } else {
            0.0
        };

        if let Some(pipe) = self.get_pipe_mut(id) {
            pipe.flow = flow;
        }
        if let Some(m) = host.machine_mut(a) {
            m.push_flow(&port_a, -flow, dt);
        }
        if let Some(m) = host.machine_mut(b) {
            m.push_flow(&port_b, flow, dt);
        }
    }

    fn settle_junction(&mut self, id: JunctionId, dt: f32, host: &mut dyn PlumbingHost) {
        let Some(junction) = self.get_junction(id) else {
            return;
        };
        let mut ports = Vec::with_capacity(junction.port_count());
        let mut ends = Vec::with_capacity(junction.port_count());
        let mut idle = Vec::new();

        for &pipe_id in junction.pipe_ids() {
            let Some(pipe) = self.get_pipe(pipe_id) else {
                continue;
            };
            let Some((machine_id, machine)) = pipe.mb.and_then(|m| host.machine(m).map(|h| (m, h))) else {
                idle.push(pipe_id);
                continue;
            };
            let capacity = self.config().pipe_capacity(pipe.surface);
            let avail = sanitize(machine_id, &pipe.port_b, machine.available_flow(&pipe.port_b));
            let accept = sanitize(machine_id, &pipe.port_b, machine.accept_flow(&pipe.port_b));
            ports.push(JunctionPort {
                pipe: pipe_id,
                surface: pipe.surface,
                supply: avail.min(capacity),
                capacity: accept.min(capacity),
            });
            ends.push((machine_id, pipe.port_b.clone()));
        }

        let (flows, _, _) = balance(&ports, self.config().min_surface);

        for pipe_id in idle {
            if let Some(pipe) = self.get_pipe_mut(pipe_id) {
                pipe.flow = 0.0;
            }
        }
        for ((port, flow), (machine, port_name)) in ports.iter().zip(flows).zip(ends) {
            if let Some(pipe) = self.get_pipe_mut(port.pipe) {
                pipe.flow = flow;
            }
            if let Some(m) = host.machine_mut(machine) {
                m.push_flow(&port_name, flow, dt);
            }
        }
    }

    /// Redistribute a junction's current inflow among its outlets.
    ///
    /// Works on pipe state alone: pipes whose flow points toward the
    /// junction (negative) are inflows, every other incident pipe is an
    /// outlet limited only by surface capacity. Only `flow` fields change.
    pub fn junction_flow_rate(&mut self, id: JunctionId, dt: f32) -> Result<JunctionFlow, PlumbingError> {
        let junction = self.get_junction(id).ok_or(PlumbingError::JunctionNotFound(id))?;
        let ports: Vec<JunctionPort> = junction
            .pipe_ids()
            .iter()
            .filter_map(|&p| self.get_pipe(p))
            .map(|pipe| JunctionPort {
                pipe: pipe.id(),
                surface: pipe.surface,
                supply: if pipe.flow < 0.0 { -pipe.flow } else { 0.0 },
                capacity: self.config().pipe_capacity(pipe.surface),
            })
            .collect();

        let (flows, inflow, outflow) = balance(&ports, self.config().min_surface);
        for (port, flow) in ports.iter().zip(flows) {
            if let Some(pipe) = self.get_pipe_mut(port.pipe) {
                pipe.flow = flow;
            }
        }
        Ok(JunctionFlow {
            inflow,
            outflow,
            volume: outflow * dt,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlumbingConfig;
    use crate::grid::{GridPos, GridSize};
    use crate::test_utils::*;

    fn two_tanks(a: TestTank, b: TestTank) -> (TestVehicle, VehiclePlumbing, PipeId) {
        let mut vehicle = TestVehicle::new();
        let a = vehicle.add_tank(a);
        let b = vehicle.add_tank(b.at(GridPos::new(3, 0), GridSize::new(1, 1)));
        let mut plumbing = VehiclePlumbing::new();
        let pipe = plumbing.connect_machines(a, "out", b, "in", 1.0);
        (vehicle, plumbing, pipe)
    }

    // -----------------------------------------------------------------------
    // Distribution
    // -----------------------------------------------------------------------

    #[test]
    fn distribution_is_proportional_to_surface() {
        let inf = f32::INFINITY;
        let shares = distribute_by_surface(6.0, &[(1.0, inf), (2.0, inf), (3.0, inf)], 0.0);
        assert!(approx_eq(shares[0], 1.0));
        assert!(approx_eq(shares[1], 2.0));
        assert!(approx_eq(shares[2], 3.0));
    }

    #[test]
    fn distribution_spills_around_capped_outlets() {
        let inf = f32::INFINITY;
        let shares = distribute_by_surface(6.0, &[(1.0, 0.5), (1.0, inf), (1.0, inf)], 0.0);
        assert!(approx_eq(shares[0], 0.5));
        assert!(approx_eq(shares[1], 2.75));
        assert!(approx_eq(shares[2], 2.75));
        assert!(approx_eq(shares.iter().sum(), 6.0));
    }

    #[test]
    fn distribution_stops_when_all_outlets_saturate() {
        let shares = distribute_by_surface(10.0, &[(1.0, 1.0), (3.0, 2.0)], 0.0);
        assert_eq!(shares, vec![1.0, 2.0]);
    }

    #[test]
    fn zero_surface_yields_zero_not_nan() {
        let inf = f32::INFINITY;
        let shares = distribute_by_surface(5.0, &[(0.0, inf), (0.0, inf)], 0.0);
        assert_eq!(shares, vec![0.0, 0.0]);
        assert!(distribute_by_surface(5.0, &[], 0.0).is_empty());
        assert_eq!(distribute_by_surface(f32::NAN, &[(1.0, inf)], 0.0), vec![0.0]);
    }

    #[test]
    fn one_share_per_outlet() {
        let shares = distribute_by_surface(3.0, &[(1.0, 0.0), (1.0, f32::INFINITY)], 0.0);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0], 0.0);
        assert!(approx_eq(shares[1], 3.0));
    }

    #[test]
    fn min_surface_excludes_thin_outlets() {
        let inf = f32::INFINITY;
        let shares = distribute_by_surface(4.0, &[(0.1, inf), (1.0, inf)], 0.5);
        assert_eq!(shares[0], 0.0);
        assert!(approx_eq(shares[1], 4.0));
    }

    // -----------------------------------------------------------------------
    // Direct pipes
    // -----------------------------------------------------------------------

    #[test]
    fn direct_pipe_is_supply_limited() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).supplying("out", 2.0),
            TestTank::new(MachineId(2)).accepting("in", 5.0),
        );
        plumbing.update_pipes(0.5, &mut vehicle);

        assert!(approx_eq(plumbing.get_pipe(pipe).unwrap().flow, 2.0));
        assert!(approx_eq(vehicle.tank(MachineId(1)).last_rate("out"), -2.0));
        assert!(approx_eq(vehicle.tank(MachineId(2)).last_rate("in"), 2.0));
        assert!(approx_eq(vehicle.tank(MachineId(2)).volume("in"), 1.0));
    }

    #[test]
    fn direct_pipe_is_acceptance_limited() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).supplying("out", 9.0),
            TestTank::new(MachineId(2)).accepting("in", 3.0),
        );
        plumbing.update_pipes(1.0, &mut vehicle);
        assert!(approx_eq(plumbing.get_pipe(pipe).unwrap().flow, 3.0));
    }

    #[test]
    fn direct_pipe_flows_backward_when_b_supplies() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).accepting("out", 4.0),
            TestTank::new(MachineId(2)).supplying("in", 1.5),
        );
        plumbing.update_pipes(1.0, &mut vehicle);
        assert!(approx_eq(plumbing.get_pipe(pipe).unwrap().flow, -1.5));
        assert!(approx_eq(vehicle.tank(MachineId(1)).last_rate("out"), 1.5));
    }

    #[test]
    fn surface_capacity_caps_direct_flow() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).supplying("out", 10.0),
            TestTank::new(MachineId(2)).accepting("in", 10.0),
        );
        plumbing.set_config(PlumbingConfig {
            flow_per_surface: Some(3.0),
            ..PlumbingConfig::default()
        });
        plumbing.update_pipes(1.0, &mut vehicle);
        assert!(approx_eq(plumbing.get_pipe(pipe).unwrap().flow, 3.0));
    }

    #[test]
    fn non_finite_machine_values_become_zero() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).supplying("out", f32::NAN),
            TestTank::new(MachineId(2)).accepting("in", f32::INFINITY),
        );
        plumbing.update_pipes(1.0, &mut vehicle);
        assert_eq!(plumbing.get_pipe(pipe).unwrap().flow, 0.0);
    }

    #[test]
    fn open_and_orphaned_pipes_carry_nothing() {
        let (mut vehicle, mut plumbing, pipe) = two_tanks(
            TestTank::new(MachineId(1)).supplying("out", 2.0),
            TestTank::new(MachineId(2)).accepting("in", 5.0),
        );
        let open = plumbing.create_pipe();
        plumbing.get_pipe_mut(open).unwrap().flow = 7.0;
        vehicle.remove_tank(MachineId(2));

        plumbing.update_pipes(1.0, &mut vehicle);

        assert_eq!(plumbing.get_pipe(open).unwrap().flow, 0.0);
        assert_eq!(plumbing.get_pipe(pipe).unwrap().flow, 0.0);
    }

    // -----------------------------------------------------------------------
    // Junctions
    // -----------------------------------------------------------------------

    #[test]
    fn junction_splits_by_surface() {
        let mut vehicle = TestVehicle::new();
        let mut plumbing = VehiclePlumbing::new();
        let (_, source, outlets) = build_junction_star(&mut vehicle, &mut plumbing, 6.0, 100.0, &[1.0, 2.0, 3.0]);

        plumbing.update_pipes(1.0, &mut vehicle);

        assert!(approx_eq(plumbing.get_pipe(source).unwrap().flow, -6.0));
        for (pipe, expected) in outlets.iter().zip([1.0, 2.0, 3.0]) {
            assert!(approx_eq(plumbing.get_pipe(*pipe).unwrap().flow, expected));
        }
    }

    #[test]
    fn junction_throttles_inflow_to_what_outlets_take() {
        let mut vehicle = TestVehicle::new();
        let mut plumbing = VehiclePlumbing::new();
        let (_, source, outlets) = build_junction_star(&mut vehicle, &mut plumbing, 10.0, 1.0, &[1.0, 1.0]);

        plumbing.update_pipes(1.0, &mut vehicle);

        let out: f32 = outlets.iter().map(|&p| plumbing.get_pipe(p).unwrap().flow).sum();
        assert!(approx_eq(out, 2.0));
        assert!(approx_eq(plumbing.get_pipe(source).unwrap().flow, -2.0));
    }

    #[test]
    fn dead_end_junction_moves_nothing() {
        let mut vehicle = TestVehicle::new();
        let mut plumbing = VehiclePlumbing::new();
        let (_, source, _) = build_junction_star(&mut vehicle, &mut plumbing, 5.0, 0.0, &[]);

        plumbing.update_pipes(1.0, &mut vehicle);

        let flow = plumbing.get_pipe(source).unwrap().flow;
        assert_eq!(flow, 0.0);
        assert!(flow.is_finite());
    }

    #[test]
    fn constant_inputs_give_stable_flows() {
        let mut vehicle = TestVehicle::new();
        let mut plumbing = VehiclePlumbing::new();
        build_junction_star(&mut vehicle, &mut plumbing, 4.0, 3.0, &[1.0, 2.0]);

        plumbing.update_pipes(0.1, &mut vehicle);
        let first: Vec<f32> = plumbing.pipes().map(|p| p.flow).collect();
        for _ in 0..10 {
            plumbing.update_pipes(0.1, &mut vehicle);
        }
        let later: Vec<f32> = plumbing.pipes().map(|p| p.flow).collect();
        assert_eq!(first, later);
    }

    #[test]
    fn junction_flow_rate_conserves_from_pipe_state() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        let inlet = attach_machine_pipe(&mut plumbing, j, MachineId(1), "out", 1.0);
        let outlets: Vec<PipeId> = [1.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, &s)| attach_machine_pipe(&mut plumbing, j, MachineId(2 + i as u64), "in", s))
            .collect();
        plumbing.get_pipe_mut(inlet).unwrap().flow = -8.0;

        let result = plumbing.junction_flow_rate(j, 0.25).unwrap();

        assert!(approx_eq(result.inflow, 8.0));
        assert!(approx_eq(result.outflow, 8.0));
        assert!(approx_eq(result.volume, 2.0));
        assert!(approx_eq(plumbing.get_pipe(outlets[0]).unwrap().flow, 2.0));
        assert!(approx_eq(plumbing.get_pipe(outlets[1]).unwrap().flow, 6.0));
        assert!(approx_eq(plumbing.get_pipe(inlet).unwrap().flow, -8.0));
    }

    #[test]
    fn junction_flow_rate_on_isolated_junction_is_zero() {
        let mut plumbing = VehiclePlumbing::new();
        let j = plumbing.create_pipe_junction();
        assert_eq!(plumbing.junction_flow_rate(j, 1.0), Ok(JunctionFlow::default()));
        assert_eq!(
            plumbing.junction_flow_rate(JunctionId(40), 1.0),
            Err(PlumbingError::JunctionNotFound(JunctionId(40)))
        );
    }

    #[test]
    fn solver_never_touches_structure() {
        let mut vehicle = TestVehicle::new();
        let mut plumbing = VehiclePlumbing::new();
        build_junction_star(&mut vehicle, &mut plumbing, 4.0, 3.0, &[1.0, 2.0]);
        let pipes = plumbing.pipe_ids();
        let keys: Vec<_> = pipes.iter().map(|&p| plumbing.pipe_key(p)).collect();

        plumbing.update_pipes(1.0, &mut vehicle);

        assert_eq!(plumbing.pipe_ids(), pipes);
        let after: Vec<_> = pipes.iter().map(|&p| plumbing.pipe_key(p)).collect();
        assert_eq!(keys, after);
        assert!(crate::validation::is_consistent(&plumbing));
    }
}
