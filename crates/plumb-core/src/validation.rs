//! Consistency checks for a plumbing network.
//!
//! Reports every broken invariant instead of stopping at the first one, so
//! tests and debug tooling can show the whole picture after an edit.

use crate::element::PlumbingElement;
use crate::id::{ElementId, JunctionId, PipeId};
use crate::machine::PlumbingHost;
use crate::plumbing::VehiclePlumbing;

// ---------------------------------------------------------------------------
// Issue types
// ---------------------------------------------------------------------------

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Storage and the id index disagree on how many entries exist.
    CountMismatch {
        what: &'static str,
        stored: usize,
        indexed: usize,
    },
    /// The index maps an id to a slot holding a different id.
    IndexMismatch { what: &'static str, id: u64 },
    /// An id at or above the allocator, which could collide later.
    UnallocatedPipeId(PipeId),
    UnallocatedJunctionId(JunctionId),
    /// A pipe names a junction that does not exist.
    DanglingJunction { pipe: PipeId, junction: JunctionId },
    /// A pipe names a junction whose port list does not contain it.
    MissingBackReference { pipe: PipeId, junction: JunctionId },
    /// A junction lists the same pipe more than once.
    DuplicateBackReference { pipe: PipeId, junction: JunctionId },
    /// A junction lists a pipe that is missing or attached elsewhere.
    OrphanPort { junction: JunctionId, pipe: PipeId },
    /// A pipe's cached junction handle disagrees with its junction id.
    StalePipeKey(PipeId),
    /// A junction's cached pipe handles disagree with its id list.
    StaleJunctionKeys(JunctionId),
    /// A junction pipe also has a machine on its "a" side.
    MachineOnJunctionSide(PipeId),
}

// ---------------------------------------------------------------------------
// Graph checks
// ---------------------------------------------------------------------------

/// Check identity, back-reference and slot-handle invariants.
pub fn check_consistency(plumbing: &VehiclePlumbing) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    let pipe_ids = plumbing.pipe_ids();
    let junction_ids = plumbing.junction_ids();
    if pipe_ids.len() != plumbing.pipe_count() {
        issues.push(ConsistencyIssue::CountMismatch {
            what: "pipe",
            stored: plumbing.pipe_count(),
            indexed: pipe_ids.len(),
        });
    }
    if junction_ids.len() != plumbing.junction_count() {
        issues.push(ConsistencyIssue::CountMismatch {
            what: "junction",
            stored: plumbing.junction_count(),
            indexed: junction_ids.len(),
        });
    }

    for &id in &pipe_ids {
        match plumbing.get_pipe(id) {
            Some(pipe) if pipe.id() == id => {}
            _ => issues.push(ConsistencyIssue::IndexMismatch { what: "pipe", id: id.0 }),
        }
        if id >= plumbing.next_pipe_id() {
            issues.push(ConsistencyIssue::UnallocatedPipeId(id));
        }
    }
    for &id in &junction_ids {
        match plumbing.get_junction(id) {
            Some(junction) if junction.id() == id => {}
            _ => issues.push(ConsistencyIssue::IndexMismatch {
                what: "junction",
                id: id.0,
            }),
        }
        if id >= plumbing.next_junction_id() {
            issues.push(ConsistencyIssue::UnallocatedJunctionId(id));
        }
    }

    // Pipe -> junction direction.
    for pipe in plumbing.pipes() {
        let Some(junction_id) = pipe.junction_id() else {
            if pipe.junction_key().is_some() {
                issues.push(ConsistencyIssue::StalePipeKey(pipe.id()));
            }
            continue;
        };
        if pipe.ma().is_some() {
            issues.push(ConsistencyIssue::MachineOnJunctionSide(pipe.id()));
        }
        if pipe.junction_key() != plumbing.junction_key(junction_id) {
            issues.push(ConsistencyIssue::StalePipeKey(pipe.id()));
        }
        let Some(junction) = plumbing.get_junction(junction_id) else {
            issues.push(ConsistencyIssue::DanglingJunction {
                pipe: pipe.id(),
                junction: junction_id,
            });
            continue;
        };
        match junction.pipe_ids().iter().filter(|&&p| p == pipe.id()).count() {
            0 => issues.push(ConsistencyIssue::MissingBackReference {
                pipe: pipe.id(),
                junction: junction_id,
            }),
            1 => {}
            _ => issues.push(ConsistencyIssue::DuplicateBackReference {
                pipe: pipe.id(),
                junction: junction_id,
            }),
        }
    }

    // Junction -> pipe direction.
    for junction in plumbing.junctions() {
        for &pipe_id in junction.pipe_ids() {
            let attached_here = plumbing
                .get_pipe(pipe_id)
                .is_some_and(|p| p.junction_id() == Some(junction.id()));
            if !attached_here {
                issues.push(ConsistencyIssue::OrphanPort {
                    junction: junction.id(),
                    pipe: pipe_id,
                });
            }
        }
        let expected: Vec<_> = junction
            .pipe_ids()
            .iter()
            .filter_map(|&p| plumbing.pipe_key(p))
            .collect();
        if junction.pipe_keys() != expected.as_slice() {
            issues.push(ConsistencyIssue::StaleJunctionKeys(junction.id()));
        }
    }

    issues
}

/// True if [`check_consistency`] finds nothing.
pub fn is_consistent(plumbing: &VehiclePlumbing) -> bool {
    check_consistency(plumbing).is_empty()
}

// ---------------------------------------------------------------------------
// Grid checks
// ---------------------------------------------------------------------------

/// Every pair of distinct grid elements whose occupied rectangles overlap.
pub fn check_overlaps(plumbing: &VehiclePlumbing, host: &dyn PlumbingHost) -> Vec<(ElementId, ElementId)> {
    let elements: Vec<PlumbingElement<'_>> = plumbing.get_all_elements(host);
    let mut overlaps = Vec::new();
    for (i, a) in elements.iter().enumerate() {
        for b in &elements[i + 1..] {
            if a.rect(0).intersects(&b.rect(0))
                && let (Some(ia), Some(ib)) = (a.element_id(), b.element_id())
            {
                overlaps.push((ia, ib));
            }
        }
    }
    overlaps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
