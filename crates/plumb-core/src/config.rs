//! Tunable parameters of a plumbing network.
//!
//! Loaded from data files by `plumb-data`; every field has a default so a
//! partial file is valid.

use serde::{Deserialize, Serialize};

/// Parameters shared by placement queries and the flow solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlumbingConfig {
    /// Cells added on every side of an element when a query asks for
    /// expanded rectangles.
    pub connection_margin: i32,
    /// `find_free_space` scans positions in `[0, limit)` on both axes.
    pub free_space_search_limit: i32,
    /// Maximum rate per unit of surface a pipe can carry. `None` leaves pipes
    /// unlimited so machine ports are the only constraint.
    pub flow_per_surface: Option<f32>,
    /// Outlets with a surface at or below this value carry nothing.
    pub min_surface: f32,
}

impl Default for PlumbingConfig {
    fn default() -> Self {
        Self {
            connection_margin: 1,
            free_space_search_limit: 256,
            flow_per_surface: None,
            min_surface: 0.0,
        }
    }
}

impl PlumbingConfig {
    /// Largest rate a pipe of the given surface may carry.
    pub fn pipe_capacity(&self, surface: f32) -> f32 {
        match self.flow_per_surface {
            Some(per_surface) => (per_surface * surface).max(0.0),
            None => f32::INFINITY,
        }
    }
}
