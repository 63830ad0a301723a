//! Conversion settings.
//!
//! Every tunable of the pipeline lives here so a run can be reproduced from a
//! single JSON document.  Missing fields fall back to their defaults.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    // === AREAS ===
    /// Fill the declared dataset bounds that no other area covers with
    /// `landcover=terrain` areas.
    pub create_terrain: bool,

    /// The terrain boundary is split into this many cells per axis before the
    /// other areas are subtracted.
    ///
    /// More cells keep the boolean operations small at the cost of more
    /// terrain areas.
    pub terrain_cells_per_axis: usize,

    // === SPATIAL INDEX ===
    /// Edge length of one cell of the overlap grid (metres).
    pub grid_cell_size: f64,

    /// Upper bound on the number of grid cells along either axis.  Large
    /// datasets get coarser cells instead of more of them.
    pub max_grid_cells_per_axis: usize,

    // === OVERLAP CLASSIFICATION ===
    /// Area outline crossings closer than this to a node shared by both areas
    /// are not treated as intersections (metres).
    pub shared_node_tolerance: f64,

    /// A way segment touching an area at a shared node only intersects it if
    /// a crossing lies farther than `segment length / line_tolerance_divisor`
    /// from the shared node.
    pub line_tolerance_divisor: f64,

    // === ELEVATION ===
    /// Smoothness triples whose change of incline per metre exceeds this are
    /// reported after solving.
    pub smoothness_threshold: f64,

    pub solver: SolverConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            create_terrain: true,
            terrain_cells_per_axis: 4,
            grid_cell_size: 50.0,
            max_grid_cells_per_axis: 256,
            shared_node_tolerance: 0.01,
            line_tolerance_divisor: 100.0,
            smoothness_threshold: 200.0,
            solver: SolverConfig::default(),
        }
    }
}

/// Settings for the iterative elevation solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Hard cap on relaxation sweeps.
    pub max_iterations: usize,
    /// The solve stops once no constraint is violated by more than this
    /// (metres).
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_iterations: 2000, tolerance: 1e-6 }
    }
}

impl ConversionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse conversion config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.terrain_cells_per_axis > 0, "terrain_cells_per_axis must be positive");
        ensure!(self.grid_cell_size > 0.0, "grid_cell_size must be positive, got {}", self.grid_cell_size);
        ensure!(self.max_grid_cells_per_axis > 0, "max_grid_cells_per_axis must be positive");
        ensure!(self.shared_node_tolerance >= 0.0, "shared_node_tolerance must not be negative");
        ensure!(self.line_tolerance_divisor > 0.0, "line_tolerance_divisor must be positive");
        ensure!(self.solver.tolerance > 0.0, "solver tolerance must be positive");
        Ok(())
    }
}
