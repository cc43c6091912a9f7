//! TOML configuration deserialisation for Limina jobs.

use limina_core::{GridConfig, QcqpFormulation};
use limina_geometry::{Layer, Shape2d};
use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub grid: GridSection,
    /// Shapes whose union forms the design region.
    #[serde(default)]
    pub design: Vec<Shape2d>,
    /// Background susceptibility layers, painted in order.
    #[serde(default)]
    pub background: Vec<Layer>,
    /// Current source layers, painted in order.
    #[serde(default)]
    pub source: Vec<Layer>,
    #[serde(default)]
    pub solver: SolverSection,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Grid parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct GridSection {
    pub omega: f64,
    pub nx: usize,
    pub ny: usize,
    #[serde(default)]
    pub npml_x: usize,
    #[serde(default)]
    pub npml_y: usize,
    pub dl: f64,
    #[serde(default)]
    pub bloch_x: f64,
    #[serde(default)]
    pub bloch_y: f64,
}

impl GridSection {
    pub fn to_config(&self) -> GridConfig {
        GridConfig {
            omega: self.omega,
            nx: self.nx,
            ny: self.ny,
            npml_x: self.npml_x,
            npml_y: self.npml_y,
            dl: self.dl,
            bloch_x: self.bloch_x,
            bloch_y: self.bloch_y,
        }
    }
}

/// Solver settings.
#[derive(Debug, Deserialize)]
pub struct SolverSection {
    /// Backward-error bound for sparse solves.
    #[serde(default = "default_residual_tolerance")]
    pub residual_tolerance: f64,
    /// QCQP formulation: "sparse" (default) or "dense".
    #[serde(default = "default_formulation")]
    pub formulation: String,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            residual_tolerance: default_residual_tolerance(),
            formulation: default_formulation(),
        }
    }
}

impl SolverSection {
    pub fn formulation(&self) -> anyhow::Result<QcqpFormulation> {
        match self.formulation.to_ascii_lowercase().as_str() {
            "sparse" => Ok(QcqpFormulation::Sparse),
            "dense" => Ok(QcqpFormulation::Dense),
            other => anyhow::bail!("Unknown formulation '{other}' (expected \"sparse\" or \"dense\")"),
        }
    }
}

fn default_residual_tolerance() -> f64 {
    limina_core::solver::direct::DEFAULT_RESIDUAL_TOLERANCE
}

fn default_formulation() -> String {
    "sparse".into()
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save the restricted inverse as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_gaa_inverse: bool,
    /// Whether to save the incident field as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_field: bool,
    /// Whether to write a JSON run summary (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_gaa_inverse: true,
            save_field: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Parse a TOML job configuration string.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
