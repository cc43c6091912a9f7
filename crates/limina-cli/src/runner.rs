//! Job runner: ties together geometry, the FDFD solver, and the session.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;

use limina_core::{ComplexGrid, EmSolver, GridConfig, PhotonicsSession, TmFdfdSolver};
use limina_geometry::{paint_grid, rasterise_mask};

use crate::config::JobConfig;

/// Summary of a run, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub method: String,
    pub grid: GridConfig,
    pub num_design_cells: usize,
    pub num_background_cells: usize,
    pub greens_prefactor: f64,
    pub operator_nnz: usize,
    /// Frobenius norm of the restricted inverse.
    pub gaa_inverse_norm: f64,
    /// Total $|E|^2$ of the incident field over the grid, if computed.
    pub field_energy: Option<f64>,
}

/// Results from a job run.
pub struct JobOutput {
    pub summary: RunSummary,
    pub gaa_inverse: Array2<Complex64>,
    pub incident_field: Option<ComplexGrid>,
}

/// Build the session described by `job`, without solving anything.
pub fn build_session(job: &JobConfig) -> Result<PhotonicsSession<TmFdfdSolver>> {
    let grid = job.grid.to_config();
    let solver = TmFdfdSolver::new(grid)
        .context("Invalid [grid] section")?
        .with_residual_tolerance(job.solver.residual_tolerance);
    let mut session = PhotonicsSession::new(solver).with_formulation(job.solver.formulation()?);

    let mask = rasterise_mask(&job.design, grid.nx, grid.ny, grid.dl);
    session.set_design_mask(mask)?;

    if !job.background.is_empty() {
        let chi = paint_grid(&job.background, grid.nx, grid.ny, grid.dl);
        session.set_background_susceptibility(Some(chi))?;
    }
    if !job.source.is_empty() {
        let current = paint_grid(&job.source, grid.nx, grid.ny, grid.dl);
        session.set_current(Some(current))?;
    }

    Ok(session)
}

/// Run a full job from a parsed configuration.
pub fn run_job(job: &JobConfig) -> Result<JobOutput> {
    let mut session = build_session(job)?;
    let grid = session.solver().config()?;
    let partition = session
        .design_partition()
        .context("Design mask was not set")?;

    println!(
        "  Grid: {}x{} cells, dl={}, omega={}, PML=({}, {})",
        grid.nx, grid.ny, grid.dl, grid.omega, grid.npml_x, grid.npml_y
    );
    println!(
        "  Design cells: {} / background cells: {}",
        partition.num_design(),
        partition.num_background()
    );
    if partition.num_design() == 0 {
        log::warn!("design region is empty; the restricted inverse will be 0x0");
    }

    let operators = session
        .build_operators()
        .context("Failed to build design operators")?
        .clone();
    info!(
        "operator has {} non-zeros; GaaInv is {}x{}",
        limina_core::sparse::nnz(&operators.operator),
        operators.gaa_inv.nrows(),
        operators.gaa_inv.ncols()
    );

    let incident_field = if session.current().is_some() {
        Some(
            session
                .get_incident_field(None, true)
                .context("Failed to compute incident field")?,
        )
    } else {
        println!("  No [[source]] given; skipping incident field.");
        None
    };

    let summary = RunSummary {
        method: session.solver().method_name().to_string(),
        grid,
        num_design_cells: partition.num_design(),
        num_background_cells: partition.num_background(),
        greens_prefactor: grid.greens_prefactor(),
        operator_nnz: limina_core::sparse::nnz(&operators.operator),
        gaa_inverse_norm: operators.gaa_inv.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt(),
        field_energy: incident_field
            .as_ref()
            .map(|f| f.iter().map(|v| v.norm_sqr()).sum()),
    };

    Ok(JobOutput {
        summary,
        gaa_inverse: operators.gaa_inv,
        incident_field,
    })
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write the non-zero entries of the restricted inverse as CSV.
pub fn write_gaa_inverse_csv(gaa_inv: &Array2<Complex64>, path: &Path, job: &JobConfig) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writeln!(file, "# Limina: design-restricted inverse Green's function")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# omega: {}", job.grid.omega)?;
    writeln!(file, "# shape: {}x{}", gaa_inv.nrows(), gaa_inv.ncols())?;
    writeln!(file, "#")?;
    writeln!(file, "row,col,re,im")?;

    for ((i, j), v) in gaa_inv.indexed_iter() {
        if v.norm() > 0.0 {
            writeln!(file, "{},{},{:.12e},{:.12e}", i, j, v.re, v.im)?;
        }
    }

    println!("  Restricted inverse written to {}", path.display());
    Ok(())
}

/// Write the incident field as CSV, one row per cell.
pub fn write_field_csv(field: &ComplexGrid, path: &Path, dl: f64) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writeln!(file, "# Limina: incident field E_z")?;
    writeln!(file, "# Grid: {}x{}, dl={}", field.nrows(), field.ncols(), dl)?;
    writeln!(file, "#")?;
    writeln!(file, "ix,iy,x,y,re,im,|E|_sq")?;

    for ((ix, iy), v) in field.indexed_iter() {
        let [x, y] = limina_geometry::cell_centre(ix, iy, dl);
        writeln!(
            file,
            "{},{},{:.6},{:.6},{:.12e},{:.12e},{:.12e}",
            ix,
            iy,
            x,
            y,
            v.re,
            v.im,
            v.norm_sqr()
        )?;
    }

    println!("  Incident field written to {}", path.display());
    Ok(())
}

/// Write the run summary as pretty-printed JSON.
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(summary).context("Failed to serialise summary")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Summary written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use approx::assert_relative_eq;

    const JOB: &str = r#"
[grid]
omega = 6.283185307179586
nx = 20
ny = 16
npml_x = 4
npml_y = 4
dl = 0.1

[[design]]
type = "Rectangle"
centre = [1.0, 0.8]
half_extents = [0.15, 0.15]

[[background]]
value = [2.0, 0.0]
shape = { type = "Disk", centre = [0.6, 0.8], radius = 0.1 }

[[source]]
value = [1.0, 0.0]
shape = { type = "Disk", centre = [0.55, 0.45], radius = 0.04 }
"#;

    #[test]
    fn test_run_job_end_to_end() {
        let job = parse_config(JOB).unwrap();
        let output = run_job(&job).unwrap();
        let n = output.summary.num_design_cells;
        assert!(n > 0);
        assert_eq!(output.gaa_inverse.dim(), (n, n));
        assert_eq!(n + output.summary.num_background_cells, 20 * 16);
        assert_relative_eq!(
            output.summary.greens_prefactor,
            1.0 / (job.grid.omega * job.grid.omega),
            max_relative = 1e-12
        );
        assert!(output.incident_field.is_some());
        assert!(output.summary.field_energy.unwrap() > 0.0);
    }

    #[test]
    fn test_dense_formulation_fails() {
        let mut job = parse_config(JOB).unwrap();
        job.solver.formulation = "dense".into();
        assert!(run_job(&job).is_err());
    }

    #[test]
    fn test_no_source_skips_field() {
        let mut job = parse_config(JOB).unwrap();
        job.source.clear();
        let output = run_job(&job).unwrap();
        assert!(output.incident_field.is_none());
        assert!(output.summary.field_energy.is_none());
    }
}
