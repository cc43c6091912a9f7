//! Limina command-line interface.
//!
//! Compute design-restricted inverse Green's functions from TOML job files:
//! ```sh
//! limina-cli run job.toml
//! limina-cli validate job.toml
//! limina-cli info job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use limina_core::EmSolver;

#[derive(Parser)]
#[command(name = "limina-cli")]
#[command(about = "Limina: design-region Green's-function inverses for 2D TM FDFD")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without solving anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Print the grid, design region and prefactor of a job.
    Info {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Limina FDFD Solver");
            println!("==================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let result = runner::run_job(&job)?;

            // Determine output directory
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_gaa_inverse {
                let csv_path = out_dir.join("gaa_inverse.csv");
                runner::write_gaa_inverse_csv(&result.gaa_inverse, &csv_path, &job)?;
            }

            if job.output.save_field {
                if let Some(field) = &result.incident_field {
                    let field_path = out_dir.join("incident_field.csv");
                    runner::write_field_csv(field, &field_path, job.grid.dl)?;
                }
            }

            if job.output.save_json {
                let json_path = out_dir.join("summary.json");
                runner::write_summary_json(&result.summary, &json_path)?;
            }

            println!("Run complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            runner::build_session(&job)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Info { config } => {
            let job = config::load_config(&config)?;
            let session = runner::build_session(&job)?;
            let grid = session.solver().config()?;
            let design = session.design_partition().map_or(0, |p| p.num_design());

            println!("Solver:        {}", session.solver().method_name());
            println!("Grid:          {}x{} cells, dl={}", grid.nx, grid.ny, grid.dl);
            println!("omega:         {}", grid.omega);
            println!("PML:           ({}, {}) cells", grid.npml_x, grid.npml_y);
            println!("Bloch phases:  ({}, {})", grid.bloch_x, grid.bloch_y);
            println!("Design cells:  {} of {}", design, grid.num_cells());
            println!("Prefactor:     {:.6e}", grid.greens_prefactor());
            Ok(())
        }
    }
}
