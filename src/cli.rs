//! CLI surface (A1): one subcommand per pipeline stage, each layering
//! `--config` over its own flags, mirroring the original's per-stage
//! scripts (`DeviceGenerator`, `AppGenerator`, `PlacementGenerator`,
//! `Processing`, `Archiver`, `Visualizer`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// fogscape: a discrete-event simulator for workload placement on edge/fog
/// networks.
#[derive(Debug, Parser)]
#[command(name = "fogscape", version, about)]
pub struct Cli {
    /// Configuration JSON file, layered under the subcommand's own flags.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pipeline stage to run.
    #[command(subcommand)]
    pub command: Command,
}

/// One pipeline stage.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic device catalog and its links.
    GenerateDevices {
        /// Where to write the Device JSON.
        #[arg(long, default_value = "latest/devices.json")]
        output: PathBuf,
    },
    /// Generate a synthetic application catalog.
    GenerateApplications {
        /// Device catalog the applications will eventually be placed on
        /// (needed only to size routing-unrelated randomization seeds).
        #[arg(long, default_value = "latest/devices.json")]
        devices: PathBuf,
        /// Where to write the Application JSON.
        #[arg(long, default_value = "latest/applications.json")]
        output: PathBuf,
    },
    /// Generate a synthetic arrivals (Placements) catalog.
    GeneratePlacements {
        /// Device catalog to draw requesting devices from.
        #[arg(long, default_value = "latest/devices.json")]
        devices: PathBuf,
        /// Application catalog to draw arrivals from.
        #[arg(long, default_value = "latest/applications.json")]
        applications: PathBuf,
        /// Where to write the Placements JSON.
        #[arg(long, default_value = "latest/placements.json")]
        output: PathBuf,
    },
    /// Run the simulation to completion and export the Results CSV.
    Process {
        /// Device catalog.
        #[arg(long, default_value = "latest/devices.json")]
        devices: PathBuf,
        /// Application catalog.
        #[arg(long, default_value = "latest/applications.json")]
        applications: PathBuf,
        /// Arrivals (Placements) catalog.
        #[arg(long, default_value = "latest/placements.json")]
        placements: PathBuf,
        /// Output folder for the Results CSV (overrides `config.output_folder`).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Copy the latest run's inputs/outputs into a dated archive folder.
    Archive {
        /// Destination folder.
        #[arg(long, default_value = "today/")]
        date: PathBuf,
        /// Device catalog to archive.
        #[arg(long, default_value = "latest/devices.json")]
        devices: PathBuf,
        /// Application catalog to archive.
        #[arg(long, default_value = "latest/applications.json")]
        applications: PathBuf,
        /// Arrivals catalog to archive.
        #[arg(long, default_value = "latest/placements.json")]
        placements: PathBuf,
        /// Results CSV to archive.
        #[arg(long, default_value = "latest/results.csv")]
        results: PathBuf,
    },
    /// Export the device topology as a Graphviz DOT file.
    Visualize {
        /// Device catalog to render.
        #[arg(long, default_value = "latest/devices.json")]
        devices: PathBuf,
        /// Where to write the DOT file.
        #[arg(long, default_value = "latest/devices.dot")]
        output: PathBuf,
    },
}

/// Load `config` if given, falling back to [`Config::default`].
pub fn load_config(path: Option<&PathBuf>) -> crate::error::Result<Config> {
    match path {
        Some(p) => Config::load(p),
        None => Ok(Config::default()),
    }
}
