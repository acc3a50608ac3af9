//! Binary entry point: parses the CLI surface (A1) and dispatches to the
//! matching pipeline stage.

use clap::Parser;

use fogscape::catalog::{self, PlacementRecord};
use fogscape::cli::{self, Cli, Command};
use fogscape::constants::TIME_PERIOD;
use fogscape::environment::Environment;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_ref())?;

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", config.loglevel.as_filter());
    }
    pretty_env_logger::init_timed();

    run(config, cli.command)?;
    Ok(())
}

fn run(config: fogscape::config::Config, command: Command) -> fogscape::error::Result<()> {
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(config.random_seed);

    match command {
        Command::GenerateDevices { output } => {
            let mut env = Environment::new(config);
            catalog::generate_devices(&mut env, &mut rng);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            catalog::export_devices(&output, &catalog::export_catalog_from_env(&env))?;
            log::info!("wrote {} devices to {}", env.devices.len(), output.display());
        }

        Command::GenerateApplications { devices, output } => {
            let mut env = Environment::new(config);
            catalog::load_devices(&mut env, catalog::import_devices(&devices)?);
            let app_ids = catalog::generate_applications(&mut env, &mut rng);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            catalog::export_applications(&output, &catalog::export_catalog_applications(&env))?;
            log::info!("wrote {} applications to {}", app_ids.len(), output.display());
        }

        Command::GeneratePlacements { devices, applications, output } => {
            let mut env = Environment::new(config);
            catalog::load_devices(&mut env, catalog::import_devices(&devices)?);
            catalog::load_applications(&mut env, catalog::import_applications(&applications)?);
            let app_ids: Vec<_> = {
                let mut ids: Vec<_> = env.applications.keys().copied().collect();
                ids.sort_unstable();
                ids
            };
            let placements = catalog::generate_placements(&env, &app_ids, &mut rng);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            catalog::export_placements(&output, &placements)?;
            log::info!("wrote {} placements to {}", placements.len(), output.display());
        }

        Command::Process { devices, applications, placements, output } => {
            let mut config = config;
            if let Some(output) = output {
                config.output_folder = output.to_string_lossy().into_owned();
            }
            let mut env = Environment::new(config);
            catalog::load_devices(&mut env, catalog::import_devices(&devices)?);
            catalog::load_applications(&mut env, catalog::import_applications(&applications)?);

            let arrivals: Vec<PlacementRecord> = catalog::import_placements(&placements)?;
            for arrival in &arrivals {
                env.enqueue_arrival(arrival.application, arrival.requesting_device, arrival.placement_time);
            }
            let horizon = arrivals.iter().map(|a| a.placement_time).max().unwrap_or(0).max(TIME_PERIOD);
            env.enqueue_final_report(horizon);

            log::info!("running simulation over {} arrivals, horizon={horizon}", arrivals.len());
            env.run();
        }

        Command::Archive { date, devices, applications, placements, results } => {
            std::fs::create_dir_all(&date)?;
            for (src, name) in [(&devices, "devices.json"), (&applications, "applications.json"), (&placements, "placements.json"), (&results, "results.csv")] {
                std::fs::copy(src, date.join(name))?;
            }
            log::info!("archived latest run to {}", date.display());
        }

        Command::Visualize { devices, output } => {
            let mut env = Environment::new(config);
            catalog::load_devices(&mut env, catalog::import_devices(&devices)?);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, env.network.to_dot())?;
            log::info!("wrote topology graph to {}", output.display());
        }
    }

    Ok(())
}
