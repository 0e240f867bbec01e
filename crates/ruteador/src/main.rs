use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use ruteador::{Config, CsvRouteStore, RouteSession, Shell, list_saved_routes, read_walkers_csv};
use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build walker routes from a table of team locations",
    long_about = None
)]
struct Args {
    /// Configuration file path (TOML); falls back to RUTEADOR_* environment variables
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Directory where routes are saved and listed
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Round coordinates to this many decimals before matching
    #[arg(short = 'p', long = "precision")]
    precision: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the consolidated markers of a walker table
    Markers {
        /// Walker table (Equipo, Latitud, Longitud)
        input: PathBuf,
    },
    /// List saved routes
    Routes,
    /// Build routes interactively, one command per line
    Shell {
        /// Walker table (Equipo, Latitud, Longitud)
        input: PathBuf,

        /// Read commands from this file instead of stdin
        #[arg(short = 's', long = "script")]
        script: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    debug!("{config:?}");

    match &args.command {
        Command::Markers { input } => {
            let session = load_session(input, &config)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (coordinate, label) in session.markers().iter() {
                writeln!(out, "{coordinate}\t{label}")?;
            }
        }
        Command::Routes => {
            for route in list_saved_routes(&config.output_dir)? {
                println!("{}\t{}", route.route_id, route.path.display());
            }
        }
        Command::Shell { input, script } => {
            let session = load_session(input, &config)?;
            if let Some(center) = session.map_center() {
                info!("Map center: {center}");
            }
            info!("Routes are saved to: {}", config.output_dir.display());

            let store = CsvRouteStore::new(&config.output_dir);
            let mut shell = Shell::new(session, store, &config.output_dir);
            let stdout = io::stdout();
            let mut out = stdout.lock();

            match script {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("Failed to open script {}", path.display()))?;
                    shell.run(BufReader::new(file), &mut out)?;
                }
                None => {
                    writeln!(out, "Type 'help' for commands.")?;
                    shell.run(io::stdin().lock(), &mut out)?;
                }
            }

            let session = shell.session();
            info!(
                "Session finished: {} records in {} markers remain unrouted",
                session.records().len(),
                session.markers().len()
            );
        }
    }

    Ok(())
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if args.precision.is_some() {
        config.coordinate_precision = args.precision;
    }
    config.validate()?;
    Ok(config)
}

fn load_session(input: &Path, config: &Config) -> Result<RouteSession> {
    let table = read_walkers_csv(input)
        .with_context(|| format!("Failed to read walker table {}", input.display()))?;
    info!(
        "Loaded {} walkers from {} ({} rows without coordinates)",
        table.records.len(),
        input.display(),
        table.dropped
    );
    Ok(RouteSession::load_with_precision(
        table.records,
        config.coordinate_precision,
    ))
}
