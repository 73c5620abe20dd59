//! Compute client - submits tasks to a compute node and shows the results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use compute_client::{render_grid, render_tour, ClientConfig, Harness, RemoteComputer};
use compute_tasks::{City, EuclideanTspTask, MandelbrotSetTask, Tour};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "compute-client")]
#[command(about = "Submit tasks to a remote compute node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compute node address (host or host:port)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Service name to look up
    #[arg(long, global = true)]
    service: Option<String>,

    /// Times each task is run
    #[arg(short, long, global = true)]
    trials: Option<usize>,

    /// Directory for rendered images
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Mandelbrot and TSP demo tasks and render both
    Run,

    /// Solve a TSP instance
    Tsp {
        /// City as `x,y`; repeat for every city
        #[arg(long = "city", value_parser = parse_city, required = true)]
        cities: Vec<City>,
    },

    /// Evaluate a Mandelbrot grid
    Mandelbrot {
        /// Lower-left corner real part
        #[arg(long, default_value = "-2", allow_negative_numbers = true)]
        x: f64,
        /// Lower-left corner imaginary part
        #[arg(long, default_value = "-2", allow_negative_numbers = true)]
        y: f64,
        /// Edge length of the square region
        #[arg(long, default_value = "4")]
        edge: f64,
        /// Cells per edge
        #[arg(long, default_value = "256")]
        resolution: u32,
        /// Iteration limit
        #[arg(long, default_value = "64")]
        limit: u32,
    },

    /// Check that the compute node answers
    Ping,
}

const DEMO_CITIES: [[f64; 2]; 10] = [
    [6.0, 3.0],
    [2.0, 2.0],
    [5.0, 8.0],
    [1.0, 5.0],
    [1.0, 6.0],
    [2.0, 7.0],
    [2.0, 8.0],
    [6.0, 5.0],
    [1.0, 3.0],
    [6.0, 6.0],
];

const IMAGE_SIZE: u32 = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut config = ClientConfig::default();
    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Some(service) = cli.service {
        config.service_name = service;
    }
    if let Some(trials) = cli.trials {
        config.trials = trials;
    }
    if let Some(out) = cli.out {
        config.output_dir = out;
    }

    let computer = RemoteComputer::lookup(config.server_addr(), &config.service_name)
        .await
        .with_context(|| format!("lookup of {} at {} failed", config.service_name, config.server_addr()))?;
    info!(
        "Connected to {} v{}",
        computer.service(),
        computer.server_version()
    );
    let harness = Harness::new(&computer, config.trials);

    match cli.command {
        Commands::Run => {
            let mandelbrot = MandelbrotSetTask::new([-2.0, -2.0], 4.0, 256, 64)?;
            let tsp = EuclideanTspTask::from_coordinates(&DEMO_CITIES)?;

            let grid = harness.run(mandelbrot).await?;
            println!("{}", grid.table());
            let tour = harness.run(tsp.clone()).await?;
            println!("{}", tour.table());
            print_tour(&tour.output);

            save_grid(&config, &grid.output)?;
            save_tour(&config, tsp.cities(), &tour.output)?;
        }

        Commands::Tsp { cities } => {
            let tsp = EuclideanTspTask::new(cities)?;
            let tour = harness.run(tsp.clone()).await?;
            println!("{}", tour.table());
            print_tour(&tour.output);
            save_tour(&config, tsp.cities(), &tour.output)?;
        }

        Commands::Mandelbrot {
            x,
            y,
            edge,
            resolution,
            limit,
        } => {
            let task = MandelbrotSetTask::new([x, y], edge, resolution, limit)?;
            let grid = harness.run(task).await?;
            println!("{}", grid.table());
            save_grid(&config, &grid.output)?;
        }

        Commands::Ping => {
            computer.ping().await?;
            println!("{} is alive", config.server_addr());
        }
    }

    Ok(())
}

fn parse_city(s: &str) -> Result<City, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{}`", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{}`: {}", s, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{}`: {}", s, e))?;
    Ok(City::new(x, y))
}

fn print_tour(tour: &Tour) {
    let order: Vec<String> = tour.order.iter().map(|c| c.to_string()).collect();
    println!("Tour: {}", order.join(" "));
    println!("Cost: {:.6}", tour.cost);
}

fn save_grid(config: &ClientConfig, grid: &compute_tasks::EscapeCountGrid) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join("mandelbrot.png");
    render_grid(grid).save(&path)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn save_tour(config: &ClientConfig, cities: &[City], tour: &Tour) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join("tour.png");
    render_tour(cities, tour, IMAGE_SIZE)?.save(&path)?;
    info!("Wrote {}", path.display());
    Ok(())
}
