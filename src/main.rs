use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drone_sim_viewer::chart::{magnitude, ChartAxis};
use drone_sim_viewer::{FormInput, HttpService, Orchestrator, SimulationService, ViewerConfig};

#[derive(Parser)]
#[command(name = "drone-sim")]
#[command(about = "Run drone flight simulations against a remote backend")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides DRONE_SIM_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one simulation and print a summary
    Simulate {
        /// Initial position "x,y,z" (m)
        #[arg(long, default_value = "0,0,10", allow_hyphen_values = true)]
        position: String,
        /// Initial velocity "x,y,z" (m/s)
        #[arg(long, default_value = "1,0,0", allow_hyphen_values = true)]
        velocity: String,
        /// Mass (kg)
        #[arg(long, default_value = "1")]
        mass: String,
        /// Wind "x,y,z" (m/s)
        #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
        wind: String,
        /// Gravity (m/s^2)
        #[arg(long, default_value = "9.81", allow_hyphen_values = true)]
        gravity: String,
        /// Drag coefficient
        #[arg(long, default_value = "0.1")]
        drag: String,
    },
    /// List previous runs stored by the backend
    History,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ViewerConfig::from_env().with_overrides(cli.url, None);
    let service = HttpService::new(config.base_url.clone());

    match cli.command {
        Commands::Simulate { position, velocity, mass, wind, gravity, drag } => {
            let form = FormInput { position, velocity, mass, wind, gravity, drag };
            simulate(&config, &form, &service)
        }
        Commands::History => history(&service),
    }
}

fn simulate(config: &ViewerConfig, form: &FormInput, service: &HttpService) -> Result<()> {
    let mut orch = Orchestrator::new(config);
    orch.run(form, service)
        .with_context(|| format!("simulation against {} failed", service.base_url()))?;

    let Some(payload) = orch.payload() else {
        anyhow::bail!("simulation produced no payload");
    };

    let peak_speed = orch.charts.instance(ChartAxis::Velocity).map_or(0.0, |c| c.peak());
    let max_range = orch.charts.instance(ChartAxis::Position).map_or(0.0, |c| c.peak());
    let final_pos = payload.final_position().unwrap_or(&[]);

    println!();
    println!("====================================================================");
    println!("  DRONE FLIGHT SIMULATION{}", payload.run_id().map_or(String::new(), |id| format!(", run #{id}")));
    println!("====================================================================");
    println!();
    println!("  {}", orch.last_params().unwrap_or_default());
    println!();
    println!("  Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Samples:        {:>8}", payload.len());
    println!("  Duration:       {:>8.2} s", payload.duration());
    println!("  Final position: {:?}", final_pos);
    println!("  Peak speed:     {:>8.2} m/s", peak_speed);
    println!("  Max range:      {:>8.2} m", max_range);
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  {:>7}  {:>9}  {:>9}  {:>9}  {:>9}", "t (s)", "x (m)", "y (m)", "z (m)", "|v| (m/s)");
    println!("  {}", "─".repeat(52));

    let sample_interval = (payload.len() / 20).max(1);
    for (i, ((t, p), v)) in payload
        .time()
        .iter()
        .zip(payload.position())
        .zip(payload.velocity())
        .enumerate()
    {
        if i % sample_interval != 0 && i != payload.len() - 1 {
            continue;
        }
        let [x, y, z] = match p.as_slice() {
            [x, y, z] => [*x, *y, *z],
            _ => [f64::NAN; 3],
        };
        println!("  {:>7.2}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9.3}", t, x, y, z, magnitude(v));
    }
    println!("====================================================================");
    println!();
    Ok(())
}

fn history(service: &HttpService) -> Result<()> {
    let logs = service.logs().context("could not load run history")?;
    if logs.is_empty() {
        println!("No saved simulations.");
        return Ok(());
    }
    for record in &logs {
        println!("{}", record.summary());
    }
    Ok(())
}
