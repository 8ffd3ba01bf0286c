use clap::{Parser, Subcommand};
use ps_core::{DebugLevel, LoadContext};
use ps_sim::{Scenario, SimError, SimRecord};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "propsim")]
#[command(about = "propsim - propulsion system simulation tool", long_about = None)]
struct Cli {
    /// Dump engine parameters as they load
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a scenario and its propulsion tree without running it
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Run a scenario and print the recorded channels
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Time step in seconds (overrides the scenario)
        #[arg(long)]
        dt: Option<f64>,
        /// End time in seconds (overrides the scenario)
        #[arg(long)]
        t_end: Option<f64>,
        /// Record every N-th step (overrides the scenario)
        #[arg(long)]
        record_every: Option<usize>,
        /// Print the record as JSON instead of CSV
        #[arg(long)]
        json: bool,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every property path of a scenario's propulsion tree
    Properties {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = LoadContext::new(if cli.verbose {
        DebugLevel::STANDARD
    } else {
        DebugLevel::NONE
    });

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path, &ctx),
        Commands::Run {
            scenario_path,
            dt,
            t_end,
            record_every,
            json,
            output,
        } => {
            let mut scenario = load_scenario(&scenario_path)?;
            if let Some(dt) = dt {
                scenario.options.dt = dt;
            }
            if let Some(t_end) = t_end {
                scenario.options.t_end = t_end;
            }
            if let Some(n) = record_every {
                scenario.options.record_every = n;
            }
            cmd_run(&scenario, &ctx, json, output.as_deref())
        }
        Commands::Properties { scenario_path } => cmd_properties(&scenario_path, &ctx),
    }
}

fn load_scenario(path: &Path) -> CliResult<Scenario> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scenario = Scenario::from_yaml_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        events = scenario.events.len(),
        channels = scenario.record.len(),
        "scenario parsed"
    );
    Ok(scenario)
}

fn cmd_validate(scenario_path: &Path, ctx: &LoadContext) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_scenario(scenario_path)?;
    let sim = scenario.build(ctx)?;
    let missing: Vec<&str> = scenario
        .record
        .iter()
        .map(String::as_str)
        .filter(|c| !sim.properties().contains(c))
        .collect();
    if !missing.is_empty() {
        for c in &missing {
            println!("  unknown record channel: {c}");
        }
        return Err(SimError::Property(ps_core::CoreError::UnknownProperty {
            path: missing[0].to_string(),
        })
        .into());
    }

    println!("✓ Scenario is valid");
    for engine in sim.propulsion.engines() {
        println!(
            "  engine[{}] {} ({}, {} thruster)",
            engine.id().index(),
            engine.name(),
            engine.type_name(),
            engine.thruster.kind.type_name()
        );
    }
    for (i, tank) in sim.propulsion.tanks().iter().enumerate() {
        println!(
            "  tank[{i}] {} {:.1}/{:.1} kg",
            tank.name,
            tank.contents(),
            tank.capacity
        );
    }
    Ok(())
}

fn cmd_run(
    scenario: &Scenario,
    ctx: &LoadContext,
    json: bool,
    output: Option<&Path>,
) -> CliResult<()> {
    eprintln!(
        "Running scenario: {} (dt = {:.4} s, t_end = {:.3} s)",
        scenario.name, scenario.options.dt, scenario.options.t_end
    );
    let start = Instant::now();
    let record = scenario.run(ctx)?;
    eprintln!(
        "✓ Simulation completed: {} samples in {:.3} s",
        record.t.len(),
        start.elapsed().as_secs_f64()
    );

    let text = if json {
        serde_json::to_string_pretty(&record)?
    } else {
        to_csv(&record)
    };

    if let Some(path) = output {
        std::fs::write(path, text)?;
        eprintln!("✓ Exported {} rows to {}", record.t.len(), path.display());
    } else {
        println!("{text}");
    }
    Ok(())
}

fn to_csv(record: &SimRecord) -> String {
    let mut csv = String::from("time_s");
    for c in &record.channels {
        csv.push(',');
        csv.push_str(c);
    }
    csv.push('\n');
    for (t, row) in record.t.iter().zip(&record.rows) {
        csv.push_str(&t.to_string());
        for v in row {
            csv.push(',');
            csv.push_str(&v.to_string());
        }
        csv.push('\n');
    }
    csv
}

fn cmd_properties(scenario_path: &Path, ctx: &LoadContext) -> CliResult<()> {
    let scenario = load_scenario(scenario_path)?;
    let sim = scenario.build(ctx)?;
    for path in sim.paths() {
        let mode = if sim.is_writable(path) { "rw" } else { "r " };
        let value = sim.get(path)?;
        println!("{mode} {path} = {value}");
    }
    Ok(())
}
