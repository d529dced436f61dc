use clap::{Parser, Subcommand};
use pm_core::units::{deg, radians, radians_per_second, rpm};
use pm_graph::{InputKind, MechanismGraph};
use pm_project::{ProjectError, load, save_yaml, to_url_argument};
use pm_results::{ColumnLayout, ResultsError, write_csv};
use pm_sim::{SimError, Simulator, StepMode};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pm-cli")]
#[command(about = "Planar mechanism kinematic simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the mechanism and report its mobility and solvability
    Check {
        /// Mechanism file (.yaml project or one-joint-per-line text)
        path: PathBuf,
    },
    /// Save a mechanism (text or YAML) as a YAML project
    Convert {
        /// Mechanism file to read
        input: PathBuf,
        /// YAML project to write
        output: PathBuf,
        /// Project name (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the mechanism as a `mech=` URL argument
    Url {
        /// Mechanism file (.yaml project or one-joint-per-line text)
        path: PathBuf,
    },
    /// Simulate a full cycle of the input and write CSV
    Simulate {
        /// Mechanism file (.yaml project or one-joint-per-line text)
        path: PathBuf,
        /// Input speed in rpm (overrides the project)
        #[arg(long)]
        rpm: Option<f64>,
        /// Fixed input step in degrees
        #[arg(long, conflicts_with_all = ["time_step", "max_error"])]
        delta_angle_deg: Option<f64>,
        /// Fixed time step in seconds
        #[arg(long, conflicts_with = "max_error")]
        time_step: Option<f64>,
        /// Adaptive steps bounding the position error (fraction of average link length)
        #[arg(long)]
        max_error: Option<f64>,
        /// Output CSV file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include link angle, angular velocity and acceleration columns
        #[arg(long)]
        links: bool,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path } => cmd_check(&path),
        Commands::Convert {
            input,
            output,
            name,
        } => cmd_convert(&input, &output, name),
        Commands::Url { path } => cmd_url(&path),
        Commands::Simulate {
            path,
            rpm,
            delta_angle_deg,
            time_step,
            max_error,
            output,
            links,
        } => {
            let step = match (delta_angle_deg, time_step, max_error) {
                (Some(d), _, _) => Some(StepMode::DeltaAngle(radians(deg(d)))),
                (_, Some(dt), _) => Some(StepMode::FixedTimeStep(dt)),
                (_, _, Some(e)) => Some(StepMode::MaxSmoothingError(e)),
                _ => None,
            };
            cmd_simulate(&path, rpm, step, output.as_deref(), links)
        }
    }
}

fn describe_input(graph: &MechanismGraph) -> &'static str {
    match graph.input_kind() {
        InputKind::Rotary => "rotary",
        InputKind::Prismatic { slot_on_ground: true } => "prismatic (slot on ground)",
        InputKind::Prismatic { slot_on_ground: false } => "prismatic (block on ground)",
    }
}

fn cmd_check(path: &Path) -> CliResult<()> {
    println!("Checking mechanism: {}", path.display());
    let project = load(path)?;
    let graph = project.build_graph()?;
    let [r, p, rp, g] = graph.joint_type_counts();
    println!("  Joints: {} (R {r}, P {p}, RP {rp}, G {g})", graph.joints().len());
    println!("  Links: {}", graph.links().len());
    println!("  Input: {}", describe_input(&graph));
    println!("  Average link length: {:.6}", graph.average_link_length());

    let dof = graph.degrees_of_freedom();
    println!("  Degrees of freedom: {dof}");
    if dof == 1 {
        let sim = Simulator::new(graph);
        match sim.is_dyadic() {
            Ok(true) => println!("  Dyadic: yes (closed-form positions)"),
            Ok(false) => println!("  Dyadic: no (iterative closure needed)"),
            Err(e) => println!("  Dyadic: unknown ({e})"),
        }
        println!("✓ Mechanism can be simulated");
    } else {
        println!("✗ Only single-degree-of-freedom mechanisms can be simulated");
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path, name: Option<String>) -> CliResult<()> {
    let mut project = load(input)?;
    project.build_graph()?;
    if let Some(name) = name {
        project.name = name;
    } else if project.name.is_empty() {
        project.name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    save_yaml(output, &project)?;
    println!("✓ Saved {} joints to {}", project.joints.len(), output.display());
    Ok(())
}

fn cmd_url(path: &Path) -> CliResult<()> {
    let project = load(path)?;
    println!("{}", to_url_argument(&project.joints));
    Ok(())
}

fn cmd_simulate(
    path: &Path,
    rpm_override: Option<f64>,
    step: Option<StepMode>,
    output: Option<&Path>,
    with_links: bool,
) -> CliResult<()> {
    let project = load(path)?;
    let graph = project.build_graph()?;
    let mut options = project.sim_options();
    if let Some(v) = rpm_override {
        options.input_speed = radians_per_second(rpm(v));
    }
    if step.is_some() {
        options.step = step;
    }

    let layout = ColumnLayout::numbered(
        graph.joints().len(),
        &graph
            .links_in_input_order()
            .iter()
            .map(|id| graph.links()[id.ix()].name.as_str())
            .collect::<Vec<_>>(),
    );

    let mut sim = Simulator::new(graph).with_options(options);
    let started = Instant::now();
    sim.find_full_movement()?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "simulation finished");

    let links = with_links.then(|| sim.link_parameters());
    match output {
        Some(file) => {
            let mut out = BufWriter::new(File::create(file)?);
            write_csv(&mut out, &layout, sim.joint_parameters(), links)?;
            out.flush()?;
            eprintln!(
                "✓ Wrote {} samples to {}",
                sim.joint_parameters().len(),
                file.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_csv(&mut out, &layout, sim.joint_parameters(), links)?;
        }
    }

    let range = sim.input_range();
    eprintln!("  Input range: {:.6} .. {:.6}", range.start, range.end);
    if !sim.status_lines().is_empty() {
        eprintln!("Status:");
        for line in sim.status_lines() {
            eprintln!("  {line}");
        }
    }
    Ok(())
}
