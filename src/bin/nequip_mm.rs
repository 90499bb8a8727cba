use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Args, Parser, Subcommand};
use nequip_mm::common::logging;
use nequip_mm::host::Topology;
use nequip_mm::io::input::PotentialConfig;
use nequip_mm::io::output::{format_report, write_report};
use nequip_mm::io::xyz::read_xyz;
use nequip_mm::nn::{load_deployed_model, DeployedModel, InferenceModel, ModelMetadata};
use nequip_mm::potential::{registered_names, AddForcesOptions, MLPotential};
use nequip_mm::{Result, StepResult, System};
use ndarray::Array2;





#[derive(Parser)]
#[command(name = "nequip-mm", about = "Evaluate a deployed NequIP model in nm and kJ/mol", version, propagate_version = true)]
struct Cli
{
    /// Increase the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command
{
    /// Energy and forces of a structure
    Eval(EvalArgs),

    /// Show the metadata of a deployed model
    Inspect(InspectArgs),
}

#[derive(Args)]
struct EvalArgs
{
    /// Potential configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Structure (XYZ, Angstrom)
    #[arg(short, long, value_name = "FILE")]
    structure: PathBuf,

    /// Indices of the atoms handled by the model (all atoms if omitted)
    #[arg(long, value_name = "INDEX", value_delimiter = ',')]
    atoms: Option<Vec<usize>>,

    /// Write the description of the bound force to this file
    #[arg(long, value_name = "FILE")]
    save_force: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct InspectArgs
{
    /// Deployed model artifact
    #[arg(value_name = "MODEL")]
    model: PathBuf,
}



fn eval(args: &EvalArgs) -> Result<()>
{
    let config: PotentialConfig = PotentialConfig::from_file(&args.config)?;
    let (topology, positions): (Topology, Array2<f64>) = read_xyz(&args.structure)?;
    log::info!("read {} atoms from '{}'", topology.num_atoms(), args.structure.display());

    let potential: MLPotential = MLPotential::from_config(&config)?;
    let options: AddForcesOptions = AddForcesOptions
    {
        atoms: args.atoms.clone(),
        force_group: 0,
        filename: args.save_force.clone(),
    };
    let system: System = potential.create_system_with(&topology, &options)?;
    let result: StepResult = system.evaluate(&positions, None, None)?;

    match &args.output
    {
        Some(path) => write_report(path, &topology, &result),
        None =>
        {
            print!("{}", format_report(&topology, &result));
            Ok(())
        },
    }
}



fn inspect(args: &InspectArgs) -> Result<()>
{
    let model: DeployedModel = load_deployed_model(&args.model)?;
    let metadata: &ModelMetadata = model.metadata();
    println!("model:       {}", args.model.display());
    println!("species:     {}", metadata.type_names.join(" "));
    println!("r_max:       {}", metadata.r_max);
    println!("model_dtype: {}", metadata.model_dtype.name());
    println!("n_basis:     {}", metadata.n_basis);
    println!("layers:      {}", model.network().layers().len());
    println!("potentials:  {}", registered_names().join(", "));
    Ok(())
}



fn main() -> ExitCode
{
    let cli: Cli = Cli::parse();
    logging::init(logging::verbosity_to_level(cli.verbose));

    let result: Result<()> = match &cli.command
    {
        Command::Eval(args) => eval(args),
        Command::Inspect(args) => inspect(args),
    };

    match result
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) =>
        {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
