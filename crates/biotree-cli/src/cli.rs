use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The biotree developers",
    version,
    about = "biotree CLI - Inspect, center and move biomolecular structures held in a structure → model → chain → residue → atom hierarchy.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarise a structure: entity counts per level and every disordered group.
    Inspect(InspectArgs),
    /// Print the center of mass of the structure or of one model or chain.
    Center(CenterArgs),
    /// Apply a rigid-body rotation and translation and write the moved structure.
    Transform(TransformArgs),
}

/// How disordered groups are resolved after a structure is loaded.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DisorderPolicy {
    /// Atoms: highest occupancy. Residues: smallest residue name.
    HighestOccupancy,
    /// Smallest alternative key for every group.
    FirstKey,
    /// Leave every group unselected.
    None,
}

/// Arguments shared by every subcommand that loads a structure.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the structure description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a settings file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override `disorder.policy` from the settings file.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub disorder_policy: Option<DisorderPolicy>,

    /// Set a specific configuration value, overriding the settings file.
    /// Can be used multiple times. Example: -S center.geometric=true
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also list the full id of every residue.
    #[arg(long)]
    pub full_ids: bool,
}

/// Narrows an operation to one model, or one chain of a model.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Model id to operate on.
    #[arg(short, long, value_name = "ID")]
    pub model: Option<usize>,

    /// Chain id to operate on; uses the first model when --model is absent.
    #[arg(long, value_name = "ID")]
    pub chain: Option<char>,
}

/// Arguments for the `center` subcommand.
#[derive(Args, Debug)]
pub struct CenterArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Use the unweighted geometric center, overriding `center.geometric`.
    #[command(flatten)]
    pub weighting: Weighting,
}

/// A group to handle mutually exclusive center weighting flags.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct Weighting {
    /// Average atom positions without weighting.
    #[arg(long)]
    pub geometric: bool,
    /// Weight atom positions by atomic mass.
    #[arg(long)]
    pub mass_weighted: bool,
}

/// Arguments for the `transform` subcommand.
#[derive(Args, Debug)]
pub struct TransformArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Path for the transformed structure description.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Row-major 3x3 rotation matrix applied as `p * R`.
    #[arg(
        long,
        value_name = "R11,R12,...,R33",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub rotation: Option<Vec<f64>>,

    /// Translation vector added after the rotation.
    #[arg(
        long,
        value_name = "X,Y,Z",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub translation: Option<Vec<f64>>,
}
