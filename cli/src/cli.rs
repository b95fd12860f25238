use std::path::PathBuf;

/// Reapportion past election results onto a current district layout
#[derive(clap::Parser, Debug)]
#[command(name = "districtshift", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Reproject and combine every configured election
    Run(RunArgs),

    /// Compute the overlaps of one election's districts with the target's
    Compare(CompareArgs),

    /// Fetch one election's results from the election authority
    #[cfg(feature = "download")]
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Configuration file (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Output and cache directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Read results from results_<election>.json files in this directory
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub results: Option<PathBuf>,

    /// Recompute every stage, ignoring cached artifacts
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Configuration file (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Source election key, e.g. 2020_LRS
    pub source: String,

    /// Output and cache directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Recompute even if the overlaps are cached
    #[arg(long)]
    pub force: bool,
}

#[cfg(feature = "download")]
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Configuration file (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Election key, e.g. 2024_LRS
    pub election: String,

    /// Output and cache directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Fetch even if the results are cached
    #[arg(long)]
    pub force: bool,
}
