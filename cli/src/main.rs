
mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{compare, run};
#[cfg(feature = "download")]
use commands::fetch;

/// Log level from the verbosity count, unless `RUST_LOG` overrides it.
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("districtshift={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Run(args) => run::run(&cli, args),
        Commands::Compare(args) => compare::run(&cli, args),
        #[cfg(feature = "download")]
        Commands::Fetch(args) => fetch::run(&cli, args),
    }
}
