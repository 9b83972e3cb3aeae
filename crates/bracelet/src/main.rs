mod cli;
mod commands;

use bracelet_core::BraceletError;
use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Precompile(args) => commands::precompile::run(args, cli.verbose),
        Commands::Render { file, data } => commands::render::run(file, data),
        Commands::Helpers { json } => commands::helpers::run(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Exit status for a failed command
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BraceletError>())
        .map(BraceletError::exit_code)
        .unwrap_or(1)
}
