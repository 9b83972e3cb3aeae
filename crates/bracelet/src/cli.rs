//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bracelet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Precompile templates into one JavaScript bundle
    Precompile(PrecompileArgs),

    /// Render a template with the standard helpers
    Render {
        /// Template file
        file: PathBuf,

        /// JSON file with the template data
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// List the standard helpers
    Helpers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Overrides for the `[precompile]` table of bracelet.toml
#[derive(clap::Args, Debug, Default)]
pub struct PrecompileArgs {
    /// Configuration file (default: ./bracelet.toml when present)
    #[arg(short, long, env = "BRACELET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Template root directory
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Template file suffix
    #[arg(long)]
    pub suffix: Option<String>,

    /// Bundle output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Precompile only these templates (repeatable)
    #[arg(short = 't', long = "template", value_name = "NAME")]
    pub templates: Vec<String>,

    /// Wrap the bundle in an AMD module
    #[arg(long)]
    pub amd: bool,

    /// Runtime module the AMD wrapper depends on
    #[arg(long)]
    pub runtime: Option<String>,

    /// Reference compiler program
    #[arg(long, env = "BRACELET_COMPILER")]
    pub compiler: Option<String>,

    /// Argument passed to the reference compiler (repeatable)
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub compiler_args: Vec<String>,

    /// Directory searched for the compiler before PATH (repeatable)
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,

    /// Compile templates one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Overall deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
