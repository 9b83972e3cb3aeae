//! `bracelet.toml` configuration

mod model;

pub use model::{CompilerConfig, Config, PrecompileConfig};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "bracelet.toml";
