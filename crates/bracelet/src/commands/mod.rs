//! CLI command implementations

pub mod helpers;
pub mod precompile;
pub mod render;
