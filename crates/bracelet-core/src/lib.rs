// Core modules
pub mod config;
pub mod error;
pub mod helper;
pub mod lock;
pub mod precompile;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use error::{BraceletError, Result};
