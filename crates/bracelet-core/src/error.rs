use crate::precompile::Diagnostic;
use crate::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BraceletError {
    // Discovery errors
    #[error("TEMPLATE_NOT_FOUND: template '{name}' not found at {}", .path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    #[error("TEMPLATE_ROOT_NOT_FOUND: template root '{}' is not a directory", .0.display())]
    TemplateRootNotFound(PathBuf),

    #[error("TEMPLATE_READ_ERROR: failed to read '{}': {source}", .path.display())]
    TemplateReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("DUPLICATE_TEMPLATE: template '{0}' appears more than once")]
    DuplicateTemplate(String),

    // Compilation errors
    #[error("COMPILE_ERROR: template '{name}' failed to compile: {diagnostic}")]
    CompileError { name: String, diagnostic: Diagnostic },

    #[error("COMPILER_NOT_FOUND: {0}")]
    CompilerNotFound(String),

    // Output errors
    #[error("OUTPUT_WRITE_ERROR: failed to write '{}': {reason}", .path.display())]
    OutputWriteError { path: PathBuf, reason: String },

    #[error("CANCELLED: {0}")]
    Cancelled(String),

    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // Interpreter errors
    #[error("TEMPLATE_ERROR: {0}")]
    Template(#[from] TemplateError),

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),
}

impl BraceletError {
    /// Process exit status for the run that ended with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BraceletError::TemplateNotFound { .. }
            | BraceletError::TemplateRootNotFound(_)
            | BraceletError::CompilerNotFound(_) => 2,
            BraceletError::CompileError { .. } | BraceletError::Template(_) => 3,
            BraceletError::OutputWriteError { .. } => 4,
            BraceletError::Cancelled(_) => 5,
            BraceletError::ConfigParseError(_) | BraceletError::ConfigInvalidValue { .. } => 6,
            BraceletError::TemplateReadError { .. }
            | BraceletError::DuplicateTemplate(_)
            | BraceletError::IoError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BraceletError>;
