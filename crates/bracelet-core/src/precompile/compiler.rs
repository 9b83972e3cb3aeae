//! Reference compiler capability

use crate::error::{BraceletError, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Failure reported by a reference compiler for one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// Byte offset into the template source, when known
    pub offset: Option<usize>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} (at offset {})", self.message, offset),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Translates template source into a runtime function body
///
/// Implementations are called once per template and may be called from
/// several threads at once.
pub trait ReferenceCompiler: Send + Sync {
    fn compile(&self, source: &str) -> std::result::Result<String, Diagnostic>;
}

impl<F> ReferenceCompiler for F
where
    F: Fn(&str) -> std::result::Result<String, Diagnostic> + Send + Sync,
{
    fn compile(&self, source: &str) -> std::result::Result<String, Diagnostic> {
        self(source)
    }
}

/// External program used as reference compiler
///
/// The template source goes to stdin and the function body is read from
/// stdout. A non-zero exit status turns stderr into the diagnostic.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Find `program` in `search_path` first, then on `PATH`
    pub fn locate(program: &str, args: Vec<String>, search_path: &[PathBuf]) -> Result<Self> {
        let in_search_path = if search_path.is_empty() {
            None
        } else {
            let cwd = std::env::current_dir()?;
            let paths = std::env::join_paths(search_path).map_err(|e| {
                BraceletError::CompilerNotFound(format!("invalid search path: {}", e))
            })?;
            which::which_in(program, Some(paths), cwd).ok()
        };

        let found = match in_search_path {
            Some(path) => path,
            None => which::which(program).map_err(|e| {
                BraceletError::CompilerNotFound(format!("'{}': {}", program, e))
            })?,
        };

        log::debug!("using reference compiler {}", found.display());
        Ok(Self::new(found, args))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn failure(&self, what: &str, err: impl fmt::Display) -> Diagnostic {
        Diagnostic::new(format!("{} {}: {}", what, self.program.display(), err))
    }
}

impl ReferenceCompiler for CommandCompiler {
    fn compile(&self, source: &str) -> std::result::Result<String, Diagnostic> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure("failed to run", e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Diagnostic::new("compiler stdin is not available"))?;

        // Feed stdin while draining stdout so neither pipe can fill up
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output.map_err(|e| self.failure("failed to wait for", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program.display(), output.status)
            } else {
                stderr
            };
            return Err(Diagnostic::new(message));
        }

        match written {
            Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(self.failure("failed to send template to", e));
            }
            Err(_) => return Err(Diagnostic::new("compiler input thread panicked")),
            _ => {}
        }

        String::from_utf8(output.stdout)
            .map(|body| body.trim_end().to_string())
            .map_err(|_| Diagnostic::new("compiler output is not valid UTF-8"))
    }
}
