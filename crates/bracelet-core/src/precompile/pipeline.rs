//! Precompilation run: discover, compile, aggregate, serialize

use super::bundle::{Bundle, ModuleFormat};
use super::compiler::{Diagnostic, ReferenceCompiler};
use super::discover::{discover, TemplateUnit};
use crate::config::PrecompileConfig;
use crate::error::{BraceletError, Result};
use crate::lock::{self, OUTPUT_LOCK_TIMEOUT};
use crate::template::{self, TemplateError};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Where a run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Configured,
    Discovering,
    /// Index of the template being compiled (0 while compiling in parallel)
    Compiling(usize),
    Aggregating,
    Serialized,
    Failed(String),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Configured => write!(f, "configured"),
            PipelineState::Discovering => write!(f, "discovering"),
            PipelineState::Compiling(index) => write!(f, "compiling #{}", index),
            PipelineState::Aggregating => write!(f, "aggregating"),
            PipelineState::Serialized => write!(f, "serialized"),
            PipelineState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct PrecompileOptions {
    pub root: PathBuf,
    pub suffix: String,
    pub output: PathBuf,
    /// Explicit allow-list; empty means scan `root`
    pub templates: Vec<String>,
    pub format: ModuleFormat,
    pub parallel: bool,
    /// Overall deadline for the run
    pub timeout: Option<Duration>,
    /// Wait for a concurrent run holding the output lock
    pub lock_timeout: Duration,
}

impl PrecompileOptions {
    /// Sequential plain-script run over `root` with the `.hbs` suffix
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffix: ".hbs".to_string(),
            output: output.into(),
            templates: Vec::new(),
            format: ModuleFormat::Plain,
            parallel: false,
            timeout: None,
            lock_timeout: OUTPUT_LOCK_TIMEOUT,
        }
    }
}

impl From<&PrecompileConfig> for PrecompileOptions {
    fn from(config: &PrecompileConfig) -> Self {
        let format = if config.amd {
            ModuleFormat::amd(config.runtime.clone())
        } else {
            ModuleFormat::Plain
        };
        Self {
            root: config.root.clone(),
            suffix: config.suffix.clone(),
            output: config.output.clone(),
            templates: config.templates.clone(),
            format,
            parallel: config.parallel,
            timeout: config.timeout(),
            lock_timeout: OUTPUT_LOCK_TIMEOUT,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecompileReport {
    pub output: PathBuf,
    /// Logical names in bundle order
    pub templates: Vec<String>,
    pub bytes: usize,
}

/// Drives one template set through to a bundle file
pub struct Precompiler<C: ReferenceCompiler> {
    options: PrecompileOptions,
    compiler: C,
    token: CancellationToken,
    state: PipelineState,
}

impl<C: ReferenceCompiler> Precompiler<C> {
    pub fn new(options: PrecompileOptions, compiler: C) -> Self {
        Self {
            options,
            compiler,
            token: CancellationToken::new(),
            state: PipelineState::Configured,
        }
    }

    /// Use an externally owned cancellation signal
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Handle that cancels this run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn options(&self) -> &PrecompileOptions {
        &self.options
    }

    /// Run the whole pipeline
    ///
    /// Nothing is written unless every template compiled; on failure the
    /// state ends in [`PipelineState::Failed`] and a previous output file is
    /// left as it was.
    pub fn run(&mut self) -> Result<PrecompileReport> {
        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        match self.execute(deadline) {
            Ok(report) => Ok(report),
            Err(err) => {
                self.transition(PipelineState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn execute(&mut self, deadline: Option<Instant>) -> Result<PrecompileReport> {
        self.transition(PipelineState::Discovering);
        let units = discover(
            &self.options.root,
            &self.options.suffix,
            &self.options.templates,
            &self.token,
        )?;

        let bodies = if self.options.parallel && units.len() > 1 {
            self.compile_parallel(&units, deadline)?
        } else {
            self.compile_sequential(&units, deadline)?
        };

        self.transition(PipelineState::Aggregating);
        let mut bundle = Bundle::new();
        for (unit, body) in units.iter().zip(bodies) {
            bundle.insert(unit.name.clone(), body)?;
        }
        let text = bundle.render(&self.options.format);

        self.write_output(&text, deadline)?;
        self.transition(PipelineState::Serialized);

        log::info!(
            "wrote {} template(s) to {} ({} bytes)",
            bundle.len(),
            self.options.output.display(),
            text.len()
        );
        Ok(PrecompileReport {
            output: self.options.output.clone(),
            templates: bundle.names().map(str::to_string).collect(),
            bytes: text.len(),
        })
    }

    fn compile_sequential(
        &mut self,
        units: &[TemplateUnit],
        deadline: Option<Instant>,
    ) -> Result<Vec<String>> {
        let mut bodies = Vec::with_capacity(units.len());
        for (index, unit) in units.iter().enumerate() {
            self.transition(PipelineState::Compiling(index));
            self.check_interrupt(deadline, "compiling")?;
            bodies.push(compile_unit(&self.compiler, unit)?);
        }
        Ok(bodies)
    }

    fn compile_parallel(
        &mut self,
        units: &[TemplateUnit],
        deadline: Option<Instant>,
    ) -> Result<Vec<String>> {
        self.transition(PipelineState::Compiling(0));
        self.check_interrupt(deadline, "compiling")?;

        // Cancelled by the caller's token or by the first failing sibling
        let abort = self.token.child_token();
        let compiler = &self.compiler;
        let results: Vec<Option<Result<String>>> = units
            .par_iter()
            .map(|unit| {
                if abort.is_cancelled() || deadline_passed(deadline) {
                    return None;
                }
                let result = compile_unit(compiler, unit);
                if result.is_err() {
                    abort.cancel();
                }
                Some(result)
            })
            .collect();

        let mut bodies = Vec::with_capacity(units.len());
        let mut skipped = false;
        for result in results {
            match result {
                Some(Ok(body)) => bodies.push(body),
                Some(Err(err)) => return Err(err),
                None => skipped = true,
            }
        }
        if skipped {
            self.check_interrupt(deadline, "compiling")?;
            return Err(BraceletError::Cancelled(
                "compilation aborted".to_string(),
            ));
        }
        Ok(bodies)
    }

    fn write_output(&self, text: &str, deadline: Option<Instant>) -> Result<()> {
        let output = &self.options.output;
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        self.check_interrupt(deadline, "writing")?;
        std::fs::create_dir_all(&parent)
            .map_err(|e| write_error(output, format!("failed to create parent dir: {}", e)))?;

        let _guard = lock::lock_output(output, self.options.lock_timeout)
            .map_err(|e| write_error(output, format!("failed to acquire lock: {}", e)))?;

        // The lock wait may have outlived the deadline
        self.check_interrupt(deadline, "writing")?;
        atomic_write(text, output, &parent)
    }

    fn check_interrupt(&self, deadline: Option<Instant>, stage: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(BraceletError::Cancelled(format!(
                "cancelled before {}",
                stage
            )));
        }
        if deadline_passed(deadline) {
            let timeout = self.options.timeout.unwrap_or_default();
            return Err(BraceletError::Cancelled(format!(
                "deadline of {:.2}s exceeded before {}",
                timeout.as_secs_f64(),
                stage
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("precompile: {} -> {}", self.state, next);
        self.state = next;
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Structure-check one template, then hand it to the reference compiler
fn compile_unit<C: ReferenceCompiler + ?Sized>(compiler: &C, unit: &TemplateUnit) -> Result<String> {
    log::debug!("compiling '{}' from {}", unit.name, unit.path.display());

    template::validate(&unit.source).map_err(|err| BraceletError::CompileError {
        name: unit.name.clone(),
        diagnostic: parse_diagnostic(&unit.source, &err),
    })?;

    compiler
        .compile(&unit.source)
        .map_err(|diagnostic| BraceletError::CompileError {
            name: unit.name.clone(),
            diagnostic,
        })
}

/// Offset points at the start of the offending line
fn parse_diagnostic(source: &str, err: &TemplateError) -> Diagnostic {
    match err.line() {
        Some(line) => {
            let offset = source
                .split_inclusive('\n')
                .take(line.saturating_sub(1))
                .map(str::len)
                .sum();
            Diagnostic::at(err.to_string(), offset)
        }
        None => Diagnostic::new(err.to_string()),
    }
}

fn write_error(path: &Path, reason: String) -> BraceletError {
    BraceletError::OutputWriteError {
        path: path.to_path_buf(),
        reason,
    }
}

/// Temp file in the destination directory, then rename over the target
fn atomic_write(content: &str, path: &Path, parent: &Path) -> Result<()> {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| write_error(path, format!("failed to create temp file: {}", e)))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| write_error(path, format!("failed to write temp file: {}", e)))?;

    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| write_error(path, format!("failed to sync temp file: {}", e)))?;

    temp_file
        .persist(path)
        .map_err(|e| write_error(path, format!("failed to persist temp file: {}", e.error)))?;

    // Fsync parent directory for durability (Unix only)
    #[cfg(unix)]
    {
        let parent_file = std::fs::File::open(parent)
            .map_err(|e| write_error(path, format!("failed to open parent dir: {}", e)))?;
        parent_file
            .sync_all()
            .map_err(|e| write_error(path, format!("failed to sync parent dir: {}", e)))?;
    }

    Ok(())
}
