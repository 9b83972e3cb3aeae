use crate::error::{BraceletError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// bracelet.toml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub precompile: PrecompileConfig,
}

/// `[precompile]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecompileConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Explicit allow-list; empty means scan `root`
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub amd: bool,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub compiler: Option<CompilerConfig>,
}

impl Default for PrecompileConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            suffix: default_suffix(),
            output: default_output(),
            templates: Vec::new(),
            amd: false,
            runtime: default_runtime(),
            parallel: default_parallel(),
            timeout_secs: None,
            compiler: None,
        }
    }
}

/// `[precompile.compiler]` table: the external reference compiler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directories searched for `program` before `PATH`
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from("templates")
}

fn default_suffix() -> String {
    ".hbs".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("templates.js")
}

fn default_runtime() -> String {
    "handlebars".to_string()
}

fn default_parallel() -> bool {
    true
}

impl PrecompileConfig {
    /// Overall deadline for one run
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Read bracelet.toml; relative paths resolve against its directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BraceletError::ConfigParseError(format!("{}: {}", path.display(), e))
        })?;

        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| BraceletError::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Anchor relative paths at `base`
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let precompile = &mut self.precompile;
        precompile.root = base.join(&precompile.root);
        precompile.output = base.join(&precompile.output);
        if let Some(compiler) = precompile.compiler.as_mut() {
            for dir in compiler.search_path.iter_mut() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let precompile = &self.precompile;

        if precompile.timeout_secs == Some(0) {
            return Err(invalid("precompile.timeout_secs", "must be greater than zero"));
        }
        if precompile.runtime.trim().is_empty() {
            return Err(invalid("precompile.runtime", "must not be empty"));
        }
        if precompile.suffix.contains(['/', '\\']) {
            return Err(invalid("precompile.suffix", "must not contain path separators"));
        }
        if let Some(name) = precompile.templates.iter().find(|name| name.trim().is_empty()) {
            return Err(invalid(
                "precompile.templates",
                &format!("invalid template name '{}'", name),
            ));
        }
        if let Some(compiler) = &precompile.compiler {
            if compiler.program.trim().is_empty() {
                return Err(invalid("precompile.compiler.program", "must not be empty"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> BraceletError {
    BraceletError::ConfigInvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
