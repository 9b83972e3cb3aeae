//! Precompile command - bundle templates for the JavaScript runtime

use crate::cli::PrecompileArgs;
use anyhow::Result;
use bracelet_core::config::{CompilerConfig, Config, CONFIG_FILE};
use bracelet_core::precompile::{CommandCompiler, PrecompileOptions, Precompiler};
use bracelet_core::BraceletError;
use colored::Colorize;
use std::path::Path;

/// Precompile the configured template set into one bundle
///
/// bracelet.toml supplies the defaults and every flag overrides its field.
/// A missing config file is fine as long as a compiler is given.
pub fn run(args: PrecompileArgs, verbose: bool) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let precompile = &config.precompile;
    let compiler_config = precompile.compiler.as_ref().ok_or_else(|| {
        BraceletError::CompilerNotFound(
            "no reference compiler configured; set [precompile.compiler] program or pass --compiler"
                .to_string(),
        )
    })?;
    let compiler = CommandCompiler::locate(
        &compiler_config.program,
        compiler_config.args.clone(),
        &compiler_config.search_path,
    )?;

    if verbose {
        println!(
            "{} Compiling templates under {} with {}",
            "→".cyan(),
            precompile.root.display(),
            compiler.program().display()
        );
    }

    let mut precompiler = Precompiler::new(PrecompileOptions::from(precompile), compiler);
    let report = precompiler.run()?;

    if verbose {
        for name in &report.templates {
            println!("  {} {}", "→".cyan(), name);
        }
    }
    if report.templates.is_empty() {
        println!(
            "{} No templates found under {}",
            "!".yellow(),
            precompile.root.display()
        );
    }
    println!(
        "{} Precompiled {} template(s) into {} ({} bytes)",
        "✓".green(),
        report.templates.len(),
        report.output.display(),
        report.bytes
    );
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::from_file(path)?);
    }

    let default_path = Path::new(CONFIG_FILE);
    if default_path.is_file() {
        log::debug!("loading {}", default_path.display());
        return Ok(Config::from_file(default_path)?);
    }
    Ok(Config::default())
}

/// Flags win over bracelet.toml; paths given on the command line stay
/// relative to the working directory
fn apply_overrides(config: &mut Config, args: PrecompileArgs) {
    let precompile = &mut config.precompile;

    if let Some(root) = args.root {
        precompile.root = root;
    }
    if let Some(suffix) = args.suffix {
        precompile.suffix = suffix;
    }
    if let Some(output) = args.output {
        precompile.output = output;
    }
    if !args.templates.is_empty() {
        precompile.templates = args.templates;
    }
    if args.amd {
        precompile.amd = true;
    }
    if let Some(runtime) = args.runtime {
        precompile.runtime = runtime;
    }
    if args.sequential {
        precompile.parallel = false;
    }
    if let Some(timeout) = args.timeout {
        precompile.timeout_secs = Some(timeout);
    }

    if let Some(program) = args.compiler {
        let compiler = precompile.compiler.get_or_insert_with(|| CompilerConfig {
            program: program.clone(),
            args: Vec::new(),
            search_path: Vec::new(),
        });
        compiler.program = program;
    }
    if let Some(compiler) = precompile.compiler.as_mut() {
        if !args.compiler_args.is_empty() {
            compiler.args = args.compiler_args;
        }
        compiler.search_path.extend(args.search_path);
    }
}
