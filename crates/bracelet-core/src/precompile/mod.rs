//! Precompilation pipeline
//!
//! Turns a directory of templates into one JavaScript bundle for the
//! reference runtime:
//!
//! 1. **Discovering**: [`discover`] resolves the [`TemplateUnit`]s to compile
//! 2. **Compiling**: each unit is structure-checked, then handed to a
//!    [`ReferenceCompiler`]
//! 3. **Aggregating**: bodies are collected into a [`Bundle`] in discovery order
//! 4. **Serialized**: the bundle is rendered and written atomically under an
//!    exclusive output lock
//!
//! Any failure leaves a previous output file untouched.

mod bundle;
mod compiler;
mod discover;
mod pipeline;

pub use bundle::{Bundle, ModuleFormat, DEFAULT_RUNTIME};
pub use compiler::{CommandCompiler, Diagnostic, ReferenceCompiler};
pub use discover::{discover, TemplateUnit};
pub use pipeline::{PipelineState, PrecompileOptions, PrecompileReport, Precompiler};

#[cfg(test)]
mod tests;
