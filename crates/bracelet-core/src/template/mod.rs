//! Template module - logic-less tag interpreter
//!
//! A deliberately small interpreter used to run the standard helpers against a
//! JSON context, and to check template structure before precompilation.
//!
//! ## Syntax
//!
//! - Escaped output: `{{name}}`, `{{person.name}}`, `{{this}}`
//! - Raw output: `{{{name}}}`
//! - Helper calls: `{{center title size=19 pad="*"}}`, `{{join this ", "}}`
//! - Comments: `{{! ignored }}`
//! - Escape sequences: `\{{literal}}`
//!
//! Sections and partials are accepted by [`validate`] (the reference compiler
//! understands them) but rejected by the interpreter.

pub mod engine;
pub mod error;

pub use engine::{render, validate, Template, TemplateContext, TemplateEngine};
pub use error::TemplateError;
