//! Template engine implementation

mod blocks;
mod expr;
mod lookup;
mod tokenize;

use crate::helper::{Arguments, HelperRegistry};
use crate::template::error::TemplateError;
use crate::value::to_display;
use serde_json::Value;
use std::time::{Duration, Instant};

use blocks::check_block_balance;
use expr::{parse_expression, Expression, Operand};
use lookup::{escape_html, resolve_path};
use tokenize::{Token, TokenKind, TokenStream};

/// Maximum duration for template rendering (malformed input protection)
const RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Check if rendering has exceeded the timeout
fn check_timeout(start: Instant) -> Result<(), TemplateError> {
    let elapsed = start.elapsed();
    if elapsed >= RENDER_TIMEOUT {
        return Err(TemplateError::Timeout {
            max_duration: RENDER_TIMEOUT,
            elapsed,
        });
    }
    Ok(())
}

/// Collect every token, failing on a tag left open at end of input
fn scan(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut stream = TokenStream::new(source);
    let tokens: Vec<Token> = stream.by_ref().collect();
    match stream.unclosed_line() {
        Some(line) => Err(TemplateError::MalformedSyntax {
            message: "Unclosed tag, expected '}}'".to_string(),
            line,
        }),
        None => Ok(tokens),
    }
}

/// Append text, merging with a preceding text node
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(previous)) = nodes.last_mut() {
        previous.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn operand_value(operand: &Operand, data: &Value) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Path(path) => resolve_path(data, path).cloned().unwrap_or(Value::Null),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Output {
        expr: Expression,
        raw: bool,
        line: usize,
    },
}

/// A parsed template, renderable any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source into output nodes
    ///
    /// Sections and partials are rejected; use [`validate`] to only check
    /// tag structure.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let tokens = scan(source)?;
        let mut nodes = Vec::new();
        let mut cursor = 0;

        for token in tokens {
            // Text before the backslash run, then half of the backslashes
            let text_end = token.start - token.backslash_count;
            push_text(&mut nodes, &source[cursor..text_end]);
            push_text(&mut nodes, &"\\".repeat(token.backslash_count / 2));

            let end = token.start + token.length;
            let tag = &source[token.start..end];
            cursor = end;

            if token.is_escaped() {
                push_text(&mut nodes, tag);
                continue;
            }

            match token.kind {
                TokenKind::Comment => {}
                TokenKind::Expression { source: expr, raw } => nodes.push(Node::Output {
                    expr: parse_expression(&expr, token.line)?,
                    raw,
                    line: token.line,
                }),
                TokenKind::BlockStart { .. } | TokenKind::BlockEnd { .. } => {
                    return Err(TemplateError::MalformedSyntax {
                        message: format!("Sections are not supported by the interpreter: '{}'", tag),
                        line: token.line,
                    })
                }
                TokenKind::Partial { .. } => {
                    return Err(TemplateError::MalformedSyntax {
                        message: format!("Partials are not supported by the interpreter: '{}'", tag),
                        line: token.line,
                    })
                }
            }
        }

        push_text(&mut nodes, &source[cursor..]);
        Ok(Self { nodes })
    }
}

/// Template context holding JSON data for rendering
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    data: Value,
}

impl TemplateContext {
    /// Create a new template context from a JSON value
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Get the underlying JSON value
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl From<Value> for TemplateContext {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

/// Template engine rendering against the standard helper set
pub struct TemplateEngine {
    helpers: HelperRegistry,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self {
            helpers: HelperRegistry::standard(),
        }
    }

    /// Helpers this engine resolves tag heads against
    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Render a template with the given context
    pub fn render(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let parsed = Template::parse(template)?;
        self.render_template(&parsed, context)
    }

    /// Render an already parsed template
    pub fn render_template(
        &self,
        template: &Template,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let start = Instant::now();
        let mut output = String::new();

        for node in &template.nodes {
            check_timeout(start)?;
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Output { expr, raw, line } => {
                    if let Some(value) = self.evaluate(expr, context.data(), *line)? {
                        let text = to_display(&value);
                        if *raw {
                            output.push_str(&text);
                        } else {
                            output.push_str(&escape_html(&text));
                        }
                    }
                }
            }
        }

        Ok(output)
    }

    /// Evaluate one output tag
    ///
    /// A registered helper receives its first parameter as context value (the
    /// current context when there is none). Anything else is a lookup.
    fn evaluate(
        &self,
        expr: &Expression,
        data: &Value,
        line: usize,
    ) -> Result<Option<Value>, TemplateError> {
        if let Some(helper) = self.helpers.get(&expr.head) {
            let mut params: Vec<Value> = expr
                .params
                .iter()
                .map(|operand| operand_value(operand, data))
                .collect();
            let value = if params.is_empty() {
                data.clone()
            } else {
                params.remove(0)
            };
            let hash = expr
                .hash
                .iter()
                .map(|(key, operand)| (key.clone(), operand_value(operand, data)))
                .collect();
            let args = Arguments::from_parts(params, hash);

            return helper
                .apply(&value, &args)
                .map_err(|source| TemplateError::Helper {
                    name: expr.head.clone(),
                    line,
                    source,
                });
        }

        if !expr.is_bare() {
            return Err(TemplateError::UnknownHelper {
                name: expr.head.clone(),
                line,
            });
        }

        Ok(Some(operand_value(&expr.target, data)))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to render a template
pub fn render(template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
    TemplateEngine::new().render(template, context)
}

/// Check tag structure without interpreting expressions
///
/// Accepts the full tag grammar, including sections and partials, and fails
/// only on unclosed tags and unbalanced sections.
pub fn validate(source: &str) -> Result<(), TemplateError> {
    let tokens = scan(source)?;
    check_block_balance(&tokens)
}

#[cfg(test)]
mod tests;
