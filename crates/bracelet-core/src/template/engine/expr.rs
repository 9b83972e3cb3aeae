//! Tag expression parsing: `head param... key=value...`

use crate::template::error::TemplateError;
use serde_json::{Number, Value};

/// A single argument inside a tag
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// String, number, boolean or null literal
    Literal(Value),
    /// Segments below the current context; empty means `this`
    Path(Vec<String>),
}

/// Parsed tag content
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expression {
    /// First word, looked up as a helper name
    pub head: String,
    /// The head read as an operand, used when no helper matches
    pub target: Operand,
    pub params: Vec<Operand>,
    pub hash: Vec<(String, Operand)>,
}

impl Expression {
    /// True when the tag is a lone name or path
    pub fn is_bare(&self) -> bool {
        self.params.is_empty() && self.hash.is_empty()
    }
}

fn malformed(message: impl Into<String>, line: usize) -> TemplateError {
    TemplateError::MalformedSyntax {
        message: message.into(),
        line,
    }
}

pub(crate) fn parse_expression(source: &str, line: usize) -> Result<Expression, TemplateError> {
    let words = split_words(source, line)?;
    let Some((head, rest)) = words.split_first() else {
        return Err(malformed("Empty expression", line));
    };
    if hash_pair(head).is_some() {
        return Err(malformed(
            format!("Expected a helper name or path, found '{}'", head),
            line,
        ));
    }

    let mut params = Vec::new();
    let mut hash = Vec::new();
    for word in rest {
        match hash_pair(word) {
            Some((key, value)) => hash.push((key.to_string(), operand(value, line)?)),
            None if !hash.is_empty() => {
                return Err(malformed(
                    format!("Positional argument '{}' after hash arguments", word),
                    line,
                ))
            }
            None => params.push(operand(word, line)?),
        }
    }

    Ok(Expression {
        head: head.to_string(),
        target: operand(head, line)?,
        params,
        hash,
    })
}

/// Split on whitespace outside of string literals
fn split_words(source: &str, line: usize) -> Result<Vec<&str>, TemplateError> {
    let mut words = Vec::new();
    let mut start = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(&source[s..i]);
            }
        } else {
            start.get_or_insert(i);
            if c == '"' || c == '\'' {
                quote = Some(c);
            }
        }
    }

    if quote.is_some() {
        return Err(malformed("Unterminated string literal", line));
    }
    if let Some(s) = start {
        words.push(&source[s..]);
    }
    Ok(words)
}

/// `key=value` outside of a string literal
fn hash_pair(word: &str) -> Option<(&str, &str)> {
    if word.starts_with(['"', '\'']) {
        return None;
    }
    let (key, value) = word.split_once('=')?;
    let is_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    is_key.then_some((key, value))
}

fn operand(word: &str, line: usize) -> Result<Operand, TemplateError> {
    if let Some(quote) = word.chars().next().filter(|c| *c == '"' || *c == '\'') {
        return unquote(word, quote, line).map(|text| Operand::Literal(Value::String(text)));
    }
    if word.starts_with('(') {
        return Err(malformed(
            format!("Subexpressions are not supported: '{}'", word),
            line,
        ));
    }

    match word {
        "true" => return Ok(Operand::Literal(Value::Bool(true))),
        "false" => return Ok(Operand::Literal(Value::Bool(false))),
        "null" | "undefined" => return Ok(Operand::Literal(Value::Null)),
        _ => {}
    }

    if let Some(number) = number_literal(word) {
        return Ok(Operand::Literal(number));
    }

    path(word, line).map(Operand::Path)
}

fn unquote(word: &str, quote: char, line: usize) -> Result<String, TemplateError> {
    let inner = word
        .get(1..)
        .and_then(|rest| rest.strip_suffix(quote))
        .ok_or_else(|| malformed(format!("Unexpected text after string literal in '{}'", word), line))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn number_literal(word: &str) -> Option<Value> {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(n) = word.parse::<i64>() {
        return Some(Value::from(n));
    }
    word.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// `this`, `this.a`, `./a`, `a.b.0`, `a/b`
fn path(word: &str, line: usize) -> Result<Vec<String>, TemplateError> {
    if word == ".." || word.starts_with("../") {
        return Err(malformed(
            format!("Parent scope paths are not supported: '{}'", word),
            line,
        ));
    }

    let relative = word
        .strip_prefix("this")
        .filter(|rest| rest.is_empty() || rest.starts_with(['.', '/']))
        .unwrap_or(word)
        .trim_start_matches(['.', '/']);
    if relative.is_empty() {
        return Ok(Vec::new());
    }

    relative
        .split(['.', '/'])
        .map(|segment| {
            if segment.is_empty() {
                Err(malformed(format!("Invalid path '{}'", word), line))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}
