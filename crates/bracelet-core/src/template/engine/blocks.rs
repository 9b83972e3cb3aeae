//! Block matching utilities (section open/close balance)

use super::tokenize::{Token, TokenKind};
use crate::template::error::TemplateError;

/// Check that every `{{#name}}` is closed by a matching `{{/name}}`
///
/// # Nesting
///
/// Sections nest; the innermost open section must close first.
/// Escaped tokens are literal text and never open or close anything.
pub(crate) fn check_block_balance(tokens: &[Token]) -> Result<(), TemplateError> {
    let mut open: Vec<(&str, usize)> = Vec::new();

    for token in tokens.iter().filter(|token| !token.is_escaped()) {
        match &token.kind {
            TokenKind::BlockStart { keyword, .. } => open.push((keyword.as_str(), token.line)),
            TokenKind::BlockEnd { keyword } => match open.pop() {
                Some((expected, _)) if expected == keyword.as_str() => {}
                Some((expected, opened)) => {
                    return Err(TemplateError::MalformedSyntax {
                        message: format!(
                            "{{{{/{}}}}} does not close {{{{#{}}}}} opened at line {}",
                            keyword, expected, opened
                        ),
                        line: token.line,
                    })
                }
                None => {
                    return Err(TemplateError::MalformedSyntax {
                        message: format!(
                            "Unexpected {{{{/{}}}}} without matching {{{{#{}}}}}",
                            keyword, keyword
                        ),
                        line: token.line,
                    })
                }
            },
            _ => {}
        }
    }

    match open.pop() {
        Some((keyword, line)) => Err(TemplateError::MalformedSyntax {
            message: format!("Unclosed section {{{{#{}}}}}", keyword),
            line,
        }),
        None => Ok(()),
    }
}
