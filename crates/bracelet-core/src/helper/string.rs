//! Standard string helper library

use super::date::format_date;
use super::format::sprintf;
use super::{
    expect_bool, expect_integer, expect_size, Arguments, Helper, HelperError, HelperResult, NULL,
};
use crate::value::{is_falsy, to_display};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Line terminator used by `wordWrap`
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Line terminator used by `wordWrap`
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

const ELLIPSIS: &str = "...";

/// The fixed set of standard string helpers
///
/// Each variant's [`name`](StringHelper::name) is its registry key and the
/// identifier templates use to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringHelper {
    CapitalizeFirst,
    Center,
    Cut,
    DefaultIfEmpty,
    Join,
    Ljust,
    Rjust,
    Substring,
    Lower,
    Upper,
    Slugify,
    Replace,
    StringFormat,
    StripTags,
    Capitalize,
    Abbreviate,
    WordWrap,
    Yesno,
    DateFormat,
}

impl StringHelper {
    /// Every standard helper, in declaration order
    pub const ALL: [StringHelper; 19] = [
        StringHelper::CapitalizeFirst,
        StringHelper::Center,
        StringHelper::Cut,
        StringHelper::DefaultIfEmpty,
        StringHelper::Join,
        StringHelper::Ljust,
        StringHelper::Rjust,
        StringHelper::Substring,
        StringHelper::Lower,
        StringHelper::Upper,
        StringHelper::Slugify,
        StringHelper::Replace,
        StringHelper::StringFormat,
        StringHelper::StripTags,
        StringHelper::Capitalize,
        StringHelper::Abbreviate,
        StringHelper::WordWrap,
        StringHelper::Yesno,
        StringHelper::DateFormat,
    ];

    /// Registry key of this helper
    pub fn name(self) -> &'static str {
        match self {
            StringHelper::CapitalizeFirst => "capitalizeFirst",
            StringHelper::Center => "center",
            StringHelper::Cut => "cut",
            StringHelper::DefaultIfEmpty => "defaultIfEmpty",
            StringHelper::Join => "join",
            StringHelper::Ljust => "ljust",
            StringHelper::Rjust => "rjust",
            StringHelper::Substring => "substring",
            StringHelper::Lower => "lower",
            StringHelper::Upper => "upper",
            StringHelper::Slugify => "slugify",
            StringHelper::Replace => "replace",
            StringHelper::StringFormat => "stringFormat",
            StringHelper::StripTags => "stripTags",
            StringHelper::Capitalize => "capitalize",
            StringHelper::Abbreviate => "abbreviate",
            StringHelper::WordWrap => "wordWrap",
            StringHelper::Yesno => "yesno",
            StringHelper::DateFormat => "dateFormat",
        }
    }

    /// Whether a falsy context returns `positional(0)` without further work
    ///
    /// `join`, `yesno` and `defaultIfEmpty` handle null themselves.
    pub fn short_circuits_on_falsy(self) -> bool {
        !matches!(
            self,
            StringHelper::Join | StringHelper::Yesno | StringHelper::DefaultIfEmpty
        )
    }

    fn transform(self, context: &Value, args: &Arguments) -> HelperResult {
        let name = self.name();
        let text = match self {
            StringHelper::Join => return join(context, args),
            StringHelper::Yesno => return Ok(yesno(context, args)),
            StringHelper::DefaultIfEmpty => return Ok(default_if_empty(context, args)),
            StringHelper::DateFormat => format_date(name, context, args)?,
            StringHelper::CapitalizeFirst => capitalize_first(&to_display(context)),
            StringHelper::Capitalize => {
                let fully = expect_bool(name, "fully", args.named("fully", &NULL), false)?;
                capitalize(&to_display(context), fully)
            }
            StringHelper::Lower => to_display(context).to_lowercase(),
            StringHelper::Upper => to_display(context).to_uppercase(),
            StringHelper::Center => {
                let (size, pad) = size_and_pad(name, args)?;
                center(&to_display(context), size, &pad)
            }
            StringHelper::Ljust => {
                let (size, pad) = size_and_pad(name, args)?;
                let value = to_display(context);
                let missing = size.saturating_sub(value.chars().count());
                value + &pad_run(&pad, missing)
            }
            StringHelper::Rjust => {
                let (size, pad) = size_and_pad(name, args)?;
                let value = to_display(context);
                let missing = size.saturating_sub(value.chars().count());
                pad_run(&pad, missing) + &value
            }
            StringHelper::Cut => {
                let space = Value::from(" ");
                let delimiter = to_display(args.positional(0, &space));
                cut(&to_display(context), &delimiter)
            }
            StringHelper::Substring => substring(name, &to_display(context), args)?,
            StringHelper::Replace => {
                let target = required_text(name, "target", args.positional(0, &NULL))?;
                let replacement = required_text(name, "replacement", args.positional(1, &NULL))?;
                let value = to_display(context);
                if target.is_empty() {
                    value
                } else {
                    value.replace(&target, &replacement)
                }
            }
            StringHelper::Slugify => slugify(&to_display(context)),
            StringHelper::StringFormat => sprintf(name, &to_display(context), args.params())?,
            StringHelper::StripTags => tag_pattern()
                .replace_all(&to_display(context), "")
                .into_owned(),
            StringHelper::Abbreviate => {
                let max_width = expect_size(name, "maxWidth", args.positional(0, &NULL))?;
                abbreviate(name, &to_display(context), max_width)?
            }
            StringHelper::WordWrap => {
                let width = expect_size(name, "width", args.positional(0, &NULL))?;
                word_wrap(&to_display(context), width.max(1))
            }
        };

        Ok(Some(Value::String(text)))
    }
}

impl Helper for StringHelper {
    fn name(&self) -> &str {
        StringHelper::name(*self)
    }

    fn apply(&self, context: &Value, args: &Arguments) -> HelperResult {
        if self.short_circuits_on_falsy() && is_falsy(context) {
            return Ok(present(args.positional(0, &NULL)));
        }
        self.transform(context, args)
    }
}

/// `null` renders nothing, anything else is rendered as given
fn present(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other.clone()),
    }
}

fn required_text(helper: &'static str, argument: &str, value: &Value) -> Result<String, HelperError> {
    match value {
        Value::Null => Err(HelperError::MissingArgument {
            helper,
            argument: argument.to_string(),
        }),
        other => Ok(to_display(other)),
    }
}

fn size_and_pad(helper: &'static str, args: &Arguments) -> Result<(usize, String), HelperError> {
    let size = expect_size(helper, "size", args.named("size", &NULL))?;
    let pad = match args.named("pad", &NULL) {
        Value::Null => String::from(" "),
        other => to_display(other),
    };
    Ok((size, pad))
}

/// Repeat `unit` and truncate to exactly `width` characters
fn pad_run(unit: &str, width: usize) -> String {
    let unit = if unit.is_empty() { " " } else { unit };
    unit.chars().cycle().take(width).collect()
}

fn center(value: &str, size: usize, pad: &str) -> String {
    let len = value.chars().count();
    if size <= len {
        return value.to_string();
    }
    let total = size - len;
    let left = total / 2;
    format!("{}{}{}", pad_run(pad, left), value, pad_run(pad, total - left))
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize(value: &str, fully: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else if fully {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn cut(value: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        value.to_string()
    } else {
        value.replace(delimiter, "")
    }
}

fn substring(helper: &'static str, value: &str, args: &Arguments) -> Result<String, HelperError> {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;

    let start = expect_integer(helper, "start", args.positional(0, &NULL))?;
    let end = match args.positional(1, &NULL) {
        Value::Null => len,
        other => expect_integer(helper, "end", other)?,
    };

    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if start >= end {
        return Ok(String::new());
    }
    Ok(chars[start..end].iter().collect())
}

fn slugify(value: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("slug pattern is valid"));
    separators
        .replace_all(&value.trim().to_lowercase(), "-")
        .into_owned()
}

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn abbreviate(helper: &'static str, value: &str, max_width: usize) -> Result<String, HelperError> {
    let min_width = ELLIPSIS.len() + 1;
    if max_width < min_width {
        return Err(HelperError::InvalidArgument {
            helper,
            reason: format!("minimum abbreviation width is {min_width}, got {max_width}"),
        });
    }
    if value.chars().count() <= max_width {
        return Ok(value.to_string());
    }
    let kept: String = value.chars().take(max_width - ELLIPSIS.len()).collect();
    Ok(kept + ELLIPSIS)
}

/// Greedy wrap at whitespace; words longer than `width` stay whole
fn word_wrap(value: &str, width: usize) -> String {
    value
        .split('\n')
        .map(|line| wrap_line(line.trim_end_matches('\r'), width))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    lines.push(current);
    lines.join(LINE_SEPARATOR)
}

fn join(context: &Value, args: &Arguments) -> HelperResult {
    let missing = || HelperError::MissingArgument {
        helper: StringHelper::Join.name(),
        argument: "separator".to_string(),
    };

    // Arrays take the first argument as separator; scalars join with the
    // trailing arguments and use the last one
    let (separator, items): (&Value, Vec<&Value>) = match context {
        Value::Array(items) => (
            args.params().first().ok_or_else(missing)?,
            items.iter().collect(),
        ),
        Value::Null => {
            args.params().first().ok_or_else(missing)?;
            (context, Vec::new())
        }
        other => {
            let (separator, leading) = args.params().split_last().ok_or_else(missing)?;
            (separator, std::iter::once(other).chain(leading.iter()).collect())
        }
    };
    if items.is_empty() {
        return Ok(Some(Value::String(String::new())));
    }

    let empty = Value::String(String::new());
    let prefix = to_display(args.named("prefix", &empty));
    let suffix = to_display(args.named("suffix", &empty));
    let body = items
        .into_iter()
        .map(to_display)
        .collect::<Vec<_>>()
        .join(&to_display(separator));

    Ok(Some(Value::String(format!("{prefix}{body}{suffix}"))))
}

fn yesno(context: &Value, args: &Arguments) -> Option<Value> {
    let yes = Value::from("yes");
    let no = Value::from("no");
    let maybe = Value::from("maybe");
    let picked = match context {
        Value::Bool(true) => args.named("yes", &yes),
        Value::Bool(false) => args.named("no", &no),
        _ => args.named("maybe", &maybe),
    };
    present(picked)
}

fn default_if_empty(context: &Value, args: &Arguments) -> Option<Value> {
    let empty = match context {
        Value::Null | Value::Bool(false) => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        let blank = Value::String(String::new());
        present(args.positional(0, &blank))
    } else {
        Some(context.clone())
    }
}
