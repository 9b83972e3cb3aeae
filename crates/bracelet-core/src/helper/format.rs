//! printf-style formatting used by `stringFormat`
//!
//! Supports `%[index$][flags][width][.precision]conversion` with the flags
//! `-`, `0`, `+`, ` `, `,`, `#`, `(` and the conversions `s S d f e E x X o c b B % n`.
//! Output never depends on the process locale.

use super::string::LINE_SEPARATOR;
use super::{describe, HelperError};
use crate::value::to_display;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

fn specifier_pattern() -> &'static Regex {
    static SPECIFIER: OnceLock<Regex> = OnceLock::new();
    SPECIFIER.get_or_init(|| {
        Regex::new(r"%(\d+\$)?([-#+ 0,(]*)(\d+)?(\.\d+)?([a-zA-Z%])")
            .expect("format specifier pattern is valid")
    })
}

/// Apply `format` to `args` in order
pub(crate) fn sprintf(
    helper: &'static str,
    format: &str,
    args: &[Value],
) -> Result<String, HelperError> {
    let mut out = String::with_capacity(format.len());
    let mut last = 0;
    let mut next_arg = 0;

    for caps in specifier_pattern().captures_iter(format) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&format[last..whole.start()]);
        last = whole.end();

        let spec = Specifier::parse(&caps, whole.as_str());
        match spec.conversion {
            '%' => out.push_str(&spec.pad("%")),
            'n' => out.push_str(LINE_SEPARATOR),
            _ => {
                let index = match spec.index {
                    Some(position) => position.saturating_sub(1),
                    None => {
                        next_arg += 1;
                        next_arg - 1
                    }
                };
                let arg = args.get(index).ok_or_else(|| HelperError::InvalidArgument {
                    helper,
                    reason: format!("format specifier '{}' has no matching argument", spec.text),
                })?;
                out.push_str(&spec.render(helper, arg)?);
            }
        }
    }

    out.push_str(&format[last..]);
    Ok(out)
}

/// One parsed `%...` specifier
#[derive(Debug)]
struct Specifier<'a> {
    text: &'a str,
    index: Option<usize>,
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    group: bool,
    alternate: bool,
    /// Negative numbers in parentheses, only for `d f e`
    parenthesize: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

impl<'a> Specifier<'a> {
    fn parse(caps: &Captures<'_>, text: &'a str) -> Self {
        let flags = caps.get(2).map_or("", |m| m.as_str());
        Self {
            text,
            index: caps
                .get(1)
                .and_then(|m| m.as_str().trim_end_matches('$').parse().ok()),
            left: flags.contains('-'),
            zero: flags.contains('0'),
            plus: flags.contains('+'),
            space: flags.contains(' '),
            group: flags.contains(','),
            alternate: flags.contains('#'),
            parenthesize: flags.contains('('),
            width: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            precision: caps
                .get(4)
                .and_then(|m| m.as_str().trim_start_matches('.').parse().ok()),
            conversion: caps
                .get(5)
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or('s'),
        }
    }

    fn render(&self, helper: &'static str, arg: &Value) -> Result<String, HelperError> {
        if self.parenthesize && !matches!(self.conversion, 'd' | 'f' | 'e' | 'E') {
            return Err(HelperError::InvalidArgument {
                helper,
                reason: format!("flag '(' does not apply to '{}'", self.text),
            });
        }
        let upper = self.conversion.is_ascii_uppercase();
        let rendered = match self.conversion.to_ascii_lowercase() {
            's' => {
                let text = to_display(arg);
                let text = match self.precision {
                    Some(max) => text.chars().take(max).collect(),
                    None => text,
                };
                self.pad(&text)
            }
            'b' => {
                let truth = match arg {
                    Value::Null => false,
                    Value::Bool(b) => *b,
                    _ => true,
                };
                self.pad(&truth.to_string())
            }
            'c' => self.pad(&self.character(helper, arg)?.to_string()),
            'd' => {
                let n = self.integer(helper, arg)?;
                let digits = n.unsigned_abs().to_string();
                let digits = if self.group { group_thousands(&digits) } else { digits };
                self.pad_signed(n < 0, &digits)
            }
            'x' | 'o' => {
                let n = self.integer(helper, arg)?;
                let (digits, prefix) = if self.conversion.eq_ignore_ascii_case(&'x') {
                    (format!("{n:x}"), "0x")
                } else {
                    (format!("{n:o}"), "0")
                };
                let prefix = if self.alternate { prefix } else { "" };
                self.pad_number(prefix, &digits)
            }
            'f' => {
                let v = self.float(helper, arg)?;
                if !v.is_finite() {
                    self.pad(&non_finite(v))
                } else {
                    let digits = format!("{:.*}", self.precision.unwrap_or(6), v.abs());
                    let digits = if self.group { group_fraction(&digits) } else { digits };
                    self.pad_signed(v.is_sign_negative() && v != 0.0, &digits)
                }
            }
            'e' => {
                let v = self.float(helper, arg)?;
                if !v.is_finite() {
                    self.pad(&non_finite(v))
                } else {
                    let digits = scientific(v.abs(), self.precision.unwrap_or(6));
                    self.pad_signed(v.is_sign_negative() && v != 0.0, &digits)
                }
            }
            _ => {
                return Err(HelperError::InvalidArgument {
                    helper,
                    reason: format!("unknown format conversion '{}'", self.text),
                })
            }
        };

        Ok(if upper { rendered.to_uppercase() } else { rendered })
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    fn pad_signed(&self, negative: bool, digits: &str) -> String {
        if negative && self.parenthesize {
            self.pad_number("(", &format!("{digits})"))
        } else {
            self.pad_number(self.sign(negative), digits)
        }
    }

    fn pad(&self, body: &str) -> String {
        let len = body.chars().count();
        match self.width {
            Some(width) if width > len => {
                let fill = " ".repeat(width - len);
                if self.left {
                    format!("{body}{fill}")
                } else {
                    format!("{fill}{body}")
                }
            }
            _ => body.to_string(),
        }
    }

    fn pad_number(&self, sign: &str, digits: &str) -> String {
        if self.zero && !self.left {
            if let Some(width) = self.width {
                let used = sign.len() + digits.chars().count();
                if width > used {
                    return format!("{sign}{}{digits}", "0".repeat(width - used));
                }
            }
        }
        self.pad(&format!("{sign}{digits}"))
    }

    fn integer(&self, helper: &'static str, arg: &Value) -> Result<i64, HelperError> {
        arg.as_i64().ok_or_else(|| self.mismatch(helper, "integer", arg))
    }

    fn float(&self, helper: &'static str, arg: &Value) -> Result<f64, HelperError> {
        arg.as_f64().ok_or_else(|| self.mismatch(helper, "number", arg))
    }

    fn character(&self, helper: &'static str, arg: &Value) -> Result<char, HelperError> {
        let c = match arg {
            Value::String(s) if s.chars().count() == 1 => s.chars().next(),
            Value::Number(n) => n
                .as_u64()
                .and_then(|code| u32::try_from(code).ok())
                .and_then(char::from_u32),
            _ => None,
        };
        c.ok_or_else(|| self.mismatch(helper, "character", arg))
    }

    fn mismatch(&self, helper: &'static str, expected: &'static str, arg: &Value) -> HelperError {
        HelperError::ArgumentType {
            helper,
            argument: self.text.to_string(),
            expected,
            found: describe(arg),
        }
    }
}

fn non_finite(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_sign_negative() {
        "-Infinity".to_string()
    } else {
        "Infinity".to_string()
    }
}

/// `1234567` → `1,234,567`
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_fraction(digits: &str) -> String {
    match digits.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group_thousands(int), frac),
        None => group_thousands(digits),
    }
}

/// Mantissa with a signed, at least two digit exponent: `3.333333e+00`
fn scientific(v: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, v);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        None => raw,
    }
}
