//! `dateFormat` helper

use super::{describe, Arguments, HelperError, NULL};
use crate::value::to_display;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt::Write;

/// Named styles accepted in place of a pattern
const STYLES: [(&str, &str); 4] = [
    ("full", "%A, %B %-d, %Y"),
    ("long", "%B %-d, %Y"),
    ("medium", "%b %-d, %Y"),
    ("short", "%-m/%-d/%y"),
];

const DEFAULT_STYLE: &str = "medium";

pub(crate) fn format_date(
    helper: &'static str,
    context: &Value,
    args: &Arguments,
) -> Result<String, HelperError> {
    let date = parse_date(context).ok_or_else(|| HelperError::ArgumentType {
        helper,
        argument: "date".to_string(),
        expected: "RFC 3339 date, YYYY-MM-DD or epoch milliseconds",
        found: describe(context),
    })?;

    let requested = match args.positional(0, &NULL) {
        Value::Null => DEFAULT_STYLE.to_string(),
        other => to_display(other),
    };
    let pattern = STYLES
        .iter()
        .find(|(style, _)| *style == requested)
        .map_or(requested.as_str(), |(_, pattern)| *pattern);

    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid_pattern(helper, pattern));
    }

    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter()))
        .map_err(|_| invalid_pattern(helper, pattern))?;
    Ok(out)
}

fn invalid_pattern(helper: &'static str, pattern: &str) -> HelperError {
    HelperError::InvalidArgument {
        helper,
        reason: format!("invalid date pattern '{pattern}'"),
    }
}

fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}
