//! Route constraints for captured segment validation.
//!
//! A constraint is a named, optionally parameterized predicate attached
//! to a capture segment, e.g. `{id:int}` or `{page:range(1,100)}`. The
//! constrained capture only matches when the text satisfies the
//! predicate; otherwise matching falls through to less specific
//! candidates.
//!
//! Constraint names are always case-insensitive (`{id:INT}` works).
//! Malformed constraint arguments are a configuration error and fail at
//! trie build time, never at request time.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// A compiled segment constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Decimal number
    Decimal,
    /// UUID/GUID
    Guid,
    /// `true` or `false`, case-insensitive
    Bool,
    /// Letters only
    Alpha,
    /// Date/time value, optionally with an explicit chrono format string
    DateTime { format: Option<String> },
    /// Integer with a lower bound
    Min(i64),
    /// Integer with an upper bound
    Max(i64),
    /// Integer within an inclusive range
    Range(i64, i64),
    /// Text with a minimum character count
    MinLength(usize),
    /// Text with a maximum character count
    MaxLength(usize),
    /// Text with a character count in an inclusive range
    Length { min: usize, max: usize },
}

impl Constraint {
    /// Compile a constraint from its name and raw argument text.
    ///
    /// `args` is the text between the parentheses, if any: for
    /// `range(1,100)` the name is `range` and args is `Some("1,100")`.
    pub fn parse(name: &str, args: Option<&str>) -> Result<Self, String> {
        let lowered = name.to_ascii_lowercase();
        match (lowered.as_str(), args) {
            ("int", None) => Ok(Constraint::Int),
            ("long", None) => Ok(Constraint::Long),
            ("decimal", None) => Ok(Constraint::Decimal),
            ("guid", None) => Ok(Constraint::Guid),
            ("bool", None) => Ok(Constraint::Bool),
            ("alpha", None) => Ok(Constraint::Alpha),
            ("datetime", format) => Ok(Constraint::DateTime {
                format: format.map(str::to_string),
            }),
            ("min", Some(args)) => Ok(Constraint::Min(parse_int_arg(&lowered, args)?)),
            ("max", Some(args)) => Ok(Constraint::Max(parse_int_arg(&lowered, args)?)),
            ("range", Some(args)) => {
                let (low, high) = parse_int_pair(&lowered, args)?;
                if low > high {
                    return Err(format!("range({},{}) is inverted", low, high));
                }
                Ok(Constraint::Range(low, high))
            }
            ("minlength", Some(args)) => {
                Ok(Constraint::MinLength(parse_len_arg(&lowered, args)?))
            }
            ("maxlength", Some(args)) => {
                Ok(Constraint::MaxLength(parse_len_arg(&lowered, args)?))
            }
            ("length", Some(args)) => {
                // length(n) means exactly n; length(a,b) means a..=b
                if args.contains(',') {
                    let (min, max) = parse_len_pair(&lowered, args)?;
                    if min > max {
                        return Err(format!("length({},{}) is inverted", min, max));
                    }
                    Ok(Constraint::Length { min, max })
                } else {
                    let n = parse_len_arg(&lowered, args)?;
                    Ok(Constraint::Length { min: n, max: n })
                }
            }
            ("min" | "max" | "minlength" | "maxlength" | "length", None) => {
                Err(format!("constraint '{}' requires arguments", lowered))
            }
            (other, Some(_)) if is_bare_constraint(other) => {
                Err(format!("constraint '{}' takes no arguments", other))
            }
            (other, _) => Err(format!("unknown constraint '{}'", other)),
        }
    }

    /// Check whether captured text satisfies this constraint.
    pub fn is_satisfied(&self, value: &str) -> bool {
        match self {
            Constraint::Int => value.parse::<i32>().is_ok(),
            Constraint::Long => value.parse::<i64>().is_ok(),
            Constraint::Decimal => value.parse::<f64>().is_ok(),
            Constraint::Guid => Uuid::parse_str(value).is_ok(),
            Constraint::Bool => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
            Constraint::Alpha => !value.is_empty() && value.chars().all(|c| c.is_alphabetic()),
            Constraint::DateTime { format } => match format {
                Some(fmt) => {
                    NaiveDateTime::parse_from_str(value, fmt).is_ok()
                        || NaiveDate::parse_from_str(value, fmt).is_ok()
                }
                None => {
                    DateTime::parse_from_rfc3339(value).is_ok()
                        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
                        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok()
                        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
                }
            },
            Constraint::Min(min) => matches_int(value, |n| n >= *min),
            Constraint::Max(max) => matches_int(value, |n| n <= *max),
            Constraint::Range(min, max) => matches_int(value, |n| n >= *min && n <= *max),
            Constraint::MinLength(min) => value.chars().count() >= *min,
            Constraint::MaxLength(max) => value.chars().count() <= *max,
            Constraint::Length { min, max } => {
                let len = value.chars().count();
                len >= *min && len <= *max
            }
        }
    }
}

fn is_bare_constraint(name: &str) -> bool {
    matches!(name, "int" | "long" | "decimal" | "guid" | "bool" | "alpha")
}

fn matches_int(value: &str, predicate: impl Fn(i64) -> bool) -> bool {
    value.parse::<i64>().map(predicate).unwrap_or(false)
}

fn parse_int_arg(name: &str, args: &str) -> Result<i64, String> {
    args.trim()
        .parse::<i64>()
        .map_err(|_| format!("{}({}) has a non-integer argument", name, args))
}

fn parse_len_arg(name: &str, args: &str) -> Result<usize, String> {
    args.trim()
        .parse::<usize>()
        .map_err(|_| format!("{}({}) has a non-integer argument", name, args))
}

fn parse_int_pair(name: &str, args: &str) -> Result<(i64, i64), String> {
    let mut parts = args.splitn(2, ',');
    let first = parts.next().unwrap_or("");
    let second = parts
        .next()
        .ok_or_else(|| format!("{}({}) requires two arguments", name, args))?;
    Ok((parse_int_arg(name, first)?, parse_int_arg(name, second)?))
}

fn parse_len_pair(name: &str, args: &str) -> Result<(usize, usize), String> {
    let mut parts = args.splitn(2, ',');
    let first = parts.next().unwrap_or("");
    let second = parts
        .next()
        .ok_or_else(|| format!("{}({}) requires two arguments", name, args))?;
    Ok((parse_len_arg(name, first)?, parse_len_arg(name, second)?))
}
