//! Route path segmentation and segment compilation.
//!
//! A route path is split into `/`-delimited segments, except that a `/`
//! inside an unmatched parenthesis group does not split (so a regex
//! segment such as `(?<year>\d{4})` survives intact). Each raw segment
//! then compiles into one [`Segment`] variant: literal text, a named
//! capture (optionally constrained), a greedy capture, an optional
//! capture with a default, a full regex segment, or a mixed pattern such
//! as `bar{name}.{format}baz`.

use crate::Constraint;
use regex::Regex;

/// Split a route path into ordered segments.
///
/// Splits on `/` while no parenthesis group is open; empty segments are
/// dropped. Purely functional, called once per route at cache build time.
pub fn extract_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut open_parens = 0i32;

    for ch in path.chars() {
        match ch {
            '(' => {
                open_parens += 1;
                current.push(ch);
            }
            ')' => {
                open_parens -= 1;
                current.push(ch);
            }
            '/' if open_parens == 0 => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// A compiled unit of a route path.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Exact text, compared case-insensitively unless configured otherwise
    Literal(String),
    /// `{name}`: captures one path segment
    Capture { name: String },
    /// `{name:type}` or `{name:type(args)}`: captures one segment when
    /// the text satisfies the constraint
    Constrained { name: String, constraint: Constraint },
    /// `{name*}`: captures all remaining segments
    Greedy { name: String },
    /// `{name?default}`: captures one segment, or the default when the
    /// slot is omitted from the request path
    Optional { name: String, default: Option<String> },
    /// A regex segment or a mixed literal/capture pattern, matched via
    /// named groups
    Pattern { regex: Regex, names: Vec<String> },
}

impl Segment {
    /// Compile a raw segment. `case_sensitive` controls how pattern
    /// segments compare literal text; literal segments are compared by
    /// the trie itself.
    pub fn parse(raw: &str, case_sensitive: bool) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty segment".to_string());
        }

        // Full regex segment: "(...)"
        if raw.starts_with('(') {
            return compile_pattern(raw, case_sensitive);
        }

        // Pure single-placeholder segment: "{...}"
        if raw.starts_with('{') && raw.ends_with('}') && !raw[1..raw.len() - 1].contains('{') {
            let inner = &raw[1..raw.len() - 1];
            return parse_placeholder(inner);
        }

        // Mixed literal/placeholder segment: "bar{name}.{format}baz"
        if raw.contains('{') || raw.contains('}') {
            let regex_source = mixed_to_regex(raw)?;
            return compile_pattern(&regex_source, case_sensitive);
        }

        Ok(Segment::Literal(raw.to_string()))
    }

    /// Names of the parameters this segment captures, in order.
    pub fn capture_names(&self) -> Vec<&str> {
        match self {
            Segment::Literal(_) => Vec::new(),
            Segment::Capture { name }
            | Segment::Constrained { name, .. }
            | Segment::Greedy { name }
            | Segment::Optional { name, .. } => vec![name.as_str()],
            Segment::Pattern { names, .. } => names.iter().map(String::as_str).collect(),
        }
    }
}

fn parse_placeholder(inner: &str) -> Result<Segment, String> {
    if let Some(name) = inner.strip_suffix('*') {
        validate_name(name)?;
        return Ok(Segment::Greedy {
            name: name.to_string(),
        });
    }

    if let Some((name, default)) = inner.split_once('?') {
        validate_name(name)?;
        let default = if default.is_empty() {
            None
        } else {
            Some(default.to_string())
        };
        return Ok(Segment::Optional {
            name: name.to_string(),
            default,
        });
    }

    if let Some((name, spec)) = inner.split_once(':') {
        validate_name(name)?;
        let (constraint_name, args) = split_constraint_spec(spec)?;
        let constraint = Constraint::parse(constraint_name, args)?;
        return Ok(Segment::Constrained {
            name: name.to_string(),
            constraint,
        });
    }

    validate_name(inner)?;
    Ok(Segment::Capture {
        name: inner.to_string(),
    })
}

/// Split "range(1,100)" into ("range", Some("1,100")); "int" into ("int", None).
fn split_constraint_spec(spec: &str) -> Result<(&str, Option<&str>), String> {
    match spec.find('(') {
        Some(open) => {
            if !spec.ends_with(')') {
                return Err(format!("unterminated constraint arguments in '{}'", spec));
            }
            Ok((&spec[..open], Some(&spec[open + 1..spec.len() - 1])))
        }
        None => {
            if spec.contains(')') {
                return Err(format!("stray ')' in constraint '{}'", spec));
            }
            Ok((spec, None))
        }
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty parameter name".to_string());
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("invalid parameter name '{}'", name));
    }
    Ok(())
}

/// Convert a mixed segment like `bar{name}.{format}baz` into an anchored
/// regex with one named group per placeholder.
fn mixed_to_regex(raw: &str) -> Result<String, String> {
    let mut out = String::from("^");
    let mut literal = String::new();
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();

                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(format!("unterminated placeholder in '{}'", raw));
                }
                validate_name(&name)?;
                out.push_str(&format!("(?P<{}>.+?)", name));
            }
            '}' => return Err(format!("stray '}}' in segment '{}'", raw)),
            _ => literal.push(ch),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    Ok(out)
}

fn compile_pattern(source: &str, case_sensitive: bool) -> Result<Segment, String> {
    let full = if case_sensitive {
        source.to_string()
    } else {
        format!("(?i){}", source)
    };
    // .NET-style named groups use (?<name>...), the regex crate wants (?P<name>...)
    let full = full.replace("(?<", "(?P<").replace("(?P<=", "(?<=").replace("(?P<!", "(?<!");

    let regex = Regex::new(&full).map_err(|e| format!("invalid pattern '{}': {}", source, e))?;
    let names: Vec<String> = regex
        .capture_names()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(Segment::Pattern { regex, names })
}
