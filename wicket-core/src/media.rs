//! Media types, Accept header parsing, and accept coercions.
//!
//! An [`AcceptHeader`] is an ordered list of media ranges with their
//! quality weights, highest quality first. Coercions run before
//! negotiation and rewrite the list for clients that send unhelpful
//! headers (no Accept at all, or browser soup that buries `text/html`
//! under wildcards).

use crate::RequestContext;
use std::fmt;

/// A media range from an Accept header or a concrete content type.
/// Either side may be the `*` wildcard.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    /// Parameters other than `q`, in the order they appeared.
    pub parameters: Vec<(String, String)>,
}

impl MediaRange {
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            subtype: subtype.into(),
            parameters: Vec::new(),
        }
    }

    /// Parse a single range, returning the range and its quality.
    /// Malformed input yields None; a missing or unparsable `q` defaults
    /// to 1.0.
    pub fn parse(raw: &str) -> Option<(Self, f32)> {
        let mut parts = raw.split(';');
        let type_part = parts.next()?.trim();
        let (kind, subtype) = type_part.split_once('/')?;
        let kind = kind.trim();
        let subtype = subtype.trim();
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0f32;
        let mut parameters = Vec::new();
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            let name = name.trim().to_lowercase();
            let value = value.trim();
            if name == "q" {
                quality = value.parse().unwrap_or(1.0);
            } else {
                parameters.push((name, value.to_string()));
            }
        }

        Some((
            Self {
                kind: kind.to_lowercase(),
                subtype: subtype.to_lowercase(),
                parameters,
            },
            quality,
        ))
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == "*" && self.subtype == "*"
    }

    pub fn is_subtype_wildcard(&self) -> bool {
        self.subtype == "*"
    }

    /// Whether this range accepts the given concrete type, honoring
    /// wildcards on either side.
    pub fn matches(&self, other: &MediaRange) -> bool {
        let kind_ok = self.kind == "*" || other.kind == "*" || self.kind == other.kind;
        let subtype_ok =
            self.subtype == "*" || other.subtype == "*" || self.subtype == other.subtype;
        kind_ok && subtype_ok
    }

    /// Convenience for matching against a raw content type string.
    pub fn matches_str(&self, content_type: &str) -> bool {
        match MediaRange::parse(content_type) {
            Some((other, _)) => self.matches(&other),
            None => false,
        }
    }

    /// Specificity used for tie-breaking equal qualities: a concrete
    /// type beats a subtype wildcard beats the full wildcard, and
    /// parameters add precision.
    fn specificity(&self) -> usize {
        let base = if self.is_wildcard() {
            0
        } else if self.is_subtype_wildcard() {
            1
        } else {
            2
        };
        base * 100 + self.parameters.len()
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Parsed Accept header: media ranges with qualities, strongest first.
#[derive(Debug, Clone, Default)]
pub struct AcceptHeader {
    entries: Vec<(MediaRange, f32)>,
}

impl AcceptHeader {
    pub fn new(entries: Vec<(MediaRange, f32)>) -> Self {
        let mut header = Self { entries };
        header.reorder();
        header
    }

    /// Parse a raw header value. Unparsable entries are dropped.
    pub fn parse(value: &str) -> Self {
        let entries = value
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(MediaRange::parse)
            .collect();
        Self::new(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All entries, strongest first.
    pub fn entries(&self) -> &[(MediaRange, f32)] {
        &self.entries
    }

    /// Ranges the client actually accepts (quality above zero),
    /// strongest first.
    pub fn ranges(&self) -> impl Iterator<Item = &MediaRange> {
        self.entries
            .iter()
            .filter(|(_, q)| *q > 0.0)
            .map(|(range, _)| range)
    }

    pub fn push(&mut self, range: MediaRange, quality: f32) {
        self.entries.push((range, quality));
        self.reorder();
    }

    /// Whether any accepted range matches the given content type.
    pub fn accepts(&self, content_type: &str) -> bool {
        self.ranges().any(|range| range.matches_str(content_type))
    }

    fn reorder(&mut self) {
        self.entries.sort_by(|(ra, qa), (rb, qb)| {
            qb.partial_cmp(qa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| rb.specificity().cmp(&ra.specificity()))
        });
    }
}

impl fmt::Display for AcceptHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (range, quality) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}", range)?;
            if (*quality - 1.0).abs() > f32::EPSILON {
                write!(f, ";q={}", quality)?;
            }
        }
        Ok(())
    }
}

/// Rewrites an accept header before negotiation runs.
pub trait AcceptCoercion: Send + Sync {
    fn coerce(&self, accept: AcceptHeader, ctx: &RequestContext) -> AcceptHeader;
}

/// Substitute a sensible default when the client sent no usable Accept
/// header: prefer HTML, fall back to anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoerceBlankAccept;

impl AcceptCoercion for CoerceBlankAccept {
    fn coerce(&self, accept: AcceptHeader, _ctx: &RequestContext) -> AcceptHeader {
        if !accept.is_empty() {
            return accept;
        }
        AcceptHeader::new(vec![
            (MediaRange::new("text", "html"), 1.0),
            (MediaRange::new("*", "*"), 0.9),
        ])
    }
}

/// Browsers commonly send `text/html` alongside XML types and wildcards
/// at equal quality. When the request looks like a browser's, lift
/// `text/html` above the rest so page requests negotiate to HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrioritizeHtml;

impl AcceptCoercion for PrioritizeHtml {
    fn coerce(&self, accept: AcceptHeader, _ctx: &RequestContext) -> AcceptHeader {
        let html_quality = accept
            .entries()
            .iter()
            .find(|(range, _)| range.kind == "text" && range.subtype == "html")
            .map(|(_, q)| *q);

        let Some(html_quality) = html_quality else {
            return accept;
        };

        let rivals_html = accept.entries().iter().any(|(range, q)| {
            *q >= html_quality && !(range.kind == "text" && range.subtype == "html")
        });
        if !rivals_html {
            return accept;
        }

        let top = accept
            .entries()
            .iter()
            .map(|(_, q)| *q)
            .fold(0.0f32, f32::max);
        let entries = accept
            .entries()
            .iter()
            .map(|(range, q)| {
                if range.kind == "text" && range.subtype == "html" {
                    // Only used for ordering, so exceeding 1.0 is fine
                    (range.clone(), (top + 0.1).max(*q))
                } else {
                    (range.clone(), *q)
                }
            })
            .collect();
        AcceptHeader::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpMethod, HttpRequest};

    fn ctx() -> RequestContext {
        RequestContext::new(HttpRequest::new(HttpMethod::GET, "/"))
    }

    #[test]
    fn test_parse_range_with_quality() {
        let (range, q) = MediaRange::parse("application/json;q=0.8").unwrap();
        assert_eq!(range.kind, "application");
        assert_eq!(range.subtype, "json");
        assert_eq!(q, 0.8);
    }

    #[test]
    fn test_parse_preserves_parameter_order() {
        let (range, _) = MediaRange::parse("text/html;level=1;charset=utf-8").unwrap();
        assert_eq!(
            range.parameters,
            vec![
                ("level".to_string(), "1".to_string()),
                ("charset".to_string(), "utf-8".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(MediaRange::parse("nonsense").is_none());
        assert!(MediaRange::parse("/json").is_none());
        assert!(MediaRange::parse("text/").is_none());
    }

    #[test]
    fn test_wildcard_matching() {
        let anything = MediaRange::new("*", "*");
        let any_text = MediaRange::new("text", "*");
        let json = MediaRange::new("application", "json");

        assert!(anything.matches(&json));
        assert!(any_text.matches(&MediaRange::new("text", "html")));
        assert!(!any_text.matches(&json));
        assert!(json.matches(&json));
        assert!(!json.matches(&MediaRange::new("application", "xml")));
    }

    #[test]
    fn test_matches_str_ignores_charset() {
        let json = MediaRange::new("application", "json");
        assert!(json.matches_str("application/json; charset=utf-8"));
    }

    #[test]
    fn test_accept_header_ordering() {
        let accept = AcceptHeader::parse("text/plain;q=0.5, application/json, */*;q=0.1");
        let ordered: Vec<String> = accept.ranges().map(|r| r.to_string()).collect();
        assert_eq!(ordered, vec!["application/json", "text/plain", "*/*"]);
    }

    #[test]
    fn test_specificity_breaks_quality_ties() {
        let accept = AcceptHeader::parse("*/*, text/*, text/html");
        let ordered: Vec<String> = accept.ranges().map(|r| r.to_string()).collect();
        assert_eq!(ordered, vec!["text/html", "text/*", "*/*"]);
    }

    #[test]
    fn test_zero_quality_excluded_from_ranges() {
        let accept = AcceptHeader::parse("application/json;q=0, text/html");
        assert_eq!(accept.len(), 2);
        assert!(!accept.accepts("application/json"));
        assert!(accept.accepts("text/html"));
    }

    #[test]
    fn test_blank_coercion_supplies_defaults() {
        let coerced = CoerceBlankAccept.coerce(AcceptHeader::default(), &ctx());
        let ordered: Vec<String> = coerced.ranges().map(|r| r.to_string()).collect();
        assert_eq!(ordered, vec!["text/html", "*/*"]);
    }

    #[test]
    fn test_blank_coercion_leaves_populated_headers() {
        let accept = AcceptHeader::parse("application/json");
        let coerced = CoerceBlankAccept.coerce(accept, &ctx());
        assert_eq!(coerced.ranges().next().unwrap().to_string(), "application/json");
    }

    #[test]
    fn test_prioritize_html_boosts_browser_soup() {
        let accept =
            AcceptHeader::parse("application/xml, text/html;q=0.9, */*;q=0.9");
        let coerced = PrioritizeHtml.coerce(accept, &ctx());
        assert_eq!(coerced.ranges().next().unwrap().to_string(), "text/html");
    }

    #[test]
    fn test_prioritize_html_noop_without_html() {
        let accept = AcceptHeader::parse("application/json, */*;q=0.5");
        let coerced = PrioritizeHtml.coerce(accept, &ctx());
        assert_eq!(
            coerced.ranges().next().unwrap().to_string(),
            "application/json"
        );
    }
}
