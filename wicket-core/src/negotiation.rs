//! Negotiation directives and the response processor seam.
//!
//! A handler that wants content negotiation returns a [`Negotiation`]:
//! the default model, which media ranges are permissible, per-range
//! model overrides, and response decorations (headers, cookies, status,
//! reason phrase) applied after a processor has built the body.
//! Processors plug in through [`ResponseProcessor`] and report how well
//! they fit a requested range as a [`ProcessorMatch`].

use crate::media::MediaRange;
use crate::{Cookie, Error, HttpResponse, RequestContext};
use async_trait::async_trait;

/// How strongly a processor matched a requested media range or model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrength {
    /// Cannot handle this at all.
    NoMatch,
    /// Works with anything; a fallback.
    DontCare,
    /// Handles it through a wildcard or family match.
    NonExactMatch,
    /// Handles exactly this.
    ExactMatch,
}

/// A processor's assessment of one (range, model) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorMatch {
    pub content_type: MatchStrength,
    pub model: MatchStrength,
}

impl ProcessorMatch {
    pub fn none() -> Self {
        Self {
            content_type: MatchStrength::NoMatch,
            model: MatchStrength::NoMatch,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.content_type > MatchStrength::NoMatch
    }
}

/// Builds a concrete response for a media range it has claimed.
#[async_trait]
pub trait ResponseProcessor: Send + Sync {
    /// File-extension shorthand this processor answers to, as
    /// (extension, media range) pairs. Used for extension-based accept
    /// substitution and for advertising alternate representations.
    fn extension_mappings(&self) -> Vec<(String, MediaRange)>;

    /// How well this processor can serve the requested range and model.
    fn can_process(
        &self,
        requested: &MediaRange,
        model: Option<&serde_json::Value>,
        ctx: &RequestContext,
    ) -> ProcessorMatch;

    /// Produce the response. Only called after a usable `can_process`.
    async fn process(
        &self,
        requested: &MediaRange,
        model: Option<&serde_json::Value>,
        ctx: &RequestContext,
    ) -> Result<HttpResponse, Error>;
}

/// A content negotiation directive returned from a route handler.
#[derive(Debug, Clone, Default)]
pub struct Negotiation {
    /// Model used when no per-range override applies.
    pub model: Option<serde_json::Value>,
    /// Ranges the handler permits; empty means anything.
    pub permissible_ranges: Vec<MediaRange>,
    /// Per-range model overrides, consulted before the default model.
    pub media_models: Vec<(MediaRange, serde_json::Value)>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<Cookie>,
    pub status: Option<u16>,
    pub reason: Option<String>,
    /// View name hint for markup processors.
    pub view_name: Option<String>,
}

impl Negotiation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: serde_json::Value) -> Self {
        self.model = Some(model);
        self
    }

    /// Restrict the negotiation to the given range (may be called
    /// repeatedly to allow several).
    pub fn with_allowed_range(mut self, range: MediaRange) -> Self {
        self.permissible_ranges.push(range);
        self
    }

    /// Use a different model when this specific range is negotiated.
    pub fn with_range_model(mut self, range: MediaRange, model: serde_json::Value) -> Self {
        self.media_models.push((range, model));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_view(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = Some(view_name.into());
        self
    }

    /// Whether the handler permits the given range.
    pub fn permits(&self, range: &MediaRange) -> bool {
        self.permissible_ranges.is_empty()
            || self
                .permissible_ranges
                .iter()
                .any(|allowed| allowed.matches(range))
    }

    /// The model to use for a requested range: the first matching
    /// per-range override, else the default model.
    pub fn model_for(&self, range: &MediaRange) -> Option<&serde_json::Value> {
        self.media_models
            .iter()
            .find(|(candidate, _)| candidate.matches(range))
            .map(|(_, model)| model)
            .or(self.model.as_ref())
    }
}

impl From<serde_json::Value> for Negotiation {
    fn from(model: serde_json::Value) -> Self {
        Negotiation::new().with_model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_strength_ordering() {
        assert!(MatchStrength::ExactMatch > MatchStrength::NonExactMatch);
        assert!(MatchStrength::NonExactMatch > MatchStrength::DontCare);
        assert!(MatchStrength::DontCare > MatchStrength::NoMatch);
    }

    #[test]
    fn test_permits_defaults_to_everything() {
        let negotiation = Negotiation::new().with_model(json!({"a": 1}));
        assert!(negotiation.permits(&MediaRange::new("application", "json")));
        assert!(negotiation.permits(&MediaRange::new("text", "html")));
    }

    #[test]
    fn test_permits_restricts_to_allowed_ranges() {
        let negotiation = Negotiation::new()
            .with_allowed_range(MediaRange::new("application", "json"));
        assert!(negotiation.permits(&MediaRange::new("application", "json")));
        assert!(!negotiation.permits(&MediaRange::new("text", "html")));
        // Wildcard request still intersects the allowed set
        assert!(negotiation.permits(&MediaRange::new("*", "*")));
    }

    #[test]
    fn test_range_model_overrides_default() {
        let negotiation = Negotiation::new()
            .with_model(json!("default"))
            .with_range_model(MediaRange::new("application", "xml"), json!("xml-model"));

        let xml = negotiation.model_for(&MediaRange::new("application", "xml"));
        assert_eq!(xml, Some(&json!("xml-model")));

        let json_model = negotiation.model_for(&MediaRange::new("application", "json"));
        assert_eq!(json_model, Some(&json!("default")));
    }

    #[test]
    fn test_builder_collects_decorations() {
        let negotiation = Negotiation::new()
            .with_header("X-Custom", "yes")
            .with_cookie(Cookie::new("session", "abc"))
            .with_status(201)
            .with_reason("Created Indeed");

        assert_eq!(negotiation.headers.len(), 1);
        assert_eq!(negotiation.cookies.len(), 1);
        assert_eq!(negotiation.status, Some(201));
        assert_eq!(negotiation.reason.as_deref(), Some("Created Indeed"));
    }
}
