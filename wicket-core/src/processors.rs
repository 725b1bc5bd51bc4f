//! Built-in response processors.
//!
//! The JSON processor serializes the negotiated model with serde_json.
//! The XML processor renders the same model tree as a plain XML
//! document. Both claim their concrete media types exactly, answer
//! wildcards as a fallback, and register file-extension shorthands so
//! `/resource.json` can force a representation.

use crate::media::MediaRange;
use crate::negotiation::{MatchStrength, ProcessorMatch, ResponseProcessor};
use crate::{Error, HttpResponse, RequestContext};
use async_trait::async_trait;
use serde_json::Value;

/// Serializes negotiated models as `application/json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProcessor;

#[async_trait]
impl ResponseProcessor for JsonProcessor {
    fn extension_mappings(&self) -> Vec<(String, MediaRange)> {
        vec![(
            "json".to_string(),
            MediaRange::new("application", "json"),
        )]
    }

    fn can_process(
        &self,
        requested: &MediaRange,
        _model: Option<&Value>,
        _ctx: &RequestContext,
    ) -> ProcessorMatch {
        let content_type = if requested.kind == "application" && requested.subtype == "json" {
            MatchStrength::ExactMatch
        } else if requested.subtype.ends_with("+json") {
            MatchStrength::NonExactMatch
        } else if requested.is_wildcard()
            || (requested.kind == "application" && requested.is_subtype_wildcard())
        {
            MatchStrength::DontCare
        } else {
            MatchStrength::NoMatch
        };

        ProcessorMatch {
            content_type,
            model: MatchStrength::DontCare,
        }
    }

    async fn process(
        &self,
        _requested: &MediaRange,
        model: Option<&Value>,
        _ctx: &RequestContext,
    ) -> Result<HttpResponse, Error> {
        HttpResponse::ok().with_json(&model.unwrap_or(&Value::Null))
    }
}

/// Renders negotiated models as `application/xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlProcessor;

#[async_trait]
impl ResponseProcessor for XmlProcessor {
    fn extension_mappings(&self) -> Vec<(String, MediaRange)> {
        vec![("xml".to_string(), MediaRange::new("application", "xml"))]
    }

    fn can_process(
        &self,
        requested: &MediaRange,
        _model: Option<&Value>,
        _ctx: &RequestContext,
    ) -> ProcessorMatch {
        let is_xml = (requested.kind == "application" || requested.kind == "text")
            && requested.subtype == "xml";
        let content_type = if is_xml {
            MatchStrength::ExactMatch
        } else if requested.subtype.ends_with("+xml") {
            MatchStrength::NonExactMatch
        } else if requested.is_wildcard() {
            MatchStrength::DontCare
        } else {
            MatchStrength::NoMatch
        };

        ProcessorMatch {
            content_type,
            model: MatchStrength::DontCare,
        }
    }

    async fn process(
        &self,
        _requested: &MediaRange,
        model: Option<&Value>,
        _ctx: &RequestContext,
    ) -> Result<HttpResponse, Error> {
        let mut body = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        render_element("response", model.unwrap_or(&Value::Null), &mut body);
        Ok(HttpResponse::ok()
            .with_body(body.into_bytes())
            .with_header("Content-Type", "application/xml"))
    }
}

fn render_element(name: &str, value: &Value, out: &mut String) {
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(name);
            out.push_str("/>");
        }
        Value::Bool(b) => render_text(name, if *b { "true" } else { "false" }, out),
        Value::Number(n) => render_text(name, &n.to_string(), out),
        Value::String(s) => render_text(name, s, out),
        Value::Array(items) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for item in items {
                render_element("item", item, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Value::Object(fields) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for (key, item) in fields {
                render_element(key, item, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn render_text(name: &str, text: &str, out: &mut String) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpMethod, HttpRequest};
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new(HttpRequest::new(HttpMethod::GET, "/"))
    }

    #[test]
    fn test_json_match_strengths() {
        let p = JsonProcessor;
        let exact = p.can_process(&MediaRange::new("application", "json"), None, &ctx());
        assert_eq!(exact.content_type, MatchStrength::ExactMatch);

        let suffixed = p.can_process(&MediaRange::new("application", "hal+json"), None, &ctx());
        assert_eq!(suffixed.content_type, MatchStrength::NonExactMatch);

        let wildcard = p.can_process(&MediaRange::new("*", "*"), None, &ctx());
        assert_eq!(wildcard.content_type, MatchStrength::DontCare);

        let html = p.can_process(&MediaRange::new("text", "html"), None, &ctx());
        assert_eq!(html.content_type, MatchStrength::NoMatch);
    }

    #[tokio::test]
    async fn test_json_process_serializes_model() {
        let model = json!({"name": "ted", "age": 3});
        let response = JsonProcessor
            .process(&MediaRange::new("application", "json"), Some(&model), &ctx())
            .await
            .unwrap();
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        let parsed: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(parsed, model);
    }

    #[tokio::test]
    async fn test_json_process_null_without_model() {
        let response = JsonProcessor
            .process(&MediaRange::new("application", "json"), None, &ctx())
            .await
            .unwrap();
        assert_eq!(response.body, b"null");
    }

    #[test]
    fn test_xml_match_strengths() {
        let p = XmlProcessor;
        let app = p.can_process(&MediaRange::new("application", "xml"), None, &ctx());
        assert_eq!(app.content_type, MatchStrength::ExactMatch);

        let text = p.can_process(&MediaRange::new("text", "xml"), None, &ctx());
        assert_eq!(text.content_type, MatchStrength::ExactMatch);

        let json = p.can_process(&MediaRange::new("application", "json"), None, &ctx());
        assert_eq!(json.content_type, MatchStrength::NoMatch);
    }

    #[tokio::test]
    async fn test_xml_render_nested() {
        let model = json!({"user": {"name": "a<b", "tags": ["x", "y"]}});
        let response = XmlProcessor
            .process(&MediaRange::new("application", "xml"), Some(&model), &ctx())
            .await
            .unwrap();
        assert_eq!(response.header("Content-Type"), Some("application/xml"));
        let body = String::from_utf8(response.body).unwrap();
        assert!(body.contains("<user><name>a&lt;b</name>"));
        assert!(body.contains("<tags><item>x</item><item>y</item></tags>"));
    }

    #[test]
    fn test_extension_mappings() {
        assert_eq!(JsonProcessor.extension_mappings()[0].0, "json");
        assert_eq!(XmlProcessor.extension_mappings()[0].0, "xml");
    }
}
