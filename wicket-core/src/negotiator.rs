//! Response negotiation pipeline.
//!
//! Turns a handler result into a concrete response:
//!
//! 1. ready responses pass straight through
//! 2. bare models are wrapped into a negotiation directive
//! 3. the Accept header is parsed and run through the coercions
//! 4. accepted ranges are intersected with the handler's permissible
//!    ranges and offered to the processors, strongest quality first
//! 5. the first range a processor claims wins; nothing claimed is a 406
//! 6. the winning processor builds the response body
//! 7. the directive's decorations are applied, plus `Vary: Accept` and a
//!    `Link` header advertising alternate representations
//!
//! Negotiated responses always vary on Accept, including the 406 case.

use crate::logging::{debug, trace, warn};
use crate::media::{AcceptCoercion, AcceptHeader, CoerceBlankAccept, MediaRange, PrioritizeHtml};
use crate::negotiation::{Negotiation, ProcessorMatch, ResponseProcessor};
use crate::processors::{JsonProcessor, XmlProcessor};
use crate::{Error, HandlerResult, HttpResponse, RequestContext};
use std::sync::Arc;

pub struct ResponseNegotiator {
    processors: Vec<Arc<dyn ResponseProcessor>>,
    coercions: Vec<Arc<dyn AcceptCoercion>>,
}

impl Default for ResponseNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNegotiator {
    /// Negotiator with the built-in processors (JSON first, then XML)
    /// and the standard accept coercions.
    pub fn new() -> Self {
        Self {
            processors: vec![Arc::new(JsonProcessor), Arc::new(XmlProcessor)],
            coercions: vec![Arc::new(CoerceBlankAccept), Arc::new(PrioritizeHtml)],
        }
    }

    /// Negotiator with no processors or coercions registered.
    pub fn empty() -> Self {
        Self {
            processors: Vec::new(),
            coercions: Vec::new(),
        }
    }

    pub fn with_processor(mut self, processor: Arc<dyn ResponseProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn with_coercion(mut self, coercion: Arc<dyn AcceptCoercion>) -> Self {
        self.coercions.push(coercion);
        self
    }

    pub fn processors(&self) -> &[Arc<dyn ResponseProcessor>] {
        &self.processors
    }

    /// Media range registered for a file extension, if any processor
    /// claims it.
    pub fn range_for_extension(&self, extension: &str) -> Option<MediaRange> {
        self.processors.iter().find_map(|p| {
            p.extension_mappings()
                .into_iter()
                .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
                .map(|(_, range)| range)
        })
    }

    /// Run the pipeline for a handler result.
    pub async fn negotiate(
        &self,
        result: HandlerResult,
        ctx: &RequestContext,
    ) -> Result<HttpResponse, Error> {
        let negotiation = match result {
            HandlerResult::Response(response) => return Ok(response),
            HandlerResult::ShortCircuit { response, reason } => {
                if let Some(reason) = reason {
                    ctx.trace.log(reason);
                }
                return Ok(response);
            }
            HandlerResult::Empty => return Ok(HttpResponse::ok()),
            HandlerResult::Negotiate(negotiation) => negotiation,
            HandlerResult::Model(model) => Negotiation::from(model),
        };

        let accept = self.coerced_accept(ctx);
        trace!(accept = %accept, "negotiating response");

        match self.select(&negotiation, &accept, ctx) {
            Some((range, processor)) => {
                let model = negotiation.model_for(&range);
                let response = processor.process(&range, model, ctx).await?;
                Ok(self.finalize(response, &negotiation, Some(&range), ctx))
            }
            None => {
                warn!(
                    path = %ctx.request.path,
                    accept = %accept,
                    "no acceptable representation"
                );
                Ok(self.finalize(HttpResponse::not_acceptable(), &negotiation, None, ctx))
            }
        }
    }

    fn coerced_accept(&self, ctx: &RequestContext) -> AcceptHeader {
        let mut accept = ctx
            .request
            .header("Accept")
            .map(AcceptHeader::parse)
            .unwrap_or_default();
        for coercion in &self.coercions {
            accept = coercion.coerce(accept, ctx);
        }
        accept
    }

    /// The first accepted range, in quality order, that intersects the
    /// permissible set and that some processor claims.
    fn select(
        &self,
        negotiation: &Negotiation,
        accept: &AcceptHeader,
        ctx: &RequestContext,
    ) -> Option<(MediaRange, Arc<dyn ResponseProcessor>)> {
        for accepted in accept.ranges() {
            let targets: Vec<MediaRange> = if negotiation.permissible_ranges.is_empty() {
                vec![accepted.clone()]
            } else {
                negotiation
                    .permissible_ranges
                    .iter()
                    .filter(|permitted| permitted.matches(accepted))
                    .cloned()
                    .collect()
            };

            for target in targets {
                let model = negotiation.model_for(&target);
                if let Some(processor) = self.best_processor(&target, model, ctx) {
                    debug!(range = %target, "representation selected");
                    return Some((target, processor));
                }
            }
        }
        None
    }

    /// Strongest usable processor for the range, compared by model
    /// strength first and content-type strength second. Registration
    /// order breaks ties.
    fn best_processor(
        &self,
        range: &MediaRange,
        model: Option<&serde_json::Value>,
        ctx: &RequestContext,
    ) -> Option<Arc<dyn ResponseProcessor>> {
        let mut best: Option<(ProcessorMatch, Arc<dyn ResponseProcessor>)> = None;
        for processor in &self.processors {
            let assessment = processor.can_process(range, model, ctx);
            if !assessment.is_usable() {
                continue;
            }
            let better = match &best {
                None => true,
                Some((current, _)) => {
                    (assessment.model, assessment.content_type)
                        > (current.model, current.content_type)
                }
            };
            if better {
                best = Some((assessment, processor.clone()));
            }
        }
        best.map(|(_, processor)| processor)
    }

    /// Apply the directive's decorations. The status and reason
    /// overrides and the queued cookies are stamped on every negotiated
    /// response, the 406 included; extra headers and the alternate
    /// links only accompany a chosen representation.
    fn finalize(
        &self,
        mut response: HttpResponse,
        negotiation: &Negotiation,
        chosen: Option<&MediaRange>,
        ctx: &RequestContext,
    ) -> HttpResponse {
        if let Some(status) = negotiation.status {
            response.status = status;
        }
        if let Some(reason) = &negotiation.reason {
            response.reason_phrase = Some(reason.clone());
        }
        response.cookies.extend(negotiation.cookies.iter().cloned());
        response.set_header("Vary", "Accept");

        if let Some(chosen) = chosen {
            for (name, value) in &negotiation.headers {
                response.set_header(name.clone(), value.clone());
            }
            if let Some(link) = self.alternate_links(negotiation, chosen, &ctx.request.path) {
                response.set_header("Link", link);
            }
        }
        response
    }

    /// Alternate representation links for extensions whose range the
    /// handler permits, excluding the representation already chosen.
    fn alternate_links(
        &self,
        negotiation: &Negotiation,
        chosen: &MediaRange,
        path: &str,
    ) -> Option<String> {
        let base = path.trim_end_matches('/');
        let mut links = Vec::new();
        for processor in &self.processors {
            for (extension, range) in processor.extension_mappings() {
                if &range == chosen || !negotiation.permits(&range) {
                    continue;
                }
                links.push(format!(
                    "<{}.{}>; rel=\"alternate\"; type=\"{}\"",
                    base, extension, range
                ));
            }
        }
        if links.is_empty() {
            None
        } else {
            Some(links.join(", "))
        }
    }
}
