//! Route invocation.
//!
//! Runs the matched handler and hands its result to the negotiator, and
//! produces the canned responses for the synthetic resolution outcomes
//! (not found, method not allowed, automatic OPTIONS).

use crate::logging::debug;
use crate::negotiator::ResponseNegotiator;
use crate::resolver::{ResolvedRoute, allow_header};
use crate::{Error, HttpResponse, RequestContext};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct RouteInvoker {
    negotiator: Arc<ResponseNegotiator>,
}

impl RouteInvoker {
    pub fn new(negotiator: Arc<ResponseNegotiator>) -> Self {
        Self { negotiator }
    }

    /// Invoke a resolution outcome. Matched routes run their handler and
    /// negotiate the result; synthetic outcomes map to fixed responses.
    pub async fn invoke(
        &self,
        resolved: ResolvedRoute,
        ctx: &RequestContext,
        token: CancellationToken,
    ) -> Result<HttpResponse, Error> {
        match resolved {
            ResolvedRoute::Matched(matched) => {
                let result = (matched.route.handler)(ctx.clone(), token).await?;
                debug!(route = %matched.route.path, result = ?result, "handler completed");
                self.negotiator.negotiate(result, ctx).await
            }
            ResolvedRoute::NotFound => Ok(HttpResponse::not_found()),
            ResolvedRoute::MethodNotAllowed { allow } => Ok(HttpResponse::method_not_allowed()
                .with_header("Allow", allow_header(&allow))),
            ResolvedRoute::OptionsAuto { allow } => {
                Ok(HttpResponse::ok().with_header("Allow", allow_header(&allow)))
            }
        }
    }
}
