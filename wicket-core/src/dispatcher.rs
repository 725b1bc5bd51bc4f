//! Request dispatch: the full per-request lifecycle.
//!
//! Resolution, the module's before hook, handler invocation with
//! negotiation, HEAD body stripping, the after hook, and the error hook.
//! A miss whose path carries a known file extension is retried with the
//! extension stripped and the Accept header rewritten to the mapped
//! media type, so `/users/7.json` reaches the `/users/{id}` route as a
//! JSON request.

use crate::logging::{debug, error, info, trace};
use crate::media::AcceptHeader;
use crate::negotiator::ResponseNegotiator;
use crate::resolver::{ResolvedMatch, ResolvedRoute, RouteResolver};
use crate::{Error, HttpMethod, HttpRequest, HttpResponse, RequestContext, RouteInvoker};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct RequestDispatcher {
    resolver: RouteResolver,
    negotiator: Arc<ResponseNegotiator>,
    invoker: RouteInvoker,
}

impl RequestDispatcher {
    pub fn new(resolver: RouteResolver, negotiator: Arc<ResponseNegotiator>) -> Self {
        let invoker = RouteInvoker::new(negotiator.clone());
        Self {
            resolver,
            negotiator,
            invoker,
        }
    }

    /// Dispatch a request, creating a fresh context for it.
    pub async fn dispatch(
        &self,
        request: HttpRequest,
        token: CancellationToken,
    ) -> Result<HttpResponse, Error> {
        let mut ctx = RequestContext::new(request);
        self.dispatch_with_context(&mut ctx, token).await
    }

    /// Dispatch a request, returning a response even on failure: errors
    /// become their mapped status with the message as a plain text body.
    pub async fn handle(&self, request: HttpRequest, token: CancellationToken) -> HttpResponse {
        match self.dispatch(request, token).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "request failed");
                HttpResponse::new(err.status_code()).with_text(err.to_string())
            }
        }
    }

    /// Dispatch against a caller-owned context, so the trace and
    /// captured parameters remain inspectable afterwards.
    pub async fn dispatch_with_context(
        &self,
        ctx: &mut RequestContext,
        token: CancellationToken,
    ) -> Result<HttpResponse, Error> {
        info!(method = %ctx.request.method, path = %ctx.request.path, "dispatching");

        let resolved = self.resolve_with_extension_rewrite(ctx);

        match resolved {
            ResolvedRoute::Matched(matched) => {
                match self.run_matched(&matched, ctx, &token).await {
                    Ok(response) => Ok(response),
                    Err(err) => self.run_error_hook(&matched, ctx, err, token).await,
                }
            }
            synthetic => self.invoker.invoke(synthetic, ctx, token).await,
        }
    }

    /// Resolve the request, trying an extension rewrite first when the
    /// path ends in a file extension some processor claims: the
    /// extension is stripped and the Accept header rewritten to the
    /// mapped media type, with the original entries kept at reduced
    /// quality. A miss on the rewritten path restores the original
    /// request and resolves again.
    fn resolve_with_extension_rewrite(&self, ctx: &mut RequestContext) -> ResolvedRoute {
        let Some((stem, accept)) = self.extension_rewrite(&ctx.request) else {
            return self.resolver.resolve(ctx);
        };

        let original_path = std::mem::replace(&mut ctx.request.path, stem);
        let original_accept = ctx.request.header("Accept").map(str::to_string);
        ctx.request.set_header("Accept", accept.to_string());
        debug!(from = %original_path, to = %ctx.request.path, accept = %accept, "extension rewrite");
        ctx.trace.log(format!(
            "path {} rewritten to {} with Accept: {}",
            original_path, ctx.request.path, accept
        ));

        let resolved = self.resolver.resolve(ctx);
        if matches!(resolved, ResolvedRoute::Matched(_)) {
            return resolved;
        }

        // Nothing at the stripped path; put the request back as sent
        ctx.request.path = original_path;
        match original_accept {
            Some(value) => ctx.request.set_header("Accept", value),
            None => {
                ctx.request
                    .headers
                    .retain(|name, _| !name.eq_ignore_ascii_case("Accept"));
            }
        }
        ctx.trace.log("extension rewrite missed, restored original path");
        self.resolver.resolve(ctx)
    }

    fn extension_rewrite(&self, request: &HttpRequest) -> Option<(String, AcceptHeader)> {
        let (stem, extension) = request.path.rsplit_once('.')?;
        if stem.is_empty() || stem.ends_with('/') || extension.contains('/') {
            return None;
        }
        let range = self.negotiator.range_for_extension(extension)?;

        let mut accept = AcceptHeader::default();
        if let Some(existing) = request.header("Accept") {
            for (entry, quality) in AcceptHeader::parse(existing).entries() {
                accept.push(entry.clone(), quality * 0.9);
            }
        }
        accept.push(range, 1.0);
        Some((stem.to_string(), accept))
    }

    async fn run_matched(
        &self,
        matched: &ResolvedMatch,
        ctx: &RequestContext,
        token: &CancellationToken,
    ) -> Result<HttpResponse, Error> {
        let mut response = match self.run_before(matched, ctx, token).await? {
            Some(early) => {
                trace!("before hook short-circuited the request");
                early
            }
            None => {
                let result = (matched.route.handler)(ctx.clone(), token.clone()).await?;
                self.negotiator.negotiate(result, ctx).await?
            }
        };

        if ctx.request.method == HttpMethod::HEAD {
            response = response.into_head_response();
        }

        if let Some(after) = matched.module.after() {
            response = after(ctx.clone(), response, token.clone())
                .await
                .map_err(|err| Error::Hook(Box::new(err)))?;
        }

        Ok(response)
    }

    async fn run_before(
        &self,
        matched: &ResolvedMatch,
        ctx: &RequestContext,
        token: &CancellationToken,
    ) -> Result<Option<HttpResponse>, Error> {
        match matched.module.before() {
            Some(before) => before(ctx.clone(), token.clone())
                .await
                .map_err(|err| Error::Hook(Box::new(err))),
            None => Ok(None),
        }
    }

    /// Offer a fault to the module's error hook. A produced result is
    /// negotiated like a handler result; otherwise the error propagates
    /// with any hook wrapping removed.
    async fn run_error_hook(
        &self,
        matched: &ResolvedMatch,
        ctx: &RequestContext,
        err: Error,
        token: CancellationToken,
    ) -> Result<HttpResponse, Error> {
        if let Some(hook) = matched.module.on_error() {
            if let Some(result) = hook(ctx.clone(), &err, token).await {
                ctx.trace.log(format!("error handled by module hook: {}", err));
                return self.negotiator.negotiate(result, ctx).await;
            }
        }
        Err(err.flatten())
    }
}
