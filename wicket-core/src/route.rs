//! Route declarations and handler result types.
//!
//! A handler returns a closed set of result variants rather than an
//! arbitrary value: a ready [`HttpResponse`], a [`Negotiation`]
//! directive, a bare model to negotiate, a short-circuit carrying a
//! pre-built response and a diagnostic reason, or nothing (which becomes
//! an empty 200). The invoker and negotiator pattern-match on this sum
//! instead of probing types at runtime.

use crate::{Error, HttpResponse, Negotiation, RequestContext};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Boxed future used by type-erased handlers and hooks.
pub type BoxFuture<T> = futures_util::future::BoxFuture<'static, T>;

/// Type-erased route handler.
pub type RouteHandlerFn = Arc<
    dyn Fn(RequestContext, CancellationToken) -> BoxFuture<Result<HandlerResult, Error>>
        + Send
        + Sync,
>;

/// Per-route condition predicate, evaluated after specificity ordering.
pub type ConditionFn = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// What a route handler produced.
pub enum HandlerResult {
    /// A concrete response; bypasses negotiation entirely.
    Response(HttpResponse),
    /// An explicit negotiation directive.
    Negotiate(Negotiation),
    /// A bare model; wrapped into a negotiation with itself as the
    /// default model.
    Model(serde_json::Value),
    /// Stop processing and use this response, logging the reason to the
    /// request trace. Not an error.
    ShortCircuit {
        response: HttpResponse,
        reason: Option<String>,
    },
    /// Nothing; becomes an empty default response.
    Empty,
}

impl fmt::Debug for HandlerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerResult::Response(r) => f.debug_tuple("Response").field(&r.status).finish(),
            HandlerResult::Negotiate(_) => f.write_str("Negotiate(..)"),
            HandlerResult::Model(_) => f.write_str("Model(..)"),
            HandlerResult::ShortCircuit { response, reason } => f
                .debug_struct("ShortCircuit")
                .field("status", &response.status)
                .field("reason", reason)
                .finish(),
            HandlerResult::Empty => f.write_str("Empty"),
        }
    }
}

impl From<HttpResponse> for HandlerResult {
    fn from(response: HttpResponse) -> Self {
        HandlerResult::Response(response)
    }
}

impl From<Negotiation> for HandlerResult {
    fn from(negotiation: Negotiation) -> Self {
        HandlerResult::Negotiate(negotiation)
    }
}

impl From<serde_json::Value> for HandlerResult {
    fn from(model: serde_json::Value) -> Self {
        HandlerResult::Model(model)
    }
}

/// Wrap an async function into a type-erased route handler.
pub fn route_handler<F, Fut>(f: F) -> RouteHandlerFn
where
    F: Fn(RequestContext, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResult, Error>> + Send + 'static,
{
    Arc::new(move |ctx, token| Box::pin(f(ctx, token)))
}

/// A route as declared on a module: method, path pattern, optional
/// condition, and the handler to run on a match.
#[derive(Clone)]
pub struct RouteDefinition {
    pub name: String,
    pub method: crate::HttpMethod,
    pub path: String,
    pub condition: Option<ConditionFn>,
    pub handler: RouteHandlerFn,
}

impl RouteDefinition {
    pub fn new(
        method: crate::HttpMethod,
        path: impl Into<String>,
        handler: RouteHandlerFn,
    ) -> Self {
        Self {
            name: String::new(),
            method,
            path: path.into(),
            condition: None,
            handler,
        }
    }

    /// Set a stable route name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a condition predicate.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

/// Type-keyed metadata attached to a route description at cache build
/// time by registered metadata providers.
#[derive(Default, Clone)]
pub struct RouteMetadata {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RouteMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a metadata value, replacing any existing value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Retrieve a metadata value by type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RouteMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMetadata")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Immutable record of one declared route, owned by the route cache.
/// Built once when a module's routes are cataloged, never mutated after.
#[derive(Clone)]
pub struct RouteDescription {
    pub name: String,
    pub method: crate::HttpMethod,
    pub path: String,
    pub condition: Option<ConditionFn>,
    /// Raw path segments produced by the segment extractor.
    pub segments: Vec<String>,
    pub metadata: RouteMetadata,
    /// Documentation text from the description provider.
    pub description: Option<String>,
}

impl fmt::Debug for RouteDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescription")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("segments", &self.segments)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;

    fn noop_handler() -> RouteHandlerFn {
        route_handler(|_ctx, _token| async { Ok(HandlerResult::Empty) })
    }

    #[test]
    fn test_definition_builder() {
        let def = RouteDefinition::new(HttpMethod::GET, "/users/{id:int}", noop_handler())
            .named("get-user")
            .when(|ctx| ctx.request.header("X-Flag").is_some());

        assert_eq!(def.name, "get-user");
        assert_eq!(def.path, "/users/{id:int}");
        assert!(def.condition.is_some());
    }

    #[test]
    fn test_metadata_type_keyed() {
        #[derive(Debug, PartialEq)]
        struct DocTag(&'static str);

        let mut metadata = RouteMetadata::new();
        assert!(metadata.is_empty());
        metadata.insert(DocTag("users"));
        assert_eq!(metadata.get::<DocTag>(), Some(&DocTag("users")));
        assert_eq!(metadata.get::<String>(), None);
    }

    #[tokio::test]
    async fn test_handler_wrapper_invokes() {
        let handler = route_handler(|_ctx, _token| async {
            Ok(HandlerResult::Response(HttpResponse::ok()))
        });
        let ctx = RequestContext::synthetic_root();
        let result = handler(ctx, CancellationToken::new()).await.unwrap();
        assert!(matches!(result, HandlerResult::Response(r) if r.status == 200));
    }

    #[test]
    fn test_result_conversions() {
        let from_response: HandlerResult = HttpResponse::not_found().into();
        assert!(matches!(from_response, HandlerResult::Response(_)));

        let from_model: HandlerResult = serde_json::json!({"a": 1}).into();
        assert!(matches!(from_model, HandlerResult::Model(_)));
    }
}
