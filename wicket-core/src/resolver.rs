//! Route resolution: from a request to a route selection.
//!
//! The resolver queries the trie for every candidate matching the
//! request path, orders them by specificity score, evaluates route
//! conditions in that order, and materializes the owning module of the
//! first survivor through the catalog and module builder. When no
//! candidate fits the request method the resolver synthesizes a
//! method-not-allowed or automatic OPTIONS selection instead, so the
//! invoker never deals with a raw miss.

use crate::logging::{debug, trace};
use crate::trie::{MatchCandidate, RouteTrie};
use crate::{
    Error, HttpMethod, Module, ModuleBuilder, ModuleCatalog, RequestContext, RouteCache,
    RouteDefinition, RouteParams,
};
use std::sync::Arc;

/// Resolver behavior switches, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Whether literal segments, constraint text, and regex segments
    /// compare case-sensitively. Applies to the whole trie.
    pub case_sensitive: bool,
    /// When set, requests matching a path but no method resolve to not
    /// found instead of method not allowed.
    pub disable_method_not_allowed: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            disable_method_not_allowed: false,
        }
    }
}

/// A successful resolution: the built module, the matched route, and the
/// captured parameters.
#[derive(Clone)]
pub struct ResolvedMatch {
    pub module: Arc<dyn Module>,
    pub module_key: String,
    pub route: RouteDefinition,
    pub parameters: RouteParams,
}

impl std::fmt::Debug for ResolvedMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMatch")
            .field("module_key", &self.module_key)
            .field("route", &self.route.path)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Outcome of route resolution. Synthetic variants carry everything the
/// invoker needs to produce their canned responses.
#[derive(Debug)]
pub enum ResolvedRoute {
    Matched(ResolvedMatch),
    NotFound,
    MethodNotAllowed { allow: Vec<HttpMethod> },
    OptionsAuto { allow: Vec<HttpMethod> },
}

/// Resolves requests against the compiled trie.
pub struct RouteResolver {
    trie: RouteTrie,
    catalog: Arc<dyn ModuleCatalog>,
    builder: Arc<dyn ModuleBuilder>,
    config: ResolverConfig,
}

impl RouteResolver {
    /// Compile the trie from the cache and assemble the resolver.
    pub fn new(
        catalog: Arc<dyn ModuleCatalog>,
        builder: Arc<dyn ModuleBuilder>,
        cache: &RouteCache,
        config: ResolverConfig,
    ) -> Result<Self, Error> {
        let trie = RouteTrie::build(cache, config.case_sensitive)?;
        Ok(Self {
            trie,
            catalog,
            builder,
            config,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a request. On a match the context's parameters are
    /// replaced with the captured ones.
    pub fn resolve(&self, ctx: &mut RequestContext) -> ResolvedRoute {
        let method = ctx.request.method;
        // HEAD requests are served by GET routes; the dispatcher strips
        // the body afterwards.
        let lookup = if method == HttpMethod::HEAD {
            HttpMethod::GET
        } else {
            method
        };

        let mut candidates = self.trie.matches(&ctx.request.path);
        if candidates.is_empty() {
            trace!(path = %ctx.request.path, "no route candidates");
            return ResolvedRoute::NotFound;
        }

        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        for candidate in candidates.iter().filter(|c| c.method == lookup) {
            if !self.condition_passes(candidate, ctx) {
                trace!(
                    module = %candidate.module_key,
                    route = candidate.route_index,
                    "route condition rejected candidate"
                );
                continue;
            }
            match self.materialize(candidate, ctx) {
                Some(resolved) => {
                    ctx.parameters = resolved.parameters.clone();
                    debug!(
                        module = %resolved.module_key,
                        route = %resolved.route.path,
                        "route resolved"
                    );
                    return ResolvedRoute::Matched(resolved);
                }
                None => continue,
            }
        }

        // Path matched, method did not. Work out what it would allow.
        let allow = self.allowed_methods(&candidates, ctx);
        if allow.is_empty() {
            return ResolvedRoute::NotFound;
        }

        if method == HttpMethod::OPTIONS {
            debug!(path = %ctx.request.path, ?allow, "automatic OPTIONS response");
            return ResolvedRoute::OptionsAuto { allow };
        }

        if self.config.disable_method_not_allowed {
            return ResolvedRoute::NotFound;
        }

        debug!(path = %ctx.request.path, %method, ?allow, "method not allowed");
        ResolvedRoute::MethodNotAllowed { allow }
    }

    fn condition_passes(&self, candidate: &MatchCandidate, ctx: &RequestContext) -> bool {
        match &candidate.condition {
            None => true,
            Some(condition) => {
                // Conditions see the captured parameters of their own
                // candidate, not whatever a previous attempt left behind.
                let mut probe = ctx.clone();
                probe.parameters = candidate.parameters.clone();
                condition(&probe)
            }
        }
    }

    fn materialize(&self, candidate: &MatchCandidate, ctx: &RequestContext) -> Option<ResolvedMatch> {
        let module = self.catalog.module_by_key(&candidate.module_key, ctx)?;
        let module = self.builder.build(module, ctx);
        let route = module.routes().into_iter().nth(candidate.route_index)?;
        Some(ResolvedMatch {
            module,
            module_key: candidate.module_key.clone(),
            route,
            parameters: candidate.parameters.clone(),
        })
    }

    /// Distinct methods of path candidates whose condition passes, in
    /// method order. GET support implies HEAD support.
    fn allowed_methods(
        &self,
        candidates: &[MatchCandidate],
        ctx: &RequestContext,
    ) -> Vec<HttpMethod> {
        let mut allow: Vec<HttpMethod> = Vec::new();
        for candidate in candidates {
            if self.condition_passes(candidate, ctx) && !allow.contains(&candidate.method) {
                allow.push(candidate.method);
            }
        }
        if allow.contains(&HttpMethod::GET) && !allow.contains(&HttpMethod::HEAD) {
            allow.push(HttpMethod::HEAD);
        }
        allow.sort();
        allow
    }
}

/// Render an Allow header value from a method list.
pub(crate) fn allow_header(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        HandlerResult, HttpRequest, PassthroughModuleBuilder, RouteDefinition, SimpleModule,
        StaticModuleCatalog, route_handler,
    };

    fn empty_handler() -> crate::RouteHandlerFn {
        route_handler(|_ctx, _token| async { Ok(HandlerResult::Empty) })
    }

    fn resolver_for(module: SimpleModule, config: ResolverConfig) -> RouteResolver {
        let catalog = Arc::new(StaticModuleCatalog::new().register(Arc::new(module)));
        let cache = RouteCache::build(catalog.as_ref(), None, &[]);
        RouteResolver::new(catalog, Arc::new(PassthroughModuleBuilder), &cache, config).unwrap()
    }

    fn ctx(method: HttpMethod, path: &str) -> RequestContext {
        RequestContext::new(HttpRequest::new(method, path))
    }

    #[test]
    fn test_resolves_and_captures() {
        let module = SimpleModule::new("users").route(RouteDefinition::new(
            HttpMethod::GET,
            "/users/{id:int}",
            empty_handler(),
        ));
        let resolver = resolver_for(module, ResolverConfig::default());

        let mut ctx = ctx(HttpMethod::GET, "/users/42");
        match resolver.resolve(&mut ctx) {
            ResolvedRoute::Matched(resolved) => {
                assert_eq!(resolved.module_key, "users");
                assert_eq!(resolved.parameters.as_i32("id"), Some(42));
            }
            other => panic!("expected match, got {:?}", other),
        }
        assert_eq!(ctx.parameters.as_i32("id"), Some(42));
    }

    #[test]
    fn test_not_found() {
        let module = SimpleModule::new("m").route(RouteDefinition::new(
            HttpMethod::GET,
            "/here",
            empty_handler(),
        ));
        let resolver = resolver_for(module, ResolverConfig::default());
        let mut ctx = ctx(HttpMethod::GET, "/elsewhere");
        assert!(matches!(resolver.resolve(&mut ctx), ResolvedRoute::NotFound));
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let module = SimpleModule::new("m")
            .route(RouteDefinition::new(HttpMethod::GET, "/thing", empty_handler()))
            .route(RouteDefinition::new(HttpMethod::POST, "/thing", empty_handler()));
        let resolver = resolver_for(module, ResolverConfig::default());

        let mut ctx = ctx(HttpMethod::DELETE, "/thing");
        match resolver.resolve(&mut ctx) {
            ResolvedRoute::MethodNotAllowed { allow } => {
                assert!(allow.contains(&HttpMethod::GET));
                assert!(allow.contains(&HttpMethod::POST));
                assert!(allow.contains(&HttpMethod::HEAD));
            }
            other => panic!("expected method not allowed, got {:?}", other),
        }
    }

    #[test]
    fn test_method_not_allowed_can_be_disabled() {
        let module = SimpleModule::new("m").route(RouteDefinition::new(
            HttpMethod::GET,
            "/thing",
            empty_handler(),
        ));
        let config = ResolverConfig {
            disable_method_not_allowed: true,
            ..Default::default()
        };
        let resolver = resolver_for(module, config);
        let mut ctx = ctx(HttpMethod::DELETE, "/thing");
        assert!(matches!(resolver.resolve(&mut ctx), ResolvedRoute::NotFound));
    }

    #[test]
    fn test_head_served_by_get_route() {
        let module = SimpleModule::new("m").route(RouteDefinition::new(
            HttpMethod::GET,
            "/thing",
            empty_handler(),
        ));
        let resolver = resolver_for(module, ResolverConfig::default());
        let mut ctx = ctx(HttpMethod::HEAD, "/thing");
        assert!(matches!(resolver.resolve(&mut ctx), ResolvedRoute::Matched(_)));
    }

    #[test]
    fn test_options_auto() {
        let module = SimpleModule::new("m")
            .route(RouteDefinition::new(HttpMethod::GET, "/thing", empty_handler()))
            .route(RouteDefinition::new(HttpMethod::PUT, "/thing", empty_handler()));
        let resolver = resolver_for(module, ResolverConfig::default());

        let mut ctx = ctx(HttpMethod::OPTIONS, "/thing");
        match resolver.resolve(&mut ctx) {
            ResolvedRoute::OptionsAuto { allow } => {
                assert!(allow.contains(&HttpMethod::GET));
                assert!(allow.contains(&HttpMethod::PUT));
            }
            other => panic!("expected auto OPTIONS, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_options_route_wins_over_auto() {
        let module = SimpleModule::new("m")
            .route(RouteDefinition::new(HttpMethod::GET, "/thing", empty_handler()))
            .route(RouteDefinition::new(HttpMethod::OPTIONS, "/thing", empty_handler()));
        let resolver = resolver_for(module, ResolverConfig::default());
        let mut ctx = ctx(HttpMethod::OPTIONS, "/thing");
        assert!(matches!(resolver.resolve(&mut ctx), ResolvedRoute::Matched(_)));
    }

    #[test]
    fn test_condition_rejects_then_falls_through() {
        let module = SimpleModule::new("m")
            .route(
                RouteDefinition::new(HttpMethod::GET, "/thing", empty_handler())
                    .named("gated")
                    .when(|ctx| ctx.request.header("X-Beta").is_some()),
            )
            .route(RouteDefinition::new(HttpMethod::GET, "/thing", empty_handler()).named("open"));
        let resolver = resolver_for(module, ResolverConfig::default());

        let mut plain = ctx(HttpMethod::GET, "/thing");
        match resolver.resolve(&mut plain) {
            ResolvedRoute::Matched(resolved) => assert_eq!(resolved.route.name, "open"),
            other => panic!("expected match, got {:?}", other),
        }

        let mut flagged = ctx(HttpMethod::GET, "/thing");
        flagged.request.set_header("X-Beta", "1");
        match resolver.resolve(&mut flagged) {
            ResolvedRoute::Matched(resolved) => assert_eq!(resolved.route.name, "gated"),
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_condition_sees_candidate_parameters() {
        let module = SimpleModule::new("m").route(
            RouteDefinition::new(HttpMethod::GET, "/items/{id}", empty_handler())
                .when(|ctx| ctx.parameters.as_i32("id").is_some()),
        );
        let resolver = resolver_for(module, ResolverConfig::default());

        let mut numeric = ctx(HttpMethod::GET, "/items/7");
        assert!(matches!(resolver.resolve(&mut numeric), ResolvedRoute::Matched(_)));

        let mut textual = ctx(HttpMethod::GET, "/items/seven");
        assert!(matches!(resolver.resolve(&mut textual), ResolvedRoute::NotFound));
    }

    #[test]
    fn test_allow_header_rendering() {
        assert_eq!(
            allow_header(&[HttpMethod::GET, HttpMethod::HEAD, HttpMethod::POST]),
            "GET, HEAD, POST"
        );
    }
}
