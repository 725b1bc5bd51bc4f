//! Module seams: catalogs, builders, hooks, and providers.
//!
//! A module groups routes under a common key and optional base path and
//! carries the per-module request hooks. The catalog and builder are
//! narrow collaborator traits: the core only needs to enumerate modules
//! to build its route cache and to materialize the module owning a
//! matched route. How modules are discovered or wired is not this
//! crate's concern.

use crate::{
    BoxFuture, Error, HandlerResult, HttpResponse, RequestContext, RouteDefinition,
    RouteMetadata,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Hook run before route invocation. A non-None response short-circuits
/// the request, skipping the handler.
pub type BeforeHook = Arc<
    dyn Fn(RequestContext, CancellationToken) -> BoxFuture<Result<Option<HttpResponse>, Error>>
        + Send
        + Sync,
>;

/// Hook run after route invocation, able to replace or decorate the
/// response.
pub type AfterHook = Arc<
    dyn Fn(RequestContext, HttpResponse, CancellationToken) -> BoxFuture<Result<HttpResponse, Error>>
        + Send
        + Sync,
>;

/// Hook offered any fault from invocation or the other hooks. A non-None
/// result is negotiated and returned instead of propagating the error.
pub type ErrorHook = Arc<
    dyn Fn(RequestContext, &Error, CancellationToken) -> BoxFuture<Option<HandlerResult>>
        + Send
        + Sync,
>;

/// A routable module: a named collection of routes plus optional hooks.
pub trait Module: Send + Sync {
    /// Stable key identifying this module in the route cache.
    fn key(&self) -> &str;

    /// Path prefix applied to every declared route.
    fn base_path(&self) -> &str {
        ""
    }

    /// The routes this module declares, in declaration order.
    fn routes(&self) -> Vec<RouteDefinition>;

    fn before(&self) -> Option<BeforeHook> {
        None
    }

    fn after(&self) -> Option<AfterHook> {
        None
    }

    fn on_error(&self) -> Option<ErrorHook> {
        None
    }
}

/// Enumerates and looks up modules. A context is supplied so catalogs
/// that need a request in scope (to enumerate routes lazily) can use it.
pub trait ModuleCatalog: Send + Sync {
    fn all_modules(&self, ctx: &RequestContext) -> Vec<Arc<dyn Module>>;

    fn module_by_key(&self, key: &str, ctx: &RequestContext) -> Option<Arc<dyn Module>>;
}

/// Prepares a module instance for request handling (attaching
/// formatters, view factories, and the like in the full framework).
pub trait ModuleBuilder: Send + Sync {
    fn build(&self, module: Arc<dyn Module>, ctx: &RequestContext) -> Arc<dyn Module>;
}

/// Supplies documentation text for a route at cache build time.
pub trait RouteDescriptionProvider: Send + Sync {
    fn describe(&self, module: &dyn Module, route: &RouteDefinition) -> Option<String>;
}

/// Populates type-keyed metadata on a route description at cache build
/// time. Not consulted during request resolution.
pub trait RouteMetadataProvider: Send + Sync {
    fn apply(&self, module: &dyn Module, route: &RouteDefinition, metadata: &mut RouteMetadata);
}

/// Catalog over a fixed set of modules registered up front.
#[derive(Default)]
pub struct StaticModuleCatalog {
    modules: Vec<Arc<dyn Module>>,
    by_key: HashMap<String, usize>,
}

impl StaticModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, module: Arc<dyn Module>) -> Self {
        self.by_key
            .insert(module.key().to_string(), self.modules.len());
        self.modules.push(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleCatalog for StaticModuleCatalog {
    fn all_modules(&self, _ctx: &RequestContext) -> Vec<Arc<dyn Module>> {
        self.modules.clone()
    }

    fn module_by_key(&self, key: &str, _ctx: &RequestContext) -> Option<Arc<dyn Module>> {
        self.by_key.get(key).map(|&i| self.modules[i].clone())
    }
}

/// Builder that returns modules unchanged. Suitable when modules carry
/// no per-request wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughModuleBuilder;

impl ModuleBuilder for PassthroughModuleBuilder {
    fn build(&self, module: Arc<dyn Module>, _ctx: &RequestContext) -> Arc<dyn Module> {
        module
    }
}

/// A module assembled from parts, for tests and small applications.
pub struct SimpleModule {
    key: String,
    base_path: String,
    routes: Vec<RouteDefinition>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    on_error: Option<ErrorHook>,
}

impl SimpleModule {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base_path: String::new(),
            routes: Vec::new(),
            before: None,
            after: None,
            on_error: None,
        }
    }

    pub fn with_base_path(mut self, base: impl Into<String>) -> Self {
        self.base_path = base.into();
        self
    }

    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_before(mut self, hook: BeforeHook) -> Self {
        self.before = Some(hook);
        self
    }

    pub fn with_after(mut self, hook: AfterHook) -> Self {
        self.after = Some(hook);
        self
    }

    pub fn with_on_error(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }
}

impl Module for SimpleModule {
    fn key(&self) -> &str {
        &self.key
    }

    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn routes(&self) -> Vec<RouteDefinition> {
        self.routes.clone()
    }

    fn before(&self) -> Option<BeforeHook> {
        self.before.clone()
    }

    fn after(&self) -> Option<AfterHook> {
        self.after.clone()
    }

    fn on_error(&self) -> Option<ErrorHook> {
        self.on_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpMethod, route_handler};

    fn empty_handler() -> crate::RouteHandlerFn {
        route_handler(|_ctx, _token| async { Ok(HandlerResult::Empty) })
    }

    #[test]
    fn test_static_catalog_lookup() {
        let module: Arc<dyn Module> = Arc::new(
            SimpleModule::new("users")
                .route(RouteDefinition::new(HttpMethod::GET, "/users", empty_handler())),
        );
        let catalog = StaticModuleCatalog::new().register(module);

        let ctx = RequestContext::synthetic_root();
        assert_eq!(catalog.all_modules(&ctx).len(), 1);
        assert!(catalog.module_by_key("users", &ctx).is_some());
        assert!(catalog.module_by_key("missing", &ctx).is_none());
    }

    #[test]
    fn test_simple_module_parts() {
        let module = SimpleModule::new("api")
            .with_base_path("/api")
            .route(RouteDefinition::new(HttpMethod::GET, "/ping", empty_handler()));

        assert_eq!(module.key(), "api");
        assert_eq!(module.base_path(), "/api");
        assert_eq!(module.routes().len(), 1);
        assert!(module.before().is_none());
    }

    #[test]
    fn test_passthrough_builder_identity() {
        let module: Arc<dyn Module> = Arc::new(SimpleModule::new("m"));
        let ctx = RequestContext::synthetic_root();
        let built = PassthroughModuleBuilder.build(module.clone(), &ctx);
        assert_eq!(built.key(), module.key());
    }
}
