//! Route cache: one description per declared route.
//!
//! Built once from the module catalog at startup, then read-only and
//! shared across request threads. For every module the catalog knows,
//! every declared route gets a [`RouteDescription`] carrying its
//! extracted segments, documentation text from the description provider,
//! and metadata from the registered metadata providers.

use crate::logging::debug;
use crate::segment::extract_segments;
use crate::{
    Module, ModuleCatalog, RequestContext, RouteDescription, RouteDescriptionProvider,
    RouteMetadata, RouteMetadataProvider,
};
use std::collections::HashMap;
use std::sync::Arc;

/// One cached route: its index within the owning module plus the
/// immutable description.
#[derive(Debug, Clone)]
pub struct CachedRoute {
    pub index: usize,
    pub description: RouteDescription,
}

/// The built route cache, keyed by module key.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: HashMap<String, Vec<CachedRoute>>,
}

impl RouteCache {
    /// Build the cache from a catalog using a synthetic GET "/" context.
    pub fn build(
        catalog: &dyn ModuleCatalog,
        description_provider: Option<&dyn RouteDescriptionProvider>,
        metadata_providers: &[Arc<dyn RouteMetadataProvider>],
    ) -> Self {
        Self::build_with(
            catalog,
            RequestContext::synthetic_root,
            description_provider,
            metadata_providers,
        )
    }

    /// Build the cache using a caller-supplied context factory, for
    /// catalogs that enumerate routes against a specific request shape.
    pub fn build_with(
        catalog: &dyn ModuleCatalog,
        context_factory: impl Fn() -> RequestContext,
        description_provider: Option<&dyn RouteDescriptionProvider>,
        metadata_providers: &[Arc<dyn RouteMetadataProvider>],
    ) -> Self {
        let ctx = context_factory();
        let mut entries: HashMap<String, Vec<CachedRoute>> = HashMap::new();

        for module in catalog.all_modules(&ctx) {
            let routes = catalog_module(module.as_ref(), description_provider, metadata_providers);
            debug!(
                module = module.key(),
                routes = routes.len(),
                "cataloged module routes"
            );
            entries.insert(module.key().to_string(), routes);
        }

        Self { entries }
    }

    /// Whether any route exists at all.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|routes| routes.is_empty())
    }

    /// Cached routes for a module, in declaration order.
    pub fn routes_for(&self, module_key: &str) -> Option<&[CachedRoute]> {
        self.entries.get(module_key).map(Vec::as_slice)
    }

    /// Iterate over (module key, routes) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CachedRoute])> {
        self.entries
            .iter()
            .map(|(key, routes)| (key.as_str(), routes.as_slice()))
    }

    /// Total number of cached routes.
    pub fn route_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

fn catalog_module(
    module: &dyn Module,
    description_provider: Option<&dyn RouteDescriptionProvider>,
    metadata_providers: &[Arc<dyn RouteMetadataProvider>],
) -> Vec<CachedRoute> {
    module
        .routes()
        .into_iter()
        .enumerate()
        .map(|(index, route)| {
            let full_path = join_paths(module.base_path(), &route.path);
            let segments = extract_segments(&full_path);

            let description = description_provider.and_then(|p| p.describe(module, &route));

            let mut metadata = RouteMetadata::new();
            for provider in metadata_providers {
                provider.apply(module, &route, &mut metadata);
            }

            CachedRoute {
                index,
                description: RouteDescription {
                    name: route.name.clone(),
                    method: route.method,
                    path: full_path,
                    condition: route.condition.clone(),
                    segments,
                    metadata,
                    description,
                },
            }
        })
        .collect()
}

/// Join a module base path and a route path with exactly one separator.
fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", path)
    } else if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}
