// Per-request context shared across resolution, hooks, and handlers

use crate::{HttpMethod, HttpRequest, RouteParams};
use std::sync::{Arc, Mutex};

/// Diagnostic trace for a single request.
///
/// Entries are appended by the core (short-circuit reasons, resolution
/// notes) and can be inspected after dispatch. Cloning shares the
/// underlying log, so a context clone handed to a hook still records
/// into the same trace.
#[derive(Debug, Clone, Default)]
pub struct RequestTrace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RequestTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the trace.
    pub fn log(&self, message: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.into());
        }
    }

    /// Snapshot of the trace entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Request-scoped state threaded through resolution, invocation, and
/// negotiation. Never shared across requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: HttpRequest,
    /// Parameters captured by route matching; empty until resolution.
    pub parameters: RouteParams,
    pub trace: RequestTrace,
}

impl RequestContext {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            parameters: RouteParams::new(),
            trace: RequestTrace::new(),
        }
    }

    /// Context for a synthetic GET "/" request, used when cataloging
    /// modules that need a request in scope to enumerate their routes.
    pub fn synthetic_root() -> Self {
        Self::new(HttpRequest::new(HttpMethod::GET, "/"))
    }
}
