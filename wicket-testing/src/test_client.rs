// Test HTTP client

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wicket_core::{
    Error, HttpMethod, HttpRequest, HttpResponse, Module, PassthroughModuleBuilder,
    RequestContext, RequestDispatcher, ResolverConfig, ResponseNegotiator, RouteCache,
    RouteResolver, StaticModuleCatalog,
};

/// Builds a dispatcher from modules for in-process request testing.
pub struct TestApp {
    catalog: StaticModuleCatalog,
    config: ResolverConfig,
    negotiator: ResponseNegotiator,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            catalog: StaticModuleCatalog::new(),
            config: ResolverConfig::default(),
            negotiator: ResponseNegotiator::new(),
        }
    }

    pub fn module(mut self, module: Arc<dyn Module>) -> Self {
        self.catalog = self.catalog.register(module);
        self
    }

    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn negotiator(mut self, negotiator: ResponseNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    /// Compile the routes and produce a client. Panics on malformed
    /// route patterns, which is what a test wants.
    pub fn client(self) -> TestClient {
        let catalog = Arc::new(self.catalog);
        let cache = RouteCache::build(catalog.as_ref(), None, &[]);
        let resolver = RouteResolver::new(
            catalog,
            Arc::new(PassthroughModuleBuilder),
            &cache,
            self.config,
        )
        .expect("route patterns failed to compile");
        let dispatcher = RequestDispatcher::new(resolver, Arc::new(self.negotiator));
        TestClient {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Test client dispatching requests in-process.
#[derive(Clone)]
pub struct TestClient {
    dispatcher: Arc<RequestDispatcher>,
}

impl TestClient {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(HttpRequest::new(HttpMethod::GET, path)).await
    }

    /// Make a HEAD request
    pub async fn head(&self, path: &str) -> TestResponse {
        self.request(HttpRequest::new(HttpMethod::HEAD, path)).await
    }

    /// Make an OPTIONS request
    pub async fn options(&self, path: &str) -> TestResponse {
        self.request(HttpRequest::new(HttpMethod::OPTIONS, path))
            .await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let mut request = HttpRequest::new(HttpMethod::POST, path);
        request.body = body;
        self.request(request).await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let mut request = HttpRequest::new(HttpMethod::PUT, path);
        request.body = body;
        self.request(request).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(HttpRequest::new(HttpMethod::DELETE, path))
            .await
    }

    /// Dispatch an arbitrary request, keeping the context for
    /// inspection.
    pub async fn request(&self, request: HttpRequest) -> TestResponse {
        let mut ctx = RequestContext::new(request);
        let result = self
            .dispatcher
            .dispatch_with_context(&mut ctx, CancellationToken::new())
            .await;
        TestResponse { result, ctx }
    }
}

/// Builder for test requests
pub struct TestRequestBuilder {
    request: HttpRequest,
}

impl TestRequestBuilder {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            request: HttpRequest::new(method, path),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request.set_header(name, value);
        self
    }

    pub fn accept(self, value: &str) -> Self {
        self.header("Accept", value)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.request.body = body;
        self
    }

    /// Set a JSON body with the matching content type
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Result<Self, Error> {
        self.request.body =
            serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self.header("Content-Type", "application/json"))
    }

    pub fn build(self) -> HttpRequest {
        self.request
    }
}

/// Response from a test request, with the request context it ran in.
#[derive(Debug)]
pub struct TestResponse {
    result: Result<HttpResponse, Error>,
    ctx: RequestContext,
}

impl TestResponse {
    /// Assert the dispatch produced a response
    pub fn assert_response(&self) -> &HttpResponse {
        match &self.result {
            Ok(response) => response,
            Err(error) => panic!("expected a response, got error: {:?}", error),
        }
    }

    /// Assert the dispatch failed
    pub fn assert_error(&self) -> &Error {
        match &self.result {
            Ok(response) => panic!(
                "expected an error, got response with status {}",
                response.status
            ),
            Err(error) => error,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().map(|r| r.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.result.as_ref().ok().and_then(|r| r.header(name))
    }

    pub fn body_string(&self) -> Option<String> {
        self.result
            .as_ref()
            .ok()
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
    }

    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self
            .result
            .as_ref()
            .map_err(|e| Error::Deserialization(format!("dispatch failed: {}", e)))?;
        serde_json::from_slice(&response.body).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// The diagnostic trace recorded while handling the request
    pub fn trace(&self) -> Vec<String> {
        self.ctx.trace.entries()
    }

    /// The context the request ran in
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }
}
