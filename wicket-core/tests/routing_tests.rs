//! Integration tests for route matching and resolution

use std::sync::Arc;
use wicket_core::*;
use wicket_testing::{TestApp, assert_status, assert_success};

fn respond(name: &'static str) -> RouteHandlerFn {
    route_handler(move |ctx, _token| async move {
        let mut body = serde_json::Map::new();
        body.insert("route".into(), name.into());
        for (param, value) in ctx.parameters.iter().map(|p| (&p.name, &p.value)) {
            body.insert(param.clone(), value.clone().into());
        }
        Ok(HandlerResult::Model(serde_json::Value::Object(body)))
    })
}

fn app(module: SimpleModule) -> wicket_testing::TestClient {
    TestApp::new().module(Arc::new(module)).client()
}

#[tokio::test]
async fn test_literal_and_capture_resolution() {
    let client = app(SimpleModule::new("m")
        .route(RouteDefinition::new(HttpMethod::GET, "/users", respond("list")))
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/users/{id}",
            respond("one"),
        )));

    let list = client.get("/users").await;
    assert_success(&list);
    let body: serde_json::Value = list.body_json().unwrap();
    assert_eq!(body["route"], "list");

    let one = client.get("/users/42").await;
    let body: serde_json::Value = one.body_json().unwrap();
    assert_eq!(body["route"], "one");
    assert_eq!(body["id"], "42");
}

#[tokio::test]
async fn test_specificity_ordering_end_to_end() {
    let client = app(SimpleModule::new("m")
        .route(RouteDefinition::new(HttpMethod::GET, "/x/{v}", respond("plain")))
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/x/{v:int}",
            respond("constrained"),
        ))
        .route(RouteDefinition::new(HttpMethod::GET, "/x/exact", respond("literal"))));

    let body: serde_json::Value = client.get("/x/exact").await.body_json().unwrap();
    assert_eq!(body["route"], "literal");

    let body: serde_json::Value = client.get("/x/99").await.body_json().unwrap();
    assert_eq!(body["route"], "constrained");

    let body: serde_json::Value = client.get("/x/banana").await.body_json().unwrap();
    assert_eq!(body["route"], "plain");
}

#[tokio::test]
async fn test_constraints_gate_matching() {
    let client = app(SimpleModule::new("m")
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/orders/{id:guid}",
            respond("by-guid"),
        ))
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/orders/{year:range(2000,2100)}",
            respond("by-year"),
        )));

    let guid = client
        .get("/orders/0f8fad5b-d9cb-469f-a165-70867728950e")
        .await;
    let body: serde_json::Value = guid.body_json().unwrap();
    assert_eq!(body["route"], "by-guid");

    let year = client.get("/orders/2024").await;
    let body: serde_json::Value = year.body_json().unwrap();
    assert_eq!(body["route"], "by-year");

    assert_status(&client.get("/orders/1850").await, 404);
}

#[tokio::test]
async fn test_greedy_and_optional_segments() {
    let client = app(SimpleModule::new("m")
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/files/{path*}",
            respond("files"),
        ))
        .route(RouteDefinition::new(
            HttpMethod::GET,
            "/greet/{name?stranger}",
            respond("greet"),
        )));

    let body: serde_json::Value = client.get("/files/a/b/c.txt").await.body_json().unwrap();
    assert_eq!(body["path"], "a/b/c.txt");

    let body: serde_json::Value = client.get("/greet").await.body_json().unwrap();
    assert_eq!(body["name"], "stranger");

    let body: serde_json::Value = client.get("/greet/ada").await.body_json().unwrap();
    assert_eq!(body["name"], "ada");
}

#[tokio::test]
async fn test_case_sensitivity_toggle() {
    let module = || {
        SimpleModule::new("m").route(RouteDefinition::new(
            HttpMethod::GET,
            "/CamelCase",
            respond("camel"),
        ))
    };

    let insensitive = TestApp::new().module(Arc::new(module())).client();
    assert_success(&insensitive.get("/camelcase").await);

    let sensitive = TestApp::new()
        .module(Arc::new(module()))
        .resolver_config(ResolverConfig {
            case_sensitive: true,
            ..Default::default()
        })
        .client();
    assert_status(&sensitive.get("/camelcase").await, 404);
    assert_success(&sensitive.get("/CamelCase").await);
}

#[tokio::test]
async fn test_base_path_prefixes_routes() {
    let client = app(SimpleModule::new("api")
        .with_base_path("/api/v1")
        .route(RouteDefinition::new(HttpMethod::GET, "/ping", respond("ping"))));

    assert_success(&client.get("/api/v1/ping").await);
    assert_status(&client.get("/ping").await, 404);
}

#[tokio::test]
async fn test_method_not_allowed_and_options() {
    let client = app(SimpleModule::new("m")
        .route(RouteDefinition::new(HttpMethod::GET, "/thing", respond("get")))
        .route(RouteDefinition::new(HttpMethod::POST, "/thing", respond("post"))));

    let wrong = client.delete("/thing").await;
    assert_status(&wrong, 405);
    assert_eq!(wrong.header("Allow"), Some("GET, POST, HEAD"));

    let options = client.options("/thing").await;
    assert_status(&options, 200);
    assert_eq!(options.header("Allow"), Some("GET, POST, HEAD"));
}

#[tokio::test]
async fn test_head_is_get_without_body() {
    let client = app(SimpleModule::new("m").route(RouteDefinition::new(
        HttpMethod::GET,
        "/doc",
        route_handler(|_ctx, _token| async {
            Ok(HandlerResult::Response(HttpResponse::ok().with_text("hello")))
        }),
    )));

    let get = client.get("/doc").await;
    assert_eq!(get.body_string().as_deref(), Some("hello"));

    let head = client.head("/doc").await;
    assert_status(&head, 200);
    assert_eq!(head.body_string().as_deref(), Some(""));
    assert_eq!(
        head.header("Content-Type"),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn test_route_condition_filters() {
    let client = app(SimpleModule::new("m")
        .route(
            RouteDefinition::new(HttpMethod::GET, "/feature", respond("beta"))
                .when(|ctx| ctx.request.header("X-Beta").is_some()),
        )
        .route(RouteDefinition::new(HttpMethod::GET, "/feature", respond("stable"))));

    let plain: serde_json::Value = client.get("/feature").await.body_json().unwrap();
    assert_eq!(plain["route"], "stable");

    let request = wicket_testing::TestRequestBuilder::new(HttpMethod::GET, "/feature")
        .header("X-Beta", "on")
        .build();
    let gated: serde_json::Value = client.request(request).await.body_json().unwrap();
    assert_eq!(gated["route"], "beta");
}

#[tokio::test]
async fn test_modules_do_not_interfere() {
    let client = TestApp::new()
        .module(Arc::new(SimpleModule::new("a").route(RouteDefinition::new(
            HttpMethod::GET,
            "/a/{id:int}",
            respond("a"),
        ))))
        .module(Arc::new(SimpleModule::new("b").route(RouteDefinition::new(
            HttpMethod::GET,
            "/b/{id:int}",
            respond("b"),
        ))))
        .client();

    let body: serde_json::Value = client.get("/a/1").await.body_json().unwrap();
    assert_eq!(body["route"], "a");
    let body: serde_json::Value = client.get("/b/2").await.body_json().unwrap();
    assert_eq!(body["route"], "b");
}
