//! Router integration tests.
//!
//! Routes are served through the in-memory test client with real chains in
//! front of them, covering parameter binding, per-route and group units,
//! and the fallback responses.

use std::sync::Arc;

use http::header::ALLOW;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use strand_core::{handler_fn, Error, Handler, ResponseWriterExt};
use strand_middleware::stages::{user, BasicAuth};
use strand_middleware::{boxed, from_fn, BoxedMiddleware, Chain};
use strand_router::{param, params, Router};
use strand_test::TestClient;

type Trace = Arc<Mutex<Vec<&'static str>>>;

fn mark(name: &'static str, trace: &Trace) -> BoxedMiddleware {
    let trace = Arc::clone(trace);
    boxed(from_fn(name, move |ctx, w, req, next| {
        trace.lock().push(name);
        next.run(ctx, w, req)
    }))
}

fn echo_param(name: &'static str) -> impl Handler {
    handler_fn(move |ctx, w, _req| {
        let value = param(&ctx, name).to_string();
        Box::pin(async move { w.write_all(value.as_bytes()) })
    })
}

#[tokio::test]
async fn test_params_are_bound() {
    let mut router = Router::default();
    router.get("/users/{id}", echo_param("id")).unwrap();
    router.get("/files/{*path}", echo_param("path")).unwrap();
    let client = TestClient::new(router);

    assert_eq!(client.get("/users/42").send().await.text().unwrap(), "42");
    assert_eq!(
        client.get("/files/a/b/c.txt").send().await.text().unwrap(),
        "a/b/c.txt"
    );
}

#[tokio::test]
async fn test_query_does_not_affect_matching() {
    let mut router = Router::default();
    router
        .get(
            "/search",
            handler_fn(|ctx, w, _req| {
                let count = params(&ctx).map_or(usize::MAX, |p| p.len());
                Box::pin(async move { w.write_all(count.to_string().as_bytes()) })
            }),
        )
        .unwrap();

    let response = TestClient::new(router).get("/search?q=x").send().await;
    assert_eq!(response.text().unwrap(), "0");
}

#[tokio::test]
async fn test_base_and_route_units_run_in_order() {
    let trace = Trace::default();
    let mut router = Router::new(Chain::new().extend([mark("base", &trace)]));
    let extra = Chain::new().extend([mark("route", &trace)]);
    router
        .handle_with(Method::GET, "/", &extra, echo_param("none"))
        .unwrap();
    router.get("/plain", echo_param("none")).unwrap();
    let client = TestClient::new(router);

    client.get("/").send().await;
    assert_eq!(*trace.lock(), ["base", "route"]);

    trace.lock().clear();
    client.get("/plain").send().await;
    assert_eq!(*trace.lock(), ["base"]);
}

#[tokio::test]
async fn test_group_units_guard_only_the_group() {
    let mut router = Router::default();
    router.get("/public", echo_param("none")).unwrap();

    let guard = Chain::new().append(BasicAuth::new("admin", |u, p| u == "root" && p == "secret"));
    router
        .group("/admin", &guard)
        .get(
            "/whoami",
            handler_fn(|ctx, w, _req| {
                let name = user(&ctx).to_string();
                Box::pin(async move { w.write_all(name.as_bytes()) })
            }),
        )
        .unwrap();
    let client = TestClient::new(router);

    assert_eq!(client.get("/public").send().await.status(), StatusCode::OK);

    let denied = client.get("/admin/whoami").send().await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert!(matches!(denied.error(), Some(Error::Unauthorized)));

    let allowed = client
        .get("/admin/whoami")
        .basic_auth("root", "secret")
        .send()
        .await;
    assert_eq!(allowed.text().unwrap(), "root");
}

#[tokio::test]
async fn test_fallback_responses() {
    let mut router = Router::default();
    router.post("/items", echo_param("none")).unwrap();
    let client = TestClient::new(router);

    let missing = client.get("/nowhere").send().await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.text().unwrap(), "404 page not found");
    assert!(missing.outcome().is_ok());

    let wrong_method = client.get("/items").send().await;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong_method.header(ALLOW), Some("POST"));
}

#[tokio::test]
async fn test_router_behind_chain() {
    let trace = Trace::default();
    let mut router = Router::default();
    router.get("/users/{id}", echo_param("id")).unwrap();

    let handler = Chain::new().extend([mark("outer", &trace)]).then(router);
    let response = TestClient::from_boxed(handler).get("/users/7").send().await;

    assert_eq!(response.text().unwrap(), "7");
    assert_eq!(*trace.lock(), ["outer"]);
}
