//! Showcase service.
//!
//! Routes:
//!
//! - `GET  /hello/{name}` - greeting, default chain only
//! - `POST /echo` - JSON body bound and rendered back
//! - `GET  /admin/stats` - behind Basic auth (`admin` / `admin`)
//! - `GET  /boom` - panics; recovered, logged, answered with 500
//!
//! Configuration comes from `strand.toml` (optional) and `STRAND__*`
//! environment variables.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::header::HeaderValue;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use strand::prelude::*;

#[derive(Debug, Deserialize, Serialize)]
struct Echo {
    message: String,
}

/// Counts requests and reports the count in a response header.
fn request_counter(counter: Arc<AtomicU64>) -> impl Middleware {
    adapt::http("request_counter", move |inner| {
        let counter = Arc::clone(&counter);
        plain_fn(move |w, req| {
            let inner = Arc::clone(&inner);
            let seen = counter.fetch_add(1, Ordering::Relaxed) + 1;
            Box::pin(async move {
                if let Ok(value) = HeaderValue::from_str(&seen.to_string()) {
                    w.headers_mut().insert("x-request-count", value);
                }
                inner.serve(w, req).await;
            })
        })
    })
}

fn routes(config: &StrandConfig, counter: Arc<AtomicU64>) -> anyhow::Result<Router> {
    let base = Chain::new()
        .append(RealIp)
        .append(config.logger.unit())
        .append(Recover::new())
        .append(LocalStore)
        .append(request_counter(Arc::clone(&counter)));
    let mut router = Router::new(base);

    router.get(
        "/hello/{name}",
        handler_fn(|ctx, w, _req| {
            let greeting = format!("hello {} from {}", param(&ctx, "name"), real_ip(&ctx));
            Box::pin(async move { w.write_all(greeting.as_bytes()) })
        }),
    )?;

    let echo = Chain::new()
        .append(Render::pretty_json())
        .append(Bind::<Echo>::json());
    router.handle_with(
        http::Method::POST,
        "/echo",
        &echo,
        handler_fn(|ctx, _w, _req| {
            let outcome = match bound::<Echo>(&ctx) {
                Some(echo) => yield_data(&ctx, StatusCode::OK, echo),
                None => Err(Error::decode("no body bound")),
            };
            Box::pin(async move { outcome })
        }),
    )?;

    router.get(
        "/boom",
        handler_fn(|_ctx, _w, _req| Box::pin(async { explode() })),
    )?;

    let guard = Chain::new().append(
        config
            .basic_auth
            .unit(|user, pass| user == "admin" && pass == "admin"),
    );
    router.group("/admin", &guard).get(
        "/stats",
        handler_fn(move |ctx, w, _req| {
            let body = format!(
                "user={} requests={}",
                user(&ctx),
                counter.load(Ordering::Relaxed)
            );
            Box::pin(async move { w.write_all(body.as_bytes()) })
        }),
    )?;

    Ok(router)
}

fn explode() -> strand::core::Result<()> {
    panic!("showcase panic")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_optional_file("strand.toml")?
        .with_env_prefix("STRAND")
        .load()?;
    init_logging(&config.logging.log_config())?;

    let router = routes(&config, Arc::default())?;
    tracing::info!(routes = router.len(), "routes registered");

    Server::new(config.server.server_config(), router).run().await?;
    Ok(())
}
