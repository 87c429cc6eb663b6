//! Tower Service Example
//!
//! Builds a client stack with `tower::ServiceBuilder`: the extension layers
//! wrap a `TowerAdapter` around a simulated backend service.
//!
//! Run:
//!   cargo run -p reqext-demos --example tower

use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use reqext::{CacheExtension, CancelExtension, LockExtension};
use reqext_core::{Adapter, AdapterRequest, RequestOptions};
use reqext_tower::{CacheLayer, CancelLayer, LockLayer, TowerAdapterLayer};
use tower::{ServiceBuilder, service_fn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("reqext=debug,reqext_tower=debug")
        .init();

    let backend = service_fn(|req: Request<Full<Bytes>>| async move {
        // Simulate some work
        tokio::time::sleep(Duration::from_millis(50)).await;
        let body = format!(
            r#"{{"code":0,"path":"{}","at":"{:?}"}}"#,
            req.uri().path(),
            std::time::SystemTime::now()
        );
        Ok::<_, Infallible>(
            Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .unwrap(),
        )
    });

    let cache = CacheLayer::new(
        CacheExtension::builder()
            .ttl(Duration::from_secs(30))
            .admit_if(|body| body["code"] == 0)
            .build(),
    );
    let cancel = CancelLayer::new(CancelExtension::default());
    let lock = LockLayer::new(LockExtension::default());

    let mut client = ServiceBuilder::new()
        .layer(cancel.clone())
        .layer(lock.clone())
        .layer(cache.clone())
        .layer(TowerAdapterLayer::new())
        .service(backend);

    for attempt in 1..=2 {
        let response = client
            .call(
                AdapterRequest::get("http://backend.local/time")
                    .with_options(RequestOptions::new().cacheable(true)),
            )
            .await?;
        println!(
            "attempt {attempt}: {}",
            String::from_utf8_lossy(response.body())
        );
    }

    cache.delete_cache_entry("http://backend.local/time");
    let response = client
        .call(
            AdapterRequest::get("http://backend.local/time")
                .with_options(RequestOptions::new().cacheable(true)),
        )
        .await?;
    println!(
        "after delete: {}",
        String::from_utf8_lossy(response.body())
    );

    println!("outstanding requests: {}", cancel.extension().registry().len());
    println!("held locks: {}", lock.extension().registry().len());
    Ok(())
}
