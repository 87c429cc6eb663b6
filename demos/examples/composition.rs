//! Composition Example
//!
//! Stacks the cacheable, lockable and cancelable extensions over a simulated
//! transport and walks through each behavior. No network access is needed.
//!
//! Run:
//!   cargo run -p reqext-demos --example composition
//!
//! Set `RUST_LOG=reqext=debug` to watch hits, misses and cancellations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqext::{AdapterExt, CacheExtension, CancelExtension, ExtensionsConfig, LockExtension};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, RequestOptions, adapter_fn,
    cancellable, is_cancel, is_repeat_submit,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqext=debug".into()),
        )
        .init();

    let config: ExtensionsConfig = serde_saphyr::from_str(
        r#"
        cache:
          ttl: 2s
          base_url: https://api.example.com/
        cancel:
          base_url: https://api.example.com/
        lock:
          base_url: https://api.example.com/
        "#,
    )?;

    // Simulated transport: 200 ms latency, honours cancellation.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let transport = adapter_fn(move |req: AdapterRequest| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let signal = req.cancellation().cloned();
            cancellable(signal, req.url(), async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, AdapterError>(AdapterResponse::ok(
                    serde_json::json!({ "code": 0, "call": n }).to_string(),
                ))
            })
            .await
        }
    });

    let cache = CacheExtension::builder()
        .options(config.cache)
        .admit_if(|body| body["code"] == 0)
        .build();
    let lock = LockExtension::new(config.lock);
    let cancel = CancelExtension::new(config.cancel);
    let mut client = transport.with(&cache).with(&lock).with(&cancel).boxed();

    println!("=== Cache: first request (miss) ===");
    let users = || {
        AdapterRequest::get("users?page=1").with_options(RequestOptions::new().cacheable(true))
    };
    let response = client.call(users()).await?;
    println!("body: {}", String::from_utf8_lossy(response.body()));

    println!("\n=== Cache: same request (hit) ===");
    let response = client.call(users()).await?;
    println!("body: {}", String::from_utf8_lossy(response.body()));
    println!("transport calls so far: {}", calls.load(Ordering::SeqCst));

    println!("\n=== Cache: after the TTL (miss) ===");
    tokio::time::sleep(Duration::from_millis(2100)).await;
    let response = client.call(users()).await?;
    println!("body: {}", String::from_utf8_lossy(response.body()));

    println!("\n=== Lock: double submit ===");
    let submit = || {
        AdapterRequest::post("orders")
            .with_json(serde_json::json!({ "sku": 7 }))
            .with_options(RequestOptions::new().lockable(true))
    };
    let (first, second) = tokio::join!(client.call(submit()), client.call(submit()));
    println!("first ok: {}", first.is_ok());
    match second {
        Err(error) if is_repeat_submit(&error) => println!("second rejected: {error}"),
        other => println!("unexpected: {other:?}"),
    }

    println!("\n=== Cancel: superseded search ===");
    let search = |q: &str| {
        AdapterRequest::get(format!("search?q={q}"))
            .with_options(RequestOptions::new().cancelable(true))
    };
    let (first, second) = tokio::join!(client.call(search("ru")), client.call(search("rust")));
    match first {
        Err(error) if is_cancel(&error) => println!("first cancelled: {error}"),
        other => println!("unexpected: {other:?}"),
    }
    println!("second ok: {}", second.is_ok());

    println!("\n=== Cancel: route change ===");
    let feed = AdapterRequest::get("feed")
        .with_options(RequestOptions::new().only_switch_route_cancelable(true));
    let pending = client.call(feed);
    println!("cancelled on route change: {}", cancel.cancel_all());
    println!("feed cancelled: {}", pending.await.is_err());

    println!("\ntotal transport calls: {}", calls.load(Ordering::SeqCst));
    Ok(())
}
