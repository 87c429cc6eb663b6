//! Example of using reqext-reqwest with reqwest-middleware.
//!
//! Caches a GitHub API response for a minute and shows that the second
//! request never leaves the process.
//!
//! Run:
//!   cargo run -p reqext-demos --example reqwest

use std::time::{Duration, Instant};

use reqext::{AdapterExt, CacheExtension};
use reqext_core::predicate::Neutral;
use reqext_core::{Adapter, AdapterRequest, RequestOptions};
use reqext_reqwest::{ClientBuilder, ReqwestAdapter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("reqext=debug,reqext_reqwest=debug")
        .init();

    let cache = CacheExtension::builder()
        .ttl(Duration::from_secs(60))
        .admission(Neutral::new())
        .build();

    let client = ClientBuilder::new(reqwest::Client::new()).build();
    let mut adapter = ReqwestAdapter::from(client).with(&cache);

    // GitHub API requires a User-Agent header
    let request = || {
        AdapterRequest::get("https://api.github.com/repos/tokio-rs/tokio")
            .header(
                http::header::USER_AGENT,
                http::HeaderValue::from_static("reqext-example/1.0"),
            )
            .with_options(RequestOptions::new().cacheable(true))
    };

    println!("=== First request (cache miss) ===");
    let started = Instant::now();
    let response = adapter.call(request()).await?;
    println!("Status: {}", response.status());
    println!("Body length: {} bytes", response.body().len());
    println!("Took: {:?}", started.elapsed());

    println!("\n=== Second request (cache hit) ===");
    let started = Instant::now();
    let response = adapter.call(request()).await?;
    println!("Status: {}", response.status());
    println!("Body length: {} bytes", response.body().len());
    println!("Took: {:?}", started.elapsed());

    println!("\nCached entries: {}", cache.pool().len());
    Ok(())
}
