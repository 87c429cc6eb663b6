//! Configuration loading and extension composition.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use reqext::config::DEFAULT_TTL;
use reqext::{AdapterExt, CacheExtension, CancelExtension, ExtensionsConfig, LockExtension};
use reqext_core::predicate::Neutral;
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, RequestOptions, adapter_fn,
};

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
    cache:
      ttl: 500ms
      base_url: https://api.example.com/v1/
    cancel:
      base_url: https://api.example.com/v1/
    "#;

    let config: ExtensionsConfig = serde_saphyr::from_str(yaml).unwrap();
    assert_eq!(config.cache.ttl, Duration::from_millis(500));
    assert_eq!(
        config.cache.base_url.as_ref().map(|url| url.as_str()),
        Some("https://api.example.com/v1/")
    );
    assert_eq!(config.cancel.base_url, config.cache.base_url);
    assert_eq!(config.lock.base_url, None);
}

#[test]
fn test_config_defaults() {
    let config: ExtensionsConfig = serde_saphyr::from_str("cache: {}").unwrap();
    assert_eq!(config.cache.ttl, DEFAULT_TTL);
    assert_eq!(config.cache.ttl, Duration::from_secs(5));
    assert_eq!(config, ExtensionsConfig::default());
}

/// All three extensions stacked over one transport, configured from one file
#[tokio::test(start_paused = true)]
async fn test_stacked_extensions() {
    let config: ExtensionsConfig = serde_saphyr::from_str(
        r#"
        cache:
          ttl: 1m
        "#,
    )
    .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let transport = adapter_fn(move |_req: AdapterRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, AdapterError>(AdapterResponse::ok(r#"{"code":0}"#))
        }
    });

    let cache = CacheExtension::builder()
        .options(config.cache)
        .admission(Neutral::new())
        .build();
    let cancel = CancelExtension::new(config.cancel);
    let lock = LockExtension::new(config.lock);
    let mut adapter = transport
        .with(&cache)
        .with(&lock)
        .with(&cancel)
        .boxed();

    let options = RequestOptions::new()
        .cacheable(true)
        .lockable(true)
        .cancelable(true);
    let request = || AdapterRequest::get("https://a.test/profile").with_options(options);

    let first = adapter.call(request());
    let duplicate = adapter.call(request());
    let (first, duplicate) = tokio::join!(first, duplicate);
    assert!(first.is_ok());
    assert!(duplicate.unwrap_err().is_repeat_submit());

    adapter.call(request()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(lock.registry().is_empty());
    assert!(cancel.registry().is_empty());
}
