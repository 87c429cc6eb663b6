//! Integration tests for the cancelable extension.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqext::{AdapterExt, CancelExtension};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, RequestKey, RequestOptions,
    adapter_fn, cancellable, is_cancel,
};

/// Transport that observes the cancel signal and answers after `delay`.
fn slow_transport(delay: Duration) -> impl Adapter + Clone {
    adapter_fn(move |req: AdapterRequest| async move {
        let signal = req.cancellation().cloned();
        cancellable(signal, req.url(), async move {
            tokio::time::sleep(delay).await;
            Ok(AdapterResponse::ok(r#"{"code":0}"#))
        })
        .await
    })
}

fn cancelable_get(url: &str) -> AdapterRequest {
    AdapterRequest::get(url).with_options(RequestOptions::new().cancelable(true))
}

fn route_get(url: &str) -> AdapterRequest {
    AdapterRequest::get(url)
        .with_options(RequestOptions::new().only_switch_route_cancelable(true))
}

/// Test 1: a second request to the same endpoint cancels the first
#[tokio::test(start_paused = true)]
async fn test_same_key_supersedes_previous() {
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(slow_transport(Duration::from_secs(1)));

    let first = adapter.call(cancelable_get("https://a.test/users?page=1"));
    assert_eq!(cancel.registry().len(), 1);

    let second = adapter.call(cancelable_get("https://a.test/users?page=2"));
    assert_eq!(cancel.registry().len(), 1);

    let error = first.await.unwrap_err();
    assert!(is_cancel(&error));
    assert!(second.await.is_ok());
    assert!(cancel.registry().is_empty());
}

/// Test 2: a superseded request settling late does not release its successor
#[tokio::test]
async fn test_stale_release_keeps_newer_registration() {
    let cancel = CancelExtension::default();
    // Ignores the signal, like a transport without abort support.
    let mut adapter = cancel.wrap(adapter_fn(|_req: AdapterRequest| async {
        Ok::<_, AdapterError>(AdapterResponse::ok("{}"))
    }));
    let key = RequestKey::from("https://a.test/users");

    let first = adapter.call(cancelable_get("https://a.test/users"));
    let second = adapter.call(cancelable_get("https://a.test/users"));

    assert!(first.await.is_ok());
    assert!(cancel.registry().contains(&key));

    assert!(second.await.is_ok());
    assert!(!cancel.registry().contains(&key));
}

/// Test 3: route-only requests never collide, only cancel_all reaches them
#[tokio::test(start_paused = true)]
async fn test_route_only_requests_cancelled_by_sweep() {
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(slow_transport(Duration::from_secs(1)));

    let first = adapter.call(route_get("https://a.test/feed"));
    let second = adapter.call(route_get("https://a.test/feed"));
    let third = adapter.call(cancelable_get("https://a.test/profile"));
    assert_eq!(cancel.registry().len(), 3);

    assert_eq!(adapter.cancel_all(), 3);
    assert!(cancel.registry().is_empty());

    let (first, second, third) = tokio::join!(first, second, third);
    assert!(first.unwrap_err().is_cancel());
    assert!(second.unwrap_err().is_cancel());
    assert!(third.unwrap_err().is_cancel());
}

/// Test 4: route-only requests survive a same-URL cancelable request
#[tokio::test(start_paused = true)]
async fn test_route_only_not_cancelled_by_collision() {
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(slow_transport(Duration::from_millis(200)));

    let route = adapter.call(route_get("https://a.test/feed"));
    let plain = adapter.call(cancelable_get("https://a.test/feed"));

    let (route, plain) = tokio::join!(route, plain);
    assert!(route.is_ok());
    assert!(plain.is_ok());
}

/// Test 5: requests without the flags bypass the registry
#[tokio::test]
async fn test_non_cancelable_bypass() {
    let seen_signal = Arc::new(AtomicUsize::new(0));
    let seen = seen_signal.clone();
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(adapter_fn(move |req: AdapterRequest| {
        if req.cancellation().is_some() {
            seen.fetch_add(1, Ordering::SeqCst);
        }
        async { Ok::<_, AdapterError>(AdapterResponse::ok("{}")) }
    }));

    let pending = adapter.call(AdapterRequest::get("https://a.test/x"));
    assert!(cancel.registry().is_empty());
    pending.await.unwrap();
    assert_eq!(seen_signal.load(Ordering::SeqCst), 0);

    adapter.call(cancelable_get("https://a.test/x")).await.unwrap();
    assert_eq!(seen_signal.load(Ordering::SeqCst), 1);
}

/// Test 6: dropping a pending request releases its registration
#[tokio::test(start_paused = true)]
async fn test_dropped_future_releases_registration() {
    let mut adapter = slow_transport(Duration::from_secs(1)).cancelable();

    let pending = adapter.call(cancelable_get("https://a.test/x"));
    assert_eq!(adapter.registry().len(), 1);
    drop(pending);
    assert!(adapter.registry().is_empty());
}

/// Test 7: failures release the registration and pass through
#[tokio::test]
async fn test_failure_releases_registration() {
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(adapter_fn(|_req: AdapterRequest| async {
        Err::<AdapterResponse, _>(AdapterError::transport(std::io::Error::other("refused")))
    }));

    let error = adapter
        .call(cancelable_get("https://a.test/x"))
        .await
        .unwrap_err();
    assert!(!error.is_cancel());
    assert!(cancel.registry().is_empty());
}

/// Test 8: `cancelable` takes precedence over the route-only flag
#[tokio::test(start_paused = true)]
async fn test_both_flags_supersede_same_key() {
    let cancel = CancelExtension::default();
    let mut adapter = cancel.wrap(slow_transport(Duration::from_secs(1)));
    let both = || {
        AdapterRequest::get("https://a.test/feed").with_options(
            RequestOptions::new()
                .cancelable(true)
                .only_switch_route_cancelable(true),
        )
    };

    let first = adapter.call(both());
    let second = adapter.call(both());
    assert_eq!(cancel.registry().len(), 1);
    assert!(cancel.registry().contains(&RequestKey::from("https://a.test/feed")));

    assert!(is_cancel(&first.await.unwrap_err()));
    assert!(second.await.is_ok());
    assert!(cancel.registry().is_empty());
}
