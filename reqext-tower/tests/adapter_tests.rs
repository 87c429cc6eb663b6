//! Integration tests for the Tower binding using `tower::service_fn`.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use reqext::{CacheExtension, CancelExtension, LockExtension};
use reqext_core::predicate::Neutral;
use reqext_core::{Adapter, AdapterRequest, RequestOptions};
use reqext_tower::{
    AdapterService, CacheLayer, CancelLayer, LockLayer, TowerAdapter, TowerAdapterLayer,
};
use serde_json::{Value, json};
use tower::{ServiceBuilder, ServiceExt, service_fn};

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    uri: String,
    content_type: Option<String>,
    body: Bytes,
}

type Log = Arc<Mutex<Vec<Seen>>>;

/// Echo service recording every request it receives.
fn recording_service(
    log: Log,
) -> impl tower::Service<
    Request<Full<Bytes>>,
    Response = Response<Full<Bytes>>,
    Error = Infallible,
    Future = impl Send,
> + Clone
+ Send
+ 'static {
    service_fn(move |req: Request<Full<Bytes>>| {
        let log = log.clone();
        async move {
            let (parts, body) = req.into_parts();
            let body = body.collect().await.unwrap().to_bytes();
            let calls = {
                let mut log = log.lock().unwrap();
                log.push(Seen {
                    method: parts.method.to_string(),
                    uri: parts.uri.to_string(),
                    content_type: parts
                        .headers
                        .get(http::header::CONTENT_TYPE)
                        .map(|value| value.to_str().unwrap().to_owned()),
                    body,
                });
                log.len()
            };
            let payload = json!({ "code": 0, "calls": calls }).to_string();
            Ok::<_, Infallible>(
                Response::builder()
                    .status(StatusCode::OK)
                    .header("x-served-by", "echo")
                    .body(Full::new(Bytes::from(payload)))
                    .unwrap(),
            )
        }
    })
}

/// Test 1: request mapping, query merge and JSON body
#[tokio::test]
async fn test_request_mapping() {
    let log = Log::default();
    let mut adapter = TowerAdapter::new(recording_service(log.clone()));

    let mut query = serde_json::Map::new();
    query.insert("page".to_owned(), json!(2));
    let response = adapter
        .call(AdapterRequest::get("http://api.test/users?sort=name").with_query(query))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-served-by").unwrap(), "echo");
    assert_eq!(response.json_value().unwrap()["calls"], json!(1));

    adapter
        .call(AdapterRequest::post("http://api.test/users").with_json(json!({ "name": "a" })))
        .await
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "GET");
    assert_eq!(log[0].uri, "http://api.test/users?sort=name&page=2");
    assert!(log[0].body.is_empty());
    assert_eq!(log[1].method, "POST");
    assert_eq!(log[1].content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_slice(&log[1].body).unwrap();
    assert_eq!(body, json!({ "name": "a" }));
}

/// Test 2: cache layer over the tower adapter
#[tokio::test]
async fn test_cache_layer() {
    let log = Log::default();
    let cache = CacheLayer::new(
        CacheExtension::builder()
            .ttl(Duration::from_secs(60))
            .admission(Neutral::new())
            .build(),
    );
    let mut adapter = ServiceBuilder::new()
        .layer(cache.clone())
        .layer(TowerAdapterLayer::new())
        .service(recording_service(log.clone()));

    let request = || {
        AdapterRequest::get("http://api.test/profile")
            .with_options(RequestOptions::new().cacheable(true))
    };
    let first = adapter.call(request()).await.unwrap();
    let second = adapter.call(request()).await.unwrap();
    assert_eq!(first.body(), second.body());
    assert_eq!(log.lock().unwrap().len(), 1);

    assert!(cache.delete_cache_entry("http://api.test/profile"));
    adapter.call(request()).await.unwrap();
    assert_eq!(log.lock().unwrap().len(), 2);
}

/// Test 3: a superseded request is aborted while the service is still working
#[tokio::test(start_paused = true)]
async fn test_cancel_layer_aborts_in_flight_call() {
    let slow = service_fn(|_req: Request<Full<Bytes>>| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"{}"))))
    });
    let cancel = CancelLayer::new(CancelExtension::default());
    let mut adapter = ServiceBuilder::new()
        .layer(cancel.clone())
        .layer(TowerAdapterLayer::new())
        .service(slow);

    let request = || {
        AdapterRequest::get("http://api.test/search")
            .with_options(RequestOptions::new().cancelable(true))
    };
    let first = tokio::spawn(adapter.call(request()));
    tokio::task::yield_now().await;
    let second = adapter.call(request());

    let error = first.await.unwrap().unwrap_err();
    assert!(error.is_cancel());
    assert!(second.await.is_ok());
    assert_eq!(cancel.extension().registry().len(), 0);
}

/// Test 4: lock layer and the service facade
#[tokio::test]
async fn test_lock_layer_through_service_facade() {
    let log = Log::default();
    let lock = LockLayer::new(LockExtension::default());
    let adapter = ServiceBuilder::new()
        .layer(lock.clone())
        .layer(TowerAdapterLayer::new())
        .service(recording_service(log.clone()));
    let service = AdapterService::new(adapter);

    let submit = || {
        AdapterRequest::post("http://api.test/orders")
            .with_json(json!({ "sku": 1 }))
            .with_options(RequestOptions::new().lockable(true).enqueue_submit(true))
    };
    service.clone().oneshot(submit()).await.unwrap();
    let error = service.clone().oneshot(submit()).await.unwrap_err();
    assert!(error.is_repeat_submit());
    assert_eq!(log.lock().unwrap().len(), 1);

    assert!(lock.delete_lock_entry("http://api.test/orders"));
    service.oneshot(submit()).await.unwrap();
    assert_eq!(log.lock().unwrap().len(), 2);
}
