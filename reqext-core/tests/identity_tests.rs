//! Request identity: key plus parameter snapshot.

use pretty_assertions::assert_eq;
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, ParamsSnapshot, RequestKey,
    adapter_fn,
};
use serde_json::{Map, Value, json};

fn identity(req: &AdapterRequest) -> (RequestKey, ParamsSnapshot) {
    (RequestKey::derive(req.url(), None), ParamsSnapshot::capture(req))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn test_query_in_url_and_explicit_query_are_equivalent() {
    let inline = AdapterRequest::get("https://api.example.com/users?page=1&size=20");
    let explicit = AdapterRequest::get("https://api.example.com/users")
        .with_query(object(json!({ "page": "1", "size": "20" })));

    assert_eq!(identity(&inline), identity(&explicit));
}

#[test]
fn test_explicit_query_overrides_url_query() {
    let req = AdapterRequest::get("https://api.example.com/users?page=1")
        .with_query(object(json!({ "page": 3 })));
    let (key, snapshot) = identity(&req);

    assert_eq!(key.as_str(), "https://api.example.com/users");
    assert_eq!(snapshot.as_value(), &json!({ "page": 3 }));
}

#[test]
fn test_mutating_requests_compare_bodies() {
    let json_body =
        AdapterRequest::post("https://api.example.com/users").with_json(json!({ "a": 1, "b": [1, 2] }));
    let raw_body = AdapterRequest::new(http::Method::PUT, "https://api.example.com/users?x=1")
        .with_raw_body(r#"{"b":[1,2],"a":1}"#);
    let broken = AdapterRequest::post("https://api.example.com/users").with_raw_body("{oops");

    assert_eq!(identity(&json_body), identity(&raw_body));
    assert_eq!(ParamsSnapshot::capture(&broken), ParamsSnapshot::empty());
}

#[test]
fn test_method_comparison_ignores_case() {
    let method = http::Method::from_bytes(b"get").unwrap();
    let req = AdapterRequest::new(method, "https://a.test/list?q=x").with_json(json!({ "ignored": true }));
    assert_eq!(ParamsSnapshot::capture(&req).as_value(), &json!({ "q": "x" }));
}

#[tokio::test]
async fn test_adapter_fn_receives_request() {
    let mut adapter = adapter_fn(|req: AdapterRequest| async move {
        Ok::<_, AdapterError>(AdapterResponse::ok(req.full_url()))
    });
    let response = adapter
        .call(AdapterRequest::get("https://a.test/x").with_query(object(json!({ "k": "v" }))))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"https://a.test/x?k=v");
}
