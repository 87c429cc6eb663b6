//! Parameter snapshots.
//!
//! A [`ParamsSnapshot`] captures "what distinguishes this request's intent"
//! so that two requests to the same [`RequestKey`](crate::RequestKey) can be
//! compared later:
//!
//! - `GET` requests snapshot their query: the URL's own query pairs overlaid
//!   by the explicit query map (explicit values win).
//! - Every other method snapshots its body. Raw bodies are parsed as JSON; a
//!   parse failure degrades to an empty snapshot and logs a warning.
//!
//! Snapshots compare by structural equality of the underlying JSON value,
//! so object key order does not matter.

use http::Method;
use serde_json::{Map, Value};
use tracing::warn;
use url::form_urlencoded;

use crate::{AdapterRequest, RequestBody};

/// Comparable snapshot of a request's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsSnapshot(Value);

impl ParamsSnapshot {
    /// Capture the snapshot of `req`.
    pub fn capture(req: &AdapterRequest) -> Self {
        capture(req.url(), req.method(), req.body(), req.query())
    }

    /// The empty snapshot (`{}`).
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Returns the snapshot as a JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the snapshot and returns the JSON value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl Default for ParamsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for ParamsSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Capture a snapshot from the individual request parts.
pub fn capture(
    url: &str,
    method: &Method,
    body: &RequestBody,
    query: Option<&Map<String, Value>>,
) -> ParamsSnapshot {
    if method.as_str().eq_ignore_ascii_case("get") {
        let mut params = url_query(url);
        if let Some(query) = query {
            params.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        return ParamsSnapshot(Value::Object(params));
    }

    match body {
        RequestBody::Empty => ParamsSnapshot::empty(),
        RequestBody::Json(value) => ParamsSnapshot(value.clone()),
        RequestBody::Raw(bytes) if bytes.is_empty() => ParamsSnapshot::empty(),
        RequestBody::Raw(bytes) => match serde_json::from_slice(bytes) {
            Ok(value) => ParamsSnapshot(value),
            Err(error) => {
                warn!(url, %error, "request body is not valid JSON, using empty params");
                ParamsSnapshot::empty()
            }
        },
    }
}

fn url_query(url: &str) -> Map<String, Value> {
    let mut params = Map::new();
    let Some((_, rest)) = url.split_once('?') else {
        return params;
    };
    let query = rest.split_once('#').map_or(rest, |(query, _)| query);
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        // First occurrence wins for repeated names.
        params
            .entry(name.into_owned())
            .or_insert_with(|| Value::String(value.into_owned()));
    }
    params
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn get_merges_url_query_with_explicit_params() {
        let snapshot = capture(
            "https://a.test/users?page=1&sort=asc#top",
            &Method::GET,
            &RequestBody::Empty,
            Some(&obj(json!({ "page": 2, "size": 10 }))),
        );
        assert_eq!(
            snapshot.as_value(),
            &json!({ "page": 2, "sort": "asc", "size": 10 })
        );
    }

    #[test]
    fn get_ignores_body() {
        let snapshot = capture(
            "https://a.test/users",
            &Method::GET,
            &RequestBody::Json(json!({ "ignored": true })),
            None,
        );
        assert_eq!(snapshot, ParamsSnapshot::empty());
    }

    #[test]
    fn method_match_is_case_insensitive() {
        let method = Method::from_bytes(b"get").unwrap();
        let snapshot = capture("https://a.test/x?q=1", &method, &RequestBody::Empty, None);
        assert_eq!(snapshot.as_value(), &json!({ "q": "1" }));
    }

    #[test]
    fn repeated_query_name_keeps_first_value() {
        let snapshot = capture("/x?a=1&a=2", &Method::GET, &RequestBody::Empty, None);
        assert_eq!(snapshot.as_value(), &json!({ "a": "1" }));
    }

    #[test]
    fn post_uses_json_body() {
        let body = RequestBody::Json(json!({ "name": "neo", "tags": [1, 2] }));
        let snapshot = capture("https://a.test/users?x=1", &Method::POST, &body, None);
        assert_eq!(snapshot.as_value(), &json!({ "name": "neo", "tags": [1, 2] }));
    }

    #[test]
    fn post_parses_raw_body() {
        let body = RequestBody::Raw(r#"{"b":2,"a":1}"#.into());
        let snapshot = capture("https://a.test/x", &Method::PUT, &body, None);
        assert_eq!(snapshot, ParamsSnapshot::from(json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn invalid_raw_body_degrades_to_empty() {
        let body = RequestBody::Raw("name=neo".into());
        let snapshot = capture("https://a.test/x", &Method::POST, &body, None);
        assert_eq!(snapshot, ParamsSnapshot::empty());

        let snapshot = capture("https://a.test/x", &Method::POST, &RequestBody::Raw("".into()), None);
        assert_eq!(snapshot, ParamsSnapshot::empty());
    }

    #[test]
    fn key_order_does_not_affect_equality() {
        let a = ParamsSnapshot::from(json!({ "a": 1, "b": { "c": [1, 2] } }));
        let b = ParamsSnapshot::from(json!({ "b": { "c": [1, 2] }, "a": 1 }));
        assert_eq!(a, b);
        let c = ParamsSnapshot::from(json!({ "b": { "c": [2, 1] }, "a": 1 }));
        assert_ne!(a, c);
    }
}
