//! Response returned by adapters.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A fully buffered transport response.
///
/// The body is held in [`Bytes`], so cloning a response only bumps a
/// reference count. Cached handles hand out clones to every caller.
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl AdapterResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// A `200 OK` response with no headers.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Decode the body as an untyped JSON value.
    pub fn json_value(&self) -> Result<Value, serde_json::Error> {
        self.json()
    }

    /// Consumes the response and returns status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
