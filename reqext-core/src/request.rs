//! Request descriptor passed through adapters.
//!
//! [`AdapterRequest`] carries the destination, method, payload and the
//! per-request [`RequestOptions`] that opt into each extension. Requests that
//! set none of the flags flow through every extension untouched.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::CancelSignal;

/// Per-request extension flags.
///
/// Deserializes from camelCase names. The aliases accepted by older
/// integrations (`notRepeatable`, `isEnqueueSubmit`, `isEnqueueRequest`) map
/// onto the same fields.
///
/// ```
/// use reqext_core::RequestOptions;
///
/// let options: RequestOptions =
///     serde_json::from_str(r#"{"cacheable": true, "notRepeatable": true}"#).unwrap();
/// assert!(options.cacheable);
/// assert!(options.lockable);
/// assert!(!options.force_update);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// Serve from and populate the response cache.
    pub cacheable: bool,
    /// Skip a valid cache hit and always call the transport.
    pub force_update: bool,
    /// Cancel a still outstanding request to the same endpoint.
    pub cancelable: bool,
    /// Cancelable only by an explicit `cancel_all` sweep, never by a same-URL
    /// collision.
    pub only_switch_route_cancelable: bool,
    /// Reject the request while another one to the same endpoint is outstanding.
    #[serde(alias = "notRepeatable")]
    pub lockable: bool,
    /// Keep the lock after settlement until it is released explicitly.
    #[serde(alias = "isEnqueueSubmit", alias = "isEnqueueRequest")]
    pub enqueue_submit: bool,
}

impl RequestOptions {
    /// Options with every flag unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `cacheable` flag.
    pub fn cacheable(self, cacheable: bool) -> Self {
        Self { cacheable, ..self }
    }

    /// Set the `force_update` flag.
    pub fn force_update(self, force_update: bool) -> Self {
        Self {
            force_update,
            ..self
        }
    }

    /// Set the `cancelable` flag.
    pub fn cancelable(self, cancelable: bool) -> Self {
        Self { cancelable, ..self }
    }

    /// Set the `only_switch_route_cancelable` flag.
    pub fn only_switch_route_cancelable(self, only_switch_route_cancelable: bool) -> Self {
        Self {
            only_switch_route_cancelable,
            ..self
        }
    }

    /// Set the `lockable` flag.
    pub fn lockable(self, lockable: bool) -> Self {
        Self { lockable, ..self }
    }

    /// Set the `enqueue_submit` flag.
    pub fn enqueue_submit(self, enqueue_submit: bool) -> Self {
        Self {
            enqueue_submit,
            ..self
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Structured JSON payload.
    Json(Value),
    /// Already serialized payload, as sent on the wire.
    Raw(Bytes),
}

impl RequestBody {
    /// Serialize the body into wire bytes.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Json(value) => serde_json::to_vec(value).map(Bytes::from),
            RequestBody::Raw(bytes) => Ok(bytes.clone()),
        }
    }

    /// Returns `true` for [`RequestBody::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Description of a single request handed to an [`Adapter`](crate::Adapter).
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: RequestBody,
    query: Option<Map<String, Value>>,
    options: RequestOptions,
    cancellation: Option<CancelSignal>,
}

impl AdapterRequest {
    /// Creates a request with an empty body and no options.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            query: None,
            options: RequestOptions::default(),
            cancellation: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shorthand for a `POST` request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set explicit query parameters, merged over the URL's own query.
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    /// Set a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set an already serialized body.
    pub fn with_raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    /// Replace the extension options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Append a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach a cancellation signal the transport should observe.
    pub fn with_cancellation(mut self, signal: CancelSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    /// Destination URL, possibly relative and possibly carrying a query.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Request payload.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Explicit query parameters.
    pub fn query(&self) -> Option<&Map<String, Value>> {
        self.query.as_ref()
    }

    /// The URL to put on the wire: [`url`](Self::url) with the explicit query
    /// appended.
    ///
    /// Strings are sent verbatim, arrays repeat the parameter name and `null`
    /// values are skipped.
    ///
    /// ```
    /// use reqext_core::AdapterRequest;
    /// use serde_json::json;
    ///
    /// let query = json!({ "page": 2, "tag": ["a", "b"] });
    /// let req = AdapterRequest::get("https://api.example.com/users?sort=name")
    ///     .with_query(query.as_object().unwrap().clone());
    /// assert_eq!(
    ///     req.full_url(),
    ///     "https://api.example.com/users?sort=name&page=2&tag=a&tag=b"
    /// );
    /// ```
    pub fn full_url(&self) -> String {
        let Some(query) = self.query.as_ref().filter(|query| !query.is_empty()) else {
            return self.url.clone();
        };
        let (base, fragment) = match self.url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (self.url.as_str(), None),
        };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in query {
            append_query_value(&mut serializer, name, value);
        }
        let encoded = serializer.finish();
        if encoded.is_empty() {
            return self.url.clone();
        }

        let separator = match base.find('?') {
            None => "?",
            Some(_) if base.ends_with('?') || base.ends_with('&') => "",
            Some(_) => "&",
        };
        let mut url = format!("{base}{separator}{encoded}");
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }

    /// Extension options.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Mutable extension options.
    pub fn options_mut(&mut self) -> &mut RequestOptions {
        &mut self.options
    }

    /// Cancellation signal attached by a cancelable wrapper, if any.
    pub fn cancellation(&self) -> Option<&CancelSignal> {
        self.cancellation.as_ref()
    }

    /// Replace the cancellation signal.
    pub fn set_cancellation(&mut self, signal: CancelSignal) {
        self.cancellation = Some(signal);
    }
}

fn append_query_value(
    serializer: &mut form_urlencoded::Serializer<'_, String>,
    name: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::String(value) => {
            serializer.append_pair(name, value);
        }
        Value::Array(items) => {
            for item in items {
                append_query_value(serializer, name, item);
            }
        }
        other => {
            serializer.append_pair(name, &other.to_string());
        }
    }
}
