//! Adapter bridging Tower services to reqext.
//!
//! This module provides [`TowerAdapter`], which implements the
//! [`Adapter`] contract for any Tower service speaking `http`. The
//! extensions call it on cache misses and for every request they let through.

use std::future::poll_fn;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Full};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, BoxAdapterFuture, RequestBody,
    cancellable,
};
use tower::{BoxError, Layer, Service};
use tracing::debug;

/// Adapter that implements the [`Adapter`] trait for Tower services.
///
/// Converts each [`AdapterRequest`] into an `http::Request<Full<Bytes>>`
/// (explicit query appended to the URI, JSON bodies serialized with a
/// `content-type: application/json` header), calls the service and collects
/// the response body.
///
/// The cancellation signal attached by the cancelable extension is observed:
/// once it fires the in-flight service call is dropped and the request
/// rejects with [`AdapterError::Cancelled`].
///
/// The response body type is taken from the service, so any body
/// implementing [`http_body::Body`] works.
#[derive(Debug, Clone)]
pub struct TowerAdapter<S> {
    service: S,
}

impl<S> TowerAdapter<S> {
    /// Creates a new adapter wrapping the given service.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.service
    }
}

impl<S, ResBody> Adapter for TowerAdapter<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Future = BoxAdapterFuture;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        // Drive the clone that may already be ready.
        let clone = self.service.clone();
        let mut service = std::mem::replace(&mut self.service, clone);

        Box::pin(async move {
            let url = req.full_url();
            let signal = req.cancellation().cloned();
            cancellable(signal, &url, async {
                let request = into_http_request(&req, &url)?;
                debug!(method = %request.method(), uri = %request.uri(), "calling tower service");
                poll_fn(|cx| service.poll_ready(cx))
                    .await
                    .map_err(boxed_error)?;
                let response = service.call(request).await.map_err(boxed_error)?;
                from_http_response(response).await
            })
            .await
        })
    }
}

fn boxed_error<E: Into<BoxError>>(error: E) -> AdapterError {
    AdapterError::transport_boxed(error.into())
}

fn into_http_request(
    req: &AdapterRequest,
    url: &str,
) -> Result<Request<Full<Bytes>>, AdapterError> {
    let body = req.body().to_bytes().map_err(AdapterError::transport)?;
    let mut builder = Request::builder().method(req.method().clone()).uri(url);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(req.headers().clone());
        if matches!(req.body(), RequestBody::Json(_)) && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
    }
    builder
        .body(Full::new(body))
        .map_err(AdapterError::transport)
}

async fn from_http_response<B>(response: Response<B>) -> Result<AdapterResponse, AdapterError>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();
    let collected = body.collect().await.map_err(boxed_error)?;
    Ok(AdapterResponse::new(
        parts.status,
        parts.headers,
        collected.to_bytes(),
    ))
}

/// Layer wrapping a Tower service into a [`TowerAdapter`].
///
/// Place it innermost in a `ServiceBuilder` stack so that the extension
/// layers above it receive an [`Adapter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TowerAdapterLayer;

impl TowerAdapterLayer {
    /// Creates the layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TowerAdapterLayer {
    type Service = TowerAdapter<S>;

    fn layer(&self, service: S) -> Self::Service {
        TowerAdapter::new(service)
    }
}
