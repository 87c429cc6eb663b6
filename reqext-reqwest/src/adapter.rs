//! Adapter bridging reqwest to reqext.

use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderValue};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, BoxAdapterFuture, RequestBody,
    cancellable,
};
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;
use url::Url;

/// [`Adapter`] over a [`reqwest_middleware::ClientWithMiddleware`].
///
/// Any middleware already installed on the client (retries, tracing, ...)
/// runs for every request the extensions let through. A plain
/// [`reqwest::Client`] converts with [`From`].
///
/// The cancellation signal attached by the cancelable extension is observed:
/// once it fires the in-flight request is dropped and the call rejects with
/// [`AdapterError::Cancelled`].
#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: ClientWithMiddleware,
    base_url: Option<Url>,
}

impl ReqwestAdapter {
    /// Creates an adapter sending through `client`.
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Resolve relative request URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }
}

impl From<ClientWithMiddleware> for ReqwestAdapter {
    fn from(client: ClientWithMiddleware) -> Self {
        Self::new(client)
    }
}

impl From<reqwest::Client> for ReqwestAdapter {
    fn from(client: reqwest::Client) -> Self {
        Self::new(ClientWithMiddleware::from(client))
    }
}

impl Adapter for ReqwestAdapter {
    type Future = BoxAdapterFuture;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        let client = self.client.clone();
        let base_url = self.base_url.clone();

        Box::pin(async move {
            let url = resolve(base_url.as_ref(), &req.full_url())?;
            let signal = req.cancellation().cloned();
            cancellable(signal, url.as_str(), send(&client, &req, url.clone())).await
        })
    }
}

fn resolve(base_url: Option<&Url>, url: &str) -> Result<Url, AdapterError> {
    let resolved = match base_url {
        Some(base) => base.join(url),
        None => Url::parse(url),
    };
    resolved.map_err(AdapterError::transport)
}

async fn send(
    client: &ClientWithMiddleware,
    req: &AdapterRequest,
    url: Url,
) -> Result<AdapterResponse, AdapterError> {
    let mut headers = req.headers().clone();
    if matches!(req.body(), RequestBody::Json(_)) && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    debug!(method = %req.method(), %url, "sending request");
    let mut builder = client.request(req.method().clone(), url).headers(headers);
    if !req.body().is_empty() {
        builder = builder.body(req.body().to_bytes().map_err(AdapterError::transport)?);
    }

    let response = builder.send().await.map_err(AdapterError::transport)?;
    let status = response.status();
    let headers: HeaderMap = response.headers().clone();
    let body = response.bytes().await.map_err(AdapterError::transport)?;
    Ok(AdapterResponse::new(status, headers, body))
}
