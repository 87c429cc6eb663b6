use std::task::{Context, Poll};

use reqext_core::{Adapter, AdapterError, AdapterRequest, AdapterResponse};
use tower::Service;

/// Exposes an [`Adapter`] as a Tower [`Service`] over [`AdapterRequest`]s.
///
/// Adapters have no readiness of their own, so `poll_ready` always succeeds.
#[derive(Debug, Clone)]
pub struct AdapterService<A> {
    adapter: A,
}

impl<A> AdapterService<A> {
    /// Wraps `adapter`.
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// The wrapped adapter.
    pub fn get_ref(&self) -> &A {
        &self.adapter
    }

    /// Consumes the service, returning the adapter.
    pub fn into_inner(self) -> A {
        self.adapter
    }
}

impl<A> Service<AdapterRequest> for AdapterService<A>
where
    A: Adapter,
{
    type Response = AdapterResponse;
    type Error = AdapterError;
    type Future = A::Future;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        self.adapter.call(req)
    }
}
