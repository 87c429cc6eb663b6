//! The transport contract every extension wraps.
//!
//! An [`Adapter`] is the function that actually performs a network call: it
//! takes an [`AdapterRequest`] and returns a future of an [`AdapterResponse`].
//! Extensions take an adapter and return a new adapter with the same shape,
//! so they compose by plain nesting.

use std::future::Future;
use std::pin::Pin;

use crate::{AdapterError, AdapterRequest, AdapterResponse};

/// Boxed future returned by extensions and type-erased adapters.
pub type BoxAdapterFuture =
    Pin<Box<dyn Future<Output = Result<AdapterResponse, AdapterError>> + Send + 'static>>;

/// Trait for calling the underlying HTTP transport.
///
/// This trait is transport-agnostic and can be implemented for any async
/// HTTP client. The returned future must be `'static` because extensions may
/// keep it alive beyond the call (the cache shares it between callers).
///
/// # Examples
///
/// ```rust
/// use reqext_core::{Adapter, AdapterError, AdapterRequest, AdapterResponse};
/// use std::future::Ready;
///
/// struct Fixed;
///
/// impl Adapter for Fixed {
///     type Future = Ready<Result<AdapterResponse, AdapterError>>;
///
///     fn call(&mut self, _req: AdapterRequest) -> Self::Future {
///         std::future::ready(Ok(AdapterResponse::ok("{}")))
///     }
/// }
/// ```
pub trait Adapter {
    /// The future that resolves to the transport response.
    type Future: Future<Output = Result<AdapterResponse, AdapterError>> + Send + 'static;

    /// Dispatch the request through the transport.
    fn call(&mut self, req: AdapterRequest) -> Self::Future;
}

impl<A> Adapter for Box<A>
where
    A: Adapter + ?Sized,
{
    type Future = A::Future;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        self.as_mut().call(req)
    }
}

/// Adapter backed by a closure. Created with [`adapter_fn`].
#[derive(Clone)]
pub struct AdapterFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for AdapterFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFn").finish()
    }
}

/// Build an [`Adapter`] from a closure returning a future.
///
/// ```rust
/// use reqext_core::{AdapterError, AdapterRequest, AdapterResponse, adapter_fn};
///
/// let adapter = adapter_fn(|_req: AdapterRequest| async {
///     Ok::<_, AdapterError>(AdapterResponse::ok("[]"))
/// });
/// # let _ = adapter;
/// ```
pub fn adapter_fn<F>(f: F) -> AdapterFn<F> {
    AdapterFn { f }
}

impl<F, Fut> Adapter for AdapterFn<F>
where
    F: FnMut(AdapterRequest) -> Fut,
    Fut: Future<Output = Result<AdapterResponse, AdapterError>> + Send + 'static,
{
    type Future = Fut;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        (self.f)(req)
    }
}
