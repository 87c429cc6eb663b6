//! Composition helpers.

use reqext_core::{Adapter, AdapterRequest, BoxAdapterFuture, Predicate};
use serde_json::Value;

use crate::cache::{CacheExtension, Cacheable};
use crate::cancel::{CancelExtension, Cancelable};
use crate::config::CacheOptions;
use crate::lock::{LockExtension, Lockable};

/// A reusable wrapper that turns one adapter into another.
///
/// Implemented by [`CacheExtension`], [`CancelExtension`] and
/// [`LockExtension`]. Every adapter wrapped by the same extension value shares
/// its pool or registry.
pub trait Extension<A> {
    /// The adapter produced by [`wrap`](Self::wrap).
    type Wrapped: Adapter;

    /// Wrap `adapter`.
    fn wrap(&self, adapter: A) -> Self::Wrapped;
}

/// Extension methods for every [`Adapter`].
///
/// ```
/// use reqext::{AdapterExt, CancelExtension, LockExtension};
/// use reqext_core::{AdapterError, AdapterRequest, AdapterResponse, adapter_fn};
///
/// let cancel = CancelExtension::default();
/// let adapter = adapter_fn(|_req: AdapterRequest| async {
///     Ok::<_, AdapterError>(AdapterResponse::ok("{}"))
/// })
///     .with(&LockExtension::default())
///     .with(&cancel)
///     .boxed();
/// # let _ = adapter;
/// ```
pub trait AdapterExt: Adapter + Sized {
    /// Wrap `self` with an extension, sharing the extension's state.
    fn with<E>(self, extension: &E) -> E::Wrapped
    where
        E: Extension<Self>,
    {
        extension.wrap(self)
    }

    /// Wrap `self` with a fresh cache built from `options` and `admission`.
    fn cacheable<P>(self, options: CacheOptions, admission: P) -> Cacheable<Self, P>
    where
        P: Predicate<Subject = Value>,
    {
        CacheExtension::builder()
            .options(options)
            .admission(admission)
            .build()
            .wrap(self)
    }

    /// Wrap `self` with a fresh cancellation registry.
    fn cancelable(self) -> Cancelable<Self> {
        CancelExtension::default().wrap(self)
    }

    /// Wrap `self` with a fresh lock registry.
    fn lockable(self) -> Lockable<Self> {
        LockExtension::default().wrap(self)
    }

    /// Erase the adapter's type.
    fn boxed(self) -> BoxAdapter
    where
        Self: Send + 'static,
    {
        BoxAdapter::new(self)
    }
}

impl<A> AdapterExt for A where A: Adapter {}

trait ErasedAdapter: Send {
    fn call_boxed(&mut self, req: AdapterRequest) -> BoxAdapterFuture;
}

impl<A> ErasedAdapter for A
where
    A: Adapter + Send,
{
    fn call_boxed(&mut self, req: AdapterRequest) -> BoxAdapterFuture {
        Box::pin(self.call(req))
    }
}

/// A type-erased [`Adapter`].
pub struct BoxAdapter {
    inner: Box<dyn ErasedAdapter>,
}

impl BoxAdapter {
    /// Box `adapter`.
    pub fn new<A>(adapter: A) -> Self
    where
        A: Adapter + Send + 'static,
    {
        Self {
            inner: Box::new(adapter),
        }
    }
}

impl std::fmt::Debug for BoxAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxAdapter").finish_non_exhaustive()
    }
}

impl Adapter for BoxAdapter {
    type Future = BoxAdapterFuture;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        self.inner.call_boxed(req)
    }
}
