//! Cancellation of superseded in-flight requests.
//!
//! A [`Cancelable`] adapter registers a [`CancelHandle`] per outstanding
//! request in a [`CancelRegistry`]. Dispatching a second cancelable request
//! to the same endpoint signals the first one before the second is
//! registered. Requests flagged `only_switch_route_cancelable` get a unique
//! key, so only [`CancelRegistry::cancel_all`] reaches them.
//!
//! Cancellation is cooperative: the signal travels with the request and the
//! transport is expected to observe it (see [`reqext_core::cancellable`]).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pin_project::{pin_project, pinned_drop};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, CancelHandle, RequestKey,
};
use tracing::{debug, info};
use url::Url;

use crate::config::CancelOptions;
use crate::ext::Extension;

#[derive(Debug)]
struct Registration {
    generation: u64,
    handle: CancelHandle,
}

#[derive(Debug, Default)]
struct Inner {
    handles: DashMap<RequestKey, Registration>,
    generation: AtomicU64,
}

/// Key → cancellation handle map of outstanding cancelable requests.
///
/// Each registration carries a generation number so that a settling request
/// never removes a newer registration that replaced it under the same key.
/// Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CancelRegistry {
    inner: Arc<Inner>,
}

impl CancelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a process-unique identifier.
    pub fn next_id(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a fresh handle under `key`.
    ///
    /// Any handle already registered under `key` is signalled and removed
    /// first. Returns the generation to pass to [`release`](Self::release)
    /// and the new handle.
    pub fn register(&self, key: RequestKey) -> (u64, CancelHandle) {
        let generation = self.next_id();
        let handle = CancelHandle::new();
        let registration = Registration {
            generation,
            handle: handle.clone(),
        };
        match self.inner.handles.entry(key) {
            Entry::Occupied(mut occupied) => {
                info!(key = %occupied.key(), "cancelling superseded request");
                occupied.get().handle.cancel();
                occupied.insert(registration);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(registration);
            }
        }
        (generation, handle)
    }

    /// Remove the registration under `key` if it still belongs to `generation`.
    pub fn release(&self, key: &RequestKey, generation: u64) -> bool {
        self.inner
            .handles
            .remove_if(key, |_, registration| registration.generation == generation)
            .is_some()
    }

    /// Signal and remove the request registered under `key`.
    pub fn cancel(&self, key: &RequestKey) -> bool {
        match self.inner.handles.remove(key) {
            Some((key, registration)) => {
                info!(%key, "request cancelled");
                registration.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Signal and remove every registered request.
    ///
    /// Returns the number of requests cancelled.
    pub fn cancel_all(&self) -> usize {
        let keys: Vec<RequestKey> = self
            .inner
            .handles
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let cancelled = keys.iter().filter(|key| self.cancel(key)).count();
        info!(cancelled, "cancelled all outstanding requests");
        cancelled
    }

    /// `true` if a request is registered under `key`.
    pub fn contains(&self, key: &RequestKey) -> bool {
        self.inner.handles.contains_key(key)
    }

    /// Number of outstanding registrations.
    pub fn len(&self) -> usize {
        self.inner.handles.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.handles.is_empty()
    }
}

#[derive(Debug)]
struct CancelState {
    registry: CancelRegistry,
    options: CancelOptions,
}

/// Builder-owned cancellation state. Call [`wrap`](Self::wrap) to apply it to an adapter.
#[derive(Debug, Clone)]
pub struct CancelExtension {
    state: Arc<CancelState>,
}

impl CancelExtension {
    /// Creates an extension with its own empty registry.
    pub fn new(options: CancelOptions) -> Self {
        Self {
            state: Arc::new(CancelState {
                registry: CancelRegistry::new(),
                options,
            }),
        }
    }

    /// Creates an extension resolving relative URLs against `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self::new(CancelOptions {
            base_url: Some(base_url),
        })
    }

    /// Wrap `adapter` with this extension.
    pub fn wrap<A>(&self, adapter: A) -> Cancelable<A> {
        Cancelable {
            inner: adapter,
            state: Arc::clone(&self.state),
        }
    }

    /// Signal every outstanding request, route-only ones included.
    pub fn cancel_all(&self) -> usize {
        self.state.registry.cancel_all()
    }

    /// The registry backing this extension.
    pub fn registry(&self) -> &CancelRegistry {
        &self.state.registry
    }
}

impl Default for CancelExtension {
    fn default() -> Self {
        Self::new(CancelOptions::default())
    }
}

impl<A> Extension<A> for CancelExtension
where
    A: Adapter,
{
    type Wrapped = Cancelable<A>;

    fn wrap(&self, adapter: A) -> Self::Wrapped {
        CancelExtension::wrap(self, adapter)
    }
}

/// Adapter that attaches a cancellation signal to cancelable requests.
#[derive(Debug)]
pub struct Cancelable<A> {
    inner: A,
    state: Arc<CancelState>,
}

impl<A> Cancelable<A> {
    /// Signal every outstanding request, route-only ones included.
    pub fn cancel_all(&self) -> usize {
        self.state.registry.cancel_all()
    }

    /// The registry shared with the owning extension.
    pub fn registry(&self) -> &CancelRegistry {
        &self.state.registry
    }

    /// The wrapped adapter.
    pub fn get_ref(&self) -> &A {
        &self.inner
    }
}

impl<A: Clone> Clone for Cancelable<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A> Adapter for Cancelable<A>
where
    A: Adapter,
{
    type Future = CancelableFuture<A::Future>;

    fn call(&mut self, mut req: AdapterRequest) -> Self::Future {
        let options = *req.options();
        if !options.cancelable && !options.only_switch_route_cancelable {
            return CancelableFuture {
                inner: self.inner.call(req),
                registration: None,
            };
        }

        let registry = &self.state.registry;
        let mut key = RequestKey::derive(req.url(), self.state.options.base_url.as_ref());
        // Route-only requests never supersede each other; `cancelable` wins.
        if !options.cancelable && options.only_switch_route_cancelable {
            key = key.suffixed(registry.next_id());
        }
        let (generation, handle) = registry.register(key.clone());
        debug!(%key, generation, "cancelable request registered");
        req.set_cancellation(handle.signal());

        CancelableFuture {
            inner: self.inner.call(req),
            registration: Some(Lease {
                registry: registry.clone(),
                key,
                generation,
            }),
        }
    }
}

#[derive(Debug)]
struct Lease {
    registry: CancelRegistry,
    key: RequestKey,
    generation: u64,
}

/// Future returned by [`Cancelable`].
///
/// Releases its registration when it completes or is dropped.
#[pin_project(PinnedDrop)]
pub struct CancelableFuture<F> {
    #[pin]
    inner: F,
    registration: Option<Lease>,
}

impl<F> CancelableFuture<F> {
    fn release(registration: &mut Option<Lease>) {
        if let Some(Lease {
            registry,
            key,
            generation,
        }) = registration.take()
            && registry.release(&key, generation)
        {
            debug!(%key, generation, "cancelable request released");
        }
    }
}

impl<F> Future for CancelableFuture<F>
where
    F: Future<Output = Result<AdapterResponse, AdapterError>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = futures::ready!(this.inner.poll(cx));
        Self::release(this.registration);
        Poll::Ready(result)
    }
}

#[pinned_drop]
impl<F> PinnedDrop for CancelableFuture<F> {
    fn drop(self: Pin<&mut Self>) {
        Self::release(self.project().registration);
    }
}
