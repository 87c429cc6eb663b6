//! Duplicate-submission suppression.
//!
//! A [`Lockable`] adapter marks an endpoint as locked in a [`LockRegistry`]
//! before calling the transport. While the lock is held, further lockable
//! requests to the same endpoint are rejected with
//! [`DuplicateSubmission`] and never reach the transport. The lock is
//! released when the request settles, unless the request was sent with
//! `enqueue_submit`, in which case it stays until
//! [`Lockable::delete_lock_entry`] is called.

use std::future::{self, Future, Ready};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::Either;
use pin_project::{pin_project, pinned_drop};
use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, DuplicateSubmission, RequestKey,
};
use tracing::{debug, info};
use url::Url;

use crate::config::LockOptions;
use crate::ext::Extension;

/// Set of endpoints with an outstanding locked request.
///
/// Every lock carries the generation it was taken with, so a settling request
/// only releases its own lock. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    inner: Arc<Locks>,
}

#[derive(Debug, Default)]
struct Locks {
    held: DashMap<RequestKey, u64>,
    generation: AtomicU64,
}

impl LockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `key` unless it is already locked.
    ///
    /// Returns the generation of the new lock, or `None` if the key was
    /// locked already.
    pub fn try_lock(&self, key: RequestKey) -> Option<u64> {
        match self.inner.held.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                vacant.insert(generation);
                Some(generation)
            }
        }
    }

    /// Release the lock on `key` if it is still the one taken at `generation`.
    pub fn release(&self, key: &RequestKey, generation: u64) -> bool {
        self.inner
            .held
            .remove_if(key, |_, held| *held == generation)
            .is_some()
    }

    /// Release the lock on `key` whoever holds it. Returns `true` if it was held.
    pub fn unlock(&self, key: &RequestKey) -> bool {
        self.inner.held.remove(key).is_some()
    }

    /// `true` while `key` is locked.
    pub fn is_locked(&self, key: &RequestKey) -> bool {
        self.inner.held.contains_key(key)
    }

    /// Number of held locks.
    pub fn len(&self) -> usize {
        self.inner.held.len()
    }

    /// `true` if no lock is held.
    pub fn is_empty(&self) -> bool {
        self.inner.held.is_empty()
    }
}

#[derive(Debug)]
struct LockState {
    registry: LockRegistry,
    options: LockOptions,
}

impl LockState {
    fn delete_lock_entry(&self, url: &str) -> bool {
        let key = RequestKey::derive(url, self.options.base_url.as_ref());
        let released = self.registry.unlock(&key);
        debug!(%key, released, "lock entry deleted");
        released
    }
}

/// Builder-owned lock state. Call [`wrap`](Self::wrap) to apply it to an adapter.
#[derive(Debug, Clone)]
pub struct LockExtension {
    state: Arc<LockState>,
}

impl LockExtension {
    /// Creates an extension with its own empty registry.
    pub fn new(options: LockOptions) -> Self {
        Self {
            state: Arc::new(LockState {
                registry: LockRegistry::new(),
                options,
            }),
        }
    }

    /// Creates an extension resolving relative URLs against `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self::new(LockOptions {
            base_url: Some(base_url),
        })
    }

    /// Wrap `adapter` with this extension.
    pub fn wrap<A>(&self, adapter: A) -> Lockable<A> {
        Lockable {
            inner: adapter,
            state: Arc::clone(&self.state),
        }
    }

    /// Release the lock held for the endpoint `url` points at.
    pub fn delete_lock_entry(&self, url: &str) -> bool {
        self.state.delete_lock_entry(url)
    }

    /// The registry backing this extension.
    pub fn registry(&self) -> &LockRegistry {
        &self.state.registry
    }
}

impl Default for LockExtension {
    fn default() -> Self {
        Self::new(LockOptions::default())
    }
}

impl<A> Extension<A> for LockExtension
where
    A: Adapter,
{
    type Wrapped = Lockable<A>;

    fn wrap(&self, adapter: A) -> Self::Wrapped {
        LockExtension::wrap(self, adapter)
    }
}

/// Adapter rejecting lockable requests to an endpoint that is already busy.
#[derive(Debug)]
pub struct Lockable<A> {
    inner: A,
    state: Arc<LockState>,
}

impl<A> Lockable<A> {
    /// Release the lock held for the endpoint `url` points at.
    ///
    /// This is how a lock taken with `enqueue_submit` is released.
    pub fn delete_lock_entry(&self, url: &str) -> bool {
        self.state.delete_lock_entry(url)
    }

    /// The registry shared with the owning extension.
    pub fn registry(&self) -> &LockRegistry {
        &self.state.registry
    }

    /// The wrapped adapter.
    pub fn get_ref(&self) -> &A {
        &self.inner
    }
}

impl<A: Clone> Clone for Lockable<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

type Rejected = Ready<Result<AdapterResponse, AdapterError>>;

impl<A> Adapter for Lockable<A>
where
    A: Adapter,
{
    type Future = Either<LockedFuture<A::Future>, Rejected>;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        let options = *req.options();
        if !options.lockable {
            return Either::Left(LockedFuture {
                inner: self.inner.call(req),
                guard: None,
            });
        }

        let key = RequestKey::derive(req.url(), self.state.options.base_url.as_ref());
        let Some(generation) = self.state.registry.try_lock(key.clone()) else {
            info!(%key, "duplicate submission rejected");
            let rejection = DuplicateSubmission::new(key);
            return Either::Right(future::ready(Err(rejection.into())));
        };
        debug!(%key, generation, enqueue = options.enqueue_submit, "lock acquired");

        // Queued submissions keep the lock until it is deleted explicitly.
        let guard = (!options.enqueue_submit).then(|| LockGuard {
            registry: self.state.registry.clone(),
            key,
            generation,
        });
        Either::Left(LockedFuture {
            inner: self.inner.call(req),
            guard,
        })
    }
}

#[derive(Debug)]
struct LockGuard {
    registry: LockRegistry,
    key: RequestKey,
    generation: u64,
}

/// Future returned by [`Lockable`] for admitted requests.
///
/// Releases the lock when it completes or is dropped.
#[pin_project(PinnedDrop)]
pub struct LockedFuture<F> {
    #[pin]
    inner: F,
    guard: Option<LockGuard>,
}

impl<F> LockedFuture<F> {
    fn unlock(guard: &mut Option<LockGuard>) {
        if let Some(LockGuard {
            registry,
            key,
            generation,
        }) = guard.take()
            && registry.release(&key, generation)
        {
            debug!(%key, generation, "lock released");
        }
    }
}

impl<F> Future for LockedFuture<F>
where
    F: Future<Output = Result<AdapterResponse, AdapterError>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = futures::ready!(this.inner.poll(cx));
        Self::unlock(this.guard);
        Poll::Ready(result)
    }
}

#[pinned_drop]
impl<F> PinnedDrop for LockedFuture<F> {
    fn drop(self: Pin<&mut Self>) {
        Self::unlock(self.project().guard);
    }
}
