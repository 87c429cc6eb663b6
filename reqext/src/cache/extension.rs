use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqext_core::predicate::{FnPredicate, Never};
use reqext_core::{
    Adapter, AdapterRequest, AdapterResponse, BoxAdapterFuture, ParamsSnapshot, Predicate,
    PredicateResult, RequestKey, SystemTimeProvider, TimeProvider,
};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use super::decision::{CacheDecision, decide};
use super::pool::{CacheEntry, CachePool, SharedResponse};
use crate::config::CacheOptions;
use crate::ext::Extension;

struct CacheState<P> {
    pool: CachePool,
    admission: P,
    options: CacheOptions,
    clock: Arc<dyn TimeProvider>,
}

impl<P> CacheState<P>
where
    P: Predicate<Subject = Value> + Send + Sync,
{
    async fn admit(
        &self,
        key: RequestKey,
        params: ParamsSnapshot,
        handle: SharedResponse,
        response: &AdapterResponse,
    ) {
        if !response.is_success() {
            trace!(%key, status = %response.status(), "unsuccessful response, not cached");
            return;
        }
        let body = match response.json_value() {
            Ok(body) => body,
            Err(error) => {
                debug!(%key, %error, "response body is not JSON, not cached");
                return;
            }
        };
        match self.admission.check(body).await {
            PredicateResult::Cacheable(_) => {
                let entry = CacheEntry::new(
                    key,
                    params,
                    handle,
                    self.options.ttl,
                    self.clock.now(),
                );
                debug!(key = %entry.key(), expire_at = %entry.expire_at(), "response cached");
                self.pool.insert(entry);
            }
            PredicateResult::NonCacheable(_) => {
                debug!(%key, "response rejected by admission predicate");
            }
        }
    }
}

/// Builder-owned cache state. Call [`wrap`](Self::wrap) to apply it to an adapter.
///
/// Every adapter wrapped by the same extension (and every clone of it)
/// shares one [`CachePool`]; separately built extensions never share entries.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reqext::cache::CacheExtension;
/// use reqext_core::{AdapterError, AdapterRequest, AdapterResponse, adapter_fn};
///
/// let cache = CacheExtension::builder()
///     .ttl(Duration::from_secs(30))
///     .admit_if(|body| body["code"] == 0)
///     .build();
///
/// let adapter = cache.wrap(adapter_fn(|_req: AdapterRequest| async {
///     Ok::<_, AdapterError>(AdapterResponse::ok(r#"{"code":0}"#))
/// }));
/// # let _ = adapter;
/// ```
pub struct CacheExtension<P = Never<Value>> {
    state: Arc<CacheState<P>>,
}

impl<P> Clone for CacheExtension<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<P> std::fmt::Debug for CacheExtension<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheExtension")
            .field("pool", &self.state.pool)
            .field("options", &self.state.options)
            .field("admission", &"...")
            .finish()
    }
}

impl CacheExtension<Never<Value>> {
    /// Creates a new [`CacheExtensionBuilder`].
    pub fn builder() -> CacheExtensionBuilder<Never<Value>> {
        CacheExtensionBuilder::new()
    }
}

impl<P> CacheExtension<P> {
    /// Wrap `adapter` with this cache.
    pub fn wrap<A>(&self, adapter: A) -> Cacheable<A, P> {
        Cacheable {
            inner: adapter,
            state: Arc::clone(&self.state),
        }
    }

    /// Delete the entry for the endpoint `url` points at.
    ///
    /// Returns `true` if an entry was removed.
    pub fn delete_cache_entry(&self, url: &str) -> bool {
        delete_entry(&self.state, url)
    }

    /// The pool backing this extension.
    pub fn pool(&self) -> &CachePool {
        &self.state.pool
    }

    /// The options this extension was built with.
    pub fn options(&self) -> &CacheOptions {
        &self.state.options
    }
}

impl<A, P> Extension<A> for CacheExtension<P>
where
    A: Adapter,
    P: Predicate<Subject = Value> + Send + Sync + 'static,
{
    type Wrapped = Cacheable<A, P>;

    fn wrap(&self, adapter: A) -> Self::Wrapped {
        CacheExtension::wrap(self, adapter)
    }
}

fn delete_entry<P>(state: &CacheState<P>, url: &str) -> bool {
    let key = RequestKey::derive(url, state.options.base_url.as_ref());
    let removed = state.pool.remove(&key).is_some();
    debug!(%key, removed, "cache entry deleted");
    removed
}

/// Builder for [`CacheExtension`].
pub struct CacheExtensionBuilder<P> {
    options: CacheOptions,
    admission: P,
    clock: Arc<dyn TimeProvider>,
}

impl CacheExtensionBuilder<Never<Value>> {
    /// Creates a builder with default options and an admission predicate that
    /// rejects everything.
    pub fn new() -> Self {
        Self {
            options: CacheOptions::default(),
            admission: Never::new(),
            clock: Arc::new(SystemTimeProvider),
        }
    }
}

impl Default for CacheExtensionBuilder<Never<Value>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> CacheExtensionBuilder<P> {
    /// Replace all options at once.
    pub fn options(self, options: CacheOptions) -> Self {
        Self { options, ..self }
    }

    /// Time-to-live of every entry created by this extension.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = ttl;
        self
    }

    /// Base used to resolve relative request URLs.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.options.base_url = Some(base_url);
        self
    }

    /// Clock used to compute and check expiry.
    pub fn time_provider<T>(self, clock: T) -> Self
    where
        T: TimeProvider + 'static,
    {
        Self {
            clock: Arc::new(clock),
            ..self
        }
    }

    /// Sets the admission predicate applied to successful response bodies.
    pub fn admission<NP>(self, admission: NP) -> CacheExtensionBuilder<NP>
    where
        NP: Predicate<Subject = Value>,
    {
        CacheExtensionBuilder {
            options: self.options,
            admission,
            clock: self.clock,
        }
    }

    /// Admit responses whose JSON body satisfies `f`.
    pub fn admit_if<F>(self, f: F) -> CacheExtensionBuilder<FnPredicate<F, Value>>
    where
        F: Fn(&Value) -> bool + Send + Sync,
    {
        self.admission(FnPredicate::new(f))
    }

    /// Builds the extension with a fresh, empty pool.
    pub fn build(self) -> CacheExtension<P> {
        CacheExtension {
            state: Arc::new(CacheState {
                pool: CachePool::new(),
                admission: self.admission,
                options: self.options,
                clock: self.clock,
            }),
        }
    }
}

/// Adapter serving cacheable requests from a [`CachePool`].
///
/// Requests without the `cacheable` flag go straight to the inner adapter.
pub struct Cacheable<A, P = Never<Value>> {
    inner: A,
    state: Arc<CacheState<P>>,
}

impl<A, P> Cacheable<A, P> {
    /// Delete the entry for the endpoint `url` points at.
    pub fn delete_cache_entry(&self, url: &str) -> bool {
        delete_entry(&self.state, url)
    }

    /// The pool shared with the owning extension.
    pub fn pool(&self) -> &CachePool {
        &self.state.pool
    }

    /// The wrapped adapter.
    pub fn get_ref(&self) -> &A {
        &self.inner
    }
}

impl<A, P> Clone for Cacheable<A, P>
where
    A: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A, P> std::fmt::Debug for Cacheable<A, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cacheable")
            .field("pool", &self.state.pool)
            .finish_non_exhaustive()
    }
}

impl<A, P> Adapter for Cacheable<A, P>
where
    A: Adapter,
    P: Predicate<Subject = Value> + Send + Sync + 'static,
{
    type Future = BoxAdapterFuture;

    fn call(&mut self, req: AdapterRequest) -> Self::Future {
        if !req.options().cacheable {
            return Box::pin(self.inner.call(req));
        }

        let key = RequestKey::derive(req.url(), self.state.options.base_url.as_ref());
        let params = ParamsSnapshot::capture(&req);
        let now = self.state.clock.now();

        match decide(
            &self.state.pool,
            &key,
            &params,
            req.options().force_update,
            now,
        ) {
            CacheDecision::Hit(response) => {
                debug!(%key, "cache hit");
                return Box::pin(response);
            }
            CacheDecision::Miss(reason) => {
                debug!(%key, reason = reason.as_str(), "cache miss");
            }
        }

        let dispatched: BoxAdapterFuture = Box::pin(self.inner.call(req));
        let handle = dispatched.shared();
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let result = handle.clone().await;
            if let Ok(response) = &result {
                state.admit(key, params, handle, response).await;
            }
            result
        })
    }
}
