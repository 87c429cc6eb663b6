use reqext::cache::{CacheExtension, Cacheable};
use reqext::cancel::{CancelExtension, Cancelable};
use reqext::lock::{LockExtension, Lockable};
use reqext_core::predicate::Never;
use serde_json::Value;
use tower::Layer;

/// Tower [`Layer`] applying a [`CacheExtension`].
///
/// Every service produced by the layer, and every clone of the layer, shares
/// the extension's pool.
pub struct CacheLayer<P = Never<Value>> {
    extension: CacheExtension<P>,
}

impl<P> CacheLayer<P> {
    /// Creates a layer from a built extension.
    pub fn new(extension: CacheExtension<P>) -> Self {
        Self { extension }
    }

    /// The extension applied by this layer.
    pub fn extension(&self) -> &CacheExtension<P> {
        &self.extension
    }

    /// Delete the cache entry for the endpoint `url` points at.
    pub fn delete_cache_entry(&self, url: &str) -> bool {
        self.extension.delete_cache_entry(url)
    }
}

impl<P> From<CacheExtension<P>> for CacheLayer<P> {
    fn from(extension: CacheExtension<P>) -> Self {
        Self::new(extension)
    }
}

impl<P> Clone for CacheLayer<P> {
    fn clone(&self) -> Self {
        Self {
            extension: self.extension.clone(),
        }
    }
}

impl<P> std::fmt::Debug for CacheLayer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("extension", &self.extension)
            .finish()
    }
}

impl<A, P> Layer<A> for CacheLayer<P> {
    type Service = Cacheable<A, P>;

    fn layer(&self, adapter: A) -> Self::Service {
        self.extension.wrap(adapter)
    }
}

/// Tower [`Layer`] applying a [`CancelExtension`].
#[derive(Debug, Clone, Default)]
pub struct CancelLayer {
    extension: CancelExtension,
}

impl CancelLayer {
    /// Creates a layer from an extension.
    pub fn new(extension: CancelExtension) -> Self {
        Self { extension }
    }

    /// The extension applied by this layer.
    pub fn extension(&self) -> &CancelExtension {
        &self.extension
    }

    /// Signal every outstanding request of every service built by this layer.
    pub fn cancel_all(&self) -> usize {
        self.extension.cancel_all()
    }
}

impl From<CancelExtension> for CancelLayer {
    fn from(extension: CancelExtension) -> Self {
        Self::new(extension)
    }
}

impl<A> Layer<A> for CancelLayer {
    type Service = Cancelable<A>;

    fn layer(&self, adapter: A) -> Self::Service {
        self.extension.wrap(adapter)
    }
}

/// Tower [`Layer`] applying a [`LockExtension`].
#[derive(Debug, Clone, Default)]
pub struct LockLayer {
    extension: LockExtension,
}

impl LockLayer {
    /// Creates a layer from an extension.
    pub fn new(extension: LockExtension) -> Self {
        Self { extension }
    }

    /// The extension applied by this layer.
    pub fn extension(&self) -> &LockExtension {
        &self.extension
    }

    /// Release the lock held for the endpoint `url` points at.
    pub fn delete_lock_entry(&self, url: &str) -> bool {
        self.extension.delete_lock_entry(url)
    }
}

impl From<LockExtension> for LockLayer {
    fn from(extension: LockExtension) -> Self {
        Self::new(extension)
    }
}

impl<A> Layer<A> for LockLayer {
    type Service = Lockable<A>;

    fn layer(&self, adapter: A) -> Self::Service {
        self.extension.wrap(adapter)
    }
}
