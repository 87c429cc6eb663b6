#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Response cache: pool, hit/miss decision and the cacheable extension.
pub mod cache;

/// Cancellation registry and the cancelable extension.
pub mod cancel;

/// Extension options.
///
/// Provides serde types for TTL and base URL settings, loadable from
/// configuration files.
pub mod config;

/// Composition helpers: [`Extension`](ext::Extension), [`AdapterExt`] and [`BoxAdapter`].
pub mod ext;

/// Lock registry and the lockable extension.
pub mod lock;

pub use cache::{CacheExtension, CacheExtensionBuilder, CachePool, Cacheable};
pub use cancel::{CancelExtension, CancelRegistry, Cancelable};
pub use config::{CacheOptions, CancelOptions, ExtensionsConfig, LockOptions};
pub use ext::{AdapterExt, BoxAdapter, Extension};
pub use lock::{LockExtension, LockRegistry, Lockable};

pub use reqext_core::{
    Adapter, AdapterError, AdapterRequest, AdapterResponse, DuplicateSubmission, ParamsSnapshot,
    RequestKey, RequestOptions, is_cancel, is_repeat_submit,
};
