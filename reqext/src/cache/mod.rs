//! Response caching with time-based expiry and parameter-equality invalidation.
//!
//! The cacheable extension keeps a [`CachePool`] keyed by
//! [`RequestKey`](reqext_core::RequestKey). A cacheable request is served from
//! the pool when an entry exists for its key, has not expired, was fetched
//! with equal [`ParamsSnapshot`](reqext_core::ParamsSnapshot)s, and the
//! request does not ask for a forced refresh. Otherwise the transport is
//! called.
//!
//! ## Admission
//!
//! Entries are created only after a response completes: the body of a
//! successful response is decoded as JSON and handed to the admission
//! predicate. The entry stores the *dispatch-time* shared handle, so every
//! later hit resolves to the very same response.
//!
//! ## Concurrent misses
//!
//! Because admission happens after resolution, requests issued while the
//! first one is still in flight all miss and all reach the transport. The
//! pool only serves requests dispatched after an admitted response.

mod decision;
mod extension;
mod pool;

pub use decision::{CacheDecision, MissReason, decide};
pub use extension::{CacheExtension, CacheExtensionBuilder, Cacheable};
pub use pool::{CacheEntry, CachePool, SharedResponse};
