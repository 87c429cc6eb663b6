#![warn(missing_docs)]
//! # reqext-core
//!
//! Core contracts for the reqext request-extension layer.
//!
//! This crate provides the foundational abstractions that make the extensions
//! **transport-agnostic**. The caching, cancellation and duplicate-submission
//! wrappers in `reqext` are written once against these types, and transport
//! bindings (like `reqext-tower` and `reqext-reqwest`) implement the
//! [`Adapter`] contract for a concrete HTTP client.
//!
//! ## Architecture
//!
//! - **Call** the transport ([`Adapter`])
//! - **Describe** a request and its extension flags ([`AdapterRequest`], [`RequestOptions`])
//! - **Identify** the endpoint a request targets ([`RequestKey`])
//! - **Compare** request intent across time ([`ParamsSnapshot`])
//! - **Signal** cooperative cancellation ([`CancelHandle`], [`CancelSignal`])
//! - **Decide** whether a completed response may be cached ([`Predicate`])
//!
//! ## Feature Flags
//!
//! - `test-helpers` - Enable [`MockTimeProvider`](time::MockTimeProvider) for deterministic expiry tests
//!

pub mod adapter;
pub mod cancel;
pub mod error;
pub mod key;
pub mod predicate;
pub mod request;
pub mod response;
pub mod snapshot;
pub mod time;

pub use adapter::{Adapter, AdapterFn, BoxAdapterFuture, adapter_fn};
pub use cancel::{CancelHandle, CancelSignal, cancellable};
pub use error::{AdapterError, DuplicateSubmission, is_cancel, is_repeat_submit};
pub use key::RequestKey;
pub use predicate::{
    And, FnPredicate, Neutral, Never, Not, Or, Predicate, PredicateExt, PredicateResult,
};
pub use request::{AdapterRequest, RequestBody, RequestOptions};
pub use response::AdapterResponse;
pub use snapshot::ParamsSnapshot;
pub use time::{SystemTimeProvider, TimeProvider};
