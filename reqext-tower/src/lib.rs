//! Tower integration for the reqext request extensions.
//!
//! This crate turns any Tower service speaking `http` into an
//! [`Adapter`](reqext_core::Adapter), and exposes the cacheable, cancelable
//! and lockable extensions as Tower [`Layer`]s so a client stack can be
//! assembled with [`tower::ServiceBuilder`].
//!
//! # When to Use This Crate
//!
//! Use `reqext-tower` when your HTTP client is a Tower service (for example
//! `hyper-util`'s client, or a test double built with `tower::service_fn`)
//! and you want response caching, superseded-request cancellation or
//! duplicate-submission rejection in front of it.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use reqext::{CacheExtension, CancelExtension};
//! use reqext_core::predicate::Neutral;
//! use reqext_tower::{CacheLayer, CancelLayer, TowerAdapterLayer};
//! use tower::{ServiceBuilder, service_fn};
//!
//! let cache = CacheExtension::builder()
//!     .ttl(Duration::from_secs(60))
//!     .admission(Neutral::new())
//!     .build();
//! let cancel = CancelLayer::new(CancelExtension::default());
//!
//! let adapter = ServiceBuilder::new()
//!     .layer(cancel.clone())
//!     .layer(CacheLayer::new(cache))
//!     .layer(TowerAdapterLayer::new())
//!     .service(service_fn(|_req: http::Request<Full<Bytes>>| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(Full::new(Bytes::from("{}"))))
//!     }));
//! # let _ = adapter;
//!
//! // On route change:
//! cancel.cancel_all();
//! ```
//!
//! # Main Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TowerAdapter`] | `Adapter` over a Tower `Service<http::Request<Full<Bytes>>>` |
//! | [`TowerAdapterLayer`] | Layer producing a [`TowerAdapter`], placed innermost |
//! | [`CacheLayer`] | Layer applying the cacheable extension |
//! | [`CancelLayer`] | Layer applying the cancelable extension |
//! | [`LockLayer`] | Layer applying the lockable extension |
//! | [`AdapterService`] | Exposes a wrapped adapter as a `Service<AdapterRequest>` |
//!
//! [`Layer`]: tower::Layer

#![warn(missing_docs)]

/// Tower layers for the extensions.
pub mod layer;
/// Tower service facade over adapters.
pub mod service;
/// Adapter bridging Tower services to reqext.
pub mod upstream;

pub use layer::{CacheLayer, CancelLayer, LockLayer};
pub use service::AdapterService;
pub use upstream::{TowerAdapter, TowerAdapterLayer};
