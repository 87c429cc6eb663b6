//! Error types surfaced by adapters and extensions.
//!
//! All extension-specific failures are returned as `Err` values from the
//! adapter future, never as panics, so callers can branch on them with the
//! [`is_cancel`] and [`is_repeat_submit`] predicates instead of inspecting
//! concrete transport error types.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::RequestKey;

/// Error returned from an [`Adapter`](crate::Adapter) future.
///
/// The type is `Clone` so that a single in-flight response handle can be
/// observed by several callers: every waiter on a shared cache entry sees
/// the same failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// The request was cancelled, either superseded by a newer request to
    /// the same endpoint or swept by `cancel_all`.
    #[error("request cancelled: {url}")]
    Cancelled {
        /// URL of the cancelled request.
        url: String,
    },

    /// A lockable request was rejected because an identical-key request is
    /// still outstanding.
    #[error("{0}")]
    DuplicateSubmission(DuplicateSubmission),

    /// The transport itself failed. Passed through unmodified.
    #[error("transport error: {0}")]
    Transport(Arc<dyn StdError + Send + Sync>),
}

impl AdapterError {
    /// Cancellation rejection for the request to `url`.
    pub fn cancelled(url: impl Into<String>) -> Self {
        AdapterError::Cancelled { url: url.into() }
    }

    /// Wrap an arbitrary transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AdapterError::Transport(Arc::new(error))
    }

    /// Wrap an already boxed transport error.
    pub fn transport_boxed(error: Box<dyn StdError + Send + Sync>) -> Self {
        AdapterError::Transport(Arc::from(error))
    }

    /// Returns `true` if this error is a cancellation rejection.
    pub fn is_cancel(&self) -> bool {
        matches!(self, AdapterError::Cancelled { .. })
    }

    /// Returns `true` if this error is a duplicate-submission rejection.
    pub fn is_repeat_submit(&self) -> bool {
        matches!(self, AdapterError::DuplicateSubmission(_))
    }

    /// Returns the duplicate-submission payload, if any.
    pub fn as_duplicate_submission(&self) -> Option<&DuplicateSubmission> {
        match self {
            AdapterError::DuplicateSubmission(duplicate) => Some(duplicate),
            _ => None,
        }
    }
}

/// Returns `true` if `error` is a cancellation rejection.
pub fn is_cancel(error: &AdapterError) -> bool {
    error.is_cancel()
}

/// Returns `true` if `error` is a duplicate-submission rejection.
pub fn is_repeat_submit(error: &AdapterError) -> bool {
    error.is_repeat_submit()
}

/// Structured payload of a duplicate-submission rejection.
///
/// Serializes with the machine-checkable marker field `__IS_REPEAT_SUBMIT__`
/// set to `true` next to a human-readable message:
///
/// ```
/// use reqext_core::{DuplicateSubmission, RequestKey};
///
/// let err = DuplicateSubmission::new(RequestKey::from("https://api.example.com/orders"));
/// let json = serde_json::to_value(&err).unwrap();
/// assert_eq!(json["__IS_REPEAT_SUBMIT__"], true);
/// assert_eq!(json["message"], "duplicate submission: https://api.example.com/orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSubmission {
    #[serde(rename = "__IS_REPEAT_SUBMIT__")]
    marker: bool,
    key: RequestKey,
    message: String,
}

impl DuplicateSubmission {
    /// Creates the rejection payload for `key`.
    pub fn new(key: RequestKey) -> Self {
        let message = format!("duplicate submission: {key}");
        Self {
            marker: true,
            key,
            message,
        }
    }

    /// The marker field; always `true` for payloads built by this crate.
    pub fn is_repeat_submit(&self) -> bool {
        self.marker
    }

    /// Key of the locked endpoint.
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DuplicateSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<DuplicateSubmission> for AdapterError {
    fn from(duplicate: DuplicateSubmission) -> Self {
        AdapterError::DuplicateSubmission(duplicate)
    }
}
