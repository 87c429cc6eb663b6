//! Hit/miss decision for a prospective request.

use chrono::{DateTime, Utc};
use reqext_core::{ParamsSnapshot, RequestKey};

use super::pool::{CachePool, SharedResponse};

/// Why a request could not be served from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No entry under the key.
    Absent,
    /// The request asked to bypass a valid entry.
    ForceRefresh,
    /// The entry's expiry instant has passed.
    Expired,
    /// The entry was fetched with different parameters.
    ParamsChanged,
}

impl MissReason {
    /// Returns the reason as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MissReason::Absent => "absent",
            MissReason::ForceRefresh => "force_refresh",
            MissReason::Expired => "expired",
            MissReason::ParamsChanged => "params_changed",
        }
    }
}

/// Outcome of [`decide`].
pub enum CacheDecision {
    /// Serve the existing handle; the transport is not called.
    Hit(SharedResponse),
    /// Dispatch through the transport.
    Miss(MissReason),
}

impl CacheDecision {
    /// `true` for [`CacheDecision::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheDecision::Hit(_))
    }

    /// The miss reason, if this is a miss.
    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            CacheDecision::Hit(_) => None,
            CacheDecision::Miss(reason) => Some(*reason),
        }
    }
}

impl std::fmt::Debug for CacheDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheDecision::Hit(_) => f.write_str("Hit"),
            CacheDecision::Miss(reason) => f.debug_tuple("Miss").field(reason).finish(),
        }
    }
}

/// Decide whether `pool[key]` can serve a request with `params`.
///
/// An entry is a hit only if it exists, `force_refresh` is unset,
/// `now < expire_at`, and its snapshot equals `params`. A hit returns a clone
/// of the stored handle, never a new call.
pub fn decide(
    pool: &CachePool,
    key: &RequestKey,
    params: &ParamsSnapshot,
    force_refresh: bool,
    now: DateTime<Utc>,
) -> CacheDecision {
    pool.with_entry(key, |entry| {
        if force_refresh {
            CacheDecision::Miss(MissReason::ForceRefresh)
        } else if !entry.is_fresh(now) {
            CacheDecision::Miss(MissReason::Expired)
        } else if entry.params() != params {
            CacheDecision::Miss(MissReason::ParamsChanged)
        } else {
            CacheDecision::Hit(entry.response().clone())
        }
    })
    .unwrap_or(CacheDecision::Miss(MissReason::Absent))
}
