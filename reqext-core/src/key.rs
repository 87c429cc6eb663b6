//! Canonical request keys.
//!
//! A [`RequestKey`] identifies the *endpoint* a request targets, not the
//! exact call: it is the URL's origin followed by its path, with the query
//! string and fragment stripped. Two URLs that differ only in their query
//! derive the same key.
//!
//! ```
//! use reqext_core::RequestKey;
//!
//! let a = RequestKey::derive("https://api.example.com/users?page=1", None);
//! let b = RequestKey::derive("https://api.example.com/users?page=2#top", None);
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "https://api.example.com/users");
//! ```
//!
//! Relative URLs are resolved against an optional base. When a URL cannot be
//! parsed at all, derivation falls back to the raw string with its query and
//! fragment removed; it never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::trace;
use url::Url;

/// Canonical identifier of an endpoint: `origin + path`.
///
/// Uses [`SmolStr`] so clones are cheap and short keys stay inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(SmolStr);

impl RequestKey {
    /// Derive the key for `url`, resolving relative URLs against `base`.
    pub fn derive(url: &str, base: Option<&Url>) -> Self {
        let parsed = match base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        match parsed {
            Ok(parsed) => Self::from_url(&parsed),
            Err(error) => {
                trace!(url, %error, "unparseable url, keying on raw path");
                Self(SmolStr::new(strip_query(url)))
            }
        }
    }

    /// Build the key from an already parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let origin = url.origin();
        if origin.is_tuple() {
            let mut key = origin.ascii_serialization();
            key.push_str(url.path());
            Self(SmolStr::new(key))
        } else {
            // Opaque origins (file:, data:, ...) serialize as "null"; keep the
            // whole location minus query instead so distinct paths stay distinct.
            let mut url = url.clone();
            url.set_query(None);
            url.set_fragment(None);
            Self(SmolStr::new(url.as_str()))
        }
    }

    /// Returns this key with `-{id}` appended.
    ///
    /// Used for requests that must never collide with another request to the
    /// same endpoint.
    pub fn suffixed(&self, id: impl fmt::Display) -> Self {
        Self(SmolStr::new(format!("{}-{}", self.0, id)))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn strip_query(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestKey {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl From<String> for RequestKey {
    fn from(value: String) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for RequestKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
