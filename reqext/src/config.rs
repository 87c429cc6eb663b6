//! Extension configuration.
//!
//! Every extension instance is configured once, at build time. Options are
//! plain serde types so they can be loaded from configuration files:
//!
//! ```yaml
//! cache:
//!   ttl: 5s
//!   base_url: https://api.example.com/
//! cancel:
//!   base_url: https://api.example.com/
//! lock: {}
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default time-to-live for cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

/// Options of the cacheable extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheOptions {
    /// Time-to-live applied to every entry this instance creates
    /// (e.g., "5s", "500ms", "1m").
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
    /// Base used to resolve relative request URLs into keys.
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            base_url: None,
        }
    }
}

/// Options of the cancelable extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelOptions {
    /// Base used to resolve relative request URLs into keys.
    #[serde(default)]
    pub base_url: Option<Url>,
}

/// Options of the lockable extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockOptions {
    /// Base used to resolve relative request URLs into keys.
    #[serde(default)]
    pub base_url: Option<Url>,
}

/// Options for all three extensions, as found in a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionsConfig {
    /// Cacheable extension options.
    #[serde(default)]
    pub cache: CacheOptions,
    /// Cancelable extension options.
    #[serde(default)]
    pub cancel: CancelOptions,
    /// Lockable extension options.
    #[serde(default)]
    pub lock: LockOptions,
}
