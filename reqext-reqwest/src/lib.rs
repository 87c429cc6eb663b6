#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod adapter;

pub use adapter::ReqwestAdapter;

// Re-export for convenience
pub use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
