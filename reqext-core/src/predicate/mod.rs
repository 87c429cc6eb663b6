//! Cache admission predicates.
//!
//! This module provides the [`Predicate`] trait and [`PredicateResult`] enum
//! used to decide, after a response has completed, whether it may populate
//! the cache.
//!
//! ## Overview
//!
//! The cacheable extension decodes a successful response body as JSON and
//! hands the value to its admission predicate. Only `Cacheable` results
//! create a cache entry; everything else leaves the pool untouched.
//!
//! ```ignore
//! use reqext_core::predicate::{FnPredicate, PredicateExt};
//!
//! // Admit only envelopes reporting success and carrying data.
//! let admission = FnPredicate::new(|body: &serde_json::Value| body["code"] == 0)
//!     .and(FnPredicate::new(|body: &serde_json::Value| !body["data"].is_null()));
//! ```
//!
//! ## Composability
//!
//! - [`And`] - Both predicates must admit
//! - [`Or`] - Either predicate admitting is sufficient
//! - [`Not`] - Inverts a predicate result

pub mod combinators;
pub mod neutral;

use std::sync::Arc;

use async_trait::async_trait;

pub use combinators::{And, Not, Or, PredicateExt};
pub use neutral::{FnPredicate, Neutral, Never};

/// Result of a predicate evaluation.
///
/// Preserves ownership of the subject for further processing.
#[derive(Debug)]
pub enum PredicateResult<S> {
    /// Subject may be cached.
    Cacheable(S),
    /// Subject must not be cached.
    NonCacheable(S),
}

impl<S> PredicateResult<S> {
    /// Returns `true` for [`PredicateResult::Cacheable`].
    pub fn is_cacheable(&self) -> bool {
        matches!(self, PredicateResult::Cacheable(_))
    }

    /// Returns the subject regardless of the outcome.
    pub fn into_inner(self) -> S {
        match self {
            PredicateResult::Cacheable(s) | PredicateResult::NonCacheable(s) => s,
        }
    }
}

/// Trait for evaluating whether a subject should be cached.
///
/// The `check` method takes ownership of the subject and returns it wrapped
/// in a [`PredicateResult`], so a subject can flow through a chain of
/// predicates without cloning.
#[async_trait]
pub trait Predicate {
    /// The type being evaluated by this predicate.
    type Subject;

    /// Evaluate whether the subject should be cached.
    async fn check(&self, subject: Self::Subject) -> PredicateResult<Self::Subject>;
}

#[async_trait]
impl<T> Predicate for Box<T>
where
    T: Predicate + ?Sized + Sync,
    T::Subject: Send,
{
    type Subject = T::Subject;

    async fn check(&self, subject: T::Subject) -> PredicateResult<T::Subject> {
        self.as_ref().check(subject).await
    }
}

#[async_trait]
impl<T> Predicate for Arc<T>
where
    T: Predicate + Send + Sync + ?Sized,
    T::Subject: Send,
{
    type Subject = T::Subject;

    async fn check(&self, subject: T::Subject) -> PredicateResult<T::Subject> {
        self.as_ref().check(subject).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[tokio::test]
    async fn boxed_predicates_compose() {
        let success = FnPredicate::new(|body: &Value| body["ok"] == true).boxed();
        let has_data = FnPredicate::new(|body: &Value| !body["data"].is_null()).boxed();
        let admission = success.and(has_data);

        let result = admission.check(json!({ "ok": true, "data": [1] })).await;
        assert!(result.is_cacheable());

        let result = admission.check(json!({ "ok": true, "data": null })).await;
        assert!(!result.is_cacheable());
        assert_eq!(result.into_inner(), json!({ "ok": true, "data": null }));
    }

    #[tokio::test]
    async fn chaining_with_not_and_or() {
        let p1: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Neutral::<i32>::new());
        let p2: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Never::<i32>::new());
        let p3: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Neutral::<i32>::new());

        // Cacheable AND NonCacheable = NonCacheable, OR Cacheable = Cacheable, NOT = NonCacheable
        let combined = p1.and(p2).or(p3).not();

        let result = combined.check(42).await;
        assert!(matches!(result, PredicateResult::NonCacheable(42)));
    }

    #[tokio::test]
    async fn heterogeneous_predicates_in_vec() {
        let predicates: Vec<Box<dyn Predicate<Subject = i32> + Send + Sync>> = vec![
            Neutral::<i32>::new().boxed(),
            Neutral::<i32>::new().not().boxed(),
            FnPredicate::new(|n: &i32| *n > 10).boxed(),
        ];

        assert!(matches!(predicates[0].check(1).await, PredicateResult::Cacheable(1)));
        assert!(matches!(predicates[1].check(2).await, PredicateResult::NonCacheable(2)));
        assert!(matches!(predicates[2].check(11).await, PredicateResult::Cacheable(11)));
        assert!(matches!(predicates[2].check(3).await, PredicateResult::NonCacheable(3)));
    }
}
