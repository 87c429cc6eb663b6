//! Boolean composition of admission predicates.
//!
//! ```ignore
//! use reqext_core::predicate::{FnPredicate, PredicateExt};
//!
//! let admission = FnPredicate::new(is_ok_envelope)
//!     .and(FnPredicate::new(has_payload))
//!     .or(FnPredicate::new(is_static_listing));
//! ```

use async_trait::async_trait;

use super::{Predicate, PredicateResult};

/// Flips the outcome of the wrapped predicate.
#[derive(Debug, Clone)]
pub struct Not<P> {
    inner: P,
}

impl<P> Not<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P> Predicate for Not<P>
where
    P: Predicate + Send + Sync,
    P::Subject: Send,
{
    type Subject = P::Subject;

    async fn check(&self, subject: Self::Subject) -> PredicateResult<Self::Subject> {
        match self.inner.check(subject).await {
            PredicateResult::Cacheable(s) => PredicateResult::NonCacheable(s),
            PredicateResult::NonCacheable(s) => PredicateResult::Cacheable(s),
        }
    }
}

/// Admits only when both sides admit. `second` is skipped once `first` rejects.
#[derive(Debug, Clone)]
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<A, B> And<A, B> {
    /// Combines two predicates.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl<A, B> Predicate for And<A, B>
where
    A: Predicate + Send + Sync,
    B: Predicate<Subject = A::Subject> + Send + Sync,
    A::Subject: Send,
{
    type Subject = A::Subject;

    async fn check(&self, subject: Self::Subject) -> PredicateResult<Self::Subject> {
        match self.first.check(subject).await {
            PredicateResult::Cacheable(s) => self.second.check(s).await,
            rejected => rejected,
        }
    }
}

/// Admits when either side admits. `second` is skipped once `first` admits.
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    first: A,
    second: B,
}

impl<A, B> Or<A, B> {
    /// Combines two predicates.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl<A, B> Predicate for Or<A, B>
where
    A: Predicate + Send + Sync,
    B: Predicate<Subject = A::Subject> + Send + Sync,
    A::Subject: Send,
{
    type Subject = A::Subject;

    async fn check(&self, subject: Self::Subject) -> PredicateResult<Self::Subject> {
        match self.first.check(subject).await {
            PredicateResult::NonCacheable(s) => self.second.check(s).await,
            admitted => admitted,
        }
    }
}

/// Fluent combinators available on every [`Predicate`].
pub trait PredicateExt: Predicate + Sized {
    /// Both `self` and `other` must admit.
    fn and<B>(self, other: B) -> And<Self, B>
    where
        B: Predicate<Subject = Self::Subject>,
    {
        And::new(self, other)
    }

    /// Either `self` or `other` must admit.
    fn or<B>(self, other: B) -> Or<Self, B>
    where
        B: Predicate<Subject = Self::Subject>,
    {
        Or::new(self, other)
    }

    /// Inverts `self`.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Erases the concrete predicate type.
    fn boxed(self) -> Box<dyn Predicate<Subject = Self::Subject> + Send + Sync>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<T: Predicate + Sized> PredicateExt for T {}
