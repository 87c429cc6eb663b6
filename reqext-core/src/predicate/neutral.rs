//! Leaf predicates: constant outcomes and closures.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::{Predicate, PredicateResult};

macro_rules! constant_predicate {
    ($(#[$meta:meta])* $name:ident => $outcome:ident, $ctor_doc:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name<S> {
            _subject: PhantomData<fn(S) -> S>,
        }

        impl<S> fmt::Debug for $name<S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }

        impl<S> Default for $name<S> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<S> $name<S> {
            #[doc = $ctor_doc]
            pub fn new() -> Self {
                Self { _subject: PhantomData }
            }
        }

        #[async_trait]
        impl<S: Send> Predicate for $name<S> {
            type Subject = S;

            async fn check(&self, subject: S) -> PredicateResult<S> {
                PredicateResult::$outcome(subject)
            }
        }
    };
}

constant_predicate! {
    /// Admits every response.
    Neutral => Cacheable, "Creates a predicate admitting everything."
}

constant_predicate! {
    /// Admits nothing.
    ///
    /// Default admission of the cacheable extension: nothing is cached until
    /// an admission predicate is configured.
    Never => NonCacheable, "Creates a predicate rejecting everything."
}

/// Predicate backed by a synchronous closure `Fn(&S) -> bool`.
#[derive(Clone)]
pub struct FnPredicate<F, S> {
    f: F,
    _phantom: PhantomData<fn(S) -> S>,
}

impl<F, S> fmt::Debug for FnPredicate<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate").finish()
    }
}

impl<F, S> FnPredicate<F, S>
where
    F: Fn(&S) -> bool,
{
    /// Wraps `f`; `true` means cacheable.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, S> Predicate for FnPredicate<F, S>
where
    F: Fn(&S) -> bool + Send + Sync,
    S: Send,
{
    type Subject = S;

    async fn check(&self, subject: Self::Subject) -> PredicateResult<Self::Subject> {
        if (self.f)(&subject) {
            PredicateResult::Cacheable(subject)
        } else {
            PredicateResult::NonCacheable(subject)
        }
    }
}
