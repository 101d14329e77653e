//! Strategy core - named, lazily composable partial functions on terms.
//!
//! A strategy applied to a subject term returns `None` (failure, the normal
//! control-flow outcome) or `Some(term)` (success). Strategies are values:
//! cheap to clone, shareable across threads, and recursively definable
//! through [`Strategy::lazily`].

use crate::term::Term;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::trace;

type Body = dyn Fn(&Term) -> Option<Term> + Send + Sync;

struct Inner {
    name: String,
    body: Box<Body>,
}

/// A named partial function from term to term, with explicit failure.
#[derive(Clone)]
pub struct Strategy {
    inner: Arc<Inner>,
}

impl Strategy {
    /// Build a strategy from a name and a body.
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&Term) -> Option<Term> + Send + Sync + 'static,
    ) -> Self {
        Strategy {
            inner: Arc::new(Inner {
                name: name.into(),
                body: Box::new(body),
            }),
        }
    }

    /// Build a recursive strategy whose expansion is computed on first
    /// application and memoized for the lifetime of this instance.
    ///
    /// Constructing the combinator never runs `thunk`; recursive knots like
    /// `topdown(s) = seq(s, all(topdown(s)))` converge because each level of
    /// the expansion is only forced when a traversal reaches it.
    pub fn lazily(
        name: impl Into<String>,
        thunk: impl Fn() -> Strategy + Send + Sync + 'static,
    ) -> Self {
        let slot: OnceCell<Strategy> = OnceCell::new();
        Strategy::new(name, move |subject| {
            slot.get_or_init(&thunk).apply(subject)
        })
    }

    /// Apply the strategy to a subject term.
    pub fn apply(&self, subject: &Term) -> Option<Term> {
        let result = (self.inner.body)(subject);
        #[cfg(feature = "tracing")]
        trace!(
            strategy = self.inner.name.as_str(),
            success = result.is_some(),
            "apply"
        );
        result
    }

    /// The strategy's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strategy({})", self.inner.name)
    }
}

/// Always succeed with the subject itself.
pub fn id() -> Strategy {
    Strategy::new("id", |subject| Some(subject.clone()))
}

/// Always fail.
pub fn fail() -> Strategy {
    Strategy::new("fail", |_| None)
}

/// Apply `p`; on success feed its result to `q`; fail if either fails.
pub fn seq(p: Strategy, q: Strategy) -> Strategy {
    let name = format!("({} ; {})", p.name(), q.name());
    Strategy::new(name, move |subject| {
        let mid = p.apply(subject)?;
        q.apply(&mid)
    })
}

/// Deterministic choice: apply `p`; if it fails, apply `q` to the original
/// subject.
pub fn choice(p: Strategy, q: Strategy) -> Strategy {
    let name = format!("({} <+ {})", p.name(), q.name());
    Strategy::new(name, move |subject| {
        p.apply(subject).or_else(|| q.apply(subject))
    })
}

/// Guarded choice: apply `p`; on success feed its result to `q`; on failure
/// apply `r` to the original subject.
pub fn guarded(p: Strategy, q: Strategy, r: Strategy) -> Strategy {
    let name = format!("({} < {} + {})", p.name(), q.name(), r.name());
    Strategy::new(name, move |subject| match p.apply(subject) {
        Some(mid) => q.apply(&mid),
        None => r.apply(subject),
    })
}

/// Non-deterministic (inclusive) choice: apply `p` to the subject and `q` to
/// the original subject. When both succeed the result is `q`'s; when exactly
/// one succeeds its result is kept; fail only when both fail.
pub fn inclusive(p: Strategy, q: Strategy) -> Strategy {
    let name = format!("({} + {})", p.name(), q.name());
    Strategy::new(name, move |subject| {
        let from_p = p.apply(subject);
        let from_q = q.apply(subject);
        match (from_p, from_q) {
            (_, Some(result)) => Some(result),
            (Some(result), None) => Some(result),
            (None, None) => None,
        }
    })
}


#[cfg(test)]
#[path = "tests/strategy.rs"]
mod tests;
