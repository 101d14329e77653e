//! Rule builders - lift ordinary functions and pattern matches into
//! strategies.
//!
//! Partiality is expressed with `Option`: a builder's function returning
//! `None` means the subject did not match, which surfaces as strategy
//! failure, never as an error. The typed builders treat a wrong-type
//! subject the same way.

use crate::emit::{Emitter, StdoutEmitter};
use crate::rewritable::Rewritable;
use crate::strategy::Strategy;
use crate::term::Term;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::debug as trace_debug;

/// Lift a partial function into a strategy: succeed with `f`'s result when
/// the subject matches.
pub fn rule(f: impl Fn(&Term) -> Option<Term> + Send + Sync + 'static) -> Strategy {
    Strategy::new("rule", f)
}

/// Lift a total function into a strategy that always succeeds.
pub fn rulef(f: impl Fn(&Term) -> Term + Send + Sync + 'static) -> Strategy {
    Strategy::new("rulef", move |subject| Some(f(subject)))
}

/// Lift a partial function yielding a strategy; on a match the produced
/// strategy is applied to the subject.
pub fn rulefs(f: impl Fn(&Term) -> Option<Strategy> + Send + Sync + 'static) -> Strategy {
    Strategy::new("rulefs", move |subject| f(subject)?.apply(subject))
}

/// Lift a partial function whose body itself decides success: the subject
/// must match and the body must yield `Some`.
pub fn strategy(f: impl Fn(&Term) -> Option<Option<Term>> + Send + Sync + 'static) -> Strategy {
    Strategy::new("strategy", move |subject| f(subject).flatten())
}

/// Lift a total function into `Option` directly.
pub fn strategyf(f: impl Fn(&Term) -> Option<Term> + Send + Sync + 'static) -> Strategy {
    Strategy::new("strategyf", f)
}

/// Always succeed with `t`, ignoring the subject.
pub fn build(t: Term) -> Strategy {
    Strategy::new("build", move |_| Some(t.clone()))
}

/// Succeed (with `t`) only when the subject equals `t`.
pub fn term(t: Term) -> Strategy {
    Strategy::new("term", move |subject| {
        if *subject == t {
            Some(t.clone())
        } else {
            None
        }
    })
}

/// Succeed with the option's payload; fail on `None`.
pub fn option(o: Option<Term>) -> Strategy {
    Strategy::new("option", move |_| o.clone())
}

/// Run a partial side effect; succeed with the unchanged subject when it
/// matches.
pub fn query(f: impl Fn(&Term) -> Option<()> + Send + Sync + 'static) -> Strategy {
    Strategy::new("query", move |subject| {
        f(subject)?;
        Some(subject.clone())
    })
}

/// Run a total side effect; always succeed with the unchanged subject.
pub fn queryf(f: impl Fn(&Term) + Send + Sync + 'static) -> Strategy {
    Strategy::new("queryf", move |subject| {
        f(subject);
        Some(subject.clone())
    })
}

/// Typed rule: downcast the subject to a rewritable node of type `T` and
/// apply `f`. A wrong-type subject fails.
pub fn rule_node<T, F>(f: F) -> Strategy
where
    T: Rewritable + 'static,
    F: Fn(&T) -> Option<Term> + Send + Sync + 'static,
{
    Strategy::new("rule_node", move |subject| {
        f(subject.downcast_node::<T>()?)
    })
}

/// Typed query: downcast the subject to a rewritable node of type `T`, run
/// the side effect, and succeed with the unchanged subject. A wrong-type
/// subject fails.
pub fn query_node<T, F>(f: F) -> Strategy
where
    T: Rewritable + 'static,
    F: Fn(&T) -> Option<()> + Send + Sync + 'static,
{
    Strategy::new("query_node", move |subject| {
        f(subject.downcast_node::<T>()?)?;
        Some(subject.clone())
    })
}

/// Emit the message and the subject, then succeed unchanged. Writes to
/// standard output.
pub fn debug(msg: impl Into<String>) -> Strategy {
    debug_with(msg, Arc::new(StdoutEmitter))
}

/// As [`debug`], reporting through an explicit emitter.
pub fn debug_with(msg: impl Into<String>, emitter: Arc<dyn Emitter>) -> Strategy {
    let msg = msg.into();
    Strategy::new("debug", move |subject| {
        emitter.emitln(&format!("{msg}: {subject}"));
        Some(subject.clone())
    })
}

/// Apply `s` and report its outcome: on success the message, subject, and
/// result; on failure the message and subject. Writes to standard output.
pub fn log(s: Strategy, msg: impl Into<String>) -> Strategy {
    log_with(s, msg, Arc::new(StdoutEmitter))
}

/// As [`log`], reporting through an explicit emitter.
pub fn log_with(s: Strategy, msg: impl Into<String>, emitter: Arc<dyn Emitter>) -> Strategy {
    let msg = msg.into();
    let name = format!("log({})", s.name());
    Strategy::new(name, move |subject| match s.apply(subject) {
        Some(result) => {
            emitter.emitln(&format!("{msg} succeeded on {subject} producing {result}"));
            Some(result)
        }
        None => {
            emitter.emitln(&format!("{msg} failed on {subject}"));
            None
        }
    })
}

/// Apply `s` and report only when it fails. Writes to standard output.
pub fn logfail(s: Strategy, msg: impl Into<String>) -> Strategy {
    logfail_with(s, msg, Arc::new(StdoutEmitter))
}

/// As [`logfail`], reporting through an explicit emitter.
pub fn logfail_with(s: Strategy, msg: impl Into<String>, emitter: Arc<dyn Emitter>) -> Strategy {
    let msg = msg.into();
    let name = format!("logfail({})", s.name());
    Strategy::new(name, move |subject| match s.apply(subject) {
        Some(result) => Some(result),
        None => {
            emitter.emitln(&format!("{msg} failed on {subject}"));
            None
        }
    })
}

/// Memoize `s` per subject.
///
/// The cache is keyed by the subject's structural hash and serializes
/// insertions through a mutex; the lock is not held while `s` runs, so two
/// threads may duplicate work but never observe an incorrect result.
pub fn memo(s: Strategy) -> Strategy {
    let cache: Mutex<HashMap<Term, Option<Term>>> = Mutex::new(HashMap::new());
    let name = format!("memo({})", s.name());
    Strategy::new(name, move |subject| {
        if let Some(hit) = cache.lock().get(subject).cloned() {
            #[cfg(feature = "tracing")]
            trace_debug!(subject = %subject, "memo_hit");
            return hit;
        }
        let result = s.apply(subject);
        cache.lock().insert(subject.clone(), result.clone());
        result
    })
}


#[cfg(test)]
#[path = "tests/rules.rs"]
mod tests;
