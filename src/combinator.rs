//! Library combinators - compound traversals and control flow built by
//! recursive composition of the core and the one-level traversals.
//!
//! Recursive definitions go through [`Strategy::lazily`], so constructing a
//! combinator never expands it; each level of the expansion is forced the
//! first time a traversal reaches it.

use crate::strategy::{choice, fail, guarded, id, inclusive, seq, Strategy};
use crate::term::Term;
use crate::traversal::{all, one, some};
use std::sync::Arc;

/// A stop condition for the `*_s` traversal variants: given the recursive
/// continuation, produce the strategy to run instead of descending.
pub type StopFn = Arc<dyn Fn(Strategy) -> Strategy + Send + Sync>;

/// Apply `s`; on failure succeed with the unchanged subject.
pub fn attempt(s: Strategy) -> Strategy {
    choice(s, id())
}

/// Apply `s` at the subject and then at every descendant, top-down.
pub fn topdown(s: Strategy) -> Strategy {
    Strategy::lazily("topdown", move || {
        seq(s.clone(), all(topdown(s.clone())))
    })
}

/// Apply `s` at every descendant and then at the subject, bottom-up.
pub fn bottomup(s: Strategy) -> Strategy {
    Strategy::lazily("bottomup", move || {
        seq(all(bottomup(s.clone())), s.clone())
    })
}

/// Apply `s` on the way down and again on the way up.
pub fn downup(s: Strategy) -> Strategy {
    Strategy::lazily("downup", move || {
        seq(s.clone(), seq(all(downup(s.clone())), s.clone()))
    })
}

/// Apply `s1` on the way down and `s2` on the way up.
pub fn downup2(s1: Strategy, s2: Strategy) -> Strategy {
    Strategy::lazily("downup2", move || {
        seq(
            s1.clone(),
            seq(all(downup2(s1.clone(), s2.clone())), s2.clone()),
        )
    })
}

/// Top-down application of `s` with a stop condition: at each node, after
/// `s` succeeds, `stop` may take over instead of the descent into children.
pub fn topdown_s<F>(s: Strategy, stop: F) -> Strategy
where
    F: Fn(Strategy) -> Strategy + Send + Sync + 'static,
{
    topdown_s_rec(s, Arc::new(stop))
}

fn topdown_s_rec(s: Strategy, stop: StopFn) -> Strategy {
    Strategy::lazily("topdownS", move || {
        let rec = topdown_s_rec(s.clone(), stop.clone());
        seq(s.clone(), choice(stop(rec.clone()), all(rec)))
    })
}

/// Bottom-up application of `s` with a stop condition guarding the descent.
pub fn bottomup_s<F>(s: Strategy, stop: F) -> Strategy
where
    F: Fn(Strategy) -> Strategy + Send + Sync + 'static,
{
    bottomup_s_rec(s, Arc::new(stop))
}

fn bottomup_s_rec(s: Strategy, stop: StopFn) -> Strategy {
    Strategy::lazily("bottomupS", move || {
        let rec = bottomup_s_rec(s.clone(), stop.clone());
        seq(choice(stop(rec.clone()), all(rec)), s.clone())
    })
}

/// [`downup`] with a stop condition guarding the descent.
pub fn downup_s<F>(s: Strategy, stop: F) -> Strategy
where
    F: Fn(Strategy) -> Strategy + Send + Sync + 'static,
{
    downup_s_rec(s, Arc::new(stop))
}

fn downup_s_rec(s: Strategy, stop: StopFn) -> Strategy {
    Strategy::lazily("downupS", move || {
        let rec = downup_s_rec(s.clone(), stop.clone());
        seq(
            s.clone(),
            seq(choice(stop(rec.clone()), all(rec)), s.clone()),
        )
    })
}

/// Apply `s` at the outermost nodes where it succeeds, not descending past
/// a success.
pub fn alltd(s: Strategy) -> Strategy {
    Strategy::lazily("alltd", move || {
        choice(s.clone(), all(alltd(s.clone())))
    })
}

/// Bottom-up dual of [`alltd`]: try the descent into children first and
/// fall back to `s` at the node only where the descent fails.
pub fn allbu(s: Strategy) -> Strategy {
    Strategy::lazily("allbu", move || {
        choice(all(allbu(s.clone())), s.clone())
    })
}

/// Like [`alltd`], folding `s2` over the rebuilt node where `s1` did not
/// apply.
pub fn alltdfold(s1: Strategy, s2: Strategy) -> Strategy {
    Strategy::lazily("alltdfold", move || {
        choice(
            s1.clone(),
            seq(all(alltdfold(s1.clone(), s2.clone())), s2.clone()),
        )
    })
}

/// Apply `s1` at the outermost nodes where it succeeds (descending where it
/// does not), then `s2` everywhere on the way up.
pub fn alldownup2(s1: Strategy, s2: Strategy) -> Strategy {
    Strategy::lazily("alldownup2", move || {
        seq(
            choice(s1.clone(), all(alldownup2(s1.clone(), s2.clone()))),
            s2.clone(),
        )
    })
}

/// Apply `s` once, at the outermost (leftmost topmost) node where it
/// succeeds.
pub fn oncetd(s: Strategy) -> Strategy {
    Strategy::lazily("oncetd", move || {
        choice(s.clone(), one(oncetd(s.clone())))
    })
}

/// Apply `s` once, at the innermost (leftmost deepest) node where it
/// succeeds.
pub fn oncebu(s: Strategy) -> Strategy {
    Strategy::lazily("oncebu", move || {
        choice(one(oncebu(s.clone())), s.clone())
    })
}

/// Apply `s` at one or more outermost nodes where it succeeds.
pub fn sometd(s: Strategy) -> Strategy {
    Strategy::lazily("sometd", move || {
        choice(s.clone(), some(sometd(s.clone())))
    })
}

/// Apply `s` at one or more innermost nodes where it succeeds.
pub fn somebu(s: Strategy) -> Strategy {
    Strategy::lazily("somebu", move || {
        choice(some(somebu(s.clone())), s.clone())
    })
}

/// Top-down/bottom-up sweep that requires `s` to apply somewhere along
/// every path it commits to.
pub fn somedownup(s: Strategy) -> Strategy {
    Strategy::lazily("somedownup", move || {
        let rec = somedownup(s.clone());
        choice(
            seq(s.clone(), seq(all(rec.clone()), attempt(s.clone()))),
            choice(some(rec), attempt(s.clone())),
        )
    })
}

/// Fully normalize: exhaustively apply `s` starting from the innermost
/// redexes.
pub fn innermost(s: Strategy) -> Strategy {
    Strategy::lazily("innermost", move || {
        bottomup(attempt(seq(s.clone(), innermost(s.clone()))))
    })
}

/// Normalize by repeatedly rewriting the leftmost innermost redex.
pub fn innermost2(s: Strategy) -> Strategy {
    repeat(oncebu(s))
}

/// Normalize by repeatedly rewriting the leftmost outermost redex.
pub fn outermost(s: Strategy) -> Strategy {
    repeat(oncetd(s))
}

/// Normalize by repeatedly rewriting some innermost redexes in parallel.
pub fn reduce(s: Strategy) -> Strategy {
    repeat(somebu(s))
}

/// Apply `s` at the outermost nodes where it succeeds, repeatedly below a
/// success; succeeds only when `s` applied somewhere.
pub fn manytd(s: Strategy) -> Strategy {
    Strategy::lazily("manytd", move || {
        let rec = manytd(s.clone());
        choice(seq(s.clone(), all(attempt(rec.clone()))), some(rec))
    })
}

/// Bottom-up counterpart of [`manytd`].
pub fn manybu(s: Strategy) -> Strategy {
    Strategy::lazily("manybu", move || {
        let rec = manybu(s.clone());
        choice(seq(some(rec), attempt(s.clone())), s.clone())
    })
}

/// Apply `s` level by level, breadth-first, starting below the subject.
pub fn breadthfirst(s: Strategy) -> Strategy {
    Strategy::lazily("breadthfirst", move || {
        seq(all(s.clone()), all(breadthfirst(s.clone())))
    })
}

/// Apply `s` at every node satisfying `isleaf`, descending everywhere else.
pub fn leaves(s: Strategy, isleaf: Strategy) -> Strategy {
    Strategy::lazily("leaves", move || {
        choice(
            seq(isleaf.clone(), s.clone()),
            all(leaves(s.clone(), isleaf.clone())),
        )
    })
}

/// As [`leaves`], but `skip` may divert the descent at non-leaf nodes.
pub fn leaves_skip<F>(s: Strategy, isleaf: Strategy, skip: F) -> Strategy
where
    F: Fn(Strategy) -> Strategy + Send + Sync + 'static,
{
    leaves_skip_rec(s, isleaf, Arc::new(skip))
}

fn leaves_skip_rec(s: Strategy, isleaf: Strategy, skip: StopFn) -> Strategy {
    Strategy::lazily("leaves", move || {
        let rec = leaves_skip_rec(s.clone(), isleaf.clone(), skip.clone());
        choice(
            seq(isleaf.clone(), s.clone()),
            choice(skip(rec.clone()), all(rec)),
        )
    })
}

/// Attempt `s` at every node, top-down.
pub fn everywheretd(s: Strategy) -> Strategy {
    topdown(attempt(s))
}

/// Attempt `s` at every node, bottom-up.
pub fn everywherebu(s: Strategy) -> Strategy {
    bottomup(attempt(s))
}

/// Synonym for [`everywheretd`].
pub fn everywhere(s: Strategy) -> Strategy {
    everywheretd(s)
}

/// Lift `s` element-wise over a sequence term: fail on non-sequences and on
/// the first element failure; return the subject when nothing changed.
pub fn map_s(s: Strategy) -> Strategy {
    Strategy::new("map", move |subject| {
        let items = subject.as_seq()?;
        let mut rewritten = Vec::with_capacity(items.len());
        let mut changed = false;
        for item in items {
            let out = s.apply(item)?;
            changed |= !out.same(item);
            rewritten.push(out);
        }
        if changed {
            Some(Term::seq(rewritten))
        } else {
            Some(subject.clone())
        }
    })
}

/// Apply `s` as often as possible; always succeeds.
pub fn repeat(s: Strategy) -> Strategy {
    Strategy::lazily("repeat", move || {
        choice(seq(s.clone(), repeat(s.clone())), id())
    })
}

/// Apply `s` exactly `n` times, failing if any application fails.
pub fn repeat_n(s: Strategy, n: usize) -> Strategy {
    let mut acc = id();
    for _ in 0..n {
        acc = seq(s.clone(), acc);
    }
    acc
}

/// Apply `s` at least once, then as often as possible.
pub fn repeat1(s: Strategy) -> Strategy {
    seq(s.clone(), repeat(s))
}

/// Apply `s` repeatedly until `r` succeeds on the current term; `r` is a
/// test and does not transform.
pub fn repeatuntil(s: Strategy, r: Strategy) -> Strategy {
    Strategy::lazily("repeatuntil", move || {
        seq(
            s.clone(),
            choice(test(r.clone()), repeatuntil(s.clone(), r.clone())),
        )
    })
}

/// As long as `r` succeeds, apply `s` to its result; always succeeds.
pub fn loop_s(r: Strategy, s: Strategy) -> Strategy {
    Strategy::lazily("loop", move || {
        choice(
            seq(r.clone(), seq(s.clone(), loop_s(r.clone(), s.clone()))),
            id(),
        )
    })
}

/// Apply `s` once, then [`loop_s`] with condition `r`.
pub fn doloop(s: Strategy, r: Strategy) -> Strategy {
    seq(s.clone(), loop_s(r, s))
}

/// While the test `r` fails, apply `s`; succeeds once `r` holds.
pub fn loopnot(r: Strategy, s: Strategy) -> Strategy {
    Strategy::lazily("loopnot", move || {
        choice(
            where_s(r.clone()),
            seq(s.clone(), loopnot(r.clone(), s.clone())),
        )
    })
}

/// Sequence the strategies `f(low)`, `f(low+1)`, ..., `f(high)`; the
/// identity when the range is empty.
pub fn loopiter<F>(f: F, low: i64, high: i64) -> Strategy
where
    F: Fn(i64) -> Strategy,
{
    let mut acc = id();
    let mut i = high;
    while i >= low {
        acc = seq(f(i), acc);
        i -= 1;
    }
    acc
}

/// Apply `s`; on success run the finalizer `f` as a test and keep `s`'s
/// result; on failure run `f` and fail anyway.
pub fn lastly(s: Strategy, f: Strategy) -> Strategy {
    guarded(s, where_s(f.clone()), seq(where_s(f), fail()))
}

/// Apply `s`; on failure run the restoring action `r` and fail anyway.
pub fn restore(s: Strategy, r: Strategy) -> Strategy {
    choice(s, seq(r, fail()))
}

/// Apply `s` then `r` on success; on failure run `r` and fail anyway.
pub fn restorealways(s: Strategy, r: Strategy) -> Strategy {
    choice(seq(s, r.clone()), seq(r, fail()))
}

/// Test `s` on the subject for success, discarding its transformation.
pub fn where_s(s: Strategy) -> Strategy {
    Strategy::new(format!("where({})", s.name()), move |subject| {
        s.apply(subject)?;
        Some(subject.clone())
    })
}

/// Synonym for [`where_s`].
pub fn test(s: Strategy) -> Strategy {
    where_s(s)
}

/// Succeed with the unchanged subject exactly when `s` fails.
pub fn not(s: Strategy) -> Strategy {
    guarded(s, fail(), id())
}

/// Succeed (unchanged) when both `s1` and `s2` succeed on the subject; `s2`
/// is only tested when `s1` succeeds.
pub fn and(s1: Strategy, s2: Strategy) -> Strategy {
    guarded(where_s(s1), where_s(s2), fail())
}

/// Succeed (unchanged) when either `s1` or `s2` succeeds on the subject;
/// both are always tested, so their side effects run.
pub fn or(s1: Strategy, s2: Strategy) -> Strategy {
    guarded(where_s(s1), attempt(where_s(s2.clone())), where_s(s2))
}

/// Inclusive or over transformations: apply both to the subject, preferring
/// `s2`'s result; fail only when both fail.
pub fn ior(s1: Strategy, s2: Strategy) -> Strategy {
    inclusive(s1, s2)
}


#[cfg(test)]
#[path = "tests/combinator.rs"]
mod tests;
