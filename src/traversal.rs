//! One-level generic traversals - apply a strategy across the immediate
//! children of a term.
//!
//! Each traversal lists children under the subject's detected shape
//! (rewritable node, product, keyed map, ordered sequence; atoms have none)
//! and visits them in child order. A traversal that succeeds without
//! changing any child returns the original subject, preserving sharing;
//! rebuilding goes through the duplicator only when something changed.

use crate::dup::dup;
use crate::strategy::Strategy;
use crate::term::Term;
use smallvec::SmallVec;

/// Apply `s` to the i-th child (1-indexed). Fails when `i` is out of range
/// or `s` fails on that child; otherwise rebuilds with the replaced child,
/// or returns the subject when the child came back unchanged.
pub fn child(i: usize, s: Strategy) -> Strategy {
    Strategy::new(format!("child({i})"), move |subject| {
        let kids = subject.children();
        if i < 1 || i > kids.len() {
            return None;
        }
        let idx = i - 1;
        let rewritten = s.apply(&kids[idx])?;
        if rewritten.same(&kids[idx]) {
            return Some(subject.clone());
        }
        let mut replaced = kids;
        replaced[idx] = rewritten;
        Some(dup(subject, &replaced))
    })
}

/// Apply `s` to every child in order; fail as soon as any child fails.
/// Succeeds on terms with no children.
pub fn all(s: Strategy) -> Strategy {
    Strategy::new("all", move |subject| {
        let kids = subject.children();
        let mut rewritten: SmallVec<[Term; 4]> = SmallVec::with_capacity(kids.len());
        let mut changed = false;
        for kid in &kids {
            let out = s.apply(kid)?;
            changed |= !out.same(kid);
            rewritten.push(out);
        }
        if changed {
            Some(dup(subject, &rewritten))
        } else {
            Some(subject.clone())
        }
    })
}

/// Apply `s` to the children in order, stopping at the first success;
/// later children are left untouched. Fails when `s` fails on every child.
pub fn one(s: Strategy) -> Strategy {
    Strategy::new("one", move |subject| {
        let kids = subject.children();
        for (idx, kid) in kids.iter().enumerate() {
            if let Some(out) = s.apply(kid) {
                if out.same(kid) {
                    return Some(subject.clone());
                }
                let mut replaced = kids.clone();
                replaced[idx] = out;
                return Some(dup(subject, &replaced));
            }
        }
        None
    })
}

/// Apply `s` to every child, keeping the children it fails on. Succeeds
/// when `s` succeeded on at least one child; returns the subject when no
/// child actually changed.
pub fn some(s: Strategy) -> Strategy {
    Strategy::new("some", move |subject| {
        let kids = subject.children();
        let mut rewritten: SmallVec<[Term; 4]> = SmallVec::with_capacity(kids.len());
        let mut succeeded = false;
        let mut changed = false;
        for kid in &kids {
            match s.apply(kid) {
                Some(out) => {
                    succeeded = true;
                    changed |= !out.same(kid);
                    rewritten.push(out);
                }
                None => rewritten.push(kid.clone()),
            }
        }
        if !succeeded {
            return None;
        }
        if changed {
            Some(dup(subject, &rewritten))
        } else {
            Some(subject.clone())
        }
    })
}

/// Apply the k-th strategy to the k-th field of a product. Fails on
/// non-products, on an arity mismatch, and on any per-field failure.
pub fn congruence(ss: Vec<Strategy>) -> Strategy {
    Strategy::new("congruence", move |subject| {
        let product = subject.as_product()?;
        if ss.len() != product.fields.len() {
            return None;
        }
        let mut rewritten: SmallVec<[Term; 4]> = SmallVec::with_capacity(ss.len());
        let mut changed = false;
        for (s, field) in ss.iter().zip(product.fields.iter()) {
            let out = s.apply(field)?;
            changed |= !out.same(field);
            rewritten.push(out);
        }
        if changed {
            Some(dup(subject, &rewritten))
        } else {
            Some(subject.clone())
        }
    })
}


#[cfg(test)]
#[path = "tests/traversal.rs"]
mod tests;
