//! Query aggregators - fold information out of a term without rewriting it.
//!
//! All aggregators visit every node top-down, left to right, starting with
//! the subject itself. Map entries are visited as key-value pairs in the
//! map's iteration order, then descended into.

use crate::term::Term;

fn visit<F: FnMut(&Term)>(t: &Term, f: &mut F) {
    f(t);
    for child in t.children() {
        visit(&child, f);
    }
}

/// Collect `f`'s result at every node where it is defined.
pub fn collect<T, F>(f: F) -> impl Fn(&Term) -> Vec<T>
where
    F: Fn(&Term) -> Option<T>,
{
    move |subject| {
        let mut out = Vec::new();
        visit(subject, &mut |node| {
            if let Some(v) = f(node) {
                out.push(v);
            }
        });
        out
    }
}

/// Collect and concatenate the collections `f` yields at matching nodes.
pub fn collect_all<T, F>(f: F) -> impl Fn(&Term) -> Vec<T>
where
    F: Fn(&Term) -> Option<Vec<T>>,
{
    move |subject| {
        let mut out = Vec::new();
        visit(subject, &mut |node| {
            if let Some(vs) = f(node) {
                out.extend(vs);
            }
        });
        out
    }
}

/// Sum the integers `f` yields at matching nodes.
pub fn count<F>(f: F) -> impl Fn(&Term) -> i64
where
    F: Fn(&Term) -> Option<i64>,
{
    move |subject| {
        let mut total = 0;
        visit(subject, &mut |node| {
            if let Some(n) = f(node) {
                total += n;
            }
        });
        total
    }
}

/// Fold `f`'s per-node results with `combine`, starting from `v`.
pub fn everything<T, C, F>(v: T, combine: C, f: F) -> impl Fn(&Term) -> T
where
    T: Clone,
    C: Fn(T, T) -> T,
    F: Fn(&Term) -> Option<T>,
{
    move |subject| {
        let mut acc = Some(v.clone());
        visit(subject, &mut |node| {
            if let Some(x) = f(node) {
                let folded = combine(acc.take().expect("accumulator present"), x);
                acc = Some(folded);
            }
        });
        acc.expect("accumulator present")
    }
}

/// Paramorphism: `f` receives each subterm together with the results of
/// folding its children.
pub fn para<T, F>(f: &F, t: &Term) -> T
where
    F: Fn(&Term, Vec<T>) -> T,
{
    let folded: Vec<T> = t.children().iter().map(|child| para(f, child)).collect();
    f(t, folded)
}


#[cfg(test)]
#[path = "tests/query.rs"]
mod tests;
