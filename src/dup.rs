//! Duplicator - rebuild a node of the exact runtime shape from replacement
//! children.
//!
//! The traversals are responsible for skipping duplication when no child
//! changed; `dup` itself always rebuilds (except for canonical singletons).
//! A child-count or child-kind mismatch is a programmer error and panics
//! with a message naming the constructor and the offered children.

use crate::term::{Term, TermMap};

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Rebuild `original` with `children` in place of its own children.
///
/// Zero-arity products and zero-arity rewritable nodes are canonical
/// singletons: the original instance is returned unchanged. Atoms accept
/// only an empty children array.
pub fn dup(original: &Term, children: &[Term]) -> Term {
    match original {
        Term::Node(n) => {
            if n.arity() != children.len() {
                panic!(
                    "duplication failed for node {:?}: expected {} children, got {} ({})",
                    n,
                    n.arity(),
                    children.len(),
                    render_children(children),
                );
            }
            if n.arity() == 0 {
                return original.clone();
            }
            #[cfg(feature = "tracing")]
            trace!(arity = n.arity(), "dup_node");
            n.reconstruct(children)
        }
        Term::Product(p) => {
            if p.fields.len() != children.len() {
                panic!(
                    "duplication failed for constructor {} with {} children: expected {} ({})",
                    p.tag,
                    children.len(),
                    p.fields.len(),
                    render_children(children),
                );
            }
            if p.fields.is_empty() {
                return original.clone();
            }
            Term::product(p.tag, children.iter().cloned())
        }
        Term::Map(_) => {
            let mut rebuilt = TermMap::with_capacity(children.len());
            for child in children {
                let (k, v) = child.as_pair().unwrap_or_else(|| {
                    panic!(
                        "duplication failed for map: child {child} is not a key-value pair"
                    )
                });
                rebuilt.insert(k.clone(), v.clone());
            }
            Term::Map(std::sync::Arc::new(rebuilt))
        }
        Term::Seq(_) => Term::seq(children.iter().cloned()),
        atom => {
            if !children.is_empty() {
                panic!(
                    "duplication failed for atom {atom}: atoms take no children, got {} ({})",
                    children.len(),
                    render_children(children),
                );
            }
            atom.clone()
        }
    }
}

fn render_children(children: &[Term]) -> String {
    let rendered: Vec<String> = children.iter().map(|c| c.to_string()).collect();
    rendered.join(", ")
}


#[cfg(test)]
#[path = "tests/dup.rs"]
mod tests;
