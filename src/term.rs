use crate::rewritable::Rewritable;
use hashbrown::HashMap;
use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Process-wide interner for constructor tags.
static TAGS: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// An interned constructor name.
///
/// Guarantees:
/// - Same string always produces the same Tag
/// - Different strings always produce different Tags
/// - A Tag can be resolved back to its string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Spur);

impl Tag {
    /// Intern a constructor name, returning its Tag.
    pub fn new(name: &str) -> Self {
        Tag(TAGS.get_or_intern(name))
    }

    /// Resolve the Tag back to its string representation.
    pub fn name(self) -> &'static str {
        TAGS.resolve(&self.0)
    }

    /// The distinguished tag used for key-value pairs of map-shaped terms.
    pub fn pair() -> Self {
        static PAIR: Lazy<Tag> = Lazy::new(|| Tag::new("Pair"));
        *PAIR
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged record: constructor tag plus ordered fields.
#[derive(Debug, Clone)]
pub struct Product {
    pub tag: Tag,
    pub fields: SmallVec<[Term; 4]>,
}

/// Keyed mapping from term to term.
pub type TermMap = HashMap<Term, Term>;

/// The universe of values the engine manipulates.
///
/// Four shapes carry children (tested in this fixed order: rewritable node,
/// product, keyed map, ordered sequence); every other value is an opaque
/// atom with zero children. Heap-backed arms are `Arc`-shared, so `Clone`
/// is cheap and preserves pointer identity for no-change detection.
#[derive(Debug, Clone)]
pub enum Term {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
    Product(Arc<Product>),
    Seq(Arc<Vec<Term>>),
    Map(Arc<TermMap>),
    Node(Arc<dyn Rewritable>),
}

/// The detected shape of a term, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rewritable,
    Product,
    Map,
    Seq,
    Atom,
}

impl Term {
    /// Build a product term from a tag and its fields.
    pub fn product(tag: Tag, fields: impl IntoIterator<Item = Term>) -> Term {
        Term::Product(Arc::new(Product {
            tag,
            fields: fields.into_iter().collect(),
        }))
    }

    /// Build a nullary (0-arity) product.
    pub fn product0(tag: Tag) -> Term {
        Term::product(tag, [])
    }

    /// Build a unary (1-arity) product.
    pub fn product1(tag: Tag, child: Term) -> Term {
        Term::product(tag, [child])
    }

    /// Build a binary (2-arity) product.
    pub fn product2(tag: Tag, left: Term, right: Term) -> Term {
        Term::product(tag, [left, right])
    }

    /// Build an ordered sequence term.
    pub fn seq(items: impl IntoIterator<Item = Term>) -> Term {
        Term::Seq(Arc::new(items.into_iter().collect()))
    }

    /// Build a keyed-map term.
    pub fn map(entries: impl IntoIterator<Item = (Term, Term)>) -> Term {
        Term::Map(Arc::new(entries.into_iter().collect()))
    }

    /// Build a string atom.
    pub fn str(s: impl AsRef<str>) -> Term {
        Term::Str(Arc::from(s.as_ref()))
    }

    /// Wrap a user-defined rewritable node.
    pub fn node(n: impl Rewritable + 'static) -> Term {
        Term::Node(Arc::new(n))
    }

    /// The key-value pair materialization used for map children.
    pub fn pair(key: Term, value: Term) -> Term {
        Term::product2(Tag::pair(), key, value)
    }

    /// View a term as a map child pair, if it is one.
    pub fn as_pair(&self) -> Option<(&Term, &Term)> {
        match self {
            Term::Product(p) if p.tag == Tag::pair() && p.fields.len() == 2 => {
                Some((&p.fields[0], &p.fields[1]))
            }
            _ => None,
        }
    }

    /// Detect the term's shape. Detection order is fixed: rewritable node,
    /// product, keyed map, ordered sequence, then atom.
    pub fn shape(&self) -> Shape {
        match self {
            Term::Node(_) => Shape::Rewritable,
            Term::Product(_) => Shape::Product,
            Term::Map(_) => Shape::Map,
            Term::Seq(_) => Shape::Seq,
            _ => Shape::Atom,
        }
    }

    /// List the term's children under its detected shape, in child order.
    ///
    /// Map children are key-value pairs materialized with [`Term::pair`];
    /// their order is the map's own iteration order, which is consistent
    /// within a single traversal. Atoms have no children.
    pub fn children(&self) -> SmallVec<[Term; 4]> {
        match self {
            Term::Node(n) => n.deconstruct(),
            Term::Product(p) => p.fields.clone(),
            Term::Map(m) => m
                .iter()
                .map(|(k, v)| Term::pair(k.clone(), v.clone()))
                .collect(),
            Term::Seq(items) => items.iter().cloned().collect(),
            _ => SmallVec::new(),
        }
    }

    /// No-change detector: pointer equality for heap-backed arms,
    /// structural equality for atoms. Survives `Clone`.
    pub fn same(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => a == b,
            (Term::Bool(a), Term::Bool(b)) => a == b,
            (Term::Str(a), Term::Str(b)) => Arc::ptr_eq(a, b) || a == b,
            (Term::Product(a), Term::Product(b)) => Arc::ptr_eq(a, b),
            (Term::Seq(a), Term::Seq(b)) => Arc::ptr_eq(a, b),
            (Term::Map(a), Term::Map(b)) => Arc::ptr_eq(a, b),
            (Term::Node(a), Term::Node(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// View as an integer atom.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// View as a boolean atom.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Term::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// View as a string atom.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            _ => None,
        }
    }

    /// View as a product.
    pub fn as_product(&self) -> Option<&Product> {
        match self {
            Term::Product(p) => Some(p),
            _ => None,
        }
    }

    /// View as an ordered sequence.
    pub fn as_seq(&self) -> Option<&[Term]> {
        match self {
            Term::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// View as a keyed map.
    pub fn as_map(&self) -> Option<&TermMap> {
        match self {
            Term::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View as a rewritable node of concrete type `T`.
    ///
    /// A miss (wrong type, or not a node at all) is a strategy failure for
    /// the typed builders, never an error.
    pub fn downcast_node<T: Rewritable + 'static>(&self) -> Option<&T> {
        match self {
            Term::Node(n) => n.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Int(i)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::str(s)
    }
}

fn map_eq(a: &TermMap, b: &TermMap) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
}

fn node_eq(a: &dyn Rewritable, b: &dyn Rewritable) -> bool {
    // Concrete type plus pairwise-equal children. State a node does not
    // expose through deconstruct does not participate in equality.
    a.as_any().type_id() == b.as_any().type_id()
        && a.arity() == b.arity()
        && a.deconstruct() == b.deconstruct()
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        if self.same(other) {
            return true;
        }
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => a == b,
            (Term::Bool(a), Term::Bool(b)) => a == b,
            (Term::Str(a), Term::Str(b)) => a == b,
            (Term::Product(a), Term::Product(b)) => a.tag == b.tag && a.fields == b.fields,
            (Term::Seq(a), Term::Seq(b)) => a == b,
            (Term::Map(a), Term::Map(b)) => map_eq(a, b),
            (Term::Node(a), Term::Node(b)) => node_eq(&**a, &**b),
            _ => false,
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Term::Int(i) => i.hash(state),
            Term::Bool(b) => b.hash(state),
            Term::Str(s) => s.hash(state),
            Term::Product(p) => {
                p.tag.hash(state);
                p.fields.hash(state);
            }
            Term::Seq(items) => items.hash(state),
            Term::Map(m) => {
                // Commutative combination so the hash is independent of
                // iteration order, matching order-independent map equality.
                state.write_usize(m.len());
                let mut acc: u64 = 0;
                for (k, v) in m.iter() {
                    let mut h = FxHasher::default();
                    k.hash(&mut h);
                    v.hash(&mut h);
                    acc = acc.wrapping_add(h.finish());
                }
                state.write_u64(acc);
            }
            Term::Node(n) => {
                n.as_any().type_id().hash(state);
                n.deconstruct().hash(state);
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Int(i) => write!(f, "{i}"),
            Term::Bool(b) => write!(f, "{b}"),
            Term::Str(s) => write!(f, "{s:?}"),
            Term::Product(p) => {
                if p.fields.is_empty() {
                    write!(f, "{}", p.tag)
                } else {
                    write!(f, "({}", p.tag)?;
                    for field in &p.fields {
                        write!(f, " {field}")?;
                    }
                    write!(f, ")")
                }
            }
            Term::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Term::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Term::Node(n) => write!(f, "{n}"),
        }
    }
}


#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
