//! The host-extension capability for generic decomposition and reassembly.
//!
//! A type implementing [`Rewritable`] plugs its values into the engine as
//! first-shape terms: the traversals see `deconstruct`'s children and rebuild
//! through `reconstruct` without knowing the concrete constructor.

use crate::term::Term;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;

/// A user-defined node the engine can take apart and put back together.
///
/// Obligations on implementors:
/// - `arity() == deconstruct().len()` for every value
/// - `reconstruct` accepts exactly `arity` children and returns a
///   [`Term::Node`] wrapping a value of the same concrete type
/// - structural equality of `Node` terms compares the concrete type and the
///   deconstructed children; state not exposed through `deconstruct` does
///   not participate
pub trait Rewritable: fmt::Debug + fmt::Display + Send + Sync {
    /// Number of children.
    fn arity(&self) -> usize;

    /// The children, in order.
    fn deconstruct(&self) -> SmallVec<[Term; 4]>;

    /// Rebuild a same-type node from replacement children.
    ///
    /// The duplicator checks the child count before dispatching here, so an
    /// implementation may index `children` freely up to `arity`.
    fn reconstruct(&self, children: &[Term]) -> Term;

    /// Upcast for the typed-builder downcasts.
    fn as_any(&self) -> &dyn Any;
}
