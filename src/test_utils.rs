use crate::rewritable::Rewritable;
use crate::strategy::Strategy;
use crate::term::{Tag, Term};
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;

pub(crate) fn num(n: i64) -> Term {
    Term::product1(Tag::new("Num"), Term::from(n))
}

pub(crate) fn add(l: Term, r: Term) -> Term {
    Term::product2(Tag::new("Add"), l, r)
}

pub(crate) fn sub(l: Term, r: Term) -> Term {
    Term::product2(Tag::new("Sub"), l, r)
}

pub(crate) fn mul(l: Term, r: Term) -> Term {
    Term::product2(Tag::new("Mul"), l, r)
}

pub(crate) fn var(name: &str) -> Term {
    Term::product1(Tag::new("Var"), Term::str(name))
}

pub(crate) fn as_num(t: &Term) -> Option<i64> {
    let p = t.as_product()?;
    if p.tag == Tag::new("Num") && p.fields.len() == 1 {
        p.fields[0].as_int()
    } else {
        None
    }
}

pub(crate) fn as_var(t: &Term) -> Option<&str> {
    let p = t.as_product()?;
    if p.tag == Tag::new("Var") && p.fields.len() == 1 {
        p.fields[0].as_str()
    } else {
        None
    }
}

fn as_binop(t: &Term) -> Option<(Tag, &Term, &Term)> {
    let p = t.as_product()?;
    if p.fields.len() == 2 {
        Some((p.tag, &p.fields[0], &p.fields[1]))
    } else {
        None
    }
}

/// Constant folding over Add/Sub/Mul of two Num leaves.
pub(crate) fn fold_rule() -> Strategy {
    crate::rules::rule(|t| {
        let (tag, l, r) = as_binop(t)?;
        let (a, b) = (as_num(l)?, as_num(r)?);
        let folded = if tag == Tag::new("Add") {
            a + b
        } else if tag == Tag::new("Sub") {
            a - b
        } else if tag == Tag::new("Mul") {
            a * b
        } else {
            return None;
        };
        Some(num(folded))
    })
}

/// Rename Var("x") to Var("y").
pub(crate) fn rename_x_to_y() -> Strategy {
    crate::rules::rule(|t| {
        if as_var(t)? == "x" {
            Some(var("y"))
        } else {
            None
        }
    })
}

/// Sample rewritable node for exercising the user-extension arm.
#[derive(Debug)]
pub(crate) struct Branch {
    pub(crate) label: i64,
    pub(crate) kids: Vec<Term>,
}

impl Branch {
    pub(crate) fn term(label: i64, kids: Vec<Term>) -> Term {
        Term::node(Branch { label, kids })
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Branch#{}", self.label)?;
        for kid in &self.kids {
            write!(f, " {kid}")?;
        }
        write!(f, ")")
    }
}

impl Rewritable for Branch {
    fn arity(&self) -> usize {
        self.kids.len()
    }

    fn deconstruct(&self) -> SmallVec<[Term; 4]> {
        self.kids.iter().cloned().collect()
    }

    fn reconstruct(&self, children: &[Term]) -> Term {
        Branch::term(self.label, children.to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Zero-arity rewritable node; a canonical singleton for the duplicator.
#[derive(Debug)]
pub(crate) struct Leaf;

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leaf")
    }
}

impl Rewritable for Leaf {
    fn arity(&self) -> usize {
        0
    }

    fn deconstruct(&self) -> SmallVec<[Term; 4]> {
        SmallVec::new()
    }

    fn reconstruct(&self, _children: &[Term]) -> Term {
        Term::node(Leaf)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
