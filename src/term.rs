//! The term model (spec.md §3 "Term").
//!
//! Every variant is a tagged, Arc-wrapped node carrying a precomputed
//! `Hash` of its own structure, so congruence checks and union-find
//! lookups never have to re-walk a subtree just to compare it.

use std::fmt;
use std::sync::Arc;

use crate::errors::err_partial;
use crate::hash::{hash_str, tag, Hash};
use crate::name::Name;

#[derive(Clone, PartialEq, Eq)]
pub struct Term(Arc<InnerTerm>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerTerm {
    Var { idx: usize, hash: Hash },
    Ref { name: Name, hash: Hash },
    Typ { hash: Hash },
    All {
        erased: bool,
        self_name: Name,
        bind_name: Name,
        bind_type: Term,
        body: Term,
        hash: Hash,
    },
    Lam {
        erased: bool,
        name: Name,
        body: Term,
        hash: Hash,
    },
    App {
        erased: bool,
        fun: Term,
        arg: Term,
        hash: Hash,
    },
    Let {
        name: Name,
        expr: Term,
        body: Term,
        hash: Hash,
    },
    Ann {
        done: bool,
        ty: Term,
        term: Term,
        hash: Hash,
    },
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Hashes by the precomputed content digest rather than walking the tree;
/// `Eq` (derived above, structural) still breaks ties on collision, so this
/// stays sound as a `HashMap`/`HashSet` key despite the digest only being
/// 32 bits wide.
impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash().0.hash(state)
    }
}

impl Term {
    pub fn hash(&self) -> Hash {
        match self.inner() {
            InnerTerm::Var { hash, .. }
            | InnerTerm::Ref { hash, .. }
            | InnerTerm::Typ { hash }
            | InnerTerm::All { hash, .. }
            | InnerTerm::Lam { hash, .. }
            | InnerTerm::App { hash, .. }
            | InnerTerm::Let { hash, .. }
            | InnerTerm::Ann { hash, .. } => *hash,
        }
    }

    pub fn inner(&self) -> &InnerTerm {
        &self.0
    }

    pub fn mk_var(idx: usize) -> Term {
        let hash = Hash(tag::VAR).combine(Hash(idx as u32));
        Term(Arc::new(InnerTerm::Var { idx, hash }))
    }

    pub fn mk_ref(name: Name) -> Term {
        let hash = Hash(tag::REF).combine(Hash(hash_str(name.as_str())));
        Term(Arc::new(InnerTerm::Ref { name, hash }))
    }

    pub fn mk_typ() -> Term {
        let hash = Hash(tag::TYP).combine(Hash::ZERO);
        Term(Arc::new(InnerTerm::Typ { hash }))
    }

    pub fn mk_all(
        erased: bool,
        self_name: Name,
        bind_name: Name,
        bind_type: Term,
        body: Term,
    ) -> Term {
        let hash = Hash(tag::ALL).combine(bind_type.hash()).combine(body.hash());
        Term(Arc::new(InnerTerm::All {
            erased,
            self_name,
            bind_name,
            bind_type,
            body,
            hash,
        }))
    }

    pub fn mk_lam(erased: bool, name: Name, body: Term) -> Term {
        let hash = Hash(tag::LAM).combine(body.hash());
        Term(Arc::new(InnerTerm::Lam { erased, name, body, hash }))
    }

    pub fn mk_app(erased: bool, fun: Term, arg: Term) -> Term {
        let hash = Hash(tag::APP).combine(fun.hash()).combine(arg.hash());
        Term(Arc::new(InnerTerm::App { erased, fun, arg, hash }))
    }

    pub fn mk_let(name: Name, expr: Term, body: Term) -> Term {
        let hash = Hash(tag::LET).combine(expr.hash()).combine(body.hash());
        Term(Arc::new(InnerTerm::Let { name, expr, body, hash }))
    }

    pub fn mk_ann(done: bool, ty: Term, term: Term) -> Term {
        let hash = Hash(tag::ANN).combine(ty.hash()).combine(term.hash());
        Term(Arc::new(InnerTerm::Ann { done, ty, term, hash }))
    }

    pub fn is_var(&self) -> bool {
        matches!(self.inner(), InnerTerm::Var { .. })
    }

    pub fn as_var(&self) -> Option<usize> {
        match self.inner() {
            InnerTerm::Var { idx, .. } => Some(*idx),
            _ => None,
        }
    }

    pub fn as_ref_name(&self) -> Option<&Name> {
        match self.inner() {
            InnerTerm::Ref { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_typ(&self) -> bool {
        matches!(self.inner(), InnerTerm::Typ { .. })
    }

    /// Partial accessor for the `All` constructor's fields; only ever called
    /// once the caller has already matched on `InnerTerm::All` or reduced a
    /// term it expects to be an `All` (spec.md §4.6's `infer`/`check`
    /// rules). Panics on any other shape — a state the type system already
    /// rules out.
    pub fn unwrap_all(&self) -> (bool, &Name, &Name, &Term, &Term) {
        match self.inner() {
            InnerTerm::All { erased, self_name, bind_name, bind_type, body, .. } => {
                (*erased, self_name, bind_name, bind_type, body)
            }
            owise => err_partial(0, "term.rs::unwrap_all expected All", owise),
        }
    }

    pub fn unwrap_lam(&self) -> (bool, &Name, &Term) {
        match self.inner() {
            InnerTerm::Lam { erased, name, body, .. } => (*erased, name, body),
            owise => err_partial(0, "term.rs::unwrap_lam expected Lam", owise),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner() {
            InnerTerm::Var { idx, .. } => write!(f, "${}", idx),
            InnerTerm::Ref { name, .. } => write!(f, "{}", name),
            InnerTerm::Typ { .. } => write!(f, "Type"),
            InnerTerm::All { erased, self_name, bind_name, bind_type, body, .. } => {
                let (open, close) = if *erased { ("<", ">") } else { ("(", ")") };
                write!(
                    f,
                    "{}{}{}: {}{} -> {}",
                    self_name, open, bind_name, bind_type, close, body
                )
            }
            InnerTerm::Lam { erased, name, body, .. } => {
                let (open, close) = if *erased { ("<", ">") } else { ("(", ")") };
                write!(f, "{}{}{} {}", open, name, close, body)
            }
            InnerTerm::App { erased, fun, arg, .. } => {
                let (open, close) = if *erased { ("<", ">") } else { ("(", ")") };
                write!(f, "{}{}{}{}", fun, open, arg, close)
            }
            InnerTerm::Let { name, expr, body, .. } => {
                write!(f, "let {} = {}; {}", name, expr, body)
            }
            InnerTerm::Ann { ty, term, .. } => write!(f, "{} :: {}", term, ty),
        }
    }
}
