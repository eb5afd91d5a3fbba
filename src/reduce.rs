//! The weak-head reducer (spec.md §4.3).
//!
//! `reduce` carries no memoization state of its own: spec.md §5 is explicit
//! that the union-find inside a single `equal` call is the only mutable
//! state in the whole system, so reduction results are memoized there (via
//! `equate(hash(x), hash(x'))`) rather than in a second cache living
//! alongside it.

use crate::hoas::{from_hoas, to_hoas, HVal};
use crate::module::Module;
use crate::name::Name;
use crate::term::Term;

const RED_ZONE: usize = 32 * 1024;
const STACK_SIZE: usize = 1024 * 1024;

fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}

/// `reduce = fromHOAS ∘ reduceHOAS ∘ toHOAS`.
pub fn reduce(module: &Module, t: &Term) -> Term {
    from_hoas(&reduce_hoas(module, &to_hoas(t)))
}

pub fn reduce_hoas(module: &Module, h: &HVal) -> HVal {
    with_stack(|| match h {
        HVal::Ref(name) => resolve_ref(module, name),
        HVal::App { erased: true, fun, .. } => reduce_hoas(module, fun),
        HVal::App { erased: false, fun, arg } => {
            let f = reduce_hoas(module, fun);
            match &f {
                HVal::Lam { body, .. } => reduce_hoas(module, &body((**arg).clone())),
                _ => HVal::App { erased: false, fun: std::rc::Rc::new(f), arg: arg.clone() },
            }
        }
        HVal::Lam { erased: true, body, .. } => {
            reduce_hoas(module, &body(HVal::Ref(Name::sentinel("<erased>"))))
        }
        HVal::Let { expr, body, .. } => reduce_hoas(module, &body((**expr).clone())),
        HVal::Ann { term, .. } => reduce_hoas(module, term),
        owise => owise.clone(),
    })
}

/// Resolves `n` against the module: absent stays a `Ref`; a definition
/// whose body is itself literally a `Ref` is followed without converting
/// to HOAS (spec.md §4.3: "if it resolves to another Ref, rename and
/// continue"); anything else is converted to HOAS and reduced.
fn resolve_ref(module: &Module, name: &Name) -> HVal {
    let mut current = name.clone();
    loop {
        match module.get(&current) {
            None => return HVal::Ref(current),
            Some(def) => match def.body.as_ref_name() {
                Some(other) => current = other.clone(),
                None => return reduce_hoas(module, &to_hoas(&def.body)),
            },
        }
    }
}
