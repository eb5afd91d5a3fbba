//! The HOAS bridge (spec.md §4.3): `to_hoas`/`from_hoas` convert between the
//! indexed `Term` and a transient higher-order closure representation used
//! only for the duration of one `reduce` call.
//!
//! `HVal` mirrors `InnerTerm`'s shape but stands bound parameters in as
//! `Rc<dyn Fn(HVal) -> HVal>` closures, the standard from-scratch Rust
//! encoding of a HOAS binder (a closure over an environment, rather than
//! an index into one). Per spec.md §9, these closures are built fresh for
//! each `reduce` call and never serialized or reused across calls.

use std::rc::Rc;

use crate::errors::err_partial;
use crate::name::Name;
use crate::term::Term;

const RED_ZONE: usize = 32 * 1024;
const STACK_SIZE: usize = 1024 * 1024;

fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}

/// A higher-order value. `Free(level)` is the opaque stand-in issued by
/// `from_hoas` for a binder's parameter while it is re-indexing back out —
/// it never appears in a value produced fresh by `to_hoas` from a
/// well-scoped closed-over term.
#[derive(Clone)]
pub enum HVal {
    Free(usize),
    Ref(Name),
    Typ,
    All {
        erased: bool,
        self_name: Name,
        bind_name: Name,
        bind_type: Rc<dyn Fn(HVal) -> HVal>,
        body: Rc<dyn Fn(HVal, HVal) -> HVal>,
    },
    Lam {
        erased: bool,
        name: Name,
        body: Rc<dyn Fn(HVal) -> HVal>,
    },
    App {
        erased: bool,
        fun: Rc<HVal>,
        arg: Rc<HVal>,
    },
    Let {
        name: Name,
        expr: Rc<HVal>,
        body: Rc<dyn Fn(HVal) -> HVal>,
    },
    Ann {
        done: bool,
        ty: Rc<HVal>,
        term: Rc<HVal>,
    },
}

/// A persistent environment mapping de-Bruijn index to bound `HVal`,
/// innermost binder first. Built as a cons-list so extending it under a
/// closure is O(1) instead of cloning a growing `Vec` at every binder.
#[derive(Clone)]
enum Env {
    Nil,
    Cons(HVal, Rc<Env>),
}

impl Env {
    fn push(self, v: HVal) -> Env {
        Env::Cons(v, Rc::new(self))
    }

    fn get(&self, idx: usize) -> HVal {
        match self {
            Env::Cons(v, rest) => {
                if idx == 0 {
                    v.clone()
                } else {
                    rest.get(idx - 1)
                }
            }
            Env::Nil => err_partial(0, "hoas.rs::Env::get out-of-scope Var", &idx),
        }
    }
}

pub fn to_hoas(t: &Term) -> HVal {
    to_hoas_rec(t, &Env::Nil)
}

fn to_hoas_rec(t: &Term, env: &Env) -> HVal {
    use crate::term::InnerTerm::*;
    with_stack(|| match t.inner() {
        Var { idx, .. } => env.get(*idx),
        Ref { name, .. } => HVal::Ref(name.clone()),
        Typ { .. } => HVal::Typ,
        All { erased, self_name, bind_name, bind_type, body, .. } => {
            let bind_type = bind_type.clone();
            let body = body.clone();
            let env_bt = env.clone();
            let env_body = env.clone();
            let bind_type_fn: Rc<dyn Fn(HVal) -> HVal> =
                Rc::new(move |self_v| to_hoas_rec(&bind_type, &env_bt.clone().push(self_v)));
            let body_fn: Rc<dyn Fn(HVal, HVal) -> HVal> = Rc::new(move |self_v, arg_v| {
                let e = env_body.clone().push(self_v).push(arg_v);
                to_hoas_rec(&body, &e)
            });
            HVal::All {
                erased: *erased,
                self_name: self_name.clone(),
                bind_name: bind_name.clone(),
                bind_type: bind_type_fn,
                body: body_fn,
            }
        }
        Lam { erased, name, body, .. } => {
            let body = body.clone();
            let env2 = env.clone();
            let closure: Rc<dyn Fn(HVal) -> HVal> =
                Rc::new(move |arg| to_hoas_rec(&body, &env2.clone().push(arg)));
            HVal::Lam { erased: *erased, name: name.clone(), body: closure }
        }
        App { erased, fun, arg, .. } => HVal::App {
            erased: *erased,
            fun: Rc::new(to_hoas_rec(fun, env)),
            arg: Rc::new(to_hoas_rec(arg, env)),
        },
        Let { name, expr, body, .. } => {
            let expr_h = to_hoas_rec(expr, env);
            let body = body.clone();
            let env2 = env.clone();
            let closure: Rc<dyn Fn(HVal) -> HVal> =
                Rc::new(move |v| to_hoas_rec(&body, &env2.clone().push(v)));
            HVal::Let { name: name.clone(), expr: Rc::new(expr_h), body: closure }
        }
        Ann { done, ty, term, .. } => HVal::Ann {
            done: *done,
            ty: Rc::new(to_hoas_rec(ty, env)),
            term: Rc::new(to_hoas_rec(term, env)),
        },
    })
}

pub fn from_hoas(h: &HVal) -> Term {
    from_hoas_rec(h, 0)
}

fn from_hoas_rec(h: &HVal, depth: usize) -> Term {
    with_stack(|| match h {
        HVal::Free(level) => Term::mk_var(depth - level - 1),
        HVal::Ref(name) => Term::mk_ref(name.clone()),
        HVal::Typ => Term::mk_typ(),
        HVal::All { erased, self_name, bind_name, bind_type, body, .. } => {
            let self_param = HVal::Free(depth);
            let bt_val = bind_type(self_param.clone());
            let bt_term = from_hoas_rec(&bt_val, depth + 1);
            let arg_param = HVal::Free(depth + 1);
            let body_val = body(self_param, arg_param);
            let body_term = from_hoas_rec(&body_val, depth + 2);
            Term::mk_all(*erased, self_name.clone(), bind_name.clone(), bt_term, body_term)
        }
        HVal::Lam { erased, name, body, .. } => {
            let param = HVal::Free(depth);
            let body_val = body(param);
            Term::mk_lam(*erased, name.clone(), from_hoas_rec(&body_val, depth + 1))
        }
        HVal::App { erased, fun, arg, .. } => {
            Term::mk_app(*erased, from_hoas_rec(fun, depth), from_hoas_rec(arg, depth))
        }
        HVal::Let { name, expr, body, .. } => {
            let expr_term = from_hoas_rec(expr, depth);
            let param = HVal::Free(depth);
            let body_val = body(param);
            Term::mk_let(name.clone(), expr_term, from_hoas_rec(&body_val, depth + 1))
        }
        HVal::Ann { done, ty, term, .. } => {
            Term::mk_ann(*done, from_hoas_rec(ty, depth), from_hoas_rec(term, depth))
        }
    })
}
