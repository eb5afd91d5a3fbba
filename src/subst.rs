//! Shifting and substitution (spec.md §4.2). Capture-avoiding index
//! arithmetic over `Term`, rebuilding hashes as it goes.
//!
//! Both traversals run under `stacker::maybe_grow` per spec.md §5's
//! deep-recursion tolerance requirement, since large terms can otherwise
//! blow the stack.

use crate::term::Term;

const RED_ZONE: usize = 32 * 1024;
const STACK_SIZE: usize = 1024 * 1024;

fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}

/// Increments every `Var` index `>= depth` by `inc`. `inc` may be negative
/// (used to state the shift/unshift law in §8's testable properties).
pub fn shift(inc: i64, depth: usize, t: &Term) -> Term {
    with_stack(|| shift_rec(inc, depth, t))
}

fn shift_rec(inc: i64, depth: usize, t: &Term) -> Term {
    use crate::term::InnerTerm::*;
    match t.inner() {
        Var { idx, .. } => {
            if *idx >= depth {
                Term::mk_var(bump(*idx, inc))
            } else {
                t.clone()
            }
        }
        Ref { .. } | Typ { .. } => t.clone(),
        All { erased, self_name, bind_name, bind_type, body, .. } => Term::mk_all(
            *erased,
            self_name.clone(),
            bind_name.clone(),
            shift_rec(inc, depth + 1, bind_type),
            shift_rec(inc, depth + 2, body),
        ),
        Lam { erased, name, body, .. } => {
            Term::mk_lam(*erased, name.clone(), shift_rec(inc, depth + 1, body))
        }
        App { erased, fun, arg, .. } => {
            Term::mk_app(*erased, shift_rec(inc, depth, fun), shift_rec(inc, depth, arg))
        }
        Let { name, expr, body, .. } => Term::mk_let(
            name.clone(),
            shift_rec(inc, depth, expr),
            shift_rec(inc, depth + 1, body),
        ),
        Ann { done, ty, term, .. } => {
            Term::mk_ann(*done, shift_rec(inc, depth, ty), shift_rec(inc, depth, term))
        }
    }
}

fn bump(idx: usize, inc: i64) -> usize {
    (idx as i64 + inc) as usize
}

/// Replaces the `Var` at `depth` with `v`; decrements `Var`s strictly
/// greater than `depth`. On crossing a binder of size `k`, `v` is shifted
/// by `k` and `depth` increases by `k` (spec.md §4.2's binder-crossing
/// table: `All` crosses 1 for its bind-type and 2 for its body; `Lam`/`Let`
/// cross 1 for the body; everything else crosses 0).
///
/// The `Let` case recurses into the *body* at the crossed depth, not the
/// bound expression — one of the known source quirks spec.md §9 flags as a
/// bug not to replicate.
pub fn subst(v: &Term, depth: usize, t: &Term) -> Term {
    with_stack(|| subst_rec(v, depth, t))
}

fn subst_rec(v: &Term, depth: usize, t: &Term) -> Term {
    use crate::term::InnerTerm::*;
    match t.inner() {
        Var { idx, .. } => {
            if *idx == depth {
                v.clone()
            } else if *idx > depth {
                Term::mk_var(idx - 1)
            } else {
                t.clone()
            }
        }
        Ref { .. } | Typ { .. } => t.clone(),
        All { erased, self_name, bind_name, bind_type, body, .. } => {
            let v1 = shift(1, 0, v);
            let v2 = shift(2, 0, v);
            Term::mk_all(
                *erased,
                self_name.clone(),
                bind_name.clone(),
                subst_rec(&v1, depth + 1, bind_type),
                subst_rec(&v2, depth + 2, body),
            )
        }
        Lam { erased, name, body, .. } => {
            let v1 = shift(1, 0, v);
            Term::mk_lam(*erased, name.clone(), subst_rec(&v1, depth + 1, body))
        }
        App { erased, fun, arg, .. } => {
            Term::mk_app(*erased, subst_rec(v, depth, fun), subst_rec(v, depth, arg))
        }
        Let { name, expr, body, .. } => {
            let v1 = shift(1, 0, v);
            Term::mk_let(
                name.clone(),
                subst_rec(v, depth, expr),
                subst_rec(&v1, depth + 1, body),
            )
        }
        Ann { done, ty, term, .. } => {
            Term::mk_ann(*done, subst_rec(v, depth, ty), subst_rec(v, depth, term))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn shift_only_touches_vars_at_or_above_depth() {
        let t = Term::mk_app(false, Term::mk_var(0), Term::mk_var(1));
        let shifted = shift(5, 1, &t);
        match shifted.inner() {
            crate::term::InnerTerm::App { fun, arg, .. } => {
                assert_eq!(fun.as_var(), Some(0));
                assert_eq!(arg.as_var(), Some(6));
            }
            _ => panic!("expected App"),
        }
    }

    #[test]
    fn shift_then_unshift_is_identity() {
        let t = Term::mk_lam(
            false,
            n("x"),
            Term::mk_app(false, Term::mk_var(0), Term::mk_var(1)),
        );
        let up = shift(3, 0, &t);
        let down = shift(-3, 0, &up);
        assert_eq!(down.hash(), t.hash());
    }

    #[test]
    fn subst_replaces_var_at_depth() {
        let body = Term::mk_var(0);
        let v = Term::mk_ref(n("replacement"));
        let result = subst(&v, 0, &body);
        assert_eq!(result.as_ref_name().map(Name::as_str), Some("replacement"));
    }

    #[test]
    fn subst_decrements_vars_above_depth() {
        let t = Term::mk_var(2);
        let v = Term::mk_ref(n("x"));
        let result = subst(&v, 0, &t);
        assert_eq!(result.as_var(), Some(1));
    }

    #[test]
    fn subst_crosses_let_into_body_not_expr() {
        let v = Term::mk_ref(n("v"));
        let t = Term::mk_let(n("x"), Term::mk_var(5), Term::mk_var(0));
        let result = subst(&v, 0, &t);
        match result.inner() {
            crate::term::InnerTerm::Let { expr, body, .. } => {
                // `expr` is crossed at the outer depth: Var(5) decrements to Var(4).
                assert_eq!(expr.as_var(), Some(4));
                // `body` is crossed one binder deeper (depth 1); Var(0) refers to
                // the `Let`'s own bound `x`, not to `v`, so it is untouched.
                assert_eq!(body.as_var(), Some(0));
            }
            _ => panic!("expected Let"),
        }
    }
}
