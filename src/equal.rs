//! The equality engine (spec.md §4.5): worklist-driven αβ-equivalence,
//! memoized through a union-find over term hashes, seeded by a cheap
//! recursive congruence check and falling back to reduction only where
//! congruence alone can't decide. The union-find memoizes reductions as
//! well as verdicts, not just verdicts, so recurring subterms short-circuit
//! on repeat visits.

use crate::module::Module;
use crate::name::Name;
use crate::reduce::reduce;
use crate::subst::subst;
use crate::term::{InnerTerm, Term};
use crate::unionfind::UnionFind;

const RED_ZONE: usize = 32 * 1024;
const STACK_SIZE: usize = 1024 * 1024;

fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}

/// Decides βα-equivalence of `a` and `b` under `module`'s definitions.
pub fn equal(module: &Module, a: &Term, b: &Term) -> bool {
    let mut eq: UnionFind<Term> = UnionFind::new();
    let mut worklist = vec![(a.clone(), b.clone(), 0usize)];

    while let Some((x, y, depth)) = worklist.pop() {
        let xr = reduce(module, &x);
        let yr = reduce(module, &y);

        let is_congruent = congruent(&mut eq, &xr, &yr);

        // Memoize both reductions and the verdict so recurring subterms
        // short-circuit next time they're visited.
        eq.equate(x.hash().key(), &x, xr.hash().key(), &xr);
        eq.equate(y.hash().key(), &y, yr.hash().key(), &yr);
        eq.equate(xr.hash().key(), &xr, yr.hash().key(), &yr);

        if is_congruent {
            continue;
        }

        use InnerTerm::*;
        match (xr.inner(), yr.inner()) {
            (All { bind_type: bt1, body: b1, .. }, All { bind_type: bt2, body: b2, .. }) => {
                worklist.push((bt1.clone(), bt2.clone(), depth));
                let self_marker = fresh_ref(depth);
                let arg_marker = fresh_ref(depth + 1);
                let ob1 = open_all_body(b1, &self_marker, &arg_marker);
                let ob2 = open_all_body(b2, &self_marker, &arg_marker);
                worklist.push((ob1, ob2, depth + 2));
            }
            (Lam { body: b1, .. }, Lam { body: b2, .. }) => {
                let marker = fresh_ref(depth);
                worklist.push((subst(&marker, 0, b1), subst(&marker, 0, b2), depth + 1));
            }
            (App { fun: f1, arg: a1, .. }, App { fun: f2, arg: a2, .. }) => {
                worklist.push((f1.clone(), f2.clone(), depth));
                worklist.push((a1.clone(), a2.clone(), depth));
            }
            (Let { expr: e1, body: b1, .. }, Let { expr: e2, body: b2, .. }) => {
                worklist.push((e1.clone(), e2.clone(), depth));
                let marker = fresh_ref(depth);
                worklist.push((subst(&marker, 0, b1), subst(&marker, 0, b2), depth + 1));
            }
            (Ann { term: t1, .. }, Ann { term: t2, .. }) => {
                worklist.push((t1.clone(), t2.clone(), depth));
            }
            _ => return false,
        }
    }

    true
}

fn fresh_ref(depth: usize) -> Term {
    Term::mk_ref(Name::sentinel(format!("%{}", depth)))
}

/// Opens an `All` body (scope 2: arg then self) by substituting the arg
/// marker at index 0 first, then the self marker at the index-0 slot the
/// arg substitution vacates — the same telescope-opening trick used for
/// any two-binder scope.
fn open_all_body(body: &Term, self_marker: &Term, arg_marker: &Term) -> Term {
    subst(self_marker, 0, &subst(arg_marker, 0, body))
}

/// Structural comparison ignoring names, erasure flags, and the `Ann`
/// done-flag, short-circuited by whatever the union-find already knows.
/// Recursion here never reduces further — it's the "cheap" half of
/// congruence; mismatches that are still same-constructor fall back to the
/// worklist so the caller can reduce children before giving up.
fn congruent(eq: &mut UnionFind<Term>, x: &Term, y: &Term) -> bool {
    with_stack(|| {
        if eq.is_equivalent(x.hash().key(), x, y.hash().key(), y) {
            return true;
        }
        use InnerTerm::*;
        match (x.inner(), y.inner()) {
            (Var { idx: i, .. }, Var { idx: j, .. }) => i == j,
            (Ref { name: n1, .. }, Ref { name: n2, .. }) => n1 == n2,
            (Typ { .. }, Typ { .. }) => true,
            (All { bind_type: bt1, body: bd1, .. }, All { bind_type: bt2, body: bd2, .. }) => {
                congruent(eq, bt1, bt2) && congruent(eq, bd1, bd2)
            }
            (Lam { body: b1, .. }, Lam { body: b2, .. }) => congruent(eq, b1, b2),
            (App { fun: f1, arg: a1, .. }, App { fun: f2, arg: a2, .. }) => {
                congruent(eq, f1, f2) && congruent(eq, a1, a2)
            }
            (Let { expr: e1, body: b1, .. }, Let { expr: e2, body: b2, .. }) => {
                congruent(eq, e1, e2) && congruent(eq, b1, b2)
            }
            (Ann { term: t1, .. }, Ann { term: t2, .. }) => congruent(eq, t1, t2),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Definition;

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn identical_terms_are_equal() {
        let module = Module::new();
        let t = Term::mk_lam(false, n("x"), Term::mk_var(0));
        assert!(equal(&module, &t, &t));
    }

    #[test]
    fn alpha_renaming_does_not_affect_equality() {
        let module = Module::new();
        let t1 = Term::mk_lam(false, n("x"), Term::mk_var(0));
        let t2 = Term::mk_lam(false, n("y"), Term::mk_var(0));
        assert!(equal(&module, &t1, &t2));
    }

    #[test]
    fn beta_redex_equals_its_reduct() {
        let module = Module::new();
        let redex = Term::mk_app(
            false,
            Term::mk_lam(false, n("x"), Term::mk_var(0)),
            Term::mk_ref(n("y")),
        );
        let reduct = Term::mk_ref(n("y"));
        assert!(equal(&module, &redex, &reduct));
    }

    #[test]
    fn let_unfolds_to_its_substitution() {
        let module = Module::new();
        let let_term = Term::mk_let(n("x"), Term::mk_ref(n("v")), Term::mk_var(0));
        let substituted = subst(&Term::mk_ref(n("v")), 0, &Term::mk_var(0));
        assert!(equal(&module, &let_term, &substituted));
    }

    #[test]
    fn annotation_is_transparent() {
        let module = Module::new();
        let x = Term::mk_ref(n("x"));
        let ann = Term::mk_ann(false, Term::mk_typ(), x.clone());
        assert!(equal(&module, &ann, &x));
    }

    #[test]
    fn distinct_refs_are_not_equal() {
        let module = Module::new();
        assert!(!equal(&module, &Term::mk_ref(n("a")), &Term::mk_ref(n("b"))));
    }

    #[test]
    fn references_through_the_module_unfold_before_comparison() {
        let mut module = Module::new();
        module.insert(Definition::new(n("id"), Term::mk_typ(), Term::mk_typ()));
        assert!(equal(&module, &Term::mk_ref(n("id")), &Term::mk_typ()));
    }

    #[test]
    fn different_arities_are_not_equal() {
        let module = Module::new();
        let lam = Term::mk_lam(false, n("x"), Term::mk_var(0));
        let typ = Term::mk_typ();
        assert!(!equal(&module, &lam, &typ));
    }
}
