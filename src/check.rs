//! Bidirectional type checker/inferrer (spec.md §4.6): `infer` synthesizes
//! a term's type, `check` descends through `Lam` against an expected `All`
//! and falls back to infer-then-`equal` otherwise. `check`/`infer` carry no
//! cache of their own — spec.md §5 scopes all mutable state to a single
//! `equal()` call.
//!
//! `ctx` stores the type of each de Bruijn variable *unshifted*:
//! `infer(Var i)` is the one place that applies `shift(i + 1, 0, ctx[i])`
//! to account for the binders introduced since `ctx[i]` was recorded,
//! rather than re-shifting every stored entry each time a new binder is
//! pushed.

use crate::errors::*;
use crate::module::Module;
use crate::name::Name;
use crate::reduce::reduce;
use crate::subst::{shift, subst};
use crate::term::{InnerTerm, Term};

fn extend_ctx(ctx: &[Term], ty: Term) -> Vec<Term> {
    let mut new_ctx = Vec::with_capacity(ctx.len() + 1);
    new_ctx.push(ty);
    new_ctx.extend_from_slice(ctx);
    new_ctx
}

fn extend_names(names: &[Name], name: Name) -> Vec<Name> {
    let mut new_names = Vec::with_capacity(names.len() + 1);
    new_names.push(name);
    new_names.extend_from_slice(names);
    new_names
}

/// `check(ctx, names, expected, term)`: succeeds iff `term` has type
/// `expected` up to `equal`.
pub fn check(
    module: &Module,
    ctx: &[Term],
    names: &[Name],
    expected: &Term,
    term: &Term,
) -> CheckResult<()> {
    match term.inner() {
        InnerTerm::Lam { erased, name, body, .. } => {
            let expected_whnf = reduce(module, expected);
            match expected_whnf.inner() {
                InnerTerm::All { erased: te, bind_type: th, body: tb, .. } => {
                    if erased != te {
                        return Err(err_erasure_mismatch());
                    }
                    // Self-type mechanism: the argument's type is `th` with
                    // the self-reference replaced by the whole lambda term.
                    let arg_ty = subst(term, 0, th);
                    let body_ctx = extend_ctx(ctx, arg_ty);
                    let body_names = extend_names(names, name.clone());
                    // `tb` is scoped under (self, arg); under `body_ctx`
                    // only the arg binder is materialized, so the self
                    // occurrence is eliminated directly by substituting the
                    // whole (shifted, to account for the new arg binder)
                    // term at its depth-1 slot.
                    let body_expected = subst(&shift(1, 0, term), 1, tb);
                    check(module, &body_ctx, &body_names, &body_expected, body)
                }
                _ => Err(err_lambda_non_function()),
            }
        }
        _ => {
            let inferred = infer(module, ctx, names, term)?;
            if crate::equal::equal(module, expected, &inferred) {
                Ok(())
            } else {
                Err(err_unexpected_type(expected, &inferred, term, ctx, names))
            }
        }
    }
}

/// `infer(ctx, names, term)`: synthesizes `term`'s type.
pub fn infer(module: &Module, ctx: &[Term], names: &[Name], term: &Term) -> CheckResult<Term> {
    match term.inner() {
        InnerTerm::Var { idx, .. } => match ctx.get(*idx) {
            Some(ty) => Ok(shift(*idx as i64 + 1, 0, ty)),
            None => Err(err_unbound_variable()),
        },
        InnerTerm::Ref { name, .. } => match module.get(name) {
            Some(def) => Ok(def.declared_type.clone()),
            None => Err(err_undefined_reference()),
        },
        // Type-in-Type.
        InnerTerm::Typ { .. } => Ok(Term::mk_typ()),
        InnerTerm::App { erased, fun, arg, .. } => {
            let fun_ty = infer(module, ctx, names, fun)?;
            let fun_ty_whnf = reduce(module, &fun_ty);
            match fun_ty_whnf.inner() {
                InnerTerm::All { erased: te, bind_type: th, body: tb, .. } => {
                    if erased != te {
                        return Err(err_erasure_mismatch());
                    }
                    let arg_expected = subst(fun, 0, th);
                    check(module, ctx, names, &arg_expected, arg)?;
                    Ok(subst(fun, 0, &subst(arg, 0, tb)))
                }
                _ => Err(err_non_function_application()),
            }
        }
        InnerTerm::Let { name, expr, body, .. } => {
            let expr_ty = infer(module, ctx, names, expr)?;
            let body_ctx = extend_ctx(ctx, expr_ty);
            let body_names = extend_names(names, name.clone());
            let body_ty = infer(module, &body_ctx, &body_names, body)?;
            Ok(subst(expr, 0, &body_ty))
        }
        InnerTerm::All { self_name, bind_name, bind_type, body, .. } => {
            let self_ty = Term::mk_ann(true, Term::mk_typ(), term.clone());
            let ctx1 = extend_ctx(ctx, self_ty);
            let names1 = extend_names(names, self_name.clone());
            // Just needs to type-check at all (Type-in-Type admits any
            // result here); the value isn't otherwise used.
            infer(module, &ctx1, &names1, bind_type)?;
            let ctx2 = extend_ctx(&ctx1, bind_type.clone());
            let names2 = extend_names(&names1, bind_name.clone());
            check(module, &ctx2, &names2, &Term::mk_typ(), body)?;
            Ok(Term::mk_typ())
        }
        InnerTerm::Ann { done: true, ty, .. } => Ok(ty.clone()),
        InnerTerm::Ann { done: false, ty, term: inner } => {
            check(module, ctx, names, ty, inner)?;
            Ok(ty.clone())
        }
        InnerTerm::Lam { .. } => Err(err_cant_infer_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Definition, Module};

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    /// `bad : (A : Type) -> A`, body `(A) => A` — `A` is `Type`, not `A`.
    ///
    /// The body field of an `All` sits two binders deep (self, then bind),
    /// but bind is innermost, so a direct reference to the bind itself is
    /// `$0` — there's no nested `All` here to push `$0` further out.
    #[test]
    fn mismatched_body_is_rejected() {
        let module = Module::new();
        let decl_type = Term::mk_all(false, n(""), n("A"), Term::mk_typ(), Term::mk_var(0));
        let body = Term::mk_lam(false, n("A"), Term::mk_var(0));
        let err = check(&module, &[], &[], &decl_type, &body).unwrap_err();
        assert!(err.0.starts_with("Unexpected type"));
    }

    #[test]
    fn applying_a_non_function_fails() {
        let module = Module::new();
        let app = Term::mk_app(false, Term::mk_typ(), Term::mk_typ());
        let err = infer(&module, &[], &[], &app).unwrap_err();
        assert_eq!(err.0, "Non-function application");
    }

    #[test]
    fn unbound_variable_is_reported() {
        let module = Module::new();
        let err = infer(&module, &[], &[], &Term::mk_var(0)).unwrap_err();
        assert_eq!(err.0, "Unbound variable");
    }

    #[test]
    fn undefined_reference_is_reported() {
        let module = Module::new();
        let err = infer(&module, &[], &[], &Term::mk_ref(n("nope"))).unwrap_err();
        assert_eq!(err.0, "Undefined Reference");
    }

    #[test]
    fn lambda_at_infer_position_cannot_infer() {
        let module = Module::new();
        let lam = Term::mk_lam(false, n("x"), Term::mk_var(0));
        let err = infer(&module, &[], &[], &lam).unwrap_err();
        assert_eq!(err.0, "Can't infer type");
    }

    #[test]
    fn lambda_against_non_function_type_fails() {
        let module = Module::new();
        let lam = Term::mk_lam(false, n("x"), Term::mk_var(0));
        let err = check(&module, &[], &[], &Term::mk_typ(), &lam).unwrap_err();
        assert_eq!(err.0, "Lambda has a non-function type");
    }

    #[test]
    fn erasure_mismatch_is_reported() {
        let module = Module::new();
        let decl_type = Term::mk_all(false, n(""), n("A"), Term::mk_typ(), Term::mk_var(0));
        let erased_lam = Term::mk_lam(true, n("A"), Term::mk_var(0));
        let err = check(&module, &[], &[], &decl_type, &erased_lam).unwrap_err();
        assert_eq!(err.0, "Erasure mismatch");
    }

    /// `twice : (A:Type) -> (a:A) -> A`, body `(A)=>(a)=>a` — the simplest
    /// nested-`All` case, exercising the self-slot that every `All` pushes
    /// even when its name is `""`. `$1` in the inner `All`'s type position
    /// refers to the outer `A` (inner self occupies `$0`); `$1` in its body
    /// position is the same `A` seen two binders (self, bind) deeper still,
    /// i.e. `$0`(a's self)+... — see `equal.rs`'s `open_all_body` for the
    /// matching derivation on the equality side.
    #[test]
    fn nested_all_checks_the_identity_function() {
        let module = Module::new();
        let decl_type = Term::mk_all(
            false,
            n(""),
            n("A"),
            Term::mk_typ(),
            Term::mk_all(false, n(""), n("a"), Term::mk_var(1), Term::mk_var(2)),
        );
        let body = Term::mk_lam(false, n("A"), Term::mk_lam(false, n("a"), Term::mk_var(0)));
        assert!(check(&module, &[], &[], &decl_type, &body).is_ok());
    }

    #[test]
    fn module_check_reports_one_failure_and_keeps_going() {
        let mut module = Module::new();
        module.insert(Definition::new(n("good"), Term::mk_typ(), Term::mk_typ()));
        module.insert(Definition::new(
            n("bad"),
            Term::mk_all(false, n(""), n("A"), Term::mk_typ(), Term::mk_var(0)),
            Term::mk_lam(false, n("A"), Term::mk_var(0)),
        ));
        let failures = module.check();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.as_str(), "bad");
    }
}
