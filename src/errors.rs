//! Error types (spec.md §7) plus an `err_*() -> !` convention for internal
//! invariant violations that the parser/checker already rule out.
//!
//! Three families, deliberately not unified into one enum:
//!   - `NameErr`/`NameResult` — small reachable construction failures
//!     that don't belong to the checker's own §7 vocabulary (currently just
//!     `Name::new`'s validation).
//!   - `ParseErr` — the parser's single "no parse" signal, plus the
//!     top-level "expected EOF" case.
//!   - `TypeError` — the checker's single structural error kind, built
//!     through the seven constructors below so call sites stay consistent,
//!     returning instead of panicking since these ARE reachable from user
//!     input.

use std::fmt;
use std::fmt::Debug;

use crate::name::Name;
use crate::term::Term;

pub type NameResult<T> = Result<T, NameErr>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameErr {
    BadName(String),
}

impl fmt::Display for NameErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NameErr::BadName(s) => write!(f, "'{}' is not a valid name ([A-Za-z0-9_.]+)", s),
        }
    }
}

impl std::error::Error for NameErr {}

/// The byte offset a parse failure was detected at, paired with the line
/// and column it corresponds to (1-indexed), enough to point a user at
/// the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErr {
    /// "no parse" (spec.md §4.1 Failure) — no grammar production matched at
    /// this position.
    NoParse(Pos),
    /// Top-level "expected EOF" when trailing residue remains after the
    /// module production is done (spec.md §4.1 Failure).
    UnexpectedTrailing(Pos),
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseErr::NoParse(pos) => write!(f, "no parse at {}", pos),
            ParseErr::UnexpectedTrailing(pos) => write!(f, "expected EOF at {}", pos),
        }
    }
}

impl std::error::Error for ParseErr {}

pub type ParseResult<T> = Result<T, ParseErr>;

/// The checker's single structural error kind (spec.md §7): a message plus
/// whatever context the failing rule had on hand. Always constructed
/// through one of the functions below so the nine-ish distinguishable
/// messages stay exactly as spec.md §7 words them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError(pub String);

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TypeError {}

pub type CheckResult<T> = Result<T, TypeError>;

pub fn err_erasure_mismatch() -> TypeError {
    TypeError("Erasure mismatch".to_owned())
}

pub fn err_lambda_non_function() -> TypeError {
    TypeError("Lambda has a non-function type".to_owned())
}

pub fn err_unexpected_type(
    expected: &Term,
    inferred: &Term,
    term: &Term,
    ctx: &[Term],
    names: &[Name],
) -> TypeError {
    TypeError(format!(
        "Unexpected type:\n  expected: {}\n  inferred: {}\n  term: {}\n  ctx: [{}]\n  names: [{}]",
        expected,
        inferred,
        term,
        ctx.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", "),
        names.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", "),
    ))
}

pub fn err_unbound_variable() -> TypeError {
    TypeError("Unbound variable".to_owned())
}

pub fn err_undefined_reference() -> TypeError {
    TypeError("Undefined Reference".to_owned())
}

pub fn err_non_function_application() -> TypeError {
    TypeError("Non-function application".to_owned())
}

pub fn err_cant_infer_type() -> TypeError {
    TypeError("Can't infer type".to_owned())
}

/// Internal-invariant panic for states the parser/checker's own structure
/// already rules out (e.g. unwrapping a non-`Var` as a `Var`). These are
/// bugs, not user-facing errors — never called on anything that reaches
/// the checker from a parsed program.
pub fn err_partial<T: Debug>(loc: u32, what: &str, got: &T) -> ! {
    eprintln!(
        "internal error at errors.rs-reported line {}; expected {}, got {:?}\n",
        loc, what, got
    );
    std::process::exit(-1);
}
