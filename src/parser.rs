//! Handwritten recursive-descent parser (spec.md §4.1): a struct carrying
//! mutable cursor state, one method per grammar production, `ParseResult<T>`
//! everywhere, with save/restore backtracking where the grammar is
//! genuinely ambiguous on a single token of lookahead (`all` and `lam`
//! share a `(`/`<` prefix, and `lam`'s bracket is ambiguous with a bare
//! grouping parenthesis).

use crate::errors::{err_partial, ParseErr, ParseResult, Pos};
use crate::module::{Definition, Module};
use crate::name::Name;
use crate::subst::shift;
use crate::term::Term;

/// `Type` and `let` are matched as keywords before falling back to the
/// generic `var` production, which makes them reserved words in practice
/// even though spec.md's grammar doesn't carve out a separate keyword
/// lexical class (see `SPEC_FULL.md`'s Open Question on this).
struct Parser {
    src: Vec<char>,
    pos: usize,
    /// Lexical scope stack; the most recently pushed name is innermost
    /// (de Bruijn index 0).
    scope: Vec<Name>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Builds a `Name` from a grammar-matched identifier (always valid against
/// `Name::new`'s charset by construction) or the "" placeholder absent
/// names become, which `Name::new` itself would reject.
fn mk_name(s: &str) -> Name {
    if s.is_empty() {
        Name::sentinel("")
    } else {
        Name::new(s)
            .unwrap_or_else(|e| err_partial(0, "parser.rs: identifier already matched the name charset", &e))
    }
}

impl Parser {
    fn new(src: &str) -> Parser {
        Parser { src: src.chars().collect(), pos: 0, scope: Vec::new() }
    }

    fn pos_of(&self, offset: usize) -> Pos {
        let mut line = 1;
        let mut col = 1;
        for &c in &self.src[..offset.min(self.src.len())] {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Pos { offset, line, col }
    }

    fn no_parse(&self) -> ParseErr {
        ParseErr::NoParse(self.pos_of(self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn at_eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => self.pos += 1,
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                Some('-') if self.peek_at(1) == Some('-') => self.skip_line_comment(),
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(&['*', '/']),
                Some('{') if self.peek_at(1) == Some('-') => self.skip_block_comment(&['-', '}']),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, close: &[char]) {
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.src[self.pos..].starts_with(close) {
                self.pos += close.len();
                return;
            }
            self.pos += 1;
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        let chars: Vec<char> = s.chars().collect();
        if self.src[self.pos..].starts_with(chars.as_slice()) {
            self.pos += chars.len();
            true
        } else {
            false
        }
    }

    /// Raw identifier scan, no keyword check.
    fn try_ident(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().map(is_name_char).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(self.src[start..self.pos].iter().collect())
        }
    }

    /// Matches `kw` only when not immediately followed by another name
    /// character, so `Typed` doesn't get split into `Type` + `d`.
    fn try_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let chars: Vec<char> = kw.chars().collect();
        if self.src[self.pos..].starts_with(chars.as_slice())
            && !self.peek_at(chars.len()).map(is_name_char).unwrap_or(false)
        {
            self.pos += chars.len();
            true
        } else {
            false
        }
    }

    /// Identifier → `Var` if in lexical scope (innermost wins), else `Ref`.
    fn resolve(&self, name: &str) -> Term {
        match self.scope.iter().rev().position(|n| n.as_str() == name) {
            Some(idx) => Term::mk_var(idx),
            None => Term::mk_ref(mk_name(name)),
        }
    }

    fn parse_term(&mut self) -> ParseResult<Term> {
        let mut t = self.parse_atom()?;
        while let Some(applied) = self.try_application(&t)? {
            t = applied;
        }
        if self.eat_str("->") {
            // Non-dependent arrow: `A -> B` desugars to
            // `All relevant "" "" (shift 1 0 A) B`, with `B` parsed under
            // two fresh unnamed scopes (the implicit self and bind).
            let shifted = shift(1, 0, &t);
            self.scope.push(mk_name(""));
            self.scope.push(mk_name(""));
            let b = self.parse_term();
            self.scope.pop();
            self.scope.pop();
            t = Term::mk_all(false, mk_name(""), mk_name(""), shifted, b?);
        }
        if self.eat_str("::") {
            let ty = self.parse_term()?;
            t = Term::mk_ann(false, ty, t);
        }
        Ok(t)
    }

    fn try_application(&mut self, fun: &Term) -> ParseResult<Option<Term>> {
        let save = self.pos;
        self.skip_ws();
        if self.eat_char('(') {
            let arg = self.parse_term()?;
            if !self.eat_char(')') {
                return Err(self.no_parse());
            }
            return Ok(Some(Term::mk_app(false, fun.clone(), arg)));
        }
        if self.eat_char('<') {
            let arg = self.parse_term()?;
            if !self.eat_char('>') {
                return Err(self.no_parse());
            }
            return Ok(Some(Term::mk_app(true, fun.clone(), arg)));
        }
        if self.eat_char('|') {
            let arg = self.parse_term()?;
            if !self.eat_char(';') {
                return Err(self.no_parse());
            }
            return Ok(Some(Term::mk_app(false, fun.clone(), arg)));
        }
        self.pos = save;
        Ok(None)
    }

    fn parse_atom(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        if let Some(t) = self.try_all_or_lam()? {
            return Ok(t);
        }
        if let Some(t) = self.try_let()? {
            return Ok(t);
        }
        if self.try_keyword("Type") {
            return Ok(Term::mk_typ());
        }
        if self.eat_char('(') {
            let inner = self.parse_term()?;
            if !self.eat_char(')') {
                return Err(self.no_parse());
            }
            return Ok(inner);
        }
        if let Some(name) = self.try_ident() {
            return Ok(self.resolve(&name));
        }
        Err(self.no_parse())
    }

    /// `all`/`lam` share a `(`/`<` prefix, so both are attempted here in one
    /// pass: the bracket's interior decides which (a `:` before the close
    /// means `all`, its absence means `lam`). A leading name with no
    /// following bracket isn't `all` either — it's an ordinary `var` that
    /// will go on to take the bracket as a postfix `application` instead —
    /// so that case backtracks out entirely and returns `None`. Likewise a
    /// `lam` whose body fails to parse (most commonly the trailing `()`
    /// being a bare grouping paren, not a one-argument lambda) backtracks
    /// fully so `parse_atom`'s plain-grouping fallback gets a turn.
    fn try_all_or_lam(&mut self) -> ParseResult<Option<Term>> {
        let save_pos = self.pos;
        let save_scope = self.scope.len();
        self.skip_ws();

        let self_name_str = {
            let before = self.pos;
            match self.try_ident() {
                Some(ident) => {
                    self.skip_ws();
                    if matches!(self.peek(), Some('(') | Some('<')) {
                        Some(ident)
                    } else {
                        self.pos = before;
                        None
                    }
                }
                None => None,
            }
        };

        let erased = match self.peek() {
            Some('(') => false,
            Some('<') => true,
            _ => {
                self.pos = save_pos;
                return Ok(None);
            }
        };
        let close = if erased { '>' } else { ')' };
        self.pos += 1;

        let bind_name_str = self.try_ident();
        self.skip_ws();

        if self.peek() == Some(':') {
            self.pos += 1;
            let self_name = mk_name(self_name_str.as_deref().unwrap_or(""));
            self.scope.push(self_name.clone());
            let bind_type = self.parse_term()?;
            if !self.eat_char(close) {
                return Err(self.no_parse());
            }
            if !self.eat_str("->") {
                return Err(self.no_parse());
            }
            let bind_name = mk_name(bind_name_str.as_deref().unwrap_or(""));
            self.scope.push(bind_name.clone());
            let body = self.parse_term();
            self.scope.pop();
            self.scope.pop();
            return Ok(Some(Term::mk_all(erased, self_name, bind_name, bind_type, body?)));
        }

        // No `:` — this can only be `lam`, which never takes a leading
        // self-name. A leading name we already committed to above means
        // this wasn't `all`/`lam` at all.
        if self_name_str.is_some() || self.peek() != Some(close) {
            self.pos = save_pos;
            self.scope.truncate(save_scope);
            return Ok(None);
        }
        self.pos += 1;

        let bind_name = mk_name(bind_name_str.as_deref().unwrap_or(""));
        self.scope.push(bind_name.clone());
        let body = self.parse_term();
        self.scope.pop();
        match body {
            Ok(body) => Ok(Some(Term::mk_lam(erased, bind_name, body))),
            Err(_) => {
                self.pos = save_pos;
                self.scope.truncate(save_scope);
                Ok(None)
            }
        }
    }

    fn try_let(&mut self) -> ParseResult<Option<Term>> {
        if !self.try_keyword("let") {
            return Ok(None);
        }
        let name_str = self.try_ident().ok_or_else(|| self.no_parse())?;
        if !self.eat_char('=') {
            return Err(self.no_parse());
        }
        let expr = self.parse_term()?;
        self.eat_char(';'); // optional, per spec.md's Open Question on `let`
        let name = mk_name(&name_str);
        self.scope.push(name.clone());
        let body = self.parse_term();
        self.scope.pop();
        Ok(Some(Term::mk_let(name, expr, body?)))
    }

    fn parse_definition(&mut self) -> ParseResult<Definition> {
        let name_str = self.try_ident().ok_or_else(|| self.no_parse())?;
        if !self.eat_char(':') {
            return Err(self.no_parse());
        }
        let declared_type = self.parse_term()?;
        let body = self.parse_term()?;
        Ok(Definition::new(mk_name(&name_str), declared_type, body))
    }
}

/// Parses a single term in isolation (no surrounding module); used by tests
/// and anything else that wants raw term syntax without a definition
/// wrapper.
pub fn parse_term(src: &str) -> ParseResult<Term> {
    let mut p = Parser::new(src);
    let t = p.parse_term()?;
    if !p.at_eof() {
        return Err(ParseErr::UnexpectedTrailing(p.pos_of(p.pos)));
    }
    Ok(t)
}

/// `module ::= { definition }`, reporting "expected EOF" when trailing
/// residue remains that isn't itself the start of another definition.
pub fn parse_module(src: &str) -> ParseResult<Module> {
    let mut p = Parser::new(src);
    let mut module = Module::new();
    loop {
        if p.at_eof() {
            return Ok(module);
        }
        let save = p.pos;
        match p.parse_definition() {
            Ok(def) => {
                module.insert(def);
            }
            Err(_) => {
                p.pos = save;
                return Err(ParseErr::UnexpectedTrailing(p.pos_of(p.pos)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_keyword() {
        assert!(parse_term("Type").unwrap().is_typ());
    }

    #[test]
    fn resolves_bound_variable_to_var() {
        let t = parse_term("(x) x").unwrap();
        match t.inner() {
            crate::term::InnerTerm::Lam { body, .. } => assert_eq!(body.as_var(), Some(0)),
            _ => panic!("expected Lam"),
        }
    }

    #[test]
    fn resolves_free_identifier_to_ref() {
        let t = parse_term("foo").unwrap();
        assert_eq!(t.as_ref_name().map(Name::as_str), Some("foo"));
    }

    #[test]
    fn parses_relevant_application() {
        let t = parse_term("f(x)").unwrap();
        match t.inner() {
            crate::term::InnerTerm::App { erased, .. } => assert!(!erased),
            _ => panic!("expected App"),
        }
    }

    #[test]
    fn parses_erased_application() {
        let t = parse_term("f<x>").unwrap();
        match t.inner() {
            crate::term::InnerTerm::App { erased, .. } => assert!(*erased),
            _ => panic!("expected App"),
        }
    }

    #[test]
    fn parses_pipe_application() {
        let t = parse_term("f|x;").unwrap();
        match t.inner() {
            crate::term::InnerTerm::App { erased, .. } => assert!(!erased),
            _ => panic!("expected App"),
        }
    }

    #[test]
    fn parses_dependent_all_with_named_bind() {
        let t = parse_term("(A : Type) -> A").unwrap();
        match t.inner() {
            crate::term::InnerTerm::All { erased, bind_type, body, .. } => {
                assert!(!erased);
                assert!(bind_type.is_typ());
                assert_eq!(body.as_var(), Some(0));
            }
            _ => panic!("expected All"),
        }
    }

    #[test]
    fn parses_non_dependent_arrow_desugaring() {
        let t = parse_term("Type -> Type").unwrap();
        match t.inner() {
            crate::term::InnerTerm::All { bind_type, body, .. } => {
                assert!(bind_type.is_typ());
                assert!(body.is_typ());
            }
            _ => panic!("expected All"),
        }
    }

    #[test]
    fn bare_parens_fall_back_to_grouping() {
        let t = parse_term("(Type)").unwrap();
        assert!(t.is_typ());
    }

    #[test]
    fn parses_let() {
        let t = parse_term("let x = Type; x").unwrap();
        match t.inner() {
            crate::term::InnerTerm::Let { expr, body, .. } => {
                assert!(expr.is_typ());
                assert_eq!(body.as_var(), Some(0));
            }
            _ => panic!("expected Let"),
        }
    }

    #[test]
    fn parses_let_without_trailing_semicolon() {
        let t = parse_term("let x = Type x").unwrap();
        assert!(matches!(t.inner(), crate::term::InnerTerm::Let { .. }));
    }

    #[test]
    fn parses_annotation() {
        let t = parse_term("Type :: Type").unwrap();
        assert!(matches!(t.inner(), crate::term::InnerTerm::Ann { .. }));
    }

    #[test]
    fn skips_all_four_comment_styles() {
        let t = parse_term("// line\n-- line\n/* block */ {- block -} Type").unwrap();
        assert!(t.is_typ());
    }

    #[test]
    fn shadowing_resolves_to_the_inner_binder() {
        let t = parse_term("(A) (A) A").unwrap();
        match t.inner() {
            crate::term::InnerTerm::Lam { body, .. } => match body.inner() {
                crate::term::InnerTerm::Lam { body, .. } => assert_eq!(body.as_var(), Some(0)),
                _ => panic!("expected inner Lam"),
            },
            _ => panic!("expected outer Lam"),
        }
    }

    #[test]
    fn parses_a_module_with_two_definitions() {
        let module = parse_module("id : Type Type\nid2 : Type Type\n").unwrap();
        assert_eq!(module.len(), 2);
    }

    #[test]
    fn reports_unexpected_trailing_on_residue() {
        let err = parse_module("id : Type Type\n)").unwrap_err();
        assert!(matches!(err, ParseErr::UnexpectedTrailing(_)));
    }

    #[test]
    fn parses_the_identity_scenario() {
        let module =
            parse_module("identity : (A : Type) -> (a : A) -> A\n(A) (a) a\n").unwrap();
        let def = module.get(&Name::new("identity").unwrap()).unwrap();
        assert!(matches!(def.body.inner(), crate::term::InnerTerm::Lam { .. }));
    }
}
