//! Module glue (spec.md §3 "Module", §3 "Definition"): a name → definition
//! map built once per check and consumed read-only thereafter (§3
//! Lifecycle).

use indexmap::IndexMap;

use crate::errors::TypeError;
use crate::hash::Hash;
use crate::name::Name;
use crate::term::Term;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub name: Name,
    pub declared_type: Term,
    pub body: Term,
    pub hash: Hash,
}

impl Definition {
    pub fn new(name: Name, declared_type: Term, body: Term) -> Definition {
        let hash = declared_type.hash().combine(body.hash());
        Definition { name, declared_type, body, hash }
    }
}

/// Name → definition map, backed by an `IndexMap` so textual insertion
/// order survives for round-tripping (spec.md §3: "preserves insertion
/// order only for textual round-tripping; equality depends only on
/// contents"), plus an aggregate hash folding every definition's hash in
/// insertion order.
#[derive(Clone, Debug, Default)]
pub struct Module {
    defs: IndexMap<Name, Definition>,
    hash: Hash,
}

impl Module {
    pub fn new() -> Module {
        Module { defs: IndexMap::new(), hash: Hash::ZERO }
    }

    /// Returns the previous definition of the same name, if any shadowed
    /// one existed — callers decide whether that's an error (the parser
    /// grammar doesn't forbid name reuse across definitions; spec.md is
    /// silent on it, so this module just reports the fact).
    pub fn insert(&mut self, def: Definition) -> Option<Definition> {
        self.hash = self.hash.combine(def.hash);
        self.defs.insert(def.name.clone(), def)
    }

    pub fn get(&self, name: &Name) -> Option<&Definition> {
        self.defs.get(name)
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Runs `check([], [], declared_type, body)` for every definition,
    /// independently: one failing definition does not stop the rest from
    /// being checked (spec.md §7's propagation policy — "the first error
    /// in a given definition aborts that definition's check ... other
    /// definitions continue to be checked independently").
    pub fn check(&self) -> Vec<(Name, TypeError)> {
        let mut failures = Vec::new();
        for def in self.defs.values() {
            if let Err(e) = crate::check::check(self, &[], &[], &def.declared_type, &def.body) {
                failures.push((def.name.clone(), e));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn aggregate_hash_folds_definitions_in_insertion_order() {
        let mut m = Module::new();
        let d1 = Definition::new(n("a"), Term::mk_typ(), Term::mk_typ());
        let d2 = Definition::new(n("b"), Term::mk_typ(), Term::mk_typ());
        m.insert(d1.clone());
        m.insert(d2.clone());
        assert_eq!(m.hash(), Hash::ZERO.combine(d1.hash).combine(d2.hash));
    }

    #[test]
    fn insertion_order_is_preserved_for_iteration() {
        let mut m = Module::new();
        m.insert(Definition::new(n("z"), Term::mk_typ(), Term::mk_typ()));
        m.insert(Definition::new(n("a"), Term::mk_typ(), Term::mk_typ()));
        let names: Vec<&str> = m.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
