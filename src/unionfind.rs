//! Mutable union-find over term-hash keys (spec.md §4.4), with weighted
//! union and full path compression.
//!
//! Follows spec.md §9's own guidance ("a flat vector of parent/weight pairs
//! indexed by dense identifiers is preferable to a heap-allocated node
//! graph"), implemented as a `HashMap`-backed dense-index scheme rather
//! than a pointer-chasing node graph.
//!
//! Every node additionally carries the value it was inserted with. Two
//! different values can share a 32-bit digest (spec.md §9's flagged
//! collision bug); rather than silently letting a false collision merge
//! unrelated terms into one class, `key_of` only reuses an existing slot
//! for a digest when the stored value is structurally equal to the
//! incoming one — a colliding-but-distinct value gets its own slot under
//! the same digest, so it can never be spuriously found equivalent to the
//! thing it collides with.

use hashbrown::HashMap;

type Slot = (u32, usize);

struct Node<T> {
    parent: Slot,
    weight: u32,
    #[allow(dead_code)]
    value: T,
}

pub struct UnionFind<T> {
    buckets: HashMap<u32, Vec<Slot>, fxhash::FxBuildHasher>,
    nodes: HashMap<Slot, Node<T>, fxhash::FxBuildHasher>,
}

impl<T: Clone + PartialEq> UnionFind<T> {
    pub fn new() -> UnionFind<T> {
        UnionFind { buckets: HashMap::default(), nodes: HashMap::default() }
    }

    /// Finds (or creates) the slot for `(digest, value)`, deduplicating
    /// structurally-equal values that share a digest and disambiguating
    /// ones that merely collide.
    fn key_of(&mut self, digest: u32, value: &T) -> Slot {
        let existing = {
            let bucket = self.buckets.entry(digest).or_insert_with(Vec::new);
            bucket.iter().find(|slot| self.nodes[slot].value == *value).copied()
        };
        if let Some(slot) = existing {
            return slot;
        }
        let idx = self.buckets.get(&digest).map(|b| b.len()).unwrap_or(0);
        let slot = (digest, idx);
        self.buckets.entry(digest).or_insert_with(Vec::new).push(slot);
        self.nodes.insert(slot, Node { parent: slot, weight: 1, value: value.clone() });
        slot
    }

    pub fn singleton(&mut self, digest: u32, value: &T) {
        self.key_of(digest, value);
    }

    fn find_root(&mut self, slot: Slot) -> Slot {
        let mut path = Vec::new();
        let mut cur = slot;
        while self.nodes[&cur].parent != cur {
            path.push(cur);
            cur = self.nodes[&cur].parent;
        }
        for p in path {
            self.nodes.get_mut(&p).unwrap().parent = cur;
        }
        cur
    }

    pub fn union(&mut self, a_digest: u32, a_value: &T, b_digest: u32, b_value: &T) {
        let a = self.key_of(a_digest, a_value);
        let b = self.key_of(b_digest, b_value);
        let ra = self.find_root(a);
        let rb = self.find_root(b);
        if ra == rb {
            return;
        }
        let wa = self.nodes[&ra].weight;
        let wb = self.nodes[&rb].weight;
        if wa < wb {
            self.nodes.get_mut(&ra).unwrap().parent = rb;
            self.nodes.get_mut(&rb).unwrap().weight = wa + wb;
        } else {
            self.nodes.get_mut(&rb).unwrap().parent = ra;
            self.nodes.get_mut(&ra).unwrap().weight = wa + wb;
        }
    }

    /// Alias matching spec.md §4.4's naming (`equate(v1, v2)`); identical to
    /// `union`.
    pub fn equate(&mut self, a_digest: u32, a_value: &T, b_digest: u32, b_value: &T) {
        self.union(a_digest, a_value, b_digest, b_value);
    }

    /// Auto-inserts singletons for both sides if missing, per spec.md
    /// §4.4's `isEquivalent` contract.
    pub fn is_equivalent(&mut self, a_digest: u32, a_value: &T, b_digest: u32, b_value: &T) -> bool {
        let a = self.key_of(a_digest, a_value);
        let b = self.key_of(b_digest, b_value);
        self.find_root(a) == self.find_root(b)
    }

    /// Does not insert; answers false for values never seen before.
    pub fn equivalent(&mut self, a_digest: u32, a_value: &T, b_digest: u32, b_value: &T) -> bool {
        let in_scope = |this: &Self, digest: u32, value: &T| {
            this.buckets
                .get(&digest)
                .map(|b| b.iter().any(|s| this.nodes[s].value == *value))
                .unwrap_or(false)
        };
        if !in_scope(self, a_digest, a_value) || !in_scope(self, b_digest, b_value) {
            return false;
        }
        self.is_equivalent(a_digest, a_value, b_digest, b_value)
    }
}

impl<T: Clone + PartialEq> Default for UnionFind<T> {
    fn default() -> Self {
        UnionFind::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_values_are_not_equivalent() {
        let mut uf: UnionFind<u32> = UnionFind::new();
        assert!(!uf.equivalent(1, &10, 2, &20));
    }

    #[test]
    fn equate_establishes_equivalence() {
        let mut uf: UnionFind<u32> = UnionFind::new();
        uf.equate(1, &10, 2, &20);
        assert!(uf.is_equivalent(1, &10, 2, &20));
    }

    #[test]
    fn equivalence_is_transitive_after_chained_equates() {
        let mut uf: UnionFind<u32> = UnionFind::new();
        uf.equate(1, &10, 2, &20);
        uf.equate(2, &20, 3, &30);
        assert!(uf.is_equivalent(1, &10, 3, &30));
    }

    #[test]
    fn colliding_digest_with_different_values_stays_distinct() {
        let mut uf: UnionFind<u32> = UnionFind::new();
        uf.singleton(42, &1);
        uf.singleton(42, &2);
        assert!(!uf.is_equivalent(42, &1, 42, &2));
    }

    #[test]
    fn unrelated_values_remain_unrelated() {
        let mut uf: UnionFind<u32> = UnionFind::new();
        uf.equate(1, &10, 2, &20);
        assert!(!uf.is_equivalent(1, &10, 5, &50));
    }
}
