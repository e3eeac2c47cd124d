//! The consistent-hash ring itself (§4.1).
//!
//! A `Vec<RingPoint>` kept sorted by `hash`, plus a `parent_key -> primary
//! point` map for membership queries and duplicate detection — the same
//! shape `replication::HashRing` in the cache-server ancestor of this crate
//! used, generalized from a fixed virtual-node count to per-node `weight`
//! and from `DefaultHasher` to the spec's SHA-256-based `gen_hash`.
//!
//! Not thread-safe by design (§4.1): every mutation here happens on a
//! single actor task that owns the ring outright (§5).

use std::collections::HashMap;

use super::point::RingPoint;
use crate::hash::{gen_hash, vkey};

#[derive(Debug, Clone, Default)]
pub struct Ring {
    /// All points, kept sorted by `hash`.
    points: Vec<RingPoint>,
    /// Physical nodes registered via `add_node`, keyed by id.
    parents: HashMap<String, RingPoint>,
}

impl Ring {
    pub fn new() -> Self {
        Ring {
            points: Vec::new(),
            parents: HashMap::new(),
        }
    }

    /// Register a physical node and its `weight` points. Returns `false`
    /// if `id` is already a member.
    pub fn add_node(&mut self, id: &str, weight: u32, endpoint: &str) -> bool {
        debug_assert!(weight >= 1, "node weight must be at least 1");
        if self.parents.contains_key(id) {
            return false;
        }

        let primary_hash = gen_hash(id);
        let primary = RingPoint {
            hash: primary_hash,
            key: id.to_string(),
            parent_key: id.to_string(),
            parent_hash: primary_hash,
            weight,
            endpoint: endpoint.to_string(),
        };
        self.parents.insert(id.to_string(), primary.clone());
        self.points.push(primary);

        for n in 1..weight {
            let key = vkey(id, n);
            let hash = gen_hash(&key);
            self.points.push(RingPoint {
                hash,
                key,
                parent_key: id.to_string(),
                parent_hash: primary_hash,
                weight,
                endpoint: endpoint.to_string(),
            });
        }

        self.resort();
        true
    }

    /// Remember a single foreign point (used by backends to track a
    /// replica or a pull-source). Not idempotent: returns `false` if a
    /// point with this `key` already exists.
    pub fn add_solo(&mut self, key: &str, parent_key: &str, endpoint: &str) -> bool {
        if self.points.iter().any(|p| p.key == key) {
            return false;
        }
        let hash = gen_hash(key);
        let parent_hash = gen_hash(parent_key);
        self.points.push(RingPoint {
            hash,
            key: key.to_string(),
            parent_key: parent_key.to_string(),
            parent_hash,
            weight: 1,
            endpoint: endpoint.to_string(),
        });
        self.resort();
        true
    }

    /// Remove a physical node and every point it owns. No-op if absent.
    pub fn remove_node(&mut self, id: &str) {
        if let Some(primary) = self.parents.remove(id) {
            let parent_hash = primary.parent_hash;
            self.points.retain(|p| p.parent_hash != parent_hash);
        }
    }

    /// Remove exactly one point by key. No-op if absent.
    pub fn remove_solo(&mut self, key: &str) {
        self.points.retain(|p| p.key != key);
    }

    /// Number of physical nodes (not points).
    pub fn size(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points on the ring, in sorted order.
    pub fn points(&self) -> &[RingPoint] {
        &self.points
    }

    /// All points belonging to physical node `id`, in ring order.
    pub fn points_of(&self, id: &str) -> Vec<RingPoint> {
        self.points.iter().filter(|p| p.parent_key == id).cloned().collect()
    }

    pub fn get_point_by_key(&self, key: &str) -> Option<RingPoint> {
        self.points.iter().find(|p| p.key == key).cloned()
    }

    /// Successor point of `H(key)`, wrapping around. `None` iff the ring
    /// is empty.
    pub fn get_next(&self, key: &str) -> Option<RingPoint> {
        if self.points.is_empty() {
            return None;
        }
        let h = gen_hash(key);
        let idx = self.first_at_or_after(h);
        Some(self.points[if idx >= self.points.len() { 0 } else { idx }].clone())
    }

    /// First successor of `p` whose `parent_hash` differs from `p`'s.
    /// `None` iff every point shares one `parent_hash` (single physical node).
    pub fn get_next_parent(&self, p: &RingPoint) -> Option<RingPoint> {
        self.walk_for_next_parent(p, None)
    }

    /// Successor point of `H(key)`, skipping any point owned by
    /// `exclude_parent_key`, wrapping around. Used by a backend to find
    /// its designated replica for a user id without ever resolving to
    /// one of its own points. `None` if no other physical node is
    /// present in the (partial) ring.
    pub fn get_next_excluding(&self, key: &str, exclude_parent_key: &str) -> Option<RingPoint> {
        if self.points.is_empty() {
            return None;
        }
        let h = gen_hash(key);
        let start = self.first_at_or_after(h);
        let n = self.points.len();
        for step in 0..n {
            let idx = (start + step) % n;
            let candidate = &self.points[idx];
            if candidate.parent_key != exclude_parent_key {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// Same as `get_next_parent`, also skipping points whose `parent_key`
    /// equals `exclude_parent_key`.
    pub fn get_next_except(&self, p: &RingPoint, exclude_parent_key: &str) -> Option<RingPoint> {
        self.walk_for_next_parent(p, Some(exclude_parent_key))
    }

    /// Same search as `get_next_parent`, walking backward instead.
    pub fn get_prev_parent(&self, p: &RingPoint) -> Option<RingPoint> {
        let n = self.points.len();
        let start = self.index_of(p)?;
        for step in 1..=n {
            let idx = (start + n - step) % n;
            let candidate = &self.points[idx];
            if candidate.parent_hash != p.parent_hash {
                return Some(candidate.clone());
            }
        }
        None
    }

    fn walk_for_next_parent(&self, p: &RingPoint, exclude_parent_key: Option<&str>) -> Option<RingPoint> {
        let n = self.points.len();
        let start = self.index_of(p)?;
        for step in 1..=n {
            let idx = (start + step) % n;
            let candidate = &self.points[idx];
            if candidate.parent_hash != p.parent_hash
                && exclude_parent_key.map_or(true, |ex| candidate.parent_key != ex)
            {
                return Some(candidate.clone());
            }
        }
        None
    }

    fn index_of(&self, p: &RingPoint) -> Option<usize> {
        self.points.iter().position(|x| x.key == p.key)
    }

    /// Index of the first point with `hash >= h` (or `points.len()` if
    /// none), giving the "first encountered" point on a hash tie.
    fn first_at_or_after(&self, h: u64) -> usize {
        self.points.partition_point(|p| p.hash < h)
    }

    fn resort(&mut self) {
        self.points.sort_by_key(|p| p.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted(ring: &Ring) -> bool {
        ring.points.windows(2).all(|w| w[0].hash <= w[1].hash)
    }

    #[test]
    fn add_node_rejects_duplicate() {
        let mut ring = Ring::new();
        assert!(ring.add_node("A", 1, ":1"));
        assert!(!ring.add_node("A", 1, ":1"));
    }

    #[test]
    fn add_node_creates_weight_points_sharing_parent_hash() {
        let mut ring = Ring::new();
        ring.add_node("A", 3, ":1");
        let points = ring.points_of("A");
        assert_eq!(points.len(), 3);
        let parent_hash = points[0].parent_hash;
        assert!(points.iter().all(|p| p.parent_hash == parent_hash));
        assert!(is_sorted(&ring));
    }

    #[test]
    fn remove_node_drops_all_its_points() {
        let mut ring = Ring::new();
        ring.add_node("A", 1, ":1");
        ring.add_node("B", 3, ":2");
        let before = ring.size();
        ring.remove_node("B");
        assert_eq!(ring.size(), before - 1);
        assert!(ring.points_of("B").is_empty());
        assert!(is_sorted(&ring));
    }

    #[test]
    fn remove_node_is_noop_when_absent() {
        let mut ring = Ring::new();
        ring.add_node("A", 1, ":1");
        ring.remove_node("ghost");
        assert_eq!(ring.size(), 1);
    }

    #[test]
    fn single_node_has_no_next_parent() {
        let mut ring = Ring::new();
        ring.add_node("A", 2, ":1");
        let primary = ring.get_point_by_key("A").unwrap();
        assert!(ring.get_next_parent(&primary).is_none());
        assert!(ring.get_prev_parent(&primary).is_none());
        // GetNext still resolves on a single-node ring.
        assert!(ring.get_next("anything").is_some());
    }

    #[test]
    fn get_next_excluding_never_resolves_to_excluded_parent() {
        let mut ring = Ring::new();
        ring.add_node("A", 3, ":1");
        ring.add_node("B", 1, ":2");
        for key in ["alice", "bob", "zzz", "a", ""] {
            let replica = ring.get_next_excluding(key, "A").unwrap();
            assert_eq!(replica.parent_key, "B");
        }
    }

    #[test]
    fn get_next_excluding_is_none_when_only_excluded_parent_present() {
        let mut ring = Ring::new();
        ring.add_node("A", 2, ":1");
        assert!(ring.get_next_excluding("anything", "A").is_none());
    }

    #[test]
    fn get_next_parent_skips_same_parent_and_wraps() {
        let mut ring = Ring::new();
        ring.add_node("A", 5, ":1");
        ring.add_node("B", 1, ":2");
        let a_primary = ring.get_point_by_key("A").unwrap();
        let next = ring.get_next_parent(&a_primary).unwrap();
        assert_eq!(next.parent_key, "B");
        let prev = ring.get_prev_parent(&a_primary).unwrap();
        assert_eq!(prev.parent_key, "B");
    }

    #[test]
    fn get_next_except_also_skips_named_parent() {
        let mut ring = Ring::new();
        ring.add_node("A", 1, ":1");
        ring.add_node("B", 1, ":2");
        ring.add_node("C", 1, ":3");
        let a = ring.get_point_by_key("A").unwrap();
        let next_parent = ring.get_next_parent(&a).unwrap();
        let next_except = ring.get_next_except(&a, &next_parent.parent_key).unwrap();
        assert_ne!(next_except.parent_key, next_parent.parent_key);
    }

    #[test]
    fn empty_ring_returns_none() {
        let ring = Ring::new();
        assert!(ring.get_next("key").is_none());
        assert_eq!(ring.size(), 0);
    }

    #[test]
    fn add_solo_is_not_idempotent() {
        let mut ring = Ring::new();
        assert!(ring.add_solo("X", "X", ":9"));
        assert!(!ring.add_solo("X", "X", ":9"));
        assert_eq!(ring.size(), 0, "add_solo never registers physical membership");
    }

    #[test]
    fn replace_drops_old_and_adds_new_solo() {
        let mut ring = Ring::new();
        ring.add_solo("old", "P", ":1");
        ring.remove_solo("old");
        assert!(ring.add_solo("new", "Q", ":2"));
        assert!(ring.get_point_by_key("old").is_none());
        assert!(ring.get_point_by_key("new").is_some());
    }
}
