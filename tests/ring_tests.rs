//! Ring invariants (§8.1) exercised against the public `Ring` API.

use proptest::prelude::*;
use ringkv::ring::Ring;

#[derive(Debug, Clone)]
enum Op {
    Add(String, u32),
    Remove(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let id = "[A-E]";
    prop_oneof![
        (id, 1u32..5).prop_map(|(id, w)| Op::Add(id.to_string(), w)),
        id.prop_map(|id| Op::Remove(id.to_string())),
    ]
}

fn is_sorted(ring: &Ring) -> bool {
    ring.points().windows(2).all(|w| w[0].hash <= w[1].hash)
}

proptest! {
    /// §8.1.1: sorted-by-hash order survives any Add/Remove sequence.
    #[test]
    fn sorted_order_is_maintained(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut ring = Ring::new();
        for op in ops {
            match op {
                Op::Add(id, w) => { ring.add_node(&id, w, &format!(":{id}")); }
                Op::Remove(id) => { ring.remove_node(&id); }
            }
        }
        prop_assert!(is_sorted(&ring));
    }

    /// §8.1.2: AddNode(id, w, ..) creates exactly w points sharing parentHash.
    #[test]
    fn add_node_weight_invariant(w in 1u32..8) {
        let mut ring = Ring::new();
        ring.add_node("X", w, ":1");
        let points = ring.points_of("X");
        prop_assert_eq!(points.len() as u32, w);
        let parent_hash = points[0].parent_hash;
        prop_assert!(points.iter().all(|p| p.parent_hash == parent_hash));
    }

    /// §8.1.3: RemoveNode(id) drops every point of id and shrinks Size() by one.
    #[test]
    fn remove_node_invariant(w1 in 1u32..5, w2 in 1u32..5) {
        let mut ring = Ring::new();
        ring.add_node("X", w1, ":1");
        ring.add_node("Y", w2, ":2");
        let before = ring.size();
        ring.remove_node("X");
        prop_assert_eq!(ring.size(), before - 1);
        prop_assert!(ring.points_of("X").is_empty());
    }

    /// §8.1.4: GetNextParent disagrees with p.parentHash whenever Size() >= 2,
    /// and is nil (None) for a single physical node.
    #[test]
    fn get_next_parent_invariant(weights in prop::collection::vec(1u32..4, 1..5)) {
        let mut ring = Ring::new();
        for (i, w) in weights.iter().enumerate() {
            let id = format!("N{i}");
            ring.add_node(&id, *w, &format!(":{i}"));
        }
        for id in 0..weights.len() {
            let id = format!("N{id}");
            for p in ring.points_of(&id) {
                let next = ring.get_next_parent(&p);
                if ring.size() >= 2 {
                    prop_assert!(next.is_some());
                    prop_assert_ne!(next.unwrap().parent_hash, p.parent_hash);
                } else {
                    prop_assert!(next.is_none());
                }
            }
        }
    }
}

#[test]
fn get_next_wraps_around() {
    let mut ring = Ring::new();
    ring.add_node("A", 1, ":1");
    ring.add_node("B", 1, ":2");
    // Every key must resolve to a point; wrap-around is exercised simply
    // by requiring GetNext to always return Some on a non-empty ring.
    for key in ["zzz", "aaa", "middle", ""] {
        assert!(ring.get_next(key).is_some());
    }
}

#[test]
fn single_point_ring_returns_that_point() {
    let mut ring = Ring::new();
    ring.add_node("solo", 1, ":1");
    let p = ring.get_next("anything").unwrap();
    assert_eq!(p.parent_key, "solo");
}

#[test]
fn deterministic_hash_matches_sha256() {
    assert_eq!(ringkv::hash::gen_hash("A"), ringkv::hash::gen_hash("A"));
}
