//! Backend reconfiguration primitives (§4.3), driven directly through
//! `BackendHandle`s wired to real loopback listeners on ephemeral
//! ports — the backend only ever talks to peers by dialing their
//! `endpoint`, so there is no in-memory shortcut around the socket.

use tokio::net::TcpListener;

use ringkv::backend::{server, BackendActor, BackendHandle};
use ringkv::rpc::messages::{
    CopyArgs, CopyBulkArgs, GetReplicasArgs, GetRequestArgs, LookupArgs, ReplaceArgs, ReplicaRef,
};

async fn spawn_backend(id: &str, weight: u32) -> (String, BackendHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = listener.local_addr().unwrap().to_string();
    let handle = BackendActor::spawn(id.to_string(), weight, endpoint.clone());
    let server_handle = handle.clone();
    tokio::spawn(async move {
        server::run(listener, server_handle).await;
    });
    (endpoint, handle)
}

async fn full_scan(handle: &BackendHandle) -> std::collections::HashMap<String, ringkv::rpc::messages::UserStateWire> {
    handle
        .copy_bulk(CopyBulkArgs { start: 0, end: u64::MAX, key: String::new(), dst: None })
        .await
        .states
}

#[tokio::test]
async fn get_request_replicates_to_named_peer() {
    let (_a_ep, a) = spawn_backend("A", 1).await;
    let (b_ep, _b) = spawn_backend("B", 1).await;

    let ack = a
        .get_replicas(GetReplicasArgs {
            replicas: vec![ReplicaRef { parent_key: "B".into(), key: "B".into(), endpoint: b_ep }],
        })
        .await;
    assert!(ack.success);

    let ack = a.get_request(GetRequestArgs { id: "alice".into(), node_id: "A".into() }).await;
    assert!(ack.success);

    // replState dials B via GetNext in A's partial ring; give the
    // outbound RecvState call a moment to land.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let b_states = full_scan(&_b).await;
    let alice = b_states.get("alice").expect("alice replicated to B");
    assert_eq!(alice.primary_key, "A");
}

#[tokio::test]
async fn get_request_before_replicas_known_goes_unreplicated_then_catches_up() {
    let (_a_ep, a) = spawn_backend("A", 1).await;
    let (b_ep, b) = spawn_backend("B", 1).await;

    // No GetReplicas yet: replState has nothing to dial, alice is unreplicated.
    let ack = a.get_request(GetRequestArgs { id: "alice".into(), node_id: "A".into() }).await;
    assert!(ack.success);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(full_scan(&b).await.is_empty());

    // GetReplicas arrives late; tryReplicate drains the unreplicated list.
    a.get_replicas(GetReplicasArgs {
        replicas: vec![ReplicaRef { parent_key: "B".into(), key: "B".into(), endpoint: b_ep }],
    })
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(full_scan(&b).await.contains_key("alice"));
}

#[tokio::test]
async fn lookup_pulls_arc_and_rewrites_primary_and_replica_keys() {
    let (old_ep, old) = spawn_backend("OLD", 1).await;
    let (_new_ep, new_node) = spawn_backend("NEW", 1).await;

    old.get_request(GetRequestArgs { id: "bob".into(), node_id: "OLD".into() }).await;

    // NEW must know OLD as its successor parent before it can GetNextParentWithKey.
    new_node
        .get_replicas(GetReplicasArgs {
            replicas: vec![ReplicaRef { parent_key: "OLD".into(), key: "OLD".into(), endpoint: old_ep }],
        })
        .await;

    let ack = new_node
        .lookup(LookupArgs { start: 0, end: u64::MAX, key: "NEW".into(), dst: None })
        .await;
    assert!(ack.success);

    let new_states = full_scan(&new_node).await;
    let bob = new_states.get("bob").expect("bob pulled onto NEW");
    assert_eq!(bob.primary_key, "NEW");
    assert_eq!(bob.replica_key, "OLD");
}

#[tokio::test]
async fn remove_all_only_drops_matching_primary_key() {
    let (_ep, node) = spawn_backend("N", 1).await;
    node.get_request(GetRequestArgs { id: "u1".into(), node_id: "P".into() }).await;
    node.get_request(GetRequestArgs { id: "u2".into(), node_id: "Q".into() }).await;

    node.remove_all(ringkv::rpc::messages::RemoveAllArgs { id: "P".into() }).await;

    let states = full_scan(&node).await;
    assert!(!states.contains_key("u1"));
    assert!(states.contains_key("u2"));
}

#[tokio::test]
async fn copy_reselects_successor_after_replace() {
    let (_prev_ep, prev) = spawn_backend("PREV", 1).await;
    let (old_ep, old_replica) = spawn_backend("OLDREP", 1).await;
    let (new_ep, new_replica) = spawn_backend("NEWREP", 1).await;

    // prev currently replicates "carol" onto OLDREP.
    prev.get_replicas(GetReplicasArgs {
        replicas: vec![ReplicaRef { parent_key: "OLDREP".into(), key: "OLDREP".into(), endpoint: old_ep }],
    })
    .await;
    prev.get_request(GetRequestArgs { id: "carol".into(), node_id: "PREV".into() }).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(full_scan(&old_replica).await.contains_key("carol"));

    // Leave(OLDREP): prev's partial ring swaps OLDREP for NEWREP, then
    // Copy re-replicates everything keyed on the old point ("OLDREP").
    prev.replace(ReplaceArgs {
        old: "OLDREP".into(),
        new: ReplicaRef { parent_key: "NEWREP".into(), key: "NEWREP".into(), endpoint: new_ep },
    })
    .await;
    prev.copy(CopyArgs { target: "OLDREP".into() }).await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let landed_on_new = full_scan(&new_replica).await.contains_key("carol");
    let landed_on_old = full_scan(&old_replica).await.contains_key("carol");
    assert!(landed_on_new || landed_on_old, "Copy must re-replicate carol somewhere");
}
