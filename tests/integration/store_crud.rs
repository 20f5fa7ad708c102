//! End-to-end CRUD over the in-memory backend.

use ombra::kv::mem::MemStore;
use ombra::storage::Direction;
use ombra::{EdgeId, EdgeUid, Graph, GraphError, LabelId, StoreOptions, TemporalId, VertexId};

fn graph() -> Graph {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Graph::new(StoreOptions::default())
}

#[test]
fn build_and_query_a_small_graph() {
    let store = MemStore::new();
    let g = graph();
    let txn = store.write_txn();

    let alice = g.add_vertex(&txn, b"alice").unwrap();
    let bob = g.add_vertex(&txn, b"bob").unwrap();
    let carol = g.add_vertex(&txn, b"carol").unwrap();

    let knows = LabelId(1);
    let follows = LabelId(2);
    let t0 = TemporalId(0);
    let ab = g.add_edge(&txn, alice, bob, knows, t0, b"since 2019").unwrap();
    g.add_edge(&txn, alice, carol, knows, t0, b"").unwrap();
    g.add_edge(&txn, bob, alice, follows, t0, b"").unwrap();

    assert_eq!(g.num_out_edges(&txn, alice, None).unwrap(), Some((2, false)));
    assert_eq!(g.num_in_edges(&txn, alice, None).unwrap(), Some((1, false)));
    assert_eq!(g.num_edges_with_label(&txn, knows).unwrap(), 2);
    assert_eq!(g.num_edges_with_label(&txn, follows).unwrap(), 1);

    let page = g.list_dst_vids(&txn, alice, None, 10).unwrap().unwrap();
    assert_eq!(page.vids, vec![bob, carol]);

    assert_eq!(
        g.get_edge_property(&txn, &ab).unwrap().unwrap().as_ref(),
        b"since 2019"
    );
    assert!(g.set_edge_property(&txn, &ab, b"since 2020").unwrap());

    // reciprocal entry sees the update too
    let mut it = g.edge_iterator(&txn, Direction::In, bob);
    assert!(it.goto_first().unwrap());
    assert_eq!(it.property().unwrap().as_ref(), b"since 2020");
}

#[test]
fn changes_persist_across_transactions() {
    let store = MemStore::new();
    let g = graph();
    let (a, b, uid) = {
        let txn = store.write_txn();
        let a = g.add_vertex(&txn, b"a").unwrap();
        let b = g.add_vertex(&txn, b"b").unwrap();
        let uid = g.add_edge(&txn, a, b, LabelId(1), TemporalId(3), b"p").unwrap();
        (a, b, uid)
    };
    let txn = store.read_txn();
    assert!(g.vertex_exists(&txn, a).unwrap());
    assert_eq!(g.get_vertex_property(&txn, b).unwrap().unwrap().as_ref(), b"b");
    assert_eq!(g.get_edge_property(&txn, &uid).unwrap().unwrap().as_ref(), b"p");
    assert_eq!(g.next_vid(&txn).unwrap(), VertexId(2));
}

#[test]
fn absent_things_read_as_absent_not_as_errors() {
    let store = MemStore::new();
    let g = graph();
    let txn = store.write_txn();
    let a = g.add_vertex(&txn, b"").unwrap();
    let b = g.add_vertex(&txn, b"").unwrap();

    let ghost = EdgeUid::new(a, b, LabelId(5), TemporalId(0), EdgeId(0));
    assert!(g.get_edge_property(&txn, &ghost).unwrap().is_none());
    assert!(!g.delete_edge(&txn, &ghost).unwrap());
    assert!(!g.set_edge_property(&txn, &ghost, b"x").unwrap());
    assert!(g.get_vertex_property(&txn, VertexId(42)).unwrap().is_none());
    assert!(!g.delete_vertex(&txn, VertexId(42), None).unwrap());
    assert!(g.num_out_edges(&txn, VertexId(42), None).unwrap().is_none());
}

#[test]
fn error_taxonomy() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().max_prop_size(4));
    {
        let txn = store.write_txn();
        g.add_vertex(&txn, b"ok").unwrap();
    }
    let ro = store.read_txn();
    assert!(matches!(g.add_vertex(&ro, b"").unwrap_err(), GraphError::ReadOnlyTxn));

    let txn = store.write_txn();
    assert!(matches!(
        g.add_vertex(&txn, b"too big").unwrap_err(),
        GraphError::InvalidArgument(_)
    ));
    assert!(matches!(
        g.add_edge(&txn, VertexId(0), VertexId(7), LabelId(1), TemporalId(0), b"")
            .unwrap_err(),
        GraphError::NotFound(_)
    ));
}

#[test]
fn delete_vertex_cleans_a_bidirectional_clique() {
    let store = MemStore::new();
    let g = graph();
    let txn = store.write_txn();
    let vids: Vec<_> = (0..5).map(|_| g.add_vertex(&txn, b"").unwrap()).collect();
    for &s in &vids {
        for &d in &vids {
            g.add_edge(&txn, s, d, LabelId(1), TemporalId(0), b"").unwrap();
        }
    }
    assert_eq!(g.num_edges_with_label(&txn, LabelId(1)).unwrap(), 25);

    assert!(g.delete_vertex(&txn, vids[2], None).unwrap());
    // 5 out, 5 in, one of them the loop counted once
    assert_eq!(g.num_edges_with_label(&txn, LabelId(1)).unwrap(), 16);
    for &v in vids.iter().filter(|&&v| v != vids[2]) {
        assert_eq!(g.num_out_edges(&txn, v, None).unwrap(), Some((4, false)));
        assert_eq!(g.num_in_edges(&txn, v, None).unwrap(), Some((4, false)));
        let page = g.list_dst_vids(&txn, v, None, 10).unwrap().unwrap();
        assert!(!page.vids.contains(&vids[2]));
    }
}

#[test]
fn tid_orders_edges_within_a_label() {
    let store = MemStore::new();
    let g = graph();
    let txn = store.write_txn();
    let a = g.add_vertex(&txn, b"").unwrap();
    let b = g.add_vertex(&txn, b"").unwrap();
    for tid in [5u64, 1, 9, 3] {
        g.add_edge(&txn, a, b, LabelId(1), TemporalId(tid), b"").unwrap();
    }
    let mut it = g.edge_iterator(&txn, Direction::Out, a);
    assert!(it.goto_first().unwrap());
    let mut tids = vec![it.edge().unwrap().tid.0];
    while it.next().unwrap() {
        tids.push(it.edge().unwrap().tid.0);
    }
    assert_eq!(tids, vec![1, 3, 5, 9]);
}
