//! Cursor semantics: nearest positioning, bidirectional movement, and the
//! refresh protocol after sibling mutations.

use ombra::kv::mem::MemStore;
use ombra::storage::Direction;
use ombra::{EdgeId, EdgeUid, Graph, LabelId, StoreOptions, TemporalId, VertexId};

const LABEL: LabelId = LabelId(1);
const T0: TemporalId = TemporalId(0);

fn fixture(threshold: usize) -> (MemStore, Graph, VertexId, Vec<VertexId>) {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(threshold));
    let (src, dsts) = {
        let txn = store.write_txn();
        let src = g.add_vertex(&txn, b"src").unwrap();
        let dsts: Vec<_> = (0..40).map(|_| g.add_vertex(&txn, b"").unwrap()).collect();
        for &d in &dsts {
            g.add_edge(&txn, src, d, LABEL, T0, &[3u8; 16]).unwrap();
        }
        (src, dsts)
    };
    (store, g, src, dsts)
}

#[test]
fn nearest_goto_lands_on_successor() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.read_txn();
    let mut it = g.edge_iterator(&txn, Direction::Out, src);

    // exact hit
    assert!(it.goto(LABEL, T0, dsts[7], EdgeId(0), false).unwrap());
    assert_eq!(it.edge().unwrap().peer, dsts[7]);

    // exact miss
    assert!(!it.goto(LABEL, T0, dsts[7], EdgeId(5), false).unwrap());

    // nearest lands on the next edge in sort order
    assert!(it.goto(LABEL, T0, dsts[7], EdgeId(5), true).unwrap());
    assert_eq!(it.edge().unwrap().peer, dsts[8]);

    // nearest past the end is invalid
    assert!(!it
        .goto(LabelId(u16::MAX), TemporalId(u64::MAX), VertexId(0), EdgeId(0), true)
        .unwrap());
}

#[test]
fn try_prev_walks_back_and_stops_at_the_front() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.read_txn();
    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto(LABEL, T0, *dsts.last().unwrap(), EdgeId(0), false).unwrap());

    for expect in dsts.iter().rev().skip(1) {
        assert!(it.try_prev().unwrap());
        assert_eq!(it.edge().unwrap().peer, *expect);
    }
    // at the first edge: no previous, position retained
    assert!(!it.try_prev().unwrap());
    assert!(it.is_valid());
    assert_eq!(it.edge().unwrap().peer, dsts[0]);
}

#[test]
fn prev_goes_invalid_past_the_front() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.read_txn();
    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto(LABEL, T0, dsts[1], EdgeId(0), false).unwrap());
    assert!(it.prev().unwrap());
    assert_eq!(it.edge().unwrap().peer, dsts[0]);
    assert!(!it.prev().unwrap());
    assert!(!it.is_valid());
    assert!(it.edge().is_none());
}

#[test]
fn walk_is_identical_packed_and_split() {
    let collect = |threshold| {
        let (store, g, src, _) = fixture(threshold);
        let txn = store.read_txn();
        let mut it = g.edge_iterator(&txn, Direction::Out, src);
        assert!(it.goto_first().unwrap());
        let mut peers = vec![it.edge().unwrap().peer];
        while it.next().unwrap() {
            peers.push(it.edge().unwrap().peer);
        }
        peers
    };
    assert_eq!(collect(1 << 24), collect(96));
}

#[test]
fn refresh_lands_on_successor_after_current_edge_deleted() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.write_txn();
    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto(LABEL, T0, dsts[10], EdgeId(0), false).unwrap());

    let doomed = EdgeUid::new(src, dsts[10], LABEL, T0, EdgeId(0));
    assert!(g.delete_edge(&txn, &doomed).unwrap());

    assert!(it.refresh_if_underlying_modified().unwrap());
    assert_eq!(it.edge().unwrap().peer, dsts[11]);
}

#[test]
fn refresh_keeps_position_across_splits() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(256));
    let txn = store.write_txn();
    let src = g.add_vertex(&txn, b"").unwrap();
    let mark = g.add_vertex(&txn, b"").unwrap();
    g.add_edge(&txn, src, mark, LABEL, T0, &[0u8; 16]).unwrap();

    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto(LABEL, T0, mark, EdgeId(0), false).unwrap());

    // churn that unpacks the vertex and splits runs repeatedly
    for _ in 0..60 {
        let d = g.add_vertex(&txn, b"").unwrap();
        g.add_edge(&txn, src, d, LABEL, T0, &[0u8; 16]).unwrap();
    }

    assert!(it.refresh_if_underlying_modified().unwrap());
    let e = it.edge().unwrap();
    assert_eq!((e.peer, e.eid), (mark, EdgeId(0)));
}

#[test]
fn stale_cursor_flags_and_heals() {
    let (store, g, src, dsts) = fixture(1 << 24);
    let txn = store.write_txn();
    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto_first().unwrap());

    // no sibling mutation: refresh is a no-op that stays valid
    assert!(it.refresh_if_underlying_modified().unwrap());

    g.add_edge(&txn, src, dsts[0], LABEL, TemporalId(99), b"").unwrap();
    assert!(it.refresh_if_underlying_modified().unwrap());
    assert_eq!(it.edge().unwrap().peer, dsts[0]);
}

#[test]
fn vertex_iterator_spans_the_whole_store() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.read_txn();
    let mut it = g.vertex_iterator(&txn);
    assert!(it.goto(VertexId(0), false));

    let mut seen = vec![it.vid().unwrap()];
    while it.next() {
        seen.push(it.vid().unwrap());
    }
    let mut expect = vec![src];
    expect.extend(dsts);
    assert_eq!(seen, expect);

    // and back
    assert!(it.goto(*expect.last().unwrap(), false));
    let mut count = 1;
    while it.prev() {
        count += 1;
    }
    assert_eq!(count, expect.len());
}

#[test]
fn in_direction_mirrors_out() {
    let (store, g, src, dsts) = fixture(128);
    let txn = store.read_txn();
    for &d in dsts.iter().step_by(7) {
        let mut it = g.edge_iterator(&txn, Direction::In, d);
        assert!(it.goto_first().unwrap());
        let uid = it.uid().unwrap();
        assert_eq!((uid.src, uid.dst), (src, d));
        assert!(!it.next().unwrap());
    }
}
