//! Record splitting under load: threshold splits, entry-cap splits, and the
//! no-merge rule.

use ombra::kv::mem::MemStore;
use ombra::storage::Direction;
use ombra::{EdgeId, EdgeUid, Graph, LabelId, StoreOptions, TemporalId};

const LABEL: LabelId = LabelId(1);
const T0: TemporalId = TemporalId(0);

#[test]
fn fanout_survives_many_threshold_splits() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(1024));
    let txn = store.write_txn();

    let src = g.add_vertex(&txn, b"src").unwrap();
    let n = 2000u64;
    let mut dsts = Vec::new();
    for _ in 0..n {
        dsts.push(g.add_vertex(&txn, b"").unwrap());
    }
    for &d in &dsts {
        let uid = g.add_edge(&txn, src, d, LABEL, T0, &[0xAB; 64]).unwrap();
        // each (src, label, tid, dst) group is a singleton
        assert_eq!(uid.eid, EdgeId(0));
    }

    assert_eq!(g.num_out_edges(&txn, src, None).unwrap(), Some((n, false)));
    assert_eq!(g.num_out_edges(&txn, src, Some(500)).unwrap(), Some((500, true)));

    // far more records than a packed vertex could ever hold
    assert!(store.len() > n as usize + 15);

    // ordered, gap-free walk across every record boundary
    let mut it = g.edge_iterator(&txn, Direction::Out, src);
    assert!(it.goto_first().unwrap());
    let mut walked = Vec::new();
    loop {
        walked.push(it.edge().unwrap().peer);
        if !it.next().unwrap() {
            break;
        }
    }
    assert_eq!(walked, dsts);

    // random access still finds each edge
    for &d in dsts.iter().step_by(97) {
        let uid = EdgeUid::new(src, d, LABEL, T0, EdgeId(0));
        assert_eq!(g.get_edge_property(&txn, &uid).unwrap().unwrap().len(), 64);
    }
}

#[test]
fn one_group_crosses_the_entry_cap() {
    let store = MemStore::new();
    // generous byte threshold so the 255-entry cap is what splits
    let g = Graph::new(StoreOptions::default().split_threshold(1 << 20));
    let txn = store.write_txn();
    let a = g.add_vertex(&txn, b"").unwrap();
    let b = g.add_vertex(&txn, b"").unwrap();

    let n = 700u32;
    for i in 0..n {
        let uid = g.add_edge(&txn, a, b, LABEL, T0, b"").unwrap();
        assert_eq!(uid.eid, EdgeId(i), "ids stay dense across cap splits");
    }
    assert_eq!(g.num_out_edges(&txn, a, None).unwrap(), Some((n as u64, false)));
    assert_eq!(g.num_in_edges(&txn, b, None).unwrap(), Some((n as u64, false)));

    let mut it = g.edge_iterator(&txn, Direction::Out, a);
    assert!(it.goto_first().unwrap());
    for i in 0..n {
        assert_eq!(it.edge().unwrap().eid, EdgeId(i));
        assert_eq!(it.next().unwrap(), i + 1 < n);
    }
}

#[test]
fn split_is_transparent_to_readers() {
    // the same workload against a never-splitting store must read identically
    let run = |threshold: usize| -> Vec<(u16, u64, u64, u32)> {
        let store = MemStore::new();
        let g = Graph::new(StoreOptions::default().split_threshold(threshold));
        let txn = store.write_txn();
        let a = g.add_vertex(&txn, b"").unwrap();
        let b = g.add_vertex(&txn, b"").unwrap();
        let c = g.add_vertex(&txn, b"").unwrap();
        for i in 0..200u64 {
            g.add_edge(&txn, a, b, LabelId((i % 3) as u16), TemporalId(i % 7), b"x").unwrap();
            g.add_edge(&txn, a, c, LabelId((i % 2) as u16), TemporalId(i % 5), b"y").unwrap();
        }
        let mut it = g.edge_iterator(&txn, Direction::Out, a);
        assert!(it.goto_first().unwrap());
        let mut out = Vec::new();
        loop {
            let e = it.edge().unwrap();
            out.push((e.lid.0, e.tid.0, e.peer.0, e.eid.0));
            if !it.next().unwrap() {
                break;
            }
        }
        out
    };
    assert_eq!(run(128), run(1 << 24));
}

#[test]
fn single_oversized_edge_is_stored_anyway() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(64));
    let txn = store.write_txn();
    let a = g.add_vertex(&txn, b"").unwrap();
    let b = g.add_vertex(&txn, b"").unwrap();

    let huge = vec![0x5A; 4096];
    let uid = g.add_edge(&txn, a, b, LABEL, T0, &huge).unwrap();
    assert_eq!(g.get_edge_property(&txn, &uid).unwrap().unwrap().as_ref(), &huge[..]);

    // neighbors of the oversized record still split normally
    for i in 0..20u64 {
        g.add_edge(&txn, a, b, LABEL, TemporalId(i + 1), &[1u8; 24]).unwrap();
    }
    assert_eq!(g.num_out_edges(&txn, a, None).unwrap(), Some((21, false)));
}

#[test]
fn peer_listing_pages_a_split_list_to_exhaustion() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(256));
    let txn = store.write_txn();
    let src = g.add_vertex(&txn, b"").unwrap();
    let mut dsts = Vec::new();
    for _ in 0..150u32 {
        let d = g.add_vertex(&txn, b"").unwrap();
        g.add_edge(&txn, src, d, LABEL, T0, &[4u8; 16]).unwrap();
        // a parallel edge; its peer must not inflate any page
        g.add_edge(&txn, src, d, LABEL, T0, b"").unwrap();
        dsts.push(d);
    }
    assert!(store.len() > 160, "adjacency list must be split");

    let mut collected = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = g.list_dst_vids(&txn, src, cursor, 7).unwrap().unwrap();
        collected.extend(page.vids);
        pages += 1;
        match page.next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }
    // every peer exactly once, in order, across many pages
    assert_eq!(collected, dsts);
    assert_eq!(pages, 22);
}

#[test]
fn runs_stay_split_after_mass_delete() {
    let store = MemStore::new();
    let g = Graph::new(StoreOptions::default().split_threshold(256));
    let txn = store.write_txn();
    let a = g.add_vertex(&txn, b"").unwrap();
    let b = g.add_vertex(&txn, b"").unwrap();
    for _ in 0..100u32 {
        g.add_edge(&txn, a, b, LABEL, T0, &[2u8; 32]).unwrap();
    }
    let populated = store.len();
    assert!(populated > 4);

    for i in 0..99u32 {
        assert!(g.delete_edge(&txn, &EdgeUid::new(a, b, LABEL, T0, EdgeId(i))).unwrap());
    }
    assert_eq!(g.num_out_edges(&txn, a, None).unwrap(), Some((1, false)));
    assert_eq!(g.num_in_edges(&txn, b, None).unwrap(), Some((1, false)));
    assert!(store.len() < populated);

    let uid = EdgeUid::new(a, b, LABEL, T0, EdgeId(99));
    assert_eq!(g.get_edge_property(&txn, &uid).unwrap().unwrap().as_ref(), &[2u8; 32]);

    // ids keep counting from the survivor
    assert_eq!(g.add_edge(&txn, a, b, LABEL, T0, b"").unwrap().eid, EdgeId(100));
}
