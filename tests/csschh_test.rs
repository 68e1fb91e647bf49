//! Integration tests for [`chh_sketches::CssChh`].

use chh_sketches::CssChh;

#[test]
fn heavy_flow_and_element_are_reported() {
    let mut c = CssChh::new(64.0).unwrap();
    for _ in 0..500 {
        c.update(1, 10);
    }
    let (heavy, elements) = c.query(100, 0.1);
    assert!(heavy.contains_key(&1));
    assert!(elements[&1].contains_key(&10));
}

#[test]
fn cold_flow_is_absent() {
    let mut c = CssChh::new(64.0).unwrap();
    for _ in 0..3 {
        c.update(2, 20);
    }
    let (heavy, _) = c.query(100, 0.1);
    assert!(!heavy.contains_key(&2));
}

#[test]
fn total_count_tracks_every_update_regardless_of_eviction() {
    let mut c = CssChh::new(8.0).unwrap();
    for i in 0..2000u32 {
        c.update(i % 300, i % 7);
    }
    assert_eq!(c.total_count(), 2000);
}

#[test]
fn construction_rejects_non_positive_memory() {
    assert!(CssChh::new(0.0).is_err());
}
