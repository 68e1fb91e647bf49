//! Integration tests for [`chh_sketches::DualSketch`].

use chh_sketches::dual_sketch::EstimateMethod;
use chh_sketches::DualSketch;

#[test]
fn heavy_flow_and_its_hot_element_are_both_reported() {
    let mut ds = DualSketch::with_seed(32.0, 1).unwrap();
    for _ in 0..200 {
        ds.update(10, 99);
    }
    let (heavy, elements) = ds.query(50);
    assert_eq!(heavy.get(&10), Some(&200));
    assert_eq!(elements[&10][&99], 200);
}

#[test]
fn cold_flow_is_absent_from_results() {
    let mut ds = DualSketch::with_seed(32.0, 1).unwrap();
    for _ in 0..4 {
        ds.update(11, 1);
    }
    let (heavy, _) = ds.query(100);
    assert!(!heavy.contains_key(&11));
}

#[test]
fn every_estimate_method_agrees_on_obviously_heavy_flows() {
    for method in [
        EstimateMethod::Lower,
        EstimateMethod::Upper,
        EstimateMethod::Mean,
        EstimateMethod::Harmonic,
    ] {
        let mut ds = DualSketch::with_seed_and_method(32.0, method, 4).unwrap();
        for _ in 0..1000 {
            ds.update(1, 1);
        }
        let (heavy, _) = ds.query(100);
        assert!(heavy.contains_key(&1), "{method:?} missed an obvious heavy hitter");
    }
}

#[test]
fn competing_flows_sharing_a_hash_bucket_still_track_the_survivor() {
    let mut ds = DualSketch::with_seed(8.0, 5).unwrap();
    for flow in 0..64u32 {
        ds.update(flow, 1);
    }
    for _ in 0..500 {
        ds.update(1, 1);
    }
    let (heavy, _) = ds.query(100);
    assert!(heavy.contains_key(&1));
}
