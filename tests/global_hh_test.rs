//! Integration tests for [`chh_sketches::GlobalHh`].

use chh_sketches::GlobalHh;

#[test]
fn heavy_flow_and_its_dominant_element_are_reported() {
    let mut g = GlobalHh::with_seed(64.0, 1).unwrap();
    for _ in 0..300 {
        g.update(3, 30);
    }
    let (heavy, elements) = g.query(100, 0.1);
    assert!(heavy.contains_key(&3));
    assert!(elements[&3].contains_key(&30));
}

#[test]
fn cold_flow_is_absent() {
    let mut g = GlobalHh::with_seed(64.0, 1).unwrap();
    for _ in 0..5 {
        g.update(4, 40);
    }
    let (heavy, _) = g.query(100, 0.1);
    assert!(!heavy.contains_key(&4));
}

#[test]
fn many_competing_flows_still_surface_the_dominant_one() {
    let mut g = GlobalHh::with_seed(32.0, 2).unwrap();
    for flow in 0..128u32 {
        g.update(flow, flow);
    }
    for _ in 0..1000 {
        g.update(1, 1);
    }
    let (heavy, _) = g.query(500, 0.1);
    assert!(heavy.contains_key(&1));
}
