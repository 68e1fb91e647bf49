//! Integration tests for [`chh_sketches::Duet`].

use chh_sketches::Duet;

const NTH: u32 = 1000;

#[test]
fn flow_below_promotion_threshold_is_invisible_to_queries_at_that_threshold() {
    let mut duet = Duet::with_seed(128.0, 1).unwrap();
    for _ in 0..100 {
        duet.update(1, 10);
    }
    let (heavy, _) = duet.get_hh_and_hot_quad_ele(NTH, 0.1);
    assert!(!heavy.contains_key(&1));
}

#[test]
fn promoted_flow_surfaces_its_hot_element() {
    let mut duet = Duet::with_seed(512.0, 2).unwrap();
    for _ in 0..(NTH + 200) {
        duet.update(5, 50);
    }
    let (heavy, elements) = duet.get_hh_and_hot_quad_ele(NTH, 0.5);
    assert!(heavy.contains_key(&5));
    assert!(elements[&5].contains_key(&50));
}

#[test]
fn rare_element_within_a_heavy_flow_is_excluded_by_phi() {
    let mut duet = Duet::with_seed(512.0, 3).unwrap();
    for _ in 0..(NTH + 200) {
        duet.update(6, 60);
    }
    duet.update(6, 61);
    let (_, elements) = duet.get_hh_and_hot_quad_ele(NTH, 0.5);
    assert!(!elements[&6].contains_key(&61));
}
