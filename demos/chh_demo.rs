//! Walkthrough of all five correlated heavy hitter sketches on one small
//! synthetic stream.

use chh_sketches::{CorrelatedHeavyHitterSketch, CssChh, DualSketch, Duet, GlobalHh, Result, TwoDMisraGries};

const MEMORY_KB: f32 = 64.0;
const HEAVY_HITTER_THRESHOLD: u32 = 400;
const PHI: f32 = 0.1;

fn main() -> Result<()> {
    println!("=== Correlated Heavy Hitter Sketches Demo ===\n");

    // A small synthetic stream: flow 1 talks mostly to element 10, flow 2
    // is a light background flow that should stay below the threshold.
    let mut stream = Vec::new();
    for _ in 0..900 {
        stream.push((1u32, 10u32));
    }
    for _ in 0..100 {
        stream.push((1u32, 20u32));
    }
    for _ in 0..50 {
        stream.push((2u32, 5u32));
    }

    println!("DualSketch");
    {
        let mut sketch = DualSketch::new(MEMORY_KB)?;
        for &(x, y) in &stream {
            sketch.update(x, y);
        }
        report(&sketch.query(HEAVY_HITTER_THRESHOLD));
    }

    println!("\nDUET");
    {
        let mut sketch = Duet::new(MEMORY_KB)?;
        for &(x, y) in &stream {
            sketch.update(x, y);
        }
        report(&CorrelatedHeavyHitterSketch::query(
            &sketch,
            HEAVY_HITTER_THRESHOLD,
            PHI,
        ));
    }

    println!("\nGlobalHH");
    {
        let mut sketch = GlobalHh::new(MEMORY_KB)?;
        for &(x, y) in &stream {
            sketch.update(x, y);
        }
        report(&sketch.query(HEAVY_HITTER_THRESHOLD, PHI));
    }

    println!("\nTwoDMisraGries");
    {
        let mut sketch = TwoDMisraGries::new(MEMORY_KB)?;
        for &(x, y) in &stream {
            sketch.update(x, y);
        }
        report(&sketch.query(HEAVY_HITTER_THRESHOLD, PHI));
    }

    println!("\nCSSCHH");
    {
        let mut sketch = CssChh::new(MEMORY_KB)?;
        for &(x, y) in &stream {
            sketch.update(x, y);
        }
        report(&sketch.query(HEAVY_HITTER_THRESHOLD, PHI));
    }

    Ok(())
}

fn report(result: &(
    std::collections::BTreeMap<u32, u32>,
    std::collections::BTreeMap<u32, std::collections::BTreeMap<u32, u32>>,
)) {
    let (heavy_flows, hot_elements) = result;
    for (&flow, &estimate) in heavy_flows {
        println!("  flow {flow} -> estimated size {estimate}");
        if let Some(elements) = hot_elements.get(&flow) {
            for (&element, &count) in elements {
                println!("    hot element {element} -> {count}");
            }
        }
    }
}
