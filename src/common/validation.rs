//! Parameter validation for sketch construction.

use crate::common::{Result, SketchError};

/// Validates that a positive memory budget was provided, in KiB.
pub fn validate_memory_kb(memory_kb: f32) -> Result<()> {
    if !(memory_kb > 0.0) {
        return Err(SketchError::InvalidParameter {
            param: "memory_kb".to_string(),
            value: memory_kb.to_string(),
            constraint: "must be greater than 0".to_string(),
        });
    }
    if !memory_kb.is_finite() {
        return Err(SketchError::InvalidParameter {
            param: "memory_kb".to_string(),
            value: memory_kb.to_string(),
            constraint: "must be finite".to_string(),
        });
    }
    Ok(())
}

/// Validates that a derived table dimension (width, depth, capacity, ...) is
/// non-zero, i.e. that the memory budget given was large enough to produce a
/// usable table.
pub fn require_nonzero(value: usize, param: &str) -> Result<()> {
    if value == 0 {
        return Err(SketchError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: "must be greater than 0 once derived from the memory budget".to_string(),
        });
    }
    Ok(())
}
