//! Tunable thresholds for detection, tracking and smoothing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a tuning document is invalid.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Configuration update must be a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TuningError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Every numeric parameter controlling the vision pipeline.
///
/// Loaded once per pass and immutable during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TuningConfig {
    // === Detection ===
    /// Gaussian blur kernel size (odd, default: 5)
    pub kernel: u32,
    /// Minimum enclosed contour area in px² (default: 5000)
    pub min_area_threshold: f64,
    /// Maximum enclosed contour area in px² (default: 500000)
    pub max_area_threshold: f64,
    /// Required polygon vertex count (default: 4)
    pub corners_count: usize,
    /// Douglas–Peucker epsilon as a fraction of the perimeter (default: 0.02)
    pub perimeter_threshold: f64,

    // === Tracking ===
    /// Gap length (frames) above which a new field starts (default: 5)
    pub field_threshold: u64,
    /// Minimum stable duration in seconds (default: 1.0)
    pub contour_threshold: f64,
    /// Maximum centroid displacement between chained frames in px (default: 5.0)
    pub dst_threshold: f64,

    // === Smoothing ===
    /// Savitzky–Golay window length (odd, default: 15)
    pub window: usize,
    /// Savitzky–Golay polynomial order (default: 2)
    pub poly_order: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            kernel: 5,
            min_area_threshold: 5000.0,
            max_area_threshold: 500_000.0,
            corners_count: 4,
            perimeter_threshold: 0.02,
            field_threshold: 5,
            contour_threshold: 1.0,
            dst_threshold: 5.0,
            window: 15,
            poly_order: 2,
        }
    }
}

impl TuningConfig {
    /// Check every value and every cross-field constraint.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.kernel == 0 || self.kernel % 2 == 0 {
            return Err(TuningError::invalid("kernel", "must be a positive odd number"));
        }
        if !(self.min_area_threshold >= 0.0) {
            return Err(TuningError::invalid("min_area_threshold", "must be >= 0"));
        }
        if !(self.max_area_threshold >= self.min_area_threshold) {
            return Err(TuningError::invalid(
                "max_area_threshold",
                "must be >= min_area_threshold",
            ));
        }
        if self.corners_count != 4 {
            return Err(TuningError::invalid(
                "corners_count",
                "only quadrilateral surfaces (4) are supported",
            ));
        }
        if !(self.perimeter_threshold > 0.0 && self.perimeter_threshold < 1.0) {
            return Err(TuningError::invalid("perimeter_threshold", "must be in (0, 1)"));
        }
        if !(self.contour_threshold >= 0.0) {
            return Err(TuningError::invalid("contour_threshold", "must be >= 0"));
        }
        if !(self.dst_threshold > 0.0) {
            return Err(TuningError::invalid("dst_threshold", "must be > 0"));
        }
        if self.window == 0 || self.window % 2 == 0 {
            return Err(TuningError::invalid("window", "must be a positive odd number"));
        }
        if self.poly_order >= self.window {
            return Err(TuningError::invalid("poly_order", "must be smaller than window"));
        }
        Ok(())
    }

    /// Apply a partial JSON object on top of this config and validate the result.
    ///
    /// Unknown keys are rejected so typos do not silently pass.
    pub fn merged_with(&self, patch: &serde_json::Value) -> Result<Self, TuningError> {
        let patch = patch.as_object().ok_or(TuningError::NotAnObject)?;
        let mut current = serde_json::to_value(self)?;
        let target = current
            .as_object_mut()
            .ok_or(TuningError::NotAnObject)?;

        for (key, value) in patch {
            if !target.contains_key(key) {
                return Err(TuningError::UnknownKey(key.clone()));
            }
            target.insert(key.clone(), value.clone());
        }

        let merged: TuningConfig = serde_json::from_value(current)?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_valid() {
        assert!(TuningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_even_kernel_rejected() {
        let cfg = TuningConfig {
            kernel: 4,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(TuningError::Invalid { key: "kernel", .. })
        ));
    }

    #[test]
    fn test_non_quad_corner_count_rejected() {
        let cfg = TuningConfig {
            corners_count: 5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_poly_order_must_be_below_window() {
        let cfg = TuningConfig {
            window: 3,
            poly_order: 3,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let cfg: TuningConfig = serde_json::from_value(json!({ "dst_threshold": 9.5 })).unwrap();
        assert_eq!(cfg.dst_threshold, 9.5);
        assert_eq!(cfg.kernel, 5);
    }

    #[test]
    fn test_merge_updates_and_validates() {
        let base = TuningConfig::default();
        let merged = base
            .merged_with(&json!({ "contour_threshold": 2.0, "min_area_threshold": 100 }))
            .unwrap();
        assert_eq!(merged.contour_threshold, 2.0);
        assert_eq!(merged.min_area_threshold, 100.0);

        assert!(matches!(
            base.merged_with(&json!({ "bogus": 1 })),
            Err(TuningError::UnknownKey(_))
        ));
        assert!(base.merged_with(&json!({ "window": 4 })).is_err());
        assert!(matches!(
            base.merged_with(&json!([1, 2])),
            Err(TuningError::NotAnObject)
        ));
    }
}
