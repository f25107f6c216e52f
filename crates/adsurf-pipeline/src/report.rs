//! Plain-text field report written next to the previews.

use std::fmt::Write as _;

use adsurf_models::{format_mm_ss, frame_to_seconds, StableContour};

/// A `Total amount of insertions: <count>` header, then one line per stable
/// contour: `Field <n>: begin mm:ss, end mm:ss (<frames> frames)`.
///
/// `<n>` is the instance index used for previews and `--keep`. An empty
/// input yields an empty report.
pub fn build_report(contours: &[StableContour], fps: f64) -> String {
    let mut out = String::new();
    if contours.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Total amount of insertions: {}", contours.len());
    for (n, contour) in contours.iter().enumerate() {
        let (Some(first), Some(last)) = (contour.first_frame(), contour.last_frame()) else {
            continue;
        };
        let _ = writeln!(
            out,
            "Field {}: begin {}, end {} ({} frames)",
            n,
            format_mm_ss(frame_to_seconds(first, fps)),
            format_mm_ss(frame_to_seconds(last, fps)),
            contour.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsurf_models::{DetectionRecord, Field, Quad};

    fn contour(start: u64, end: u64) -> StableContour {
        let records = (start..=end)
            .map(|i| DetectionRecord::new(i, Quad::rect(0.0, 0.0, 4.0, 4.0)))
            .collect();
        StableContour::new(Field::new(start, end), records)
    }

    #[test]
    fn test_report_lines() {
        let report = build_report(&[contour(30, 90), contour(1800, 1950)], 30.0);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Total amount of insertions: 2");
        assert_eq!(lines[1], "Field 0: begin 00:01, end 00:03 (61 frames)");
        assert_eq!(lines[2], "Field 1: begin 01:00, end 01:05 (151 frames)");
    }

    #[test]
    fn test_empty_report() {
        assert!(build_report(&[], 25.0).is_empty());
    }
}
