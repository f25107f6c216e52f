//! Frame-time conversion and `mm:ss` formatting for reports.

/// Seconds elapsed at `frame_index` for a stream at `fps`.
pub fn frame_to_seconds(frame_index: u64, fps: f64) -> f64 {
    if fps <= 0.0 {
        return 0.0;
    }
    frame_index as f64 / fps
}

/// Format whole seconds as `mm:ss`; minutes are not wrapped into hours.
///
/// # Examples
/// ```
/// use adsurf_models::timestamp::format_mm_ss;
/// assert_eq!(format_mm_ss(0.0), "00:00");
/// assert_eq!(format_mm_ss(75.9), "01:15");
/// assert_eq!(format_mm_ss(3723.0), "62:03");
/// ```
pub fn format_mm_ss(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_seconds() {
        assert!((frame_to_seconds(90, 30.0) - 3.0).abs() < 1e-9);
        assert_eq!(frame_to_seconds(90, 0.0), 0.0);
    }

    #[test]
    fn test_format_negative_clamps() {
        assert_eq!(format_mm_ss(-4.0), "00:00");
    }
}
