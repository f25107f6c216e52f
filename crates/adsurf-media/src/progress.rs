//! Per-frame milestone tracking for progress reports.

/// Percentages reported while a frame loop runs.
pub const DEFAULT_MILESTONES: [u8; 3] = [25, 50, 75];

/// Emits each percentage milestone once as frames are processed.
#[derive(Debug, Clone)]
pub struct ProgressMilestones {
    total: u64,
    milestones: Vec<u8>,
    next: usize,
}

impl ProgressMilestones {
    /// Track `total` frames. A zero total never reports.
    pub fn new(total: u64) -> Self {
        Self::with_milestones(total, &DEFAULT_MILESTONES)
    }

    pub fn with_milestones(total: u64, milestones: &[u8]) -> Self {
        let mut milestones = milestones.to_vec();
        milestones.sort_unstable();
        Self {
            total,
            milestones,
            next: 0,
        }
    }

    /// Record that `processed` frames are done; returns the highest newly
    /// crossed milestone, if any.
    pub fn observe(&mut self, processed: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let mut crossed = None;
        while let Some(&m) = self.milestones.get(self.next) {
            if processed * 100 >= self.total * m as u64 {
                crossed = Some(m);
                self.next += 1;
            } else {
                break;
            }
        }
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestones_fire_once() {
        let mut m = ProgressMilestones::new(100);
        let fired: Vec<u8> = (1..=100).filter_map(|i| m.observe(i)).collect();
        assert_eq!(fired, vec![25, 50, 75]);
    }

    #[test]
    fn test_milestones_skip_ahead() {
        let mut m = ProgressMilestones::new(4);
        assert_eq!(m.observe(3), Some(75));
        assert_eq!(m.observe(4), None);
        assert_eq!(ProgressMilestones::new(0).observe(10), None);
    }
}
