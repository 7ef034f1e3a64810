// Human timing windows, all in seconds.
pub const JUDGE_CRITICAL_S: f64 = 0.033;
pub const JUDGE_NEAR_S: f64 = 0.048;
pub const JUDGE_EDGE_S: f64 = 0.072;
// Added to every human offset before it is classified.
pub const JUDGE_ADJUST_S: f64 = 0.020;

/// Which judgment visual an effect sink should spawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JudgeType {
    ShortNormal,
    ShortEx,
    SlideTap,
    Action,
}

/// Accuracy tier of a human hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeTier {
    Critical, // justice critical
    Near,     // justice
    Edge,     // attack
}

impl JudgeTier {
    /// Fraction of the per-note gauge share this tier awards.
    pub const fn gauge_scale(self) -> f64 {
        match self {
            Self::Critical => 1.0,
            Self::Near => 1.0 / 1.01,
            Self::Edge => 1.0 / 1.01 * 0.5,
        }
    }
}

/// Result of checking one short note against the current frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Judgement {
    /// Already finished, outside the window, or no lane triggered yet.
    Pending,
    /// The window expired without a hit.
    Miss,
    Hit(JudgeTier),
}

impl Judgement {
    #[inline(always)]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JudgeWindows {
    pub critical_s: f64,
    pub near_s: f64,
    /// Outer window; offsets beyond it on the late side are misses.
    pub edge_s: f64,
    pub adjust_s: f64,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            critical_s: JUDGE_CRITICAL_S,
            near_s: JUDGE_NEAR_S,
            edge_s: JUDGE_EDGE_S,
            adjust_s: JUDGE_ADJUST_S,
        }
    }
}

impl JudgeWindows {
    /// Signed offset of a hit at `current_time` against a note at
    /// `start_time`, adjust included. Positive is late.
    #[inline(always)]
    pub fn offset(&self, current_time: f64, start_time: f64) -> f64 {
        current_time - start_time + self.adjust_s
    }

    /// Classifies an offset that is already known to be inside the outer
    /// window.
    pub fn classify(&self, offset_s: f64) -> JudgeTier {
        let abs = offset_s.abs();
        if abs <= self.critical_s {
            JudgeTier::Critical
        } else if abs <= self.near_s {
            JudgeTier::Near
        } else {
            JudgeTier::Edge
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JudgeTier, JudgeWindows};

    #[test]
    fn classify_uses_inclusive_upper_bounds() {
        let w = JudgeWindows::default();
        assert_eq!(w.classify(0.0), JudgeTier::Critical);
        assert_eq!(w.classify(-0.033), JudgeTier::Critical);
        assert_eq!(w.classify(0.04), JudgeTier::Near);
        assert_eq!(w.classify(0.048), JudgeTier::Near);
        assert_eq!(w.classify(-0.06), JudgeTier::Edge);
    }

    #[test]
    fn offset_includes_adjust() {
        let w = JudgeWindows::default();
        assert!((w.offset(1.0, 1.0) - 0.020).abs() <= 1e-12);
    }
}
