use serde::Deserialize;

/// Knobs of the tracking engine, expressed as integers so comparisons stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrackingPolicy {
    /// Share of a target, in percent, that counts as meeting it.
    pub tolerance_percent: u32,
    /// Consecutive achieved days that trigger escalation.
    pub streak_threshold: i32,
    /// New targets as a percentage of the old ones.
    pub escalation_percent: u32,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self {
            tolerance_percent: 90,
            streak_threshold: 7,
            escalation_percent: 105,
        }
    }
}
