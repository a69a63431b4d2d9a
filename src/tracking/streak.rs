use time::Date;

use crate::goals::repo_types::StreakState;

/// Consecutive-day counter over calendar days.
///
/// A missed day leaves the state untouched; the gap is only noticed (and the streak
/// restarted) on the next day the goal is met.
pub struct StreakTracker;

impl StreakTracker {
    pub fn advance(state: StreakState, today: Date, all_met: bool) -> StreakState {
        if !all_met {
            return state;
        }

        let goal_achieved_days = match state.last_achieved_date {
            None => 1,
            Some(last) if Some(last) == today.previous_day() => {
                state.goal_achieved_days.saturating_add(1)
            }
            // Same day re-check: counted already.
            Some(last) if last == today => state.goal_achieved_days,
            Some(_) => 1,
        };

        StreakState {
            last_achieved_date: Some(today),
            goal_achieved_days,
        }
    }
}
