use time::Date;

use crate::goals::repo_types::{GoalTargets, NutritionGoal};

/// Raises targets after a full streak and starts the goal over.
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    streak_threshold: i32,
    escalation_percent: u32,
}

impl EscalationPolicy {
    pub fn new(streak_threshold: i32, escalation_percent: u32) -> Self {
        Self {
            streak_threshold: streak_threshold.max(1),
            escalation_percent,
        }
    }

    pub fn should_escalate(&self, goal_achieved_days: i32) -> bool {
        goal_achieved_days >= self.streak_threshold
    }

    /// Scales every target, truncating toward zero.
    pub fn escalate_targets(&self, targets: GoalTargets) -> GoalTargets {
        let scale = |value: i32| {
            let scaled = i64::from(value) * i64::from(self.escalation_percent) / 100;
            i32::try_from(scaled).unwrap_or(i32::MAX)
        };
        GoalTargets {
            calories_goal: scale(targets.calories_goal),
            proteins_goal: scale(targets.proteins_goal),
            fats_goal: scale(targets.fats_goal),
            carbs_goal: scale(targets.carbs_goal),
        }
    }

    /// Returns whether the goal was escalated.
    pub fn apply(&self, goal: &mut NutritionGoal, today: Date) -> bool {
        if !self.should_escalate(goal.goal_achieved_days) {
            return false;
        }
        goal.targets = self.escalate_targets(goal.targets);
        goal.goal_achieved_days = 0;
        goal.start_date = today;
        true
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(7, 105)
    }
}
