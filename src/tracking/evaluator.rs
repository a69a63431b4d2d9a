use serde::Serialize;

use crate::goals::repo_types::GoalTargets;
use crate::tracking::aggregator::DailyTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementVerdict {
    pub calories_met: bool,
    pub proteins_met: bool,
    pub fats_met: bool,
    pub carbs_met: bool,
    pub all_met: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementEvaluator {
    tolerance_percent: u32,
}

impl AchievementEvaluator {
    pub fn new(tolerance_percent: u32) -> Self {
        Self { tolerance_percent }
    }

    /// Met means at least `tolerance_percent` of the target; overshooting is never penalized.
    pub fn nutrient_met(&self, total: i64, target: i32) -> bool {
        if target <= 0 {
            return true;
        }
        total * 100 >= i64::from(target) * i64::from(self.tolerance_percent)
    }

    pub fn evaluate(&self, totals: &DailyTotals, targets: &GoalTargets) -> AchievementVerdict {
        let calories_met = self.nutrient_met(totals.calories, targets.calories_goal);
        let proteins_met = self.nutrient_met(totals.proteins, targets.proteins_goal);
        let fats_met = self.nutrient_met(totals.fats, targets.fats_goal);
        let carbs_met = self.nutrient_met(totals.carbohydrates, targets.carbs_goal);
        AchievementVerdict {
            calories_met,
            proteins_met,
            fats_met,
            carbs_met,
            all_met: calories_met && proteins_met && fats_met && carbs_met,
        }
    }
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self::new(90)
    }
}
