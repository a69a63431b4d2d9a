use serde::Deserialize;

use crate::goals::repo_types::GoalTargets;

/// Body of `POST /goals`. Missing fields take the default targets.
#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub calories_goal: Option<i32>,
    pub proteins_goal: Option<i32>,
    pub fats_goal: Option<i32>,
    pub carbs_goal: Option<i32>,
}

impl CreateGoalRequest {
    pub fn into_targets(self) -> GoalTargets {
        let d = GoalTargets::default();
        GoalTargets {
            calories_goal: self.calories_goal.unwrap_or(d.calories_goal),
            proteins_goal: self.proteins_goal.unwrap_or(d.proteins_goal),
            fats_goal: self.fats_goal.unwrap_or(d.fats_goal),
            carbs_goal: self.carbs_goal.unwrap_or(d.carbs_goal),
        }
    }
}

/// Body of `PUT /goals/:id`. Only the given fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub calories_goal: Option<i32>,
    pub proteins_goal: Option<i32>,
    pub fats_goal: Option<i32>,
    pub carbs_goal: Option<i32>,
}

impl UpdateGoalRequest {
    pub fn apply_to(&self, current: GoalTargets) -> GoalTargets {
        GoalTargets {
            calories_goal: self.calories_goal.unwrap_or(current.calories_goal),
            proteins_goal: self.proteins_goal.unwrap_or(current.proteins_goal),
            fats_goal: self.fats_goal.unwrap_or(current.fats_goal),
            carbs_goal: self.carbs_goal.unwrap_or(current.carbs_goal),
        }
    }
}
