use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

use crate::error::{GoalError, GoalResult};

/// Daily nutrient targets of a goal. Calories in kcal, the rest in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GoalTargets {
    pub calories_goal: i32,
    pub proteins_goal: i32,
    pub fats_goal: i32,
    pub carbs_goal: i32,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            calories_goal: 2000,
            proteins_goal: 75,
            fats_goal: 65,
            carbs_goal: 250,
        }
    }
}

impl GoalTargets {
    pub fn validate(&self) -> GoalResult<()> {
        let fields = [
            ("calories_goal", self.calories_goal),
            ("proteins_goal", self.proteins_goal),
            ("fats_goal", self.fats_goal),
            ("carbs_goal", self.carbs_goal),
        ];
        for (name, value) in fields {
            if value < 0 {
                return Err(GoalError::Validation(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Consecutive-day achievement state carried by a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakState {
    pub last_achieved_date: Option<Date>,
    pub goal_achieved_days: i32,
}

/// Nutrition goal row. Superseded goals stay with `is_active = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NutritionGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub targets: GoalTargets,
    pub is_active: bool,
    #[serde(with = "crate::day::serde_day")]
    pub start_date: Date,
    pub goal_achieved_days: i32,
    #[serde(with = "crate::day::serde_day::option", default)]
    pub last_achieved_date: Option<Date>,
    #[serde(default, skip_serializing)]
    pub version: i64,
}

impl NutritionGoal {
    /// A fresh active goal with an empty streak.
    pub fn new_active(user_id: Uuid, targets: GoalTargets, start_date: Date) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            targets,
            is_active: true,
            start_date,
            goal_achieved_days: 0,
            last_achieved_date: None,
            version: 0,
        }
    }

    pub fn streak(&self) -> StreakState {
        StreakState {
            last_achieved_date: self.last_achieved_date,
            goal_achieved_days: self.goal_achieved_days,
        }
    }

    pub fn set_streak(&mut self, streak: StreakState) {
        self.last_achieved_date = streak.last_achieved_date;
        self.goal_achieved_days = streak.goal_achieved_days;
    }
}
