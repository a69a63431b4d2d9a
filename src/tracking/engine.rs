use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::day;
use crate::error::{GoalError, GoalResult};
use crate::goals::repo::GoalRepository;
use crate::goals::repo_types::{GoalTargets, NutritionGoal};
use crate::ledger::repo::MealLedger;
use crate::tracking::aggregator::{DailySummary, DailyTotals, IntakeAggregator};
use crate::tracking::escalation::EscalationPolicy;
use crate::tracking::evaluator::{AchievementEvaluator, AchievementVerdict};
use crate::tracking::policy::TrackingPolicy;
use crate::tracking::streak::StreakTracker;

/// Outcome of one `check_and_update` call.
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgressReport {
    pub goal_achieved: bool,
    pub consecutive_days: i32,
    pub goals_increased: bool,
    pub verdict: AchievementVerdict,
    pub current_totals: DailyTotals,
    pub nutrition_goal: NutritionGoal,
}

/// Owns the per-user goal lifecycle: bootstrap, evaluation, streaks and escalation.
///
/// Every mutation goes through the injected [`GoalRepository`]; conflicts are reported to
/// the caller, which decides whether to retry.
pub struct GoalTrackingEngine {
    goals: Arc<dyn GoalRepository>,
    intake: IntakeAggregator,
    evaluator: AchievementEvaluator,
    escalation: EscalationPolicy,
}

impl GoalTrackingEngine {
    pub fn new(
        goals: Arc<dyn GoalRepository>,
        ledger: Arc<dyn MealLedger>,
        policy: TrackingPolicy,
    ) -> Self {
        Self {
            goals,
            intake: IntakeAggregator::new(ledger),
            evaluator: AchievementEvaluator::new(policy.tolerance_percent),
            escalation: EscalationPolicy::new(policy.streak_threshold, policy.escalation_percent),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_or_bootstrap_goal(&self, user_id: Uuid) -> GoalResult<NutritionGoal> {
        self.goals
            .bootstrap_default_if_absent(user_id, day::today())
            .await
    }

    #[instrument(skip(self))]
    pub async fn create_goal(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        let goal = self.goals.create(user_id, targets, day::today()).await?;
        info!(%user_id, goal_id = %goal.id, "nutrition goal replaced");
        Ok(goal)
    }

    /// Direct user edit of the targets. Streak fields are untouched.
    #[instrument(skip(self))]
    pub async fn update_goal_targets(
        &self,
        goal_id: Uuid,
        targets: GoalTargets,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        self.goals.update_targets(goal_id, targets).await
    }

    pub async fn goal(&self, goal_id: Uuid) -> GoalResult<NutritionGoal> {
        self.goals
            .get(goal_id)
            .await?
            .ok_or(GoalError::NotFound(goal_id))
    }

    pub async fn daily_summary(&self, user_id: Uuid, date: Date) -> GoalResult<DailySummary> {
        self.intake.summary_for(user_id, date).await
    }

    pub async fn ping(&self) -> GoalResult<()> {
        self.goals.ping().await
    }

    /// Evaluates `today`'s intake against the active goal and, when every nutrient is met,
    /// advances the streak, escalates if due, and saves the goal. A miss writes nothing.
    #[instrument(skip(self))]
    pub async fn check_and_update(
        &self,
        user_id: Uuid,
        today: Date,
    ) -> GoalResult<GoalProgressReport> {
        let mut goal = self
            .goals
            .get_active(user_id)
            .await?
            .ok_or(GoalError::NoActiveGoal(user_id))?;

        let totals = self.intake.totals_for(user_id, today).await?;
        let verdict = self.evaluator.evaluate(&totals, &goal.targets);
        debug!(goal_id = %goal.id, ?verdict, "intake evaluated");

        let mut escalated = false;
        if verdict.all_met {
            let streak = StreakTracker::advance(goal.streak(), today, true);
            goal.set_streak(streak);
            escalated = self.escalation.apply(&mut goal, today);
            goal = self.goals.save(&goal).await?;

            if escalated {
                info!(
                    %user_id,
                    goal_id = %goal.id,
                    calories_goal = goal.targets.calories_goal,
                    "streak completed, targets escalated"
                );
            }
        }

        Ok(GoalProgressReport {
            goal_achieved: verdict.all_met,
            consecutive_days: goal.goal_achieved_days,
            goals_increased: escalated,
            verdict,
            current_totals: totals,
            nutrition_goal: goal,
        })
    }
}
