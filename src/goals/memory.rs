use std::collections::HashMap;

use async_trait::async_trait;
use time::Date;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{GoalError, GoalResult};
use crate::goals::repo::GoalRepository;
use crate::goals::repo_types::{GoalTargets, NutritionGoal};

/// Goal store backed by a map. The single lock serializes bootstrap and creation per user.
#[derive(Default)]
pub struct InMemoryGoalRepository {
    goals: Mutex<HashMap<Uuid, NutritionGoal>>,
}

impl InMemoryGoalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_for_user(&self, user_id: Uuid) -> Vec<NutritionGoal> {
        let goals = self.goals.lock().await;
        goals
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn put(&self, goal: NutritionGoal) {
        self.goals.lock().await.insert(goal.id, goal);
    }
}

#[async_trait]
impl GoalRepository for InMemoryGoalRepository {
    async fn get_active(&self, user_id: Uuid) -> GoalResult<Option<NutritionGoal>> {
        let goals = self.goals.lock().await;
        Ok(goals
            .values()
            .find(|g| g.user_id == user_id && g.is_active)
            .cloned())
    }

    async fn get(&self, goal_id: Uuid) -> GoalResult<Option<NutritionGoal>> {
        Ok(self.goals.lock().await.get(&goal_id).cloned())
    }

    async fn create(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
        start_date: Date,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        let mut goals = self.goals.lock().await;
        for g in goals
            .values_mut()
            .filter(|g| g.user_id == user_id && g.is_active)
        {
            g.is_active = false;
            g.version += 1;
        }
        let goal = NutritionGoal::new_active(user_id, targets, start_date);
        goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn bootstrap_default_if_absent(
        &self,
        user_id: Uuid,
        start_date: Date,
    ) -> GoalResult<NutritionGoal> {
        let mut goals = self.goals.lock().await;
        if let Some(existing) = goals
            .values()
            .find(|g| g.user_id == user_id && g.is_active)
        {
            return Ok(existing.clone());
        }
        let goal = NutritionGoal::new_active(user_id, GoalTargets::default(), start_date);
        goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn save(&self, goal: &NutritionGoal) -> GoalResult<NutritionGoal> {
        goal.targets.validate()?;
        let mut goals = self.goals.lock().await;
        let stored = goals
            .get_mut(&goal.id)
            .ok_or(GoalError::NotFound(goal.id))?;
        if stored.version != goal.version {
            return Err(GoalError::goal_conflict(goal.id));
        }
        stored.targets = goal.targets;
        stored.start_date = goal.start_date;
        stored.goal_achieved_days = goal.goal_achieved_days;
        stored.last_achieved_date = goal.last_achieved_date;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn update_targets(
        &self,
        goal_id: Uuid,
        targets: GoalTargets,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        let mut goals = self.goals.lock().await;
        let stored = goals.get_mut(&goal_id).ok_or(GoalError::NotFound(goal_id))?;
        stored.targets = targets;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn ping(&self) -> GoalResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use time::macros::date;

    const DAY: Date = date!(2024 - 05 - 10);

    #[tokio::test]
    async fn create_supersedes_previous_active_goal() {
        let repo = InMemoryGoalRepository::new();
        let user = Uuid::new_v4();

        let first = repo.create(user, GoalTargets::default(), DAY).await.unwrap();
        let second = repo
            .create(
                user,
                GoalTargets {
                    calories_goal: 1800,
                    ..GoalTargets::default()
                },
                DAY,
            )
            .await
            .unwrap();

        let active = repo.get_active(user).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let old = repo.get(first.id).await.unwrap().unwrap();
        assert!(!old.is_active);
        assert_eq!(repo.all_for_user(user).await.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_negative_targets() {
        let repo = InMemoryGoalRepository::new();
        let err = repo
            .create(
                Uuid::new_v4(),
                GoalTargets {
                    carbs_goal: -10,
                    ..GoalTargets::default()
                },
                DAY,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::Validation(_)));
    }

    #[tokio::test]
    async fn concurrent_bootstrap_yields_one_active_goal() {
        let repo = Arc::new(InMemoryGoalRepository::new());
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.bootstrap_default_if_absent(user, DAY).await })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.all_for_user(user).await.len(), 1);
    }

    #[tokio::test]
    async fn save_with_stale_version_conflicts() {
        let repo = InMemoryGoalRepository::new();
        let goal = repo
            .bootstrap_default_if_absent(Uuid::new_v4(), DAY)
            .await
            .unwrap();

        let mut first = goal.clone();
        first.goal_achieved_days = 1;
        let saved = repo.save(&first).await.unwrap();
        assert_eq!(saved.version, goal.version + 1);

        let mut second = goal.clone();
        second.goal_achieved_days = 5;
        let err = repo.save(&second).await.unwrap_err();
        assert!(matches!(err, GoalError::Conflict { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn save_unknown_goal_is_not_found() {
        let repo = InMemoryGoalRepository::new();
        let ghost = NutritionGoal::new_active(Uuid::new_v4(), GoalTargets::default(), DAY);
        let err = repo.save(&ghost).await.unwrap_err();
        assert!(matches!(err, GoalError::NotFound(id) if id == ghost.id));
    }

    #[tokio::test]
    async fn update_targets_keeps_streak_fields() {
        let repo = InMemoryGoalRepository::new();
        let mut goal = NutritionGoal::new_active(Uuid::new_v4(), GoalTargets::default(), DAY);
        goal.goal_achieved_days = 4;
        goal.last_achieved_date = Some(DAY);
        repo.put(goal.clone()).await;

        let new_targets = GoalTargets {
            calories_goal: 2500,
            proteins_goal: 120,
            fats_goal: 70,
            carbs_goal: 300,
        };
        let updated = repo.update_targets(goal.id, new_targets).await.unwrap();
        assert_eq!(updated.targets, new_targets);
        assert_eq!(updated.goal_achieved_days, 4);
        assert_eq!(updated.last_achieved_date, Some(DAY));

        let err = repo
            .update_targets(Uuid::new_v4(), new_targets)
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::NotFound(_)));
    }
}
