use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{GoalError, GoalResult};
use crate::goals::repo_types::{GoalTargets, NutritionGoal};

/// Storage for nutrition goals. Implementations keep at most one active goal per user.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn get_active(&self, user_id: Uuid) -> GoalResult<Option<NutritionGoal>>;

    async fn get(&self, goal_id: Uuid) -> GoalResult<Option<NutritionGoal>>;

    /// Deactivates the user's current goal and inserts a new active one in one step.
    async fn create(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
        start_date: Date,
    ) -> GoalResult<NutritionGoal>;

    /// Returns the active goal, inserting the default one if the user has none.
    /// A caller losing a concurrent insert gets the winner's row.
    async fn bootstrap_default_if_absent(
        &self,
        user_id: Uuid,
        start_date: Date,
    ) -> GoalResult<NutritionGoal>;

    /// Compare-and-swap on `goal.version`. Persists targets, streak fields and start date.
    async fn save(&self, goal: &NutritionGoal) -> GoalResult<NutritionGoal>;

    /// Overwrites targets only; streak fields are left alone.
    async fn update_targets(
        &self,
        goal_id: Uuid,
        targets: GoalTargets,
    ) -> GoalResult<NutritionGoal>;

    async fn ping(&self) -> GoalResult<()>;
}

const GOAL_COLUMNS: &str = "id, user_id, calories_goal, proteins_goal, fats_goal, carbs_goal, \
     is_active, start_date, goal_achieved_days, last_achieved_date, version";

#[derive(Clone)]
pub struct PgGoalRepository {
    pool: PgPool,
}

impl PgGoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, goal_id: Uuid) -> GoalResult<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM nutrition_goals WHERE id = $1")
            .bind(goal_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl GoalRepository for PgGoalRepository {
    async fn get_active(&self, user_id: Uuid) -> GoalResult<Option<NutritionGoal>> {
        let goal = sqlx::query_as::<_, NutritionGoal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM nutrition_goals WHERE user_id = $1 AND is_active"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(goal)
    }

    async fn get(&self, goal_id: Uuid) -> GoalResult<Option<NutritionGoal>> {
        let goal = sqlx::query_as::<_, NutritionGoal>(&format!(
            "SELECT {GOAL_COLUMNS} FROM nutrition_goals WHERE id = $1"
        ))
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(goal)
    }

    async fn create(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
        start_date: Date,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        let goal = NutritionGoal::new_active(user_id, targets, start_date);

        let mut tx = self.pool.begin().await?;

        let superseded = sqlx::query(
            r#"
            UPDATE nutrition_goals
               SET is_active = FALSE, version = version + 1, updated_at = now()
             WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let inserted = sqlx::query_as::<_, NutritionGoal>(&format!(
            r#"
            INSERT INTO nutrition_goals
                (id, user_id, calories_goal, proteins_goal, fats_goal, carbs_goal,
                 is_active, start_date, goal_achieved_days, last_achieved_date, version)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, 0, NULL, 0)
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(goal.id)
        .bind(user_id)
        .bind(targets.calories_goal)
        .bind(targets.proteins_goal)
        .bind(targets.fats_goal)
        .bind(targets.carbs_goal)
        .bind(start_date)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(goal) => goal,
            Err(e) if is_unique_violation(&e) => {
                warn!(%user_id, "concurrent goal creation lost the race");
                return Err(GoalError::Conflict {
                    entity: "active goal of user",
                    id: user_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        debug!(%user_id, goal_id = %inserted.id, superseded, "nutrition goal created");
        Ok(inserted)
    }

    async fn bootstrap_default_if_absent(
        &self,
        user_id: Uuid,
        start_date: Date,
    ) -> GoalResult<NutritionGoal> {
        if let Some(goal) = self.get_active(user_id).await? {
            return Ok(goal);
        }

        let targets = GoalTargets::default();
        let created = sqlx::query_as::<_, NutritionGoal>(&format!(
            r#"
            INSERT INTO nutrition_goals
                (id, user_id, calories_goal, proteins_goal, fats_goal, carbs_goal,
                 is_active, start_date, goal_achieved_days, last_achieved_date, version)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, 0, NULL, 0)
            ON CONFLICT (user_id) WHERE is_active DO NOTHING
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(targets.calories_goal)
        .bind(targets.proteins_goal)
        .bind(targets.fats_goal)
        .bind(targets.carbs_goal)
        .bind(start_date)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(goal) = created {
            debug!(%user_id, goal_id = %goal.id, "default nutrition goal bootstrapped");
            return Ok(goal);
        }

        // Another request inserted first; hand back its row.
        self.get_active(user_id).await?.ok_or(GoalError::Conflict {
            entity: "active goal of user",
            id: user_id,
        })
    }

    async fn save(&self, goal: &NutritionGoal) -> GoalResult<NutritionGoal> {
        goal.targets.validate()?;
        let saved = sqlx::query_as::<_, NutritionGoal>(&format!(
            r#"
            UPDATE nutrition_goals
               SET calories_goal = $2, proteins_goal = $3, fats_goal = $4, carbs_goal = $5,
                   start_date = $6, goal_achieved_days = $7, last_achieved_date = $8,
                   version = version + 1, updated_at = now()
             WHERE id = $1 AND version = $9
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(goal.id)
        .bind(goal.targets.calories_goal)
        .bind(goal.targets.proteins_goal)
        .bind(goal.targets.fats_goal)
        .bind(goal.targets.carbs_goal)
        .bind(goal.start_date)
        .bind(goal.goal_achieved_days)
        .bind(goal.last_achieved_date)
        .bind(goal.version)
        .fetch_optional(&self.pool)
        .await?;

        match saved {
            Some(saved) => Ok(saved),
            None if self.exists(goal.id).await? => {
                warn!(goal_id = %goal.id, version = goal.version, "stale goal version on save");
                Err(GoalError::goal_conflict(goal.id))
            }
            None => Err(GoalError::NotFound(goal.id)),
        }
    }

    async fn update_targets(
        &self,
        goal_id: Uuid,
        targets: GoalTargets,
    ) -> GoalResult<NutritionGoal> {
        targets.validate()?;
        sqlx::query_as::<_, NutritionGoal>(&format!(
            r#"
            UPDATE nutrition_goals
               SET calories_goal = $2, proteins_goal = $3, fats_goal = $4, carbs_goal = $5,
                   version = version + 1, updated_at = now()
             WHERE id = $1
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(goal_id)
        .bind(targets.calories_goal)
        .bind(targets.proteins_goal)
        .bind(targets.fats_goal)
        .bind(targets.carbs_goal)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GoalError::NotFound(goal_id))
    }

    async fn ping(&self) -> GoalResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GoalError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

/// Run against a live Postgres: `DATABASE_URL=... cargo test -- --ignored`.
/// Each test gets a fresh database with `./migrations` applied.
#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const DAY: Date = date!(2024 - 05 - 10);

    async fn active_rows(pool: &PgPool, user_id: Uuid) -> i64 {
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM nutrition_goals WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
        n
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn concurrent_bootstrap_inserts_one_row(pool: PgPool) {
        let repo = PgGoalRepository::new(pool.clone());
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
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(active_rows(&pool, user).await, 1);

        let again = repo.bootstrap_default_if_absent(user, DAY).await.unwrap();
        assert_eq!(again.id, ids[0]);
        assert_eq!(again.targets, GoalTargets::default());
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn partial_index_rejects_second_active_goal(pool: PgPool) {
        let repo = PgGoalRepository::new(pool.clone());
        let user = Uuid::new_v4();
        repo.bootstrap_default_if_absent(user, DAY).await.unwrap();

        let err = sqlx::query(
            r#"
            INSERT INTO nutrition_goals
                (id, user_id, calories_goal, proteins_goal, fats_goal, carbs_goal,
                 is_active, start_date, goal_achieved_days, version)
            VALUES ($1, $2, 2000, 75, 65, 250, TRUE, $3, 0, 0)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user)
        .bind(DAY)
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn create_deactivates_previous_goal(pool: PgPool) {
        let repo = PgGoalRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let first = repo.bootstrap_default_if_absent(user, DAY).await.unwrap();

        let targets = GoalTargets {
            calories_goal: 1800,
            ..GoalTargets::default()
        };
        let second = repo.create(user, targets, DAY).await.unwrap();

        let old = repo.get(first.id).await.unwrap().unwrap();
        assert!(!old.is_active);
        assert_eq!(old.version, first.version + 1);

        let active = repo.get_active(user).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.targets, targets);
        assert_eq!(active_rows(&pool, user).await, 1);
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn concurrent_creates_leave_one_active_goal(pool: PgPool) {
        let repo = PgGoalRepository::new(pool.clone());
        let user = Uuid::new_v4();
        repo.bootstrap_default_if_absent(user, DAY).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(user, GoalTargets::default(), DAY).await })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert!(matches!(e, GoalError::Conflict { .. }), "{e}"),
            }
        }
        assert!(created >= 1);
        assert_eq!(active_rows(&pool, user).await, 1);
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn save_checks_version(pool: PgPool) {
        let repo = PgGoalRepository::new(pool);
        let goal = repo
            .bootstrap_default_if_absent(Uuid::new_v4(), DAY)
            .await
            .unwrap();

        let mut first = goal.clone();
        first.goal_achieved_days = 1;
        first.last_achieved_date = Some(DAY);
        let saved = repo.save(&first).await.unwrap();
        assert_eq!(saved.version, goal.version + 1);
        assert_eq!(saved.goal_achieved_days, 1);
        assert_eq!(saved.last_achieved_date, Some(DAY));

        let mut stale = goal.clone();
        stale.goal_achieved_days = 5;
        let err = repo.save(&stale).await.unwrap_err();
        assert!(matches!(err, GoalError::Conflict { .. }));
        assert!(err.is_retryable());

        let stored = repo.get(goal.id).await.unwrap().unwrap();
        assert_eq!(stored.goal_achieved_days, 1);
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn missing_goal_is_not_found(pool: PgPool) {
        let repo = PgGoalRepository::new(pool);
        let ghost = NutritionGoal::new_active(Uuid::new_v4(), GoalTargets::default(), DAY);

        let err = repo.save(&ghost).await.unwrap_err();
        assert!(matches!(err, GoalError::NotFound(id) if id == ghost.id));

        let err = repo
            .update_targets(ghost.id, GoalTargets::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GoalError::NotFound(_)));
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn update_targets_bumps_version_and_keeps_streak(pool: PgPool) {
        let repo = PgGoalRepository::new(pool);
        let goal = repo
            .bootstrap_default_if_absent(Uuid::new_v4(), DAY)
            .await
            .unwrap();
        let mut streaking = goal.clone();
        streaking.goal_achieved_days = 3;
        streaking.last_achieved_date = Some(DAY);
        let streaking = repo.save(&streaking).await.unwrap();

        let targets = GoalTargets {
            proteins_goal: 120,
            ..GoalTargets::default()
        };
        let updated = repo.update_targets(goal.id, targets).await.unwrap();
        assert_eq!(updated.targets, targets);
        assert_eq!(updated.goal_achieved_days, 3);
        assert_eq!(updated.version, streaking.version + 1);

        // A save prepared before the edit must not overwrite it.
        assert!(matches!(
            repo.save(&streaking).await.unwrap_err(),
            GoalError::Conflict { .. }
        ));
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn ping_reaches_database(pool: PgPool) {
        PgGoalRepository::new(pool).ping().await.unwrap();
    }
}
