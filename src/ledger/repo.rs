use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::GoalResult;
use crate::ledger::repo_types::MealRecord;

/// Read side of the meal log.
#[async_trait]
pub trait MealLedger: Send + Sync {
    /// All records of the user whose day key equals `date` exactly.
    async fn records_for(&self, user_id: Uuid, date: &str) -> GoalResult<Vec<MealRecord>>;
}

#[derive(Clone)]
pub struct PgMealLedger {
    pool: PgPool,
}

impl PgMealLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MealLedger for PgMealLedger {
    async fn records_for(&self, user_id: Uuid, date: &str) -> GoalResult<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRecord>(
            r#"
            SELECT id, user_id, meal_date, calories, proteins, fats, carbohydrates,
                   meal_type, meal_time, meal_description
              FROM meal_logs
             WHERE user_id = $1 AND meal_date = $2
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
