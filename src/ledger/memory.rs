use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::GoalResult;
use crate::ledger::repo::MealLedger;
use crate::ledger::repo_types::MealRecord;

#[derive(Default)]
pub struct InMemoryMealLedger {
    records: RwLock<Vec<MealRecord>>,
}

impl InMemoryMealLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn log(&self, user_id: Uuid, date: &str, macros: (i32, i32, i32, i32)) {
        let (calories, proteins, fats, carbohydrates) = macros;
        self.records.write().await.push(MealRecord {
            id: Uuid::new_v4(),
            user_id,
            meal_date: date.to_string(),
            calories,
            proteins,
            fats,
            carbohydrates,
            meal_type: None,
            meal_time: None,
            meal_description: None,
        });
    }
}

#[async_trait]
impl MealLedger for InMemoryMealLedger {
    async fn records_for(&self, user_id: Uuid, date: &str) -> GoalResult<Vec<MealRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.meal_date == date)
            .cloned()
            .collect())
    }
}
