use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One logged meal. Immutable once written; `meal_date` is the `YYYY-MM-DD` day key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_date: String,
    pub calories: i32,
    pub proteins: i32,
    pub fats: i32,
    pub carbohydrates: i32,
    pub meal_type: Option<String>,
    pub meal_time: Option<String>,
    pub meal_description: Option<String>,
}
