use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::day::{self, serde_day};
use crate::error::GoalResult;
use crate::ledger::{repo::MealLedger, repo_types::MealRecord};

/// Sum of a user's meals on one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub calories: i64,
    pub proteins: i64,
    pub fats: i64,
    pub carbohydrates: i64,
}

impl DailyTotals {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a MealRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut acc, r| {
                acc.calories += i64::from(r.calories);
                acc.proteins += i64::from(r.proteins);
                acc.fats += i64::from(r.fats);
                acc.carbohydrates += i64::from(r.carbohydrates);
                acc
            })
    }
}

#[derive(Debug, Serialize)]
pub struct DailySummary {
    #[serde(with = "serde_day")]
    pub date: Date,
    pub records: Vec<MealRecord>,
    pub totals: DailyTotals,
}

#[derive(Clone)]
pub struct IntakeAggregator {
    ledger: Arc<dyn MealLedger>,
}

impl IntakeAggregator {
    pub fn new(ledger: Arc<dyn MealLedger>) -> Self {
        Self { ledger }
    }

    /// Totals for the day; a day without meals yields zeros.
    pub async fn totals_for(&self, user_id: Uuid, date: Date) -> GoalResult<DailyTotals> {
        let records = self.ledger.records_for(user_id, &day::day_key(date)).await?;
        let totals = DailyTotals::from_records(&records);
        debug!(%user_id, %date, meals = records.len(), ?totals, "daily intake aggregated");
        Ok(totals)
    }

    pub async fn summary_for(&self, user_id: Uuid, date: Date) -> GoalResult<DailySummary> {
        let records = self.ledger.records_for(user_id, &day::day_key(date)).await?;
        let totals = DailyTotals::from_records(&records);
        Ok(DailySummary {
            date,
            records,
            totals,
        })
    }
}
