use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
}
