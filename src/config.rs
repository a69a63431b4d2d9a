use std::ops::RangeBounds;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::tracking::policy::TrackingPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub jwt: JwtConfig,
    pub tracking: TrackingPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Numbers that do not parse into their type or
    /// fall outside their allowed range are replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("missing required env var {key}"))
        };

        let database_url = require("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: require("JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "mealmind".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "mealmind-users".into()),
        };

        let defaults = TrackingPolicy::default();
        let tracking = TrackingPolicy {
            tolerance_percent: number(&lookup, "GOAL_TOLERANCE_PERCENT", 1..=100)
                .unwrap_or(defaults.tolerance_percent),
            streak_threshold: number(&lookup, "GOAL_STREAK_THRESHOLD", 1..)
                .unwrap_or(defaults.streak_threshold),
            escalation_percent: number(&lookup, "GOAL_ESCALATION_PERCENT", 100..)
                .unwrap_or(defaults.escalation_percent),
        };

        Ok(Self {
            database_url,
            db_max_connections: number(&lookup, "DB_MAX_CONNECTIONS", 1..).unwrap_or(10),
            db_acquire_timeout: Duration::from_secs(
                number(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 1..).unwrap_or(5),
            ),
            request_timeout: Duration::from_millis(
                number(&lookup, "REQUEST_TIMEOUT_MS", 1..).unwrap_or(5000),
            ),
            jwt,
            tracking,
        })
    }
}

/// Reads `key` as `T`. Missing, unparseable and out-of-range values yield `None`.
fn number<T, F, R>(lookup: &F, key: &str, allowed: R) -> Option<T>
where
    T: FromStr + PartialOrd,
    F: Fn(&str) -> Option<String>,
    R: RangeBounds<T>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) if allowed.contains(&v) => Some(v),
        _ => {
            warn!(key, value = %raw, "ignoring invalid config value, using default");
            None
        }
    }
}
