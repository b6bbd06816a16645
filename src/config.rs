//! Runtime settings.
//!
//! Values come from the environment (a `.env` file is honoured when present)
//! and can be overridden per invocation by CLI flags. Malformed numbers are
//! reported, never silently defaulted.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::estimator::Timeouts;

pub const DEFAULT_ESTIMATOR_URL: &str = "http://localhost:8001";
pub const DEFAULT_DATA_DIR: &str = "./shared_data";
pub const DEFAULT_STATE_DIR: &str = "./state";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub estimator_url: String,
    /// Where cleaned response matrices are written for the estimator.
    pub data_dir: PathBuf,
    /// Root of the file-backed job state store.
    pub state_dir: PathBuf,
    pub state_ttl: Duration,
    pub timeouts: Timeouts,
    /// Consecutive health transport failures before the client degrades.
    pub degrade_after: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            estimator_url: DEFAULT_ESTIMATOR_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            state_ttl: crate::store::DEFAULT_TTL,
            timeouts: Timeouts::default(),
            degrade_after: 2,
        }
    }
}

impl Settings {
    /// Load `.env` (if any) and read `IRT_*` variables from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str, default: Duration| -> Result<Duration, AppError> {
            Ok(parse_var(key, text(key))?.map(Duration::from_secs).unwrap_or(default))
        };

        let degrade_after: u32 = parse_var("IRT_DEGRADE_AFTER", text("IRT_DEGRADE_AFTER"))?
            .unwrap_or(defaults.degrade_after);
        if degrade_after == 0 {
            return Err(AppError::Config("IRT_DEGRADE_AFTER must be at least 1".to_string()));
        }

        Ok(Self {
            estimator_url: text("IRT_ESTIMATOR_URL").unwrap_or(defaults.estimator_url),
            data_dir: text("IRT_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            state_dir: text("IRT_STATE_DIR").map(PathBuf::from).unwrap_or(defaults.state_dir),
            state_ttl: secs("IRT_STATE_TTL_SECS", defaults.state_ttl)?,
            timeouts: Timeouts {
                health: secs("IRT_HEALTH_TIMEOUT_SECS", defaults.timeouts.health)?,
                icc: secs("IRT_ICC_TIMEOUT_SECS", defaults.timeouts.icc)?,
                query: secs("IRT_QUERY_TIMEOUT_SECS", defaults.timeouts.query)?,
                fit: secs("IRT_FIT_TIMEOUT_SECS", defaults.timeouts.fit)?,
            },
            degrade_after,
        })
    }
}

fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("{key}='{raw}' is not valid: {e}")))
        })
        .transpose()
}
