//! Schedule configuration

use chrono::{Duration, NaiveTime};
use serde::Deserialize;

use crate::application::Schedule;

use super::error::ValidationError;

const MAX_PROOF_TTL_HOURS: i64 = 168;

/// Wall-clock jobs (UTC) and pending proof lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Daily sweep time, `HH:MM`
    #[serde(default = "default_sweep_at")]
    pub sweep_at: String,

    /// Daily backup time, `HH:MM`
    #[serde(default = "default_backup_at")]
    pub backup_at: String,

    /// How long an "I paid" press waits for its receipt
    #[serde(default = "default_proof_ttl")]
    pub pending_proof_ttl_hours: i64,
}

impl ScheduleConfig {
    pub fn schedule(&self) -> Result<Schedule, ValidationError> {
        Ok(Schedule {
            sweep_at: parse_time_of_day(&self.sweep_at)?,
            backup_at: parse_time_of_day(&self.backup_at)?,
        })
    }

    pub fn pending_proof_ttl(&self) -> Duration {
        Duration::hours(self.pending_proof_ttl_hours)
    }

    /// Validate schedule configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.schedule()?;
        if !(1..=MAX_PROOF_TTL_HOURS).contains(&self.pending_proof_ttl_hours) {
            return Err(ValidationError::InvalidProofTtl);
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sweep_at: default_sweep_at(),
            backup_at: default_backup_at(),
            pending_proof_ttl_hours: default_proof_ttl(),
        }
    }
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTimeOfDay(value.to_string()))
}

fn default_sweep_at() -> String {
    "09:00".to_string()
}

fn default_backup_at() -> String {
    "21:00".to_string()
}

fn default_proof_ttl() -> i64 {
    24
}
