//! Scheduling configuration: visit length and slot granularity.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Minutes a visit occupies when no other value is configured.
pub const DEFAULT_VISIT_MINUTES: u32 = 30;

/// Step between candidate slot starts when no other value is configured.
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// A visit occupies `[instant, instant + visit_duration_minutes)`.
    pub visit_duration_minutes: u32,
    /// Length and step of the candidate slots produced by the slot generator.
    pub slot_granularity_minutes: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            visit_duration_minutes: DEFAULT_VISIT_MINUTES,
            slot_granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }
}

impl SchedulingConfig {
    pub fn new(visit_duration_minutes: u32, slot_granularity_minutes: u32) -> Result<Self> {
        let config = Self {
            visit_duration_minutes,
            slot_granularity_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.visit_duration_minutes == 0 {
            return Err(BookingError::InvalidConfig(
                "visit duration must be at least one minute".to_string(),
            ));
        }
        if self.slot_granularity_minutes == 0 {
            return Err(BookingError::InvalidConfig(
                "slot granularity must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    pub fn visit_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.visit_duration_minutes))
    }

    pub fn granularity(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_granularity_minutes))
    }
}
