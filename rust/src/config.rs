//! Configuration for timeline generation and timeline queries.

use chrono::TimeDelta;

use crate::error::PlannerError;

const MAX_STAGGER_MINUTES: i64 = 24 * 60;

/// Tunables for the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Minutes between consecutive recipes' target end times
    pub stagger_minutes: i64,
    /// Boundary (in minutes) that task times are truncated to after scheduling
    pub rounding_minutes: i64,
    /// Maximum number of tasks reported as upcoming
    pub upcoming_limit: usize,
    /// Logging verbosity (0-3), see `crate::logging`
    pub verbosity: u8,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            stagger_minutes: 5,
            rounding_minutes: 5,
            upcoming_limit: 3,
            verbosity: 0,
        }
    }
}

impl PlannerConfig {
    /// Build a config, falling back to the defaults for every `None`.
    pub fn new(
        stagger_minutes: Option<i64>,
        rounding_minutes: Option<i64>,
        upcoming_limit: Option<usize>,
        verbosity: Option<u8>,
    ) -> Result<Self, PlannerError> {
        let defaults = Self::default();
        let config = Self {
            stagger_minutes: stagger_minutes.unwrap_or(defaults.stagger_minutes),
            rounding_minutes: rounding_minutes.unwrap_or(defaults.rounding_minutes),
            upcoming_limit: upcoming_limit.unwrap_or(defaults.upcoming_limit),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.stagger_minutes < 0 {
            return Err(PlannerError::validation(format!(
                "stagger_minutes must not be negative, got {}",
                self.stagger_minutes
            )));
        }
        // Truncation counts from the Unix epoch, so only divisors of an hour line up
        // with minute-of-hour boundaries
        if self.rounding_minutes <= 0 || 60 % self.rounding_minutes != 0 {
            return Err(PlannerError::validation(format!(
                "rounding_minutes must divide 60, got {}",
                self.rounding_minutes
            )));
        }
        if self.stagger_minutes > MAX_STAGGER_MINUTES {
            return Err(PlannerError::validation(format!(
                "stagger_minutes must be at most {}, got {}",
                MAX_STAGGER_MINUTES, self.stagger_minutes
            )));
        }
        Ok(())
    }

    pub fn stagger(&self) -> TimeDelta {
        TimeDelta::minutes(self.stagger_minutes)
    }

    pub fn rounding(&self) -> TimeDelta {
        TimeDelta::minutes(self.rounding_minutes)
    }
}
