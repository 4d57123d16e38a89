//! Error types for the simulation core.
//!
//! Everything fallible returns [`SimResult`]. Collaborator failures (patient,
//! sensor, pump) are carried through [`SimError::Collaborator`] untouched.

use thiserror::Error;

/// Boxed error produced by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Expected sample_time to be a positive integer number of minutes, got {sample_time}")]
    InvalidConfiguration {
        sample_time: f64,
    },

    #[error("Time value cannot be resolved to an instant: {reason}")]
    InvalidTimeKind {
        reason: String,
    },

    #[error("Glucose value {value} mg/dL is outside the domain of the risk transform")]
    InvalidGlucoseValue {
        value: f64,
    },

    #[error("Invalid day schedule: {reason}")]
    InvalidSchedule {
        reason: String,
    },

    #[error(transparent)]
    Collaborator(#[from] BoxError),
}

impl SimError {
    pub(crate) fn time_kind(reason: impl Into<String>) -> Self {
        Self::InvalidTimeKind { reason: reason.into() }
    }

    pub(crate) fn schedule(reason: impl Into<String>) -> Self {
        Self::InvalidSchedule { reason: reason.into() }
    }
}
