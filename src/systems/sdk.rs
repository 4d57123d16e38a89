// src/systems/sdk.rs

//! # Systems SDK
//!
//! Collaborator protocol for the closed-loop environment. The environment
//! owns one of each and drives them once per 1-minute tick:
//!
//! 1) **Scenario**: `get_action(t) -> ScenarioAction` says how many grams of
//!    carbohydrate are eaten at absolute time `t`. Provided here:
//!    `FixedScenario` and `ScenarioGenerator` (see `systems::scenario`).
//!
//! 2) **Pump**: turns the controller's `(basal, bolus)` request into the
//!    insulin actually delivered, subject to device limits.
//!
//! 3) **Patient**: advances physiology by one minute given
//!    `(insulin, CHO)` and is the only source of elapsed time.
//!
//! 4) **Sensor**: reads the patient and returns a (possibly noisy) CGM value.
//!
//! Patient, sensor, and pump are external models; this crate only consumes
//! them. Their failures travel back to the caller as
//! [`SimError::Collaborator`](crate::error::SimError::Collaborator) without
//! being rewrapped.
//!
//! ## Determinism
//! - Every collaborator is owned by exactly one environment.
//! - `reset()` must return a collaborator to its initial state so an episode
//!   can be replayed with identical results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, SimResult};

/// What the external controller asks for once per decision interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Basal insulin rate (U/min).
    pub basal: f64,
    /// Bolus insulin (U/min over the tick).
    pub bolus: f64,
}

/// What the patient model receives each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientAction {
    pub insulin: f64,
    /// Carbohydrate intake (g/min).
    pub cho: f64,
}

/// Meal the scenario serves at an instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    /// Carbohydrate (g).
    pub meal: f64,
}

/// Interval-averaged observation handed back to the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub cho: f64,
    pub cgm: f64,
}

/// Result of one decision step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
}

/// Box-shaped numeric range for controller introspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Space {
    pub low: f64,
    pub high: f64,
    pub shape: usize,
}

impl Space {
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.low && x <= self.high
    }
}

/// Glucose–insulin physiology, one minute per `step`.
pub trait Patient {
    fn step(&mut self, action: PatientAction) -> Result<(), BoxError>;
    /// Current true glucose (subcutaneous), mg/dL.
    fn glucose(&self) -> f64;
    /// Whole minutes elapsed since the episode started.
    fn elapsed_minutes(&self) -> u32;
    fn reset(&mut self) -> Result<(), BoxError>;
}

/// Continuous glucose monitor.
pub trait Sensor {
    fn measure(&mut self, patient: &dyn Patient) -> Result<f64, BoxError>;
    /// Natively preferred decision interval (minutes).
    fn sample_time(&self) -> f64;
    fn reset(&mut self) -> Result<(), BoxError>;
}

/// Insulin pump with device limits.
pub trait Pump {
    fn basal(&mut self, rate: f64) -> Result<f64, BoxError>;
    fn bolus(&mut self, amount: f64) -> Result<f64, BoxError>;
    fn max_basal(&self) -> f64;
    fn max_bolus(&self) -> f64;
    fn reset(&mut self) -> Result<(), BoxError>;
}

/// Meal source keyed by absolute time.
pub trait Scenario {
    fn get_action(&mut self, t: NaiveDateTime) -> SimResult<ScenarioAction>;
    fn reset(&mut self) -> SimResult<()>;
}

