//! Closed-loop environment.
//!
//! One `step` = `sample_time` ticks of one minute each. Every tick asks the
//! scenario for the meal at the current instant, runs the controller's action
//! through the pump, advances the patient, and reads the sensor. The reported
//! observation is the uniform average over the ticks, and risk/reward/done are
//! computed from the averaged BG.

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::error::{SimError, SimResult};
use crate::mechanics::{risk, time};
use crate::systems::sdk::{
    Action, Observation, Patient, PatientAction, Pump, Scenario, Sensor, Space, Step,
};

/// Environment configuration. `None` fields fall back to the collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Absolute start of the episode; defaults to midnight today.
    pub start_time: Option<NaiveDateTime>,
    /// Decision interval in minutes; defaults to the sensor's `sample_time()`.
    pub sample_time: Option<f64>,
}

/// Time series of one episode.
///
/// `time`, `bg`, `cgm`, `risk`, `lbgi`, `hbgi` start with the baseline sample;
/// `cho` and `insulin` hold what was delivered during each step and are
/// therefore one entry shorter.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EpisodeHistory {
    time: Vec<NaiveDateTime>,
    bg: Vec<f64>,
    cgm: Vec<f64>,
    risk: Vec<f64>,
    lbgi: Vec<f64>,
    hbgi: Vec<f64>,
    cho: Vec<f64>,
    insulin: Vec<f64>,
}

impl EpisodeHistory {
    fn baseline(t: NaiveDateTime, bg: f64, cgm: f64, r: risk::Risk) -> Self {
        let mut h = Self::default();
        h.push_sample(t, bg, cgm, r);
        h
    }

    fn push_sample(&mut self, t: NaiveDateTime, bg: f64, cgm: f64, r: risk::Risk) {
        self.time.push(t);
        self.bg.push(bg);
        self.cgm.push(cgm);
        self.risk.push(r.ri);
        self.lbgi.push(r.lbgi);
        self.hbgi.push(r.hbgi);
    }

    fn push_action(&mut self, cho: f64, insulin: f64) {
        self.cho.push(cho);
        self.insulin.push(insulin);
    }

    /// Number of samples, baseline included.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }
    pub fn bg(&self) -> &[f64] {
        &self.bg
    }
    pub fn cgm(&self) -> &[f64] {
        &self.cgm
    }
    pub fn risk(&self) -> &[f64] {
        &self.risk
    }
    pub fn lbgi(&self) -> &[f64] {
        &self.lbgi
    }
    pub fn hbgi(&self) -> &[f64] {
        &self.hbgi
    }
    pub fn cho(&self) -> &[f64] {
        &self.cho
    }
    pub fn insulin(&self) -> &[f64] {
        &self.insulin
    }
}

/// Per-interval running averages.
#[derive(Clone, Copy, Debug, Default)]
struct Interval {
    cho: f64,
    insulin: f64,
    bg: f64,
    cgm: f64,
}

pub struct SimulationEnvironment {
    patient: Box<dyn Patient>,
    sensor: Box<dyn Sensor>,
    pump: Box<dyn Pump>,
    scenario: Box<dyn Scenario>,
    start_time: NaiveDateTime,
    sample_time: u32,
    history: EpisodeHistory,
}

impl SimulationEnvironment {
    pub fn new(
        patient: Box<dyn Patient>,
        mut sensor: Box<dyn Sensor>,
        pump: Box<dyn Pump>,
        scenario: Box<dyn Scenario>,
        cfg: EnvConfig,
    ) -> SimResult<Self> {
        let sample_time = validate_sample_time(cfg.sample_time.unwrap_or(sensor.sample_time()))?;
        let start_time = cfg
            .start_time
            .unwrap_or_else(|| time::midnight(Local::now().date_naive()));

        let history = baseline(start_time, patient.as_ref(), sensor.as_mut())?;
        Ok(Self { patient, sensor, pump, scenario, start_time, sample_time, history })
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Decision interval in minutes.
    pub fn sample_time(&self) -> u32 {
        self.sample_time
    }

    /// `start_time` plus the patient's elapsed minutes.
    ///
    /// Saturates at `NaiveDateTime::MAX` when the sum leaves chrono's range.
    pub fn time(&self) -> NaiveDateTime {
        let elapsed = Duration::minutes(i64::from(self.patient.elapsed_minutes()));
        self.start_time.checked_add_signed(elapsed).unwrap_or(NaiveDateTime::MAX)
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    pub fn patient(&self) -> &dyn Patient {
        self.patient.as_ref()
    }

    pub fn sensor(&self) -> &dyn Sensor {
        self.sensor.as_ref()
    }

    pub fn pump(&self) -> &dyn Pump {
        self.pump.as_ref()
    }

    pub fn scenario(&self) -> &dyn Scenario {
        self.scenario.as_ref()
    }

    /// Valid controller outputs: `[0, max_basal + max_bolus]`. Not enforced.
    pub fn action_space(&self) -> Space {
        Space { low: 0.0, high: self.pump.max_basal() + self.pump.max_bolus(), shape: 1 }
    }

    /// Observations are non-negative.
    pub fn observation_space(&self) -> Space {
        Space { low: 0.0, high: f64::INFINITY, shape: 1 }
    }

    fn mini_step(&mut self, action: Action) -> SimResult<Interval> {
        let meal = self.scenario.get_action(self.time())?.meal;
        let basal = self.pump.basal(action.basal)?;
        let bolus = self.pump.bolus(action.bolus)?;
        let insulin = basal + bolus;

        self.patient.step(PatientAction { insulin, cho: meal })?;

        let bg = self.patient.glucose();
        let cgm = self.sensor.measure(self.patient.as_ref())?;
        Ok(Interval { cho: meal, insulin, bg, cgm })
    }

    /// Advance one decision interval.
    pub fn step(&mut self, action: Action) -> SimResult<Step> {
        let n = f64::from(self.sample_time);
        let mut avg = Interval::default();
        for _ in 0..self.sample_time {
            let tick = self.mini_step(action)?;
            avg.cho += tick.cho / n;
            avg.insulin += tick.insulin / n;
            avg.bg += tick.bg / n;
            avg.cgm += tick.cgm / n;
        }

        let r = risk::risk(avg.bg)?;
        let now = self.time();
        self.history.push_action(avg.cho, avg.insulin);
        self.history.push_sample(now, avg.bg, avg.cgm, r);

        let reward = risk::reward(&r);
        let done = risk::is_unsafe(avg.bg);
        trace!(%now, bg = avg.bg, cgm = avg.cgm, cho = avg.cho, risk = r.ri, "step");
        if done {
            warn!(%now, bg = avg.bg, "glucose left the safe band; episode over");
        }

        Ok(Step { observation: Observation { cho: avg.cho, cgm: avg.cgm }, reward, done })
    }

    /// Reset every collaborator and restart the history from a fresh baseline.
    /// Returns the baseline as a step with no carbohydrate.
    pub fn reset(&mut self) -> SimResult<Step> {
        self.patient.reset()?;
        self.sensor.reset()?;
        self.pump.reset()?;
        self.scenario.reset()?;

        self.history = baseline(self.start_time, self.patient.as_ref(), self.sensor.as_mut())?;
        info!(start_time = %self.start_time, "environment reset");

        let bg = self.history.bg[0];
        let r = risk::risk(bg)?;
        Ok(Step {
            observation: Observation { cho: 0.0, cgm: self.history.cgm[0] },
            reward: risk::reward(&r),
            done: risk::is_unsafe(bg),
        })
    }
}

fn validate_sample_time(sample_time: f64) -> SimResult<u32> {
    if sample_time.is_finite()
        && sample_time > 0.0
        && sample_time.fract() == 0.0
        && sample_time <= f64::from(u32::MAX)
    {
        Ok(sample_time as u32)
    } else {
        Err(SimError::InvalidConfiguration { sample_time })
    }
}

fn baseline(
    start_time: NaiveDateTime,
    patient: &dyn Patient,
    sensor: &mut dyn Sensor,
) -> SimResult<EpisodeHistory> {
    let bg = patient.glucose();
    let r = risk::risk_index(&[bg], 0)?;
    let cgm = sensor.measure(patient)?;
    Ok(EpisodeHistory::baseline(start_time, bg, cgm, r))
}
