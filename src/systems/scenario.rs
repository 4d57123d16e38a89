//! Meal scenarios.
//!
//! - [`FixedScenario`]: a fixed list of `(time, grams)` pairs, exact-instant lookup.
//! - [`ScenarioGenerator`]: draws a fresh meal plan for every calendar day from a
//!   [`DaySchedule`] of independent meal slots (Bernoulli gate, truncated-normal
//!   time, normal amount).

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::mechanics::{stoch::RandomStream, time};
use crate::systems::sdk::{Scenario, ScenarioAction};

/* ───────────────────────────── fixed ───────────────────────────── */

/// Deterministic lookup table. Times are resolved once at construction.
#[derive(Clone, Debug)]
pub struct FixedScenario {
    start_time: NaiveDateTime,
    meals: Vec<(NaiveDateTime, f64)>,
}

impl FixedScenario {
    pub fn new<T: Into<time::SimTime>>(
        start_time: NaiveDateTime,
        scenario: impl IntoIterator<Item = (T, f64)>,
    ) -> SimResult<Self> {
        let meals = scenario
            .into_iter()
            .map(|(t, grams)| Ok((time::resolve(t.into(), start_time)?, grams)))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self { start_time, meals })
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn meals(&self) -> &[(NaiveDateTime, f64)] {
        &self.meals
    }
}

impl Scenario for FixedScenario {
    /// First configured entry resolving to exactly `t` wins.
    fn get_action(&mut self, t: NaiveDateTime) -> SimResult<ScenarioAction> {
        let meal = self
            .meals
            .iter()
            .find(|(at, _)| *at == t)
            .map_or(0.0, |&(_, grams)| grams);
        Ok(ScenarioAction { meal })
    }

    fn reset(&mut self) -> SimResult<()> {
        Ok(())
    }
}

/* ─────────────────────────── day schedule ─────────────────────────── */

/// Per-slot meal distribution. All sequences are parallel, one entry per slot
/// (e.g. breakfast, snack, lunch, snack, dinner, snack).
///
/// Window bounds are in hours of the day; means and spreads of meal time are in
/// minutes; amounts in grams.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub probability: Vec<f64>,
    pub time_lb_hours: Vec<f64>,
    pub time_ub_hours: Vec<f64>,
    pub time_mean_min: Vec<f64>,
    pub time_sd_min: Vec<f64>,
    pub amount_mean_g: Vec<f64>,
    pub amount_sd_g: Vec<f64>,
}

impl DaySchedule {
    /// Six-slot adult day: three main meals, three optional snacks.
    pub fn standard() -> Self {
        Self {
            probability: vec![0.95, 0.3, 0.95, 0.3, 0.95, 0.3],
            time_lb_hours: vec![5.0, 9.0, 10.0, 14.0, 16.0, 20.0],
            time_ub_hours: vec![9.0, 10.0, 14.0, 16.0, 20.0, 23.0],
            time_mean_min: vec![420.0, 570.0, 720.0, 900.0, 1080.0, 1290.0],
            time_sd_min: vec![60.0, 30.0, 60.0, 30.0, 60.0, 30.0],
            amount_mean_g: vec![45.0, 10.0, 70.0, 10.0, 80.0, 10.0],
            amount_sd_g: vec![10.0, 5.0, 10.0, 5.0, 10.0, 5.0],
        }
    }

    pub fn slots(&self) -> usize {
        self.probability.len()
    }

    pub fn validate(&self) -> SimResult<()> {
        let n = self.slots();
        let lens = [
            self.time_lb_hours.len(),
            self.time_ub_hours.len(),
            self.time_mean_min.len(),
            self.time_sd_min.len(),
            self.amount_mean_g.len(),
            self.amount_sd_g.len(),
        ];
        if lens.iter().any(|&l| l != n) {
            return Err(SimError::schedule(format!(
                "slot sequences differ in length ({n} probabilities vs {lens:?})"
            )));
        }
        for i in 0..n {
            let p = self.probability[i];
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::schedule(format!("slot {i}: probability {p} not in [0, 1]")));
            }
            let (lb, ub) = (self.time_lb_hours[i], self.time_ub_hours[i]);
            if !(0.0 <= lb && lb <= ub && ub <= 24.0) {
                return Err(SimError::schedule(format!(
                    "slot {i}: time window [{lb}, {ub}] h must satisfy 0 <= lb <= ub <= 24"
                )));
            }
            let (tsd, msd) = (self.time_sd_min[i], self.amount_sd_g[i]);
            if !(tsd >= 0.0 && msd >= 0.0 && tsd.is_finite() && msd.is_finite()) {
                return Err(SimError::schedule(format!(
                    "slot {i}: stddevs must be finite and >= 0 (time {tsd}, amount {msd})"
                )));
            }
            let (tbar, mbar) = (self.time_mean_min[i], self.amount_mean_g[i]);
            if !(tbar.is_finite() && mbar.is_finite()) {
                return Err(SimError::schedule(format!("slot {i}: means must be finite")));
            }
        }
        Ok(())
    }
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self::standard()
    }
}

/* ─────────────────────────── generator ─────────────────────────── */

/// Last minute of a day. A window closing at 24:00 serves its latest meals here.
pub const LAST_MINUTE: u32 = 24 * 60 - 1;

/// One meal of the current day's plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealEvent {
    /// Minutes after midnight.
    pub minute: u32,
    pub amount: f64,
}

/// Stochastic daily meal plan.
///
/// A plan is drawn lazily the first time a query falls on a date other than
/// the one the current plan belongs to, and kept for the rest of that date.
/// Slots landing on the same minute are summed into one meal.
#[derive(Debug)]
pub struct ScenarioGenerator {
    start_time: NaiveDateTime,
    schedule: DaySchedule,
    stream: RandomStream,
    schedule_date: NaiveDate,
    meals: BTreeMap<u32, f64>,
}

impl ScenarioGenerator {
    /// Builds the generator and draws the plan for `start_time`'s date.
    pub fn new(start_time: NaiveDateTime, schedule: DaySchedule, seed: u64) -> SimResult<Self> {
        schedule.validate()?;
        Ok(Self::build(start_time, schedule, seed))
    }

    /// Standard six-slot schedule.
    pub fn with_seed(start_time: NaiveDateTime, seed: u64) -> Self {
        Self::build(start_time, DaySchedule::standard(), seed)
    }

    fn build(start_time: NaiveDateTime, schedule: DaySchedule, seed: u64) -> Self {
        let mut g = Self {
            start_time,
            schedule,
            stream: RandomStream::new(seed),
            schedule_date: start_time.date(),
            meals: BTreeMap::new(),
        };
        g.regenerate_day(start_time.date());
        g
    }

    pub fn seed(&self) -> u64 {
        self.stream.seed()
    }

    /// Replace the seed; rewinds the stream and redraws the first day.
    pub fn set_seed(&mut self, seed: u64) {
        self.stream = RandomStream::new(seed);
        self.restart();
    }

    pub fn schedule(&self) -> &DaySchedule {
        &self.schedule
    }

    pub fn schedule_date(&self) -> NaiveDate {
        self.schedule_date
    }

    /// Today's plan, ordered by minute.
    pub fn meals(&self) -> Vec<MealEvent> {
        self.meals
            .iter()
            .map(|(&minute, &amount)| MealEvent { minute, amount })
            .collect()
    }

    /// Draw a new plan from the owned stream and bind it to `date`.
    ///
    /// Slot by slot: one uniform for the gate, then the time draw, then the
    /// amount draw.
    pub fn regenerate_day(&mut self, date: NaiveDate) {
        let s = &self.schedule;
        self.meals.clear();
        for i in 0..s.slots() {
            if !self.stream.bernoulli(s.probability[i]) {
                continue;
            }
            let minute = self
                .stream
                .truncated_normal(
                    s.time_mean_min[i],
                    s.time_sd_min[i],
                    s.time_lb_hours[i] * 60.0,
                    s.time_ub_hours[i] * 60.0,
                )
                .round_ties_even()
                .min(LAST_MINUTE as f64) as u32;
            let amount = self
                .stream
                .normal(s.amount_mean_g[i], s.amount_sd_g[i])
                .round_ties_even()
                .max(0.0);
            debug!(slot = i, minute, amount, "meal drawn");
            *self.meals.entry(minute).or_insert(0.0) += amount;
        }
        self.schedule_date = date;
        info!(%date, meals = self.meals.len(), "new one-day scenario");
    }

    fn restart(&mut self) {
        self.stream.rewind();
        self.regenerate_day(self.start_time.date());
    }
}

impl Scenario for ScenarioGenerator {
    fn get_action(&mut self, t: NaiveDateTime) -> SimResult<ScenarioAction> {
        if t.date() != self.schedule_date {
            self.regenerate_day(t.date());
        }
        let minute = time::minute_of_day(t);
        let meal = self.meals.get(&minute).copied().unwrap_or(0.0);
        if meal > 0.0 {
            debug!(%t, meal, "time for meal");
        }
        Ok(ScenarioAction { meal })
    }

    /// Rewind the stream to its seed and redraw the first day's plan.
    fn reset(&mut self) -> SimResult<()> {
        self.restart();
        Ok(())
    }
}
