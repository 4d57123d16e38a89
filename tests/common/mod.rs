// tests/common/mod.rs
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use glucose_loop::BoxError;
use glucose_loop::mechanics::time::midnight;
use glucose_loop::systems::sdk::{Patient, PatientAction, Pump, Sensor};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn t0() -> NaiveDateTime {
    midnight(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
}

/// Patient whose glucose is whatever the shared cell says; logs every action.
pub struct StubPatient {
    pub bg: Rc<Cell<f64>>,
    pub initial_bg: f64,
    pub t: u32,
    pub log: Rc<RefCell<Vec<PatientAction>>>,
    pub resets: Rc<Cell<usize>>,
    pub fail_at: Option<u32>,
}

impl StubPatient {
    pub fn constant(bg: f64) -> Self {
        Self {
            bg: Rc::new(Cell::new(bg)),
            initial_bg: bg,
            t: 0,
            log: Rc::new(RefCell::new(Vec::new())),
            resets: Rc::new(Cell::new(0)),
            fail_at: None,
        }
    }
}

impl Patient for StubPatient {
    fn step(&mut self, action: PatientAction) -> Result<(), BoxError> {
        if self.fail_at == Some(self.t) {
            return Err("patient model diverged".into());
        }
        self.log.borrow_mut().push(action);
        self.t += 1;
        Ok(())
    }
    fn glucose(&self) -> f64 {
        self.bg.get()
    }
    fn elapsed_minutes(&self) -> u32 {
        self.t
    }
    fn reset(&mut self) -> Result<(), BoxError> {
        self.t = 0;
        self.bg.set(self.initial_bg);
        self.log.borrow_mut().clear();
        self.resets.set(self.resets.get() + 1);
        Ok(())
    }
}

/// Sensor reporting true glucose plus a fixed offset.
pub struct EchoSensor {
    pub sample_time: f64,
    pub offset: f64,
}

impl Sensor for EchoSensor {
    fn measure(&mut self, patient: &dyn Patient) -> Result<f64, BoxError> {
        Ok(patient.glucose() + self.offset)
    }
    fn sample_time(&self) -> f64 {
        self.sample_time
    }
    fn reset(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Pump clamping requests into `[0, max]`.
pub struct ClampPump {
    pub max_basal: f64,
    pub max_bolus: f64,
}

impl Default for ClampPump {
    fn default() -> Self {
        Self { max_basal: 10.0, max_bolus: 30.0 }
    }
}

impl Pump for ClampPump {
    fn basal(&mut self, rate: f64) -> Result<f64, BoxError> {
        Ok(rate.clamp(0.0, self.max_basal))
    }
    fn bolus(&mut self, amount: f64) -> Result<f64, BoxError> {
        Ok(amount.clamp(0.0, self.max_bolus))
    }
    fn max_basal(&self) -> f64 {
        self.max_basal
    }
    fn max_bolus(&self) -> f64 {
        self.max_bolus
    }
    fn reset(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}
