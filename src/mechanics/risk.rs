//! Risk mechanics: asymmetric glucose risk index and the reward/termination
//! rules derived from it.
//!
//! f(BG) = 1.509 * (ln(BG)^1.084 - 5.381), BG in mg/dL.
//! Samples with f < 0 feed the low (hypo) index, f > 0 the high (hyper) index,
//! each as 10 * f². The curve bottoms out near 112.5 mg/dL.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Smallest risk fed into `-ln(risk)`; keeps the reward finite at euglycemia.
pub const RISK_FLOOR: f64 = 1e-10;

/// Episode terminates when averaged BG drops below this (mg/dL).
pub const HYPO_LIMIT: f64 = 70.0;
/// Episode terminates when averaged BG rises above this (mg/dL).
pub const HYPER_LIMIT: f64 = 350.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    /// Low blood glucose index.
    pub lbgi: f64,
    /// High blood glucose index.
    pub hbgi: f64,
    /// `lbgi + hbgi`.
    pub ri: f64,
}

/// Symmetrizing transform f(BG). Fails for BG where the transform is not real.
#[inline]
pub fn transform(bg: f64) -> SimResult<f64> {
    // ln(bg) < 0 for bg < 1 and a fractional power of a negative is NaN.
    if !(bg > 0.0) || !bg.is_finite() {
        return Err(SimError::InvalidGlucoseValue { value: bg });
    }
    let f = 1.509 * (bg.ln().powf(1.084) - 5.381);
    if f.is_finite() {
        Ok(f)
    } else {
        Err(SimError::InvalidGlucoseValue { value: bg })
    }
}

/// Risk index over the trailing `horizon` samples of `bg` (0 means the last one).
///
/// Each side is averaged over the samples that fall on it; a side with no
/// samples contributes 0. An empty window is zero risk.
pub fn risk_index(bg: &[f64], horizon: usize) -> SimResult<Risk> {
    let window = &bg[bg.len().saturating_sub(horizon.max(1))..];

    let (mut lo_sum, mut lo_n, mut hi_sum, mut hi_n) = (0.0, 0usize, 0.0, 0usize);
    for &v in window {
        let f = transform(v)?;
        if f < 0.0 {
            lo_sum += 10.0 * f * f;
            lo_n += 1;
        } else if f > 0.0 {
            hi_sum += 10.0 * f * f;
            hi_n += 1;
        }
    }

    let lbgi = if lo_n > 0 { lo_sum / lo_n as f64 } else { 0.0 };
    let hbgi = if hi_n > 0 { hi_sum / hi_n as f64 } else { 0.0 };
    Ok(Risk { lbgi, hbgi, ri: lbgi + hbgi })
}

/// Zero-horizon risk of a single sample.
#[inline]
pub fn risk(bg: f64) -> SimResult<Risk> {
    risk_index(&[bg], 0)
}

/// Reward: -ln(max(ri, RISK_FLOOR)).
#[inline]
pub fn reward(risk: &Risk) -> f64 {
    if risk.ri <= RISK_FLOOR {
        tracing::warn!(ri = risk.ri, floor = RISK_FLOOR, "risk clamped to floor");
    }
    -risk.ri.max(RISK_FLOOR).ln()
}

/// Severe hypo/hyperglycemia. The safe band [70, 350] is inclusive.
#[inline]
pub fn is_unsafe(bg: f64) -> bool {
    bg < HYPO_LIMIT || bg > HYPER_LIMIT
}
