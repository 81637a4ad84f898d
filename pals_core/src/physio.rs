//! Age-banded physiological targets.

use crate::dosage::{fluid_bolus_ml, to_fixed};
use crate::PatientData;
use serde::Serialize;

/// Awake heart-rate reference band
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct HeartRateBand {
    pub min: u32,
    pub max: u32,
    pub label: &'static str,
}

impl HeartRateBand {
    pub fn range(&self) -> String {
        format!("{} - {}", self.min, self.max)
    }
}

/// Age breakpoints: `(upper bound, inclusive?, band)`
const HR_BANDS: [(f64, bool, HeartRateBand); 3] = [
    (
        0.25,
        false,
        HeartRateBand {
            min: 100,
            max: 205,
            label: "0-3 months (infant)",
        },
    ),
    (
        2.0,
        false,
        HeartRateBand {
            min: 100,
            max: 190,
            label: "3 months-2 years (toddler)",
        },
    ),
    (
        10.0,
        true,
        HeartRateBand {
            min: 60,
            max: 140,
            label: "2-10 years (child)",
        },
    ),
];

const HR_ADOLESCENT: HeartRateBand = HeartRateBand {
    min: 60,
    max: 100,
    label: "> 10 years (adolescent)",
};

pub fn heart_rate_band(age: f64) -> HeartRateBand {
    HR_BANDS
        .iter()
        .find(|(bound, inclusive, _)| if *inclusive { age <= *bound } else { age < *bound })
        .map(|(_, _, band)| band.clone())
        .unwrap_or(HR_ADOLESCENT)
}

/// Lowest acceptable systolic pressure (mmHg)
///
/// Neonates (< 0.1 y) 60, infants 70, 1-10 years `70 + 2 × age`, older 90.
pub fn min_systolic_bp(age: f64) -> f64 {
    if age < 0.1 {
        60.0
    } else if age < 1.0 {
        70.0
    } else if age <= 10.0 {
        70.0 + 2.0 * age
    } else {
        90.0
    }
}

/// Whether the linear SBP formula applies at this age
pub fn sbp_uses_formula(age: f64) -> bool {
    (1.0..=10.0).contains(&age)
}

/// Diastolic pressure to aim for during CPR (mmHg)
pub fn min_cpr_diastolic(age: f64) -> u32 {
    if age < 1.0 {
        25
    } else {
        30
    }
}

/// Print with at most one decimal, dropping a trailing `.0`
pub fn display_number(value: f64) -> String {
    let s = to_fixed(value, 1);
    match s.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => s,
    }
}

/// Everything the targets view shows
#[derive(Clone, Debug, Serialize)]
pub struct PhysioTargets {
    pub heart_rate: HeartRateBand,
    pub min_sbp: String,
    pub sbp_formula: &'static str,
    pub min_cpr_dbp: String,
    pub bolus: String,
    pub spo2: &'static str,
    pub cpr_etco2: &'static str,
    pub paco2: &'static str,
    pub ttm: &'static str,
    pub glucose: &'static str,
    pub compression_rate: &'static str,
    pub compression_depth: &'static str,
    pub advanced_airway_ventilation: &'static str,
}

impl PhysioTargets {
    pub fn compute(patient: &PatientData) -> Self {
        let age = patient.age;
        Self {
            heart_rate: heart_rate_band(age),
            min_sbp: format!("≥{} mmHg", display_number(min_systolic_bp(age))),
            sbp_formula: if sbp_uses_formula(age) {
                "70 + (2 × age)"
            } else {
                "fixed threshold"
            },
            min_cpr_dbp: format!("≥{} mmHg", min_cpr_diastolic(age)),
            bolus: format!("{} ml", display_number(fluid_bolus_ml(patient.weight))),
            spo2: "94% - 99%",
            cpr_etco2: ">15 mmHg",
            paco2: "35-45 mmHg",
            ttm: "32-34 °C or 36-37.5 °C",
            glucose: "80-150 mg/dL",
            compression_rate: "100-120/min",
            compression_depth: "≥ 1/3 of the AP chest diameter",
            advanced_airway_ventilation: "20-30/min",
        }
    }
}
