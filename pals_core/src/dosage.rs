//! Weight-scaled drug doses, equipment sizes and the quick-stats card.
//!
//! Every value is recomputed from [`PatientData`] on demand. Formulas are
//! applied as-is: there is no clamping and no rejection of odd input, and the
//! `max` strings are for display only.

use crate::physio::display_number;
use crate::protocol::{ROSC, START};
use crate::{DrugDetails, DrugDose, EquipmentSize, PatientData};
use serde::{Deserialize, Serialize};

// ============================================================================
// Number formatting
// ============================================================================

/// Fixed-point text with `digits` decimals, rounding exact halves away from zero
///
/// `format!("{:.1}", 1.25)` gives "1.2" (ties to even); bedside doses are
/// shown as "1.3". Only an exact tie in the binary value rounds up, so 0.05
/// (stored slightly above or below) still formats as the nearest decimal.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    let scaled = value.abs() * scale;
    // Zero residual means the product is exact, so a .5 fraction is a true tie
    let exact = value.abs().mul_add(scale, -scaled) == 0.0;

    if value.is_finite() && exact && scaled.fract() == 0.5 {
        let rounded = (scaled.floor() + 1.0) / scale;
        let signed = if value < 0.0 { -rounded } else { rounded };
        format!("{:.*}", digits, signed)
    } else {
        format!("{:.*}", digits, value)
    }
}

// ============================================================================
// Raw formulas
// ============================================================================

/// Epinephrine 1:10,000 IV/IO volume (0.01 mg/kg)
pub fn epinephrine_iv_ml(weight: f64) -> f64 {
    weight * 0.1
}

/// Epinephrine 1:1,000 endotracheal volume (0.1 mg/kg)
pub fn epinephrine_et_concentrated_ml(weight: f64) -> f64 {
    weight * 0.1
}

/// Epinephrine endotracheal volume when drawn from the 1:10,000 syringe
pub fn epinephrine_et_dilute_ml(weight: f64) -> f64 {
    weight * 1.0
}

/// Atropine 0.02 mg/kg with a 0.1 mg floor
pub fn atropine_mg(weight: f64) -> f64 {
    (weight * 0.02).max(0.1)
}

pub fn amiodarone_mg(weight: f64) -> f64 {
    weight * 5.0
}

/// Adenosine first and second dose (0.1 then 0.2 mg/kg)
pub fn adenosine_mg(weight: f64) -> (f64, f64) {
    (weight * 0.1, weight * 0.2)
}

/// 20 ml/kg isotonic bolus
pub fn fluid_bolus_ml(weight: f64) -> f64 {
    weight * 20.0
}

/// Defibrillation energies: first, second, and the floor for later shocks
pub fn defibrillation_joules(weight: f64) -> (f64, f64, f64) {
    (weight * 2.0, weight * 4.0, weight * 4.0)
}

/// Synchronized cardioversion: first and escalated energy
pub fn cardioversion_joules(weight: f64) -> (f64, f64) {
    (weight * 0.5, weight * 2.0)
}

/// Cuffed endotracheal tube inner diameter (mm)
pub fn ett_cuffed_mm(age: f64) -> f64 {
    age / 4.0 + 3.5
}

/// Uncuffed endotracheal tube inner diameter (mm)
pub fn ett_uncuffed_mm(age: f64) -> f64 {
    age / 4.0 + 4.0
}

/// Oral insertion depth at the lips (cm), three times the tube ID
pub fn ett_depth_cm(age: f64) -> f64 {
    ett_cuffed_mm(age) * 3.0
}

pub fn suction_catheter_fr(age: f64) -> f64 {
    ett_cuffed_mm(age) * 2.0
}

/// Pediatric pads below 8 years or below 25 kg
pub fn uses_pediatric_pads(patient: &PatientData) -> bool {
    patient.age < 8.0 || patient.weight < 25.0
}

// ============================================================================
// Quick stats
// ============================================================================

/// Pad/energy attenuator size for AED and manual defibrillation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PadSize {
    Pediatric,
    Adult,
}

impl PadSize {
    pub fn for_patient(patient: &PatientData) -> Self {
        if uses_pediatric_pads(patient) {
            PadSize::Pediatric
        } else {
            PadSize::Adult
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PadSize::Pediatric => "pediatric",
            PadSize::Adult => "adult",
        }
    }
}

/// The always-visible summary card
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuickStats {
    pub ratio: String,
    pub aed_pads: PadSize,
    pub ventilation: String,
    pub saline: String,
    pub epi_iv: String,
    pub epi_et: String,
}

impl QuickStats {
    pub fn compute(patient: &PatientData) -> Self {
        let w = patient.weight;
        Self {
            ratio: compression_ratio(patient).into(),
            aed_pads: PadSize::for_patient(patient),
            ventilation: "20-30 breaths/min".into(),
            saline: format!("{} ml", display_number(fluid_bolus_ml(w))),
            epi_iv: format!("{} ml", to_fixed(epinephrine_iv_ml(w), 1)),
            epi_et: format!("{} ml", to_fixed(epinephrine_et_dilute_ml(w), 1)),
        }
    }
}

/// Compressions to breaths
pub fn compression_ratio(patient: &PatientData) -> &'static str {
    if patient.is_multi_rescuer {
        "15:2"
    } else {
        "30:2"
    }
}

// ============================================================================
// Drug table
// ============================================================================

fn details(indication: &str, route: &str, info: &str) -> DrugDetails {
    DrugDetails {
        indication: indication.into(),
        route: route.into(),
        info: info.into(),
    }
}

fn steps(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Build the drug table for a given weight, in display order
pub fn drug_table(weight: f64) -> Vec<DrugDose> {
    let (aden_1, aden_2) = adenosine_mg(weight);
    let (shock_1, shock_2, shock_n) = defibrillation_joules(weight);
    let (sync_1, sync_2) = cardioversion_joules(weight);

    vec![
        DrugDose {
            name: "Epinephrine (IV/IO 1:10,000)".into(),
            dose: format!("{} ml", to_fixed(epinephrine_iv_ml(weight), 1)),
            note: "0.01 mg/kg, every 3-5 min".into(),
            max: Some("1 mg (10 ml)".into()),
            relevant_steps: steps(&[
                "SHOCKABLE_2",
                "SHOCKABLE_3",
                "NON_SHOCKABLE_1",
                "CPR_START",
                "ADVANCED_BRADY",
            ]),
            details: details(
                "Cardiac arrest (VF/pVT, PEA/asystole) and symptomatic bradycardia.",
                "IV or IO push.",
                "Potent alpha/beta agonist. Raises systemic vascular resistance and coronary perfusion pressure.",
            ),
        },
        DrugDose {
            name: "Epinephrine (ET 1:1,000)".into(),
            dose: format!("{} ml", to_fixed(epinephrine_et_concentrated_ml(weight), 1)),
            note: "0.1 mg/kg, only without IV/IO access".into(),
            max: Some("2.5 mg".into()),
            relevant_steps: steps(&["SHOCKABLE_2", "SHOCKABLE_3", "NON_SHOCKABLE_1"]),
            details: details(
                "Cardiac arrest when IV/IO access cannot be obtained in time.",
                "Endotracheal tube.",
                "Absorption is unpredictable; the dose is ten times the IV dose and less effective than intravascular use.",
            ),
        },
        DrugDose {
            name: "Atropine".into(),
            dose: format!("{} mg", to_fixed(atropine_mg(weight), 2)),
            note: "0.02 mg/kg, minimum 0.1 mg".into(),
            max: Some("0.5 mg".into()),
            relevant_steps: steps(&["CPR_START", "ADVANCED_BRADY"]),
            details: details(
                "Bradycardia from increased vagal tone or AV block.",
                "IV/IO.",
                "The 0.1 mg minimum avoids paradoxical bradycardia.",
            ),
        },
        DrugDose {
            name: "Amiodarone (first dose)".into(),
            dose: format!("{} mg", to_fixed(amiodarone_mg(weight), 0)),
            note: "VF/pVT: 5 mg/kg".into(),
            max: Some("300 mg".into()),
            relevant_steps: steps(&["SHOCKABLE_3", "WIDE_QRS"]),
            details: details(
                "Shock-refractory VF / pulseless VT.",
                "IV/IO.",
                "May cause hypotension and bradycardia. Can be repeated during resuscitation.",
            ),
        },
        DrugDose {
            name: "Adenosine (1st → 2nd)".into(),
            dose: format!("{} → {} mg", to_fixed(aden_1, 1), to_fixed(aden_2, 1)),
            note: "rapid push for SVT".into(),
            max: Some("6 mg → 12 mg".into()),
            relevant_steps: steps(&["NARROW_QRS", "WIDE_QRS", "UNSTABLE"]),
            details: details(
                "Pharmacological conversion of supraventricular tachycardia.",
                "Very rapid IV/IO push as close to the heart as possible.",
                "Half-life under 10 seconds. Flush immediately with 5-10 ml saline. May cause brief asystole.",
            ),
        },
        DrugDose {
            name: "Isotonic crystalloid".into(),
            dose: format!("{} ml", to_fixed(fluid_bolus_ml(weight), 0)),
            note: "20 ml/kg, rapid infusion".into(),
            max: None,
            relevant_steps: steps(&["NON_SHOCKABLE_1", ROSC, START]),
            details: details(
                "Hypovolemic shock or poor perfusion from severe dehydration.",
                "Rapid IV/IO infusion.",
                "Repeat according to clinical response. Assess cardiac function to avoid fluid overload.",
            ),
        },
        DrugDose {
            name: "Defibrillation (1st → 2nd → subsequent)".into(),
            dose: format!(
                "{} → {} → ≥{} J",
                to_fixed(shock_1, 0),
                to_fixed(shock_2, 0),
                to_fixed(shock_n, 0)
            ),
            note: "max 10 J/kg or adult dose".into(),
            max: None,
            relevant_steps: steps(&[
                "SHOCKABLE_1",
                "SHOCKABLE_CHECK_2",
                "SHOCKABLE_2",
                "SHOCKABLE_CHECK_3",
                "SHOCKABLE_3",
            ]),
            details: details(
                "Ventricular fibrillation and pulseless ventricular tachycardia.",
                "Defibrillator shock.",
                "Make sure SYNC is off. Resume CPR immediately after the shock without a rhythm check.",
            ),
        },
        DrugDose {
            name: "Synchronized cardioversion (1st → 2nd)".into(),
            dose: format!("{} → {} J", to_fixed(sync_1, 1), to_fixed(sync_2, 0)),
            note: "first dose 0.5-1 J/kg".into(),
            max: None,
            relevant_steps: steps(&["UNSTABLE"]),
            details: details(
                "Unstable SVT and unstable monomorphic VT.",
                "Synchronized defibrillator shock.",
                "SYNC mode must be on. Confirm the R-wave markers before shocking.",
            ),
        },
    ]
}

/// Whether the step-based relevance filter is in effect
pub fn is_filtered(step_id: &str, show_all: bool) -> bool {
    !show_all && step_id != START && step_id != ROSC
}

/// Restrict the drug list to those tagged for `step_id`
///
/// The filter is keyed by step id only. START, ROSC and `show_all` bypass it.
pub fn filter_drugs(drugs: &[DrugDose], step_id: &str, show_all: bool) -> Vec<DrugDose> {
    if !is_filtered(step_id, show_all) {
        return drugs.to_vec();
    }

    drugs
        .iter()
        .filter(|d| d.relevant_steps.iter().any(|s| s == step_id))
        .cloned()
        .collect()
}

// ============================================================================
// Equipment table
// ============================================================================

fn laryngoscope_blade(age: f64) -> &'static str {
    if age < 1.0 {
        "Miller 0-1"
    } else if age < 2.0 {
        "Miller 1"
    } else {
        "Miller 2 / Macintosh 2"
    }
}

/// Build the equipment table for a patient
pub fn equipment_table(patient: &PatientData) -> Vec<EquipmentSize> {
    let age = patient.age;
    vec![
        EquipmentSize {
            name: "ETT, cuffed (ID)".into(),
            size: format!("{} mm", to_fixed(ett_cuffed_mm(age), 1)),
            note: Some("age/4 + 3.5; preferred".into()),
        },
        EquipmentSize {
            name: "ETT, uncuffed (ID)".into(),
            size: format!("{} mm", to_fixed(ett_uncuffed_mm(age), 1)),
            note: Some("age/4 + 4".into()),
        },
        EquipmentSize {
            name: "ETT depth at lips".into(),
            size: format!("{} cm", to_fixed(ett_depth_cm(age), 1)),
            note: Some("3 × tube ID".into()),
        },
        EquipmentSize {
            name: "Suction catheter".into(),
            size: format!("{} Fr", to_fixed(suction_catheter_fr(age), 0)),
            note: Some("2 × tube ID".into()),
        },
        EquipmentSize {
            name: "Defibrillation pads".into(),
            size: PadSize::for_patient(patient).label().into(),
            note: Some("pediatric below 8 years or 25 kg".into()),
        },
        EquipmentSize {
            name: "Laryngoscope blade".into(),
            size: laryngoscope_blade(age).into(),
            note: None,
        },
    ]
}

// ============================================================================
// Calculator view state
// ============================================================================

/// Expand/collapse and filter state of the dose list
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculatorView {
    /// Index into the unfiltered drug table
    pub expanded: Option<usize>,
    pub show_all: bool,
}

impl CalculatorView {
    /// Open a card, or close it if it is already open
    pub fn toggle_card(&mut self, index: usize) {
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
    }
}
