//! Application state and the commands that change it.
//!
//! Every user control maps to one [`Command`]. Views are derived from the
//! state on demand; nothing derived is stored.

use crate::checklist::{Checklist, ChecklistMode};
use crate::dosage::{self, CalculatorView, QuickStats};
use crate::engine::{DecisionState, StepPrompts};
use crate::physio::PhysioTargets;
use crate::protocol::{get_default_library, ProtocolLibrary};
use crate::theory::Accordion;
use crate::{AlgorithmType, DrugDose, EquipmentSize, Error, NavTab, PatientData, Result, Step};
use serde::Serialize;

/// A single user action
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetWeight(f64),
    SetAge(f64),
    SetMultiRescuer(bool),
    SelectTab(NavTab),
    SwitchAlgorithm(AlgorithmType),
    /// Follow the n-th (zero-based) transition of the current step
    Choose(usize),
    ToggleShowAll,
    /// Expand or collapse a drug card by its index in the full table
    ToggleDrugCard(usize),
    ToggleChecklistItem(String),
    ResetChecklist,
    SetChecklistMode(ChecklistMode),
    ToggleTheorySection(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct AppState {
    pub tab: NavTab,
    pub patient: PatientData,
    pub decision: DecisionState,
    pub calculator: CalculatorView,
    pub checklist: Checklist,
    pub theory: Accordion,
    #[serde(skip)]
    library: &'static ProtocolLibrary,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PatientData::default())
    }
}

impl AppState {
    pub fn new(patient: PatientData) -> Self {
        Self {
            tab: NavTab::default(),
            patient,
            decision: DecisionState::default(),
            calculator: CalculatorView::default(),
            checklist: Checklist::new(),
            theory: Accordion::default(),
            library: get_default_library(),
        }
    }

    pub fn library(&self) -> &'static ProtocolLibrary {
        self.library
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        tracing::debug!("Applying {:?}", command);

        match command {
            Command::SetWeight(weight) => self.patient.weight = weight,
            Command::SetAge(age) => self.patient.age = age,
            Command::SetMultiRescuer(multi) => self.patient.is_multi_rescuer = multi,
            Command::SelectTab(tab) => self.tab = tab,
            Command::SwitchAlgorithm(algorithm) => self.decision.switch_algorithm(algorithm),
            Command::Choose(index) => {
                let transition = self.decision.choose(self.library, index)?;
                tracing::info!(
                    "Chose '{}' -> {}",
                    transition.label,
                    transition.target.as_str()
                );
            }
            Command::ToggleShowAll => self.calculator.toggle_show_all(),
            Command::ToggleDrugCard(index) => {
                let count = self.drugs().len();
                if index >= count {
                    return Err(Error::Navigation(format!(
                        "no drug card {} (table has {})",
                        index + 1,
                        count
                    )));
                }
                self.calculator.toggle_card(index);
            }
            Command::ToggleChecklistItem(id) => {
                self.checklist.toggle(&id);
            }
            Command::ResetChecklist => self.checklist.reset(),
            Command::SetChecklistMode(mode) => self.checklist.set_mode(mode),
            Command::ToggleTheorySection(id) => self.theory.toggle(&id),
        }

        Ok(())
    }

    pub fn current_step(&self) -> Result<&'static Step> {
        self.decision.current_step(self.library)
    }

    pub fn prompts(&self) -> Result<StepPrompts> {
        self.decision.prompts(self.library)
    }

    pub fn quick_stats(&self) -> QuickStats {
        QuickStats::compute(&self.patient)
    }

    pub fn targets(&self) -> PhysioTargets {
        PhysioTargets::compute(&self.patient)
    }

    pub fn equipment(&self) -> Vec<EquipmentSize> {
        dosage::equipment_table(&self.patient)
    }

    /// Full drug table for the current weight
    pub fn drugs(&self) -> Vec<DrugDose> {
        dosage::drug_table(self.patient.weight)
    }

    /// Drug table after the step relevance filter
    pub fn visible_drugs(&self) -> Vec<DrugDose> {
        dosage::filter_drugs(
            &self.drugs(),
            &self.decision.step_id,
            self.calculator.show_all,
        )
    }

    pub fn drugs_filtered(&self) -> bool {
        dosage::is_filtered(&self.decision.step_id, self.calculator.show_all)
    }
}

/// Numeric field semantics: anything unparsable reads as zero
pub fn coerce_number(input: &str) -> f64 {
    input.trim().parse::<f64>().unwrap_or(0.0)
}
