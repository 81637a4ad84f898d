//! Traversal engine shared by all three decision graphs.
//!
//! The engine state is just `(algorithm, current step id)`. Moving happens
//! only through one of the current step's transitions or by switching the
//! algorithm, and both paths are pure assignments:
//!
//! - `Target::Step(id)` sets the step id
//! - `Target::ArrestRedirect` switches to cardiac arrest and its START
//! - switching algorithm always lands on START
//!
//! A step id that is unknown in the active graph resolves to START.

use crate::protocol::{ProtocolLibrary, ROSC, START};
use crate::{AlgorithmType, Error, Result, Step, Target, Transition};
use serde::{Deserialize, Serialize};

/// Where the user currently is in the decision flow
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionState {
    pub algorithm: AlgorithmType,
    pub step_id: String,
}

impl Default for DecisionState {
    fn default() -> Self {
        Self::new(AlgorithmType::CardiacArrest)
    }
}

impl DecisionState {
    pub fn new(algorithm: AlgorithmType) -> Self {
        Self {
            algorithm,
            step_id: START.to_string(),
        }
    }

    /// Resolve the current step, falling back to START for stale ids
    pub fn current_step<'a>(&self, library: &'a ProtocolLibrary) -> Result<&'a Step> {
        let graph = library.graph(self.algorithm).ok_or_else(|| {
            Error::Protocol(format!("No graph registered for {}", self.algorithm))
        })?;

        if let Some(step) = graph.get(&self.step_id) {
            return Ok(step);
        }

        tracing::debug!(
            "Step '{}' not in {} graph, falling back to {}",
            self.step_id,
            self.algorithm,
            START
        );
        graph
            .start()
            .ok_or_else(|| Error::Protocol(format!("{} graph has no {} step", self.algorithm, START)))
    }

    /// Apply a transition target
    pub fn follow(&mut self, target: &Target) {
        match target {
            Target::ArrestRedirect => {
                tracing::info!(
                    "Pulse lost during {}; switching to {}",
                    self.algorithm,
                    AlgorithmType::CardiacArrest
                );
                self.algorithm = AlgorithmType::CardiacArrest;
                self.step_id = START.to_string();
            }
            Target::Step(id) => {
                tracing::debug!("{}: {} -> {}", self.algorithm, self.step_id, id);
                self.step_id = id.clone();
            }
        }
    }

    /// Follow the `index`-th (zero-based) transition of the current step
    pub fn choose(&mut self, library: &ProtocolLibrary, index: usize) -> Result<Transition> {
        let step = self.current_step(library)?;
        let transition = step.next_steps.get(index).cloned().ok_or_else(|| {
            Error::Navigation(format!(
                "step '{}' has {} option(s), no option {}",
                step.id,
                step.next_steps.len(),
                index + 1
            ))
        })?;

        self.follow(&transition.target);
        Ok(transition)
    }

    /// Select a different algorithm; always restarts at START
    pub fn switch_algorithm(&mut self, algorithm: AlgorithmType) {
        tracing::info!("Algorithm selected: {}", algorithm);
        self.algorithm = algorithm;
        self.step_id = START.to_string();
    }

    /// Which contextual panels accompany the current position
    ///
    /// Keyed by the resolved step, so a stale id reads as START.
    pub fn prompts(&self, library: &ProtocolLibrary) -> Result<StepPrompts> {
        let id = self.current_step(library)?.id.as_str();
        let in_cycle = id != START && !id.contains(ROSC);
        let arrest = self.algorithm == AlgorithmType::CardiacArrest;

        Ok(StepPrompts {
            cycle_banners: in_cycle
                && matches!(
                    self.algorithm,
                    AlgorithmType::CardiacArrest | AlgorithmType::Bradycardia
                ),
            reversible_causes: id == "NON_SHOCKABLE_1" || id == "SHOCKABLE_3",
            cpr_quality: arrest && in_cycle,
            rosc_targets: id == ROSC,
        })
    }
}

/// Contextual panels shown next to the active step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPrompts {
    /// "Analyse rhythm every 2 minutes" / "epinephrine every 3-5 minutes"
    pub cycle_banners: bool,
    /// H's & T's panel
    pub reversible_causes: bool,
    /// High-quality CPR baseline (rate, depth, pauses, ventilation)
    pub cpr_quality: bool,
    /// SpO2 / SBP / TTM / EEG target cards
    pub rosc_targets: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::get_default_library;

    fn walk(state: &mut DecisionState, choices: &[usize]) {
        let library = get_default_library();
        for &c in choices {
            state.choose(library, c).unwrap();
        }
    }

    #[test]
    fn test_initial_state() {
        let state = DecisionState::default();
        assert_eq!(state.algorithm, AlgorithmType::CardiacArrest);
        assert_eq!(state.step_id, START);
    }

    #[test]
    fn test_shockable_from_start() {
        let mut state = DecisionState::default();
        let taken = state.choose(get_default_library(), 0).unwrap();
        assert_eq!(taken.target, Target::Step("SHOCKABLE_1".into()));
        assert_eq!(state.step_id, "SHOCKABLE_1");
    }

    #[test]
    fn test_shockable_loop_reaches_rosc() {
        let mut state = DecisionState::default();
        // shockable -> check 2 -> still shockable -> check 3 -> ROSC
        walk(&mut state, &[0, 0, 0, 0, 2]);
        assert_eq!(state.step_id, ROSC);
        assert!(state.prompts(get_default_library()).unwrap().rosc_targets);
    }

    #[test]
    fn test_bradycardia_redirect() {
        let mut state = DecisionState::new(AlgorithmType::Bradycardia);
        // START -> CPR_START -> pulse lost
        walk(&mut state, &[1, 0]);
        assert_eq!(state.algorithm, AlgorithmType::CardiacArrest);
        assert_eq!(state.step_id, START);
    }

    #[test]
    fn test_tachycardia_redirect() {
        let mut state = DecisionState::new(AlgorithmType::Tachycardia);
        // START -> UNSTABLE -> degenerates to VF
        walk(&mut state, &[0, 1]);
        assert_eq!(state.algorithm, AlgorithmType::CardiacArrest);
        assert_eq!(state.step_id, START);
    }

    #[test]
    fn test_switch_always_resets() {
        let mut state = DecisionState::default();
        walk(&mut state, &[1, 0]);
        assert_eq!(state.step_id, "NON_SHOCKABLE_CHECK");

        state.switch_algorithm(AlgorithmType::Tachycardia);
        assert_eq!(state.step_id, START);

        // Re-selecting the same algorithm also resets
        walk(&mut state, &[1]);
        state.switch_algorithm(AlgorithmType::Tachycardia);
        assert_eq!(state.step_id, START);
    }

    #[test]
    fn test_stale_id_falls_back_to_start() {
        let library = get_default_library();
        let state = DecisionState {
            algorithm: AlgorithmType::Bradycardia,
            step_id: "SHOCKABLE_3".into(),
        };
        let step = state.current_step(library).unwrap();
        assert_eq!(step.id, START);
        assert!(step.title.starts_with("Bradycardia"));
    }

    #[test]
    fn test_choose_from_stale_id_uses_start_options() {
        let mut state = DecisionState {
            algorithm: AlgorithmType::Tachycardia,
            step_id: "ROSC_DETAIL".into(),
        };
        state.choose(get_default_library(), 1).unwrap();
        assert_eq!(state.step_id, "STABLE_ASSESS");
    }

    #[test]
    fn test_out_of_range_choice_is_rejected() {
        let mut state = DecisionState::default();
        let err = state.choose(get_default_library(), 5).unwrap_err();
        assert!(matches!(err, Error::Navigation(_)));
        assert_eq!(state.step_id, START);
    }

    #[test]
    fn test_prompts() {
        let state = DecisionState::default();
        assert_eq!(state.prompts(get_default_library()).unwrap(), StepPrompts::default());

        let mut state = DecisionState::default();
        walk(&mut state, &[1]);
        let prompts = state.prompts(get_default_library()).unwrap();
        assert!(prompts.cycle_banners);
        assert!(prompts.reversible_causes);
        assert!(prompts.cpr_quality);

        let mut state = DecisionState::new(AlgorithmType::Bradycardia);
        walk(&mut state, &[1]);
        let prompts = state.prompts(get_default_library()).unwrap();
        assert!(prompts.cycle_banners);
        assert!(!prompts.cpr_quality);

        let mut state = DecisionState::new(AlgorithmType::Tachycardia);
        walk(&mut state, &[0]);
        assert!(!state.prompts(get_default_library()).unwrap().cycle_banners);

        let mut state = DecisionState::default();
        walk(&mut state, &[0, 0, 2, 0]);
        assert_eq!(state.step_id, "ROSC_DETAIL");
        assert!(!state.prompts(get_default_library()).unwrap().cycle_banners);
        assert!(!state.prompts(get_default_library()).unwrap().rosc_targets);
    }

    #[test]
    fn test_prompts_for_stale_id_match_start() {
        let library = get_default_library();
        let state = DecisionState {
            algorithm: AlgorithmType::CardiacArrest,
            step_id: "BOGUS".into(),
        };
        assert_eq!(state.prompts(library).unwrap(), StepPrompts::default());

        // An arrest-only id under bradycardia resolves to its START
        let state = DecisionState {
            algorithm: AlgorithmType::Bradycardia,
            step_id: "SHOCKABLE_3".into(),
        };
        let prompts = state.prompts(library).unwrap();
        assert!(!prompts.cycle_banners);
        assert!(!prompts.reversible_causes);
    }
}
