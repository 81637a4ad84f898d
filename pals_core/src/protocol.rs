//! Built-in decision graphs for cardiac arrest, bradycardia and tachycardia.
//!
//! Each graph maps a step id to its [`Step`]. Graphs are static: they are
//! built once and shared for the life of the process.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Entry step of every graph
pub const START: &str = "START";

/// Return of spontaneous circulation (cardiac arrest graph)
pub const ROSC: &str = "ROSC";

/// Cached protocol library - built once and reused
static DEFAULT_LIBRARY: Lazy<ProtocolLibrary> = Lazy::new(build_default_library);

/// Get a reference to the cached protocol library
pub fn get_default_library() -> &'static ProtocolLibrary {
    &DEFAULT_LIBRARY
}

/// One algorithm's steps
#[derive(Clone, Debug)]
pub struct Graph {
    pub algorithm: AlgorithmType,
    pub steps: HashMap<String, Step>,
    /// Step ids in authoring order, for listings
    pub order: Vec<String>,
}

impl Graph {
    fn new(algorithm: AlgorithmType, steps: Vec<Step>) -> Self {
        let order = steps.iter().map(|s| s.id.clone()).collect();
        let steps = steps.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            algorithm,
            steps,
            order,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Step> {
        self.steps.get(id)
    }

    /// The entry step
    ///
    /// Every graph built by this module has a START step; `validate` checks
    /// the same for hand-built libraries.
    pub fn start(&self) -> Option<&Step> {
        self.steps.get(START)
    }

    /// Steps in authoring order
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }
}

/// The three graphs keyed by algorithm
#[derive(Clone, Debug)]
pub struct ProtocolLibrary {
    pub graphs: HashMap<AlgorithmType, Graph>,
}

impl ProtocolLibrary {
    pub fn graph(&self, algorithm: AlgorithmType) -> Option<&Graph> {
        self.graphs.get(&algorithm)
    }

    /// Validate every graph for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for algorithm in AlgorithmType::ALL {
            let Some(graph) = self.graphs.get(&algorithm) else {
                errors.push(format!("No graph for {}", algorithm));
                continue;
            };

            if graph.algorithm != algorithm {
                errors.push(format!(
                    "Graph keyed as {} declares algorithm {}",
                    algorithm, graph.algorithm
                ));
            }

            if !graph.steps.contains_key(START) {
                errors.push(format!("{} has no {} step", algorithm, START));
            }

            for (id, step) in &graph.steps {
                if id != &step.id {
                    errors.push(format!(
                        "{}: step key '{}' doesn't match step.id '{}'",
                        algorithm, id, step.id
                    ));
                }
                if step.title.is_empty() {
                    errors.push(format!("{}: step '{}' has empty title", algorithm, id));
                }
                if id == Target::ARREST_REDIRECT {
                    errors.push(format!(
                        "{}: '{}' is reserved and cannot be a step",
                        algorithm, id
                    ));
                }

                for next in &step.next_steps {
                    if let Target::Step(target) = &next.target {
                        if !graph.steps.contains_key(target) {
                            errors.push(format!(
                                "{}: step '{}' points to missing step '{}'",
                                algorithm, id, target
                            ));
                        }
                    }
                }
            }
        }

        errors
    }
}

/// Builds the default library
///
/// **Note**: prefer `get_default_library()`; this is kept for tests that need
/// an owned copy to tamper with.
pub fn build_default_library() -> ProtocolLibrary {
    let mut graphs = HashMap::new();
    graphs.insert(
        AlgorithmType::CardiacArrest,
        Graph::new(AlgorithmType::CardiacArrest, cardiac_arrest_steps()),
    );
    graphs.insert(
        AlgorithmType::Bradycardia,
        Graph::new(AlgorithmType::Bradycardia, bradycardia_steps()),
    );
    graphs.insert(
        AlgorithmType::Tachycardia,
        Graph::new(AlgorithmType::Tachycardia, tachycardia_steps()),
    );
    ProtocolLibrary { graphs }
}

fn step(id: &str, title: &str, description: &str, actions: &[&str], next: Vec<Transition>) -> Step {
    Step {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
        next_steps: next,
    }
}

fn go(label: &str, target: &str, variant: Variant) -> Transition {
    Transition {
        label: label.into(),
        target: Target::parse(target),
        variant,
    }
}

// ============================================================================
// Cardiac arrest
// ============================================================================

fn cardiac_arrest_steps() -> Vec<Step> {
    vec![
        step(
            START,
            "Cardiac arrest",
            "Confirm scene safety, start high-quality CPR, attach the monitor.",
            &[
                "Check the scene is safe; check responsiveness and breathing",
                "Activate the emergency response; get the AED/defibrillator",
                "Start CPR (compressions:breaths 30:2 single rescuer, 15:2 with two)",
                "Attach monitor/defibrillator and assess the rhythm",
            ],
            vec![
                go("Rhythm shockable (VF/pVT)", "SHOCKABLE_1", Variant::Danger),
                go("Rhythm not shockable (PEA/asystole)", "NON_SHOCKABLE_1", Variant::Warning),
            ],
        ),
        step(
            "SHOCKABLE_1",
            "Shockable rhythm (VF/pVT)",
            "First shock: defibrillate as early as possible.",
            &[
                "Deliver shock 1 (2 J/kg)",
                "Resume CPR immediately for 2 minutes (no pulse or rhythm check)",
                "Establish IV/IO access",
            ],
            vec![go("Check rhythm after 2 minutes", "SHOCKABLE_CHECK_2", Variant::Primary)],
        ),
        step(
            "SHOCKABLE_CHECK_2",
            "Rhythm check (2nd analysis)",
            "Is the rhythm still shockable?",
            &["Analyse the monitor rhythm and decide whether to shock again"],
            vec![
                go("Still shockable", "SHOCKABLE_2", Variant::Danger),
                go("Not shockable", "NON_SHOCKABLE_1", Variant::Warning),
                go("ROSC", ROSC, Variant::Success),
            ],
        ),
        step(
            "SHOCKABLE_2",
            "Second shock",
            "Escalate the energy and give the first drug.",
            &[
                "Deliver shock 2 (4 J/kg)",
                "Resume CPR immediately for 2 minutes",
                "Epinephrine 0.01 mg/kg every 3-5 minutes",
                "Consider an advanced airway (ETT or supraglottic)",
            ],
            vec![go("Check rhythm after 2 minutes", "SHOCKABLE_CHECK_3", Variant::Primary)],
        ),
        step(
            "SHOCKABLE_CHECK_3",
            "Rhythm check (3rd analysis)",
            "Persistent shockable rhythm.",
            &["Analyse the rhythm and prepare an antiarrhythmic"],
            vec![
                go("Still shockable", "SHOCKABLE_3", Variant::Danger),
                go("Not shockable", "NON_SHOCKABLE_1", Variant::Warning),
                go("ROSC", ROSC, Variant::Success),
            ],
        ),
        step(
            "SHOCKABLE_3",
            "Refractory VF",
            "Add antiarrhythmic therapy.",
            &[
                "Shock (≥4 J/kg, maximum 10 J/kg)",
                "Resume CPR for 2 minutes",
                "Amiodarone 5 mg/kg or lidocaine 1 mg/kg",
                "Treat reversible causes (H's & T's)",
            ],
            vec![go("Rhythm check", "SHOCKABLE_CHECK_2", Variant::Primary)],
        ),
        step(
            "NON_SHOCKABLE_1",
            "Non-shockable rhythm (PEA/asystole)",
            "Early epinephrine is the key intervention.",
            &[
                "Give epinephrine 0.01 mg/kg as early as possible",
                "High-quality CPR for 2 minutes",
                "Establish IV/IO access",
                "Search for H's & T's (hypoxia, volume, electrolytes, ...)",
            ],
            vec![go("Check rhythm after 2 minutes", "NON_SHOCKABLE_CHECK", Variant::Primary)],
        ),
        step(
            "NON_SHOCKABLE_CHECK",
            "Rhythm check",
            "Choose the next path.",
            &["Analyse the monitor rhythm and check for a pulse"],
            vec![
                go("Now shockable", "SHOCKABLE_1", Variant::Danger),
                go("Still not shockable", "NON_SHOCKABLE_1", Variant::Warning),
                go("ROSC", ROSC, Variant::Success),
            ],
        ),
        step(
            ROSC,
            "ROSC (return of spontaneous circulation)",
            "Enter the post-cardiac-arrest care pathway.",
            &[
                "Breathing: SpO2 94-99 %, PaCO2 35-45 mmHg",
                "Circulation: SBP above the 5th percentile [70 + (2 × age)]",
                "Temperature: TTM (32-34 °C or 36-37.5 °C); prevent fever",
                "Rate: 20-30 breaths/min once an advanced airway is in place (one every 2-3 s)",
                "Neurology: EEG monitoring within 24 h",
                "Metabolic: glucose 80-150 mg/dL",
            ],
            vec![
                go("Detailed ROSC management", "ROSC_DETAIL", Variant::Success),
                go("Restart resuscitation", START, Variant::Primary),
            ],
        ),
        step(
            "ROSC_DETAIL",
            "ROSC management details",
            "Optimise every system to limit secondary injury.",
            &[
                "[Breathing] Avoid hyperventilation; PaCO2 35-45 mmHg",
                "[Circulation] SBP floor: 0-1 month >60, 1 month-1 year >70, 1-10 years 70 + 2 × age, >10 years >90",
                "[Temperature] Continue targeted temperature management for at least 72 h",
                "[Neurology] Prevent and detect non-convulsive seizures; start EEG early",
                "[Glucose] Monitor closely; avoid severe hyper- and hypoglycaemia",
                "[Diagnostics] 12-lead ECG, chest X-ray, electrolytes, blood gas",
            ],
            vec![go("Back to the main flow", START, Variant::Primary)],
        ),
    ]
}

// ============================================================================
// Bradycardia
// ============================================================================

fn bradycardia_steps() -> Vec<Step> {
    vec![
        step(
            START,
            "Bradycardia assessment (pulse present)",
            "Look for poor perfusion (altered mental status, shock, cyanosis).",
            &[
                "Maintain the airway, assist breathing, give oxygen",
                "Attach ECG monitor, blood pressure and pulse oximetry",
                "Establish IV/IO access",
                "Record a 12-lead ECG if feasible",
            ],
            vec![
                go("Caused by hypoxia / hypoventilation", "ABC_SUPPORT", Variant::Info),
                go(
                    "HR < 60 with poor perfusion despite oxygenation and ventilation",
                    "CPR_START",
                    Variant::Danger,
                ),
            ],
        ),
        step(
            "ABC_SUPPORT",
            "Airway and breathing support",
            "Fix the respiratory drive first.",
            &[
                "Optimise airway opening; ensure effective bag-mask ventilation",
                "Check tracheal tube position and seal",
                "Watch the heart rate; prepare drugs",
            ],
            vec![
                go("Heart rate improves (>60)", "OBSERVATION", Variant::Success),
                go("Heart rate stays low (<60)", "CPR_START", Variant::Danger),
            ],
        ),
        step(
            "CPR_START",
            "Start CPR (HR < 60)",
            "Symptomatic bradycardia is a pre-arrest state.",
            &[
                "Start high-quality CPR",
                "Epinephrine 0.01 mg/kg every 3-5 minutes",
                "Atropine 0.02 mg/kg for increased vagal tone",
                "Search for H's & T's",
            ],
            vec![
                go("Pulse lost", Target::ARREST_REDIRECT, Variant::Warning),
                go("Heart rate recovers", "OBSERVATION", Variant::Success),
            ],
        ),
        step(
            "OBSERVATION",
            "Stabilise and monitor",
            "Keep reassessing perfusion.",
            &[
                "Maintain haemodynamic stability",
                "Consult a pediatric cardiology centre",
                "Complete laboratory work-up (blood gas, electrolytes)",
            ],
            vec![go("Back to initial assessment", START, Variant::Primary)],
        ),
    ]
}

// ============================================================================
// Tachycardia
// ============================================================================

fn tachycardia_steps() -> Vec<Step> {
    vec![
        step(
            START,
            "Tachycardia assessment (pulse present)",
            "Recognise an abnormally fast rate (infant >220, child >180).",
            &[
                "Maintain the airway, give oxygen, attach the monitor",
                "Establish IV/IO access",
                "Obtain a 12-lead ECG",
            ],
            vec![
                go("Unstable (shock / altered mental status)", "UNSTABLE", Variant::Danger),
                go("Stable (adequate perfusion)", "STABLE_ASSESS", Variant::Info),
            ],
        ),
        step(
            "UNSTABLE",
            "Unstable tachycardia",
            "Urgent synchronized cardioversion.",
            &[
                "Prepare synchronized cardioversion (confirm SYNC mode)",
                "First energy: 0.5-1 J/kg",
                "If ineffective, increase to 2 J/kg",
                "Wide QRS and likely VT: consider amiodarone after expert consultation",
            ],
            vec![
                go("Converted", "POST_CARDIOVERSION", Variant::Success),
                go("Ineffective or degenerates to VF", Target::ARREST_REDIRECT, Variant::Warning),
            ],
        ),
        step(
            "STABLE_ASSESS",
            "Stable tachycardia analysis",
            "QRS width decides the treatment.",
            &[
                "Narrow QRS (≤0.09 s): SVT or sinus tachycardia",
                "Wide QRS (>0.09 s): VT",
            ],
            vec![
                go("Narrow QRS (probable SVT)", "NARROW_QRS", Variant::Primary),
                go("Wide QRS (probable VT)", "WIDE_QRS", Variant::Warning),
            ],
        ),
        step(
            "NARROW_QRS",
            "Narrow QRS (SVT)",
            "Try vagal or pharmacological conversion.",
            &[
                "Vagal manoeuvres (ice to the face for 15 s in infants, blowing through a straw in children)",
                "Adenosine: first dose 0.1 mg/kg, second dose 0.2 mg/kg",
                "Adenosine technique: rapid push followed by a 5-10 ml saline flush",
            ],
            vec![
                go("Converted", "POST_CARDIOVERSION", Variant::Success),
                go("Becomes unstable", "UNSTABLE", Variant::Danger),
            ],
        ),
        step(
            "WIDE_QRS",
            "Wide QRS (VT)",
            "Stable ventricular tachycardia.",
            &[
                "Consult pediatric cardiology",
                "Consider amiodarone 5 mg/kg slowly",
                "Or procainamide 15 mg/kg",
            ],
            vec![go("Deteriorates / becomes unstable", "UNSTABLE", Variant::Danger)],
        ),
        step(
            "POST_CARDIOVERSION",
            "Post-conversion care",
            "Maintain rhythm and prevent recurrence.",
            &[
                "Complete a full assessment; look for triggers (electrolytes, ...)",
                "Continue ECG monitoring; transfer to PICU",
            ],
            vec![go("Back to initial assessment", START, Variant::Primary)],
        ),
    ]
}
