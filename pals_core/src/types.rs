//! Core domain types for the PALS reference tool.
//!
//! This module defines the fundamental types used throughout the system:
//! - Patient data entered by the rescuer
//! - Algorithm selection and navigation tabs
//! - Decision steps and their transitions
//! - Drug and equipment display records

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Patient
// ============================================================================

/// Patient parameters that drive every calculation
///
/// Values are taken as entered. Zero or negative weight/age is accepted and
/// flows through the formulas unchanged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PatientData {
    /// Weight in kg
    pub weight: f64,
    /// Age in years (fractions allowed, e.g. 0.5 for six months)
    pub age: f64,
    /// Two or more rescuers (changes the compression:ventilation ratio)
    pub is_multi_rescuer: bool,
}

impl PatientData {
    pub fn new(weight: f64, age: f64, is_multi_rescuer: bool) -> Self {
        Self {
            weight,
            age,
            is_multi_rescuer,
        }
    }
}

impl Default for PatientData {
    fn default() -> Self {
        Self::new(20.0, 5.0, false)
    }
}

// ============================================================================
// Algorithm & navigation
// ============================================================================

/// Which decision graph is active
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgorithmType {
    #[default]
    CardiacArrest,
    Bradycardia,
    Tachycardia,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 3] = [
        AlgorithmType::CardiacArrest,
        AlgorithmType::Bradycardia,
        AlgorithmType::Tachycardia,
    ];

    /// Stable identifier (`CARDIAC_ARREST`, ...)
    pub fn id(&self) -> &'static str {
        match self {
            AlgorithmType::CardiacArrest => "CARDIAC_ARREST",
            AlgorithmType::Bradycardia => "BRADYCARDIA",
            AlgorithmType::Tachycardia => "TACHYCARDIA",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AlgorithmType::CardiacArrest => "Cardiac arrest",
            AlgorithmType::Bradycardia => "Bradycardia with a pulse",
            AlgorithmType::Tachycardia => "Tachycardia with a pulse",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cardiac_arrest" | "arrest" | "ca" => Ok(AlgorithmType::CardiacArrest),
            "bradycardia" | "brady" => Ok(AlgorithmType::Bradycardia),
            "tachycardia" | "tachy" => Ok(AlgorithmType::Tachycardia),
            _ => Err(Error::Parse(format!("unknown algorithm '{}'", s))),
        }
    }
}

/// Top-level sections of the tool
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavTab {
    #[default]
    Decision,
    Targets,
    Calculator,
    Checklist,
    Theory,
    Assistant,
}

impl NavTab {
    pub const ALL: [NavTab; 6] = [
        NavTab::Decision,
        NavTab::Targets,
        NavTab::Calculator,
        NavTab::Checklist,
        NavTab::Theory,
        NavTab::Assistant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NavTab::Decision => "Decision",
            NavTab::Targets => "Targets",
            NavTab::Calculator => "Doses",
            NavTab::Checklist => "Checklist",
            NavTab::Theory => "Key points",
            NavTab::Assistant => "Assistant",
        }
    }
}

impl FromStr for NavTab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "decision" | "flow" => Ok(NavTab::Decision),
            "targets" => Ok(NavTab::Targets),
            "calculator" | "doses" => Ok(NavTab::Calculator),
            "checklist" => Ok(NavTab::Checklist),
            "theory" | "points" => Ok(NavTab::Theory),
            "assistant" | "ai" => Ok(NavTab::Assistant),
            _ => Err(Error::Parse(format!("unknown tab '{}'", s))),
        }
    }
}

// ============================================================================
// Decision steps
// ============================================================================

/// Visual emphasis of a transition button
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Primary,
    Danger,
    Success,
    Warning,
    Info,
}

/// Destination of a transition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A step in the same graph
    Step(String),
    /// Pulse lost: leave the current graph and restart the cardiac arrest flow
    ArrestRedirect,
}

impl Target {
    pub const ARREST_REDIRECT: &'static str = "ARREST_REDIRECT";

    /// Parse the textual form; `ARREST_REDIRECT` is the only reserved id
    pub fn parse(id: &str) -> Self {
        if id == Self::ARREST_REDIRECT {
            Target::ArrestRedirect
        } else {
            Target::Step(id.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Step(id) => id,
            Target::ArrestRedirect => Self::ARREST_REDIRECT,
        }
    }
}

/// A labelled way out of a step
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub label: String,
    pub target: Target,
    #[serde(default)]
    pub variant: Variant,
}

/// A node of a decision graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
    pub next_steps: Vec<Transition>,
}

// ============================================================================
// Drug & equipment records
// ============================================================================

/// Static reference text shown when a drug card is expanded
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrugDetails {
    pub indication: String,
    pub route: String,
    pub info: String,
}

/// A drug (or electrical therapy) with its weight-scaled dose
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrugDose {
    pub name: String,
    pub dose: String,
    pub note: String,
    /// Display-only ceiling; never applied to `dose`
    pub max: Option<String>,
    pub relevant_steps: Vec<String>,
    pub details: DrugDetails,
}

/// Age/weight-derived equipment size
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentSize {
    pub name: String,
    pub size: String,
    pub note: Option<String>,
}
