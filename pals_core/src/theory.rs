//! Key-points reference library.
//!
//! Sections are static, ordered, and built once. The [`Accordion`] holds the
//! only view state: which section (if any) is expanded.

use once_cell::sync::Lazy;
use serde::Serialize;

/// A piece of section content
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    Heading(&'static str),
    Paragraph(&'static str),
    Bullets(Vec<&'static str>),
    /// Label/value rows
    KeyValue(Vec<(&'static str, &'static str)>),
    Table {
        header: Vec<&'static str>,
        rows: Vec<Vec<&'static str>>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct TheorySection {
    pub id: &'static str,
    pub tag: &'static str,
    pub title: &'static str,
    pub blocks: Vec<ContentBlock>,
}

/// One of the H's & T's with its first-line action
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ReversibleCause {
    pub name: &'static str,
    pub action: &'static str,
}

pub const DISCLAIMER: &str = "Compiled from the 2025 AHA/AAP guideline revision. All doses and \
physiological values are theoretical reference values intended for teaching and decision review. \
At the bedside follow standard protocols and the judgement of the treating physician.";

pub const REVERSIBLE_CAUSES: [ReversibleCause; 9] = [
    ReversibleCause {
        name: "H: Hypovolemia",
        action: "Give 20 ml/kg crystalloid, look for bleeding.",
    },
    ReversibleCause {
        name: "H: Hypoxia",
        action: "Check the tube, give oxygen, ensure effective ventilation.",
    },
    ReversibleCause {
        name: "H: Hydrogen ion (acidosis)",
        action: "Optimise ventilation, buffer if needed.",
    },
    ReversibleCause {
        name: "H: Hypo/Hyperkalemia",
        action: "Correct electrolytes.",
    },
    ReversibleCause {
        name: "H: Hypothermia",
        action: "Core rewarming.",
    },
    ReversibleCause {
        name: "T: Tension pneumothorax",
        action: "Immediate needle decompression.",
    },
    ReversibleCause {
        name: "T: Tamponade",
        action: "Pericardiocentesis.",
    },
    ReversibleCause {
        name: "T: Toxins",
        action: "Identify the toxin, treat supportively.",
    },
    ReversibleCause {
        name: "T: Thrombosis",
        action: "Very rare in children.",
    },
];

static SECTIONS: Lazy<Vec<TheorySection>> = Lazy::new(build_sections);

/// All sections in display order
pub fn sections() -> &'static [TheorySection] {
    &SECTIONS
}

pub fn find_section(id: &str) -> Option<&'static TheorySection> {
    SECTIONS.iter().find(|s| s.id == id)
}

fn build_sections() -> Vec<TheorySection> {
    use ContentBlock::*;

    vec![
        TheorySection {
            id: "chain_of_survival",
            tag: "Core system",
            title: "Chain of Survival",
            blocks: vec![
                Heading("In-hospital chain (IHCA)"),
                Paragraph(
                    "Early recognition and prevention → activate response → high-quality CPR \
                     → advanced life support → post-arrest care → recovery",
                ),
                Heading("Out-of-hospital chain (OHCA)"),
                Paragraph(
                    "Prevention → activate response → high-quality CPR → rapid defibrillation \
                     → ALS and transport → post-arrest care → recovery",
                ),
                Paragraph(
                    "2025 update: the sixth link, recovery, spans multidisciplinary care after \
                     the acute phase.",
                ),
            ],
        },
        TheorySection {
            id: "airway_ventilation",
            tag: "Advanced airway",
            title: "Airway Strategies",
            blocks: vec![
                Heading("2025 ventilation rates"),
                KeyValue(vec![
                    ("Rescue breathing", "20-30/min (one breath every 2-3 s)"),
                    ("Advanced airway", "20-30/min, compressions uninterrupted"),
                ]),
                Heading("Key decisions"),
                Bullets(vec![
                    "Cuffed tubes are preferred: less leak and fewer re-intubations. Monitor \
                     cuff pressure (<20-25 cmH2O).",
                    "EtCO2 confirmation is the gold standard: waveform capnography is required \
                     to confirm tube placement.",
                ]),
            ],
        },
        TheorySection {
            id: "drug_admin",
            tag: "Drug administration",
            title: "Drugs During Arrest",
            blocks: vec![
                Heading("Route priority"),
                Paragraph("IV (first choice) → IO (second) → ET (last resort)"),
                Heading("Weight-based dosing"),
                Paragraph(
                    "Every pediatric dose is weight based. Epinephrine 0.01 mg/kg is the core \
                     arrest drug; the ET dose rises tenfold to 0.1 mg/kg.",
                ),
            ],
        },
        TheorySection {
            id: "cpr_quality",
            tag: "Physiological monitoring",
            title: "CPR Physiology and Quality",
            blocks: vec![
                Heading("Physiological targets"),
                KeyValue(vec![
                    ("EtCO2", "> 15 mmHg"),
                    ("Diastolic arterial pressure, infant", "≥ 25 mmHg"),
                    ("Diastolic arterial pressure, child", "≥ 30 mmHg"),
                ]),
                Paragraph(
                    "Persistently missing these targets points to shallow compressions or a \
                     tired compressor.",
                ),
            ],
        },
        TheorySection {
            id: "ecpr",
            tag: "Extracorporeal",
            title: "Extracorporeal CPR (ECPR)",
            blocks: vec![
                Heading("When to activate ECPR"),
                Paragraph(
                    "For in-hospital arrest with a reversible cause where conventional CPR is \
                     failing, consider ECPR early (within 20-30 minutes of resuscitation).",
                ),
                Bullets(vec![
                    "Especially cardiac disease, single ventricle, or post-operative arrest.",
                    "Requires an experienced extracorporeal life support team.",
                ]),
            ],
        },
        TheorySection {
            id: "post_arrest_care",
            tag: "ROSC phase",
            title: "Post-Cardiac Arrest Care (PCAC)",
            blocks: vec![
                Heading("Targeted temperature management (TTM)"),
                Bullets(vec![
                    "Option A: 32-34 °C for 2 days, then 36-37.5 °C for 3 days.",
                    "Option B: 36-37.5 °C for 5 days.",
                    "Avoid fever (>38 °C) after ROSC.",
                ]),
                Heading("Circulation and oxygenation"),
                Bullets(vec![
                    "Blood pressure: SBP above the 5th percentile.",
                    "Oxygenation: SpO2 94%-99%, normalise PaO2 and avoid hyperoxia.",
                ]),
                Heading("Neuromonitoring (EEG)"),
                Paragraph(
                    "Start EEG monitoring within 24 h. Identify and treat non-convulsive \
                     seizures.",
                ),
            ],
        },
        TheorySection {
            id: "neuro_prognosis",
            tag: "Prognosis",
            title: "Timing of Neuroprognostication",
            blocks: vec![Table {
                header: vec!["Timing", "Assessment"],
                rows: vec![
                    vec!["Within 24 h", "EEG monitoring"],
                    vec!["24-72 h", "SSEP, clinical reflexes"],
                    vec!["2-7 days", "MRI (DWI), the key imaging window"],
                    vec!["After 72 h", "Multimodal decision, never a single test"],
                ],
            }],
        },
        TheorySection {
            id: "single_ventricle",
            tag: "Complex CHD",
            title: "Single Ventricle Resuscitation",
            blocks: vec![
                Heading("Physiology-specific management"),
                KeyValue(vec![
                    (
                        "Stage I (Norwood)",
                        "Balance Qp:Qs. Avoid hyperoxia, which lowers pulmonary resistance \
                         and steals systemic flow.",
                    ),
                    (
                        "Stage II/III (Fontan)",
                        "Flow is driven by venous pressure. Keep airway pressure minimal (low \
                         PEEP, low rate). Conventional CPR performs poorly; prefer ECPR.",
                    ),
                ]),
            ],
        },
        TheorySection {
            id: "recovery_roadmap",
            tag: "Recovery",
            title: "Recovery Roadmap and SUCA",
            blocks: vec![
                Heading("Recovery roadmap"),
                Bullets(vec![
                    "Early PT/OT/SLP involvement, screen for PTSD.",
                    "Formal neuropsychological assessment within 3-6 months.",
                    "Individualised education plan (IEP) for return to school.",
                ]),
                Heading("Sudden unexplained cardiac arrest (SUCA) and family"),
                Paragraph(
                    "For unexplained sudden death, recommend autopsy and molecular screening. \
                     Allow and support family presence during resuscitation with a dedicated \
                     liaison.",
                ),
            ],
        },
    ]
}

/// Which theory section is expanded; at most one at a time
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Accordion {
    pub open: Option<String>,
}

impl Default for Accordion {
    fn default() -> Self {
        Self {
            open: sections().first().map(|s| s.id.to_string()),
        }
    }
}

impl Accordion {
    /// Open `id`, or close it if it is the open one
    pub fn toggle(&mut self, id: &str) {
        if self.open.as_deref() == Some(id) {
            self.open = None;
        } else {
            self.open = Some(id.to_string());
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.as_deref() == Some(id)
    }

    pub fn open_section(&self) -> Option<&'static TheorySection> {
        self.open.as_deref().and_then(find_section)
    }
}
