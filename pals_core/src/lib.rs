#![forbid(unsafe_code)]

//! Core domain model and clinical logic for the PALS reference tool.
//!
//! This crate provides:
//! - Domain types (patient, steps, drugs, equipment)
//! - Weight- and age-based dose and equipment calculations
//! - Physiological targets
//! - Decision graphs and their traversal engine
//! - Resuscitation timer, metronome and background scheduling
//! - Checklists, key-points library and the assistant conversation

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod dosage;
pub mod physio;
pub mod protocol;
pub mod engine;
pub mod timer;
pub mod scheduler;
pub mod metronome;
pub mod live;
pub mod checklist;
pub mod theory;
pub mod assistant;
pub mod app;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use app::{AppState, Command};
pub use dosage::QuickStats;
pub use physio::PhysioTargets;
pub use protocol::get_default_library;
pub use engine::DecisionState;
pub use timer::SessionTimer;
pub use live::LiveTimer;
pub use metronome::Metronome;
pub use assistant::{AssistantBackend, ChatMessage, ChatRole, Conversation};
