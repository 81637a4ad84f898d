//! Clinical assistant conversation.
//!
//! The conversation is provider-agnostic: text generation goes through
//! [`AssistantBackend`]. Failures never propagate to the caller; they turn
//! into a fixed assistant reply so the chat always gets an answer.

use crate::{PatientData, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const GREETING: &str = "Hello, I am the clinical assistant. Ask me about complex pediatric \
emergency cases, guideline details, or managing comorbidities.";

/// Reply used when the backend returns nothing
pub const EMPTY_REPLY: &str = "Sorry, I could not generate a reply.";

/// Reply used when the backend fails
pub const UNREACHABLE_REPLY: &str =
    "Could not reach the clinical assistant. Check your network or try again later.";

pub const AI_DISCLAIMER: &str =
    "AI-generated content is for reference only; clinical decisions rest with the treating physician.";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// A text generation provider
pub trait AssistantBackend {
    /// Produce the next assistant reply for `history` (oldest first, ending
    /// with the user's message)
    fn generate(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String>;
}

/// System instruction, parameterised by the current patient
pub fn system_prompt(patient: &PatientData) -> String {
    format!(
        "You are a senior pediatric critical care specialist with expert knowledge of the 2025 \
         AHA/AAP Pediatric Advanced Life Support (PALS) guidelines.\n\
         Current patient: age {} years, weight {} kg.\n\
         Your role is to give clinicians evidence-based decision support, differential diagnosis \
         suggestions and clear explanations of complex pathophysiology.\n\
         Keep answers concise, professional and clinically oriented. In an emergency, remind the \
         user to follow the core PALS algorithms first.",
        patient.age, patient.weight
    )
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: vec![ChatMessage::new(ChatRole::Assistant, GREETING)],
        }
    }

    /// Send a user message and append the assistant's reply
    ///
    /// Blank input is ignored and returns `None`. Otherwise the backend is
    /// called exactly once and the appended reply is returned.
    pub fn send<B>(&mut self, backend: &B, patient: &PatientData, text: &str) -> Option<&ChatMessage>
    where
        B: AssistantBackend + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::new(ChatRole::User, text));

        let reply = match backend.generate(&system_prompt(patient), &self.messages) {
            Ok(reply) if reply.trim().is_empty() => {
                tracing::warn!("Assistant returned an empty reply");
                EMPTY_REPLY.to_string()
            }
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Assistant request failed: {}", e);
                UNREACHABLE_REPLY.to_string()
            }
        };

        tracing::debug!(
            "Conversation {}: {} message(s)",
            self.id,
            self.messages.len() + 1
        );
        self.messages.push(ChatMessage::new(ChatRole::Assistant, reply));
        self.messages.last()
    }

    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::{Cell, RefCell};

    /// Returns a canned reply and records what it was given
    struct ScriptedBackend {
        reply: std::result::Result<String, String>,
        calls: Cell<usize>,
        last_prompt: RefCell<String>,
        last_history_len: Cell<usize>,
    }

    impl ScriptedBackend {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.into()),
                calls: Cell::new(0),
                last_prompt: RefCell::new(String::new()),
                last_history_len: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused".into()),
                ..Self::replying("")
            }
        }
    }

    impl AssistantBackend for ScriptedBackend {
        fn generate(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last_prompt.borrow_mut() = system_prompt.to_string();
            self.last_history_len.set(history.len());
            self.reply.clone().map_err(Error::Assistant)
        }
    }

    #[test]
    fn test_starts_with_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, ChatRole::Assistant);
        assert_eq!(conversation.messages[0].content, GREETING);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let backend = ScriptedBackend::replying("unused");
        let mut conversation = Conversation::new();
        assert!(conversation
            .send(&backend, &PatientData::default(), "   \n")
            .is_none());
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn test_reply_is_appended() {
        let backend = ScriptedBackend::replying("Give 0.01 mg/kg epinephrine.");
        let mut conversation = Conversation::new();
        let reply = conversation
            .send(&backend, &PatientData::default(), " Epi dose? ")
            .unwrap();
        assert_eq!(reply.content, "Give 0.01 mg/kg epinephrine.");

        assert_eq!(conversation.messages.len(), 3);
        assert_eq!(conversation.messages[1].role, ChatRole::User);
        assert_eq!(conversation.messages[1].content, "Epi dose?");
        assert_eq!(backend.calls.get(), 1);
        // Greeting plus the new question
        assert_eq!(backend.last_history_len.get(), 2);
    }

    #[test]
    fn test_empty_reply_fallback() {
        let backend = ScriptedBackend::replying("  ");
        let mut conversation = Conversation::new();
        let reply = conversation
            .send(&backend, &PatientData::default(), "hello")
            .unwrap();
        assert_eq!(reply.content, EMPTY_REPLY);
    }

    #[test]
    fn test_backend_error_becomes_apology() {
        crate::logging::init_test();
        let backend = ScriptedBackend::failing();
        let mut conversation = Conversation::new();
        let reply = conversation
            .send(&backend, &PatientData::default(), "hello")
            .unwrap();
        assert_eq!(reply.content, UNREACHABLE_REPLY);
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(backend.calls.get(), 1);
        assert_eq!(conversation.last_reply().unwrap().content, UNREACHABLE_REPLY);
    }

    #[test]
    fn test_system_prompt_mentions_patient() {
        let backend = ScriptedBackend::replying("ok");
        let mut conversation = Conversation::new();
        conversation.send(&backend, &PatientData::new(12.5, 3.0, false), "hi");
        let prompt = backend.last_prompt.borrow();
        assert!(prompt.contains("age 3 years"));
        assert!(prompt.contains("weight 12.5 kg"));
    }
}
