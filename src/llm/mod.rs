pub mod chat;

use crate::models::chat::{ ChatMessage, ImageAttachment, Role };
use serde::{ Deserialize, Serialize };
use thiserror::Error;

/// Provider-side speaker of a turn. Bot messages are sent as `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl From<Role> for TurnRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => TurnRole::User,
            Role::Bot => TurnRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl From<&ChatMessage> for Turn {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.into(),
            text: msg.content.clone(),
            image: msg.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub turns: Vec<Turn>,
    pub temperature: f32,
}

impl GenerationRequest {
    /// History in order, then the current prompt as the final user turn.
    pub fn build(
        system_instruction: &str,
        history: &[ChatMessage],
        prompt: &str,
        image: Option<&ImageAttachment>,
        temperature: f32
    ) -> Self {
        let mut turns: Vec<Turn> = history.iter().map(Turn::from).collect();
        turns.push(Turn {
            role: TurnRole::User,
            text: prompt.to_string(),
            image: image.cloned(),
        });
        Self {
            system_instruction: system_instruction.to_string(),
            turns,
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("credential is empty")]
    EmptyCredential,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_maps_bot_to_model_and_appends_prompt() {
        let history = vec![
            ChatMessage::user("1", "What is a vector?", Some(ImageAttachment::new(vec![1, 2], "image/jpeg"))),
            ChatMessage::bot("2", "A quantity with magnitude and direction.")
        ];
        let request = GenerationRequest::build("sys", &history, "Give an example", None, 0.0);

        assert_eq!(request.turns.len(), 3);
        assert_eq!(request.turns[0].role, TurnRole::User);
        assert!(request.turns[0].image.is_some());
        assert_eq!(request.turns[1].role, TurnRole::Model);
        assert_eq!(request.turns[2].role, TurnRole::User);
        assert_eq!(request.turns[2].text, "Give an example");
        assert!(request.turns[2].image.is_none());
    }

    #[test]
    fn build_attaches_current_image_to_last_turn() {
        let image = ImageAttachment::new(vec![9], "image/png");
        let request = GenerationRequest::build("sys", &[], "Analyze", Some(&image), 0.0);
        assert_eq!(request.turns.len(), 1);
        assert_eq!(request.turns[0].image.as_ref(), Some(&image));
    }
}
