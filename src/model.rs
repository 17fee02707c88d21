use serde::{Deserialize, Serialize};

/// One pre-written question/answer pair from the travel dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub location: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(other)]
    Assistant,
}

/// A single turn of caller-supplied conversation history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContextMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The payload returned by `/process`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    pub suggestions: Vec<String>,
    pub confidence: f32,
}

impl Reply {
    pub fn new(message: impl Into<String>, suggestions: Vec<String>, confidence: f32) -> Self {
        Self {
            message: message.into(),
            suggestions,
            confidence,
        }
    }
}

/// An answer produced by the LLM fallback. This is also what the response
/// cache stores.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FallbackAnswer {
    pub message: String,
    pub suggestions: Vec<String>,
}
