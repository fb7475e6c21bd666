//! UI/backend events and error modeling for desktop GUI controller.

use shared::domain::{CarId, GameResult, Question};

use crate::ui::images::PreviewImage;

pub enum UiEvent {
    Info(String),
    QuestionsLoaded(Vec<Question>),
    ResultReady(GameResult),
    CarImageLoaded { car_id: CarId, image: PreviewImage },
    CarImageFailed { car_id: CarId, reason: String },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Rejected,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadQuestions,
    SubmitGuesses,
}

pub fn classify_load_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure") {
        "Backend worker startup failure; check the gateway settings and relaunch.".to_string()
    } else if lower.contains("failed to reach gateway")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Failed to connect to the Internet Computer. Check the network and retry.".to_string()
    } else {
        format!("Failed to load game: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("rejected")
            || message_lower.contains("trapped")
        {
            UiErrorCategory::Rejected
        } else if message_lower.contains("invalid")
            || message_lower.contains("malformed")
            || message_lower.contains("must not be empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("gateway")
            || message_lower.contains("network")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the blocking error dialog.
    pub fn headline(&self) -> String {
        match self.context {
            UiErrorContext::BackendStartup | UiErrorContext::LoadQuestions => {
                classify_load_failure(&self.message)
            }
            UiErrorContext::SubmitGuesses => "Error submitting results.".to_string(),
        }
    }
}
