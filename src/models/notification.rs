use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum title length accepted by the provider, in characters.
pub const MAX_TITLE_LENGTH: usize = 40;
/// Maximum message length accepted by the provider, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 100;

/// Push notification payload for the Aitu Apps API.
///
/// `sign` is filled in just before transmission; it never participates in
/// its own computation. `user_id` is absent for broadcast sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub app_id: String,
    pub title: String,
    pub message: String,
    /// Locale: 1 Russian, 2 Kazakh, 3 English, 4 Uzbek.
    pub locale: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub broadcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
}

/// Optional notification fields with provider defaults.
#[derive(Debug, Clone)]
pub struct NotificationOptions {
    pub locale: u8,
    pub to_url: Option<String>,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            locale: 1,
            to_url: None,
        }
    }
}

impl Notification {
    /// Check all local preconditions. Returns every violation, not just the
    /// first, so callers can report them together.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.broadcast {
            if self.user_id.is_some() {
                errors.push("broadcast notifications must not carry a user_id".to_string());
            }
        } else {
            match &self.user_id {
                Some(user_id) if !user_id.is_empty() => {
                    if Uuid::parse_str(user_id).is_err() {
                        errors.push("user_id must be a valid UUID".to_string());
                    }
                }
                _ => errors.push("field 'user_id' is required".to_string()),
            }
        }

        if self.app_id.is_empty() {
            errors.push("field 'app_id' is required".to_string());
        } else if Uuid::parse_str(&self.app_id).is_err() {
            errors.push("app_id must be a valid UUID".to_string());
        }

        if self.title.is_empty() {
            errors.push("field 'title' is required".to_string());
        } else if self.title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(format!(
                "title should not exceed {} characters",
                MAX_TITLE_LENGTH
            ));
        }

        if self.message.is_empty() {
            errors.push("field 'message' is required".to_string());
        } else if self.message.chars().count() > MAX_MESSAGE_LENGTH {
            errors.push(format!(
                "message should not exceed {} characters",
                MAX_MESSAGE_LENGTH
            ));
        }

        if !(1..=4).contains(&self.locale) {
            errors.push("locale must be 1 (Russian), 2 (Kazakh), 3 (English), or 4 (Uzbek)".to_string());
        }

        errors
    }
}
