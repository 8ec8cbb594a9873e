use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which provider a webhook came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookSource {
    Passport,
    Apps,
}

impl WebhookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookSource::Passport => "passport",
            WebhookSource::Apps => "apps",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passport" => Some(WebhookSource::Passport),
            "apps" => Some(WebhookSource::Apps),
            _ => None,
        }
    }
}

impl std::fmt::Display for WebhookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event types the providers currently send.
///
/// Unknown types are preserved verbatim so new provider events pass through
/// the receiver without being treated as failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    UserAuthorized,
    UserDeauthorized,
    TokenRevoked,
    NotificationDelivered,
    NotificationClicked,
    NotificationFailed,
    Unknown(String),
}

impl WebhookEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "user.authorized" => WebhookEventType::UserAuthorized,
            "user.deauthorized" => WebhookEventType::UserDeauthorized,
            "token.revoked" => WebhookEventType::TokenRevoked,
            "notification.delivered" => WebhookEventType::NotificationDelivered,
            "notification.clicked" => WebhookEventType::NotificationClicked,
            "notification.failed" => WebhookEventType::NotificationFailed,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::UserAuthorized => "user.authorized",
            WebhookEventType::UserDeauthorized => "user.deauthorized",
            WebhookEventType::TokenRevoked => "token.revoked",
            WebhookEventType::NotificationDelivered => "notification.delivered",
            WebhookEventType::NotificationClicked => "notification.clicked",
            WebhookEventType::NotificationFailed => "notification.failed",
            WebhookEventType::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON envelope every webhook body shares: a source tag, an event-type tag,
/// and the event-specific remainder.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_round_trip() {
        for raw in [
            "user.authorized",
            "user.deauthorized",
            "token.revoked",
            "notification.delivered",
            "notification.clicked",
            "notification.failed",
        ] {
            assert_eq!(WebhookEventType::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn test_unknown_event_type_preserved() {
        let event = WebhookEventType::parse("user.promoted");
        assert_eq!(event, WebhookEventType::Unknown("user.promoted".to_string()));
        assert_eq!(event.as_str(), "user.promoted");
    }

    #[test]
    fn test_envelope_captures_extra_fields() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "source": "passport",
            "event_type": "user.authorized",
            "user_id": "u-1",
            "scopes": ["profile"]
        }))
        .unwrap();

        assert_eq!(envelope.source.as_deref(), Some("passport"));
        assert_eq!(envelope.event_type.as_deref(), Some("user.authorized"));
        assert_eq!(envelope.payload["user_id"], "u-1");
    }

    #[test]
    fn test_envelope_tolerates_missing_discriminators() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({"data": 1})).unwrap();
        assert!(envelope.source.is_none());
        assert!(envelope.event_type.is_none());
    }
}
