mod events;

pub use events::{WebhookEnvelope, WebhookEventType, WebhookSource};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::WebhookConfig;
use crate::crypto;

/// Terminal state of one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Signature check failed. The provider gets a 401 and will retry.
    Rejected,
    /// Handled (or deliberately ignored). The provider gets a 200.
    Processed,
    /// Authenticated but unprocessable, e.g. a malformed body. 500.
    Failed,
}

impl WebhookOutcome {
    pub fn http_status(&self) -> u16 {
        match self {
            WebhookOutcome::Rejected => 401,
            WebhookOutcome::Processed => 200,
            WebhookOutcome::Failed => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Rejected => "rejected",
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::Failed => "failed",
        }
    }
}

/// Everything worth persisting about one delivery attempt.
#[derive(Debug, Clone)]
pub struct WebhookRecord {
    pub source: WebhookSource,
    pub event_type: Option<String>,
    pub payload: String,
    pub signature: Option<String>,
    pub signature_valid: bool,
    pub outcome: WebhookOutcome,
    pub error: Option<String>,
}

/// Verifies and dispatches incoming webhooks from both providers.
///
/// Verification always happens before the body is parsed; an attacker
/// never reaches the JSON parser. Signature checking can be switched off
/// for local development via [`WebhookConfig::verify_signature`].
pub struct WebhookReceiver {
    config: WebhookConfig,
}

impl WebhookReceiver {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    /// Header name the raw signature is read from.
    pub fn signature_header(&self) -> &str {
        &self.config.signature_header
    }

    /// Check the delivery signature against the raw request body.
    pub fn verify(&self, raw_body: &str, signature: Option<&str>) -> bool {
        if !self.config.verify_signature {
            return true;
        }
        match signature {
            Some(signature) => {
                crypto::verify_webhook_signature(raw_body, signature, &self.config.secret)
            }
            None => false,
        }
    }

    /// Full pipeline for one delivery: verify, parse, dispatch.
    pub fn process(
        &self,
        source: WebhookSource,
        raw_body: &str,
        signature: Option<&str>,
    ) -> WebhookRecord {
        let mut record = WebhookRecord {
            source,
            event_type: None,
            payload: raw_body.to_string(),
            signature: signature.map(str::to_string),
            signature_valid: false,
            outcome: WebhookOutcome::Rejected,
            error: None,
        };

        if !self.verify(raw_body, signature) {
            warn!(source = %source, "webhook rejected: invalid signature");
            record.error = Some("invalid signature".to_string());
            return record;
        }
        record.signature_valid = true;

        let envelope: WebhookEnvelope = match serde_json::from_str(raw_body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(source = %source, error = %e, "webhook failed: malformed body");
                record.outcome = WebhookOutcome::Failed;
                record.error = Some(format!("malformed body: {}", e));
                return record;
            }
        };

        let event_type = WebhookEventType::parse(envelope.event_type.as_deref().unwrap_or(""));
        record.event_type = Some(event_type.as_str().to_string());
        self.dispatch(source, &event_type, &envelope.payload);
        record.outcome = WebhookOutcome::Processed;
        record
    }

    fn dispatch(
        &self,
        source: WebhookSource,
        event_type: &WebhookEventType,
        payload: &Map<String, Value>,
    ) {
        let user_id = payload.get("user_id").and_then(Value::as_str).unwrap_or("");
        let notification_id = payload
            .get("notification_id")
            .and_then(Value::as_str)
            .unwrap_or("");

        match event_type {
            WebhookEventType::UserAuthorized => {
                info!(source = %source, user_id, "user authorized the application");
            }
            WebhookEventType::UserDeauthorized => {
                info!(source = %source, user_id, "user revoked application access");
            }
            WebhookEventType::TokenRevoked => {
                info!(source = %source, user_id, "token revoked upstream");
            }
            WebhookEventType::NotificationDelivered => {
                info!(source = %source, notification_id, "notification delivered");
            }
            WebhookEventType::NotificationClicked => {
                info!(source = %source, notification_id, "notification clicked");
            }
            WebhookEventType::NotificationFailed => {
                let reason = payload.get("reason").and_then(Value::as_str).unwrap_or("");
                warn!(source = %source, notification_id, reason, "notification delivery failed");
            }
            WebhookEventType::Unknown(other) => {
                // Forward-compatible: acknowledge so the provider stops retrying.
                info!(source = %source, event_type = %other, "ignoring unknown webhook event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "webhook_secret";

    fn receiver() -> WebhookReceiver {
        WebhookReceiver::new(WebhookConfig {
            secret: SECRET.to_string(),
            signature_header: "X-Aitu-Signature".to_string(),
            verify_signature: true,
        })
    }

    fn signed(body: &str) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_delivery_is_processed() {
        let body = json!({"event_type": "user.authorized", "user_id": "u-1"}).to_string();
        let signature = signed(&body);

        let record = receiver().process(WebhookSource::Passport, &body, Some(&signature));
        assert_eq!(record.outcome, WebhookOutcome::Processed);
        assert!(record.signature_valid);
        assert_eq!(record.event_type.as_deref(), Some("user.authorized"));
        assert_eq!(record.outcome.http_status(), 200);
    }

    #[test]
    fn test_bad_signature_is_rejected() {
        let body = json!({"event_type": "user.authorized"}).to_string();

        let record = receiver().process(WebhookSource::Passport, &body, Some("deadbeef"));
        assert_eq!(record.outcome, WebhookOutcome::Rejected);
        assert!(!record.signature_valid);
        assert_eq!(record.outcome.http_status(), 401);
        // Rejected before parsing, so no event type was extracted.
        assert!(record.event_type.is_none());
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let body = json!({"event_type": "user.authorized"}).to_string();
        let record = receiver().process(WebhookSource::Apps, &body, None);
        assert_eq!(record.outcome, WebhookOutcome::Rejected);
    }

    #[test]
    fn test_prefixed_signature_accepted() {
        let body = json!({"event_type": "token.revoked"}).to_string();
        let signature = format!("sha256={}", signed(&body));

        let record = receiver().process(WebhookSource::Passport, &body, Some(&signature));
        assert_eq!(record.outcome, WebhookOutcome::Processed);
    }

    #[test]
    fn test_malformed_body_after_valid_signature_fails() {
        let body = "{not json";
        let signature = signed(body);

        let record = receiver().process(WebhookSource::Apps, body, Some(&signature));
        assert_eq!(record.outcome, WebhookOutcome::Failed);
        assert!(record.signature_valid);
        assert_eq!(record.outcome.http_status(), 500);
        assert!(record.error.as_deref().unwrap().starts_with("malformed body"));
    }

    #[test]
    fn test_unknown_event_is_acknowledged() {
        let body = json!({"event_type": "user.promoted"}).to_string();
        let signature = signed(&body);

        let record = receiver().process(WebhookSource::Passport, &body, Some(&signature));
        assert_eq!(record.outcome, WebhookOutcome::Processed);
        assert_eq!(record.event_type.as_deref(), Some("user.promoted"));
    }

    #[test]
    fn test_verification_can_be_disabled() {
        let receiver = WebhookReceiver::new(WebhookConfig {
            secret: SECRET.to_string(),
            signature_header: "X-Aitu-Signature".to_string(),
            verify_signature: false,
        });

        let body = json!({"event_type": "user.authorized"}).to_string();
        let record = receiver.process(WebhookSource::Passport, &body, None);
        assert_eq!(record.outcome, WebhookOutcome::Processed);
    }
}
