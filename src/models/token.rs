use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// An issued OAuth token.
///
/// Created on code exchange or refresh and never mutated in place: a refresh
/// produces a new record. `expires_at` is the absolute expiry computed from
/// the issuance time and the provider's `expires_in` TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

impl TokenRecord {
    /// Build a record from a token-endpoint response body.
    pub fn from_response(body: &Value) -> Result<Self> {
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::api(200, "token response missing access_token"))?
            .to_string();

        let expires_at = body
            .get("expires_in")
            .and_then(Value::as_i64)
            .map(|ttl| Utc::now() + Duration::seconds(ttl));

        let scopes = body
            .get("scope")
            .and_then(Value::as_str)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            access_token,
            refresh_token: body
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_string),
            token_type: body
                .get("token_type")
                .and_then(Value::as_str)
                .unwrap_or("Bearer")
                .to_string(),
            expires_at,
            scopes,
        })
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response_full() {
        let body = json!({
            "access_token": "at",
            "refresh_token": "rt",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "profile email"
        });

        let token = TokenRecord::from_response(&body).unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(token.scopes, vec!["profile", "email"]);
        assert!(!token.is_expired());
        assert!(token.expires_at.unwrap() > Utc::now());
    }

    #[test]
    fn test_from_response_minimal() {
        let token = TokenRecord::from_response(&json!({"access_token": "at"})).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert!(token.refresh_token.is_none());
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_missing_access_token_is_an_error() {
        let err = TokenRecord::from_response(&json!({"token_type": "Bearer"})).unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
    }

    #[test]
    fn test_expired_token() {
        let token = TokenRecord {
            access_token: "at".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
            scopes: vec![],
        };
        assert!(token.is_expired());
    }
}
