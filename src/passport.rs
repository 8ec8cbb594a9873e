use serde_json::{Map, Value};

use crate::config::{HttpConfig, PassportConfig};
use crate::crypto;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::models::{TokenRecord, UserProfile};

/// Client for the Aitu Passport OAuth API.
///
/// Credentials are validated once at construction and never change
/// afterwards. All remote calls go through [`HttpClient`] and surface errors
/// from the crate taxonomy.
#[derive(Debug)]
pub struct PassportClient {
    http: HttpClient,
    config: PassportConfig,
    base_url: String,
}

impl PassportClient {
    pub fn new(config: PassportConfig, http: &HttpConfig) -> Result<Self> {
        if config.client_id.is_empty() {
            return Err(Error::Authentication("client ID cannot be empty".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(Error::Authentication(
                "client secret cannot be empty".to_string(),
            ));
        }
        if config.redirect_uri.is_empty() {
            return Err(Error::Authentication(
                "redirect URI cannot be empty".to_string(),
            ));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http: HttpClient::new(http)?,
            config,
            base_url,
        })
    }

    /// Build the URL the user is sent to for OAuth authorization.
    ///
    /// Scopes are space-joined; an empty slice omits the `scope` parameter.
    /// `state` is the caller's CSRF token, echoed back on the callback.
    pub fn authorization_url(&self, scopes: &[String], state: Option<&str>) -> String {
        let mut params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];

        if !scopes.is_empty() {
            params.push(("scope".to_string(), scopes.join(" ")));
        }
        if let Some(state) = state {
            params.push(("state".to_string(), state.to_string()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/oauth/authorize?{}", self.base_url, query)
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord> {
        if code.is_empty() {
            return Err(Error::Validation(
                "authorization code cannot be empty".to_string(),
            ));
        }

        let body = self
            .http
            .post_form(
                &format!("{}/oauth/token", self.base_url),
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                    ("code", code),
                    ("redirect_uri", &self.config.redirect_uri),
                ],
            )
            .await?;

        if let Some(description) = Error::oauth_error(&body) {
            return Err(Error::Authentication(description));
        }

        TokenRecord::from_response(&body)
    }

    /// Trade a refresh token for a new token record. The old record is not
    /// touched; callers replace it with the returned one.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRecord> {
        if refresh_token.is_empty() {
            return Err(Error::Validation(
                "refresh token cannot be empty".to_string(),
            ));
        }

        let body = self
            .http
            .post_form(
                &format!("{}/oauth/token", self.base_url),
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        if let Some(description) = Error::oauth_error(&body) {
            return Err(Error::Authentication(description));
        }

        TokenRecord::from_response(&body)
    }

    /// Fetch the profile of the user the access token belongs to.
    pub async fn user_info(&self, access_token: &str) -> Result<UserProfile> {
        if access_token.is_empty() {
            return Err(Error::Validation("access token cannot be empty".to_string()));
        }

        let body = self
            .http
            .get_json(
                &format!("{}/api/user/me", self.base_url),
                Some(access_token),
                &[],
            )
            .await?;

        if let Some(description) = Error::oauth_error(&body) {
            return Err(Error::api(200, description));
        }

        UserProfile::from_response(&body)
    }

    /// Revoke an access or refresh token. An empty token is a no-op.
    pub async fn revoke_token(&self, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Ok(false);
        }

        self.http
            .post_form(
                &format!("{}/oauth/revoke", self.base_url),
                &[
                    ("token", token),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                ],
            )
            .await?;

        Ok(true)
    }

    /// Verify a payload map signed with this client's secret.
    pub fn verify_signature(&self, data: &Map<String, Value>, signature: &str) -> bool {
        crypto::verify(data, signature, &self.config.client_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Form;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn test_config(base_url: &str) -> PassportConfig {
        PassportConfig {
            client_id: "client_123".to_string(),
            client_secret: "secret_456".to_string(),
            redirect_uri: "https://app.example.kz/auth/callback".to_string(),
            base_url: base_url.to_string(),
            default_scopes: vec!["profile".to_string(), "email".to_string()],
        }
    }

    fn client(base_url: &str) -> PassportClient {
        PassportClient::new(test_config(base_url), &HttpConfig::default()).unwrap()
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_constructor_rejects_empty_credentials() {
        let mut config = test_config("https://passport.aitu.io");
        config.client_secret = String::new();

        let err = PassportClient::new(config, &HttpConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_authorization_url_contents() {
        let client = client("https://passport.aitu.io/");
        let url = client.authorization_url(
            &["profile".to_string(), "email".to_string()],
            Some("csrf-state"),
        );

        assert!(url.starts_with("https://passport.aitu.io/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client_123"));
        assert!(url.contains("scope=profile%20email"));
        assert!(url.contains("state=csrf-state"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fapp.example.kz%2Fauth%2Fcallback"
        ));
    }

    #[test]
    fn test_authorization_url_omits_empty_scope_and_state() {
        let client = client("https://passport.aitu.io");
        let url = client.authorization_url(&[], None);
        assert!(!url.contains("scope="));
        assert!(!url.contains("state="));
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_empty_code_before_any_call() {
        // Unreachable base URL: a validation error proves no request was made.
        let client = client("http://127.0.0.1:1");
        let err = client.exchange_code("").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_token_record() {
        let base = spawn(Router::new().route(
            "/oauth/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["grant_type"], "authorization_code");
                assert_eq!(form["code"], "auth_code_1");
                Json(json!({
                    "access_token": "at",
                    "refresh_token": "rt",
                    "token_type": "Bearer",
                    "expires_in": 3600,
                    "scope": "profile"
                }))
            }),
        ))
        .await;

        let token = client(&base).exchange_code("auth_code_1").await.unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(token.scopes, vec!["profile"]);
    }

    #[tokio::test]
    async fn test_oauth_error_body_maps_to_authentication() {
        let base = spawn(Router::new().route(
            "/oauth/token",
            post(|| async {
                Json(json!({"error": "invalid_grant", "error_description": "Code expired"}))
            }),
        ))
        .await;

        let err = client(&base).exchange_code("stale").await.unwrap_err();
        match err {
            Error::Authentication(msg) => assert_eq!(msg, "Code expired"),
            other => panic!("expected Authentication, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_returns_new_record() {
        let base = spawn(Router::new().route(
            "/oauth/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["grant_type"], "refresh_token");
                Json(json!({"access_token": "at2", "expires_in": 60}))
            }),
        ))
        .await;

        let token = client(&base).refresh_token("rt").await.unwrap();
        assert_eq!(token.access_token, "at2");
    }

    #[tokio::test]
    async fn test_user_info_401_maps_to_authentication() {
        let base = spawn(Router::new().route(
            "/api/user/me",
            get(|| async { (StatusCode::UNAUTHORIZED, "expired") }),
        ))
        .await;

        let err = client(&base).user_info("stale_token").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_user_info_parses_profile() {
        let base = spawn(Router::new().route(
            "/api/user/me",
            get(|| async {
                Json(json!({"id": "u-1", "name": "Aigerim", "is_verified": true}))
            }),
        ))
        .await;

        let profile = client(&base).user_info("at").await.unwrap();
        assert_eq!(profile.id, "u-1");
        assert!(profile.is_verified);
    }

    #[tokio::test]
    async fn test_revoke_empty_token_is_false_without_call() {
        let client = client("http://127.0.0.1:1");
        assert!(!client.revoke_token("").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_token_success() {
        let base = spawn(Router::new().route("/oauth/revoke", post(|| async { "" }))).await;
        assert!(client(&base).revoke_token("at").await.unwrap());
    }

    #[test]
    fn test_verify_signature_uses_client_secret() {
        let client = client("https://passport.aitu.io");
        let data = match json!({"event": "test"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let signature = crypto::generate(&data, "secret_456").unwrap();

        assert!(client.verify_signature(&data, &signature));
        assert!(!client.verify_signature(&data, "bogus"));
    }
}
