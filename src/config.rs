use std::time::Duration;

use crate::error::{Error, Result};
use crate::{DEFAULT_APPS_BASE_URL, DEFAULT_PASSPORT_BASE_URL, DEFAULT_SIGNATURE_HEADER};

/// Aitu Passport (identity provider) settings.
#[derive(Debug, Clone)]
pub struct PassportConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub base_url: String,
    pub default_scopes: Vec<String>,
}

/// Aitu Apps (push notification) settings.
#[derive(Debug, Clone)]
pub struct AppsConfig {
    pub app_id: String,
    pub secret_key: String,
    pub base_url: String,
}

/// Inbound webhook verification settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub secret: String,
    pub signature_header: String,
    pub verify_signature: bool,
}

/// HTTP client settings shared by both API clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Process-wide configuration, read once at startup and passed into each
/// client. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub passport: PassportConfig,
    pub apps: AppsConfig,
    pub webhook: WebhookConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Build configuration from `AITU_*` environment variables.
    ///
    /// Credentials may be absent here (individual clients reject empty
    /// credentials at construction), but base URLs must parse.
    pub fn from_env() -> Result<Self> {
        let passport = PassportConfig {
            client_id: env_or("AITU_PASSPORT_CLIENT_ID", ""),
            client_secret: env_or("AITU_PASSPORT_CLIENT_SECRET", ""),
            redirect_uri: env_or("AITU_PASSPORT_REDIRECT_URI", ""),
            base_url: env_or("AITU_PASSPORT_BASE_URL", DEFAULT_PASSPORT_BASE_URL),
            default_scopes: env_or("AITU_PASSPORT_DEFAULT_SCOPES", "profile email")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        };

        let apps = AppsConfig {
            app_id: env_or("AITU_APPS_APP_ID", ""),
            secret_key: env_or("AITU_APPS_SECRET_KEY", ""),
            base_url: env_or("AITU_APPS_BASE_URL", DEFAULT_APPS_BASE_URL),
        };

        let webhook = WebhookConfig {
            secret: env_or("AITU_WEBHOOK_SECRET", ""),
            signature_header: env_or("AITU_WEBHOOK_SIGNATURE_HEADER", DEFAULT_SIGNATURE_HEADER),
            verify_signature: env_or("AITU_WEBHOOK_VERIFY_SIGNATURE", "true") != "false",
        };

        let http = HttpConfig {
            timeout: Duration::from_secs(env_u64("AITU_HTTP_TIMEOUT", 30)?),
            connect_timeout: Duration::from_secs(env_u64("AITU_HTTP_CONNECT_TIMEOUT", 10)?),
        };

        validate_base_url(&passport.base_url)?;
        validate_base_url(&apps.base_url)?;

        Ok(Self {
            passport,
            apps,
            webhook,
            http,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Validation(format!("{} must be a number, got {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    url::Url::parse(raw)
        .map_err(|e| Error::Validation(format!("invalid base URL {:?}: {}", raw, e)))?;
    Ok(())
}
