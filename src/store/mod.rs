use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::models::{TokenRecord, UserProfile};
use crate::webhook::WebhookRecord;

const MIGRATION_001: &str = include_str!("migrations/001_initial.sql");

/// Database connection wrapper
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

/// Webhook delivery counts per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookStats {
    pub processed: i64,
    pub rejected: i64,
    pub failed: i64,
}

impl Store {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(MIGRATION_001)
            .context("Failed to run migration 001")?;
        Ok(())
    }

    // ==================== User Operations ====================

    /// Insert a user profile, or refresh the stored copy if it exists.
    pub fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            r#"
            INSERT INTO aitu_users (id, name, surname, email, phone, avatar,
                                    language, timezone, is_verified, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                surname = excluded.surname,
                email = excluded.email,
                phone = excluded.phone,
                avatar = excluded.avatar,
                language = excluded.language,
                timezone = excluded.timezone,
                is_verified = excluded.is_verified,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.id,
                profile.name,
                profile.surname,
                profile.email,
                profile.phone,
                profile.avatar,
                profile.language,
                profile.timezone,
                profile.is_verified,
                now,
            ],
        )?;
        Ok(())
    }

    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, surname, email, phone, avatar, language, timezone, is_verified
             FROM aitu_users WHERE id = ?1",
        )?;

        stmt.query_row(params![id], |row| {
            Ok(UserProfile {
                id: row.get(0)?,
                name: row.get(1)?,
                surname: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                avatar: row.get(5)?,
                language: row.get(6)?,
                timezone: row.get(7)?,
                is_verified: row.get(8)?,
            })
        })
        .optional()
        .context("Failed to get user")
    }

    // ==================== Token Operations ====================

    /// Store a token for a user. Any previously active tokens for that user
    /// are deactivated so at most one token is active at a time.
    pub fn save_token(&self, user_id: &str, token: &TokenRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "UPDATE aitu_tokens SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            params![user_id],
        )?;
        conn.execute(
            r#"
            INSERT INTO aitu_tokens (user_id, access_token, refresh_token, token_type,
                                     scopes, expires_at, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
            "#,
            params![
                user_id,
                token.access_token,
                token.refresh_token,
                token.token_type,
                token.scopes.join(" "),
                token.expires_at.map(|t| t.timestamp()),
                now,
            ],
        )?;
        Ok(())
    }

    /// Get the active token for a user, if any.
    pub fn get_active_token(&self, user_id: &str) -> Result<Option<TokenRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT access_token, refresh_token, token_type, scopes, expires_at
             FROM aitu_tokens WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC LIMIT 1",
        )?;

        stmt.query_row(params![user_id], |row| {
            let scopes: String = row.get(3)?;
            let expires_at: Option<i64> = row.get(4)?;
            Ok(TokenRecord {
                access_token: row.get(0)?,
                refresh_token: row.get(1)?,
                token_type: row.get(2)?,
                scopes: scopes.split_whitespace().map(str::to_string).collect(),
                expires_at: expires_at.and_then(|t| DateTime::from_timestamp(t, 0)),
            })
        })
        .optional()
        .context("Failed to get active token")
    }

    /// Deactivate every token a user holds, e.g. on logout or a
    /// `token.revoked` webhook. Returns how many rows changed.
    pub fn mark_tokens_revoked(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "UPDATE aitu_tokens SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            params![user_id],
        )?;
        Ok(count)
    }

    // ==================== Webhook Operations ====================

    /// Append one webhook delivery to the audit log.
    pub fn record_webhook(&self, record: &WebhookRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            r#"
            INSERT INTO aitu_webhook_logs (source, event_type, payload, outcome,
                                           signature, signature_valid, error, received_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.source.as_str(),
                record.event_type,
                record.payload,
                record.outcome.as_str(),
                record.signature,
                record.signature_valid,
                record.error,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Delivery counts per outcome across the whole log.
    pub fn webhook_stats(&self) -> Result<WebhookStats> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT outcome, COUNT(*) FROM aitu_webhook_logs GROUP BY outcome")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = WebhookStats::default();
        for row in rows {
            let (outcome, count) = row?;
            match outcome.as_str() {
                "processed" => stats.processed = count,
                "rejected" => stats.rejected = count,
                "failed" => stats.failed = count,
                _ => {}
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::{WebhookOutcome, WebhookSource};

    fn test_profile() -> UserProfile {
        UserProfile {
            id: uuid::Uuid::new_v4().to_string(),
            name: Some("Aigerim".to_string()),
            surname: Some("Bekova".to_string()),
            email: Some("aigerim@example.kz".to_string()),
            phone: None,
            avatar: None,
            language: Some("kk".to_string()),
            timezone: None,
            is_verified: true,
        }
    }

    fn test_token(access: &str) -> TokenRecord {
        TokenRecord {
            access_token: access.to_string(),
            refresh_token: Some("rt".to_string()),
            token_type: "Bearer".to_string(),
            scopes: vec!["profile".to_string(), "email".to_string()],
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        }
    }

    #[test]
    fn test_upsert_and_get_user() {
        let store = Store::open_in_memory().unwrap();
        let mut profile = test_profile();

        store.upsert_user(&profile).unwrap();
        profile.email = Some("new@example.kz".to_string());
        store.upsert_user(&profile).unwrap();

        let retrieved = store.get_user(&profile.id).unwrap().unwrap();
        assert_eq!(retrieved.email.as_deref(), Some("new@example.kz"));
        assert!(retrieved.is_verified);
    }

    #[test]
    fn test_save_token_deactivates_previous() {
        let store = Store::open_in_memory().unwrap();
        let profile = test_profile();
        store.upsert_user(&profile).unwrap();

        store.save_token(&profile.id, &test_token("first")).unwrap();
        store.save_token(&profile.id, &test_token("second")).unwrap();

        let active = store.get_active_token(&profile.id).unwrap().unwrap();
        assert_eq!(active.access_token, "second");
        assert_eq!(active.scopes, vec!["profile", "email"]);
    }

    #[test]
    fn test_mark_tokens_revoked() {
        let store = Store::open_in_memory().unwrap();
        let profile = test_profile();
        store.upsert_user(&profile).unwrap();
        store.save_token(&profile.id, &test_token("at")).unwrap();

        assert_eq!(store.mark_tokens_revoked(&profile.id).unwrap(), 1);
        assert!(store.get_active_token(&profile.id).unwrap().is_none());
        // Idempotent: nothing left to revoke.
        assert_eq!(store.mark_tokens_revoked(&profile.id).unwrap(), 0);
    }

    #[test]
    fn test_open_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aitu.db");
        let profile = test_profile();

        {
            let store = Store::open(&path).unwrap();
            store.upsert_user(&profile).unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert!(store.get_user(&profile.id).unwrap().is_some());
    }

    #[test]
    fn test_webhook_log_and_stats() {
        let store = Store::open_in_memory().unwrap();

        for (outcome, valid) in [
            (WebhookOutcome::Processed, true),
            (WebhookOutcome::Processed, true),
            (WebhookOutcome::Rejected, false),
            (WebhookOutcome::Failed, true),
        ] {
            let id = store
                .record_webhook(&WebhookRecord {
                    source: WebhookSource::Passport,
                    event_type: Some("user.authorized".to_string()),
                    payload: r#"{"event_type":"user.authorized"}"#.to_string(),
                    signature: Some("sig".to_string()),
                    signature_valid: valid,
                    outcome,
                    error: None,
                })
                .unwrap();
            assert!(id > 0);
        }

        let stats = store.webhook_stats().unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.failed, 1);
    }
}
