use serde_json::Value;

use crate::config::{AppsConfig, HttpConfig};
use crate::crypto;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::models::{Notification, NotificationOptions};

/// gRPC-gateway service path prefix on the Aitu Apps API.
const SERVICE: &str = "kz.btsd.messenger.apps.public.MiniAppsPublicService";

/// Client for the Aitu Apps push notification API.
///
/// Payloads are validated locally before any network call, then signed with
/// the app secret via the signature engine and posted as JSON.
#[derive(Debug)]
pub struct AppsClient {
    http: HttpClient,
    app_id: String,
    secret_key: String,
    base_url: String,
}

impl AppsClient {
    pub fn new(config: AppsConfig, http: &HttpConfig) -> Result<Self> {
        if config.app_id.is_empty() {
            return Err(Error::Authentication("app ID cannot be empty".to_string()));
        }
        if config.secret_key.is_empty() {
            return Err(Error::Authentication(
                "secret key cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            http: HttpClient::new(http)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id,
            secret_key: config.secret_key,
        })
    }

    /// Build a targeted notification payload with this client's app id.
    pub fn create_notification(
        &self,
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Notification {
        Notification {
            user_id: Some(user_id.into()),
            app_id: self.app_id.clone(),
            title: title.into(),
            message: message.into(),
            locale: options.locale,
            to_url: options.to_url,
            broadcast: false,
            sign: None,
        }
    }

    /// Build a broadcast payload (delivered to every user of the app).
    pub fn create_broadcast(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Notification {
        Notification {
            user_id: None,
            app_id: self.app_id.clone(),
            title: title.into(),
            message: message.into(),
            locale: options.locale,
            to_url: options.to_url,
            broadcast: true,
            sign: None,
        }
    }

    /// Validate, sign, and send a single notification.
    pub async fn send_push(&self, notification: &Notification) -> Result<Value> {
        let errors = notification.validate();
        if !errors.is_empty() {
            return Err(Error::Validation(errors.join("; ")));
        }

        let mut payload = match serde_json::to_value(notification)
            .map_err(|e| Error::Validation(format!("unserializable notification: {}", e)))?
        {
            Value::Object(map) => map,
            _ => unreachable!("notification serializes to an object"),
        };
        let signature = crypto::generate(&payload, &self.secret_key)?;
        payload.insert(crypto::SIGNATURE_FIELD.to_string(), Value::String(signature));

        self.http
            .post_json(
                &format!("{}/{}/SendPush", self.base_url, SERVICE),
                &Value::Object(payload),
            )
            .await
    }

    /// Convenience wrapper: build and send one targeted notification.
    pub async fn send_targeted(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        options: NotificationOptions,
    ) -> Result<Value> {
        let notification = self.create_notification(user_id, title, message, options);
        self.send_push(&notification).await
    }

    /// Send the same notification to a group of users.
    pub async fn send_group(
        &self,
        user_ids: &[String],
        title: &str,
        message: &str,
        options: NotificationOptions,
    ) -> Vec<Result<Value>> {
        let notifications: Vec<Notification> = user_ids
            .iter()
            .map(|user_id| self.create_notification(user_id, title, message, options.clone()))
            .collect();
        self.send_multiple(&notifications).await
    }

    /// Send a broadcast notification to all users of the app.
    pub async fn send_broadcast(
        &self,
        title: &str,
        message: &str,
        options: NotificationOptions,
    ) -> Result<Value> {
        let notification = self.create_broadcast(title, message, options);
        self.send_push(&notification).await
    }

    /// Send a batch of notifications sequentially.
    ///
    /// Items are independent: a failure is recorded in its slot and the rest
    /// of the batch still goes out. Nothing propagates past this call.
    pub async fn send_multiple(&self, notifications: &[Notification]) -> Vec<Result<Value>> {
        let mut results = Vec::with_capacity(notifications.len());
        for notification in notifications {
            results.push(self.send_push(notification).await);
        }
        results
    }

    /// Delivery statistics, optionally filtered (date range, status, ...).
    pub async fn statistics(&self, filters: &[(String, String)]) -> Result<Value> {
        self.http
            .get_json(
                &format!("{}/{}/GetPushStatistics", self.base_url, SERVICE),
                None,
                filters,
            )
            .await
    }

    /// Delivery status of a single notification.
    pub async fn notification_status(&self, notification_id: &str) -> Result<Value> {
        if notification_id.is_empty() {
            return Err(Error::Validation(
                "notification ID cannot be empty".to_string(),
            ));
        }

        self.http
            .get_json(
                &format!("{}/{}/GetPushStatus", self.base_url, SERVICE),
                None,
                &[("notification_id".to_string(), notification_id.to_string())],
            )
            .await
    }
}
