use reqwest::StatusCode;
use serde_json::Value;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::USER_AGENT;

/// Thin wrapper over a shared `reqwest::Client`.
///
/// Every remote call funnels through [`HttpClient::handle`], which maps
/// transport failures and non-2xx responses into the crate error taxonomy.
/// Nothing downstream sees a raw `reqwest` response.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// GET with optional bearer token and query parameters.
    pub async fn get_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(String, String)],
    ) -> Result<Value> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        self.handle(response).await
    }

    /// POST a JSON body.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.client.post(url).json(body).send().await?;
        self.handle(response).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.post(url).form(form).send().await?;
        self.handle(response).await
    }

    async fn handle(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication(format!(
                "provider rejected credentials: {}",
                body
            )));
        }
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), body));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::api(status.as_u16(), format!("invalid JSON response: {}", e))
        })
    }
}
