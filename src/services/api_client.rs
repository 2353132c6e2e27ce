//! Inventory API client.
//!
//! Thin wrapper over `reqwest` that knows the Jinn endpoints and how each
//! credential kind is attached to a request.

use crate::config::{
    JinnConfig, INVENTORY_ENDPOINT, LOGIN_ENDPOINT, SSH_CONFIG_ENDPOINT, SSH_KEYLIST_ENDPOINT,
};
use crate::models::{ApiCredential, Credentials, InventoryResponse, JinnError, JinnResult, ServerRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Body of `POST /login/`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    session_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyListEntry {
    key: String,
}

#[derive(Debug, Deserialize)]
struct KeyListResponse {
    result: Vec<KeyListEntry>,
}

/// Outcome of a single login attempt
#[derive(Debug, PartialEq)]
pub enum LoginAttempt {
    Accepted(String),
    Rejected,
}

pub struct JinnApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl JinnApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> JinnResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| JinnError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &JinnConfig) -> JinnResult<Self> {
        Self::new(&config.base_url()?, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, path: &str, credential: &ApiCredential) -> RequestBuilder {
        let request = self.client.get(self.url(path));
        match credential {
            ApiCredential::AccessKey(key) => request.header("Authentication", key),
            // 登入取得的 session key 也要放在 Authentication，inventory 只認這個 header
            ApiCredential::SessionKey(key) => request
                .header("Authentication", key)
                .header(AUTHORIZATION, format!("Bearer {}", key))
                .header(COOKIE, format!("sessionid={}", key)),
        }
    }

    /// Map non-success statuses onto the error taxonomy
    async fn check_response(resp: Response) -> JinnResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(JinnError::Authentication {
                message: format!("{}: {}", status, text.trim()),
            }),
            _ => Err(JinnError::Network {
                message: format!("API error ({}): {}", status, text.trim()),
            }),
        }
    }

    /// POST credentials to the login endpoint.
    ///
    /// A 401 is reported as `LoginAttempt::Rejected` so the caller can ask again;
    /// any other failure is an error.
    pub async fn login(&self, credentials: &Credentials) -> JinnResult<LoginAttempt> {
        let body = serde_json::json!({
            "username": credentials.username,
            "password": credentials.password,
        });

        let resp = self
            .client
            .post(self.url(LOGIN_ENDPOINT))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(LoginAttempt::Rejected);
        }

        let resp = Self::check_response(resp).await.map_err(|e| match e {
            JinnError::Network { message } => JinnError::Authentication { message },
            other => other,
        })?;

        let text = resp.text().await?;
        let login: LoginResponse = serde_json::from_str(&text)?;
        match login.session_key.filter(|key| !key.is_empty()) {
            Some(key) => Ok(LoginAttempt::Accepted(key)),
            None => Err(JinnError::Authentication {
                message: "Login response did not contain a session key".to_string(),
            }),
        }
    }

    /// `GET /inventory/servers/`
    pub async fn fetch_inventory(&self, credential: &ApiCredential) -> JinnResult<Vec<ServerRecord>> {
        let resp = self.authorized(INVENTORY_ENDPOINT, credential).send().await?;
        let resp = Self::check_response(resp).await?;
        let text = resp.text().await?;
        let inventory: InventoryResponse = serde_json::from_str(&text)?;
        Ok(inventory.result)
    }

    /// `GET /ssh-tools/ssh-config/?bastionless=<flag>`, returned verbatim
    pub async fn fetch_ssh_config(
        &self,
        credential: &ApiCredential,
        bastionless: bool,
    ) -> JinnResult<String> {
        let resp = self
            .authorized(SSH_CONFIG_ENDPOINT, credential)
            .query(&[("bastionless", bastionless)])
            .send()
            .await?;
        let resp = Self::check_response(resp).await?;
        Ok(resp.text().await?)
    }

    /// `GET /ssh-tools/ssh-keylist/`
    pub async fn fetch_ssh_keylist(&self, credential: &ApiCredential) -> JinnResult<Vec<String>> {
        let resp = self.authorized(SSH_KEYLIST_ENDPOINT, credential).send().await?;
        let resp = Self::check_response(resp).await?;
        let text = resp.text().await?;
        let list: KeyListResponse = serde_json::from_str(&text)?;
        Ok(list.result.into_iter().map(|entry| entry.key).collect())
    }
}
