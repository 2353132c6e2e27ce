//! API authentication.
//!
//! An access key is used as-is. Without one, the operator logs in with
//! username/password; a rejected login asks again until the attempt budget
//! runs out. The session key is kept for the rest of the run.

use crate::models::{ApiCredential, Credentials, JinnError, JinnResult};
use crate::services::api_client::{JinnApiClient, LoginAttempt};
use crate::services::context::RunContext;
use crate::utils::Prompter;

pub struct Authenticator<'a> {
    api: &'a JinnApiClient,
    ctx: &'a RunContext,
    prompter: &'a dyn Prompter,
}

impl<'a> Authenticator<'a> {
    pub fn new(api: &'a JinnApiClient, ctx: &'a RunContext, prompter: &'a dyn Prompter) -> Self {
        Self { api, ctx, prompter }
    }

    /// Credential for inventory requests: cached access/session key, else a login
    pub async fn api_credential(&self) -> JinnResult<ApiCredential> {
        if let Some(credential) = self.ctx.api_credential().await {
            log::debug!("[auth] Using cached API credential");
            return Ok(credential);
        }
        let key = self.login().await?;
        Ok(ApiCredential::SessionKey(key))
    }

    /// Session key for endpoints that require a logged-in user
    pub async fn session_key(&self) -> JinnResult<String> {
        if let Some(key) = self.ctx.session_key().await {
            return Ok(key);
        }
        self.login().await
    }

    async fn credentials(&self) -> JinnResult<Credentials> {
        if let Some(credentials) = self.ctx.credentials().await {
            log::debug!("[auth] Using cached credentials");
            return Ok(credentials);
        }

        let username = self.prompter.input("Enter username", None)?;
        let password = self.prompter.password("Enter password")?;
        let credentials = Credentials { username, password };
        self.ctx.set_credentials(credentials.clone()).await;
        Ok(credentials)
    }

    async fn login(&self) -> JinnResult<String> {
        let max_attempts = self.ctx.config().max_login_attempts.max(1);

        for attempt in 1..=max_attempts {
            let credentials = self.credentials().await?;
            log::info!(
                "[auth] Logging in to {} as {} (attempt {}/{})",
                self.api.base_url(),
                credentials.username,
                attempt,
                max_attempts
            );

            match self.api.login(&credentials).await? {
                LoginAttempt::Accepted(key) => {
                    self.ctx
                        .set_api_credential(ApiCredential::SessionKey(key.clone()))
                        .await;
                    log::info!("[auth] Login successful");
                    return Ok(key);
                }
                LoginAttempt::Rejected => {
                    log::warn!("[auth] Login rejected: invalid username or password");
                    self.ctx.forget_credentials().await;
                }
            }
        }

        log::error!("[auth] Giving up after {} failed login attempts", max_attempts);
        Err(JinnError::Authentication {
            message: format!("login rejected {} times", max_attempts),
        })
    }
}
