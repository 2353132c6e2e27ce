use crate::config::JinnConfig;
use crate::models::{ApiCredential, Credentials};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Values cached for the duration of one run
#[derive(Default)]
struct SessionState {
    credentials: Option<Credentials>,
    api_credential: Option<ApiCredential>,
    passphrases: HashMap<PathBuf, String>,
    /// Keys whose passphrase was entered wrong; not asked for again
    rejected_keys: HashSet<PathBuf>,
    fallback_key: Option<PathBuf>,
    team_keys: Option<Vec<String>>,
}

/// Per-run context shared by every service.
///
/// Built once by the caller and passed by reference; nothing here outlives the run.
pub struct RunContext {
    config: JinnConfig,
    state: Mutex<SessionState>,
}

impl RunContext {
    pub fn new(config: JinnConfig) -> Self {
        let state = SessionState {
            credentials: config.credentials.clone(),
            api_credential: config.access_key.clone().map(ApiCredential::AccessKey),
            ..Default::default()
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &JinnConfig {
        &self.config
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.lock().await.credentials.clone()
    }

    pub async fn set_credentials(&self, credentials: Credentials) {
        self.state.lock().await.credentials = Some(credentials);
    }

    /// Drop rejected credentials so the next attempt asks again
    pub async fn forget_credentials(&self) {
        self.state.lock().await.credentials = None;
    }

    pub async fn api_credential(&self) -> Option<ApiCredential> {
        self.state.lock().await.api_credential.clone()
    }

    /// Session key from an earlier login in this run
    pub async fn session_key(&self) -> Option<String> {
        match &self.state.lock().await.api_credential {
            Some(ApiCredential::SessionKey(key)) => Some(key.clone()),
            _ => None,
        }
    }

    pub async fn set_api_credential(&self, credential: ApiCredential) {
        self.state.lock().await.api_credential = Some(credential);
    }

    pub async fn passphrase(&self, key_path: &Path) -> Option<String> {
        self.state.lock().await.passphrases.get(key_path).cloned()
    }

    pub async fn remember_passphrase(&self, key_path: &Path, passphrase: String) {
        self.state
            .lock()
            .await
            .passphrases
            .insert(key_path.to_path_buf(), passphrase);
    }

    pub async fn is_rejected_key(&self, key_path: &Path) -> bool {
        self.state.lock().await.rejected_keys.contains(key_path)
    }

    pub async fn reject_key(&self, key_path: &Path) {
        self.state
            .lock()
            .await
            .rejected_keys
            .insert(key_path.to_path_buf());
    }

    pub async fn fallback_key(&self) -> Option<PathBuf> {
        self.state.lock().await.fallback_key.clone()
    }

    pub async fn set_fallback_key(&self, path: PathBuf) {
        self.state.lock().await.fallback_key = Some(path);
    }

    pub async fn team_keys(&self) -> Option<Vec<String>> {
        self.state.lock().await.team_keys.clone()
    }

    pub async fn set_team_keys(&self, keys: Vec<String>) {
        self.state.lock().await.team_keys = Some(keys);
    }

    /// Clear all cached credentials, keys and passphrases
    pub async fn clear_cache(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::default();
        log::debug!("[context] Cache cleared");
    }
}
