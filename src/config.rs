//! Run configuration
//!
//! Defaults, overridden by `JINN_*` environment variables, overridden by CLI flags.

use crate::models::{Credentials, JinnError, JinnResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const INVENTORY_ENDPOINT: &str = "/inventory/servers/";
pub const SSH_CONFIG_ENDPOINT: &str = "/ssh-tools/ssh-config/";
pub const SSH_KEYLIST_ENDPOINT: &str = "/ssh-tools/ssh-keylist/";
pub const LOGIN_ENDPOINT: &str = "/login/";

pub const DEFAULT_PROJECT_NAME: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOGIN_ATTEMPTS: u32 = 3;

/// How a key is picked when several candidates remain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySelection {
    /// Ask the operator by index
    Prompt,
    /// Take the best-ranked candidate
    Auto,
}

#[derive(Debug, Clone)]
pub struct JinnConfig {
    pub api_url: Option<String>,
    pub access_key: Option<String>,
    /// Non-interactive login credentials
    pub credentials: Option<Credentials>,
    /// Raw group selection (`"1 3"`, `"*"`), answers the group prompt
    pub groups: Option<String>,
    /// Raw tag selection, answers the tag prompt
    pub tags: Option<String>,
    /// Answers the key selection prompt
    pub ssh_key_path: Option<PathBuf>,

    pub ssh_dir: PathBuf,
    pub main_ssh_config: PathBuf,
    pub ssh_config_dir: PathBuf,
    pub key_dir: PathBuf,

    pub request_timeout: Duration,
    pub max_login_attempts: u32,
    /// `None` reprompts until the input is valid
    pub max_selection_attempts: Option<u32>,
    pub key_selection: KeySelection,

    pub sync_ssh_config: bool,
    pub ssh_config_name: Option<String>,
    pub check_bastions: bool,
}

impl JinnConfig {
    /// Defaults rooted at `~/.ssh`
    pub fn new() -> JinnResult<Self> {
        let home = dirs::home_dir().ok_or(JinnError::HomeDirNotFound)?;
        Ok(Self::with_ssh_dir(home.join(".ssh")))
    }

    /// Defaults with every SSH path placed under `ssh_dir`
    pub fn with_ssh_dir(ssh_dir: impl Into<PathBuf>) -> Self {
        let ssh_dir = ssh_dir.into();
        Self {
            api_url: None,
            access_key: None,
            credentials: None,
            groups: None,
            tags: None,
            ssh_key_path: None,
            main_ssh_config: ssh_dir.join("config"),
            ssh_config_dir: ssh_dir.join("config.d"),
            key_dir: ssh_dir.join("keys"),
            ssh_dir,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_login_attempts: DEFAULT_LOGIN_ATTEMPTS,
            max_selection_attempts: None,
            key_selection: KeySelection::Prompt,
            sync_ssh_config: true,
            ssh_config_name: None,
            check_bastions: false,
        }
    }

    /// Defaults plus the `JINN_*` and `SSH_KEY_PATH` environment variables
    pub fn from_env() -> JinnResult<Self> {
        let mut config = Self::new()?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("JINN_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(key) = get("JINN_ACCESS_KEY") {
            self.access_key = Some(key);
        }
        if let Some(groups) = get("JINN_GROUPS") {
            self.groups = Some(groups);
        }
        if let Some(tags) = get("JINN_TAGS") {
            self.tags = Some(tags);
        }
        if let Some(path) = get("SSH_KEY_PATH") {
            self.ssh_key_path = Some(expand_tilde(&path));
        }
        if let (Some(username), Some(password)) = (get("JINN_USERNAME"), lookup("JINN_PASSWORD")) {
            self.credentials = Some(Credentials { username, password });
        }
    }

    /// API base URL without trailing slash
    pub fn base_url(&self) -> JinnResult<String> {
        self.api_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| JinnError::Config {
                message: "JINN_API_URL is not set".to_string(),
            })
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

/// `Include` directive pointing at every file in `dir`
pub fn include_directive(dir: &Path) -> String {
    format!("Include {}/*", dir.display())
}
