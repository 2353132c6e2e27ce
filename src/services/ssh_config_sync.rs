//! SSH config synchronisation.
//!
//! Downloads the server-generated SSH config, stores it as its own file under
//! `~/.ssh/config.d` and makes sure the main `~/.ssh/config` includes that
//! directory.

use crate::config::include_directive;
use crate::models::{ApiCredential, JinnError, JinnResult};
use crate::services::api_client::JinnApiClient;
use crate::services::context::RunContext;
use crate::utils::{sanitize_config_filename, Prompter, SshConfigParser};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// What a sync wrote
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// Written config file; `None` when the server returned no hosts
    pub path: Option<PathBuf>,
    /// Content as downloaded
    pub content: String,
    pub host_count: usize,
    pub include_added: bool,
}

/// Number of `Host` blocks in an SSH config blob
pub fn count_hosts(content: &str) -> usize {
    SshConfigParser::parse(content).len()
}

/// Append `Include <dir>/*` to `main_config` unless the directive already appears in it.
///
/// Returns `true` when the directive was added.
pub async fn ensure_include(main_config: &Path, dir: &Path) -> JinnResult<bool> {
    let directive = include_directive(dir);

    let existing = match fs::read_to_string(main_config).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if existing.contains(&directive) {
        log::debug!("[ssh_config_sync] {} already includes {}", main_config.display(), dir.display());
        return Ok(false);
    }

    if let Some(parent) = main_config.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(main_config)
        .await?;
    file.write_all(format!("\n{}\n", directive).as_bytes()).await?;
    file.flush().await?;

    log::info!("[ssh_config_sync] Added '{}' to {}", directive, main_config.display());
    Ok(true)
}

/// Create the config directory with owner-only access
async fn ensure_config_dir(dir: &Path) -> JinnResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
        #[cfg(unix)]
        fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).await?;
        log::info!("[ssh_config_sync] Created {}", dir.display());
    }
    Ok(())
}

pub struct SshConfigSync<'a> {
    api: &'a JinnApiClient,
    ctx: &'a RunContext,
    prompter: &'a dyn Prompter,
}

impl<'a> SshConfigSync<'a> {
    pub fn new(api: &'a JinnApiClient, ctx: &'a RunContext, prompter: &'a dyn Prompter) -> Self {
        Self { api, ctx, prompter }
    }

    /// File name under the config directory: the configured one, else asked for
    /// with `<project>_ssh_config` as the default
    pub fn choose_filename(&self, project_name: &str) -> JinnResult<String> {
        if let Some(name) = &self.ctx.config().ssh_config_name {
            return sanitize_config_filename(name);
        }

        let default = format!("{}_ssh_config", project_name);
        let max_attempts = self.ctx.config().max_selection_attempts;
        let mut attempts = 0;
        loop {
            let answer = self
                .prompter
                .input("Name for the SSH config file", Some(&default))?;
            let answer = if answer.is_empty() { default.clone() } else { answer };

            match sanitize_config_filename(&answer) {
                Ok(name) => return Ok(name),
                Err(e) => log::warn!("[ssh_config_sync] {}", e),
            }

            attempts += 1;
            if max_attempts.is_some_and(|max| attempts >= max) {
                return Err(JinnError::InvalidPath {
                    message: format!("no valid config file name after {} attempts", attempts),
                });
            }
        }
    }

    /// Download the config, write it and wire up the Include
    pub async fn sync(&self, credential: &ApiCredential, project_name: &str) -> JinnResult<SyncOutcome> {
        let config = self.ctx.config();

        let content = self.api.fetch_ssh_config(credential, true).await?;
        let host_count = count_hosts(&content);
        log::info!("[ssh_config_sync] Received SSH config with {} hosts", host_count);

        if content.trim().is_empty() {
            log::warn!("[ssh_config_sync] Server returned an empty SSH config, nothing written");
            return Ok(SyncOutcome {
                path: None,
                content,
                host_count,
                include_added: false,
            });
        }

        let filename = self.choose_filename(project_name)?;
        let path = self.write_config(&filename, &content).await?;
        let include_added = ensure_include(&config.main_ssh_config, &config.ssh_config_dir).await?;

        Ok(SyncOutcome {
            path: Some(path),
            content,
            host_count,
            include_added,
        })
    }

    async fn write_config(&self, filename: &str, content: &str) -> JinnResult<PathBuf> {
        let dir = &self.ctx.config().ssh_config_dir;
        ensure_config_dir(dir).await?;

        let path = dir.join(filename);
        if !path.starts_with(dir) {
            return Err(JinnError::InvalidPath {
                message: format!("{} escapes {}", path.display(), dir.display()),
            });
        }

        fs::write(&path, content).await?;
        #[cfg(unix)]
        fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;

        log::info!("[ssh_config_sync] Saved SSH config to {}", path.display());
        Ok(path)
    }
}
