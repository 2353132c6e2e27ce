use crate::models::{ApiCredential, JinnResult};
use crate::services::api_client::JinnApiClient;
use crate::services::auth::Authenticator;
use crate::services::context::RunContext;
use crate::utils::Prompter;
use serde::Serialize;
use std::path::Path;
use tokio::fs;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Result of merging team keys into authorized_keys
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeKeysResult {
    pub keys_added: usize,
    pub keys_total: usize,
}

/// Public keys of the team, cached for the run unless `force_refresh` is set.
///
/// The keylist endpoint needs a logged-in user, so an access key alone is not enough.
pub async fn fetch_team_keys(
    api: &JinnApiClient,
    ctx: &RunContext,
    prompter: &dyn Prompter,
    force_refresh: bool,
) -> JinnResult<Vec<String>> {
    if !force_refresh {
        if let Some(keys) = ctx.team_keys().await {
            log::debug!("[team_keys] Using {} cached keys", keys.len());
            return Ok(keys);
        }
    }

    let session_key = Authenticator::new(api, ctx, prompter).session_key().await?;
    let keys: Vec<String> = api
        .fetch_ssh_keylist(&ApiCredential::SessionKey(session_key))
        .await?
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    log::info!("[team_keys] Fetched {} team keys", keys.len());
    ctx.set_team_keys(keys.clone()).await;
    Ok(keys)
}

/// Key type and base64 body, ignoring the comment
fn key_body(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let key_type = parts.next()?;
    let key = parts.next()?;
    Some(format!("{} {}", key_type, key))
}

/// Append keys missing from `path`. Running it twice adds nothing the second time.
pub async fn merge_authorized_keys(path: &Path, keys: &[String]) -> JinnResult<MergeKeysResult> {
    let mut existing_content = if path.exists() {
        fs::read_to_string(path).await?
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        String::new()
    };

    let mut present: Vec<String> = existing_content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(key_body)
        .collect();

    let mut keys_added = 0;
    for key in keys {
        let Some(body) = key_body(key) else {
            log::warn!("[team_keys] Skipping malformed key entry");
            continue;
        };
        if present.contains(&body) {
            continue;
        }

        if !existing_content.is_empty() && !existing_content.ends_with('\n') {
            existing_content.push('\n');
        }
        existing_content.push_str(key.trim());
        existing_content.push('\n');
        present.push(body);
        keys_added += 1;
    }

    if keys_added > 0 {
        fs::write(path, &existing_content).await?;
        #[cfg(unix)]
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    log::info!(
        "[team_keys] Added {} key(s) to {}",
        keys_added,
        path.display()
    );
    Ok(MergeKeysResult {
        keys_added,
        keys_total: present.len(),
    })
}
