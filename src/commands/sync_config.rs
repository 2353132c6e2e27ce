use crate::models::JinnResult;
use crate::services::inventory::project_name;
use crate::services::{Authenticator, JinnApiClient, RunContext, SshConfigSync, SyncOutcome};
use crate::utils::Prompter;

/// 同步伺服器產生的 SSH config
pub async fn sync_ssh_config(ctx: &RunContext, prompter: &dyn Prompter) -> JinnResult<SyncOutcome> {
    log::info!("[sync_config] Syncing SSH config");
    let api = JinnApiClient::from_config(ctx.config())?;
    let credential = Authenticator::new(&api, ctx, prompter).api_credential().await?;

    // 專案名稱只用於預設檔名
    let project = match api.fetch_inventory(&credential).await {
        Ok(records) => project_name(&records),
        Err(e) => {
            log::warn!("[sync_config] Could not detect project name: {}", e);
            crate::config::DEFAULT_PROJECT_NAME.to_string()
        }
    };

    let outcome = SshConfigSync::new(&api, ctx, prompter)
        .sync(&credential, &project)
        .await?;
    log::info!(
        "[sync_config] Sync finished ({} hosts, include added: {})",
        outcome.host_count,
        outcome.include_added
    );
    Ok(outcome)
}
