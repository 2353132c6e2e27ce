use crate::models::{JinnResult, SshKeyCandidate};
use crate::services::{
    fetch_team_keys, merge_authorized_keys, JinnApiClient, KeyResolver, MergeKeysResult,
    RunContext,
};
use crate::utils::Prompter;
use std::path::Path;

/// 取得團隊公鑰
pub async fn list_team_keys(
    ctx: &RunContext,
    prompter: &dyn Prompter,
    force_refresh: bool,
) -> JinnResult<Vec<String>> {
    log::info!("[keys] Fetching team public keys");
    let api = JinnApiClient::from_config(ctx.config())?;
    let keys = fetch_team_keys(&api, ctx, prompter, force_refresh).await?;
    log::info!("[keys] Found {} keys", keys.len());
    Ok(keys)
}

/// 將團隊公鑰加入 authorized_keys
pub async fn install_team_keys(
    ctx: &RunContext,
    prompter: &dyn Prompter,
    authorized_keys: &Path,
    force_refresh: bool,
) -> JinnResult<MergeKeysResult> {
    log::info!("[keys] Installing team keys into {}", authorized_keys.display());
    let keys = list_team_keys(ctx, prompter, force_refresh).await?;
    merge_authorized_keys(authorized_keys, &keys).await
}

/// 列出本機私鑰（依優先順序）
pub async fn list_local_keys(ctx: &RunContext, prompter: &dyn Prompter) -> JinnResult<Vec<SshKeyCandidate>> {
    log::info!("[keys] Listing local private keys");
    let keys = KeyResolver::new(ctx, prompter).scan_ssh_dir().await?;
    log::info!("[keys] Found {} keys", keys.len());
    Ok(keys)
}
