use crate::models::{JinnResult, ResolvedHost};
use crate::services::{HostListAssembler, JinnApiClient, RunContext};
use crate::utils::Prompter;

/// 解析主機清單
pub async fn resolve_hosts(
    ctx: &RunContext,
    prompter: &dyn Prompter,
    group: Option<&str>,
) -> JinnResult<Vec<ResolvedHost>> {
    log::info!("[hosts] Resolving hosts");
    let api = JinnApiClient::from_config(ctx.config())?;
    let hosts = HostListAssembler::new(&api, ctx, prompter).run(group).await?;
    log::info!("[hosts] Resolved {} hosts", hosts.len());
    Ok(hosts)
}
