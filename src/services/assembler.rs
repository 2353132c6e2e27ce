//! Host-list assembly.
//!
//! Authenticate, fetch and filter the inventory, optionally sync the SSH
//! config, then resolve key and bastion settings for each host. Per-host
//! failures skip that host; an authentication failure aborts the run.

use crate::models::{JinnResult, ResolvedHost, ResolvedKey, ServerRecord};
use crate::services::api_client::JinnApiClient;
use crate::services::auth::Authenticator;
use crate::services::bastion::{bastion_user, proxy_command, BastionTunnel};
use crate::services::context::RunContext;
use crate::services::inventory::InventoryFetcher;
use crate::services::key_resolver::KeyResolver;
use crate::services::ssh_config_sync::SshConfigSync;
use crate::utils::Prompter;
use serde_json::{Map, Value};

/// Record attributes that are passed through to the executor unchanged
pub const PASSTHROUGH_ATTRIBUTES: &[&str] = &[
    "sudo",
    "sudo_user",
    "sudo_password",
    "su_user",
    "use_sudo_login",
    "use_su_login",
    "preserve_sudo_env",
    "ssh_known_hosts_file",
    "ssh_strict_host_key_checking",
    "ssh_connect_retries",
    "ssh_connect_retry_min_delay",
    "ssh_connect_retry_max_delay",
    "ssh_paramiko_connect_kwargs",
    "shell_executable",
    "name",
    "os",
];

/// Connection attributes for one host
pub fn build_attributes(
    record: &ServerRecord,
    key: &ResolvedKey,
    proxy_command: Option<String>,
) -> Map<String, Value> {
    let mut attributes: Map<String, Value> = record
        .attributes
        .iter()
        .filter(|(name, _)| PASSTHROUGH_ATTRIBUTES.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    attributes.insert("ssh_user".into(), record.ssh_user.clone().into());
    attributes.insert("ssh_port".into(), record.port().into());
    attributes.insert("group_name".into(), record.group_name().into());
    attributes.insert("tags".into(), record.tags.clone().into());
    attributes.insert("is_active".into(), record.is_active.into());
    attributes.insert("ssh_key".into(), key.path.display().to_string().into());

    if let Some(passphrase) = &key.passphrase {
        attributes.insert("ssh_key_password".into(), passphrase.clone().into());
    }
    if let Some(command) = proxy_command {
        attributes.insert("ssh_proxy_command".into(), command.into());
    }

    attributes
}

pub struct HostListAssembler<'a> {
    api: &'a JinnApiClient,
    ctx: &'a RunContext,
    prompter: &'a dyn Prompter,
}

impl<'a> HostListAssembler<'a> {
    pub fn new(api: &'a JinnApiClient, ctx: &'a RunContext, prompter: &'a dyn Prompter) -> Self {
        Self { api, ctx, prompter }
    }

    /// Build the ordered `(hostname, attributes)` list
    pub async fn run(&self, preselected_group: Option<&str>) -> JinnResult<Vec<ResolvedHost>> {
        let config = self.ctx.config();

        let credential = Authenticator::new(self.api, self.ctx, self.prompter)
            .api_credential()
            .await?;

        let selection = InventoryFetcher::new(self.api, self.ctx, self.prompter)
            .fetch(&credential, preselected_group)
            .await;
        if selection.servers.is_empty() {
            log::warn!("[assembler] No servers selected");
            return Ok(Vec::new());
        }
        log::info!(
            "[assembler] {} servers selected in project {}",
            selection.servers.len(),
            selection.project_name
        );

        let mut resolver = KeyResolver::new(self.ctx, self.prompter);
        if config.sync_ssh_config {
            match SshConfigSync::new(self.api, self.ctx, self.prompter)
                .sync(&credential, &selection.project_name)
                .await
            {
                Ok(outcome) => resolver = resolver.with_ssh_config(&outcome.content),
                Err(e) => log::warn!("[assembler] SSH config sync failed: {}", e),
            }
        }

        let tunnel = config
            .check_bastions
            .then(|| BastionTunnel::new(&config.ssh_dir, config.request_timeout));

        let mut hosts = Vec::with_capacity(selection.servers.len());
        for record in &selection.servers {
            match self.resolve_host(record, &resolver, tunnel.as_ref()).await {
                Ok(host) => hosts.push(host),
                Err(e) if e.is_per_host() => {
                    log::warn!("[assembler] Skipping {}: {}", record.ssh_hostname, e);
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("[assembler] Resolved {} hosts", hosts.len());
        Ok(hosts)
    }

    async fn resolve_host(
        &self,
        record: &ServerRecord,
        resolver: &KeyResolver<'_>,
        tunnel: Option<&BastionTunnel>,
    ) -> JinnResult<ResolvedHost> {
        let key = resolver.resolve(record).await?;

        let proxy = match &record.bastion {
            Some(bastion) => {
                let command = proxy_command(bastion, record.ssh_user.as_deref())?;
                if let Some(tunnel) = tunnel {
                    let user = bastion_user(bastion, record.ssh_user.as_deref());
                    tunnel
                        .check_tunnel(bastion, user, &key, &record.ssh_hostname, record.port())
                        .await?;
                }
                Some(command)
            }
            None => None,
        };

        log::debug!(
            "[assembler] {} -> key {}, bastion {}",
            record.ssh_hostname,
            key.path.display(),
            proxy.is_some()
        );
        Ok(ResolvedHost {
            hostname: record.ssh_hostname.clone(),
            attributes: build_attributes(record, &key, proxy),
        })
    }
}
