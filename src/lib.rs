pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use cli::{Cli, Commands, HostsArgs, KeysArgs, OutputFormat};
use models::{JinnResult, ResolvedHost};
use services::RunContext;
use utils::{DialoguerPrompter, Prompter};

/// Execute one CLI invocation. Results go to stdout, logs to stderr.
pub async fn run(cli: Cli) -> JinnResult<()> {
    let ctx = RunContext::new(cli.to_config()?);
    let prompter = DialoguerPrompter;

    match &cli.command {
        Commands::Hosts(args) => run_hosts(&ctx, &prompter, args).await,
        Commands::SyncConfig { .. } => {
            let outcome = commands::sync_ssh_config(&ctx, &prompter).await?;
            if let Some(path) = outcome.path {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Keys(args) => run_keys(&ctx, &prompter, args).await,
    }
}

async fn run_hosts(ctx: &RunContext, prompter: &dyn Prompter, args: &HostsArgs) -> JinnResult<()> {
    let hosts = commands::resolve_hosts(ctx, prompter, args.group.as_deref()).await?;
    println!("{}", render_hosts(&hosts, args.format)?);
    Ok(())
}

async fn run_keys(ctx: &RunContext, prompter: &dyn Prompter, args: &KeysArgs) -> JinnResult<()> {
    if args.local {
        for key in commands::list_local_keys(ctx, prompter).await? {
            println!("{}\t{}", key, key.path.display());
        }
        return Ok(());
    }

    match &args.authorized_keys {
        Some(path) => {
            let result = commands::install_team_keys(ctx, prompter, path, args.refresh).await?;
            println!(
                "Added {} key(s) to {} ({} total)",
                result.keys_added,
                path.display(),
                result.keys_total
            );
        }
        None => {
            for key in commands::list_team_keys(ctx, prompter, args.refresh).await? {
                println!("{}", key);
            }
        }
    }
    Ok(())
}

/// JSON array of `[hostname, attributes]` pairs, or one `hostname user port` line per host
pub fn render_hosts(hosts: &[ResolvedHost], format: OutputFormat) -> JinnResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(hosts)?),
        OutputFormat::Plain => Ok(hosts
            .iter()
            .map(|host| {
                let user = host.attr_str("ssh_user").unwrap_or("-");
                let port = host
                    .attributes
                    .get("ssh_port")
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "22".to_string());
                format!("{} {} {}", host.hostname, user, port)
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
