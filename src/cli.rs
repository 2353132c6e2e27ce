//! Command line interface

use crate::config::{JinnConfig, KeySelection};
use crate::models::JinnResult;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Jinn - resolve the server inventory into an executor host list
#[derive(Debug, Parser)]
#[command(name = "jinn")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Inventory API base URL (overrides JINN_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// API access key (overrides JINN_ACCESS_KEY)
    #[arg(long, global = true)]
    pub access_key: Option<String>,

    /// SSH directory, defaults to ~/.ssh
    #[arg(long, global = true)]
    pub ssh_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Plain,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the selected servers into (hostname, attributes) pairs
    Hosts(HostsArgs),

    /// Download the SSH config and include it from ~/.ssh/config
    SyncConfig {
        /// File name under ~/.ssh/config.d
        #[arg(long)]
        config_name: Option<String>,
    },

    /// Team public keys
    Keys(KeysArgs),
}

#[derive(Debug, Args)]
pub struct HostsArgs {
    /// Group to use instead of the group menu
    #[arg(long)]
    pub group: Option<String>,

    /// Tag selection (indices or '*'), overrides JINN_TAGS
    #[arg(long)]
    pub tags: Option<String>,

    /// Pick the best-ranked key instead of asking
    #[arg(long)]
    pub auto_key: bool,

    /// Do not download the SSH config
    #[arg(long)]
    pub skip_ssh_config: bool,

    /// File name for the downloaded SSH config
    #[arg(long)]
    pub config_name: Option<String>,

    /// Open a tunnel through each bastion before accepting the host
    #[arg(long)]
    pub check_bastions: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct KeysArgs {
    /// Merge the keys into this authorized_keys file instead of printing them
    #[arg(long, conflicts_with = "local")]
    pub authorized_keys: Option<PathBuf>,

    /// List private keys found in the SSH directory
    #[arg(long)]
    pub local: bool,

    /// Fetch again even if the keys were already fetched
    #[arg(long)]
    pub refresh: bool,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Warn;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Build the run configuration: defaults, then environment, then flags
    pub fn to_config(&self) -> JinnResult<JinnConfig> {
        let mut config = match &self.ssh_dir {
            Some(dir) => {
                let mut config = JinnConfig::with_ssh_dir(dir);
                config.apply_env(|name| std::env::var(name).ok());
                config
            }
            None => JinnConfig::from_env()?,
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    fn apply_to(&self, config: &mut JinnConfig) {
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(key) = &self.access_key {
            config.access_key = Some(key.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }

        match &self.command {
            Commands::Hosts(args) => {
                if let Some(tags) = &args.tags {
                    config.tags = Some(tags.clone());
                }
                if args.auto_key {
                    config.key_selection = KeySelection::Auto;
                }
                if args.skip_ssh_config {
                    config.sync_ssh_config = false;
                }
                if let Some(name) = &args.config_name {
                    config.ssh_config_name = Some(name.clone());
                }
                config.check_bastions = args.check_bastions;
            }
            Commands::SyncConfig { config_name } => {
                if let Some(name) = config_name {
                    config.ssh_config_name = Some(name.clone());
                }
            }
            Commands::Keys(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["jinn", "hosts"]).log_level(), log::LevelFilter::Info);
        assert_eq!(parse(&["jinn", "-v", "hosts"]).log_level(), log::LevelFilter::Debug);
        assert_eq!(parse(&["jinn", "hosts", "-vv"]).log_level(), log::LevelFilter::Trace);
        assert_eq!(parse(&["jinn", "-q", "keys"]).log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_hosts_flags_override_config() {
        let cli = parse(&[
            "jinn",
            "--api-url",
            "http://jinn.local/",
            "--timeout-secs",
            "5",
            "hosts",
            "--tags",
            "1 2",
            "--auto-key",
            "--skip-ssh-config",
            "--check-bastions",
            "--format",
            "plain",
        ]);
        let mut config = JinnConfig::with_ssh_dir("/tmp/.ssh");
        cli.apply_to(&mut config);

        assert_eq!(config.base_url().unwrap(), "http://jinn.local");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.tags.as_deref(), Some("1 2"));
        assert_eq!(config.key_selection, KeySelection::Auto);
        assert!(!config.sync_ssh_config);
        assert!(config.check_bastions);
        match cli.command {
            Commands::Hosts(args) => assert_eq!(args.format, OutputFormat::Plain),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_keys_conflicting_flags() {
        assert!(Cli::try_parse_from(["jinn", "keys", "--local", "--authorized-keys", "/tmp/ak"]).is_err());
    }

    #[test]
    fn test_ssh_dir_reroots_paths() {
        let cli = parse(&["jinn", "--ssh-dir", "/tmp/sshdir", "sync-config", "--config-name", "x"]);
        let config = cli.to_config().unwrap();
        assert_eq!(config.main_ssh_config, PathBuf::from("/tmp/sshdir/config"));
        assert_eq!(config.ssh_config_dir, PathBuf::from("/tmp/sshdir/config.d"));
        assert_eq!(config.ssh_config_name.as_deref(), Some("x"));
    }
}
