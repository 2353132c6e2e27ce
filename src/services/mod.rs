pub mod api_client;
pub mod assembler;
pub mod auth;
pub mod bastion;
pub mod context;
pub mod inventory;
pub mod key_resolver;
pub mod ssh_config_sync;
pub mod team_keys;

pub use api_client::{JinnApiClient, LoginAttempt};
pub use assembler::{build_attributes, HostListAssembler, PASSTHROUGH_ATTRIBUTES};
pub use auth::Authenticator;
pub use bastion::{proxy_command, BastionTunnel, KnownHostStatus};
pub use context::RunContext;
pub use inventory::{
    filter_servers, parse_selection, InventoryFetcher, InventorySelection, Selection,
    SelectionCriteria,
};
pub use key_resolver::{rank_candidates, KeyResolver};
pub use ssh_config_sync::{ensure_include, SshConfigSync, SyncOutcome};
pub use team_keys::{fetch_team_keys, merge_authorized_keys, MergeKeysResult};
