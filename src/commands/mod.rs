pub mod hosts;
pub mod keys;
pub mod sync_config;

pub use hosts::resolve_hosts;
pub use keys::{install_team_keys, list_local_keys, list_team_keys};
pub use sync_config::sync_ssh_config;
