pub mod path_validator;
pub mod prompt;
pub mod ssh_config;

pub use path_validator::{sanitize_config_filename, validate_hostname, validate_ssh_user};
pub use prompt::{DialoguerPrompter, Prompter};
pub use ssh_config::{HostConfig, SshConfigParser};
