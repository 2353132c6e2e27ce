mod credentials;
mod error;
mod key_info;
mod server;

pub use credentials::{ApiCredential, Credentials};
pub use error::{JinnError, JinnResult};
pub use key_info::{KeyType, ResolvedKey, SshKeyCandidate};
pub use server::{BastionRecord, GroupRef, InventoryResponse, ProjectRef, ResolvedHost, ServerRecord};
