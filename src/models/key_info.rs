use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Ed25519,
    Rsa,
    Ecdsa,
    Dsa,
    Unknown,
}

impl From<&str> for KeyType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ed25519" | "ssh-ed25519" => KeyType::Ed25519,
            "rsa" | "ssh-rsa" => KeyType::Rsa,
            "ecdsa" | "ecdsa-sha2-nistp256" | "ecdsa-sha2-nistp384" | "ecdsa-sha2-nistp521" => {
                KeyType::Ecdsa
            }
            "dsa" | "ssh-dss" => KeyType::Dsa,
            _ => KeyType::Unknown,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyType::Ed25519 => write!(f, "ed25519"),
            KeyType::Rsa => write!(f, "rsa"),
            KeyType::Ecdsa => write!(f, "ecdsa"),
            KeyType::Dsa => write!(f, "dsa"),
            KeyType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A private key file found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct SshKeyCandidate {
    pub name: String,
    pub path: PathBuf,
    pub key_type: KeyType,
    pub encrypted: bool,
}

impl std::fmt::Display for SshKeyCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.name, self.key_type)?;
        if self.encrypted {
            write!(f, ", passphrase")?;
        }
        write!(f, ")")
    }
}

/// Key chosen for a host, with its passphrase when the key is encrypted
#[derive(Clone, PartialEq)]
pub struct ResolvedKey {
    pub path: PathBuf,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("path", &self.path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}
