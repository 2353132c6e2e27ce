//! Common test utilities and helpers
#![allow(dead_code)]

use jinn_inventory_lib::config::JinnConfig;
use jinn_inventory_lib::models::{JinnError, JinnResult};
use jinn_inventory_lib::utils::Prompter;
use rand::rngs::OsRng;
use ssh_key::{Algorithm, LineEnding, PrivateKey};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Create a temporary directory with a mock .ssh structure
pub struct MockSshDir {
    pub temp_dir: TempDir,
    pub ssh_dir: PathBuf,
}

impl MockSshDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let ssh_dir = temp_dir.path().join(".ssh");
        std::fs::create_dir_all(&ssh_dir).expect("Failed to create .ssh dir");
        Self { temp_dir, ssh_dir }
    }

    pub fn path(&self) -> &Path {
        &self.ssh_dir
    }

    /// Configuration rooted at this directory, pointed at `api_url`
    pub fn config(&self, api_url: &str) -> JinnConfig {
        let mut config = JinnConfig::with_ssh_dir(&self.ssh_dir);
        config.api_url = Some(api_url.to_string());
        config
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.ssh_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a freshly generated Ed25519 private key with mode 600
    pub fn write_key(&self, name: &str, passphrase: Option<&str>) -> PathBuf {
        let path = self.write_file(name, &generate_private_key(passphrase));
        #[cfg(unix)]
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .expect("Failed to set key permissions");
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.ssh_dir.join(name)).expect("Failed to read file")
    }
}

/// OpenSSH-encoded Ed25519 private key, encrypted when a passphrase is given
pub fn generate_private_key(passphrase: Option<&str>) -> String {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519).expect("Failed to generate key");
    let key = match passphrase {
        Some(p) => key.encrypt(&mut OsRng, p).expect("Failed to encrypt key"),
        None => key,
    };
    key.to_openssh(LineEnding::LF)
        .expect("Failed to encode key")
        .to_string()
}

/// Prompter answering `input`/`password` in order and `select` with a fixed choice
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    choice: Option<usize>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            choice: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_choice(mut self, choice: usize) -> Self {
        self.choice = Some(choice);
        self
    }

    fn next(&self, prompt: &str) -> JinnResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| JinnError::Prompt {
                message: format!("no scripted answer for '{}'", prompt),
            })
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, _default: Option<&str>) -> JinnResult<String> {
        self.next(prompt)
    }

    fn password(&self, prompt: &str) -> JinnResult<String> {
        self.next(prompt)
    }

    fn select(&self, prompt: &str, _items: &[String]) -> JinnResult<Option<usize>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.choice)
    }
}

/// Two groups, five servers; `db1` and `db2` are the active `db` hosts in `prod`
pub const SAMPLE_INVENTORY: &str = r#"{
  "result": [
    {"ssh_hostname": "db1.example.com", "ssh_user": "deploy", "ssh_port": 22, "is_active": true,
     "tags": ["db"], "group": {"name_en": "prod", "project": {"name_en": "atlas"}},
     "attributes": {"sudo": true, "internal_id": 7}},
    {"ssh_hostname": "web1.example.com", "ssh_user": "deploy", "is_active": true,
     "tags": ["web"], "group": {"name_en": "prod", "project": {"name_en": "atlas"}}},
    {"ssh_hostname": "stage-db.example.com", "ssh_user": "deploy", "is_active": true,
     "tags": ["db"], "group": {"name_en": "staging", "project": {"name_en": "atlas"}}},
    {"ssh_hostname": "db2.example.com", "ssh_user": "deploy", "ssh_port": 2222, "is_active": true,
     "tags": ["db", "primary"], "group": {"name_en": "prod", "project": {"name_en": "atlas"}},
     "bastion": {"hostname": "jump.example.com", "port": 22, "ssh_user": "jump"}},
    {"ssh_hostname": "db-old.example.com", "ssh_user": "deploy", "is_active": false,
     "tags": ["db"], "group": {"name_en": "prod", "project": {"name_en": "atlas"}}}
  ]
}"#;

/// SSH config as served by the config endpoint
pub const SAMPLE_SSH_CONFIG: &str = "Host db1\n  HostName db1.example.com\n  User deploy\n\nHost web1\n  HostName web1.example.com\n";

/// Sample public key for testing
pub const SAMPLE_ED25519_PUBLIC_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFlXOQk34tnLe4gTVThVboRl89gl4sC9wNcw+PtGp1Mk test@example";
