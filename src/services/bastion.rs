use crate::models::{BastionRecord, JinnError, JinnResult, ResolvedKey};
use crate::utils::{validate_hostname, validate_ssh_user};
use async_trait::async_trait;
use russh::client;
use russh::keys::key::PublicKey;
use russh_keys::PublicKeyBase64;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tokio::time::timeout;

const DEFAULT_BASTION_USER: &str = "root";

/// Login on the bastion: its own user, else the target's user, else `root`
pub fn bastion_user<'a>(bastion: &'a BastionRecord, default_user: Option<&'a str>) -> &'a str {
    bastion
        .ssh_user
        .as_deref()
        .filter(|u| !u.is_empty())
        .or(default_user.filter(|u| !u.is_empty()))
        .unwrap_or(DEFAULT_BASTION_USER)
}

/// ProxyCommand routing a connection through `bastion`
pub fn proxy_command(bastion: &BastionRecord, default_user: Option<&str>) -> JinnResult<String> {
    validate_hostname(&bastion.hostname)?;

    let user = bastion_user(bastion, default_user);
    validate_ssh_user(user)?;

    Ok(format!(
        "ssh -W %h:%p -p {} {}@{}",
        bastion.port, user, bastion.hostname
    ))
}

/// Known hosts check result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownHostStatus {
    Matched,
    /// Host is not in known_hosts (first connection)
    Unknown,
    /// Host is in known_hosts but the key is different
    Changed,
}

/// Parse known_hosts content into host -> "type base64" entries.
/// Hashed entries are skipped.
pub fn parse_known_hosts(content: &str) -> HashMap<String, Vec<String>> {
    let mut known_hosts: HashMap<String, Vec<String>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("|1|") {
            continue;
        }

        // hostname[,hostname2,...] key-type key [comment]
        let mut parts = line.split_whitespace();
        let (Some(hostnames), Some(key_type), Some(key)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };

        for hostname in hostnames.split(',') {
            known_hosts
                .entry(hostname.trim().to_string())
                .or_default()
                .push(format!("{} {}", key_type, key));
        }
    }

    known_hosts
}

/// Compare a server key against known_hosts, trying `[host]:port` for non-default ports
pub fn check_known_host(
    known_hosts: &HashMap<String, Vec<String>>,
    hostname: &str,
    port: u16,
    server_key: &str,
) -> KnownHostStatus {
    let variants = if port == 22 {
        vec![hostname.to_string()]
    } else {
        vec![format!("[{}]:{}", hostname, port), hostname.to_string()]
    };

    let mut found_host = false;
    for variant in &variants {
        if let Some(keys) = known_hosts.get(variant) {
            found_host = true;
            if keys.iter().any(|k| k == server_key) {
                return KnownHostStatus::Matched;
            }
        }
    }

    if found_host {
        KnownHostStatus::Changed
    } else {
        KnownHostStatus::Unknown
    }
}

struct BastionHandler {
    hostname: String,
    port: u16,
    known_hosts: HashMap<String, Vec<String>>,
    status: Arc<Mutex<Option<KnownHostStatus>>>,
}

#[async_trait]
impl client::Handler for BastionHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let server_key = format!(
            "{} {}",
            server_public_key.name(),
            server_public_key.public_key_base64()
        );
        let status = check_known_host(&self.known_hosts, &self.hostname, self.port, &server_key);
        *self.status.lock().await = Some(status);

        match status {
            KnownHostStatus::Matched => Ok(true),
            KnownHostStatus::Unknown => {
                log::warn!(
                    "[bastion] {}:{} is not in known_hosts, accepting its key",
                    self.hostname,
                    self.port
                );
                Ok(true)
            }
            KnownHostStatus::Changed => {
                log::error!(
                    "[bastion] Host key for {}:{} has CHANGED, refusing to connect",
                    self.hostname,
                    self.port
                );
                Ok(false)
            }
        }
    }
}

/// Opens a forwarding channel through a bastion to check that it is usable
pub struct BastionTunnel {
    known_hosts_path: PathBuf,
    timeout: Duration,
}

impl BastionTunnel {
    pub fn new(ssh_dir: &Path, timeout: Duration) -> Self {
        Self {
            known_hosts_path: ssh_dir.join("known_hosts"),
            timeout,
        }
    }

    async fn load_known_hosts(&self) -> HashMap<String, Vec<String>> {
        match fs::read_to_string(&self.known_hosts_path).await {
            Ok(content) => parse_known_hosts(&content),
            Err(e) => {
                log::debug!(
                    "[bastion] Could not read {}: {}",
                    self.known_hosts_path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    async fn load_key(key: &ResolvedKey) -> JinnResult<russh_keys::key::KeyPair> {
        let content = fs::read_to_string(&key.path)
            .await
            .map_err(|_| JinnError::KeyNotFound {
                path: key.path.display().to_string(),
            })?;

        russh_keys::decode_secret_key(&content, key.passphrase.as_deref()).map_err(|e| {
            if key.passphrase.is_some() {
                JinnError::InvalidPassphrase {
                    path: key.path.display().to_string(),
                }
            } else {
                JinnError::InvalidKeyFormat {
                    message: e.to_string(),
                }
            }
        })
    }

    /// Authenticate to the bastion and open a direct-tcpip channel to the target.
    ///
    /// Any failure is reported as `BastionConnect` so only this host is skipped.
    pub async fn check_tunnel(
        &self,
        bastion: &BastionRecord,
        user: &str,
        key: &ResolvedKey,
        target_host: &str,
        target_port: u16,
    ) -> JinnResult<()> {
        let fail = |message: String| JinnError::BastionConnect {
            bastion: format!("{}:{}", bastion.hostname, bastion.port),
            message,
        };

        validate_hostname(&bastion.hostname)?;
        validate_ssh_user(user)?;

        let key_pair = Self::load_key(key).await?;
        let status = Arc::new(Mutex::new(None));
        let handler = BastionHandler {
            hostname: bastion.hostname.clone(),
            port: bastion.port,
            known_hosts: self.load_known_hosts().await,
            status: status.clone(),
        };

        let config = client::Config {
            inactivity_timeout: Some(self.timeout),
            ..Default::default()
        };
        let addr = format!("{}:{}", bastion.hostname, bastion.port);

        log::info!("[bastion] Connecting to {} as {}", addr, user);
        let mut session = match timeout(
            self.timeout,
            client::connect(Arc::new(config), &addr, handler),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                if *status.lock().await == Some(KnownHostStatus::Changed) {
                    return Err(fail("host key changed".to_string()));
                }
                return Err(fail(e.to_string()));
            }
            Err(_) => return Err(fail(format!("connection timed out after {:?}", self.timeout))),
        };

        let authenticated = session
            .authenticate_publickey(user, Arc::new(key_pair))
            .await
            .map_err(|e| fail(e.to_string()))?;
        if !authenticated {
            return Err(fail(format!("public key rejected for {}", user)));
        }

        let channel = session
            .channel_open_direct_tcpip(target_host, u32::from(target_port), "127.0.0.1", 0)
            .await
            .map_err(|e| fail(format!("cannot reach {}:{}: {}", target_host, target_port, e)))?;
        log::debug!(
            "[bastion] Tunnel to {}:{} via {} is open",
            target_host,
            target_port,
            addr
        );

        let _ = channel.close().await;
        let _ = session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bastion(host: &str, port: u16, user: Option<&str>) -> BastionRecord {
        BastionRecord {
            hostname: host.to_string(),
            port,
            ssh_user: user.map(String::from),
        }
    }

    #[test]
    fn test_proxy_command_uses_bastion_user() {
        let cmd = proxy_command(&bastion("jump.example.com", 2222, Some("jump")), Some("deploy")).unwrap();
        assert_eq!(cmd, "ssh -W %h:%p -p 2222 jump@jump.example.com");
    }

    #[test]
    fn test_proxy_command_user_fallbacks() {
        let cmd = proxy_command(&bastion("10.0.0.1", 22, None), Some("deploy")).unwrap();
        assert_eq!(cmd, "ssh -W %h:%p -p 22 deploy@10.0.0.1");

        let cmd = proxy_command(&bastion("10.0.0.1", 22, Some("")), None).unwrap();
        assert_eq!(cmd, "ssh -W %h:%p -p 22 root@10.0.0.1");
    }

    #[test]
    fn test_proxy_command_rejects_injection() {
        assert!(proxy_command(&bastion("jump; rm -rf /", 22, None), None).is_err());
        assert!(proxy_command(&bastion("-oProxyCommand=x", 22, None), None).is_err());
        assert!(proxy_command(&bastion("jump", 22, Some("a b")), None).is_err());
    }

    #[test]
    fn test_parse_known_hosts() {
        let content = "\
# comment
jump.example.com,10.0.0.1 ssh-ed25519 AAAAkey1 user@host
[jump.example.com]:2222 ssh-rsa AAAAkey2
|1|hashed|entry ssh-ed25519 AAAAkey3
broken-line
";
        let hosts = parse_known_hosts(content);
        assert_eq!(hosts.len(), 3);
        assert_eq!(hosts["10.0.0.1"], vec!["ssh-ed25519 AAAAkey1"]);
        assert_eq!(hosts["[jump.example.com]:2222"], vec!["ssh-rsa AAAAkey2"]);
    }

    #[test]
    fn test_check_known_host() {
        let hosts = parse_known_hosts(
            "jump ssh-ed25519 AAAAkey1\n[jump]:2222 ssh-ed25519 AAAAkey2\n",
        );
        assert_eq!(
            check_known_host(&hosts, "jump", 22, "ssh-ed25519 AAAAkey1"),
            KnownHostStatus::Matched
        );
        assert_eq!(
            check_known_host(&hosts, "jump", 2222, "ssh-ed25519 AAAAkey2"),
            KnownHostStatus::Matched
        );
        assert_eq!(
            check_known_host(&hosts, "jump", 22, "ssh-ed25519 AAAAother"),
            KnownHostStatus::Changed
        );
        assert_eq!(
            check_known_host(&hosts, "other", 22, "ssh-ed25519 AAAAkey1"),
            KnownHostStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_tunnel_check_unreachable_bastion() {
        let temp = tempfile::TempDir::new().unwrap();
        let key_path = temp.path().join("id_ed25519");
        let key = ssh_key::PrivateKey::random(&mut rand::rngs::OsRng, ssh_key::Algorithm::Ed25519)
            .unwrap()
            .to_openssh(ssh_key::LineEnding::LF)
            .unwrap();
        std::fs::write(&key_path, key.as_bytes()).unwrap();

        let tunnel = BastionTunnel::new(temp.path(), Duration::from_secs(2));
        let result = tunnel
            .check_tunnel(
                &bastion("127.0.0.1", 1, None),
                "root",
                &ResolvedKey {
                    path: key_path,
                    passphrase: None,
                },
                "10.0.0.5",
                22,
            )
            .await;
        assert!(matches!(result, Err(JinnError::BastionConnect { .. })));
    }
}
