use crate::config::expand_tilde;
use std::collections::HashMap;
use std::path::PathBuf;

/// SSH Host configuration
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Host alias pattern
    pub host_pattern: String,
    /// Actual hostname
    pub hostname: Option<String>,
    /// Port number
    pub port: Option<u16>,
    /// Username
    pub user: Option<String>,
    /// Identity file path
    pub identity_file: Option<PathBuf>,
    /// ProxyJump / ProxyCommand and everything else
    pub options: HashMap<String, String>,
}

impl HostConfig {
    /// Get actual hostname (falls back to host pattern if not set)
    pub fn get_hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.host_pattern)
    }
}

/// SSH Config parser
pub struct SshConfigParser;

impl SshConfigParser {
    /// Parse SSH config file content
    pub fn parse(content: &str) -> Vec<HostConfig> {
        let mut hosts = Vec::new();
        let mut current_host: Option<HostConfig> = None;

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key = value or key value format
            let (key, value) = if let Some((k, v)) = line.split_once('=') {
                (k.trim().to_lowercase(), v.trim().to_string())
            } else if let Some((k, v)) = line.split_once(char::is_whitespace) {
                (k.trim().to_lowercase(), v.trim().to_string())
            } else {
                continue;
            };

            if key == "host" {
                if let Some(host) = current_host.take() {
                    hosts.push(host);
                }
                current_host = Some(HostConfig {
                    host_pattern: value,
                    ..Default::default()
                });
                continue;
            }

            // Global directives before the first Host block are ignored
            let Some(host) = current_host.as_mut() else {
                continue;
            };

            match key.as_str() {
                "hostname" => host.hostname = Some(value),
                "port" => host.port = value.parse().ok(),
                "user" => host.user = Some(value),
                "identityfile" => host.identity_file = Some(expand_tilde(&value)),
                _ => {
                    host.options.insert(key, value);
                }
            }
        }

        if let Some(host) = current_host {
            hosts.push(host);
        }

        hosts
    }

    /// Match host pattern (supports * wildcard)
    fn match_pattern(pattern: &str, alias: &str) -> bool {
        pattern
            .split_whitespace()
            .any(|single| Self::match_single_pattern(single, alias))
    }

    fn match_single_pattern(pattern: &str, alias: &str) -> bool {
        if pattern == "*" {
            return true;
        }

        if pattern.contains('*') {
            // Simple wildcard matching
            let parts: Vec<&str> = pattern.split('*').collect();
            if parts.len() == 2 {
                let prefix = parts[0];
                let suffix = parts[1];
                return alias.starts_with(prefix) && alias.ends_with(suffix);
            }
        }

        pattern == alias
    }

    /// Merge every block matching `alias` (for handling Host * and other global configs)
    pub fn merge_configs(hosts: &[HostConfig], alias: &str) -> HostConfig {
        let mut merged = HostConfig {
            host_pattern: alias.to_string(),
            ..Default::default()
        };

        // ssh semantics: the first value obtained for a keyword wins
        for host in hosts {
            if Self::match_pattern(&host.host_pattern, alias) {
                if merged.hostname.is_none() {
                    merged.hostname = host.hostname.clone();
                }
                if merged.port.is_none() {
                    merged.port = host.port;
                }
                if merged.user.is_none() {
                    merged.user = host.user.clone();
                }
                if merged.identity_file.is_none() {
                    merged.identity_file = host.identity_file.clone();
                }
                for (k, v) in &host.options {
                    merged.options.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }

        merged
    }

    /// IdentityFile configured for `target`, looked up by alias and then by HostName
    pub fn identity_file_for(hosts: &[HostConfig], target: &str) -> Option<PathBuf> {
        Self::merge_configs(hosts, target)
            .identity_file
            .or_else(|| {
                hosts
                    .iter()
                    .filter(|h| h.hostname.as_deref() == Some(target))
                    .find_map(|h| h.identity_file.clone())
            })
    }
}
