use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn default_ssh_port() -> u16 {
    22
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Project a group belongs to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectRef {
    #[serde(default, alias = "name")]
    pub name_en: Option<String>,
}

/// Inventory group reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupRef {
    #[serde(default, alias = "name")]
    pub name_en: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

/// Jump host a server is reached through
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BastionRecord {
    #[serde(alias = "ssh_hostname")]
    pub hostname: String,
    #[serde(default = "default_ssh_port", alias = "ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub ssh_user: Option<String>,
}

/// One server as returned by the inventory API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRecord {
    #[serde(alias = "hostname")]
    pub ssh_hostname: String,
    #[serde(default)]
    pub ssh_user: Option<String>,
    #[serde(default)]
    pub ssh_port: Option<u16>,
    #[serde(default)]
    pub group: Option<GroupRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub bastion: Option<BastionRecord>,
    #[serde(default)]
    pub ssh_key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
}

impl ServerRecord {
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_ref()?.name_en.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.group
            .as_ref()?
            .project
            .as_ref()?
            .name_en
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Port number (defaults to 22)
    pub fn port(&self) -> u16 {
        self.ssh_port.unwrap_or(22)
    }

    /// Key path declared by the inventory, either top-level or in `attributes`
    pub fn key_hint(&self) -> Option<&str> {
        self.ssh_key
            .as_deref()
            .or_else(|| self.attributes.get("ssh_key").and_then(Value::as_str))
            .filter(|hint| !hint.trim().is_empty())
    }
}

/// Body of `GET /inventory/servers/`
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryResponse {
    pub result: Vec<ServerRecord>,
}

/// Final `(hostname, attributes)` pair handed to the executor.
///
/// Serialized as a two-element JSON array so the output can be loaded
/// directly as an executor host list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHost {
    pub hostname: String,
    pub attributes: Map<String, Value>,
}

impl ResolvedHost {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

impl Serialize for ResolvedHost {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.hostname)?;
        tuple.serialize_element(&self.attributes)?;
        tuple.end()
    }
}
