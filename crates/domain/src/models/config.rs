//! Configuration namespace models.
//!
//! Persisted configuration is a flat mapping of dotted keys to JSON values,
//! partitioned into namespaces. Each namespace is read and written as a whole.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordered key/value view of a single namespace.
pub type ConfigSnapshot = BTreeMap<String, Value>;

/// Configuration namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigNamespace {
    Crowi,
    Markdown,
    Notification,
}

impl ConfigNamespace {
    pub const ALL: [ConfigNamespace; 3] = [
        ConfigNamespace::Crowi,
        ConfigNamespace::Markdown,
        ConfigNamespace::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigNamespace::Crowi => "crowi",
            ConfigNamespace::Markdown => "markdown",
            ConfigNamespace::Notification => "notification",
        }
    }
}

impl fmt::Display for ConfigNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigNamespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crowi" => Ok(ConfigNamespace::Crowi),
            "markdown" => Ok(ConfigNamespace::Markdown),
            "notification" => Ok(ConfigNamespace::Notification),
            other => Err(format!("Unknown config namespace: {}", other)),
        }
    }
}

/// A single persisted configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub ns: ConfigNamespace,
    pub key: String,
    pub value: Value,
}

/// Typed accessors over a namespace snapshot.
pub trait SnapshotExt {
    /// Value as a string; non-string values yield `None`.
    fn str_value(&self, key: &str) -> Option<&str>;

    /// Value as a non-empty trimmed string.
    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.str_value(key).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Boolean value, accepting JSON booleans and the strings "true"/"false".
    fn flag(&self, key: &str) -> bool;
}

impl SnapshotExt for ConfigSnapshot {
    fn str_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespace_round_trips_through_str() {
        for ns in ConfigNamespace::ALL {
            assert_eq!(ns.as_str().parse::<ConfigNamespace>().unwrap(), ns);
        }
        assert!("plugins".parse::<ConfigNamespace>().is_err());
    }

    #[test]
    fn test_namespace_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ConfigNamespace::Notification).unwrap(),
            json!("notification")
        );
    }

    #[test]
    fn test_snapshot_accessors() {
        let mut snapshot = ConfigSnapshot::new();
        snapshot.insert("slack:token".into(), json!("  "));
        snapshot.insert("slack:clientId".into(), json!("abc"));
        snapshot.insert("a:flag".into(), json!(true));
        snapshot.insert("b:flag".into(), json!("true"));
        snapshot.insert("c:flag".into(), json!(1));

        assert_eq!(snapshot.non_empty_str("slack:token"), None);
        assert_eq!(snapshot.non_empty_str("slack:clientId"), Some("abc"));
        assert!(snapshot.flag("a:flag"));
        assert!(snapshot.flag("b:flag"));
        assert!(!snapshot.flag("c:flag"));
        assert!(!snapshot.flag("missing"));
    }
}
