use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::errors::NetError;
use crate::key::CanonicalKey;

/// Pre-issued access tokens keyed by canonical request key.
///
/// Provisioned out of band and never written after construction, so it is
/// shared as `Arc<TokenTable>` across concurrent calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenTable {
    entries: HashMap<String, String>,
}

impl TokenTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a flat `{ "key": "token" }` object.
    pub fn from_json_str(raw: &str) -> Result<Self, NetError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| NetError::config(&format!("token table is not JSON: {err}")))?;
        let Value::Object(map) = value else {
            return Err(NetError::config("token table must be a JSON object"));
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, token) in map {
            match token {
                Value::String(token) => {
                    entries.insert(key, token);
                }
                other => {
                    return Err(NetError::config(&format!(
                        "token for '{key}' must be a string, got {other}"
                    )))
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            NetError::config(&format!("read token table {}: {err}", path.display()))
        })?;
        let table = Self::from_json_str(&raw)?;
        tracing::debug!(
            target: "coursehub::net",
            path = %path.display(),
            entries = table.len(),
            "token table loaded"
        );
        Ok(table)
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&str> {
        self.entries.get(key.as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
