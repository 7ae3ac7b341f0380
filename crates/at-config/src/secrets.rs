//! `secrets.yaml` lookups for `!secret` tags
//!
//! The file sits next to `config.yaml` and is only read the first time a
//! `!secret` tag needs it. A config without tags never touches it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

pub(crate) const SECRETS_FILE: &str = "secrets.yaml";

pub(crate) struct SecretStore {
    path: PathBuf,
    entries: Option<HashMap<String, String>>,
}

impl SecretStore {
    pub(crate) fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(SECRETS_FILE),
            entries: None,
        }
    }

    pub(crate) fn lookup(&mut self, key: &str) -> ConfigResult<String> {
        if self.entries.is_none() {
            self.entries = Some(read_entries(&self.path)?);
        }

        self.entries
            .as_ref()
            .and_then(|entries| entries.get(key))
            .cloned()
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
            })
    }
}

/// Scalar entries of the secrets file as text
///
/// Client ids are sometimes all digits, so numbers are kept verbatim.
fn read_entries(path: &Path) -> ConfigResult<HashMap<String, String>> {
    if !path.exists() {
        debug!("No {} at {:?}", SECRETS_FILE, path);
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: HashMap<String, Value> =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                warn!("Ignoring secret '{}': not a plain value", key);
                continue;
            }
        };
        entries.insert(key, text);
    }

    debug!("Loaded {} secrets from {:?}", entries.len(), path);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_text_and_numbers() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SECRETS_FILE),
            "airthings_client_id: 7f1c0e2a\nairthings_client_secret: s3cr3t\nnumeric_id: 12345\nnested:\n  a: b\n",
        )
        .unwrap();

        let mut store = SecretStore::new(dir.path());
        assert_eq!(store.lookup("airthings_client_id").unwrap(), "7f1c0e2a");
        assert_eq!(store.lookup("numeric_id").unwrap(), "12345");
        assert!(matches!(
            store.lookup("nested"),
            Err(ConfigError::SecretNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_file_has_no_secrets() {
        let dir = TempDir::new().unwrap();
        let mut store = SecretStore::new(dir.path());
        assert!(matches!(
            store.lookup("airthings_client_id"),
            Err(ConfigError::SecretNotFound { ref key }) if key == "airthings_client_id"
        ));
    }

    #[test]
    fn test_file_read_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SECRETS_FILE);
        fs::write(&path, "id: first\n").unwrap();

        let mut store = SecretStore::new(dir.path());
        assert_eq!(store.lookup("id").unwrap(), "first");

        fs::write(&path, "id: second\n").unwrap();
        assert_eq!(store.lookup("id").unwrap(), "first");
    }
}
