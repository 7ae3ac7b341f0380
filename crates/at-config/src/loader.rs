//! Reading `config.yaml`
//!
//! Credentials can be kept out of the file with two tags, resolved before
//! the document is mapped onto [`RawPlatformConfig`]:
//!
//! - `!secret key` - value of `key` in `secrets.yaml` next to the config
//! - `!env_var NAME` - value of the environment variable `NAME`
//!
//! Any other tag is rejected with the path of the key that carries it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::platform::RawPlatformConfig;
use crate::secrets::SecretStore;

/// Default configuration file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Read and parse the raw platform configuration
///
/// `file` is relative to `config_dir` unless absolute. The result still has
/// to be validated with [`RawPlatformConfig::validate`].
pub fn read_config(
    config_dir: impl Into<PathBuf>,
    file: impl AsRef<Path>,
) -> ConfigResult<RawPlatformConfig> {
    let config_dir = config_dir.into();
    let path = config_dir.join(file.as_ref());
    debug!("Reading configuration from {:?}", path);

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
        path: path.clone(),
        source,
    })?;
    let document: Value =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseYaml { path, source })?;

    let mut tags = TagResolver {
        secrets: SecretStore::new(&config_dir),
    };
    RawPlatformConfig::from_yaml(tags.resolve(document, "")?)
}

struct TagResolver {
    secrets: SecretStore,
}

impl TagResolver {
    /// Replace every tagged node below `value`; `at` is its key path
    fn resolve(&mut self, value: Value, at: &str) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.substitute(*tagged, at),
            Value::Mapping(map) => map
                .into_iter()
                .map(|(key, child)| {
                    let child_at = child_path(at, &key);
                    Ok((key, self.resolve(child, &child_at)?))
                })
                .collect::<ConfigResult<Mapping>>()
                .map(Value::Mapping),
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.resolve(item, &format!("{}[{}]", at, i)))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            other => Ok(other),
        }
    }

    fn substitute(&mut self, tagged: TaggedValue, at: &str) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        if tag != "!secret" && tag != "!env_var" {
            return Err(ConfigError::UnsupportedTag {
                tag,
                key: at.to_string(),
            });
        }

        let Value::String(name) = tagged.value else {
            return Err(ConfigError::InvalidValue {
                key: at.to_string(),
                reason: format!("{} expects a plain name", tag),
            });
        };

        let value = if tag == "!secret" {
            self.secrets.lookup(&name)?
        } else {
            std::env::var(&name).map_err(|_| ConfigError::EnvVarNotFound { var: name })?
        };
        debug!("Resolved {} for {}", tag, at);
        Ok(Value::String(value))
    }
}

fn child_path(parent: &str, key: &Value) -> String {
    let key = match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    };
    if parent.is_empty() {
        key
    } else {
        format!("{}.{}", parent, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SECRETS_FILE;
    use tempfile::TempDir;

    fn config_dir(config: &str, secrets: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), config).unwrap();
        if let Some(secrets) = secrets {
            fs::write(dir.path().join(SECRETS_FILE), secrets).unwrap();
        }
        dir
    }

    #[test]
    fn test_secret_credentials() {
        let dir = config_dir(
            r#"
clientId: !secret id
clientSecret: !secret secret
refreshInterval: 300
devices:
  - name: Living Room
    serialNumber: "2930012345"
"#,
            Some("id: 4242\nsecret: my-secret\n"),
        );

        let validated = read_config(dir.path(), CONFIG_FILE)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(validated.config.credentials.client_id, "4242");
        assert_eq!(validated.config.credentials.client_secret, "my-secret");
        assert_eq!(validated.config.devices[0].refresh_interval_secs, 300);
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn test_env_var_credentials() {
        std::env::set_var("AT_CONFIG_TEST_CLIENT_ID", "from-env");
        let dir = config_dir(
            "clientId: !env_var AT_CONFIG_TEST_CLIENT_ID\nclientSecret: s\n",
            None,
        );

        let raw = read_config(dir.path(), CONFIG_FILE).unwrap();
        assert_eq!(
            raw.client_id,
            Some(Value::String("from-env".to_string()))
        );
        std::env::remove_var("AT_CONFIG_TEST_CLIENT_ID");

        let dir = config_dir("clientId: !env_var AT_CONFIG_TEST_UNSET\n", None);
        assert!(matches!(
            read_config(dir.path(), CONFIG_FILE),
            Err(ConfigError::EnvVarNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_secret() {
        let dir = config_dir("clientSecret: !secret nonexistent\n", Some("other: x\n"));
        assert!(matches!(
            read_config(dir.path(), CONFIG_FILE),
            Err(ConfigError::SecretNotFound { ref key }) if key == "nonexistent"
        ));
    }

    #[test]
    fn test_untagged_config_ignores_secrets_file() {
        let dir = config_dir("clientId: a\nclientSecret: b\n", Some(": not yaml ["));
        assert!(read_config(dir.path(), CONFIG_FILE).is_ok());
    }

    #[test]
    fn test_unsupported_tag_names_key() {
        let dir = config_dir(
            "clientId: a\ndevices:\n  - serialNumber: !include serial.yaml\n",
            None,
        );
        let err = read_config(dir.path(), CONFIG_FILE).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedTag { ref tag, ref key }
                if tag == "!include" && key == "devices[0].serialNumber"
        ));
    }

    #[test]
    fn test_secret_name_must_be_text() {
        let dir = config_dir("clientId: !secret [a, b]\n", None);
        assert!(matches!(
            read_config(dir.path(), CONFIG_FILE),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "clientId"
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_config(dir.path(), CONFIG_FILE),
            Err(ConfigError::ReadFile { .. })
        ));
    }
}
