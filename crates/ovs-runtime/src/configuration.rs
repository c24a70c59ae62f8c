//! Typed configuration resources
//!
//! A [`Configuration`] binds a serializable settings type to a file on
//! disk. Loading a configuration that does not exist yet creates the file
//! from the type's defaults; loading one with missing fields fills the
//! gaps from defaults and writes the completed resource back, so hand
//! edits survive upgrades that add new settings.

use async_trait::async_trait;
use ovs_domain::error::{Error, Result};
use ovs_domain::ports::config::ConfigBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// JSON file backend for configuration resources
#[derive(Debug, Default, Clone)]
pub struct JsonConfigBackend;

#[async_trait]
impl ConfigBackend for JsonConfigBackend {
    async fn read(&self, path: &Path) -> Result<Option<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content).map_err(|e| {
                    Error::resource_unreadable(path.display().to_string(), e)
                })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::resource_unreadable(path.display().to_string(), e)),
        }
    }

    async fn write(&self, path: &Path, value: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        write_atomic(path, content.as_bytes()).await
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// TOML file backend for configuration resources
#[derive(Debug, Default, Clone)]
pub struct TomlConfigBackend;

#[async_trait]
impl ConfigBackend for TomlConfigBackend {
    async fn read(&self, path: &Path) -> Result<Option<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let table: toml::Value = toml::from_str(&content).map_err(|e| {
                    Error::resource_unreadable(path.display().to_string(), e)
                })?;
                Ok(Some(serde_json::to_value(table)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::resource_unreadable(path.display().to_string(), e)),
        }
    }

    async fn write(&self, path: &Path, value: &Value) -> Result<()> {
        let content = toml::to_string_pretty(value).map_err(|e| {
            Error::configuration_with_source(
                format!("Failed to serialize {} as TOML", path.display()),
                e,
            )
        })?;
        write_atomic(path, content.as_bytes()).await
    }

    fn extension(&self) -> &'static str {
        "toml"
    }
}

/// Write bytes through a sibling temp file and rename into place
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_source("Failed to create config directory", e))?;
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| Error::io_with_source(format!("Failed to write {}", tmp.display()), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::io_with_source(format!("Failed to replace {}", path.display()), e))
}

/// Fill `existing` with any fields it is missing from `defaults`
///
/// Objects merge recursively; every other value in `existing` wins as-is.
fn fill_defaults(defaults: &Value, existing: Value) -> Value {
    match (defaults, existing) {
        (Value::Object(default_map), Value::Object(mut existing_map)) => {
            for (key, default_value) in default_map {
                match existing_map.remove(key) {
                    Some(present) => {
                        existing_map.insert(key.clone(), fill_defaults(default_value, present));
                    }
                    None => {
                        existing_map.insert(key.clone(), default_value.clone());
                    }
                }
            }
            Value::Object(existing_map)
        }
        (_, existing) => existing,
    }
}

/// A typed configuration resource bound to one file
///
/// The in-memory value is the source of truth between loads; `save`
/// writes it back atomically through the backend.
pub struct Configuration<T> {
    backend: Arc<dyn ConfigBackend>,
    path: PathBuf,
    value: RwLock<T>,
}

impl<T> Configuration<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Load the resource `<dir>/<name>.<ext>`, creating it from defaults
    /// when absent and filling missing fields when partial
    pub async fn load(
        backend: Arc<dyn ConfigBackend>,
        dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<Self> {
        let path = dir
            .as_ref()
            .join(format!("{}.{}", name, backend.extension()));
        let defaults = serde_json::to_value(T::default())?;

        let merged = match backend.read(&path).await? {
            None => {
                info!(path = %path.display(), "configuration resource created from defaults");
                backend.write(&path, &defaults).await?;
                defaults
            }
            Some(existing) => {
                let merged = fill_defaults(&defaults, existing.clone());
                if merged != existing {
                    debug!(path = %path.display(), "configuration resource filled with defaults");
                    backend.write(&path, &merged).await?;
                }
                merged
            }
        };

        let value: T = serde_json::from_value(merged).map_err(|e| {
            Error::schema_mismatch(format!(
                "{} does not match the expected schema: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            backend,
            path,
            value: RwLock::new(value),
        })
    }

    /// Current value of the resource
    pub async fn get(&self) -> T {
        self.value.read().await.clone()
    }

    /// Mutate the in-memory value and persist the result
    pub async fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.value.write().await;
        mutate(&mut value);
        let serialized = serde_json::to_value(&*value)?;
        self.backend.write(&self.path, &serialized).await
    }

    /// Persist the current in-memory value
    pub async fn save(&self) -> Result<()> {
        let value = self.value.read().await;
        let serialized = serde_json::to_value(&*value)?;
        self.backend.write(&self.path, &serialized).await
    }

    /// Re-read the resource from disk, replacing the in-memory value
    pub async fn reload(&self) -> Result<()> {
        let existing = self.backend.read(&self.path).await?.ok_or_else(|| {
            Error::not_found(format!("configuration resource {}", self.path.display()))
        })?;
        let defaults = serde_json::to_value(T::default())?;
        let merged = fill_defaults(&defaults, existing);
        let value: T = serde_json::from_value(merged).map_err(|e| {
            Error::schema_mismatch(format!(
                "{} does not match the expected schema: {}",
                self.path.display(),
                e
            ))
        })?;
        *self.value.write().await = value;
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> std::fmt::Debug for Configuration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_defaults_adds_missing_fields() {
        let defaults = json!({"retries": 3, "host": "localhost"});
        let existing = json!({"host": "db.internal"});
        let merged = fill_defaults(&defaults, existing);
        assert_eq!(merged, json!({"retries": 3, "host": "db.internal"}));
    }

    #[test]
    fn test_fill_defaults_recurses_into_objects() {
        let defaults = json!({"limits": {"cpu": 2, "mem": 512}});
        let existing = json!({"limits": {"mem": 1024}});
        let merged = fill_defaults(&defaults, existing);
        assert_eq!(merged, json!({"limits": {"cpu": 2, "mem": 1024}}));
    }

    #[test]
    fn test_fill_defaults_keeps_extra_fields() {
        let defaults = json!({"retries": 3});
        let existing = json!({"retries": 5, "custom": true});
        let merged = fill_defaults(&defaults, existing);
        assert_eq!(merged, json!({"retries": 5, "custom": true}));
    }

    #[test]
    fn test_fill_defaults_does_not_merge_arrays() {
        let defaults = json!({"hosts": ["a", "b"]});
        let existing = json!({"hosts": ["c"]});
        let merged = fill_defaults(&defaults, existing);
        assert_eq!(merged, json!({"hosts": ["c"]}));
    }
}
