//! Soul store - durable load/merge/save of the profile
//!
//! Loading is strict (`load`) or forgiving (`load_or_create`). The forgiving
//! path turns every load failure into a fresh profile, after copying a
//! corrupt file aside so nothing is silently destroyed.
//!
//! There is no cross-process coordination: two processes saving the same
//! file race and the last writer wins.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::profile::Profile;

/// Why a persisted profile could not be used
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("soul file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read soul file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("soul file {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("soul file {} does not hold a JSON object", .0.display())]
    InvalidShape(PathBuf),

    #[error("soul file {} does not match the profile schema: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// The file exists but its content is unusable
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            LoadError::Corrupt { .. } | LoadError::InvalidShape(_) | LoadError::Schema { .. }
        )
    }
}

/// File-backed profile storage
#[derive(Debug, Clone)]
pub struct SoulStore {
    path: PathBuf,
    backup_corrupt: bool,
}

impl SoulStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_corrupt: true,
        }
    }

    /// Enable or disable copying unusable files to `<file>.corrupt`
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_corrupt = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unusable soul file is copied before being replaced
    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "corrupt")
    }

    /// Load and structurally repair the persisted profile
    pub fn load(&self) -> std::result::Result<Profile, LoadError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let loaded: Value = serde_json::from_str(&raw).map_err(|source| LoadError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        if !loaded.is_object() {
            return Err(LoadError::InvalidShape(self.path.clone()));
        }

        let schema_error = |source| LoadError::Schema {
            path: self.path.clone(),
            source,
        };
        let defaults = default_profile_value(Utc::now()).map_err(schema_error)?;
        let merged = structural_merge(defaults, loaded);
        let profile: Profile = serde_json::from_value(merged).map_err(schema_error)?;

        debug!(
            "Loaded soul file {} ({} feedback entries)",
            self.path.display(),
            profile.feedback_history.len()
        );
        Ok(profile)
    }

    /// Load the profile, or start a fresh one if it is absent or unusable
    ///
    /// A fresh profile is saved immediately. An unusable file is only
    /// replaced once its backup copy exists.
    pub fn load_or_create(&self) -> Result<Profile> {
        let error = match self.load() {
            Ok(profile) => return Ok(profile),
            Err(error) => error,
        };

        match &error {
            LoadError::NotFound(_) => {
                info!("No soul file at {}, creating one", self.path.display());
            }
            other => warn!("{}; starting from a fresh profile", other),
        }

        if self.backup_corrupt && error.is_corrupt() {
            let backup = self.backup_path();
            std::fs::copy(&self.path, &backup).with_context(|| {
                format!(
                    "Failed to back up unusable soul file {} to {}; leaving it in place",
                    self.path.display(),
                    backup.display()
                )
            })?;
            warn!("Kept unusable soul file as {}", backup.display());
        }

        let mut profile = Profile::new(Utc::now());
        self.save(&mut profile)?;
        Ok(profile)
    }

    /// Stamp `last_updated` and write the profile
    ///
    /// Writes to a sibling temp file and renames it over the target.
    pub fn save(&self, profile: &mut Profile) -> Result<()> {
        profile.touch(Utc::now());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create soul directory {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
        let tmp = sibling_with_suffix(&self.path, "tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }

        debug!("Saved soul file {}", self.path.display());
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// The canonical default structure as JSON
pub fn default_profile_value(now: DateTime<Utc>) -> serde_json::Result<Value> {
    serde_json::to_value(Profile::new(now))
}

/// Backfill `loaded` with anything `defaults` has that it lacks
///
/// Mappings present on both sides merge recursively. A default mapping
/// replaces a loaded value that is not a mapping. Every other loaded value
/// wins outright; lists are never merged element-wise. Keys only present in
/// `loaded` are kept.
pub fn structural_merge(defaults: Value, loaded: Value) -> Value {
    match (defaults, loaded) {
        (Value::Object(mut base), Value::Object(update)) => {
            for (key, value) in update {
                let merged = match base.remove(&key) {
                    Some(Value::Object(default_map)) => {
                        if value.is_object() {
                            structural_merge(Value::Object(default_map), value)
                        } else {
                            Value::Object(default_map)
                        }
                    }
                    _ => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, loaded) => loaded,
    }
}
