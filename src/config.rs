//! Cache configuration.
//!
//! [`CacheConfig`] is the programmatic configuration passed to
//! [`TranslationCacheBuilder::config()`](crate::TranslationCacheBuilder::config).
//! With the `cli` feature, [`ConfigFile`] loads the same settings from TOML
//! with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `<user config dir>/mocache/config.toml`
//! 3. `/etc/mocache/config.toml`
//!
//! If none exists, defaults apply.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::providers::OverridePolicy;
use crate::{MocacheError, Result};

/// Environment variable overriding the snapshot directory.
pub const SNAPSHOT_DIR_ENV: &str = "MOCACHE_DIR";

/// Configuration for translation caches.
///
/// ```rust
/// # use mocache::{CacheConfig, OverridePolicy};
/// let config = CacheConfig::new()
///     .snapshot_dir("/var/cache/mocache")
///     .installation("shop-eu")
///     .override_policy(OverridePolicy::FallThrough);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding snapshot files. Default: `$MOCACHE_DIR`, else
    /// `<system temp dir>/mocache`.
    pub snapshot_dir: Option<PathBuf>,
    /// Installation identity mixed into snapshot file names, so several
    /// installations sharing one directory never collide. Default: `"default"`.
    pub installation: String,
    /// Treatment of identity answers from the override chain.
    pub override_policy: OverridePolicy,
    /// Write an empty snapshot when none exists and nothing was cached, so
    /// later starts find a snapshot. Default: `true`.
    pub write_empty_snapshot: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            installation: "default".to_string(),
            override_policy: OverridePolicy::default(),
            write_empty_snapshot: true,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot directory.
    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Set the installation identity.
    pub fn installation(mut self, installation: impl Into<String>) -> Self {
        self.installation = installation.into();
        self
    }

    /// Set the override policy.
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    /// Enable or disable the empty-snapshot marker.
    pub fn write_empty_snapshot(mut self, enabled: bool) -> Self {
        self.write_empty_snapshot = enabled;
        self
    }

    /// Resolve the snapshot directory and create it if absent.
    pub fn resolve_snapshot_dir(&self) -> Result<PathBuf> {
        let dir = snapshot_dir_from(
            self.snapshot_dir.as_deref(),
            std::env::var_os(SNAPSHOT_DIR_ENV),
        );
        std::fs::create_dir_all(&dir).map_err(|e| {
            MocacheError::Configuration(format!(
                "failed to create snapshot dir {}: {e}",
                dir.display()
            ))
        })?;
        Ok(dir)
    }
}

/// Explicit directory, then the environment value, then the temp dir.
fn snapshot_dir_from(explicit: Option<&Path>, env: Option<OsString>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("mocache"),
    }
}

/// On-disk configuration file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub cache: CacheConfig,
}

#[cfg(feature = "cli")]
impl ConfigFile {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist; otherwise a missing file means defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_path(explicit_path)? else {
            return Ok(Self::default());
        };
        Self::load_from_file(&path)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MocacheError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MocacheError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MocacheError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mocache").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/mocache/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.snapshot_dir, None);
        assert_eq!(config.installation, "default");
        assert_eq!(config.override_policy, OverridePolicy::FallThrough);
        assert!(config.write_empty_snapshot);
    }

    #[test]
    fn builder_setters() {
        let config = CacheConfig::new()
            .snapshot_dir("/tmp/x")
            .installation("staging")
            .override_policy(OverridePolicy::TrustIdentity)
            .write_empty_snapshot(false);
        assert_eq!(config.snapshot_dir.as_deref(), Some(Path::new("/tmp/x")));
        assert_eq!(config.installation, "staging");
        assert_eq!(config.override_policy, OverridePolicy::TrustIdentity);
        assert!(!config.write_empty_snapshot);
    }

    #[test]
    fn explicit_dir_wins_over_env() {
        let dir = snapshot_dir_from(Some(Path::new("/explicit")), Some("/from-env".into()));
        assert_eq!(dir, PathBuf::from("/explicit"));
    }

    #[test]
    fn env_dir_used_when_no_explicit() {
        let dir = snapshot_dir_from(None, Some("/from-env".into()));
        assert_eq!(dir, PathBuf::from("/from-env"));
    }

    #[test]
    fn falls_back_to_temp_dir() {
        assert_eq!(
            snapshot_dir_from(None, None),
            std::env::temp_dir().join("mocache")
        );
        assert_eq!(
            snapshot_dir_from(None, Some(OsString::new())),
            std::env::temp_dir().join("mocache")
        );
    }

    #[test]
    fn resolve_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = CacheConfig::new().snapshot_dir(&nested);
        assert_eq!(config.resolve_snapshot_dir().unwrap(), nested);
        assert!(nested.is_dir());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"installation": "eu", "override_policy": "trust_identity"}"#)
                .unwrap();
        assert_eq!(config.installation, "eu");
        assert_eq!(config.override_policy, OverridePolicy::TrustIdentity);
        assert!(config.write_empty_snapshot);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[cache]\nsnapshot_dir = \"/var/cache/mocache\"\nwrite_empty_snapshot = false\n",
        )
        .unwrap();
        let file = ConfigFile::load(Some(&path)).unwrap();
        assert_eq!(
            file.cache.snapshot_dir.as_deref(),
            Some(Path::new("/var/cache/mocache"))
        );
        assert!(!file.cache.write_empty_snapshot);
        assert_eq!(file.cache.installation, "default");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn explicit_missing_file_is_error() {
        let err = ConfigFile::load(Some(Path::new("/nonexistent/mocache.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
