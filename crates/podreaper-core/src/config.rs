//! Reaper configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, a TOML file,
//! `PODREAPER_*` environment variables. CLI flags are layered on top by the
//! binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    AutoDeleteWindow, DEFAULT_EXPIRY_ANNOTATION, DEFAULT_WINDOW_TOLERANCE, NamespaceSelector,
};

pub const DEFAULT_AUTO_DELETE_TIME: &str = "23:00";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_NAMESPACE_LABEL: &str = "podreaper.io/managed=true";
pub const DEFAULT_NAMESPACE_PREFIX: &str = "user-";

/// Prefix of every environment variable read by `apply_env`.
pub const ENV_PREFIX: &str = "PODREAPER_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    /// Turn the daily window policy off entirely. TTL expiry still applies.
    pub auto_delete_enabled: bool,

    /// Daily window start, `HH:MM` in `timezone`.
    pub auto_delete_time: String,

    /// IANA timezone name. Unknown names fall back to UTC.
    pub timezone: String,

    pub window_tolerance_secs: u64,

    /// Period of the continuous loop. Must not exceed the window tolerance.
    pub poll_interval_secs: u64,

    /// `key=value` label that marks managed namespaces.
    pub namespace_label: String,
    pub namespace_prefix: String,

    pub expiry_annotation: String,

    /// Evaluate and report, but never delete.
    pub dry_run: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            auto_delete_enabled: true,
            auto_delete_time: DEFAULT_AUTO_DELETE_TIME.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            window_tolerance_secs: DEFAULT_WINDOW_TOLERANCE.as_secs(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            namespace_label: DEFAULT_NAMESPACE_LABEL.to_string(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            expiry_annotation: DEFAULT_EXPIRY_ANNOTATION.to_string(),
            dry_run: false,
        }
    }
}

impl ReaperConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay `PODREAPER_*` variables. `lookup` is `std::env::var` in
    /// production and a map in tests. Empty values are ignored.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        };

        if let Some((key, v)) = get("AUTO_DELETE_ENABLED") {
            self.auto_delete_enabled = parse_bool(&key, &v)?;
        }
        if let Some((_, v)) = get("AUTO_DELETE_TIME") {
            self.auto_delete_time = v;
        }
        if let Some((_, v)) = get("TIMEZONE") {
            self.timezone = v;
        }
        if let Some((key, v)) = get("WINDOW_TOLERANCE_SECS") {
            self.window_tolerance_secs = parse_secs(&key, &v)?;
        }
        if let Some((key, v)) = get("POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_secs(&key, &v)?;
        }
        if let Some((_, v)) = get("NAMESPACE_LABEL") {
            self.namespace_label = v;
        }
        if let Some((_, v)) = get("NAMESPACE_PREFIX") {
            self.namespace_prefix = v;
        }
        if let Some((_, v)) = get("EXPIRY_ANNOTATION") {
            self.expiry_annotation = v;
        }
        if let Some((key, v)) = get("DRY_RUN") {
            self.dry_run = parse_bool(&key, &v)?;
        }
        Ok(self)
    }

    /// Resolve the configured zone, falling back to UTC with a warning.
    pub fn timezone(&self) -> Tz {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(e) => {
                warn!(timezone = %self.timezone, error = %e, "unknown timezone, falling back to UTC");
                Tz::UTC
            }
        }
    }

    pub fn window_tolerance(&self) -> Duration {
        Duration::from_secs(self.window_tolerance_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn namespace_selector(&self) -> NamespaceSelector {
        NamespaceSelector::from_label(&self.namespace_label, self.namespace_prefix.clone())
    }

    /// `None` when the window policy is disabled.
    pub fn auto_delete_window(&self) -> Option<AutoDeleteWindow<Tz>> {
        self.auto_delete_enabled.then(|| {
            AutoDeleteWindow::new(
                self.auto_delete_time.clone(),
                self.timezone(),
                self.window_tolerance(),
            )
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_reasonable() {
        let c = ReaperConfig::default();
        assert_eq!(c.auto_delete_time, "23:00");
        assert_eq!(c.timezone(), Tz::UTC);
        assert_eq!(c.window_tolerance(), Duration::from_secs(120));
        assert!(c.poll_interval() <= c.window_tolerance());
        assert!(c.auto_delete_window().is_some());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ReaperConfig::from_toml_str(
            r#"
            auto_delete_time = "02:30"
            timezone = "Asia/Shanghai"
            "#,
        )
        .unwrap();
        assert_eq!(c.auto_delete_time, "02:30");
        assert_eq!(c.timezone(), chrono_tz::Asia::Shanghai);
        assert_eq!(c.namespace_prefix, DEFAULT_NAMESPACE_PREFIX);
    }

    #[test]
    fn unknown_toml_type_is_a_parse_error() {
        let err = ReaperConfig::from_toml_str("poll_interval_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_file() {
        let c = ReaperConfig::default()
            .apply_env(env(&[
                ("PODREAPER_AUTO_DELETE_TIME", "01:15"),
                ("PODREAPER_DRY_RUN", "yes"),
                ("PODREAPER_POLL_INTERVAL_SECS", "30"),
                ("PODREAPER_NAMESPACE_PREFIX", ""),
            ]))
            .unwrap();
        assert_eq!(c.auto_delete_time, "01:15");
        assert!(c.dry_run);
        assert_eq!(c.poll_interval_secs, 30);
        // empty values are ignored
        assert_eq!(c.namespace_prefix, DEFAULT_NAMESPACE_PREFIX);
    }

    #[test]
    fn bad_env_number_is_rejected() {
        let err = ReaperConfig::default()
            .apply_env(env(&[("PODREAPER_WINDOW_TOLERANCE_SECS", "two")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == "PODREAPER_WINDOW_TOLERANCE_SECS"
        ));
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let c = ReaperConfig {
            timezone: "Mars/Olympus_Mons".into(),
            ..ReaperConfig::default()
        };
        assert_eq!(c.timezone(), Tz::UTC);
    }

    #[test]
    fn disabled_window_yields_none() {
        let c = ReaperConfig {
            auto_delete_enabled: false,
            ..ReaperConfig::default()
        };
        assert!(c.auto_delete_window().is_none());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace_label = \"tenant=yes\"").unwrap();
        let c = ReaperConfig::from_file(file.path()).unwrap();
        assert_eq!(c.namespace_selector().label_selector(), "tenant=yes");
    }

    #[test]
    fn shipped_example_parses() {
        let c = ReaperConfig::from_toml_str(include_str!("../../../podreaper.example.toml"))
            .unwrap();
        assert_eq!(c.timezone(), chrono_tz::Asia::Shanghai);
        assert!(c.poll_interval() <= c.window_tolerance());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ReaperConfig::from_file(Path::new("/nonexistent/podreaper.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
