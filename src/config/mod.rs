//! Configuration system for RocketRAM

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::monitor::alert::AlertConfig;
use crate::monitor::sampler::QueryTimeouts;
use crate::notify::Urgency;

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub sampling: SamplingConfig,
    pub alerts: AlertsConfig,
    pub notifications: NotificationsConfig,
    pub network: NetworkConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rocketram").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let alerts = &self.alerts;
        for (name, value) in [
            ("alerts.cpu_threshold", alerts.cpu_threshold),
            ("alerts.ram_threshold", alerts.ram_threshold),
            ("alerts.disk_threshold", alerts.disk_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                anyhow::bail!("{} must be between 0 and 100, got {}", name, value);
            }
        }
        if self.sampling.primary_interval_ms == 0 || self.sampling.disk_interval_ms == 0 {
            anyhow::bail!("sampling intervals must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "tokyo-night".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    pub primary_interval_ms: u64,
    pub disk_interval_ms: u64,
    pub timeouts: QueryTimeouts,
}

impl SamplingConfig {
    pub fn primary_interval(&self) -> Duration {
        Duration::from_millis(self.primary_interval_ms)
    }

    pub fn disk_interval(&self) -> Duration {
        Duration::from_millis(self.disk_interval_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            primary_interval_ms: 1000,
            disk_interval_ms: 5000,
            timeouts: QueryTimeouts::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    /// Percent CPU usage.
    pub cpu_threshold: f32,
    /// Percent RAM usage.
    pub ram_threshold: f32,
    /// Percent of the system drive left free.
    pub disk_threshold: f32,
    pub duration_secs: u64,
}

impl AlertsConfig {
    pub fn to_alert_config(&self) -> AlertConfig {
        AlertConfig {
            enabled: self.enabled,
            cpu_threshold: self.cpu_threshold,
            ram_threshold: self.ram_threshold,
            disk_free_threshold: self.disk_threshold,
            duration: Duration::from_secs(self.duration_secs),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cpu_threshold: 90.0,
            ram_threshold: 85.0,
            disk_threshold: 10.0,
            duration_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationsConfig {
    pub desktop: bool,
    pub urgency: Urgency,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            urgency: Urgency::Critical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Sample this interface instead of the busiest one.
    pub interface: Option<String>,
}

/// Write a default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save(path)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Re-reads the config file whenever its modification time changes.
pub struct ConfigWatcher {
    path: Option<PathBuf>,
    current: Config,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: Option<PathBuf>, initial: Config) -> Self {
        let last_modified = path.as_deref().and_then(modified_at);
        Self {
            path,
            current: initial,
            last_modified,
        }
    }

    pub fn current(&self) -> &Config {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Config {
        &mut self.current
    }

    /// Pick up edits made since the last call.
    ///
    /// A file that fails to parse is reported and the previous
    /// configuration stays in place; the next edit is retried.
    pub fn refresh(&mut self) -> Result<&Config> {
        let Some(path) = self.path.as_deref() else {
            return Ok(&self.current);
        };
        let modified = modified_at(path);
        if modified.is_none() || modified == self.last_modified {
            return Ok(&self.current);
        }

        self.last_modified = modified;
        let reloaded = Config::load(path)?;
        if reloaded != self.current {
            tracing::info!(path = %path.display(), "configuration reloaded");
        }
        self.current = reloaded;
        Ok(&self.current)
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_with_mtime(path: &Path, content: &str, secs: u64) {
        std::fs::write(path, content).unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [alerts]
            cpu_threshold = 75
            duration_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.alerts.cpu_threshold, 75.0);
        assert_eq!(config.alerts.ram_threshold, 85.0);
        assert_eq!(config.sampling, SamplingConfig::default());

        let alert = config.alerts.to_alert_config();
        assert_eq!(alert.duration, Duration::from_secs(10));
        assert_eq!(alert.disk_free_threshold, 10.0);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.network.interface = Some("eth0".into());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.alerts.ram_threshold = 140.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.ram_threshold"));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, false).unwrap();
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn watcher_reloads_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        write_with_mtime(&path, "[alerts]\nenabled = true\n", 1_000);

        let initial = Config::load(&path).unwrap();
        let mut watcher = ConfigWatcher::new(Some(path.clone()), initial);
        assert!(watcher.refresh().unwrap().alerts.enabled);

        write_with_mtime(&path, "[alerts]\nenabled = false\n", 2_000);
        assert!(!watcher.refresh().unwrap().alerts.enabled);
    }

    #[test]
    fn watcher_keeps_last_good_config_on_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        write_with_mtime(&path, "[alerts]\ncpu_threshold = 70\n", 1_000);

        let mut watcher = ConfigWatcher::new(Some(path.clone()), Config::load(&path).unwrap());

        write_with_mtime(&path, "[alerts\n", 2_000);
        assert!(watcher.refresh().is_err());
        assert_eq!(watcher.current().alerts.cpu_threshold, 70.0);

        // unchanged file is not re-parsed
        assert!(watcher.refresh().is_ok());
    }

    #[test]
    fn watcher_without_file_uses_initial() {
        let mut watcher = ConfigWatcher::new(None, Config::default());
        assert_eq!(watcher.refresh().unwrap(), &Config::default());
    }
}
