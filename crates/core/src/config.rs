// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration
//!
//! Loaded from TOML (`$TUB_CONFIG`, or `<config dir>/tub/tub.toml`), then
//! overridden by `TUB_*` environment variables. Every field has a default so
//! an empty file is valid; `validate` enforces the safety envelope.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::job::RunnerCommand;
use crate::session::{TargetBounds, HARD_MAX_F, HARD_MIN_F};

const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Bounds for the reporting interval handed back to the sensor
const MIN_REPORT_INTERVAL_SECS: u64 = 10;
const MAX_REPORT_INTERVAL_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("no service token configured (set api_token or TUB_API_TOKEN)")]
    MissingToken,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TubConfig {
    /// Root for session, job descriptors, readings, backups and logs
    pub state_dir: PathBuf,
    /// Address `tubd` binds
    pub listen: String,
    /// Base URL the cron runner calls back into
    pub base_url: String,
    /// Long-lived service credential for non-interactive callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub heat: HeatConfig,
    pub sensor: SensorConfig,
    pub equipment: EquipmentConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatConfig {
    /// Delay between scheduled checks
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,
    pub bounds: TargetBounds,
    pub heater_on_event: String,
    pub heater_off_event: String,
    /// Endpoint the runner calls for each scheduled check
    pub check_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Readings older than this count as missing
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Reporting interval suggested to the sensor while idle
    #[serde(with = "humantime_serde")]
    pub idle_interval: Duration,
    /// Reporting interval suggested while a session is active
    #[serde(with = "humantime_serde")]
    pub heating_interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esp32_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquipmentConfig {
    pub ifttt_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifttt_key: Option<String>,
    /// Log equipment events instead of firing them
    pub dry_run: bool,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Program cron invokes (the `tub` binary)
    pub program: PathBuf,
    /// Config file passed to the runner; defaults to the file this config came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Crontab backups to keep
    pub keep_backups: usize,
}

impl Default for TubConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            listen: "127.0.0.1:8480".to_string(),
            base_url: "http://127.0.0.1:8480".to_string(),
            api_token: None,
            heat: HeatConfig::default(),
            sensor: SensorConfig::default(),
            equipment: EquipmentConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(15 * 60),
            bounds: TargetBounds::default(),
            heater_on_event: "hot-tub-heat-on".to_string(),
            heater_off_event: "hot-tub-heat-off".to_string(),
            check_endpoint: "/api/heat-to-target/check".to_string(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30 * 60),
            idle_interval: Duration::from_secs(300),
            heating_interval: Duration::from_secs(60),
            esp32_api_key: None,
        }
    }
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            ifttt_base_url: "https://maker.ifttt.com".to_string(),
            ifttt_key: None,
            dry_run: false,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tub"),
            config_path: None,
            timeout: Duration::from_secs(30),
            keep_backups: 20,
        }
    }
}

impl TubConfig {
    /// Load from an explicit path, `$TUB_CONFIG`, or the default location,
    /// then apply environment overrides.
    ///
    /// A missing explicit or `$TUB_CONFIG` file is an error; a missing
    /// default file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let required = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("TUB_CONFIG").map(PathBuf::from));

        let (mut config, source) = match required {
            Some(path) if path.exists() => (Self::from_file(&path)?, Some(path)),
            Some(path) => return Err(ConfigError::NotFound(path)),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => (Self::from_file(&path)?, Some(path)),
                None => (Self::default(), None),
            },
        };

        if config.runner.config_path.is_none() {
            config.runner.config_path = source;
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `TUB_*` overrides from the given lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("TUB_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("TUB_BASE_URL") {
            self.base_url = url;
        }
        if let Some(listen) = lookup("TUB_LISTEN") {
            self.listen = listen;
        }
        if let Some(token) = lookup("TUB_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(key) = lookup("TUB_IFTTT_KEY") {
            self.equipment.ifttt_key = Some(key);
        }
        if let Some(key) = lookup("TUB_ESP32_API_KEY") {
            self.sensor.esp32_api_key = Some(key);
        }
        if let Some(flag) = lookup("TUB_DRY_RUN") {
            self.equipment.dry_run = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        if let Some(program) = lookup("TUB_RUNNER") {
            self.runner.program = PathBuf::from(program);
        }
    }

    /// Check the safety envelope and required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.heat.bounds;
        if !bounds.is_within_envelope() {
            return Err(ConfigError::Invalid(format!(
                "heat.bounds {}–{}°F must be an increasing range within {}–{}°F",
                bounds.min_f, bounds.max_f, HARD_MIN_F, HARD_MAX_F
            )));
        }
        let interval = self.heat.check_interval;
        if !(MIN_CHECK_INTERVAL..=MAX_CHECK_INTERVAL).contains(&interval) {
            return Err(ConfigError::Invalid(format!(
                "heat.check_interval {} must be between 1m and 1h",
                humantime_serde::re::humantime::format_duration(interval)
            )));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.heat.heater_on_event.trim().is_empty() || self.heat.heater_off_event.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "heat.heater_on_event and heat.heater_off_event must be set".to_string(),
            ));
        }
        if !self.equipment.dry_run && self.equipment.ifttt_key.is_none() {
            return Err(ConfigError::Invalid(
                "equipment.ifttt_key is required unless equipment.dry_run = true".to_string(),
            ));
        }
        Ok(())
    }

    /// The service credential, required by anything that calls the daemon
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken),
        }
    }

    /// Key the sensor authenticates with
    pub fn esp32_key(&self) -> Option<&str> {
        self.sensor
            .esp32_api_key
            .as_deref()
            .or(self.api_token.as_deref())
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let hide = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some("<redacted>".to_string());
            }
        };
        hide(&mut copy.api_token);
        hide(&mut copy.equipment.ifttt_key);
        hide(&mut copy.sensor.esp32_api_key);
        copy
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.log_dir().join("tubd.log")
    }

    pub fn runner_log_path(&self) -> PathBuf {
        self.log_dir().join("cron-runner.log")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.state_dir.join("tubd.pid")
    }

    pub fn reading_path(&self) -> PathBuf {
        self.state_dir.join("esp32-temperature.json")
    }

    pub fn equipment_status_path(&self) -> PathBuf {
        self.state_dir.join("equipment-status.json")
    }

    pub fn crontab_backup_dir(&self) -> PathBuf {
        self.state_dir.join("crontab-backups")
    }

    /// Command cron runs for each scheduled check
    pub fn runner_command(&self) -> RunnerCommand {
        RunnerCommand {
            program: self.runner.program.clone(),
            config_path: self.runner.config_path.clone(),
            state_dir: Some(self.state_dir.clone()),
            log_path: Some(self.runner_log_path()),
        }
    }

    /// Make every path the cron runner depends on absolute.
    ///
    /// Cron starts the runner in `$HOME` with a minimal `PATH`. Relative
    /// paths are joined to `cwd`; a bare program name is resolved with
    /// `find_program`, and an unresolvable one is an error.
    pub fn pin_runner_paths(
        &mut self,
        cwd: &Path,
        find_program: impl Fn(&Path) -> Option<PathBuf>,
    ) -> Result<(), ConfigError> {
        if self.state_dir.is_relative() {
            self.state_dir = cwd.join(&self.state_dir);
        }
        if let Some(path) = self.runner.config_path.take() {
            self.runner.config_path = Some(if path.is_relative() {
                cwd.join(path)
            } else {
                path
            });
        }

        let program = self.runner.program.clone();
        if program.is_relative() {
            self.runner.program = if program.components().count() > 1 {
                cwd.join(&program)
            } else {
                find_program(&program).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "runner.program {:?} not found; set it to an absolute path",
                        program
                    ))
                })?
            };
        }
        Ok(())
    }

    /// Reporting interval handed back to the sensor
    pub fn report_interval(&self, heating: bool) -> u64 {
        let interval = if heating {
            self.sensor.heating_interval
        } else {
            self.sensor.idle_interval
        };
        clamp_report_interval(interval.as_secs())
    }
}

/// First `dir/name` that is a file, in search order
pub fn locate_program(name: &Path, search: &[PathBuf]) -> Option<PathBuf> {
    search
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Clamp a sensor reporting interval to what the firmware accepts
pub fn clamp_report_interval(secs: u64) -> u64 {
    secs.clamp(MIN_REPORT_INTERVAL_SECS, MAX_REPORT_INTERVAL_SECS)
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("tub")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tub").join("tub.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
