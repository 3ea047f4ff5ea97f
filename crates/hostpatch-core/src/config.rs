//! Configuration types for the hostpatch system
//!
//! This module defines all configuration structures used throughout the crate.
//! The legacy layout (`{"data": [{"Env", "GetIpCmd", "FileName", "Host"}]}`)
//! is accepted through serde aliases.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rewrite::{AddressPattern, DEFAULT_ADDRESS_PATTERN, ServiceMatchSet};

/// Service labels tracked when neither the target nor `matching` names any
pub const DEFAULT_SERVICES: &[&str] = &["consul", "apollo", "kibana", "rabbitmq", "jenkins", "log"];

/// Main hostpatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Host-mapping files to maintain
    #[serde(alias = "data")]
    pub targets: Vec<TargetConfig>,

    /// Line matching settings
    #[serde(default)]
    pub matching: MatchConfig,

    /// Liveness probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Version control settings
    #[serde(default)]
    pub vcs: VcsConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Directory relative target paths (and VCS commands) are resolved against
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

impl UpdaterConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            matching: MatchConfig::default(),
            probe: ProbeConfig::default(),
            vcs: VcsConfig::default(),
            engine: EngineConfig::default(),
            workdir: None,
        }
    }

    /// Parse a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            crate::Error::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Add a target
    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.targets.push(target);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.targets.is_empty() {
            return Err(crate::Error::config("No targets configured"));
        }

        for target in &self.targets {
            target.validate()?;
            self.service_set_for(target)?;
        }

        self.matching.validate()?;
        self.probe.validate()?;
        self.vcs.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }

    /// Service match set for a target (its own labels, else the global list)
    pub fn service_set_for(&self, target: &TargetConfig) -> Result<ServiceMatchSet, crate::Error> {
        let labels = target
            .services
            .as_deref()
            .unwrap_or(self.matching.services.as_slice());

        ServiceMatchSet::new(labels.iter().cloned()).map_err(|e| {
            crate::Error::config(format!("Target '{}': {}", target.label, e))
        })
    }

    /// Resolve a target path against `workdir`
    pub fn resolve_path(&self, file: &Path) -> PathBuf {
        match &self.workdir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One host-mapping file and how to refresh it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Free-form label (e.g., the environment name)
    #[serde(alias = "Env", default)]
    pub label: String,

    /// Shell command printing candidate addresses, one per line
    #[serde(alias = "GetIpCmd")]
    pub discover_command: String,

    /// Host-mapping file to patch
    #[serde(alias = "FileName")]
    pub file: PathBuf,

    /// Virtual host the liveness probe validates addresses against
    #[serde(alias = "Host")]
    pub host: String,

    /// Service labels for this target (defaults to `matching.services`)
    #[serde(default)]
    pub services: Option<Vec<String>>,

    /// Whether this target is processed
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl TargetConfig {
    /// Create a new target configuration
    pub fn new(
        label: impl Into<String>,
        discover_command: impl Into<String>,
        file: impl Into<PathBuf>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            discover_command: discover_command.into(),
            file: file.into(),
            host: host.into(),
            services: None,
            enabled: true,
        }
    }

    /// Track these labels instead of the global list
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(services.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable the target
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate the target configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.discover_command.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Target '{}': discovery command cannot be empty",
                self.label
            )));
        }
        if self.file.as_os_str().is_empty() {
            return Err(crate::Error::config(format!(
                "Target '{}': file cannot be empty",
                self.label
            )));
        }
        if self.host.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Target '{}': host cannot be empty",
                self.label
            )));
        }
        Ok(())
    }
}

/// Line matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Default service labels
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Regular expression locating the address in an eligible line
    #[serde(default = "default_address_pattern")]
    pub address_pattern: String,
}

impl MatchConfig {
    /// Compile the configured address pattern
    pub fn address_pattern(&self) -> Result<AddressPattern, crate::Error> {
        AddressPattern::new(&self.address_pattern)
    }

    /// Validate the matching configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.address_pattern().map(|_| ())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            address_pattern: default_address_pattern(),
        }
    }
}

/// Liveness probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Timeout of a single probe (in seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProbeConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Probe timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Version control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    /// Whether changed files are staged, committed and pushed
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Pull before any file is touched
    #[serde(default = "default_enabled")]
    pub sync_before_update: bool,

    /// Message of the batch commit
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl VcsConfig {
    /// Validate the version control configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.enabled && self.commit_message.trim().is_empty() {
            return Err(crate::Error::config("Commit message cannot be empty"));
        }
        Ok(())
    }
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_before_update: true,
            commit_message: default_commit_message(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_services() -> Vec<String> {
    DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_address_pattern() -> String {
    DEFAULT_ADDRESS_PATTERN.to_string()
}

fn default_probe_timeout_secs() -> u64 {
    15
}

fn default_commit_message() -> String {
    "auto update".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
