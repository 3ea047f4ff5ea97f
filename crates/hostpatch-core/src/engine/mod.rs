//! Core update engine
//!
//! The UpdateEngine is responsible for:
//! - Syncing the working copy before any file is touched
//! - Discovering a fresh address for every target
//! - Running the in-place rewriter against each target file
//! - Staging changed files and publishing the batch
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ AddressDiscovery │─── candidates ───┐
//! └──────────────────┘                  │
//!                                       ▼
//!                              ┌──────────────┐
//!                              │ UpdateEngine │
//!                              └──────────────┘
//!                                       │
//!         ┌─────────────────────────────┼───────────────────────────┐
//!         │                             │                           │
//!         ▼                             ▼                           ▼
//! ┌────────────────┐           ┌────────────────┐           ┌─────────────┐
//! │    Rewriter    │           │ VersionControl │           │   Events    │
//! │ (+ Liveness)   │           │ (stage/publish)│           │  (notify)   │
//! └────────────────┘           └────────────────┘           └─────────────┘
//! ```
//!
//! ## Error Policy
//!
//! - Discovery failures and non-address discovery output skip the target and
//!   the run continues
//! - I/O failures on a target file abort the run
//! - Version control failures abort the run
//! - Probe failures never surface: they count as stale addresses

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::rewrite::{AddressPattern, RewriteRules, Rewriter, ServiceMatchSet};
use crate::traits::{AddressDiscovery, LivenessOracle, ProbeObserver, VersionControl};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the UpdateEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run started
    Started {
        targets_count: usize,
    },

    /// Target skipped (discovery failed or reported no usable address)
    TargetSkipped {
        label: String,
        reason: String,
    },

    /// Liveness check started
    ProbeStarted {
        address: String,
        host: String,
    },

    /// Liveness check finished
    ProbeFinished {
        address: String,
        host: String,
        stale: bool,
    },

    /// At least one line of the file was replaced
    FileRewritten {
        label: String,
        path: PathBuf,
        new_address: String,
    },

    /// File content unchanged
    FileUnchanged {
        label: String,
        path: PathBuf,
    },

    /// Changed files committed and pushed
    Published {
        files_count: usize,
    },

    /// Run finished
    Finished {
        changed_count: usize,
    },
}

/// Outcome of a single run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files in which at least one line was replaced
    pub changed: Vec<PathBuf>,
    /// Files that were scanned and left as they were
    pub unchanged: Vec<PathBuf>,
    /// Labels of targets skipped because discovery produced no usable address
    pub skipped: Vec<String>,
    /// Whether the batch was committed and pushed (never with disabled VCS)
    pub published: bool,
}

impl RunSummary {
    /// Whether any file changed
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// A validated target ready for processing
struct PreparedTarget {
    label: String,
    discover_command: String,
    path: PathBuf,
    host: String,
    services: ServiceMatchSet,
}

/// Core update engine
///
/// One call to [`UpdateEngine::run()`] is one batch: every enabled target is
/// processed sequentially, one file at a time, and the batch is published
/// once at the end if anything changed.
pub struct UpdateEngine {
    /// Source of fresh addresses
    discovery: Box<dyn AddressDiscovery>,

    /// Liveness oracle used by the rewriter
    oracle: Box<dyn LivenessOracle>,

    /// Version control backend
    vcs: Box<dyn VersionControl>,

    /// Enabled targets, in configuration order
    targets: Vec<PreparedTarget>,

    /// Address shape shared by all targets
    pattern: AddressPattern,

    /// Pull before the batch
    sync_before_update: bool,

    /// Message of the batch commit
    commit_message: String,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateEngine {
    /// Create a new update engine
    ///
    /// # Parameters
    ///
    /// - `discovery`: Address discovery implementation
    /// - `oracle`: Liveness oracle implementation
    /// - `vcs`: Version control backend
    /// - `config`: Validated against [`UpdaterConfig::validate()`]
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        discovery: Box<dyn AddressDiscovery>,
        oracle: Box<dyn LivenessOracle>,
        vcs: Box<dyn VersionControl>,
        config: UpdaterConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let pattern = config.matching.address_pattern()?;

        let mut targets = Vec::new();
        for target in &config.targets {
            if !target.enabled {
                debug!("Target {} is disabled, skipping", target.label);
                continue;
            }

            targets.push(PreparedTarget {
                label: target.label.clone(),
                discover_command: target.discover_command.clone(),
                path: config.resolve_path(&target.file),
                host: target.host.clone(),
                services: config.service_set_for(target)?,
            });
        }

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            discovery,
            oracle,
            vcs,
            targets,
            pattern,
            sync_before_update: config.vcs.sync_before_update,
            commit_message: config.vcs.commit_message,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one batch over all enabled targets
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: Every target was processed or skipped
    /// - `Err(Error)`: Fatal error (target file I/O, version control, or an
    ///   error for which [`Error::is_fatal()`] holds from discovery)
    pub async fn run(&self) -> Result<RunSummary> {
        self.emit_event(EngineEvent::Started {
            targets_count: self.targets.len(),
        });

        if self.sync_before_update {
            info!("Syncing working copy ({})", self.vcs.backend_name());
            self.vcs.sync().await?;
        }

        let mut summary = RunSummary::default();

        for target in &self.targets {
            let Some(new_address) = self.discover(target).await? else {
                summary.skipped.push(target.label.clone());
                continue;
            };

            let changed = self.rewrite_target(target, &new_address).await?;

            if changed {
                info!("{} updated to {}", target.path.display(), new_address);
                self.vcs.stage(&target.path).await?;
                self.emit_event(EngineEvent::FileRewritten {
                    label: target.label.clone(),
                    path: target.path.clone(),
                    new_address,
                });
                summary.changed.push(target.path.clone());
            } else {
                info!("{} needs no change", target.path.display());
                self.emit_event(EngineEvent::FileUnchanged {
                    label: target.label.clone(),
                    path: target.path.clone(),
                });
                summary.unchanged.push(target.path.clone());
            }
        }

        if summary.has_changes() {
            info!(
                "Publishing {} changed file(s) ({})",
                summary.changed.len(),
                self.vcs.backend_name()
            );
            summary.published = self.vcs.publish(&self.commit_message).await?;
            if summary.published {
                self.emit_event(EngineEvent::Published {
                    files_count: summary.changed.len(),
                });
            }
        }

        self.emit_event(EngineEvent::Finished {
            changed_count: summary.changed.len(),
        });

        Ok(summary)
    }

    /// Replacement address for a target, or `None` when it must be skipped
    ///
    /// Only the first candidate is used, and it must be an address in its
    /// entirety. Fatal errors from the discovery backend abort the run.
    async fn discover(&self, target: &PreparedTarget) -> Result<Option<String>> {
        let reason = match self.discovery.candidates(&target.discover_command).await {
            Ok(candidates) => {
                // The full candidate set is informational only: every
                // eligible line is probed regardless of whether its address
                // is among the candidates.
                debug!("Target {} candidates: {:?}", target.label, candidates);
                match candidates.into_iter().next() {
                    Some(first) if self.pattern.matches_whole(&first) => return Ok(Some(first)),
                    Some(first) => format!(
                        "discovered '{}' does not match address pattern '{}'",
                        first,
                        self.pattern.as_str()
                    ),
                    None => "discovery reported no address".to_string(),
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e.to_string(),
        };

        error!("Skipping target {}: {}", target.label, reason);
        self.emit_event(EngineEvent::TargetSkipped {
            label: target.label.clone(),
            reason,
        });
        Ok(None)
    }

    /// Rewrite one target file in place
    async fn rewrite_target(&self, target: &PreparedTarget, new_address: &str) -> Result<bool> {
        let mut file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&target.path)
            .await
            .map_err(|e| Error::rewrite(&target.path, e))?;

        let rules = RewriteRules {
            services: &target.services,
            pattern: &self.pattern,
            new_address,
            virtual_host: &target.host,
        };
        let observer = EventObserver { engine: self };

        Rewriter::new(self.oracle.as_ref())
            .with_observer(&observer)
            .rewrite(&mut file, &rules)
            .await
            .map_err(|e| Error::rewrite(&target.path, e))
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging warning if channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Forwards rewriter probe progress as engine events and log lines
struct EventObserver<'a> {
    engine: &'a UpdateEngine,
}

impl ProbeObserver for EventObserver<'_> {
    fn probe_started(&self, address: &str, host: &str) {
        info!(
            "Checking whether {} still serves {} ({})",
            address,
            host,
            self.engine.oracle.oracle_name()
        );
        self.engine.emit_event(EngineEvent::ProbeStarted {
            address: address.to_string(),
            host: host.to_string(),
        });
    }

    fn probe_finished(&self, address: &str, host: &str, stale: bool) {
        info!("{} for {}: stale = {}", address, host, stale);
        self.engine.emit_event(EngineEvent::ProbeFinished {
            address: address.to_string(),
            host: host.to_string(),
            stale,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_has_changes() {
        let mut summary = RunSummary::default();
        assert!(!summary.has_changes());

        summary.changed.push(PathBuf::from("dev/hosts"));
        assert!(summary.has_changes());
    }

    #[test]
    fn test_engine_event_clone_eq() {
        let event = EngineEvent::ProbeFinished {
            address: "10.0.0.1".to_string(),
            host: "consul.example.com".to_string(),
            stale: true,
        };
        assert_eq!(event.clone(), event);
    }
}
