// # hostpatchd - one-shot host-mapping updater
//
// This binary is a THIN integration layer. All update logic lives in
// hostpatch-core; this file only:
// 1. Reads settings from environment variables
// 2. Loads and validates the JSON configuration
// 3. Wires discovery, the HTTP oracle and version control into the engine
// 4. Runs one batch and maps the outcome to an exit code
//
// ## Configuration
//
// - `HOSTPATCH_CONFIG`: Path to the JSON configuration (default: `config.json`)
// - `HOSTPATCH_WORKDIR`: Overrides `workdir` from the configuration
// - `HOSTPATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `HOSTPATCH_NO_VCS`: `1` or `true` disables pull/commit/push
//
// ## Example
//
// ```bash
// export HOSTPATCH_CONFIG=/srv/hosts-repo/updater/config.json
// export HOSTPATCH_WORKDIR=/srv/hosts-repo
//
// hostpatchd
// ```

use anyhow::{Context, Result};
use hostpatch_core::traits::VersionControl;
use hostpatch_core::{CommandDiscovery, DisabledVcs, GitRepository, UpdateEngine, UpdaterConfig};
use hostpatch_probe_http::HttpLivenessOracle;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Batch finished (with or without changes)
/// - 1: Configuration or startup error
/// - 2: Runtime error (target file I/O, version control)
#[derive(Debug, Clone, Copy)]
enum HostpatchExitCode {
    /// Batch finished
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Fatal error during the batch
    RuntimeError = 2,
}

impl From<HostpatchExitCode> for ExitCode {
    fn from(code: HostpatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings read from the environment
struct Settings {
    config_path: PathBuf,
    workdir: Option<PathBuf>,
    log_level: String,
    no_vcs: bool,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Self {
        Self {
            config_path: env::var("HOSTPATCH_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config.json")),
            workdir: env::var("HOSTPATCH_WORKDIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            log_level: env::var("HOSTPATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            no_vcs: env::var("HOSTPATCH_NO_VCS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Tracing level for `log_level`
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "HOSTPATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Load the configuration file and apply environment overrides
    fn load_config(&self) -> Result<UpdaterConfig> {
        let mut config = UpdaterConfig::from_file(&self.config_path)?;

        if let Some(dir) = &self.workdir {
            config.workdir = Some(dir.clone());
        }
        if self.no_vcs {
            config.vcs.enabled = false;
        }

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", self.config_path.display()))?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    let log_level = match settings.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HostpatchExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HostpatchExitCode::ConfigError.into();
    }

    let config = match settings.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return HostpatchExitCode::ConfigError.into();
        }
    };

    info!("Configuration loaded: {} target(s)", config.targets.len());

    // One file at a time, no internal parallelism
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HostpatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Wire the components and run one batch
async fn run(config: UpdaterConfig) -> HostpatchExitCode {
    let workdir = config.workdir.clone().unwrap_or_else(|| PathBuf::from("."));

    let oracle = match HttpLivenessOracle::from_config(&config.probe) {
        Ok(oracle) => oracle,
        Err(e) => {
            error!("Failed to create liveness oracle: {}", e);
            return HostpatchExitCode::ConfigError;
        }
    };

    let vcs: Box<dyn VersionControl> = if config.vcs.enabled {
        Box::new(GitRepository::new(&workdir))
    } else {
        info!("Version control disabled");
        Box::new(DisabledVcs)
    };

    let (engine, event_rx) = match UpdateEngine::new(
        Box::new(CommandDiscovery::in_dir(&workdir)),
        Box::new(oracle),
        vcs,
        config,
    ) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return HostpatchExitCode::ConfigError;
        }
    };

    let events = tokio::spawn(async move {
        let mut stream = ReceiverStream::new(event_rx);
        while let Some(event) = stream.next().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let result = engine.run().await;

    // Closing the channel ends the drain task
    drop(engine);
    let _ = events.await;

    match result {
        Ok(summary) => {
            info!(
                "Batch finished: {} changed, {} unchanged, {} skipped{}",
                summary.changed.len(),
                summary.unchanged.len(),
                summary.skipped.len(),
                if summary.published { ", published" } else { "" }
            );
            HostpatchExitCode::Success
        }
        Err(e) => {
            error!("Batch aborted: {}", e);
            HostpatchExitCode::RuntimeError
        }
    }
}
