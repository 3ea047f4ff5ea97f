// # Command Discovery
//
// Runs the discovery command configured for a target through `sh -c` and
// reads candidate addresses from its standard output, one per line.
//
// ## Failure Modes
//
// - The shell cannot be spawned → `Error::Discovery`
// - The command exits non-zero → `Error::Discovery` (stderr included)
//
// Both are non-fatal for the run: the engine skips the target.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::Error;
use crate::traits::AddressDiscovery;

/// Discovery through a shell command
#[derive(Debug, Clone, Default)]
pub struct CommandDiscovery {
    /// Directory the command runs in (process cwd when `None`)
    workdir: Option<PathBuf>,
}

impl CommandDiscovery {
    /// Run commands in the current working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
        }
    }

    /// Working directory, if any
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }
}

#[async_trait]
impl AddressDiscovery for CommandDiscovery {
    async fn candidates(&self, command: &str) -> Result<Vec<String>, Error> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::discovery(format!("Failed to run '{}': {}", command, e)))?;

        if !output.status.success() {
            return Err(Error::discovery(format!(
                "'{}' failed with {}: {}",
                command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let candidates = parse_candidates(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!("'{}' reported {} candidate(s)", command, candidates.len());
        Ok(candidates)
    }
}

/// Split discovery output into non-empty, trimmed candidate lines
pub fn parse_candidates(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
