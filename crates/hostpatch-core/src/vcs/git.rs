// # Git Version Control
//
// Publishes patched files through the `git` command line:
//
// - `sync()`    → `git pull`
// - `stage()`   → `git add <path>`
// - `publish()` → `git commit -m <message>` followed by `git push`
//
// Every command runs in the repository directory. Any failure is returned
// as `Error::Vcs` with the command and its combined output, and aborts the
// run: a half-published batch must not go unnoticed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::Error;
use crate::traits::VersionControl;

/// Git working copy
#[derive(Debug, Clone)]
pub struct GitRepository {
    dir: PathBuf,
}

impl GitRepository {
    /// Use the working copy at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Repository directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `git <args>` in the repository, returning its combined output
    async fn git(&self, args: &[&str]) -> Result<String, Error> {
        let rendered = format!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::vcs(format!("Failed to run '{}': {}", rendered, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_string();

        if !output.status.success() {
            return Err(Error::vcs(format!(
                "'{}' failed with {}: {}",
                rendered, output.status, combined
            )));
        }

        if !combined.is_empty() {
            tracing::info!("{}: {}", rendered, combined);
        }
        Ok(combined)
    }
}

#[async_trait]
impl VersionControl for GitRepository {
    async fn sync(&self) -> Result<(), Error> {
        self.git(&["pull"]).await.map(|_| ())
    }

    async fn stage(&self, path: &Path) -> Result<(), Error> {
        let path = path.to_string_lossy();
        self.git(&["add", "--", path.as_ref()]).await.map(|_| ())
    }

    async fn publish(&self, message: &str) -> Result<bool, Error> {
        self.git(&["commit", "-m", message]).await?;
        self.git(&["push"]).await.map(|_| true)
    }

    fn backend_name(&self) -> &'static str {
        "git"
    }
}
