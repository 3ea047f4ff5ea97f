// # Version Control Trait
//
// Defines the interface used to publish patched host-mapping files.
//
// ## Implementations
//
// - Git: [`crate::vcs::GitRepository`]
// - Disabled: [`crate::vcs::DisabledVcs`]

use async_trait::async_trait;
use std::path::Path;

/// Trait for version control backends
///
/// The engine calls `sync()` once before a batch, `stage()` for every file
/// the rewriter reported as changed, and `publish()` once at the end of a
/// batch that changed at least one file.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Bring the working copy up to date before any file is touched
    async fn sync(&self) -> Result<(), crate::Error>;

    /// Stage a changed file
    async fn stage(&self, path: &Path) -> Result<(), crate::Error>;

    /// Commit staged files with `message` and push them
    ///
    /// Returns `false` when the backend published nothing.
    async fn publish(&self, message: &str) -> Result<bool, crate::Error>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
