// # Disabled Version Control
//
// Backend used when patched files are not published. Every operation
// succeeds without side effects, and `publish()` reports that nothing was
// published.

use async_trait::async_trait;
use std::path::Path;

use crate::Error;
use crate::traits::VersionControl;

/// No-op version control backend
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVcs;

#[async_trait]
impl VersionControl for DisabledVcs {
    async fn sync(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<(), Error> {
        tracing::debug!("Version control disabled, not staging {}", path.display());
        Ok(())
    }

    async fn publish(&self, _message: &str) -> Result<bool, Error> {
        tracing::debug!("Version control disabled, not publishing");
        Ok(false)
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reports_nothing_published() {
        let vcs = DisabledVcs;
        vcs.sync().await.unwrap();
        vcs.stage(Path::new("hosts")).await.unwrap();
        assert!(!vcs.publish("auto update").await.unwrap());
        assert_eq!(vcs.backend_name(), "disabled");
    }
}
