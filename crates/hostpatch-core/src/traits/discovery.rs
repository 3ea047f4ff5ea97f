// # Address Discovery Trait
//
// Defines the interface for obtaining fresh candidate addresses for a target.
//
// ## Implementations
//
// - Shell command: [`crate::discovery::CommandDiscovery`]

use async_trait::async_trait;

/// Trait for address discovery implementations
///
/// A discovery source runs the configured command for a target and reports
/// the candidate addresses it printed, in order. The first candidate becomes
/// the replacement address for stale lines.
#[async_trait]
pub trait AddressDiscovery: Send + Sync {
    /// Discover candidate addresses
    ///
    /// # Parameters
    ///
    /// - `command`: The discovery command configured for the target
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Non-empty, trimmed candidates (possibly none)
    /// - `Err(Error::Discovery)`: The command could not be run or failed
    async fn candidates(&self, command: &str) -> Result<Vec<String>, crate::Error>;
}
