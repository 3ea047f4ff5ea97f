// # Liveness Oracle Trait
//
// Defines the interface for deciding whether an address recorded in a
// host-mapping file still serves the virtual host it is recorded for.
//
// ## Implementations
//
// - HTTP probe: `hostpatch-probe-http` crate
//
// ## Usage
//
// ```rust,ignore
// use hostpatch_core::LivenessOracle;
//
// #[tokio::main]
// async fn main() {
//     let oracle = /* LivenessOracle implementation */;
//
//     if oracle.is_stale("10.0.0.1", "consul.example.com").await {
//         println!("address must be replaced");
//     }
// }
// ```

use async_trait::async_trait;

/// Trait for liveness oracle implementations
///
/// The oracle is consulted once per eligible line, sequentially. It never
/// fails: an address that cannot be reached is reported as stale.
///
/// # Forbidden Capabilities
///
/// - ❌ Retrying a failed probe (a failure is a definitive "stale")
/// - ❌ Touching the target file (owned by `Rewriter`)
#[async_trait]
pub trait LivenessOracle: Send + Sync {
    /// Whether `address` no longer serves `host` correctly
    ///
    /// # Returns
    ///
    /// - `true`: the address is unreachable or answered with a non-success status
    /// - `false`: the address currently serves `host`
    async fn is_stale(&self, address: &str, host: &str) -> bool;

    /// Get the oracle name (for logging/debugging)
    fn oracle_name(&self) -> &'static str;
}

/// Observer notified around every liveness check
///
/// Progress reporting is injected rather than printed so the rewriter stays
/// testable. Both callbacks default to no-ops.
pub trait ProbeObserver: Send + Sync {
    /// A liveness check for `address` is about to start
    fn probe_started(&self, _address: &str, _host: &str) {}

    /// A liveness check for `address` finished with the given verdict
    fn probe_finished(&self, _address: &str, _host: &str, _stale: bool) {}
}

/// The unit observer ignores all progress
impl ProbeObserver for () {}
