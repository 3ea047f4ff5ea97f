//! Core traits for the hostpatch system
//!
//! This module defines the abstract interfaces the update pass is built on.
//!
//! - [`LivenessOracle`]: Decide whether a recorded address is stale
//! - [`ProbeObserver`]: Receive progress of liveness checks
//! - [`AddressDiscovery`]: Produce fresh candidate addresses
//! - [`VersionControl`]: Sync, stage and publish patched files
//! - [`RewriteTarget`]: Seekable, truncatable handle the rewriter mutates

pub mod discovery;
pub mod liveness;
pub mod target;
pub mod vcs;

pub use discovery::AddressDiscovery;
pub use liveness::{LivenessOracle, ProbeObserver};
pub use target::RewriteTarget;
pub use vcs::VersionControl;
