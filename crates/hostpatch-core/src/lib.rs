// # hostpatch-core
//
// Core library for keeping host-mapping files pointed at live addresses.
//
// ## Architecture Overview
//
// This library provides the building blocks of a single update pass:
// - **LivenessOracle**: Trait answering whether an address still serves a host
// - **AddressDiscovery**: Trait producing fresh candidate addresses
// - **VersionControl**: Trait for syncing, staging and publishing patched files
// - **Rewriter**: Streaming, in-place line rewriter for a single target file
// - **UpdateEngine**: Orchestrates discovery → rewrite → staging for every target
//
// ## Design Principles
//
// 1. **Streaming**: Target files are never loaded fully into memory
// 2. **Reader ahead of writer**: In-place writes never clobber unread bytes
// 3. **Exact length**: Files are truncated to their final content length
// 4. **Library-First**: The binary is a thin wiring layer over this crate

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod rewrite;
pub mod traits;
pub mod vcs;

// Re-export core types for convenience
pub use config::{TargetConfig, UpdaterConfig};
pub use discovery::CommandDiscovery;
pub use engine::{EngineEvent, RunSummary, UpdateEngine};
pub use error::{Error, Result};
pub use rewrite::{AddressPattern, RewriteRules, Rewriter, ServiceMatchSet};
pub use traits::{AddressDiscovery, LivenessOracle, ProbeObserver, RewriteTarget, VersionControl};
pub use vcs::{DisabledVcs, GitRepository};
