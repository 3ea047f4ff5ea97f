//! Version control implementations
//!
//! This module provides implementations of the [`VersionControl`](crate::traits::VersionControl) trait.

pub mod disabled;
pub mod git;

pub use disabled::DisabledVcs;
pub use git::GitRepository;
