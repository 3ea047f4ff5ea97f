//! Address discovery implementations
//!
//! This module provides the built-in [`AddressDiscovery`](crate::traits::AddressDiscovery)
//! implementation.

pub mod command;

pub use command::{CommandDiscovery, parse_candidates};
