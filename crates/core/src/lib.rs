//! Banner editor domain core.
//!
//! Pure, synchronous logic for the guided banner editor:
//!
//! - [`config`]: the banner configuration model and its validation rules.
//! - [`layout`]: column partitioning and content item operations.
//! - [`workflow`]: the step machine with its async generation guard.
//! - [`preview`]: deterministic render tree for a configuration.
//! - [`ai`], [`export`], [`persistence`]: boundary contracts for injected
//!   services.

pub mod ai;
pub mod config;
pub mod error;
pub mod export;
pub mod ids;
pub mod layout;
pub mod persistence;
pub mod preview;
pub mod types;
pub mod workflow;
