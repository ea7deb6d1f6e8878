//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept any [`DocumentStore`](banner_core::persistence::DocumentStore)
//! as the first argument.

pub mod banner_repo;

pub use banner_repo::{BannerPage, BannerRepo};
