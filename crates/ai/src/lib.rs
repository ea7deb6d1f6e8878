//! HTTP client for the banner backend.
//!
//! Provides [`BannerApiClient`], the `reqwest`-based implementation of the
//! core [`AiService`](banner_core::ai::AiService) and
//! [`ExportService`](banner_core::export::ExportService) contracts, and
//! [`AiClientConfig`] for loading its settings from the environment.

pub mod client;
pub mod config;

pub use client::{AiClientError, BannerApiClient, CreateTemplateResponse};
pub use config::AiClientConfig;
