//! Profile Harvester - scrape professional profiles, business listings and
//! social pages into spreadsheet-ready rows.
//!
//! This library provides:
//! - Multi-strategy content acquisition (browser render, header-spoofed fetches)
//! - Schema-driven field extraction with ordered selector fallbacks
//! - Tabular projection and SpreadsheetML / CSV export
//! - A local HTTP API and connect-account sessions

pub mod acquisition;
pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod projection;
pub mod session;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for convenience
pub use crate::config::AppConfig;
pub use crate::error::{ScrapeError, ScrapeResult};
pub use crate::extraction::ExtractedEntity;
pub use crate::pipeline::PipelineCoordinator;
pub use crate::platform::{EntityKind, Platform};
