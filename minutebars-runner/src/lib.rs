//! Minutebars Runner — export orchestration on top of `minutebars-core`.
//!
//! This crate provides:
//! - TOML run configuration with historical defaults
//! - The per-day, per-ticker export loop with a configurable failure policy
//! - Atomic CSV output under `{ticker_root}/{SYMBOL}/`

pub mod config;
pub mod export;
pub mod writer;

pub use config::{ConfigError, ExportConfig, ProviderConfig, ProviderKind, SessionConfig};
pub use export::{
    ExportError, ExportSummary, Exporter, FailurePolicy, OutputLayout, UnitError, UnitFailure,
    UnitOutcome,
};
pub use writer::{write_rows, WriteError};
