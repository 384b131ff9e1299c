//! Minute-bar providers.

pub mod alpaca;
pub mod csv_replay;
pub mod provider;

pub use alpaca::{AlpacaCredentials, AlpacaProvider};
pub use csv_replay::CsvReplayProvider;
pub use provider::{BarProvider, DataSource, ProviderError};
