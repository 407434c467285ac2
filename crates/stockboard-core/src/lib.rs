//! # Stockboard Core
//!
//! Data gateway and view-state reconciliation for the stockboard dashboard.
//!
//! ## Overview
//!
//! This crate provides the pieces behind the dashboard's two views (company
//! overview and price chart):
//!
//! - **Remote data gateway** for the Alpha Vantage query API, with a freshness
//!   cache, in-flight de-duplication and a client-side request budget
//! - **Uniform fetch errors** that keep rate-limit and premium notices apart
//!   from transport failures
//! - **View state reconciler** that merges fetch results, the user's selection
//!   and the demo-data override into one displayable state per view
//! - **Dashboard state** with sequence-numbered requests so late responses never
//!   overwrite newer ones
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Freshness cache and cache modes |
//! | [`config`] | Environment-driven gateway and dashboard settings |
//! | [`dashboard`] | Dashboard actions, fetch commands and the async driver |
//! | [`demo`] | Fixed demo and sample records |
//! | [`domain`] | Symbols, ranges, overview and series records |
//! | [`error`] | Validation and configuration errors |
//! | [`format`] | Display formatting for overview fields and prices |
//! | [`gateway`] | Gateway trait, fetch errors and the Alpha Vantage gateway |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`reconciler`] | Per-view state decisions |
//! | [`throttling`] | Client-side request budget |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stockboard_core::{AlphaVantageGateway, Dashboard, DashboardConfig, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = AlphaVantageGateway::new(GatewayConfig::from_env()?);
//!     let mut dashboard = Dashboard::new(Arc::new(gateway), DashboardConfig::default());
//!
//!     dashboard.start();
//!     dashboard.settle().await;
//!
//!     let chart = dashboard.state().chart_view();
//!     println!("latest close: {:.2}", chart.stats.latest);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   actions   ┌──────────────────┐
//! │  CLI / User     │────────────▶│ Dashboard State  │
//! └─────────────────┘             └────────┬─────────┘
//!          ▲                               │ fetch commands
//!          │ view states                   ▼
//! ┌─────────────────┐  responses  ┌──────────────────┐     ┌─────────────┐
//! │  Reconciler     │◀────────────│ Market Gateway   │────▶│ HTTP Client │
//! └─────────────────┘  (seq'd)    │ cache + in-flight│     └─────────────┘
//!                                 └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Gateway calls separate hard failures from degraded answers:
//!
//! ```rust
//! use stockboard_core::{FetchError, FetchErrorKind, Fetched};
//!
//! fn describe(outcome: Result<Fetched<u32>, FetchError>) -> String {
//!     match outcome {
//!         Ok(Fetched::Data(value)) => format!("got {value}"),
//!         Ok(Fetched::Limited(error)) if error.kind() == FetchErrorKind::RateLimited => {
//!             String::from("quota exhausted, try demo data")
//!         }
//!         Ok(Fetched::Limited(error)) | Err(error) => error.to_string(),
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The API key is read from the environment and redacted from logs
//! - Symbols are validated before they reach a request

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod domain;
pub mod error;
pub mod format;
pub mod gateway;
pub mod http_client;
pub mod reconciler;
pub mod throttling;

// Caching
pub use cache::{CacheMode, CacheStore};

// Configuration
pub use config::{DashboardConfig, GatewayConfig, SeriesRequest, SeriesWindows};

// Dashboard
pub use dashboard::{Dashboard, DashboardState, FetchCommand, FetchPayload, FetchResponse, View};

// Domain models
pub use domain::{
    field, MarketTimestamp, OverviewRecord, SeriesStats, Symbol, TimeRange, TimeSeriesPoint,
    TimeSeriesRecord, WATCH_LIST,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Formatting
pub use format::{KeyMetrics, OverviewSummary, SignedPercentage, Trend, ValuationMetrics};

// Gateway
pub use gateway::{
    AlphaVantageGateway, FetchError, FetchErrorKind, FetchKey, FetchOutcome, Fetched, GatewayFuture,
    MarketGateway,
};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Reconciler
pub use reconciler::{ChartView, FetchSlot, RecordOrigin, Selection, ViewState};

// Throttling
pub use throttling::RequestBudget;
