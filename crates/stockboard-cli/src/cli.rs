//! CLI argument definitions for stockboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `overview` | Company overview for a watch-list symbol |
//! | `chart` | Recent price samples and headline stats |
//! | `watch` | Live dashboard driven by stdin commands |
//! | `symbols` | List the watch list and time ranges |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--demo` | `false` | Start with demo data instead of live requests |
//! | `--timeout-ms` | env or `5000` | Upstream request timeout |
//!
//! # Examples
//!
//! ```bash
//! stockboard overview AAPL
//! stockboard overview AAPL --refresh
//! stockboard chart MSFT --range 1week --points 20
//! stockboard --format json --pretty chart NVDA
//! stockboard watch TSLA --range 3months
//! stockboard --demo watch
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stock dashboard for the terminal, backed by Alpha Vantage.
///
/// Set STOCKBOARD_ALPHAVANTAGE_API_KEY to fetch live data. Logging is
/// controlled with RUST_LOG (default: warn).
#[derive(Debug, Parser)]
#[command(name = "stockboard", author, version, about = "Stock dashboard for the terminal")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Show demo data instead of calling the API.
    #[arg(long, global = true, default_value_t = false)]
    pub demo: bool,

    /// Request timeout in milliseconds. Overrides STOCKBOARD_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Table,
    /// JSON object per view.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the company overview for a symbol.
    ///
    ///   stockboard overview AAPL
    Overview(OverviewArgs),

    /// Fetch the intraday series for a symbol and show the latest samples.
    ///
    ///   stockboard chart AAPL --range 1week --points 20
    Chart(ChartArgs),

    /// Live dashboard. Reads commands from stdin:
    ///
    ///   symbol <TICKER> | clear | range <1week|1month|3months> | demo | refresh | quit
    Watch(WatchArgs),

    /// List watch-list symbols and time ranges.
    Symbols,
}

#[derive(Debug, Args)]
pub struct OverviewArgs {
    /// Watch-list symbol (e.g. AAPL, MSFT).
    pub symbol: String,

    /// Skip any cached result and fetch from the API.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Watch-list symbol (e.g. AAPL, MSFT).
    pub symbol: String,

    /// Time range: 1week, 1month or 3months.
    #[arg(long, default_value = "1month")]
    pub range: String,

    /// Number of most recent samples to print.
    #[arg(long, default_value_t = 10)]
    pub points: usize,

    /// Skip any cached result and fetch from the API.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Initial symbol (default: AAPL).
    pub symbol: Option<String>,

    /// Initial time range: 1week, 1month or 3months.
    #[arg(long)]
    pub range: Option<String>,
}
