use std::io::Write;

use serde::Serialize;

use stockboard_core::format::{format_price, OverviewSummary, Trend};
use stockboard_core::{
    ChartView, DashboardState, FetchError, OverviewRecord, SeriesStats, Symbol, TimeRange,
    TimeSeriesPoint, ViewState, WATCH_LIST,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

const DEMO_TIP: &str =
    "tip: toggle demo data (--demo, or `demo` in watch mode) to explore with sample data";

#[derive(Debug, Serialize)]
struct OverviewOutput<'a> {
    state: &'static str,
    using_demo_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a FetchError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    summary: Option<OverviewSummary>,
    record: Option<&'a OverviewRecord>,
}

impl<'a> OverviewOutput<'a> {
    fn new(view: &'a ViewState<OverviewRecord>) -> Self {
        let error = view.active_error();
        let record = view.displayed_record();
        Self {
            state: state_name(view),
            using_demo_data: view.using_demo_data(),
            error,
            hint: error.and_then(FetchError::hint),
            summary: record.map(OverviewSummary::from_record),
            record,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChartOutput<'a> {
    state: &'static str,
    using_demo_data: bool,
    range: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a FetchError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    symbol: Option<&'a Symbol>,
    interval: Option<&'a str>,
    stats: SeriesStats,
    total_points: usize,
    points: &'a [TimeSeriesPoint],
}

impl<'a> ChartOutput<'a> {
    fn new(view: &'a ChartView, points: usize) -> Self {
        let error = view.state.active_error();
        let series = view.series();
        let all = series.map(|series| series.points.as_slice()).unwrap_or(&[]);
        Self {
            state: state_name(&view.state),
            using_demo_data: view.state.using_demo_data(),
            range: view.range,
            error,
            hint: error.and_then(FetchError::hint),
            symbol: series.map(|series| &series.symbol),
            interval: series.map(|series| series.interval.as_str()),
            stats: view.stats,
            total_points: all.len(),
            points: latest(all, points),
        }
    }
}

#[derive(Debug, Serialize)]
struct DashboardOutput<'a> {
    symbol: Option<&'a Symbol>,
    range: TimeRange,
    demo: bool,
    overview: OverviewOutput<'a>,
    chart: ChartOutput<'a>,
}

#[derive(Debug, Serialize)]
struct SymbolsOutput {
    symbols: [&'static str; 10],
    initial: &'static str,
    ranges: Vec<&'static str>,
}

pub fn render_overview<W: Write>(
    out: &mut W,
    view: &ViewState<OverviewRecord>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, &OverviewOutput::new(view), pretty),
        OutputFormat::Table => write_overview_table(out, view),
    }
}

pub fn render_chart<W: Write>(
    out: &mut W,
    view: &ChartView,
    points: usize,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, &ChartOutput::new(view, points), pretty),
        OutputFormat::Table => write_chart_table(out, view, points),
    }
}

/// Both views of a live dashboard.
pub fn render_dashboard<W: Write>(
    out: &mut W,
    state: &DashboardState,
    points: usize,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let overview = state.overview_view();
    let chart = state.chart_view();
    let selection = state.selection();

    match format {
        OutputFormat::Json => {
            let output = DashboardOutput {
                symbol: selection.symbol.as_ref(),
                range: selection.range,
                demo: selection.demo,
                overview: OverviewOutput::new(&overview),
                chart: ChartOutput::new(&chart, points),
            };
            write_json(out, &output, pretty)
        }
        OutputFormat::Table => {
            let symbol = selection
                .symbol
                .as_ref()
                .map_or("none", Symbol::as_str);
            writeln!(out, "{}", "=".repeat(72))?;
            writeln!(
                out,
                "symbol {symbol} | range {} | demo {}",
                selection.range.label(),
                if selection.demo { "on" } else { "off" }
            )?;
            writeln!(out, "{}", "=".repeat(72))?;
            write_overview_table(out, &overview)?;
            writeln!(out)?;
            write_chart_table(out, &chart, points)
        }
    }
}

pub fn render_symbols<W: Write>(
    out: &mut W,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let output = SymbolsOutput {
        symbols: WATCH_LIST,
        initial: WATCH_LIST[0],
        ranges: TimeRange::ALL.iter().map(|range| range.as_str()).collect(),
    };

    match format {
        OutputFormat::Json => write_json(out, &output, pretty),
        OutputFormat::Table => {
            writeln!(out, "symbols: {}", output.symbols.join(", "))?;
            writeln!(out, "ranges:  {}", output.ranges.join(", "))?;
            Ok(())
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_overview_table<W: Write>(
    out: &mut W,
    view: &ViewState<OverviewRecord>,
) -> Result<(), CliError> {
    write_status(out, view)?;
    let Some(record) = view.displayed_record() else {
        return Ok(());
    };

    let summary = OverviewSummary::from_record(record);
    let badge = if view.using_demo_data() { "  [demo data]" } else { "" };
    writeln!(
        out,
        "{} | {} ({}, {}){badge}",
        summary.symbol, summary.name, summary.exchange, summary.country
    )?;
    writeln!(out, "{} / {}", summary.sector, summary.industry)?;
    writeln!(out)?;

    let ratings = &summary.analyst_ratings;
    let rows = [
        ("Market cap", summary.market_cap.clone()),
        ("Shares outstanding", summary.shares_outstanding.clone()),
        ("EPS", summary.eps.clone()),
        ("P/E ratio", summary.pe_ratio.clone()),
        ("52-week high", summary.week_52_high.clone()),
        ("52-week low", summary.week_52_low.clone()),
        ("Beta", summary.beta.clone()),
        ("Dividend yield", summary.dividend_yield.clone()),
        ("Dividend/share", summary.dividend_per_share.clone()),
        ("Revenue (TTM)", summary.revenue_ttm.clone()),
        ("Revenue/share", summary.revenue_per_share_ttm.clone()),
        (
            "Profit margin",
            format!("{}{}", summary.profit_margin, sign(summary.profit_margin_trend)),
        ),
        ("EBITDA", summary.ebitda.clone()),
        ("Target price", summary.analyst_target_price.clone()),
        (
            "Analyst ratings",
            format!(
                "strong buy {} | buy {} | hold {} | sell {} | strong sell {}",
                ratings.strong_buy, ratings.buy, ratings.hold, ratings.sell, ratings.strong_sell
            ),
        ),
        ("Latest quarter", summary.latest_quarter.clone()),
    ];
    for (label, value) in rows {
        writeln!(out, "{label:<20}{value}")?;
    }

    let metrics = &summary.key_metrics;
    writeln!(out)?;
    writeln!(out, "Key financial metrics")?;
    for (label, metric) in [
        ("Return on equity", &metrics.return_on_equity),
        ("Return on assets", &metrics.return_on_assets),
        ("Operating margin", &metrics.operating_margin),
        ("Earnings growth", &metrics.quarterly_earnings_growth),
        ("Revenue growth", &metrics.quarterly_revenue_growth),
    ] {
        writeln!(out, "{label:<20}{}{}", metric.value, sign(metric.trend))?;
    }

    let valuation = &summary.valuation;
    writeln!(out)?;
    writeln!(out, "Valuation metrics")?;
    for (label, value) in [
        ("Trailing P/E", &valuation.trailing_pe),
        ("Forward P/E", &valuation.forward_pe),
        ("Price/sales", &valuation.price_to_sales),
        ("Price/book", &valuation.price_to_book),
        ("PEG ratio", &valuation.peg_ratio),
    ] {
        writeln!(out, "{label:<20}{value}")?;
    }

    writeln!(out)?;
    writeln!(out, "{}", summary.description)?;
    Ok(())
}

fn sign(trend: Trend) -> &'static str {
    match trend {
        Trend::Positive => " (+)",
        Trend::Negative => " (-)",
        Trend::Neutral => "",
    }
}

fn write_chart_table<W: Write>(out: &mut W, view: &ChartView, points: usize) -> Result<(), CliError> {
    write_status(out, &view.state)?;
    let Some(series) = view.series() else {
        return Ok(());
    };

    let badge = if view.state.using_demo_data() { "  [demo data]" } else { "" };
    writeln!(
        out,
        "{} {} | {} | {} samples{badge}",
        series.symbol,
        view.range.label(),
        series.interval,
        series.len()
    )?;

    if series.is_empty() {
        writeln!(out, "no price data available")?;
        return Ok(());
    }

    writeln!(
        out,
        "Latest {}   High {}   Low {}",
        format_price(view.stats.latest),
        format_price(view.stats.highest),
        format_price(view.stats.lowest)
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<21}{:>11}{:>11}{:>11}{:>11}{:>10}",
        "Time", "Open", "High", "Low", "Close", "Volume"
    )?;
    for point in latest(&series.points, points) {
        writeln!(
            out,
            "{:<21}{:>11}{:>11}{:>11}{:>11}{:>10}",
            point.timestamp.format(),
            format_price(point.open),
            format_price(point.high),
            format_price(point.low),
            format_price(point.close),
            point.volume
        )?;
    }
    Ok(())
}

fn write_status<W: Write, R>(out: &mut W, view: &ViewState<R>) -> Result<(), CliError> {
    match view {
        ViewState::Idle => writeln!(out, "no data loaded yet")?,
        ViewState::Loading => writeln!(out, "loading...")?,
        ViewState::Failed { error, retained } => {
            writeln!(out, "error: {error}")?;
            if let Some(hint) = error.hint() {
                writeln!(out, "hint: {hint}")?;
            }
            writeln!(out, "{DEMO_TIP}")?;
            if retained.is_some() {
                writeln!(out, "(showing the last loaded data)")?;
            }
            writeln!(out)?;
        }
        ViewState::Ready { .. } => {}
    }
    Ok(())
}

fn state_name<R>(view: &ViewState<R>) -> &'static str {
    match view {
        ViewState::Idle => "idle",
        ViewState::Loading => "loading",
        ViewState::Failed { .. } => "failed",
        ViewState::Ready { .. } => "ready",
    }
}

fn latest(points: &[TimeSeriesPoint], count: usize) -> &[TimeSeriesPoint] {
    &points[points.len().saturating_sub(count)..]
}
