//! Behavior-driven tests for dashboard state and its async driver
//!
//! These tests verify HOW user actions turn into gateway calls, and how
//! late, failed and demo results are reconciled into what the views show.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockboard_core::{
    field, CacheMode, Dashboard, DashboardConfig, DashboardState, FetchError, FetchKey,
    FetchPayload, FetchResponse, Fetched, GatewayFuture, MarketGateway, MarketTimestamp,
    OverviewRecord, RecordOrigin, Symbol, TimeRange, TimeSeriesPoint, TimeSeriesRecord,
    View, ViewState,
};
use time::macros::datetime;

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Default)]
struct FakeGateway {
    delays: HashMap<&'static str, Duration>,
    series_len: usize,
    failing: AtomicBool,
    overview_calls: AtomicUsize,
    series_calls: AtomicUsize,
    invalidations: Mutex<Vec<FetchKey>>,
}

impl FakeGateway {
    fn new() -> Self {
        Self {
            series_len: 12,
            ..Self::default()
        }
    }

    fn with_delay(mut self, symbol: &'static str, delay: Duration) -> Self {
        self.delays.insert(symbol, delay);
        self
    }

    fn with_series_len(mut self, series_len: usize) -> Self {
        self.series_len = series_len;
        self
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn overview_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }

    fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    fn invalidations(&self) -> Vec<FetchKey> {
        self.invalidations
            .lock()
            .expect("invalidation log should not be poisoned")
            .clone()
    }

    async fn pause(&self, symbol: &Symbol) {
        if let Some(delay) = self.delays.get(symbol.as_str()) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn failure(&self) -> Option<FetchError> {
        self.failing
            .load(Ordering::SeqCst)
            .then(|| FetchError::network_failure("upstream unreachable"))
    }
}

impl MarketGateway for FakeGateway {
    fn fetch_overview<'a>(
        &'a self,
        symbol: Symbol,
        _mode: CacheMode,
    ) -> GatewayFuture<'a, stockboard_core::FetchOutcome<OverviewRecord>> {
        Box::pin(async move {
            self.overview_calls.fetch_add(1, Ordering::SeqCst);
            self.pause(&symbol).await;
            if let Some(error) = self.failure() {
                return Err(error);
            }
            Ok(Fetched::Data(overview(&symbol)))
        })
    }

    fn fetch_time_series<'a>(
        &'a self,
        symbol: Symbol,
        _range: TimeRange,
        _mode: CacheMode,
    ) -> GatewayFuture<'a, stockboard_core::FetchOutcome<TimeSeriesRecord>> {
        Box::pin(async move {
            self.series_calls.fetch_add(1, Ordering::SeqCst);
            self.pause(&symbol).await;
            if let Some(error) = self.failure() {
                return Err(error);
            }
            Ok(Fetched::Data(series(&symbol, self.series_len)))
        })
    }

    fn invalidate<'a>(&'a self, key: &'a FetchKey) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.invalidations
                .lock()
                .expect("invalidation log should not be poisoned")
                .push(key.clone());
        })
    }
}

fn overview(symbol: &Symbol) -> OverviewRecord {
    OverviewRecord::from_fields([
        (field::SYMBOL, symbol.as_str()),
        (field::NAME, symbol.as_str()),
        (field::EXCHANGE, "NASDAQ"),
    ])
}

/// `len` five-minute samples, newest first, as the upstream sends them.
fn series(symbol: &Symbol, len: usize) -> TimeSeriesRecord {
    let start = datetime!(2025-01-02 09:30);
    let points = (0..len)
        .rev()
        .map(|index| {
            let minutes = i64::try_from(index).expect("small index") * 5;
            let timestamp =
                MarketTimestamp::from_primitive(start + time::Duration::minutes(minutes));
            let close = 100.0 + index as f64 * 0.01;
            TimeSeriesPoint::new(timestamp, close, close + 0.5, close - 0.5, close, 1_000)
                .expect("valid point")
        })
        .collect();
    TimeSeriesRecord::new(symbol.clone(), "5min", points)
}

fn symbol(ticker: &str) -> Symbol {
    Symbol::parse(ticker).expect("valid symbol")
}

fn dashboard(gateway: &Arc<FakeGateway>) -> Dashboard {
    Dashboard::new(gateway.clone(), DashboardConfig::default())
}

fn overview_symbol(state: &DashboardState) -> Option<String> {
    state
        .overview_view()
        .displayed_record()
        .and_then(|record| record.symbol().map(str::to_owned))
}

// =============================================================================
// Dashboard: Stale Results
// =============================================================================

#[test]
fn when_old_symbol_response_lands_after_new_selection_it_is_discarded() {
    // Given: A dashboard that asked for AAPL and then for MSFT
    let mut state = DashboardState::default();
    let aapl_commands = state.start();
    let msft_commands = state.select_symbol("MSFT").expect("MSFT is listed");

    // When: The MSFT overview lands first, then the late AAPL one
    let msft_overview = &msft_commands[0];
    let applied_msft = state.apply(FetchResponse {
        seq: msft_overview.seq,
        key: msft_overview.key.clone(),
        payload: FetchPayload::Overview(Ok(overview(&symbol("MSFT")))),
    });
    let aapl_overview = &aapl_commands[0];
    let applied_aapl = state.apply(FetchResponse {
        seq: aapl_overview.seq,
        key: aapl_overview.key.clone(),
        payload: FetchPayload::Overview(Ok(overview(&symbol("AAPL")))),
    });

    // Then: Only MSFT is shown
    assert!(applied_msft);
    assert!(!applied_aapl);
    assert_eq!(overview_symbol(&state).as_deref(), Some("MSFT"));
}

#[tokio::test]
async fn when_slow_symbol_finishes_last_driver_keeps_latest_selection() {
    // Given: An upstream that is slow for AAPL and fast for MSFT
    let gateway = Arc::new(
        FakeGateway::new()
            .with_delay("AAPL", Duration::from_millis(150))
            .with_delay("MSFT", Duration::from_millis(5)),
    );
    let mut dashboard = dashboard(&gateway);

    // When: AAPL loads and the user switches to MSFT before it finishes
    dashboard.start();
    dashboard
        .select_symbol("MSFT")
        .expect("MSFT is listed");
    dashboard.settle().await;
    let late = tokio::time::timeout(Duration::from_secs(2), dashboard.next_update())
        .await
        .expect("late AAPL response should still arrive");

    // Then: The late AAPL response is dropped and MSFT stays on screen
    assert!(!late);
    assert_eq!(overview_symbol(dashboard.state()).as_deref(), Some("MSFT"));
    let chart = dashboard.state().chart_view();
    assert_eq!(
        chart.series().map(|series| series.symbol.as_str()),
        Some("MSFT")
    );
}

// =============================================================================
// Dashboard: Refresh
// =============================================================================

#[tokio::test]
async fn when_refresh_is_pressed_twice_only_one_refetch_runs() {
    // Given: A dashboard that finished its initial load
    let gateway = Arc::new(FakeGateway::new().with_delay("AAPL", Duration::from_millis(20)));
    let mut dashboard = dashboard(&gateway);
    dashboard.start();
    dashboard.settle().await;

    // When: Refresh is pressed twice in a row
    dashboard.refresh();
    dashboard.refresh();
    dashboard.settle().await;

    // Then: Each view was invalidated and refetched exactly once
    assert_eq!(gateway.overview_calls(), 2);
    assert_eq!(gateway.series_calls(), 2);
    assert_eq!(
        gateway.invalidations(),
        vec![
            FetchKey::overview(symbol("AAPL")),
            FetchKey::time_series(symbol("AAPL"), TimeRange::OneMonth),
        ]
    );
}

#[tokio::test]
async fn when_refresh_fails_previous_record_stays_visible_with_error() {
    // Given: A dashboard showing AAPL
    let gateway = Arc::new(FakeGateway::new());
    let mut dashboard = dashboard(&gateway);
    dashboard.start();
    dashboard.settle().await;

    // When: A refresh hits an upstream failure
    gateway.fail(true);
    dashboard.refresh();
    dashboard.settle().await;

    // Then: The error is active and the old record is retained for display
    let view = dashboard.state().overview_view();
    assert!(view.active_record().is_none());
    assert!(view.active_error().is_some());
    assert_eq!(overview_symbol(dashboard.state()).as_deref(), Some("AAPL"));

    let chart = dashboard.state().chart_view();
    assert!(chart.state.active_error().is_some());
    assert_eq!(chart.series().map(TimeSeriesRecord::len), Some(12));
}

#[tokio::test]
async fn when_first_chart_load_fails_an_empty_series_is_shown() {
    // Given: An upstream that is down from the start
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail(true);
    let mut dashboard = dashboard(&gateway);

    // When: The dashboard loads
    dashboard.start();
    dashboard.settle().await;

    // Then: The chart shows the error over an empty placeholder
    let chart = dashboard.state().chart_view();
    assert!(chart.state.active_error().is_some());
    let placeholder = chart.series().expect("placeholder series");
    assert!(placeholder.is_empty());
    assert_eq!(placeholder.interval, "5min");
    assert!(dashboard.state().overview_view().displayed_record().is_none());
}

// =============================================================================
// Dashboard: Demo Data
// =============================================================================

#[tokio::test]
async fn when_demo_data_is_on_views_show_demo_records_without_fetching() {
    // Given: A dashboard whose live load failed
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail(true);
    let mut dashboard = dashboard(&gateway);
    dashboard.start();
    dashboard.settle().await;
    let calls_before = gateway.overview_calls() + gateway.series_calls();

    // When: Demo data is switched on and refresh is pressed
    dashboard.toggle_demo_data();
    dashboard.refresh();
    dashboard.auto_refresh_tick();

    // Then: Both views show demo data and nothing was fetched
    let overview = dashboard.state().overview_view();
    assert!(overview.using_demo_data());
    assert!(overview.active_error().is_none());
    assert_eq!(overview_symbol(dashboard.state()).as_deref(), Some("AAPL"));
    assert!(dashboard.state().chart_view().state.using_demo_data());
    assert!(!dashboard.state().is_loading());
    assert_eq!(gateway.overview_calls() + gateway.series_calls(), calls_before);
}

#[tokio::test]
async fn when_symbol_or_range_changes_in_demo_mode_demo_data_stays_without_error() {
    // Given: A dashboard whose live load failed, then switched to demo data
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail(true);
    let mut dashboard = dashboard(&gateway);
    dashboard.start();
    dashboard.settle().await;
    dashboard.toggle_demo_data();
    let calls_before = gateway.overview_calls() + gateway.series_calls();

    // When: The user picks another symbol and range
    dashboard
        .select_symbol("MSFT")
        .expect("MSFT is listed");
    dashboard.select_time_range(TimeRange::OneWeek);

    // Then: Both views keep demo data, no stale error shows and nothing was fetched
    let state = dashboard.state();
    let overview = state.overview_view();
    let chart = state.chart_view();
    assert!(overview.using_demo_data());
    assert!(overview.active_error().is_none());
    assert!(chart.state.using_demo_data());
    assert!(chart.state.active_error().is_none());
    assert_eq!(chart.range, TimeRange::OneWeek);
    assert_eq!(overview_symbol(state).as_deref(), Some("MSFT"));
    assert!(!state.is_loading());
    assert_eq!(gateway.overview_calls() + gateway.series_calls(), calls_before);
}

#[tokio::test]
async fn when_demo_data_is_switched_off_live_data_reloads() {
    // Given: A dashboard in demo mode
    let gateway = Arc::new(FakeGateway::new());
    let mut dashboard = dashboard(&gateway);
    dashboard.toggle_demo_data();
    dashboard.start();
    assert_eq!(gateway.overview_calls(), 0);

    // When: Demo data is switched off
    dashboard.toggle_demo_data();
    dashboard.settle().await;

    // Then: Both views were fetched and show live data
    assert_eq!(gateway.overview_calls(), 1);
    assert_eq!(gateway.series_calls(), 1);
    assert!(matches!(
        dashboard.state().overview_view(),
        ViewState::Ready {
            origin: RecordOrigin::Live,
            ..
        }
    ));
}

#[test]
fn when_no_symbol_is_selected_sample_records_are_shown() {
    // Given: A dashboard with no selection
    let mut state = DashboardState::default();
    state.clear_symbol();

    // When: Anything asks for data
    let commands = state.refresh();

    // Then: Nothing is fetched and the sample records are shown
    assert!(commands.is_empty());
    assert!(matches!(
        state.overview_view(),
        ViewState::Ready {
            origin: RecordOrigin::Sample,
            ..
        }
    ));
    assert!(!state.chart_view().state.using_demo_data());
    assert!(state.chart_view().series().is_some());
}

// =============================================================================
// Dashboard: Auto-refresh
// =============================================================================

#[test]
fn auto_refresh_only_reloads_an_idle_live_chart() {
    // Given: A dashboard still loading its chart
    let mut state = DashboardState::default();
    let start = state.start();

    // When/Then: A tick while loading does nothing
    assert!(state.auto_refresh_tick().is_empty());

    // When: The chart result lands and the clock ticks
    let chart = start
        .iter()
        .find(|command| command.view() == View::Chart)
        .expect("chart command");
    state.apply(FetchResponse {
        seq: chart.seq,
        key: chart.key.clone(),
        payload: FetchPayload::Chart(Ok(series(&symbol("AAPL"), 3))),
    });
    let ticked = state.auto_refresh_tick();

    // Then: Only the chart reloads, through the cache
    assert_eq!(ticked.len(), 1);
    assert_eq!(ticked[0].view(), View::Chart);
    assert_eq!(ticked[0].cache_mode, CacheMode::Use);
    assert!(!ticked[0].invalidate);

    // And: Demo mode or a cleared symbol suppresses ticks
    let mut demo = DashboardState::default();
    demo.toggle_demo_data();
    assert!(demo.auto_refresh_tick().is_empty());
    let mut cleared = DashboardState::default();
    cleared.clear_symbol();
    assert!(cleared.auto_refresh_tick().is_empty());
}

// =============================================================================
// Dashboard: Range Windows
// =============================================================================

#[tokio::test]
async fn chart_keeps_the_most_recent_window_for_each_range() {
    // Given: An upstream series of 2000 samples
    let gateway = Arc::new(FakeGateway::new().with_series_len(2_000));
    let mut dashboard = dashboard(&gateway);
    dashboard.start();
    dashboard.settle().await;

    let mut shown = Vec::new();
    for range in TimeRange::ALL {
        // When: The range is selected
        dashboard.select_time_range(range);
        dashboard.settle().await;

        let chart = dashboard.state().chart_view();
        let series = chart.series().expect("series").clone();
        assert_eq!(chart.range, range);
        assert_eq!(chart.stats.latest, series.points[series.len() - 1].close);
        shown.push(series);
    }

    // Then: 1 week keeps 480, 1 month 1920, 3 months everything, all ending at the newest sample
    let lens: Vec<usize> = shown.iter().map(TimeSeriesRecord::len).collect();
    assert_eq!(lens, vec![480, 1_920, 2_000]);
    let newest: Vec<_> = shown
        .iter()
        .map(|series| series.points.last().map(|point| point.timestamp))
        .collect();
    assert!(newest.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(shown
        .iter()
        .all(|series| series.points.windows(2).all(|p| p[0].timestamp < p[1].timestamp)));
}
