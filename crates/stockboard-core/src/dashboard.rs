//! Dashboard state and its async driver.
//!
//! [`DashboardState`] is synchronous: every action updates the selection and
//! returns the [`FetchCommand`]s it needs. [`Dashboard`] executes those commands
//! against a [`MarketGateway`] on spawned tasks and feeds the responses back
//! through a channel, so results land in the order they complete and stale ones
//! are dropped by sequence number.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::gateway::{FetchError, FetchKey, FetchOutcome, Fetched, MarketGateway};
use crate::reconciler::{
    reconcile_chart, reconcile_overview, ChartView, FetchSlot, Selection, ViewState,
};
use crate::{
    CacheMode, DashboardConfig, OverviewRecord, Symbol, TimeRange, TimeSeriesRecord,
    ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Chart,
}

/// One gateway call requested by a dashboard action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCommand {
    pub seq: u64,
    pub key: FetchKey,
    pub cache_mode: CacheMode,
    /// Drop the freshness entry before fetching.
    pub invalidate: bool,
}

impl FetchCommand {
    pub fn view(&self) -> View {
        match self.key {
            FetchKey::Overview { .. } => View::Overview,
            FetchKey::TimeSeries { .. } => View::Chart,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchPayload {
    Overview(Result<OverviewRecord, FetchError>),
    Chart(Result<TimeSeriesRecord, FetchError>),
}

/// Resolution of a [`FetchCommand`], tagged with its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub seq: u64,
    pub key: FetchKey,
    pub payload: FetchPayload,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    config: DashboardConfig,
    selection: Selection,
    overview: FetchSlot<OverviewRecord>,
    chart: FetchSlot<TimeSeriesRecord>,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            selection: Selection::default(),
            overview: FetchSlot::default(),
            chart: FetchSlot::default(),
        }
    }

    /// Start from an explicit selection instead of the default one.
    pub fn with_selection(config: DashboardConfig, selection: Selection) -> Self {
        Self {
            selection,
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Initial load of both views.
    pub fn start(&mut self) -> Vec<FetchCommand> {
        self.fetch_all(CacheMode::Use, false)
    }

    /// Select a watch-list symbol. Unlisted symbols are rejected and leave the
    /// state untouched.
    pub fn select_symbol(&mut self, input: &str) -> Result<Vec<FetchCommand>, ValidationError> {
        let symbol = Symbol::listed(input)?;
        self.selection.symbol = Some(symbol);
        Ok(self.fetch_all(CacheMode::Use, false))
    }

    pub fn clear_symbol(&mut self) {
        self.selection.symbol = None;
    }

    pub fn select_time_range(&mut self, range: TimeRange) -> Vec<FetchCommand> {
        self.selection.range = range;
        self.fetch_view(View::Chart, CacheMode::Use, false)
            .into_iter()
            .collect()
    }

    /// Flip the shared demo flag. Turning it off reloads live data.
    pub fn toggle_demo_data(&mut self) -> Vec<FetchCommand> {
        self.selection.demo = !self.selection.demo;
        if self.selection.demo {
            Vec::new()
        } else {
            self.fetch_all(CacheMode::Use, false)
        }
    }

    /// Invalidate and refetch both views. Views already loading are skipped.
    pub fn refresh(&mut self) -> Vec<FetchCommand> {
        self.fetch_all(CacheMode::Use, true)
    }

    /// Periodic chart reload. Skipped in demo mode, without a symbol, or while
    /// the chart is loading.
    pub fn auto_refresh_tick(&mut self) -> Vec<FetchCommand> {
        self.fetch_view(View::Chart, CacheMode::Use, false)
            .into_iter()
            .collect()
    }

    /// Request a single view for the current selection.
    pub fn load(&mut self, view: View, cache_mode: CacheMode) -> Option<FetchCommand> {
        self.fetch_view(view, cache_mode, false)
    }

    /// Apply a response. Returns `false` when it was stale and dropped.
    pub fn apply(&mut self, response: FetchResponse) -> bool {
        let FetchResponse { seq, key, payload } = response;
        let display_key = key.to_string();
        let applied = match payload {
            FetchPayload::Overview(result) => self.overview.land(seq, key, result),
            FetchPayload::Chart(result) => self.chart.land(seq, key, result),
        };
        if !applied {
            debug!(key = %display_key, seq, "discarding stale response");
        }
        applied
    }

    pub fn overview_view(&self) -> ViewState<OverviewRecord> {
        reconcile_overview(&self.selection, &self.overview)
    }

    pub fn chart_view(&self) -> ChartView {
        reconcile_chart(&self.selection, &self.chart, &self.config.windows)
    }

    /// True while any view has a request in flight.
    pub fn is_loading(&self) -> bool {
        self.overview.pending_key().is_some() || self.chart.pending_key().is_some()
    }

    fn fetch_all(&mut self, cache_mode: CacheMode, invalidate: bool) -> Vec<FetchCommand> {
        [View::Overview, View::Chart]
            .into_iter()
            .filter_map(|view| self.fetch_view(view, cache_mode, invalidate))
            .collect()
    }

    fn fetch_view(
        &mut self,
        view: View,
        cache_mode: CacheMode,
        invalidate: bool,
    ) -> Option<FetchCommand> {
        if self.selection.demo {
            return None;
        }
        let key = match view {
            View::Overview => self.selection.overview_key()?,
            View::Chart => self.selection.chart_key()?,
        };

        let seq = match view {
            View::Overview if self.overview.is_pending_for(&key) => return None,
            View::Chart if self.chart.is_pending_for(&key) => return None,
            View::Overview => self.overview.begin(key.clone()),
            View::Chart => self.chart.begin(key.clone()),
        };

        Some(FetchCommand {
            seq,
            key,
            cache_mode,
            invalidate,
        })
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

/// Run one command against the gateway.
pub async fn execute(gateway: &dyn MarketGateway, command: FetchCommand) -> FetchResponse {
    let FetchCommand {
        seq,
        key,
        cache_mode,
        invalidate,
    } = command;

    if invalidate {
        gateway.invalidate(&key).await;
    }

    let payload = match &key {
        FetchKey::Overview { symbol } => FetchPayload::Overview(flatten(
            gateway.fetch_overview(symbol.clone(), cache_mode).await,
        )),
        FetchKey::TimeSeries { symbol, range } => FetchPayload::Chart(flatten(
            gateway
                .fetch_time_series(symbol.clone(), *range, cache_mode)
                .await,
        )),
    };

    FetchResponse { seq, key, payload }
}

fn flatten<T>(outcome: FetchOutcome<T>) -> Result<T, FetchError> {
    outcome.and_then(Fetched::into_result)
}

/// Owns a [`DashboardState`] and runs its fetch commands on the tokio runtime.
pub struct Dashboard {
    gateway: Arc<dyn MarketGateway>,
    state: DashboardState,
    sender: mpsc::UnboundedSender<FetchResponse>,
    receiver: mpsc::UnboundedReceiver<FetchResponse>,
}

impl Dashboard {
    pub fn new(gateway: Arc<dyn MarketGateway>, config: DashboardConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            gateway,
            state: DashboardState::new(config),
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn start(&mut self) {
        let commands = self.state.start();
        self.dispatch(commands);
    }

    pub fn select_symbol(&mut self, input: &str) -> Result<(), ValidationError> {
        let commands = self.state.select_symbol(input)?;
        self.dispatch(commands);
        Ok(())
    }

    pub fn clear_symbol(&mut self) {
        self.state.clear_symbol();
    }

    pub fn select_time_range(&mut self, range: TimeRange) {
        let commands = self.state.select_time_range(range);
        self.dispatch(commands);
    }

    pub fn toggle_demo_data(&mut self) {
        let commands = self.state.toggle_demo_data();
        self.dispatch(commands);
    }

    pub fn refresh(&mut self) {
        let commands = self.state.refresh();
        self.dispatch(commands);
    }

    pub fn auto_refresh_tick(&mut self) {
        let commands = self.state.auto_refresh_tick();
        self.dispatch(commands);
    }

    /// Wait for the next response and apply it. Returns whether it changed the
    /// state.
    pub async fn next_update(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(response) => self.state.apply(response),
            None => false,
        }
    }

    /// Apply responses until no view is loading.
    pub async fn settle(&mut self) {
        while self.state.is_loading() {
            self.next_update().await;
        }
    }

    fn dispatch(&self, commands: Vec<FetchCommand>) {
        for command in commands {
            debug!(key = %command.key, seq = command.seq, invalidate = command.invalidate, "dispatching fetch");
            let gateway = Arc::clone(&self.gateway);
            let sender = self.sender.clone();
            tokio::spawn(async move {
                let response = execute(gateway.as_ref(), command).await;
                // The receiver lives as long as the dashboard.
                let _ = sender.send(response);
            });
        }
    }
}
