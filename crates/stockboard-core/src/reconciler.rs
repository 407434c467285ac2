//! View state reconciliation.
//!
//! Each view (overview, chart) owns a [`FetchSlot`] that tracks the request in
//! flight and the last resolution. The `reconcile_*` functions are pure: given
//! the user's [`Selection`] and the slot they decide which single record and
//! error the view shows.
//!
//! Decision order, first match wins:
//!
//! 1. demo data toggled on: fixed demo record, never an error
//! 2. no symbol selected: demo overview / sample chart
//! 3. fetch in flight for the selection: loading
//! 4. last fetch for the selection failed: error, plus the last good record
//! 5. last fetch for the selection succeeded: that record
//! 6. otherwise: idle

use serde::Serialize;

use crate::gateway::{FetchError, FetchKey};
use crate::{demo, OverviewRecord, SeriesStats, SeriesWindows, Symbol, TimeRange, TimeSeriesRecord};

/// Where a displayed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    Live,
    Demo,
    /// Placeholder shown while no symbol is selected.
    Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState<R> {
    Idle,
    Loading,
    Failed {
        error: FetchError,
        /// Last good record for the same key, kept for display only.
        retained: Option<R>,
    },
    Ready {
        record: R,
        origin: RecordOrigin,
    },
}

impl<R> ViewState<R> {
    /// The authoritative record. `None` while loading or failed.
    pub fn active_record(&self) -> Option<&R> {
        match self {
            Self::Ready { record, .. } => Some(record),
            Self::Idle | Self::Loading | Self::Failed { .. } => None,
        }
    }

    pub fn active_error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Idle | Self::Loading | Self::Ready { .. } => None,
        }
    }

    pub fn using_demo_data(&self) -> bool {
        matches!(
            self,
            Self::Ready {
                origin: RecordOrigin::Demo,
                ..
            }
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// What to draw: the active record, or the retained one under an error.
    pub fn displayed_record(&self) -> Option<&R> {
        match self {
            Self::Ready { record, .. } => Some(record),
            Self::Failed { retained, .. } => retained.as_ref(),
            Self::Idle | Self::Loading => None,
        }
    }
}

/// User-controlled parameters shared by both views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub symbol: Option<Symbol>,
    pub range: TimeRange,
    pub demo: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            symbol: Some(Symbol::initial()),
            range: TimeRange::default(),
            demo: false,
        }
    }
}

impl Selection {
    pub fn overview_key(&self) -> Option<FetchKey> {
        self.symbol.clone().map(FetchKey::overview)
    }

    pub fn chart_key(&self) -> Option<FetchKey> {
        self.symbol
            .clone()
            .map(|symbol| FetchKey::time_series(symbol, self.range))
    }
}

/// Per-view fetch bookkeeping.
#[derive(Debug, Clone)]
pub struct FetchSlot<R> {
    next_seq: u64,
    pending: Option<(u64, FetchKey)>,
    last: Option<(FetchKey, Result<R, FetchError>)>,
    last_good: Option<(FetchKey, R)>,
}

impl<R> Default for FetchSlot<R> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            pending: None,
            last: None,
            last_good: None,
        }
    }
}

impl<R: Clone> FetchSlot<R> {
    /// Record a new request for `key` and return its sequence number. Any
    /// earlier request becomes stale.
    pub fn begin(&mut self, key: FetchKey) -> u64 {
        self.next_seq += 1;
        self.pending = Some((self.next_seq, key));
        self.next_seq
    }

    pub fn pending_key(&self) -> Option<&FetchKey> {
        self.pending.as_ref().map(|(_, key)| key)
    }

    pub fn is_pending_for(&self, key: &FetchKey) -> bool {
        self.pending_key() == Some(key)
    }

    /// Apply a response. Returns `false`, leaving the slot untouched, unless
    /// `seq` and `key` match the request in flight.
    pub fn land(&mut self, seq: u64, key: FetchKey, result: Result<R, FetchError>) -> bool {
        match &self.pending {
            Some((pending_seq, pending_key)) if *pending_seq == seq && *pending_key == key => {}
            _ => return false,
        }

        self.pending = None;
        if let Ok(record) = &result {
            self.last_good = Some((key.clone(), record.clone()));
        }
        self.last = Some((key, result));
        true
    }

    fn last_for(&self, key: &FetchKey) -> Option<&Result<R, FetchError>> {
        self.last
            .as_ref()
            .filter(|(last_key, _)| last_key == key)
            .map(|(_, result)| result)
    }

    fn last_good_for(&self, key: &FetchKey) -> Option<&R> {
        self.last_good
            .as_ref()
            .filter(|(good_key, _)| good_key == key)
            .map(|(_, record)| record)
    }
}

pub fn reconcile_overview(
    selection: &Selection,
    slot: &FetchSlot<OverviewRecord>,
) -> ViewState<OverviewRecord> {
    if selection.demo {
        return ViewState::Ready {
            record: demo::overview_record(selection.symbol.as_ref()),
            origin: RecordOrigin::Demo,
        };
    }
    let Some(key) = selection.overview_key() else {
        return ViewState::Ready {
            record: demo::overview_record(None),
            origin: RecordOrigin::Sample,
        };
    };

    live_state(slot, &key, |retained| retained.cloned())
}

/// Chart view model: state plus the headline statistics of the shown series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub range: TimeRange,
    #[serde(flatten)]
    pub state: ViewState<TimeSeriesRecord>,
    pub stats: SeriesStats,
}

impl ChartView {
    pub fn series(&self) -> Option<&TimeSeriesRecord> {
        self.state.displayed_record()
    }
}

pub fn reconcile_chart(
    selection: &Selection,
    slot: &FetchSlot<TimeSeriesRecord>,
    windows: &SeriesWindows,
) -> ChartView {
    let range = selection.range;
    let state = if selection.demo {
        ViewState::Ready {
            record: demo::sample_series(range, windows),
            origin: RecordOrigin::Demo,
        }
    } else if let Some(key) = selection.chart_key() {
        let state = live_state(slot, &key, |retained| {
            Some(retained.cloned().unwrap_or_else(|| {
                TimeSeriesRecord::empty(key.symbol().clone(), "5min")
            }))
        });
        window_live(state, range, windows)
    } else {
        ViewState::Ready {
            record: demo::sample_series(range, windows),
            origin: RecordOrigin::Sample,
        }
    };

    let stats = state
        .displayed_record()
        .map(TimeSeriesRecord::stats)
        .unwrap_or_default();

    ChartView {
        range,
        state,
        stats,
    }
}

fn live_state<R: Clone>(
    slot: &FetchSlot<R>,
    key: &FetchKey,
    retain: impl FnOnce(Option<&R>) -> Option<R>,
) -> ViewState<R> {
    if slot.is_pending_for(key) {
        return ViewState::Loading;
    }

    match slot.last_for(key) {
        Some(Ok(record)) => ViewState::Ready {
            record: record.clone(),
            origin: RecordOrigin::Live,
        },
        Some(Err(error)) => ViewState::Failed {
            error: error.clone(),
            retained: retain(slot.last_good_for(key)),
        },
        None => ViewState::Idle,
    }
}

fn window_live(
    state: ViewState<TimeSeriesRecord>,
    range: TimeRange,
    windows: &SeriesWindows,
) -> ViewState<TimeSeriesRecord> {
    let window = |mut record: TimeSeriesRecord| {
        record.sort_ascending();
        record.retain_latest(windows.window(range));
        record
    };

    match state {
        ViewState::Ready { record, origin } => ViewState::Ready {
            record: window(record),
            origin,
        },
        ViewState::Failed { error, retained } => ViewState::Failed {
            error,
            retained: retained.map(window),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, FetchErrorKind};

    fn symbol(ticker: &str) -> Symbol {
        Symbol::parse(ticker).expect("valid symbol")
    }

    fn overview(ticker: &str) -> OverviewRecord {
        OverviewRecord::from_fields([(field::SYMBOL, ticker), (field::NAME, "Live Co")])
    }

    #[test]
    fn stale_sequence_is_rejected() {
        let mut slot = FetchSlot::default();
        let key = FetchKey::overview(symbol("AAPL"));

        let first = slot.begin(key.clone());
        let second = slot.begin(key.clone());

        assert!(!slot.land(first, key.clone(), Ok(overview("AAPL"))));
        assert!(slot.is_pending_for(&key));
        assert!(slot.land(second, key.clone(), Ok(overview("AAPL"))));
        assert!(!slot.land(second, key, Ok(overview("AAPL"))));
    }

    #[test]
    fn demo_overrides_errors() {
        let mut slot = FetchSlot::default();
        let key = FetchKey::overview(symbol("AAPL"));
        let seq = slot.begin(key.clone());
        slot.land(seq, key, Err(FetchError::rate_limited("Thank you for using Alpha Vantage!")));

        let selection = Selection {
            demo: true,
            ..Selection::default()
        };
        let state = reconcile_overview(&selection, &slot);
        assert!(state.using_demo_data());
        assert_eq!(state.active_error(), None);
    }

    #[test]
    fn no_symbol_shows_sample_records() {
        let selection = Selection {
            symbol: None,
            ..Selection::default()
        };

        let overview = reconcile_overview(&selection, &FetchSlot::default());
        assert!(matches!(
            overview,
            ViewState::Ready {
                origin: RecordOrigin::Sample,
                ..
            }
        ));

        let chart = reconcile_chart(&selection, &FetchSlot::default(), &SeriesWindows::default());
        assert!(!chart.state.using_demo_data());
        assert!(chart.series().is_some_and(|series| !series.is_empty()));
    }

    #[test]
    fn failed_overview_keeps_last_good_record() {
        let mut slot = FetchSlot::default();
        let key = FetchKey::overview(symbol("AAPL"));

        let seq = slot.begin(key.clone());
        slot.land(seq, key.clone(), Ok(overview("AAPL")));
        let seq = slot.begin(key.clone());
        slot.land(seq, key, Err(FetchError::network_failure("timeout")));

        let state = reconcile_overview(&Selection::default(), &slot);
        assert_eq!(state.active_record(), None);
        assert_eq!(
            state.active_error().map(FetchError::kind),
            Some(FetchErrorKind::NetworkFailure)
        );
        assert_eq!(state.displayed_record(), Some(&overview("AAPL")));
    }

    #[test]
    fn failed_chart_without_history_shows_empty_series() {
        let mut slot = FetchSlot::default();
        let key = FetchKey::time_series(symbol("AAPL"), TimeRange::OneMonth);
        let seq = slot.begin(key.clone());
        slot.land(seq, key, Err(FetchError::premium_required("premium endpoint")));

        let chart = reconcile_chart(&Selection::default(), &slot, &SeriesWindows::default());
        let series = chart.series().expect("chart always publishes a series");
        assert!(series.is_empty());
        assert_eq!(series.symbol, symbol("AAPL"));
        assert_eq!(chart.stats, SeriesStats::default());
    }

    #[test]
    fn results_for_another_symbol_are_not_shown() {
        let mut slot = FetchSlot::default();
        let key = FetchKey::overview(symbol("AAPL"));
        let seq = slot.begin(key.clone());
        slot.land(seq, key, Ok(overview("AAPL")));

        let selection = Selection {
            symbol: Some(symbol("MSFT")),
            ..Selection::default()
        };
        assert_eq!(reconcile_overview(&selection, &slot), ViewState::Idle);
    }
}
