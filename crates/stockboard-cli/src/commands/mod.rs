mod chart;
mod overview;
mod symbols;
mod watch;

use std::process::ExitCode;
use std::sync::Arc;

use stockboard_core::dashboard::execute;
use stockboard_core::{
    AlphaVantageGateway, CacheMode, ConfigError, DashboardConfig, DashboardState, GatewayConfig,
    MarketGateway, Selection, Symbol, TimeRange, View,
};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Exit code when a view ended in a fetch error.
const FETCH_FAILED: u8 = 3;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    match &cli.command {
        Command::Overview(args) => overview::run(cli, args, gateway(cli)?).await,
        Command::Chart(args) => chart::run(cli, args, gateway(cli)?).await,
        Command::Watch(args) => watch::run(cli, args, gateway(cli)?).await,
        Command::Symbols => symbols::run(cli),
    }
}

fn gateway(cli: &Cli) -> Result<Arc<dyn MarketGateway>, CliError> {
    let mut config = GatewayConfig::from_env()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "--timeout-ms",
                expected: "a positive integer of milliseconds",
                value: timeout_ms.to_string(),
            }
            .into());
        }
        config = config.with_timeout_ms(timeout_ms);
    }
    debug!(?config, "gateway configuration");

    Ok(Arc::new(AlphaVantageGateway::new(config)))
}

/// Dashboard state for a one-shot command on `symbol`.
fn one_shot_state(cli: &Cli, symbol: &str, range: TimeRange) -> Result<DashboardState, CliError> {
    let selection = Selection {
        symbol: Some(Symbol::listed(symbol)?),
        range,
        demo: cli.demo,
    };
    Ok(DashboardState::with_selection(
        DashboardConfig::default(),
        selection,
    ))
}

fn cache_mode(refresh: bool) -> CacheMode {
    if refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    }
}

/// Fetch one view and apply the response. Nothing is fetched in demo mode.
async fn load_view(
    gateway: &dyn MarketGateway,
    state: &mut DashboardState,
    view: View,
    cache_mode: CacheMode,
) {
    if let Some(command) = state.load(view, cache_mode) {
        let response = execute(gateway, command).await;
        state.apply(response);
    }
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::from(FETCH_FAILED)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use stockboard_core::{
        FetchError, FetchKey, FetchOutcome, GatewayFuture, OverviewRecord, TimeSeriesRecord,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingGateway {
        modes: Mutex<Vec<CacheMode>>,
    }

    impl RecordingGateway {
        fn record(&self, mode: CacheMode) {
            self.modes.lock().expect("mode log should not be poisoned").push(mode);
        }
    }

    impl MarketGateway for RecordingGateway {
        fn fetch_overview<'a>(
            &'a self,
            _symbol: Symbol,
            mode: CacheMode,
        ) -> GatewayFuture<'a, FetchOutcome<OverviewRecord>> {
            self.record(mode);
            Box::pin(async { Err(FetchError::network_failure("offline")) })
        }

        fn fetch_time_series<'a>(
            &'a self,
            _symbol: Symbol,
            _range: TimeRange,
            mode: CacheMode,
        ) -> GatewayFuture<'a, FetchOutcome<TimeSeriesRecord>> {
            self.record(mode);
            Box::pin(async { Err(FetchError::network_failure("offline")) })
        }

        fn invalidate<'a>(&'a self, _key: &'a FetchKey) -> GatewayFuture<'a, ()> {
            Box::pin(async {})
        }
    }

    fn state(demo: bool) -> DashboardState {
        DashboardState::with_selection(
            DashboardConfig::default(),
            Selection {
                symbol: Some(Symbol::initial()),
                range: TimeRange::default(),
                demo,
            },
        )
    }

    #[tokio::test]
    async fn refresh_flag_bypasses_the_cache_for_one_shot_loads() {
        let gateway = RecordingGateway::default();
        let mut live = state(false);

        load_view(&gateway, &mut live, View::Overview, cache_mode(true)).await;
        load_view(&gateway, &mut live, View::Chart, cache_mode(false)).await;

        let modes = gateway.modes.lock().expect("mode log should not be poisoned").clone();
        assert_eq!(modes, vec![CacheMode::Refresh, CacheMode::Use]);
        assert!(live.overview_view().active_error().is_some());
    }

    #[tokio::test]
    async fn demo_one_shot_loads_never_call_the_gateway() {
        let gateway = RecordingGateway::default();
        let mut demo = state(true);

        load_view(&gateway, &mut demo, View::Overview, cache_mode(true)).await;

        assert!(gateway.modes.lock().expect("mode log should not be poisoned").is_empty());
        assert!(demo.overview_view().using_demo_data());
    }
}
