use std::process::ExitCode;
use std::sync::Arc;

use stockboard_core::{Dashboard, DashboardConfig, MarketGateway, TimeRange};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::cli::{Cli, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Samples printed per chart update.
const CHART_POINTS: usize = 5;

const HELP: &str =
    "commands: symbol <TICKER> | clear | range <1week|1month|3months> | demo | refresh | quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Symbol(String),
    Clear,
    Range(String),
    Demo,
    Refresh,
    Quit,
    Help,
    Unknown(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let argument = words.next().map(str::to_owned);

    let input = match (command.as_str(), argument) {
        ("symbol" | "s", Some(symbol)) => Input::Symbol(symbol),
        ("range" | "r", Some(range)) => Input::Range(range),
        ("clear", None) => Input::Clear,
        ("demo", None) => Input::Demo,
        ("refresh", None) => Input::Refresh,
        ("quit" | "exit" | "q", None) => Input::Quit,
        ("help" | "?", None) => Input::Help,
        _ => Input::Unknown(line.trim().to_owned()),
    };
    Some(input)
}

pub async fn run(
    cli: &Cli,
    args: &WatchArgs,
    gateway: Arc<dyn MarketGateway>,
) -> Result<ExitCode, CliError> {
    let config = DashboardConfig::default();
    let initial_range = args
        .range
        .as_deref()
        .map(str::parse::<TimeRange>)
        .transpose()?;

    let mut dashboard = Dashboard::new(gateway, config);
    if cli.demo {
        dashboard.toggle_demo_data();
    }
    match &args.symbol {
        Some(symbol) => dashboard.select_symbol(symbol)?,
        None => dashboard.start(),
    }
    if let Some(range) = initial_range {
        dashboard.select_time_range(range);
    }

    eprintln!("{HELP}");
    render(cli, &dashboard)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut auto_refresh = tokio::time::interval(config.auto_refresh);
    auto_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    auto_refresh.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(input) = parse_input(&line) else {
                    continue;
                };
                match input {
                    Input::Quit => break,
                    Input::Help => {
                        eprintln!("{HELP}");
                        continue;
                    }
                    Input::Unknown(text) => {
                        eprintln!("unknown command '{text}'; {HELP}");
                        continue;
                    }
                    Input::Symbol(symbol) => {
                        if let Err(error) = dashboard.select_symbol(&symbol) {
                            eprintln!("error: {error}");
                            continue;
                        }
                    }
                    Input::Range(range) => match range.parse::<TimeRange>() {
                        Ok(range) => dashboard.select_time_range(range),
                        Err(error) => {
                            eprintln!("error: {error}");
                            continue;
                        }
                    },
                    Input::Clear => dashboard.clear_symbol(),
                    Input::Demo => dashboard.toggle_demo_data(),
                    Input::Refresh => dashboard.refresh(),
                }
                render(cli, &dashboard)?;
            }
            _ = auto_refresh.tick() => {
                debug!("auto-refresh tick");
                dashboard.auto_refresh_tick();
            }
            applied = dashboard.next_update() => {
                if applied {
                    render(cli, &dashboard)?;
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn render(cli: &Cli, dashboard: &Dashboard) -> Result<(), CliError> {
    output::render_dashboard(
        &mut std::io::stdout().lock(),
        dashboard.state(),
        CHART_POINTS,
        cli.format,
        cli.pretty,
    )
}
