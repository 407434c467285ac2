use std::process::ExitCode;
use std::sync::Arc;

use stockboard_core::{MarketGateway, TimeRange, View};

use crate::cli::{ChartArgs, Cli};
use crate::error::CliError;
use crate::output;

pub async fn run(
    cli: &Cli,
    args: &ChartArgs,
    gateway: Arc<dyn MarketGateway>,
) -> Result<ExitCode, CliError> {
    let range = args.range.parse::<TimeRange>()?;
    let mut state = super::one_shot_state(cli, &args.symbol, range)?;
    super::load_view(
        gateway.as_ref(),
        &mut state,
        View::Chart,
        super::cache_mode(args.refresh),
    )
    .await;

    let view = state.chart_view();
    output::render_chart(
        &mut std::io::stdout().lock(),
        &view,
        args.points,
        cli.format,
        cli.pretty,
    )?;

    Ok(super::exit_code(view.state.active_error().is_some()))
}
