use std::process::ExitCode;
use std::sync::Arc;

use stockboard_core::{MarketGateway, TimeRange, View};

use crate::cli::{Cli, OverviewArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    cli: &Cli,
    args: &OverviewArgs,
    gateway: Arc<dyn MarketGateway>,
) -> Result<ExitCode, CliError> {
    let mut state = super::one_shot_state(cli, &args.symbol, TimeRange::default())?;
    super::load_view(
        gateway.as_ref(),
        &mut state,
        View::Overview,
        super::cache_mode(args.refresh),
    )
    .await;

    let view = state.overview_view();
    output::render_overview(&mut std::io::stdout().lock(), &view, cli.format, cli.pretty)?;

    Ok(super::exit_code(view.active_error().is_some()))
}
