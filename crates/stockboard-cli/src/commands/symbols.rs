use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output;

pub fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    output::render_symbols(&mut std::io::stdout().lock(), cli.format, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}
