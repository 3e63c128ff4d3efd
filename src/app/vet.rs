//! The `vet` command.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    helpers::{calculate_exit_code, create_output_options},
    types::{VetParams, VetResult}
};
use crate::{
    catalog::{FileCatalog, config_dir},
    config::Config,
    database::{Connector, SqlxConnector},
    error::AppResult,
    output::format_report,
    vet::Vetter
};

/// Runs the vet command with the real database connector.
///
/// # Errors
///
/// Returns an error for configuration problems, query files that cannot be
/// read, rules that fail to compile or evaluate, connection failures and
/// cancellation.
pub async fn run_vet(params: VetParams, cancel: CancellationToken) -> AppResult<VetResult> {
    run_vet_with(params, &SqlxConnector, cancel).await
}

/// Runs the vet command with the given connector.
pub async fn run_vet_with(
    params: VetParams,
    connector: &dyn Connector,
    cancel: CancellationToken
) -> AppResult<VetResult> {
    let config_path = Config::locate(&params.working_dir, params.config_file.as_deref())?;
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)?;
    let catalog = FileCatalog::new(config_dir(&config_path));

    let vetter = Vetter::new(&config, &catalog, connector)?
        .with_no_database(params.no_database)
        .with_cancellation(cancel);
    let report = vetter.run().await?;
    info!(
        checked = report.queries_checked,
        skipped = report.queries_skipped,
        violations = report.violations.len(),
        load_failures = report.load_failures.len(),
        "vet finished"
    );

    let opts = create_output_options(params.output_format, params.no_color);
    Ok(VetResult {
        exit_code: calculate_exit_code(&report),
        output: format_report(&report, &opts),
        to_stderr: opts.writes_to_stderr(),
        report
    })
}
