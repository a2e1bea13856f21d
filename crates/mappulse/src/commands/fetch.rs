//! `mappulse fetch`: one-shot listing.

use mappulse_core::DevicePoller;

use crate::cli::{FetchArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

pub async fn handle(args: FetchArgs, session: Session, global: &GlobalOpts) -> Result<(), CliError> {
    let Session {
        client,
        poller,
        errors,
        ..
    } = session;

    // The loop is never started; this is the poller's one-shot path.
    let poller = DevicePoller::new(client, poller);
    let devices = poller
        .fetch_once()
        .await
        .map_err(|e| errors.core_error(e))?;

    let view = util::view_query(&args.view).apply(&devices);
    tracing::info!(total = devices.len(), shown = view.len(), "devices fetched");

    let out = util::render_devices(global.output, &view)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
