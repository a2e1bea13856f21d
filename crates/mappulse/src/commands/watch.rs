//! `mappulse watch`: live polling with throttled rendering.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mappulse_core::{DevicePoller, PollState, StateProjection};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::{Session, util};

pub async fn handle(args: WatchArgs, session: Session, global: &GlobalOpts) -> Result<(), CliError> {
    let Session {
        client,
        poller,
        projection,
        errors,
    } = session;

    let poller = DevicePoller::new(client, poller);
    let painter = Painter::new(global.color);
    let query = util::view_query(&args.view);

    let (tx, mut updates) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let forwarder = StateProjection::new(poller.subscribe(), &projection).spawn(tx, cancel.clone());
    let mut states = poller.subscribe();

    poller.start().map_err(|e| errors.core_error(e))?;
    if !global.quiet {
        eprintln!(
            "{}",
            painter.dim(&format!(
                "Polling {} every {}s, Ctrl-C to stop",
                errors.host,
                poller.interval().as_secs()
            ))
        );
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut delivered: u64 = 0;
    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break Ok(());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = states.borrow_and_update().clone();
                if let PollState::Failure(err) = state {
                    if let Some(status @ (401 | 403)) = err.status() {
                        break Err(CliError::AuthFailed {
                            status,
                            profile: errors.profile.clone(),
                        });
                    }
                    if !global.quiet {
                        eprintln!(
                            "{}",
                            painter.warn(&format!(
                                "Poll failed: {err}; retrying in {}s",
                                poller.interval().as_secs()
                            ))
                        );
                    }
                }
            }
            update = updates.recv() => {
                let Some(devices) = update else {
                    break Ok(());
                };
                delivered += 1;
                let view = query.apply(&devices);

                if global.output == OutputFormat::Table && !global.quiet {
                    eprintln!(
                        "{}",
                        painter.ok(&format!(
                            "Update {delivered} at {}: {} of {} devices",
                            chrono::Utc::now().format("%H:%M:%S"),
                            view.len(),
                            devices.len()
                        ))
                    );
                }
                match util::render_devices(global.output, &view) {
                    Ok(out) => output::print_output(&out, global.quiet),
                    Err(e) => break Err(e),
                }

                if args.count.is_some_and(|limit| delivered >= limit) {
                    break Ok(());
                }
            }
        }
    };

    cancel.cancel();
    poller.shutdown().await;
    if let Err(e) = forwarder.await {
        tracing::warn!(error = %e, "projection task ended abnormally");
    }
    tracing::info!(updates = delivered, "watch finished");
    outcome
}
