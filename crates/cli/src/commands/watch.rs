use anyhow::Result;
use keystone_core::{config::AppConfig, reload::HealthState};
use tracing::info;

use super::utils::{open_session, print_info, print_results};

fn report(state: &HealthState) {
    let at = state.updated_at.map_or("-".to_string(), |t| t.format("%H:%M:%S").to_string());
    println!(
        "[{at}] {} ({}/{})",
        state.summary.status, state.summary.valid_count, state.summary.total_count
    );
    if let Some(note) = &state.note {
        println!("  note: {note}");
    }
}

/// Starts a session and prints every health change until Ctrl-C.
pub async fn watch(config: AppConfig, identity: Option<String>, verbose: bool) -> Result<()> {
    let session = open_session(config, identity)?;

    let subscription = session.health().subscribe(move |state| {
        report(state);
        if verbose {
            print_results(&state.results);
        }
    });

    let outcome = session.start().await?;
    info!(outcome = outcome.label(), "watching registry health");
    print_info("Watching for registry changes, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    subscription.unsubscribe();
    session.teardown().await;
    print_info("Stopped");
    Ok(())
}
