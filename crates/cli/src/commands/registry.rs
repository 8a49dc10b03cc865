use anyhow::{anyhow, Result};
use keystone_core::{
    config::AppConfig,
    discovery::diff,
    registry::CandidateSet,
    reload::PassOutcome,
    types::ContractName,
};
use prettytable::{row, Table};
use std::time::Duration;

use super::utils::{
    open_session, parse_assignments, print_error, print_info, print_registry, print_results, print_success,
    print_warning,
};

/// Resolves every contract, runs one validation pass and prints the outcome.
pub async fn status(config: AppConfig, identity: Option<String>) -> Result<()> {
    let wait = config.debounce() + config.probe_timeout() + Duration::from_secs(1);
    let session = open_session(config, identity)?;

    print_registry(&session.resolver().get_all());

    let mut health = session.health().watch();
    let outcome = session.start().await?;

    match outcome {
        PassOutcome::Healthy { summary, ready_notice } => {
            print_results(&session.health().current().results);
            print_success(&format!("{} ({}/{})", summary.status, summary.valid_count, summary.total_count));
            if ready_notice {
                print_info("All contracts are deployed and ready");
            }
        }
        PassOutcome::Degraded(report) => {
            print_results(&report.results);
            print_warning(&format!(
                "{} ({}/{})",
                report.summary.status, report.summary.valid_count, report.summary.total_count
            ));
            if let Some(error) = report.discovery_error {
                print_error(&format!("Discovery: {error}"));
            }
        }
        PassOutcome::ReloadPending { changed } => {
            print_info(&format!("Discovery replaced {}; reloading", join_names(&changed)));
            if tokio::time::timeout(wait, health.changed()).await.is_ok() {
                let state = session.health().current();
                print_results(&state.results);
                print_info(&format!("{} after reload", state.summary.status));
            } else {
                print_warning("Reload did not finish in time");
            }
        }
        other => {
            print_warning(&format!("Pass ended early: {}", other.label()));
        }
    }

    session.teardown().await;
    Ok(())
}

/// Persists overrides given as `NAME=ADDRESS`.
pub fn set(config: AppConfig, assignments: &[String]) -> Result<()> {
    let edits = parse_assignments(assignments)?;
    let session = open_session(config, None)?;
    let report = session.resolver().update(&edits)?;

    for name in &report.applied {
        print_success(&format!("{name} = {:#x}", session.resolver().resolve(*name)));
    }
    for name in &report.skipped {
        print_info(&format!("{name}: empty value, left unchanged"));
    }
    for error in &report.errors {
        print_error(&error.to_string());
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{} address(es) rejected", report.errors.len()))
    }
}

/// Removes overrides, or all of them when no names are given.
pub fn reset(config: AppConfig, names: &[String]) -> Result<()> {
    let names = names
        .iter()
        .map(|name| name.parse::<ContractName>().map_err(|e| anyhow!("{e}")))
        .collect::<Result<Vec<_>>>()?;
    let session = open_session(config, None)?;

    if names.is_empty() {
        session.resolver().reset_all()?;
        print_success("All overrides removed");
    } else {
        session.resolver().reset(&names)?;
        print_success(&format!("Overrides removed: {}", join_names(&names)));
    }

    print_registry(&session.resolver().get_all());
    Ok(())
}

/// Runs the configured discovery source and shows how it differs from the current registry.
pub async fn discover(config: AppConfig, apply: bool) -> Result<()> {
    let session = open_session(config, None)?;
    let discovery = session.discovery();
    print_info(&format!("Running {} discovery...", discovery.name()));

    let candidates = discovery.discover().await?;
    let current = session.resolver().get_all().addresses();
    let changed = diff(&current, &candidates);

    let mut table = Table::new();
    table.add_row(row!["Contract", "Current", "Candidate", "Changed"]);
    for name in ContractName::ALL {
        table.add_row(row![
            name,
            current.get(&name).map_or("-".to_string(), |a| format!("{a:#x}")),
            candidates.get(&name).map_or("-".to_string(), |a| format!("{a:#x}")),
            if changed.contains(&name) { "yes" } else { "" },
        ]);
    }
    table.printstd();

    if changed.is_empty() {
        print_info("Registry already matches the discovered deployment");
    } else if apply {
        let repair: CandidateSet =
            changed.iter().filter_map(|name| candidates.get(name).map(|a| (*name, *a))).collect();
        let report = session.resolver().apply_candidates(&repair)?;
        print_success(&format!("Applied {} override(s)", report.applied.len()));
    } else {
        print_info("Re-run with --apply to persist the changed entries");
    }

    Ok(())
}

fn join_names(names: &[ContractName]) -> String {
    names.iter().map(ContractName::as_str).collect::<Vec<_>>().join(", ")
}
