use anyhow::{anyhow, Result};
use keystone_core::{
    config::AppConfig,
    derived::{format_tokens, LotterySnapshot},
    registry::validate_address_format,
};
use prettytable::{row, Table};

use super::utils::{open_session, print_info, print_warning};

/// Validates the registry, then reads and prints the lottery snapshot for `address`.
pub async fn account(config: AppConfig, address: &str, json: bool) -> Result<()> {
    let account = validate_address_format(address).map_err(|e| anyhow!("{address}: {e}"))?;
    let tiers = config.tier_table();
    let default_threshold = config.default_threshold();
    let decimals = tiers.decimals();

    let session = open_session(config, Some(format!("{account:#x}")))?;
    session.start().await?;
    let health = session.health().current().summary;

    let snapshot = session.reader().lottery_snapshot(account, &tiers, default_threshold, &health).await;
    session.teardown().await;
    let snapshot = snapshot?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot, decimals);
    }
    Ok(())
}

fn print_snapshot(snapshot: &LotterySnapshot, decimals: u8) {
    if !snapshot.trustworthy {
        print_warning("Contract registry is unhealthy; values below may be wrong");
    }

    let proposal = snapshot.proposal_id.map_or("none".to_string(), |id| id.to_string());
    let mut table = Table::new();
    table.add_row(row!["Account", format!("{:#x}", snapshot.account)]);
    table.add_row(row!["Balance", format_tokens(snapshot.balance, decimals)]);
    table.add_row(row![
        "Threshold",
        format!("{} ({:?})", format_tokens(snapshot.threshold, decimals), snapshot.threshold_source)
    ]);
    table.add_row(row!["Eligible", if snapshot.eligibility.threshold_met { "yes" } else { "no" }]);
    table.add_row(row![
        "Tier",
        format!(
            "{} ({}% to {})",
            snapshot.membership.tier_name,
            snapshot.membership.progress_percent,
            snapshot.membership.next_tier.as_deref().unwrap_or("top")
        )
    ]);
    table.add_row(row!["Proposal", proposal]);
    table.add_row(row!["Pool", format_tokens(snapshot.pool_amount, decimals)]);
    table.add_row(row!["Total Staked", format_tokens(snapshot.total_staked, decimals)]);
    table.add_row(row!["Win Chance", format!("{:.2}%", snapshot.account_share_percent)]);
    table.printstd();

    if snapshot.participants.is_empty() {
        print_info("No eligible participants for the latest proposal");
        return;
    }

    let mut participants = Table::new();
    participants.add_row(row!["Participant", "Balance", "Share"]);
    for share in &snapshot.participants {
        participants.add_row(row![
            format!("{:#x}", share.address),
            format_tokens(share.balance, decimals),
            format!("{:.2}%", share.share_percent),
        ]);
    }
    participants.printstd();
}
