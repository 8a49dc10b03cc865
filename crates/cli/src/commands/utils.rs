use anyhow::{anyhow, bail, Result};
use keystone_core::{
    config::AppConfig,
    health::ValidationResult,
    registry::ContractRegistry,
    session::{Session, SessionBuilder},
    types::ContractName,
};
use prettytable::{row, Table};
use std::collections::BTreeMap;

pub fn print_success(message: &str) {
    println!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    println!("[INFO] {message}");
}

pub fn print_warning(message: &str) {
    println!("[WARNING] {message}");
}

/// Builds a session from `config` and tags it with `identity` for the ready marker.
pub fn open_session(config: AppConfig, identity: Option<String>) -> Result<Session> {
    let session = SessionBuilder::new().with_config(config).build()?;
    session.coordinator().set_identity(identity);
    Ok(session)
}

/// Parses `NAME=ADDRESS`. The address is returned untouched; validation happens on update.
pub fn parse_assignment(input: &str) -> Result<(ContractName, String)> {
    let Some((name, value)) = input.split_once('=') else {
        bail!("expected NAME=ADDRESS, got {input:?}");
    };
    let name: ContractName = name.parse().map_err(|e| anyhow!("{e}"))?;
    Ok((name, value.trim().to_string()))
}

/// Parses every assignment; a later assignment to the same contract wins.
pub fn parse_assignments(inputs: &[String]) -> Result<BTreeMap<ContractName, String>> {
    inputs.iter().map(|input| parse_assignment(input)).collect()
}

pub fn print_registry(registry: &ContractRegistry) {
    let mut table = Table::new();
    table.add_row(row!["Contract", "Address", "Source"]);
    for (name, entry) in registry.iter() {
        table.add_row(row![name, format!("{:#x}", entry.address), entry.source.as_str()]);
    }
    table.printstd();
}

pub fn print_results(results: &[ValidationResult]) {
    let mut table = Table::new();
    table.add_row(row!["Contract", "Address", "Valid", "Code Size", "Detail"]);
    for result in results {
        table.add_row(row![
            result.name,
            format!("{:#x}", result.address),
            if result.valid { "[SUCCESS]" } else { "[ERROR]" },
            result.code_len.map_or("-".to_string(), |len| format!("{len} bytes")),
            result
                .reason
                .map(|reason| match &result.detail {
                    Some(detail) => format!("{}: {detail}", reason.as_str()),
                    None => reason.as_str().to_string(),
                })
                .unwrap_or_default(),
        ]);
    }
    table.printstd();
}
