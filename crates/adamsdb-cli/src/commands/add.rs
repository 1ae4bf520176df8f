//! Add command
//!
//! Usage: adamsdb add --host <HOST> --type <TYPE> [--generation <TIME>] [--property K=V]...

use super::{parse_generation, CliResult, Session};
use adamsdb_core::LogRecord;
use chrono::{DateTime, Utc};
use clap::Args;
use std::collections::BTreeMap;

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub host: String,

    #[arg(long, default_value = "")]
    pub ip: String,

    #[arg(long = "type")]
    pub log_type: String,

    #[arg(long, default_value = "")]
    pub status: String,

    #[arg(long, default_value = "")]
    pub source: String,

    #[arg(long, default_value = "")]
    pub message: String,

    /// Defaults to now
    #[arg(long, value_parser = parse_generation)]
    pub generation: Option<DateTime<Utc>>,

    /// Message property, replaces --message when given
    #[arg(long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

fn parse_property(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))
}

pub fn execute(session: &Session, args: AddArgs) -> CliResult {
    let mut record = LogRecord::new(
        args.host,
        args.ip,
        args.log_type,
        args.status,
        args.message,
        args.source,
        args.generation.unwrap_or_else(Utc::now),
    );
    if !args.properties.is_empty() {
        let properties: BTreeMap<String, String> = args.properties.into_iter().collect();
        record = record.with_properties(&properties);
    }

    session.log_table().add(&mut record)?;
    match record.id() {
        Some(id) => println!("{}", id),
        None => return Err("store did not assign an id".into()),
    }
    Ok(())
}
