//! Query command
//!
//! Prints one JSON object per matching record. String filters are regular
//! expressions.

use super::{parse_generation, CliResult, Session};
use adamsdb_core::LogQuery;
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub ip: Option<String>,

    #[arg(long = "type")]
    pub log_type: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub source: Option<String>,

    /// Inclusive lower bound on generation
    #[arg(long, value_parser = parse_generation)]
    pub from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on generation
    #[arg(long, value_parser = parse_generation)]
    pub to: Option<DateTime<Utc>>,

    /// Zero or negative means unlimited
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Newest first
    #[arg(long)]
    pub latest: bool,
}

impl QueryArgs {
    fn to_query(&self) -> LogQuery {
        LogQuery {
            host: self.host.clone(),
            ip: self.ip.clone(),
            log_type: self.log_type.clone(),
            status: self.status.clone(),
            source: self.source.clone(),
            generation_start: self.from,
            generation_end: self.to,
            limit: self.limit,
            latest: self.latest,
        }
    }
}

pub fn execute(session: &Session, args: QueryArgs) -> CliResult {
    let records = session.log_table().load_matching(&args.to_query())?;
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}
