//! Get command
//!
//! Usage: adamsdb get <ID>

use super::{CliResult, Session};
use clap::Args;

#[derive(Debug, Args)]
pub struct GetArgs {
    pub id: i64,
}

pub fn execute(session: &Session, args: GetArgs) -> CliResult {
    let record = session.require_record(args.id)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
