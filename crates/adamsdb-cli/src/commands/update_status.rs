//! Update-status command
//!
//! Usage: adamsdb update-status <ID> <STATUS>

use super::{CliResult, Session};
use clap::Args;

#[derive(Debug, Args)]
pub struct UpdateStatusArgs {
    pub id: i64,
    pub status: String,
}

pub fn execute(session: &Session, args: UpdateStatusArgs) -> CliResult {
    let mut record = session.require_record(args.id)?;
    record.status = args.status;
    if !session.log_table().update(&record)? {
        return Err(format!("record {} was not updated", args.id).into());
    }
    println!("updated {}", args.id);
    Ok(())
}
