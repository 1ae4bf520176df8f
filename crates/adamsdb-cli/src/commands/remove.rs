//! Remove command
//!
//! Usage: adamsdb remove <ID>

use super::{CliResult, Session};
use clap::Args;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub id: i64,
}

pub fn execute(session: &Session, args: RemoveArgs) -> CliResult {
    let record = session.require_record(args.id)?;
    if !session.log_table().remove(&record)? {
        return Err(format!("record {} was not removed", args.id).into());
    }
    println!("removed {}", args.id);
    Ok(())
}
