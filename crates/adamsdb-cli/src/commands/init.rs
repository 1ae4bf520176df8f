//! Init command
//!
//! Usage: adamsdb init

use super::{CliResult, Session};

pub fn execute(session: &Session) -> CliResult {
    session.log_table().init()?;
    println!("initialized {}", session.config.database.url);
    Ok(())
}
