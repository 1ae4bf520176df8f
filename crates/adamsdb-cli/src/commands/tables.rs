//! Tables command
//!
//! Usage: adamsdb tables

use super::{CliResult, Session};

pub fn execute(session: &Session) -> CliResult {
    for name in session.sql().table_names()? {
        println!("{}", name);
    }
    Ok(())
}
