//! CLI commands and the shared session they run against

use adamsdb_core::errors::{ExError, ExErrorKind};
use adamsdb_core::logging_facility;
use adamsdb_core::model::parse_timestamp;
use adamsdb_core::LogRecord;
use adamsdb_store::{DatabaseConnection, LogTable, Sql, StoreConfig, StoreContext};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

pub mod add;
pub mod get;
pub mod init;
pub mod query;
pub mod remove;
pub mod tables;
pub mod update_status;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL, overrides `database.url` from the config file
    #[arg(long, global = true, env = "ADAMSDB_DB")]
    pub db: Option<String>,
}

/// Configuration, connection and table registry for one invocation
pub struct Session {
    pub config: StoreConfig,
    dbcon: Arc<DatabaseConnection>,
    context: StoreContext,
}

impl Session {
    pub fn open(args: &GlobalArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => StoreConfig::load(path).map_err(ExError::from)?,
            None => StoreConfig::default(),
        };
        if let Some(db) = &args.db {
            config = config.with_url(db.clone());
        }

        logging_facility::init(config.logging.profile);

        let dbcon = DatabaseConnection::open(config.to_params())?;
        Ok(Self {
            config,
            dbcon,
            context: StoreContext::new(),
        })
    }

    pub fn log_table(&self) -> Arc<LogTable> {
        self.context.log_table(&self.dbcon)
    }

    pub fn sql(&self) -> Arc<Sql> {
        self.context.sql(&self.dbcon)
    }

    /// Load a record or fail with `NotFound`
    pub fn require_record(&self, id: i64) -> CliResult<LogRecord> {
        self.log_table().load(id)?.ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_entity_id(id.to_string())
                .with_message("no such log record")
                .into()
        })
    }
}

/// clap value parser for generation timestamps
pub fn parse_generation(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).map_err(|e| e.to_string())
}
