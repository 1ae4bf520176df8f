//! adams-db CLI
//!
//! Command-line interface over a configured log database

use adamsdb_core::types::RequestContext;
use adamsdb_core::ExError;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "adamsdb")]
#[command(about = "adams-db - Relational log-record store", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the LOG table
    Init,
    /// Store a new log record
    Add(commands::add::AddArgs),
    /// Print one record as JSON
    Get(commands::get::GetArgs),
    /// Print matching records as JSON lines
    Query(commands::query::QueryArgs),
    /// Change the status of a stored record
    UpdateStatus(commands::update_status::UpdateStatusArgs),
    /// Delete a stored record
    Remove(commands::remove::RemoveArgs),
    /// List the tables of the database
    Tables,
}

fn main() {
    let cli = Cli::parse();

    let ctx = RequestContext::new();
    let result = commands::Session::open(&cli.global).and_then(|session| {
        let span = tracing::info_span!("cli", request_id = %ctx.request_id);
        let _enter = span.enter();

        match cli.command {
            Commands::Init => commands::init::execute(&session),
            Commands::Add(args) => commands::add::execute(&session, args),
            Commands::Get(args) => commands::get::execute(&session, args),
            Commands::Query(args) => commands::query::execute(&session, args),
            Commands::UpdateStatus(args) => commands::update_status::execute(&session, args),
            Commands::Remove(args) => commands::remove::execute(&session, args),
            Commands::Tables => commands::tables::execute(&session),
        }
    });

    let result = result.map_err(|e| match e.downcast::<ExError>() {
        Ok(ex) => Box::new((*ex).with_context(&ctx)) as Box<dyn std::error::Error>,
        Err(other) => other,
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
