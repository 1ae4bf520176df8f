#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for the LogTable façade

use adamsdb_core::{ExErrorKind, LogQuery, LogRecord};
use adamsdb_store::{ConnectionParams, DatabaseConnection, LogTable, Sql};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn setup_table() -> LogTable {
    LogTable::new(DatabaseConnection::open_in_memory().unwrap())
}

fn sample(generation: DateTime<Utc>) -> LogRecord {
    LogRecord::new("h1", "10.0.0.1", "ERR", "NEW", "boom", "svc-a", generation)
}

fn entry(host: &str, log_type: &str, source: &str, generation: DateTime<Utc>) -> LogRecord {
    LogRecord::new(host, "10.0.0.1", log_type, "NEW", "msg", source, generation)
}

#[test]
fn test_unpersisted_record_does_not_exist() {
    let table = setup_table();
    let mut r = sample(t0());
    assert!(!table.exists(&r).unwrap());

    table.add(&mut r).unwrap();
    assert!(table.exists(&r).unwrap());

    // Same content, no id
    assert!(!table.exists(&sample(t0())).unwrap());
}

#[test]
fn test_store_then_load_unfiltered() {
    let table = setup_table();
    let mut r = sample(t0());
    assert!(table.add(&mut r).unwrap());

    let loaded = table.load_matching(&LogQuery::new()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].same_content(&sample(t0())));
    assert_eq!(loaded[0].id(), r.id());
    assert_eq!(loaded[0].host, "h1");
    assert_eq!(loaded[0].ip, "10.0.0.1");
    assert_eq!(loaded[0].log_type, "ERR");
    assert_eq!(loaded[0].message, "boom");
    assert_eq!(loaded[0].generation, t0());
    assert_eq!(loaded[0].source, "svc-a");
    assert_eq!(loaded[0].status, "NEW");
}

#[test]
fn test_round_trip_preserves_microseconds() {
    let table = setup_table();
    let generation = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let mut r = sample(generation);
    table.add(&mut r).unwrap();

    let loaded = table.load(r.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded, r);
    assert_eq!(loaded.generation.timestamp_subsec_micros(), 123_456);
}

#[test]
fn test_generation_assigned_directly_round_trips() {
    let table = setup_table();
    let mut r = sample(t0());
    r.generation = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    table.add(&mut r).unwrap();
    assert_eq!(r.generation.timestamp_subsec_nanos(), 123_456_000);

    let loaded = table.load_matching(&LogQuery::new()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].same_content(&r));
    assert_eq!(loaded[0], r);
}

#[test]
fn test_out_of_range_generation_is_rejected_before_sql() {
    let table = setup_table();
    let mut r = sample(Utc.with_ymd_and_hms(12_000, 1, 1, 0, 0, 0).unwrap());

    let err = table.add(&mut r).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert!(r.id().is_none());
    assert!(!table.table_exists().unwrap());
}

#[test]
fn test_add_recreates_dropped_table() {
    let table = setup_table();
    let mut first = sample(t0());
    table.add(&mut first).unwrap();

    Sql::new(Arc::clone(table.database_connection()))
        .drop("LOG")
        .unwrap();
    assert!(!table.table_exists().unwrap());

    let mut second = sample(t0() + Duration::minutes(1));
    assert!(table.add(&mut second).unwrap());
    assert!(second.id().is_some());
    assert_eq!(table.count().unwrap(), 1);
    assert!(table.load_matching(&LogQuery::new()).unwrap()[0].same_content(&second));
}

#[test]
fn test_add_is_idempotent_for_stored_record() {
    let table = setup_table();
    let mut r = sample(t0());
    assert!(table.add(&mut r).unwrap());
    let id = r.id();

    assert!(table.add(&mut r).unwrap());
    assert_eq!(r.id(), id);
    assert_eq!(table.count().unwrap(), 1);
}

#[test]
fn test_update_missing_record_changes_nothing() {
    let table = setup_table();
    let mut stored = sample(t0());
    table.add(&mut stored).unwrap();

    let mut ghost = sample(t0());
    ghost.assign_id(999).unwrap();
    ghost.status = "CHANGED".to_string();
    assert!(!table.update(&ghost).unwrap());

    let all = table.load_matching(&LogQuery::new()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, "NEW");
    assert!(!table.exists(&ghost).unwrap());
}

#[test]
fn test_update_existing_record() {
    let table = setup_table();
    let mut r = sample(t0());
    table.add(&mut r).unwrap();

    r.status = "DONE".to_string();
    r.message = "handled".to_string();
    assert!(table.update(&r).unwrap());

    let loaded = table.load(r.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.status, "DONE");
    assert_eq!(loaded.message, "handled");
}

#[test]
fn test_update_without_id_is_false() {
    let table = setup_table();
    assert!(!table.update(&sample(t0())).unwrap());
}

#[test]
fn test_latest_with_limit_one_returns_newest() {
    let table = setup_table();
    let mut older = sample(t0());
    let mut newer = sample(t0() + Duration::seconds(1));
    table.add(&mut older).unwrap();
    table.add(&mut newer).unwrap();

    let result = table
        .load_matching(&LogQuery::new().latest(true).limit(1))
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].generation, t0() + Duration::seconds(1));
    assert_eq!(result[0].id(), newer.id());
}

#[test]
fn test_remove_unpersisted_record_touches_no_database() {
    // A connection that can never be opened: any SQL would fail
    let dbcon = Arc::new(DatabaseConnection::new(
        ConnectionParams::new("sqlite:///nonexistent-dir/for/sure/logs.db")
            .with_reconnect_wait(std::time::Duration::ZERO),
    ));
    let table = LogTable::new(Arc::clone(&dbcon));

    assert!(!table.remove(&sample(t0())).unwrap());
    assert!(!table.exists(&sample(t0())).unwrap());
    assert_eq!(dbcon.failed_attempts(), 0);
    assert_eq!(dbcon.last_connection_error(), "");
}

#[test]
fn test_remove_stored_record() {
    let table = setup_table();
    let mut r = sample(t0());
    table.add(&mut r).unwrap();

    assert!(table.remove(&r).unwrap());
    assert!(!table.exists(&r).unwrap());
    assert!(!table.remove(&r).unwrap(), "second remove deletes nothing");
    assert_eq!(table.load(r.id().unwrap()).unwrap(), None);
}

#[test]
fn test_regex_filters_are_anded() {
    let table = setup_table();
    for (host, log_type, source, secs) in [
        ("web-1", "ERR", "svc-a", 0),
        ("web-2", "WARN", "svc-a", 1),
        ("db-1", "ERR", "svc-b", 2),
        ("web-3", "ERR", "svc-b", 3),
    ] {
        let mut r = entry(host, log_type, source, t0() + Duration::seconds(secs));
        table.add(&mut r).unwrap();
    }

    let hosts = |query: LogQuery| -> Vec<String> {
        table
            .load_matching(&query)
            .unwrap()
            .into_iter()
            .map(|r| r.host)
            .collect()
    };

    assert_eq!(hosts(LogQuery::new().host("^web-")), vec!["web-1", "web-2", "web-3"]);
    assert_eq!(
        hosts(LogQuery::new().host("^web-").log_type("^ERR$")),
        vec!["web-1", "web-3"]
    );
    assert_eq!(
        hosts(LogQuery::new().log_type("ERR").source("svc-b").latest(true)),
        vec!["web-3", "db-1"]
    );
    // Match-all sentinels behave like no filter
    assert_eq!(hosts(LogQuery::new().host(".*").ip("")).len(), 4);
}

#[test]
fn test_generation_bounds_are_inclusive() {
    let table = setup_table();
    for secs in 0..5 {
        let mut r = sample(t0() + Duration::seconds(secs));
        table.add(&mut r).unwrap();
    }

    let result = table
        .load_matching(
            &LogQuery::new()
                .generated_after(t0() + Duration::seconds(1))
                .generated_before(t0() + Duration::seconds(3)),
        )
        .unwrap();

    let offsets: Vec<i64> = result
        .iter()
        .map(|r| (r.generation - t0()).num_seconds())
        .collect();
    assert_eq!(offsets, vec![1, 2, 3]);
}

#[test]
fn test_inverted_range_is_invalid_input() {
    let table = setup_table();
    let err = table
        .load_matching(
            &LogQuery::new()
                .generated_after(t0() + Duration::seconds(1))
                .generated_before(t0()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_quotes_in_values_are_bound_safely() {
    let table = setup_table();
    let mut r = entry("o'brien", "ERR", "svc'; DROP TABLE LOG; --", t0());
    table.add(&mut r).unwrap();

    let loaded = table.load_matching(&LogQuery::new().host("o'brien")).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].source, "svc'; DROP TABLE LOG; --");
    assert!(table.table_exists().unwrap());
}

#[test]
fn test_table_missing_columns_is_mapping_error() {
    let dbcon = DatabaseConnection::open_in_memory().unwrap();
    let sql = Sql::new(Arc::clone(&dbcon));
    sql.execute("CREATE TABLE LOG (AUTO_ID INTEGER PRIMARY KEY, HOST TEXT, GENERATION TEXT)")
        .unwrap();
    sql.execute("INSERT INTO LOG (HOST, GENERATION) VALUES ('h1', '2024-03-01 12:00:00')")
        .unwrap();

    let table = LogTable::new(dbcon);
    let err = table.load(1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Mapping);
    assert_eq!(err.op(), Some("log_load"));

    let err = table.load_matching(&LogQuery::new()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Mapping);
}

#[test]
fn test_unparsable_generation_is_mapping_error() {
    let table = setup_table();
    let mut r = sample(t0());
    table.add(&mut r).unwrap();

    Sql::new(Arc::clone(table.database_connection()))
        .update("GENERATION = 'garbage'", "LOG", "1 = 1")
        .unwrap();

    let err = table.load(r.id().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Mapping);
    assert_eq!(err.op(), Some("log_load"));
}

#[test]
fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("logs.db").display());

    let mut r = sample(t0());
    {
        let table = LogTable::new(DatabaseConnection::open(ConnectionParams::new(&url)).unwrap());
        table.init().unwrap();
        table.add(&mut r).unwrap();
        table.database_connection().disconnect().unwrap();
    }

    let table = LogTable::new(DatabaseConnection::open(ConnectionParams::new(&url)).unwrap());
    assert_eq!(table.load(r.id().unwrap()).unwrap(), Some(r));
}

#[test]
fn test_singleton_is_shared_per_connection() {
    let dbcon = DatabaseConnection::open_in_memory().unwrap();
    let other = DatabaseConnection::open_in_memory().unwrap();

    let a = LogTable::singleton(&dbcon);
    let b = LogTable::singleton(&dbcon);
    let c = LogTable::singleton(&other);

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_limit_and_order(
        offsets in prop::collection::vec(0i64..10_000, 0..20),
        limit in -2i64..25,
        latest in any::<bool>(),
    ) {
        let table = setup_table();
        for secs in &offsets {
            let mut r = sample(t0() + Duration::seconds(*secs));
            table.add(&mut r).unwrap();
        }

        let result = table
            .load_matching(&LogQuery::new().limit(limit).latest(latest))
            .unwrap();

        let expected_len = if limit > 0 {
            offsets.len().min(limit as usize)
        } else {
            offsets.len()
        };
        prop_assert_eq!(result.len(), expected_len);

        for pair in result.windows(2) {
            if latest {
                prop_assert!(pair[0].generation >= pair[1].generation);
            } else {
                prop_assert!(pair[0].generation <= pair[1].generation);
            }
        }

        // The returned records are the extreme ones
        let mut sorted: Vec<i64> = offsets.clone();
        sorted.sort_unstable();
        if latest {
            sorted.reverse();
        }
        let got: Vec<i64> = result
            .iter()
            .map(|r| (r.generation - t0()).num_seconds())
            .collect();
        prop_assert_eq!(got, sorted[..expected_len].to_vec());
    }
}
