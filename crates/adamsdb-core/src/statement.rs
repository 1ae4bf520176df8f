//! Statement builder for the `LOG` table
//!
//! Turns a [`LogQuery`] into SQL text plus ordered bind values. The builder
//! is database-agnostic; `adamsdb-store` binds the values with rusqlite.

use crate::model::{format_timestamp, LogQuery, LogRecord};

/// Name of the log table
pub const LOG_TABLE: &str = "LOG";

/// Columns in select order
pub const LOG_COLUMNS: [&str; 8] = [
    "AUTO_ID",
    "HOST",
    "IP",
    "TYPE",
    "MESSAGE",
    "GENERATION",
    "SOURCE",
    "STATUS",
];

/// Columns written by INSERT/UPDATE, in bind order
pub const WRITE_COLUMNS: [&str; 7] = [
    "HOST",
    "IP",
    "TYPE",
    "MESSAGE",
    "GENERATION",
    "SOURCE",
    "STATUS",
];

/// Operator used for string filters
pub const REGEX_OPERATOR: &str = "REGEXP";

/// A bind value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
}

impl SqlValue {
    /// Render as an SQL literal (single quotes doubled)
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Integer(n) => n.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    column: &'static str,
    operator: &'static str,
    value: SqlValue,
}

/// The parts of a SELECT against the log table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectParts {
    predicates: Vec<Predicate>,
    order_clause: String,
    limit_clause: Option<String>,
}

impl SelectParts {
    /// Build the WHERE/ORDER/LIMIT parts for a query
    pub fn from_query(query: &LogQuery) -> Self {
        let mut predicates: Vec<Predicate> = query
            .active_filters()
            .into_iter()
            .map(|(column, pattern)| Predicate {
                column,
                operator: REGEX_OPERATOR,
                value: SqlValue::Text(pattern.to_string()),
            })
            .collect();

        if let Some(start) = &query.generation_start {
            predicates.push(Predicate {
                column: "GENERATION",
                operator: ">=",
                value: SqlValue::Text(format_timestamp(start)),
            });
        }
        if let Some(end) = &query.generation_end {
            predicates.push(Predicate {
                column: "GENERATION",
                operator: "<=",
                value: SqlValue::Text(format_timestamp(end)),
            });
        }

        let order_clause = if query.latest {
            "ORDER BY GENERATION DESC".to_string()
        } else {
            "ORDER BY GENERATION ASC".to_string()
        };

        Self {
            predicates,
            order_clause,
            limit_clause: query.effective_limit().map(|n| format!("LIMIT {}", n)),
        }
    }

    /// WHERE clause with numbered placeholders, `None` when unfiltered
    pub fn where_clause(&self) -> Option<String> {
        self.join_predicates(|i, _| format!("?{}", i + 1))
    }

    /// Bind values matching the placeholders of [`where_clause`](Self::where_clause)
    pub fn params(&self) -> Vec<SqlValue> {
        self.predicates.iter().map(|p| p.value.clone()).collect()
    }

    pub fn order_clause(&self) -> &str {
        &self.order_clause
    }

    pub fn limit_clause(&self) -> Option<&str> {
        self.limit_clause.as_deref()
    }

    /// Full parameterized SELECT
    pub fn to_sql(&self, table: &str) -> String {
        self.assemble(table, self.where_clause())
    }

    /// Full SELECT with values inlined, for logging only
    pub fn render_literal(&self, table: &str) -> String {
        self.assemble(table, self.join_predicates(|_, v| v.to_literal()))
    }

    fn join_predicates<F>(&self, render: F) -> Option<String>
    where
        F: Fn(usize, &SqlValue) -> String,
    {
        if self.predicates.is_empty() {
            return None;
        }
        let joined = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {} {}", p.column, p.operator, render(i, &p.value)))
            .collect::<Vec<_>>()
            .join(" AND ");
        Some(format!("WHERE {}", joined))
    }

    fn assemble(&self, table: &str, where_clause: Option<String>) -> String {
        let mut sql = format!("SELECT {} FROM {}", LOG_COLUMNS.join(", "), table);
        if let Some(clause) = where_clause {
            sql.push(' ');
            sql.push_str(&clause);
        }
        sql.push(' ');
        sql.push_str(&self.order_clause);
        if let Some(limit) = &self.limit_clause {
            sql.push(' ');
            sql.push_str(limit);
        }
        sql
    }
}

impl LogRecord {
    /// Bind values for INSERT/UPDATE, ordered as [`WRITE_COLUMNS`]
    pub fn to_params(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.host.clone()),
            SqlValue::Text(self.ip.clone()),
            SqlValue::Text(self.log_type.clone()),
            SqlValue::Text(self.message.clone()),
            SqlValue::Text(format_timestamp(&self.generation)),
            SqlValue::Text(self.source.clone()),
            SqlValue::Text(self.status.clone()),
        ]
    }
}

/// `SELECT ... WHERE AUTO_ID = ?1`
pub fn select_by_id_sql(table: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE AUTO_ID = ?1",
        LOG_COLUMNS.join(", "),
        table
    )
}

/// `SELECT 1 ... LIMIT 1` existence probe
pub fn exists_sql(table: &str) -> String {
    format!("SELECT 1 FROM {} WHERE AUTO_ID = ?1 LIMIT 1", table)
}

/// INSERT with placeholders `?1..?7`
pub fn insert_sql(table: &str) -> String {
    let placeholders = (1..=WRITE_COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        WRITE_COLUMNS.join(", "),
        placeholders
    )
}

/// INSERT with an explicit `AUTO_ID`; columns bound as `?1..?7`, id as `?8`
pub fn insert_with_id_sql(table: &str) -> String {
    let placeholders = (1..=WRITE_COLUMNS.len() + 1)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}, AUTO_ID) VALUES ({})",
        table,
        WRITE_COLUMNS.join(", "),
        placeholders
    )
}

/// UPDATE by id; columns bound as `?1..?7`, id as `?8`
pub fn update_sql(table: &str) -> String {
    let assignments = WRITE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE AUTO_ID = ?{}",
        table,
        assignments,
        WRITE_COLUMNS.len() + 1
    )
}

/// DELETE by id
pub fn delete_sql(table: &str) -> String {
    format!("DELETE FROM {} WHERE AUTO_ID = ?1", table)
}
