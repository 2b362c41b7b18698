//! Database client handed to route handlers.
//!
//! # Responsibilities
//! - Run plain and parameterized SQL against a pooled connection
//! - Return each row as one JSON object
//!
//! # Design Decisions
//! - Async trait so handlers can run against a fake in tests
//! - Pool connects lazily; a missing database only fails the queries that need it
//! - Parameters are bound as text; statements cast them where needed (`$1::int`)
//! - Reads are wrapped in a subquery, writes with `RETURNING` in a CTE;
//!   other writes run through `execute` and yield no rows
//! - Pool and connection failures surface as `DbError::Unavailable`

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Errors from the database client.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// Async SQL access shared by all handlers.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Run a statement without parameters.
    async fn query(&self, sql: &str) -> Result<Vec<Value>, DbError> {
        self.param_query(sql, &[]).await
    }

    /// Run a statement with positional text parameters (`$1`, `$2`, ...).
    ///
    /// An empty vec means the statement produced no rows.
    async fn param_query(&self, sql: &str, params: &[String]) -> Result<Vec<Value>, DbError>;
}

/// PostgreSQL client over a `sqlx` pool.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Build a pool that opens connections on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "Database pool configured"
        );

        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn param_query(&self, sql: &str, params: &[String]) -> Result<Vec<Value>, DbError> {
        let rows = match plan_statement(sql) {
            Statement::Rows(wrapped) => {
                let mut query = sqlx::query_scalar::<_, Value>(&wrapped);
                for param in params {
                    query = query.bind(param.as_str());
                }
                query.fetch_all(&self.pool).await.map_err(|e| query_failed(sql, e))?
            }
            Statement::Execute(statement) => {
                let mut query = sqlx::query(&statement);
                for param in params {
                    query = query.bind(param.as_str());
                }
                let done = query.execute(&self.pool).await.map_err(|e| query_failed(sql, e))?;
                tracing::debug!(rows_affected = done.rows_affected(), sql = %sql, "Statement executed");
                Vec::new()
            }
        };

        tracing::debug!(rows = rows.len(), sql = %sql, "Query complete");
        Ok(rows)
    }
}

fn query_failed(sql: &str, e: sqlx::Error) -> DbError {
    tracing::error!(error = %e, sql = %sql, "Query failed");
    DbError::from_sqlx(e)
}

impl DbError {
    /// Split "could not reach the database" from "the statement failed".
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Unavailable(e.to_string())
            }
            other => DbError::Query(other),
        }
    }
}

/// How a statement is sent to the server.
#[derive(Debug, PartialEq, Eq)]
enum Statement {
    /// Rewritten so each result row comes back as one JSON value.
    Rows(String),
    /// Run as-is; produces no rows.
    Execute(String),
}

fn plan_statement(sql: &str) -> Statement {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    let words: Vec<String> = statement
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    match words.first().map(String::as_str) {
        Some("select" | "with" | "values" | "table") => {
            Statement::Rows(format!("SELECT row_to_json(q) FROM ({statement}) q"))
        }
        _ if words.iter().any(|w| w == "returning") => {
            Statement::Rows(format!("WITH q AS ({statement}) SELECT row_to_json(q) FROM q"))
        }
        _ => Statement::Execute(statement.to_string()),
    }
}
