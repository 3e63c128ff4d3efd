//! Database capabilities used while vetting.
//!
//! Each supported engine exposes two checks:
//!
//! | Engine | Prepare | Explain |
//! |--------|---------|---------|
//! | PostgreSQL | yes | `EXPLAIN (ANALYZE false, VERBOSE, COSTS, SETTINGS, BUFFERS, FORMAT JSON)` |
//! | MySQL | yes | `EXPLAIN FORMAT=JSON` |
//! | SQLite | yes | no |
//!
//! SQLite's `EXPLAIN QUERY PLAN` output is explicitly documented as unstable,
//! so the SQLite adapter has no [`Explainer`] and rules that need a plan
//! report "database connection required" against it.
//!
//! Adapters are opened through a [`Connector`]; [`SqlxConnector`] is the
//! production implementation built on `sqlx`.

mod mysql;
mod postgres;
mod sqlite;

use async_trait::async_trait;
pub use mysql::MySqlDatabase;
pub use postgres::PostgresDatabase;
pub use sqlite::SqliteDatabase;

use crate::{
    catalog::StatementKind,
    config::Engine,
    error::AppResult,
    model::{ExplainOutput, VetParameter}
};

/// Query plan retrieval
#[async_trait]
pub trait Explainer: Send {
    /// Explain `sql`, binding NULL for every parameter
    async fn explain(&mut self, sql: &str, params: &[VetParameter]) -> AppResult<ExplainOutput>;
}

/// An open connection to the database of one SQL group
#[async_trait]
pub trait Database: Send {
    fn engine(&self) -> Engine;

    /// Prepare `sql` under `name` without executing it, then release it
    async fn prepare(&mut self, name: &str, sql: &str) -> AppResult<()>;

    /// Plan retrieval, if the engine supports it
    fn explainer(&mut self) -> Option<&mut dyn Explainer> {
        None
    }

    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// Opens database connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and ping; any failure is fatal to the run
    async fn connect(&self, engine: Engine, uri: &str) -> AppResult<Box<dyn Database>>;
}

/// Connector backed by `sqlx` drivers
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn connect(&self, engine: Engine, uri: &str) -> AppResult<Box<dyn Database>> {
        let database: Box<dyn Database> = match engine {
            Engine::Postgresql => Box::new(PostgresDatabase::connect(uri).await?),
            Engine::Mysql => Box::new(MySqlDatabase::connect(uri).await?),
            Engine::Sqlite => Box::new(SqliteDatabase::connect(uri).await?)
        };
        Ok(database)
    }
}

/// Whether a statement kind can be prepared on the engine
///
/// PostgreSQL only prepares DELETE, INSERT, SELECT and UPDATE. MySQL and
/// SQLite prepare nearly every statement, so everything is attempted.
pub fn is_preparable(engine: Engine, kind: StatementKind) -> bool {
    match engine {
        Engine::Postgresql => matches!(
            kind,
            StatementKind::Delete
                | StatementKind::Insert
                | StatementKind::Select
                | StatementKind::Update
        ),
        Engine::Mysql | Engine::Sqlite => true
    }
}
