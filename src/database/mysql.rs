use async_trait::async_trait;
use sqlx::{Connection, Executor, MySqlConnection};
use tracing::{debug, trace};

use super::{Database, Explainer};
use crate::{
    config::Engine,
    error::{AppResult, connection_error, database_error},
    model::{ExplainOutput, VetParameter, decode_mysql_explain}
};

/// MySQL adapter: server-side prepare and JSON EXPLAIN
pub struct MySqlDatabase {
    conn: MySqlConnection
}

impl MySqlDatabase {
    pub async fn connect(uri: &str) -> AppResult<Self> {
        let mut conn = MySqlConnection::connect(uri)
            .await
            .map_err(connection_error)?;
        conn.ping().await.map_err(connection_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    fn engine(&self) -> Engine {
        Engine::Mysql
    }

    async fn prepare(&mut self, name: &str, sql: &str) -> AppResult<()> {
        debug!(statement = name, "preparing on mysql");
        (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(database_error)?;
        self.conn
            .clear_cached_statements()
            .await
            .map_err(database_error)
    }

    fn explainer(&mut self) -> Option<&mut dyn Explainer> {
        Some(self)
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.conn.close().await.map_err(database_error)
    }
}

#[async_trait]
impl Explainer for MySqlDatabase {
    async fn explain(&mut self, sql: &str, params: &[VetParameter]) -> AppResult<ExplainOutput> {
        let statement = format!("EXPLAIN FORMAT=JSON {}", sql);
        let mut query = sqlx::query_scalar::<_, String>(&statement);
        for _ in params {
            query = query.bind(Option::<String>::None);
        }
        let raw = query
            .fetch_one(&mut self.conn)
            .await
            .map_err(database_error)?;
        trace!(statement = %statement, plan = %raw, "mysql explain");
        decode_mysql_explain(&raw)
    }
}
