use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    ConnectOptions, Connection, Executor, SqliteConnection, sqlite::SqliteConnectOptions
};
use tracing::debug;

use super::Database;
use crate::{
    config::Engine,
    error::{AppResult, connection_error, database_error}
};

/// SQLite adapter: prepare only
pub struct SqliteDatabase {
    conn: SqliteConnection
}

impl SqliteDatabase {
    /// Accepts `sqlite:` URLs as well as bare file paths
    pub async fn connect(uri: &str) -> AppResult<Self> {
        let options = if uri.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(uri).map_err(connection_error)?
        } else {
            SqliteConnectOptions::new().filename(uri)
        };
        let mut conn = options.connect().await.map_err(connection_error)?;
        conn.ping().await.map_err(connection_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    async fn prepare(&mut self, name: &str, sql: &str) -> AppResult<()> {
        debug!(statement = name, "preparing on sqlite");
        (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(database_error)?;
        self.conn
            .clear_cached_statements()
            .await
            .map_err(database_error)
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.conn.close().await.map_err(database_error)
    }
}
