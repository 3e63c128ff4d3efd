use async_trait::async_trait;
use sqlx::{
    Connection, Encode, Executor, PgConnection, Postgres, Type,
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, types::Oid},
    types::Json
};
use tracing::{debug, trace};

use super::{Database, Explainer};
use crate::{
    config::Engine,
    error::{AppResult, connection_error, database_error},
    model::{ExplainOutput, VetParameter, decode_postgres_explain}
};

const EXPLAIN_PREFIX: &str = "EXPLAIN (ANALYZE false, VERBOSE, COSTS, SETTINGS, BUFFERS, FORMAT JSON)";

/// NULL parameter with an unspecified type, left for the server to infer
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// PostgreSQL adapter: server-side prepare and JSON EXPLAIN
pub struct PostgresDatabase {
    conn: PgConnection
}

impl PostgresDatabase {
    pub async fn connect(uri: &str) -> AppResult<Self> {
        let mut conn = PgConnection::connect(uri)
            .await
            .map_err(connection_error)?;
        conn.ping().await.map_err(connection_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    fn engine(&self) -> Engine {
        Engine::Postgresql
    }

    async fn prepare(&mut self, name: &str, sql: &str) -> AppResult<()> {
        debug!(statement = name, "preparing on postgresql");
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
impl Explainer for PostgresDatabase {
    async fn explain(&mut self, sql: &str, params: &[VetParameter]) -> AppResult<ExplainOutput> {
        let statement = format!("{} {}", EXPLAIN_PREFIX, sql);
        let mut query = sqlx::query_scalar::<_, Json<serde_json::Value>>(&statement);
        for _ in params {
            query = query.bind(UntypedNull);
        }
        let Json(raw) = query
            .fetch_one(&mut self.conn)
            .await
            .map_err(database_error)?;
        trace!(statement = %statement, plan = %raw, "postgresql explain");
        decode_postgres_explain(raw)
    }
}
