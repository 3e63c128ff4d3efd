//! Data exposed to rule expressions.
//!
//! Every rule is evaluated against the same four variables:
//!
//! | Variable | Type | Populated |
//! |----------|------|-----------|
//! | `query` | [`VetQuery`] | always |
//! | `config` | [`VetSettings`] | always |
//! | `postgresql` | `{ explain: PostgresExplain }` | after a PostgreSQL EXPLAIN |
//! | `mysql` | `{ explain: MySqlExplain }` | after a MySQL EXPLAIN |
//!
//! At most one of `postgresql.explain` and `mysql.explain` holds a real plan
//! for a query. The other, and both when no EXPLAIN ran, is an empty plan
//! whose fields read as `""`, `0`, `false` or empty collections.
//!
//! [`Shape`] describes the same tree for the rule type-checker.

mod explain;
mod query;
mod shape;

use std::sync::LazyLock;

pub use explain::{
    ExplainOutput, MySqlCostInfo, MySqlExplain, MySqlNestedLoop, MySqlOrderingOperation,
    MySqlQueryBlock, MySqlTable, PostgresBuffers, PostgresExplain, PostgresPlan,
    decode_mysql_explain, decode_postgres_explain
};
pub use query::{VetParameter, VetQuery, VetSettings};
use serde::Serialize;
pub use shape::Shape;

/// Variable names of the rule environment
pub const ENV_VARIABLES: [&str; 4] = ["query", "config", "postgresql", "mysql"];

static EMPTY_POSTGRES: LazyLock<PostgresExplain> = LazyLock::new(PostgresExplain::default);
static EMPTY_MYSQL: LazyLock<MySqlExplain> = LazyLock::new(MySqlExplain::default);

/// Evaluation environment for a single query
#[derive(Debug, Clone, Copy)]
pub struct EvalEnv<'a> {
    pub query:   &'a VetQuery,
    pub config:  &'a VetSettings,
    pub explain: Option<&'a ExplainOutput>
}

/// `postgresql` variable
#[derive(Debug, Serialize)]
pub struct PostgresVariable<'a> {
    pub explain: &'a PostgresExplain
}

/// `mysql` variable
#[derive(Debug, Serialize)]
pub struct MySqlVariable<'a> {
    pub explain: &'a MySqlExplain
}

impl<'a> EvalEnv<'a> {
    pub fn new(query: &'a VetQuery, config: &'a VetSettings) -> Self {
        Self {
            query,
            config,
            explain: None
        }
    }

    pub fn with_explain(mut self, explain: Option<&'a ExplainOutput>) -> Self {
        self.explain = explain;
        self
    }

    pub fn postgresql(&self) -> PostgresVariable<'a> {
        PostgresVariable {
            explain: self
                .explain
                .and_then(ExplainOutput::postgresql)
                .unwrap_or(&*EMPTY_POSTGRES)
        }
    }

    pub fn mysql(&self) -> MySqlVariable<'a> {
        MySqlVariable {
            explain: self
                .explain
                .and_then(ExplainOutput::mysql)
                .unwrap_or(&*EMPTY_MYSQL)
        }
    }
}
