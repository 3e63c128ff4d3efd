//! EXPLAIN output schemas.
//!
//! Field names follow the engines' JSON output on the way in and are exposed
//! to rule expressions in snake_case, e.g. `postgresql.explain.plan.total_cost`
//! or `mysql.explain.query_block.cost_info.query_cost`. Values the engine
//! omitted read as empty (`""`, `0`, `false`, empty list or map), so every
//! field of the schema can be accessed on every plan shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppResult, database_error};

/// Plan retrieved for one query, tagged by the engine that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", content = "explain", rename_all = "lowercase")]
pub enum ExplainOutput {
    Postgresql(PostgresExplain),
    Mysql(MySqlExplain)
}

impl ExplainOutput {
    pub fn postgresql(&self) -> Option<&PostgresExplain> {
        match self {
            Self::Postgresql(explain) => Some(explain),
            Self::Mysql(_) => None
        }
    }

    pub fn mysql(&self) -> Option<&MySqlExplain> {
        match self {
            Self::Mysql(explain) => Some(explain),
            Self::Postgresql(_) => None
        }
    }
}

/// `EXPLAIN (..., FORMAT JSON)` document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostgresExplain {
    #[serde(default, rename(deserialize = "Plan"))]
    pub plan:     PostgresPlan,
    #[serde(default, rename(deserialize = "Planning"))]
    pub planning: PostgresBuffers,
    #[serde(default, rename(deserialize = "Settings"))]
    pub settings: IndexMap<String, String>
}

/// Node of a PostgreSQL plan tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostgresPlan {
    #[serde(default, rename(deserialize = "Node Type"))]
    pub node_type:           String,
    #[serde(default, rename(deserialize = "Parent Relationship"))]
    pub parent_relationship: String,
    #[serde(default, rename(deserialize = "Parallel Aware"))]
    pub parallel_aware:      bool,
    #[serde(default, rename(deserialize = "Async Capable"))]
    pub async_capable:       bool,
    #[serde(default, rename(deserialize = "Startup Cost"))]
    pub startup_cost:        f64,
    #[serde(default, rename(deserialize = "Total Cost"))]
    pub total_cost:          f64,
    #[serde(default, rename(deserialize = "Plan Rows"))]
    pub plan_rows:           i64,
    #[serde(default, rename(deserialize = "Plan Width"))]
    pub plan_width:          i64,
    #[serde(default, rename(deserialize = "Output"))]
    pub output:              Vec<String>,
    #[serde(default, rename(deserialize = "Plans"))]
    pub plans:               Vec<PostgresPlan>,
    #[serde(default, rename(deserialize = "Relation Name"))]
    pub relation_name:       String,
    #[serde(default, rename(deserialize = "Schema"))]
    pub schema:              String,
    #[serde(default, rename(deserialize = "Alias"))]
    pub alias:               String,
    #[serde(default, rename(deserialize = "Scan Direction"))]
    pub scan_direction:      String,
    #[serde(default, rename(deserialize = "Index Name"))]
    pub index_name:          String,
    #[serde(default, rename(deserialize = "Index Cond"))]
    pub index_cond:          String,
    #[serde(default, rename(deserialize = "Filter"))]
    pub filter:              String,
    #[serde(default, rename(deserialize = "Join Type"))]
    pub join_type:           String,
    #[serde(default, rename(deserialize = "Inner Unique"))]
    pub inner_unique:        bool,
    #[serde(default, rename(deserialize = "Hash Cond"))]
    pub hash_cond:           String,
    #[serde(default, rename(deserialize = "Merge Cond"))]
    pub merge_cond:          String,
    #[serde(default, rename(deserialize = "Sort Key"))]
    pub sort_key:            Vec<String>,
    #[serde(default, rename(deserialize = "Group Key"))]
    pub group_key:           Vec<String>,
    #[serde(default, rename(deserialize = "Strategy"))]
    pub strategy:            String,
    #[serde(default, rename(deserialize = "Partial Mode"))]
    pub partial_mode:        String,
    #[serde(default, rename(deserialize = "Operation"))]
    pub operation:           String,
    #[serde(default, rename(deserialize = "Subplan Name"))]
    pub subplan_name:        String,
    #[serde(default, rename(deserialize = "CTE Name"))]
    pub cte_name:            String,
    #[serde(flatten)]
    pub buffers:             PostgresBuffers
}

/// Buffer usage counters reported with `BUFFERS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostgresBuffers {
    #[serde(default, rename(deserialize = "Shared Hit Blocks"))]
    pub shared_hit_blocks:     i64,
    #[serde(default, rename(deserialize = "Shared Read Blocks"))]
    pub shared_read_blocks:    i64,
    #[serde(default, rename(deserialize = "Shared Dirtied Blocks"))]
    pub shared_dirtied_blocks: i64,
    #[serde(default, rename(deserialize = "Shared Written Blocks"))]
    pub shared_written_blocks: i64,
    #[serde(default, rename(deserialize = "Local Hit Blocks"))]
    pub local_hit_blocks:      i64,
    #[serde(default, rename(deserialize = "Local Read Blocks"))]
    pub local_read_blocks:     i64,
    #[serde(default, rename(deserialize = "Local Dirtied Blocks"))]
    pub local_dirtied_blocks:  i64,
    #[serde(default, rename(deserialize = "Local Written Blocks"))]
    pub local_written_blocks:  i64,
    #[serde(default, rename(deserialize = "Temp Read Blocks"))]
    pub temp_read_blocks:      i64,
    #[serde(default, rename(deserialize = "Temp Written Blocks"))]
    pub temp_written_blocks:   i64
}

/// `EXPLAIN FORMAT=JSON` document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MySqlExplain {
    #[serde(default)]
    pub query_block: MySqlQueryBlock
}

/// Cost figures keyed by name (`query_cost`, `read_cost`, `eval_cost`, ...)
pub type MySqlCostInfo = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MySqlQueryBlock {
    #[serde(default)]
    pub select_id:          i64,
    /// Set instead of a plan when the optimizer short-circuits the query
    #[serde(default)]
    pub message:            String,
    #[serde(default)]
    pub cost_info:          MySqlCostInfo,
    #[serde(default)]
    pub table:              MySqlTable,
    #[serde(default)]
    pub nested_loop:        Vec<MySqlNestedLoop>,
    #[serde(default)]
    pub ordering_operation: MySqlOrderingOperation
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MySqlNestedLoop {
    #[serde(default)]
    pub table: MySqlTable
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MySqlOrderingOperation {
    #[serde(default)]
    pub using_filesort: bool,
    #[serde(default)]
    pub cost_info:      MySqlCostInfo,
    #[serde(default)]
    pub table:          MySqlTable,
    #[serde(default)]
    pub nested_loop:    Vec<MySqlNestedLoop>
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MySqlTable {
    #[serde(default)]
    pub table_name:             String,
    #[serde(default)]
    pub access_type:            String,
    #[serde(default)]
    pub rows_examined_per_scan: i64,
    #[serde(default)]
    pub rows_produced_per_join: i64,
    #[serde(default)]
    pub filtered:               String,
    #[serde(default)]
    pub cost_info:              MySqlCostInfo,
    #[serde(default)]
    pub used_columns:           Vec<String>,
    #[serde(default)]
    pub possible_keys:          Vec<String>,
    #[serde(default)]
    pub key:                    String,
    #[serde(default)]
    pub used_key_parts:         Vec<String>,
    #[serde(default)]
    pub key_length:             String,
    #[serde(default, rename = "ref")]
    pub ref_columns:            Vec<String>,
    #[serde(default)]
    pub attached_condition:     String,
    #[serde(default)]
    pub insert:                 bool,
    #[serde(default)]
    pub update:                 bool,
    #[serde(default)]
    pub delete:                 bool
}

/// Decode the single JSON column PostgreSQL returns for `FORMAT JSON`
///
/// The column holds an array with one document per statement.
pub fn decode_postgres_explain(raw: Value) -> AppResult<ExplainOutput> {
    let document = match raw {
        Value::Array(mut docs) if !docs.is_empty() => docs.swap_remove(0),
        Value::Array(_) => return Err(database_error("postgresql explain: empty result")),
        other => other
    };
    let explain: PostgresExplain = serde_json::from_value(document)
        .map_err(|e| database_error(format!("postgresql explain: {}", e)))?;
    Ok(ExplainOutput::Postgresql(explain))
}

/// Decode MySQL's `EXPLAIN FORMAT=JSON` column
///
/// A non-empty `message` means MySQL reported an error through a
/// success-shaped result; it is returned as an error.
pub fn decode_mysql_explain(raw: &str) -> AppResult<ExplainOutput> {
    let explain: MySqlExplain = serde_json::from_str(raw)
        .map_err(|e| database_error(format!("mysql explain: {}", e)))?;
    let message = &explain.query_block.message;
    if !message.is_empty() {
        return Err(database_error(format!("mysql explain: {}", message)));
    }
    Ok(ExplainOutput::Mysql(explain))
}
