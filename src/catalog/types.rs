use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::{Config, SqlGroup};

/// Leading-comment marker that opts a query out of vetting
pub const VET_DISABLE_FLAG: &str = "@sqlc-vet-disable";

/// Type alias for parameter lists (queries rarely bind more than 8 values)
pub type ParamVec = SmallVec<[Parameter; 8]>;

/// Parsed queries of one SQL group together with the global settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeGenRequest {
    pub settings: Settings,
    pub queries:  Vec<Query>
}

/// Global settings as seen by the query parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub version: String,
    pub engine:  String,
    pub schema:  Vec<String>,
    pub queries: Vec<String>
}

impl Settings {
    pub fn from_group(config: &Config, group: &SqlGroup) -> Self {
        Self {
            version: config.version.clone(),
            engine:  group.engine.as_str().to_string(),
            schema:  group.schema.clone(),
            queries: group.queries.clone()
        }
    }
}

/// A single named query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text:     String,
    pub name:     CompactString,
    /// Command annotation including the leading colon, e.g. `:many`
    pub cmd:      CompactString,
    #[serde(default)]
    pub params:   ParamVec,
    pub filename: String,
    /// Leading comment lines with the `--` prefix removed
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub kind:     StatementKind
}

impl Query {
    /// Whether the leading comments carry the vet opt-out marker
    pub fn is_vet_disabled(&self) -> bool {
        self.comments
            .iter()
            .any(|c| c.split_whitespace().next() == Some(VET_DISABLE_FLAG))
    }
}

/// Positional query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// 1-based position
    pub number: u32
}

/// Top-level statement kind, used to decide preparability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Other
}

impl StatementKind {
    /// Classify by the statement's leading keyword
    pub fn from_keyword(sql: &str) -> Self {
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Other => write!(f, "OTHER")
        }
    }
}
