use serde::Serialize;

use crate::catalog::{Query, Settings};

/// Engine-agnostic view of a query, bound to the `query` rule variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VetQuery {
    pub sql:      String,
    pub name:     String,
    /// Command annotation, colon included (`:one`, `:many`, ...)
    pub cmd:      String,
    pub params:   Vec<VetParameter>,
    pub filename: String
}

/// Positional parameter of a [`VetQuery`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VetParameter {
    /// 1-based position
    pub number: i64
}

/// Global settings, bound to the `config` rule variable
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VetSettings {
    pub version: String,
    pub engine:  String,
    pub schema:  Vec<String>,
    pub queries: Vec<String>
}

impl From<&Query> for VetQuery {
    fn from(query: &Query) -> Self {
        Self {
            sql:      query.text.clone(),
            name:     query.name.to_string(),
            cmd:      query.cmd.to_string(),
            params:   query
                .params
                .iter()
                .map(|p| VetParameter {
                    number: i64::from(p.number)
                })
                .collect(),
            filename: query.filename.clone()
        }
    }
}

impl From<&Settings> for VetSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            version: settings.version.clone(),
            engine:  settings.engine.clone(),
            schema:  settings.schema.clone(),
            queries: settings.queries.clone()
        }
    }
}

