//! Query catalog: the input seam of the vetting engine.
//!
//! The engine consumes a [`CodeGenRequest`] per SQL group through the
//! [`QueryCatalog`] trait. [`FileCatalog`] provides a lightweight loader for
//! annotated query files:
//!
//! ```sql
//! -- name: GetAuthor :one
//! -- @sqlc-vet-disable
//! SELECT * FROM authors WHERE id = $1;
//! ```
//!
//! Each query starts with a `-- name:` header. Comment lines directly after
//! the header are the query's leading comments, the rest up to the next
//! header is the SQL text.

mod types;

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock
};

use rayon::prelude::*;
use regex::Regex;
use sqlparser::{
    ast::Statement,
    dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect},
    parser::Parser
};
pub use types::{
    CodeGenRequest, ParamVec, Parameter, Query, Settings, StatementKind, VET_DISABLE_FLAG
};

use crate::{
    config::{Config, Engine, SqlGroup},
    error::{AppResult, file_read_error, query_parse_error}
};

/// Commands accepted in a `-- name:` header
pub const QUERY_COMMANDS: [&str; 10] = [
    ":one",
    ":many",
    ":exec",
    ":execrows",
    ":execresult",
    ":execlastid",
    ":copyfrom",
    ":batchexec",
    ":batchmany",
    ":batchone"
];

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--\s*name:\s*(\S+)\s*(\S+)?\s*$").expect("valid regex")
});

static DOLLAR_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid regex"));

/// Source of parsed queries for a SQL group
pub trait QueryCatalog {
    /// Load the queries of `group`, the `group_index`-th entry of `config.sql`
    fn load(&self, group_index: usize, group: &SqlGroup, config: &Config)
    -> AppResult<CodeGenRequest>;
}

/// Loads annotated query files relative to the config directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf
}

impl FileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into()
        }
    }

    /// Resolve the group's query paths to a sorted list of files
    ///
    /// Directories contribute their `*.sql` entries in name order.
    pub fn query_files(&self, group: &SqlGroup) -> AppResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in &group.queries {
            let path = self.dir.join(entry);
            if path.is_dir() {
                let display = path.display().to_string();
                let mut sql_files: Vec<PathBuf> = fs::read_dir(&path)
                    .map_err(|e| file_read_error(&display, e))?
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
                    .collect();
                sql_files.sort();
                files.extend(sql_files);
            } else {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl QueryCatalog for FileCatalog {
    fn load(
        &self,
        _group_index: usize,
        group: &SqlGroup,
        config: &Config
    ) -> AppResult<CodeGenRequest> {
        let mut queries = Vec::new();
        for path in self.query_files(group)? {
            let display = path.display().to_string();
            let content = fs::read_to_string(&path).map_err(|e| file_read_error(&display, e))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(display);
            queries.extend(parse_query_file(&content, &filename, group.engine)?);
        }
        Ok(CodeGenRequest {
            settings: Settings::from_group(config, group),
            queries
        })
    }
}

struct RawBlock<'a> {
    name:  &'a str,
    cmd:   &'a str,
    line:  usize,
    lines: Vec<&'a str>
}

/// Parse every annotated query of one file (parallel, order preserved)
pub fn parse_query_file(content: &str, filename: &str, engine: Engine) -> AppResult<Vec<Query>> {
    let blocks = split_blocks(content, filename)?;
    blocks
        .into_par_iter()
        .map(|block| build_query(block, filename, engine))
        .collect()
}

fn split_blocks<'a>(content: &'a str, filename: &str) -> AppResult<Vec<RawBlock<'a>>> {
    let mut blocks: Vec<RawBlock<'a>> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if let Some(caps) = HEADER.captures(line.trim()) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let cmd = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if !QUERY_COMMANDS.contains(&cmd) {
                return Err(query_parse_error(
                    filename,
                    line_no,
                    format!("invalid query command '{}' for {}", cmd, name)
                ));
            }
            blocks.push(RawBlock {
                name,
                cmd,
                line: line_no,
                lines: Vec::new()
            });
        } else if let Some(block) = blocks.last_mut() {
            block.lines.push(line);
        }
    }
    Ok(blocks)
}

fn build_query(block: RawBlock<'_>, filename: &str, engine: Engine) -> AppResult<Query> {
    let mut comments = Vec::new();
    let mut body = block.lines.as_slice();
    while let Some((first, rest)) = body.split_first() {
        let trimmed = first.trim();
        if let Some(comment) = trimmed.strip_prefix("--") {
            comments.push(comment.trim().to_string());
        } else if !trimmed.is_empty() {
            break;
        }
        body = rest;
    }
    let text = body.join("\n");
    let text = text.trim().trim_end_matches(';').trim_end().to_string();
    if text.is_empty() {
        return Err(query_parse_error(
            filename,
            block.line,
            format!("query {} has no SQL text", block.name)
        ));
    }
    Ok(Query {
        kind: classify(&text, engine),
        params: parameters(&text, engine),
        name: block.name.into(),
        cmd: block.cmd.into(),
        filename: filename.to_string(),
        comments,
        text
    })
}

fn parser_dialect(engine: Engine) -> Box<dyn Dialect> {
    match engine {
        Engine::Postgresql => Box::new(PostgreSqlDialect {}),
        Engine::Mysql => Box::new(MySqlDialect {}),
        Engine::Sqlite => Box::new(SQLiteDialect {})
    }
}

/// Determine the statement kind, falling back to the leading keyword when
/// the statement uses syntax sqlparser does not understand
pub fn classify(sql: &str, engine: Engine) -> StatementKind {
    let dialect = parser_dialect(engine);
    match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(statements) => match statements.first() {
            Some(Statement::Query(_)) => StatementKind::Select,
            Some(Statement::Insert(_)) => StatementKind::Insert,
            Some(Statement::Update {
                ..
            }) => StatementKind::Update,
            Some(Statement::Delete(_)) => StatementKind::Delete,
            Some(_) => StatementKind::Other,
            None => StatementKind::from_keyword(sql)
        },
        Err(_) => StatementKind::from_keyword(sql)
    }
}

/// Number the statement's placeholders
///
/// PostgreSQL uses explicit `$N` positions; MySQL and SQLite use positional
/// `?` markers outside string literals.
pub fn parameters(sql: &str, engine: Engine) -> ParamVec {
    match engine {
        Engine::Postgresql => {
            let numbers: BTreeSet<u32> = DOLLAR_PARAM
                .captures_iter(sql)
                .filter_map(|c| c.get(1)?.as_str().parse().ok())
                .collect();
            numbers
                .into_iter()
                .map(|number| Parameter { number })
                .collect()
        }
        Engine::Mysql | Engine::Sqlite => {
            let mut in_literal = false;
            let mut count = 0u32;
            for c in sql.chars() {
                match c {
                    '\'' => in_literal = !in_literal,
                    '?' if !in_literal => count += 1,
                    _ => {}
                }
            }
            (1..=count).map(|number| Parameter { number }).collect()
        }
    }
}

/// Base directory of a config file
pub fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
