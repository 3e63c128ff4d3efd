//! Type definitions for vetting results.
//!
//! - [`ViolationKind`] - What tripped: a rule expression or a database check
//! - [`Violation`] - A single diagnostic tied to a query and a rule
//! - [`LoadFailure`] - A SQL group whose queries could not be loaded
//! - [`VetReport`] - All diagnostics of a run, in discovery order

use std::fmt;

use serde::Serialize;

use crate::model::VetQuery;

/// Origin of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// The rule expression evaluated to `true`
    Rule,
    /// The query could not be prepared (or no database was available)
    Prepare,
    /// EXPLAIN could not be obtained for the query
    Explain
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule => write!(f, "rule"),
            Self::Prepare => write!(f, "prepare"),
            Self::Explain => write!(f, "explain")
        }
    }
}

/// A single recorded rule failure.
///
/// Rendered as `<filename>: <query>: <rule>` with `: <message>` appended
/// when a message is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub filename:   String,
    pub query_name: String,
    pub rule_name:  String,
    pub message:    Option<String>,
    pub kind:       ViolationKind
}

impl Violation {
    /// Rule expression returned `true`
    pub fn tripped(query: &VetQuery, rule_name: &str, message: Option<&str>) -> Self {
        Self {
            filename:   query.filename.clone(),
            query_name: query.name.clone(),
            rule_name:  rule_name.to_string(),
            message:    message.filter(|m| !m.is_empty()).map(str::to_string),
            kind:       ViolationKind::Rule
        }
    }

    pub fn prepare_failed(query: &VetQuery, rule_name: &str, reason: impl fmt::Display) -> Self {
        Self {
            filename:   query.filename.clone(),
            query_name: query.name.clone(),
            rule_name:  rule_name.to_string(),
            message:    Some(format!("error preparing query: {}", reason)),
            kind:       ViolationKind::Prepare
        }
    }

    pub fn explain_failed(query: &VetQuery, rule_name: &str, reason: impl fmt::Display) -> Self {
        Self {
            filename:   query.filename.clone(),
            query_name: query.name.clone(),
            rule_name:  rule_name.to_string(),
            message:    Some(format!("error explaining query: {}", reason)),
            kind:       ViolationKind::Explain
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.filename, self.query_name, self.rule_name)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// A SQL group skipped because its queries could not be loaded or parsed.
///
/// Rendered as `sql[<group>]: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    /// Position of the group in the configuration
    pub group:   usize,
    pub message: String
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sql[{}]: {}", self.group, self.message)
    }
}

/// Outcome of a vetting run.
///
/// Violations keep discovery order: group, then query, then rule.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VetReport {
    pub violations:      Vec<Violation>,
    pub load_failures:   Vec<LoadFailure>,
    /// Queries rules were evaluated for
    pub queries_checked: usize,
    /// Queries opted out with `@sqlc-vet-disable`
    pub queries_skipped: usize
}

impl VetReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn add_load_failure(&mut self, group: usize, message: impl fmt::Display) {
        self.load_failures.push(LoadFailure {
            group,
            message: message.to_string()
        });
    }

    /// Whether any rule tripped, any database check failed or any group failed
    /// to load
    pub fn has_failures(&self) -> bool {
        !self.violations.is_empty() || !self.load_failures.is_empty()
    }

    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}
