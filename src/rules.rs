//! Rule registry and compiler.
//!
//! Rules are named boolean expressions written in CEL and evaluated once per
//! query against the variables described in [`crate::model`]:
//!
//! ```yaml
//! rules:
//!   - name: no-select-star
//!     rule: query.sql.contains("*")
//!     msg: avoid select *
//!   - name: needs-limit
//!     rule: query.cmd == ":many" && !query.sql.contains("LIMIT")
//!   - name: no-seq-scan
//!     rule: postgresql.explain.plan.node_type == "Seq Scan"
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ Definitions │────▶│   RuleSet    │────▶│ CompiledRule│
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │  type-check │
//!                     │  flags      │
//!                     └─────────────┘
//! ```
//!
//! Compilation is all-or-nothing: a duplicate or empty name, an empty
//! expression, a syntax error or a reference outside the rule environment
//! fails the whole set before any query is evaluated.
//!
//! # Explain detection
//!
//! A rule is flagged [`needs_explain`](CompiledRule::needs_explain) when its
//! source text contains `postgresql.explain` or `mysql.explain`. The check is
//! textual: a rule that reaches the plan through another path (for example
//! `postgresql["explain"]`) is not flagged, EXPLAIN is not run for it, and it
//! sees an empty plan.
//!
//! # Built-in rules
//!
//! `sqlc/db-prepare` has no expression. It only requires that the query can
//! be prepared against the group's database.

mod types;

use std::{collections::HashSet, fmt, sync::LazyLock};

use cel_interpreter::{Context, Program, Value};
use indexmap::IndexMap;
use regex::Regex;
pub use types::{LoadFailure, VetReport, Violation, ViolationKind};

use crate::{
    config::RuleDefinition,
    error::{AppError, AppResult, config_error, evaluation_error, rule_compile_error},
    model::{ENV_VARIABLES, EvalEnv, Shape}
};

/// Name of the built-in prepare-only rule
pub const DB_PREPARE_RULE: &str = "sqlc/db-prepare";

/// Accessors whose presence makes a rule require EXPLAIN output
pub const EXPLAIN_ACCESSORS: [&str; 2] = ["postgresql.explain", "mysql.explain"];

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).expect("valid regex"));

static MEMBER_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^.\w])(query|config|postgresql|mysql)((?:\s*(?:\.\s*[A-Za-z_]\w*|\[[^\]]*\]))+)"
    )
    .expect("valid regex")
});

static PATH_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*([A-Za-z_]\w*)|\[[^\]]*\]").expect("valid regex"));

static MACRO_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*(?:all|exists|exists_one|map|filter)\s*\(\s*([A-Za-z_]\w*)\s*,")
        .expect("valid regex")
});

/// A rule ready for evaluation.
pub struct CompiledRule {
    name:          String,
    message:       Option<String>,
    program:       Option<Program>,
    needs_prepare: bool,
    needs_explain: bool
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("has_expression", &self.program.is_some())
            .field("needs_prepare", &self.needs_prepare)
            .field("needs_explain", &self.needs_explain)
            .finish()
    }
}

impl CompiledRule {
    /// The built-in `sqlc/db-prepare` rule
    pub fn db_prepare() -> Self {
        Self {
            name:          DB_PREPARE_RULE.to_string(),
            message:       None,
            program:       None,
            needs_prepare: true,
            needs_explain: false
        }
    }

    /// Compile and type-check a single definition
    pub fn compile(definition: &RuleDefinition) -> AppResult<Self> {
        let name = definition.name.as_str();
        if definition.rule.trim().is_empty() {
            return Err(rule_compile_error("type-check", name, "is empty"));
        }
        let program = Program::compile(&definition.rule)
            .map_err(|e| rule_compile_error("type-check", name, e.to_string()))?;
        type_check(name, &definition.rule, &program)?;
        Ok(Self {
            name:          name.to_string(),
            message:       definition.msg.clone().filter(|m| !m.is_empty()),
            program:       Some(program),
            needs_prepare: false,
            needs_explain: needs_explain(&definition.rule)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn needs_prepare(&self) -> bool {
        self.needs_prepare
    }

    pub fn needs_explain(&self) -> bool {
        self.needs_explain
    }

    /// Whether the rule needs a live database at all
    pub fn needs_database(&self) -> bool {
        self.needs_prepare || self.needs_explain
    }

    /// Whether there is an expression to evaluate after the database checks
    pub fn has_expression(&self) -> bool {
        self.program.is_some()
    }

    /// Evaluate the rule; `true` means the rule tripped
    ///
    /// Rules without an expression never trip. A non-boolean result or a
    /// runtime error is a rule authoring defect and is returned as an error.
    pub fn evaluate(&self, env: &EvalEnv<'_>) -> AppResult<bool> {
        let Some(program) = &self.program else {
            return Ok(false);
        };
        let mut context = Context::default();
        context
            .add_variable("query", env.query)
            .map_err(|e| bind_error("query", e))?;
        context
            .add_variable("config", env.config)
            .map_err(|e| bind_error("config", e))?;
        context
            .add_variable("postgresql", env.postgresql())
            .map_err(|e| bind_error("postgresql", e))?;
        context
            .add_variable("mysql", env.mysql())
            .map_err(|e| bind_error("mysql", e))?;
        let value = program
            .execute(&context)
            .map_err(|e| evaluation_error(format!("{}: evaluation error: {}", self.name, e)))?;
        match value {
            Value::Bool(tripped) => Ok(tripped),
            other => Err(evaluation_error(format!(
                "{}: expression returned non-bool value: {:?}",
                self.name, other
            )))
        }
    }
}

fn bind_error(variable: &str, err: impl fmt::Display) -> AppError {
    evaluation_error(format!("cannot bind '{}': {}", variable, err))
}

/// Whether the expression source references EXPLAIN output
pub fn needs_explain(expression: &str) -> bool {
    EXPLAIN_ACCESSORS.iter().any(|a| expression.contains(a))
}

/// Check the expression against the fixed rule environment
///
/// Every free variable must be one of the environment variables, and every
/// member path rooted at one of them must exist in its [`Shape`]. Checking
/// stops at map lookups and at the method called at the end of a path.
fn type_check(name: &str, source: &str, program: &Program) -> AppResult<()> {
    let stripped = STRING_LITERAL.replace_all(source, "\"\"");
    let bound: HashSet<&str> = MACRO_BINDING
        .captures_iter(&stripped)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let references = program.references();
    for variable in references.variables() {
        if !ENV_VARIABLES.contains(&variable) && !bound.contains(variable) {
            return Err(rule_compile_error(
                "type-check",
                name,
                format!("undeclared reference to '{}'", variable)
            ));
        }
    }
    for caps in MEMBER_PATH.captures_iter(&stripped) {
        let (Some(variable), Some(path)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if bound.contains(variable.as_str()) {
            continue;
        }
        let called = stripped[path.end()..].trim_start().starts_with('(');
        check_path(name, variable.as_str(), path.as_str(), called)?;
    }
    Ok(())
}

fn check_path(name: &str, variable: &str, path: &str, called: bool) -> AppResult<()> {
    let Some(mut shape) = Shape::of_variable(variable) else {
        return Ok(());
    };
    let mut segments: Vec<Option<&str>> = PATH_SEGMENT
        .captures_iter(path)
        .map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if called && matches!(segments.last(), Some(Some(_))) {
        segments.pop();
    }
    let mut walked = variable.to_string();
    for segment in segments {
        match (segment, shape) {
            (_, Shape::Map) => break,
            (None, Shape::List(item)) => {
                shape = *item;
                walked.push_str("[]");
            }
            (None, _) => break,
            (Some(field), _) => {
                shape = shape.field(field).ok_or_else(|| {
                    rule_compile_error(
                        "type-check",
                        name,
                        format!("undefined field '{}' on '{}'", field, walked)
                    )
                })?;
                walked.push('.');
                walked.push_str(field);
            }
        }
    }
    Ok(())
}

/// Compiled rules by name, in definition order.
///
/// # Example
///
/// ```
/// use sql_query_vet::{config::RuleDefinition, rules::RuleSet};
///
/// let rules = RuleSet::compile(&[RuleDefinition {
///     name: "no-select-star".into(),
///     rule: r#"query.sql.contains("*")"#.into(),
///     msg:  Some("avoid select *".into())
/// }])
/// .unwrap();
///
/// let rule = rules.get("no-select-star").unwrap();
/// assert!(!rule.needs_explain());
/// assert!(rules.get("sqlc/db-prepare").is_some());
/// ```
#[derive(Debug)]
pub struct RuleSet {
    rules: IndexMap<String, CompiledRule>
}

impl RuleSet {
    /// Compile all definitions, failing on the first bad rule
    pub fn compile(definitions: &[RuleDefinition]) -> AppResult<Self> {
        let mut rules = IndexMap::new();
        rules.insert(DB_PREPARE_RULE.to_string(), CompiledRule::db_prepare());
        for definition in definitions {
            if definition.name.is_empty() {
                return Err(config_error("rules require a name"));
            }
            if rules.contains_key(&definition.name) {
                return Err(rule_compile_error(
                    "type-check",
                    &definition.name,
                    "a rule with this name already exists"
                ));
            }
            let rule = CompiledRule::compile(definition)?;
            rules.insert(definition.name.clone(), rule);
        }
        Ok(Self { rules })
    }

    pub fn get(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.get(name)
    }

    /// Look up a group's rule names, in order
    ///
    /// An unknown name is a configuration error.
    pub fn resolve(&self, names: &[String]) -> AppResult<Vec<&CompiledRule>> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    config_error(format!(
                        "type-check error: a rule with the name '{}' does not exist",
                        name
                    ))
                })
            })
            .collect()
    }

    /// Number of rules, the built-in one included
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.values()
    }
}
