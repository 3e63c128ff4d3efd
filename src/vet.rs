//! Evaluation loop.
//!
//! For every SQL group, in configuration order:
//!
//! 1. The group's rule names are resolved (unknown names were rejected
//!    before the first group ran).
//! 2. The group's queries are loaded from the [`QueryCatalog`].
//! 3. If the group configures a database and connections are not disabled,
//!    one connection is opened. It is closed when the group finishes, on
//!    success or error.
//! 4. Each query not marked `@sqlc-vet-disable` is checked against each rule:
//!    prepare when the rule needs it, EXPLAIN once per query when a rule
//!    needs it, then the expression.
//!
//! Prepare and EXPLAIN failures are recorded as violations and evaluation
//! continues. A group whose queries cannot be loaded is recorded as a load
//! failure and skipped. Configuration errors, connection errors, rule
//! evaluation errors and cancellation abort the run.

mod dsn;

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering}
};

pub use dsn::EnvSnapshot;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    catalog::{CodeGenRequest, QueryCatalog},
    config::{Config, SqlGroup},
    database::{Connector, Database, is_preparable},
    error::{AppResult, cancelled_error, error_message},
    model::{EvalEnv, ExplainOutput, VetQuery, VetSettings},
    rules::{CompiledRule, RuleSet, VetReport, Violation}
};

/// Reported when a rule needs a database the group cannot provide
pub const DATABASE_REQUIRED: &str = "database connection required";

/// Reported for statements the engine cannot prepare
pub const UNPREPARABLE: &str = "query type is unpreparable";

static STATEMENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique prepared-statement name
///
/// Combines the process id, a process-wide counter and the query position,
/// so names never repeat within a process or collide across concurrent runs.
pub fn statement_name(group_index: usize, query_index: usize) -> String {
    let sequence = STATEMENT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "sqlc_vet_{}_{}_{}_{}",
        std::process::id(),
        sequence,
        group_index,
        query_index
    )
}

/// Runs the configured rules over every SQL group.
pub struct Vetter<'a> {
    config:      &'a Config,
    catalog:     &'a dyn QueryCatalog,
    connector:   &'a dyn Connector,
    rules:       RuleSet,
    env:         EnvSnapshot,
    no_database: bool,
    cancel:      CancellationToken
}

impl<'a> Vetter<'a> {
    /// Compile the rules and check every group's rule names
    ///
    /// Fails before any query is evaluated.
    pub fn new(
        config: &'a Config,
        catalog: &'a dyn QueryCatalog,
        connector: &'a dyn Connector
    ) -> AppResult<Self> {
        let rules = RuleSet::compile(&config.rules)?;
        for group in &config.sql {
            rules.resolve(&group.rules)?;
        }
        Ok(Self {
            config,
            catalog,
            connector,
            rules,
            env: EnvSnapshot::new(),
            no_database: false,
            cancel: CancellationToken::new()
        })
    }

    /// Disable all database connections
    pub fn with_no_database(mut self, no_database: bool) -> Self {
        self.no_database = no_database;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Vet every group; violations are returned, fatal errors abort
    pub async fn run(&self) -> AppResult<VetReport> {
        let mut report = VetReport::new();
        for (index, group) in self.config.sql.iter().enumerate() {
            let span = info_span!("group", index, engine = %group.engine);
            self.check_group(index, group, &mut report)
                .instrument(span)
                .await?;
        }
        Ok(report)
    }

    async fn check_group(
        &self,
        group_index: usize,
        group: &SqlGroup,
        report: &mut VetReport
    ) -> AppResult<()> {
        if self.cancel.is_cancelled() {
            return Err(cancelled_error());
        }
        let rules = self.rules.resolve(&group.rules)?;
        let request = match self.catalog.load(group_index, group, self.config) {
            Ok(request) => request,
            Err(e) => {
                let message = error_message(&e);
                warn!(error = %message, "failed to load queries, skipping group");
                report.add_load_failure(group_index, message);
                return Ok(());
            }
        };
        let mut database = self.open_database(group).await?;
        let result = self
            .check_queries(group_index, group, &rules, &request, &mut database, report)
            .await;
        if let Some(database) = database {
            match database.close().await {
                Ok(()) => debug!("database connection closed"),
                Err(e) => {
                    let message = error_message(&e);
                    warn!(error = %message, "failed to close database connection");
                }
            }
        }
        result
    }

    async fn open_database(&self, group: &SqlGroup) -> AppResult<Option<Box<dyn Database>>> {
        let Some(database) = &group.database else {
            return Ok(None);
        };
        if self.no_database {
            debug!("database connections disabled");
            return Ok(None);
        }
        let uri = self.env.resolve(&database.uri);
        let connection = self
            .round_trip(self.connector.connect(group.engine, &uri))
            .await??;
        debug!("database connection opened");
        Ok(Some(connection))
    }

    async fn check_queries(
        &self,
        group_index: usize,
        group: &SqlGroup,
        rules: &[&CompiledRule],
        request: &CodeGenRequest,
        database: &mut Option<Box<dyn Database>>,
        report: &mut VetReport
    ) -> AppResult<()> {
        let settings = VetSettings::from(&request.settings);
        for (query_index, query) in request.queries.iter().enumerate() {
            if query.is_vet_disabled() {
                debug!(query = %query.name, "skipping vet rules for query");
                report.queries_skipped += 1;
                continue;
            }
            report.queries_checked += 1;
            let vet_query = VetQuery::from(query);
            let mut explain: Option<Result<ExplainOutput, String>> = None;

            for rule in rules {
                if rule.needs_prepare() {
                    let Some(db) = database.as_deref_mut() else {
                        report.add_violation(Violation::prepare_failed(
                            &vet_query,
                            rule.name(),
                            DATABASE_REQUIRED
                        ));
                        continue;
                    };
                    if !is_preparable(group.engine, query.kind) {
                        report.add_violation(Violation::prepare_failed(
                            &vet_query,
                            rule.name(),
                            UNPREPARABLE
                        ));
                        continue;
                    }
                    let name = statement_name(group_index, query_index);
                    if let Err(e) = self.round_trip(db.prepare(&name, &query.text)).await? {
                        report.add_violation(Violation::prepare_failed(
                            &vet_query,
                            rule.name(),
                            error_message(&e)
                        ));
                        continue;
                    }
                }

                if !rule.has_expression() {
                    continue;
                }

                if rule.needs_explain() && explain.is_none() {
                    let Some(explainer) = database.as_deref_mut().and_then(|db| db.explainer())
                    else {
                        report.add_violation(Violation::explain_failed(
                            &vet_query,
                            rule.name(),
                            DATABASE_REQUIRED
                        ));
                        continue;
                    };
                    let outcome = self
                        .round_trip(explainer.explain(&query.text, &vet_query.params))
                        .await?;
                    debug!(query = %query.name, ok = outcome.is_ok(), "explain computed");
                    explain = Some(outcome.map_err(|e| error_message(&e)));
                }
                if rule.needs_explain()
                    && let Some(Err(reason)) = &explain
                {
                    report.add_violation(Violation::explain_failed(&vet_query, rule.name(), reason));
                    continue;
                }

                let plan = explain.as_ref().and_then(|e| e.as_ref().ok());
                let env = EvalEnv::new(&vet_query, &settings).with_explain(plan);
                if rule.evaluate(&env)? {
                    report.add_violation(Violation::tripped(
                        &vet_query,
                        rule.name(),
                        rule.message()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Run a database round-trip unless the run is cancelled
    ///
    /// The outer result carries cancellation, the inner one the database
    /// outcome.
    async fn round_trip<T>(
        &self,
        operation: impl Future<Output = AppResult<T>>
    ) -> AppResult<AppResult<T>> {
        if self.cancel.is_cancelled() {
            return Err(cancelled_error());
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(cancelled_error()),
            outcome = operation => Ok(outcome)
        }
    }
}
