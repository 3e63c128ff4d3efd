// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_query_vet::{
    model::VetQuery,
    output::{OutputFormat, OutputOptions, format_report},
    rules::{VetReport, Violation, ViolationKind}
};

fn sample_query() -> VetQuery {
    VetQuery {
        sql:      "SELECT * FROM authors".to_string(),
        name:     "ListAuthors".to_string(),
        cmd:      ":many".to_string(),
        params:   Vec::new(),
        filename: "query.sql".to_string()
    }
}

fn sample_report() -> VetReport {
    let query = sample_query();
    let mut report = VetReport::new();
    report.queries_checked = 1;
    report.add_violation(Violation::tripped(&query, "no-select-star", Some("avoid select *")));
    report.add_violation(Violation::tripped(&query, "needs-limit", None));
    report.add_violation(Violation::prepare_failed(
        &query,
        "sqlc/db-prepare",
        "database connection required"
    ));
    report
}

fn plain(format: OutputFormat) -> OutputOptions {
    OutputOptions {
        format,
        colored: false
    }
}

#[test]
fn test_text_output_one_line_per_violation() {
    let output = format_report(&sample_report(), &plain(OutputFormat::Text));

    assert_eq!(
        output,
        "query.sql: ListAuthors: no-select-star: avoid select *\n\
         query.sql: ListAuthors: needs-limit\n\
         query.sql: ListAuthors: sqlc/db-prepare: error preparing query: database connection required\n"
    );
}

#[test]
fn test_text_output_empty_report() {
    let output = format_report(&VetReport::new(), &plain(OutputFormat::Text));
    assert!(output.is_empty());
}

#[test]
fn test_colored_output_keeps_content() {
    let opts = OutputOptions {
        format:  OutputFormat::Text,
        colored: true
    };
    let output = format_report(&sample_report(), &opts);

    assert!(output.contains("avoid select *"));
    assert_eq!(output.lines().count(), 3);
}

#[test]
fn test_load_failures_come_first() {
    let mut report = sample_report();
    report.add_load_failure(1, "Query parse error in 'broken.sql' at line 3: query Empty has no SQL text");
    let output = format_report(&report, &plain(OutputFormat::Text));

    let first = output.lines().next().unwrap();
    assert_eq!(
        first,
        "sql[1]: Query parse error in 'broken.sql' at line 3: query Empty has no SQL text"
    );
    assert_eq!(output.lines().count(), 4);
}

#[test]
fn test_load_failure_alone_is_a_failure() {
    let mut report = VetReport::new();
    assert!(!report.has_failures());
    report.add_load_failure(0, "unreadable");
    assert!(report.has_failures());
    assert!(report.violations.is_empty());

    let value: serde_json::Value =
        serde_json::from_str(&format_report(&report, &plain(OutputFormat::Json))).unwrap();
    assert_eq!(value["load_failures"][0]["group"], 0);
    assert_eq!(value["load_failures"][0]["message"], "unreadable");
}

#[test]
fn test_json_output() {
    let output = format_report(&sample_report(), &plain(OutputFormat::Json));
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["queries_checked"], 1);
    assert_eq!(value["violations"][0]["rule_name"], "no-select-star");
    assert_eq!(value["violations"][1]["message"], serde_json::Value::Null);
    assert_eq!(value["violations"][2]["kind"], "prepare");
}

#[test]
fn test_yaml_output() {
    let output = format_report(&sample_report(), &plain(OutputFormat::Yaml));
    assert!(output.contains("rule_name: needs-limit"));
}

#[test]
fn test_report_counts() {
    let report = sample_report();

    assert!(report.has_failures());
    assert_eq!(report.count_of(ViolationKind::Rule), 2);
    assert_eq!(report.count_of(ViolationKind::Prepare), 1);
    assert_eq!(report.count_of(ViolationKind::Explain), 0);
}

#[test]
fn test_stream_selection() {
    assert!(plain(OutputFormat::Text).writes_to_stderr());
    assert!(!plain(OutputFormat::Json).writes_to_stderr());
}
