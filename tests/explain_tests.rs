// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use serde_json::json;
use sql_query_vet::model::{
    ExplainOutput, MySqlExplain, MySqlNestedLoop, MySqlOrderingOperation, MySqlQueryBlock,
    MySqlTable, PostgresBuffers, PostgresExplain, PostgresPlan, Shape, VetParameter, VetQuery,
    VetSettings, decode_mysql_explain, decode_postgres_explain
};

#[test]
fn test_decode_postgres_plan_tree() {
    let raw = json!([{
        "Plan": {
            "Node Type": "Nested Loop",
            "Parallel Aware": false,
            "Startup Cost": 0.15,
            "Total Cost": 33.5,
            "Plan Rows": 6,
            "Plan Width": 72,
            "Output": ["a.id", "b.title"],
            "Shared Hit Blocks": 3,
            "Plans": [
                {
                    "Node Type": "Index Scan",
                    "Parent Relationship": "Outer",
                    "Relation Name": "authors",
                    "Index Name": "authors_pkey",
                    "Plan Rows": 1
                },
                {
                    "Node Type": "Seq Scan",
                    "Parent Relationship": "Inner",
                    "Relation Name": "books",
                    "Filter": "(b.author_id = $1)",
                    "Plan Rows": 6
                }
            ]
        },
        "Planning": {"Shared Hit Blocks": 12},
        "Settings": {"work_mem": "64MB"}
    }]);

    let ExplainOutput::Postgresql(explain) = decode_postgres_explain(raw).unwrap() else {
        panic!("expected a postgresql plan");
    };

    assert_eq!(explain.plan.node_type, "Nested Loop");
    assert_eq!(explain.plan.plan_rows, 6);
    assert_eq!(explain.plan.output, vec!["a.id", "b.title"]);
    assert_eq!(explain.plan.plans.len(), 2);
    assert_eq!(explain.plan.plans[0].index_name, "authors_pkey");
    assert_eq!(explain.plan.plans[1].filter, "(b.author_id = $1)");
    assert_eq!(explain.planning.shared_hit_blocks, 12);
    assert_eq!(
        explain.settings.get("work_mem").map(String::as_str),
        Some("64MB")
    );
}

#[test]
fn test_decode_postgres_empty_array_fails() {
    assert!(decode_postgres_explain(json!([])).is_err());
}

#[test]
fn test_decode_mysql_plan() {
    let raw = r#"{
        "query_block": {
            "select_id": 1,
            "cost_info": {"query_cost": "1.35"},
            "ordering_operation": {
                "using_filesort": true,
                "table": {
                    "table_name": "authors",
                    "access_type": "ALL",
                    "rows_examined_per_scan": 11,
                    "rows_produced_per_join": 11,
                    "filtered": "100.00",
                    "ref": ["const"],
                    "used_columns": ["id", "name"]
                }
            }
        }
    }"#;

    let ExplainOutput::Mysql(explain) = decode_mysql_explain(raw).unwrap() else {
        panic!("expected a mysql plan");
    };

    let block = &explain.query_block;
    assert_eq!(block.select_id, 1);
    assert_eq!(block.cost_info.get("query_cost"), Some(&json!("1.35")));
    let ordering = &block.ordering_operation;
    assert!(ordering.using_filesort);
    let table = &ordering.table;
    assert_eq!(table.access_type, "ALL");
    assert_eq!(table.ref_columns, vec!["const"]);
}

#[test]
fn test_mysql_message_is_an_error() {
    let raw = r#"{"query_block": {"select_id": 1, "message": "Impossible WHERE"}}"#;
    assert!(decode_mysql_explain(raw).is_err());
}

#[test]
fn test_mysql_empty_message_is_a_plan() {
    let raw = r#"{"query_block": {"select_id": 1, "message": ""}}"#;
    assert!(decode_mysql_explain(raw).is_ok());
}

#[test]
fn test_mysql_invalid_json_fails() {
    assert!(decode_mysql_explain("not json").is_err());
}

#[test]
fn test_output_accessors() {
    let plan = decode_mysql_explain(r#"{"query_block": {"select_id": 1}}"#).unwrap();
    assert!(plan.mysql().is_some());
    assert!(plan.postgresql().is_none());
}

#[test]
fn test_postgres_root_without_relation_keeps_every_key() {
    let raw = json!([{
        "Plan": {
            "Node Type": "Limit",
            "Total Cost": 0.41,
            "Plans": [{
                "Node Type": "Seq Scan",
                "Parent Relationship": "Outer",
                "Relation Name": "users"
            }]
        }
    }]);

    let plan = decode_postgres_explain(raw).unwrap();
    let explain = plan.postgresql().unwrap();
    assert_eq!(explain.plan.relation_name, "");
    assert_eq!(explain.plan.plans[0].relation_name, "users");

    let value = serde_json::to_value(explain).unwrap();
    assert_eq!(value["plan"]["relation_name"], json!(""));
    assert_eq!(value["plan"]["index_name"], json!(""));
    assert_eq!(value["plan"]["sort_key"], json!([]));
    assert_eq!(value["plan"]["inner_unique"], json!(false));
    assert_eq!(value["plan"]["shared_hit_blocks"], json!(0));
}

#[test]
fn test_mysql_join_plan_keeps_empty_table() {
    let raw = r#"{
        "query_block": {
            "select_id": 1,
            "nested_loop": [
                {"table": {"table_name": "a", "access_type": "ALL"}},
                {"table": {"table_name": "b", "access_type": "eq_ref", "key": "PRIMARY"}}
            ]
        }
    }"#;

    let plan = decode_mysql_explain(raw).unwrap();
    let explain = plan.mysql().unwrap();
    assert_eq!(explain.query_block.nested_loop.len(), 2);
    assert_eq!(explain.query_block.nested_loop[1].table.key, "PRIMARY");

    let value = serde_json::to_value(explain).unwrap();
    assert_eq!(value["query_block"]["table"]["access_type"], json!(""));
    assert_eq!(value["query_block"]["message"], json!(""));
    assert_eq!(value["query_block"]["ordering_operation"]["using_filesort"], json!(false));
}

fn serialized_keys(value: impl serde::Serialize) -> Vec<String> {
    let value = serde_json::to_value(value).unwrap();
    let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    keys
}

fn shape_keys(shape: Shape) -> Vec<String> {
    let mut keys: Vec<String> = shape.fields().iter().map(|(k, _)| k.to_string()).collect();
    keys.sort();
    keys
}

#[test]
fn test_shapes_match_serialized_fields() {
    let query = VetQuery {
        sql:      String::new(),
        name:     String::new(),
        cmd:      String::new(),
        params:   Vec::new(),
        filename: String::new()
    };
    let cases = [
        (Shape::Query, serialized_keys(&query)),
        (Shape::Parameter, serialized_keys(VetParameter {
            number: 1
        })),
        (Shape::Settings, serialized_keys(VetSettings::default())),
        (Shape::PostgresExplain, serialized_keys(PostgresExplain::default())),
        (Shape::PostgresPlan, serialized_keys(PostgresPlan::default())),
        (Shape::PostgresBuffers, serialized_keys(PostgresBuffers::default())),
        (Shape::MySqlExplain, serialized_keys(MySqlExplain::default())),
        (Shape::MySqlQueryBlock, serialized_keys(MySqlQueryBlock::default())),
        (Shape::MySqlNestedLoop, serialized_keys(MySqlNestedLoop::default())),
        (
            Shape::MySqlOrderingOperation,
            serialized_keys(MySqlOrderingOperation::default())
        ),
        (Shape::MySqlTable, serialized_keys(MySqlTable::default()))
    ];
    for (shape, keys) in cases {
        assert_eq!(shape_keys(shape), keys, "{:?}", shape);
    }
}

#[test]
fn test_shape_walks_nested_fields() {
    let plan = Shape::of_variable("postgresql")
        .and_then(|s| s.field("explain"))
        .and_then(|s| s.field("plan"))
        .unwrap();
    assert_eq!(plan, Shape::PostgresPlan);
    assert_eq!(plan.field("plans"), Some(Shape::List(&Shape::PostgresPlan)));
    assert_eq!(plan.field("nod_type"), None);
    assert_eq!(Shape::of_variable("table"), None);
}
