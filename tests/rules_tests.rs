// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_query_vet::{
    config::RuleDefinition,
    model::{
        EvalEnv, VetParameter, VetQuery, VetSettings, decode_mysql_explain, decode_postgres_explain
    },
    rules::{CompiledRule, DB_PREPARE_RULE, RuleSet, needs_explain}
};

fn def(name: &str, rule: &str) -> RuleDefinition {
    RuleDefinition {
        name: name.to_string(),
        rule: rule.to_string(),
        msg:  None
    }
}

fn sample_query() -> VetQuery {
    VetQuery {
        sql:      "SELECT * FROM authors WHERE id = $1".to_string(),
        name:     "GetAuthor".to_string(),
        cmd:      ":one".to_string(),
        params:   vec![VetParameter {
            number: 1
        }],
        filename: "query.sql".to_string()
    }
}

fn sample_settings() -> VetSettings {
    VetSettings {
        version: "2".to_string(),
        engine:  "postgresql".to_string(),
        schema:  vec!["schema.sql".to_string()],
        queries: vec!["query.sql".to_string()]
    }
}

#[test]
fn test_builtin_prepare_rule_is_registered() {
    let rules = RuleSet::compile(&[]).unwrap();
    let rule = rules.get(DB_PREPARE_RULE).unwrap();

    assert_eq!(rules.len(), 1);
    assert!(rule.needs_prepare());
    assert!(!rule.needs_explain());
    assert!(!rule.has_expression());
}

#[test]
fn test_rule_flags_are_deterministic() {
    let definitions = vec![
        def("no-seq-scan", r#"postgresql.explain.plan.node_type == "Seq Scan""#),
        def("no-select-star", r#"query.sql.contains("*")"#)
    ];

    for _ in 0..3 {
        let rules = RuleSet::compile(&definitions).unwrap();
        assert!(rules.get("no-seq-scan").unwrap().needs_explain());
        assert!(!rules.get("no-select-star").unwrap().needs_explain());
        assert!(!rules.get("no-select-star").unwrap().needs_prepare());
    }
}

#[test]
fn test_needs_explain_is_textual() {
    assert!(needs_explain("mysql.explain.query_block.select_id > 0"));
    assert!(needs_explain(r#"postgresql.explain.plan.node_type == "x""#));
    assert!(!needs_explain("query.name == \"x\""));
}

#[test]
fn test_iteration_keeps_definition_order() {
    let rules = RuleSet::compile(&[def("b", "true"), def("a", "false")]).unwrap();
    let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();

    assert_eq!(names, vec![DB_PREPARE_RULE, "b", "a"]);
}

#[test]
fn test_duplicate_rule_name_fails() {
    let result = RuleSet::compile(&[def("dup", "true"), def("dup", "false")]);
    assert!(result.is_err());
}

#[test]
fn test_builtin_name_cannot_be_redefined() {
    let result = RuleSet::compile(&[def(DB_PREPARE_RULE, "true")]);
    assert!(result.is_err());
}

#[test]
fn test_empty_name_fails() {
    let result = RuleSet::compile(&[def("", "true")]);
    assert!(result.is_err());
}

#[test]
fn test_empty_expression_fails() {
    assert!(CompiledRule::compile(&def("blank", "   ")).is_err());
}

#[test]
fn test_syntax_error_fails() {
    assert!(CompiledRule::compile(&def("broken", "query.sql ==")).is_err());
}

#[test]
fn test_undeclared_variable_fails() {
    assert!(CompiledRule::compile(&def("unknown", "table.name == \"x\"")).is_err());
}

#[test]
fn test_unknown_query_field_fails() {
    assert!(CompiledRule::compile(&def("typo", "query.text == \"x\"")).is_err());
}

#[test]
fn test_unknown_config_field_fails() {
    assert!(CompiledRule::compile(&def("typo", "config.dialect == \"x\"")).is_err());
}

#[test]
fn test_misspelled_plan_field_fails() {
    let result = RuleSet::compile(&[def(
        "no-seq-scan",
        r#"postgresql.explain.plan.nod_type == "Seq Scan""#
    )]);
    assert!(result.is_err());
}

#[test]
fn test_misspelled_mysql_field_fails() {
    let rule = CompiledRule::compile(&def(
        "full-scan",
        r#"mysql.explain.query_block.table.acces_type == "ALL""#
    ));
    assert!(rule.is_err());
}

#[test]
fn test_field_on_scalar_fails() {
    let rule = CompiledRule::compile(&def("deep", r#"query.sql.length == 3"#));
    assert!(rule.is_err());
}

#[test]
fn test_deep_plan_paths_compile() {
    let sources = [
        r#"postgresql.explain.plan.plans[0].relation_name == "users""#,
        "postgresql.explain.plan.shared_hit_blocks > 100",
        "postgresql.explain.planning.shared_read_blocks > 0",
        r#"postgresql.explain.settings.work_mem == "64MB""#,
        r#"mysql.explain.query_block.nested_loop[0].table.access_type == "ALL""#,
        r#"mysql.explain.query_block.cost_info.query_cost == "1.35""#,
        "mysql.explain.query_block.ordering_operation.table.used_columns.size() > 0",
        "query.params[0].number == 1",
        r#"postgresql.explain.plan.plans.exists(p, p.node_type == "Seq Scan")"#
    ];
    for source in sources {
        assert!(
            CompiledRule::compile(&def("deep", source)).is_ok(),
            "{} should compile",
            source
        );
    }
}

#[test]
fn test_misspelled_field_after_index_fails() {
    let rule = CompiledRule::compile(&def(
        "deep",
        r#"postgresql.explain.plan.plans[0].relation == "users""#
    ));
    assert!(rule.is_err());
}

#[test]
fn test_field_names_inside_strings_are_ignored() {
    let rule = CompiledRule::compile(&def("literal", r#"query.sql.contains("query.text")"#));
    assert!(rule.is_ok());
}

#[test]
fn test_macro_variables_are_allowed() {
    let rule = CompiledRule::compile(&def("params", "query.params.exists(p, p.number > 3)"));
    assert!(rule.is_ok());
}

#[test]
fn test_unknown_rule_name_fails_to_resolve() {
    let rules = RuleSet::compile(&[def("known", "true")]).unwrap();

    assert!(rules.resolve(&["known".to_string()]).is_ok());
    assert!(
        rules
            .resolve(&["known".to_string(), "missing".to_string()])
            .is_err()
    );
}

#[test]
fn test_message_is_kept() {
    let rule = CompiledRule::compile(&RuleDefinition {
        name: "star".to_string(),
        rule: r#"query.sql.contains("*")"#.to_string(),
        msg:  Some("avoid select *".to_string())
    })
    .unwrap();

    assert_eq!(rule.message(), Some("avoid select *"));
}

#[test]
fn test_evaluate_query_fields() {
    let query = sample_query();
    let settings = sample_settings();
    let env = EvalEnv::new(&query, &settings);

    let star = CompiledRule::compile(&def("star", r#"query.sql.contains("*")"#)).unwrap();
    let one = CompiledRule::compile(&def("one", r#"query.cmd == ":one""#)).unwrap();
    let engine = CompiledRule::compile(&def("engine", r#"config.engine == "mysql""#)).unwrap();
    let params = CompiledRule::compile(&def("params", "size(query.params) == 1")).unwrap();

    assert!(star.evaluate(&env).unwrap());
    assert!(one.evaluate(&env).unwrap());
    assert!(!engine.evaluate(&env).unwrap());
    assert!(params.evaluate(&env).unwrap());
}

#[test]
fn test_evaluate_param_numbers() {
    let query = sample_query();
    let settings = sample_settings();
    let env = EvalEnv::new(&query, &settings);

    let rule =
        CompiledRule::compile(&def("first", "query.params.exists(p, p.number == 1)")).unwrap();
    assert!(rule.evaluate(&env).unwrap());
}

#[test]
fn test_evaluate_mysql_explain() {
    let query = sample_query();
    let settings = sample_settings();
    let plan = decode_mysql_explain(
        r#"{"query_block": {"select_id": 1, "table": {"table_name": "authors", "access_type": "ALL"}}}"#
    )
    .unwrap();
    let env = EvalEnv::new(&query, &settings).with_explain(Some(&plan));

    let rule = CompiledRule::compile(&def(
        "full-scan",
        r#"mysql.explain.query_block.table.access_type == "ALL""#
    ))
    .unwrap();
    assert!(rule.needs_explain());
    assert!(rule.evaluate(&env).unwrap());
}

#[test]
fn test_non_bool_result_is_an_error() {
    let query = sample_query();
    let settings = sample_settings();
    let env = EvalEnv::new(&query, &settings);

    let rule = CompiledRule::compile(&def("name", "query.name")).unwrap();
    assert!(rule.evaluate(&env).is_err());
}

#[test]
fn test_prepare_rule_never_trips() {
    let query = sample_query();
    let settings = sample_settings();
    let env = EvalEnv::new(&query, &settings);

    assert!(!CompiledRule::db_prepare().evaluate(&env).unwrap());
}

#[test]
fn test_evaluate_mysql_join_plan_reads_empty_table() {
    let query = sample_query();
    let settings = sample_settings();
    let plan = decode_mysql_explain(
        r#"{"query_block": {"select_id": 1, "nested_loop": [
            {"table": {"table_name": "a", "access_type": "ALL"}},
            {"table": {"table_name": "b", "access_type": "eq_ref"}}
        ]}}"#
    )
    .unwrap();
    let env = EvalEnv::new(&query, &settings).with_explain(Some(&plan));

    let top = CompiledRule::compile(&def(
        "full-scan",
        r#"mysql.explain.query_block.table.access_type == "ALL""#
    ))
    .unwrap();
    assert!(!top.evaluate(&env).unwrap());

    let joined = CompiledRule::compile(&def(
        "joined-full-scan",
        r#"mysql.explain.query_block.nested_loop.exists(n, n.table.access_type == "ALL")"#
    ))
    .unwrap();
    assert!(joined.evaluate(&env).unwrap());
}

#[test]
fn test_evaluate_postgres_root_without_relation() {
    let query = sample_query();
    let settings = sample_settings();
    let plan = decode_postgres_explain(serde_json::json!([{
        "Plan": {
            "Node Type": "Limit",
            "Plans": [{"Node Type": "Seq Scan", "Relation Name": "users"}]
        }
    }]))
    .unwrap();
    let env = EvalEnv::new(&query, &settings).with_explain(Some(&plan));

    let root = CompiledRule::compile(&def(
        "users",
        r#"postgresql.explain.plan.relation_name == "users""#
    ))
    .unwrap();
    assert!(!root.evaluate(&env).unwrap());

    let child = CompiledRule::compile(&def(
        "users-scan",
        r#"postgresql.explain.plan.plans.exists(p, p.relation_name == "users")"#
    ))
    .unwrap();
    assert!(child.evaluate(&env).unwrap());
}

#[test]
fn test_evaluate_rule_reading_both_engines() {
    let query = sample_query();
    let settings = sample_settings();
    let plan = decode_postgres_explain(serde_json::json!([{
        "Plan": {"Node Type": "Seq Scan", "Total Cost": 250.0}
    }]))
    .unwrap();
    let rule = CompiledRule::compile(&def(
        "expensive",
        "postgresql.explain.plan.total_cost > 100.0 || mysql.explain.query_block.select_id > 5"
    ))
    .unwrap();

    let with_plan = EvalEnv::new(&query, &settings).with_explain(Some(&plan));
    assert!(rule.evaluate(&with_plan).unwrap());

    let without_plan = EvalEnv::new(&query, &settings);
    assert!(!rule.evaluate(&without_plan).unwrap());
}
