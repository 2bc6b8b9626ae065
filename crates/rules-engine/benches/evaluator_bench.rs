//! 条件评估性能基准测试
//!
//! 覆盖分发表单次比较、条件树短路求值以及完整的规则匹配流程。

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rules_engine::{
    Condition, ConditionNode, ConditionsEvalEngine, ContentContainer, DataType, DeferredEvaluator,
    EvaluationOptions, InMemoryRulesDataSource, OperatorDispatchTable, Operator, Rule,
    RulesEngineBuilder,
};
use serde_json::{Value, json};
use std::hint::black_box;

/// 分发表单次比较基准
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let table = OperatorDispatchTable::new();

    let cases: Vec<(&str, DataType, Operator, Value, Value)> = vec![
        ("integer_gt", DataType::Integer, Operator::GreaterThan, json!(1000), json!(500)),
        ("decimal_lte", DataType::Decimal, Operator::LesserThanOrEqual, json!(99.5), json!(100)),
        ("string_eq", DataType::String, Operator::Equal, json!("USA"), json!("USA")),
        (
            "string_ci_ends_with",
            DataType::String,
            Operator::CaseInsensitiveEndsWith,
            json!("Hello World"),
            json!("WORLD"),
        ),
        (
            "string_in",
            DataType::String,
            Operator::In,
            json!("CAN"),
            json!(["USA", "MEX", "BRZ", "CAN"]),
        ),
        (
            "array_contains",
            DataType::ArrayString,
            Operator::Contains,
            json!(["a", "b", "c", "d", "vip"]),
            json!("vip"),
        ),
    ];

    for (name, data_type, operator, fact, operand) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| {
                table.dispatch(
                    black_box(*data_type),
                    black_box(*operator),
                    black_box(fact),
                    black_box(operand),
                )
            })
        });
    }

    group.finish();
}

fn facts(width: usize) -> Vec<Condition<String>> {
    (0..width)
        .map(|i| Condition::new(format!("field_{}", i), i as i64))
        .collect()
}

/// 宽度为 `width` 的逻辑组，每个叶子都成立
fn wide_tree(width: usize, and: bool) -> ConditionNode<String> {
    let children = (0..width)
        .map(|i| {
            ConditionNode::value(
                DataType::Integer,
                format!("field_{}", i),
                Operator::Equal,
                i as i64,
            )
        })
        .collect();

    if and {
        ConditionNode::and(children)
    } else {
        ConditionNode::or(children)
    }
}

/// 条件树求值基准：AND 需要评估全部叶子，OR 在第一个叶子短路
fn bench_deferred_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_evaluation");
    let evaluator = DeferredEvaluator::default();
    let options = EvaluationOptions::default();

    for width in [2, 8, 32] {
        let conditions = facts(width);
        let and_tree = wide_tree(width, true);
        let or_tree = wide_tree(width, false);

        group.bench_with_input(BenchmarkId::new("and_all", width), &width, |b, _| {
            b.iter(|| evaluator.eval(black_box(&and_tree), black_box(&conditions), &options))
        });

        group.bench_with_input(BenchmarkId::new("or_short_circuit", width), &width, |b, _| {
            b.iter(|| evaluator.eval(black_box(&or_tree), black_box(&conditions), &options))
        });
    }

    group.finish();
}

/// 完整匹配流程基准（内存数据源）
fn bench_match_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_one");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    for rule_count in [10, 100, 1000] {
        let rules: Vec<Rule<String, String>> = (0..rule_count)
            .map(|i| Rule {
                name: format!("rule_{}", i),
                content_container: ContentContainer::new("banner".to_string(), json!({"id": i})),
                date_begin: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                date_end: None,
                priority: i + 1,
                root_condition: Some(ConditionNode::value(
                    DataType::Integer,
                    "segment".to_string(),
                    Operator::Equal,
                    i % 10,
                )),
            })
            .collect();

        let engine = RulesEngineBuilder::new()
            .with_data_source(InMemoryRulesDataSource::with_rules(rules))
            .build()
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let conditions = vec![Condition::new("segment".to_string(), 7)];
        let content_type = "banner".to_string();

        group.bench_with_input(
            BenchmarkId::from_parameter(rule_count),
            &rule_count,
            |b, _| {
                b.iter(|| {
                    runtime.block_on(engine.match_one(
                        black_box(&content_type),
                        at,
                        black_box(&conditions),
                    ))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_deferred_evaluation,
    bench_match_one
);
criterion_main!(benches);
