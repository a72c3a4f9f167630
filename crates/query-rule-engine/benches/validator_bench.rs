//! 校验器与解析器性能基准测试
//!
//! 针对字段目录上的递归校验和操作符解析进行细粒度测试。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use query_engine::{
    FieldRegistry, Operator, Rule, RuleNode, RuleSet, RuleValue, resolver, validate,
    validate_api_compatibility,
};
use std::hint::black_box;

/// 在内置股票字段上构建规则树，混合合法与非法规则
fn create_tree(rule_count: usize, with_errors: bool) -> RuleSet {
    let rules: Vec<RuleNode> = (0..rule_count)
        .map(|i| match i % 4 {
            0 => Rule::new("marketCap", Operator::Gt, 1_000_000_000i64).into(),
            1 => Rule::new("sector", Operator::In, RuleValue::from(vec!["TECH", "ENERGY"])).into(),
            2 => Rule::new("lastUpdated", Operator::Gt, "2024-01-15").into(),
            _ if with_errors => Rule::new("unknown", Operator::Eq, 1).into(),
            _ => Rule::new("hasEarnings", Operator::Eq, true).into(),
        })
        .collect();
    RuleSet::and(rules)
}

fn bench_validate(c: &mut Criterion) {
    let registry = FieldRegistry::stock();
    let mut group = c.benchmark_group("validate");

    for rule_count in [4, 40, 400].iter() {
        let valid = create_tree(*rule_count, false);
        let invalid = create_tree(*rule_count, true);

        group.bench_with_input(BenchmarkId::new("valid", rule_count), &valid, |b, tree| {
            b.iter(|| black_box(validate(black_box(tree), &registry, false)))
        });
        group.bench_with_input(BenchmarkId::new("invalid", rule_count), &invalid, |b, tree| {
            b.iter(|| black_box(validate(black_box(tree), &registry, false)))
        });
    }

    group.finish();
}

fn bench_compatibility(c: &mut Criterion) {
    let tree = create_tree(400, false);

    c.bench_function("api_compatibility_400_rules", |b| {
        b.iter(|| black_box(validate_api_compatibility(black_box(&tree))))
    });
}

fn bench_resolver(c: &mut Criterion) {
    let registry = FieldRegistry::stock();
    let mut group = c.benchmark_group("resolver");

    group.bench_function("get_operators_all_fields", |b| {
        b.iter(|| {
            for field in registry.fields() {
                black_box(resolver::get_operators(black_box(field)));
            }
        })
    });

    group.bench_function("operator_parse", |b| {
        b.iter(|| {
            for raw in ["=", "≠", "not_in", "IS NULL", "between", "~"] {
                black_box(Operator::parse(black_box(raw)));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_validate, bench_compatibility, bench_resolver);
criterion_main!(benches);
