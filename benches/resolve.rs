use std::{hint::black_box, iter::repeat_with, sync::Arc};

use arrow::array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sieve::{
    eval, normalize, resolve, CollectingDiagnosticHandler, Data, Expr, ExprBuilder, Filter,
    FilterConfig, Operand, RecordField, Schema, TableSlice, Type,
};

fn wide_schema(groups: usize) -> Schema {
    let fields = (0..groups).map(|group| {
        RecordField::new(
            format!("g{group}"),
            Type::record([
                RecordField::new("name", Type::string()),
                RecordField::new("count", Type::int64()),
            ]),
        )
    });
    Schema::new("bench.wide", fields)
}

fn query() -> Expr {
    ExprBuilder::or()
        .and_group(|group| {
            group
                .equals(Operand::field("name"), Data::from("needle"))
                .greater_than(Operand::field("count"), Data::Int64(500))
        })
        .not_group(|group| group.less_than(Operand::field("g0.count"), Data::Int64(10)))
        .build()
}

fn flat_slice(rows: usize) -> TableSlice {
    let schema = Schema::new(
        "bench.flat",
        [
            RecordField::new("name", Type::string()),
            RecordField::new("count", Type::int64()),
        ],
    );
    let names: Vec<String> = (0..rows)
        .map(|_| repeat_with(fastrand::alphanumeric).take(8).collect())
        .collect();
    let counts: Vec<i64> = (0..rows).map(|_| fastrand::i64(0..1_000)).collect();
    let batch = RecordBatch::try_new(
        Arc::new(schema.to_arrow()),
        vec![
            Arc::new(StringArray::from(names)) as ArrayRef,
            Arc::new(Int64Array::from(counts)) as ArrayRef,
        ],
    )
    .expect("batch");
    TableSlice::new(schema, batch).expect("slice")
}

fn resolve_wide(c: &mut Criterion) {
    let expr = normalize(&query());
    let mut group = c.benchmark_group("resolve");
    for groups in [4, 32, 256] {
        let schema = wide_schema(groups);
        group.bench_with_input(BenchmarkId::from_parameter(groups), &schema, |b, schema| {
            b.iter(|| resolve(black_box(&expr), black_box(schema)).expect("resolve"))
        });
    }
    group.finish();
}

fn evaluate_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for rows in [1_024, 65_536] {
        let slice = flat_slice(rows);
        let mut filter = Filter::new(&query(), FilterConfig::default()).expect("filter");
        let resolved = filter.resolve(slice.schema()).expect("resolve").clone();
        group.bench_with_input(BenchmarkId::new("resolved", rows), &slice, |b, slice| {
            let mut dh = CollectingDiagnosticHandler::new();
            b.iter(|| eval::evaluate(black_box(&resolved), slice, &mut dh))
        });
        group.bench_with_input(BenchmarkId::new("filter", rows), &slice, |b, slice| {
            let mut dh = CollectingDiagnosticHandler::new();
            b.iter(|| filter.evaluate(black_box(slice), &mut dh).expect("evaluate"))
        });
    }
    group.finish();
}

criterion_group!(benches, resolve_wide, evaluate_flat);
criterion_main!(benches);
