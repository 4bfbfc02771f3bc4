use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, RecordBatch, TimestampNanosecondArray};
use proptest::prelude::*;
use sieve::{
    normalize, partition_might_match, CollectingDiagnosticHandler, Data, Expr, Filter,
    FilterConfig, MetaExtractorKind, NormalizeOptions, Operand, PartitionSynopsisBuilder,
    RecordField, RelationalOperator, Schema, SynopsisFactory, TableSlice, Type,
};

type Row = (Option<i64>, Option<bool>);

fn schema() -> Schema {
    Schema::new(
        "events",
        [
            RecordField::new("ts", Type::time()),
            RecordField::new("flag", Type::bool()),
        ],
    )
}

fn slice(rows: &[Row], import_time: i64) -> TableSlice {
    let schema = schema();
    let ts: Vec<Option<i64>> = rows.iter().map(|(ts, _)| *ts).collect();
    let flags: Vec<Option<bool>> = rows.iter().map(|(_, flag)| *flag).collect();
    let batch = RecordBatch::try_new(
        Arc::new(schema.to_arrow()),
        vec![
            Arc::new(TimestampNanosecondArray::from(ts)) as ArrayRef,
            Arc::new(BooleanArray::from(flags)) as ArrayRef,
        ],
    )
    .expect("batch");
    TableSlice::new(schema, batch)
        .expect("slice")
        .with_import_time(import_time)
}

fn op_strategy() -> impl Strategy<Value = RelationalOperator> {
    prop_oneof![
        Just(RelationalOperator::Equal),
        Just(RelationalOperator::NotEqual),
        Just(RelationalOperator::Less),
        Just(RelationalOperator::LessEqual),
        Just(RelationalOperator::Greater),
        Just(RelationalOperator::GreaterEqual),
    ]
}

fn ordering_strategy() -> impl Strategy<Value = RelationalOperator> {
    prop_oneof![
        Just(RelationalOperator::Less),
        Just(RelationalOperator::LessEqual),
        Just(RelationalOperator::Greater),
        Just(RelationalOperator::GreaterEqual),
    ]
}

fn equality_strategy() -> impl Strategy<Value = RelationalOperator> {
    prop_oneof![
        Just(RelationalOperator::Equal),
        Just(RelationalOperator::NotEqual)
    ]
}

fn leaf_strategy() -> impl Strategy<Value = Expr> {
    prop_oneof![
        3 => (op_strategy(), -50_i64..50).prop_map(|(op, ts)| Expr::predicate(
            Operand::field("ts"),
            op,
            Data::time(ts)
        )),
        2 => (equality_strategy(), any::<bool>())
            .prop_map(|(op, flag)| Expr::predicate(Operand::field("flag"), op, Data::Bool(flag))),
        1 => (equality_strategy(), prop_oneof![Just("events"), Just("other")]).prop_map(
            |(op, name)| Expr::predicate(
                Operand::meta(MetaExtractorKind::Schema),
                op,
                Data::from(name)
            )
        ),
        1 => (ordering_strategy(), 0_i64..20).prop_map(|(op, nanos)| Expr::predicate(
            Operand::meta(MetaExtractorKind::ImportTime),
            op,
            Data::time(nanos)
        )),
    ]
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    leaf_strategy().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..3).prop_map(Expr::all),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Expr::any),
            inner.prop_map(Expr::not),
        ]
    })
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        prop::option::weighted(0.8, -40_i64..40),
        prop::option::weighted(0.8, any::<bool>()),
    )
}

fn meta_pruning() -> FilterConfig {
    FilterConfig {
        normalize: NormalizeOptions { prune_meta: true },
        ..FilterConfig::default()
    }
}

proptest! {
    #[test]
    fn pruning_never_hides_matching_rows(
        expr in expr_strategy(),
        rows in prop::collection::vec(row_strategy(), 1..12),
        import_time in 0_i64..20,
        prune_meta in any::<bool>(),
    ) {
        let slice = slice(&rows, import_time);
        let mut builder = PartitionSynopsisBuilder::new(schema(), &SynopsisFactory::with_defaults());
        builder.add(&slice).expect("add");
        let partition = builder.finish();

        let config = if prune_meta { meta_pruning() } else { FilterConfig::default() };
        let mut filter = Filter::new(&expr, config).expect("filter");
        let mut dh = CollectingDiagnosticHandler::new();
        let mask = filter.evaluate(&slice, &mut dh).expect("evaluate");
        prop_assert_eq!(mask.len(), rows.len());
        let any_row = mask.iter().any(|value| value == Some(true));

        if any_row {
            prop_assert!(filter.might_match(&partition).expect("might match"));
            prop_assert!(partition_might_match(&normalize(&expr), &partition).expect("partition"));
        }
    }

    #[test]
    fn meta_pruning_selects_the_same_rows(
        expr in expr_strategy(),
        rows in prop::collection::vec(row_strategy(), 1..12),
        import_time in 0_i64..20,
    ) {
        let slice = slice(&rows, import_time);
        let mut dh = CollectingDiagnosticHandler::new();
        let mut plain = Filter::new(&expr, FilterConfig::default()).expect("filter");
        let mut pruned = Filter::new(&expr, meta_pruning()).expect("filter");
        let expected = plain.evaluate(&slice, &mut dh).expect("evaluate");
        let actual = pruned.evaluate(&slice, &mut dh).expect("evaluate");
        let expected: Vec<bool> = expected.iter().map(|value| value == Some(true)).collect();
        let actual: Vec<bool> = actual.iter().map(|value| value == Some(true)).collect();
        prop_assert_eq!(actual, expected);
    }
}
