use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, RecordBatch, StringArray, StructArray,
        TimestampNanosecondArray, UInt64Array,
    },
    datatypes::{DataType, UInt64Type},
};
use sieve::{
    const_eval, eval_selector,
    predicate::normalize::denegate,
    resolve, schema_might_match, try_const_eval, CollectingDiagnosticHandler, Data, Expr,
    ExprBuilder, Filter, FilterConfig, MetaExtractorKind, Offset, Operand, PartitionSynopsisBuilder,
    RecordField, RelationalOperator, Schema, Selector, Severity, SynopsisFactory, TableSlice, Type,
};

fn conn_schema() -> Schema {
    Schema::new(
        "zeek.conn",
        [
            RecordField::new("ts", Type::time()),
            RecordField::new(
                "id",
                Type::record([
                    RecordField::new("orig_h", Type::string()),
                    RecordField::new("resp_p", Type::uint64().with_name("port")),
                ]),
            ),
            RecordField::new("established", Type::bool()),
        ],
    )
}

fn dns_schema() -> Schema {
    Schema::new(
        "zeek.dns",
        [
            RecordField::new("ts", Type::time()),
            RecordField::new("query", Type::string()),
        ],
    )
}

fn conn_slice(ts: &[i64], hosts: &[&str], ports: &[u64], established: &[bool]) -> TableSlice {
    let schema = conn_schema();
    let arrow_schema = Arc::new(schema.to_arrow());
    let id_fields = match arrow_schema.field(1).data_type() {
        DataType::Struct(fields) => fields.clone(),
        other => panic!("unexpected id type {other}"),
    };
    let id = StructArray::new(
        id_fields,
        vec![
            Arc::new(StringArray::from(hosts.to_vec())) as ArrayRef,
            Arc::new(UInt64Array::from(ports.to_vec())) as ArrayRef,
        ],
        None,
    );
    let batch = RecordBatch::try_new(
        arrow_schema,
        vec![
            Arc::new(TimestampNanosecondArray::from(ts.to_vec())) as ArrayRef,
            Arc::new(id) as ArrayRef,
            Arc::new(BooleanArray::from(established.to_vec())) as ArrayRef,
        ],
    )
    .expect("conn batch");
    TableSlice::new(schema, batch).expect("conn slice")
}

fn dns_slice(ts: &[i64], queries: &[&str]) -> TableSlice {
    let schema = dns_schema();
    let batch = RecordBatch::try_new(
        Arc::new(schema.to_arrow()),
        vec![
            Arc::new(TimestampNanosecondArray::from(ts.to_vec())) as ArrayRef,
            Arc::new(StringArray::from(queries.to_vec())) as ArrayRef,
        ],
    )
    .expect("dns batch");
    TableSlice::new(schema, batch).expect("dns slice")
}

fn selected(mask: &BooleanArray) -> Vec<usize> {
    (0..mask.len())
        .filter(|&row| mask.is_valid(row) && mask.value(row))
        .collect()
}

#[test]
fn filter_runs_across_schemas_and_partitions() {
    let expr = ExprBuilder::or()
        .and_group(|group| {
            group
                .equals(Operand::field("orig_h"), Data::from("10.0.0.1"))
                .greater_than_or_equal(Operand::type_name("port"), Data::UInt64(1024))
        })
        .equals(Operand::field("query"), Data::from("example.com"))
        .build();
    let mut filter = Filter::new(&expr, FilterConfig::default()).expect("filter");

    let conn = conn_slice(
        &[10, 20, 30],
        &["10.0.0.1", "10.0.0.2", "10.0.0.1"],
        &[80, 8080, 4433],
        &[true, true, false],
    );
    let dns = dns_slice(&[15, 25], &["example.com", "example.org"]);

    let mut dh = CollectingDiagnosticHandler::new();
    let conn_mask = filter.evaluate(&conn, &mut dh).expect("evaluate conn");
    assert_eq!(selected(&conn_mask), vec![2]);
    let dns_mask = filter.evaluate(&dns, &mut dh).expect("evaluate dns");
    assert_eq!(selected(&dns_mask), vec![0]);
    assert!(dh.diagnostics().is_empty());

    let factory = SynopsisFactory::with_defaults();
    let mut builder = PartitionSynopsisBuilder::new(dns_schema(), &factory);
    builder.add(&dns.clone().with_import_time(1_000)).expect("add");
    let partition = builder.finish();
    assert!(filter.might_match(&partition).expect("might match"));

    let late = Expr::predicate(
        Operand::field("ts"),
        RelationalOperator::Greater,
        Data::time(1_000),
    );
    let mut late_filter = Filter::new(&late, FilterConfig::default()).expect("filter");
    assert!(!late_filter.might_match(&partition).expect("might match"));
}

#[test]
fn schema_matcher_and_resolution_agree() {
    let expr = ExprBuilder::and()
        .equals(Operand::meta(MetaExtractorKind::Schema), Data::from("zeek.conn"))
        .equals(Operand::field("established"), Data::Bool(true))
        .build();
    let normalized = sieve::normalize(&expr);
    assert!(schema_might_match(&normalized, &conn_schema()));
    assert!(!schema_might_match(&normalized, &dns_schema()));

    let resolved = resolve(&normalized, &conn_schema()).expect("resolve");
    let bound = Expr::predicate(
        Operand::data(conn_schema(), Offset::from([2])),
        RelationalOperator::Equal,
        Data::Bool(true),
    );
    assert!(matches!(&resolved, Expr::Conjunction(children) if children.contains(&bound)));
}

#[test]
fn double_negation_disappears() {
    let a_is_one = Expr::predicate(Operand::field("a"), RelationalOperator::Equal, Data::Int64(1));
    let twice = Expr::not(Expr::not(a_is_one.clone()));
    assert_eq!(denegate(&twice, false), a_is_one);
    assert_eq!(sieve::normalize(&twice), a_is_one);
}

#[test]
fn selectors_read_exact_paths() {
    let slice = conn_slice(&[1, 2], &["a", "b"], &[53, 443], &[true, false]);
    let mut dh = CollectingDiagnosticHandler::new();
    let selector: Selector = "id.resp_p".parse().expect("selector");
    let series = eval_selector(&selector, &slice, &mut dh);
    assert_eq!(series.ty.explicit_name(), Some("port"));
    assert_eq!(
        series.array.as_primitive::<UInt64Type>().values().to_vec(),
        vec![53, 443]
    );
    assert!(dh.diagnostics().is_empty());

    let missing: Selector = "resp_p".parse().expect("selector");
    let series = eval_selector(&missing, &slice, &mut dh);
    assert_eq!(series.null_count(), 2);
    assert_eq!(dh.diagnostics().len(), 1);
    assert_eq!(dh.diagnostics()[0].severity, Severity::Warning);
}

#[test]
fn constant_folding() {
    let mut dh = CollectingDiagnosticHandler::new();
    let constant = Expr::any([
        Expr::predicate(Data::Int64(1), RelationalOperator::Less, Data::Int64(2)),
        Expr::predicate(Data::from("a"), RelationalOperator::Equal, Data::from("b")),
    ]);
    assert_eq!(const_eval(&constant, &mut dh), Ok(Data::Bool(true)));

    let needs_input = Expr::predicate(Operand::field("x"), RelationalOperator::Equal, Data::Int64(1));
    assert!(const_eval(&needs_input, &mut dh).is_err());
    assert!(dh.diagnostics().iter().any(|d| d.severity == Severity::Error));

    let mut quiet = CollectingDiagnosticHandler::new();
    assert_eq!(try_const_eval(&needs_input, &mut quiet), None);
    assert!(quiet.diagnostics().is_empty());
}
