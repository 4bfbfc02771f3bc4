//! Per-partition summaries and the synopsis-driven matcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sieve_predicate::{
    normalize::denegate, Data, Expr, MetaExtractorKind, Offset, Operand, Predicate,
    RelationalOperator, Schema, Type,
};

use super::{
    codec::TimePayload, QualifiedRecordField, Synopsis, SynopsisFactory, SynopsisRecord,
    TimeSynopsis,
};
use crate::{
    error::{ResolveError, SynopsisError},
    logging::{sieve_log, LogContext},
    matcher::schema_might_match,
    resolve::resolve,
    slice::TableSlice,
};

const PARTITION_LOG_CTX: LogContext = LogContext::new("component=partition_synopsis");

/// Summary of every batch of one schema in a partition.
#[derive(Debug)]
pub struct PartitionSynopsis {
    schema: Schema,
    fields: BTreeMap<Offset, Box<dyn Synopsis>>,
    events: u64,
    import_time: Option<(i64, i64)>,
}

impl PartitionSynopsis {
    /// An empty summary for `schema` without column synopses.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            fields: BTreeMap::new(),
            events: 0,
            import_time: None,
        }
    }

    /// Schema of the summarized batches.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of summarized rows.
    #[must_use]
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Smallest and largest import time of the summarized batches.
    #[must_use]
    pub fn import_time(&self) -> Option<(i64, i64)> {
        self.import_time
    }

    /// Synopsis of the column at `offset`.
    #[must_use]
    pub fn synopsis(&self, offset: &Offset) -> Option<&dyn Synopsis> {
        self.fields.get(offset).map(Box::as_ref)
    }

    /// Sets the synopsis of the column at `offset`.
    pub fn insert(&mut self, offset: Offset, synopsis: Box<dyn Synopsis>) {
        self.fields.insert(offset, synopsis);
    }

    /// Column synopses in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (&Offset, &dyn Synopsis)> + '_ {
        self.fields
            .iter()
            .map(|(offset, synopsis)| (offset, synopsis.as_ref()))
    }

    /// Approximate size of all column synopses in bytes.
    #[must_use]
    pub fn memusage(&self) -> usize {
        self.fields.values().map(|synopsis| synopsis.memusage()).sum()
    }

    /// Replaces every shrinkable synopsis with its cheaper approximation.
    pub fn shrink(&mut self) {
        for synopsis in self.fields.values_mut() {
            if let Some(smaller) = synopsis.shrink() {
                *synopsis = smaller;
            }
        }
    }

    /// Encodes the summary as JSON.
    pub fn encode(&self) -> Result<Vec<u8>, SynopsisError> {
        let synopses = self
            .fields
            .iter()
            .map(|(offset, synopsis)| {
                let field = QualifiedRecordField::new(&self.schema, offset).ok_or_else(|| {
                    SynopsisError::UnknownOffset {
                        schema: self.schema.name().to_string(),
                        offset: offset.to_string(),
                    }
                })?;
                SynopsisRecord::pack(field, synopsis.as_ref())
            })
            .collect::<Result<Vec<_>, _>>()?;
        let record = PartitionRecord {
            schema: self.schema.as_type().clone(),
            events: self.events,
            import_time: self
                .import_time
                .map(|(min, max)| TimePayload { min, max }),
            synopses,
        };
        Ok(serde_json::to_vec(&record)?)
    }

    /// Decodes a summary, restoring opaque synopses through `factory`.
    pub fn decode(bytes: &[u8], factory: &SynopsisFactory) -> Result<Self, SynopsisError> {
        let record: PartitionRecord = serde_json::from_slice(bytes)?;
        let schema = Schema::from_record(record.schema).ok_or(SynopsisError::InvalidSchema)?;
        let mut partition = Self::new(schema);
        partition.events = record.events;
        partition.import_time = record.import_time.map(|range| (range.min, range.max));
        for entry in record.synopses {
            let (field, synopsis) = entry.unpack(factory)?;
            if !field.belongs_to(&partition.schema) {
                return Err(SynopsisError::SchemaMismatch {
                    expected: partition.schema.name().to_string(),
                    actual: field.schema,
                });
            }
            partition.fields.insert(field.offset, synopsis);
        }
        Ok(partition)
    }
}

#[derive(Serialize, Deserialize)]
struct PartitionRecord {
    schema: Type,
    events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    import_time: Option<TimePayload>,
    synopses: Vec<SynopsisRecord>,
}

/// Builds a [`PartitionSynopsis`] from table slices of one schema.
#[derive(Debug)]
pub struct PartitionSynopsisBuilder {
    partition: PartitionSynopsis,
}

impl PartitionSynopsisBuilder {
    /// Starts a summary with one synopsis per leaf `factory` supports.
    #[must_use]
    pub fn new(schema: Schema, factory: &SynopsisFactory) -> Self {
        let mut partition = PartitionSynopsis::new(schema);
        for leaf in partition.schema.leaves() {
            if let Some(synopsis) = factory.make(&leaf.field.ty) {
                partition.fields.insert(leaf.offset, synopsis);
            }
        }
        Self { partition }
    }

    /// Folds `slice` into the summary.
    ///
    /// Either every column synopsis takes the slice or the summary is left
    /// unchanged.
    pub fn add(&mut self, slice: &TableSlice) -> Result<(), SynopsisError> {
        let partition = &mut self.partition;
        if slice.schema() != &partition.schema {
            return Err(SynopsisError::SchemaMismatch {
                expected: partition.schema.name().to_string(),
                actual: slice.schema().name().to_string(),
            });
        }
        let columns = partition
            .fields
            .iter()
            .map(|(offset, synopsis)| {
                let column = slice.column(offset)?;
                synopsis.accepts(column.as_ref())?;
                Ok(column)
            })
            .collect::<Result<Vec<_>, SynopsisError>>()?;
        for (synopsis, column) in partition.fields.values_mut().zip(&columns) {
            synopsis.add(column.as_ref())?;
        }
        partition.events += slice.rows() as u64;
        if let Some(time) = slice.import_time() {
            partition.import_time = Some(match partition.import_time {
                Some((min, max)) => (min.min(time), max.max(time)),
                None => (time, time),
            });
        }
        Ok(())
    }

    /// Finishes the summary.
    #[must_use]
    pub fn finish(self) -> PartitionSynopsis {
        sieve_log!(
            log::Level::Debug,
            ctx: PARTITION_LOG_CTX,
            "partition_synopsis_built",
            "schema={} events={} synopses={} bytes={}",
            self.partition.schema.name(),
            self.partition.events,
            self.partition.fields.len(),
            self.partition.memusage(),
        );
        self.partition
    }
}

/// Returns false only if the synopses prove no row satisfies `expr`.
///
/// `expr` should already be resolved against the partition's schema; field
/// and type extractors that are still unresolved cannot exclude anything.
#[must_use]
pub fn synopsis_might_match(expr: &Expr, partition: &PartitionSynopsis) -> bool {
    match expr {
        Expr::None => false,
        Expr::Conjunction(children) => children
            .iter()
            .all(|child| synopsis_might_match(child, partition)),
        Expr::Disjunction(children) => children
            .iter()
            .any(|child| synopsis_might_match(child, partition)),
        Expr::Negation(child) => synopsis_might_match(&denegate(child, true), partition),
        Expr::Predicate(predicate) => predicate_might_match(predicate, partition),
    }
}

fn predicate_might_match(predicate: &Predicate, partition: &PartitionSynopsis) -> bool {
    let (extractor, op, literal) = match (&predicate.lhs, &predicate.rhs) {
        (extractor, Operand::Literal(literal)) => (extractor, predicate.op, literal),
        (Operand::Literal(literal), extractor) => (extractor, predicate.op.flip(), literal),
        _ => return true,
    };
    match extractor {
        Operand::MetaExtractor(meta) => match meta.kind {
            MetaExtractorKind::Schema | MetaExtractorKind::SchemaId => {
                schema_might_match(&Expr::Predicate(predicate.clone()), &partition.schema)
            }
            MetaExtractorKind::ImportTime => import_time_might_match(partition, op, literal),
        },
        Operand::DataExtractor(data) if data.schema == partition.schema => partition
            .synopsis(&data.offset)
            .and_then(|synopsis| synopsis.lookup(op, literal))
            .unwrap_or(true),
        _ => true,
    }
}

fn import_time_might_match(
    partition: &PartitionSynopsis,
    op: RelationalOperator,
    literal: &Data,
) -> bool {
    let Some((min, max)) = partition.import_time else {
        return true;
    };
    TimeSynopsis::from_range(Type::time(), min, max)
        .lookup(op, literal)
        .unwrap_or(true)
}

/// Combines the schema-level and the synopsis-level checks for `expr`.
///
/// `expr` is the normalized, unresolved expression; it is resolved against
/// the partition's schema before the synopses are consulted.
pub fn partition_might_match(
    expr: &Expr,
    partition: &PartitionSynopsis,
) -> Result<bool, ResolveError> {
    if !schema_might_match(expr, &partition.schema) {
        return Ok(false);
    }
    let resolved = resolve(expr, &partition.schema)?;
    Ok(synopsis_might_match(&resolved, partition))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, BooleanArray, Int64Array, RecordBatch, TimestampNanosecondArray};
    use sieve_predicate::{ExprBuilder, RecordField};

    use super::*;
    use crate::synopsis::{BoolSynopsis, OpaquePayload, OpaqueSynopsis};

    fn schema() -> Schema {
        Schema::new(
            "conn",
            [
                RecordField::new("ts", Type::time()),
                RecordField::new("ok", Type::bool()),
                RecordField::new("bytes", Type::int64()),
            ],
        )
    }

    fn slice(schema: &Schema, ts: Vec<i64>, ok: Vec<bool>, import: i64) -> TableSlice {
        let bytes = vec![0_i64; ts.len()];
        let batch = RecordBatch::try_new(
            Arc::new(schema.to_arrow()),
            vec![
                Arc::new(TimestampNanosecondArray::from(ts)) as ArrayRef,
                Arc::new(BooleanArray::from(ok)) as ArrayRef,
                Arc::new(Int64Array::from(bytes)) as ArrayRef,
            ],
        )
        .expect("batch");
        TableSlice::new(schema.clone(), batch)
            .expect("slice")
            .with_import_time(import)
    }

    fn partition() -> PartitionSynopsis {
        let schema = schema();
        let mut builder =
            PartitionSynopsisBuilder::new(schema.clone(), &SynopsisFactory::with_defaults());
        builder
            .add(&slice(&schema, vec![100, 200], vec![true, true], 5))
            .expect("add");
        builder
            .add(&slice(&schema, vec![150], vec![true], 9))
            .expect("add");
        builder.finish()
    }

    #[test]
    fn builder_summarizes_supported_columns() {
        let partition = partition();
        assert_eq!(partition.events(), 3);
        assert_eq!(partition.import_time(), Some((5, 9)));
        assert!(partition
            .synopsis(&Offset::from([0]))
            .expect("time synopsis")
            .equals(&TimeSynopsis::from_range(Type::time(), 100, 200)));
        assert!(partition
            .synopsis(&Offset::from([1]))
            .expect("bool synopsis")
            .equals(&BoolSynopsis::from_flags(Type::bool(), true, false)));
        assert!(partition.synopsis(&Offset::from([2])).is_none());
    }

    #[test]
    fn builder_rejects_foreign_slices() {
        let schema = schema();
        let other = Schema::new(
            "dns",
            [
                RecordField::new("ts", Type::time()),
                RecordField::new("ok", Type::bool()),
                RecordField::new("bytes", Type::int64()),
            ],
        );
        let mut builder = PartitionSynopsisBuilder::new(schema, &SynopsisFactory::with_defaults());
        assert!(matches!(
            builder.add(&slice(&other, vec![1], vec![true], 0)),
            Err(SynopsisError::SchemaMismatch { .. })
        ));
    }

    fn time_synopsis_for_any(ty: Type) -> Box<dyn Synopsis> {
        Box::new(TimeSynopsis::new(ty))
    }

    #[test]
    fn rejected_slices_leave_the_builder_unchanged() {
        let schema = schema();
        let mut factory = SynopsisFactory::with_defaults();
        factory.register(sieve_predicate::TypeKind::Int64.name(), time_synopsis_for_any);
        let mut builder = PartitionSynopsisBuilder::new(schema.clone(), &factory);
        assert!(matches!(
            builder.add(&slice(&schema, vec![100], vec![false], 5)),
            Err(SynopsisError::ColumnType { .. })
        ));
        let partition = builder.finish();
        assert_eq!(partition.events(), 0);
        assert_eq!(partition.import_time(), None);
        assert!(partition
            .synopsis(&Offset::from([0]))
            .expect("time synopsis")
            .equals(&TimeSynopsis::new(Type::time())));
        assert!(partition
            .synopsis(&Offset::from([1]))
            .expect("bool synopsis")
            .equals(&BoolSynopsis::new(Type::bool())));
    }

    #[test]
    fn encoding_fails_for_synopses_off_the_schema() {
        let mut partition = PartitionSynopsis::new(schema());
        partition.insert(Offset::from([7]), Box::new(BoolSynopsis::new(Type::bool())));
        assert!(matches!(
            partition.encode(),
            Err(SynopsisError::UnknownOffset { .. })
        ));
    }

    #[test]
    fn column_ranges_exclude_partitions() {
        let partition = partition();
        let late = ExprBuilder::leaf()
            .greater_than(Operand::field("ts"), Data::time(500))
            .build();
        assert_eq!(partition_might_match(&late, &partition), Ok(false));

        let in_range = Expr::predicate(
            Operand::field("ts"),
            RelationalOperator::GreaterEqual,
            Data::time(200),
        );
        assert_eq!(partition_might_match(&in_range, &partition), Ok(true));

        let failed = Expr::predicate(Operand::field("ok"), RelationalOperator::Equal, Data::Bool(false));
        assert_eq!(partition_might_match(&failed, &partition), Ok(false));
        assert_eq!(
            partition_might_match(&Expr::not(failed), &partition),
            Ok(true)
        );

        let unsummarized =
            Expr::predicate(Operand::field("bytes"), RelationalOperator::Equal, Data::Int64(7));
        assert_eq!(partition_might_match(&unsummarized, &partition), Ok(true));
    }

    #[test]
    fn meta_predicates_use_schema_and_import_time() {
        let partition = partition();
        let other_schema = Expr::predicate(
            Operand::meta(MetaExtractorKind::Schema),
            RelationalOperator::Equal,
            Data::from("dns"),
        );
        assert_eq!(partition_might_match(&other_schema, &partition), Ok(false));

        let imported_before = |nanos| {
            Expr::predicate(
                Operand::meta(MetaExtractorKind::ImportTime),
                RelationalOperator::Less,
                Data::time(nanos),
            )
        };
        assert!(!synopsis_might_match(&imported_before(5), &partition));
        assert!(synopsis_might_match(&imported_before(6), &partition));
        assert!(synopsis_might_match(
            &imported_before(0),
            &PartitionSynopsis::new(schema())
        ));
    }

    #[test]
    fn encoding_keeps_every_synopsis() {
        let mut partition = partition();
        partition.insert(
            Offset::from([2]),
            Box::new(OpaqueSynopsis::new(
                Type::int64(),
                OpaquePayload::new("bloom", 2, vec![7, 7]),
            )),
        );
        let bytes = partition.encode().expect("encode");
        let decoded =
            PartitionSynopsis::decode(&bytes, &SynopsisFactory::with_defaults()).expect("decode");
        assert_eq!(decoded.schema(), partition.schema());
        assert_eq!(decoded.events(), 3);
        assert_eq!(decoded.import_time(), Some((5, 9)));
        let restored: Vec<_> = decoded.iter().map(|(offset, _)| offset.clone()).collect();
        assert_eq!(
            restored,
            vec![Offset::from([0]), Offset::from([1]), Offset::from([2])]
        );
        for (offset, synopsis) in partition.iter() {
            let other = decoded.synopsis(offset).expect("decoded synopsis");
            assert!(synopsis.equals(other), "synopsis at {offset} differs");
        }
    }
}
