#![deny(missing_docs)]
//! Schema-aware event filtering over Arrow batches.
//!
//! A query expression is normalized and validated once. For every schema seen
//! during execution it is bound to concrete columns; partitions are first
//! checked against schema metadata and column synopses, and only batches that
//! cannot be excluded are evaluated row by row.
//!
//! The expression model itself lives in the [`predicate`] crate and is
//! re-exported here.

mod logging;

/// Filter configuration.
pub mod config;
/// Diagnostics sinks for evaluation.
pub mod diagnostics;
/// Error types.
pub mod error;
/// Row-wise and constant evaluation.
pub mod eval;
/// The parse-once, resolve-per-schema filter facade.
pub mod filter;
/// Schema-level pre-filter.
pub mod matcher;
/// Binding of expressions to concrete schemas.
pub mod resolve;
/// Exact dotted-path selectors.
pub mod selector;
/// Schema-tagged record batches.
pub mod slice;
/// Column synopses and partition summaries.
pub mod synopsis;

pub use sieve_predicate as predicate;
pub use sieve_predicate::{
    normalize, normalize_with, validate, Data, Expr, ExprBuilder, MetaExtractorKind,
    NormalizeOptions, Offset, Operand, Pattern, Predicate, RecordField, RelationalOperator, Schema,
    SyntaxError, Type,
};

pub use crate::{
    config::{FilterConfig, PruningPolicy, SynopsisOptions},
    diagnostics::{
        CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, LoggingDiagnosticHandler,
        Severity,
    },
    error::{Error, Failure, ResolveError, SelectorError, SliceError, SynopsisError},
    eval::{const_eval, try_const_eval},
    filter::Filter,
    matcher::schema_might_match,
    resolve::resolve,
    selector::{eval_selector, resolve_selector, Selector, Series},
    slice::TableSlice,
    synopsis::{
        partition_might_match, synopsis_might_match, PartitionSynopsis, PartitionSynopsisBuilder,
        QualifiedRecordField, Synopsis, SynopsisFactory, SynopsisKind, SynopsisRecord,
    },
};
