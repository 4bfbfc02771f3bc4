#![deny(missing_docs)]
//! Sieve predicate crate.
//!
//! Holds the schema-independent half of filtering: the expression tree, its
//! literals and operators, the type and schema model that expressions are later
//! bound against, and the passes that normalize and validate an expression
//! before any schema is known. Binding to a concrete schema, synopses and
//! columnar evaluation live in the `sieve` crate.

mod core;
mod error;
pub mod normalize;
mod validate;

pub use core::{
    compare, compatible, congruent, evaluate, Attribute, Data, DataExtractor, Expr, ExprBuilder,
    FieldExtractor, Leaf, MetaExtractor, MetaExtractorKind, Offset, Operand, Pattern, Predicate,
    RecordField, RelationalOperator, Schema, Type, TypeExtractor, TypeKind,
};

pub use error::SyntaxError;
pub use normalize::{normalize, normalize_with, NormalizeOptions};
pub use validate::validate;
