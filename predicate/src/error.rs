use thiserror::Error;

use crate::core::{Data, MetaExtractorKind, Operand, RelationalOperator, Type};

/// Semantic error detected before an expression is bound to any schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// The expression is [`Expr::None`](crate::Expr::None).
    #[error("empty expression is invalid")]
    EmptyExpression,
    /// `#schema` or `#schema_id` compared against something other than a string or pattern.
    #[error("{extractor} requires a string or pattern operand: {extractor} {op} {literal}")]
    MetaOperand {
        /// Offending metadata extractor.
        extractor: MetaExtractorKind,
        /// Operator of the predicate.
        op: RelationalOperator,
        /// Offending literal.
        literal: Data,
    },
    /// `#import_time` used with a non-time literal or a non-ordering operator.
    #[error("#import_time only supports ordering comparisons against a time: #import_time {op} {literal}")]
    ImportTime {
        /// Operator of the predicate.
        op: RelationalOperator,
        /// Offending literal.
        literal: Data,
    },
    /// A concrete type extractor cannot be compared with the literal.
    #[error("type extractor type check failure: :{ty} {op} {literal}")]
    TypeMismatch {
        /// Concrete type of the extractor.
        ty: Type,
        /// Operator of the predicate.
        op: RelationalOperator,
        /// Offending literal.
        literal: Data,
    },
    /// Both operands are extractors.
    #[error("predicate compares two extractors: {lhs} {op} {rhs}")]
    ExtractorPair {
        /// Left operand.
        lhs: Operand,
        /// Operator of the predicate.
        op: RelationalOperator,
        /// Right operand.
        rhs: Operand,
    },
}
