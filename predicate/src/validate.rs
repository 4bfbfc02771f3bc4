//! Schema-independent semantic checks.

use crate::{
    core::{compatible, Data, Expr, MetaExtractorKind, Operand, Predicate, RelationalOperator},
    error::SyntaxError,
};

/// Checks that every predicate of `expr` is well-formed for its extractor kind.
///
/// Field extractors and unresolved type extractors always pass: their validity
/// depends on a concrete schema. Stops at the first offending predicate.
pub fn validate(expr: &Expr) -> Result<(), SyntaxError> {
    match expr {
        Expr::None => Err(SyntaxError::EmptyExpression),
        Expr::Conjunction(children) | Expr::Disjunction(children) => {
            children.iter().try_for_each(validate)
        }
        Expr::Negation(child) => validate(child),
        Expr::Predicate(predicate) => validate_predicate(predicate),
    }
}

fn validate_predicate(predicate: &Predicate) -> Result<(), SyntaxError> {
    match (&predicate.lhs, &predicate.rhs) {
        (Operand::Literal(_), Operand::Literal(_)) => Ok(()),
        (extractor, Operand::Literal(literal)) => check(extractor, predicate.op, literal),
        (Operand::Literal(literal), extractor) => check(extractor, predicate.op.flip(), literal),
        (lhs, rhs) => Err(SyntaxError::ExtractorPair {
            lhs: lhs.clone(),
            op: predicate.op,
            rhs: rhs.clone(),
        }),
    }
}

fn check(extractor: &Operand, op: RelationalOperator, literal: &Data) -> Result<(), SyntaxError> {
    match extractor {
        Operand::MetaExtractor(meta) => match meta.kind {
            MetaExtractorKind::Schema | MetaExtractorKind::SchemaId => match literal {
                Data::String(_) | Data::Pattern(_) => Ok(()),
                _ => Err(SyntaxError::MetaOperand {
                    extractor: meta.kind,
                    op,
                    literal: literal.clone(),
                }),
            },
            MetaExtractorKind::ImportTime => {
                if matches!(literal, Data::Time(_)) && op.is_ordering() {
                    Ok(())
                } else {
                    Err(SyntaxError::ImportTime {
                        op,
                        literal: literal.clone(),
                    })
                }
            }
        },
        Operand::TypeExtractor(extractor) => match extractor.concrete_type() {
            Some(ty) if !compatible(ty, op, literal) => Err(SyntaxError::TypeMismatch {
                ty: ty.clone(),
                op,
                literal: literal.clone(),
            }),
            _ => Ok(()),
        },
        Operand::FieldExtractor(_) | Operand::DataExtractor(_) | Operand::Literal(_) => Ok(()),
    }
}
