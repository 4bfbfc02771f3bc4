//! Binding of abstract extractors to the fields of one concrete schema.
//!
//! Field and type extractors become [`DataExtractor`]s addressed by offset. A
//! name that matches several fields expands into a conjunction for negated
//! operators ("no candidate may match") and a disjunction otherwise ("some
//! candidate matches"). A name that matches nothing drops the predicate.

use sieve_predicate::{
    compatible, congruent, Data, DataExtractor, Expr, Offset, Operand, Predicate,
    RelationalOperator, Schema, Type, TypeExtractor,
};

use crate::{
    error::ResolveError,
    logging::{sieve_log, LogContext},
};

const RESOLVE_LOG_CTX: LogContext = LogContext::new("component=resolve");

/// Rewrites `expr` so that every field and type extractor refers to `schema`.
///
/// Returns [`Expr::None`] when no part of the expression applies to the schema.
/// Connectives drop children that resolve to `None`; the input is not modified.
pub fn resolve(expr: &Expr, schema: &Schema) -> Result<Expr, ResolveError> {
    match expr {
        Expr::None => Ok(Expr::None),
        Expr::Conjunction(children) => Ok(Expr::all(resolve_children(children, schema)?)),
        Expr::Disjunction(children) => Ok(Expr::any(resolve_children(children, schema)?)),
        Expr::Negation(child) => match resolve(child, schema)? {
            Expr::None => Ok(Expr::None),
            child => Ok(Expr::not(child)),
        },
        Expr::Predicate(predicate) => resolve_predicate(predicate, schema),
    }
}

fn resolve_children(children: &[Expr], schema: &Schema) -> Result<Vec<Expr>, ResolveError> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match resolve(child, schema)? {
            Expr::None => {}
            child => out.push(child),
        }
    }
    Ok(out)
}

fn resolve_predicate(predicate: &Predicate, schema: &Schema) -> Result<Expr, ResolveError> {
    let (extractor, op, literal) = match (&predicate.lhs, &predicate.rhs) {
        (Operand::Literal(_), Operand::Literal(_)) => {
            return Ok(Expr::Predicate(predicate.clone()))
        }
        (extractor, Operand::Literal(literal)) => (extractor, predicate.op, literal),
        (Operand::Literal(literal), extractor) => (extractor, predicate.op.flip(), literal),
        _ => return Err(ResolveError::UnsupportedPredicate(predicate.to_string())),
    };
    match extractor {
        Operand::MetaExtractor(_) => Ok(Expr::Predicate(predicate.clone())),
        Operand::DataExtractor(extractor) => {
            if extractor.schema == *schema {
                Ok(Expr::Predicate(predicate.clone()))
            } else {
                Err(ResolveError::ForeignExtractor {
                    expected: schema.name().to_string(),
                    actual: extractor.schema.name().to_string(),
                })
            }
        }
        Operand::FieldExtractor(field) => {
            let offsets = schema
                .resolve_name_suffix(&field.field)
                .into_iter()
                .filter(|(_, ty)| compatible(ty, op, literal))
                .map(|(offset, _)| offset)
                .collect();
            Ok(combine(schema, offsets, op, literal, &field.field))
        }
        Operand::TypeExtractor(extractor) => {
            let offsets = schema
                .leaves()
                .into_iter()
                .filter(|leaf| type_matches(extractor, &leaf.field.ty))
                .filter(|leaf| compatible(&leaf.field.ty, op, literal))
                .map(|leaf| leaf.offset)
                .collect();
            Ok(combine(
                schema,
                offsets,
                op,
                literal,
                &Operand::TypeExtractor(extractor.clone()).to_string(),
            ))
        }
        Operand::Literal(_) => Ok(Expr::Predicate(predicate.clone())),
    }
}

fn type_matches(extractor: &TypeExtractor, field_ty: &Type) -> bool {
    match extractor.concrete_type() {
        Some(ty) => congruent(ty, field_ty),
        None => field_ty.name() == extractor.ty.name(),
    }
}

fn combine(
    schema: &Schema,
    offsets: Vec<Offset>,
    op: RelationalOperator,
    literal: &Data,
    source: &str,
) -> Expr {
    if offsets.is_empty() {
        sieve_log!(
            log::Level::Debug,
            ctx: RESOLVE_LOG_CTX,
            "resolve_dropped",
            "extractor={} schema={}",
            source,
            schema.name(),
        );
        return Expr::None;
    }
    let predicates = offsets.into_iter().map(|offset| {
        Expr::predicate(
            DataExtractor {
                schema: schema.clone(),
                offset,
            },
            op,
            literal.clone(),
        )
    });
    if op.is_negated() {
        Expr::all(predicates)
    } else {
        Expr::any(predicates)
    }
}

#[cfg(test)]
mod tests {
    use sieve_predicate::{MetaExtractorKind, RecordField};

    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "conn",
            [
                RecordField::new(
                    "user",
                    Type::record([
                        RecordField::new("name", Type::string()),
                        RecordField::new("id", Type::int64()),
                    ]),
                ),
                RecordField::new(
                    "peer",
                    Type::record([
                        RecordField::new("name", Type::string()),
                        RecordField::new("port", Type::uint64().with_name("port")),
                    ]),
                ),
                RecordField::new("ts", Type::time()),
            ],
        )
    }

    fn bound(schema: &Schema, offset: impl Into<Offset>, op: RelationalOperator, data: Data) -> Expr {
        Expr::predicate(Operand::data(schema.clone(), offset.into()), op, data)
    }

    #[test]
    fn unique_field_resolves_to_single_predicate() {
        let schema = schema();
        let expr = Expr::predicate(
            Operand::field("user.name"),
            RelationalOperator::Equal,
            Data::from("alice"),
        );
        assert_eq!(
            resolve(&expr, &schema).expect("resolve"),
            bound(&schema, [0, 0], RelationalOperator::Equal, Data::from("alice"))
        );
    }

    #[test]
    fn ambiguous_field_follows_operator_polarity() {
        let schema = schema();
        let positive = Expr::predicate(
            Operand::field("name"),
            RelationalOperator::Equal,
            Data::from("x"),
        );
        assert_eq!(
            resolve(&positive, &schema).expect("resolve"),
            Expr::Disjunction(vec![
                bound(&schema, [0, 0], RelationalOperator::Equal, Data::from("x")),
                bound(&schema, [1, 0], RelationalOperator::Equal, Data::from("x")),
            ])
        );
        let negative = Expr::predicate(
            Operand::field("name"),
            RelationalOperator::NotEqual,
            Data::from("x"),
        );
        assert_eq!(
            resolve(&negative, &schema).expect("resolve"),
            Expr::Conjunction(vec![
                bound(&schema, [0, 0], RelationalOperator::NotEqual, Data::from("x")),
                bound(&schema, [1, 0], RelationalOperator::NotEqual, Data::from("x")),
            ])
        );
    }

    #[test]
    fn incompatible_or_missing_fields_drop_out() {
        let schema = schema();
        let missing = Expr::predicate(
            Operand::field("nope"),
            RelationalOperator::Equal,
            Data::Int64(1),
        );
        assert_eq!(resolve(&missing, &schema).expect("resolve"), Expr::None);
        let incompatible = Expr::predicate(
            Operand::field("name"),
            RelationalOperator::Less,
            Data::Int64(1),
        );
        assert_eq!(resolve(&incompatible, &schema).expect("resolve"), Expr::None);

        let expr = Expr::all([
            missing.clone(),
            Expr::predicate(Operand::field("id"), RelationalOperator::Equal, Data::Int64(7)),
        ]);
        assert_eq!(
            resolve(&expr, &schema).expect("resolve"),
            bound(&schema, [0, 1], RelationalOperator::Equal, Data::Int64(7))
        );
        assert_eq!(
            resolve(&Expr::not(missing), &schema).expect("resolve"),
            Expr::None
        );
    }

    #[test]
    fn type_extractors_match_by_name_or_congruence() {
        let schema = schema();
        let by_name = Expr::predicate(
            Operand::type_name("port"),
            RelationalOperator::Less,
            Data::UInt64(1024),
        );
        assert_eq!(
            resolve(&by_name, &schema).expect("resolve"),
            bound(&schema, [1, 1], RelationalOperator::Less, Data::UInt64(1024))
        );
        let by_type = Expr::predicate(
            Operand::of_type(Type::string()),
            RelationalOperator::Equal,
            Data::from("x"),
        );
        assert_eq!(
            resolve(&by_type, &schema).expect("resolve"),
            Expr::Disjunction(vec![
                bound(&schema, [0, 0], RelationalOperator::Equal, Data::from("x")),
                bound(&schema, [1, 0], RelationalOperator::Equal, Data::from("x")),
            ])
        );
    }

    #[test]
    fn meta_and_literal_left_predicates() {
        let schema = schema();
        let meta = Expr::predicate(
            Operand::meta(MetaExtractorKind::Schema),
            RelationalOperator::Equal,
            Data::from("conn"),
        );
        assert_eq!(resolve(&meta, &schema).expect("resolve"), meta);
        let flipped = Expr::predicate(Data::time(5), RelationalOperator::Less, Operand::field("ts"));
        assert_eq!(
            resolve(&flipped, &schema).expect("resolve"),
            bound(&schema, [2], RelationalOperator::Greater, Data::time(5))
        );
    }

    #[test]
    fn rejects_foreign_and_extractor_pairs() {
        let schema = schema();
        let other = Schema::new("dns", [RecordField::new("q", Type::string())]);
        let foreign = bound(&other, [0], RelationalOperator::Equal, Data::from("x"));
        assert!(matches!(
            resolve(&foreign, &schema),
            Err(ResolveError::ForeignExtractor { .. })
        ));
        let pair = Expr::predicate(
            Operand::field("a"),
            RelationalOperator::Equal,
            Operand::field("b"),
        );
        assert!(matches!(
            resolve(&pair, &schema),
            Err(ResolveError::UnsupportedPredicate(_))
        ));
    }
}
