//! Schema-granularity pre-filter.

use sieve_predicate::{
    evaluate, normalize::denegate, Data, Expr, MetaExtractorKind, Operand, Predicate, Schema,
};

/// Returns false only if no batch of `schema` can satisfy `expr`.
///
/// Only `#schema` and `#schema_id` predicates (and [`Expr::None`]) can exclude
/// a schema here; column content is never consulted.
#[must_use]
pub fn schema_might_match(expr: &Expr, schema: &Schema) -> bool {
    match expr {
        Expr::None => false,
        Expr::Conjunction(children) => children.iter().all(|child| schema_might_match(child, schema)),
        Expr::Disjunction(children) => children.iter().any(|child| schema_might_match(child, schema)),
        Expr::Negation(child) => schema_might_match(&denegate(child, true), schema),
        Expr::Predicate(predicate) => predicate_might_match(predicate, schema),
    }
}

fn predicate_might_match(predicate: &Predicate, schema: &Schema) -> bool {
    let (kind, op, literal) = match (&predicate.lhs, &predicate.rhs) {
        (Operand::MetaExtractor(meta), Operand::Literal(literal)) => {
            (meta.kind, predicate.op, literal)
        }
        (Operand::Literal(literal), Operand::MetaExtractor(meta)) => {
            (meta.kind, predicate.op.flip(), literal)
        }
        _ => return true,
    };
    match kind {
        MetaExtractorKind::Schema => evaluate(&Data::from(schema.name()), op, literal),
        MetaExtractorKind::SchemaId => evaluate(&Data::from(schema.fingerprint()), op, literal),
        MetaExtractorKind::ImportTime => true,
    }
}

#[cfg(test)]
mod tests {
    use sieve_predicate::{Pattern, RecordField, RelationalOperator, Type};

    use super::*;

    fn schema(name: &str) -> Schema {
        Schema::new(name, [RecordField::new("x", Type::int64())])
    }

    fn schema_is(op: RelationalOperator, data: impl Into<Data>) -> Expr {
        Expr::predicate(Operand::meta(MetaExtractorKind::Schema), op, data.into())
    }

    #[test]
    fn schema_name_comparison() {
        let expr = schema_is(RelationalOperator::Equal, "conn");
        assert!(schema_might_match(&expr, &schema("conn")));
        assert!(!schema_might_match(&expr, &schema("dns")));
        let pattern = schema_is(
            RelationalOperator::Equal,
            Pattern::new("zeek\\..*").expect("pattern"),
        );
        assert!(schema_might_match(&pattern, &schema("zeek.conn")));
        assert!(!schema_might_match(&pattern, &schema("suricata.alert")));
    }

    #[test]
    fn schema_id_compares_fingerprint() {
        let conn = schema("conn");
        let expr = Expr::predicate(
            Operand::meta(MetaExtractorKind::SchemaId),
            RelationalOperator::Equal,
            Data::from(conn.fingerprint()),
        );
        assert!(schema_might_match(&expr, &conn));
        assert!(!schema_might_match(&expr, &schema("dns")));
    }

    #[test]
    fn connectives_and_negation() {
        let conn = schema("conn");
        let field = Expr::predicate(Operand::field("x"), RelationalOperator::Equal, Data::Int64(1));
        let dns = schema_is(RelationalOperator::Equal, "dns");
        assert!(!schema_might_match(&Expr::all([field.clone(), dns.clone()]), &conn));
        assert!(schema_might_match(&Expr::any([field, dns.clone()]), &conn));
        assert!(schema_might_match(&Expr::not(dns.clone()), &conn));
        assert!(!schema_might_match(&Expr::not(Expr::not(dns)), &conn));
        assert!(!schema_might_match(&Expr::None, &conn));
    }

    #[test]
    fn import_time_and_literal_left() {
        let conn = schema("conn");
        let import = Expr::predicate(
            Operand::meta(MetaExtractorKind::ImportTime),
            RelationalOperator::Less,
            Data::time(0),
        );
        assert!(schema_might_match(&import, &conn));
        let flipped = Expr::predicate(
            Data::from("dns"),
            RelationalOperator::Equal,
            Operand::meta(MetaExtractorKind::Schema),
        );
        assert!(!schema_might_match(&flipped, &conn));
    }
}
