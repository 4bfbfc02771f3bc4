//! Rewrite passes that bring expressions into canonical form.
//!
//! Every pass is total and returns a new tree. [`normalize`] chains them in a
//! fixed order and iterates to a fixpoint.

use std::cmp::Ordering;

use crate::core::{Expr, Operand, Predicate};

/// Options for [`normalize_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop predicates on metadata extractors before the other passes.
    pub prune_meta: bool,
}

/// Normalizes `expr` with the default options.
#[must_use]
pub fn normalize(expr: &Expr) -> Expr {
    normalize_with(expr, NormalizeOptions::default())
}

/// Runs prune (optional), hoist, denegate, align and deduplicate.
///
/// Hoisting and deduplication repeat until the tree stops changing, so the
/// result is a fixpoint of this function.
#[must_use]
pub fn normalize_with(expr: &Expr, options: NormalizeOptions) -> Expr {
    let pruned;
    let expr = if options.prune_meta {
        pruned = prune_meta_predicates(expr);
        &pruned
    } else {
        expr
    };
    let mut current = deduplicate(&align(&denegate(&hoist(expr), false)));
    loop {
        let next = deduplicate(&hoist(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Removes every predicate that involves a metadata extractor.
///
/// Connectives left without children collapse to [`Expr::None`], connectives
/// with one child collapse to that child.
#[must_use]
pub fn prune_meta_predicates(expr: &Expr) -> Expr {
    match expr {
        Expr::None => Expr::None,
        Expr::Conjunction(children) => Expr::all(prune_children(children)),
        Expr::Disjunction(children) => Expr::any(prune_children(children)),
        Expr::Negation(child) => match prune_meta_predicates(child) {
            Expr::None => Expr::None,
            child => Expr::not(child),
        },
        Expr::Predicate(predicate) => {
            let is_meta = |operand: &Operand| matches!(operand, Operand::MetaExtractor(_));
            if is_meta(&predicate.lhs) || is_meta(&predicate.rhs) {
                Expr::None
            } else {
                expr.clone()
            }
        }
    }
}

fn prune_children(children: &[Expr]) -> Vec<Expr> {
    children
        .iter()
        .map(prune_meta_predicates)
        .filter(|child| !child.is_none())
        .collect()
}

/// Splices children of nested connectives of the same kind into their parent.
///
/// `(a && (b && c))` becomes `(a && b && c)`; singleton connectives collapse.
#[must_use]
pub fn hoist(expr: &Expr) -> Expr {
    match expr {
        Expr::Conjunction(children) => {
            let mut out = Vec::with_capacity(children.len());
            for child in children {
                match hoist(child) {
                    Expr::Conjunction(grandchildren) => out.extend(grandchildren),
                    child => out.push(child),
                }
            }
            Expr::all(out)
        }
        Expr::Disjunction(children) => {
            let mut out = Vec::with_capacity(children.len());
            for child in children {
                match hoist(child) {
                    Expr::Disjunction(grandchildren) => out.extend(grandchildren),
                    child => out.push(child),
                }
            }
            Expr::any(out)
        }
        Expr::Negation(child) => Expr::not(hoist(child)),
        Expr::None | Expr::Predicate(_) => expr.clone(),
    }
}

/// Pushes negations down to the leaves.
///
/// With `negate` set, the result is the negation of `expr`. Connectives swap
/// under De Morgan, double negations cancel and leaf predicates take the
/// negated operator, so the output contains no [`Expr::Negation`].
#[must_use]
pub fn denegate(expr: &Expr, negate: bool) -> Expr {
    match expr {
        Expr::None => Expr::None,
        Expr::Conjunction(children) => {
            let children = children.iter().map(|child| denegate(child, negate)).collect();
            if negate {
                Expr::Disjunction(children)
            } else {
                Expr::Conjunction(children)
            }
        }
        Expr::Disjunction(children) => {
            let children = children.iter().map(|child| denegate(child, negate)).collect();
            if negate {
                Expr::Conjunction(children)
            } else {
                Expr::Disjunction(children)
            }
        }
        Expr::Negation(child) => denegate(child, !negate),
        Expr::Predicate(predicate) => {
            let mut predicate = predicate.clone();
            if negate {
                predicate.op = predicate.op.negate();
            }
            Expr::Predicate(predicate)
        }
    }
}

/// Moves literals to the right-hand side of their predicate.
///
/// A predicate `literal op extractor` becomes `extractor flip(op) literal`.
#[must_use]
pub fn align(expr: &Expr) -> Expr {
    match expr {
        Expr::None => Expr::None,
        Expr::Conjunction(children) => Expr::Conjunction(children.iter().map(align).collect()),
        Expr::Disjunction(children) => Expr::Disjunction(children.iter().map(align).collect()),
        Expr::Negation(child) => Expr::not(align(child)),
        Expr::Predicate(predicate) => {
            if !predicate.lhs.is_extractor() && predicate.rhs.is_extractor() {
                Expr::Predicate(predicate.clone().flipped())
            } else {
                expr.clone()
            }
        }
    }
}

/// Drops repeated siblings under the same connective, keeping the first.
#[must_use]
pub fn deduplicate(expr: &Expr) -> Expr {
    match expr {
        Expr::Conjunction(children) => Expr::all(dedup_children(children)),
        Expr::Disjunction(children) => Expr::any(dedup_children(children)),
        Expr::Negation(child) => Expr::not(deduplicate(child)),
        Expr::None | Expr::Predicate(_) => expr.clone(),
    }
}

fn dedup_children(children: &[Expr]) -> Vec<Expr> {
    let mut out: Vec<Expr> = Vec::with_capacity(children.len());
    for child in children.iter().map(deduplicate) {
        if !out.contains(&child) {
            out.push(child);
        }
    }
    out
}

/// Collects the distinct leaf predicates of `expr` in ascending order.
#[must_use]
pub fn predicates(expr: &Expr) -> Vec<Predicate> {
    match expr {
        Expr::None => Vec::new(),
        Expr::Conjunction(children) | Expr::Disjunction(children) => children
            .iter()
            .map(predicates)
            .fold(Vec::new(), |acc, next| merge_sorted(acc, next)),
        Expr::Negation(child) => predicates(child),
        Expr::Predicate(predicate) => vec![predicate.clone()],
    }
}

/// Union of two ascending, duplicate-free lists.
fn merge_sorted(lhs: Vec<Predicate>, rhs: Vec<Predicate>) -> Vec<Predicate> {
    let mut out = Vec::with_capacity(lhs.len() + rhs.len());
    let mut lhs = lhs.into_iter().peekable();
    let mut rhs = rhs.into_iter().peekable();
    loop {
        let ordering = match (lhs.peek(), rhs.peek()) {
            (Some(l), Some(r)) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return out,
        };
        match ordering {
            Ordering::Less => out.extend(lhs.next()),
            Ordering::Greater => out.extend(rhs.next()),
            Ordering::Equal => {
                out.extend(lhs.next());
                rhs.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Data, MetaExtractorKind, RelationalOperator};

    fn eq(field: &str, value: i64) -> Expr {
        Expr::predicate(
            Operand::field(field),
            RelationalOperator::Equal,
            Data::Int64(value),
        )
    }

    #[test]
    fn double_negation_cancels() {
        let expr = Expr::not(Expr::not(eq("a", 1)));
        assert_eq!(denegate(&expr, false), eq("a", 1));
        assert_eq!(normalize(&expr), eq("a", 1));
    }

    #[test]
    fn de_morgan_swaps_connectives() {
        let expr = Expr::not(Expr::all([eq("a", 1), eq("b", 2)]));
        let expected = Expr::any([
            Expr::predicate(
                Operand::field("a"),
                RelationalOperator::NotEqual,
                Data::Int64(1),
            ),
            Expr::predicate(
                Operand::field("b"),
                RelationalOperator::NotEqual,
                Data::Int64(2),
            ),
        ]);
        assert_eq!(denegate(&expr, false), expected);
    }

    #[test]
    fn hoist_flattens_same_kind_only() {
        let expr = Expr::all([
            eq("a", 1),
            Expr::all([eq("b", 2), eq("c", 3)]),
            Expr::any([eq("d", 4), eq("e", 5)]),
        ]);
        let Expr::Conjunction(children) = hoist(&expr) else {
            panic!("expected conjunction");
        };
        assert_eq!(children.len(), 4);
        assert!(matches!(children[3], Expr::Disjunction(_)));
    }

    #[test]
    fn align_moves_literal_right() {
        let expr = Expr::predicate(Data::Int64(3), RelationalOperator::Less, Operand::field("x"));
        assert_eq!(
            align(&expr),
            Expr::predicate(Operand::field("x"), RelationalOperator::Greater, Data::Int64(3))
        );
        let membership = Expr::predicate(
            Data::from("a"),
            RelationalOperator::In,
            Operand::field("tags"),
        );
        assert_eq!(
            align(&membership),
            Expr::predicate(Operand::field("tags"), RelationalOperator::Ni, Data::from("a"))
        );
    }

    #[test]
    fn deduplicate_keeps_first_occurrence() {
        let expr = Expr::any([eq("a", 1), eq("b", 2), eq("a", 1)]);
        assert_eq!(deduplicate(&expr), Expr::any([eq("a", 1), eq("b", 2)]));
        assert_eq!(deduplicate(&Expr::all([eq("a", 1), eq("a", 1)])), eq("a", 1));
    }

    #[test]
    fn meta_pruning_collapses_connectives() {
        let schema = Expr::predicate(
            Operand::meta(MetaExtractorKind::Schema),
            RelationalOperator::Equal,
            Data::from("conn"),
        );
        let expr = Expr::all([schema.clone(), Expr::not(schema.clone()), eq("a", 1)]);
        assert_eq!(prune_meta_predicates(&expr), eq("a", 1));
        assert_eq!(prune_meta_predicates(&schema), Expr::None);
        let options = NormalizeOptions { prune_meta: true };
        assert_eq!(normalize_with(&Expr::any([schema.clone(), schema]), options), Expr::None);
    }

    #[test]
    fn normalize_reaches_fixpoint_after_collapse() {
        let expr = Expr::all([eq("a", 1), Expr::any([eq("b", 2), eq("b", 2)])]);
        let normalized = normalize(&expr);
        assert_eq!(normalized, Expr::all([eq("a", 1), eq("b", 2)]));
        assert_eq!(normalize(&normalized), normalized);
    }

    #[test]
    fn predicates_are_sorted_and_unique() {
        let expr = Expr::all([
            eq("c", 3),
            Expr::any([eq("a", 1), eq("c", 3)]),
            Expr::not(eq("b", 2)),
        ]);
        let collected = predicates(&expr);
        let names: Vec<_> = collected.iter().map(|p| p.lhs.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
