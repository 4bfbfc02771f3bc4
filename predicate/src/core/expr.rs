use std::fmt;

use super::{Operand, RelationalOperator};

/// Leaf comparison `lhs op rhs`.
///
/// The derived order (lhs, then operator, then rhs) is total and independent
/// of where the predicate sits in a tree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Predicate {
    /// Left operand.
    pub lhs: Operand,
    /// Operator.
    pub op: RelationalOperator,
    /// Right operand.
    pub rhs: Operand,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(lhs: impl Into<Operand>, op: RelationalOperator, rhs: impl Into<Operand>) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    /// Returns the same predicate with operands swapped and the operator flipped.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            lhs: self.rhs,
            op: self.op.flip(),
            rhs: self.lhs,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// Boolean filter expression.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Expr {
    /// The empty expression.
    #[default]
    None,
    /// All children must hold.
    Conjunction(Vec<Expr>),
    /// At least one child must hold.
    Disjunction(Vec<Expr>),
    /// The child must not hold.
    Negation(Box<Expr>),
    /// Leaf comparison.
    Predicate(Predicate),
}

impl Expr {
    /// Leaf predicate expression.
    #[must_use]
    pub fn predicate(
        lhs: impl Into<Operand>,
        op: RelationalOperator,
        rhs: impl Into<Operand>,
    ) -> Self {
        Expr::Predicate(Predicate::new(lhs, op, rhs))
    }

    /// Conjunction of `children`; collapses to `None` or the only child.
    #[must_use]
    pub fn all<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut children: Vec<_> = children.into_iter().collect();
        match children.len() {
            0 => Expr::None,
            1 => children.pop().unwrap_or_default(),
            _ => Expr::Conjunction(children),
        }
    }

    /// Disjunction of `children`; collapses to `None` or the only child.
    #[must_use]
    pub fn any<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut children: Vec<_> = children.into_iter().collect();
        match children.len() {
            0 => Expr::None,
            1 => children.pop().unwrap_or_default(),
            _ => Expr::Disjunction(children),
        }
    }

    /// Negation of `child`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Expr) -> Self {
        Expr::Negation(Box::new(child))
    }

    /// Returns true for [`Expr::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Expr::None)
    }

    /// The leaf predicate, if this is one.
    #[must_use]
    pub fn as_predicate(&self) -> Option<&Predicate> {
        match self {
            Expr::Predicate(predicate) => Some(predicate),
            _ => None,
        }
    }
}

impl From<Predicate> for Expr {
    fn from(value: Predicate) -> Self {
        Expr::Predicate(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Expr], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (idx, child) in children.iter().enumerate() {
                if idx > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }

        match self {
            Expr::None => f.write_str("<none>"),
            Expr::Conjunction(children) => join(f, children, " && "),
            Expr::Disjunction(children) => join(f, children, " || "),
            Expr::Negation(child) => write!(f, "! {child}"),
            Expr::Predicate(predicate) => write!(f, "{predicate}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Data, MetaExtractorKind};

    #[test]
    fn connective_constructors_collapse() {
        assert_eq!(Expr::all([]), Expr::None);
        assert_eq!(Expr::any([]), Expr::None);
        let leaf = Expr::predicate(
            Operand::field("a"),
            RelationalOperator::Equal,
            Data::Int64(1),
        );
        assert_eq!(Expr::all([leaf.clone()]), leaf);
        assert!(matches!(
            Expr::any([leaf.clone(), leaf]),
            Expr::Disjunction(children) if children.len() == 2
        ));
    }

    #[test]
    fn display_renders_tree() {
        let expr = Expr::all([
            Expr::predicate(
                Operand::meta(MetaExtractorKind::Schema),
                RelationalOperator::Equal,
                Data::from("conn"),
            ),
            Expr::not(Expr::any([
                Expr::predicate(
                    Operand::field("user.name"),
                    RelationalOperator::Equal,
                    Data::from("alice"),
                ),
                Expr::predicate(
                    Operand::type_name("port"),
                    RelationalOperator::Less,
                    Data::UInt64(1024),
                ),
            ])),
        ]);
        assert_eq!(
            expr.to_string(),
            "(#schema == \"conn\" && ! (user.name == \"alice\" || :port < 1024))"
        );
    }

    #[test]
    fn flipping_swaps_operands() {
        let predicate = Predicate::new(Data::Int64(1), RelationalOperator::Less, Operand::field("x"));
        let flipped = predicate.flipped();
        assert_eq!(flipped.lhs, Operand::field("x"));
        assert_eq!(flipped.op, RelationalOperator::Greater);
        assert_eq!(flipped.rhs, Operand::literal(1i64));
    }
}
