use std::fmt;

use serde::{Deserialize, Serialize};

/// Relational operator used by binary predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationalOperator {
    /// Equals (`==`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    Less,
    /// Less than or equal to (`<=`).
    LessEqual,
    /// Greater than (`>`).
    Greater,
    /// Greater than or equal to (`>=`).
    GreaterEqual,
    /// Left operand is contained in the right operand (`in`).
    In,
    /// Left operand is not contained in the right operand (`!in`).
    NotIn,
    /// Left operand contains the right operand (`ni`).
    Ni,
    /// Left operand does not contain the right operand (`!ni`).
    NotNi,
}

impl RelationalOperator {
    /// All operators, in declaration order.
    pub const ALL: [RelationalOperator; 10] = [
        RelationalOperator::Equal,
        RelationalOperator::NotEqual,
        RelationalOperator::Less,
        RelationalOperator::LessEqual,
        RelationalOperator::Greater,
        RelationalOperator::GreaterEqual,
        RelationalOperator::In,
        RelationalOperator::NotIn,
        RelationalOperator::Ni,
        RelationalOperator::NotNi,
    ];

    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelationalOperator::Equal => "==",
            RelationalOperator::NotEqual => "!=",
            RelationalOperator::Less => "<",
            RelationalOperator::LessEqual => "<=",
            RelationalOperator::Greater => ">",
            RelationalOperator::GreaterEqual => ">=",
            RelationalOperator::In => "in",
            RelationalOperator::NotIn => "!in",
            RelationalOperator::Ni => "ni",
            RelationalOperator::NotNi => "!ni",
        }
    }

    /// Returns the operator that swaps the left/right side of the comparison.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            RelationalOperator::Equal => RelationalOperator::Equal,
            RelationalOperator::NotEqual => RelationalOperator::NotEqual,
            RelationalOperator::Less => RelationalOperator::Greater,
            RelationalOperator::LessEqual => RelationalOperator::GreaterEqual,
            RelationalOperator::Greater => RelationalOperator::Less,
            RelationalOperator::GreaterEqual => RelationalOperator::LessEqual,
            RelationalOperator::In => RelationalOperator::Ni,
            RelationalOperator::NotIn => RelationalOperator::NotNi,
            RelationalOperator::Ni => RelationalOperator::In,
            RelationalOperator::NotNi => RelationalOperator::NotIn,
        }
    }

    /// Returns the logical negation of this operator.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            RelationalOperator::Equal => RelationalOperator::NotEqual,
            RelationalOperator::NotEqual => RelationalOperator::Equal,
            RelationalOperator::Less => RelationalOperator::GreaterEqual,
            RelationalOperator::LessEqual => RelationalOperator::Greater,
            RelationalOperator::Greater => RelationalOperator::LessEqual,
            RelationalOperator::GreaterEqual => RelationalOperator::Less,
            RelationalOperator::In => RelationalOperator::NotIn,
            RelationalOperator::NotIn => RelationalOperator::In,
            RelationalOperator::Ni => RelationalOperator::NotNi,
            RelationalOperator::NotNi => RelationalOperator::Ni,
        }
    }

    /// Returns true for the negated family (`!=`, `!in`, `!ni`).
    #[must_use]
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            RelationalOperator::NotEqual | RelationalOperator::NotIn | RelationalOperator::NotNi
        )
    }

    /// Returns true for `<`, `<=`, `>` and `>=`.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            RelationalOperator::Less
                | RelationalOperator::LessEqual
                | RelationalOperator::Greater
                | RelationalOperator::GreaterEqual
        )
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
