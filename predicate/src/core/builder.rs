//! Builder for composing expression trees.

use super::{Data, Expr, Operand, RelationalOperator};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuilderCombine {
    Leaf,
    Conjunction,
    Disjunction,
}

/// Builder for composing expressions incrementally.
#[derive(Debug)]
pub struct ExprBuilder {
    combine: BuilderCombine,
    clauses: Vec<Expr>,
}

impl ExprBuilder {
    const fn new(combine: BuilderCombine) -> Self {
        Self {
            combine,
            clauses: Vec::new(),
        }
    }

    /// Creates a builder that expects a single clause.
    #[must_use]
    pub fn leaf() -> Self {
        Self::new(BuilderCombine::Leaf)
    }

    /// Creates a builder that emits a conjunction of all clauses.
    #[must_use]
    pub fn and() -> Self {
        Self::new(BuilderCombine::Conjunction)
    }

    /// Creates a builder that emits a disjunction of all clauses.
    #[must_use]
    pub fn or() -> Self {
        Self::new(BuilderCombine::Disjunction)
    }

    /// Adds an existing expression.
    #[must_use]
    pub fn expr(mut self, expr: Expr) -> Self {
        self.clauses.push(expr);
        self
    }

    /// Adds `left op right`.
    #[must_use]
    pub fn compare<L, R>(mut self, left: L, op: RelationalOperator, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.clauses.push(Expr::predicate(left, op, right));
        self
    }

    /// Adds `left == right`.
    #[must_use]
    pub fn equals<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::Equal, right)
    }

    /// Adds `left != right`.
    #[must_use]
    pub fn not_equals<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::NotEqual, right)
    }

    /// Adds `left < right`.
    #[must_use]
    pub fn less_than<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::Less, right)
    }

    /// Adds `left <= right`.
    #[must_use]
    pub fn less_than_or_equal<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::LessEqual, right)
    }

    /// Adds `left > right`.
    #[must_use]
    pub fn greater_than<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::Greater, right)
    }

    /// Adds `left >= right`.
    #[must_use]
    pub fn greater_than_or_equal<L, R>(self, left: L, right: R) -> Self
    where
        L: Into<Operand>,
        R: Into<Operand>,
    {
        self.compare(left, RelationalOperator::GreaterEqual, right)
    }

    /// Adds `expr in [list...]`.
    #[must_use]
    pub fn in_list<O, I>(self, expr: O, list: I) -> Self
    where
        O: Into<Operand>,
        I: IntoIterator<Item = Data>,
    {
        let list = Data::List(list.into_iter().collect());
        self.compare(expr, RelationalOperator::In, list)
    }

    /// Adds `expr !in [list...]`.
    #[must_use]
    pub fn not_in_list<O, I>(self, expr: O, list: I) -> Self
    where
        O: Into<Operand>,
        I: IntoIterator<Item = Data>,
    {
        let list = Data::List(list.into_iter().collect());
        self.compare(expr, RelationalOperator::NotIn, list)
    }

    /// Adds `haystack ni needle`.
    #[must_use]
    pub fn contains<O, D>(self, haystack: O, needle: D) -> Self
    where
        O: Into<Operand>,
        D: Into<Data>,
    {
        self.compare(haystack, RelationalOperator::Ni, needle.into())
    }

    fn branch<F>(mut self, combine: BuilderCombine, build: F) -> Self
    where
        F: FnOnce(ExprBuilder) -> ExprBuilder,
    {
        let expr = build(ExprBuilder::new(combine)).build();
        self.clauses.push(expr);
        self
    }

    /// Adds a nested conjunction built by the supplied closure.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(ExprBuilder) -> ExprBuilder,
    {
        self.branch(BuilderCombine::Conjunction, build)
    }

    /// Adds a nested disjunction built by the supplied closure.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(ExprBuilder) -> ExprBuilder,
    {
        self.branch(BuilderCombine::Disjunction, build)
    }

    /// Adds the negation of a conjunction built by the supplied closure.
    #[must_use]
    pub fn not_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(ExprBuilder) -> ExprBuilder,
    {
        let expr = build(ExprBuilder::and()).build();
        self.clauses.push(Expr::not(expr));
        self
    }

    /// Consumes the builder and returns the composed expression.
    #[must_use]
    pub fn build(self) -> Expr {
        assert!(
            !self.clauses.is_empty(),
            "ExprBuilder requires at least one clause"
        );
        match self.combine {
            BuilderCombine::Leaf => {
                assert!(
                    self.clauses.len() == 1,
                    "ExprBuilder::leaf must contain exactly one clause"
                );
                Expr::all(self.clauses)
            }
            BuilderCombine::Conjunction => Expr::all(self.clauses),
            BuilderCombine::Disjunction => Expr::any(self.clauses),
        }
    }
}

impl Default for ExprBuilder {
    fn default() -> Self {
        Self::leaf()
    }
}
