//! Expression model: literals, types, schemas, operands and trees.

mod builder;
mod data;
mod expr;
mod offset;
mod operand;
mod operator;
mod schema;
mod types;

pub use builder::ExprBuilder;
pub use data::{compare, evaluate, Data, Pattern};
pub use expr::{Expr, Predicate};
pub use offset::Offset;
pub use operand::{
    DataExtractor, FieldExtractor, MetaExtractor, MetaExtractorKind, Operand, TypeExtractor,
};
pub use operator::RelationalOperator;
pub use schema::{Leaf, Schema};
pub use types::{compatible, congruent, Attribute, RecordField, Type, TypeKind};
