use std::fmt;

use super::{Data, Offset, Schema, Type};

/// Metadata a [`MetaExtractor`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaExtractorKind {
    /// The schema name (`#schema`).
    Schema,
    /// The schema fingerprint (`#schema_id`).
    SchemaId,
    /// The time a batch was imported (`#import_time`).
    ImportTime,
}

impl MetaExtractorKind {
    /// Textual form including the leading `#`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetaExtractorKind::Schema => "#schema",
            MetaExtractorKind::SchemaId => "#schema_id",
            MetaExtractorKind::ImportTime => "#import_time",
        }
    }
}

impl fmt::Display for MetaExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts bookkeeping metadata rather than event data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaExtractor {
    /// What is extracted.
    pub kind: MetaExtractorKind,
}

/// Abstract reference to fields by a (possibly ambiguous) dotted name suffix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldExtractor {
    /// Dotted field name.
    pub field: String,
}

/// Abstract reference to every field of a type.
///
/// Holds either a concrete type, matched by congruence, or a name-only
/// reference (see [`Type::named_reference`]) matched by type name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeExtractor {
    /// Concrete type or name reference.
    pub ty: Type,
}

impl TypeExtractor {
    /// The concrete type, `None` while only a name is known.
    #[must_use]
    pub fn concrete_type(&self) -> Option<&Type> {
        if self.ty.is_unresolved() {
            None
        } else {
            Some(&self.ty)
        }
    }
}

/// Concrete, schema-bound reference to one field.
///
/// Only produced by schema resolution.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataExtractor {
    /// Schema the offset is valid in.
    pub schema: Schema,
    /// Position of the field within `schema`.
    pub offset: Offset,
}

/// Operand of a predicate.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operand {
    /// Metadata reference.
    MetaExtractor(MetaExtractor),
    /// Type reference.
    TypeExtractor(TypeExtractor),
    /// Field-name reference.
    FieldExtractor(FieldExtractor),
    /// Resolved field reference.
    DataExtractor(DataExtractor),
    /// Literal value.
    Literal(Data),
}

impl Operand {
    /// `#schema`, `#schema_id` or `#import_time`.
    #[must_use]
    pub fn meta(kind: MetaExtractorKind) -> Self {
        Operand::MetaExtractor(MetaExtractor { kind })
    }

    /// Field-name reference.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Operand::FieldExtractor(FieldExtractor { field: name.into() })
    }

    /// Reference to all fields congruent to `ty`.
    #[must_use]
    pub fn of_type(ty: Type) -> Self {
        Operand::TypeExtractor(TypeExtractor { ty })
    }

    /// Reference to all fields whose type is called `name`.
    #[must_use]
    pub fn type_name(name: impl Into<String>) -> Self {
        Operand::TypeExtractor(TypeExtractor {
            ty: Type::named_reference(name),
        })
    }

    /// Resolved reference to `offset` in `schema`.
    #[must_use]
    pub fn data(schema: Schema, offset: Offset) -> Self {
        Operand::DataExtractor(DataExtractor { schema, offset })
    }

    /// Literal operand.
    #[must_use]
    pub fn literal(data: impl Into<Data>) -> Self {
        Operand::Literal(data.into())
    }

    /// Returns true for anything but a literal.
    #[must_use]
    pub fn is_extractor(&self) -> bool {
        !matches!(self, Operand::Literal(_))
    }

    /// The literal, if this operand is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Data> {
        match self {
            Operand::Literal(data) => Some(data),
            _ => None,
        }
    }
}

impl From<Data> for Operand {
    fn from(value: Data) -> Self {
        Operand::Literal(value)
    }
}

impl From<MetaExtractor> for Operand {
    fn from(value: MetaExtractor) -> Self {
        Operand::MetaExtractor(value)
    }
}

impl From<FieldExtractor> for Operand {
    fn from(value: FieldExtractor) -> Self {
        Operand::FieldExtractor(value)
    }
}

impl From<TypeExtractor> for Operand {
    fn from(value: TypeExtractor) -> Self {
        Operand::TypeExtractor(value)
    }
}

impl From<DataExtractor> for Operand {
    fn from(value: DataExtractor) -> Self {
        Operand::DataExtractor(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::MetaExtractor(meta) => f.write_str(meta.kind.as_str()),
            Operand::TypeExtractor(extractor) => write!(f, ":{}", extractor.ty),
            Operand::FieldExtractor(extractor) => f.write_str(&extractor.field),
            Operand::DataExtractor(extractor) => {
                write!(f, "{}{}", extractor.schema.name(), extractor.offset)
            }
            Operand::Literal(data) => write!(f, "{data}"),
        }
    }
}
