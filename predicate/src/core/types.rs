use std::{fmt, sync::Arc};

use arrow_schema::{DataType, Field, Fields, TimeUnit};
use serde::{Deserialize, Serialize};

use super::{Data, RelationalOperator};

/// Free-form key/optional-value metadata attached to a type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Optional attribute value.
    pub value: Option<String>,
}

/// A named field inside a record type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordField {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: Type,
}

impl RecordField {
    /// Creates a field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Structural shape of a type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// The null type; also the kind of an unresolved type reference.
    Null,
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 64-bit floating point.
    Double,
    /// Nanosecond duration.
    Duration,
    /// Nanosecond timestamp.
    Time,
    /// UTF-8 string.
    String,
    /// Opaque bytes.
    Blob,
    /// List of a single element type.
    List(Box<Type>),
    /// Ordered record of named fields.
    Record(Vec<RecordField>),
}

impl TypeKind {
    /// Name of the kind, used as the implicit name of unnamed types.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Null => "null",
            TypeKind::Bool => "bool",
            TypeKind::Int64 => "int64",
            TypeKind::UInt64 => "uint64",
            TypeKind::Double => "double",
            TypeKind::Duration => "duration",
            TypeKind::Time => "time",
            TypeKind::String => "string",
            TypeKind::Blob => "blob",
            TypeKind::List(_) => "list",
            TypeKind::Record(_) => "record",
        }
    }
}

/// A possibly named, possibly nested type with attributes.
///
/// Equality is structural over kind, name and attributes. Use [`congruent`]
/// to compare shapes while ignoring names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Type {
    kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<Attribute>,
}

impl Type {
    /// Creates an unnamed type of the given kind.
    #[must_use]
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            name: None,
            attributes: Vec::new(),
        }
    }

    /// `null` type.
    #[must_use]
    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    /// `bool` type.
    #[must_use]
    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    /// `int64` type.
    #[must_use]
    pub fn int64() -> Self {
        Self::new(TypeKind::Int64)
    }

    /// `uint64` type.
    #[must_use]
    pub fn uint64() -> Self {
        Self::new(TypeKind::UInt64)
    }

    /// `double` type.
    #[must_use]
    pub fn double() -> Self {
        Self::new(TypeKind::Double)
    }

    /// `duration` type.
    #[must_use]
    pub fn duration() -> Self {
        Self::new(TypeKind::Duration)
    }

    /// `time` type.
    #[must_use]
    pub fn time() -> Self {
        Self::new(TypeKind::Time)
    }

    /// `string` type.
    #[must_use]
    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    /// `blob` type.
    #[must_use]
    pub fn blob() -> Self {
        Self::new(TypeKind::Blob)
    }

    /// List type over `element`.
    #[must_use]
    pub fn list(element: Type) -> Self {
        Self::new(TypeKind::List(Box::new(element)))
    }

    /// Record type over `fields`.
    #[must_use]
    pub fn record<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = RecordField>,
    {
        Self::new(TypeKind::Record(fields.into_iter().collect()))
    }

    /// An unresolved reference to a type by name.
    #[must_use]
    pub fn named_reference(name: impl Into<String>) -> Self {
        Self::null().with_name(name)
    }

    /// Returns this type under a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns this type with an additional attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value,
        });
        self
    }

    /// The kind of this type.
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The explicit name, if any.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit name, or the kind name for unnamed types.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.name())
    }

    /// Attributes in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute; `Some(None)` for a key without value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<Option<&str>> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| attribute.value.as_deref())
    }

    /// Record fields, when this is a record type.
    #[must_use]
    pub fn fields(&self) -> Option<&[RecordField]> {
        match &self.kind {
            TypeKind::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns true for record types.
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record(_))
    }

    /// Returns true when this is a name-only reference awaiting resolution.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self.kind, TypeKind::Null) && self.name.is_some()
    }

    /// Arrow representation of this type.
    #[must_use]
    pub fn to_arrow(&self) -> DataType {
        match &self.kind {
            TypeKind::Null => DataType::Null,
            TypeKind::Bool => DataType::Boolean,
            TypeKind::Int64 => DataType::Int64,
            TypeKind::UInt64 => DataType::UInt64,
            TypeKind::Double => DataType::Float64,
            TypeKind::Duration => DataType::Duration(TimeUnit::Nanosecond),
            TypeKind::Time => DataType::Timestamp(TimeUnit::Nanosecond, None),
            TypeKind::String => DataType::Utf8,
            TypeKind::Blob => DataType::Binary,
            TypeKind::List(element) => {
                DataType::List(Arc::new(Field::new("item", element.to_arrow(), true)))
            }
            TypeKind::Record(fields) => DataType::Struct(record_fields_to_arrow(fields)),
        }
    }
}

pub(crate) fn record_fields_to_arrow(fields: &[RecordField]) -> Fields {
    fields
        .iter()
        .map(|field| Field::new(field.name.as_str(), field.ty.to_arrow(), true))
        .collect()
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            return f.write_str(name);
        }
        match &self.kind {
            TypeKind::List(element) => write!(f, "list<{element}>"),
            TypeKind::Record(fields) => {
                f.write_str("record{")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
            kind => f.write_str(kind.name()),
        }
    }
}

/// Structural equivalence that ignores names and attributes.
#[must_use]
pub fn congruent(lhs: &Type, rhs: &Type) -> bool {
    match (lhs.kind(), rhs.kind()) {
        (TypeKind::List(l), TypeKind::List(r)) => congruent(l, r),
        (TypeKind::Record(l), TypeKind::Record(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| congruent(&l.ty, &r.ty))
        }
        (l, r) => std::mem::discriminant(l) == std::mem::discriminant(r),
    }
}

/// Whether values of `ty` can meaningfully be compared against `data` with `op`.
#[must_use]
pub fn compatible(ty: &Type, op: RelationalOperator, data: &Data) -> bool {
    match op {
        RelationalOperator::Equal | RelationalOperator::NotEqual => equality_compatible(ty, data),
        RelationalOperator::Less
        | RelationalOperator::LessEqual
        | RelationalOperator::Greater
        | RelationalOperator::GreaterEqual => ordering_compatible(ty, data),
        RelationalOperator::In | RelationalOperator::NotIn => match (ty.kind(), data) {
            (_, Data::List(values)) => values
                .iter()
                .all(|value| equality_compatible(ty, value)),
            (TypeKind::String, Data::String(_)) => true,
            _ => false,
        },
        RelationalOperator::Ni | RelationalOperator::NotNi => match (ty.kind(), data) {
            (TypeKind::List(element), value) => equality_compatible(element, value),
            (TypeKind::String, Data::String(_) | Data::Pattern(_)) => true,
            _ => false,
        },
    }
}

fn equality_compatible(ty: &Type, data: &Data) -> bool {
    match (ty.kind(), data) {
        (_, Data::Null) => true,
        (TypeKind::Bool, Data::Bool(_)) => true,
        (
            TypeKind::Int64 | TypeKind::UInt64 | TypeKind::Double,
            Data::Int64(_) | Data::UInt64(_) | Data::Double(_),
        ) => true,
        (TypeKind::Duration, Data::Duration(_)) => true,
        (TypeKind::Time, Data::Time(_)) => true,
        (TypeKind::String, Data::String(_) | Data::Pattern(_)) => true,
        (TypeKind::Blob, Data::Blob(_)) => true,
        (TypeKind::List(element), Data::List(values)) => values
            .iter()
            .all(|value| equality_compatible(element, value)),
        _ => false,
    }
}

fn ordering_compatible(ty: &Type, data: &Data) -> bool {
    matches!(
        (ty.kind(), data),
        (
            TypeKind::Int64 | TypeKind::UInt64 | TypeKind::Double,
            Data::Int64(_) | Data::UInt64(_) | Data::Double(_),
        ) | (TypeKind::Duration, Data::Duration(_))
            | (TypeKind::Time, Data::Time(_))
            | (TypeKind::String, Data::String(_))
    )
}
