use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{types::record_fields_to_arrow, Offset, RecordField, Type};

/// A named record type describing the rows of one batch.
///
/// Cloning is cheap. Equality is by name and shape; the fingerprint is a
/// SHA-256 digest of the canonical JSON form of the type and is computed once.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    ty: Type,
    fingerprint: String,
}

/// A leaf field reachable from a schema root.
#[derive(Clone, Debug)]
pub struct Leaf<'a> {
    /// Position of the field.
    pub offset: Offset,
    /// Dotted key from the root, without the schema name.
    pub key: String,
    /// The field itself.
    pub field: &'a RecordField,
}

impl Schema {
    /// Creates a schema from a name and its top-level fields.
    #[must_use]
    pub fn new<I>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = RecordField>,
    {
        Self::from_parts(Type::record(fields).with_name(name))
    }

    /// Wraps a named record type; `None` for anything else.
    #[must_use]
    pub fn from_record(ty: Type) -> Option<Self> {
        if ty.is_record() && ty.explicit_name().is_some() {
            Some(Self::from_parts(ty))
        } else {
            None
        }
    }

    fn from_parts(ty: Type) -> Self {
        let fingerprint = fingerprint_type(&ty);
        Self {
            inner: Arc::new(SchemaInner { ty, fingerprint }),
        }
    }

    /// Declared schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.ty.name()
    }

    /// Stable content hash of the schema, as lowercase hex.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    /// The underlying named record type.
    #[must_use]
    pub fn as_type(&self) -> &Type {
        &self.inner.ty
    }

    /// Top-level fields.
    #[must_use]
    pub fn fields(&self) -> &[RecordField] {
        self.inner.ty.fields().unwrap_or(&[])
    }

    /// Field addressed by `offset`, `None` for the root or an invalid path.
    #[must_use]
    pub fn field(&self, offset: &Offset) -> Option<&RecordField> {
        let (last, parents) = offset.split_last()?;
        let mut fields = self.fields();
        for index in parents {
            fields = fields.get(*index)?.ty.fields()?;
        }
        fields.get(*last)
    }

    /// All non-record fields in depth-first declaration order.
    #[must_use]
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut out = Vec::new();
        collect_leaves(self.fields(), &Offset::root(), "", &mut out);
        out
    }

    /// Resolves `name` as a dot-boundary suffix of each leaf key.
    ///
    /// A leaf `a.b.c` in schema `s` matches `c`, `b.c`, `a.b.c` and `s.a.b.c`.
    #[must_use]
    pub fn resolve_name_suffix(&self, name: &str) -> Vec<(Offset, Type)> {
        if name.is_empty() {
            return Vec::new();
        }
        self.leaves()
            .into_iter()
            .filter(|leaf| {
                is_suffix(&leaf.key, name)
                    || is_suffix(&format!("{}.{}", self.name(), leaf.key), name)
            })
            .map(|leaf| (leaf.offset, leaf.field.ty.clone()))
            .collect()
    }

    /// Arrow schema with one column per top-level field.
    #[must_use]
    pub fn to_arrow(&self) -> arrow_schema::Schema {
        arrow_schema::Schema::new(record_fields_to_arrow(self.fields()))
    }
}

fn collect_leaves<'a>(
    fields: &'a [RecordField],
    prefix: &Offset,
    key_prefix: &str,
    out: &mut Vec<Leaf<'a>>,
) {
    for (index, field) in fields.iter().enumerate() {
        let offset = prefix.child(index);
        let key = if key_prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{key_prefix}.{}", field.name)
        };
        match field.ty.fields() {
            Some(children) => collect_leaves(children, &offset, &key, out),
            None => out.push(Leaf { offset, key, field }),
        }
    }
}

fn is_suffix(key: &str, name: &str) -> bool {
    if key == name {
        return true;
    }
    key.len() > name.len()
        && key.ends_with(name)
        && key.as_bytes()[key.len() - name.len() - 1] == b'.'
}

fn fingerprint_type(ty: &Type) -> String {
    let canonical = match serde_json::to_value(ty) {
        Ok(value) => sorted_keys(value).to_string(),
        Err(_) => ty.to_string(),
    };
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

fn sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_unstable_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => items.into_iter().map(sorted_keys).collect(),
        scalar => scalar,
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.ty == other.inner.ty
    }
}

impl Eq for Schema {}

impl PartialOrd for Schema {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Schema {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return Ordering::Equal;
        }
        self.inner.ty.cmp(&other.inner.ty)
    }
}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.fingerprint.hash(state);
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name())
            .field("fingerprint", &self.fingerprint())
            .field("fields", &self.fields())
            .finish()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
