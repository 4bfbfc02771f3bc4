use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

/// Positional path from a schema root to a (possibly nested) field.
///
/// Offsets order lexicographically, so a parent sorts before its children.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Offset(Vec<usize>);

impl Offset {
    /// The empty offset, addressing the schema root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new offset with `index` appended.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    /// Appends a field index in place.
    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    /// Field indices from the root downward.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for Offset {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Offset {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[usize; N]> for Offset {
    fn from(value: [usize; N]) -> Self {
        Self(value.to_vec())
    }
}

impl FromIterator<usize> for Offset {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, index) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{index}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_lexicographically() {
        let mut offsets = vec![
            Offset::from([1]),
            Offset::from([0, 2]),
            Offset::from([0]),
            Offset::from([0, 1, 5]),
        ];
        offsets.sort();
        assert_eq!(
            offsets,
            vec![
                Offset::from([0]),
                Offset::from([0, 1, 5]),
                Offset::from([0, 2]),
                Offset::from([1]),
            ]
        );
    }

    #[test]
    fn child_extends_path() {
        let offset = Offset::root().child(3).child(1);
        assert_eq!(offset.as_slice(), &[3, 1]);
        assert_eq!(offset.to_string(), "[3,1]");
        assert_eq!(Offset::root().to_string(), "[]");
    }
}
