use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use regex::{Regex, RegexBuilder};

use super::RelationalOperator;

/// Regular-expression literal.
///
/// Patterns compare by their source text. `==` against a string is a full
/// (anchored) match; `ni` against a string is a search.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    case_insensitive: bool,
    anchored: Regex,
    unanchored: Regex,
}

impl Pattern {
    /// Compiles a case-sensitive pattern.
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        Self::with_case(source, false)
    }

    /// Compiles a pattern, optionally ignoring case.
    pub fn with_case(source: impl Into<String>, case_insensitive: bool) -> Result<Self, regex::Error> {
        let source = source.into();
        let anchored = RegexBuilder::new(&format!("^(?:{source})$"))
            .case_insensitive(case_insensitive)
            .build()?;
        let unanchored = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            source,
            case_insensitive,
            anchored,
            unanchored,
        })
    }

    /// The pattern source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern ignores case.
    #[must_use]
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Returns true when the whole input matches.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        self.anchored.is_match(input)
    }

    /// Returns true when any substring of the input matches.
    #[must_use]
    pub fn search(&self, input: &str) -> bool {
        self.unanchored.is_match(input)
    }

    fn key(&self) -> (&str, bool) {
        (&self.source, self.case_insensitive)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pattern {}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)?;
        if self.case_insensitive {
            f.write_str("i")?;
        }
        Ok(())
    }
}

/// Literal value carried by predicate operands.
///
/// `Time` counts nanoseconds since the Unix epoch, `Duration` counts
/// nanoseconds. The derived order is structural (variant first, then value)
/// and is what the predicate extractor sorts by; semantic comparisons across
/// numeric variants go through [`evaluate`].
#[derive(Clone, Debug)]
pub enum Data {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 64-bit floating point.
    Double(f64),
    /// Duration in nanoseconds.
    Duration(i64),
    /// Point in time, nanoseconds since the epoch.
    Time(i64),
    /// UTF-8 string.
    String(String),
    /// Opaque bytes.
    Blob(Vec<u8>),
    /// Regular expression.
    Pattern(Pattern),
    /// Homogeneous or heterogeneous list of values.
    List(Vec<Data>),
}

impl Data {
    /// Time literal from nanoseconds since the epoch.
    #[must_use]
    pub fn time(nanos: i64) -> Self {
        Data::Time(nanos)
    }

    /// Duration literal from nanoseconds.
    #[must_use]
    pub fn duration(nanos: i64) -> Self {
        Data::Duration(nanos)
    }

    /// Returns true for [`Data::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Int64(_) => "int64",
            Data::UInt64(_) => "uint64",
            Data::Double(_) => "double",
            Data::Duration(_) => "duration",
            Data::Time(_) => "time",
            Data::String(_) => "string",
            Data::Blob(_) => "blob",
            Data::Pattern(_) => "pattern",
            Data::List(_) => "list",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Data::Null => 0,
            Data::Bool(_) => 1,
            Data::Int64(_) => 2,
            Data::UInt64(_) => 3,
            Data::Double(_) => 4,
            Data::Duration(_) => 5,
            Data::Time(_) => 6,
            Data::String(_) => 7,
            Data::Blob(_) => 8,
            Data::Pattern(_) => 9,
            Data::List(_) => 10,
        }
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Data {}

impl PartialOrd for Data {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Data {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Data::Null, Data::Null) => Ordering::Equal,
            (Data::Bool(lhs), Data::Bool(rhs)) => lhs.cmp(rhs),
            (Data::Int64(lhs), Data::Int64(rhs)) => lhs.cmp(rhs),
            (Data::UInt64(lhs), Data::UInt64(rhs)) => lhs.cmp(rhs),
            (Data::Double(lhs), Data::Double(rhs)) => lhs.total_cmp(rhs),
            (Data::Duration(lhs), Data::Duration(rhs)) => lhs.cmp(rhs),
            (Data::Time(lhs), Data::Time(rhs)) => lhs.cmp(rhs),
            (Data::String(lhs), Data::String(rhs)) => lhs.cmp(rhs),
            (Data::Blob(lhs), Data::Blob(rhs)) => lhs.cmp(rhs),
            (Data::Pattern(lhs), Data::Pattern(rhs)) => lhs.cmp(rhs),
            (Data::List(lhs), Data::List(rhs)) => lhs.cmp(rhs),
            (lhs, rhs) => lhs.rank().cmp(&rhs.rank()),
        }
    }
}

impl Hash for Data {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Data::Null => {}
            Data::Bool(value) => value.hash(state),
            Data::Int64(value) | Data::Duration(value) | Data::Time(value) => value.hash(state),
            Data::UInt64(value) => value.hash(state),
            Data::Double(value) => value.to_bits().hash(state),
            Data::String(value) => value.hash(state),
            Data::Blob(value) => value.hash(state),
            Data::Pattern(value) => value.hash(state),
            Data::List(values) => values.hash(state),
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Null => f.write_str("null"),
            Data::Bool(value) => write!(f, "{value}"),
            Data::Int64(value) => write!(f, "{value}"),
            Data::UInt64(value) => write!(f, "{value}"),
            Data::Double(value) => write!(f, "{value:?}"),
            Data::Duration(value) => write!(f, "{value}ns"),
            Data::Time(value) => write!(f, "@{value}ns"),
            Data::String(value) => write!(f, "{value:?}"),
            Data::Blob(value) => {
                f.write_str("0x")?;
                for byte in value {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Data::Pattern(value) => write!(f, "{value}"),
            Data::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int64(value)
    }
}

impl From<u64> for Data {
    fn from(value: u64) -> Self {
        Data::UInt64(value)
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Double(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_owned())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Blob(value)
    }
}

impl From<Pattern> for Data {
    fn from(value: Pattern) -> Self {
        Data::Pattern(value)
    }
}

impl From<Vec<Data>> for Data {
    fn from(value: Vec<Data>) -> Self {
        Data::List(value)
    }
}

/// Evaluates `lhs op rhs` over two literals.
///
/// `null == null` holds and `null != x` holds for any non-null `x`; ordering
/// against `null` or across unrelated kinds is false.
#[must_use]
pub fn evaluate(lhs: &Data, op: RelationalOperator, rhs: &Data) -> bool {
    match op {
        RelationalOperator::Equal => equals(lhs, rhs),
        RelationalOperator::NotEqual => !equals(lhs, rhs),
        RelationalOperator::Less => compare(lhs, rhs) == Some(Ordering::Less),
        RelationalOperator::LessEqual => {
            matches!(compare(lhs, rhs), Some(Ordering::Less | Ordering::Equal))
        }
        RelationalOperator::Greater => compare(lhs, rhs) == Some(Ordering::Greater),
        RelationalOperator::GreaterEqual => {
            matches!(compare(lhs, rhs), Some(Ordering::Greater | Ordering::Equal))
        }
        RelationalOperator::In => contains(rhs, lhs),
        RelationalOperator::NotIn => !contains(rhs, lhs),
        RelationalOperator::Ni => contains(lhs, rhs),
        RelationalOperator::NotNi => !contains(lhs, rhs),
    }
}

fn equals(lhs: &Data, rhs: &Data) -> bool {
    match (lhs, rhs) {
        (Data::Pattern(pattern), Data::String(value))
        | (Data::String(value), Data::Pattern(pattern)) => pattern.matches(value),
        (Data::List(lhs), Data::List(rhs)) => {
            lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| equals(l, r))
        }
        _ => match compare(lhs, rhs) {
            Some(ordering) => ordering == Ordering::Equal,
            None => lhs == rhs,
        },
    }
}

/// Semantic ordering between two literals, `None` when they are not comparable.
#[must_use]
pub fn compare(lhs: &Data, rhs: &Data) -> Option<Ordering> {
    match (lhs, rhs) {
        (Data::Int64(l), Data::Int64(r)) => Some(l.cmp(r)),
        (Data::UInt64(l), Data::UInt64(r)) => Some(l.cmp(r)),
        (Data::Int64(l), Data::UInt64(r)) => Some(compare_signed_unsigned(*l, *r)),
        (Data::UInt64(l), Data::Int64(r)) => Some(compare_signed_unsigned(*r, *l).reverse()),
        (Data::Double(l), Data::Double(r)) => l.partial_cmp(r),
        (Data::Double(l), Data::Int64(r)) => {
            compare_integer_real(i128::from(*r), *l).map(Ordering::reverse)
        }
        (Data::Double(l), Data::UInt64(r)) => {
            compare_integer_real(i128::from(*r), *l).map(Ordering::reverse)
        }
        (Data::Int64(l), Data::Double(r)) => compare_integer_real(i128::from(*l), *r),
        (Data::UInt64(l), Data::Double(r)) => compare_integer_real(i128::from(*l), *r),
        (Data::Duration(l), Data::Duration(r)) => Some(l.cmp(r)),
        (Data::Time(l), Data::Time(r)) => Some(l.cmp(r)),
        (Data::String(l), Data::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Exact ordering of a 64-bit integer against a real.
fn compare_integer_real(integer: i128, real: f64) -> Option<Ordering> {
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
    const MINUS_TWO_POW_63: f64 = -9_223_372_036_854_775_808.0;
    if real.is_nan() {
        return None;
    }
    if real >= TWO_POW_64 {
        return Some(Ordering::Less);
    }
    if real < MINUS_TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = real.trunc();
    // `whole` is integral and in range, so the cast is exact.
    match integer.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(real - whole)),
        unequal => Some(unequal),
    }
}

fn compare_signed_unsigned(signed: i64, unsigned: u64) -> Ordering {
    match u64::try_from(signed) {
        Ok(value) => value.cmp(&unsigned),
        Err(_) => Ordering::Less,
    }
}

fn contains(haystack: &Data, needle: &Data) -> bool {
    match haystack {
        Data::List(values) => values.iter().any(|value| equals(value, needle)),
        Data::String(haystack) => match needle {
            Data::String(needle) => haystack.contains(needle.as_str()),
            Data::Pattern(pattern) => pattern.search(haystack),
            _ => false,
        },
        _ => false,
    }
}
