//! SQL values and bind parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A SQL value that travels as a bind parameter or a fetched cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrows the text payload, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as an integer, parsing text when needed.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Renders the value as plain text; `None` for NULL.
    ///
    /// Blobs are decoded lossily, which is what catalog queries returning
    /// binary-collated strings need.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_int_value {
    ($($t:ty),+) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_int_value!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

/// Placeholder style used when a statement is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindStyle {
    /// `?` placeholders; binds are an ordered list.
    #[default]
    Positional,
    /// `:name` placeholders; binds are keyed by name.
    Named,
}

/// Bind values accumulated while building a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindValues {
    /// Ordered values for `?` placeholders.
    Positional(Vec<SqlValue>),
    /// Values keyed by placeholder name (without the leading colon).
    Named(IndexMap<String, SqlValue>),
}

impl BindValues {
    /// Creates an empty list in the given style.
    #[must_use]
    pub fn new(style: BindStyle) -> Self {
        match style {
            BindStyle::Positional => Self::Positional(Vec::new()),
            BindStyle::Named => Self::Named(IndexMap::new()),
        }
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(v) => v.len(),
            Self::Named(m) => m.len(),
        }
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds a value and returns the placeholder text to splice into SQL.
    ///
    /// `hint` names the value for named placeholders; clashes get a numeric
    /// suffix so every placeholder stays unique.
    pub fn push(&mut self, hint: &str, value: SqlValue) -> String {
        match self {
            Self::Positional(v) => {
                v.push(value);
                String::from("?")
            }
            Self::Named(m) => {
                let base = placeholder_base(hint);
                let mut name = base.clone();
                let mut n = 1;
                while m.contains_key(&name) {
                    n += 1;
                    name = format!("{base}_{n}");
                }
                m.insert(name.clone(), value);
                format!(":{name}")
            }
        }
    }

    /// Appends all values from `other`, renaming named keys on collision.
    ///
    /// Returns the placeholder renames that were applied as `(old, new)`
    /// pairs so the caller can rewrite spliced SQL.
    pub fn extend(&mut self, other: Self) -> Vec<(String, String)> {
        let mut renames = Vec::new();
        if let (Self::Positional(ours), Self::Positional(theirs)) = (&mut *self, &other) {
            ours.extend(theirs.iter().cloned());
            return renames;
        }
        let named = matches!(self, Self::Named(_));
        for (key, value) in other.into_pairs() {
            let placeholder = self.push(&key, value);
            let new_key = placeholder.trim_start_matches(':');
            if named && new_key != key {
                renames.push((key, new_key.to_string()));
            }
        }
        renames
    }

    /// Flattens into `(name, value)` pairs; positional values are named by
    /// their 1-based position.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, SqlValue)> {
        match self {
            Self::Positional(v) => v
                .into_iter()
                .enumerate()
                .map(|(i, value)| ((i + 1).to_string(), value))
                .collect(),
            Self::Named(m) => m.into_iter().collect(),
        }
    }

    /// Values in bind order, ignoring names.
    #[must_use]
    pub fn values(&self) -> Vec<&SqlValue> {
        match self {
            Self::Positional(v) => v.iter().collect(),
            Self::Named(m) => m.values().collect(),
        }
    }
}

impl Default for BindValues {
    fn default() -> Self {
        Self::new(BindStyle::Positional)
    }
}

fn placeholder_base(hint: &str) -> String {
    let last = hint.rsplit('.').next().unwrap_or(hint);
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("p{cleaned}")
    } else {
        cleaned
    }
}
