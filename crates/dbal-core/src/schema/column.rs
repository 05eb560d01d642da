//! Column descriptors.

use serde::{Deserialize, Serialize};

/// Canonical value type a native column type maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    /// Integral numbers, bit fields.
    Int,
    /// Decimal and floating point numbers.
    Float,
    /// Booleans.
    Bool,
    /// Everything else.
    #[default]
    String,
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP"), emitted unquoted.
    Expression(String),
}

impl DefaultValue {
    /// Interprets a raw catalog default according to the column's type.
    ///
    /// Values that do not parse as the canonical type are kept as strings.
    #[must_use]
    pub fn from_catalog(raw: &str, canonical: CanonicalType) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Self::Null;
        }
        match canonical {
            CanonicalType::Int => trimmed
                .parse()
                .map_or_else(|_| Self::String(raw.to_string()), Self::Integer),
            CanonicalType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map_or_else(|| Self::String(raw.to_string()), Self::Float),
            CanonicalType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "b'1'" => Self::Bool(true),
                "0" | "false" | "b'0'" => Self::Bool(false),
                _ => Self::String(raw.to_string()),
            },
            CanonicalType::String => Self::String(raw.to_string()),
        }
    }
}

/// Canonical description of one table column.
///
/// Fields are read through accessors; descriptors are assembled with the
/// `with_*` methods or by a dialect's normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    name: String,
    raw_type: String,
    canonical_type: CanonicalType,
    nullable: bool,
    primary_key: bool,
    autoincrement: bool,
    unsigned: bool,
    default: Option<DefaultValue>,
    max_length: u64,
    precision: u32,
    enumerated_values: Option<Vec<String>>,
    comment: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        raw_type: impl Into<String>,
        canonical_type: CanonicalType,
    ) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            canonical_type,
            nullable: true,
            primary_key: false,
            autoincrement: false,
            unsigned: false,
            default: None,
            max_length: 0,
            precision: 0,
            enumerated_values: None,
            comment: None,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native type name as reported by the engine, without length.
    #[must_use]
    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    /// Canonical value type.
    #[must_use]
    pub const fn canonical_type(&self) -> CanonicalType {
        self.canonical_type
    }

    /// Whether NULL is accepted.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column is part of the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the engine generates values for the column.
    #[must_use]
    pub const fn is_autoincrement(&self) -> bool {
        self.autoincrement
    }

    /// Whether the numeric type is unsigned.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    /// Declared default, `None` when the column has none.
    #[must_use]
    pub const fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Maximum length; 0 means unbounded or not applicable.
    #[must_use]
    pub const fn max_length(&self) -> u64 {
        self.max_length
    }

    /// Decimal scale; 0 when not applicable.
    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    /// Allowed values of an enum/set column.
    #[must_use]
    pub fn enumerated_values(&self) -> Option<&[String]> {
        self.enumerated_values.as_deref()
    }

    /// Column comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Renames the column.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets nullability.
    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks the column as (part of) the primary key; implies NOT NULL.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Marks the numeric type unsigned.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn with_max_length(mut self, max_length: u64) -> Self {
        self.max_length = max_length;
        self
    }

    /// Sets the decimal scale.
    #[must_use]
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Sets the allowed enum/set values.
    #[must_use]
    pub fn with_enumerated_values(mut self, values: Vec<String>) -> Self {
        self.enumerated_values = Some(values);
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Renders the full native type, e.g. `varchar(50)` or
    /// `enum('a','b')`, for DDL generation.
    ///
    /// `quote` renders one enumerated value as a literal.
    #[must_use]
    pub fn full_type(&self, quote: impl Fn(&str) -> String) -> String {
        if let Some(values) = &self.enumerated_values {
            let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
            return format!("{}({})", self.raw_type, items.join(","));
        }
        match (self.max_length, self.precision) {
            (0, 0) => self.raw_type.clone(),
            (len, 0) => format!("{}({len})", self.raw_type),
            (len, scale) => format!("{}({len},{scale})", self.raw_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_flags() {
        let col = ColumnDescriptor::new("id", "int", CanonicalType::Int)
            .primary_key()
            .autoincrement()
            .unsigned();
        assert!(col.is_primary_key());
        assert!(!col.is_nullable());
        assert!(col.is_autoincrement());
        assert!(col.is_unsigned());
        assert_eq!(col.max_length(), 0);
    }

    #[test]
    fn full_type_renders_length_and_scale() {
        let quote = |v: &str| format!("'{v}'");
        let name = ColumnDescriptor::new("name", "varchar", CanonicalType::String).with_max_length(50);
        assert_eq!(name.full_type(quote), "varchar(50)");

        let price = ColumnDescriptor::new("price", "decimal", CanonicalType::Float)
            .with_max_length(10)
            .with_precision(2);
        assert_eq!(price.full_type(quote), "decimal(10,2)");

        let state = ColumnDescriptor::new("state", "enum", CanonicalType::String)
            .with_enumerated_values(vec!["on".into(), "off".into()]);
        assert_eq!(state.full_type(quote), "enum('on','off')");
    }

    #[test]
    fn catalog_defaults_follow_canonical_type() {
        assert_eq!(
            DefaultValue::from_catalog("42", CanonicalType::Int),
            DefaultValue::Integer(42)
        );
        assert_eq!(
            DefaultValue::from_catalog("1.5", CanonicalType::Float),
            DefaultValue::Float(1.5)
        );
        assert_eq!(
            DefaultValue::from_catalog("NaN", CanonicalType::Float),
            DefaultValue::String("NaN".into())
        );
        assert_eq!(
            DefaultValue::from_catalog("NULL", CanonicalType::String),
            DefaultValue::Null
        );
        assert_eq!(
            DefaultValue::from_catalog("abc", CanonicalType::Int),
            DefaultValue::String("abc".into())
        );
    }
}
