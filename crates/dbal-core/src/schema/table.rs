//! Table descriptors: columns, indexes, foreign keys, triggers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::column::ColumnDescriptor;

/// Engine-specific table options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMeta {
    /// Storage engine (MySQL) or tablespace (Oracle).
    pub engine: Option<String>,
    /// Default character set.
    pub charset: Option<String>,
    /// Default collation.
    pub collation: Option<String>,
    /// Next auto-increment value.
    pub auto_increment: Option<u64>,
    /// Table comment.
    pub comment: Option<String>,
}

impl TableMeta {
    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Kind of index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// The table's primary key.
    Primary,
    /// Unique index.
    Unique,
    /// Plain index.
    Index,
    /// Full-text index.
    Fulltext,
    /// Spatial index.
    Spatial,
    /// Bitmap index (Oracle).
    Bitmap,
}

impl IndexKind {
    /// Whether the kind enforces uniqueness.
    #[must_use]
    pub const fn is_unique(self) -> bool {
        matches!(self, Self::Primary | Self::Unique)
    }
}

/// Canonical description of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Indexed columns in key order.
    pub columns: Vec<String>,
    /// Index kind.
    pub kind: IndexKind,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Access method such as `BTREE` or `HASH`, when declared.
    pub method: Option<String>,
}

impl IndexDescriptor {
    /// Creates an index over the given columns.
    #[must_use]
    pub fn new(kind: IndexKind, columns: Vec<String>) -> Self {
        Self {
            columns,
            kind,
            unique: kind.is_unique(),
            method: None,
        }
    }

    /// Sets the access method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to the column default.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL keyword(s).
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    /// Parses a catalog rule such as `SET NULL`; unknown text maps to
    /// `NoAction`.
    #[must_use]
    pub fn parse(rule: &str) -> Self {
        let normalized = rule.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "RESTRICT" => Self::Restrict,
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            _ => Self::NoAction,
        }
    }
}

/// Canonical description of a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Schema of the referenced table, when qualified.
    pub referenced_schema: Option<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns, paired positionally with `columns`.
    pub referenced_columns: Vec<String>,
    /// ON UPDATE action.
    pub on_update: ForeignKeyAction,
    /// ON DELETE action.
    pub on_delete: ForeignKeyAction,
}

impl ConstraintDescriptor {
    /// Creates a foreign key, checking that both column lists pair up.
    pub fn new(
        name: &str,
        columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Result<Self> {
        let fk = Self {
            columns,
            referenced_schema: None,
            referenced_table: referenced_table.into(),
            referenced_columns,
            on_update: ForeignKeyAction::NoAction,
            on_delete: ForeignKeyAction::NoAction,
        };
        fk.validate(name)?;
        Ok(fk)
    }

    /// Checks the column-count invariant.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.columns.is_empty() || self.columns.len() != self.referenced_columns.len() {
            return Err(Error::InvalidDescriptor {
                name: name.to_string(),
                message: format!(
                    "foreign key has {} column(s) but references {}",
                    self.columns.len(),
                    self.referenced_columns.len()
                ),
            });
        }
        Ok(())
    }

    /// Sets the referenced schema.
    #[must_use]
    pub fn with_referenced_schema(mut self, schema: impl Into<String>) -> Self {
        self.referenced_schema = Some(schema.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }
}

/// Canonical description of a table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Engine-specific options.
    pub meta: TableMeta,
    /// Columns in declaration order.
    pub columns: IndexMap<String, ColumnDescriptor>,
    /// Indexes keyed by name; the primary key is stored as `PRIMARY`.
    pub indexes: IndexMap<String, IndexDescriptor>,
    /// Foreign keys keyed by constraint name.
    pub constraints: IndexMap<String, ConstraintDescriptor>,
    /// Trigger definitions keyed by trigger name.
    pub triggers: IndexMap<String, String>,
}

/// Index name under which primary keys are stored.
pub const PRIMARY_INDEX: &str = "PRIMARY";

impl TableDescriptor {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a column, keeping declaration order.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.insert(column.name().to_string(), column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, index: IndexDescriptor) -> Self {
        self.indexes.insert(name.into(), index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn constraint(mut self, name: impl Into<String>, fk: ConstraintDescriptor) -> Self {
        self.constraints.insert(name.into(), fk);
        self
    }

    /// Adds a trigger definition.
    #[must_use]
    pub fn trigger(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.triggers.insert(name.into(), definition.into());
        self
    }

    /// Sets the table options.
    #[must_use]
    pub fn with_meta(mut self, meta: TableMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Primary key columns, from the `PRIMARY` index if present, otherwise
    /// from column flags.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&str> {
        if let Some(pk) = self.indexes.get(PRIMARY_INDEX) {
            return pk.columns.iter().map(String::as_str).collect();
        }
        self.columns
            .values()
            .filter(|c| c.is_primary_key())
            .map(ColumnDescriptor::name)
            .collect()
    }

    /// Checks every foreign key's column-count invariant.
    pub fn validate(&self) -> Result<()> {
        for (name, fk) in &self.constraints {
            fk.validate(&format!("{}.{name}", self.name))?;
        }
        Ok(())
    }
}
