//! SQL dialect strategies.
//!
//! A [`Dialect`] owns everything that differs between engines: identifier
//! quoting, value escaping, type mapping, DDL syntax, introspection queries,
//! normalization of catalog rows into the canonical model, pagination and
//! final statement assembly. The builder and the synchronizer only ever talk
//! to `dyn Dialect`.

mod mysql;
mod oracle;
mod registry;
mod scan;

use std::fmt;

use indexmap::IndexMap;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use registry::{DialectFactory, DialectRegistry};
pub use scan::{NativeType, parse_native_type, scan_quoted_list};

use crate::builder::{BindStyle, BindValues, Fragments, Limit, SqlValue, Statement};
use crate::connection::Row;
use crate::error::{Error, Result};
use crate::schema::{
    CanonicalType, ColumnDescriptor, ConstraintDescriptor, DatabaseMeta, DefaultValue,
    IndexDescriptor, TableDescriptor, TableMeta,
};

/// What a quoted value is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotePurpose {
    /// A complete string literal, `'value'`.
    Literal,
    /// Escaped like a literal but without the surrounding quotes.
    UnquotedLiteral,
    /// Escaped for LIKE (wildcards too), without quotes.
    Like,
    /// A LIKE pattern matching anywhere, `'%value%'`.
    LikeQuoted,
    /// A LIKE pattern matching a prefix, `'value%'`.
    LikeLeftAnchored,
    /// A LIKE pattern matching a suffix, `'%value'`.
    LikeRightAnchored,
}

/// Schema objects stored as raw definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Views.
    View,
    /// Stored procedures.
    Procedure,
    /// Scheduled events.
    Event,
    /// Table triggers.
    Trigger,
}

impl ObjectKind {
    /// SQL keyword for the object type.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Procedure => "PROCEDURE",
            Self::Event => "EVENT",
            Self::Trigger => "TRIGGER",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Queries describing one table, beyond its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfoQueries {
    /// Table options (and, for MySQL, the full DDL).
    pub meta: Statement,
    /// Index rows, for dialects with a structured index catalog.
    pub keys: Option<Statement>,
    /// Constraint rows, for dialects with a structured constraint catalog.
    pub constraints: Option<Statement>,
    /// Trigger rows.
    pub triggers: Option<Statement>,
}

/// Rows returned by the [`TableInfoQueries`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableInfo {
    /// Rows of the meta query.
    pub meta: Vec<Row>,
    /// Rows of the keys query.
    pub keys: Vec<Row>,
    /// Rows of the constraints query.
    pub constraints: Vec<Row>,
    /// Rows of the triggers query.
    pub triggers: Vec<Row>,
}

/// Engine-specific SQL generation and catalog normalization.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Engine name, as reported by connections and used for registration.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quote_char(&self) -> char;

    /// Quotes a possibly qualified identifier.
    ///
    /// The name is split on `.`; each part loses any quoting it already had
    /// and is wrapped again, doubling embedded quote characters. A bare `*`
    /// stays unquoted. Table names take at most two parts (`schema.table`),
    /// column names at most three.
    fn quote_identifier(&self, name: &str, is_table: bool) -> Result<String> {
        let q = self.quote_char();
        let parts = split_identifier(name, q);
        let max_parts = if is_table { 2 } else { 3 };
        if parts.len() > max_parts {
            return Err(Error::InvalidIdentifier {
                identifier: name.to_string(),
                reason: "too many qualifying parts",
            });
        }
        let mut quoted = Vec::with_capacity(parts.len());
        for part in parts {
            let bare = strip_quotes(part.trim(), q);
            if bare.trim().is_empty() {
                return Err(Error::InvalidIdentifier {
                    identifier: name.to_string(),
                    reason: "empty identifier part",
                });
            }
            if bare == "*" {
                quoted.push(bare);
                continue;
            }
            let doubled: String = [q, q].iter().collect();
            quoted.push(format!("{q}{}{q}", bare.replace(q, &doubled)));
        }
        Ok(quoted.join("."))
    }

    /// Removes identifier quoting, undoubling escaped quote characters.
    fn unquote_identifier(&self, quoted: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(quoted.len());
        let mut chars = quoted.chars().peekable();
        let mut inside = false;
        while let Some(c) = chars.next() {
            if c != q {
                out.push(c);
            } else if inside && chars.peek() == Some(&q) {
                out.push(q);
                chars.next();
            } else {
                inside = !inside;
            }
        }
        out
    }

    /// Escapes text for use inside a string literal.
    fn escape_string(&self, value: &str) -> String;

    /// Escapes text for use inside a LIKE pattern literal.
    fn escape_like(&self, value: &str) -> String;

    /// Appended after quoted LIKE patterns, e.g. an `ESCAPE` clause.
    fn like_suffix(&self) -> &'static str {
        ""
    }

    /// Renders binary data as a literal.
    fn blob_literal(&self, bytes: &[u8]) -> String;

    /// Renders a value as SQL text for the given purpose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for NaN and infinite floats,
    /// which have no SQL literal.
    fn quote_value(&self, value: &SqlValue, purpose: QuotePurpose) -> Result<String> {
        if let SqlValue::Float(f) = value {
            if !f.is_finite() {
                return Err(Error::unsupported(self.name(), format!("float literal {f}")));
            }
        }
        if purpose == QuotePurpose::Literal {
            match value {
                SqlValue::Null => return Ok(String::from("NULL")),
                SqlValue::Bool(b) => return Ok(String::from(if *b { "1" } else { "0" })),
                SqlValue::Int(n) => return Ok(n.to_string()),
                SqlValue::Float(f) => return Ok(f.to_string()),
                SqlValue::Blob(b) => return Ok(self.blob_literal(b)),
                SqlValue::Text(_) => {}
            }
        }
        let text = value.to_text().unwrap_or_default();
        Ok(match purpose {
            QuotePurpose::Literal => format!("'{}'", self.escape_string(&text)),
            QuotePurpose::UnquotedLiteral => self.escape_string(&text),
            QuotePurpose::Like => self.escape_like(&text),
            QuotePurpose::LikeQuoted => {
                format!("'%{}%'{}", self.escape_like(&text), self.like_suffix())
            }
            QuotePurpose::LikeLeftAnchored => {
                format!("'{}%'{}", self.escape_like(&text), self.like_suffix())
            }
            QuotePurpose::LikeRightAnchored => {
                format!("'%{}'{}", self.escape_like(&text), self.like_suffix())
            }
        })
    }

    /// Quotes each value of a list.
    ///
    /// # Errors
    ///
    /// Fails on the first value [`quote_value`](Self::quote_value) rejects.
    fn quote_values(&self, values: &[SqlValue], purpose: QuotePurpose) -> Result<Vec<String>> {
        values.iter().map(|v| self.quote_value(v, purpose)).collect()
    }

    /// Quotes a string as a literal.
    fn quote_text(&self, value: &str) -> String {
        format!("'{}'", self.escape_string(value))
    }

    /// Maps a native type name onto a canonical type.
    fn canonical_type(&self, raw_type: &str) -> CanonicalType;

    /// Renders a column default.
    fn default_literal(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Null => String::from("NULL"),
            DefaultValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
            DefaultValue::Integer(n) => n.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::String(s) => self.quote_text(s),
            DefaultValue::Expression(e) => e.clone(),
        }
    }

    /// Renders a column definition for CREATE/ALTER TABLE.
    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String>;

    // DDL

    /// CREATE TABLE, plus any statements the table needs right after
    /// creation. Foreign keys and triggers are not included.
    fn create_table(&self, table: &TableDescriptor) -> Result<Vec<String>>;

    /// Renames a table.
    fn rename_table(&self, from: &str, to: &str) -> Result<String>;

    /// Drops a table.
    fn drop_table(&self, table: &str) -> Result<String> {
        Ok(format!("DROP TABLE {}", self.quote_identifier(table, true)?))
    }

    /// Removes all rows of a table.
    fn truncate_table(&self, table: &str) -> Result<String> {
        Ok(format!("TRUNCATE TABLE {}", self.quote_identifier(table, true)?))
    }

    /// Adds a column.
    fn add_column(&self, table: &str, column: &ColumnDescriptor) -> Result<String>;

    /// Renames a column without changing its definition.
    fn rename_column(&self, table: &str, from: &str, to: &str) -> Result<String>;

    /// Redefines the column currently called `name`.
    fn change_column(&self, table: &str, name: &str, column: &ColumnDescriptor) -> Result<String>;

    /// Drops a column.
    fn drop_column(&self, table: &str, column: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table, true)?,
            self.quote_identifier(column, false)?
        ))
    }

    /// Adds a foreign key.
    fn add_foreign_key(
        &self,
        table: &str,
        name: &str,
        fk: &ConstraintDescriptor,
    ) -> Result<String>;

    /// Drops a foreign key.
    fn drop_foreign_key(&self, table: &str, name: &str) -> Result<String>;

    /// Creates an index (or the primary key).
    fn create_index(&self, table: &str, name: &str, index: &IndexDescriptor) -> Result<String>;

    /// Drops an index (or the primary key).
    fn drop_index(&self, table: &str, name: &str, index: &IndexDescriptor) -> Result<String>;

    /// Statements moving a table's options to `meta`.
    fn alter_table_meta(&self, table: &str, meta: &TableMeta) -> Result<Vec<String>>;

    /// Statements moving the database defaults to `meta`.
    fn alter_database_meta(&self, meta: &DatabaseMeta) -> Result<Vec<String>>;

    /// Drops a view, procedure, event or trigger.
    fn drop_object(&self, kind: ObjectKind, name: &str) -> Result<String>;

    /// Statement recreating an object from its stored definition.
    fn create_object(&self, _kind: ObjectKind, _name: &str, definition: &str) -> Result<String> {
        Ok(definition.to_string())
    }

    // Introspection

    /// Query for the database defaults.
    fn database_meta(&self, schema: Option<&str>) -> Statement;

    /// Reads the database defaults; the driver is filled in by the caller.
    fn normalize_database_meta(&self, rows: &[Row]) -> DatabaseMeta;

    /// Query listing base tables.
    fn table_list(&self, schema: Option<&str>) -> Result<Statement>;

    /// Reads table names from the [`table_list`](Self::table_list) rows.
    fn normalize_table_list(&self, rows: &[Row]) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.values().next().and_then(SqlValue::to_text))
            .collect()
    }

    /// Queries describing a table.
    fn table_info(&self, schema: Option<&str>, table: &str) -> Result<TableInfoQueries>;

    /// Query describing a table's columns.
    fn columns_info(&self, schema: Option<&str>, table: &str) -> Result<Statement>;

    /// Normalizes column rows, in declaration order.
    fn normalize_columns_info(
        &self,
        table: &str,
        rows: &[Row],
    ) -> Result<IndexMap<String, ColumnDescriptor>>;

    /// Assembles a table from its info rows and normalized columns.
    fn normalize_table_info(
        &self,
        table: &str,
        raw: &RawTableInfo,
        columns: IndexMap<String, ColumnDescriptor>,
    ) -> Result<TableDescriptor>;

    /// Query listing objects of a kind; `None` if the engine has none.
    fn object_list(&self, kind: ObjectKind, schema: Option<&str>) -> Option<Statement>;

    /// Reads object names and, when the list query carries them,
    /// definitions.
    fn normalize_object_list(
        &self,
        kind: ObjectKind,
        rows: &[Row],
    ) -> Result<IndexMap<String, Option<String>>>;

    /// Query for one object's definition, when the list does not carry it.
    fn object_definition(
        &self,
        _kind: ObjectKind,
        _schema: Option<&str>,
        _name: &str,
    ) -> Result<Option<Statement>> {
        Ok(None)
    }

    /// Reads a definition from the [`object_definition`](Self::object_definition)
    /// rows.
    fn normalize_object(&self, kind: ObjectKind, name: &str, rows: &[Row]) -> Result<String> {
        rows.first()
            .and_then(|row| row.values().next())
            .and_then(SqlValue::to_text)
            .ok_or_else(|| Error::introspection(name, None, format!("no {kind} definition")))
    }

    // Assembly

    /// Applies pagination to a SELECT.
    fn paginate(&self, sql: String, limit: Limit) -> String {
        match limit.offset {
            Some(offset) => format!("{sql} LIMIT {} OFFSET {offset}", limit.limit),
            None => format!("{sql} LIMIT {}", limit.limit),
        }
    }

    /// Assembles a SELECT.
    fn assemble_select(&self, f: &Fragments) -> Result<String> {
        let mut sql = format!("SELECT {} FROM {}", f.columns.join(", "), f.table);
        for join in &f.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        push_condition(&mut sql, " WHERE ", f.where_sql.as_deref());
        push_list(&mut sql, " GROUP BY ", &f.group_by);
        push_condition(&mut sql, " HAVING ", f.having.as_deref());
        push_list(&mut sql, " ORDER BY ", &f.order_by);
        Ok(match f.limit {
            Some(limit) => self.paginate(sql, limit),
            None => sql,
        })
    }

    /// Assembles an INSERT of one or more rows.
    fn assemble_insert(&self, f: &Fragments) -> Result<String> {
        let rows: Vec<String> = f
            .rows
            .iter()
            .map(|r| format!("({})", r.join(", ")))
            .collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES {}",
            f.table,
            f.columns.join(", "),
            rows.join(", ")
        ))
    }

    /// Assembles an UPDATE.
    fn assemble_update(&self, f: &Fragments) -> Result<String> {
        let mut sql = format!("UPDATE {} SET {}", f.table, f.assignments.join(", "));
        push_condition(&mut sql, " WHERE ", f.where_sql.as_deref());
        push_list(&mut sql, " ORDER BY ", &f.order_by);
        if let Some(limit) = f.limit {
            sql.push_str(&format!(" LIMIT {}", limit.limit));
        }
        Ok(sql)
    }

    /// Assembles a DELETE.
    fn assemble_delete(&self, f: &Fragments) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", f.table);
        push_condition(&mut sql, " WHERE ", f.where_sql.as_deref());
        push_list(&mut sql, " ORDER BY ", &f.order_by);
        if let Some(limit) = f.limit {
            sql.push_str(&format!(" LIMIT {}", limit.limit));
        }
        Ok(sql)
    }
}

fn push_condition(sql: &mut String, keyword: &str, condition: Option<&str>) {
    if let Some(condition) = condition {
        sql.push_str(keyword);
        sql.push_str(condition);
    }
}

fn push_list(sql: &mut String, keyword: &str, items: &[String]) {
    if !items.is_empty() {
        sql.push_str(keyword);
        sql.push_str(&items.join(", "));
    }
}

/// Splits on `.` outside quoted sections.
fn split_identifier(name: &str, q: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut inside = false;
    let mut start = 0;
    for (i, c) in name.char_indices() {
        if c == q {
            inside = !inside;
        } else if c == '.' && !inside {
            parts.push(&name[start..i]);
            start = i + 1;
        }
    }
    parts.push(&name[start..]);
    parts
}

/// Removes one level of quoting from an identifier part.
fn strip_quotes(part: &str, q: char) -> String {
    let doubled: String = [q, q].iter().collect();
    let single = q.to_string();
    match part
        .strip_prefix(q)
        .and_then(|inner| inner.strip_suffix(q))
    {
        Some(inner) => inner.replace(&doubled, &single),
        None => part.replace(q, ""),
    }
}

/// Positional statement binding an optional schema name once per `?`.
fn schema_statement(sql: String, schema: Option<&str>, extra: &[&str]) -> Statement {
    let mut binds = BindValues::new(BindStyle::Positional);
    binds.push("schema", schema.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())));
    for value in extra {
        binds.push("value", SqlValue::Text((*value).to_string()));
    }
    Statement::new(sql, binds)
}

/// Qualifies a table with its schema, if any.
fn qualified(schema: Option<&str>, table: &str) -> String {
    schema.map_or_else(|| table.to_string(), |s| format!("{s}.{table}"))
}

/// Parses a catalog number, reporting the offending column on failure.
fn catalog_number<T: std::str::FromStr>(
    table: &str,
    column: &str,
    field: &str,
    raw: Option<String>,
) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => text.trim().parse().map(Some).map_err(|_| {
            Error::introspection(table, Some(column), format!("{field} is not a number: {text}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_round_trips() {
        let dialects: [&dyn Dialect; 2] = [&MySqlDialect::new(), &OracleDialect::new(true)];
        for dialect in dialects {
            for name in ["users", "my table", "a.b", "db.t.col", "x-y"] {
                let quoted = dialect.quote_identifier(name, false).unwrap();
                assert_eq!(dialect.unquote_identifier(&quoted), name);
            }
        }
    }

    #[test]
    fn quoting_strips_existing_quotes_and_escapes() {
        let mysql = MySqlDialect::new();
        assert_eq!(mysql.quote_identifier("`db`.users", true).unwrap(), "`db`.`users`");
        assert_eq!(mysql.quote_identifier("`a``b`", false).unwrap(), "`a``b`");
        assert_eq!(mysql.quote_identifier("u.*", false).unwrap(), "`u`.*");
        let oracle = OracleDialect::new(true);
        assert_eq!(oracle.quote_identifier("HR.EMP", true).unwrap(), "\"HR\".\"EMP\"");
    }

    #[test]
    fn quoting_rejects_empty_parts() {
        let mysql = MySqlDialect::new();
        for bad in ["", "  ", "a..b", "a. "] {
            assert!(matches!(
                mysql.quote_identifier(bad, false),
                Err(Error::InvalidIdentifier { .. })
            ));
        }
        assert!(matches!(
            mysql.quote_identifier("a.b.c", true),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn like_purposes() {
        let mysql = MySqlDialect::new();
        let v = SqlValue::Text("50%_off".into());
        assert_eq!(mysql.quote_value(&v, QuotePurpose::Like).unwrap(), "50\\%\\_off");
        assert_eq!(mysql.quote_value(&v, QuotePurpose::LikeQuoted).unwrap(), "'%50\\%\\_off%'");
        assert_eq!(mysql.quote_value(&v, QuotePurpose::LikeLeftAnchored).unwrap(), "'50\\%\\_off%'");
        assert_eq!(mysql.quote_value(&v, QuotePurpose::LikeRightAnchored).unwrap(), "'%50\\%\\_off'");

        let oracle = OracleDialect::new(true);
        assert_eq!(
            oracle.quote_value(&SqlValue::Text("it's".into()), QuotePurpose::LikeQuoted).unwrap(),
            "'%it''s%' ESCAPE '\\'"
        );
    }

    #[test]
    fn array_values_quote_element_wise() {
        let mysql = MySqlDialect::new();
        let values = [SqlValue::Int(1), SqlValue::Null, SqlValue::Text("a'b".into())];
        assert_eq!(
            mysql.quote_values(&values, QuotePurpose::Literal).unwrap(),
            vec!["1", "NULL", "'a\\'b'"]
        );
    }

    #[test]
    fn non_finite_floats_have_no_literal() {
        let mysql = MySqlDialect::new();
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                mysql.quote_value(&SqlValue::Float(f), QuotePurpose::Literal),
                Err(Error::UnsupportedOperation { .. })
            ));
        }
        assert_eq!(
            mysql.quote_value(&SqlValue::Float(1.5), QuotePurpose::Literal).unwrap(),
            "1.5"
        );
    }

    #[test]
    fn catalog_number_reports_column() {
        let err = catalog_number::<u64>("t", "c", "length", Some("abc".into())).unwrap_err();
        assert!(matches!(
            err,
            Error::IntrospectionFailure { column: Some(ref c), .. } if c == "c"
        ));
        assert_eq!(catalog_number::<u64>("t", "c", "length", None).unwrap(), None);
    }
}
