//! Oracle dialect.
//!
//! Introspection reads the structured `ALL_*` catalog views, scoped to the
//! requested owner or to the connected user. Enumerated values are derived
//! from `CHECK ("COL" IN (...))` constraints.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

use crate::builder::{BindStyle, BindValues, Fragments, Limit, SqlValue, Statement};
use crate::connection::{Row, row_text};
use crate::error::{Error, Result};
use crate::schema::{
    CanonicalType, ColumnDescriptor, ConstraintDescriptor, DatabaseMeta, DefaultValue,
    ForeignKeyAction, IndexDescriptor, IndexKind, PRIMARY_INDEX, TableDescriptor, TableMeta,
};

use super::scan::{parse_native_type, scan_quoted_list};
use super::{Dialect, ObjectKind, RawTableInfo, TableInfoQueries, catalog_number};

const NAME: &str = "oracle";

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.\d|c\b)").expect("valid version pattern"));

static IN_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)^\s*"?([A-Za-z0-9_$#]+)"?\s+IN\s*\((.*)\)\s*$"#).expect("valid check pattern")
});

/// Oracle Database.
#[derive(Debug, Clone, Copy)]
pub struct OracleDialect {
    native_pagination: bool,
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OracleDialect {
    /// Creates the dialect; `native_pagination` selects
    /// `OFFSET .. FETCH` (12c and later) over ROWNUM wrapping.
    #[must_use]
    pub const fn new(native_pagination: bool) -> Self {
        Self { native_pagination }
    }

    /// Picks the pagination strategy from a server version string such as
    /// `Oracle Database 19c` or `11.2.0.4.0`. Unrecognized versions are
    /// treated as current.
    #[must_use]
    pub fn detect(version: &str) -> Self {
        let major = VERSION
            .captures(version)
            .and_then(|caps| caps[1].parse::<u32>().ok());
        Self::new(major.is_none_or(|m| m >= 12))
    }

    /// Whether `OFFSET .. FETCH` pagination is used.
    #[must_use]
    pub const fn native_pagination(&self) -> bool {
        self.native_pagination
    }

    fn quote(&self, name: &str) -> Result<String> {
        self.quote_identifier(name, false)
    }

    fn table(&self, name: &str) -> Result<String> {
        self.quote_identifier(name, true)
    }

    fn column_list(&self, columns: &[String]) -> Result<String> {
        let quoted: Vec<String> = columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Result<_>>()?;
        Ok(quoted.join(", "))
    }

    fn native_type(column: &ColumnDescriptor) -> String {
        match (column.max_length(), column.precision()) {
            (0, _) => column.raw_type().to_string(),
            (len, 0) => format!("{}({len})", column.raw_type()),
            (len, scale) => format!("{}({len},{scale})", column.raw_type()),
        }
    }

    fn comment_statements(&self, table: &TableDescriptor) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if let Some(comment) = &table.meta.comment {
            out.push(format!(
                "COMMENT ON TABLE {} IS {}",
                self.table(&table.name)?,
                self.quote_text(comment)
            ));
        }
        for column in table.columns.values() {
            if let Some(comment) = column.comment() {
                out.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    self.table(&table.name)?,
                    self.quote(column.name())?,
                    self.quote_text(comment)
                ));
            }
        }
        Ok(out)
    }

    fn parse_default(text: &str, canonical: CanonicalType) -> DefaultValue {
        let trimmed = text.trim();
        if let Some(inner) = trimmed
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return DefaultValue::String(inner.replace("''", "'"));
        }
        match DefaultValue::from_catalog(trimmed, canonical) {
            DefaultValue::String(_) => DefaultValue::Expression(trimmed.to_string()),
            parsed => parsed,
        }
    }
}

/// Named statement binding the owner (NULL for the connected user) and,
/// optionally, a table name.
fn owner_statement(sql: &str, schema: Option<&str>, table: Option<&str>) -> Statement {
    let mut binds = BindValues::new(BindStyle::Named);
    binds.push(
        "owner",
        schema.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
    );
    if let Some(table) = table {
        binds.push("table_name", SqlValue::Text(table.to_string()));
    }
    Statement::new(sql, binds)
}

fn required(row: &Row, table: &str, column: &str) -> Result<String> {
    row_text(row, column)
        .ok_or_else(|| Error::introspection(table, None, format!("catalog row without {column}")))
}

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn escape_like(&self, value: &str) -> String {
        self.escape_string(
            &value
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_"),
        )
    }

    fn like_suffix(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        format!("HEXTORAW('{hex}')")
    }

    fn canonical_type(&self, raw_type: &str) -> CanonicalType {
        match raw_type.to_ascii_lowercase().as_str() {
            "integer" | "int" | "smallint" | "pls_integer" | "binary_integer" => {
                CanonicalType::Int
            }
            "number" | "float" | "binary_float" | "binary_double" | "decimal" | "numeric"
            | "real" | "double precision" => CanonicalType::Float,
            "boolean" => CanonicalType::Bool,
            _ => CanonicalType::String,
        }
    }

    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String> {
        let name = self.quote(column.name())?;
        let mut sql = format!("{name} {}", Self::native_type(column));
        if column.is_autoincrement() {
            if !self.native_pagination {
                return Err(Error::unsupported(NAME, "identity columns before 12c"));
            }
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        } else if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_literal(default));
        }
        if !column.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if let Some(values) = column.enumerated_values() {
            let quoted: Vec<String> = values.iter().map(|v| self.quote_text(v)).collect();
            sql.push_str(&format!(" CHECK ({name} IN ({}))", quoted.join(",")));
        }
        Ok(sql)
    }

    fn create_table(&self, table: &TableDescriptor) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for column in table.columns.values() {
            lines.push(self.column_definition(column)?);
        }
        let pk: Vec<String> = table.primary_key().into_iter().map(String::from).collect();
        if !pk.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", self.column_list(&pk)?));
        }
        let body: Vec<String> = lines.iter().map(|l| format!("    {l}")).collect();
        let mut create = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.table(&table.name)?,
            body.join(",\n")
        );
        if let Some(tablespace) = &table.meta.engine {
            create.push_str(&format!(" TABLESPACE {}", self.quote(tablespace)?));
        }

        let mut statements = vec![create];
        for (name, index) in &table.indexes {
            if index.kind != IndexKind::Primary {
                statements.push(self.create_index(&table.name, name, index)?);
            }
        }
        statements.extend(self.comment_statements(table)?);
        Ok(statements)
    }

    fn rename_table(&self, from: &str, to: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table(from)?,
            self.quote(to)?
        ))
    }

    fn add_column(&self, table: &str, column: &ColumnDescriptor) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD ({})",
            self.table(table)?,
            self.column_definition(column)?
        ))
    }

    fn rename_column(&self, table: &str, from: &str, to: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.table(table)?,
            self.quote(from)?,
            self.quote(to)?
        ))
    }

    fn change_column(&self, table: &str, name: &str, column: &ColumnDescriptor) -> Result<String> {
        if name != column.name() {
            return Err(Error::unsupported(
                NAME,
                format!(
                    "renaming column {name} to {} while changing its definition",
                    column.name()
                ),
            ));
        }
        Ok(format!(
            "ALTER TABLE {} MODIFY ({})",
            self.table(table)?,
            self.column_definition(column)?
        ))
    }

    fn add_foreign_key(
        &self,
        table: &str,
        name: &str,
        fk: &ConstraintDescriptor,
    ) -> Result<String> {
        fk.validate(name)?;
        if !matches!(
            fk.on_update,
            ForeignKeyAction::NoAction | ForeignKeyAction::Restrict
        ) {
            return Err(Error::unsupported(NAME, "ON UPDATE actions"));
        }
        let on_delete = match fk.on_delete {
            ForeignKeyAction::NoAction | ForeignKeyAction::Restrict => "",
            ForeignKeyAction::Cascade => " ON DELETE CASCADE",
            ForeignKeyAction::SetNull => " ON DELETE SET NULL",
            ForeignKeyAction::SetDefault => {
                return Err(Error::unsupported(NAME, "ON DELETE SET DEFAULT"));
            }
        };
        let referenced = match &fk.referenced_schema {
            Some(schema) => format!("{schema}.{}", fk.referenced_table),
            None => fk.referenced_table.clone(),
        };
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){on_delete}",
            self.table(table)?,
            self.quote(name)?,
            self.column_list(&fk.columns)?,
            self.table(&referenced)?,
            self.column_list(&fk.referenced_columns)?
        ))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table(table)?,
            self.quote(name)?
        ))
    }

    fn create_index(&self, table: &str, name: &str, index: &IndexDescriptor) -> Result<String> {
        let kind = match index.kind {
            IndexKind::Primary => {
                return Ok(format!(
                    "ALTER TABLE {} ADD PRIMARY KEY ({})",
                    self.table(table)?,
                    self.column_list(&index.columns)?
                ));
            }
            IndexKind::Unique => "UNIQUE ",
            IndexKind::Bitmap => "BITMAP ",
            IndexKind::Index => "",
            IndexKind::Fulltext | IndexKind::Spatial => {
                return Err(Error::unsupported(NAME, format!("{:?} index", index.kind)));
            }
        };
        Ok(format!(
            "CREATE {kind}INDEX {} ON {} ({})",
            self.quote(name)?,
            self.table(table)?,
            self.column_list(&index.columns)?
        ))
    }

    fn drop_index(&self, table: &str, name: &str, index: &IndexDescriptor) -> Result<String> {
        if index.kind == IndexKind::Primary {
            return Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", self.table(table)?));
        }
        Ok(format!("DROP INDEX {}", self.quote(name)?))
    }

    fn alter_table_meta(&self, table: &str, meta: &TableMeta) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if let Some(tablespace) = &meta.engine {
            out.push(format!(
                "ALTER TABLE {} MOVE TABLESPACE {}",
                self.table(table)?,
                self.quote(tablespace)?
            ));
        }
        out.push(format!(
            "COMMENT ON TABLE {} IS {}",
            self.table(table)?,
            self.quote_text(meta.comment.as_deref().unwrap_or_default())
        ));
        Ok(out)
    }

    fn alter_database_meta(&self, _meta: &DatabaseMeta) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn drop_object(&self, kind: ObjectKind, name: &str) -> Result<String> {
        if kind == ObjectKind::Event {
            return Err(Error::unsupported(NAME, "events"));
        }
        Ok(format!("DROP {kind} {}", self.table(name)?))
    }

    fn database_meta(&self, _schema: Option<&str>) -> Statement {
        Statement::raw(
            "SELECT PARAMETER, VALUE FROM NLS_DATABASE_PARAMETERS \
             WHERE PARAMETER IN ('NLS_CHARACTERSET', 'NLS_SORT')",
        )
    }

    fn normalize_database_meta(&self, rows: &[Row]) -> DatabaseMeta {
        let mut meta = DatabaseMeta {
            driver: NAME.to_string(),
            ..DatabaseMeta::default()
        };
        for row in rows {
            match row_text(row, "PARAMETER").as_deref() {
                Some("NLS_CHARACTERSET") => meta.charset = row_text(row, "VALUE"),
                Some("NLS_SORT") => meta.collation = row_text(row, "VALUE"),
                _ => {}
            }
        }
        meta
    }

    fn table_list(&self, schema: Option<&str>) -> Result<Statement> {
        Ok(owner_statement(
            "SELECT TABLE_NAME FROM ALL_TABLES WHERE OWNER = NVL(:owner, USER) ORDER BY TABLE_NAME",
            schema,
            None,
        ))
    }

    fn table_info(&self, schema: Option<&str>, table: &str) -> Result<TableInfoQueries> {
        Ok(TableInfoQueries {
            meta: owner_statement(
                "SELECT t.TABLESPACE_NAME, c.COMMENTS FROM ALL_TABLES t \
                 LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = t.OWNER AND c.TABLE_NAME = t.TABLE_NAME \
                 WHERE t.OWNER = NVL(:owner, USER) AND t.TABLE_NAME = :table_name",
                schema,
                Some(table),
            ),
            keys: Some(owner_statement(
                "SELECT i.INDEX_NAME, i.INDEX_TYPE, i.UNIQUENESS, ic.COLUMN_NAME, c.CONSTRAINT_TYPE \
                 FROM ALL_INDEXES i \
                 JOIN ALL_IND_COLUMNS ic ON ic.INDEX_OWNER = i.OWNER AND ic.INDEX_NAME = i.INDEX_NAME \
                 LEFT JOIN ALL_CONSTRAINTS c ON c.OWNER = i.TABLE_OWNER AND c.INDEX_NAME = i.INDEX_NAME \
                 AND c.CONSTRAINT_TYPE = 'P' \
                 WHERE i.TABLE_OWNER = NVL(:owner, USER) AND i.TABLE_NAME = :table_name \
                 ORDER BY i.INDEX_NAME, ic.COLUMN_POSITION",
                schema,
                Some(table),
            )),
            constraints: Some(owner_statement(
                "SELECT c.CONSTRAINT_NAME, c.CONSTRAINT_TYPE, c.DELETE_RULE, c.SEARCH_CONDITION, \
                 cc.COLUMN_NAME, CASE WHEN r.OWNER = c.OWNER THEN NULL ELSE r.OWNER END AS R_OWNER, \
                 r.TABLE_NAME AS R_TABLE_NAME, rc.COLUMN_NAME AS R_COLUMN_NAME \
                 FROM ALL_CONSTRAINTS c \
                 JOIN ALL_CONS_COLUMNS cc ON cc.OWNER = c.OWNER AND cc.CONSTRAINT_NAME = c.CONSTRAINT_NAME \
                 LEFT JOIN ALL_CONSTRAINTS r ON r.OWNER = c.R_OWNER AND r.CONSTRAINT_NAME = c.R_CONSTRAINT_NAME \
                 LEFT JOIN ALL_CONS_COLUMNS rc ON rc.OWNER = r.OWNER \
                 AND rc.CONSTRAINT_NAME = r.CONSTRAINT_NAME AND rc.POSITION = cc.POSITION \
                 WHERE c.OWNER = NVL(:owner, USER) AND c.TABLE_NAME = :table_name \
                 AND c.CONSTRAINT_TYPE IN ('R', 'C') \
                 ORDER BY c.CONSTRAINT_NAME, cc.POSITION",
                schema,
                Some(table),
            )),
            triggers: Some(owner_statement(
                "SELECT TRIGGER_NAME, DESCRIPTION, TRIGGER_BODY FROM ALL_TRIGGERS \
                 WHERE TABLE_OWNER = NVL(:owner, USER) AND TABLE_NAME = :table_name \
                 ORDER BY TRIGGER_NAME",
                schema,
                Some(table),
            )),
        })
    }

    fn columns_info(&self, schema: Option<&str>, table: &str) -> Result<Statement> {
        let identity = if self.native_pagination {
            ", c.IDENTITY_COLUMN"
        } else {
            ""
        };
        Ok(owner_statement(
            &format!(
                "SELECT c.COLUMN_NAME, c.DATA_TYPE, c.DATA_LENGTH, c.CHAR_LENGTH, \
                 c.DATA_PRECISION, c.DATA_SCALE, c.NULLABLE, c.DATA_DEFAULT, cc.COMMENTS{identity} \
                 FROM ALL_TAB_COLUMNS c \
                 LEFT JOIN ALL_COL_COMMENTS cc ON cc.OWNER = c.OWNER \
                 AND cc.TABLE_NAME = c.TABLE_NAME AND cc.COLUMN_NAME = c.COLUMN_NAME \
                 WHERE c.OWNER = NVL(:owner, USER) AND c.TABLE_NAME = :table_name \
                 ORDER BY c.COLUMN_ID"
            ),
            schema,
            Some(table),
        ))
    }

    fn normalize_columns_info(
        &self,
        table: &str,
        rows: &[Row],
    ) -> Result<IndexMap<String, ColumnDescriptor>> {
        let mut columns = IndexMap::with_capacity(rows.len());
        for row in rows {
            let name = required(row, table, "COLUMN_NAME")?;
            let column = name.as_str();
            let data_type = required(row, table, "DATA_TYPE")?;
            let ty = parse_native_type(&data_type).ok_or_else(|| {
                Error::introspection(table, Some(column), format!("unparsable type '{data_type}'"))
            })?;
            let base = ty.base.to_ascii_uppercase();
            let precision: Option<u64> =
                catalog_number(table, column, "DATA_PRECISION", row_text(row, "DATA_PRECISION"))?;
            let scale: Option<u32> =
                catalog_number(table, column, "DATA_SCALE", row_text(row, "DATA_SCALE"))?;
            let char_length: Option<u64> =
                catalog_number(table, column, "CHAR_LENGTH", row_text(row, "CHAR_LENGTH"))?;
            let data_length: Option<u64> =
                catalog_number(table, column, "DATA_LENGTH", row_text(row, "DATA_LENGTH"))?;

            let (max_length, decimals) = match base.as_str() {
                "NUMBER" => (precision.unwrap_or(0), scale.unwrap_or(0)),
                "FLOAT" => (precision.unwrap_or(0), 0),
                "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" => (
                    char_length.filter(|l| *l > 0).or(data_length).unwrap_or(0),
                    0,
                ),
                "RAW" => (data_length.unwrap_or(0), 0),
                _ => ty.length_and_precision().unwrap_or((0, 0)),
            };
            let canonical = if base == "NUMBER" && precision.is_some() && scale == Some(0) {
                CanonicalType::Int
            } else {
                self.canonical_type(&base)
            };

            let mut descriptor = ColumnDescriptor::new(column, base, canonical)
                .with_nullable(row_text(row, "NULLABLE").is_none_or(|n| n == "Y"))
                .with_max_length(max_length)
                .with_precision(decimals);
            if row_text(row, "IDENTITY_COLUMN").is_some_and(|v| v == "YES") {
                descriptor = descriptor.autoincrement();
            } else if let Some(default) =
                row_text(row, "DATA_DEFAULT").filter(|d| !d.trim().is_empty())
            {
                descriptor = descriptor.with_default(Self::parse_default(&default, canonical));
            }
            if let Some(comment) = row_text(row, "COMMENTS").filter(|c| !c.is_empty()) {
                descriptor = descriptor.with_comment(comment);
            }
            columns.insert(name, descriptor);
        }
        Ok(columns)
    }

    fn normalize_table_info(
        &self,
        table: &str,
        raw: &RawTableInfo,
        mut columns: IndexMap<String, ColumnDescriptor>,
    ) -> Result<TableDescriptor> {
        let meta = raw
            .meta
            .first()
            .map(|row| TableMeta {
                engine: row_text(row, "TABLESPACE_NAME"),
                comment: row_text(row, "COMMENTS").filter(|c| !c.is_empty()),
                ..TableMeta::default()
            })
            .unwrap_or_default();

        let mut indexes: IndexMap<String, IndexDescriptor> = IndexMap::new();
        for row in &raw.keys {
            let index_type = required(row, table, "INDEX_TYPE")?;
            let index_name = required(row, table, "INDEX_NAME")?;
            if index_type.starts_with("FUNCTION-BASED") {
                warn!(table, index = %index_name, "Skipping function-based index");
                continue;
            }
            let column = required(row, table, "COLUMN_NAME")?;
            if !columns.contains_key(&column) {
                return Err(Error::introspection(
                    table,
                    Some(column.as_str()),
                    format!("index {index_name} on unknown column"),
                ));
            }
            let (key, kind) = if row_text(row, "CONSTRAINT_TYPE").as_deref() == Some("P") {
                (PRIMARY_INDEX.to_string(), IndexKind::Primary)
            } else if index_type.contains("BITMAP") {
                (index_name, IndexKind::Bitmap)
            } else if row_text(row, "UNIQUENESS").as_deref() == Some("UNIQUE") {
                (index_name, IndexKind::Unique)
            } else {
                (index_name, IndexKind::Index)
            };
            indexes
                .entry(key)
                .or_insert_with(|| IndexDescriptor::new(kind, Vec::new()))
                .columns
                .push(column);
        }
        if let Some(pk) = indexes.get(PRIMARY_INDEX) {
            for name in &pk.columns {
                if let Some(column) = columns.get_mut(name) {
                    *column = column.clone().primary_key();
                }
            }
        }

        let mut foreign: IndexMap<String, ConstraintDescriptor> = IndexMap::new();
        for row in &raw.constraints {
            let name = required(row, table, "CONSTRAINT_NAME")?;
            match row_text(row, "CONSTRAINT_TYPE").as_deref() {
                Some("R") => {
                    let entry = foreign.entry(name).or_insert_with(|| ConstraintDescriptor {
                        columns: Vec::new(),
                        referenced_schema: row_text(row, "R_OWNER"),
                        referenced_table: row_text(row, "R_TABLE_NAME").unwrap_or_default(),
                        referenced_columns: Vec::new(),
                        on_update: ForeignKeyAction::NoAction,
                        on_delete: ForeignKeyAction::parse(
                            &row_text(row, "DELETE_RULE").unwrap_or_default(),
                        ),
                    });
                    entry.columns.push(required(row, table, "COLUMN_NAME")?);
                    if let Some(referenced) = row_text(row, "R_COLUMN_NAME") {
                        entry.referenced_columns.push(referenced);
                    }
                }
                Some("C") => {
                    let Some(condition) = row_text(row, "SEARCH_CONDITION") else {
                        continue;
                    };
                    let Some(caps) = IN_CHECK.captures(&condition) else {
                        continue;
                    };
                    let target = caps[1].to_string();
                    let values = scan_quoted_list(&caps[2])
                        .map_err(|message| Error::introspection(table, Some(target.as_str()), message))?;
                    if let Some(column) = columns.get_mut(&target) {
                        *column = column.clone().with_enumerated_values(values);
                    }
                }
                _ => {}
            }
        }
        let mut constraints = IndexMap::with_capacity(foreign.len());
        for (name, fk) in foreign {
            fk.validate(&format!("{table}.{name}"))?;
            constraints.insert(name, fk);
        }

        let mut triggers = IndexMap::new();
        for row in &raw.triggers {
            let name = required(row, table, "TRIGGER_NAME")?;
            let description = required(row, table, "DESCRIPTION")?;
            let body = required(row, table, "TRIGGER_BODY")?;
            triggers.insert(
                name,
                format!("CREATE OR REPLACE TRIGGER {}\n{body}", description.trim_end()),
            );
        }

        Ok(TableDescriptor {
            name: table.to_string(),
            meta,
            columns,
            indexes,
            constraints,
            triggers,
        })
    }

    fn object_list(&self, kind: ObjectKind, schema: Option<&str>) -> Option<Statement> {
        let sql = match kind {
            ObjectKind::View => {
                "SELECT VIEW_NAME AS NAME, TEXT AS DEFINITION FROM ALL_VIEWS \
                 WHERE OWNER = NVL(:owner, USER) ORDER BY VIEW_NAME"
            }
            ObjectKind::Procedure => {
                "SELECT NAME, TEXT AS DEFINITION FROM ALL_SOURCE \
                 WHERE OWNER = NVL(:owner, USER) AND TYPE = 'PROCEDURE' ORDER BY NAME, LINE"
            }
            ObjectKind::Event | ObjectKind::Trigger => return None,
        };
        Some(owner_statement(sql, schema, None))
    }

    fn normalize_object_list(
        &self,
        kind: ObjectKind,
        rows: &[Row],
    ) -> Result<IndexMap<String, Option<String>>> {
        let mut sources: IndexMap<String, String> = IndexMap::new();
        for row in rows {
            let name = required(row, "objects", "NAME")?;
            let text = row_text(row, "DEFINITION").unwrap_or_default();
            sources.entry(name).or_default().push_str(&text);
        }
        sources
            .into_iter()
            .map(|(name, text)| {
                let definition = match kind {
                    ObjectKind::View => {
                        format!("CREATE OR REPLACE VIEW {} AS {}", self.table(&name)?, text.trim())
                    }
                    _ => format!("CREATE OR REPLACE {}", text.trim()),
                };
                Ok((name, Some(definition)))
            })
            .collect()
    }

    fn paginate(&self, sql: String, limit: Limit) -> String {
        if self.native_pagination {
            return match limit.offset {
                Some(offset) => format!(
                    "{sql} OFFSET {offset} ROWS FETCH NEXT {} ROWS ONLY",
                    limit.limit
                ),
                None => format!("{sql} FETCH FIRST {} ROWS ONLY", limit.limit),
            };
        }
        let offset = limit.offset.unwrap_or(0);
        let upper = limit.limit.saturating_add(offset);
        let inner = format!("SELECT a.*, ROWNUM rnum FROM ({sql}) a WHERE ROWNUM <= {upper}");
        if offset > 0 {
            format!("SELECT * FROM ({inner}) WHERE rnum > {offset}")
        } else {
            inner
        }
    }

    fn assemble_insert(&self, f: &Fragments) -> Result<String> {
        if f.rows.len() <= 1 {
            let values = f.rows.first().map(|r| r.join(", ")).unwrap_or_default();
            return Ok(format!(
                "INSERT INTO {} ({}) VALUES ({values})",
                f.table,
                f.columns.join(", ")
            ));
        }
        let columns = f.columns.join(", ");
        let mut sql = String::from("INSERT ALL");
        for row in &f.rows {
            sql.push_str(&format!(
                " INTO {} ({columns}) VALUES ({})",
                f.table,
                row.join(", ")
            ));
        }
        sql.push_str(" SELECT 1 FROM DUAL");
        Ok(sql)
    }

    fn assemble_update(&self, f: &Fragments) -> Result<String> {
        if !f.order_by.is_empty() || f.limit.is_some() {
            return Err(Error::unsupported(NAME, "UPDATE with ORDER BY or LIMIT"));
        }
        let mut sql = format!("UPDATE {} SET {}", f.table, f.assignments.join(", "));
        if let Some(condition) = &f.where_sql {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        Ok(sql)
    }

    fn assemble_delete(&self, f: &Fragments) -> Result<String> {
        if !f.order_by.is_empty() || f.limit.is_some() {
            return Err(Error::unsupported(NAME, "DELETE with ORDER BY or LIMIT"));
        }
        let mut sql = format!("DELETE FROM {}", f.table);
        if let Some(condition) = &f.where_sql {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Option<&str>)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    (*k).to_string(),
                    v.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
                )
            })
            .collect()
    }

    #[test]
    fn version_detection() {
        assert!(!OracleDialect::detect("Oracle Database 11g Release 11.2.0.4.0").native_pagination());
        assert!(OracleDialect::detect("Oracle Database 19c Enterprise Edition").native_pagination());
        assert!(OracleDialect::detect("12.1.0.2.0").native_pagination());
        assert!(OracleDialect::detect("unknown").native_pagination());
    }

    #[test]
    fn pagination_strategies() {
        let limit = Limit {
            limit: 10,
            offset: Some(20),
        };
        assert_eq!(
            OracleDialect::new(true).paginate("SELECT * FROM t".into(), limit),
            "SELECT * FROM t OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            OracleDialect::new(false).paginate("SELECT * FROM t".into(), limit),
            "SELECT * FROM (SELECT a.*, ROWNUM rnum FROM (SELECT * FROM t) a WHERE ROWNUM <= 30) \
             WHERE rnum > 20"
        );
        let first = Limit {
            limit: 5,
            offset: None,
        };
        assert_eq!(
            OracleDialect::new(false).paginate("SELECT * FROM t".into(), first),
            "SELECT a.*, ROWNUM rnum FROM (SELECT * FROM t) a WHERE ROWNUM <= 5"
        );
    }

    #[test]
    fn change_column_cannot_rename() {
        let d = OracleDialect::new(true);
        let col = ColumnDescriptor::new("NEW_NAME", "VARCHAR2", CanonicalType::String)
            .with_max_length(10);
        assert!(matches!(
            d.change_column("T", "OLD_NAME", &col),
            Err(Error::UnsupportedOperation { .. })
        ));
        let col = col.with_name("OLD_NAME");
        assert_eq!(
            d.change_column("T", "OLD_NAME", &col).unwrap(),
            "ALTER TABLE \"T\" MODIFY (\"OLD_NAME\" VARCHAR2(10))"
        );
        assert_eq!(
            d.rename_column("T", "A", "B").unwrap(),
            "ALTER TABLE \"T\" RENAME COLUMN \"A\" TO \"B\""
        );
    }

    #[test]
    fn normalizes_catalog_rows() {
        let d = OracleDialect::new(true);
        let columns = d
            .normalize_columns_info(
                "ORDERS",
                &[
                    row(&[
                        ("COLUMN_NAME", Some("ID")),
                        ("DATA_TYPE", Some("NUMBER")),
                        ("DATA_LENGTH", Some("22")),
                        ("CHAR_LENGTH", Some("0")),
                        ("DATA_PRECISION", Some("10")),
                        ("DATA_SCALE", Some("0")),
                        ("NULLABLE", Some("N")),
                        ("DATA_DEFAULT", None),
                        ("COMMENTS", None),
                        ("IDENTITY_COLUMN", Some("YES")),
                    ]),
                    row(&[
                        ("COLUMN_NAME", Some("STATE")),
                        ("DATA_TYPE", Some("VARCHAR2")),
                        ("DATA_LENGTH", Some("20")),
                        ("CHAR_LENGTH", Some("20")),
                        ("DATA_PRECISION", None),
                        ("DATA_SCALE", None),
                        ("NULLABLE", Some("Y")),
                        ("DATA_DEFAULT", Some("'new' ")),
                        ("COMMENTS", Some("order state")),
                        ("IDENTITY_COLUMN", Some("NO")),
                    ]),
                    row(&[
                        ("COLUMN_NAME", Some("CREATED")),
                        ("DATA_TYPE", Some("DATE")),
                        ("DATA_LENGTH", Some("7")),
                        ("CHAR_LENGTH", Some("0")),
                        ("DATA_PRECISION", None),
                        ("DATA_SCALE", None),
                        ("NULLABLE", Some("Y")),
                        ("DATA_DEFAULT", Some("SYSDATE")),
                        ("COMMENTS", None),
                        ("IDENTITY_COLUMN", Some("NO")),
                    ]),
                ],
            )
            .unwrap();
        assert_eq!(columns["ID"].canonical_type(), CanonicalType::Int);
        assert!(columns["ID"].is_autoincrement());
        assert_eq!(columns["STATE"].max_length(), 20);
        assert_eq!(
            columns["STATE"].default_value(),
            Some(&DefaultValue::String("new".into()))
        );
        assert_eq!(
            columns["CREATED"].default_value(),
            Some(&DefaultValue::Expression("SYSDATE".into()))
        );

        let raw = RawTableInfo {
            meta: vec![row(&[("TABLESPACE_NAME", Some("USERS")), ("COMMENTS", None)])],
            keys: vec![
                row(&[
                    ("INDEX_NAME", Some("SYS_C001")),
                    ("INDEX_TYPE", Some("NORMAL")),
                    ("UNIQUENESS", Some("UNIQUE")),
                    ("COLUMN_NAME", Some("ID")),
                    ("CONSTRAINT_TYPE", Some("P")),
                ]),
                row(&[
                    ("INDEX_NAME", Some("IDX_STATE")),
                    ("INDEX_TYPE", Some("BITMAP")),
                    ("UNIQUENESS", Some("NONUNIQUE")),
                    ("COLUMN_NAME", Some("STATE")),
                    ("CONSTRAINT_TYPE", None),
                ]),
            ],
            constraints: vec![
                row(&[
                    ("CONSTRAINT_NAME", Some("CK_STATE")),
                    ("CONSTRAINT_TYPE", Some("C")),
                    ("DELETE_RULE", None),
                    ("SEARCH_CONDITION", Some("\"STATE\" IN ('new','it''s, done')")),
                    ("COLUMN_NAME", Some("STATE")),
                ]),
                row(&[
                    ("CONSTRAINT_NAME", Some("FK_CUSTOMER")),
                    ("CONSTRAINT_TYPE", Some("R")),
                    ("DELETE_RULE", Some("CASCADE")),
                    ("SEARCH_CONDITION", None),
                    ("COLUMN_NAME", Some("ID")),
                    ("R_OWNER", None),
                    ("R_TABLE_NAME", Some("CUSTOMERS")),
                    ("R_COLUMN_NAME", Some("ID")),
                ]),
            ],
            triggers: Vec::new(),
        };
        let table = d.normalize_table_info("ORDERS", &raw, columns).unwrap();
        assert_eq!(table.meta.engine.as_deref(), Some("USERS"));
        assert_eq!(table.indexes[PRIMARY_INDEX].kind, IndexKind::Primary);
        assert!(table.columns["ID"].is_primary_key());
        assert_eq!(table.indexes["IDX_STATE"].kind, IndexKind::Bitmap);
        assert_eq!(
            table.columns["STATE"].enumerated_values(),
            Some(&["new".to_string(), "it's, done".to_string()][..])
        );
        let fk = &table.constraints["FK_CUSTOMER"];
        assert_eq!(fk.referenced_table, "CUSTOMERS");
        assert_eq!(fk.on_delete, ForeignKeyAction::Cascade);
        assert_eq!(fk.referenced_schema, None);
    }

    #[test]
    fn multi_row_insert_uses_insert_all() {
        let d = OracleDialect::new(true);
        let f = Fragments {
            table: "\"T\"".into(),
            columns: vec!["\"A\"".into()],
            rows: vec![vec![":a".into()], vec![":a_2".into()]],
            ..Fragments::default()
        };
        assert_eq!(
            d.assemble_insert(&f).unwrap(),
            "INSERT ALL INTO \"T\" (\"A\") VALUES (:a) INTO \"T\" (\"A\") VALUES (:a_2) SELECT 1 FROM DUAL"
        );
    }

    #[test]
    fn enumerated_column_gets_check() {
        let d = OracleDialect::new(true);
        let col = ColumnDescriptor::new("STATE", "VARCHAR2", CanonicalType::String)
            .with_max_length(20)
            .not_null()
            .with_enumerated_values(vec!["on".into(), "off".into()]);
        assert_eq!(
            d.column_definition(&col).unwrap(),
            "\"STATE\" VARCHAR2(20) NOT NULL CHECK (\"STATE\" IN ('on','off'))"
        );
    }
}
