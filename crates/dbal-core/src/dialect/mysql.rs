//! MySQL dialect.
//!
//! Columns come from `SHOW FULL COLUMNS`. Indexes, foreign keys and table
//! options are scraped from `SHOW CREATE TABLE` with line-anchored regexes:
//! only lines that start with a key keyword are considered, so column
//! comments cannot produce phantom keys, but a key line the patterns do not
//! recognize is skipped with a warning.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::builder::Statement;
use crate::connection::{Row, row_text, row_value};
use crate::error::{Error, Result};
use crate::schema::{
    CanonicalType, ColumnDescriptor, ConstraintDescriptor, DatabaseMeta, DefaultValue,
    ForeignKeyAction, IndexDescriptor, IndexKind, PRIMARY_INDEX, TableDescriptor, TableMeta,
};

use super::scan::{parse_native_type, scan_quoted_list};
use super::{
    Dialect, ObjectKind, RawTableInfo, TableInfoQueries, catalog_number, qualified,
    schema_statement,
};

const NAME: &str = "mysql";

static PRIMARY_KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PRIMARY KEY \((.+)\)").expect("valid primary key pattern"));

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(UNIQUE|FULLTEXT|SPATIAL) )?(?:KEY|INDEX) `((?:[^`]|``)+)` \((.+)\)(?: USING (\w+))?")
        .expect("valid key pattern")
});

static FOREIGN_KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^CONSTRAINT `((?:[^`]|``)+)` FOREIGN KEY \(([^)]+)\) REFERENCES (?:`((?:[^`]|``)+)`\.)?`((?:[^`]|``)+)` \(([^)]+)\)(.*)$",
    )
    .expect("valid foreign key pattern")
});

static FK_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ON (DELETE|UPDATE) (RESTRICT|CASCADE|SET NULL|NO ACTION|SET DEFAULT)")
        .expect("valid action pattern")
});

static QUOTED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`((?:[^`]|``)+)`").expect("valid name pattern"));

static TABLE_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(ENGINE|AUTO_INCREMENT|CHARSET|COLLATE)=(\w+)|COMMENT='((?:[^'\\]|\\.|'')*)'",
    )
    .expect("valid table option pattern")
});

type ScrapedTable = (
    TableMeta,
    IndexMap<String, IndexDescriptor>,
    IndexMap<String, ConstraintDescriptor>,
);

/// MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates the dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
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

    fn table_options(&self, meta: &TableMeta) -> Vec<String> {
        let mut options = Vec::new();
        if let Some(engine) = &meta.engine {
            options.push(format!("ENGINE={engine}"));
        }
        if let Some(charset) = &meta.charset {
            options.push(format!("DEFAULT CHARSET={charset}"));
        }
        if let Some(collation) = &meta.collation {
            options.push(format!("COLLATE={collation}"));
        }
        if let Some(comment) = &meta.comment {
            options.push(format!("COMMENT={}", self.quote_text(comment)));
        }
        options
    }

    fn inline_index(&self, name: &str, index: &IndexDescriptor) -> Result<String> {
        let prefix = match index.kind {
            IndexKind::Unique => "UNIQUE KEY",
            IndexKind::Index => "KEY",
            IndexKind::Fulltext => "FULLTEXT KEY",
            IndexKind::Spatial => "SPATIAL KEY",
            IndexKind::Primary => {
                return Ok(format!("PRIMARY KEY ({})", self.column_list(&index.columns)?));
            }
            IndexKind::Bitmap => return Err(Error::unsupported(NAME, "bitmap index")),
        };
        let mut sql = format!(
            "{prefix} {} ({})",
            self.quote(name)?,
            self.column_list(&index.columns)?
        );
        if let Some(method) = &index.method {
            sql.push_str(&format!(" USING {method}"));
        }
        Ok(sql)
    }

    fn parse_create_table(
        &self,
        table: &str,
        ddl: &str,
        columns: &mut IndexMap<String, ColumnDescriptor>,
    ) -> Result<ScrapedTable> {
        let mut meta = TableMeta::default();
        let mut indexes = IndexMap::new();
        let mut constraints = IndexMap::new();

        for line in ddl.lines().skip(1) {
            let line = line.trim().trim_end_matches(',');
            if let Some(caps) = PRIMARY_KEY_LINE.captures(line) {
                let cols = quoted_names(&caps[1]);
                for name in &cols {
                    let column = columns.get_mut(name).ok_or_else(|| {
                        Error::introspection(table, Some(name.as_str()), "primary key on unknown column")
                    })?;
                    if !column.is_primary_key() {
                        *column = column.clone().primary_key();
                    }
                }
                indexes.insert(
                    PRIMARY_INDEX.to_string(),
                    IndexDescriptor::new(IndexKind::Primary, cols),
                );
            } else if let Some(caps) = KEY_LINE.captures(line) {
                let kind = match caps.get(1).map(|m| m.as_str()) {
                    Some("UNIQUE") => IndexKind::Unique,
                    Some("FULLTEXT") => IndexKind::Fulltext,
                    Some("SPATIAL") => IndexKind::Spatial,
                    _ => IndexKind::Index,
                };
                let name = unescape_name(&caps[2]);
                let cols = quoted_names(&caps[3]);
                if let Some(missing) = cols.iter().find(|c| !columns.contains_key(*c)) {
                    return Err(Error::introspection(
                        table,
                        Some(missing.as_str()),
                        format!("index {name} on unknown column"),
                    ));
                }
                let mut index = IndexDescriptor::new(kind, cols);
                if let Some(method) = caps.get(4) {
                    index = index.with_method(method.as_str());
                }
                indexes.insert(name, index);
            } else if let Some(caps) = FOREIGN_KEY_LINE.captures(line) {
                let name = unescape_name(&caps[1]);
                let mut fk = ConstraintDescriptor::new(
                    &format!("{table}.{name}"),
                    quoted_names(&caps[2]),
                    unescape_name(&caps[4]),
                    quoted_names(&caps[5]),
                )?;
                if let Some(schema) = caps.get(3) {
                    fk = fk.with_referenced_schema(unescape_name(schema.as_str()));
                }
                for action in FK_ACTION.captures_iter(&caps[6]) {
                    let parsed = ForeignKeyAction::parse(&action[2]);
                    fk = if &action[1] == "DELETE" {
                        fk.on_delete(parsed)
                    } else {
                        fk.on_update(parsed)
                    };
                }
                constraints.insert(name, fk);
            } else if line.starts_with(')') {
                meta = parse_table_options(table, line)?;
            } else if line.starts_with("CONSTRAINT") {
                debug!(table, line, "Skipping non foreign key constraint");
            } else if is_key_line(line) {
                warn!(table, line, "Unrecognized key definition in SHOW CREATE TABLE");
            }
        }
        Ok((meta, indexes, constraints))
    }
}

fn is_key_line(line: &str) -> bool {
    ["PRIMARY ", "UNIQUE ", "FULLTEXT ", "SPATIAL ", "KEY ", "INDEX "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn unescape_name(name: &str) -> String {
    name.replace("``", "`")
}

/// Backquoted names in order; prefix lengths such as `(10)` are dropped.
fn quoted_names(list: &str) -> Vec<String> {
    QUOTED_NAME
        .captures_iter(list)
        .map(|caps| unescape_name(&caps[1]))
        .collect()
}

fn parse_table_options(table: &str, line: &str) -> Result<TableMeta> {
    let mut meta = TableMeta::default();
    for caps in TABLE_OPTION.captures_iter(line) {
        if let Some(comment) = caps.get(3) {
            meta.comment = Some(unescape_literal(comment.as_str()));
            continue;
        }
        let value = caps[2].to_string();
        match &caps[1] {
            "ENGINE" => meta.engine = Some(value),
            "CHARSET" => meta.charset = Some(value),
            "COLLATE" => meta.collation = Some(value),
            _ => {
                meta.auto_increment =
                    catalog_number(table, "AUTO_INCREMENT", "AUTO_INCREMENT", Some(value))?;
            }
        }
    }
    Ok(meta)
}

fn unescape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('Z') => out.push('\x1a'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            c => out.push(c),
        }
    }
    out
}

fn fk_actions(fk: &ConstraintDescriptor) -> String {
    let mut sql = String::new();
    if fk.on_delete != ForeignKeyAction::NoAction {
        sql.push_str(" ON DELETE ");
        sql.push_str(fk.on_delete.as_sql());
    }
    if fk.on_update != ForeignKeyAction::NoAction {
        sql.push_str(" ON UPDATE ");
        sql.push_str(fk.on_update.as_sql());
    }
    sql
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn escape_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\x1a' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out
    }

    fn escape_like(&self, value: &str) -> String {
        self.escape_string(value)
            .replace('%', "\\%")
            .replace('_', "\\_")
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        format!("X'{hex}'")
    }

    fn canonical_type(&self, raw_type: &str) -> CanonicalType {
        match raw_type.to_ascii_lowercase().as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bit"
            | "year" => CanonicalType::Int,
            "decimal" | "numeric" | "float" | "double" | "double precision" | "real" => {
                CanonicalType::Float
            }
            "bool" | "boolean" => CanonicalType::Bool,
            _ => CanonicalType::String,
        }
    }

    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote(column.name())?,
            column.full_type(|v| self.quote_text(v))
        );
        if column.is_unsigned() {
            sql.push_str(" unsigned");
        }
        sql.push_str(if column.is_nullable() { " NULL" } else { " NOT NULL" });
        if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_literal(default));
        }
        if column.is_autoincrement() {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(comment) = column.comment() {
            sql.push_str(" COMMENT ");
            sql.push_str(&self.quote_text(comment));
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
        for (name, index) in &table.indexes {
            if index.kind != IndexKind::Primary {
                lines.push(self.inline_index(name, index)?);
            }
        }
        let body: Vec<String> = lines.iter().map(|l| format!("    {l}")).collect();
        let mut sql = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.table(&table.name)?,
            body.join(",\n")
        );
        for option in self.table_options(&table.meta) {
            sql.push(' ');
            sql.push_str(&option);
        }
        Ok(vec![sql])
    }

    fn rename_table(&self, from: &str, to: &str) -> Result<String> {
        Ok(format!("RENAME TABLE {} TO {}", self.table(from)?, self.table(to)?))
    }

    fn add_column(&self, table: &str, column: &ColumnDescriptor) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table(table)?,
            self.column_definition(column)?
        ))
    }

    fn rename_column(&self, _table: &str, from: &str, to: &str) -> Result<String> {
        Err(Error::unsupported(
            NAME,
            format!("renaming column {from} to {to} without a definition; use change_column"),
        ))
    }

    fn change_column(&self, table: &str, name: &str, column: &ColumnDescriptor) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} CHANGE COLUMN {} {}",
            self.table(table)?,
            self.quote(name)?,
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
        let referenced = match &fk.referenced_schema {
            Some(schema) => format!("{schema}.{}", fk.referenced_table),
            None => fk.referenced_table.clone(),
        };
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}",
            self.table(table)?,
            self.quote(name)?,
            self.column_list(&fk.columns)?,
            self.table(&referenced)?,
            self.column_list(&fk.referenced_columns)?,
            fk_actions(fk)
        ))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
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
            IndexKind::Fulltext => "FULLTEXT ",
            IndexKind::Spatial => "SPATIAL ",
            IndexKind::Index => "",
            IndexKind::Bitmap => return Err(Error::unsupported(NAME, "bitmap index")),
        };
        let mut sql = format!(
            "CREATE {kind}INDEX {} ON {} ({})",
            self.quote(name)?,
            self.table(table)?,
            self.column_list(&index.columns)?
        );
        if let Some(method) = &index.method {
            sql.push_str(&format!(" USING {method}"));
        }
        Ok(sql)
    }

    fn drop_index(&self, table: &str, name: &str, index: &IndexDescriptor) -> Result<String> {
        if index.kind == IndexKind::Primary {
            return Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", self.table(table)?));
        }
        Ok(format!("DROP INDEX {} ON {}", self.quote(name)?, self.table(table)?))
    }

    fn alter_table_meta(&self, table: &str, meta: &TableMeta) -> Result<Vec<String>> {
        let options = self.table_options(meta);
        if options.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "ALTER TABLE {} {}",
            self.table(table)?,
            options.join(" ")
        )])
    }

    fn alter_database_meta(&self, meta: &DatabaseMeta) -> Result<Vec<String>> {
        let mut parts = Vec::new();
        if let Some(charset) = &meta.charset {
            parts.push(format!("CHARACTER SET {charset}"));
        }
        if let Some(collation) = &meta.collation {
            parts.push(format!("COLLATE {collation}"));
        }
        if parts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![format!("ALTER DATABASE {}", parts.join(" "))])
    }

    fn drop_object(&self, kind: ObjectKind, name: &str) -> Result<String> {
        Ok(format!("DROP {kind} IF EXISTS {}", self.table(name)?))
    }

    fn database_meta(&self, schema: Option<&str>) -> Statement {
        schema_statement(
            String::from(
                "SELECT DEFAULT_CHARACTER_SET_NAME, DEFAULT_COLLATION_NAME \
                 FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = COALESCE(?, DATABASE())",
            ),
            schema,
            &[],
        )
    }

    fn normalize_database_meta(&self, rows: &[Row]) -> DatabaseMeta {
        let row = rows.first();
        DatabaseMeta {
            driver: NAME.to_string(),
            charset: row.and_then(|r| row_text(r, "DEFAULT_CHARACTER_SET_NAME")),
            collation: row.and_then(|r| row_text(r, "DEFAULT_COLLATION_NAME")),
        }
    }

    fn table_list(&self, schema: Option<&str>) -> Result<Statement> {
        Ok(schema_statement(
            String::from(
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY TABLE_NAME",
            ),
            schema,
            &[],
        ))
    }

    fn table_info(&self, schema: Option<&str>, table: &str) -> Result<TableInfoQueries> {
        Ok(TableInfoQueries {
            meta: Statement::raw(format!(
                "SHOW CREATE TABLE {}",
                self.table(&qualified(schema, table))?
            )),
            keys: None,
            constraints: None,
            triggers: Some(schema_statement(
                String::from(
                    "SELECT TRIGGER_NAME, ACTION_TIMING, EVENT_MANIPULATION, ACTION_STATEMENT \
                     FROM information_schema.TRIGGERS \
                     WHERE EVENT_OBJECT_SCHEMA = COALESCE(?, DATABASE()) AND EVENT_OBJECT_TABLE = ? \
                     ORDER BY TRIGGER_NAME",
                ),
                schema,
                &[table],
            )),
        })
    }

    fn columns_info(&self, schema: Option<&str>, table: &str) -> Result<Statement> {
        Ok(Statement::raw(format!(
            "SHOW FULL COLUMNS FROM {}",
            self.table(&qualified(schema, table))?
        )))
    }

    fn normalize_columns_info(
        &self,
        table: &str,
        rows: &[Row],
    ) -> Result<IndexMap<String, ColumnDescriptor>> {
        let mut columns = IndexMap::with_capacity(rows.len());
        for row in rows {
            let name = row_text(row, "Field")
                .ok_or_else(|| Error::introspection(table, None, "column row without Field"))?;
            let raw = row_text(row, "Type").ok_or_else(|| {
                Error::introspection(table, Some(name.as_str()), "column row without Type")
            })?;
            let ty = parse_native_type(&raw).ok_or_else(|| {
                Error::introspection(table, Some(name.as_str()), format!("unparsable type '{raw}'"))
            })?;
            let canonical = self.canonical_type(&ty.base);
            let mut column = ColumnDescriptor::new(&name, &ty.base, canonical).with_nullable(
                row_text(row, "Null").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            );

            if ty.base == "enum" || ty.base == "set" {
                let list = ty.args.as_deref().unwrap_or_default();
                let values = scan_quoted_list(list)
                    .map_err(|message| Error::introspection(table, Some(name.as_str()), message))?;
                column = column.with_enumerated_values(values);
            } else if let Some(args) = &ty.args {
                let (length, precision) = ty.length_and_precision().ok_or_else(|| {
                    Error::introspection(table, Some(name.as_str()), format!("unparsable length '{args}'"))
                })?;
                column = column.with_max_length(length).with_precision(precision);
            }
            if ty.has_modifier("unsigned") {
                column = column.unsigned();
            }
            if row_text(row, "Key").is_some_and(|k| k == "PRI") {
                column = column.primary_key();
            }
            let extra = row_text(row, "Extra").unwrap_or_default().to_ascii_lowercase();
            if extra.contains("auto_increment") {
                column = column.autoincrement();
            }
            if let Some(default) = row_value(row, "Default").and_then(|v| v.to_text()) {
                let expression = extra.contains("default_generated")
                    || default.to_ascii_uppercase().starts_with("CURRENT_TIMESTAMP");
                column = column.with_default(if expression {
                    DefaultValue::Expression(default)
                } else {
                    DefaultValue::from_catalog(&default, canonical)
                });
            }
            if let Some(comment) = row_text(row, "Comment").filter(|c| !c.is_empty()) {
                column = column.with_comment(comment);
            }
            columns.insert(name, column);
        }
        Ok(columns)
    }

    fn normalize_table_info(
        &self,
        table: &str,
        raw: &RawTableInfo,
        mut columns: IndexMap<String, ColumnDescriptor>,
    ) -> Result<TableDescriptor> {
        let ddl = raw
            .meta
            .first()
            .and_then(|row| row_text(row, "Create Table"))
            .ok_or_else(|| Error::introspection(table, None, "SHOW CREATE TABLE returned no DDL"))?;
        let (meta, indexes, constraints) = self.parse_create_table(table, &ddl, &mut columns)?;

        let mut triggers = IndexMap::new();
        for row in &raw.triggers {
            let field = |column: &str| {
                row_text(row, column).ok_or_else(|| {
                    Error::introspection(table, None, format!("trigger row without {column}"))
                })
            };
            let name = field("TRIGGER_NAME")?;
            let definition = format!(
                "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {}",
                self.quote(&name)?,
                field("ACTION_TIMING")?,
                field("EVENT_MANIPULATION")?,
                self.table(table)?,
                field("ACTION_STATEMENT")?
            );
            triggers.insert(name, definition);
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
                "SELECT TABLE_NAME FROM information_schema.VIEWS \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) ORDER BY TABLE_NAME"
            }
            ObjectKind::Procedure => {
                "SELECT ROUTINE_NAME FROM information_schema.ROUTINES \
                 WHERE ROUTINE_SCHEMA = COALESCE(?, DATABASE()) AND ROUTINE_TYPE = 'PROCEDURE' \
                 ORDER BY ROUTINE_NAME"
            }
            ObjectKind::Event => {
                "SELECT EVENT_NAME FROM information_schema.EVENTS \
                 WHERE EVENT_SCHEMA = COALESCE(?, DATABASE()) ORDER BY EVENT_NAME"
            }
            ObjectKind::Trigger => return None,
        };
        Some(schema_statement(sql.to_string(), schema, &[]))
    }

    fn normalize_object_list(
        &self,
        _kind: ObjectKind,
        rows: &[Row],
    ) -> Result<IndexMap<String, Option<String>>> {
        Ok(self
            .normalize_table_list(rows)
            .into_iter()
            .map(|name| (name, None))
            .collect())
    }

    fn object_definition(
        &self,
        kind: ObjectKind,
        schema: Option<&str>,
        name: &str,
    ) -> Result<Option<Statement>> {
        Ok(Some(Statement::raw(format!(
            "SHOW CREATE {kind} {}",
            self.table(&qualified(schema, name))?
        ))))
    }

    fn normalize_object(&self, kind: ObjectKind, name: &str, rows: &[Row]) -> Result<String> {
        let column = match kind {
            ObjectKind::View => "Create View",
            ObjectKind::Procedure => "Create Procedure",
            ObjectKind::Event => "Create Event",
            ObjectKind::Trigger => "SQL Original Statement",
        };
        rows.first()
            .and_then(|row| row_text(row, column))
            .ok_or_else(|| {
                Error::introspection(name, None, format!("no {kind} definition (missing privileges?)"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SqlValue;

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

    fn column_row(field: &str, ty: &str, null: &str, key: &str, extra: &str) -> Row {
        row(&[
            ("Field", Some(field)),
            ("Type", Some(ty)),
            ("Collation", None),
            ("Null", Some(null)),
            ("Key", Some(key)),
            ("Default", None),
            ("Extra", Some(extra)),
            ("Privileges", Some("select,insert")),
            ("Comment", Some("")),
        ])
    }

    #[test]
    fn normalizes_show_columns() {
        let d = MySqlDialect::new();
        let rows = vec![
            column_row("id", "int(10) unsigned", "NO", "PRI", "auto_increment"),
            column_row("price", "decimal(10,2)", "YES", "", ""),
            column_row("state", "enum('a,b','c''d')", "NO", "", ""),
        ];
        let columns = d.normalize_columns_info("t", &rows).unwrap();
        let id = &columns["id"];
        assert!(id.is_primary_key() && id.is_autoincrement() && id.is_unsigned());
        assert_eq!(id.canonical_type(), CanonicalType::Int);
        assert_eq!(id.max_length(), 10);
        let price = &columns["price"];
        assert_eq!((price.max_length(), price.precision()), (10, 2));
        assert_eq!(price.canonical_type(), CanonicalType::Float);
        assert!(price.is_nullable());
        let state = &columns["state"];
        assert_eq!(
            state.enumerated_values(),
            Some(&["a,b".to_string(), "c'd".to_string()][..])
        );
    }

    #[test]
    fn unbalanced_enum_is_an_introspection_failure() {
        let d = MySqlDialect::new();
        let rows = vec![column_row("state", "enum('a','b)", "NO", "", "")];
        let err = d.normalize_columns_info("t", &rows).unwrap_err();
        assert!(matches!(
            err,
            Error::IntrospectionFailure { column: Some(ref c), .. } if c == "state"
        ));
    }

    #[test]
    fn scrapes_show_create_table() {
        let d = MySqlDialect::new();
        let ddl = "CREATE TABLE `posts` (\n  \
             `id` int NOT NULL AUTO_INCREMENT,\n  \
             `user_id` int NOT NULL COMMENT 'see FOREIGN KEY docs',\n  \
             `title` varchar(200) NOT NULL,\n  \
             PRIMARY KEY (`id`),\n  \
             UNIQUE KEY `uq_title` (`title`(50)) USING BTREE,\n  \
             KEY `idx_user` (`user_id`),\n  \
             CONSTRAINT `fk_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE\n\
             ) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin COMMENT='it''s'";
        let columns = d
            .normalize_columns_info(
                "posts",
                &[
                    column_row("id", "int", "NO", "", "auto_increment"),
                    column_row("user_id", "int", "NO", "MUL", ""),
                    column_row("title", "varchar(200)", "NO", "UNI", ""),
                ],
            )
            .unwrap();
        let raw = RawTableInfo {
            meta: vec![row(&[("Table", Some("posts")), ("Create Table", Some(ddl))])],
            triggers: vec![row(&[
                ("TRIGGER_NAME", Some("trg")),
                ("ACTION_TIMING", Some("BEFORE")),
                ("EVENT_MANIPULATION", Some("INSERT")),
                ("ACTION_STATEMENT", Some("SET NEW.title = TRIM(NEW.title)")),
            ])],
            ..RawTableInfo::default()
        };
        let table = d.normalize_table_info("posts", &raw, columns).unwrap();

        assert!(table.columns["id"].is_primary_key());
        assert_eq!(table.indexes[PRIMARY_INDEX].columns, vec!["id"]);
        let uq = &table.indexes["uq_title"];
        assert_eq!(uq.kind, IndexKind::Unique);
        assert_eq!(uq.method.as_deref(), Some("BTREE"));
        assert_eq!(uq.columns, vec!["title"]);
        assert_eq!(table.indexes["idx_user"].kind, IndexKind::Index);
        assert_eq!(table.constraints.len(), 1);
        let fk = &table.constraints["fk_user"];
        assert_eq!(fk.referenced_table, "users");
        assert_eq!(fk.on_delete, ForeignKeyAction::Cascade);
        assert_eq!(fk.on_update, ForeignKeyAction::NoAction);
        assert_eq!(table.meta.engine.as_deref(), Some("InnoDB"));
        assert_eq!(table.meta.auto_increment, Some(42));
        assert_eq!(table.meta.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(table.meta.collation.as_deref(), Some("utf8mb4_bin"));
        assert_eq!(table.meta.comment.as_deref(), Some("it's"));
        assert_eq!(
            table.triggers["trg"],
            "CREATE TRIGGER `trg` BEFORE INSERT ON `posts` FOR EACH ROW SET NEW.title = TRIM(NEW.title)"
        );
    }

    #[test]
    fn table_without_keys() {
        let d = MySqlDialect::new();
        let ddl = "CREATE TABLE `log` (\n  `msg` text\n) ENGINE=MyISAM";
        let columns = d
            .normalize_columns_info("log", &[column_row("msg", "text", "YES", "", "")])
            .unwrap();
        let raw = RawTableInfo {
            meta: vec![row(&[("Create Table", Some(ddl))])],
            ..RawTableInfo::default()
        };
        let table = d.normalize_table_info("log", &raw, columns).unwrap();
        assert!(table.indexes.is_empty());
        assert!(table.constraints.is_empty());
        assert_eq!(table.meta.engine.as_deref(), Some("MyISAM"));
    }

    #[test]
    fn ddl_generation() {
        let d = MySqlDialect::new();
        let table = TableDescriptor::new("users")
            .column(
                ColumnDescriptor::new("id", "int", CanonicalType::Int)
                    .primary_key()
                    .autoincrement(),
            )
            .column(
                ColumnDescriptor::new("name", "varchar", CanonicalType::String).with_max_length(50),
            )
            .index(
                "idx_name",
                IndexDescriptor::new(IndexKind::Index, vec!["name".into()]),
            )
            .with_meta(TableMeta {
                engine: Some("InnoDB".into()),
                ..TableMeta::default()
            });
        assert_eq!(
            d.create_table(&table).unwrap(),
            vec![
                "CREATE TABLE `users` (\n    `id` int NOT NULL AUTO_INCREMENT,\n    \
                 `name` varchar(50) NULL,\n    PRIMARY KEY (`id`),\n    \
                 KEY `idx_name` (`name`)\n) ENGINE=InnoDB"
                    .to_string()
            ]
        );
        assert!(matches!(
            d.rename_column("users", "name", "full_name"),
            Err(Error::UnsupportedOperation { .. })
        ));
        let renamed = ColumnDescriptor::new("full_name", "varchar", CanonicalType::String)
            .with_max_length(100)
            .not_null()
            .with_default(DefaultValue::String(String::new()));
        assert_eq!(
            d.change_column("users", "name", &renamed).unwrap(),
            "ALTER TABLE `users` CHANGE COLUMN `name` `full_name` varchar(100) NOT NULL DEFAULT ''"
        );
        let fk = ConstraintDescriptor::new("fk", vec!["org_id".into()], "orgs", vec!["id".into()])
            .unwrap()
            .on_delete(ForeignKeyAction::SetNull);
        assert_eq!(
            d.add_foreign_key("users", "fk_org", &fk).unwrap(),
            "ALTER TABLE `users` ADD CONSTRAINT `fk_org` FOREIGN KEY (`org_id`) \
             REFERENCES `orgs` (`id`) ON DELETE SET NULL"
        );
        assert_eq!(
            d.drop_index("users", "PRIMARY", &IndexDescriptor::new(IndexKind::Primary, vec![]))
                .unwrap(),
            "ALTER TABLE `users` DROP PRIMARY KEY"
        );
        assert_eq!(
            d.drop_object(ObjectKind::View, "v_users").unwrap(),
            "DROP VIEW IF EXISTS `v_users`"
        );
    }

    #[test]
    fn pagination() {
        let d = MySqlDialect::new();
        let limit = crate::builder::Limit {
            limit: 10,
            offset: Some(20),
        };
        assert_eq!(d.paginate("SELECT 1".into(), limit), "SELECT 1 LIMIT 10 OFFSET 20");
    }
}
