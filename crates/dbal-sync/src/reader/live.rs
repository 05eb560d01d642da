//! Reads structure from a live connection through a dialect.

use std::sync::Arc;

use dbal_core::builder::{Order, Statement, StatementBuilder};
use dbal_core::dialect::{Dialect, ObjectKind, RawTableInfo};
use dbal_core::schema::{DatabaseDescriptor, TableDescriptor};
use dbal_core::{Connection, Error, MetadataCache, Row};
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info};

use super::StructureReader;
use crate::error::Result;

/// Introspects a live database.
#[derive(Debug)]
pub struct LiveDatabaseReader<C: Connection> {
    conn: C,
    dialect: Arc<dyn Dialect>,
    schema: Option<String>,
    information_tables: Option<Regex>,
    cache: Option<MetadataCache>,
}

impl<C: Connection> LiveDatabaseReader<C> {
    /// Creates a reader using the given dialect.
    pub fn new(conn: C, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            conn,
            dialect,
            schema: None,
            information_tables: None,
            cache: None,
        }
    }

    /// Reads the given schema instead of the connection's default.
    #[must_use]
    pub fn schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    /// Captures the rows of tables matching `pattern`.
    #[must_use]
    pub fn information_tables(mut self, pattern: Option<Regex>) -> Self {
        self.information_tables = pattern;
        self
    }

    /// Serves table descriptors from `cache` while they are fresh.
    #[must_use]
    pub fn cache(mut self, cache: MetadataCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The dialect in use.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Returns the connection.
    pub fn into_inner(self) -> C {
        self.conn
    }

    fn fetch(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        debug!(sql = %statement.sql, "Introspecting");
        self.conn.fetch_statement(statement).map_err(|source| {
            Error::Query {
                statement: statement.sql.clone(),
                source,
            }
            .into()
        })
    }

    fn fetch_optional(&mut self, statement: Option<&Statement>) -> Result<Vec<Row>> {
        statement.map_or_else(|| Ok(Vec::new()), |s| self.fetch(s))
    }

    fn load_table(&mut self, table: &str) -> Result<TableDescriptor> {
        let dialect = Arc::clone(&self.dialect);
        let schema = self.schema.clone();
        let schema = schema.as_deref();

        let column_rows = self.fetch(&dialect.columns_info(schema, table)?)?;
        let columns = dialect.normalize_columns_info(table, &column_rows)?;

        let queries = dialect.table_info(schema, table)?;
        let raw = RawTableInfo {
            meta: self.fetch(&queries.meta)?,
            keys: self.fetch_optional(queries.keys.as_ref())?,
            constraints: self.fetch_optional(queries.constraints.as_ref())?,
            triggers: self.fetch_optional(queries.triggers.as_ref())?,
        };
        Ok(dialect.normalize_table_info(table, &raw, columns)?)
    }

    fn read_table(&mut self, table: &str) -> Result<TableDescriptor> {
        let Some(mut cache) = self.cache.take() else {
            return self.load_table(table);
        };
        let database = self.schema.clone().unwrap_or_default();
        let descriptor = cache.get_or_load(&database, table, || self.load_table(table));
        self.cache = Some(cache);
        descriptor
    }

    fn read_objects(&mut self, kind: ObjectKind) -> Result<IndexMap<String, String>> {
        let dialect = Arc::clone(&self.dialect);
        let schema = self.schema.clone();
        let schema = schema.as_deref();
        let Some(list) = dialect.object_list(kind, schema) else {
            return Ok(IndexMap::new());
        };
        let rows = self.fetch(&list)?;
        let mut objects = IndexMap::new();
        for (name, definition) in dialect.normalize_object_list(kind, &rows)? {
            let definition = match definition {
                Some(definition) => definition,
                None => {
                    let query = dialect.object_definition(kind, schema, &name)?.ok_or_else(|| {
                        Error::IntrospectionFailure {
                            table: name.clone(),
                            column: None,
                            message: format!("no way to read the {kind} definition"),
                        }
                    })?;
                    let rows = self.fetch(&query)?;
                    dialect.normalize_object(kind, &name, &rows)?
                }
            };
            objects.insert(name, definition);
        }
        Ok(objects)
    }

    /// Rows come back sorted by primary key, or by every column when the
    /// table has none, so two reads of the same data compare equal.
    fn read_rows(&mut self, table: &TableDescriptor) -> Result<Vec<Row>> {
        let name = match &self.schema {
            Some(schema) => format!("{schema}.{}", table.name),
            None => table.name.clone(),
        };
        let mut key = table.primary_key();
        if key.is_empty() {
            key = table.columns.keys().map(String::as_str).collect();
        }
        let order: Vec<(&str, Order)> = key.into_iter().map(|c| (c, Order::Asc)).collect();

        let mut builder = StatementBuilder::new(Arc::clone(&self.dialect));
        builder.select(&name, &[]);
        if !order.is_empty() {
            builder.order_by(&order)?;
        }
        let statement = builder.build()?;
        self.fetch(&statement)
    }
}

impl<C: Connection> StructureReader for LiveDatabaseReader<C> {
    fn read(&mut self) -> Result<DatabaseDescriptor> {
        let dialect = Arc::clone(&self.dialect);
        let schema = self.schema.clone();
        info!(
            driver = dialect.name(),
            schema = schema.as_deref().unwrap_or("(default)"),
            "Reading database structure"
        );

        let mut database = DatabaseDescriptor::new(dialect.name());
        let meta_rows = self.fetch(&dialect.database_meta(schema.as_deref()))?;
        database.meta = dialect.normalize_database_meta(&meta_rows);
        database.meta.driver = dialect.name().to_string();

        let list = self.fetch(&dialect.table_list(schema.as_deref())?)?;
        for table in dialect.normalize_table_list(&list) {
            let descriptor = self.read_table(&table)?;
            database.tables.insert(table, descriptor);
        }

        database.views = self.read_objects(ObjectKind::View)?;
        database.procedures = self.read_objects(ObjectKind::Procedure)?;
        database.events = self.read_objects(ObjectKind::Event)?;

        if let Some(pattern) = self.information_tables.clone() {
            let matching: Vec<TableDescriptor> = database
                .tables
                .values()
                .filter(|t| pattern.is_match(&t.name))
                .cloned()
                .collect();
            for table in matching {
                let rows = self.read_rows(&table)?;
                debug!(table = %table.name, rows = rows.len(), "Captured information table");
                database.data.insert(table.name, rows);
            }
        }

        info!(
            tables = database.tables.len(),
            views = database.views.len(),
            procedures = database.procedures.len(),
            events = database.events.len(),
            "Read database structure"
        );
        Ok(database)
    }
}
