//! Applies change-sets to a live database.

use std::sync::Arc;

use dbal_core::builder::{BindStyle, Statement, StatementBuilder};
use dbal_core::diff::{SchemaChanges, TableChange, TableDelta};
use dbal_core::dialect::{Dialect, ObjectKind};
use dbal_core::schema::TableDescriptor;
use dbal_core::{ChangeSet, Connection, Error};
use tracing::{debug, info, warn};

use super::{StructureWriter, WriteReport};
use crate::error::Result;

/// Partial deltas of one branch, by table name.
fn partials(branch: &SchemaChanges) -> impl Iterator<Item = (&String, &TableDelta)> {
    branch.tables.iter().filter_map(|(name, change)| match change {
        TableChange::Partial(delta) => Some((name, delta)),
        TableChange::Whole(_) => None,
    })
}

/// Whole tables of one branch.
fn wholes(branch: &SchemaChanges) -> impl Iterator<Item = &TableDescriptor> {
    branch.tables.values().filter_map(|change| match change {
        TableChange::Whole(table) => Some(table),
        TableChange::Partial(_) => None,
    })
}

fn raw(statements: impl IntoIterator<Item = String>) -> impl Iterator<Item = Statement> {
    statements.into_iter().map(Statement::raw)
}

/// Translates change-sets into statements for one dialect.
///
/// Statements come out in dependency order: dependent objects are dropped
/// before what they depend on and created after it.
#[derive(Debug, Clone)]
pub struct Planner {
    dialect: Arc<dyn Dialect>,
    bind_style: BindStyle,
}

impl Planner {
    /// Creates a planner for the given dialect.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            bind_style: BindStyle::Positional,
        }
    }

    /// Placeholder style for data statements.
    #[must_use]
    pub const fn with_bind_style(mut self, style: BindStyle) -> Self {
        self.bind_style = style;
        self
    }

    /// The dialect in use.
    #[must_use]
    pub const fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Translates `changes` into statements without running anything.
    pub fn plan(&self, changes: &ChangeSet) -> dbal_core::Result<Vec<Statement>> {
        let mut plan = Vec::new();
        self.plan_drops(changes, &mut plan)?;
        self.plan_alters(changes, &mut plan)?;
        self.plan_creates(changes, &mut plan)?;
        self.plan_data(changes, &mut plan)?;
        Ok(plan)
    }

    fn plan_drops(
        &self,
        changes: &ChangeSet,
        plan: &mut Vec<Statement>,
    ) -> dbal_core::Result<()> {
        let d = self.dialect.as_ref();
        let ChangeSet { update, delete, .. } = changes;

        // Objects that may reference tables or columns go first.
        for kind in [ObjectKind::View, ObjectKind::Event, ObjectKind::Procedure] {
            for (name, _) in objects(delete, kind).chain(objects(update, kind)) {
                plan.push(Statement::raw(d.drop_object(kind, name)?));
            }
        }
        for (_, delta) in partials(delete).chain(partials(update)) {
            for name in delta.triggers.keys() {
                plan.push(Statement::raw(d.drop_object(ObjectKind::Trigger, name)?));
            }
        }

        // Foreign keys before the indexes and columns they use.
        for (table, delta) in partials(delete).chain(partials(update)) {
            for name in delta.constraints.keys() {
                plan.push(Statement::raw(d.drop_foreign_key(table, name)?));
            }
        }
        for table in wholes(delete) {
            for name in table.constraints.keys() {
                plan.push(Statement::raw(d.drop_foreign_key(&table.name, name)?));
            }
        }
        for (table, delta) in partials(delete).chain(partials(update)) {
            for (name, index) in &delta.indexes {
                plan.push(Statement::raw(d.drop_index(table, name, index)?));
            }
        }
        for (table, delta) in partials(delete) {
            for name in delta.columns.keys() {
                plan.push(Statement::raw(d.drop_column(table, name)?));
            }
        }
        for table in wholes(delete) {
            plan.push(Statement::raw(d.drop_table(&table.name)?));
        }
        Ok(())
    }

    fn plan_alters(
        &self,
        changes: &ChangeSet,
        plan: &mut Vec<Statement>,
    ) -> dbal_core::Result<()> {
        let d = self.dialect.as_ref();
        let update = &changes.update;

        if let Some(meta) = &update.meta {
            plan.extend(raw(d.alter_database_meta(meta)?));
        }
        for (table, delta) in partials(update) {
            if let Some(meta) = &delta.meta {
                plan.extend(raw(d.alter_table_meta(table, meta)?));
            }
            for (name, column) in &delta.columns {
                plan.push(Statement::raw(d.change_column(table, name, column)?));
            }
        }
        Ok(())
    }

    fn plan_creates(
        &self,
        changes: &ChangeSet,
        plan: &mut Vec<Statement>,
    ) -> dbal_core::Result<()> {
        let d = self.dialect.as_ref();
        let ChangeSet { insert, update, .. } = changes;

        if let Some(meta) = &insert.meta {
            plan.extend(raw(d.alter_database_meta(meta)?));
        }
        for table in wholes(insert) {
            plan.extend(raw(d.create_table(table)?));
        }
        for (table, delta) in partials(insert) {
            for column in delta.columns.values() {
                plan.push(Statement::raw(d.add_column(table, column)?));
            }
        }
        for (table, delta) in partials(insert).chain(partials(update)) {
            for (name, index) in &delta.indexes {
                plan.push(Statement::raw(d.create_index(table, name, index)?));
            }
        }

        let whole_fks = wholes(insert)
            .flat_map(|t| t.constraints.iter().map(move |fk| (&t.name, fk)));
        let partial_fks = partials(insert)
            .chain(partials(update))
            .flat_map(|(table, delta)| delta.constraints.iter().map(move |fk| (table, fk)));
        for (table, (name, fk)) in whole_fks.chain(partial_fks) {
            plan.push(Statement::raw(d.add_foreign_key(table, name, fk)?));
        }

        let whole_triggers = wholes(insert).flat_map(|t| t.triggers.iter());
        let partial_triggers = partials(insert)
            .chain(partials(update))
            .flat_map(|(_, delta)| delta.triggers.iter());
        for (name, definition) in whole_triggers.chain(partial_triggers) {
            plan.push(Statement::raw(d.create_object(ObjectKind::Trigger, name, definition)?));
        }

        // Procedures before the views and events that may call them.
        for kind in [ObjectKind::Procedure, ObjectKind::View, ObjectKind::Event] {
            for (name, definition) in objects(insert, kind).chain(objects(update, kind)) {
                plan.push(Statement::raw(d.create_object(kind, name, definition)?));
            }
        }
        Ok(())
    }

    /// Information tables are replaced wholesale: delete every row, insert
    /// the source's rows.
    fn plan_data(
        &self,
        changes: &ChangeSet,
        plan: &mut Vec<Statement>,
    ) -> dbal_core::Result<()> {
        let ChangeSet {
            insert,
            update,
            delete,
        } = changes;
        let mut builder =
            StatementBuilder::new(Arc::clone(&self.dialect)).with_bind_style(self.bind_style);
        for (table, rows) in insert.data.iter().chain(&update.data) {
            plan.push(builder.delete(table).build()?);
            if !rows.is_empty() {
                plan.push(builder.insert(table, rows.clone()).build()?);
            }
        }
        if !delete.data.is_empty() {
            warn!(
                tables = delete.data.len(),
                "Leaving rows of information tables missing from the source in place"
            );
        }
        Ok(())
    }
}

/// Writes change-sets to a live database.
#[derive(Debug)]
pub struct LiveDatabaseWriter<C: Connection> {
    conn: C,
    planner: Planner,
    dry_run: bool,
}

impl<C: Connection> LiveDatabaseWriter<C> {
    /// Creates a writer using the given dialect.
    pub fn new(conn: C, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            conn,
            planner: Planner::new(dialect),
            dry_run: false,
        }
    }

    /// Enables dry-run mode (statements are planned and logged, not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Placeholder style for data statements.
    #[must_use]
    pub fn with_bind_style(mut self, style: BindStyle) -> Self {
        self.planner = self.planner.with_bind_style(style);
        self
    }

    /// Translates `changes` into statements without running anything.
    pub fn plan(&self, changes: &ChangeSet) -> dbal_core::Result<Vec<Statement>> {
        self.planner.plan(changes)
    }

    /// Returns the connection.
    pub fn into_inner(self) -> C {
        self.conn
    }
}

/// Stored objects of one kind; triggers live in their tables.
fn objects(branch: &SchemaChanges, kind: ObjectKind) -> impl Iterator<Item = (&String, &String)> {
    let map = match kind {
        ObjectKind::View => Some(&branch.views),
        ObjectKind::Procedure => Some(&branch.procedures),
        ObjectKind::Event => Some(&branch.events),
        ObjectKind::Trigger => None,
    };
    map.into_iter().flatten()
}

impl<C: Connection> StructureWriter for LiveDatabaseWriter<C> {
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport> {
        let plan = self.planner.plan(changes)?;
        info!(
            driver = self.planner.dialect.name(),
            statements = plan.len(),
            dry_run = self.dry_run,
            "Applying change-set"
        );

        let mut applied = Vec::with_capacity(plan.len());
        for statement in plan {
            debug!(sql = %statement.sql, "Executing SQL");
            if !self.dry_run {
                if let Err(source) = self.conn.execute_statement(&statement) {
                    return Err(Error::ApplyFailure {
                        statement: statement.sql,
                        applied,
                        source,
                    }
                    .into());
                }
            }
            applied.push(statement.sql);
        }

        info!(statements = applied.len(), "Change-set applied successfully");
        Ok(WriteReport::Statements(applied))
    }
}
