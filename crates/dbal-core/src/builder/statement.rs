//! The stateful statement builder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connection::Row;
use crate::dialect::Dialect;
use crate::error::{Error, Result};

use super::condition::{Condition, Where};
use super::value::{BindStyle, BindValues, SqlValue};

/// A finished statement: SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bind values, in placeholder order.
    pub binds: BindValues,
}

impl Statement {
    /// Creates a statement.
    pub fn new(sql: impl Into<String>, binds: BindValues) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }

    /// A statement without bind values.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, BindValues::default())
    }
}

/// The kind of statement a frame builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`
    Select,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
}

impl StatementKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `CROSS JOIN`
    Cross,
}

impl JoinKind {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// One joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type.
    pub kind: JoinKind,
    /// Joined table.
    pub table: String,
    /// Join condition; ignored for cross joins.
    pub on: Option<Where>,
}

impl Join {
    /// `INNER JOIN table ON ...`
    pub fn inner(table: impl Into<String>, on: Where) -> Self {
        Self {
            kind: JoinKind::Inner,
            table: table.into(),
            on: Some(on),
        }
    }

    /// `LEFT JOIN table ON ...`
    pub fn left(table: impl Into<String>, on: Where) -> Self {
        Self {
            kind: JoinKind::Left,
            table: table.into(),
            on: Some(on),
        }
    }

    /// `RIGHT JOIN table ON ...`
    pub fn right(table: impl Into<String>, on: Where) -> Self {
        Self {
            kind: JoinKind::Right,
            table: table.into(),
            on: Some(on),
        }
    }

    /// `CROSS JOIN table`
    pub fn cross(table: impl Into<String>) -> Self {
        Self {
            kind: JoinKind::Cross,
            table: table.into(),
            on: None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Row limit with optional offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Maximum number of rows.
    pub limit: u64,
    /// Rows to skip.
    pub offset: Option<u64>,
}

/// Rendered clause fragments handed to a dialect for assembly.
///
/// Identifiers are already quoted and values already replaced by
/// placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    /// Target table.
    pub table: String,
    /// Select list, or the insert column list.
    pub columns: Vec<String>,
    /// Insert rows as placeholder lists.
    pub rows: Vec<Vec<String>>,
    /// Update assignments, `col = ?`.
    pub assignments: Vec<String>,
    /// Rendered join clauses.
    pub joins: Vec<String>,
    /// WHERE condition.
    pub where_sql: Option<String>,
    /// GROUP BY columns.
    pub group_by: Vec<String>,
    /// HAVING condition.
    pub having: Option<String>,
    /// ORDER BY items, `col ASC`.
    pub order_by: Vec<String>,
    /// Pagination.
    pub limit: Option<Limit>,
}

#[derive(Debug)]
struct Frame {
    kind: StatementKind,
    table: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    joins: Option<Vec<Join>>,
    where_clause: Option<Where>,
    group_by: Option<Vec<String>>,
    having: Option<Where>,
    order_by: Option<Vec<(String, Order)>>,
    limit: Option<Limit>,
}

impl Frame {
    const fn new(kind: StatementKind, table: String) -> Self {
        Self {
            kind,
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            joins: None,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        }
    }
}

/// Fluent, stateful statement builder.
///
/// `select`, `insert`, `update` and `delete` push a new statement frame;
/// clause methods modify the top frame; [`build`](Self::build) pops it.
/// Each clause may be set once per statement. Frames nest, so a subquery
/// can be started and built while an outer statement is in progress.
///
/// A builder is not meant to be shared between threads; give every logical
/// statement its own builder or build each one before starting the next.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use dbal_core::builder::{StatementBuilder, Where};
/// use dbal_core::dialect::MySqlDialect;
///
/// let mut builder = StatementBuilder::new(Arc::new(MySqlDialect::new()));
/// builder
///     .select("users", &["id", "name"])
///     .where_clause(Where::eq("active", true))
///     .unwrap()
///     .limit(10, None)
///     .unwrap();
/// let statement = builder.build().unwrap();
/// assert_eq!(
///     statement.sql,
///     "SELECT `id`, `name` FROM `users` WHERE `active` = ? LIMIT 10"
/// );
/// ```
#[derive(Debug)]
pub struct StatementBuilder {
    dialect: Arc<dyn Dialect>,
    style: BindStyle,
    frames: Vec<Frame>,
}

impl StatementBuilder {
    /// Creates a builder emitting positional placeholders.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            style: BindStyle::Positional,
            frames: Vec::new(),
        }
    }

    /// Selects the placeholder style.
    #[must_use]
    pub const fn with_bind_style(mut self, style: BindStyle) -> Self {
        self.style = style;
        self
    }

    /// The dialect statements are rendered for.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Number of statements in progress.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drops every statement in progress.
    pub fn reset(&mut self) {
        self.frames.clear();
    }

    /// Starts a `SELECT`; an empty column list selects `*`.
    pub fn select(&mut self, table: &str, columns: &[&str]) -> &mut Self {
        let mut frame = Frame::new(StatementKind::Select, table.to_string());
        frame.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.frames.push(frame);
        self
    }

    /// Starts an `INSERT` of one or more rows.
    ///
    /// Every row must carry the columns of the first row.
    pub fn insert(&mut self, table: &str, rows: Vec<Row>) -> &mut Self {
        let mut frame = Frame::new(StatementKind::Insert, table.to_string());
        frame.rows = rows;
        self.frames.push(frame);
        self
    }

    /// Starts an `UPDATE` setting the given values.
    pub fn update(&mut self, table: &str, values: Row) -> &mut Self {
        let mut frame = Frame::new(StatementKind::Update, table.to_string());
        frame.rows = vec![values];
        self.frames.push(frame);
        self
    }

    /// Starts a `DELETE`.
    pub fn delete(&mut self, table: &str) -> &mut Self {
        self.frames
            .push(Frame::new(StatementKind::Delete, table.to_string()));
        self
    }

    /// Sets the joins of a `SELECT`.
    pub fn join(&mut self, joins: Vec<Join>) -> Result<&mut Self> {
        let frame = self.top("JOIN", &[StatementKind::Select])?;
        set_once(&mut frame.joins, joins, "JOIN")?;
        Ok(self)
    }

    /// Sets the WHERE condition.
    pub fn where_clause(&mut self, condition: Where) -> Result<&mut Self> {
        let frame = self.top(
            "WHERE",
            &[
                StatementKind::Select,
                StatementKind::Update,
                StatementKind::Delete,
            ],
        )?;
        set_once(&mut frame.where_clause, condition, "WHERE")?;
        Ok(self)
    }

    /// Sets the GROUP BY columns.
    pub fn group_by(&mut self, columns: &[&str]) -> Result<&mut Self> {
        let frame = self.top("GROUP BY", &[StatementKind::Select])?;
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        set_once(&mut frame.group_by, columns, "GROUP BY")?;
        Ok(self)
    }

    /// Sets the HAVING condition.
    pub fn having(&mut self, condition: Where) -> Result<&mut Self> {
        let frame = self.top("HAVING", &[StatementKind::Select])?;
        set_once(&mut frame.having, condition, "HAVING")?;
        Ok(self)
    }

    /// Sets the ORDER BY items.
    pub fn order_by(&mut self, items: &[(&str, Order)]) -> Result<&mut Self> {
        let frame = self.top(
            "ORDER BY",
            &[
                StatementKind::Select,
                StatementKind::Update,
                StatementKind::Delete,
            ],
        )?;
        let items = items.iter().map(|(c, o)| ((*c).to_string(), *o)).collect();
        set_once(&mut frame.order_by, items, "ORDER BY")?;
        Ok(self)
    }

    /// Sets the row limit and offset.
    pub fn limit(&mut self, limit: u64, offset: Option<u64>) -> Result<&mut Self> {
        let frame = self.top(
            "LIMIT",
            &[
                StatementKind::Select,
                StatementKind::Update,
                StatementKind::Delete,
            ],
        )?;
        set_once(&mut frame.limit, Limit { limit, offset }, "LIMIT")?;
        Ok(self)
    }

    /// Pops the top statement and renders it.
    pub fn build(&mut self) -> Result<Statement> {
        let frame = self.frames.pop().ok_or(Error::NoActiveStatement)?;
        let dialect = Arc::clone(&self.dialect);
        let mut binds = BindValues::new(self.style);
        let fragments = render_fragments(&frame, dialect.as_ref(), &mut binds)?;
        let sql = match frame.kind {
            StatementKind::Select => dialect.assemble_select(&fragments)?,
            StatementKind::Insert => dialect.assemble_insert(&fragments)?,
            StatementKind::Update => dialect.assemble_update(&fragments)?,
            StatementKind::Delete => dialect.assemble_delete(&fragments)?,
        };
        Ok(Statement { sql, binds })
    }

    fn top(&mut self, clause: &'static str, allowed: &[StatementKind]) -> Result<&mut Frame> {
        let name = self.dialect.name();
        let frame = self.frames.last_mut().ok_or(Error::NoActiveStatement)?;
        if !allowed.contains(&frame.kind) {
            return Err(Error::unsupported(
                name,
                format!("{clause} on a {} statement", frame.kind.as_str()),
            ));
        }
        Ok(frame)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, clause: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(Error::DuplicateClause(clause));
    }
    *slot = Some(value);
    Ok(())
}

/// Expressions such as `COUNT(*)` or `a AS b` pass through unquoted.
fn is_expression(column: &str) -> bool {
    column.contains('(') || column.to_ascii_uppercase().contains(" AS ")
}

fn select_item(dialect: &dyn Dialect, column: &str) -> Result<String> {
    if is_expression(column) {
        Ok(column.to_string())
    } else {
        dialect.quote_identifier(column, false)
    }
}

fn render_fragments(
    frame: &Frame,
    dialect: &dyn Dialect,
    binds: &mut BindValues,
) -> Result<Fragments> {
    let mut out = Fragments {
        table: dialect.quote_identifier(&frame.table, true)?,
        limit: frame.limit,
        ..Fragments::default()
    };

    match frame.kind {
        StatementKind::Select => {
            out.columns = if frame.columns.is_empty() {
                vec![String::from("*")]
            } else {
                frame
                    .columns
                    .iter()
                    .map(|c| select_item(dialect, c))
                    .collect::<Result<_>>()?
            };
        }
        StatementKind::Insert => {
            let first = frame.rows.first().ok_or_else(|| {
                Error::unsupported(dialect.name(), "INSERT without rows")
            })?;
            let names: Vec<&str> = first.keys().map(String::as_str).collect();
            if let Some(row) = frame
                .rows
                .iter()
                .find(|row| {
                    row.len() != names.len() || names.iter().any(|n| !row.contains_key(*n))
                })
            {
                let columns: Vec<&str> = row.keys().map(String::as_str).collect();
                return Err(Error::InvalidDescriptor {
                    name: frame.table.clone(),
                    message: format!(
                        "INSERT row has columns ({}) but the first row has ({})",
                        columns.join(", "),
                        names.join(", ")
                    ),
                });
            }
            out.columns = names
                .iter()
                .map(|c| dialect.quote_identifier(c, false))
                .collect::<Result<_>>()?;
            for row in &frame.rows {
                let mut placeholders = Vec::with_capacity(names.len());
                for name in &names {
                    let value = row.get(*name).cloned().unwrap_or(SqlValue::Null);
                    placeholders.push(binds.push(name, value));
                }
                out.rows.push(placeholders);
            }
        }
        StatementKind::Update => {
            if let Some(values) = frame.rows.first() {
                for (column, value) in values {
                    let placeholder = binds.push(column, value.clone());
                    out.assignments.push(format!(
                        "{} = {placeholder}",
                        dialect.quote_identifier(column, false)?
                    ));
                }
            }
        }
        StatementKind::Delete => {}
    }

    for join in frame.joins.iter().flatten() {
        let table = dialect.quote_identifier(&join.table, true)?;
        match (&join.on, join.kind) {
            (Some(on), kind) if kind != JoinKind::Cross => {
                let on = Condition::parse(on.clone()).compile(dialect, binds)?;
                out.joins.push(format!("{} {table} ON {on}", kind.as_sql()));
            }
            (_, kind) => out.joins.push(format!("{} {table}", kind.as_sql())),
        }
    }

    if let Some(condition) = &frame.where_clause {
        out.where_sql = Some(Condition::parse(condition.clone()).compile(dialect, binds)?);
    }
    if let Some(columns) = &frame.group_by {
        out.group_by = columns
            .iter()
            .map(|c| select_item(dialect, c))
            .collect::<Result<_>>()?;
    }
    if let Some(condition) = &frame.having {
        out.having = Some(Condition::parse(condition.clone()).compile(dialect, binds)?);
    }
    if let Some(items) = &frame.order_by {
        for (column, order) in items {
            let direction = match order {
                Order::Asc => "ASC",
                Order::Desc => "DESC",
            };
            out.order_by
                .push(format!("{} {direction}", select_item(dialect, column)?));
        }
    }
    Ok(out)
}
