//! Where-expression parsing and compilation.
//!
//! Callers describe conditions with [`Where`], which mirrors the shapes a
//! condition can be written in: a map of `column = value` pairs, a list of
//! sub-conditions, or raw SQL. [`Condition::parse`] turns that into an
//! explicit tree, and [`Condition::compile`] renders the tree through a
//! [`Dialect`] while collecting bind values.
//!
//! Lists alternate their conjunction with nesting depth: a list nested in
//! an `AND` list is joined with `OR` and vice versa. At the top level a list
//! whose first element is itself a list starts out as `OR`.

use crate::dialect::Dialect;
use crate::error::{Error, Result};

use super::statement::Statement;
use super::value::{BindValues, SqlValue, ToSqlValue};

/// The right-hand side of a `column = ...` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// A bound value; NULL compiles to `IS NULL`.
    Value(SqlValue),
    /// Another column, quoted as an identifier (join conditions).
    Column(String),
    /// A raw SQL expression, spliced verbatim.
    Raw(String),
    /// A previously built statement, spliced as `(subquery)`.
    Subquery(Statement),
    /// A list of bound values, compiled to `IN (...)`.
    In(Vec<SqlValue>),
}

impl WhereValue {
    /// A bound value.
    pub fn value(value: impl ToSqlValue) -> Self {
        Self::Value(value.to_sql_value())
    }

    /// A column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Raw SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// An `IN` list.
    pub fn any_of<T: ToSqlValue>(values: impl IntoIterator<Item = T>) -> Self {
        Self::In(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

impl From<Statement> for WhereValue {
    fn from(statement: Statement) -> Self {
        Self::Subquery(statement)
    }
}

/// A condition as written by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// `column = value` pairs, joined by the surrounding conjunction.
    Map(Vec<(String, WhereValue)>),
    /// Sub-conditions; nesting flips the conjunction.
    List(Vec<Where>),
    /// Raw SQL.
    Raw(String),
}

impl Where {
    /// A single `column = value` pair.
    pub fn eq(column: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self::Map(vec![(column.into(), WhereValue::value(value))])
    }

    /// A single pair with an explicit right-hand side.
    pub fn pair(column: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        Self::Map(vec![(column.into(), value.into())])
    }

    /// Several `column = value` pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToSqlValue,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), WhereValue::value(v)))
                .collect(),
        )
    }

    /// A list of sub-conditions.
    #[must_use]
    pub const fn list(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    /// Raw SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

/// How the members of a group are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Conjunction {
    /// The other conjunction.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Parsed condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`.
    Equals {
        /// Left-hand column.
        column: String,
        /// Right-hand side.
        value: WhereValue,
    },
    /// Raw SQL.
    Raw(String),
    /// Members joined by a conjunction.
    Group(Conjunction, Vec<Condition>),
}

impl Condition {
    /// Parses a caller-supplied condition.
    #[must_use]
    pub fn parse(input: Where) -> Self {
        match input {
            Where::Raw(sql) => Self::Raw(sql),
            Where::Map(pairs) => {
                let mut members = Vec::with_capacity(pairs.len());
                flatten_pairs(pairs, &mut members);
                Self::group(Conjunction::And, members)
            }
            Where::List(items) => {
                let conjunction = match items.first() {
                    Some(Where::List(_)) => Conjunction::Or,
                    _ => Conjunction::And,
                };
                Self::parse_list(items, conjunction)
            }
        }
    }

    fn parse_list(items: Vec<Where>, conjunction: Conjunction) -> Self {
        let mut members = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Where::Map(pairs) => flatten_pairs(pairs, &mut members),
                Where::Raw(sql) => members.push(Self::Raw(sql)),
                Where::List(nested) => members.push(Self::parse_list(nested, conjunction.flip())),
            }
        }
        Self::group(conjunction, members)
    }

    fn group(conjunction: Conjunction, mut members: Vec<Self>) -> Self {
        if members.len() == 1 {
            members.remove(0)
        } else {
            Self::Group(conjunction, members)
        }
    }

    /// Renders the condition, appending bind values in placeholder order.
    pub fn compile(&self, dialect: &dyn Dialect, binds: &mut BindValues) -> Result<String> {
        match self {
            Self::Raw(sql) => Ok(sql.clone()),
            Self::Equals { column, value } => compile_equals(column, value, dialect, binds),
            Self::Group(_, members) if members.is_empty() => Ok(String::from("1 = 1")),
            Self::Group(conjunction, members) => {
                let mut parts = Vec::with_capacity(members.len());
                for member in members {
                    let sql = member.compile(dialect, binds)?;
                    if matches!(member, Self::Group(_, m) if m.len() > 1) {
                        parts.push(format!("({sql})"));
                    } else {
                        parts.push(sql);
                    }
                }
                Ok(parts.join(conjunction.as_sql()))
            }
        }
    }
}

fn flatten_pairs(pairs: Vec<(String, WhereValue)>, into: &mut Vec<Condition>) {
    into.extend(
        pairs
            .into_iter()
            .map(|(column, value)| Condition::Equals { column, value }),
    );
}

fn compile_equals(
    column: &str,
    value: &WhereValue,
    dialect: &dyn Dialect,
    binds: &mut BindValues,
) -> Result<String> {
    let lhs = dialect.quote_identifier(column, false)?;
    match value {
        WhereValue::Value(SqlValue::Null) => Ok(format!("{lhs} IS NULL")),
        WhereValue::Value(v) => Ok(format!("{lhs} = {}", binds.push(column, v.clone()))),
        WhereValue::Column(other) => Ok(format!(
            "{lhs} = {}",
            dialect.quote_identifier(other, false)?
        )),
        WhereValue::Raw(sql) => Ok(format!("{lhs} = {sql}")),
        WhereValue::In(values) if values.is_empty() => Ok(String::from("1 = 0")),
        WhereValue::In(values) => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| binds.push(column, v.clone()))
                .collect();
            Ok(format!("{lhs} IN ({})", placeholders.join(", ")))
        }
        WhereValue::Subquery(statement) => {
            let sql = splice_subquery(statement, dialect, binds)?;
            Ok(format!("{lhs} = ({sql})"))
        }
    }
}

/// Merges a subquery's binds into `binds`, rewriting renamed placeholders.
pub(crate) fn splice_subquery(
    statement: &Statement,
    dialect: &dyn Dialect,
    binds: &mut BindValues,
) -> Result<String> {
    let same_style = matches!(
        (&*binds, &statement.binds),
        (BindValues::Positional(_), BindValues::Positional(_))
            | (BindValues::Named(_), BindValues::Named(_))
    );
    if !same_style && !statement.binds.is_empty() {
        return Err(Error::unsupported(
            dialect.name(),
            "subquery built with a different bind style",
        ));
    }
    let renames = binds.extend(statement.binds.clone());
    Ok(rename_placeholders(&statement.sql, &renames))
}

/// Rewrites `:name` placeholders in one pass so chained renames never
/// apply twice.
fn rename_placeholders(sql: &str, renames: &[(String, String)]) -> String {
    if renames.is_empty() {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        out.push(c);
        if c != ':' {
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while let Some(&(j, n)) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                end = j + n.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = &sql[start..end];
        match renames.iter().find(|(old, _)| old == name) {
            Some((_, new)) => out.push_str(new),
            None => out.push_str(name),
        }
    }
    out
}
