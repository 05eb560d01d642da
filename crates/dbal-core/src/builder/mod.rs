//! Dialect-independent statement builder.
//!
//! [`StatementBuilder`] accumulates clause fragments for a stack of
//! statements and hands them to the active [`Dialect`](crate::Dialect) for
//! assembly. Values never appear in the SQL text: they are collected as
//! [`BindValues`] next to it.

mod condition;
mod statement;
mod value;

pub use condition::{Condition, Conjunction, Where, WhereValue};
pub use statement::{
    Fragments, Join, JoinKind, Limit, Order, Statement, StatementBuilder, StatementKind,
};
pub use value::{BindStyle, BindValues, SqlValue, ToSqlValue};
