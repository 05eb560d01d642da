//! # dbal-core
//!
//! Database abstraction for schema synchronization.
//!
//! This crate provides:
//! - A canonical metadata model ([`schema`]) that every engine's catalog is
//!   normalized into
//! - A [`Dialect`] strategy per engine (MySQL, Oracle) covering quoting,
//!   DDL, introspection queries and pagination
//! - A fluent, stateful [`StatementBuilder`](builder::StatementBuilder)
//!   with a where-expression compiler
//! - A structural diff ([`diff::compare`]) producing an insert/update/delete
//!   [`ChangeSet`](diff::ChangeSet)
//!
//! Connections are supplied by the caller through the [`Connection`] trait.
//!
//! ## Building statements
//!
//! ```rust
//! use std::sync::Arc;
//! use dbal_core::builder::{BindStyle, StatementBuilder, Where, WhereValue};
//! use dbal_core::dialect::OracleDialect;
//!
//! let mut builder = StatementBuilder::new(Arc::new(OracleDialect::new(true)))
//!     .with_bind_style(BindStyle::Named);
//! builder
//!     .select("employees", &["id"])
//!     .where_clause(Where::list(vec![
//!         Where::eq("dept", 10),
//!         Where::list(vec![
//!             Where::eq("role", "lead"),
//!             Where::pair("manager_id", WhereValue::value(None::<i64>)),
//!         ]),
//!     ]))
//!     .unwrap();
//! let statement = builder.build().unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT \"id\" FROM \"employees\" WHERE \"dept\" = :dept AND \
//!      (\"role\" = :role OR \"manager_id\" IS NULL)"
//! );
//! ```

pub mod builder;
pub mod cache;
pub mod connection;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod schema;

pub use cache::MetadataCache;
pub use connection::{Connection, Row};
pub use dialect::{Dialect, DialectRegistry, ObjectKind, QuotePurpose};
pub use diff::{ChangeSet, apply_change_set, compare};
pub use error::{BoxError, Error, Result};
