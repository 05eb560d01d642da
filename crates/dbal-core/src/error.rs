//! Error types for the database abstraction layer.

/// Boxed error returned by a [`Connection`](crate::Connection) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by quoting, statement building, introspection and diffing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier part was empty or otherwise unusable.
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        /// The identifier as passed in.
        identifier: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The operation cannot be expressed in the target dialect.
    #[error("Operation not supported by {dialect}: {operation}")]
    UnsupportedOperation {
        /// Dialect name.
        dialect: &'static str,
        /// What was attempted.
        operation: String,
    },

    /// A builder clause was set twice on the same statement.
    #[error("Clause '{0}' was already set on this statement")]
    DuplicateClause(&'static str),

    /// A clause or `build()` was called with no statement in progress.
    #[error("No statement in progress; call select/insert/update/delete first")]
    NoActiveStatement,

    /// The two descriptors come from different database engines.
    #[error("Cannot compare a '{source_driver}' structure with a '{target_driver}' structure")]
    EngineMismatch {
        /// Driver of the source descriptor.
        source_driver: String,
        /// Driver of the target descriptor.
        target_driver: String,
    },

    /// Introspected metadata could not be normalized.
    #[error("Unparsable metadata for {table}{}: {message}", column.as_ref().map(|c| format!(".{c}")).unwrap_or_default())]
    IntrospectionFailure {
        /// Table being normalized.
        table: String,
        /// Column being normalized, if any.
        column: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// A descriptor breaks a model invariant.
    #[error("Invalid descriptor '{name}': {message}")]
    InvalidDescriptor {
        /// Entity name.
        name: String,
        /// What is wrong with it.
        message: String,
    },

    /// No dialect is registered under the given engine name.
    #[error("No dialect registered for engine '{0}'")]
    UnknownDialect(String),

    /// An introspection query failed at the connection.
    #[error("Query failed: {statement}: {source}")]
    Query {
        /// The SQL that failed.
        statement: String,
        /// The connection's error, unwrapped.
        source: BoxError,
    },

    /// A statement failed while applying a change-set.
    #[error("Failed to apply '{statement}' after {} statement(s): {source}", applied.len())]
    ApplyFailure {
        /// The SQL that failed.
        statement: String,
        /// Statements that had already been applied, in order.
        applied: Vec<String>,
        /// The connection's error, unwrapped.
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn unsupported(dialect: &'static str, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            dialect,
            operation: operation.into(),
        }
    }

    pub(crate) fn introspection(
        table: impl Into<String>,
        column: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::IntrospectionFailure {
            table: table.into(),
            column: column.map(String::from),
            message: message.into(),
        }
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
