//! Name-to-dialect resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Dialect, MySqlDialect, OracleDialect};
use crate::error::{Error, Result};

/// Builds a dialect from the server version string.
pub type DialectFactory = fn(&str) -> Arc<dyn Dialect>;

fn mysql(_version: &str) -> Arc<dyn Dialect> {
    Arc::new(MySqlDialect::new())
}

fn oracle(version: &str) -> Arc<dyn Dialect> {
    Arc::new(OracleDialect::detect(version))
}

/// Registry of dialect factories keyed by driver name.
///
/// Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    factories: HashMap<String, DialectFactory>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DialectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry knowing `mysql`, `mariadb` and `oracle`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("mysql", mysql);
        registry.register("mariadb", mysql);
        registry.register("oracle", oracle);
        registry
    }

    /// Registers (or replaces) a factory.
    pub fn register(&mut self, name: &str, factory: DialectFactory) -> &mut Self {
        self.factories.insert(name.to_ascii_lowercase(), factory);
        self
    }

    /// Whether a driver name is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Builds the dialect for a driver, passing it the server version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDialect`] if no factory is registered.
    pub fn resolve(&self, name: &str, version: &str) -> Result<Arc<dyn Dialect>> {
        let factory = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::UnknownDialect(name.to_string()))?;
        debug!(driver = name, version, "Resolving dialect");
        Ok(factory(version))
    }
}
