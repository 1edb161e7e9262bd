//! Driver dispatch: one adapter per SQL backend behind [`Driver`].

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use tracing::debug;

use crate::error::EngineError;
use crate::scan::QueryResult;

/// Runs SQL against one kind of backend and materializes the whole result.
///
/// Adapters open a fresh connection per call and never retry.
pub trait Driver: Send + Sync {
    /// Canonical identifier, e.g. `sqlite`.
    fn name(&self) -> &'static str;

    /// Extra identifiers that select this driver.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn execute(&self, connection: &str, sql: &str) -> Result<QueryResult, EngineError>;
}

/// Drive an async client to completion on a private current-thread runtime.
#[cfg(any(feature = "postgres", feature = "mssql"))]
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, EngineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| EngineError::Connection(format!("runtime init failed: {err}")))?;
    Ok(runtime.block_on(future))
}

/// Selects a [`Driver`] by identifier. Lookup ignores case and surrounding
/// whitespace.
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl DriverRegistry {
    /// Registry without any drivers.
    pub fn empty() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Every driver compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "sqlite")]
        registry.register(sqlite::SqliteDriver);
        #[cfg(feature = "postgres")]
        registry.register(postgres::PostgresDriver);
        #[cfg(feature = "mssql")]
        registry.register(mssql::MssqlDriver);
        registry
    }

    /// Add `driver`, replacing any driver with the same name.
    pub fn register<D: Driver + 'static>(&mut self, driver: D) {
        self.drivers.retain(|d| d.name() != driver.name());
        self.drivers.push(Box::new(driver));
    }

    pub fn get(&self, id: &str) -> Result<&dyn Driver, EngineError> {
        let id = id.trim();
        self.drivers
            .iter()
            .find(|d| {
                d.name().eq_ignore_ascii_case(id)
                    || d.aliases().iter().any(|a| a.eq_ignore_ascii_case(id))
            })
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownDriver(id.to_string()))
    }

    pub fn execute(
        &self,
        driver: &str,
        connection: &str,
        sql: &str,
    ) -> Result<QueryResult, EngineError> {
        let adapter = self.get(driver)?;
        debug!(driver = adapter.name(), "dispatching query");
        adapter.execute(connection, sql)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
