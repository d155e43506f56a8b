use std::sync::{Mutex, MutexGuard, TryLockError};

use tracing::{debug, info};

use crate::config::ConnectionParameters;
use crate::driver::{Driver, NativeConnection};
use crate::error::MysqlScopedError;
use crate::scoped::{ExclusiveHandle, SharedHandle};

type DriverInit<D> = Box<dyn Fn() -> Result<D, MysqlScopedError> + Send + Sync>;

/// Opens schema-bound connections through one shared driver handle.
///
/// The driver is created lazily on the first connect and reused for every
/// later one. Retrieving the driver and opening the connection happen under a
/// single mutex; selecting the schema happens after the lock is released,
/// on the new connection only.
pub struct ConnectionFactory<D: Driver> {
    driver: Mutex<Option<D>>,
    init: DriverInit<D>,
}

impl<D: Driver> std::fmt::Debug for ConnectionFactory<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("driver_initialized", &self.is_driver_initialized())
            .finish_non_exhaustive()
    }
}

impl<D: Driver> ConnectionFactory<D> {
    /// Factory whose driver is built by `init` on first use.
    #[must_use]
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Result<D, MysqlScopedError> + Send + Sync + 'static,
    {
        Self {
            driver: Mutex::new(None),
            init: Box::new(init),
        }
    }

    /// Factory around an already constructed driver.
    #[must_use]
    pub fn with_driver(driver: D) -> Self {
        Self {
            driver: Mutex::new(Some(driver)),
            init: Box::new(|| {
                Err(MysqlScopedError::Other(
                    "driver handle was released and cannot be rebuilt".into(),
                ))
            }),
        }
    }

    #[must_use]
    pub fn is_driver_initialized(&self) -> bool {
        self.lock_driver().is_some()
    }

    /// True while some thread holds the driver lock, i.e. is retrieving the
    /// driver or opening a connection through it.
    #[must_use]
    pub fn is_connect_in_progress(&self) -> bool {
        matches!(self.driver.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Open a connection owned by exactly one handle.
    ///
    /// # Errors
    /// Propagates the driver's error from opening the connection or selecting
    /// the schema. Nothing is retried.
    pub fn connect_exclusive(
        &self,
        params: &ConnectionParameters,
    ) -> Result<ExclusiveHandle<D::Connection>, MysqlScopedError> {
        self.open_bound(params).map(Box::new)
    }

    /// Open a connection owned by reference-counted handles.
    ///
    /// Clones may live on several threads only if the caller serializes
    /// statement execution on them.
    ///
    /// # Errors
    /// Propagates the driver's error from opening the connection or selecting
    /// the schema. Nothing is retried.
    pub fn connect_shared(
        &self,
        params: &ConnectionParameters,
    ) -> Result<SharedHandle<D::Connection>, MysqlScopedError> {
        self.open_bound(params).map(SharedHandle::new)
    }

    fn open_bound(&self, params: &ConnectionParameters) -> Result<D::Connection, MysqlScopedError> {
        let conn = {
            let mut guard = self.lock_driver();
            if guard.is_none() {
                info!("initializing driver handle");
                *guard = Some((self.init)()?);
            }
            let Some(driver) = guard.as_mut() else {
                return Err(MysqlScopedError::Other("driver handle unavailable".into()));
            };
            debug!(host = %params.host, user = %params.user, "opening connection");
            driver.connect(&params.host, params.port, &params.user, &params.password)?
        };

        // On failure `conn` drops here, closing the half-configured session.
        conn.set_schema(&params.schema)?;
        debug!(schema = %params.schema, "connection bound to schema");
        Ok(conn)
    }

    fn lock_driver(&self) -> MutexGuard<'_, Option<D>> {
        // A panic inside the driver leaves the handle itself usable.
        match self.driver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(feature = "mysql")]
mod native {
    use std::sync::LazyLock;

    use super::ConnectionFactory;
    use crate::mysql::MysqlDriver;

    static INSTANCE: LazyLock<ConnectionFactory<MysqlDriver>> =
        LazyLock::new(ConnectionFactory::mysql);

    impl ConnectionFactory<MysqlDriver> {
        /// Factory for the native MySQL driver, for composition roots that own it.
        #[must_use]
        pub fn mysql() -> Self {
            Self::new(|| Ok(MysqlDriver::new()))
        }

        /// Process-wide factory for the native MySQL driver, created on first
        /// use and kept until exit.
        #[must_use]
        pub fn instance() -> &'static Self {
            &INSTANCE
        }
    }

}
