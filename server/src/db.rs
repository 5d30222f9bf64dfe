use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = include_str!("schema.sql");

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000; PRAGMA foreign_keys=ON;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    /// Read-only access. Anything that writes goes through [`Db::unit_of_work`].
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, rusqlite::Error>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Runs `f` inside one IMMEDIATE transaction.
    ///
    /// Commits only when `f` returns `Ok`. An error, a panic, or the future
    /// driving this call being dropped all roll the transaction back.
    pub fn unit_of_work<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let uow = UnitOfWork { tx };
        let value = f(&uow)?;
        uow.tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-transaction already rolled back on drop, so the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct UnitOfWork<'c> {
    tx: Transaction<'c>,
}

impl UnitOfWork<'_> {
    /// Runs `f` under a savepoint so its writes can be discarded without
    /// aborting the surrounding transaction.
    ///
    /// The outer error is a failure of the savepoint machinery itself and
    /// must abort the unit of work; the inner result is `f`'s own outcome.
    pub fn savepoint<F, T, E>(&self, f: F) -> Result<Result<T, E>, rusqlite::Error>
    where
        F: FnOnce(&Self) -> Result<T, E>,
    {
        self.tx.execute_batch("SAVEPOINT follow_up")?;
        match f(self) {
            Ok(value) => {
                self.tx.execute_batch("RELEASE follow_up")?;
                Ok(Ok(value))
            }
            Err(e) => {
                self.tx
                    .execute_batch("ROLLBACK TO follow_up; RELEASE follow_up")?;
                Ok(Err(e))
            }
        }
    }
}

impl Deref for UnitOfWork<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

pub fn now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// True for primary-key and UNIQUE conflicts, not for other constraint kinds.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
