//! The single logical connection to the store.
//!
//! [`ConnectionContext`] never keeps a handle open between calls. Every
//! execution locks the context, opens the store file, runs, and closes the
//! handle again on every exit path, including unwinding. The lock
//! serializes callers, so at most one statement runs at a time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use record_store_db::StoreConfig;
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior, params_from_iter};
use tracing::{debug, trace, warn};

use crate::convert::{ResultRow, from_value_ref, to_sql_value};
use crate::error::{Result, StoreError};
use crate::query::Statement;

/// How a statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Collect result rows.
    Query,
    /// Report the affected-row count.
    NonQuery,
}

/// Outcome of a statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// Rows returned by a [`ExecMode::Query`] execution.
    Rows(Vec<ResultRow>),
    /// Rows changed by a [`ExecMode::NonQuery`] execution.
    Affected(usize),
}

impl Execution {
    /// Returns the rows, or an empty list for a non-query outcome.
    pub fn into_rows(self) -> Vec<ResultRow> {
        match self {
            Execution::Rows(rows) => rows,
            Execution::Affected(_) => Vec::new(),
        }
    }

    /// Returns the affected-row count, or the row count for a query.
    pub fn affected(&self) -> usize {
        match self {
            Execution::Rows(rows) => rows.len(),
            Execution::Affected(n) => *n,
        }
    }
}

/// Owns the one connection slot of a store.
///
/// # Examples
///
/// ```no_run
/// use record_store_sqlite::{ConnectionContext, Statement};
/// use std::time::Duration;
///
/// let ctx = ConnectionContext::new("Database/records.sqlite", Duration::from_secs(5));
/// let rows = ctx.query(&Statement::new("SELECT * FROM Item WHERE 1=1")).unwrap();
/// println!("{} rows", rows.len());
/// assert!(!ctx.is_open());
/// ```
#[derive(Debug)]
pub struct ConnectionContext {
    path: PathBuf,
    busy_timeout: Duration,
    slot: Mutex<Option<Connection>>,
}

impl ConnectionContext {
    /// Creates a context for the store file at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
            slot: Mutex::new(None),
        }
    }

    /// Creates a context for the store file named by `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.file_path(), config.busy_timeout())
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executes one statement in its own open/close scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the file cannot be opened or the
    /// statement fails.
    pub fn execute(&self, statement: &Statement, mode: ExecMode) -> Result<Execution> {
        self.scoped(|conn| match mode {
            ExecMode::Query => run_query(conn, statement).map(Execution::Rows),
            ExecMode::NonQuery => run_non_query(conn, statement).map(Execution::Affected),
        })
    }

    /// Executes a statement and collects its rows.
    pub fn query(&self, statement: &Statement) -> Result<Vec<ResultRow>> {
        self.execute(statement, ExecMode::Query)
            .map(Execution::into_rows)
    }

    /// Executes a statement and returns the affected-row count.
    pub fn non_query(&self, statement: &Statement) -> Result<usize> {
        self.execute(statement, ExecMode::NonQuery)
            .map(|outcome| outcome.affected())
    }

    /// Runs `f` inside one transaction on one open handle.
    ///
    /// The transaction takes the write lock up front (`BEGIN IMMEDIATE`),
    /// commits if `f` succeeds, and rolls back otherwise. Other callers
    /// wait until it finishes.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        self.scoped(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
    }

    /// Returns `true` while a handle is held, that is during an execution.
    pub fn is_open(&self) -> bool {
        match self.slot.try_lock() {
            Ok(slot) => slot.is_some(),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
        }
    }

    /// A caller that panicked left the slot empty (the drop guard closes the
    /// handle while unwinding), so a poisoned lock is safe to take over.
    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            warn!("store connection lock poisoned by a panicked caller, recovering");
            self.slot.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    fn scoped<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut slot = self.lock();
        let handle = OpenHandle(&mut *slot);
        let conn = handle.0.insert(self.open()?);
        let out = f(conn);
        drop(handle);
        out
    }
}

/// Closes the handle in the slot when dropped.
struct OpenHandle<'a>(&'a mut Option<Connection>);

impl Drop for OpenHandle<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.0.take() {
            if let Err((_, err)) = conn.close() {
                warn!(error = %err, "failed to close store connection");
            }
        }
    }
}

pub(crate) fn run_query(conn: &Connection, statement: &Statement) -> Result<Vec<ResultRow>> {
    log_statement(statement);
    let mut prepared = conn.prepare(statement.sql())?;
    let columns: Arc<[String]> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = prepared.query(params_from_iter(statement.params().iter().map(to_sql_value)))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let values = (0..columns.len())
            .map(|idx| row.get_ref(idx).map(from_value_ref))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        out.push(ResultRow::new(Arc::clone(&columns), values));
    }
    Ok(out)
}

pub(crate) fn run_non_query(conn: &Connection, statement: &Statement) -> Result<usize> {
    log_statement(statement);
    Ok(conn.execute(
        statement.sql(),
        params_from_iter(statement.params().iter().map(to_sql_value)),
    )?)
}

fn log_statement(statement: &Statement) {
    debug!(sql = statement.sql(), params = statement.params().len(), "executing statement");
    trace!(statement = %statement.display_sql(), "bound statement");
}

#[cfg(test)]
mod tests {
    use record_store_core::FieldValue;

    use super::*;

    fn store() -> (tempfile::TempDir, ConnectionContext) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE Item ( Id integer PRIMARY KEY, Action integer )")
            .unwrap();
        let ctx = ConnectionContext::new(path, Duration::from_millis(500));
        (dir, ctx)
    }

    fn insert(id: i64, action: i64) -> Statement {
        Statement::with_params(
            "INSERT INTO Item VALUES (?1,?2)",
            vec![FieldValue::Integer(id), FieldValue::Integer(action)],
        )
    }

    #[test]
    fn test_non_query_then_query() {
        let (_dir, ctx) = store();
        assert_eq!(ctx.non_query(&insert(1, 5)).unwrap(), 1);

        let rows = ctx
            .query(&Statement::new("SELECT * FROM Item WHERE 1=1"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), &["Id".to_string(), "Action".to_string()]);
        assert_eq!(rows[0].get("Action"), Some(&FieldValue::Integer(5)));
    }

    #[test]
    fn test_handle_closed_between_calls() {
        let (_dir, ctx) = store();
        assert!(!ctx.is_open());
        ctx.non_query(&insert(1, 5)).unwrap();
        assert!(!ctx.is_open());
    }

    #[test]
    fn test_failure_releases_handle() {
        let (_dir, ctx) = store();
        let err = ctx
            .query(&Statement::new("SELECT * FROM Missing"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(!ctx.is_open());
        assert_eq!(ctx.non_query(&insert(2, 1)).unwrap(), 1);
    }

    #[test]
    fn test_transaction_takes_write_lock_up_front() {
        let (_dir, ctx) = store();
        ctx.with_transaction(|_tx| {
            // Nothing has run yet, but a second writer is already shut out.
            let other = Connection::open(ctx.path()).unwrap();
            other.busy_timeout(Duration::ZERO).unwrap();
            assert!(other.execute_batch("BEGIN IMMEDIATE").is_err());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_panic_in_transaction_rolls_back_and_recovers() {
        let (_dir, ctx) = store();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<()> = ctx.with_transaction(|tx| {
                run_non_query(tx, &insert(4, 1))?;
                panic!("caller bug");
            });
        }));
        assert!(outcome.is_err());
        assert!(!ctx.is_open());

        let rows = ctx
            .query(&Statement::new("SELECT * FROM Item WHERE 1=1"))
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(ctx.non_query(&insert(4, 2)).unwrap(), 1);
    }

    #[test]
    fn test_missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sqlite");
        let ctx = ConnectionContext::new(&path, Duration::from_millis(100));
        assert!(matches!(
            ctx.query(&Statement::new("SELECT 1")),
            Err(StoreError::Storage(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_execute_modes() {
        let (_dir, ctx) = store();
        let outcome = ctx.execute(&insert(3, 3), ExecMode::NonQuery).unwrap();
        assert_eq!(outcome, Execution::Affected(1));
        let outcome = ctx
            .execute(&Statement::new("SELECT * FROM Item WHERE 1=1"), ExecMode::Query)
            .unwrap();
        assert_eq!(outcome.affected(), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (_dir, ctx) = store();
        let result: Result<()> = ctx.with_transaction(|tx| {
            run_non_query(tx, &insert(7, 1))?;
            run_non_query(tx, &insert(7, 2))?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Storage(_))));
        let rows = ctx
            .query(&Statement::new("SELECT * FROM Item WHERE 1=1"))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_transaction_commits() {
        let (_dir, ctx) = store();
        let inserted = ctx
            .with_transaction(|tx| run_non_query(tx, &insert(8, 1)))
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(
            ctx.query(&Statement::new("SELECT * FROM Item WHERE 1=1"))
                .unwrap()
                .len(),
            1
        );
    }
}
