//! Process-wide SQLite handle
//!
//! One connection guarded by a mutex. `close()` takes the connection out, so
//! every later call fails with a `Closed` error instead of touching a dead
//! handle.
//!
//! Calls made under an [`OpContext`] never outlive it: waiting for the
//! connection gives up once the context is done, and a running statement is
//! interrupted through SQLite's progress handler.

use std::os::raw::c_int;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use rusqlite::{Connection, Transaction};
use tracing::{debug, error, info};

use crate::context::OpContext;
use crate::error::{Result, StorageError};

pub struct Database {
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            StorageError::from(err).context(format!("failed to open {}", path.display()))
        })?;
        info!(path = %path.display(), "opened SQLite database");
        Ok(Self::from_connection(conn))
    }

    /// In-memory database (tests, throwaway runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("opened in-memory SQLite database");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Run `f` against the connection with no context (schema setup).
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock()?;
        let conn = guard.as_ref().ok_or_else(|| StorageError::closed("database"))?;
        f(conn)
    }

    /// Run `f` outside of any explicit transaction, bounded by `ctx`.
    ///
    /// Fails with the context's error when it is done before `f` returns,
    /// even if the statements themselves went through.
    pub fn run<T>(
        &self,
        ctx: &OpContext,
        operation: &str,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let guard = self.acquire(ctx, operation)?;
        let conn = guard.as_ref().ok_or_else(|| StorageError::closed("database"))?;

        watch(conn, ctx);
        let result = f(conn);
        unwatch(conn);

        finish(ctx, operation, result)
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` succeeds and the context is still live, rolls back
    /// otherwise. A failing rollback is logged and the original error is
    /// returned.
    pub fn in_transaction<T>(
        &self,
        ctx: &OpContext,
        operation: &str,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.acquire(ctx, operation)?;
        let conn = guard.as_mut().ok_or_else(|| StorageError::closed("database"))?;
        let tx = conn.transaction().map_err(|err| {
            StorageError::transaction(format!("failed to begin {}: {}", operation, err))
                .with_source(err)
        })?;

        watch(&tx, ctx);
        let result = f(&tx);
        // commit and rollback must not be interrupted
        unwatch(&tx);

        let value = match finish(ctx, operation, result) {
            Ok(value) => value,
            Err(err) => {
                rollback(tx, operation);
                return Err(err);
            }
        };

        tx.commit().map_err(|err| {
            StorageError::transaction(format!("failed to commit {}: {}", operation, err))
                .with_source(err)
        })?;
        Ok(value)
    }

    /// Lock the connection, giving up as soon as `ctx` is done.
    fn acquire(
        &self,
        ctx: &OpContext,
        operation: &str,
    ) -> Result<MutexGuard<'_, Option<Connection>>> {
        loop {
            ctx.check(operation)?;
            match self.conn.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => std::thread::sleep(LOCK_POLL_INTERVAL),
                Err(TryLockError::Poisoned(err)) => return Err(err.into()),
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        match self.conn.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }

    /// Release the connection. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock()?;
        if let Some(conn) = guard.take() {
            if let Err((conn, err)) = conn.close() {
                *guard = Some(conn);
                return Err(StorageError::from(err).context("failed to close database"));
            }
            info!("closed SQLite database");
        }
        Ok(())
    }
}

/// Pause between two attempts to take a busy connection
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// SQLite virtual machine steps between two context checks
const PROGRESS_STEPS: c_int = 1_000;

/// Interrupt running statements once `ctx` is done.
fn watch(conn: &Connection, ctx: &OpContext) {
    let ctx = AssertUnwindSafe(ctx.clone());
    conn.progress_handler(PROGRESS_STEPS, Some(move || ctx.is_done()));
}

fn unwatch(conn: &Connection) {
    conn.progress_handler(0, None::<fn() -> bool>);
}

/// The context's error wins over the outcome of work it outlived; an
/// interrupted statement surfaces as `Cancelled` or `DeadlineExceeded`.
fn finish<T>(ctx: &OpContext, operation: &str, result: Result<T>) -> Result<T> {
    ctx.check(operation)?;
    result
}

fn rollback(tx: Transaction<'_>, operation: &str) {
    match tx.rollback() {
        Ok(()) => debug!(operation, "rolled back transaction"),
        Err(err) => error!(operation, error = %err, "failed to roll back transaction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::{mpsc, Arc};
    use std::time::Instant;

    fn counter_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute("CREATE TABLE counter (value INTEGER)", [])?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn rows(db: &Database) -> i64 {
        db.with_connection(|conn| {
            Ok(conn.query_row("SELECT count(*) FROM counter", [], |row| row.get(0))?)
        })
        .unwrap()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transaction Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_commit_on_success() {
        let db = counter_db();
        let ctx = OpContext::background();
        let value = db
            .in_transaction(&ctx, "insert", |tx| {
                tx.execute("INSERT INTO counter (value) VALUES (1)", [])?;
                Ok(7)
            })
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(rows(&db), 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let db = counter_db();
        let ctx = OpContext::background();
        let err = db
            .in_transaction(&ctx, "insert", |tx| -> Result<()> {
                tx.execute("INSERT INTO counter (value) VALUES (1)", [])?;
                Err(StorageError::invalid_value("boom"))
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_rollback_when_cancelled_during_work() {
        let db = counter_db();
        let ctx = OpContext::background();
        let err = db
            .in_transaction(&ctx, "insert", |tx| {
                tx.execute("INSERT INTO counter (value) VALUES (1)", [])?;
                ctx.cancel();
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(rows(&db), 0);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Deadline & Interrupt Tests
    // ═══════════════════════════════════════════════════════════════════════

    const ENDLESS_COUNT: &str = "WITH RECURSIVE n(x) AS (
             SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 10000000000
         )
         SELECT count(*) FROM n";

    #[test]
    fn test_run_within_deadline() {
        let db = counter_db();
        let ctx = OpContext::with_timeout(Duration::from_secs(30));
        let count = db
            .run(&ctx, "count", |conn| {
                let count: i64 =
                    conn.query_row("SELECT count(*) FROM counter", [], |row| row.get(0))?;
                Ok(count)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_deadline_interrupts_running_statement() {
        let db = counter_db();
        let ctx = OpContext::with_timeout(Duration::from_millis(50));

        let start = Instant::now();
        let err = db
            .run(&ctx, "endless count", |conn| {
                Ok(conn.query_row(ENDLESS_COUNT, [], |row| row.get::<_, i64>(0))?)
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
        assert!(start.elapsed() < Duration::from_secs(5), "{:?}", start.elapsed());

        // the handler is gone once the call returns
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_cancel_interrupts_transaction() {
        let db = Arc::new(counter_db());
        let ctx = OpContext::background();

        let canceller = {
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                ctx.cancel();
            })
        };

        let err = db
            .in_transaction(&ctx, "endless insert", |tx| {
                tx.execute("INSERT INTO counter (value) VALUES (1)", [])?;
                tx.query_row(ENDLESS_COUNT, [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .unwrap_err();
        canceller.join().unwrap();

        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_busy_connection_wait_ends_at_deadline() {
        let db = Arc::new(counter_db());
        let (started_tx, started_rx) = mpsc::channel();

        let holder = {
            let db = db.clone();
            std::thread::spawn(move || {
                db.in_transaction(&OpContext::background(), "hold", |tx| {
                    tx.execute("INSERT INTO counter (value) VALUES (1)", [])?;
                    started_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(800));
                    Ok(())
                })
                .unwrap();
            })
        };
        started_rx.recv().unwrap();

        let start = Instant::now();
        let ctx = OpContext::with_timeout(Duration::from_millis(50));
        let err = db.run(&ctx, "count", |_| Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
        assert!(start.elapsed() < Duration::from_millis(600), "{:?}", start.elapsed());

        let ctx = OpContext::with_timeout(Duration::from_millis(50));
        let err = db.in_transaction(&ctx, "insert", |_| Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);

        holder.join().unwrap();
        assert_eq!(rows(&db), 1);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_use_after_close() {
        let db = counter_db();
        db.close().unwrap();
        assert!(db.is_closed());

        let err = db.with_connection(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Closed);

        let err = db
            .in_transaction(&OpContext::background(), "insert", |_| Ok(()))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Closed);

        // second close is a no-op
        db.close().unwrap();
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miam.db");

        let db = Database::open(&path).unwrap();
        db.with_connection(|conn| {
            conn.execute("CREATE TABLE t (v TEXT)", [])?;
            conn.execute("INSERT INTO t (v) VALUES ('riz')", [])?;
            Ok(())
        })
        .unwrap();
        db.close().unwrap();

        let reopened = Database::open(&path).unwrap();
        let value: String = reopened
            .with_connection(|conn| Ok(conn.query_row("SELECT v FROM t", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(value, "riz");
    }
}
