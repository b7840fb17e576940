//! One-time schema setup shared by concurrent callers.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use sqlx::SqliteConnection;

use crate::{Database, TaskStoreError, TaskStoreResult};

/// Resolves to whether the attempt issued the table's DDL.
type SetupFuture = Shared<BoxFuture<'static, Result<bool, String>>>;

enum InitState {
    Uninitialized,
    Initializing(SetupFuture),
    Ready,
    Failed(String),
}

/// Tracks whether a table's schema has been set up.
///
/// The first caller starts the setup future; callers arriving while it runs
/// await the same future. A failed attempt is remembered only until the next
/// call, which starts over.
pub struct SchemaInit {
    table: &'static str,
    state: Mutex<InitState>,
    attempts: AtomicUsize,
    tables_created: AtomicUsize,
}

impl SchemaInit {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            state: Mutex::new(InitState::Uninitialized),
            attempts: AtomicUsize::new(0),
            tables_created: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true once setup has succeeded.
    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), InitState::Ready)
    }

    /// Message of the last failed attempt, if the most recent one failed.
    pub fn last_error(&self) -> Option<String> {
        match &*self.lock() {
            InitState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Number of setup futures started so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of attempts that actually executed `CREATE TABLE`.
    pub fn tables_created(&self) -> usize {
        self.tables_created.load(Ordering::SeqCst)
    }

    /// Runs `setup` unless it already succeeded or is running.
    pub async fn run<F, Fut>(&self, setup: F) -> TaskStoreResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, String>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            match &*state {
                InitState::Ready => return Ok(()),
                InitState::Initializing(pending) => pending.clone(),
                InitState::Uninitialized | InitState::Failed(_) => {
                    self.attempts.fetch_add(1, Ordering::SeqCst);
                    let pending = setup().boxed().shared();
                    *state = InitState::Initializing(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        {
            let mut state = self.lock();
            // Only the attempt that was awaited may settle the state.
            if let InitState::Initializing(current) = &*state {
                if current.ptr_eq(&pending) {
                    *state = match &result {
                        Ok(created) => {
                            if *created {
                                self.tables_created.fetch_add(1, Ordering::SeqCst);
                            }
                            InitState::Ready
                        }
                        Err(message) => InitState::Failed(message.clone()),
                    };
                }
            }
        }

        match result {
            Ok(_) => Ok(()),
            Err(message) => {
                tracing::warn!(table = self.table, error = %message, "Schema setup failed");
                Err(TaskStoreError::Initialization {
                    table: self.table,
                    message,
                })
            }
        }
    }
}

/// Issues `ddl` unless the schema catalog already lists `table`.
///
/// The catalog check and the DDL run on one connection inside
/// `BEGIN IMMEDIATE`, so other connections and other processes sharing the
/// file wait for the write lock instead of racing to create the table.
/// Returns whether the table was created.
pub async fn create_table_if_missing(
    db: &Database,
    table: &'static str,
    ddl: &'static str,
) -> Result<bool, sqlx::Error> {
    let mut conn = db.pool().acquire().await?;

    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    let outcome = match create_locked(&mut conn, table, ddl).await {
        Ok(created) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| created),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(created) => {
            if created {
                tracing::info!(table, "Created table");
            } else {
                tracing::debug!(table, "Table already exists");
            }
            Ok(created)
        }
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::debug!(table, error = %rollback, "Rollback after failed schema setup");
            }
            Err(e)
        }
    }
}

async fn create_locked(
    conn: &mut SqliteConnection,
    table: &'static str,
    ddl: &'static str,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
    if count > 0 {
        return Ok(false);
    }

    sqlx::query(ddl).execute(&mut *conn).await?;
    Ok(true)
}
