use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{BehaviorRules, DeletePolicy};

pub mod migrator;
pub mod repositories;

pub use repositories::behavior::BehaviorRepository;
pub use repositories::user::UserRepository;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide handle on the database pool.
///
/// Opening a store creates the database file if needed and applies the schema.
/// Work against it happens through [`Session`]s.
#[derive(Clone)]
pub struct Store {
    conn: DatabaseConnection,
    on_delete: DeletePolicy,
    rules: BehaviorRules,
    open_sessions: Arc<AtomicUsize>,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Self::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        Ok(store.with_policies(config.users.on_delete, config.behavior.clone()))
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path) = sqlite_file_path(db_url) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !path.exists() {
                std::fs::File::create(path).with_context(|| {
                    format!("Failed to create database file: {}", path.display())
                })?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .with_context(|| format!("Failed to connect to {db_url}"))?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply schema")?;

        info!(
            "Database connected & schema applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            on_delete: DeletePolicy::default(),
            rules: BehaviorRules::default(),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[must_use]
    pub fn with_policies(mut self, on_delete: DeletePolicy, rules: BehaviorRules) -> Self {
        self.on_delete = on_delete;
        self.rules = rules;
        self
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Acquire a session. It is released when dropped; repositories borrow
    /// from it and cannot outlive it.
    #[must_use]
    pub fn session(&self) -> Session {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(session = id, open, "Session acquired");

        Session {
            id,
            conn: self.conn.clone(),
            on_delete: self.on_delete,
            rules: self.rules.clone(),
            open_sessions: Arc::clone(&self.open_sessions),
        }
    }

    /// Sessions acquired from this store (or its clones) and not yet released.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Run one unit of work on a fresh session.
    ///
    /// The session moves into `work`'s future, so it is released however that
    /// future ends: success, error or being dropped mid-way.
    pub async fn with_session<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        work(self.session()).await
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Database pool closed");
        Ok(())
    }
}

/// Scoped handle for one unit of work.
pub struct Session {
    id: u64,
    conn: DatabaseConnection,
    on_delete: DeletePolicy,
    rules: BehaviorRules,
    open_sessions: Arc<AtomicUsize>,
}

impl Session {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.conn, self.on_delete)
    }

    #[must_use]
    pub const fn behaviors(&self) -> BehaviorRepository<'_> {
        BehaviorRepository::new(&self.conn, &self.rules)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let open = self.open_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(session = self.id, open, "Session released");
    }
}

/// Filesystem path behind a SQLite URL, or `None` for in-memory databases.
fn sqlite_file_path(db_url: &str) -> Option<&Path> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}
