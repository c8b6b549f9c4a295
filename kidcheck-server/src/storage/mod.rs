pub mod models;
mod presenca;
pub mod schema;

use std::fmt;

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{Crianca, Culto, NewCrianca, NewCulto, Totals};
use tracing::{debug, trace};

pub use presenca::next_codigo;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Records the storage layer can report as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Crianca,
    Culto,
    Presenca,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Crianca => "criança",
            Entity::Culto => "culto",
            Entity::Presenca => "presença",
        })
    }
}

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// A referenced row does not exist.
    #[error("{0} não encontrado(a)")]
    NotFound(Entity),

    /// The write would duplicate an existing row.
    #[error("{0}")]
    Conflict(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Applies the per-connection pragmas once, when r2d2 opens a connection.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_sqlite_conn(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

impl Store {
    /// Opens (creating if needed) the SQLite file at `path` and applies
    /// pending migrations. Each pooled connection is a separate handle, so
    /// `:memory:` is not supported; tests use a temporary file.
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let pool = tokio::task::spawn_blocking(move || -> Result<SqlitePool, StorageError> {
            let manager = ConnectionManager::<SqliteConnection>::new(url);
            let pool = Pool::builder()
                .max_size(8)
                .connection_customizer(Box::new(SqlitePragmas))
                .build(manager)?;
            // Run pending Diesel migrations on startup (auto-init empty DBs)
            let mut conn = pool.get()?;
            conn.run_pending_migrations(MIGRATIONS)
                .map_err(|e| StorageError::Migration(e.to_string()))?;
            Ok(pool)
        })
        .await??;
        debug!(path, "sqlite store ready");
        Ok(Store { pool })
    }

    /// Runs `f` on a pooled connection inside `spawn_blocking`.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    // Children

    pub async fn create_crianca(&self, nova: NewCrianca) -> Result<Crianca, StorageError> {
        use schema::criancas;
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(criancas::table)
                .values(&nova)
                .returning(Crianca::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_criancas(&self) -> Result<Vec<Crianca>, StorageError> {
        use schema::criancas::dsl::*;
        self.with_conn(|conn| {
            Ok(criancas
                .order(nome.asc())
                .select(Crianca::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Case-insensitive substring match on the name. Matching happens in
    /// Rust because SQLite's LIKE only folds ASCII ("JOÃO" vs "joão").
    pub async fn search_criancas(&self, term: &str) -> Result<Vec<Crianca>, StorageError> {
        let needle = term.trim().to_lowercase();
        trace!(%needle, "search_criancas");
        let rows = self.list_criancas().await?;
        Ok(rows
            .into_iter()
            .filter(|c| name_matches(&c.nome, &needle))
            .collect())
    }

    pub async fn get_crianca(&self, crianca_id: i32) -> Result<Option<Crianca>, StorageError> {
        use schema::criancas;
        self.with_conn(move |conn| {
            Ok(criancas::table
                .find(crianca_id)
                .select(Crianca::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Full replacement of the profile; `Ok(None)` when the id is unknown.
    pub async fn update_crianca(
        &self,
        crianca_id: i32,
        changes: NewCrianca,
    ) -> Result<Option<Crianca>, StorageError> {
        use schema::criancas;
        self.with_conn(move |conn| {
            let now = Utc::now().naive_utc();
            Ok(diesel::update(criancas::table.find(crianca_id))
                .set((&changes, criancas::updated_at.eq(now)))
                .returning(Crianca::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    /// Deletes the child and, through the foreign key, its attendance rows.
    pub async fn delete_crianca(&self, crianca_id: i32) -> Result<bool, StorageError> {
        use schema::criancas;
        self.with_conn(move |conn| {
            let deleted = diesel::delete(criancas::table.find(crianca_id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Events

    pub async fn create_culto(&self, novo: NewCulto) -> Result<Culto, StorageError> {
        use schema::cultos;
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(cultos::table)
                .values(&novo)
                .returning(Culto::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    /// Most recent first, then by name.
    pub async fn list_cultos(&self) -> Result<Vec<Culto>, StorageError> {
        use schema::cultos::dsl::*;
        self.with_conn(|conn| {
            Ok(cultos
                .order((data.desc(), nome.asc()))
                .select(Culto::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_culto(&self, culto_id: i32) -> Result<Option<Culto>, StorageError> {
        use schema::cultos;
        self.with_conn(move |conn| {
            Ok(cultos::table
                .find(culto_id)
                .select(Culto::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn update_culto(
        &self,
        culto_id: i32,
        changes: NewCulto,
    ) -> Result<Option<Culto>, StorageError> {
        use schema::cultos;
        self.with_conn(move |conn| {
            let now = Utc::now().naive_utc();
            Ok(diesel::update(cultos::table.find(culto_id))
                .set((&changes, cultos::updated_at.eq(now)))
                .returning(Culto::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn delete_culto(&self, culto_id: i32) -> Result<bool, StorageError> {
        use schema::cultos;
        self.with_conn(move |conn| {
            let deleted = diesel::delete(cultos::table.find(culto_id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Statistics

    pub async fn totals(&self) -> Result<Totals, StorageError> {
        use schema::{criancas, cultos, presenca};
        self.with_conn(|conn| {
            conn.transaction(|conn| -> Result<Totals, StorageError> {
                Ok(Totals {
                    criancas: criancas::table.count().get_result(conn)?,
                    cultos: cultos::table.count().get_result(conn)?,
                    presencas: presenca::table.count().get_result(conn)?,
                })
            })
        })
        .await
    }
}

fn name_matches(nome: &str, needle_lower: &str) -> bool {
    nome.to_lowercase().contains(needle_lower)
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // busy_timeout first so the WAL switch waits on concurrent openers
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    // Cascade deletes from criancas/cultos to presenca depend on this
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}
