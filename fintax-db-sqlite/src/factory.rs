use std::path::{Path, PathBuf};

use async_trait::async_trait;

use fintax_core::db::repository::{IncomeRepository, RepositoryError};
use fintax_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime.
///
/// Resolution order:
/// 1. **`FINTAX_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if it exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** for runs from the build tree.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FINTAX_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use fintax_core::db::RepositoryRegistry;
/// use fintax_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, then
    /// migrate and seed it.
    ///
    /// Accepted values are a bare file path (created if missing), a sqlx
    /// URL such as `sqlite:fintax.db`, or `:memory:`.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn IncomeRepository>, RepositoryError> {
        let repo = open(&config.connection_string, &seeds_dir()).await?;
        Ok(Box::new(repo))
    }
}

/// Connects, migrates, and seeds from `seeds` when that directory exists.
///
/// A missing seeds directory leaves the store unseeded; callers then fall
/// back to built-in policies. A directory that exists but cannot be
/// applied is still an error.
async fn open(
    connection_string: &str,
    seeds: &Path,
) -> Result<SqliteRepository, RepositoryError> {
    let repo = SqliteRepository::new(connection_string)
        .await
        .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
    repo.run_migrations()
        .await
        .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

    if seeds.is_dir() {
        repo.run_seeds(seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
    } else {
        tracing::warn!(seeds = %seeds.display(), "seeds directory not found, skipping seed data");
    }

    tracing::info!(
        connection = %connection_string,
        seeds = %seeds.display(),
        "sqlite repository ready"
    );
    Ok(repo)
}
