use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{debug, info};

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(
        database_url: &str,
        pool_size: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    /// Applies every pending `*.sql` file in `dir`, in lexical filename
    /// order. Each file runs in its own transaction together with its
    /// `schema_migrations` ledger row, so a file is applied at most once.
    pub async fn run_migrations(&self, dir: &Path) -> anyhow::Result<usize> {
        info!("Running database migrations from {}", dir.display());

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .context("create schema_migrations")?;

        let mut applied = 0;
        for (version, path) in migration_files(dir)? {
            let already: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = $1)",
            )
            .bind(&version)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("check migration {version}"))?;

            if already {
                debug!(version = %version, "migration already applied");
                continue;
            }

            let sql = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read migration {}", path.display()))?;

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(&sql)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("apply migration {version}"))?;
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES ($1, now())")
                .bind(&version)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("record migration {version}"))?;
            tx.commit().await?;

            info!(version = %version, "migration applied");
            applied += 1;
        }

        info!("Migrations completed, {} applied", applied);
        Ok(applied)
    }
}

/// Lists `(file name, path)` for every `.sql` file directly inside `dir`,
/// sorted by file name. Subdirectories and other files are ignored.
pub fn migration_files(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read migrations dir {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.ends_with(".sql") {
            files.push((name, entry.path()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
