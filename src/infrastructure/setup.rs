//! karma-sync setup and wiring
//!
//! Handles project initialization including:
//! - Configuration directory creation
//! - Default config file creation
//! - Database migrations
//!
//! and builds the service graph the CLI runs against.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::cache::CachedPlayerRepository;
use crate::adapters::sqlite::{initialize_database, PoolConfig, SqlitePlayerRepository};
use crate::adapters::upstream::{VortexClient, VortexClientConfig};
use crate::domain::models::Config;
use crate::domain::ports::{AccountFetcher, PlayerRepository};
use crate::services::{PlayerDirectory, PlayerSyncCache};

use super::config::CONFIG_DIR;

/// Default configuration template content
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# karma-sync configuration
# Override settings by editing this file, adding .karma/local.yaml, or
# setting environment variables with the KARMA_ prefix
#
# Example environment variables:
#   export KARMA_SYNC__FRESHNESS_TTL_SECS=600
#   export KARMA_UPSTREAM__REGION=NA
#   export KARMA_DATABASE__PATH=/custom/path/karma.db
#   export KARMA_LOGGING__LEVEL=debug

# Database configuration
database:
  # Path to SQLite database file (project-local)
  path: ".karma/karma.db"

  # Maximum number of database connections in pool
  max_connections: 10

# Logging configuration
logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Log format: json, pretty
  format: "json"

  # Number of days to retain log files
  retention_days: 30

# Player record freshness
sync:
  # Records older than this many seconds are refreshed from upstream
  freshness_ttl_secs: 3600

  # Upper bound on a single upstream fetch, in milliseconds
  fetch_timeout_ms: 10000

# Upstream account API
upstream:
  # Region: EU, NA, CIS (or RU), ASIA
  region: "EU"

  # Application id for the public account search API
  application_id: ""

# Upstream rate limiting
rate_limit:
  # Requests per second allowed
  requests_per_second: 10.0

  # Burst size for token bucket algorithm
  burst_size: 20

# Retry policy for transient upstream failures
retry:
  # Initial backoff delay in milliseconds
  initial_backoff_ms: 200

  # Maximum backoff delay in milliseconds
  max_backoff_ms: 2000

  # Give up retrying after this many milliseconds
  max_elapsed_ms: 8000

# In-memory read cache in front of the database
cache:
  enabled: false
  max_capacity: 10000
"#;

/// Setup paths and directories
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
    pub logs_dir: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::for_root(current_dir))
    }

    /// Setup paths rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join(CONFIG_DIR);

        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("karma.db"),
            logs_dir: config_dir.join("logs"),
            config_dir,
            root,
        }
    }

    /// Check if the project is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root).unwrap_or(path).display().to_string()
    }
}

/// What [`initialize_project`] did.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SetupReport {
    pub directories_created: Vec<String>,
    pub config_written: bool,
    pub migrations_applied: usize,
}

/// Create the configuration directories
pub fn create_config_dirs(paths: &SetupPaths) -> Result<Vec<String>> {
    let mut created = Vec::new();
    for dir in [&paths.config_dir, &paths.logs_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            created.push(paths.relative(dir));
        }
    }
    Ok(created)
}

/// Create the default configuration file
///
/// Returns whether the file was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;

    Ok(true)
}

/// Run database migrations
///
/// With `force` an existing database file is deleted first.
pub async fn run_migrations(paths: &SetupPaths, force: bool) -> Result<usize> {
    if force && paths.database_file.exists() {
        fs::remove_file(&paths.database_file).context("Failed to remove existing database")?;
    }

    let db_url = format!("sqlite:{}", paths.database_file.display());
    let pool = initialize_database(&db_url, Some(PoolConfig { max_connections: 1, ..PoolConfig::default() }))
        .await
        .context("Failed to initialize database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(&pool)
        .await
        .context("Failed to read migration history")?;
    pool.close().await;

    Ok(usize::try_from(applied).unwrap_or_default())
}

/// Create `.karma/`, the default config and the database under `paths.root`.
pub async fn initialize_project(paths: &SetupPaths, force: bool) -> Result<SetupReport> {
    let directories_created = create_config_dirs(paths)?;
    let config_written = create_config_file(paths, force)?;
    let migrations_applied = run_migrations(paths, force).await?;

    tracing::info!(
        root = %paths.root.display(),
        config_written,
        migrations_applied,
        "project initialized"
    );

    Ok(SetupReport {
        directories_created,
        config_written,
        migrations_applied,
    })
}

/// Services wired from a loaded [`Config`].
pub struct AppContext {
    pub sync: PlayerSyncCache,
    pub directory: PlayerDirectory,
}

impl AppContext {
    /// Open the database and build the upstream client.
    pub async fn build(config: &Config) -> Result<Self> {
        let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
            .await
            .context("Failed to initialize database. Run 'karma-sync init' first.")?;

        let sqlite = Arc::new(SqlitePlayerRepository::new(pool));
        let store: Arc<dyn PlayerRepository> = if config.cache.enabled {
            Arc::new(CachedPlayerRepository::with_capacity(sqlite, config.cache.max_capacity))
        } else {
            sqlite
        };

        let client_config = VortexClientConfig::from_config(config).context("Invalid upstream configuration")?;
        let fetcher: Arc<dyn AccountFetcher> =
            Arc::new(VortexClient::new(client_config).context("Failed to build upstream client")?);

        Ok(Self::from_parts(store, fetcher, config))
    }

    /// Wire services over already-built adapters.
    pub fn from_parts(store: Arc<dyn PlayerRepository>, fetcher: Arc<dyn AccountFetcher>, config: &Config) -> Self {
        Self {
            sync: PlayerSyncCache::new(store.clone(), fetcher.clone(), &config.sync),
            directory: PlayerDirectory::new(store, fetcher),
        }
    }
}
