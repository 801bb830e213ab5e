//! Implementation of the `taskchat migrate` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::sqlite::{all_embedded_migrations, create_pool, Migrator, PoolConfig};
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Serialize)]
pub struct MigrateOutput {
    pub database: String,
    pub schema_version: i64,
}

impl CommandOutput for MigrateOutput {
    fn to_human(&self) -> String {
        format!("Database {} is at schema version {}", self.database, self.schema_version)
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    let url = config.database.url();

    let pool = create_pool(&url, Some(PoolConfig {
        max_connections: config.database.max_connections,
        ..PoolConfig::default()
    }))
    .await
    .context("Failed to open database")?;

    let migrator = Migrator::new(pool.clone());
    migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .context("Failed to apply migrations")?;
    let schema_version = migrator.get_current_version().await.context("Failed to read schema version")?;
    pool.close().await;

    output(&MigrateOutput { database: config.database.path, schema_version }, json_mode);
    Ok(())
}
