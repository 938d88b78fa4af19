use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::{Row, SqlitePool};

#[derive(Parser, Debug)]
#[command(author, version, about = "learnhub maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty reversible migration pair with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Create the admin account, or confirm it already exists
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let (up, down) = make_migration_files(&name)?;
            println!("Created migration: {}", up.display());
            println!("Created migration: {}", down.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            get_migrator().await?.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            let applied = applied_versions(&pool).await?;
            let target = applied.iter().max().copied().context("no migrations to roll back")?;
            let previous = applied.iter().filter(|v| **v < target).max().copied().unwrap_or(0);
            migrator.undo(&pool, previous).await?;
            println!("Rolled back migration {}", target);
        }
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => {
            let pool = get_pool().await?;
            get_migrator().await?.run(&pool).await?;
            let admin = learnhub::services::users::ensure_admin(&pool, &username, &email, &password).await?;
            println!("Admin account ready: {} (id {})", admin.username, admin.id);
        }
    }

    Ok(())
}

fn make_migration_files(name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let stem = format!("{}_{}", timestamp, sanitize_name(name));
    let up = Path::new("migrations").join(format!("{stem}.up.sql"));
    let down = Path::new("migrations").join(format!("{stem}.down.sql"));

    if up.exists() || down.exists() {
        anyhow::bail!("migration already exists: {}", stem);
    }

    fs::write(&up, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", up.display()))?;
    fs::write(&down, "-- Revert the matching .up.sql here\n")
        .with_context(|| format!("failed to create migration at {}", down.display()))?;

    Ok((up, down))
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    learnhub::db::connect(&database_url).await
}

async fn applied_versions(pool: &SqlitePool) -> anyhow::Result<HashSet<i64>> {
    let table: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;
    if table.is_none() {
        return Ok(HashSet::new());
    }

    let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect())
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    let applied = applied_versions(pool).await?;

    println!("{:<8} {:<16} Name", "Status", "Version");
    for migration in migrator.iter().filter(|m| m.migration_type.is_up_migration()) {
        let status = if applied.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<16} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", display))
}
