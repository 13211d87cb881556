use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use raw_queries::{config, fixtures, queries, Database, DatabaseConfig, Row};

#[derive(Debug, Parser)]
#[command(name = "raw-queries", about = "Run the sample raw SQL queries and print their rows")]
struct Args {
    /// Deployment environment to connect with (falls back to APP_ENV, then development)
    #[arg(long)]
    env: Option<String>,

    /// JSON file mapping environment names to connection settings (falls back to DATABASE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Create and fill the sample tables before querying
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let environment = environment_name(args.env.clone());
    let database_config = DatabaseConfig::load(args.config.as_deref())
        .context("failed to load database config")?;
    let connection = database_config
        .environment(&environment)
        .with_context(|| format!("no connection settings for `{}`", environment))?;

    info!("using {} environment", environment);
    let db = Database::open(connection).context("failed to open database")?;

    let outcome = run(&db, args.seed).await;
    if let Err(e) = &outcome {
        error!("query run failed: {:#}", e);
    }

    db.destroy().await.context("failed to release database")?;
    outcome
}

/// `--env` wins over `APP_ENV`, which wins over `development`.
fn environment_name(flag: Option<String>) -> String {
    flag.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(config::resolve_environment)
}

async fn run(db: &Database, seed: bool) -> Result<()> {
    if seed {
        fixtures::seed(db).await?;
    }

    report("people", &queries::get_people(db).await?)?;
    report("pets", &queries::get_pets(db).await?)?;
    report("pet owners", &queries::get_pet_owners(db).await?)?;
    report("customer orders", &queries::get_customer_orders(db).await?)?;
    report("books with authors", &queries::get_books_with_authors(db).await?)?;
    report("dogs", &queries::get_pets_by_type(db, "dog").await?)?;
    report(
        "Ann Duong's dogs",
        &queries::get_pets_by_owner_name_and_type(db, "Ann Duong", "dog").await?,
    )?;
    report(
        "orders for maria@example.com",
        &queries::get_orders_by_customer_email(db, "maria@example.com").await?,
    )?;
    report(
        "books by Terry Pratchett",
        &queries::get_books_by_author(db, "Terry Pratchett").await?,
    )?;
    report(
        "products under 20.00",
        &queries::get_products_cheaper_than(db, 20.0).await?,
    )?;

    let created = queries::create_pet(db, "Biscuit", "dog", 3).await?;
    report("created pet", created.as_slice())?;

    if let Some(id) = created.as_ref().and_then(|row| row.get("id")).and_then(|v| v.as_i64()) {
        report("renamed pet", &queries::update_pet_name(db, id, "Waffles").await?)?;
        let deleted = queries::delete_pet(db, id).await?;
        report("deleted pet", deleted.as_slice())?;
    }

    Ok(())
}

fn report(label: &str, rows: &[Row]) -> Result<()> {
    info!("{}: {} rows", label, rows.len());
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_takes_priority() {
        assert_eq!(environment_name(Some("production".into())), "production");
        assert_eq!(environment_name(Some(" test ".into())), "test");
    }

    #[test]
    fn parses_command_line() {
        let args = Args::parse_from(["raw-queries", "--env", "test", "--seed"]);
        assert_eq!(args.env.as_deref(), Some("test"));
        assert!(args.config.is_none());
        assert!(args.seed);
    }

    #[tokio::test]
    async fn seeded_run_succeeds_and_releases() {
        let db = Database::open_in_memory().unwrap();

        run(&db, true).await.unwrap();

        db.destroy().await.unwrap();
        assert!(!db.is_open().await);
    }

    #[tokio::test]
    async fn failed_run_still_releases() {
        let db = Database::open_in_memory().unwrap();

        // No sample tables without seeding.
        assert!(run(&db, false).await.is_err());

        db.destroy().await.unwrap();
    }
}
