//! Operator CLI for the swap matching engine
//!
//! Runs one-off matching runs and expiration sweeps, answers a match on a
//! participant's behalf, or keeps the scheduler running in the foreground.
//! Results are printed as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use swap_core::common::{MatchId, UserId};
use swap_core::config::Config;
use swap_core::domains::matching::{
    accept_match, expire_old_matches, reject_match, run_matching_algorithm, Participant,
};
use swap_core::kernel::{start_scheduler, ServerDeps};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "matcher")]
#[command(about = "Transfer swap matching engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the matching algorithm once
    Run,

    /// Expire overdue pending matches
    Expire,

    /// Accept a match as the given user
    Accept { match_id: MatchId, user_id: UserId },

    /// Reject a match as the given user
    Reject { match_id: MatchId, user_id: UserId },

    /// Run the matching and expiration schedules until interrupted
    Schedule,
}

#[derive(Serialize)]
struct ExpireResponse {
    expired_count: u64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    client_error: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_response(result: Result<Participant, swap_core::domains::matching::MatchingError>) -> Result<()> {
    match result {
        Ok(participant) => print_json(&participant),
        Err(e) if e.is_client_error() => print_json(&ErrorResponse {
            error: e.to_string(),
            client_error: true,
        }),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swap_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let deps = ServerDeps::postgres(pool, config.expo_access_token.clone(), config.matching.clone());

    match cli.command {
        Commands::Run => print_json(&run_matching_algorithm(&deps).await?),
        Commands::Expire => print_json(&ExpireResponse {
            expired_count: expire_old_matches(&deps).await?,
        }),
        Commands::Accept { match_id, user_id } => {
            print_response(accept_match(match_id, user_id, &deps).await)
        }
        Commands::Reject { match_id, user_id } => {
            print_response(reject_match(match_id, user_id, &deps).await)
        }
        Commands::Schedule => {
            let mut scheduler = start_scheduler(deps, &config).await?;
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down scheduler");
            scheduler.shutdown().await?;
            Ok(())
        }
    }
}
