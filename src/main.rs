mod config;
mod db;
mod entities;
mod error;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod table;

use clap::{Parser, Subcommand};

use crate::{config::Config, entities::pokemon_movie, loader::MovieStore};

#[derive(Parser)]
#[command(name = "pokemon-movies", about = "Keeps a SQLite copy of the Pokémon films table")]
struct Cli {
    /// SQLite file to use (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the films table once and upsert it (default)
    Run,
    /// Run now, then again on a fixed interval until Ctrl-C
    Schedule {
        /// Hours between runs (overrides SCHEDULE_EVERY_HOURS)
        #[arg(
            long,
            value_parser = clap::value_parser!(u64).range(1..=config::MAX_SCHEDULE_HOURS)
        )]
        every_hours: Option<u64>,
    },
    /// Print the stored movies
    List {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,pokemon_movies=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.db {
        config.database_path = path;
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("pokemon-movies/", env!("CARGO_PKG_VERSION")))
        .timeout(config.http_timeout)
        .build()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let report =
                pipeline::run_once(&http, &config.source_url, &config.database_url()).await?;
            println!(
                "Extracted {} movies; processed {} ({} new, {} updated).",
                report.extracted, report.load.processed, report.load.inserted, report.load.updated
            );
        },
        Commands::Schedule { every_hours } => {
            if let Some(hours) = every_hours {
                config.schedule_every = config::every_hours(hours);
            }
            pipeline::run_scheduled(&http, &config).await;
        },
        Commands::List { json } => {
            let store = MovieStore::open(&config.database_url()).await?;
            let movies = store.movies().await?;
            store.close().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&movies)?);
            } else {
                print_movies(&movies);
            }
        },
    }

    Ok(())
}

fn print_movies(movies: &[pokemon_movie::Model]) {
    if movies.is_empty() {
        println!("No movies stored yet.");
        return;
    }

    println!("{:>4} | {:<48} | {:<24} | {:<19}", "id", "Title", "Release date", "Last updated");
    println!("{}", "-".repeat(104));
    for m in movies {
        println!(
            "{:>4} | {:<48} | {:<24} | {:<19}",
            m.id,
            truncate(&m.title, 48),
            truncate(&m.release_date, 24),
            m.last_updated
        );
    }
    println!("\n{} movies", movies.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_hours_outside_range_are_rejected() {
        assert!(Cli::try_parse_from(["pokemon-movies", "schedule", "--every-hours", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["pokemon-movies", "schedule", "--every-hours", "18446744073709551"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["pokemon-movies", "schedule", "--every-hours", "12"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Schedule { every_hours: Some(12) })));
    }
}
