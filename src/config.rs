use std::time::Duration;

use anyhow::{Context, ensure};

use crate::db;

pub const SOURCE_URL: &str = "https://en.wikipedia.org/wiki/List_of_Pok%C3%A9mon_films";

// One year.
pub const MAX_SCHEDULE_HOURS: u64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct Config {
    pub source_url: String,
    pub database_path: String,
    pub http_timeout: Duration,
    pub schedule_every: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "pokemon_movies.db".to_string());

        let http_timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS")?;

        let schedule_every_hours: u64 = std::env::var("SCHEDULE_EVERY_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .context("SCHEDULE_EVERY_HOURS")?;
        ensure!(
            (1..=MAX_SCHEDULE_HOURS).contains(&schedule_every_hours),
            "SCHEDULE_EVERY_HOURS must be between 1 and {MAX_SCHEDULE_HOURS}, got {schedule_every_hours}"
        );

        Ok(Self {
            source_url: SOURCE_URL.to_string(),
            database_path,
            http_timeout: Duration::from_secs(http_timeout_secs),
            schedule_every: every_hours(schedule_every_hours),
        })
    }

    pub fn database_url(&self) -> String {
        db::sqlite_url(&self.database_path)
    }
}

pub fn every_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.clamp(1, MAX_SCHEDULE_HOURS) * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_interval_is_at_least_an_hour() {
        assert_eq!(every_hours(0), Duration::from_secs(3600));
        assert_eq!(every_hours(24), Duration::from_secs(86_400));
    }

    #[test]
    fn huge_schedule_interval_is_capped_to_a_year() {
        let year = Duration::from_secs(MAX_SCHEDULE_HOURS * 3600);
        assert_eq!(every_hours(u64::MAX / 1000), year);
        assert_eq!(every_hours(u64::MAX), year);
        assert_eq!(every_hours(MAX_SCHEDULE_HOURS), year);
    }

    #[test]
    fn database_path_becomes_a_creating_sqlite_url() {
        let config = Config {
            source_url: SOURCE_URL.to_string(),
            database_path: "data/movies.db".to_string(),
            http_timeout: Duration::from_secs(30),
            schedule_every: every_hours(24),
        };
        assert_eq!(config.database_url(), "sqlite://data/movies.db?mode=rwc");
    }
}
