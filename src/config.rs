use chrono::{Duration, FixedOffset, Offset, Utc};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::model::{
    db::admin::ensure_admin_exists,
    mongodb::{ensure_indexes_exist, Coll},
};

/// Application settings from `Rocket.toml` and `ROCKET_*` environment variables,
/// available to handlers as managed state.
#[derive(Deserialize)]
pub struct Config {
    auth_ttl: u32,
    #[serde(default)]
    trend_utc_offset_minutes: i32,
    jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// The time zone that submission trends are bucketed in.
    /// Out-of-range offsets fall back to UTC.
    pub fn trend_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.trend_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Extract a config section from the figment, printing Figment's explanation on failure.
fn extract<T: DeserializeOwned>(rocket: &Rocket<Build>, what: &str) -> Option<T> {
    match rocket.figment().extract::<T>() {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Invalid {what} configuration");
            rocket::config::pretty_print_error(e);
            None
        }
    }
}

/// Places [`Config`] into managed state, aborting ignition if it is incomplete.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match extract::<Config>(&rocket, "application") {
            Some(config) => {
                debug!(
                    "Auth tokens last {}s, trends use UTC{}",
                    config.auth_ttl,
                    config.trend_offset()
                );
                Ok(rocket.manage(config))
            }
            None => Err(rocket),
        }
    }
}

/// Connection settings for MongoDB.
#[derive(Deserialize)]
struct DbConfig {
    #[serde(default = "default_database_name")]
    db_name: String,
    db_uri: String,
}

fn default_database_name() -> String {
    "forms".to_string()
}

/// Connect to the configured database and prepare it for use.
async fn open_database(config: DbConfig) -> Result<(MongoClient, Database), String> {
    let client = MongoClient::with_uri_str(config.db_uri)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;
    let db = client.database(&config.db_name);
    ensure_indexes_exist(&db)
        .await
        .map_err(|e| format!("Failed to create database indexes: {e}"))?;
    ensure_admin_exists(&Coll::from_db(&db))
        .await
        .map_err(|e| format!("Failed to create default admin: {e}"))?;
    Ok((client, db))
}

/// Connects to MongoDB, creates the indexes and the default admin, then
/// manages both the `Client` (for sessions) and the `Database`.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = extract::<DbConfig>(&rocket, "database") else {
            return Err(rocket);
        };
        info!("Connecting to database '{}'...", config.db_name);
        match open_database(config).await {
            Ok((client, db)) => {
                info!("...database online");
                Ok(rocket.manage(client).manage(db))
            }
            Err(msg) => {
                error!("{msg}");
                Err(rocket)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_offset(minutes: i32) -> Config {
        Config {
            auth_ttl: 60,
            trend_utc_offset_minutes: minutes,
            jwt_secret: "secret".to_string(),
        }
    }

    #[test]
    fn trend_offset_from_minutes() {
        let config = config_with_offset(330);
        assert_eq!(config.trend_offset().local_minus_utc(), 330 * 60);

        let config = config_with_offset(-300);
        assert_eq!(config.trend_offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn out_of_range_offset_is_utc() {
        let config = config_with_offset(24 * 60 * 2);
        assert_eq!(config.trend_offset().local_minus_utc(), 0);
    }
}
