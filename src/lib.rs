#[macro_use]
extern crate log;
#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

#[cfg(test)]
use mongodb::Client;

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;

pub use config::Config;

/// Build the full server, connecting to the database given by the `db_uri` config value.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
}

/// Build a server around an existing database connection, skipping the database fairing.
/// Used by tests so that each test can own (and later drop) its database.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db).await.unwrap();
    model::db::admin::ensure_admin_exists(&model::mongodb::Coll::from_db(&db))
        .await
        .unwrap();

    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .manage(client)
        .manage(db)
}

/// Connect to the database named in the test configuration.
#[cfg(test)]
pub(crate) async fn db_client() -> Client {
    log4rs_test_utils::test_logging::init_logging_once_for(["forms_backend"], None, None);

    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to test database")
}

/// A fresh database name for a single test.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}
