use log::{error, info, LevelFilter};
use rocket::Error as RocketError;
use thiserror::Error;

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Rocket(#[from] RocketError),
}

async fn serve() -> Result<(), Error> {
    info!(
        "Starting {} v{}...",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    let rocket = forms_backend::build().ignite().await?;
    info!("...configured, database online");

    // Our own fairing logs requests from here on.
    log4rs_dynamic_filters::DynamicLevelFilter::set("rocket", LevelFilter::Off);
    rocket.launch().await?;
    Ok(())
}

#[rocket::main]
async fn main() {
    log4rs::init_file("log4rs.yaml", log4rs_dynamic_filters::default_deserializers())
        .expect("Failed to initialise logging from log4rs.yaml");

    if let Err(err) = serve().await {
        error!("{err}");
        error!("Server stopped");
        std::process::exit(1)
    }
}
