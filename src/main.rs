mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::content_store::SignedUrlIssuer;
use crate::services::gateways::PaymentGateways;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string()))?;
    info!("Database connected");

    if config.auto_migrate {
        db::create_schema(&db)
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    let gateways = web::Data::new(
        PaymentGateways::from_config(&config).map_err(|e| io::Error::other(e.to_string()))?,
    );
    let store = web::Data::new(SignedUrlIssuer::from_config(&config));
    let db = web::Data::new(db);
    let bind = (config.bind_addr.clone(), config.port);
    let config = web::Data::new(config);

    info!(addr = %bind.0, port = bind.1, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(gateways.clone())
            .app_data(store.clone())
            .app_data(routes::json_config())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}
