mod config;
mod db;
mod routes;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use config::ServerConfig;
use db::submission_repository::SubmissionRepository;
use routes::{configure_routes, json_config};
use std::env;

fn startup_error(context: &str, err: impl std::fmt::Debug) -> std::io::Error {
    log::error!("{}: {:?}", context, err);
    std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {:?}", context, err),
    )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config =
        ServerConfig::load().map_err(|e| startup_error("Invalid server configuration", e))?;

    let pool = db::init_pool(&config)
        .await
        .map_err(|e| startup_error("Database connection failed", e))?;
    let repository = SubmissionRepository::new(pool);
    repository
        .ensure_schema()
        .await
        .map_err(|e| startup_error("Schema setup failed", e))?;

    let classifier = config.classifier_config();
    let json_limit = config.json_limit_bytes;
    let frontend_dir = config.frontend_dir.clone();
    let bind_address = config.bind_address();

    log::info!("Serving frontend from {}", frontend_dir);
    log::info!("Starting server on {}", bind_address);

    let app_repository = repository.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(app_repository.clone()))
            .app_data(web::Data::new(classifier.clone()))
            .app_data(json_config(json_limit))
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    log::info!("Server stopped, closing database pool");
    repository.close().await;
    Ok(())
}
