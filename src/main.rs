use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod access;
mod api;
mod auth;
mod compliance;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod telemetry;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use tracing::info;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Performance360 API"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let _guard = telemetry::init(&config);

    info!(?config, "Server starting...");

    let pool = init_db(&config.database_url, config.run_migrations).await?;

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config = config.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
