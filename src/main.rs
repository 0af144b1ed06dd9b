use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod biometric;
mod config;
mod db;
mod docs;
mod export;
mod model;
mod models;
mod report;
mod routes;

use auth::firebase::{FirebaseVerifier, IdentityVerifier};
use biometric::face::{FaceEmbedder, HttpFaceEmbedder};
use biometric::vision::VisionClient;
use config::Config;
use db::init_db;
use export::credentials::{CredentialProvider, OAuthRefreshProvider, StaticTokenProvider};
use export::sheets::SheetsExporter;
use report::source::{MySqlReportSource, ReportSource};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Time clock API"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    // one connection pool for every outbound call
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(FirebaseVerifier::new(
        config.firebase_project_id.clone(),
        http.clone(),
    ));
    let embedder: Arc<dyn FaceEmbedder> = Arc::new(HttpFaceEmbedder::new(
        config.face_embedding_url.clone(),
        http.clone(),
    ));
    let report_source: Arc<dyn ReportSource> = Arc::new(MySqlReportSource::new(pool.clone()));

    let credentials: Arc<dyn CredentialProvider> = match &config.google_access_token {
        Some(token) => {
            warn!("Using a fixed Google access token, exports stop working once it expires");
            Arc::new(StaticTokenProvider::new(token.clone()))
        }
        None => Arc::new(OAuthRefreshProvider::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_refresh_token.clone(),
            http.clone(),
        )),
    };
    let exporter = Data::new(SheetsExporter::new(
        credentials,
        http.clone(),
        config.drive_folder_id.clone(),
    ));

    let vision = config
        .vision_api_key
        .clone()
        .map(|key| Data::new(VisionClient::new(key, http.clone())));
    if vision.is_none() {
        info!("VISION_API_KEY not set, face enrollment skips the detection check");
    }

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::from(verifier.clone()))
            .app_data(Data::from(embedder.clone()))
            .app_data(Data::from(report_source.clone()))
            .app_data(exporter.clone());

        if let Some(vision) = &vision {
            app = app.app_data(vision.clone());
        }

        app.service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
