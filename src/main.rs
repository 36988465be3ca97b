use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use experience_match::config::{LoggingSettings, Settings};
use experience_match::core::Matcher;
use experience_match::routes::{self, AppState};
use experience_match::services::{AirtableClient, AirtableTables, CatalogCache, CatalogService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL / LOG_FORMAT override the configured values; RUST_LOG overrides both
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting experience matching service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let tables = AirtableTables {
        experiences: settings.airtable.experiences_table.clone(),
        experiences_view: settings.airtable.experiences_view.clone(),
        leads: settings.airtable.leads_table.clone(),
    };

    let airtable = AirtableClient::new(
        settings.airtable.api_url.clone(),
        settings.airtable.token.clone(),
        settings.airtable.base_id.clone(),
        tables,
        settings.airtable.page_size.unwrap_or(100),
        Duration::from_secs(settings.airtable.timeout_secs.unwrap_or(30)),
    )
    .map_err(|e| {
        error!("Failed to create Airtable client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    if settings.airtable.base_id.is_empty() || settings.airtable.token.is_empty() {
        warn!("Airtable base id or token missing, catalog requests will fail");
    }

    info!("Airtable client initialized");

    // Cache works in-process when Redis is absent or unreachable
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(16);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(redis_url) => match CatalogCache::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Catalog cache initialized with Redis (TTL: {}s)", cache_ttl);
                c
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), using in-process cache only", e);
                CatalogCache::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("Catalog cache initialized in-process (TTL: {}s)", cache_ttl);
            CatalogCache::in_memory(l1_cache_size, cache_ttl)
        }
    };

    let catalog = Arc::new(CatalogService::new(
        Arc::new(airtable),
        Arc::new(cache),
        &settings.airtable.experiences_table,
    ));

    let weights = settings.scoring_weights();
    let options = settings.match_options();
    let matcher = Matcher::new(weights, options);

    info!("Matcher initialized with weights: {:?}, options: {:?}", weights, options);

    let app_state = AppState {
        catalog,
        matcher,
        max_limit: settings.matching.max_limit.max(1),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
