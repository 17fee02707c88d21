use actix_web::{get, middleware::Logger, post, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;
use serde::{Deserialize, Serialize};

mod cache;
mod dataset;
mod index;
mod intent;
mod llm;
mod model;
mod normalize;
mod responder;
mod settings;
mod suggestions;

use llm::LlmFallback;
use model::ContextMessage;
use settings::Settings;

const SERVICE_NAME: &str = "cambodia-travel-assistant";

// --- Request/response shapes ---

/// Body of `POST /process`. Fields are read one by one so that a bad
/// `context` never costs the caller a well-formed `message`.
#[derive(Debug, Default)]
struct ProcessRequest {
    message: String,
    context: Vec<ContextMessage>,
}

impl ProcessRequest {
    /// A missing or non-string `message` reads as empty instead of a 400.
    /// Context entries that do not parse are skipped.
    fn from_body(body: &[u8]) -> Self {
        let body: serde_json::Value = match serde_json::from_slice(body) {
            Ok(body) => body,
            Err(e) => {
                log::debug!("Unreadable /process body: {}", e);
                return Self::default();
            }
        };

        let message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
            .to_string();
        let context = body
            .get("context")
            .and_then(serde_json::Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        serde_json::from_value(entry.clone())
                            .map_err(|e| log::debug!("Skipping context entry: {}", e))
                            .ok()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { message, context }
    }
}

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    llm_provider: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct SuggestionsResponse {
    suggestions: Vec<String>,
}

// --- Web Server Endpoints ---

#[post("/process")]
async fn process_endpoint(
    body: web::Bytes,
    data: web::Data<responder::Responder>,
) -> impl Responder {
    let req = ProcessRequest::from_body(&body);
    let reply = data.answer(&req.message, &req.context).await;
    HttpResponse::Ok().json(reply)
}

#[get("/health")]
async fn health_endpoint(data: web::Data<responder::Responder>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        records: data.records().len(),
        llm_provider: data.fallback_provider().map(str::to_string),
    })
}

#[get("/suggestions")]
async fn suggestions_endpoint() -> impl Responder {
    HttpResponse::Ok().json(SuggestionsResponse {
        suggestions: suggestions::top_suggestions(),
    })
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(process_endpoint)
        .service(health_endpoint)
        .service(suggestions_endpoint);
}

#[actix_web::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    let default_level = if settings.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    log::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));

    let records = dataset::load(settings.dataset_url(), &settings.dataset_path).await;
    if records.is_empty() {
        log::warn!("No QA records loaded; every question will get the apology reply");
    }

    let fallback = LlmFallback::from_settings(&settings)?;
    let system = responder::Responder::new(records).with_fallback(fallback);
    let data = web::Data::new(system);

    log::info!("Starting server at http://{}:{}", settings.bind_address, settings.port);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((settings.bind_address.as_str(), settings.port))?
    .run()
    .await?;
    Ok(())
}
