//! HTTP entry point. Authentication happens before anything else so an
//! unauthenticated caller never costs a generation call; every pipeline
//! failure is folded into a structured error body.

use crate::application::SearchCompanies;
use actix_cors::Cors;
use actix_web::{dev::Server, get, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const API_KEY_HEADER: &str = "X-API-Key";

pub struct AppState {
    pub search: Arc<SearchCompanies>,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    5
}

fn authorized(req: &HttpRequest, expected: &str) -> bool {
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|presented| presented == expected)
        .unwrap_or(false)
}

/// Fold the caller's limit into the question unless the question already
/// names one, so the generator sees a single consistent bound.
fn with_limit_hint(query: &str, limit: u32) -> String {
    let lowered = query.to_lowercase();
    if lowered.contains("limit") || lowered.contains("top ") {
        query.to_string()
    } else {
        format!("{} (limit to {} results)", query, limit)
    }
}

#[get("/companies/search")]
async fn search_companies(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    info!(query = params.query.as_str(), "Received search request");

    if !authorized(&req, &state.api_key) {
        warn!("Invalid API key presented");
        return HttpResponse::Unauthorized().json(json!({ "detail": "Invalid API key" }));
    }

    let question = with_limit_hint(&params.query, params.limit);

    match state.search.run(&question).await {
        Ok(result) if result.is_empty() => HttpResponse::Ok().json(json!({
            "result": [],
            "status": "success",
            "message": "No results found",
        })),
        Ok(result) => HttpResponse::Ok().json(json!({
            "result": result.to_json_values(),
            "status": "success",
        })),
        Err(e) => {
            warn!(error = %e, "Search pipeline failed");
            HttpResponse::InternalServerError().json(json!({
                "detail": format!("An error occurred while processing your request: {}", e),
            }))
        }
    }
}

pub fn start_server(state: AppState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .service(web::scope("/api").service(search_companies))
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
