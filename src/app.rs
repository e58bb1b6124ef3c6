//! Process-level wiring: logging, configuration, state construction, and the
//! entry points behind each CLI action.

use crate::application::use_cases::canned_queries::CannedQuery;
use crate::application::use_cases::query_guard::{PrefixPolicy, SqlPolicy};
use crate::application::SearchCompanies;
use crate::domain::query::{CandidateQuery, QueryOrigin};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::company_store::CompanyStore;
use crate::infrastructure::db::ingest;
use crate::infrastructure::llm_clients::AnthropicClient;
use crate::interfaces::http::{start_server, AppState};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub fn init_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Run the HTTP service until shutdown.
pub async fn serve(config: AppConfig) -> Result<(), String> {
    // Credential checks are startup-fatal so a misconfigured deployment
    // never reaches request handling.
    config.require_generator_key()?;
    let api_key = config
        .service_api_key()
        .ok_or_else(|| "No service API key configured".to_string())?
        .to_string();

    let store = Arc::new(
        CompanyStore::new(config.database.clone()).map_err(|e| e.to_string())?,
    );
    let llm_client = Arc::new(AnthropicClient::new(config.generator.clone()));
    let policy: Arc<dyn SqlPolicy> = Arc::new(PrefixPolicy::new());
    let search = Arc::new(SearchCompanies::new(store, llm_client, policy));

    let state = AppState { search, api_key };

    info!(
        host = config.server.host.as_str(),
        port = config.server.port,
        "Starting companylens server"
    );
    let server = start_server(state, &config.server.host, config.server.port)
        .map_err(|e| format!("Failed to bind server: {}", e))?;

    server.await.map_err(|e| format!("Server error: {}", e))
}

/// Load a companies CSV into the store, then build the lookup indexes.
pub async fn run_ingest(config: AppConfig, csv_path: &Path) -> Result<(), String> {
    let rows = ingest::ingest_csv(&config.database, csv_path)
        .await
        .map_err(|e| e.to_string())?;
    info!(rows, "Import finished");
    ingest::create_indexes(&config.database)
        .await
        .map_err(|e| e.to_string())
}

/// (Re)build the lookup indexes on an existing store.
pub async fn run_index(config: AppConfig) -> Result<(), String> {
    ingest::create_indexes(&config.database)
        .await
        .map_err(|e| e.to_string())
}

/// Execute one canned query and print its rows as JSON records.
pub async fn run_canned_query(config: AppConfig, name: &str) -> Result<(), String> {
    let canned = CannedQuery::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = CannedQuery::ALL.iter().map(|q| q.name()).collect();
        format!(
            "Unknown query '{}'. Available queries: {}",
            name,
            names.join(", ")
        )
    })?;

    let store = CompanyStore::new(config.database.clone()).map_err(|e| e.to_string())?;
    let validated = PrefixPolicy::new()
        .validate(CandidateQuery::new(canned.sql()), QueryOrigin::Direct)
        .map_err(|e| e.to_string())?;

    let result = store.execute(&validated).await.map_err(|e| e.to_string())?;
    if result.is_empty() {
        println!("Query '{}' returned no results.", canned);
    } else {
        println!(
            "{}",
            result.to_json_records().map_err(|e| e.to_string())?
        );
    }
    Ok(())
}
