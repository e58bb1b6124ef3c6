//! Natural-language search pipeline: schema fetch, prompt build, generation,
//! validation, execution. One instance is shared by the HTTP facade and the
//! internal tool entry point; each request runs the stages in order and stops
//! at the first failure.

use crate::application::use_cases::prompt_builder::PromptBuilder;
use crate::application::use_cases::query_guard::{ensure_retrieval_intent, SqlPolicy};
use crate::domain::error::Result;
use crate::domain::query::{CandidateQuery, QueryOrigin};
use crate::domain::result_set::ResultSet;
use crate::infrastructure::db::company_store::CompanyStore;
use crate::infrastructure::llm_clients::LlmClient;
use crate::infrastructure::response::clean_sql_response;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SearchCompanies {
    store: Arc<CompanyStore>,
    llm_client: Arc<dyn LlmClient + Send + Sync>,
    policy: Arc<dyn SqlPolicy>,
    prompt_builder: PromptBuilder,
}

impl SearchCompanies {
    pub fn new(
        store: Arc<CompanyStore>,
        llm_client: Arc<dyn LlmClient + Send + Sync>,
        policy: Arc<dyn SqlPolicy>,
    ) -> Self {
        let prompt_builder = PromptBuilder::new(store.table());
        Self {
            store,
            llm_client,
            policy,
            prompt_builder,
        }
    }

    /// Run the full pipeline for one question.
    pub async fn run(&self, question: &str) -> Result<ResultSet> {
        info!(question, "Processing natural-language query");

        ensure_retrieval_intent(question)?;

        let schema = self.store.fetch_schema().await?;
        debug!(columns = schema.columns().len(), "Fetched schema");

        let instructions = self.prompt_builder.build_instructions(&schema);

        let raw = self.llm_client.generate(&instructions, question).await?;
        let candidate = CandidateQuery::new(clean_sql_response(&raw));
        info!(sql = candidate.text(), "Generated SQL");

        let validated = self
            .policy
            .validate(candidate, QueryOrigin::Generated)?;

        if validated.sql().contains("AccountsNextDueDate") {
            match self.store.due_date_stats().await {
                Ok(stats) => debug!(rows = ?stats.rows, "Due-date coverage"),
                Err(e) => warn!(error = %e, "Due-date coverage check failed"),
            }
        }

        let result = self.store.execute(&validated).await?;
        info!(rows = result.row_count(), "Query complete");
        Ok(result)
    }

    /// Tool-style entry point: always answers with a JSON value, never an
    /// error type. Rows, a no-results note, or an error object.
    pub async fn tool_response(&self, question: &str) -> serde_json::Value {
        match self.run(question).await {
            Ok(result) if result.is_empty() => {
                json!([{ "message": "No results found for your query." }])
            }
            Ok(result) => serde_json::Value::Array(result.to_json_values()),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    /// Same entry point with the wire payload shape:
    /// `{"natural_language_query": "<text>"}`.
    pub async fn tool_call(&self, payload: &serde_json::Value) -> serde_json::Value {
        match payload
            .get("natural_language_query")
            .and_then(|v| v.as_str())
        {
            Some(question) => self.tool_response(question).await,
            None => json!({ "error": "Missing 'natural_language_query' field" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::query_guard::PrefixPolicy;
    use crate::domain::error::AppError;
    use crate::infrastructure::config::DatabaseSettings;
    use async_trait::async_trait;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::ConnectOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned generator that counts how often it is called.
    pub(crate) struct ScriptedClient {
        pub reply: String,
        pub calls: AtomicUsize,
    }

    impl ScriptedClient {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    async fn seeded_store(name: &str) -> Arc<CompanyStore> {
        let settings = DatabaseSettings {
            path: std::env::temp_dir()
                .join(name)
                .to_string_lossy()
                .to_string(),
            table: "companies".to_string(),
            busy_timeout_secs: 30,
        };
        let mut conn = SqliteConnectOptions::new()
            .filename(&settings.path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query("DROP TABLE IF EXISTS companies")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE companies (CompanyName TEXT, CompanyNumber TEXT, CompanyStatus TEXT)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query("INSERT INTO companies VALUES ('ACME LTD', '01234567', 'Active')")
            .execute(&mut conn)
            .await
            .unwrap();
        Arc::new(CompanyStore::new(settings).unwrap())
    }

    fn use_case(store: Arc<CompanyStore>, client: Arc<ScriptedClient>) -> SearchCompanies {
        SearchCompanies::new(store, client, Arc::new(PrefixPolicy::new()))
    }

    #[tokio::test]
    async fn test_pipeline_executes_generated_select() {
        let store = seeded_store("companylens_search_ok.db").await;
        let client = Arc::new(ScriptedClient::new(
            "SELECT CompanyName, CompanyStatus FROM companies WHERE CompanyStatus = 'Active' ORDER BY CompanyName LIMIT 20",
        ));
        let search = use_case(store, client.clone());

        let result = search.run("active companies").await.unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_destructive_generation_is_rejected_before_execution() {
        let store = seeded_store("companylens_search_unsafe.db").await;
        let client = Arc::new(ScriptedClient::new("DELETE FROM companies;"));
        let search = use_case(store.clone(), client);

        match search.run("active companies").await {
            Err(AppError::UnsafeStatement(_)) => {}
            other => panic!("expected UnsafeStatement, got {:?}", other),
        }

        // Nothing was deleted.
        let policy = PrefixPolicy::new();
        let check = policy
            .validate(
                CandidateQuery::new("SELECT COUNT(*) AS n FROM companies"),
                QueryOrigin::Direct,
            )
            .unwrap();
        let remaining = store.execute(&check).await.unwrap();
        assert_eq!(
            remaining.rows[0].get("n"),
            Some(&serde_json::Value::Number(1.into()))
        );
    }

    #[tokio::test]
    async fn test_mutation_question_fails_without_generation() {
        let store = seeded_store("companylens_search_intent.db").await;
        let client = Arc::new(ScriptedClient::new("SELECT 1"));
        let search = use_case(store, client.clone());

        assert!(search.run("delete all companies in Suffolk").await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fenced_generation_is_cleaned_before_validation() {
        let store = seeded_store("companylens_search_fence.db").await;
        let client = Arc::new(ScriptedClient::new(
            "```sql\nSELECT CompanyName FROM companies LIMIT 5\n```",
        ));
        let search = use_case(store, client);

        let result = search.run("company names").await.unwrap();
        assert_eq!(result.row_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_response_reports_empty_result_as_message() {
        let store = seeded_store("companylens_search_empty.db").await;
        let client = Arc::new(ScriptedClient::new(
            "SELECT CompanyName FROM companies WHERE CompanyStatus = 'Dissolved' LIMIT 20",
        ));
        let search = use_case(store, client);

        let value = search.tool_response("dissolved companies").await;
        assert_eq!(
            value,
            json!([{ "message": "No results found for your query." }])
        );
    }

    #[tokio::test]
    async fn test_tool_call_requires_question_field() {
        let store = seeded_store("companylens_search_payload.db").await;
        let client = Arc::new(ScriptedClient::new("SELECT CompanyName FROM companies LIMIT 5"));
        let search = use_case(store, client.clone());

        let value = search.tool_call(&json!({ "question": "wrong key" })).await;
        assert!(value.get("error").is_some());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);

        let value = search
            .tool_call(&json!({ "natural_language_query": "company names" }))
            .await;
        assert!(value.is_array());
    }

    #[tokio::test]
    async fn test_tool_response_wraps_errors() {
        let store = seeded_store("companylens_search_error.db").await;
        let client = Arc::new(ScriptedClient::new(
            "SELECT NoSuchColumn FROM companies LIMIT 5",
        ));
        let search = use_case(store, client);

        let value = search.tool_response("bad column").await;
        assert!(value.get("error").is_some());
    }
}
