use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

const ENV_PROVIDER_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Application configuration. Loaded once at startup and passed into every
/// component constructor; nothing reads ambient globals after this point.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret expected in the X-API-Key header. Falls back to the provider
    /// key when unset, matching the original deployment.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Provider credential. Resolved from ANTHROPIC_API_KEY when not set in
    /// the config file; absence is fatal at startup, not at request time.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "companydata/companydata.db".to_string()
}

fn default_table() -> String {
    "companies".to_string()
}

fn default_busy_timeout() -> u64 {
    30
}

fn default_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_generator_timeout() -> u64 {
    60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            table: default_table(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

impl AppConfig {
    /// Load from `companylens.toml` (when present) overlaid with
    /// `COMPANYLENS_*` environment variables, e.g.
    /// `COMPANYLENS_SERVER__PORT=9000`.
    pub fn load() -> Result<Self, String> {
        let mut config: AppConfig = Figment::new()
            .merge(Toml::file("companylens.toml"))
            .merge(Env::prefixed("COMPANYLENS_").split("__"))
            .extract()
            .map_err(|e| format!("Invalid configuration: {}", e))?;

        if config.generator.api_key.is_none() {
            config.generator.api_key = std::env::var(ENV_PROVIDER_API_KEY).ok();
        }

        Ok(config)
    }

    /// Fail fast when the provider credential is missing. Called once at
    /// startup so a misconfigured deployment never reaches request handling.
    pub fn require_generator_key(&self) -> Result<&str, String> {
        self.generator
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| format!("{} environment variable not set", ENV_PROVIDER_API_KEY))
    }

    /// The secret callers must present in X-API-Key.
    pub fn service_api_key(&self) -> Option<&str> {
        self.server
            .api_key
            .as_deref()
            .or(self.generator.api_key.as_deref())
    }
}
