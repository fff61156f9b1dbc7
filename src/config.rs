use serde::Deserialize;
use tracing::warn;

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the grades database JSON lives.
    pub store_path: String,
    /// Whether to log per-section extractor details.
    pub verbose_logging: bool,
    /// Plain-text session log file.
    pub output_log_file: String,
    // --- advisory service (OpenAI-compatible endpoint) ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: "notas_db.json".to_string(),
            verbose_logging: false,
            output_log_file: "notas.log".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::overlay_env(Self::default())
    }

    /// Loads `notas.toml` when present, then lets the environment override
    /// individual fields.
    pub fn load() -> Self {
        let base = match std::fs::read_to_string("notas.toml") {
            Ok(content) => Self::from_toml_str(&content),
            Err(_) => Self::default(),
        };
        Self::overlay_env(base)
    }

    /// A config file that does not parse falls back to the defaults, but
    /// never silently.
    fn from_toml_str(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                warn!("notas.toml inválido, usando a configuração padrão: {}", e);
                Self::default()
            }
        }
    }

    fn overlay_env(base: Self) -> Self {
        Self {
            store_path: std::env::var("NOTAS_STORE_PATH").unwrap_or(base.store_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(base.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
        }
    }
}
