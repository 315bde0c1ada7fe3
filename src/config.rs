use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub flow_data_path: String,
    pub flow_sheet: Option<String>,
    pub temperature_data_path: String,
    pub precipitation_data_path: String,
    pub flow_model_path: String,
    pub temperature_model_path: String,
    pub precipitation_model_path: String,
    pub narrative: NarrativeConfig,
}

/// Connection settings for the external text-generation provider
#[derive(Clone)]
pub struct NarrativeConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            flow_data_path: env::var("FLOW_DATA_PATH")
                .unwrap_or_else(|_| "data/caudal_H34_H36_logico_corregido.xlsx".to_string()),
            flow_sheet: env::var("FLOW_SHEET").ok().filter(|s| !s.trim().is_empty()),
            temperature_data_path: env::var("TEMPERATURE_DATA_PATH")
                .unwrap_or_else(|_| "data/temperatura_mensual_papallacta_2025.csv".to_string()),
            precipitation_data_path: env::var("PRECIPITATION_DATA_PATH")
                .unwrap_or_else(|_| "data/precipitacion_mensual.csv".to_string()),
            flow_model_path: env::var("FLOW_MODEL_PATH")
                .unwrap_or_else(|_| "models/modelo_caudal.json".to_string()),
            temperature_model_path: env::var("TEMPERATURE_MODEL_PATH")
                .unwrap_or_else(|_| "models/modelo_sarima_temperatura.json".to_string()),
            precipitation_model_path: env::var("PRECIPITATION_MODEL_PATH")
                .unwrap_or_else(|_| "models/modelo_sarima_pre.json".to_string()),
            narrative: NarrativeConfig::from_env()?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl NarrativeConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(NarrativeConfig {
            api_key: env::var("NARRATIVE_API_KEY")?,
            base_url: env::var("NARRATIVE_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            model: env::var("NARRATIVE_MODEL")
                .unwrap_or_else(|_| "openai/chatgpt-4o-latest".to_string()),
            referer: env::var("NARRATIVE_REFERER")
                .unwrap_or_else(|_| "https://mi-aplicacion.com".to_string()),
            title: env::var("NARRATIVE_TITLE").unwrap_or_else(|_| "Prediccion Hidrica".to_string()),
            timeout_secs: env::var("NARRATIVE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            max_retries: env::var("NARRATIVE_MAX_RETRIES")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("flow_data_path", &self.flow_data_path)
            .field("flow_sheet", &self.flow_sheet)
            .field("temperature_data_path", &self.temperature_data_path)
            .field("precipitation_data_path", &self.precipitation_data_path)
            .field("flow_model_path", &self.flow_model_path)
            .field("temperature_model_path", &self.temperature_model_path)
            .field("precipitation_model_path", &self.precipitation_model_path)
            .field("narrative", &self.narrative)
            .finish()
    }
}

// The API key never reaches the logs
impl fmt::Debug for NarrativeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
