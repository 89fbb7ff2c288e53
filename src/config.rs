use crate::errors::AppError;
use crate::validator::ValidationMode;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Inference API key. `None` leaves the service up with analysis disabled.
    pub api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub request_timeout_secs: u64,
    pub validation_mode: ValidationMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            api_key: std::env::var("API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_base_url: {
                let url = std::env::var("GEMINI_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("GEMINI_BASE_URL must start with http:// or https://");
                }
                url.trim_end_matches('/').to_string()
            },
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a whole number"))?,
            validation_mode: std::env::var("VALIDATION_MODE")
                .unwrap_or_else(|_| "structural".to_string())
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if config.api_key.is_none() {
            tracing::warn!("API_KEY not set; analysis is disabled until the service is restarted with a key");
        }
        tracing::debug!("Gemini Base URL: {}", config.gemini_base_url);
        tracing::debug!("Gemini Model: {}", config.gemini_model);
        tracing::debug!("Validation Mode: {:?}", config.validation_mode);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Precondition for any inference call: the configured, non-blank API key.
    pub fn credential(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::CredentialMissing)
    }

    /// Whether the analyze action should be offered at all.
    pub fn credential_configured(&self) -> bool {
        self.credential().is_ok()
    }
}
