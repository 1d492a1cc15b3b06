use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Directory holding the metadata database
    pub data_dir: String,
    /// Directory uploaded file content is written to
    pub upload_dir: String,
    /// Symmetric secret for signing access tokens
    pub secret_key: String,
    /// Access token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Public base URL used when building share links
    pub base_url: String,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
    /// When true, the shared download route only serves a file to its owner.
    pub shared_download_owner_only: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let secret_key = std::env::var("SECRET_KEY").unwrap_or_default();

        let token_ttl_minutes = std::env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let shared_download_owner_only = std::env::var("SHARED_DOWNLOAD_OWNER_ONLY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            bind_address,
            data_dir,
            upload_dir,
            secret_key,
            token_ttl_minutes,
            base_url,
            max_upload_size,
            shared_download_owner_only,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "SECRET_KEY cannot be empty".to_string(),
            ));
        }

        if self.token_ttl_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "TOKEN_TTL_MINUTES must be positive".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
