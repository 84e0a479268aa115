use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParlorConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

/// Identifiers of the hosted project. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub database_id: String,

    #[serde(default)]
    pub messages_collection_id: String,

    #[serde(default)]
    pub chatrooms_collection_id: String,

    #[serde(default)]
    pub bucket_id: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub publishable_key: String,

    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Overrides the host decoded from the publishable key.
    #[serde(default)]
    pub frontend_api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,

    #[serde(default = "default_assistant_model")]
    pub model: String,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default)]
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_true")]
    pub mouse_enabled: bool,
}

fn default_endpoint() -> String {
    "https://cloud.appwrite.io/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_redirect_url() -> String {
    "parlor://sso-callback".to_string()
}

fn default_assistant_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_assistant_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_rate() -> u64 {
    250
}

fn default_theme() -> String {
    "tokyo-night".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: String::new(),
            database_id: String::new(),
            messages_collection_id: String::new(),
            chatrooms_collection_id: String::new(),
            bucket_id: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            publishable_key: String::new(),
            redirect_url: default_redirect_url(),
            frontend_api_url: None,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_assistant_base_url(),
            model: default_assistant_model(),
            system_prompt: None,
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: String::new(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            theme: default_theme(),
            mouse_enabled: true,
        }
    }
}

/// Environment names used by the mobile build of the app, accepted as overrides.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("EXPO_PUBLIC_APPWRITE_ENDPOINT", "backend.endpoint"),
    ("EXPO_PUBLIC_APPWRITE_PROJECT_ID", "backend.project_id"),
    ("EXPO_PUBLIC_APPWRITE_DATABASE_ID", "backend.database_id"),
    ("EXPO_PUBLIC_APPWRITE_BUCKET_ID", "backend.bucket_id"),
    ("EXPO_PUBLIC_CLERK_PUBLISHABLE_KEY", "identity.publishable_key"),
    ("EXPO_PUBLIC_GEMINI_API_KEY", "assistant.api_key"),
    ("GEMINI_API_KEY", "assistant.api_key"),
];

impl ParlorConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        let parlor_config = Self::load_layers(paths)?;
        parlor_config.validate()?;
        Ok(parlor_config)
    }

    /// Merges every source without checking required fields.
    pub fn load_layers(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("PARLOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut parlor_config: ParlorConfig = config.try_deserialize()?;

        parlor_config.apply_env_overrides(|key| std::env::var(key).ok());

        if parlor_config.assistant.api_key.is_none() {
            tracing::warn!("No assistant API key configured; @ai replies will fail");
        }

        Ok(parlor_config)
    }

    /// Applies the legacy environment names on top of the layered sources.
    ///
    /// Later entries in the table win, so `GEMINI_API_KEY` beats the prefixed name.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (env_key, target) in LEGACY_ENV_KEYS {
            let Some(value) = lookup(env_key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match *target {
                "backend.endpoint" => self.backend.endpoint = value,
                "backend.project_id" => self.backend.project_id = value,
                "backend.database_id" => self.backend.database_id = value,
                "backend.bucket_id" => self.backend.bucket_id = value,
                "identity.publishable_key" => self.identity.publishable_key = value,
                "assistant.api_key" => self.assistant.api_key = Some(value),
                _ => {}
            }
        }

        if let Some(level) = lookup("PARLOR_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let required = [
            ("backend.endpoint", &self.backend.endpoint),
            ("backend.project_id", &self.backend.project_id),
            ("backend.database_id", &self.backend.database_id),
            (
                "backend.messages_collection_id",
                &self.backend.messages_collection_id,
            ),
            (
                "backend.chatrooms_collection_id",
                &self.backend.chatrooms_collection_id,
            ),
            ("backend.bucket_id", &self.backend.bucket_id),
            ("identity.publishable_key", &self.identity.publishable_key),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigLoadError::MissingRequired(key.to_string()));
            }
        }

        if !self.backend.endpoint.starts_with("https://")
            && !self.backend.endpoint.starts_with("http://")
        {
            return Err(ConfigLoadError::InvalidValue {
                key: "backend.endpoint".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(ConfigLoadError::InvalidValue {
                key: "assistant.temperature".to_string(),
                message: "Must be between 0.0 and 2.0".to_string(),
            });
        }

        if self.assistant.max_output_tokens == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "assistant.max_output_tokens".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    /// A fully populated config for the in-memory backend, no environment needed.
    pub fn offline() -> Self {
        let mut config = Self::default();
        config.backend.endpoint = "http://localhost/v1".to_string();
        config.backend.project_id = "offline".to_string();
        config.backend.database_id = "offline".to_string();
        config.backend.messages_collection_id = "messages".to_string();
        config.backend.chatrooms_collection_id = "chatrooms".to_string();
        config.backend.bucket_id = "media".to_string();
        config.identity.publishable_key = "pk_test_offline".to_string();
        config
    }

    /// Copy safe to print: secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.assistant.api_key.as_mut() {
            *key = mask_secret(key);
        }
        copy.identity.publishable_key = mask_secret(&copy.identity.publishable_key);
        copy
    }

    pub fn assistant_enabled(&self) -> bool {
        self.assistant.api_key.is_some()
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "*".repeat(secret.chars().count());
    }
    format!("{}****", secret.chars().take(8).collect::<String>())
}

/// Config files consulted in order; later files override earlier ones.
pub fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("parlor.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("parlor").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".parlor").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".parlor").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parlor"))
}

pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("parlor"))
}

pub fn ensure_data_dir() -> Result<PathBuf, std::io::Error> {
    let data_dir = get_data_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
    })?;

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete() -> ParlorConfig {
        let mut config = ParlorConfig::default();
        config.backend.project_id = "68ac5aa4000cb19f4e2a".to_string();
        config.backend.database_id = "chat".to_string();
        config.backend.messages_collection_id = "messages".to_string();
        config.backend.chatrooms_collection_id = "chatrooms".to_string();
        config.backend.bucket_id = "media".to_string();
        config.identity.publishable_key = "pk_test_Y2xlcmsuZXhhbXBsZS5jb20k".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = ParlorConfig::default();

        assert_eq!(config.backend.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(config.assistant.model, "gemini-1.5-flash");
        assert_eq!(config.assistant.max_output_tokens, 512);
        assert!((config.assistant.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tui.tick_rate_ms, 250);
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = complete();
        config.assistant.api_key = Some("AIzaSyExampleKey".to_string());
        let shown = config.redacted();
        assert_eq!(shown.assistant.api_key.as_deref(), Some("AIzaSyEx****"));
        assert_eq!(shown.identity.publishable_key, "pk_test_****");
        assert_eq!(shown.backend.project_id, config.backend.project_id);
    }

    #[test]
    fn test_missing_required_is_fatal() {
        let err = ParlorConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingRequired(ref k) if k == "backend.project_id"));

        let mut config = complete();
        config.backend.bucket_id = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingRequired(ref k) if k == "backend.bucket_id"));

        let mut config = complete();
        config.identity.publishable_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(complete().validate().is_ok());
        assert!(ParlorConfig::offline().validate().is_ok());
    }

    #[test]
    fn test_assistant_key_is_optional() {
        let config = complete();
        assert!(config.validate().is_ok());
        assert!(!config.assistant_enabled());
    }

    #[test]
    fn test_validation_invalid_values() {
        let mut config = complete();
        config.backend.endpoint = "cloud.appwrite.io/v1".to_string();
        assert!(config.validate().is_err());

        let mut config = complete();
        config.assistant.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = complete();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = complete();
        config.logging.level = "parlor_core=debug,reqwest=warn".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("EXPO_PUBLIC_APPWRITE_PROJECT_ID", "proj"),
            ("EXPO_PUBLIC_APPWRITE_BUCKET_ID", "bucket"),
            ("EXPO_PUBLIC_CLERK_PUBLISHABLE_KEY", "pk_live_abc"),
            ("GEMINI_API_KEY", "gemini-key"),
            ("PARLOR_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ParlorConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend.project_id, "proj");
        assert_eq!(config.backend.bucket_id, "bucket");
        assert_eq!(config.identity.publishable_key, "pk_live_abc");
        assert_eq!(config.assistant.api_key.as_deref(), Some("gemini-key"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = complete();
        config.apply_env_overrides(|k| {
            (k == "EXPO_PUBLIC_APPWRITE_PROJECT_ID").then(|| "   ".to_string())
        });
        assert_eq!(config.backend.project_id, "68ac5aa4000cb19f4e2a");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parlor.toml");
        std::fs::write(
            &path,
            r#"
[backend]
project_id = "p"
database_id = "d"
messages_collection_id = "m"
chatrooms_collection_id = "c"
bucket_id = "b"

[identity]
publishable_key = "pk_test_x"

[assistant]
temperature = 0.2
"#,
        )
        .unwrap();

        let config = ParlorConfig::load_from_paths(vec![path]).unwrap();
        assert_eq!(config.backend.database_id, "d");
        assert!((config.assistant.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_directory_helpers() {
        assert!(get_config_dir().is_some());
        assert!(get_data_dir().is_some());
    }
}
