use serde::Deserialize;
use shared::ClassifierConfig;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/server.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid classifier endpoint: {0}")]
    ClassifierEndpoint(#[from] url::ParseError),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_dir: String,
    pub json_limit_bytes: usize,
    pub classifier: ClassifierSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierSection {
    pub endpoint: String,
    pub api_key: String,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            endpoint: "https://detect.roboflow.com/waste-segregation-sqe9y/1".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let frontend_dir = if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            format!("{}/../frontend/dist", manifest_dir)
        } else {
            "/usr/src/app/frontend/dist".to_string()
        };

        Self {
            port: 8081,
            database_url: "sqlite://waste_segregation.db?mode=rwc".to_string(),
            database_max_connections: 5,
            frontend_dir,
            json_limit_bytes: 16 * 1024 * 1024,
            classifier: ClassifierSection::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the YAML file (if present), then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path =
            std::env::var("SERVER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            log::info!("Loading server config from {}", path);
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            Self::from_yaml(&raw)?
        } else {
            log::info!("No config file at {}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PORT") {
            self.port = parse_value("PORT", value)?;
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.database_url = value;
        }
        if let Some(value) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections = parse_value("DATABASE_MAX_CONNECTIONS", value)?;
        }
        if let Some(value) = lookup("FRONTEND_DIR") {
            self.frontend_dir = value;
        }
        if let Some(value) = lookup("JSON_LIMIT_BYTES") {
            self.json_limit_bytes = parse_value("JSON_LIMIT_BYTES", value)?;
        }
        if let Some(value) = lookup("CLASSIFIER_ENDPOINT") {
            self.classifier.endpoint = value;
        }
        if let Some(value) = lookup("CLASSIFIER_API_KEY") {
            self.classifier.api_key = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database_max_connections",
                value: "0".to_string(),
            });
        }
        self.classifier_config().request_url()?;
        if self.classifier.api_key.is_empty() {
            log::warn!("CLASSIFIER_API_KEY is not set; classification requests will be rejected");
        }
        Ok(())
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            endpoint: self.classifier.endpoint.clone(),
            api_key: self.classifier.api_key.clone(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
