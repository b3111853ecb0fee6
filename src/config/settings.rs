use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub gerrit: GerritConfig,
    pub git: GitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GerritConfig {
    #[serde(default)]
    pub host: String,
    pub http_port: u16,
    #[serde(default)]
    pub username: String,
    pub password_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_password: Option<String>,
    #[serde(default)]
    pub project: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitConfig {
    pub binary: String,
    pub remote: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub audit_log: bool,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gerrit-flow"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Err(ConfigError::ReadError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Config file not found",
            )));
        }

        Self::from_toml(&fs::read_to_string(&path)?)
    }

    /// Load configuration, falling back to defaults when no file exists yet
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            other => other,
        }
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)?;

        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;

        // Owner read/write only: the file may hold the HTTP password
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            gerrit: GerritConfig {
                host: String::new(),
                http_port: 8080,
                username: String::new(),
                password_env: "GERRIT_HTTP_PASSWORD".to_string(),
                http_password: None,
                project: String::new(),
            },
            git: GitConfig {
                binary: "git".to_string(),
                remote: "origin".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                audit_log: true,
            },
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gerrit.http_port == 0 {
            return Err(ConfigError::InvalidValue(
                "http_port must be greater than 0".to_string(),
            ));
        }

        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue("git.binary must not be empty".to_string()));
        }

        if self.git.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue("git.remote must not be empty".to_string()));
        }

        Ok(())
    }
}

impl GerritConfig {
    /// HTTP password from the environment variable, falling back to the config file
    pub fn http_password(&self) -> Option<String> {
        if let Ok(password) = std::env::var(&self.password_env) {
            if !password.is_empty() {
                return Some(password);
            }
        }

        self.http_password.clone()
    }

    /// Base URL of the authenticated REST API, e.g. `http://host:8080/a/`
    pub fn rest_base_url(&self) -> Option<String> {
        if self.host.is_empty() {
            return None;
        }
        Some(format!("http://{}:{}/a/", self.host, self.http_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.gerrit.http_port, 8080);
        assert_eq!(config.git.remote, "origin");
        assert!(config.logging.audit_log);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default_config().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default_config();
        config.gerrit.http_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_remote() {
        let mut config = Config::default_config();
        config.git.remote = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
[gerrit]
host = "review.example.org"
http_port = 8081
username = "jdoe"
password_env = "NONEXISTENT_GERRIT_PASSWORD"
http_password = "secret"
project = "platform/core"

[git]
binary = "git"
remote = "gerrit"

[logging]
level = "debug"
audit_log = false
"#,
        )
        .unwrap();

        assert_eq!(config.gerrit.http_port, 8081);
        assert_eq!(config.git.remote, "gerrit");
        assert_eq!(config.gerrit.http_password().as_deref(), Some("secret"));
        assert_eq!(
            config.gerrit.rest_base_url().as_deref(),
            Some("http://review.example.org:8081/a/")
        );
    }

    #[test]
    fn test_rest_base_url_requires_host() {
        assert!(Config::default_config().gerrit.rest_base_url().is_none());
    }

    #[test]
    fn test_password_from_env() {
        unsafe {
            std::env::set_var("GERRIT_FLOW_TEST_PASSWORD", "from-env");
        }
        let mut config = Config::default_config();
        config.gerrit.password_env = "GERRIT_FLOW_TEST_PASSWORD".to_string();
        config.gerrit.http_password = Some("from-file".to_string());

        assert_eq!(config.gerrit.http_password().as_deref(), Some("from-env"));

        unsafe {
            std::env::remove_var("GERRIT_FLOW_TEST_PASSWORD");
        }
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default_config();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(config.gerrit.http_port, parsed.gerrit.http_port);
        assert_eq!(config.git.binary, parsed.git.binary);
    }
}
