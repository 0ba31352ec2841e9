use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use moneta::providers::gemini;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Failed to parse socket address")
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub host: String,
    pub default_model: String,
    pub allowed_models: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: gemini::DEFAULT_HOST.to_string(),
            default_model: default_model(),
            allowed_models: default_allowed_models(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BridgeSettings {
    #[serde(default = "default_bridge_url")]
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub max_tool_turns: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", gemini::DEFAULT_HOST)?
            .set_default("provider.default_model", default_model())?
            .set_default("bridge.url", default_bridge_url())?
            .add_source(
                Environment::with_prefix("MONETA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("provider.allowed_models"),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Surface missing required fields as the env var the operator must set
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_allowed_models() -> Vec<String> {
    vec!["gemini-2.5-flash".to_string(), "gemini-2.5-pro".to_string()]
}

fn default_bridge_url() -> String {
    "https://mcp.alphavantage.co/mcp".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MONETA_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("MONETA_BRIDGE__API_KEY", "test-bridge-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.provider.host, gemini::DEFAULT_HOST);
        assert_eq!(settings.provider.default_model, "gemini-2.5-flash");
        assert_eq!(
            settings.provider.allowed_models,
            vec!["gemini-2.5-flash", "gemini-2.5-pro"]
        );
        assert_eq!(settings.bridge.url, "https://mcp.alphavantage.co/mcp");
        assert_eq!(settings.bridge.api_key, "test-bridge-key");
        assert_eq!(settings.engine.max_tool_turns, None);

        env::remove_var("MONETA_BRIDGE__API_KEY");
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("MONETA_SERVER__PORT", "9000");
        env::set_var("MONETA_BRIDGE__API_KEY", "test-bridge-key");
        env::set_var("MONETA_BRIDGE__URL", "http://localhost:4000/mcp");
        env::set_var("MONETA_PROVIDER__DEFAULT_MODEL", "gemini-2.5-pro");
        env::set_var("MONETA_ENGINE__MAX_TOOL_TURNS", "8");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.bridge.url, "http://localhost:4000/mcp");
        assert_eq!(settings.provider.default_model, "gemini-2.5-pro");
        assert_eq!(settings.engine.max_tool_turns, Some(8));

        env::remove_var("MONETA_SERVER__PORT");
        env::remove_var("MONETA_BRIDGE__API_KEY");
        env::remove_var("MONETA_BRIDGE__URL");
        env::remove_var("MONETA_PROVIDER__DEFAULT_MODEL");
        env::remove_var("MONETA_ENGINE__MAX_TOOL_TURNS");
    }

    #[test]
    #[serial]
    fn test_missing_bridge_key() {
        clean_env();

        let err = Settings::new().unwrap_err();
        match err {
            ConfigError::MissingEnvVar { env_var } => {
                assert!(env_var.contains("API_KEY") || env_var.contains("BRIDGE"));
            }
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = server_settings.socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:8000");
    }
}
