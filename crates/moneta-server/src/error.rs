use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings path to the environment variable that supplies it,
/// e.g. `bridge.api_key` -> `MONETA_BRIDGE__API_KEY`.
pub fn to_env_var(field: &str) -> String {
    format!("MONETA_{}", field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("bridge.api_key"), "MONETA_BRIDGE__API_KEY");
        assert_eq!(to_env_var("bridge"), "MONETA_BRIDGE");
    }
}
