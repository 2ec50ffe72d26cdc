use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    with_env_overrides(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from defaults and environment variables only.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env_overrides(Figment::from(Serialized::defaults(Config::default())))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn with_env_overrides(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(Env::prefixed("CODEX_").split("__"))
        // Provider credentials keep their conventional names.
        .merge(
            Env::prefixed("IGDB_")
                .only(&["client_id", "client_secret"])
                .map(|key| format!("provider.{}", key).into()),
        )
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
