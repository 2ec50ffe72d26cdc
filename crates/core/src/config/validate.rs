use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scanner extensions are dotted suffixes
/// - Blocklist entries are single tokens (names are split on `.`, `_` and `-`)
/// - Provider throttle and timeout are positive, credentials come in pairs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    for ext in &config.scanner.extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "scanner.extensions entry '{}' must look like '.zip'",
                ext
            )));
        }
    }

    for entry in &config.scanner.blocklist {
        if entry.is_empty() || entry.contains(['.', '_', '-']) {
            return Err(ConfigError::ValidationError(format!(
                "scanner.blocklist entry '{}' must be a single token without '.', '_' or '-'",
                entry
            )));
        }
    }

    if config.provider.requests_per_second == 0 {
        return Err(ConfigError::ValidationError(
            "provider.requests_per_second must be greater than 0".to_string(),
        ));
    }

    if config.provider.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "provider.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.provider.client_id.is_some() != config.provider.client_secret.is_some() {
        return Err(ConfigError::ValidationError(
            "provider.client_id and provider.client_secret must be set together".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ScannerConfig, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_undotted_extension_fails() {
        let config = Config {
            scanner: ScannerConfig {
                extensions: vec!["zip".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());

        let config = Config {
            scanner: ScannerConfig {
                extensions: vec![".".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_rate_fails() {
        let config = Config {
            provider: ProviderConfig {
                requests_per_second: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let config = Config {
            provider: ProviderConfig {
                timeout_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_separator_in_blocklist_fails() {
        for entry in ["r.g.", "v1.0", "scene_group", "multi-5", ""] {
            let config = Config {
                scanner: ScannerConfig {
                    blocklist: vec!["codex".to_string(), entry.to_string()],
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(
                matches!(validate_config(&config), Err(ConfigError::ValidationError(_))),
                "accepted {:?}",
                entry
            );
        }
    }

    #[test]
    fn test_default_blocklist_is_single_tokens() {
        let config = Config::default();
        assert!(config
            .scanner
            .blocklist
            .iter()
            .all(|e| !e.contains(['.', '_', '-'])));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_half_credentials_fails() {
        let config = Config {
            provider: ProviderConfig {
                client_id: Some("id".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }
}
