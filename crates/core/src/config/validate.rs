use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - SSH endpoint is set
/// - Record stage has at least one worker
/// - Upload error cap is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.ssh.server.is_empty() {
        return Err(ConfigError::ValidationError(
            "ssh.server cannot be empty".to_string(),
        ));
    }

    if config.record.workers == 0 {
        return Err(ConfigError::ValidationError(
            "record.workers must be greater than 0".to_string(),
        ));
    }

    if config.upload.max_errors == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_errors must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[ssh]
server = "host:22"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_ssh_server_fails() {
        let mut config = valid_config();
        config.ssh.server = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_record_workers_fails() {
        let mut config = valid_config();
        config.record.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_max_errors_fails() {
        let mut config = valid_config();
        config.upload.max_errors = 0;
        assert!(validate_config(&config).is_err());
    }
}
