use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Service URLs are present and have no trailing slash
/// - Timeouts and intervals are nonzero
/// - Load watermarks and per-program bounds are ordered
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, url) in [
        ("service.base_url", &config.service.base_url),
        ("service.status_base_url", &config.service.status_base_url),
    ] {
        if url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{name} cannot be empty"
            )));
        }
        if url.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "{name} must not end with a slash"
            )));
        }
    }

    if config.service.timeout_secs == 0 || config.service.upload_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "service timeouts cannot be 0".to_string(),
        ));
    }

    if config.poller.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "poller.interval_secs cannot be 0".to_string(),
        ));
    }

    let admission = &config.admission;
    if admission.retune_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "admission.retune_interval_secs cannot be 0".to_string(),
        ));
    }
    if admission.cpu_low_percent >= admission.cpu_high_percent {
        return Err(ConfigError::ValidationError(
            "admission.cpu_low_percent must be below cpu_high_percent".to_string(),
        ));
    }
    if admission.memory_low_percent >= admission.memory_high_percent {
        return Err(ConfigError::ValidationError(
            "admission.memory_low_percent must be below memory_high_percent".to_string(),
        ));
    }
    if admission.multiplier_floor > admission.multiplier_ceil {
        return Err(ConfigError::ValidationError(
            "admission.multiplier_floor must not exceed multiplier_ceil".to_string(),
        ));
    }
    if admission.min_per_program > admission.max_per_program {
        return Err(ConfigError::ValidationError(
            "admission.min_per_program must not exceed max_per_program".to_string(),
        ));
    }

    Ok(())
}
