use super::models::Config;
use crate::hosts::HostTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Retry policy for '{resolver}' must allow at least one attempt")]
    ZeroRetryAttempts { resolver: String },

    #[error("Paging policy for '{resolver}' must be positive: {field} = 0")]
    InvalidPaging { resolver: String, field: String },

    #[error("invalid_char_substitute '{value}' must not contain a path separator")]
    InvalidSubstitute { value: String },

    #[error("http.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("hosts.disabled references unknown host '{name}'")]
    UnknownHost { name: String },

    #[error("Filename template must not be empty when set")]
    EmptyTemplate,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_http(config)?;
    validate_resolvers(config)?;
    validate_naming(config)?;
    validate_hosts(config)?;
    validate_run(config)?;
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }
    Ok(())
}

fn validate_resolvers(config: &Config) -> Result<(), ValidationError> {
    if config.resolvers.pornhub.max_attempts == 0 {
        return Err(ValidationError::ZeroRetryAttempts {
            resolver: "pornhub".to_string(),
        });
    }

    let paging = &config.resolvers.instagram;
    for (field, value) in [("page_size", paging.page_size), ("max_pages", paging.max_pages)] {
        if value == 0 {
            return Err(ValidationError::InvalidPaging {
                resolver: "instagram".to_string(),
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_naming(config: &Config) -> Result<(), ValidationError> {
    let substitute = &config.naming.invalid_char_substitute;
    if substitute.contains(['/', '\\']) {
        return Err(ValidationError::InvalidSubstitute {
            value: substitute.clone(),
        });
    }
    Ok(())
}

/// Every disabled host must name a builtin signature, so typos surface early
fn validate_hosts(config: &Config) -> Result<(), ValidationError> {
    let table = HostTable::builtin();
    for name in &config.hosts.disabled {
        if !table.contains_name(name) {
            return Err(ValidationError::UnknownHost { name: name.clone() });
        }
    }
    Ok(())
}

fn validate_run(config: &Config) -> Result<(), ValidationError> {
    if let Some(template) = &config.run.custom_filename_template {
        if template.trim().is_empty() {
            return Err(ValidationError::EmptyTemplate);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_retry_attempts() {
        let mut config = Config::default();
        config.resolvers.pornhub.max_attempts = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroRetryAttempts { .. })
        ));
    }

    #[test]
    fn test_zero_page_size() {
        let mut config = Config::default();
        config.resolvers.instagram.page_size = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidPaging { .. })));
    }

    #[test]
    fn test_separator_substitute_rejected() {
        let mut config = Config::default();
        config.naming.invalid_char_substitute = "/".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidSubstitute { .. })
        ));
    }

    #[test]
    fn test_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyUserAgent)
        ));
    }

    #[test]
    fn test_unknown_disabled_host() {
        let mut config = Config::default();
        config.hosts.disabled = vec!["gofile.io".to_string(), "nosuchhost.example".to_string()];

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::UnknownHost { name }) if name == "nosuchhost.example"
        ));
    }

    #[test]
    fn test_blank_template_rejected() {
        let mut config = Config::default();
        config.run.custom_filename_template = Some(String::new());

        assert!(matches!(validate(&config), Err(ValidationError::EmptyTemplate)));
    }
}
