use crate::config::types::{
    AttributeSource, Config, CrawlConfig, FieldConfig, OutputConfig, SelectorConfig,
    StrategyConfig, TargetConfig, UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawl_config(&config.crawl)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_selector_config(&config.selectors)?;
    validate_field_config(&config.fields)?;
    Ok(())
}

/// Validates the target site
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.page_parameter.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page-parameter cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.min_iterations_before_stale_check < 1 {
        return Err(ConfigError::Validation(format!(
            "min-iterations-before-stale-check must be >= 1, got {}",
            config.min_iterations_before_stale_check
        )));
    }

    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.selector_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "selector-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every page-structure selector compiles
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    require_non_empty("listing-markers", config.listing_markers.len())?;
    require_non_empty("identity-sources", config.identity_sources.len())?;

    for selector in config
        .listing_markers
        .iter()
        .chain(&config.cards)
        .chain(&config.next_control)
        .chain(&config.page_controls)
        .chain(&config.detail_markers)
    {
        compile_selector(selector)?;
    }

    validate_attribute_sources(&config.identity_sources)
}

/// Validates field chains, patterns and limits
fn validate_field_config(config: &FieldConfig) -> Result<(), ConfigError> {
    for chain in [
        &config.price,
        &config.bedrooms,
        &config.bathrooms,
        &config.address,
        &config.description,
    ] {
        for strategy in chain {
            match strategy {
                StrategyConfig::Attribute { selector, .. } | StrategyConfig::Text { selector } => {
                    compile_selector(selector)?;
                }
                StrategyConfig::Pattern { pattern } => {
                    compile_pattern(pattern)?;
                }
            }
        }
    }

    for selector in &config.features {
        compile_selector(selector)?;
    }

    validate_attribute_sources(&config.images)?;

    for host in &config.asset_hosts {
        validate_host_pattern(host)?;
    }

    if config.max_images < 1 {
        return Err(ConfigError::Validation(
            "max-images must be >= 1".to_string(),
        ));
    }

    if config.max_features < 1 {
        return Err(ConfigError::Validation(
            "max-features must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_attribute_sources(sources: &[AttributeSource]) -> Result<(), ConfigError> {
    for source in sources {
        compile_selector(&source.selector)?;
        if source.attribute.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "attribute for selector '{}' cannot be empty",
                source.selector
            )));
        }
    }
    Ok(())
}

fn require_non_empty(name: &str, len: usize) -> Result<(), ConfigError> {
    if len == 0 {
        return Err(ConfigError::Validation(format!(
            "{} must contain at least one entry",
            name
        )));
    }
    Ok(())
}

/// Compiles a CSS selector, mapping failure to a config error
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Compiles a regular expression, mapping failure to a config error
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Validates an asset-host pattern (supports a leading "*.")
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
        || host.starts_with('.')
        || host.ends_with('.')
        || host.contains("..")
    {
        return Err(ConfigError::Validation(format!(
            "Invalid asset host pattern '{}'",
            pattern
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        let config = Config::for_url("https://site.test/homes");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = Config::for_url("ftp://site.test/homes");
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_max_pages() {
        let mut config = Config::for_url("https://site.test/homes");
        config.crawl.max_pages = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_broken_selector() {
        let mut config = Config::for_url("https://site.test/homes");
        config.selectors.cards.push("div[[".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_rejects_broken_pattern() {
        let mut config = Config::for_url("https://site.test/homes");
        config.fields.price.push(StrategyConfig::Pattern {
            pattern: "([0-9]+".to_string(),
        });
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_requires_identity_sources() {
        let mut config = Config::for_url("https://site.test/homes");
        config.selectors.identity_sources.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_host_pattern() {
        assert!(validate_host_pattern("cdn.site.test").is_ok());
        assert!(validate_host_pattern("*.site.test").is_ok());

        assert!(validate_host_pattern("").is_err());
        assert!(validate_host_pattern("*.").is_err());
        assert!(validate_host_pattern(".site.test").is_err());
        assert!(validate_host_pattern("site..test").is_err());
        assert!(validate_host_pattern("site.test/").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }
}
