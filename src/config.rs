use crate::error::ConfigError;
use crate::models::Language;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_API_URL: &str = "NEXUS_API_URL";
pub const ENV_UPLOAD_DELAY_MS: &str = "NEXUS_UPLOAD_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NEXUS_REQUEST_TIMEOUT_SECS";
pub const ENV_LANGUAGE: &str = "NEXUS_LANGUAGE";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the assistant backend.
    pub api_url: Url,
    /// Pause inserted between two uploads of the same batch.
    pub upload_delay: Duration,
    /// Per-request timeout for the HTTP client; `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Language a new conversation starts in.
    pub language: Language,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            upload_delay: DEFAULT_UPLOAD_DELAY,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            language: Language::En,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_url(api_url)?,
            ..Self::default()
        })
    }

    /// Defaults overridden by `NEXUS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from any key/value source. Blank values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = parse_url(&url)?;
        }
        if let Some(ms) = get(ENV_UPLOAD_DELAY_MS) {
            self.upload_delay = Duration::from_millis(parse_number(ENV_UPLOAD_DELAY_MS, &ms)?);
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout = match parse_number(ENV_REQUEST_TIMEOUT_SECS, &secs)? {
                0 => None,
                n => Some(Duration::from_secs(n)),
            };
        }
        if let Some(code) = get(ENV_LANGUAGE) {
            self.language = code.parse()?;
        }
        Ok(())
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    // a trailing slash keeps Url::join from dropping the last path segment
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    };
    Url::parse(&normalized).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Mask a secret for display, keeping only the first and last four characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.upload_delay, DEFAULT_UPLOAD_DELAY);
        assert_eq!(config.request_timeout, Some(DEFAULT_REQUEST_TIMEOUT));
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_API_URL, "https://docs.example.com/api"),
                (ENV_UPLOAD_DELAY_MS, "0"),
                (ENV_REQUEST_TIMEOUT_SECS, "0"),
                (ENV_LANGUAGE, "hi"),
            ]))
            .unwrap();
        assert_eq!(config.api_url.as_str(), "https://docs.example.com/api/");
        assert_eq!(config.api_url.join("chat").unwrap().as_str(), "https://docs.example.com/api/chat");
        assert_eq!(config.upload_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.language, Language::Hi);
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(lookup(&[(ENV_API_URL, "  "), (ENV_LANGUAGE, "")]))
            .unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_invalid_overrides_error() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_UPLOAD_DELAY_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = config
            .apply_overrides(lookup(&[(ENV_LANGUAGE, "fr")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask_secret("short"), "****");
    }
}
