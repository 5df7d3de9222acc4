/// Application configuration
///
/// The only knob is the generation API base URL, taken from the
/// ISLAND_API_URL environment variable. Everything else (poll pacing,
/// timeouts) is a compile-time constant next to the code that uses it.
use std::env;

/// Environment variable selecting the API base URL
pub const API_URL_VAR: &str = "ISLAND_API_URL";

/// Base URL used when the environment variable is unset
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the generation API, without a trailing slash
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the environment
    pub fn from_env() -> Self {
        let api_url = env::var(API_URL_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self { api_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_localhost() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        // Mirror the normalization from_env applies
        let raw = "http://gpu-box:8000/";
        let trimmed = raw.trim().trim_end_matches('/');
        assert_eq!(trimmed, "http://gpu-box:8000");
    }
}
