//! Runtime configuration.
//!
//! Built once at startup and passed by reference; nothing in the crate reads
//! the process environment on its own.

use std::{str::FromStr, time::Duration};

use crate::error::{Result, VidseoError};

pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub analysis: AnalysisConfig,
}

/// Frame sampling settings.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Number of evenly spaced frames to capture
    pub frame_count: usize,
    /// JPEG quality in (0, 1]
    pub jpeg_quality: f32,
}

/// Settings for the request sent to the model.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub thinking_budget: u32,
    pub max_description_length: usize,
    pub max_tags_length: usize,
    /// Extra attempts after a rate-limited call. Zero keeps every failure terminal.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frame_count: 8,
            jpeg_quality: 0.7,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            temperature: 0.7,
            thinking_budget: 4000,
            max_description_length: 1500,
            max_tags_length: 500,
            max_retries: 0,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sampler_defaults = SamplerConfig::default();
        let defaults = AnalysisConfig::default();

        let api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());

        Self {
            sampler: SamplerConfig {
                frame_count: parse_var(&lookup, "VIDSEO_FRAME_COUNT")
                    .unwrap_or(sampler_defaults.frame_count),
                jpeg_quality: parse_var(&lookup, "VIDSEO_JPEG_QUALITY")
                    .unwrap_or(sampler_defaults.jpeg_quality),
            },
            analysis: AnalysisConfig {
                api_key,
                base_url: lookup("VIDSEO_API_BASE_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(defaults.base_url),
                model: lookup("VIDSEO_MODEL")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(defaults.model),
                temperature: parse_var(&lookup, "VIDSEO_TEMPERATURE")
                    .unwrap_or(defaults.temperature),
                thinking_budget: parse_var(&lookup, "VIDSEO_THINKING_BUDGET")
                    .unwrap_or(defaults.thinking_budget),
                max_description_length: parse_var(&lookup, "VIDSEO_MAX_DESCRIPTION_LENGTH")
                    .unwrap_or(defaults.max_description_length),
                max_tags_length: parse_var(&lookup, "VIDSEO_MAX_TAGS_LENGTH")
                    .unwrap_or(defaults.max_tags_length),
                max_retries: parse_var(&lookup, "VIDSEO_MAX_RETRIES")
                    .unwrap_or(defaults.max_retries),
                retry_backoff: defaults.retry_backoff,
            },
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl AnalysisConfig {
    /// Validate that the API key is set before any network call
    pub fn validate_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| VidseoError::Configuration {
                reason: format!(
                    "Gemini API key is missing. Set {} in the environment.",
                    API_KEY_ENV_VARS[0]
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.sampler.frame_count, 8);
        assert_eq!(config.analysis.model, "gemini-3-pro-preview");
        assert_eq!(config.analysis.thinking_budget, 4000);
        assert_eq!(config.analysis.max_description_length, 1500);
        assert_eq!(config.analysis.max_tags_length, 500);
        assert_eq!(config.analysis.max_retries, 0);
        assert!(config.analysis.api_key.is_none());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = config_from(&[
            ("VIDSEO_MODEL", "gemini-2.5-flash"),
            ("VIDSEO_TEMPERATURE", "0.2"),
            ("VIDSEO_FRAME_COUNT", "not-a-number"),
            ("VIDSEO_API_BASE_URL", "http://127.0.0.1:9000/"),
        ]);
        assert_eq!(config.analysis.model, "gemini-2.5-flash");
        assert!((config.analysis.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.sampler.frame_count, 8);
        assert_eq!(config.analysis.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_api_key_prefers_gemini_variable() {
        let config = config_from(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "primary")]);
        assert_eq!(config.analysis.api_key.as_deref(), Some("primary"));

        let config = config_from(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "  ")]);
        assert_eq!(config.analysis.api_key.as_deref(), Some("legacy"));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = AnalysisConfig::default();
        assert!(matches!(
            config.validate_api_key(),
            Err(VidseoError::Configuration { .. })
        ));
    }
}
