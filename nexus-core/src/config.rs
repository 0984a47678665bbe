// nexus-core/src/config.rs

//! Runtime configuration, sourced from environment variables.

use crate::errors::NexusError;
use std::fmt;
use url::Url;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_URL_VAR: &str = "API_URL";
pub const MODEL_NAME_VAR: &str = "MODEL_NAME";
pub const TEMPERATURE_VAR: &str = "TEMPERATURE";
pub const MAX_GOAL_ACTIONS_VAR: &str = "MAX_GOAL_ACTIONS";

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_GOAL_ACTIONS: usize = 20;

#[derive(Clone, PartialEq)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub api_url: String,
    pub model_name: String,
    pub temperature: f64,
    pub max_goal_actions: usize,
}

impl RuntimeConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, NexusError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NexusError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or_else(|| {
            NexusError::config(format!("{} environment variable is required", API_KEY_VAR))
        })?;

        let api_url = get(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| {
            NexusError::config(format!("Invalid {} '{}': {}", API_URL_VAR, api_url, e))
        })?;

        let model_name = get(MODEL_NAME_VAR).unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        let temperature = match get(TEMPERATURE_VAR) {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                NexusError::config(format!(
                    "{} must be a number, got '{}'",
                    TEMPERATURE_VAR, raw
                ))
            })?,
            None => DEFAULT_TEMPERATURE,
        };

        let max_goal_actions = match get(MAX_GOAL_ACTIONS_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(NexusError::config(format!(
                        "{} must be a positive integer, got '{}'",
                        MAX_GOAL_ACTIONS_VAR, raw
                    )));
                }
            },
            None => DEFAULT_MAX_GOAL_ACTIONS,
        };

        Ok(Self {
            api_key,
            api_url,
            model_name,
            temperature,
            max_goal_actions,
        })
    }

    /// First 10 characters of the key followed by `...`.
    pub fn masked_api_key(&self) -> String {
        let head: String = self.api_key.chars().take(10).collect();
        format!("{}...", head)
    }

    pub fn completions_endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("api_key", &self.masked_api_key())
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_goal_actions", &self.max_goal_actions)
            .finish()
    }
}
