//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aipanel.toml` files.

use crate::models::Agent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".aipanel.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Agent selection and refresh cadence.
    #[serde(default)]
    pub panel: PanelConfig,

    /// Typing animation speed.
    #[serde(default)]
    pub typing: TypingConfig,

    /// Demo mode timings.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Aggregation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// URL the prompt is POSTed to.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Request timeout in seconds. Unset means wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_seconds: None,
        }
    }
}

fn default_api_url() -> String {
    "https://tknbjh.buildship.run/ai-panel-of-experts-2e91d458f1d8".to_string()
}

/// Panel layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Agents enabled when the panel starts.
    #[serde(default = "default_agents")]
    pub agents: Vec<Agent>,

    /// How often elapsed time and throughput are recomputed, in ms.
    #[serde(default = "default_refresh_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            refresh_interval_ms: default_refresh_ms(),
        }
    }
}

fn default_agents() -> Vec<Agent> {
    Agent::ALL.to_vec()
}

fn default_refresh_ms() -> u64 {
    10
}

/// Per-character reveal period bounds, in ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    #[serde(default = "default_typing_min")]
    pub min_ms: u64,

    #[serde(default = "default_typing_max")]
    pub max_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_ms: default_typing_min(),
            max_ms: default_typing_max(),
        }
    }
}

fn default_typing_min() -> u64 {
    20
}

fn default_typing_max() -> u64 {
    50
}

/// Demo mode delays, in ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Lower bound of the simulated response delay.
    #[serde(default = "default_demo_min")]
    pub min_delay_ms: u64,

    /// Upper bound of the simulated response delay.
    #[serde(default = "default_demo_max")]
    pub max_delay_ms: u64,

    /// Extra response delay added per agent index.
    #[serde(default = "default_demo_stagger")]
    pub stagger_ms: u64,

    /// Gap between agents entering the responding state.
    #[serde(default = "default_demo_activation")]
    pub activation_step_ms: u64,

    /// When the demo flag is cleared after a demo starts.
    #[serde(default = "default_demo_reset")]
    pub reset_after_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_demo_min(),
            max_delay_ms: default_demo_max(),
            stagger_ms: default_demo_stagger(),
            activation_step_ms: default_demo_activation(),
            reset_after_ms: default_demo_reset(),
        }
    }
}

fn default_demo_min() -> u64 {
    1000
}

fn default_demo_max() -> u64 {
    4000
}

fn default_demo_stagger() -> u64 {
    200
}

fn default_demo_activation() -> u64 {
    100
}

fn default_demo_reset() -> u64 {
    8000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments only override config values they explicitly set.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = Some(timeout);
        }

        if let Some(ref agents) = args.agents {
            self.panel.agents = agents.clone();
        }

        if let Some(ref excluded) = args.exclude_agents {
            self.panel.agents.retain(|agent| !excluded.contains(agent));
        }

        if let Some(speed) = args.typing_speed {
            self.typing.min_ms = speed;
            self.typing.max_ms = speed;
        }
    }

    /// Check the values that would otherwise misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if !self.api.url.starts_with("http://") && !self.api.url.starts_with("https://") {
            anyhow::bail!("API URL must start with 'http://' or 'https://'");
        }
        if self.panel.refresh_interval_ms == 0 {
            anyhow::bail!("panel.refresh_interval_ms must be at least 1");
        }
        if self.typing.min_ms == 0 || self.typing.min_ms > self.typing.max_ms {
            anyhow::bail!("typing.min_ms must be at least 1 and not above typing.max_ms");
        }
        if self.demo.min_delay_ms > self.demo.max_delay_ms {
            anyhow::bail!("demo.min_delay_ms must not be above demo.max_delay_ms");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.panel.refresh_interval_ms)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.panel.agents.len(), 9);
        assert_eq!(config.typing.min_ms, 20);
        assert_eq!(config.typing.max_ms, 50);
        assert_eq!(config.demo.reset_after_ms, 8000);
        assert!(config.api.timeout_seconds.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
url = "http://localhost:8080/panel"
timeout_seconds = 30

[panel]
agents = ["openAi", "anthropic"]

[typing]
min_ms = 5
max_ms = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.url, "http://localhost:8080/panel");
        assert_eq!(config.api.timeout_seconds, Some(30));
        assert_eq!(config.panel.agents, vec![Agent::OpenAi, Agent::Anthropic]);
        assert_eq!(config.panel.refresh_interval_ms, 10);
        assert_eq!(config.typing.min_ms, 5);
        assert_eq!(config.demo.stagger_ms, 200);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[demo]\nmin_delay_ms = 10\nmax_delay_ms = 20").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.demo.min_delay_ms, 10);
        assert_eq!(config.demo.max_delay_ms, 20);
    }

    #[test]
    fn test_validate_rejects_inverted_typing_bounds() {
        let mut config = Config::default();
        config.typing.min_ms = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[panel]"));
        assert!(toml_str.contains("[typing]"));
        assert!(toml_str.contains("[demo]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.panel.agents, Agent::ALL.to_vec());
    }
}
