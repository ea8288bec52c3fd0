//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Agent;
use clap::Parser;
use std::path::PathBuf;

/// AI Panel - ask several AI providers one question
///
/// Sends a prompt to the panel endpoint and types each provider's answer
/// out side by side with live timing and token-rate statistics.
///
/// Examples:
///   aipanel "What is the best model for summarization?"
///   aipanel "Explain CRDTs" --agents openAi,anthropic,gemini
///   aipanel --demo
///   aipanel --interactive
///   aipanel --check
///   aipanel --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Prompt to send to the panel
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Session id forwarded to the endpoint
    ///
    /// A fresh `session_<millis>` id is generated when omitted.
    #[arg(short, long, value_name = "ID")]
    pub session_id: Option<String>,

    /// Extra instructions forwarded with the prompt
    #[arg(short, long, value_name = "TEXT")]
    pub instructions: Option<String>,

    /// Agents to enable (comma-separated)
    ///
    /// Example: --agents openAi,anthropic,groq
    #[arg(short, long, value_name = "AGENTS", value_delimiter = ',')]
    pub agents: Option<Vec<Agent>>,

    /// Agents to disable (comma-separated)
    #[arg(long, value_name = "AGENTS", value_delimiter = ',')]
    pub exclude_agents: Option<Vec<Agent>>,

    /// Run with canned responses instead of calling the endpoint
    #[arg(long)]
    pub demo: bool,

    /// Panel endpoint URL
    #[arg(long, value_name = "URL", env = "AIPANEL_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fixed per-character typing period in milliseconds
    #[arg(long, value_name = "MS")]
    pub typing_speed: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aipanel.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format for the final results (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (no live animation, errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Test whether the endpoint is reachable and exit
    #[arg(long)]
    pub check: bool,

    /// Keep the panel open and read prompts and :commands from stdin
    ///
    /// Statistics accumulate over every request of the session.
    #[arg(short = 'I', long)]
    pub interactive: bool,

    /// Generate a default .aipanel.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the final results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// An empty prompt is not rejected here; the panel reports it the same
    /// way the send button does.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.demo && self.check {
            return Err("Cannot use both --demo and --check".to_string());
        }

        if self.interactive && self.check {
            return Err("Cannot use both --interactive and --check".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(speed) = self.typing_speed {
            if speed == 0 {
                return Err("Typing speed must be at least 1 ms".to_string());
            }
        }

        Ok(())
    }

    /// Whether banners and notices go to stderr so stdout stays a
    /// clean JSON stream.
    pub fn notices_to_stderr(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
