//! Data models for the AI panel.
//!
//! This module contains the agent roster, lifecycle statuses and the
//! wire types exchanged with the aggregation endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder shown for an agent the endpoint returned nothing for.
pub const NO_RESPONSE_MESSAGE: &str = "No response from this agent";

/// Message shown on every active agent when the endpoint call fails.
///
/// Transport errors are not classified; a browser-era CORS failure, a
/// timeout and a 500 all end up here.
pub const BLOCKED_MESSAGE: &str = "CORS blocked - try demo mode or deploy to Netlify";

/// Prompt used by demo mode when the user did not type one.
pub const DEFAULT_DEMO_PROMPT: &str = "What is the best AI model for text analysis?";

/// One provider slot in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Agent {
    OpenAi,
    Anthropic,
    Gemini,
    XAiGrok,
    Perplexity,
    Diffy,
    DeepSeek,
    Groq,
    Response,
}

impl Agent {
    /// Every agent, in the order the panel lays them out.
    pub const ALL: [Agent; 9] = [
        Agent::OpenAi,
        Agent::Anthropic,
        Agent::Gemini,
        Agent::XAiGrok,
        Agent::Perplexity,
        Agent::Diffy,
        Agent::DeepSeek,
        Agent::Groq,
        Agent::Response,
    ];

    /// Key used for this agent in the endpoint's JSON response.
    pub fn id(&self) -> &'static str {
        match self {
            Agent::OpenAi => "openAi",
            Agent::Anthropic => "anthropic",
            Agent::Gemini => "gemini",
            Agent::XAiGrok => "xAiGrok",
            Agent::Perplexity => "perplexity",
            Agent::Diffy => "diffy",
            Agent::DeepSeek => "deepSeek",
            Agent::Groq => "groq",
            Agent::Response => "response",
        }
    }

    /// Human-readable name with its emoji badge.
    pub fn display_name(&self) -> &'static str {
        match self {
            Agent::OpenAi => "🤖 OpenAI",
            Agent::Anthropic => "🧠 Anthropic",
            Agent::Gemini => "💎 Gemini",
            Agent::XAiGrok => "🚀 xAI Grok",
            Agent::Perplexity => "🔍 Perplexity",
            Agent::Diffy => "⚡ Diffy",
            Agent::DeepSeek => "🌊 DeepSeek",
            Agent::Groq => "⚡ Groq",
            Agent::Response => "📝 General Response",
        }
    }

    /// Canned answer typed out in demo mode.
    pub fn demo_response(&self) -> &'static str {
        match self {
            Agent::OpenAi => "For text analysis, I recommend GPT-4 Turbo for comprehensive understanding, with excellent context retention and nuanced interpretation capabilities.",
            Agent::Anthropic => "Claude 3.5 Sonnet excels at text analysis with strong reasoning abilities, particularly for complex document analysis and content evaluation.",
            Agent::Gemini => "Gemini Pro offers excellent text analysis with multimodal capabilities, great for processing documents with mixed content types.",
            Agent::XAiGrok => "Grok provides real-time analysis with web access, making it ideal for analyzing current events and trending topics in text.",
            Agent::Perplexity => "For text analysis, combine multiple approaches: sentiment analysis, entity extraction, and semantic search for comprehensive insights.",
            Agent::Diffy => "Consider using ensemble methods with multiple models - GPT-4 for reasoning, BERT for classification, and T5 for summarization.",
            Agent::DeepSeek => "DeepSeek Coder V2 offers excellent text analysis for technical documents and code-related content with strong reasoning.",
            Agent::Groq => "Groq provides ultra-fast inference for text analysis, ideal for real-time applications requiring immediate response.",
            Agent::Response => "Best text analysis models: GPT-4 Turbo (general), Claude 3.5 (reasoning), Gemini Pro (multimodal), specialized BERT variants (classification).",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Agent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Agent::ALL
            .into_iter()
            .find(|agent| agent.id().to_lowercase() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Agent::ALL.iter().map(|a| a.id()).collect();
                format!("Unknown agent '{}'. Known agents: {}", s.trim(), known.join(", "))
            })
    }
}

/// Lifecycle of one agent within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Responding,
    Completed,
    Error,
}

impl AgentStatus {
    /// Whether the agent has finished for this request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Error)
    }

    /// Status line shown next to the agent.
    pub fn label(&self, demo: bool) -> &'static str {
        match (self, demo) {
            (AgentStatus::Idle, _) => "Waiting...",
            (AgentStatus::Responding, false) => "Responding...",
            (AgentStatus::Responding, true) => "Simulating...",
            (AgentStatus::Completed, false) => "Completed ✅",
            (AgentStatus::Completed, true) => "Demo Complete ✨",
            (AgentStatus::Error, _) => "Error ❌",
        }
    }
}

/// Reachability of the aggregation endpoint as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "kebab-case")]
pub enum ApiStatus {
    #[default]
    Unknown,
    Working,
    CorsError(Option<String>),
    Demo,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Unknown => write!(f, "API Status: Testing..."),
            ApiStatus::Working => write!(f, "API Status: Working ✅"),
            ApiStatus::CorsError(None) => write!(f, "API Status: CORS Blocked 🚫"),
            ApiStatus::CorsError(Some(message)) => {
                write!(f, "API Status: CORS Blocked 🚫 - {}", message)
            }
            ApiStatus::Demo => write!(f, "API Status: Demo Mode ✨"),
        }
    }
}

/// Body POSTed to the aggregation endpoint. Empty fields are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl PanelRequest {
    /// Build a request, dropping blank fields.
    pub fn new(session_id: &str, instructions: Option<&str>, prompt: &str) -> Self {
        Self {
            session_id: non_empty(Some(session_id)),
            instructions: non_empty(instructions),
            prompt: non_empty(Some(prompt)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Endpoint response: agent id to answer text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PanelResponse(pub HashMap<String, Value>);

impl PanelResponse {
    /// Answer for an agent, if the endpoint produced a non-empty string.
    pub fn text_for(&self, agent: Agent) -> Option<&str> {
        self.0
            .get(agent.id())
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Input collected from the presentation surface for one request.
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
    pub prompt: String,
    pub session_id: Option<String>,
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_ids_round_trip_through_from_str() {
        for agent in Agent::ALL {
            assert_eq!(agent.id().parse::<Agent>(), Ok(agent));
        }
        assert_eq!("OPENAI".parse::<Agent>(), Ok(Agent::OpenAi));
        assert!("mistral".parse::<Agent>().is_err());
    }

    #[test]
    fn test_agent_serde_uses_wire_ids() {
        let json = serde_json::to_string(&Agent::XAiGrok).unwrap();
        assert_eq!(json, "\"xAiGrok\"");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(AgentStatus::Responding.label(false), "Responding...");
        assert_eq!(AgentStatus::Responding.label(true), "Simulating...");
        assert_eq!(AgentStatus::Completed.label(true), "Demo Complete ✨");
        assert_eq!(AgentStatus::Error.label(true), "Error ❌");
        assert!(AgentStatus::Completed.is_terminal());
        assert!(!AgentStatus::Responding.is_terminal());
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let request = PanelRequest::new("session_1", Some("   "), "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"sessionId": "session_1", "prompt": "hello"})
        );
    }

    #[test]
    fn test_response_text_for_skips_empty_and_non_strings() {
        let response: PanelResponse = serde_json::from_value(serde_json::json!({
            "openAi": "text",
            "anthropic": "",
            "gemini": 42
        }))
        .unwrap();

        assert_eq!(response.text_for(Agent::OpenAi), Some("text"));
        assert_eq!(response.text_for(Agent::Anthropic), None);
        assert_eq!(response.text_for(Agent::Gemini), None);
        assert_eq!(response.text_for(Agent::Groq), None);
    }

    #[test]
    fn test_api_status_display() {
        assert_eq!(ApiStatus::Working.to_string(), "API Status: Working ✅");
        assert_eq!(
            ApiStatus::CorsError(Some("HTTP 500".to_string())).to_string(),
            "API Status: CORS Blocked 🚫 - HTTP 500"
        );
    }
}
