//! Terminal presentation of the panel.
//!
//! Live per-agent lines are drawn with indicatif while a request runs;
//! once everything has settled a text or JSON summary is produced from
//! the final snapshot.

use crate::models::{Agent, AgentStatus};
use crate::panel::stats::StatsSummary;
use crate::panel::{AgentSnapshot, PanelSnapshot};
use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

/// Characters of the answer shown on a live line.
const LIVE_TAIL_CHARS: usize = 60;

/// One spinner line per agent.
pub struct LiveView {
    multi: MultiProgress,
    bars: Vec<(Agent, ProgressBar)>,
}

impl LiveView {
    pub fn new(agents: &[Agent], hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let style = ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bars = agents
            .iter()
            .map(|agent| {
                let pb = multi.add(ProgressBar::new_spinner());
                pb.set_style(style.clone());
                pb.set_message(format!("{:<22} Ready", agent.display_name()));
                (*agent, pb)
            })
            .collect();

        Self { multi, bars }
    }

    /// Redraw every line from `snapshot`.
    pub fn render(&self, snapshot: &PanelSnapshot) {
        for (agent, pb) in &self.bars {
            if let Some(state) = snapshot.agents.iter().find(|a| a.agent == *agent) {
                pb.set_message(agent_line(state, Some(LIVE_TAIL_CHARS)));
                pb.tick();
            }
        }
    }

    /// Freeze every line at its final state.
    pub fn finish(&self, snapshot: &PanelSnapshot) {
        for (agent, pb) in &self.bars {
            match snapshot.agents.iter().find(|a| a.agent == *agent) {
                Some(state) => pb.finish_with_message(agent_line(state, Some(LIVE_TAIL_CHARS))),
                None => pb.finish(),
            }
        }
        if let Err(e) = self.multi.clear() {
            debug!("Failed to clear live view: {}", e);
        }
    }
}

/// Status line for one agent, optionally with the tail of its answer.
pub fn agent_line(agent: &AgentSnapshot, tail: Option<usize>) -> String {
    let mut line = format!(
        "{:<22} {:<16} {:>6}ms {:>5} tokens {:>6} t/s",
        agent.name, agent.status_label, agent.elapsed_ms, agent.tokens, agent.tps
    );

    if let Some(max) = tail {
        let shown = tail_chars(&agent.text, max);
        if !shown.is_empty() {
            let cursor = if agent.typing { "▌" } else { "" };
            line.push_str(&format!(" │ {}{}", shown, cursor));
        }
    }

    line
}

/// The last `max` characters of `text`, on one line.
fn tail_chars(text: &str, max: usize) -> String {
    let flat: String = text.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    let count = flat.chars().count();
    if count <= max {
        return flat;
    }
    let skipped: String = flat.chars().skip(count - max + 1).collect();
    format!("…{}", skipped)
}

/// Human-readable summary of a finished request.
pub fn render_text_summary(snapshot: &PanelSnapshot) -> String {
    let mut output = String::new();

    output.push_str("\n📊 Panel Summary:\n");
    if let Some(ref session_id) = snapshot.session_id {
        output.push_str(&format!("   Session: {}\n", session_id));
    }
    output.push_str(&format!("   {}\n\n", snapshot.api_status));

    for agent in &snapshot.agents {
        output.push_str(&format!("   {}\n", agent_line(agent, None)));
        if !agent.text.is_empty() {
            output.push_str(&format!("      {}\n", agent.text));
        }
        output.push('\n');
    }

    output.push_str(&render_stats(&snapshot.stats));
    output
}

/// Session statistics block.
pub fn render_stats(stats: &StatsSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("   Total requests: {}\n", stats.total_requests));
    if let Some(avg) = stats.average_response_ms {
        output.push_str(&format!("   Average response time: {}ms\n", avg));
    }
    output.push_str(&format!(
        "   Fastest: {}\n",
        stats.fastest.map(|a| a.display_name()).unwrap_or("-")
    ));
    output.push_str(&format!(
        "   Slowest: {}\n",
        stats.slowest.map(|a| a.display_name()).unwrap_or("-")
    ));

    for entry in &stats.agent_averages {
        output.push_str(&format!(
            "      {:<22} {:>6}ms avg over {}\n",
            entry.agent.display_name(),
            entry.average_ms,
            entry.responses
        ));
    }

    output
}

/// Checklist of enabled agents.
pub fn render_selection(selection: &[(Agent, bool)]) -> String {
    selection
        .iter()
        .map(|(agent, enabled)| {
            format!(
                "   [{}] {:<12} {}",
                if *enabled { "x" } else { " " },
                agent.id(),
                agent.display_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON document of a finished request.
pub fn render_json_summary(snapshot: &PanelSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("Failed to serialize panel results")
}

/// Whether any agent ended in error.
pub fn has_errors(snapshot: &PanelSnapshot) -> bool {
    snapshot
        .agents
        .iter()
        .any(|a| a.status == AgentStatus::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::stats::AgentAverage;

    fn agent(status: AgentStatus, text: &str) -> AgentSnapshot {
        AgentSnapshot {
            agent: Agent::Anthropic,
            name: Agent::Anthropic.display_name(),
            status,
            status_label: status.label(false),
            text: text.to_string(),
            elapsed_ms: 1234,
            tokens: 7,
            tps: 5.7,
            typing: false,
        }
    }

    fn snapshot(agents: Vec<AgentSnapshot>) -> PanelSnapshot {
        PanelSnapshot {
            session_id: Some("session_1".to_string()),
            demo: false,
            api_status: "API Status: Working ✅".to_string(),
            agents,
            stats: StatsSummary {
                total_requests: 1,
                average_response_ms: Some(1234),
                fastest: Some(Agent::Anthropic),
                slowest: None,
                agent_averages: vec![AgentAverage {
                    agent: Agent::Anthropic,
                    average_ms: 1234,
                    responses: 1,
                }],
            },
        }
    }

    #[test]
    fn test_agent_line_contains_metrics() {
        let line = agent_line(&agent(AgentStatus::Completed, "hi there"), Some(60));
        assert!(line.contains("🧠 Anthropic"));
        assert!(line.contains("Completed ✅"));
        assert!(line.contains("1234ms"));
        assert!(line.contains("7 tokens"));
        assert!(line.contains("5.7 t/s"));
        assert!(line.ends_with("hi there"));
    }

    #[test]
    fn test_tail_chars_truncates_long_text() {
        assert_eq!(tail_chars("short", 10), "short");
        assert_eq!(tail_chars("abcdefghij", 5), "…ghij");
        assert_eq!(tail_chars("a\nb", 10), "a b");
    }

    #[test]
    fn test_text_summary() {
        let summary = render_text_summary(&snapshot(vec![agent(
            AgentStatus::Completed,
            "full answer",
        )]));
        assert!(summary.contains("Session: session_1"));
        assert!(summary.contains("full answer"));
        assert!(summary.contains("Average response time: 1234ms"));
        assert!(summary.contains("Fastest: 🧠 Anthropic"));
        assert!(summary.contains("Slowest: -"));
        assert!(summary.contains("1234ms avg over 1"));
    }

    #[test]
    fn test_selection_checklist() {
        let listing = render_selection(&[(Agent::OpenAi, true), (Agent::Groq, false)]);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("   [x] openAi"));
        assert!(lines[1].starts_with("   [ ] groq"));
    }

    #[test]
    fn test_json_summary() {
        let json = render_json_summary(&snapshot(vec![agent(AgentStatus::Error, "x")])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["agents"][0]["agent"], "anthropic");
        assert_eq!(value["agents"][0]["status"], "error");
        assert_eq!(value["stats"]["fastest"], "anthropic");
        assert_eq!(value["stats"]["agent_averages"][0]["average_ms"], 1234);
    }

    #[test]
    fn test_has_errors() {
        assert!(has_errors(&snapshot(vec![agent(AgentStatus::Error, "")])));
        assert!(!has_errors(&snapshot(vec![agent(AgentStatus::Completed, "")])));
    }
}
