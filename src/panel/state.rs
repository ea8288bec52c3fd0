//! Panel state shared between the orchestrator and its timer tasks.
//!
//! One [`PanelState`] lives for the whole session behind a
//! [`SharedPanel`] handle. Every task the panel spawns is owned by the
//! [`AgentRuntime`] of the agent it animates, so resetting a runtime is
//! enough to guarantee nothing from a previous request keeps running.

use crate::config::TypingConfig;
use crate::models::{Agent, AgentStatus, ApiStatus};
use crate::panel::stats::{SessionStats, StatsSummary};
use crate::panel::typing::throughput;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Handle to the panel state cloned into every timer task.
pub type SharedPanel = Arc<Mutex<PanelState>>;

/// Lock the panel, recovering the state if a task panicked while holding it.
pub fn lock(panel: &SharedPanel) -> MutexGuard<'_, PanelState> {
    panel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Per-agent state for the request in flight.
#[derive(Debug)]
pub struct AgentRuntime {
    pub start_time: Instant,
    pub token_count: u64,
    pub status: AgentStatus,
    /// Text revealed so far.
    pub text: String,
    pub elapsed_ms: u64,
    pub tps: f64,
    /// Whether the typing indicator is showing.
    pub typing: bool,
    /// Mode the agent started responding in; labels keep it after the
    /// demo flag clears.
    pub demo: bool,
    pub(crate) typing_run: u64,
    pub(crate) refresh_task: Option<JoinHandle<()>>,
    pub(crate) token_task: Option<JoinHandle<()>>,
    pub(crate) typing_task: Option<JoinHandle<()>>,
    pub(crate) pending_task: Option<JoinHandle<()>>,
}

impl AgentRuntime {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            token_count: 0,
            status: AgentStatus::Idle,
            text: String::new(),
            elapsed_ms: 0,
            tps: 0.0,
            typing: false,
            demo: false,
            typing_run: 0,
            refresh_task: None,
            token_task: None,
            typing_task: None,
            pending_task: None,
        }
    }

    /// Recompute elapsed time and throughput as of `now`.
    pub fn refresh_metrics(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.start_time);
        self.elapsed_ms = elapsed.as_millis() as u64;
        if elapsed > Duration::ZERO {
            self.tps = throughput(self.token_count, elapsed);
        }
    }

    /// Cancel the display refresh and token counter tasks.
    pub fn stop_timers(&mut self) {
        if let Some(handle) = self.refresh_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.token_task.take() {
            handle.abort();
        }
    }

    /// Cancel every task this runtime owns.
    pub fn cancel_all(&mut self) {
        self.stop_timers();
        if let Some(handle) = self.typing_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.pending_task.take() {
            handle.abort();
        }
    }

    pub fn has_refresh_task(&self) -> bool {
        self.refresh_task.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn has_token_task(&self) -> bool {
        self.token_task.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Number of live tasks of any kind.
    pub fn live_tasks(&self) -> usize {
        [
            &self.refresh_task,
            &self.token_task,
            &self.typing_task,
            &self.pending_task,
        ]
        .into_iter()
        .filter(|task| task.as_ref().is_some_and(|h| !h.is_finished()))
        .count()
    }
}

impl Drop for AgentRuntime {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Everything the panel knows for the current session.
#[derive(Debug)]
pub struct PanelState {
    active: BTreeSet<Agent>,
    agents: BTreeMap<Agent, AgentRuntime>,
    pub session_id: Option<String>,
    pub is_demo: bool,
    pub api_status: ApiStatus,
    pub request_start: Option<Instant>,
    /// Bumped on every reset; delayed tasks compare against it.
    pub request_id: u64,
    pub stats: SessionStats,
    pub refresh_interval: Duration,
    pub typing: TypingConfig,
    pub(crate) demo_reset_task: Option<JoinHandle<()>>,
}

impl PanelState {
    pub fn new(active: &[Agent], refresh_interval: Duration, typing: TypingConfig) -> Self {
        Self {
            active: active.iter().copied().collect(),
            agents: BTreeMap::new(),
            session_id: None,
            is_demo: false,
            api_status: ApiStatus::Unknown,
            request_start: None,
            request_id: 0,
            stats: SessionStats::new(),
            refresh_interval,
            typing,
            demo_reset_task: None,
        }
    }

    pub fn into_shared(self) -> SharedPanel {
        Arc::new(Mutex::new(self))
    }

    /// Active agents in panel order.
    pub fn active_agents(&self) -> Vec<Agent> {
        self.active.iter().copied().collect()
    }

    pub fn is_active(&self, agent: Agent) -> bool {
        self.active.contains(&agent)
    }

    /// Flip an agent between active and inactive. Returns the new state.
    pub fn toggle_agent(&mut self, agent: Agent) -> bool {
        if !self.active.remove(&agent) {
            self.active.insert(agent);
            true
        } else {
            false
        }
    }

    pub fn select_all(&mut self) {
        self.active = Agent::ALL.into_iter().collect();
    }

    pub fn deselect_all(&mut self) {
        self.active.clear();
    }

    pub fn model_count_label(&self) -> String {
        let count = self.active.len();
        format!("{} model{} selected", count, if count == 1 { "" } else { "s" })
    }

    pub fn agent(&self, agent: Agent) -> Option<&AgentRuntime> {
        self.agents.get(&agent)
    }

    pub fn agent_mut(&mut self, agent: Agent) -> Option<&mut AgentRuntime> {
        self.agents.get_mut(&agent)
    }

    /// Cancel every outstanding task, including the demo reset timer.
    pub fn clear_all_timers(&mut self) {
        for runtime in self.agents.values_mut() {
            runtime.cancel_all();
        }
        if let Some(handle) = self.demo_reset_task.take() {
            handle.abort();
        }
    }

    /// Prepare for a new request: cancel all tasks and start every active
    /// agent from zero at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.clear_all_timers();
        self.agents.clear();
        for agent in &self.active {
            self.agents.insert(*agent, AgentRuntime::new(now));
        }
        self.request_id += 1;
        self.request_start = Some(now);
        debug!(
            request_id = self.request_id,
            agents = self.agents.len(),
            "Panel reset"
        );
    }

    /// True once every agent of the current request has finished.
    pub fn settled(&self) -> bool {
        self.agents.values().all(|rt| rt.status.is_terminal())
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let agents = self
            .agents
            .iter()
            .map(|(agent, rt)| AgentSnapshot {
                agent: *agent,
                name: agent.display_name(),
                status: rt.status,
                status_label: rt.status.label(rt.demo),
                text: rt.text.clone(),
                elapsed_ms: rt.elapsed_ms,
                tokens: rt.token_count,
                tps: rt.tps,
                typing: rt.typing,
            })
            .collect();

        PanelSnapshot {
            session_id: self.session_id.clone(),
            demo: self.is_demo,
            api_status: self.api_status.to_string(),
            agents,
            stats: self.stats.summary(),
        }
    }
}

/// Display state of one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub agent: Agent,
    pub name: &'static str,
    pub status: AgentStatus,
    pub status_label: &'static str,
    pub text: String,
    pub elapsed_ms: u64,
    pub tokens: u64,
    pub tps: f64,
    pub typing: bool,
}

/// Display state of the whole panel.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub session_id: Option<String>,
    pub demo: bool,
    pub api_status: String,
    pub agents: Vec<AgentSnapshot>,
    pub stats: StatsSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(agents: &[Agent]) -> PanelState {
        PanelState::new(agents, Duration::from_millis(10), TypingConfig::default())
    }

    #[test]
    fn test_toggle_and_select() {
        let mut state = state_with(&[Agent::OpenAi]);
        assert_eq!(state.model_count_label(), "1 model selected");

        assert!(state.toggle_agent(Agent::Groq));
        assert!(!state.toggle_agent(Agent::OpenAi));
        assert!(state.is_active(Agent::Groq));
        assert!(!state.is_active(Agent::OpenAi));
        assert_eq!(state.active_agents(), vec![Agent::Groq]);

        state.select_all();
        assert_eq!(state.active_agents(), Agent::ALL.to_vec());
        assert_eq!(state.model_count_label(), "9 models selected");

        state.deselect_all();
        assert!(state.active_agents().is_empty());
        assert_eq!(state.model_count_label(), "0 models selected");
    }

    #[test]
    fn test_active_agents_in_panel_order() {
        let state = state_with(&[Agent::Response, Agent::Anthropic, Agent::OpenAi]);
        assert_eq!(
            state.active_agents(),
            vec![Agent::OpenAi, Agent::Anthropic, Agent::Response]
        );
    }

    #[test]
    fn test_refresh_metrics_rounds_tps_to_one_decimal() {
        let start = Instant::now();
        let mut rt = AgentRuntime::new(start);
        rt.token_count = 10;
        rt.refresh_metrics(start + Duration::from_millis(3000));

        assert_eq!(rt.elapsed_ms, 3000);
        assert_eq!(rt.tps, 3.3);
    }

    #[tokio::test]
    async fn test_reset_only_covers_active_agents() {
        let mut state = state_with(&[Agent::OpenAi, Agent::Gemini]);
        state.reset(Instant::now());

        assert!(state.agent(Agent::OpenAi).is_some());
        assert!(state.agent(Agent::Gemini).is_some());
        assert!(state.agent(Agent::Anthropic).is_none());
        assert_eq!(state.request_id, 1);
        assert!(!state.settled());
    }

    #[tokio::test]
    async fn test_reset_cancels_running_tasks() {
        let mut state = state_with(&[Agent::OpenAi]);
        state.reset(Instant::now());

        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        state.agent_mut(Agent::OpenAi).unwrap().refresh_task = Some(task);

        state.reset(Instant::now());
        tokio::task::yield_now().await;

        assert!(abort.is_finished());
        assert_eq!(state.agent(Agent::OpenAi).unwrap().live_tasks(), 0);
    }
}
