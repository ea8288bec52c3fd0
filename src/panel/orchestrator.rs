//! Request orchestration.
//!
//! The panel has two entry points: [`Panel::send`] calls the endpoint
//! once and types out whatever came back, [`Panel::run_demo`] types out
//! canned answers on a staggered schedule. Both start with the same
//! synchronous reset so no timer from an earlier request survives.

use crate::client::PanelClient;
use crate::config::{Config, DemoConfig};
use crate::error::{PanelError, PanelResult};
use crate::models::{
    Agent, ApiStatus, PanelRequest, PromptInput, BLOCKED_MESSAGE, DEFAULT_DEMO_PROMPT,
    NO_RESPONSE_MESSAGE,
};
use crate::panel::state::{lock, PanelSnapshot, PanelState, SharedPanel};
use crate::panel::{timer, typing};
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// How a live request ended, once its animations are armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The endpoint answered.
    Answered {
        session_id: String,
        answered: usize,
        missing: usize,
    },
    /// The endpoint could not be reached or refused the request.
    Blocked { session_id: String, reason: String },
}

/// Orchestrates requests against one shared panel state.
pub struct Panel {
    state: SharedPanel,
    client: PanelClient,
    demo: DemoConfig,
}

impl Panel {
    pub fn new(config: &Config) -> PanelResult<Self> {
        let state = PanelState::new(
            &config.panel.agents,
            config.refresh_interval(),
            config.typing.clone(),
        );

        Ok(Self {
            state: state.into_shared(),
            client: PanelClient::new(&config.api)?,
            demo: config.demo.clone(),
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> &SharedPanel {
        &self.state
    }

    pub fn endpoint(&self) -> &str {
        self.client.url()
    }

    pub fn active_agents(&self) -> Vec<Agent> {
        lock(&self.state).active_agents()
    }

    pub fn model_count_label(&self) -> String {
        lock(&self.state).model_count_label()
    }

    /// Every agent with whether it is currently enabled.
    pub fn selection(&self) -> Vec<(Agent, bool)> {
        let state = lock(&self.state);
        Agent::ALL
            .into_iter()
            .map(|agent| (agent, state.is_active(agent)))
            .collect()
    }

    /// Enable or disable one agent for the next request. Returns whether
    /// it is now enabled.
    pub fn toggle_agent(&self, agent: Agent) -> bool {
        let enabled = lock(&self.state).toggle_agent(agent);
        debug!(agent = %agent, enabled, "Agent toggled");
        enabled
    }

    pub fn select_all(&self) {
        lock(&self.state).select_all();
    }

    pub fn deselect_all(&self) {
        lock(&self.state).deselect_all();
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        lock(&self.state).snapshot()
    }

    pub fn settled(&self) -> bool {
        lock(&self.state).settled()
    }

    /// Wait until every agent of the current request has finished.
    ///
    /// There is no timeout: an agent stuck in `responding` keeps this
    /// pending.
    pub async fn wait_settled(&self) {
        let period = lock(&self.state).refresh_interval;
        while !self.settled() {
            time::sleep(period).await;
        }
    }

    /// Cancel every outstanding timer without touching displayed state.
    pub fn shutdown(&self) {
        lock(&self.state).clear_all_timers();
        info!("All panel timers cleared");
    }

    /// Probe the endpoint and remember the result.
    pub async fn check_connection(&self) -> ApiStatus {
        let status = self.client.test_connection().await;
        lock(&self.state).api_status = status.clone();
        status
    }

    /// Send the prompt to the endpoint and animate the answers.
    ///
    /// Validation failures leave the panel untouched. Endpoint failures
    /// are not errors here: every active agent is put into `error` with
    /// the blocked message and the outcome says why.
    pub async fn send(&self, input: PromptInput) -> PanelResult<RequestOutcome> {
        let prompt = input.prompt.trim();
        if prompt.is_empty() {
            return Err(PanelError::EmptyPrompt);
        }

        let (agents, session_id) = {
            let mut state = lock(&self.state);
            let agents = state.active_agents();
            if agents.is_empty() {
                return Err(PanelError::NoActiveAgents);
            }

            let session_id = input
                .session_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .unwrap_or_else(|| format!("session_{}", Utc::now().timestamp_millis()));

            state.is_demo = false;
            state.session_id = Some(session_id.clone());
            state.stats.begin_request();
            self.prepare_for_request(&mut state);
            (agents, session_id)
        };

        let request = PanelRequest::new(&session_id, input.instructions.as_deref(), prompt);
        info!(session_id = %session_id, agents = agents.len(), "Asking the panel");

        match self.client.send(&request).await {
            Ok(result) => {
                let mut state = lock(&self.state);
                state.api_status = ApiStatus::Working;

                let mut answered = 0;
                let mut missing = 0;
                for agent in &agents {
                    match result.text_for(*agent) {
                        Some(text) => {
                            answered += 1;
                            typing::simulate_typing(&mut state, &self.state, *agent, text, None);
                        }
                        None => {
                            missing += 1;
                            if let Some(rt) = state.agent_mut(*agent) {
                                rt.text = NO_RESPONSE_MESSAGE.to_string();
                            }
                            timer::complete(&mut state, *agent);
                        }
                    }
                }

                Ok(RequestOutcome::Answered {
                    session_id,
                    answered,
                    missing,
                })
            }
            Err(e) => {
                warn!("Panel request failed, marking all agents blocked: {}", e);
                let reason = e.to_string();
                let mut state = lock(&self.state);
                state.api_status = ApiStatus::CorsError(Some(reason.clone()));

                for agent in &agents {
                    if let Some(rt) = state.agent_mut(*agent) {
                        rt.text = BLOCKED_MESSAGE.to_string();
                    }
                    timer::fail(&mut state, *agent);
                }

                Ok(RequestOutcome::Blocked { session_id, reason })
            }
        }
    }

    /// Type out canned answers without touching the network.
    ///
    /// Agent `i` re-enters `responding` after `i * activation_step` and
    /// starts typing after a further random delay plus `i * stagger`.
    /// After `reset_after` the demo flag is cleared. Returns the prompt
    /// the demo ran with.
    pub fn run_demo(&self, prompt: Option<&str>) -> PanelResult<String> {
        let mut state = lock(&self.state);
        let agents = state.active_agents();
        if agents.is_empty() {
            return Err(PanelError::NoActiveAgents);
        }

        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_DEMO_PROMPT)
            .to_string();

        state.is_demo = true;
        state.api_status = ApiStatus::Demo;
        state.session_id = Some(format!("demo_{}", Utc::now().timestamp_millis()));
        state.stats.begin_request();
        self.prepare_for_request(&mut state);

        let request_id = state.request_id;
        for (index, agent) in agents.iter().copied().enumerate() {
            let activate_after = Duration::from_millis(self.demo.activation_step_ms * index as u64);
            let respond_after = self.response_delay(index);
            let panel = self.state.clone();

            let handle = tokio::spawn(async move {
                time::sleep(activate_after).await;
                {
                    let mut state = lock(&panel);
                    if state.request_id != request_id {
                        return;
                    }
                    timer::start_responding(&mut state, &panel, agent);
                }

                time::sleep(respond_after).await;
                let mut state = lock(&panel);
                if state.request_id != request_id {
                    return;
                }
                typing::simulate_typing(&mut state, &panel, agent, agent.demo_response(), None);
            });

            if let Some(rt) = state.agent_mut(agent) {
                rt.pending_task = Some(handle);
            }
        }

        let reset_after = Duration::from_millis(self.demo.reset_after_ms);
        let panel = self.state.clone();
        state.demo_reset_task = Some(tokio::spawn(async move {
            time::sleep(reset_after).await;
            let mut state = lock(&panel);
            state.is_demo = false;
            state.api_status = ApiStatus::CorsError(None);
            debug!("Demo mode finished");
        }));

        info!(agents = agents.len(), prompt = %prompt, "Demo started");
        Ok(prompt)
    }

    /// Reset every active agent and put it into `responding`.
    fn prepare_for_request(&self, state: &mut PanelState) {
        state.reset(Instant::now());
        for agent in state.active_agents() {
            timer::start_responding(state, &self.state, agent);
        }
    }

    /// Simulated response delay for the agent at `index`.
    fn response_delay(&self, index: usize) -> Duration {
        let spread = self.demo.max_delay_ms.saturating_sub(self.demo.min_delay_ms);
        let jitter = if spread == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..spread)
        };
        Duration::from_millis(self.demo.min_delay_ms + jitter + self.demo.stagger_ms * index as u64)
    }
}
