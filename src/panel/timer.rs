//! Agent timer state machine.
//!
//! `idle -> responding -> {completed, error}`. Entering `responding`
//! arms a refresh task (and a token counter in demo mode); leaving it
//! stops both and does one last recomputation. Only `completed` feeds
//! the session statistics.

use crate::models::{Agent, AgentStatus};
use crate::panel::state::{lock, PanelState, SharedPanel};
use rand::Rng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Lock the panel and move `agent` to `status`.
#[cfg(test)]
pub fn update_timer(panel: &SharedPanel, agent: Agent, status: AgentStatus) {
    let mut state = lock(panel);
    match status {
        AgentStatus::Responding => start_responding(&mut state, panel, agent),
        AgentStatus::Completed => complete(&mut state, agent),
        AgentStatus::Error => fail(&mut state, agent),
        AgentStatus::Idle => debug!(agent = %agent, "Ignoring transition to idle"),
    }
}

/// Enter `responding`, replacing any timers the agent already had.
pub fn start_responding(state: &mut PanelState, panel: &SharedPanel, agent: Agent) {
    let demo = state.is_demo;
    let period = state.refresh_interval;
    let Some(rt) = state.agent_mut(agent) else {
        debug!(agent = %agent, "No runtime for agent, not starting timers");
        return;
    };

    rt.stop_timers();
    rt.status = AgentStatus::Responding;
    rt.demo = demo;
    rt.refresh_task = Some(spawn_refresh(panel.clone(), agent, period));

    if demo {
        rt.token_task = Some(spawn_token_counter(panel.clone(), agent));
    }
}

/// Finish an agent successfully and record its time.
pub fn complete(state: &mut PanelState, agent: Agent) {
    let now = Instant::now();
    let Some(rt) = state.agent_mut(agent) else {
        return;
    };
    if rt.status.is_terminal() {
        debug!(agent = %agent, status = ?rt.status, "Agent already finished");
        return;
    }

    rt.stop_timers();
    rt.status = AgentStatus::Completed;
    rt.typing = false;
    rt.refresh_metrics(now);
    let elapsed_ms = rt.elapsed_ms;
    let tokens = rt.token_count;
    let tps = rt.tps;

    state.stats.record(agent, elapsed_ms);
    info!(agent = %agent, elapsed_ms, tokens, tps, "Agent completed");
}

/// Finish an agent with an error. Errors are not timed.
pub fn fail(state: &mut PanelState, agent: Agent) {
    let now = Instant::now();
    let Some(rt) = state.agent_mut(agent) else {
        return;
    };
    if rt.status.is_terminal() {
        return;
    }

    rt.stop_timers();
    rt.status = AgentStatus::Error;
    rt.typing = false;
    rt.refresh_metrics(now);
    info!(agent = %agent, "Agent failed");
}

fn spawn_refresh(panel: SharedPanel, agent: Agent, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let mut state = lock(&panel);
            match state.agent_mut(agent) {
                Some(rt) => rt.refresh_metrics(Instant::now()),
                None => break,
            }
        }
    })
}

/// Demo-only: bump the token count by 1..=3 at a fixed random period.
fn spawn_token_counter(panel: SharedPanel, agent: Agent) -> JoinHandle<()> {
    let period = Duration::from_millis(rand::thread_rng().gen_range(100..=300));

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let bump = rand::thread_rng().gen_range(1..=3);
            let mut state = lock(&panel);
            match state.agent_mut(agent) {
                Some(rt) => rt.token_count += bump,
                None => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypingConfig;

    fn shared(agents: &[Agent]) -> SharedPanel {
        let mut state = PanelState::new(agents, Duration::from_millis(10), TypingConfig::default());
        state.reset(Instant::now());
        state.into_shared()
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentering_responding_keeps_one_refresh_task() {
        let panel = shared(&[Agent::OpenAi]);
        lock(&panel).is_demo = true;

        update_timer(&panel, Agent::OpenAi, AgentStatus::Responding);
        let first = {
            let state = lock(&panel);
            let rt = state.agent(Agent::OpenAi).unwrap();
            rt.refresh_task.as_ref().unwrap().abort_handle()
        };

        update_timer(&panel, Agent::OpenAi, AgentStatus::Responding);
        time::sleep(Duration::from_millis(25)).await;

        assert!(first.is_finished());
        let state = lock(&panel);
        let rt = state.agent(Agent::OpenAi).unwrap();
        assert!(rt.has_refresh_task());
        assert!(rt.has_token_task());
        assert_eq!(rt.live_tasks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_tracks_elapsed_time() {
        let panel = shared(&[Agent::Groq]);
        update_timer(&panel, Agent::Groq, AgentStatus::Responding);

        time::sleep(Duration::from_millis(105)).await;

        let state = lock(&panel);
        let rt = state.agent(Agent::Groq).unwrap();
        assert_eq!(rt.status, AgentStatus::Responding);
        assert!(rt.elapsed_ms >= 90 && rt.elapsed_ms <= 105, "{}", rt.elapsed_ms);
        assert!(!rt.has_token_task());
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_stops_timers_and_records_stats() {
        let panel = shared(&[Agent::Anthropic]);
        lock(&panel).is_demo = true;
        update_timer(&panel, Agent::Anthropic, AgentStatus::Responding);

        time::sleep(Duration::from_millis(500)).await;
        update_timer(&panel, Agent::Anthropic, AgentStatus::Completed);
        time::sleep(Duration::from_millis(50)).await;

        let state = lock(&panel);
        let rt = state.agent(Agent::Anthropic).unwrap();
        assert_eq!(rt.status, AgentStatus::Completed);
        assert!((500..=501).contains(&rt.elapsed_ms), "{}", rt.elapsed_ms);
        assert_eq!(rt.live_tasks(), 0);
        assert_eq!(state.stats.fastest(), Some(Agent::Anthropic));
        assert_eq!(
            state.stats.agent_average_ms(Agent::Anthropic),
            Some(rt.elapsed_ms as f64)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_is_not_recorded() {
        let panel = shared(&[Agent::Diffy]);
        update_timer(&panel, Agent::Diffy, AgentStatus::Responding);
        update_timer(&panel, Agent::Diffy, AgentStatus::Error);
        tokio::task::yield_now().await;

        let state = lock(&panel);
        let rt = state.agent(Agent::Diffy).unwrap();
        assert_eq!(rt.status, AgentStatus::Error);
        assert!(!rt.has_refresh_task());
        assert_eq!(state.stats.agent_average_ms(Agent::Diffy), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_labels_keep_the_mode_they_started_in() {
        let panel = shared(&[Agent::OpenAi, Agent::Groq]);
        lock(&panel).is_demo = true;
        update_timer(&panel, Agent::OpenAi, AgentStatus::Responding);
        update_timer(&panel, Agent::Groq, AgentStatus::Responding);
        update_timer(&panel, Agent::OpenAi, AgentStatus::Completed);

        // The demo flag clears while Groq is still going.
        lock(&panel).is_demo = false;
        let snapshot = lock(&panel).snapshot();
        assert_eq!(snapshot.agents[0].status_label, "Demo Complete ✨");
        assert_eq!(snapshot.agents[1].status_label, "Simulating...");

        update_timer(&panel, Agent::Groq, AgentStatus::Completed);
        let snapshot = lock(&panel).snapshot();
        assert_eq!(snapshot.agents[1].status_label, "Demo Complete ✨");

        // A live request starts from live labels again.
        lock(&panel).reset(Instant::now());
        update_timer(&panel, Agent::OpenAi, AgentStatus::Responding);
        let snapshot = lock(&panel).snapshot();
        assert_eq!(snapshot.agents[0].status_label, "Responding...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_twice_records_once() {
        let panel = shared(&[Agent::OpenAi]);
        update_timer(&panel, Agent::OpenAi, AgentStatus::Responding);
        time::sleep(Duration::from_millis(40)).await;
        update_timer(&panel, Agent::OpenAi, AgentStatus::Completed);
        time::sleep(Duration::from_millis(40)).await;
        update_timer(&panel, Agent::OpenAi, AgentStatus::Completed);

        let state = lock(&panel);
        let recorded = state.agent(Agent::OpenAi).unwrap().elapsed_ms;
        assert!(recorded < 80);
        assert_eq!(state.stats.agent_average_ms(Agent::OpenAi), Some(recorded as f64));
    }
}
