//! Typing simulator.
//!
//! Reveals a known answer one character per tick so every agent appears
//! to stream, and keeps token and throughput estimates current as it goes.

use crate::config::TypingConfig;
use crate::models::Agent;
use crate::panel::state::{lock, PanelState, SharedPanel};
use crate::panel::timer;
use rand::Rng;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

/// Tokens assumed per space-separated word.
///
/// This is a rough display heuristic, not a tokenizer.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Estimate the token count of `text` as `ceil(words * 1.3)`.
///
/// Words are fields split on single spaces, so an empty string still
/// counts as one word.
pub fn estimate_tokens(text: &str) -> u64 {
    let words = text.split(' ').count();
    (words as f64 * TOKENS_PER_WORD).ceil() as u64
}

/// Tokens per second, rounded to one decimal. Zero for a zero duration.
pub fn throughput(tokens: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (tokens as f64 / secs * 10.0).round() / 10.0
}

/// Pick a per-character period uniformly within the configured bounds.
pub fn random_speed(config: &TypingConfig) -> Duration {
    let min = config.min_ms.min(config.max_ms);
    let max = config.max_ms.max(config.min_ms);
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

/// Start typing `text` out for `agent`, completing it after the last
/// character.
///
/// `speed` is the reveal period; when `None` a random period within the
/// panel's typing bounds is used. A typing run already going for the
/// agent is cancelled.
pub fn simulate_typing(
    state: &mut PanelState,
    panel: &SharedPanel,
    agent: Agent,
    text: &str,
    speed: Option<Duration>,
) {
    let speed = speed.unwrap_or_else(|| random_speed(&state.typing));
    let Some(rt) = state.agent_mut(agent) else {
        debug!(agent = %agent, "No runtime for agent, not typing");
        return;
    };

    if let Some(previous) = rt.typing_task.take() {
        previous.abort();
    }
    rt.typing_run += 1;
    rt.typing = true;
    rt.text.clear();

    let run = rt.typing_run;
    let chars: Vec<char> = text.chars().collect();
    debug!(agent = %agent, chars = chars.len(), speed_ms = speed.as_millis() as u64, "Typing started");

    let panel = panel.clone();
    rt.typing_task = Some(tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + speed, speed);
        let mut revealed = 0;

        loop {
            ticker.tick().await;
            let mut state = lock(&panel);
            let Some(rt) = state.agent_mut(agent) else {
                return;
            };
            if rt.typing_run != run {
                return;
            }

            if let Some(ch) = chars.get(revealed) {
                rt.text.push(*ch);
                revealed += 1;

                rt.token_count = estimate_tokens(&rt.text);
                rt.refresh_metrics(Instant::now());
            }

            if revealed >= chars.len() {
                rt.typing = false;
                rt.typing_task = None;
                timer::complete(&mut state, agent);
                return;
            }
        }
    }));
}
