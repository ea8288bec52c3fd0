//! Session-wide response time statistics.
//!
//! Durations are appended as agents complete and never rolled back. The
//! fastest/slowest agents are picked by average over a linear scan of the
//! agents in the order they first completed.

use crate::models::Agent;
use serde::Serialize;
use tracing::debug;

/// Response times observed over the whole process session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    total_requests: u64,
    total_response_time_ms: u64,
    /// Per-agent durations, agents kept in first-seen order.
    agent_times: Vec<(Agent, Vec<u64>)>,
    fastest: Option<Agent>,
    slowest: Option<Agent>,
}

/// Point-in-time view of [`SessionStats`] for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_requests: u64,
    pub average_response_ms: Option<u64>,
    pub fastest: Option<Agent>,
    pub slowest: Option<Agent>,
    /// Per-agent averages in first-completion order.
    pub agent_averages: Vec<AgentAverage>,
}

/// Rounded average response time of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAverage {
    pub agent: Agent,
    pub average_ms: u64,
    pub responses: usize,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a validated request, live or demo.
    pub fn begin_request(&mut self) {
        self.total_requests += 1;
    }

    /// Record a completed agent response and refresh fastest/slowest.
    pub fn record(&mut self, agent: Agent, elapsed_ms: u64) {
        match self.agent_times.iter_mut().find(|(a, _)| *a == agent) {
            Some((_, times)) => times.push(elapsed_ms),
            None => self.agent_times.push((agent, vec![elapsed_ms])),
        }
        self.total_response_time_ms += elapsed_ms;

        let mut fastest_time = f64::INFINITY;
        let mut slowest_time = 0.0;
        let mut fastest = None;
        let mut slowest = None;

        for (name, times) in &self.agent_times {
            let avg = average(times);
            if avg < fastest_time {
                fastest_time = avg;
                fastest = Some(*name);
            }
            if avg > slowest_time {
                slowest_time = avg;
                slowest = Some(*name);
            }
        }

        self.fastest = fastest;
        self.slowest = slowest;

        debug!(
            agent = %agent,
            elapsed_ms,
            fastest = ?self.fastest,
            slowest = ?self.slowest,
            "Recorded response time"
        );
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Accumulated response time divided by the number of requests.
    ///
    /// Every agent's time is summed, so with N agents this is roughly N
    /// times a single agent's latency. Kept that way so numbers line up
    /// with the web panel.
    pub fn average_response_ms(&self) -> Option<u64> {
        if self.total_requests == 0 {
            return None;
        }
        Some((self.total_response_time_ms as f64 / self.total_requests as f64).round() as u64)
    }

    pub fn fastest(&self) -> Option<Agent> {
        self.fastest
    }

    pub fn slowest(&self) -> Option<Agent> {
        self.slowest
    }

    /// Average duration for one agent, if it has completed at least once.
    pub fn agent_average_ms(&self, agent: Agent) -> Option<f64> {
        self.agent_times
            .iter()
            .find(|(a, _)| *a == agent)
            .map(|(_, times)| average(times))
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total_requests: self.total_requests,
            average_response_ms: self.average_response_ms(),
            fastest: self.fastest,
            slowest: self.slowest,
            agent_averages: self
                .agent_times
                .iter()
                .filter_map(|(agent, times)| {
                    self.agent_average_ms(*agent).map(|avg| AgentAverage {
                        agent: *agent,
                        average_ms: avg.round() as u64,
                        responses: times.len(),
                    })
                })
                .collect(),
        }
    }
}

fn average(times: &[u64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    times.iter().sum::<u64>() as f64 / times.len() as f64
}
