//! The panel: per-agent timers, typing animation, session statistics
//! and the request orchestrator driving them.

pub mod orchestrator;
pub mod state;
pub mod stats;
pub mod timer;
pub mod typing;

pub use orchestrator::{Panel, RequestOutcome};
pub use state::{AgentSnapshot, PanelSnapshot};
