//! Aria's dialog orchestration engine.
//!
//! The engine owns the whole conversational lifecycle:
//!
//! * per-user sessions that wake on a hotword, sleep on dismissal, and
//!   time out when idle;
//! * deterministic first-match intent classification over an ordered rule
//!   table;
//! * multi-turn slot-filling flows with bounded re-prompting;
//! * a confirmation gate in front of every side-effecting action;
//! * dispatch of finished flows to the provider traits in
//!   `aria-providers`, with every failure degraded to a spoken line.
//!
//! Hosts drive it through [`Engine::handle`], one utterance at a time.

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod flow;
pub mod intent;
pub mod session;

pub use classifier::classify;
pub use config::EngineConfig;
pub use dispatch::Collaborators;
pub use flow::{FlowSchema, FlowState, FlowStep, MissPolicy, SlotSpec};
pub use intent::Intent;
pub use session::{Disposition, Engine, Response};
