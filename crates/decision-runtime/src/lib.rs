//! Assembles the decision core's crates into a running process: trace
//! store, tracer, event bus, anchor submitter, orchestrator, and the
//! reference subscribers. Everything a host application would supply
//! instead — the HTTP surface, a relational trace store, a real anchoring
//! submitter, strategy heuristics themselves — stays outside this crate.

pub mod adapters;
pub mod config;
pub mod wiring;

pub use config::{ConfigError, CoreConfig};
pub use wiring::{build_core, Core, SubmitterMode, WiringError};
