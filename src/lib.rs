//! Hydra Mind - On-device behavioral inference core for the Hydra companion device
//!
//! The device's visible personality is a discrete behavioral state,
//! re-derived a few times per second from noisy environmental measurements:
//! wireless scan statistics, memory pressure, uptime, user interaction.
//! This crate is the concurrent core behind that personality:
//!
//! - **Sensor store**: one mutex-guarded measurement record, written
//!   partially by independent periodic producers, read as atomic snapshots.
//!   Every access is timeout-bounded; a missed lock skips a cycle, never
//!   blocks a deadline.
//! - **Behavior engine**: the single consumer. A fixed-priority decision
//!   list over the latest snapshot plus two bounded momentum counters
//!   (excitement, learning progress) selects the next state each cycle.
//! - **Transition channel**: bounded, non-blocking delivery of state
//!   changes toward the UI; a full queue drops the event rather than stall
//!   the engine.
//!
//! Radio scanning, rendering, and the resource monitor are external
//! collaborators reached through [`runtime::SensorProbe`] and the FFI
//! surface.

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod momentum;
pub mod runtime;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use channel::{TransitionChannel, TransitionRx, TransitionTx, DEFAULT_CHANNEL_CAPACITY};
pub use config::{EngineConfig, RuntimeConfig};
pub use engine::BehaviorEngine;
pub use error::MindError;
pub use momentum::Momentum;
pub use runtime::{Runtime, SensorProbe};
pub use store::SensorStore;
pub use types::{
    display_for_code, BehaviorState, SensorReadings, SensorUpdate, StateTransition,
    UNKNOWN_STATE_GLYPH, UNKNOWN_STATE_LABEL,
};

/// Mind version embedded in logs and the CLI
pub const MIND_VERSION: &str = env!("CARGO_PKG_VERSION");
