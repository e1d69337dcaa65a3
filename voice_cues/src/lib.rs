//! # Voice Cues
//!
//! Watches what the actors in a live, externally owned object graph are
//! holding and plays a voice cue whenever a held weapon changes class. The
//! graph is only reachable through the [`host_graph::ObjectHost`] port; its
//! layout is not known in advance, so held items are found by probing.
//!
//! ## Core Components
//!
//! - **probe**: member resolution and the depth-bounded item locator
//! - **targets**: entry point policies (one locked actor, or every holder)
//! - **classifier**: item type id to voice class
//! - **tracking**: per-object state, transition detection and timers
//! - **cue**: cue sinks and the sound file library
//! - **engine**: the tick-driven engine tying it together
//! - **config**: TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Polled**: the host offers no change notifications, so every concern runs on its own timer
//! - **Non-fatal**: a failed probe is "no value" for that tick, never an error for the host
//! - **Explicitly owned**: the host constructs the engine and drives its lifecycle

pub mod classifier;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod probe;
pub mod targets;
pub mod tracking;

pub use classifier::{Classifier, VoiceClass};
pub use config::{TrackingMode, VoiceConfig};
pub use cue::{AudioCueSink, CueLibrary, CueSink, SfxPlayer};
pub use engine::{TickReport, VoiceCueEngine};
pub use error::{ConfigError, ProbeError, ProbeResult};
