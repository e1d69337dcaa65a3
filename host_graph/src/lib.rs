//! # Host Graph
//!
//! The boundary between the voice cue engine and the application that owns
//! the live object graph. The engine never sees the host's real objects; it
//! sees ids, type descriptors and values through the [`ObjectHost`] port.
//!
//! - **objects**: object identity, type descriptors and member values
//! - **host**: the `ObjectHost` port and its read errors
//! - **scene**: `SceneGraph`, an in-memory host

pub mod host;
pub mod objects;
pub mod scene;

pub use host::*;
pub use objects::*;
pub use scene::*;
