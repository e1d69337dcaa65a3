//! Object identity and the shapes the host exposes for its objects.

mod descriptor;
mod value;

pub use descriptor::*;
pub use value::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference identity of an object in the host graph.
///
/// Two ids are equal only if they name the same instance. A host that
/// re-creates an object hands out a fresh id, so a re-created object never
/// aliases the one it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an object ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create the nil object ID.
    ///
    /// No host hands this id out, so it can stand for "no object" in
    /// serialized data without matching a live instance.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

/// A defaulted id is a fresh random one, like [`ObjectId::new`]. It never
/// aliases a live object; use [`ObjectId::nil`] for a fixed placeholder.
impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a runtime type registered with the host.
///
/// Only ever used as a lookup and cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey(pub u32);

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}
