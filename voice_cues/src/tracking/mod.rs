//! Per-object held-item state and transition detection.
//!
//! Each tracked object is `Unknown` until an identity is observed, then
//! `Classified`. A cue fires only when the class changes to a cued class;
//! re-observing the same class, or moving to `None`, stays silent.

pub mod schedule;

pub use schedule::IntervalTimer;

use std::collections::{HashMap, HashSet};

use host_graph::ObjectId;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, VoiceClass};

/// Last observation for one tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrackedState {
    /// No item, or no readable identity.
    #[default]
    Unknown,
    Classified { identity: i64, class: VoiceClass },
}

impl TrackedState {
    /// Get the class, if classified.
    pub fn class(&self) -> Option<VoiceClass> {
        match self {
            TrackedState::Unknown => None,
            TrackedState::Classified { class, .. } => Some(*class),
        }
    }
}

/// Transition detector over many tracked objects.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    states: HashMap<ObjectId, TrackedState>,
}

impl ChangeDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what `key` holds now and return the class to cue, if any.
    ///
    /// `None` means no item or no identity: the state drops back to `Unknown`.
    pub fn observe(
        &mut self,
        key: ObjectId,
        identity: Option<i64>,
        classifier: &Classifier,
    ) -> Option<VoiceClass> {
        let state = self.states.entry(key).or_default();

        let Some(identity) = identity else {
            *state = TrackedState::Unknown;
            return None;
        };

        let class = classifier.classify(identity);
        let previous = state.class();
        *state = TrackedState::Classified { identity, class };

        (class.is_cued() && previous != Some(class)).then_some(class)
    }

    /// Get the state of a tracked object.
    pub fn state(&self, key: ObjectId) -> Option<TrackedState> {
        self.states.get(&key).copied()
    }

    /// Drop every object not seen in the last full scan. Returns how many were dropped.
    pub fn retain_seen(&mut self, seen: &HashSet<ObjectId>) -> usize {
        let before = self.states.len();
        self.states.retain(|key, _| seen.contains(key));
        before - self.states.len()
    }

    /// Stop tracking one object.
    pub fn forget(&mut self, key: ObjectId) -> bool {
        self.states.remove(&key).is_some()
    }

    /// Stop tracking everything.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Get the number of tracked objects.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
