//! Maps item type ids to voice classes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ClassSets;

/// Voice category of a held item.
///
/// Declaration order is precedence order when an id sits in several sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VoiceClass {
    #[default]
    None,
    Ar,
    Shotgun,
    Sniper,
    Grenade,
}

impl VoiceClass {
    /// Classes that have a cue, highest precedence first.
    pub const CUED: [VoiceClass; 4] = [
        VoiceClass::Ar,
        VoiceClass::Shotgun,
        VoiceClass::Sniper,
        VoiceClass::Grenade,
    ];

    /// Whether a cue exists for this class.
    pub fn is_cued(&self) -> bool {
        *self != VoiceClass::None
    }

    pub fn label(&self) -> &'static str {
        match self {
            VoiceClass::None => "none",
            VoiceClass::Ar => "ar",
            VoiceClass::Shotgun => "shotgun",
            VoiceClass::Sniper => "sniper",
            VoiceClass::Grenade => "grenade",
        }
    }
}

impl std::fmt::Display for VoiceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Set-membership classifier over the configured id sets.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    sets: ClassSets,
}

impl Classifier {
    pub fn new(sets: ClassSets) -> Self {
        Self { sets }
    }

    pub fn sets(&self) -> &ClassSets {
        &self.sets
    }

    /// Class of an item type id. Ids in no set are `VoiceClass::None`.
    pub fn classify(&self, identity: i64) -> VoiceClass {
        VoiceClass::CUED
            .into_iter()
            .find(|class| self.contains(*class, identity))
            .unwrap_or(VoiceClass::None)
    }

    /// Ids listed under more than one class, with every class that lists them.
    pub fn overlaps(&self) -> Vec<(i64, Vec<VoiceClass>)> {
        let mut ids: Vec<i64> = VoiceClass::CUED
            .iter()
            .filter_map(|class| self.members(*class))
            .flat_map(|ids| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        ids.into_iter()
            .filter_map(|id| {
                let classes: Vec<_> = VoiceClass::CUED
                    .into_iter()
                    .filter(|class| self.contains(*class, id))
                    .collect();
                (classes.len() > 1).then_some((id, classes))
            })
            .collect()
    }

    fn contains(&self, class: VoiceClass, identity: i64) -> bool {
        self.members(class).is_some_and(|ids| ids.contains(&identity))
    }

    fn members(&self, class: VoiceClass) -> Option<&HashSet<i64>> {
        match class {
            VoiceClass::None => None,
            VoiceClass::Ar => Some(&self.sets.ar),
            VoiceClass::Shotgun => Some(&self.sets.shotgun),
            VoiceClass::Sniper => Some(&self.sets.sniper),
            VoiceClass::Grenade => Some(&self.sets.grenade),
        }
    }
}
