//! Entry points: which live objects the engine reads held items from.
//!
//! - **single**: one locked action object, followed down a fixed attribute chain
//! - **population**: every live instance of the discovered holder types,
//!   optionally gated on the local player being present

pub mod population;
pub mod single;

pub use population::{LocalPlayerGate, PopulationPolicy};
pub use single::SingleTargetPolicy;

use host_graph::{ObjectHost, ObjectId};

use crate::probe::{MemberQuery, MemberResolver, ProbeLog};

/// How a controlled object was chosen among candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The object's own flag marks it as the controlled one.
    Flagged,
    /// No candidate was flagged; the first candidate was taken.
    Fallback,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Flagged => f.write_str("flagged"),
            Selection::Fallback => f.write_str("fallback"),
        }
    }
}

/// Pick the first flagged candidate, else the first candidate.
///
/// The fallback also applies when candidates expose the flag but none has it
/// set, so a session with several actors may lock the wrong one.
pub(crate) fn select_controlled<F>(
    candidates: &[ObjectId],
    mut is_flagged: F,
) -> Option<(ObjectId, Selection)>
where
    F: FnMut(ObjectId) -> bool,
{
    let first = *candidates.first()?;

    Some(
        candidates
            .iter()
            .copied()
            .find(|candidate| is_flagged(*candidate))
            .map(|candidate| (candidate, Selection::Flagged))
            .unwrap_or((first, Selection::Fallback)),
    )
}

/// Read a boolean flag; anything but a readable `true` counts as unset.
pub(crate) fn probe_flag(
    resolver: &mut MemberResolver,
    host: &dyn ObjectHost,
    object: ObjectId,
    query: &MemberQuery,
    log: &mut ProbeLog,
) -> bool {
    log.absorb(resolver.probe_bool(host, object, query))
        .unwrap_or(false)
}
