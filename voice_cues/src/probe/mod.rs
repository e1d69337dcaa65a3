//! Structural probing of the host graph.
//!
//! - **resolver**: find and read members by candidate name and value kind
//! - **locator**: find the nearest item entity reachable from a root
//! - [`item_identity`]: read an item's integer type id
//! - [`ProbeLog`]: fold per-probe failures into one log line per tick

pub mod locator;
pub mod resolver;

pub use locator::{ItemLocator, ItemMatcher, TraversalStats};
pub use resolver::{MemberHandle, MemberQuery, MemberResolver};

use host_graph::{ObjectHost, ObjectId, ValueKind};
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};

/// Query for an item's type id under the configured member names.
pub fn identity_query(names: &[String]) -> MemberQuery {
    MemberQuery::new(names.iter().cloned(), ValueKind::Int)
}

/// Integer type id of an item entity.
pub fn item_identity(
    resolver: &mut MemberResolver,
    host: &dyn ObjectHost,
    item: ObjectId,
    query: &MemberQuery,
) -> ProbeResult<i64> {
    resolver.probe_int(host, item, query)
}

/// Per-tick aggregate of non-fatal probe outcomes.
///
/// Absences are expected and only counted. Failed reads and invalidations
/// are counted and the most recent one is kept for the log line.
#[derive(Debug, Default)]
pub struct ProbeLog {
    absences: usize,
    failures: usize,
    invalidated: usize,
    last_failure: Option<ProbeError>,
}

impl ProbeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: &ProbeError) {
        match error {
            ProbeError::MemberNotFound { .. } => self.absences += 1,
            ProbeError::Invalidated(_) => self.invalidated += 1,
            ProbeError::Read(_) | ProbeError::UnexpectedValue { .. } => {
                self.failures += 1;
                self.last_failure = Some(error.clone());
            }
        }
    }

    /// Record a failure and turn the result into "no value".
    pub fn absorb<T>(&mut self, result: ProbeResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(&error);
                None
            }
        }
    }

    /// Count member reads a locator traversal skipped.
    pub fn record_traversal(&mut self, stats: &TraversalStats) {
        self.failures += stats.read_failures;
    }

    /// Failed reads and invalidations recorded since the last flush.
    pub fn failures(&self) -> usize {
        self.failures + self.invalidated
    }

    pub fn absences(&self) -> usize {
        self.absences
    }

    pub fn is_empty(&self) -> bool {
        self.absences == 0 && self.failures == 0 && self.invalidated == 0
    }

    /// Emit one debug line if anything was recorded, then reset.
    /// Returns the number of failures flushed.
    pub fn flush(&mut self, context: &str) -> usize {
        let failures = self.failures();
        if !self.is_empty() {
            debug!(
                context,
                absences = self.absences,
                failures = self.failures,
                invalidated = self.invalidated,
                last = ?self.last_failure,
                "probe outcomes"
            );
        }
        *self = Self::default();
        failures
    }
}
