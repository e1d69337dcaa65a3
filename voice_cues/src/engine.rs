//! The tick-driven voice cue engine.
//!
//! The host constructs one engine, calls [`VoiceCueEngine::start`] and
//! [`VoiceCueEngine::stop`] from its own lifecycle hooks, and calls
//! [`VoiceCueEngine::on_tick`] once per frame with its unscaled clock. The
//! engine owns every cache and never runs outside a tick.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use host_graph::{ObjectHost, ObjectId};
use tracing::{debug, error, info, warn};

use crate::classifier::{Classifier, VoiceClass};
use crate::config::{TrackingMode, VoiceConfig};
use crate::cue::CueSink;
use crate::probe::{
    identity_query, item_identity, ItemLocator, MemberQuery, MemberResolver, ProbeLog,
};
use crate::targets::{LocalPlayerGate, PopulationPolicy, SingleTargetPolicy};
use crate::tracking::{ChangeDetector, IntervalTimer};

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Cues dispatched, with the entry point that triggered each.
    pub dispatched: Vec<(ObjectId, VoiceClass)>,
    /// Entry points whose held item was read.
    pub scanned: usize,
    /// Tracked states dropped because their object is gone.
    pub pruned: usize,
    /// Failed or invalidated reads.
    pub probe_failures: usize,
    /// The tick body panicked and was abandoned.
    pub panicked: bool,
}

/// Entry point policy for the configured mode.
#[derive(Debug)]
enum Tracker {
    Population {
        policy: PopulationPolicy,
        gate: Option<LocalPlayerGate>,
        scan_timer: IntervalTimer,
    },
    Single(SingleTargetPolicy),
}

/// Everything needed to turn an entry point into an item identity.
#[derive(Debug)]
struct Probes {
    resolver: MemberResolver,
    locator: ItemLocator,
    identity: MemberQuery,
    log: ProbeLog,
}

impl Probes {
    /// Identity of the item reachable from `root`; `None` if there is no item
    /// or its identity cannot be read.
    fn identify(&mut self, host: &dyn ObjectHost, root: ObjectId) -> Option<i64> {
        let (item, stats) = self.locator.locate_traced(host, root);
        self.log.record_traversal(&stats);

        let item = item?;
        self.log
            .absorb(item_identity(&mut self.resolver, host, item, &self.identity))
    }
}

/// Detects held-item changes and dispatches voice cues.
pub struct VoiceCueEngine<S> {
    classifier: Classifier,
    probes: Probes,
    detector: ChangeDetector,
    tracker: Tracker,
    sink: S,
    running: bool,
}

impl<S: CueSink> VoiceCueEngine<S> {
    /// Build a stopped engine. The config is expected to be validated.
    pub fn new(config: &VoiceConfig, sink: S) -> Self {
        let classifier = Classifier::new(config.classes.clone());
        for (id, classes) in classifier.overlaps() {
            warn!(id, ?classes, "type id listed in several classes, first wins");
        }

        let tracker = match config.mode {
            TrackingMode::Population => Tracker::Population {
                policy: PopulationPolicy::new(&config.population),
                gate: config
                    .population
                    .require_local_player
                    .then(|| LocalPlayerGate::new(&config.population, &config.polling)),
                scan_timer: IntervalTimer::new(config.polling.holder_scan_interval),
            },
            TrackingMode::SingleTarget => {
                Tracker::Single(SingleTargetPolicy::new(&config.single_target, &config.polling))
            }
        };

        Self {
            classifier,
            probes: Probes {
                resolver: MemberResolver::new(),
                locator: ItemLocator::from_config(&config.locator),
                identity: identity_query(&config.locator.identity_members),
                log: ProbeLog::new(),
            },
            detector: ChangeDetector::new(),
            tracker,
            sink,
            running: false,
        }
    }

    /// Begin reacting to ticks.
    pub fn start(&mut self) {
        if !self.running {
            info!(mode = ?self.mode(), "voice cue engine started");
            self.running = true;
        }
    }

    /// Stop reacting to ticks and forget tracked states.
    pub fn stop(&mut self) {
        if self.running {
            info!(tracked = self.detector.len(), "voice cue engine stopped");
            self.running = false;
            self.detector.clear();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> TrackingMode {
        match self.tracker {
            Tracker::Population { .. } => TrackingMode::Population,
            Tracker::Single(_) => TrackingMode::SingleTarget,
        }
    }

    /// Advance the engine to host time `now`. Does nothing while stopped.
    ///
    /// A panic inside the tick is logged and reported; the next tick runs normally.
    pub fn on_tick(&mut self, host: &dyn ObjectHost, now: f64) -> TickReport {
        if !self.running {
            return TickReport::default();
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.tick(host, now))) {
            Ok(report) => report,
            Err(payload) => {
                error!(panic = panic_message(&*payload), now, "tick panicked");
                self.probes.log = ProbeLog::new();
                TickReport {
                    panicked: true,
                    ..TickReport::default()
                }
            }
        }
    }

    /// Dispatch a cue outside change detection. Returns false for `VoiceClass::None`.
    pub fn play_manual(&mut self, class: VoiceClass) -> bool {
        if !class.is_cued() {
            return false;
        }
        debug!(%class, "manual cue");
        self.sink.dispatch_cue(class);
        true
    }

    /// Search for holder types again on the next scan.
    pub fn rediscover_types(&mut self) {
        if let Tracker::Population { policy, .. } = &mut self.tracker {
            policy.invalidate_types();
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn resolver(&self) -> &MemberResolver {
        &self.probes.resolver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn tick(&mut self, host: &dyn ObjectHost, now: f64) -> TickReport {
        let mut report = TickReport::default();

        let observed = match &mut self.tracker {
            Tracker::Population {
                policy,
                gate,
                scan_timer,
            } => Self::scan_population(
                &mut self.probes,
                &mut self.detector,
                &self.classifier,
                policy,
                gate.as_mut(),
                scan_timer,
                host,
                now,
                &mut report,
            ),
            Tracker::Single(policy) => Self::check_single(
                &mut self.probes,
                &mut self.detector,
                &self.classifier,
                policy,
                host,
                now,
                &mut report,
            ),
        };

        for (key, class) in observed {
            info!(%key, %class, "held item changed");
            self.sink.dispatch_cue(class);
            report.dispatched.push((key, class));
        }

        report.probe_failures = self.probes.log.flush("tick");
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_population(
        probes: &mut Probes,
        detector: &mut ChangeDetector,
        classifier: &Classifier,
        policy: &mut PopulationPolicy,
        gate: Option<&mut LocalPlayerGate>,
        scan_timer: &mut IntervalTimer,
        host: &dyn ObjectHost,
        now: f64,
        report: &mut TickReport,
    ) -> Vec<(ObjectId, VoiceClass)> {
        if let Some(gate) = gate {
            if gate
                .poll(&mut probes.resolver, host, now, &mut probes.log)
                .is_none()
            {
                return Vec::new();
            }
        }

        if !scan_timer.due(now) {
            return Vec::new();
        }

        let holders = policy.holders(host);
        let seen: HashSet<ObjectId> = holders.iter().copied().collect();
        report.scanned = holders.len();

        let changed = holders
            .into_iter()
            .filter_map(|holder| {
                let identity = probes.identify(host, holder);
                detector
                    .observe(holder, identity, classifier)
                    .map(|class| (holder, class))
            })
            .collect();

        report.pruned = detector.retain_seen(&seen);
        changed
    }

    fn check_single(
        probes: &mut Probes,
        detector: &mut ChangeDetector,
        classifier: &Classifier,
        policy: &mut SingleTargetPolicy,
        host: &dyn ObjectHost,
        now: f64,
        report: &mut TickReport,
    ) -> Vec<(ObjectId, VoiceClass)> {
        if let Some(lost) = policy.check_invalidated(host, now) {
            if detector.forget(lost) {
                report.pruned += 1;
            }
        }

        policy.try_lock(&mut probes.resolver, host, now, &mut probes.log);
        let Some(action) = policy.locked() else {
            return Vec::new();
        };
        if !policy.check_due(now) {
            return Vec::new();
        }

        report.scanned = 1;
        let held = policy.held_item(&mut probes.resolver, host, &mut probes.log);
        if policy.is_settled(held) {
            return Vec::new();
        }

        let identity = held.and_then(|agent| probes.identify(host, agent));
        policy.settle(held, identity.is_some());
        detector
            .observe(action, identity, classifier)
            .map(|class| vec![(action, class)])
            .unwrap_or_default()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
