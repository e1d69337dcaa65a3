//! Population tracking: every live holder instance is an entry point.
//!
//! Holder types are found once by scanning the loaded types for a naming
//! prefix. The optional [`LocalPlayerGate`] holds scanning back until the
//! locally controlled actor exists.

use std::collections::HashSet;

use host_graph::{InstanceQuery, ObjectHost, ObjectId, TypeKey, ValueKind};
use tracing::{debug, info, warn};

use crate::config::{PollingConfig, PopulationConfig};
use crate::probe::{MemberQuery, MemberResolver, ProbeLog};
use crate::targets::{probe_flag, select_controlled};
use crate::tracking::IntervalTimer;

/// Discovers holder types and lists their live instances.
#[derive(Debug, Clone)]
pub struct PopulationPolicy {
    type_prefix: String,
    base_type: String,
    holder_types: Vec<TypeKey>,
    discovery_tried: bool,
}

impl PopulationPolicy {
    pub fn new(config: &PopulationConfig) -> Self {
        Self {
            type_prefix: config.holder_type_prefix.clone(),
            base_type: config.holder_base_type.clone(),
            holder_types: Vec::new(),
            discovery_tried: false,
        }
    }

    /// Scan the loaded types for holder types. Runs once until [`Self::invalidate_types`].
    pub fn discover(&mut self, host: &dyn ObjectHost) -> &[TypeKey] {
        if !self.discovery_tried {
            self.discovery_tried = true;
            self.holder_types = host
                .enumerate_loaded_types()
                .into_iter()
                .filter(|ty| {
                    host.describe(*ty)
                        .is_some_and(|desc| desc.name.starts_with(&self.type_prefix))
                        && host.is_assignable(*ty, &self.base_type)
                })
                .collect();

            if self.holder_types.is_empty() {
                warn!(prefix = %self.type_prefix, "no holder types found");
            } else {
                info!(count = self.holder_types.len(), "holder types discovered");
                for ty in &self.holder_types {
                    debug!(ty = %host.type_name(*ty), "holder type");
                }
            }
        }

        &self.holder_types
    }

    /// Live instances of every holder type, each once, in host order.
    ///
    /// An instance of a derived holder type matches its own type and its base.
    pub fn holders(&mut self, host: &dyn ObjectHost) -> Vec<ObjectId> {
        let names: Vec<String> = self
            .discover(host)
            .iter()
            .filter_map(|ty| host.describe(*ty).map(|desc| desc.name.clone()))
            .collect();

        let mut seen = HashSet::new();
        names
            .into_iter()
            .flat_map(|name| host.enumerate_instances(&InstanceQuery::AssignableTo(name)))
            .filter(|holder| seen.insert(*holder))
            .collect()
    }

    /// Get the discovered holder types.
    pub fn holder_types(&self) -> &[TypeKey] {
        &self.holder_types
    }

    /// Forget discovered types so the next scan searches again.
    pub fn invalidate_types(&mut self) {
        self.holder_types.clear();
        self.discovery_tried = false;
    }
}

/// Locks the locally controlled actor before holders are scanned.
#[derive(Debug)]
pub struct LocalPlayerGate {
    name_hints: Vec<String>,
    flag: MemberQuery,
    player: Option<ObjectId>,
    search_timer: IntervalTimer,
    reported_missing: bool,
}

impl LocalPlayerGate {
    pub fn new(config: &PopulationConfig, polling: &PollingConfig) -> Self {
        Self {
            name_hints: config.player_name_hints.clone(),
            flag: MemberQuery::new(config.player_flag_members.iter().cloned(), ValueKind::Bool),
            player: None,
            search_timer: IntervalTimer::new(polling.player_search_interval),
            reported_missing: false,
        }
    }

    /// The live local player, searching for one when a search is due.
    pub fn poll(
        &mut self,
        resolver: &mut MemberResolver,
        host: &dyn ObjectHost,
        now: f64,
        log: &mut ProbeLog,
    ) -> Option<ObjectId> {
        if let Some(player) = self.player {
            if host.is_live(player) {
                return Some(player);
            }
            info!(%player, "local player destroyed");
            self.player = None;
            self.search_timer.reset();
        }

        if !self.search_timer.due(now) {
            return None;
        }

        let candidates =
            host.enumerate_instances(&InstanceQuery::ObjectNameContains(self.name_hints.clone()));
        let flag = &self.flag;
        let Some((player, selection)) = select_controlled(&candidates, |candidate| {
            probe_flag(resolver, host, candidate, flag, log)
        }) else {
            if !self.reported_missing {
                info!(hints = ?self.name_hints, "no local player candidate");
                self.reported_missing = true;
            }
            return None;
        };

        info!(
            %player,
            %selection,
            name = %host.object_name(player).unwrap_or_default(),
            "local player locked"
        );
        self.player = Some(player);
        self.reported_missing = false;
        Some(player)
    }

    /// Get the locked player.
    pub fn player(&self) -> Option<ObjectId> {
        self.player
    }
}
