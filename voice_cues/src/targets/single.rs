//! Single-target tracking: lock one action object and follow it to the held item.
//!
//! The chain is action -> controlling actor -> item holder -> held item. Each
//! hop's handle is kept for as long as the object at that hop keeps its type.
//! When the locked action is destroyed the chain is dropped and the next
//! search waits out a cooldown.

use std::sync::Arc;

use host_graph::{InstanceQuery, ObjectHost, ObjectId, TypeKey, ValueKind};
use tracing::{debug, info};

use crate::config::{PollingConfig, SingleTargetConfig};
use crate::probe::{MemberHandle, MemberQuery, MemberResolver, ProbeLog};
use crate::targets::{probe_flag, select_controlled, Selection};
use crate::tracking::IntervalTimer;

/// Resolution for one hop, tagged with the runtime type it was made for.
/// An absent member is kept too, so it is looked up and logged once per type.
type HopSlot = Option<(TypeKey, Option<Arc<MemberHandle>>)>;

/// Handles resolved along the locked chain.
#[derive(Debug, Clone, Default)]
struct ChainCache {
    controller: HopSlot,
    holder: HopSlot,
    held_item: HopSlot,
}

/// Which hop of the chain.
#[derive(Debug, Clone, Copy)]
enum Hop {
    Controller,
    Holder,
    HeldItem,
}

/// Tracks the held item of one locked actor.
#[derive(Debug)]
pub struct SingleTargetPolicy {
    action_type: String,
    controller: MemberQuery,
    holder: MemberQuery,
    held_item: MemberQuery,
    main_flag: MemberQuery,

    locked: Option<ObjectId>,
    chain: ChainCache,
    last_held: Option<ObjectId>,

    search_timer: IntervalTimer,
    check_timer: IntervalTimer,
    cooldown: f64,
}

impl SingleTargetPolicy {
    pub fn new(config: &SingleTargetConfig, polling: &PollingConfig) -> Self {
        let object = |names: &[String]| MemberQuery::new(names.iter().cloned(), ValueKind::Object);

        Self {
            action_type: config.action_type.clone(),
            controller: object(&config.controller_members),
            holder: object(&config.holder_members),
            held_item: object(&config.held_item_members),
            main_flag: MemberQuery::new(config.main_flag_members.iter().cloned(), ValueKind::Bool),
            locked: None,
            chain: ChainCache::default(),
            last_held: None,
            search_timer: IntervalTimer::new(polling.action_search_interval),
            check_timer: IntervalTimer::new(polling.held_check_interval),
            cooldown: polling.rediscovery_cooldown,
        }
    }

    /// Get the locked action object.
    pub fn locked(&self) -> Option<ObjectId> {
        self.locked
    }

    /// Drop the lock if the host destroyed the locked action.
    ///
    /// Returns the lost action. The next search is deferred by the cooldown.
    pub fn check_invalidated(&mut self, host: &dyn ObjectHost, now: f64) -> Option<ObjectId> {
        let action = self.locked.filter(|action| !host.is_live(*action))?;

        info!(%action, cooldown = self.cooldown, "locked action destroyed, releasing chain");
        self.release();
        self.search_timer.defer_until(now + self.cooldown);
        Some(action)
    }

    /// Search for the action object to lock, if none is locked and a search is due.
    pub fn try_lock(
        &mut self,
        resolver: &mut MemberResolver,
        host: &dyn ObjectHost,
        now: f64,
        log: &mut ProbeLog,
    ) -> Option<(ObjectId, Selection)> {
        if self.locked.is_some() || !self.search_timer.due(now) {
            return None;
        }

        let candidates =
            host.enumerate_instances(&InstanceQuery::AssignableTo(self.action_type.clone()));

        let main_flag = &self.main_flag;
        let controller = &self.controller;
        let (action, selection) = select_controlled(&candidates, |action| {
            log.absorb(resolver.probe_object(host, action, controller))
                .flatten()
                .is_some_and(|ctrl| probe_flag(resolver, host, ctrl, main_flag, log))
        })?;

        info!(
            %action,
            %selection,
            candidates = candidates.len(),
            name = %host.object_name(action).unwrap_or_default(),
            "locked action object"
        );
        self.locked = Some(action);
        self.check_timer.reset();
        Some((action, selection))
    }

    /// Whether the held-item check is due.
    pub fn check_due(&mut self, now: f64) -> bool {
        self.locked.is_some() && self.check_timer.due(now)
    }

    /// Follow the chain from the locked action to the live held item.
    pub fn held_item(
        &mut self,
        resolver: &mut MemberResolver,
        host: &dyn ObjectHost,
        log: &mut ProbeLog,
    ) -> Option<ObjectId> {
        let action = self.locked?;
        let controller = self.hop(resolver, host, action, Hop::Controller, log)?;
        let holder = self.hop(resolver, host, controller, Hop::Holder, log)?;
        self.hop(resolver, host, holder, Hop::HeldItem, log)
    }

    /// Whether `held` is the instance whose identity the last check read,
    /// so it need not be read again.
    pub fn is_settled(&self, held: Option<ObjectId>) -> bool {
        held.is_some() && self.last_held == held
    }

    /// Record the outcome of reading the held item's identity. An item whose
    /// identity could not be read is tried again on the next check.
    pub fn settle(&mut self, held: Option<ObjectId>, identified: bool) {
        self.last_held = held.filter(|_| identified);
    }

    /// Forget the lock and everything derived from it.
    pub fn release(&mut self) {
        self.locked = None;
        self.chain = ChainCache::default();
        self.last_held = None;
    }

    fn hop(
        &mut self,
        resolver: &mut MemberResolver,
        host: &dyn ObjectHost,
        object: ObjectId,
        hop: Hop,
        log: &mut ProbeLog,
    ) -> Option<ObjectId> {
        let ty = host.type_of(object)?;

        let (slot, query) = match hop {
            Hop::Controller => (&mut self.chain.controller, &self.controller),
            Hop::Holder => (&mut self.chain.holder, &self.holder),
            Hop::HeldItem => (&mut self.chain.held_item, &self.held_item),
        };

        let cached = slot
            .as_ref()
            .filter(|(owner, _)| *owner == ty)
            .map(|(_, handle)| handle.clone());
        let handle = match cached {
            Some(handle) => handle,
            None => {
                let resolved = resolver.resolve(host, ty, query);
                if resolved.is_none() {
                    debug!(?hop, member = %query, ty = %host.type_name(ty), "chain hop not found");
                }
                *slot = Some((ty, resolved.clone()));
                resolved
            }
        }?;

        log.absorb(resolver.read(host, object, &handle))?
            .as_object()
            .filter(|next| host.is_live(*next))
    }
}
