//! Depth-bounded search for the nearest item entity reachable from a root object.
//!
//! The host does not publish how an item holder stores its item, so the
//! locator probes every readable member within a bounded radius:
//!
//! 1. **Expand**: read every instance field, then every plain property, of the
//!    current object's runtime type
//! 2. **Match**: a value whose type derives from the item marker type is the answer
//! 3. **Descend**: item-related objects and sequence elements are queued one level deeper
//! 4. **Prune**: nulls, trivial values, dead objects, revisits and anything past
//!    `max_depth` end their branch
//!
//! Objects are expanded level by level, so the shallowest item wins and ties
//! go to the member declared first.

use std::collections::{HashSet, VecDeque};

use host_graph::{MemberKind, ObjectHost, ObjectId, TypeKey, Value};

use crate::config::LocatorConfig;

/// Decides which types are items and which are worth descending into.
#[derive(Debug, Clone)]
pub struct ItemMatcher {
    item_type: String,
    namespaces: Vec<String>,
    name_hints: Vec<String>,
}

impl ItemMatcher {
    pub fn new(
        item_type: impl Into<String>,
        namespaces: Vec<String>,
        name_hints: Vec<String>,
    ) -> Self {
        Self {
            item_type: item_type.into(),
            namespaces,
            name_hints,
        }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(
            config.item_type.clone(),
            config.item_namespaces.clone(),
            config.item_name_hints.clone(),
        )
    }

    /// The type is, or derives from, the item marker type.
    pub fn is_item(&self, host: &dyn ObjectHost, ty: TypeKey) -> bool {
        host.is_assignable(ty, &self.item_type)
    }

    /// The type may contain items: an item itself, a type in an item
    /// namespace, or a type whose name carries an item hint.
    pub fn is_item_related(&self, host: &dyn ObjectHost, ty: TypeKey) -> bool {
        if self.is_item(host, ty) {
            return true;
        }

        let Some(desc) = host.describe(ty) else {
            return false;
        };
        let namespace = desc.namespace.as_deref().unwrap_or_default();

        self.namespaces
            .iter()
            .any(|ns| namespace.contains(ns.as_str()))
            || self
                .name_hints
                .iter()
                .any(|hint| desc.name.contains(hint.as_str()))
    }
}

/// Counters collected during one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Objects whose members were read.
    pub objects_expanded: usize,
    /// Non-null values looked at.
    pub values_inspected: usize,
    /// Member reads the host failed.
    pub read_failures: usize,
    /// Branches cut by the depth bound.
    pub pruned_depth: usize,
    /// Objects skipped because they were already queued.
    pub pruned_visited: usize,
}

/// Breadth-ordered, cycle-safe item search.
#[derive(Debug, Clone)]
pub struct ItemLocator {
    matcher: ItemMatcher,
    max_depth: u32,
}

impl ItemLocator {
    pub fn new(matcher: ItemMatcher, max_depth: u32) -> Self {
        Self { matcher, max_depth }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(ItemMatcher::from_config(config), config.max_depth)
    }

    pub fn matcher(&self) -> &ItemMatcher {
        &self.matcher
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Nearest live item reachable from `root`, if any.
    pub fn locate(&self, host: &dyn ObjectHost, root: ObjectId) -> Option<ObjectId> {
        self.locate_traced(host, root).0
    }

    /// Like [`ItemLocator::locate`], also reporting what the search did.
    pub fn locate_traced(
        &self,
        host: &dyn ObjectHost,
        root: ObjectId,
    ) -> (Option<ObjectId>, TraversalStats) {
        let mut search = Search {
            host,
            matcher: &self.matcher,
            max_depth: self.max_depth,
            visited: HashSet::new(),
            frontier: VecDeque::new(),
            stats: TraversalStats::default(),
        };
        let found = search.run(root);
        (found, search.stats)
    }
}

/// State of one traversal.
struct Search<'a> {
    host: &'a dyn ObjectHost,
    matcher: &'a ItemMatcher,
    max_depth: u32,
    /// Identity-keyed; equal-looking objects are still distinct.
    visited: HashSet<ObjectId>,
    frontier: VecDeque<(ObjectId, u32)>,
    stats: TraversalStats,
}

impl Search<'_> {
    fn run(&mut self, root: ObjectId) -> Option<ObjectId> {
        let root_ty = self.host.type_of(root)?;
        if self.matcher.is_item(self.host, root_ty) {
            return Some(root);
        }

        self.visited.insert(root);
        self.frontier.push_back((root, 0));

        while let Some((object, depth)) = self.frontier.pop_front() {
            if let Some(found) = self.expand(object, depth) {
                return Some(found);
            }
        }

        None
    }

    /// Read every member of `object`; member values sit at the object's own depth.
    fn expand(&mut self, object: ObjectId, depth: u32) -> Option<ObjectId> {
        // Destroyed between being queued and being expanded
        let host = self.host;
        let ty = host.type_of(object)?;
        self.stats.objects_expanded += 1;

        let members = host.members_of(ty);
        let readable = members.iter().filter(|(_, m)| m.is_plain_readable());
        let fields = readable.clone().filter(|(_, m)| m.kind == MemberKind::Field);
        let properties = readable.filter(|(_, m)| m.kind == MemberKind::Property);

        for (_, member) in fields.chain(properties) {
            let value = match host.read_member(object, member) {
                Ok(value) => value,
                Err(_) => {
                    self.stats.read_failures += 1;
                    continue;
                }
            };

            if let Some(found) = self.inspect(&value, depth) {
                return Some(found);
            }
        }

        None
    }

    /// Match a value, or queue what is worth descending into.
    fn inspect(&mut self, value: &Value, depth: u32) -> Option<ObjectId> {
        if value.is_null() || value.is_trivial() {
            return None;
        }
        self.stats.values_inspected += 1;

        match value {
            Value::Object(id) => {
                // Tombstoned references are gone, not matches
                let ty = self.host.type_of(*id)?;
                if self.matcher.is_item(self.host, ty) {
                    return Some(*id);
                }
                if self.matcher.is_item_related(self.host, ty) {
                    self.enqueue(*id, depth + 1);
                }
                None
            }
            Value::Sequence(elements) => {
                if depth + 1 > self.max_depth {
                    self.stats.pruned_depth += 1;
                    return None;
                }
                elements
                    .iter()
                    .find_map(|element| self.inspect(element, depth + 1))
            }
            _ => None,
        }
    }

    fn enqueue(&mut self, object: ObjectId, depth: u32) {
        if depth > self.max_depth {
            self.stats.pruned_depth += 1;
        } else if !self.visited.insert(object) {
            self.stats.pruned_visited += 1;
        } else {
            self.frontier.push_back((object, depth));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_graph::{MemberDecl, SceneGraph, TypeDescriptor, ValueKind};
    use proptest::prelude::*;

    fn locator(max_depth: u32) -> ItemLocator {
        ItemLocator::new(ItemMatcher::from_config(&LocatorConfig::default()), max_depth)
    }

    /// Scene with the item marker type and a gun item type.
    struct Fixture {
        scene: SceneGraph,
        item_ty: TypeKey,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = SceneGraph::new();
            let base = scene.register_type(
                TypeDescriptor::new("Item")
                    .with_namespace("ItemStatsSystem")
                    .with_member(MemberDecl::property("TypeID", ValueKind::Int)),
            );
            let item_ty = scene.register_type(TypeDescriptor::new("GunItem").with_base(base));
            Self { scene, item_ty }
        }

        fn item(&mut self, type_id: i64) -> ObjectId {
            let item = self.scene.spawn(self.item_ty, "Item");
            self.scene.set_property(item, "TypeID", type_id);
            item
        }

        fn node_type(&mut self, name: &str, members: &[MemberDecl]) -> TypeKey {
            let desc = members
                .iter()
                .cloned()
                .fold(TypeDescriptor::new(name), |desc, m| desc.with_member(m));
            self.scene.register_type(desc)
        }
    }

    #[test]
    fn test_direct_field_match() {
        let mut fx = Fixture::new();
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::field("ammo", ValueKind::Int),
                MemberDecl::field("item", ValueKind::Object),
            ],
        );
        let agent = fx.scene.spawn(agent_ty, "Gun");
        let item = fx.item(238);
        fx.scene.set_field(agent, "item", item);

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(item));
    }

    #[test]
    fn test_root_item_is_its_own_match() {
        let mut fx = Fixture::new();
        let item = fx.item(248);
        assert_eq!(locator(3).locate(&fx.scene, item), Some(item));
    }

    #[test]
    fn test_dead_root_and_dead_referent() {
        let mut fx = Fixture::new();
        let agent_ty = fx.node_type("ItemAgent_Gun", &[MemberDecl::field("item", ValueKind::Object)]);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        let item = fx.item(238);
        fx.scene.set_field(agent, "item", item);

        fx.scene.destroy(item);
        assert_eq!(locator(3).locate(&fx.scene, agent), None);

        fx.scene.destroy(agent);
        assert_eq!(locator(3).locate(&fx.scene, agent), None);
    }

    #[test]
    fn test_descends_into_related_types_only() {
        let mut fx = Fixture::new();
        let slot_ty = fx.node_type("InventorySlot", &[MemberDecl::field("content", ValueKind::Object)]);
        let other_ty = fx.node_type("Transform", &[MemberDecl::field("content", ValueKind::Object)]);
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::field("transform", ValueKind::Object),
                MemberDecl::field("slot", ValueKind::Object),
            ],
        );

        let hidden = fx.item(1);
        let reachable = fx.item(2);
        let transform = fx.scene.spawn(other_ty, "Transform");
        let slot = fx.scene.spawn(slot_ty, "Slot");
        fx.scene.set_field(transform, "content", hidden);
        fx.scene.set_field(slot, "content", reachable);

        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_field(agent, "transform", transform);
        fx.scene.set_field(agent, "slot", slot);

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(reachable));
    }

    #[test]
    fn test_namespace_makes_type_related() {
        let mut fx = Fixture::new();
        let stats_ty = fx.scene.register_type(
            TypeDescriptor::new("Stat")
                .with_namespace("ItemStatsSystem")
                .with_member(MemberDecl::field("owner", ValueKind::Object)),
        );
        let agent_ty = fx.node_type("ItemAgent_Gun", &[MemberDecl::field("stat", ValueKind::Object)]);

        let item = fx.item(7);
        let stat = fx.scene.spawn(stats_ty, "Stat");
        fx.scene.set_field(stat, "owner", item);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_field(agent, "stat", stat);

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(item));
    }

    #[test]
    fn test_shallower_item_wins() {
        let mut fx = Fixture::new();
        let slot_ty = fx.node_type("InventorySlot", &[MemberDecl::field("content", ValueKind::Object)]);
        // The nested path is declared first
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::field("slot", ValueKind::Object),
                MemberDecl::field("item", ValueKind::Object),
            ],
        );

        let deep = fx.item(1);
        let shallow = fx.item(2);
        let slot = fx.scene.spawn(slot_ty, "Slot");
        fx.scene.set_field(slot, "content", deep);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_field(agent, "slot", slot);
        fx.scene.set_field(agent, "item", shallow);

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(shallow));
    }

    #[test]
    fn test_equal_depth_prefers_fields_then_declaration_order() {
        let mut fx = Fixture::new();
        // Property declared before both fields
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::property("Item", ValueKind::Object),
                MemberDecl::field("primary", ValueKind::Object),
                MemberDecl::field("secondary", ValueKind::Object),
            ],
        );

        let from_property = fx.item(1);
        let primary = fx.item(2);
        let secondary = fx.item(3);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_property(agent, "Item", from_property);
        fx.scene.set_field(agent, "primary", primary);
        fx.scene.set_field(agent, "secondary", secondary);

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(primary));

        fx.scene.set_field(agent, "primary", Value::Null);
        fx.scene.set_field(agent, "secondary", Value::Null);
        assert_eq!(locator(3).locate(&fx.scene, agent), Some(from_property));
    }

    #[test]
    fn test_sequences_are_searched() {
        let mut fx = Fixture::new();
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::field("ids", ValueKind::Sequence),
                MemberDecl::field("slots", ValueKind::Sequence),
            ],
        );

        let item = fx.item(876);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_field(
            agent,
            "ids",
            Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Text("x".into())]),
        );
        fx.scene.set_field(
            agent,
            "slots",
            Value::Sequence(vec![Value::Null, Value::Sequence(vec![Value::Object(item)])]),
        );

        assert_eq!(locator(3).locate(&fx.scene, agent), Some(item));
        // Nested sequence puts the item two levels down
        assert_eq!(locator(1).locate(&fx.scene, agent), None);
    }

    #[test]
    fn test_depth_bound() {
        let mut fx = Fixture::new();
        let slot_ty = fx.node_type("InventorySlot", &[MemberDecl::field("next", ValueKind::Object)]);

        // root -> s1 -> s2 -> s3 -> item
        let item = fx.item(238);
        let mut next = item;
        for _ in 0..4 {
            let slot = fx.scene.spawn(slot_ty, "Slot");
            fx.scene.set_field(slot, "next", next);
            next = slot;
        }
        let root = next;

        // Item is a member of the object at depth 3
        assert_eq!(locator(3).locate(&fx.scene, root), Some(item));
        let (found, stats) = locator(2).locate_traced(&fx.scene, root);
        assert_eq!(found, None);
        assert_eq!(stats.objects_expanded, 3);
        assert_eq!(stats.pruned_depth, 1);
    }

    #[test]
    fn test_self_referential_graph_terminates() {
        let mut fx = Fixture::new();
        let node_ty = fx.node_type(
            "InventoryNode",
            &[
                MemberDecl::field("me", ValueKind::Object),
                MemberDecl::field("peer", ValueKind::Object),
                MemberDecl::property("All", ValueKind::Sequence),
            ],
        );

        let a = fx.scene.spawn(node_ty, "A");
        let b = fx.scene.spawn(node_ty, "B");
        for (node, peer) in [(a, b), (b, a)] {
            fx.scene.set_field(node, "me", node);
            fx.scene.set_field(node, "peer", peer);
            fx.scene.set_property(node, "All", Value::objects([a, b]));
        }

        let (found, stats) = locator(8).locate_traced(&fx.scene, a);
        assert_eq!(found, None);
        assert_eq!(stats.objects_expanded, 2);
        assert!(stats.pruned_visited > 0);
    }

    #[test]
    fn test_read_failures_skip_member() {
        let mut fx = Fixture::new();
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::property("Broken", ValueKind::Object),
                MemberDecl::property("Item", ValueKind::Object),
            ],
        );
        let item = fx.item(238);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.fault(agent, MemberKind::Property, "Broken", "getter threw");
        fx.scene.set_property(agent, "Item", item);

        let (found, stats) = locator(3).locate_traced(&fx.scene, agent);
        assert_eq!(found, Some(item));
        assert_eq!(stats.read_failures, 1);
    }

    #[test]
    fn test_static_and_indexed_members_not_read() {
        let mut fx = Fixture::new();
        let agent_ty = fx.node_type(
            "ItemAgent_Gun",
            &[
                MemberDecl::field("shared", ValueKind::Object).with_static(),
                MemberDecl::property("Slots", ValueKind::Object).indexed(),
            ],
        );
        let item = fx.item(238);
        let agent = fx.scene.spawn(agent_ty, "Gun");
        fx.scene.set_field(agent, "shared", item);
        fx.scene.set_property(agent, "Slots", item);

        assert_eq!(locator(3).locate(&fx.scene, agent), None);
    }

    proptest! {
        /// Any graph of item-related nodes, cyclic or not, is searched to
        /// completion without expanding a node twice.
        #[test]
        fn prop_locate_terminates_on_arbitrary_graphs(
            node_count in 1usize..24,
            edges in prop::collection::vec((0usize..24, 0usize..24), 0..96),
            max_depth in 1u32..8,
            item_at in prop::option::of(0usize..24),
        ) {
            let mut fx = Fixture::new();
            let node_ty = fx.node_type(
                "InventoryNode",
                &[
                    MemberDecl::field("links", ValueKind::Sequence),
                    MemberDecl::property("Held", ValueKind::Object),
                ],
            );
            let nodes: Vec<_> = (0..node_count)
                .map(|_| fx.scene.spawn(node_ty, "Node"))
                .collect();

            for (idx, node) in nodes.iter().enumerate() {
                let links = edges
                    .iter()
                    .filter(|(from, _)| from % node_count == idx)
                    .map(|(_, to)| nodes[to % node_count]);
                fx.scene.set_field(*node, "links", Value::objects(links));
            }

            let item = item_at.map(|idx| {
                let item = fx.item(238);
                fx.scene.set_property(nodes[idx % node_count], "Held", item);
                item
            });

            let (found, stats) = locator(max_depth).locate_traced(&fx.scene, nodes[0]);

            prop_assert!(stats.objects_expanded <= node_count);
            match found {
                Some(found) => prop_assert_eq!(Some(found), item),
                None => prop_assert!(item.is_none() || stats.pruned_depth > 0 || node_count > 1),
            }
        }
    }
}
