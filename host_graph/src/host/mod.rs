//! The object host port - what the engine needs from the application that owns the graph.

use std::collections::HashSet;

use thiserror::Error;

use crate::objects::{MemberDecl, ObjectId, TypeDescriptor, TypeKey, Value};

/// Failure to read a member through the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("object {0} is no longer live")]
    Invalidated(ObjectId),

    #[error("member '{0}' is not declared on the object's type")]
    UnknownMember(String),

    /// The host-side accessor raised.
    #[error("accessor for '{member}' failed: {reason}")]
    AccessorFailed { member: String, reason: String },
}

/// Predicate for enumerating live instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceQuery {
    /// Objects whose runtime type is exactly this one.
    ExactType(TypeKey),
    /// Objects whose runtime type is, or derives from, the named type.
    AssignableTo(String),
    /// Objects whose scene name contains any of the patterns.
    ObjectNameContains(Vec<String>),
}

/// Upper bound on base-chain length. Guards against malformed descriptors.
const MAX_BASE_CHAIN: usize = 64;

/// Access to a live, externally owned object graph.
///
/// Every method must tolerate ids of objects the host has already destroyed:
/// such objects are simply not live.
pub trait ObjectHost {
    /// Whether the id still refers to a live object.
    fn is_live(&self, object: ObjectId) -> bool;

    /// Runtime type of a live object.
    fn type_of(&self, object: ObjectId) -> Option<TypeKey>;

    /// Descriptor of a registered type.
    fn describe(&self, ty: TypeKey) -> Option<&TypeDescriptor>;

    /// Read one member of a live object.
    fn read_member(&self, object: ObjectId, member: &MemberDecl) -> Result<Value, ReadError>;

    /// All live instances matching the query, in host order.
    fn enumerate_instances(&self, query: &InstanceQuery) -> Vec<ObjectId>;

    /// Every type the host has loaded.
    fn enumerate_loaded_types(&self) -> Vec<TypeKey>;

    /// Scene name of a live object.
    fn object_name(&self, object: ObjectId) -> Option<String>;

    /// The type followed by its bases, most derived first.
    fn type_chain(&self, ty: TypeKey) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(ty);

        while let Some(key) = current {
            if chain.len() >= MAX_BASE_CHAIN || !seen.insert(key) {
                break;
            }
            chain.push(key);
            current = self.describe(key).and_then(|desc| desc.base);
        }

        chain
    }

    /// Members visible on a type, most derived type first, each with the type that declares it.
    fn members_of(&self, ty: TypeKey) -> Vec<(TypeKey, &MemberDecl)> {
        self.type_chain(ty)
            .into_iter()
            .filter_map(|key| self.describe(key).map(|desc| (key, desc)))
            .flat_map(|(key, desc)| desc.members.iter().map(move |m| (key, m)))
            .collect()
    }

    /// Whether the type is, or derives from, a type with the given name.
    fn is_assignable(&self, ty: TypeKey, target: &str) -> bool {
        self.type_chain(ty)
            .into_iter()
            .filter_map(|key| self.describe(key))
            .any(|desc| desc.name == target)
    }

    /// Name of a type, for logging.
    fn type_name(&self, ty: TypeKey) -> String {
        self.describe(ty)
            .map(|desc| desc.full_name())
            .unwrap_or_else(|| ty.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ValueKind;
    use crate::scene::SceneGraph;

    #[test]
    fn test_type_chain_order() {
        let mut scene = SceneGraph::new();
        let base = scene.register_type(TypeDescriptor::new("MonoBehaviour"));
        let agent = scene.register_type(TypeDescriptor::new("ItemAgent").with_base(base));
        let gun = scene.register_type(TypeDescriptor::new("ItemAgent_Gun").with_base(agent));

        assert_eq!(scene.type_chain(gun), vec![gun, agent, base]);
        assert!(scene.is_assignable(gun, "MonoBehaviour"));
        assert!(scene.is_assignable(gun, "ItemAgent_Gun"));
        assert!(!scene.is_assignable(base, "ItemAgent"));
    }

    #[test]
    fn test_members_of_flattens_derived_first() {
        let mut scene = SceneGraph::new();
        let base = scene.register_type(
            TypeDescriptor::new("Base").with_member(MemberDecl::field("inherited", ValueKind::Int)),
        );
        let derived = scene.register_type(
            TypeDescriptor::new("Derived")
                .with_base(base)
                .with_member(MemberDecl::field("own", ValueKind::Int)),
        );

        let names: Vec<_> = scene
            .members_of(derived)
            .into_iter()
            .map(|(owner, m)| (owner, m.name.clone()))
            .collect();

        assert_eq!(
            names,
            vec![(derived, "own".to_string()), (base, "inherited".to_string())]
        );
    }

    #[test]
    fn test_type_name_falls_back_to_key() {
        let scene = SceneGraph::new();
        assert_eq!(scene.type_name(TypeKey(42)), "type#42");
    }
}
