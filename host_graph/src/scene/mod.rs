//! In-memory object host.
//!
//! `SceneGraph` is a complete [`ObjectHost`] with no runtime behind it. Tests
//! build object graphs with it, and embedders that mirror a foreign runtime
//! into Rust can drive the engine through it.

use std::collections::HashMap;

use crate::host::{InstanceQuery, ObjectHost, ReadError};
use crate::objects::{MemberDecl, MemberKind, ObjectId, TypeDescriptor, TypeKey, Value};

/// Contents of one member slot.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Value),
    /// Reading the member raises on the host side.
    Faulted(String),
}

/// A live object in the scene.
#[derive(Debug, Clone)]
struct SceneObject {
    ty: TypeKey,
    name: String,
    slots: HashMap<(MemberKind, String), Slot>,
}

/// An in-memory object graph with explicit lifetimes.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// Registered types, indexed by `TypeKey`.
    types: Vec<TypeDescriptor>,

    /// Live objects.
    objects: HashMap<ObjectId, SceneObject>,

    /// Spawn order, for deterministic enumeration. May still hold destroyed
    /// ids; enumeration skips them.
    order: Vec<ObjectId>,

    /// Destroyed ids still present in `order`.
    stale: usize,
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runtime type.
    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> TypeKey {
        let key = TypeKey(self.types.len() as u32);
        self.types.push(descriptor);
        key
    }

    /// Look up a registered type by simple name.
    pub fn find_type(&self, name: &str) -> Option<TypeKey> {
        self.types
            .iter()
            .position(|desc| desc.name == name)
            .map(|idx| TypeKey(idx as u32))
    }

    /// Create a live object of the given type.
    pub fn spawn(&mut self, ty: TypeKey, name: impl Into<String>) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(
            id,
            SceneObject {
                ty,
                name: name.into(),
                slots: HashMap::new(),
            },
        );
        self.order.push(id);
        id
    }

    /// Assign a field. Returns false if the object is not live.
    pub fn set_field(&mut self, object: ObjectId, name: &str, value: impl Into<Value>) -> bool {
        self.set_slot(object, MemberKind::Field, name, Slot::Value(value.into()))
    }

    /// Assign the value a property getter returns. Returns false if the object is not live.
    pub fn set_property(&mut self, object: ObjectId, name: &str, value: impl Into<Value>) -> bool {
        self.set_slot(object, MemberKind::Property, name, Slot::Value(value.into()))
    }

    /// Make reads of a member fail. Returns false if the object is not live.
    pub fn fault(
        &mut self,
        object: ObjectId,
        kind: MemberKind,
        name: &str,
        reason: impl Into<String>,
    ) -> bool {
        self.set_slot(object, kind, name, Slot::Faulted(reason.into()))
    }

    fn set_slot(&mut self, object: ObjectId, kind: MemberKind, name: &str, slot: Slot) -> bool {
        match self.objects.get_mut(&object) {
            Some(obj) => {
                obj.slots.insert((kind, name.to_string()), slot);
                true
            }
            None => false,
        }
    }

    /// Destroy an object. References held elsewhere stay in place but are no longer live.
    pub fn destroy(&mut self, object: ObjectId) -> bool {
        if self.objects.remove(&object).is_none() {
            return false;
        }

        self.stale += 1;
        if self.stale > self.objects.len() {
            self.order.retain(|id| self.objects.contains_key(id));
            self.stale = 0;
        }
        true
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn matches(&self, obj: &SceneObject, query: &InstanceQuery) -> bool {
        match query {
            InstanceQuery::ExactType(ty) => obj.ty == *ty,
            InstanceQuery::AssignableTo(name) => self.is_assignable(obj.ty, name),
            InstanceQuery::ObjectNameContains(patterns) => {
                !obj.name.is_empty() && patterns.iter().any(|p| obj.name.contains(p.as_str()))
            }
        }
    }
}

impl ObjectHost for SceneGraph {
    fn is_live(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn type_of(&self, object: ObjectId) -> Option<TypeKey> {
        self.objects.get(&object).map(|obj| obj.ty)
    }

    fn describe(&self, ty: TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(ty.0 as usize)
    }

    fn read_member(&self, object: ObjectId, member: &MemberDecl) -> Result<Value, ReadError> {
        let obj = self
            .objects
            .get(&object)
            .ok_or(ReadError::Invalidated(object))?;

        let declared = self
            .members_of(obj.ty)
            .into_iter()
            .any(|(_, m)| m.kind == member.kind && m.name == member.name);
        if !declared {
            return Err(ReadError::UnknownMember(member.name.clone()));
        }

        match obj.slots.get(&(member.kind, member.name.clone())) {
            Some(Slot::Value(value)) => Ok(value.clone()),
            Some(Slot::Faulted(reason)) => Err(ReadError::AccessorFailed {
                member: member.name.clone(),
                reason: reason.clone(),
            }),
            None => Ok(member.value_kind.default_value()),
        }
    }

    fn enumerate_instances(&self, query: &InstanceQuery) -> Vec<ObjectId> {
        self.order
            .iter()
            .filter(|id| {
                self.objects
                    .get(id)
                    .is_some_and(|obj| self.matches(obj, query))
            })
            .copied()
            .collect()
    }

    fn enumerate_loaded_types(&self) -> Vec<TypeKey> {
        (0..self.types.len() as u32).map(TypeKey).collect()
    }

    fn object_name(&self, object: ObjectId) -> Option<String> {
        self.objects.get(&object).map(|obj| obj.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ValueKind;

    fn holder_scene() -> (SceneGraph, TypeKey, ObjectId) {
        let mut scene = SceneGraph::new();
        let ty = scene.register_type(
            TypeDescriptor::new("Holder")
                .with_member(MemberDecl::field("typeID", ValueKind::Int))
                .with_member(MemberDecl::property("CurrentHoldGun", ValueKind::Object)),
        );
        let obj = scene.spawn(ty, "Holder");
        (scene, ty, obj)
    }

    #[test]
    fn test_read_assigned_and_default_values() {
        let (mut scene, _, obj) = holder_scene();
        let type_id = MemberDecl::field("typeID", ValueKind::Int);
        let gun = MemberDecl::property("CurrentHoldGun", ValueKind::Object);

        assert_eq!(scene.read_member(obj, &type_id), Ok(Value::Int(0)));
        assert_eq!(scene.read_member(obj, &gun), Ok(Value::Null));

        scene.set_field(obj, "typeID", 238_i64);
        assert_eq!(scene.read_member(obj, &type_id), Ok(Value::Int(238)));
    }

    #[test]
    fn test_undeclared_member() {
        let (scene, _, obj) = holder_scene();
        let missing = MemberDecl::field("TypeID", ValueKind::Int);
        assert_eq!(
            scene.read_member(obj, &missing),
            Err(ReadError::UnknownMember("TypeID".to_string()))
        );

        // Same name, other kind
        let wrong_kind = MemberDecl::property("typeID", ValueKind::Int);
        assert!(scene.read_member(obj, &wrong_kind).is_err());
    }

    #[test]
    fn test_faulted_member() {
        let (mut scene, _, obj) = holder_scene();
        scene.fault(obj, MemberKind::Property, "CurrentHoldGun", "not initialised");

        let gun = MemberDecl::property("CurrentHoldGun", ValueKind::Object);
        assert!(matches!(
            scene.read_member(obj, &gun),
            Err(ReadError::AccessorFailed { .. })
        ));
    }

    #[test]
    fn test_destroy_invalidates_object() {
        let (mut scene, ty, obj) = holder_scene();
        let other = scene.spawn(ty, "Other");
        scene.set_property(other, "CurrentHoldGun", obj);

        assert!(scene.destroy(obj));
        assert!(!scene.is_live(obj));
        assert!(scene.type_of(obj).is_none());
        assert!(!scene.destroy(obj));

        // The reference survives, the object does not
        let gun = MemberDecl::property("CurrentHoldGun", ValueKind::Object);
        assert_eq!(scene.read_member(other, &gun), Ok(Value::Object(obj)));
        assert_eq!(
            scene.read_member(obj, &gun),
            Err(ReadError::Invalidated(obj))
        );
        assert!(!scene.set_field(obj, "typeID", 1_i64));
    }

    #[test]
    fn test_spawn_order_bounded_under_churn() {
        let (mut scene, ty, keep) = holder_scene();

        for _ in 0..1_000 {
            let obj = scene.spawn(ty, "Transient");
            assert!(scene.destroy(obj));
        }

        assert_eq!(scene.live_count(), 1);
        assert!(scene.order.len() <= 3);
        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::ExactType(ty)),
            vec![keep]
        );

        let last = scene.spawn(ty, "Last");
        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::ExactType(ty)),
            vec![keep, last]
        );
    }

    #[test]
    fn test_enumerate_instances() {
        let mut scene = SceneGraph::new();
        let base = scene.register_type(TypeDescriptor::new("MonoBehaviour"));
        let gun = scene.register_type(TypeDescriptor::new("ItemAgent_Gun").with_base(base));
        let melee = scene.register_type(TypeDescriptor::new("ItemAgent_Melee").with_base(base));

        let a = scene.spawn(gun, "Character(Clone)");
        let b = scene.spawn(melee, "Knife");
        let c = scene.spawn(gun, "");

        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::ExactType(gun)),
            vec![a, c]
        );
        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::AssignableTo("MonoBehaviour".into())),
            vec![a, b, c]
        );
        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::ObjectNameContains(vec![
                "Character".into(),
                "Player".into()
            ])),
            vec![a]
        );

        scene.destroy(a);
        assert_eq!(
            scene.enumerate_instances(&InstanceQuery::ExactType(gun)),
            vec![c]
        );
    }

    #[test]
    fn test_find_type_and_loaded_types() {
        let (scene, ty, _) = holder_scene();
        assert_eq!(scene.find_type("Holder"), Some(ty));
        assert_eq!(scene.find_type("Missing"), None);
        assert_eq!(scene.enumerate_loaded_types(), vec![ty]);
        assert_eq!(scene.type_count(), 1);
    }
}
