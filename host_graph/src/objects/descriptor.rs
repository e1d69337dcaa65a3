//! Runtime type descriptors.

use serde::{Deserialize, Serialize};

use super::{TypeKey, ValueKind};

/// Whether a member is stored or computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// A stored field.
    Field,
    /// A computed accessor.
    Property,
}

/// A member declared on a runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    pub kind: MemberKind,
    pub value_kind: ValueKind,
    pub is_static: bool,
    /// Indexers need arguments and cannot be read plainly.
    pub is_indexed: bool,
    pub readable: bool,
}

impl MemberDecl {
    /// Declare an instance field.
    pub fn field(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            value_kind,
            is_static: false,
            is_indexed: false,
            readable: true,
        }
    }

    /// Declare a readable instance property.
    pub fn property(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            kind: MemberKind::Property,
            ..Self::field(name, value_kind)
        }
    }

    /// Mark the member as static.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark the member as an indexer.
    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    /// Mark the member as write-only.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Instance member that can be read without arguments.
    pub fn is_plain_readable(&self) -> bool {
        self.readable && !self.is_static && !self.is_indexed
    }
}

/// The runtime type of a host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub namespace: Option<String>,
    pub base: Option<TypeKey>,
    /// Members declared on this type, in declaration order.
    pub members: Vec<MemberDecl>,
}

impl TypeDescriptor {
    /// Create a descriptor with no namespace, base or members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            base: None,
            members: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_base(mut self, base: TypeKey) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    /// Find a member declared directly on this type.
    pub fn find_member(&self, name: &str, kind: MemberKind) -> Option<&MemberDecl> {
        self.members
            .iter()
            .find(|m| m.kind == kind && m.name == name)
    }
}
