//! Member resolution by name and expected kind, memoized per runtime type.

use std::collections::HashMap;
use std::sync::Arc;

use host_graph::{MemberDecl, MemberKind, ObjectHost, ObjectId, TypeKey, Value, ValueKind};

use crate::error::{ProbeError, ProbeResult};

/// A lookup request: ordered candidate names plus the kind the value must have.
///
/// Candidates cover the spellings one logical attribute has had across host
/// versions, e.g. `TypeID` / `typeID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberQuery {
    names: Arc<[String]>,
    kind: ValueKind,
}

impl MemberQuery {
    pub fn new<I, S>(names: I, kind: ValueKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl std::fmt::Display for MemberQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.names.join("|"), self.kind)
    }
}

/// A member resolved for one runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    /// Runtime type the handle was resolved for.
    pub owner: TypeKey,
    /// Type in the owner's base chain that declares the member.
    pub declared_on: TypeKey,
    pub member: MemberDecl,
}

impl MemberHandle {
    pub fn name(&self) -> &str {
        &self.member.name
    }
}

/// Memoizing member resolver.
///
/// Results are keyed by the exact runtime type, never by a declared type, so
/// subtypes met during traversal get their own entries. Absence is cached too.
#[derive(Debug, Default)]
pub struct MemberResolver {
    cache: HashMap<(TypeKey, MemberQuery), Option<Arc<MemberHandle>>>,

    /// Uncached lookups performed so far.
    resolutions: u64,
}

impl MemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a member on a runtime type.
    ///
    /// Every candidate name is tried as a property first, then every candidate
    /// as a field. A same-named member of the wrong kind does not match.
    pub fn resolve(
        &mut self,
        host: &dyn ObjectHost,
        ty: TypeKey,
        query: &MemberQuery,
    ) -> Option<Arc<MemberHandle>> {
        if let Some(cached) = self.cache.get(&(ty, query.clone())) {
            return cached.clone();
        }

        self.resolutions += 1;
        let handle = Self::lookup(host, ty, query).map(Arc::new);
        self.cache.insert((ty, query.clone()), handle.clone());
        handle
    }

    fn lookup(host: &dyn ObjectHost, ty: TypeKey, query: &MemberQuery) -> Option<MemberHandle> {
        let members = host.members_of(ty);

        for kind in [MemberKind::Property, MemberKind::Field] {
            for name in query.names() {
                let found = members.iter().find(|(_, m)| {
                    m.kind == kind
                        && m.name == *name
                        && m.is_plain_readable()
                        && m.value_kind == query.kind
                });
                if let Some((declared_on, member)) = found {
                    return Some(MemberHandle {
                        owner: ty,
                        declared_on: *declared_on,
                        member: (*member).clone(),
                    });
                }
            }
        }

        None
    }

    /// Read a member through a resolved handle.
    ///
    /// Liveness is checked first; a value whose runtime kind contradicts the
    /// handle is reported rather than returned. Null is accepted for object
    /// and sequence members.
    pub fn read(
        &self,
        host: &dyn ObjectHost,
        object: ObjectId,
        handle: &MemberHandle,
    ) -> ProbeResult<Value> {
        if !host.is_live(object) {
            return Err(ProbeError::Invalidated(object));
        }

        let value = host.read_member(object, &handle.member)?;
        let expected = handle.member.value_kind;
        match value.kind() {
            Some(kind) if kind == expected => Ok(value),
            None if matches!(expected, ValueKind::Object | ValueKind::Sequence) => Ok(value),
            found => Err(ProbeError::UnexpectedValue {
                member: handle.member.name.clone(),
                expected,
                found,
            }),
        }
    }

    /// Resolve on the object's runtime type and read in one step.
    pub fn probe(
        &mut self,
        host: &dyn ObjectHost,
        object: ObjectId,
        query: &MemberQuery,
    ) -> ProbeResult<Value> {
        let ty = host.type_of(object).ok_or(ProbeError::Invalidated(object))?;
        let handle = self
            .resolve(host, ty, query)
            .ok_or_else(|| ProbeError::MemberNotFound {
                query: query.to_string(),
                type_name: host.type_name(ty),
            })?;
        self.read(host, object, &handle)
    }

    /// Probe an integer member.
    pub fn probe_int(
        &mut self,
        host: &dyn ObjectHost,
        object: ObjectId,
        query: &MemberQuery,
    ) -> ProbeResult<i64> {
        let value = self.probe(host, object, query)?;
        value.as_int().ok_or_else(|| ProbeError::UnexpectedValue {
            member: query.to_string(),
            expected: ValueKind::Int,
            found: value.kind(),
        })
    }

    /// Probe a boolean member.
    pub fn probe_bool(
        &mut self,
        host: &dyn ObjectHost,
        object: ObjectId,
        query: &MemberQuery,
    ) -> ProbeResult<bool> {
        let value = self.probe(host, object, query)?;
        value.as_bool().ok_or_else(|| ProbeError::UnexpectedValue {
            member: query.to_string(),
            expected: ValueKind::Bool,
            found: value.kind(),
        })
    }

    /// Probe an object reference. Null and destroyed referents both read as `None`.
    pub fn probe_object(
        &mut self,
        host: &dyn ObjectHost,
        object: ObjectId,
        query: &MemberQuery,
    ) -> ProbeResult<Option<ObjectId>> {
        let value = self.probe(host, object, query)?;
        Ok(value.as_object().filter(|id| host.is_live(*id)))
    }

    /// Forget every result cached for a type.
    pub fn invalidate_type(&mut self, ty: TypeKey) {
        self.cache.retain(|(key, _), _| *key != ty);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of cached results, positive and negative.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Uncached lookups performed so far.
    pub fn resolutions(&self) -> u64 {
        self.resolutions
    }
}
