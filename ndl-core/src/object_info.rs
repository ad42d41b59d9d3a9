//! Static object metadata, fixed at load time.

use crate::error::{Error, Result};
use crate::fqon::{Fqon, MemberId};
use crate::location::Location;
use crate::types::DataType;
use hashbrown::HashMap;
use std::sync::Arc;

/// Static description of a declared member.
///
/// The type is either declared inline (`initial_def = true`) or filled in
/// by the type resolver as a shared handle to the declaring ancestor's
/// type (`initial_def = false`).
#[derive(Clone, Debug)]
pub struct MemberInfo {
    location: Location,
    data_type: Option<Arc<DataType>>,
    initial_def: bool,
    override_depth: u32,
}

impl MemberInfo {
    /// Create a member info without a type yet.
    pub fn new(location: Location, override_depth: u32) -> Self {
        Self {
            location,
            data_type: None,
            initial_def: false,
            override_depth,
        }
    }

    /// Install the member's type.
    ///
    /// `initial_def` is true iff the type was declared on this object
    /// rather than inherited.
    pub fn set_type(&mut self, data_type: Arc<DataType>, initial_def: bool) {
        self.data_type = Some(data_type);
        self.initial_def = initial_def;
    }

    /// The member's type, if resolved.
    pub fn data_type(&self) -> Option<&Arc<DataType>> {
        self.data_type.as_ref()
    }

    /// True iff this object declares the member's type itself.
    pub fn is_initial_def(&self) -> bool {
        self.initial_def
    }

    /// Number of leading `@` on the member name.
    pub fn override_depth(&self) -> u32 {
        self.override_depth
    }

    /// Where the member was declared.
    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// Static description of an object: patch target, parents to add,
/// declared members.
#[derive(Clone, Debug)]
pub struct ObjectInfo {
    name: Fqon,
    location: Location,
    patch_target: Option<Fqon>,
    inheritance_add: Vec<Fqon>,
    members: HashMap<MemberId, MemberInfo>,
}

impl ObjectInfo {
    /// Create an empty object info.
    pub fn new(name: Fqon, location: Location) -> Self {
        Self {
            name,
            location,
            patch_target: None,
            inheritance_add: Vec::new(),
            members: HashMap::new(),
        }
    }

    /// The object's fully-qualified name.
    pub fn name(&self) -> &Fqon {
        &self.name
    }

    /// Where the object was declared.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Mark this object as a patch on `target`.
    pub fn set_target(&mut self, target: Fqon) {
        self.patch_target = Some(target);
    }

    /// The patch target, if this object is a patch.
    pub fn target(&self) -> Option<&Fqon> {
        self.patch_target.as_ref()
    }

    /// True iff this object is a patch.
    pub fn is_patch(&self) -> bool {
        self.patch_target.is_some()
    }

    /// Record a parent this patch adds to its target.
    pub fn add_inheritance_add(&mut self, parent: Fqon) {
        self.inheritance_add.push(parent);
    }

    /// Parents this patch adds to its target, in declaration order.
    pub fn inheritance_add(&self) -> &[Fqon] {
        &self.inheritance_add
    }

    /// Register a declared member. Duplicate member names are an error.
    pub fn add_member(&mut self, member: MemberId, info: MemberInfo) -> Result<&mut MemberInfo> {
        let location = info.location.clone();
        match self.members.entry(member.clone()) {
            hashbrown::hash_map::Entry::Vacant(entry) => Ok(entry.insert(info)),
            hashbrown::hash_map::Entry::Occupied(_) => Err(Error::name(
                location,
                format!("member '{member}' already declared on '{}'", self.name),
            )),
        }
    }

    /// Look up a declared member.
    pub fn member(&self, member: &str) -> Option<&MemberInfo> {
        self.members.get(member)
    }

    /// Mutable access for the type resolver.
    pub fn member_mut(&mut self, member: &str) -> Option<&mut MemberInfo> {
        self.members.get_mut(member)
    }

    /// All declared members.
    pub fn members(&self) -> impl Iterator<Item = (&MemberId, &MemberInfo)> {
        self.members.iter()
    }

    /// Mutable iteration for the type resolver.
    pub fn members_mut(&mut self) -> impl Iterator<Item = (&MemberId, &mut MemberInfo)> {
        self.members.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_member_rejected() {
        let mut info = ObjectInfo::new(Fqon::new("A"), Location::internal("test"));
        let member: MemberId = Arc::from("hp");
        info.add_member(member.clone(), MemberInfo::new(Location::internal("test"), 0))
            .unwrap();
        let err = info
            .add_member(member, MemberInfo::new(Location::internal("test"), 0))
            .unwrap_err();
        assert!(err.to_string().contains("already declared"));
    }

    #[test]
    fn test_patch_flag() {
        let mut info = ObjectInfo::new(Fqon::new("Buff"), Location::internal("test"));
        assert!(!info.is_patch());
        info.set_target(Fqon::new("A"));
        assert!(info.is_patch());
        assert_eq!(info.target().unwrap().as_str(), "A");
    }
}
