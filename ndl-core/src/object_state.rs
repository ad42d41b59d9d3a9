//! Per-time object state.
//!
//! An [`ObjectState`] is the dynamic side of an object at one point in
//! time: its current parents, the memoized C3 linearization for those
//! parents, and the `(operator, value)` pairs of members that carry a
//! value at this state. States are immutable once published into a view's
//! time index; patching builds a new state.

use crate::c3::Linearization;
use crate::fqon::{Fqon, MemberId};
use crate::op::Operator;
use crate::value::Value;
use hashbrown::HashMap;
use once_cell::sync::OnceCell;
use smallvec::SmallVec;

/// One valued member: override depth, operator, value.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    override_depth: u32,
    operation: Operator,
    value: Value,
}

impl Member {
    pub fn new(override_depth: u32, operation: Operator, value: Value) -> Self {
        Self {
            override_depth,
            operation,
            value,
        }
    }

    /// Number of leading `@` on the member name. Carried as data; the
    /// value fold does not consume it yet.
    pub fn override_depth(&self) -> u32 {
        self.override_depth
    }

    pub fn operation(&self) -> Operator {
        self.operation
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Dynamic state of one object at one point in time.
#[derive(Clone, Debug, Default)]
pub struct ObjectState {
    parents: SmallVec<[Fqon; 4]>,
    linearization: OnceCell<Linearization>,
    members: HashMap<MemberId, Member>,
}

impl ObjectState {
    /// Create a state with the given parents and no members yet.
    pub fn new(parents: SmallVec<[Fqon; 4]>) -> Self {
        Self {
            parents,
            linearization: OnceCell::new(),
            members: HashMap::new(),
        }
    }

    /// Create a state with parents and members (patch application).
    pub fn with_members(
        parents: SmallVec<[Fqon; 4]>,
        members: HashMap<MemberId, Member>,
    ) -> Self {
        Self {
            parents,
            linearization: OnceCell::new(),
            members,
        }
    }

    /// Declared parents, in order.
    pub fn parents(&self) -> &[Fqon] {
        &self.parents
    }

    /// The memoized linearization, if computed for this state.
    pub fn linearization(&self) -> Option<&Linearization> {
        self.linearization.get()
    }

    /// Memoize the linearization for this state. A second call with a
    /// different value is ignored; linearization is a pure function of
    /// the ancestor graph, so recomputations agree.
    pub fn cache_linearization(&self, linearization: Linearization) -> &Linearization {
        self.linearization.get_or_init(|| linearization)
    }

    /// Install the member values (loader only; states are frozen once
    /// published).
    pub fn set_members(&mut self, members: HashMap<MemberId, Member>) {
        self.members = members;
    }

    /// Look up a valued member.
    pub fn member(&self, member: &str) -> Option<&Member> {
        self.members.get(member)
    }

    /// All valued members.
    pub fn members(&self) -> &HashMap<MemberId, Member> {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_linearization_memoized_once() {
        let state = ObjectState::new(smallvec![Fqon::new("A")]);
        assert!(state.linearization().is_none());

        let lin: Linearization = [Fqon::new("B"), Fqon::new("A")].into_iter().collect();
        state.cache_linearization(lin.clone());
        assert_eq!(state.linearization(), Some(&lin));

        // second write is a no-op
        let other: Linearization = [Fqon::new("B")].into_iter().collect();
        state.cache_linearization(other);
        assert_eq!(state.linearization(), Some(&lin));
    }
}
