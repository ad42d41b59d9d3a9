//! Runtime patch application.
//!
//! Applying a patch object to its target produces a new target state at
//! a fresh commit time: added parents go in front of the target's
//! current parents, the patch's member operations fold onto the target's
//! stored entries, and the target plus every object inheriting from it
//! is re-linearized. Application is atomic: a C3 conflict rejects the
//! patch and leaves the view untouched.

use crate::error::{DbError, Result};
use crate::view::{Changes, View};
use hashbrown::HashMap;
use ndl_core::{c3, Error as CoreError, Fqon, Member, ObjectState, OrderT};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Apply the patch named `patch_fqon` within `view`; returns the commit
/// time of the new state.
pub(crate) fn apply(view: &View, patch_fqon: &str) -> Result<OrderT> {
    let database = view.database().clone();
    let meta = database.meta_info();

    let info = meta
        .object(patch_fqon)
        .ok_or_else(|| DbError::api(format!("unknown object '{patch_fqon}'")))?;
    let Some(target) = info.target().cloned() else {
        return Err(DbError::patch(format!("'{patch_fqon}' is not a patch")));
    };

    let t_now = view.current_t();
    let patch_state = view.state_at(patch_fqon, t_now)?;
    let target_state = view.state_at(target.as_str(), t_now)?;

    // New parents: additions first, current parents keep their slots. An
    // added parent already present is dropped rather than moved.
    let mut new_parents: SmallVec<[Fqon; 4]> = SmallVec::new();
    for parent in info.inheritance_add() {
        if !target_state.parents().contains(parent) && !new_parents.contains(parent) {
            new_parents.push(parent.clone());
        }
    }
    new_parents.extend(target_state.parents().iter().cloned());

    // Fold each patch entry onto the target's stored member. An existing
    // entry keeps its operator and gets the patch operation applied to
    // its value, so re-applying the same patch keeps taking effect; a
    // member the target does not store yet receives the patch entry
    // as-is and composes through the regular linearization fold.
    let mut members = target_state.members().clone();
    for (member, entry) in patch_state.members() {
        match members.get(member) {
            Some(existing) => {
                let value = match existing.value().apply(entry.operation(), entry.value()) {
                    Ok(value) => value,
                    Err(err) => {
                        debug!(patch = patch_fqon, target = %target, %err, "patch rejected");
                        return Err(DbError::patch(err.to_string()));
                    }
                };
                let updated = Member::new(existing.override_depth(), existing.operation(), value);
                members.insert(member.clone(), updated);
            }
            None => {
                members.insert(member.clone(), entry.clone());
            }
        }
    }

    let new_target_state = Arc::new(ObjectState::with_members(new_parents, members));

    // Re-linearize against the hypothetical state. Any C3 failure
    // rejects the patch before anything is published.
    let parents_of = |fqon: &Fqon| -> ndl_core::Result<Vec<Fqon>> {
        if fqon == &target {
            Ok(new_target_state.parents().to_vec())
        } else {
            view.state_at(fqon.as_str(), t_now)
                .map(|state| state.parents().to_vec())
                .map_err(|err| CoreError::internal(err.to_string()))
        }
    };

    let target_lin = match c3::linearize(&target, &parents_of) {
        Ok(linearization) => linearization,
        Err(err) => {
            debug!(patch = patch_fqon, target = %target, %err, "patch rejected");
            return Err(DbError::patch(err.to_string()));
        }
    };
    new_target_state.cache_linearization(target_lin);

    // Every object whose ancestry contains the target changes with it.
    let mut changes: Changes = HashMap::new();
    for (fqon, _) in meta.objects() {
        if fqon == &target {
            continue;
        }
        let old_lin = view.linearization_at(fqon.as_str(), t_now)?;
        if !old_lin.iter().any(|ancestor| ancestor == &target) {
            continue;
        }

        let old_state = view.state_at(fqon.as_str(), t_now)?;
        let new_lin = match c3::linearize(fqon, &parents_of) {
            Ok(linearization) => linearization,
            Err(err) => {
                debug!(patch = patch_fqon, target = %target, %err, "patch rejected");
                return Err(DbError::patch(err.to_string()));
            }
        };

        if Some(&new_lin) == old_state.linearization() {
            // Ancestry order unchanged: share the old state, but keep the
            // object in the affected set for notifications.
            changes.insert(fqon.clone(), old_state);
        } else {
            let state = ObjectState::with_members(
                old_state.parents().iter().cloned().collect(),
                old_state.members().clone(),
            );
            state.cache_linearization(new_lin);
            changes.insert(fqon.clone(), Arc::new(state));
        }
    }
    changes.insert(target.clone(), new_target_state);

    let commit_t = t_now + 1;
    view.commit(commit_t, changes);
    debug!(patch = patch_fqon, target = %target, t = commit_t, "patch applied");
    Ok(commit_t)
}
