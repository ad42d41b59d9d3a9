//! Views: time-indexed, forkable query handles.
//!
//! A [`View`] layers a time index of patched states over its parent view
//! (or the database's initial state for the root view). Queries resolve
//! the latest state at or before `t`, walk the linearization from the
//! most distant ancestor, and fold each ancestor's `(operator, value)`
//! entry into the result. Folded values are cached per
//! `(object, member, t)` and invalidated when a patch commits at or
//! before a cached time.
//!
//! Views are cheap-clone handles over a shared inner structure; callers
//! serialize mutations per view.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::notifier::{NotifierHandle, UpdateCallback};
use crate::object::Object;
use crate::patch;
use hashbrown::{HashMap, HashSet};
use ndl_core::{
    c3, DataType, Error as CoreError, Fqon, Linearization, Location, MemberId, ObjectState,
    Operator, OrderT, Value, LATEST,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// States replaced by one commit, keyed by object.
pub(crate) type Changes = HashMap<Fqon, Arc<ObjectState>>;

type CacheKey = (Fqon, MemberId, OrderT);

pub(crate) struct NotifierEntry {
    pub(crate) fqon: Fqon,
    pub(crate) callback: UpdateCallback,
}

pub(crate) struct ViewInner {
    database: Arc<Database>,
    parent: Option<View>,
    /// Parent time this view was forked at; reads never see the parent
    /// past this point.
    fork_t: OrderT,
    current_t: RwLock<OrderT>,
    history: RwLock<BTreeMap<OrderT, Changes>>,
    cache: RwLock<HashMap<CacheKey, Value>>,
    pub(crate) notifiers: RwLock<HashMap<u64, NotifierEntry>>,
    next_notifier_id: AtomicU64,
}

/// A time-indexed query handle over a [`Database`].
#[derive(Clone)]
pub struct View {
    pub(crate) inner: Arc<ViewInner>,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("t", &self.current_t())
            .field("fork_t", &self.inner.fork_t)
            .field("root", &self.inner.parent.is_none())
            .finish_non_exhaustive()
    }
}

impl View {
    /// Root view over the initial state.
    pub(crate) fn root(database: Arc<Database>) -> View {
        View {
            inner: Arc::new(ViewInner {
                database,
                parent: None,
                fork_t: ndl_core::INITIAL_T,
                current_t: RwLock::new(ndl_core::INITIAL_T),
                history: RwLock::new(BTreeMap::new()),
                cache: RwLock::new(HashMap::new()),
                notifiers: RwLock::new(HashMap::new()),
                next_notifier_id: AtomicU64::new(0),
            }),
        }
    }

    /// Branch a child view pinned to this view's current time.
    ///
    /// Later patches in either view do not affect the other.
    pub fn fork(&self) -> View {
        let fork_t = self.current_t();
        View {
            inner: Arc::new(ViewInner {
                database: self.inner.database.clone(),
                parent: Some(self.clone()),
                fork_t,
                current_t: RwLock::new(fork_t),
                history: RwLock::new(BTreeMap::new()),
                cache: RwLock::new(HashMap::new()),
                notifiers: RwLock::new(HashMap::new()),
                next_notifier_id: AtomicU64::new(0),
            }),
        }
    }

    /// The database this view was created from.
    pub fn database(&self) -> &Arc<Database> {
        &self.inner.database
    }

    /// The view's current time.
    pub fn current_t(&self) -> OrderT {
        *self.inner.current_t.read()
    }

    /// Get a handle for an object.
    pub fn get(&self, fqon: &str) -> Result<Object> {
        if !self.inner.database.meta_info().contains(fqon) {
            return Err(DbError::api(format!("unknown object '{fqon}'")));
        }
        Ok(Object::new(self.clone(), Fqon::new(fqon)))
    }

    /// Apply a loaded patch object to its target, committing a new state.
    ///
    /// Returns the commit time. A rejected patch leaves the view
    /// unchanged.
    pub fn apply_patch(&self, patch_fqon: &str) -> Result<OrderT> {
        patch::apply(self, patch_fqon)
    }

    /// Resolve `LATEST` to the current time.
    pub(crate) fn clamp(&self, t: OrderT) -> OrderT {
        if t == LATEST {
            self.current_t()
        } else {
            t
        }
    }

    /// The state of `fqon` at the latest commit at or before `t`.
    pub(crate) fn state_at(&self, fqon: &str, t: OrderT) -> Result<Arc<ObjectState>> {
        let t = self.clamp(t);
        {
            let history = self.inner.history.read();
            for (_, changes) in history.range(..=t).rev() {
                if let Some(state) = changes.get(fqon) {
                    return Ok(state.clone());
                }
            }
        }

        match &self.inner.parent {
            Some(parent) => parent.state_at(fqon, t.min(self.inner.fork_t)),
            None => self
                .inner
                .database
                .initial_state()
                .get(fqon)
                .cloned()
                .ok_or_else(|| DbError::api(format!("unknown object '{fqon}'"))),
        }
    }

    /// The linearization of `fqon` at `t`, computing and memoizing it on
    /// the state if a patch left it uncomputed.
    pub(crate) fn linearization_at(&self, fqon: &str, t: OrderT) -> Result<Linearization> {
        let t = self.clamp(t);
        let state = self.state_at(fqon, t)?;
        if let Some(linearization) = state.linearization() {
            return Ok(linearization.clone());
        }

        let parents_of = |parent: &Fqon| -> ndl_core::Result<Vec<Fqon>> {
            self.state_at(parent.as_str(), t)
                .map(|state| state.parents().to_vec())
                .map_err(|err| CoreError::internal(err.to_string()))
        };
        let linearization = c3::linearize(&Fqon::new(fqon), &parents_of)?;
        state.cache_linearization(linearization.clone());
        Ok(linearization)
    }

    /// The member's type, found on the first ancestor that declares it;
    /// patches fall through to their target chain.
    pub(crate) fn member_type(&self, fqon: &str, member: &str, t: OrderT) -> Result<Arc<DataType>> {
        let meta = self.inner.database.meta_info();
        let mut guard: HashSet<Fqon> = HashSet::new();
        let mut current = Fqon::new(fqon);

        loop {
            if !guard.insert(current.clone()) {
                break;
            }

            let linearization = self.linearization_at(current.as_str(), t)?;
            for ancestor in linearization.iter() {
                let declared = meta
                    .object(ancestor.as_str())
                    .and_then(|info| info.member(member))
                    .and_then(|info| info.data_type())
                    .cloned();
                if let Some(data_type) = declared {
                    return Ok(data_type);
                }
            }

            match meta
                .object(current.as_str())
                .and_then(|info| info.target())
            {
                Some(target) => current = target.clone(),
                None => break,
            }
        }

        Err(DbError::api(format!(
            "object '{fqon}' has no member '{member}'"
        )))
    }

    /// Calculate a member value by folding the linearization at `t`.
    pub(crate) fn get_value(&self, fqon: &str, member: &str, t: OrderT) -> Result<Value> {
        let t = self.clamp(t);
        let key: CacheKey = (Fqon::new(fqon), Arc::from(member), t);

        if let Some(value) = self.inner.cache.read().get(&key) {
            return Ok(value.clone());
        }

        let meta = self.inner.database.meta_info();
        let member_type = self.member_type(fqon, member, t)?;
        let linearization = self.linearization_at(fqon, t)?;

        let mut accumulator: Option<Value> = None;

        // Most distant ancestor first.
        for ancestor in linearization.iter().rev() {
            let state = self.state_at(ancestor.as_str(), t)?;
            let Some(entry) = state.member(member) else {
                continue;
            };
            let operation = entry.operation();
            let value = entry.value();

            match accumulator.take() {
                None => {
                    if operation == Operator::Assign {
                        accumulator = Some(value.clone());
                    } else if let Some(neutral) = Value::neutral_of(&member_type) {
                        check_admissible(meta, ancestor, member, &member_type, operation, value)?;
                        accumulator = Some(neutral.apply(operation, value)?);
                    } else {
                        let location = declaration_of(meta, ancestor, member);
                        return Err(CoreError::type_error(
                            location,
                            format!(
                                "member '{member}' of '{ancestor}' applies '{operation}' \
                                 but no ancestor assigns a value and {member_type} has no \
                                 neutral element"
                            ),
                        )
                        .into());
                    }
                }
                Some(current) => {
                    check_admissible(meta, ancestor, member, &member_type, operation, value)?;
                    accumulator = Some(current.apply(operation, value)?);
                }
            }
        }

        let value = accumulator.ok_or_else(|| {
            DbError::api(format!("member '{member}' of '{fqon}' has no value"))
        })?;

        self.inner.cache.write().insert(key, value.clone());
        Ok(value)
    }

    /// True if any ancestor carries a value for the member at `t`.
    pub(crate) fn has_member(&self, fqon: &str, member: &str, t: OrderT) -> Result<bool> {
        let t = self.clamp(t);
        let linearization = self.linearization_at(fqon, t)?;
        for ancestor in linearization.iter() {
            if self.state_at(ancestor.as_str(), t)?.member(member).is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Register a change callback for an object.
    pub(crate) fn subscribe_fqon(&self, fqon: Fqon, callback: UpdateCallback) -> NotifierHandle {
        let id = self.inner.next_notifier_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .notifiers
            .write()
            .insert(id, NotifierEntry { fqon, callback });
        NotifierHandle::new(id, Arc::downgrade(&self.inner))
    }

    /// Publish a commit: install the changed states at `commit_t`, bump
    /// the clock, invalidate affected cache entries, fire notifiers.
    pub(crate) fn commit(&self, commit_t: OrderT, changes: Changes) {
        let affected: Vec<Fqon> = changes.keys().cloned().collect();

        self.inner.history.write().insert(commit_t, changes);
        *self.inner.current_t.write() = commit_t;

        // Any query at t >= commit_t may now fold differently.
        self.inner
            .cache
            .write()
            .retain(|(_, _, cached_t), _| *cached_t < commit_t);

        // Clone the callbacks out so a callback may subscribe/unsubscribe
        // without deadlocking on the registry lock.
        let callbacks: Vec<UpdateCallback> = {
            let notifiers = self.inner.notifiers.read();
            notifiers
                .values()
                .filter(|entry| affected.contains(&entry.fqon))
                .map(|entry| entry.callback.clone())
                .collect()
        };
        for callback in callbacks {
            callback(commit_t, &affected);
        }
    }
}

/// Verify the operator is admissible for the value under the member type.
fn check_admissible(
    meta: &ndl_core::MetaInfo,
    ancestor: &Fqon,
    member: &str,
    member_type: &DataType,
    operation: Operator,
    value: &Value,
) -> Result<()> {
    if value.allowed_operations(member_type).contains(&operation) {
        return Ok(());
    }
    let location = declaration_of(meta, ancestor, member);
    Err(CoreError::type_error(
        location,
        format!(
            "operator '{operation}' on member '{member}' of '{ancestor}' is not allowed \
             for {} values under type {member_type}",
            value.kind()
        ),
    )
    .into())
}

fn declaration_of(meta: &ndl_core::MetaInfo, fqon: &Fqon, member: &str) -> Location {
    meta.object(fqon.as_str())
        .and_then(|info| info.member(member))
        .map(|info| info.location().clone())
        .unwrap_or_else(|| Location::internal("query"))
}
