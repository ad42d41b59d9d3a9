//! Object handles.
//!
//! An [`Object`] is a thin handle pairing a view with an FQON; all reads
//! go through the view at an explicit time (pass [`LATEST`]
//! (ndl_core::LATEST) for the view's current time).

use crate::error::{DbError, Result};
use crate::notifier::NotifierHandle;
use crate::view::View;
use hashbrown::HashSet;
use indexmap::IndexSet;
use ndl_core::{Fqon, OrderT, Value};
use std::fmt;
use std::sync::Arc;

/// Handle for accessing one object through a view.
#[derive(Clone)]
pub struct Object {
    view: View,
    name: Fqon,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("name", &self.name).finish()
    }
}

impl Object {
    pub(crate) fn new(view: View, name: Fqon) -> Self {
        Self { view, name }
    }

    /// The fully-qualified object name.
    pub fn name(&self) -> &Fqon {
        &self.name
    }

    /// The view this handle reads through.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Calculate the member's value at `t` by folding the linearization.
    pub fn value(&self, member: &str, t: OrderT) -> Result<Value> {
        self.view.get_value(self.name.as_str(), member, t)
    }

    /// Typed accessor for int members.
    pub fn get_int(&self, member: &str, t: OrderT) -> Result<i64> {
        let value = self.value(member, t)?;
        value
            .as_int()
            .ok_or_else(|| self.accessor_error(member, "int", &value))
    }

    /// Typed accessor for float members.
    pub fn get_float(&self, member: &str, t: OrderT) -> Result<f64> {
        let value = self.value(member, t)?;
        value
            .as_float()
            .ok_or_else(|| self.accessor_error(member, "float", &value))
    }

    /// Typed accessor for text members.
    pub fn get_text(&self, member: &str, t: OrderT) -> Result<Arc<str>> {
        match self.value(member, t)? {
            Value::Text(text) => Ok(text),
            other => Err(self.accessor_error(member, "text", &other)),
        }
    }

    /// Typed accessor for bool members.
    pub fn get_bool(&self, member: &str, t: OrderT) -> Result<bool> {
        let value = self.value(member, t)?;
        value
            .as_bool()
            .ok_or_else(|| self.accessor_error(member, "bool", &value))
    }

    /// Typed accessor for file members.
    pub fn get_file(&self, member: &str, t: OrderT) -> Result<Arc<str>> {
        match self.value(member, t)? {
            Value::File(path) => Ok(path),
            other => Err(self.accessor_error(member, "file", &other)),
        }
    }

    /// Typed accessor for set members.
    pub fn get_set(&self, member: &str, t: OrderT) -> Result<HashSet<Value>> {
        match self.value(member, t)? {
            Value::Set(values) => Ok(values),
            other => Err(self.accessor_error(member, "set", &other)),
        }
    }

    /// Typed accessor for ordered set members.
    pub fn get_ordered_set(&self, member: &str, t: OrderT) -> Result<IndexSet<Value>> {
        match self.value(member, t)? {
            Value::OrderedSet(values) => Ok(values),
            other => Err(self.accessor_error(member, "orderedset", &other)),
        }
    }

    /// Typed accessor for object members; returns a new handle in the
    /// same view.
    pub fn get_object(&self, member: &str, t: OrderT) -> Result<Object> {
        match self.value(member, t)? {
            Value::ObjectRef(fqon) => self.view.get(fqon.as_str()),
            other => Err(self.accessor_error(member, "object", &other)),
        }
    }

    /// The object's parents at `t`.
    pub fn parents(&self, t: OrderT) -> Result<Vec<Fqon>> {
        Ok(self
            .view
            .state_at(self.name.as_str(), t)?
            .parents()
            .to_vec())
    }

    /// The object's linearization at `t`, self first.
    pub fn linearized(&self, t: OrderT) -> Result<Vec<Fqon>> {
        Ok(self
            .view
            .linearization_at(self.name.as_str(), t)?
            .to_vec())
    }

    /// True if any ancestor carries a value for the member at `t`.
    pub fn has(&self, member: &str, t: OrderT) -> Result<bool> {
        self.view.has_member(self.name.as_str(), member, t)
    }

    /// True if `other` equals this object or appears in its ancestry at
    /// `t`.
    pub fn extends(&self, other: &str, t: OrderT) -> Result<bool> {
        let linearization = self.view.linearization_at(self.name.as_str(), t)?;
        Ok(linearization.iter().any(|ancestor| ancestor.as_str() == other))
    }

    /// True if this object is a patch.
    pub fn is_patch(&self) -> bool {
        self.view
            .database()
            .meta_info()
            .object(self.name.as_str())
            .map(|info| info.is_patch())
            .unwrap_or(false)
    }

    /// The patch target, if this object is a patch.
    pub fn target(&self) -> Option<Fqon> {
        self.view
            .database()
            .meta_info()
            .object(self.name.as_str())
            .and_then(|info| info.target().cloned())
    }

    /// Register a callback fired whenever a patch affects this object in
    /// this view. Dropping the handle unregisters.
    pub fn subscribe(
        &self,
        callback: impl Fn(OrderT, &[Fqon]) + Send + Sync + 'static,
    ) -> NotifierHandle {
        self.view
            .subscribe_fqon(self.name.clone(), Arc::new(callback))
    }

    fn accessor_error(&self, member: &str, expected: &str, got: &Value) -> DbError {
        DbError::api(format!(
            "member '{member}' of '{}' holds {}, expected {expected}",
            self.name,
            got.kind()
        ))
    }
}
