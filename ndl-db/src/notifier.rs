//! Change subscriptions.
//!
//! [`Object::subscribe`](crate::object::Object::subscribe) registers a
//! callback in the object's view; the view fires it whenever a patch
//! commit affects the object (the patched target appears in the object's
//! linearization). Dropping the returned [`NotifierHandle`] unregisters
//! the callback.

use crate::view::ViewInner;
use ndl_core::{Fqon, OrderT};
use std::sync::{Arc, Weak};

/// Callback fired on commits affecting a subscribed object.
///
/// Receives the commit time and the set of objects the commit touched.
pub type UpdateCallback = Arc<dyn Fn(OrderT, &[Fqon]) + Send + Sync>;

/// Keeps a subscription alive; unregisters on drop.
pub struct NotifierHandle {
    id: u64,
    view: Weak<ViewInner>,
}

impl NotifierHandle {
    pub(crate) fn new(id: u64, view: Weak<ViewInner>) -> Self {
        Self { id, view }
    }
}

impl Drop for NotifierHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.view.upgrade() {
            inner.notifiers.write().remove(&self.id);
        }
    }
}

impl std::fmt::Debug for NotifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
