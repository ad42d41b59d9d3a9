//! Fully-qualified object names and namespaces.
//!
//! An FQON is a dotted path like `game.units.Knight`, unique within a
//! database. A [`Namespace`] is the dotted prefix derived from a filename
//! (`game/units.ndl` → `game.units`); nested objects extend the namespace
//! of their enclosing object.
//!
//! Both are thin wrappers over `Arc<str>` for cheap clones; maps keyed by
//! them can be probed with plain `&str`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier of a member within an object (`hp`, `tags`, ...).
pub type MemberId = Arc<str>;

/// Fully-qualified object name: `namespace.sub.Name`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fqon(Arc<str>);

impl Fqon {
    /// Create an FQON from its dotted textual form.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The full dotted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dotted path components.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The last path component (the object's own name).
    pub fn shortname(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The namespace this object lives in (everything before the last dot).
    pub fn namespace(&self) -> Namespace {
        match self.0.rfind('.') {
            Some(idx) => Namespace::new(&self.0[..idx]),
            None => Namespace::root(),
        }
    }
}

impl fmt::Display for Fqon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Fqon {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fqon {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Fqon {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fqon {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Fqon::new(name))
    }
}

/// Dotted namespace path. The empty path is the root namespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(Arc<str>);

impl Namespace {
    /// Create a namespace from its dotted textual form.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    /// The root (empty) namespace.
    pub fn root() -> Self {
        Self(Arc::from(""))
    }

    /// Derive a namespace from a filename: strip the `.ndl` suffix and
    /// convert path separators to dots.
    pub fn from_filename(filename: &str) -> Self {
        let stem = filename.strip_suffix(".ndl").unwrap_or(filename);
        Self(Arc::from(stem.replace(['/', '\\'], ".")))
    }

    /// The filename this namespace was loaded from.
    pub fn to_filename(&self) -> String {
        format!("{}.ndl", self.0.replace('.', "/"))
    }

    /// The dotted path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the root namespace.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Qualify a (possibly dotted) name within this namespace.
    pub fn fqon(&self, name: &str) -> Fqon {
        if self.0.is_empty() {
            Fqon::new(name)
        } else {
            Fqon::new(format!("{}.{}", self.0, name))
        }
    }

    /// Descend into a child namespace (used for nested object scopes).
    pub fn descend(&self, name: &str) -> Namespace {
        if self.0.is_empty() {
            Namespace::new(name)
        } else {
            Namespace::new(format!("{}.{}", self.0, name))
        }
    }

    /// The enclosing namespace, or `None` at the root.
    pub fn parent(&self) -> Option<Namespace> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.rfind('.') {
            Some(idx) => Some(Namespace::new(&self.0[..idx])),
            None => Some(Namespace::root()),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Namespace {
    fn borrow(&self) -> &str {
        &self.0
    }
}
