//! Database-wide store of static object definitions.

use crate::error::{Error, Result};
use crate::fqon::Fqon;
use crate::object_info::ObjectInfo;
use hashbrown::HashMap;

/// All [`ObjectInfo`]s of a database, keyed by FQON.
///
/// Objects reference each other by name only, so cyclic object graphs
/// are purely referential.
#[derive(Clone, Debug, Default)]
pub struct MetaInfo {
    objects: HashMap<Fqon, ObjectInfo>,
}

impl MetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new object. Duplicate FQONs are an error.
    pub fn add_object(&mut self, info: ObjectInfo) -> Result<&mut ObjectInfo> {
        let name = info.name().clone();
        match self.objects.entry(name.clone()) {
            hashbrown::hash_map::Entry::Vacant(entry) => Ok(entry.insert(info)),
            hashbrown::hash_map::Entry::Occupied(entry) => Err(Error::name(
                info.location().clone(),
                format!(
                    "object '{name}' already defined at {}",
                    entry.get().location()
                ),
            )),
        }
    }

    /// Look up an object by FQON.
    pub fn object(&self, fqon: &str) -> Option<&ObjectInfo> {
        self.objects.get(fqon)
    }

    /// Mutable access for the type resolver.
    pub fn object_mut(&mut self, fqon: &str) -> Option<&mut ObjectInfo> {
        self.objects.get_mut(fqon)
    }

    /// True if the FQON is defined.
    pub fn contains(&self, fqon: &str) -> bool {
        self.objects.contains_key(fqon)
    }

    /// All objects.
    pub fn objects(&self) -> impl Iterator<Item = (&Fqon, &ObjectInfo)> {
        self.objects.iter()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    #[test]
    fn test_duplicate_object_rejected() {
        let mut meta = MetaInfo::new();
        meta.add_object(ObjectInfo::new(Fqon::new("a.A"), Location::internal("one")))
            .unwrap();
        let err = meta
            .add_object(ObjectInfo::new(Fqon::new("a.A"), Location::internal("two")))
            .unwrap_err();
        assert!(err.to_string().contains("already defined"));
        assert_eq!(meta.len(), 1);
        assert!(meta.contains("a.A"));
    }
}
