//! Per-file name resolution.
//!
//! Each loaded file gets a [`NamespaceFinder`] holding its import aliases
//! and plain imports. Identifiers resolve against, in order: an alias
//! prefix, the enclosing namespace chain up to the root, and the plain
//! imports. The first candidate that names a known object wins.

use crate::error::{DbError, Result};
use hashbrown::HashMap;
use ndl_core::{Error as CoreError, Fqon, MetaInfo, Namespace};
use ndl_syntax::IdToken;
use std::sync::Arc;

/// Alias/import table of one parsed file.
#[derive(Debug, Default)]
pub struct NamespaceFinder {
    aliases: HashMap<Arc<str>, Namespace>,
    imports: Vec<Namespace>,
}

impl NamespaceFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `import ns as alias`. Duplicate aliases are an error.
    pub fn add_alias(&mut self, alias: &IdToken, namespace: Namespace) -> Result<()> {
        match self.aliases.entry(alias.text.clone()) {
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(namespace);
                Ok(())
            }
            hashbrown::hash_map::Entry::Occupied(_) => Err(CoreError::name(
                alias.location.clone(),
                format!("import alias '{}' already in use", alias.text),
            )
            .into()),
        }
    }

    /// Register a plain `import ns`.
    pub fn add_import(&mut self, namespace: Namespace) {
        if !self.imports.contains(&namespace) {
            self.imports.push(namespace);
        }
    }

    /// True if `name` collides with an import alias of this file.
    pub fn check_conflict(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Resolve an identifier used in `current` namespace to a known FQON.
    pub fn find(&self, current: &Namespace, id: &IdToken, meta: &MetaInfo) -> Result<Fqon> {
        let name = id.text.as_ref();

        // Alias-qualified reference: the first segment names an alias.
        if let Some((head, rest)) = name.split_once('.') {
            if let Some(alias_ns) = self.aliases.get(head) {
                let fqon = alias_ns.fqon(rest);
                if meta.contains(fqon.as_str()) {
                    return Ok(fqon);
                }
                return Err(DbError::Core(CoreError::name(
                    id.location.clone(),
                    format!("'{fqon}' (via alias '{head}') is not a known object"),
                )));
            }
        }

        // Enclosing namespace chain, innermost first; the root step also
        // covers fully-qualified references.
        let mut namespace = Some(current.clone());
        while let Some(ns) = namespace {
            let candidate = ns.fqon(name);
            if meta.contains(candidate.as_str()) {
                return Ok(candidate);
            }
            namespace = ns.parent();
        }

        // Plain imports.
        for import in &self.imports {
            let candidate = import.fqon(name);
            if meta.contains(candidate.as_str()) {
                return Ok(candidate);
            }
        }

        Err(DbError::Core(CoreError::name(
            id.location.clone(),
            format!("cannot resolve '{name}'"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndl_core::{Location, ObjectInfo};

    fn id(text: &str) -> IdToken {
        IdToken::new(text, Location::internal("test"))
    }

    fn meta_with(names: &[&str]) -> MetaInfo {
        let mut meta = MetaInfo::new();
        for name in names {
            meta.add_object(ObjectInfo::new(Fqon::new(*name), Location::internal("test")))
                .unwrap();
        }
        meta
    }

    #[test]
    fn test_resolve_in_namespace_chain() {
        let meta = meta_with(&["game.units.Knight", "game.Base"]);
        let finder = NamespaceFinder::new();
        let current = Namespace::new("game.units");

        assert_eq!(
            finder.find(&current, &id("Knight"), &meta).unwrap().as_str(),
            "game.units.Knight"
        );
        // found one level up
        assert_eq!(
            finder.find(&current, &id("Base"), &meta).unwrap().as_str(),
            "game.Base"
        );
        // fully qualified always works
        assert_eq!(
            finder
                .find(&Namespace::root(), &id("game.units.Knight"), &meta)
                .unwrap()
                .as_str(),
            "game.units.Knight"
        );
    }

    #[test]
    fn test_resolve_via_alias_and_import() {
        let meta = meta_with(&["game.tech.Loom"]);
        let mut finder = NamespaceFinder::new();
        finder
            .add_alias(&id("tech"), Namespace::new("game.tech"))
            .unwrap();
        finder.add_import(Namespace::new("game.tech"));

        let current = Namespace::new("other");
        assert_eq!(
            finder.find(&current, &id("tech.Loom"), &meta).unwrap().as_str(),
            "game.tech.Loom"
        );
        assert_eq!(
            finder.find(&current, &id("Loom"), &meta).unwrap().as_str(),
            "game.tech.Loom"
        );
    }

    #[test]
    fn test_unresolvable_name() {
        let meta = meta_with(&["game.A"]);
        let finder = NamespaceFinder::new();
        let err = finder
            .find(&Namespace::new("game"), &id("Missing"), &meta)
            .unwrap_err();
        assert!(err.to_string().contains("cannot resolve"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut finder = NamespaceFinder::new();
        finder.add_alias(&id("t"), Namespace::new("a")).unwrap();
        assert!(finder.add_alias(&id("t"), Namespace::new("b")).is_err());
    }
}
