//! The member type lattice.
//!
//! A member's type is either a fundamental primitive (`int`, `float`,
//! `text`, `bool`, `file`), an object reference bounded by a required
//! supertype, or a container (`set`, `orderedset`) over a non-container
//! element type.

use crate::error::{Error, Result};
use crate::fqon::Fqon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Primitive kind of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Int,
    Float,
    Text,
    Bool,
    File,
    Object,
    Container,
}

impl Primitive {
    /// Surface-syntax name for fundamental primitives.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Text => "text",
            Primitive::Bool => "bool",
            Primitive::File => "file",
            Primitive::Object => "object",
            Primitive::Container => "container",
        }
    }
}

/// Container kind of a type. Non-container types are `Single`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Single,
    Set,
    OrderedSet,
}

impl ContainerKind {
    /// Surface-syntax name for container kinds.
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Single => "single",
            ContainerKind::Set => "set",
            ContainerKind::OrderedSet => "orderedset",
        }
    }
}

/// The `(primitive, container)` pair classifying a [`DataType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicType {
    pub primitive: Primitive,
    pub container: ContainerKind,
}

impl BasicType {
    /// True for int/float/text/bool/file.
    pub fn is_fundamental(&self) -> bool {
        matches!(
            self.primitive,
            Primitive::Int | Primitive::Float | Primitive::Text | Primitive::Bool | Primitive::File
        )
    }

    /// True for set/orderedset.
    pub fn is_container(&self) -> bool {
        self.container != ContainerKind::Single
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_container() {
            f.write_str(self.container.name())
        } else {
            f.write_str(self.primitive.name())
        }
    }
}

/// Fully resolved member type.
///
/// Shared by `Arc` between the declaring ancestor and every inheritor;
/// see [`MemberInfo`](crate::object_info::MemberInfo).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    Text,
    Bool,
    File,
    /// Object reference; values must extend the target.
    Object(Fqon),
    /// Unordered unique set over a non-container element type.
    Set(Arc<DataType>),
    /// Insertion-ordered unique set over a non-container element type.
    OrderedSet(Arc<DataType>),
}

impl DataType {
    /// Build a container type, rejecting nested containers.
    pub fn container(kind: ContainerKind, element: DataType) -> Result<DataType> {
        if element.is_container() {
            return Err(Error::value(format!(
                "container element type must not itself be a container, got {element}"
            )));
        }
        match kind {
            ContainerKind::Set => Ok(DataType::Set(Arc::new(element))),
            ContainerKind::OrderedSet => Ok(DataType::OrderedSet(Arc::new(element))),
            ContainerKind::Single => Err(Error::internal(
                "single is not a container kind with an element type",
            )),
        }
    }

    /// The `(primitive, container)` classification.
    pub fn basic_type(&self) -> BasicType {
        let (primitive, container) = match self {
            DataType::Int => (Primitive::Int, ContainerKind::Single),
            DataType::Float => (Primitive::Float, ContainerKind::Single),
            DataType::Text => (Primitive::Text, ContainerKind::Single),
            DataType::Bool => (Primitive::Bool, ContainerKind::Single),
            DataType::File => (Primitive::File, ContainerKind::Single),
            DataType::Object(_) => (Primitive::Object, ContainerKind::Single),
            DataType::Set(_) => (Primitive::Container, ContainerKind::Set),
            DataType::OrderedSet(_) => (Primitive::Container, ContainerKind::OrderedSet),
        };
        BasicType {
            primitive,
            container,
        }
    }

    /// True for int/float/text/bool/file.
    pub fn is_fundamental(&self) -> bool {
        self.basic_type().is_fundamental()
    }

    /// True for set/orderedset.
    pub fn is_container(&self) -> bool {
        self.basic_type().is_container()
    }

    /// Container kind (`Single` for non-containers).
    pub fn container_kind(&self) -> ContainerKind {
        self.basic_type().container
    }

    /// Element type of a container, if any.
    pub fn element(&self) -> Option<&DataType> {
        match self {
            DataType::Set(elem) | DataType::OrderedSet(elem) => Some(elem),
            _ => None,
        }
    }

    /// Required supertype of an object reference, if any.
    pub fn target(&self) -> Option<&Fqon> {
        match self {
            DataType::Object(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => f.write_str("int"),
            DataType::Float => f.write_str("float"),
            DataType::Text => f.write_str("text"),
            DataType::Bool => f.write_str("bool"),
            DataType::File => f.write_str("file"),
            DataType::Object(target) => write!(f, "{target}"),
            DataType::Set(elem) => write!(f, "set({elem})"),
            DataType::OrderedSet(elem) => write!(f, "orderedset({elem})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(DataType::Int.is_fundamental());
        assert!(!DataType::Int.is_container());
        assert_eq!(DataType::Int.container_kind(), ContainerKind::Single);

        let set = DataType::container(ContainerKind::Set, DataType::Text).unwrap();
        assert!(set.is_container());
        assert!(!set.is_fundamental());
        assert_eq!(set.element(), Some(&DataType::Text));

        let obj = DataType::Object(Fqon::new("game.Unit"));
        assert!(!obj.is_fundamental());
        assert_eq!(obj.target().unwrap().as_str(), "game.Unit");
    }

    #[test]
    fn test_nested_container_rejected() {
        let inner = DataType::container(ContainerKind::Set, DataType::Int).unwrap();
        assert!(DataType::container(ContainerKind::OrderedSet, inner).is_err());
    }

    #[test]
    fn test_display() {
        let t = DataType::container(ContainerKind::OrderedSet, DataType::Float).unwrap();
        assert_eq!(t.to_string(), "orderedset(float)");
        assert_eq!(t.basic_type().to_string(), "orderedset");
        assert_eq!(DataType::Object(Fqon::new("a.B")).to_string(), "a.B");
        assert_eq!(DataType::Int.basic_type().to_string(), "int");
    }
}
