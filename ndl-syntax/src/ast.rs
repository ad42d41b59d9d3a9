//! The NDL abstract syntax tree.
//!
//! Immutable structures handed to the load pipeline. Every name-carrying
//! node holds an [`IdToken`] with its source location; equality ignores
//! locations so that pretty-print-then-reparse compares structurally.
//!
//! [`Ast`] implements `Display`, rendering canonical `.ndl` text.

use ndl_core::{Location, Operator};
use std::fmt;
use std::sync::Arc;

/// An identifier with its source location.
#[derive(Clone, Debug)]
pub struct IdToken {
    pub text: Arc<str>,
    pub location: Location,
}

impl IdToken {
    pub fn new(text: impl AsRef<str>, location: Location) -> Self {
        Self {
            text: Arc::from(text.as_ref()),
            location,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

// Structural equality only; locations are formatting detail.
impl PartialEq for IdToken {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for IdToken {}

impl fmt::Display for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One parsed `.ndl` file.
#[derive(Clone, Debug, PartialEq)]
pub struct Ast {
    pub imports: Vec<AstImport>,
    pub objects: Vec<AstObject>,
}

/// `import a.b` or `import a.b as alias`.
#[derive(Clone, Debug, PartialEq)]
pub struct AstImport {
    pub namespace: IdToken,
    pub alias: Option<IdToken>,
}

/// An object declaration, possibly nested.
#[derive(Clone, Debug, PartialEq)]
pub struct AstObject {
    pub name: IdToken,
    /// Patch target (`Name<Target>`), patches only.
    pub target: Option<IdToken>,
    /// Parents a patch adds to its target (`[+P, +Q]`), patches only.
    pub inheritance_add: Vec<IdToken>,
    /// Declared parents.
    pub parents: Vec<IdToken>,
    pub members: Vec<AstMember>,
    /// Nested object declarations.
    pub objects: Vec<AstObject>,
}

/// A member declaration: `[@…]name [: type] [op value]`.
#[derive(Clone, Debug, PartialEq)]
pub struct AstMember {
    pub name: IdToken,
    pub override_depth: u32,
    pub member_type: Option<AstMemberType>,
    pub operation: Option<Operator>,
    pub value: Option<AstValue>,
}

/// A member type: primitive name, container with payload, or object name.
#[derive(Clone, Debug, PartialEq)]
pub struct AstMemberType {
    pub name: IdToken,
    pub payload: Option<Box<AstMemberType>>,
}

/// A member value literal.
#[derive(Clone, Debug, PartialEq)]
pub enum AstValue {
    Int(i64),
    Float(f64),
    Text(Arc<str>),
    Bool(bool),
    /// Object reference by (possibly alias-qualified) name.
    Reference(IdToken),
    /// `{v, v, …}`
    Set(Vec<AstValue>),
    /// `<v, v, …>`
    OrderedSet(Vec<AstValue>),
}

const INDENT: &str = "    ";

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "{import}")?;
        }
        if !self.imports.is_empty() && !self.objects.is_empty() {
            writeln!(f)?;
        }
        for object in &self.objects {
            object.write(f, 0)?;
        }
        Ok(())
    }
}

impl fmt::Display for AstImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "import {} as {}", self.namespace, alias),
            None => write!(f, "import {}", self.namespace),
        }
    }
}

impl AstObject {
    fn write(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let pad = INDENT.repeat(level);
        write!(f, "{pad}{}", self.name)?;
        if let Some(target) = &self.target {
            write!(f, "<{target}>")?;
        }
        if !self.inheritance_add.is_empty() {
            f.write_str("[")?;
            for (i, parent) in self.inheritance_add.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "+{parent}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("(")?;
        for (i, parent) in self.parents.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parent}")?;
        }
        writeln!(f, "):")?;

        if self.members.is_empty() && self.objects.is_empty() {
            return writeln!(f, "{pad}{INDENT}pass");
        }

        for member in &self.members {
            member.write(f, level + 1)?;
        }
        for object in &self.objects {
            object.write(f, level + 1)?;
        }
        Ok(())
    }
}

impl AstMember {
    fn write(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let pad = INDENT.repeat(level);
        write!(f, "{pad}")?;
        for _ in 0..self.override_depth {
            f.write_str("@")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(member_type) = &self.member_type {
            write!(f, " : {member_type}")?;
        }
        if let (Some(operation), Some(value)) = (&self.operation, &self.value) {
            write!(f, " {operation} {value}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for AstMemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}({payload})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for AstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstValue::Int(v) => write!(f, "{v}"),
            AstValue::Float(v) => write!(f, "{v:?}"),
            AstValue::Text(v) => write!(f, "\"{}\"", v.escape_default()),
            AstValue::Bool(v) => f.write_str(if *v { "True" } else { "False" }),
            AstValue::Reference(v) => write!(f, "{v}"),
            AstValue::Set(values) => write_values(f, values, "{", "}"),
            AstValue::OrderedSet(values) => write_values(f, values, "<", ">"),
        }
    }
}

fn write_values(
    f: &mut fmt::Formatter<'_>,
    values: &[AstValue],
    open: &str,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(close)
}
