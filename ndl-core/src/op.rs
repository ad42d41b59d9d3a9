//! Member operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation connecting a member to its value.
///
/// Which operators a member accepts depends on the member's type and the
/// kind of the right-hand value; see [`Value::allowed_operations`]
/// (crate::value::Value::allowed_operations).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubtractAssign,
    /// `*=`
    MultiplyAssign,
    /// `/=`
    DivideAssign,
    /// `|=`
    UnionAssign,
    /// `&=`
    IntersectAssign,
}

impl Operator {
    /// The surface-syntax symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::AddAssign => "+=",
            Operator::SubtractAssign => "-=",
            Operator::MultiplyAssign => "*=",
            Operator::DivideAssign => "/=",
            Operator::UnionAssign => "|=",
            Operator::IntersectAssign => "&=",
        }
    }

    /// Parse a surface-syntax symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Assign),
            "+=" => Some(Operator::AddAssign),
            "-=" => Some(Operator::SubtractAssign),
            "*=" => Some(Operator::MultiplyAssign),
            "/=" => Some(Operator::DivideAssign),
            "|=" => Some(Operator::UnionAssign),
            "&=" => Some(Operator::IntersectAssign),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
