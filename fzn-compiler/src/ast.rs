//! The node model handed to the compiler by the front end.
//!
//! Nodes form a single-owner tree: arrays and calls own their children
//! outright. Variable references carry a plain index into the corresponding
//! variable-spec table; indices are assigned once at declaration time and
//! never reused.

use std::fmt;

/// One expression in a constraint argument, annotation, or output binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    IntLit(i64),
    BoolLit(bool),
    SetLit(SetLit),
    /// Reference into the integer variable table.
    IntVar(usize),
    /// Reference into the boolean variable table.
    BoolVar(usize),
    /// Reference into the set variable table.
    SetVar(usize),
    Array(Vec<Node>),
    /// A bare identifier, only meaningful inside annotations.
    Atom(String),
    Call(Call),
    /// Literal output text produced by the output composer.
    Str(String),
}

/// An annotation call such as `defines_var(x)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub id: String,
    pub args: Box<Node>,
}

impl Call {
    pub fn new(id: impl Into<String>, args: Node) -> Call {
        Call {
            id: id.into(),
            args: Box::new(args),
        }
    }
}

impl Node {
    pub fn int_lit(&self) -> Option<i64> {
        match self {
            Node::IntLit(value) => Some(*value),
            _ => None,
        }
    }

    pub fn int_var(&self) -> Option<usize> {
        match self {
            Node::IntVar(index) => Some(*index),
            _ => None,
        }
    }

    pub fn bool_var(&self) -> Option<usize> {
        match self {
            Node::BoolVar(index) => Some(*index),
            _ => None,
        }
    }

    pub fn set_lit(&self) -> Option<&SetLit> {
        match self {
            Node::SetLit(set) => Some(set),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Node::Call(call) => Some(call),
            _ => None,
        }
    }

    /// `true` if this node is an annotation array containing the given atom.
    pub fn has_atom(&self, name: &str) -> bool {
        match self {
            Node::Array(items) => items
                .iter()
                .any(|item| matches!(item, Node::Atom(atom) if atom == name)),
            Node::Atom(atom) => atom == name,
            _ => false,
        }
    }
}

/// A set literal, doubling as the domain representation of variable specs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetLit {
    Interval { min: i64, max: i64 },
    Values(Vec<i64>),
}

impl SetLit {
    pub fn contains(&self, value: i64) -> bool {
        match self {
            SetLit::Interval { min, max } => value >= *min && value <= *max,
            SetLit::Values(values) => values.contains(&value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SetLit::Interval { min, max } => min > max,
            SetLit::Values(values) => values.is_empty(),
        }
    }

    /// The single value of this set, if it has exactly one.
    pub fn singleton(&self) -> Option<i64> {
        match self {
            SetLit::Interval { min, max } if min == max => Some(*min),
            SetLit::Values(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }
}

impl fmt::Display for SetLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetLit::Interval { min, max } => write!(f, "{min}..{max}"),
            SetLit::Values(values) => {
                write!(f, "{{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
