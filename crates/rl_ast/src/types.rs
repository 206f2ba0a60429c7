// rl_ast/types - Position information and operator enums
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position information for syntax nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn dummy() -> Self {
        Self::default()
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        let (start_line, start_column) = if (self.start_line, self.start_column)
            <= (other.start_line, other.start_column)
        {
            (self.start_line, self.start_column)
        } else {
            (other.start_line, other.start_column)
        };
        let (end_line, end_column) =
            if (self.end_line, self.end_column) >= (other.end_line, other.end_column) {
                (self.end_line, self.end_column)
            } else {
                (other.end_line, other.end_column)
            };
        Span::new(start_line, start_column, end_line, end_column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    StrictEqual,
    StrictNotEqual,
    StrictLess,
    StrictLessEqual,
    StrictGreater,
    StrictGreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Name of the operator-library method implementing this operator.
    ///
    /// `And`/`Or` short-circuit and are bound directly, so they have no method.
    pub const fn method_name(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("add"),
            BinaryOp::Subtract => Some("subtract"),
            BinaryOp::Multiply => Some("multiply"),
            BinaryOp::Divide => Some("divide"),
            BinaryOp::Modulo => Some("rem"),
            BinaryOp::Equal => Some("eq"),
            BinaryOp::NotEqual => Some("ne"),
            BinaryOp::Less => Some("lt"),
            BinaryOp::LessEqual => Some("le"),
            BinaryOp::Greater => Some("gt"),
            BinaryOp::GreaterEqual => Some("ge"),
            BinaryOp::StrictEqual => Some("strict_eq"),
            BinaryOp::StrictNotEqual => Some("strict_ne"),
            BinaryOp::StrictLess => Some("strict_lt"),
            BinaryOp::StrictLessEqual => Some("strict_le"),
            BinaryOp::StrictGreater => Some("strict_gt"),
            BinaryOp::StrictGreaterEqual => Some("strict_ge"),
            BinaryOp::And | BinaryOp::Or => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::StrictEqual => "====",
            BinaryOp::StrictNotEqual => "!===",
            BinaryOp::StrictLess => "<==",
            BinaryOp::StrictLessEqual => "<===",
            BinaryOp::StrictGreater => ">==",
            BinaryOp::StrictGreaterEqual => ">===",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub const fn method_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Negate => "negative",
        }
    }
}

/// Flavour of an aggregate index expression such as `drivers[@ age > 18]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    /// `source[@ condition]`: every element satisfying the condition.
    SelectAll,
    /// `source[!@ condition]`: the first element satisfying the condition.
    SelectFirst,
    /// `source[*@ expression]`: the expression evaluated for every element.
    Collect,
}

impl AggregateKind {
    pub const fn label(self) -> &'static str {
        match self {
            AggregateKind::SelectAll => "select all",
            AggregateKind::SelectFirst => "select first",
            AggregateKind::Collect => "collect",
        }
    }

    /// Whether the body is a filter that must evaluate to a boolean.
    pub const fn is_filter(self) -> bool {
        matches!(self, AggregateKind::SelectAll | AggregateKind::SelectFirst)
    }
}
