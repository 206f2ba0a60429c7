// rl_ast/node - Syntax nodes handed over by the parser
use crate::types::{AggregateKind, BinaryOp, Span, UnaryOp};
use serde::{Deserialize, Serialize};

/// Literal flavours. The literal text is kept in [`SyntaxNode::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Long,
    Double,
    Decimal,
    /// Integer literal with a `G` suffix, unbounded.
    BigInteger,
    String,
    Char,
    Boolean,
    Null,
}

/// Kind of a syntax node together with the layout of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Literal; `text` holds the source text.
    Literal(LiteralKind),
    /// Variable or field reference; `text` holds the name.
    Identifier,
    /// Type reference; `text` holds the (possibly qualified) type name.
    TypeName,
    /// Array type; `[element type]`.
    ArrayType,
    /// `target.field`; `text` holds the field name, `[target]`.
    FieldAccess,
    /// `array[index]`; `[array, index]`.
    Index,
    /// `name(args...)`; `text` holds the method name, children are arguments.
    MethodCall,
    /// `receiver.name(args...)`; `[receiver, args...]`.
    MemberCall,
    /// `[lhs, rhs]`.
    Binary(BinaryOp),
    /// `[operand]`.
    Unary(UnaryOp),
    /// `(Type) operand`; `[type, operand]`.
    Cast,
    /// `cond ? then : else`; `[cond, then, else]`.
    Ternary,
    /// `if (cond) then [else otherwise]`; `[cond, then]` or `[cond, then, else]`.
    If,
    /// `new Type(args...)`; `[type, args...]`.
    New,
    /// `new Type[size]`; `[element type, size]`.
    NewArray,
    /// `{e1, e2, ...}`; children are elements.
    ArrayInit,
    /// `source[...]`; `[source, body]` or `[source, loop variable, body]`.
    Aggregate(AggregateKind),
    /// Loop variable of an aggregate; `text` holds the name, optional `[type]`.
    LoopVar,
    /// `{ statements... }`; value of the block is the value of the last statement.
    Block,
    /// `Type name = init`; `text` holds the name, `[type, init]`.
    VarDecl,
}

impl NodeKind {
    /// Human readable label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Literal(_) => "literal",
            NodeKind::Identifier => "identifier",
            NodeKind::TypeName => "type name",
            NodeKind::ArrayType => "array type",
            NodeKind::FieldAccess => "field access",
            NodeKind::Index => "index",
            NodeKind::MethodCall => "method call",
            NodeKind::MemberCall => "member call",
            NodeKind::Binary(_) => "binary operator",
            NodeKind::Unary(_) => "unary operator",
            NodeKind::Cast => "cast",
            NodeKind::Ternary => "ternary operator",
            NodeKind::If => "if",
            NodeKind::New => "new",
            NodeKind::NewArray => "new array",
            NodeKind::ArrayInit => "array initializer",
            NodeKind::Aggregate(kind) => kind.label(),
            NodeKind::LoopVar => "loop variable",
            NodeKind::Block => "block",
            NodeKind::VarDecl => "variable declaration",
        }
    }
}

/// A parsed syntax node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub children: Vec<SyntaxNode>,
    pub span: Span,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, text: Option<String>, children: Vec<SyntaxNode>, span: Span) -> Self {
        Self {
            kind,
            text,
            children,
            span,
        }
    }

    /// Leaf node with a text payload.
    pub fn leaf(kind: NodeKind, text: impl Into<String>, span: Span) -> Self {
        Self::new(kind, Some(text.into()), Vec::new(), span)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index)
    }

    /// Text payload, or the empty string when the node carries none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
