// rl_ast/build - Constructors for assembling syntax trees by hand
//! Small helpers for hosts (and tests) that assemble trees without a parser.
//! Every node gets a dummy span.

use crate::node::{LiteralKind, NodeKind, SyntaxNode};
use crate::types::{AggregateKind, BinaryOp, Span, UnaryOp};

fn node(kind: NodeKind, text: Option<String>, children: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(kind, text, children, Span::dummy())
}

fn literal(kind: LiteralKind, text: impl Into<String>) -> SyntaxNode {
    node(NodeKind::Literal(kind), Some(text.into()), Vec::new())
}

pub fn int(value: i32) -> SyntaxNode {
    literal(LiteralKind::Integer, value.to_string())
}

pub fn long(value: i64) -> SyntaxNode {
    literal(LiteralKind::Long, value.to_string())
}

pub fn double(value: f64) -> SyntaxNode {
    literal(LiteralKind::Double, format!("{value:?}"))
}

pub fn decimal(text: &str) -> SyntaxNode {
    literal(LiteralKind::Decimal, text)
}

pub fn big_integer(text: &str) -> SyntaxNode {
    literal(LiteralKind::BigInteger, text)
}

pub fn string(value: &str) -> SyntaxNode {
    literal(LiteralKind::String, value)
}

pub fn boolean(value: bool) -> SyntaxNode {
    literal(LiteralKind::Boolean, value.to_string())
}

pub fn null() -> SyntaxNode {
    literal(LiteralKind::Null, "null")
}

pub fn ident(name: &str) -> SyntaxNode {
    node(NodeKind::Identifier, Some(name.to_string()), Vec::new())
}

pub fn type_name(name: &str) -> SyntaxNode {
    node(NodeKind::TypeName, Some(name.to_string()), Vec::new())
}

pub fn array_type(element: SyntaxNode) -> SyntaxNode {
    node(NodeKind::ArrayType, None, vec![element])
}

pub fn field(target: SyntaxNode, name: &str) -> SyntaxNode {
    node(NodeKind::FieldAccess, Some(name.to_string()), vec![target])
}

pub fn index(array: SyntaxNode, position: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Index, None, vec![array, position])
}

pub fn call(name: &str, args: Vec<SyntaxNode>) -> SyntaxNode {
    node(NodeKind::MethodCall, Some(name.to_string()), args)
}

pub fn member_call(receiver: SyntaxNode, name: &str, args: Vec<SyntaxNode>) -> SyntaxNode {
    let mut children = Vec::with_capacity(args.len() + 1);
    children.push(receiver);
    children.extend(args);
    node(NodeKind::MemberCall, Some(name.to_string()), children)
}

pub fn binary(op: BinaryOp, lhs: SyntaxNode, rhs: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Binary(op), None, vec![lhs, rhs])
}

pub fn unary(op: UnaryOp, operand: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Unary(op), None, vec![operand])
}

pub fn cast(ty: SyntaxNode, operand: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Cast, None, vec![ty, operand])
}

pub fn ternary(condition: SyntaxNode, then: SyntaxNode, otherwise: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Ternary, None, vec![condition, then, otherwise])
}

pub fn if_expr(condition: SyntaxNode, then: SyntaxNode, otherwise: Option<SyntaxNode>) -> SyntaxNode {
    let mut children = vec![condition, then];
    children.extend(otherwise);
    node(NodeKind::If, None, children)
}

pub fn new_object(ty: SyntaxNode, args: Vec<SyntaxNode>) -> SyntaxNode {
    let mut children = Vec::with_capacity(args.len() + 1);
    children.push(ty);
    children.extend(args);
    node(NodeKind::New, None, children)
}

pub fn new_array(element: SyntaxNode, size: SyntaxNode) -> SyntaxNode {
    node(NodeKind::NewArray, None, vec![element, size])
}

pub fn array_init(elements: Vec<SyntaxNode>) -> SyntaxNode {
    node(NodeKind::ArrayInit, None, elements)
}

pub fn loop_var(name: &str, ty: Option<SyntaxNode>) -> SyntaxNode {
    node(NodeKind::LoopVar, Some(name.to_string()), ty.into_iter().collect())
}

/// Aggregate with an implicit loop variable: `source[@ body]`.
pub fn aggregate(kind: AggregateKind, source: SyntaxNode, body: SyntaxNode) -> SyntaxNode {
    node(NodeKind::Aggregate(kind), None, vec![source, body])
}

/// Aggregate with an explicit loop variable: `source[(var) @ body]`.
pub fn aggregate_with_var(
    kind: AggregateKind,
    source: SyntaxNode,
    var: SyntaxNode,
    body: SyntaxNode,
) -> SyntaxNode {
    node(NodeKind::Aggregate(kind), None, vec![source, var, body])
}

pub fn block(statements: Vec<SyntaxNode>) -> SyntaxNode {
    node(NodeKind::Block, None, statements)
}

pub fn var_decl(ty: SyntaxNode, name: &str, init: SyntaxNode) -> SyntaxNode {
    node(NodeKind::VarDecl, Some(name.to_string()), vec![ty, init])
}
