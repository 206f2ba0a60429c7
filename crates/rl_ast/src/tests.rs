use super::build::*;
use super::*;

use test_case::test_case;

#[test]
fn syntax_node_exposes_children_and_text() {
    let node = ternary(boolean(true), int(1), double(2.0));
    assert_eq!(node.kind, NodeKind::Ternary);
    assert_eq!(node.child_count(), 3);
    assert_eq!(node.child(0).map(SyntaxNode::text), Some("true"));
    assert_eq!(node.child(1).map(SyntaxNode::text), Some("1"));
    assert!(node.child(3).is_none());
    assert_eq!(node.text(), "");
}

#[test]
fn member_call_puts_receiver_first() {
    let node = member_call(ident("name"), "length", vec![int(1)]);
    assert_eq!(node.child_count(), 2);
    assert_eq!(node.children[0].kind, NodeKind::Identifier);
    assert_eq!(node.text(), "length");
}

#[test]
fn if_without_else_has_two_children() {
    let node = if_expr(boolean(true), int(1), None);
    assert_eq!(node.child_count(), 2);
}

#[test]
fn span_merge_covers_both_ranges() {
    let first = Span::new(1, 4, 1, 10);
    let second = Span::new(1, 2, 2, 1);
    assert_eq!(first.merge(&second), Span::new(1, 2, 2, 1));
    assert_eq!(second.merge(&first), Span::new(1, 2, 2, 1));
}

#[test_case(BinaryOp::Add => Some("add"); "add")]
#[test_case(BinaryOp::Greater => Some("gt"); "greater")]
#[test_case(BinaryOp::StrictEqual => Some("strict_eq"); "strict equal")]
#[test_case(BinaryOp::And => None; "logical and has no method")]
fn binary_operator_method_names(op: BinaryOp) -> Option<&'static str> {
    op.method_name()
}

#[test]
fn aggregate_kinds_know_whether_body_filters() {
    assert!(AggregateKind::SelectAll.is_filter());
    assert!(AggregateKind::SelectFirst.is_filter());
    assert!(!AggregateKind::Collect.is_filter());
}
