use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::{LiteralKind, SyntaxNode};
use rl_types::{PrimitiveKind, TypeRef, Value, builtins};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::str::FromStr;

pub(super) fn bind_literal(
    node: &SyntaxNode,
    kind: LiteralKind,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let text = node.text().trim();
    let types = builtins();
    let parsed: Option<(Value, TypeRef)> = match kind {
        LiteralKind::Integer => text.parse::<i32>().ok().map(|value| (Value::Int(value), types.int())),
        LiteralKind::Long => text
            .trim_end_matches(['l', 'L'])
            .parse::<i64>()
            .ok()
            .map(|value| (Value::Long(value), types.primitive(PrimitiveKind::Long))),
        LiteralKind::Double => text
            .trim_end_matches(['d', 'D'])
            .parse::<f64>()
            .ok()
            .map(|value| (Value::Double(value), types.double())),
        LiteralKind::Decimal => Decimal::from_str(text)
            .ok()
            .map(|value| (Value::BigDecimal(value), types.big_decimal.clone())),
        LiteralKind::BigInteger => BigInt::from_str(text.trim_end_matches(['g', 'G']))
            .ok()
            .map(|value| (Value::BigInteger(value), types.big_integer.clone())),
        LiteralKind::String => Some((Value::string(node.text()), types.string.clone())),
        LiteralKind::Char => {
            let mut chars = node.text().chars();
            match (chars.next(), chars.next()) {
                (Some(value), None) => {
                    Some((Value::Char(value), types.primitive(PrimitiveKind::Char)))
                }
                _ => None,
            }
        }
        LiteralKind::Boolean => match text {
            "true" => Some((Value::Bool(true), types.boolean())),
            "false" => Some((Value::Bool(false), types.boolean())),
            _ => None,
        },
        LiteralKind::Null => Some((Value::Null, types.null.clone())),
    };

    Ok(match parsed {
        Some((value, ty)) => BoundNode::new(BoundKind::Literal(value), ty, node.span.clone()),
        None => ctx.error_node(
            codes::INVALID_LITERAL,
            format!("'{}' is not a valid {kind:?} literal", node.text()),
            &node.span,
        ),
    })
}
