//! Bound nodes: the typed, executable expression tree.
//!
//! Every node carries the type all of its runtime values are assignable to.
//! Evaluation is a single exhaustive `match` over [`BoundKind`].

use rl_ast::{AggregateKind, Span};
use rl_types::{Cast, EvalError, MethodRef, OpenField, RuntimeEnv, TypeRef, Value, builtins};

#[derive(Debug, Clone)]
pub struct BoundNode {
    pub kind: BoundKind,
    pub ty: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum BoundKind {
    Literal(Value),
    LocalVar {
        name: String,
        slot: usize,
    },
    ModuleField(OpenField),
    FieldAccess {
        target: Box<BoundNode>,
        field: String,
    },
    /// `array.length`.
    ArrayLength(Box<BoundNode>),
    ArrayElement {
        array: Box<BoundNode>,
        index: Box<BoundNode>,
    },
    Cast {
        operand: Box<BoundNode>,
        cast: Cast,
    },
    MethodCall {
        method: MethodRef,
        target: Option<Box<BoundNode>>,
        args: Vec<BoundNode>,
    },
    Constructor {
        method: MethodRef,
        args: Vec<BoundNode>,
    },
    Conditional {
        condition: Box<BoundNode>,
        then: Box<BoundNode>,
        otherwise: Option<Box<BoundNode>>,
    },
    And(Box<BoundNode>, Box<BoundNode>),
    Or(Box<BoundNode>, Box<BoundNode>),
    Block(Vec<BoundNode>),
    VarDecl {
        slot: usize,
        init: Box<BoundNode>,
    },
    NewArray {
        element: TypeRef,
        size: Box<BoundNode>,
    },
    ArrayInit(Vec<BoundNode>),
    Aggregate {
        kind: AggregateKind,
        source: Box<BoundNode>,
        slot: usize,
        /// Conversion of each element to a declared loop-variable type.
        element_cast: Option<Cast>,
        body: Box<BoundNode>,
    },
    /// Substituted for a subtree that failed to bind.
    Error { message: String },
}

impl BoundNode {
    pub fn new(kind: BoundKind, ty: TypeRef, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: BoundKind::Error {
                message: message.into(),
            },
            ty: builtins().error.clone(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, BoundKind::Error { .. })
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&BoundNode> {
        match &self.kind {
            BoundKind::Literal(_)
            | BoundKind::LocalVar { .. }
            | BoundKind::ModuleField(_)
            | BoundKind::Error { .. } => Vec::new(),
            BoundKind::FieldAccess { target, .. } => vec![target],
            BoundKind::ArrayLength(array) => vec![array],
            BoundKind::ArrayElement { array, index } => vec![array, index],
            BoundKind::Cast { operand, .. } => vec![operand],
            BoundKind::MethodCall { target, args, .. } => {
                target.iter().map(Box::as_ref).chain(args.iter()).collect()
            }
            BoundKind::Constructor { args, .. } => args.iter().collect(),
            BoundKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let mut children: Vec<&BoundNode> = vec![condition, then];
                children.extend(otherwise.as_deref());
                children
            }
            BoundKind::And(lhs, rhs) | BoundKind::Or(lhs, rhs) => vec![lhs, rhs],
            BoundKind::Block(statements) => statements.iter().collect(),
            BoundKind::VarDecl { init, .. } => vec![init],
            BoundKind::NewArray { size, .. } => vec![size],
            BoundKind::ArrayInit(elements) => elements.iter().collect(),
            BoundKind::Aggregate { source, body, .. } => vec![source, body],
        }
    }

    /// Whether this node or any descendant is an error node.
    pub fn contains_error(&self) -> bool {
        self.is_error() || self.children().into_iter().any(BoundNode::contains_error)
    }

    pub fn evaluate(&self, env: &mut RuntimeEnv) -> Result<Value, EvalError> {
        match &self.kind {
            BoundKind::Literal(value) => Ok(value.clone()),
            BoundKind::LocalVar { slot, .. } => env.load(*slot),
            BoundKind::ModuleField(field) => Ok(field.constant.clone().unwrap_or_default()),
            BoundKind::FieldAccess { target, field } => match target.evaluate(env)? {
                Value::Object(object) => {
                    object
                        .field(field)
                        .cloned()
                        .ok_or_else(|| EvalError::UnknownField {
                            name: field.clone(),
                        })
                }
                Value::Null => Err(EvalError::NullValue {
                    expected: target.ty.to_string(),
                }),
                other => Err(EvalError::TypeMismatch {
                    expected: target.ty.to_string(),
                    found: other.label().to_string(),
                }),
            },
            BoundKind::ArrayLength(array) => {
                let values = evaluate_array(array, env)?;
                Ok(Value::Int(values.len() as i32))
            }
            BoundKind::ArrayElement { array, index } => {
                let values = evaluate_array(array, env)?;
                let position = match index.evaluate(env)? {
                    Value::Int(position) => i64::from(position),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "int".to_string(),
                            found: other.label().to_string(),
                        });
                    }
                };
                usize::try_from(position)
                    .ok()
                    .and_then(|position| values.get(position).cloned())
                    .ok_or(EvalError::IndexOutOfBounds {
                        index: position,
                        length: values.len(),
                    })
            }
            BoundKind::Cast { operand, cast } => {
                let value = operand.evaluate(env)?;
                cast.apply(value, env)
            }
            BoundKind::MethodCall {
                method,
                target,
                args,
            } => {
                let receiver = match target {
                    Some(target) => match target.evaluate(env)? {
                        Value::Null => {
                            return Err(EvalError::NullValue {
                                expected: target.ty.to_string(),
                            });
                        }
                        value => Some(value),
                    },
                    None => None,
                };
                let values = evaluate_all(args, env)?;
                method.invoke(receiver.as_ref(), &values, env)
            }
            BoundKind::Constructor { method, args } => {
                let values = evaluate_all(args, env)?;
                method.invoke(None, &values, env)
            }
            BoundKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if evaluate_condition(condition, env)? {
                    then.evaluate(env)
                } else {
                    match otherwise {
                        Some(otherwise) => otherwise.evaluate(env),
                        None => Ok(self.ty.default_value()),
                    }
                }
            }
            BoundKind::And(lhs, rhs) => {
                Ok(Value::Bool(evaluate_condition(lhs, env)? && evaluate_condition(rhs, env)?))
            }
            BoundKind::Or(lhs, rhs) => {
                Ok(Value::Bool(evaluate_condition(lhs, env)? || evaluate_condition(rhs, env)?))
            }
            BoundKind::Block(statements) => {
                let mut last = Value::Null;
                for statement in statements {
                    last = statement.evaluate(env)?;
                }
                Ok(last)
            }
            BoundKind::VarDecl { slot, init } => {
                let value = init.evaluate(env)?;
                env.store(*slot, value.clone())?;
                Ok(value)
            }
            BoundKind::NewArray { element, size } => {
                let size = match size.evaluate(env)? {
                    Value::Int(size) => i64::from(size),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "int".to_string(),
                            found: other.label().to_string(),
                        });
                    }
                };
                let length =
                    usize::try_from(size).map_err(|_| EvalError::NegativeArraySize { size })?;
                Ok(Value::array(vec![element.default_value(); length]))
            }
            BoundKind::ArrayInit(elements) => Ok(Value::array(evaluate_all(elements, env)?)),
            BoundKind::Aggregate {
                kind,
                source,
                slot,
                element_cast,
                body,
            } => {
                let values = evaluate_array(source, env)?;
                let mut selected = Vec::new();
                for element in values.iter() {
                    let element = match element_cast {
                        Some(cast) => cast.apply(element.clone(), env)?,
                        None => element.clone(),
                    };
                    env.store(*slot, element.clone())?;
                    let outcome = body.evaluate(env)?;
                    match kind {
                        AggregateKind::Collect => selected.push(outcome),
                        AggregateKind::SelectAll if outcome == Value::Bool(true) => {
                            selected.push(element)
                        }
                        AggregateKind::SelectFirst if outcome == Value::Bool(true) => {
                            return Ok(element);
                        }
                        AggregateKind::SelectAll | AggregateKind::SelectFirst => {}
                    }
                }
                match kind {
                    AggregateKind::SelectFirst => Ok(Value::Null),
                    AggregateKind::SelectAll | AggregateKind::Collect => Ok(Value::array(selected)),
                }
            }
            BoundKind::Error { message } => Err(EvalError::Unbound {
                message: message.clone(),
            }),
        }
    }
}

fn evaluate_all(nodes: &[BoundNode], env: &mut RuntimeEnv) -> Result<Vec<Value>, EvalError> {
    nodes.iter().map(|node| node.evaluate(env)).collect()
}

fn evaluate_array(
    node: &BoundNode,
    env: &mut RuntimeEnv,
) -> Result<std::sync::Arc<[Value]>, EvalError> {
    match node.evaluate(env)? {
        Value::Array(values) => Ok(values),
        Value::Null => Err(EvalError::NullValue {
            expected: node.ty.to_string(),
        }),
        other => Err(EvalError::TypeMismatch {
            expected: node.ty.to_string(),
            found: other.label().to_string(),
        }),
    }
}

fn evaluate_condition(node: &BoundNode, env: &mut RuntimeEnv) -> Result<bool, EvalError> {
    match node.evaluate(env)? {
        Value::Bool(value) => Ok(value),
        Value::Null => Err(EvalError::NullValue {
            expected: "boolean".to_string(),
        }),
        other => Err(EvalError::TypeMismatch {
            expected: "boolean".to_string(),
            found: other.label().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(value: Value, ty: TypeRef) -> BoundNode {
        BoundNode::new(BoundKind::Literal(value), ty, Span::dummy())
    }

    #[test]
    fn error_nodes_fail_at_evaluation() {
        let node = BoundNode::error("boom", Span::dummy());
        assert!(node.contains_error());
        let mut env = RuntimeEnv::new(0);
        assert_eq!(
            node.evaluate(&mut env),
            Err(EvalError::Unbound {
                message: "boom".to_string()
            })
        );
    }

    #[test]
    fn conditional_without_else_yields_default() {
        let types = builtins();
        let node = BoundNode::new(
            BoundKind::Conditional {
                condition: Box::new(literal(Value::Bool(false), types.boolean())),
                then: Box::new(literal(Value::Int(4), types.int())),
                otherwise: None,
            },
            types.int(),
            Span::dummy(),
        );
        let mut env = RuntimeEnv::new(0);
        assert_eq!(node.evaluate(&mut env), Ok(Value::Int(0)));
    }

    #[test]
    fn array_index_is_bounds_checked() {
        let types = builtins();
        let array = literal(
            Value::array(vec![Value::Int(1), Value::Int(2)]),
            rl_types::OpenType::array(types.int()),
        );
        let node = BoundNode::new(
            BoundKind::ArrayElement {
                array: Box::new(array),
                index: Box::new(literal(Value::Int(2), types.int())),
            },
            types.int(),
            Span::dummy(),
        );
        let mut env = RuntimeEnv::new(0);
        assert_eq!(
            node.evaluate(&mut env),
            Err(EvalError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        );
    }
}
