//! Module methods whose bodies are bound expressions.

use crate::binders::bind;
use crate::bound::BoundNode;
use crate::config::BinderConfig;
use crate::context::{BindingContext, LOCAL_NAMESPACE};
use crate::error::BindError;
use crate::module::ModuleOpenClass;
use rl_ast::SyntaxNode;
use rl_types::{
    EvalError, MethodInvoker, MethodKind, MethodRef, OpenMethod, RuntimeEnv, TypeRef, Value,
};
use std::sync::Arc;
use tracing::debug;

/// Invoker running a bound body in a fresh frame with the arguments in the
/// parameter slots.
#[derive(Debug)]
pub struct BoundMethodBody {
    param_slots: Vec<Option<usize>>,
    body: BoundNode,
    frame_size: usize,
}

impl BoundMethodBody {
    pub fn body(&self) -> &BoundNode {
        &self.body
    }

    fn run(&self, args: &[Value], env: &mut RuntimeEnv) -> Result<Value, EvalError> {
        for (slot, arg) in self.param_slots.iter().zip(args) {
            if let Some(slot) = slot {
                env.store(*slot, arg.clone())?;
            }
        }
        self.body.evaluate(env)
    }
}

impl MethodInvoker for BoundMethodBody {
    fn invoke(
        &self,
        _target: Option<&Value>,
        args: &[Value],
        env: &mut RuntimeEnv,
    ) -> Result<Value, EvalError> {
        env.push_frame(self.frame_size);
        let result = self.run(args, env);
        env.pop_frame()?;
        result
    }
}

/// Binds `body` as a static method of `module` and registers it.
///
/// Parameters become the first local variables. With a declared return type
/// the body is converted to it; otherwise the body's type is returned.
/// Binding diagnostics are recorded on the module.
pub fn bind_method(
    module: &mut ModuleOpenClass,
    name: &str,
    params: &[(&str, TypeRef)],
    return_type: Option<TypeRef>,
    body: &SyntaxNode,
    config: &BinderConfig,
) -> Result<MethodRef, BindError> {
    let (root, param_slots, frame_size, diagnostics) = {
        let mut ctx = BindingContext::new(module, config.clone());
        let param_slots: Vec<Option<usize>> = params
            .iter()
            .map(|(param, ty)| {
                ctx.add_var(LOCAL_NAMESPACE, param, ty.clone(), &body.span)
                    .map(|var| var.slot)
            })
            .collect();
        let mut root = bind(body, &mut ctx)?;
        if let Some(return_type) = &return_type {
            root = ctx.coerce(root, return_type)?;
        }
        let frame_size = ctx.frame_size();
        (root, param_slots, frame_size, ctx.take_diagnostics())
    };
    module.extend_diagnostics(diagnostics);

    let returns = return_type.unwrap_or_else(|| root.ty.clone());
    let invoker = Arc::new(BoundMethodBody {
        param_slots,
        body: root,
        frame_size,
    });
    let method = OpenMethod::new(
        name,
        params.iter().map(|(_, ty)| ty.clone()).collect(),
        returns,
        MethodKind::Static,
        invoker,
    )
    .declared_in(module.name())
    .into_ref();
    module.add_method(method.clone())?;
    debug!(module = %module.name(), method = %method.signature(), "method bound");
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_ast::{BinaryOp, build};
    use rl_types::builtins;

    #[test]
    fn bound_methods_run_in_their_own_frame() {
        let mut module = ModuleOpenClass::new("Rules", "rules");
        let twice = bind_method(
            &mut module,
            "twice",
            &[("x", builtins().int())],
            Some(builtins().primitive(rl_types::PrimitiveKind::Long)),
            &build::binary(BinaryOp::Multiply, build::ident("x"), build::int(2)),
            &BinderConfig::default(),
        )
        .unwrap();
        assert_eq!(twice.signature(), "twice(int)");

        let mut env = RuntimeEnv::new(1);
        env.store(0, Value::string("caller")).unwrap();
        assert_eq!(twice.invoke(None, &[Value::Int(21)], &mut env), Ok(Value::Long(42)));
        assert_eq!(env.load(0), Ok(Value::string("caller")));
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn body_diagnostics_are_recorded_on_the_module() {
        let mut module = ModuleOpenClass::new("Rules", "rules");
        bind_method(
            &mut module,
            "broken",
            &[],
            None,
            &build::ident("missing"),
            &BinderConfig::default(),
        )
        .unwrap();
        let compiled = module.compile();
        assert!(compiled.has_errors());
    }
}
