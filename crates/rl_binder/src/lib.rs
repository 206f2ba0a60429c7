// rl_binder - Semantic binding of rule expressions
//! Turns syntax trees into typed, executable bound trees.
//!
//! Binding runs against a [`ModuleOpenClass`] through a [`BindingContext`]:
//! names resolve to locals, implicit receivers and module fields, calls and
//! operators resolve by minimal cast distance, and every semantic error
//! becomes an error node plus a [`Diagnostic`].

pub mod binders;
pub mod body;
pub mod bound;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod module;
pub mod resolve;

pub use binders::bind;
pub use body::{BoundMethodBody, bind_method};
pub use bound::{BoundKind, BoundNode};
pub use config::{BinderConfig, CONFIG_ENV, ConfigError, WideningFailure};
pub use context::{BindingContext, LOCAL_NAMESPACE, LocalScopeGuard, LocalVar};
pub use diagnostics::{Diagnostic, DiagnosticDescriptor, Severity, codes};
pub use error::{BindError, ModuleError};
pub use module::{
    CompiledDependency, CompiledOpenClass, DependencyMethodFilter, ImportDecision,
    ModuleOpenClass,
};
pub use resolve::{MethodCaller, Resolution, find_method};

use rl_ast::SyntaxNode;
use rl_types::{EvalError, RuntimeEnv, Value};

/// A bound top-level expression with what it needs to run.
#[derive(Debug, Clone)]
pub struct BoundExpression {
    pub root: BoundNode,
    pub frame_size: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl BoundExpression {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Evaluates the expression in a fresh environment.
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        let mut env = RuntimeEnv::new(self.frame_size);
        self.root.evaluate(&mut env)
    }
}

/// Binds a standalone expression against `module`.
pub fn bind_expression(
    node: &SyntaxNode,
    module: &mut ModuleOpenClass,
    config: &BinderConfig,
) -> Result<BoundExpression, BindError> {
    let mut ctx = BindingContext::new(module, config.clone());
    let root = bind(node, &mut ctx)?;
    Ok(BoundExpression {
        root,
        frame_size: ctx.frame_size(),
        diagnostics: ctx.take_diagnostics(),
    })
}
