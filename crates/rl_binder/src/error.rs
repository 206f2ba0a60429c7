use rl_types::{CastError, TypeError, TypeKey};
use thiserror::Error;

/// Internal binder failures. Ordinary semantic errors become error nodes
/// plus diagnostics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("local variable scope stack underflow")]
    ScopeUnderflow,
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// Errors collected while populating a module or importing its dependencies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModuleError {
    #[error("type '{key}' is already defined with a different structure{}", origin_suffix(.dependency))]
    TypeConflict {
        key: TypeKey,
        dependency: Option<String>,
    },
    #[error("method '{signature}' from dependency '{dependency}' was rejected: {reason}")]
    MethodRejected {
        dependency: String,
        signature: String,
        reason: String,
    },
    #[error("field '{name}' is already defined in module '{module}'")]
    DuplicateField { module: String, name: String },
    #[error("method '{signature}' is already defined in module '{module}'")]
    DuplicateMethod { module: String, signature: String },
    #[error(transparent)]
    Type(#[from] TypeError),
}

fn origin_suffix(dependency: &Option<String>) -> String {
    dependency
        .as_ref()
        .map(|name| format!(" (imported from '{name}')"))
        .unwrap_or_default()
}
