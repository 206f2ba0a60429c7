//! Binding context threaded through every binder call.

use crate::bound::{BoundKind, BoundNode};
use crate::config::BinderConfig;
use crate::diagnostics::{Diagnostic, codes};
use crate::error::{BindError, ModuleError};
use crate::module::ModuleOpenClass;
use rl_ast::Span;
use rl_types::{Cast, CastRegistry, MethodRef, OpenField, StandardLibrary, TypeRef};
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Namespace of ordinary local variables.
pub const LOCAL_NAMESPACE: &str = "local";

#[derive(Debug, Clone)]
pub struct LocalVar {
    pub namespace: String,
    pub name: String,
    pub ty: TypeRef,
    pub slot: usize,
}

pub struct BindingContext<'m> {
    module: &'m mut ModuleOpenClass,
    registry: CastRegistry,
    library: &'static StandardLibrary,
    config: BinderConfig,
    /// The root scope is never popped.
    scopes: Vec<Vec<LocalVar>>,
    /// Implicit receivers with the scope depth that introduced them.
    receivers: Vec<(usize, LocalVar)>,
    diagnostics: Vec<Diagnostic>,
    next_slot: usize,
    depth: usize,
}

impl<'m> BindingContext<'m> {
    pub fn new(module: &'m mut ModuleOpenClass, config: BinderConfig) -> Self {
        module.ensure_dependencies();
        let library = StandardLibrary::shared();
        Self {
            module,
            registry: library.cast_registry(),
            library,
            config: config.sanitized(),
            scopes: vec![Vec::new()],
            receivers: Vec::new(),
            diagnostics: Vec::new(),
            next_slot: 0,
            depth: 0,
        }
    }

    /// Replaces the standard cast registry.
    pub fn with_registry(mut self, registry: CastRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn module(&self) -> &ModuleOpenClass {
        &*self.module
    }

    pub fn module_mut(&mut self) -> &mut ModuleOpenClass {
        &mut *self.module
    }

    pub fn registry(&self) -> &CastRegistry {
        &self.registry
    }

    pub fn library(&self) -> &'static StandardLibrary {
        self.library
    }

    // -- local variables -------------------------------------------------

    /// Opens a nested variable scope that closes when the guard drops.
    pub fn push_local_var_context(&mut self) -> LocalScopeGuard<'_, 'm> {
        self.scopes.push(Vec::new());
        LocalScopeGuard { ctx: self }
    }

    /// Closes the innermost scope and the implicit receivers it introduced.
    pub fn pop_local_var_context(&mut self) -> Result<(), BindError> {
        if self.scopes.len() <= 1 {
            return Err(BindError::ScopeUnderflow);
        }
        let depth = self.scopes.len();
        self.scopes.pop();
        self.receivers.retain(|(introduced, _)| *introduced < depth);
        Ok(())
    }

    /// Number of open scopes, the root scope included.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares a variable in the innermost scope and assigns it a frame slot.
    /// A duplicate in the same scope is reported and yields `None`.
    pub fn add_var(
        &mut self,
        namespace: &str,
        name: &str,
        ty: TypeRef,
        span: &Span,
    ) -> Option<LocalVar> {
        let duplicate = self.scopes.last().is_some_and(|scope| {
            scope
                .iter()
                .any(|var| var.namespace == namespace && var.name == name)
        });
        if duplicate {
            self.report(Diagnostic::error(
                codes::DUPLICATE_VARIABLE,
                format!("variable '{name}' is already defined in this scope"),
                Some(span.clone()),
            ));
            return None;
        }
        let var = LocalVar {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ty,
            slot: self.next_slot,
        };
        self.next_slot += 1;
        self.scopes.last_mut()?.push(var.clone());
        Some(var)
    }

    /// Innermost visible variable; non-strict lookup ignores ASCII case.
    pub fn find_var(&self, namespace: &str, name: &str, strict: bool) -> Option<&LocalVar> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|var| {
                var.namespace == namespace
                    && if strict {
                        var.name == name
                    } else {
                        var.name.eq_ignore_ascii_case(name)
                    }
            })
    }

    /// Local lookup honouring `strict_variable_lookup`.
    pub fn lookup_var(&self, name: &str) -> Option<&LocalVar> {
        self.find_var(LOCAL_NAMESPACE, name, self.config.strict_variable_lookup)
    }

    pub fn has_var(&self, namespace: &str, name: &str) -> bool {
        self.find_var(namespace, name, true).is_some()
    }

    /// First free hidden-variable name: `prefix`, `prefix0`, `prefix1`, ...
    pub fn hidden_var_name(&self) -> String {
        let prefix = &self.config.hidden_var_prefix;
        if !self.has_var(LOCAL_NAMESPACE, prefix) {
            return prefix.clone();
        }
        (0usize..)
            .map(|index| format!("{prefix}{index}"))
            .find(|candidate| !self.has_var(LOCAL_NAMESPACE, candidate))
            .unwrap_or_else(|| prefix.clone())
    }

    /// Makes the fields of `var` visible unqualified until its scope closes.
    pub fn add_implicit_receiver(&mut self, var: LocalVar) {
        self.receivers.push((self.scopes.len(), var));
    }

    /// Innermost implicit receiver declaring a field called `name`.
    pub fn find_receiver_field(&self, name: &str) -> Option<(LocalVar, OpenField)> {
        self.receivers
            .iter()
            .rev()
            .find_map(|(_, var)| var.ty.field(name).map(|field| (var.clone(), field.clone())))
    }

    /// Slots needed by every variable declared so far.
    pub fn frame_size(&self) -> usize {
        self.next_slot
    }

    // -- types and casts -------------------------------------------------

    pub fn get_cast(&self, from: &TypeRef, to: &TypeRef) -> Result<Option<Cast>, BindError> {
        Ok(self.registry.get_cast(from, to)?)
    }

    pub fn get_implicit_cast(
        &self,
        from: &TypeRef,
        to: &TypeRef,
    ) -> Result<Option<Cast>, BindError> {
        Ok(self.registry.get_implicit_cast(from, to)?)
    }

    pub fn implicit_castable_type(
        &self,
        a: &TypeRef,
        b: &TypeRef,
    ) -> Result<Option<TypeRef>, BindError> {
        Ok(self.registry.implicit_castable_type(a, b)?)
    }

    pub fn find_type(&self, name: &str) -> Option<TypeRef> {
        self.module.find_type(name)
    }

    pub fn add_type(&mut self, ty: TypeRef) -> Result<TypeRef, ModuleError> {
        self.module.add_type(ty)
    }

    pub fn array_of(&self, component: &TypeRef) -> TypeRef {
        self.module.type_space().array_of(component)
    }

    /// Wraps `node` in `cast` unless the cast is the identity.
    pub fn wrap_cast(&self, node: BoundNode, cast: Cast) -> BoundNode {
        if cast.is_identity() {
            return node;
        }
        let span = node.span.clone();
        let ty = cast.to.clone();
        BoundNode::new(
            BoundKind::Cast {
                operand: Box::new(node),
                cast,
            },
            ty,
            span,
        )
    }

    /// Converts `node` to `target` with an implicit cast, or reports a
    /// mismatch. Error nodes pass through untouched.
    pub fn coerce(&mut self, node: BoundNode, target: &TypeRef) -> Result<BoundNode, BindError> {
        if node.is_error() || &node.ty == target {
            return Ok(node);
        }
        match self.get_implicit_cast(&node.ty, target)? {
            Some(cast) => Ok(self.wrap_cast(node, cast)),
            None => {
                let message = format!("cannot convert '{}' to '{}'", node.ty, target);
                Ok(self.error_node(codes::TYPE_MISMATCH, message, &node.span))
            }
        }
    }

    // -- methods ---------------------------------------------------------

    /// Free-call candidates: module methods (own first) then operators.
    pub fn find_methods(&self, name: &str) -> Vec<MethodRef> {
        let mut methods = self.module.methods_named(name);
        methods.extend(self.library.operators(name).iter().cloned());
        methods
    }

    // -- diagnostics -----------------------------------------------------

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Reports an error and returns the error node standing in for the
    /// failed subtree.
    pub fn error_node(
        &mut self,
        code: &'static str,
        message: impl Into<String>,
        span: &Span,
    ) -> BoundNode {
        let message = message.into();
        self.report(Diagnostic::error(code, message.clone(), Some(span.clone())));
        BoundNode::error(message, span.clone())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // -- nesting ---------------------------------------------------------

    /// Enters one nesting level; `false` once `max_bind_depth` is reached.
    pub(crate) fn enter_node(&mut self) -> bool {
        if self.depth >= self.config.max_bind_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_node(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Scope opened by [`BindingContext::push_local_var_context`].
pub struct LocalScopeGuard<'c, 'm> {
    ctx: &'c mut BindingContext<'m>,
}

impl<'m> Deref for LocalScopeGuard<'_, 'm> {
    type Target = BindingContext<'m>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for LocalScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for LocalScopeGuard<'_, '_> {
    fn drop(&mut self) {
        if let Err(error) = self.ctx.pop_local_var_context() {
            warn!(%error, "local scope already closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_types::{OpenType, builtins};

    fn module() -> ModuleOpenClass {
        ModuleOpenClass::new("Rules", "rules")
    }

    #[test]
    fn guard_restores_scope_depth() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        assert_eq!(ctx.scope_depth(), 1);
        {
            let mut scope = ctx.push_local_var_context();
            assert_eq!(scope.scope_depth(), 2);
            scope.add_var(LOCAL_NAMESPACE, "x", builtins().int(), &Span::dummy());
            assert!(scope.has_var(LOCAL_NAMESPACE, "x"));
        }
        assert_eq!(ctx.scope_depth(), 1);
        assert!(!ctx.has_var(LOCAL_NAMESPACE, "x"));
        assert_eq!(ctx.frame_size(), 1);
    }

    #[test]
    fn popping_the_root_scope_is_an_internal_error() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        assert_eq!(ctx.pop_local_var_context(), Err(BindError::ScopeUnderflow));
    }

    #[test]
    fn duplicates_are_reported_per_scope() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        let span = Span::dummy();
        assert!(ctx.add_var(LOCAL_NAMESPACE, "x", builtins().int(), &span).is_some());
        assert!(ctx.add_var(LOCAL_NAMESPACE, "x", builtins().int(), &span).is_none());
        assert!(ctx.add_var("other", "x", builtins().int(), &span).is_some());
        {
            let mut scope = ctx.push_local_var_context();
            let shadow = scope.add_var(LOCAL_NAMESPACE, "x", builtins().double(), &span);
            assert_eq!(shadow.map(|var| var.slot), Some(2));
            assert_eq!(
                scope.find_var(LOCAL_NAMESPACE, "x", true).map(|var| var.ty.clone()),
                Some(builtins().double())
            );
        }
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].code, codes::DUPLICATE_VARIABLE);
    }

    #[test]
    fn non_strict_lookup_ignores_case() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        ctx.add_var(LOCAL_NAMESPACE, "Amount", builtins().int(), &Span::dummy());
        assert!(ctx.find_var(LOCAL_NAMESPACE, "amount", true).is_none());
        assert!(ctx.find_var(LOCAL_NAMESPACE, "amount", false).is_some());
    }

    #[test]
    fn hidden_names_probe_for_a_free_suffix() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        assert_eq!(ctx.hidden_var_name(), "tmp$");
        ctx.add_var(LOCAL_NAMESPACE, "tmp$", builtins().int(), &Span::dummy());
        assert_eq!(ctx.hidden_var_name(), "tmp$0");
        ctx.add_var(LOCAL_NAMESPACE, "tmp$0", builtins().int(), &Span::dummy());
        assert_eq!(ctx.hidden_var_name(), "tmp$1");
    }

    #[test]
    fn receivers_close_with_their_scope() {
        let mut module = module();
        let policy = module
            .declare_datatype("Policy", Vec::new(), vec![("rate".to_string(), builtins().int())])
            .unwrap();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        {
            let mut scope = ctx.push_local_var_context();
            let var = scope
                .add_var(LOCAL_NAMESPACE, "p", policy.clone(), &Span::dummy())
                .unwrap();
            scope.add_implicit_receiver(var);
            assert!(scope.find_receiver_field("rate").is_some());
            assert!(scope.find_receiver_field("missing").is_none());
        }
        assert!(ctx.find_receiver_field("rate").is_none());
    }

    #[test]
    fn coerce_inserts_implicit_casts_only() {
        let mut module = module();
        let mut ctx = BindingContext::new(&mut module, BinderConfig::default());
        let node = BoundNode::new(
            BoundKind::Literal(rl_types::Value::Int(1)),
            builtins().int(),
            Span::dummy(),
        );
        let widened = ctx.coerce(node.clone(), &builtins().double()).unwrap();
        assert!(matches!(widened.kind, BoundKind::Cast { .. }));
        assert_eq!(widened.ty, builtins().double());

        let narrowed = ctx
            .coerce(node, &OpenType::primitive(rl_types::PrimitiveKind::Byte))
            .unwrap();
        assert!(narrowed.is_error());
        assert_eq!(ctx.diagnostics()[0].code, codes::TYPE_MISMATCH);
    }
}
