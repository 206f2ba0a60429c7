//! Callable members: methods, constructors and operator overloads.

use crate::types::{TypeKey, TypeRef};
use crate::value::{EvalError, RuntimeEnv, Value};
use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

pub type MethodRef = Arc<OpenMethod>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Static,
    Instance,
    Constructor,
    /// Generated by the compiler (accessors, module constructors); never imported.
    Synthetic,
}

/// Signature identity: name plus parameter type sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: String,
    pub params: SmallVec<[TypeKey; 4]>,
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

/// Runtime behaviour of a method.
pub trait MethodInvoker: Send + Sync + fmt::Debug {
    /// `target` is the receiver for instance methods, `None` otherwise.
    fn invoke(
        &self,
        target: Option<&Value>,
        args: &[Value],
        env: &mut RuntimeEnv,
    ) -> Result<Value, EvalError>;
}

type NativeFn = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, EvalError> + Send + Sync;

/// Invoker backed by a Rust closure.
pub struct NativeInvoker {
    label: String,
    body: Box<NativeFn>,
}

impl NativeInvoker {
    pub fn new<F>(label: impl Into<String>, body: F) -> Arc<Self>
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            label: label.into(),
            body: Box::new(body),
        })
    }
}

impl fmt::Debug for NativeInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeInvoker({})", self.label)
    }
}

impl MethodInvoker for NativeInvoker {
    fn invoke(
        &self,
        target: Option<&Value>,
        args: &[Value],
        _env: &mut RuntimeEnv,
    ) -> Result<Value, EvalError> {
        (self.body)(target, args)
    }
}

/// A callable member with a fixed signature.
pub struct OpenMethod {
    name: String,
    params: Vec<TypeRef>,
    return_type: TypeRef,
    declaring_type: String,
    kind: MethodKind,
    module: OnceCell<String>,
    deprecated: Option<String>,
    invoker: Arc<dyn MethodInvoker>,
}

impl OpenMethod {
    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
        kind: MethodKind,
        invoker: Arc<dyn MethodInvoker>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            declaring_type: String::new(),
            kind,
            module: OnceCell::new(),
            deprecated: None,
            invoker,
        }
    }

    pub fn declared_in(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = declaring_type.into();
        self
    }

    pub fn deprecated(mut self, note: impl Into<String>) -> Self {
        self.deprecated = Some(note.into());
        self
    }

    pub fn into_ref(self) -> MethodRef {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        !matches!(self.kind, MethodKind::Instance)
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.kind, MethodKind::Synthetic)
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// Module the method was imported from, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.get().map(String::as_str)
    }

    /// Records the origin module unless one is already recorded. Returns whether
    /// this call set it.
    pub fn tag_module(&self, module: &str) -> bool {
        self.module.set(module.to_string()).is_ok()
    }

    pub fn key(&self) -> MethodKey {
        MethodKey {
            name: self.name.clone(),
            params: self.params.iter().map(|ty| ty.key().clone()).collect(),
        }
    }

    pub fn signature(&self) -> String {
        self.key().to_string()
    }

    pub fn invoke(
        &self,
        target: Option<&Value>,
        args: &[Value],
        env: &mut RuntimeEnv,
    ) -> Result<Value, EvalError> {
        self.invoker.invoke(target, args, env)
    }
}

impl fmt::Debug for OpenMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenMethod")
            .field("signature", &self.signature())
            .field("return_type", &self.return_type.key())
            .field("kind", &self.kind)
            .field("module", &self.module.get())
            .finish()
    }
}
