//! Module type space: own types, methods and fields plus compiled dependencies.
//!
//! A module is created, populated, gets its dependencies attached and is then
//! frozen by [`ModuleOpenClass::compile`]. Lookups consult the module's own
//! tables before anything imported, so own definitions always shadow
//! dependency ones.

use crate::diagnostics::{Diagnostic, codes};
use crate::error::ModuleError;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rl_types::{
    MethodKey, MethodKind, MethodRef, NativeInvoker, ObjectValue, OpenField, OpenMethod, OpenType,
    TypeKey, TypeMembers, TypeRef, TypeSpace, Value, builtins,
};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of offering a dependency method to the importing module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDecision {
    Import,
    Skip,
    /// Refuse the method and record an error on the module.
    Reject(String),
}

/// Hook deciding which dependency methods a module imports.
pub trait DependencyMethodFilter: Send + Sync + fmt::Debug {
    fn decide(&self, dependency: &str, method: &OpenMethod) -> ImportDecision;
}

/// A module frozen after binding, with everything reported against it.
#[derive(Debug, Clone)]
pub struct CompiledOpenClass {
    module: Arc<ModuleOpenClass>,
    diagnostics: Vec<Diagnostic>,
}

impl CompiledOpenClass {
    pub fn module(&self) -> &Arc<ModuleOpenClass> {
        &self.module
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A compiled module attached to another module under a name.
#[derive(Debug, Clone)]
pub struct CompiledDependency {
    name: String,
    compiled: CompiledOpenClass,
}

impl CompiledDependency {
    pub fn new(name: impl Into<String>, compiled: CompiledOpenClass) -> Self {
        Self {
            name: name.into(),
            compiled,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compiled(&self) -> &CompiledOpenClass {
        &self.compiled
    }

    pub fn module(&self) -> &Arc<ModuleOpenClass> {
        self.compiled.module()
    }

    pub fn has_errors(&self) -> bool {
        self.compiled.has_errors()
    }
}

#[derive(Debug)]
pub struct ModuleOpenClass {
    name: String,
    namespace: String,
    types: IndexMap<TypeKey, TypeRef>,
    methods: Vec<MethodRef>,
    fields: IndexMap<String, OpenField>,
    dependencies: Vec<CompiledDependency>,
    imported_types: IndexMap<TypeKey, TypeRef>,
    imported_methods: Vec<MethodRef>,
    dependency_fields: OnceCell<IndexMap<String, OpenField>>,
    dependencies_initialized: bool,
    import_errors: Vec<ModuleError>,
    import_warnings: Vec<Diagnostic>,
    diagnostics: Vec<Diagnostic>,
    filter: Option<Arc<dyn DependencyMethodFilter>>,
    type_space: Arc<TypeSpace>,
}

impl ModuleOpenClass {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::with_type_space(name, namespace, Arc::new(TypeSpace::new()))
    }

    /// Module sharing an existing array-type space.
    pub fn with_type_space(
        name: impl Into<String>,
        namespace: impl Into<String>,
        type_space: Arc<TypeSpace>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            types: IndexMap::new(),
            methods: Vec::new(),
            fields: IndexMap::new(),
            dependencies: Vec::new(),
            imported_types: IndexMap::new(),
            imported_methods: Vec::new(),
            dependency_fields: OnceCell::new(),
            dependencies_initialized: false,
            import_errors: Vec::new(),
            import_warnings: Vec::new(),
            diagnostics: Vec::new(),
            filter: None,
            type_space,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn type_space(&self) -> &Arc<TypeSpace> {
        &self.type_space
    }

    pub fn set_method_filter(&mut self, filter: Arc<dyn DependencyMethodFilter>) {
        self.filter = Some(filter);
        self.dependencies_initialized = false;
    }

    /// Adds an own type. Re-adding a structurally equal type is a no-op that
    /// returns the registered one.
    pub fn add_type(&mut self, ty: TypeRef) -> Result<TypeRef, ModuleError> {
        if let Some(existing) = self.types.get(ty.key()) {
            if existing.structurally_equals(&ty) {
                return Ok(existing.clone());
            }
            return Err(ModuleError::TypeConflict {
                key: ty.key().clone(),
                dependency: None,
            });
        }
        self.types.insert(ty.key().clone(), ty.clone());
        Ok(ty)
    }

    /// Resolves a simple or `namespace.Name` type name: own types, then
    /// imported types, then the built-ins.
    pub fn find_type(&self, name: &str) -> Option<TypeRef> {
        let by_key = name.rsplit_once('.').and_then(|(namespace, simple)| {
            let key = TypeKey::named(namespace, simple);
            self.types
                .get(&key)
                .or_else(|| self.imported_types.get(&key))
                .cloned()
        });
        by_key
            .or_else(|| {
                self.types
                    .values()
                    .chain(self.imported_types.values())
                    .find(|ty| ty.name() == name)
                    .cloned()
            })
            .or_else(|| builtins().by_name(name))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }

    pub fn add_method(&mut self, method: MethodRef) -> Result<(), ModuleError> {
        let key = method.key();
        if self.methods.iter().any(|existing| existing.key() == key) {
            return Err(ModuleError::DuplicateMethod {
                module: self.name.clone(),
                signature: key.to_string(),
            });
        }
        self.methods.push(method);
        Ok(())
    }

    /// Own methods in declaration order.
    pub fn methods(&self) -> &[MethodRef] {
        &self.methods
    }

    pub fn imported_methods(&self) -> &[MethodRef] {
        &self.imported_methods
    }

    /// Own methods named `name`, then imported ones whose signature no own
    /// method already declares.
    pub fn methods_named(&self, name: &str) -> Vec<MethodRef> {
        let mut found: Vec<MethodRef> = self
            .methods
            .iter()
            .filter(|method| method.name() == name)
            .cloned()
            .collect();
        let shadowed: FxHashSet<MethodKey> = found.iter().map(|method| method.key()).collect();
        found.extend(
            self.imported_methods
                .iter()
                .filter(|method| method.name() == name && !shadowed.contains(&method.key()))
                .cloned(),
        );
        found
    }

    /// Adds an own field together with its synthetic accessor `get<Name>()`.
    pub fn add_field(&mut self, field: OpenField) -> Result<(), ModuleError> {
        if self.fields.contains_key(&field.name) {
            return Err(ModuleError::DuplicateField {
                module: self.name.clone(),
                name: field.name.clone(),
            });
        }
        let value = field.constant.clone().unwrap_or_else(|| field.ty.default_value());
        let accessor = OpenMethod::new(
            accessor_name(&field.name),
            Vec::new(),
            field.ty.clone(),
            MethodKind::Synthetic,
            NativeInvoker::new(format!("{}.{}", self.name, field.name), move |_, _| {
                Ok(value.clone())
            }),
        )
        .declared_in(self.name.clone())
        .into_ref();
        self.methods.push(accessor);
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Own field, else the first dependency field with that name.
    pub fn get_field(&self, name: &str) -> Option<&OpenField> {
        self.fields
            .get(name)
            .or_else(|| self.dependency_fields().get(name))
    }

    /// All visible fields; own fields override dependency fields.
    pub fn fields(&self) -> IndexMap<String, OpenField> {
        let mut merged = self.fields.clone();
        for (name, field) in self.dependency_fields() {
            merged
                .entry(name.clone())
                .or_insert_with(|| field.clone());
        }
        merged
    }

    /// Fields of every usable dependency, merged once in declaration order.
    fn dependency_fields(&self) -> &IndexMap<String, OpenField> {
        self.dependency_fields.get_or_init(|| {
            let mut merged = IndexMap::new();
            for dependency in self.dependencies.iter().filter(|dep| !dep.has_errors()) {
                for (name, field) in dependency.module().fields() {
                    merged.entry(name).or_insert(field);
                }
            }
            debug!(module = %self.name, count = merged.len(), "dependency fields merged");
            merged
        })
    }

    pub fn add_dependency(&mut self, dependency: CompiledDependency) {
        self.dependencies.push(dependency);
        self.dependency_fields = OnceCell::new();
        self.dependencies_initialized = false;
    }

    pub fn dependencies(&self) -> &[CompiledDependency] {
        &self.dependencies
    }

    /// Imports types and methods of every dependency, in declaration order.
    ///
    /// Dependencies that failed to compile are skipped with a warning.
    /// Conflicting types and rejected methods are collected as errors.
    /// Calling it again recomputes the imports from scratch.
    pub fn init_dependencies(&mut self) {
        self.imported_types.clear();
        self.imported_methods.clear();
        self.import_errors.clear();
        self.import_warnings.clear();
        self.dependency_fields = OnceCell::new();

        for dependency in &self.dependencies {
            let dependency_name = dependency.name().to_string();
            if dependency.has_errors() {
                warn!(module = %self.name, dependency = %dependency_name, "skipping dependency with errors");
                self.import_warnings.push(Diagnostic::warning(
                    codes::DEPENDENCY_HAS_ERRORS,
                    format!("dependency '{dependency_name}' has errors and was not imported"),
                    None,
                ));
                continue;
            }
            let module = dependency.module();

            for ty in module.types().chain(module.imported_types.values()) {
                let existing = self
                    .types
                    .get(ty.key())
                    .or_else(|| self.imported_types.get(ty.key()));
                match existing {
                    Some(existing) if existing.structurally_equals(ty) => {}
                    Some(_) => self.import_errors.push(ModuleError::TypeConflict {
                        key: ty.key().clone(),
                        dependency: Some(dependency_name.clone()),
                    }),
                    None => {
                        self.imported_types.insert(ty.key().clone(), ty.clone());
                    }
                }
            }

            let visible = module.methods().iter().chain(module.imported_methods());
            for method in visible.filter(|method| !method.is_synthetic()) {
                let decision = match &self.filter {
                    Some(filter) => filter.decide(&dependency_name, method),
                    None => ImportDecision::Import,
                };
                match decision {
                    ImportDecision::Import => {
                        let key = method.key();
                        if self
                            .imported_methods
                            .iter()
                            .any(|imported| imported.key() == key)
                        {
                            continue;
                        }
                        method.tag_module(&dependency_name);
                        self.imported_methods.push(method.clone());
                    }
                    ImportDecision::Skip => {}
                    ImportDecision::Reject(reason) => {
                        self.import_errors.push(ModuleError::MethodRejected {
                            dependency: dependency_name.clone(),
                            signature: method.signature(),
                            reason,
                        })
                    }
                }
            }
            debug!(
                module = %self.name,
                dependency = %dependency_name,
                types = self.imported_types.len(),
                methods = self.imported_methods.len(),
                "dependency imported"
            );
        }
        self.dependencies_initialized = true;
    }

    /// Errors collected while importing dependencies.
    pub fn errors(&self) -> &[ModuleError] {
        &self.import_errors
    }

    /// Records a diagnostic raised while binding code of this module.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Declares a datatype class in the module namespace with a no-argument
    /// constructor and, when it has fields, an all-fields constructor.
    pub fn declare_datatype(
        &mut self,
        name: &str,
        supertypes: Vec<TypeRef>,
        fields: Vec<(String, TypeRef)>,
    ) -> Result<TypeRef, ModuleError> {
        let ty = OpenType::class(self.namespace.clone(), name, supertypes);
        let mut members = TypeMembers::default();
        for (field_name, field_type) in &fields {
            members = members.with_field(OpenField::new(field_name.clone(), field_type.clone(), name));
        }

        let layout: Vec<(String, Value)> = ty
            .superclass_chain()
            .iter()
            .rev()
            .flat_map(|ancestor| ancestor.members().fields.values().cloned().collect::<Vec<_>>())
            .chain(members.fields.values().cloned())
            .map(|field| (field.name, field.ty.default_value()))
            .collect();
        let defaults = layout.clone();
        let type_name = name.to_string();
        let empty = OpenMethod::new(
            name,
            Vec::new(),
            ty.clone(),
            MethodKind::Constructor,
            NativeInvoker::new(format!("{name}()"), move |_, _| {
                Ok(Value::object(ObjectValue::new(
                    type_name.clone(),
                    defaults.iter().cloned().collect(),
                )))
            }),
        )
        .declared_in(name)
        .into_ref();
        members = members.with_constructor(empty);

        if !fields.is_empty() {
            let params: Vec<TypeRef> = fields.iter().map(|(_, field_type)| field_type.clone()).collect();
            let own_names: Vec<String> = fields.iter().map(|(field_name, _)| field_name.clone()).collect();
            let type_name = name.to_string();
            let full = OpenMethod::new(
                name,
                params,
                ty.clone(),
                MethodKind::Constructor,
                NativeInvoker::new(format!("{name}(..)"), move |_, args| {
                    let mut values: IndexMap<String, Value> = layout.iter().cloned().collect();
                    for (field_name, value) in own_names.iter().zip(args) {
                        values.insert(field_name.clone(), value.clone());
                    }
                    Ok(Value::object(ObjectValue::new(type_name.clone(), values)))
                }),
            )
            .declared_in(name)
            .into_ref();
            members = members.with_constructor(full);
        }

        ty.define_members(members)?;
        self.add_type(ty)
    }

    /// Freezes the module, importing dependencies first if still pending.
    /// Runs [`Self::init_dependencies`] unless the imports are current.
    pub fn ensure_dependencies(&mut self) {
        if !self.dependencies_initialized {
            self.init_dependencies();
        }
    }

    pub fn compile(mut self) -> CompiledOpenClass {
        self.ensure_dependencies();
        let mut diagnostics: Vec<Diagnostic> = self.import_warnings.clone();
        diagnostics.extend(self.import_errors.iter().map(|error| {
            let code = match error {
                ModuleError::MethodRejected { .. } => codes::METHOD_IMPORT_REJECTED,
                _ => codes::TYPE_CONFLICT,
            };
            Diagnostic::error(code, error.to_string(), None)
        }));
        diagnostics.extend(self.diagnostics.iter().cloned());
        CompiledOpenClass {
            module: Arc::new(self),
            diagnostics,
        }
    }
}

fn accessor_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_types::RuntimeEnv;

    fn native(name: &str, result: i32) -> MethodRef {
        OpenMethod::new(
            name,
            Vec::new(),
            builtins().int(),
            MethodKind::Static,
            NativeInvoker::new(name, move |_, _| Ok(Value::Int(result))),
        )
        .into_ref()
    }

    fn compiled(module: ModuleOpenClass) -> CompiledDependency {
        let name = module.name().to_string();
        CompiledDependency::new(name, module.compile())
    }

    #[test]
    fn structurally_equal_types_are_added_once() {
        let mut module = ModuleOpenClass::new("Rules", "rules");
        let first = module.add_type(OpenType::class("rules", "Policy", Vec::new())).unwrap();
        let again = module.add_type(OpenType::class("rules", "Policy", Vec::new())).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let different = OpenType::class("rules", "Policy", vec![builtins().string.clone()]);
        assert!(matches!(
            module.add_type(different),
            Err(ModuleError::TypeConflict { dependency: None, .. })
        ));
        assert_eq!(module.find_type("rules.Policy"), Some(first.clone()));
        assert_eq!(module.find_type("Policy"), Some(first));
        assert_eq!(module.find_type("String"), Some(builtins().string.clone()));
    }

    #[test]
    fn own_fields_override_dependency_fields() {
        let mut base = ModuleOpenClass::new("Base", "base");
        base.add_field(OpenField::constant("rate", builtins().int(), "Base", Value::Int(1)))
            .unwrap();
        base.add_field(OpenField::constant("limit", builtins().int(), "Base", Value::Int(9)))
            .unwrap();

        let mut module = ModuleOpenClass::new("Rules", "rules");
        module
            .add_field(OpenField::constant("rate", builtins().int(), "Rules", Value::Int(2)))
            .unwrap();
        module.add_dependency(compiled(base));

        assert_eq!(module.get_field("rate").and_then(|f| f.constant.clone()), Some(Value::Int(2)));
        assert_eq!(module.get_field("limit").and_then(|f| f.constant.clone()), Some(Value::Int(9)));
        let names: Vec<String> = module.fields().into_keys().collect();
        assert_eq!(names, ["rate", "limit"]);
    }

    #[test]
    fn synthetic_accessors_are_not_imported() {
        let mut base = ModuleOpenClass::new("Base", "base");
        base.add_field(OpenField::new("rate", builtins().int(), "Base")).unwrap();
        base.add_method(native("f", 1)).unwrap();
        assert_eq!(base.methods().len(), 2);

        let mut module = ModuleOpenClass::new("Rules", "rules");
        module.add_dependency(compiled(base));
        module.init_dependencies();
        let imported: Vec<&str> = module.imported_methods().iter().map(|m| m.name()).collect();
        assert_eq!(imported, ["f"]);
        assert_eq!(module.imported_methods()[0].module(), Some("Base"));
    }

    #[test]
    fn own_methods_shadow_imported_ones() {
        let mut base = ModuleOpenClass::new("Base", "base");
        base.add_method(native("f", 1)).unwrap();
        let mut module = ModuleOpenClass::new("Rules", "rules");
        module.add_method(native("f", 2)).unwrap();
        module.add_dependency(compiled(base));
        module.init_dependencies();

        let found = module.methods_named("f");
        assert_eq!(found.len(), 1);
        let mut env = RuntimeEnv::new(0);
        assert_eq!(found[0].invoke(None, &[], &mut env), Ok(Value::Int(2)));
    }

    #[test]
    fn failed_dependencies_are_skipped_with_a_warning() {
        let mut broken = ModuleOpenClass::new("Broken", "broken");
        broken.add_method(native("f", 1)).unwrap();
        broken.report(Diagnostic::error(codes::TYPE_NOT_FOUND, "unknown type 'X'", None));

        let mut module = ModuleOpenClass::new("Rules", "rules");
        module.add_dependency(compiled(broken));
        let compiled = module.compile();
        assert!(!compiled.has_errors());
        assert!(compiled.module().methods_named("f").is_empty());
        assert_eq!(compiled.diagnostics()[0].code, codes::DEPENDENCY_HAS_ERRORS);
    }

    #[test]
    fn conflicting_dependency_types_are_collected() {
        let mut left = ModuleOpenClass::new("Left", "shared");
        left.add_type(OpenType::class("shared", "Item", Vec::new())).unwrap();
        let mut right = ModuleOpenClass::new("Right", "shared");
        right
            .declare_datatype("Item", Vec::new(), vec![("id".to_string(), builtins().int())])
            .unwrap();

        let mut module = ModuleOpenClass::new("Rules", "rules");
        module.add_dependency(compiled(left));
        module.add_dependency(compiled(right));
        module.init_dependencies();
        assert!(matches!(
            module.errors(),
            [ModuleError::TypeConflict { dependency: Some(name), .. }] if name == "Right"
        ));
        let compiled = module.compile();
        assert!(compiled.has_errors());
    }

    #[derive(Debug)]
    struct RejectDeprecated;

    impl DependencyMethodFilter for RejectDeprecated {
        fn decide(&self, _dependency: &str, method: &OpenMethod) -> ImportDecision {
            match method.deprecation() {
                Some(note) => ImportDecision::Reject(note.to_string()),
                None if method.name().starts_with('_') => ImportDecision::Skip,
                None => ImportDecision::Import,
            }
        }
    }

    #[test]
    fn filter_can_skip_or_reject() {
        let mut base = ModuleOpenClass::new("Base", "base");
        base.add_method(native("kept", 1)).unwrap();
        base.add_method(native("_hidden", 2)).unwrap();
        let old = OpenMethod::new(
            "old",
            Vec::new(),
            builtins().int(),
            MethodKind::Static,
            NativeInvoker::new("old", |_, _| Ok(Value::Int(3))),
        )
        .deprecated("use kept()")
        .into_ref();
        base.add_method(old).unwrap();

        let mut module = ModuleOpenClass::new("Rules", "rules");
        module.set_method_filter(Arc::new(RejectDeprecated));
        module.add_dependency(compiled(base));
        module.init_dependencies();

        let imported: Vec<&str> = module.imported_methods().iter().map(|m| m.name()).collect();
        assert_eq!(imported, ["kept"]);
        assert!(matches!(
            module.errors(),
            [ModuleError::MethodRejected { reason, .. }] if reason == "use kept()"
        ));
    }

    #[test]
    fn datatype_constructors_build_objects() {
        let mut module = ModuleOpenClass::new("Rules", "rules");
        let ty = module
            .declare_datatype(
                "Policy",
                Vec::new(),
                vec![
                    ("id".to_string(), builtins().int()),
                    ("holder".to_string(), builtins().string.clone()),
                ],
            )
            .unwrap();
        assert_eq!(ty.constructors().len(), 2);
        let mut env = RuntimeEnv::new(0);
        let empty = ty.constructors()[0].invoke(None, &[], &mut env).unwrap();
        let Value::Object(object) = empty else {
            panic!("constructor returns an object");
        };
        assert_eq!(object.field("id"), Some(&Value::Int(0)));
        assert_eq!(object.field("holder"), Some(&Value::Null));

        let full = ty.constructors()[1]
            .invoke(None, &[Value::Int(7), Value::string("Ann")], &mut env)
            .unwrap();
        let Value::Object(object) = full else {
            panic!("constructor returns an object");
        };
        assert_eq!(object.field("id"), Some(&Value::Int(7)));
    }
}
