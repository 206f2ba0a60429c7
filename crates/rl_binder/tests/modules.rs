// Modules, dependencies and bound method bodies
use rl_ast::{BinaryOp, build};
use rl_binder::*;
use rl_types::{OpenField, OpenMethod, Value, builtins};
use std::io::Write;
use std::sync::Arc;

fn compiled_dependency(name: &str, populate: impl FnOnce(&mut ModuleOpenClass)) -> CompiledDependency {
    let mut module = ModuleOpenClass::new(name, "shared");
    populate(&mut module);
    CompiledDependency::new(name, module.compile())
}

fn constant_method(module: &mut ModuleOpenClass, name: &str, value: i32) {
    bind_method(
        module,
        name,
        &[],
        None,
        &build::int(value),
        &BinderConfig::default(),
    )
    .unwrap();
}

fn run(module: &mut ModuleOpenClass, node: &rl_ast::SyntaxNode) -> Value {
    let bound = bind_expression(node, module, &BinderConfig::default()).unwrap();
    assert!(!bound.has_errors(), "{:?}", bound.diagnostics);
    bound.evaluate().unwrap()
}

#[test]
fn own_method_shadows_dependency_method_with_the_same_signature() {
    let dependency = compiled_dependency("D1", |module| {
        constant_method(module, "f", 1);
        constant_method(module, "g", 7);
    });
    let mut module = ModuleOpenClass::new("Rules", "rules");
    module.add_dependency(dependency);
    constant_method(&mut module, "f", 2);

    assert_eq!(run(&mut module, &build::call("f", Vec::new())), Value::Int(2));
    assert_eq!(run(&mut module, &build::call("g", Vec::new())), Value::Int(7));
    assert_eq!(module.methods_named("f").len(), 1);
}

#[test]
fn own_field_overrides_dependency_field() {
    let dependency = compiled_dependency("D1", |module| {
        module
            .add_field(OpenField::constant("rate", builtins().int(), "D1", Value::Int(1)))
            .unwrap();
        module
            .add_field(OpenField::constant("limit", builtins().int(), "D1", Value::Int(10)))
            .unwrap();
    });
    let mut module = ModuleOpenClass::new("Rules", "rules");
    module.add_dependency(dependency);
    module
        .add_field(OpenField::constant("rate", builtins().int(), "Rules", Value::Int(2)))
        .unwrap();

    let node = build::binary(BinaryOp::Add, build::ident("rate"), build::ident("limit"));
    assert_eq!(run(&mut module, &node), Value::Int(12));
}

#[test]
fn dependency_types_are_visible_to_expressions() {
    let dependency = compiled_dependency("Model", |module| {
        module
            .declare_datatype(
                "Account",
                Vec::new(),
                vec![("balance".to_string(), builtins().double())],
            )
            .unwrap();
    });
    let mut module = ModuleOpenClass::new("Rules", "rules");
    module.add_dependency(dependency);

    let node = build::field(
        build::new_object(build::type_name("Account"), vec![build::int(5)]),
        "balance",
    );
    assert_eq!(run(&mut module, &node), Value::Double(5.0));
    assert!(module.find_type("shared.Account").is_some());
}

#[test]
fn failed_dependency_is_not_imported_and_warns() {
    let broken = compiled_dependency("Broken", |module| {
        bind_method(
            module,
            "h",
            &[],
            None,
            &build::ident("nowhere"),
            &BinderConfig::default(),
        )
        .unwrap();
    });
    assert!(broken.has_errors());

    let mut module = ModuleOpenClass::new("Rules", "rules");
    module.add_dependency(broken);
    let bound =
        bind_expression(&build::call("h", Vec::new()), &mut module, &BinderConfig::default())
            .unwrap();
    assert_eq!(bound.diagnostics[0].code, codes::METHOD_NOT_FOUND);

    let compiled = module.compile();
    assert!(
        compiled
            .diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.code == codes::DEPENDENCY_HAS_ERRORS && !diagnostic.is_error())
    );
}

#[derive(Debug)]
struct RejectInternal;

impl DependencyMethodFilter for RejectInternal {
    fn decide(&self, _dependency: &str, method: &OpenMethod) -> ImportDecision {
        if method.name().starts_with("internal") {
            ImportDecision::Reject("internal helpers are private".to_string())
        } else {
            ImportDecision::Import
        }
    }
}

#[test]
fn rejected_imports_fail_compilation() {
    let dependency = compiled_dependency("D1", |module| {
        constant_method(module, "internalSeed", 3);
        constant_method(module, "seed", 4);
    });
    let mut module = ModuleOpenClass::new("Rules", "rules");
    module.set_method_filter(Arc::new(RejectInternal));
    module.add_dependency(dependency);

    assert_eq!(run(&mut module, &build::call("seed", Vec::new())), Value::Int(4));
    let compiled = module.compile();
    assert!(compiled.has_errors());
    assert!(
        compiled
            .diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.code == codes::METHOD_IMPORT_REJECTED)
    );
}

#[test]
fn bound_methods_call_each_other() {
    let mut module = ModuleOpenClass::new("Rules", "rules");
    bind_method(
        &mut module,
        "square",
        &[("x", builtins().double())],
        Some(builtins().double()),
        &build::binary(BinaryOp::Multiply, build::ident("x"), build::ident("x")),
        &BinderConfig::default(),
    )
    .unwrap();
    bind_method(
        &mut module,
        "area",
        &[("side", builtins().int())],
        None,
        &build::call("square", vec![build::ident("side")]),
        &BinderConfig::default(),
    )
    .unwrap();

    let node = build::call("area", vec![build::int(3)]);
    assert_eq!(run(&mut module, &node), Value::Double(9.0));
    assert!(!module.compile().has_errors());
}

#[test]
fn configuration_file_drives_branch_widening() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "widening_failure = \"keep-branches\"").unwrap();
    let config = BinderConfig::load(file.path()).unwrap();
    assert_eq!(config.widening_failure, WideningFailure::KeepBranches);

    let mut module = ModuleOpenClass::new("Rules", "rules");
    let node = build::ternary(build::boolean(false), build::string("a"), build::int(1));
    let bound = bind_expression(&node, &mut module, &config).unwrap();
    assert!(!bound.has_errors(), "{:?}", bound.diagnostics);
    assert_eq!(bound.diagnostics[0].code, codes::BRANCHES_KEPT);
    assert_eq!(bound.evaluate(), Ok(Value::Int(1)));
}
