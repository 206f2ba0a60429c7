//! Open Types: the binder's runtime-agnostic type descriptors.
//!
//! Identity is nominal (`namespace` + `name`) for every type except arrays,
//! whose identity is their innermost element plus the dimension count. Types
//! are immutable once their members are defined; array types are interned in
//! a [`TypeSpace`].

use crate::method::MethodRef;
use crate::primitive::{NumericKind, PrimitiveKind};
use crate::value::Value;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use thiserror::Error;

pub type TypeRef = Arc<OpenType>;

/// Namespace of the primitive types.
pub const PRIMITIVE_NAMESPACE: &str = "";
/// Namespace of boxed types, `String`, `Number`, `Object` and collections.
pub const LANG_NAMESPACE: &str = "lang";
/// Namespace of the arbitrary-precision types.
pub const MATH_NAMESPACE: &str = "math";
/// Namespace of the meta numeric wrapper types.
pub const META_NAMESPACE: &str = "meta";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("members of type '{type_name}' are already defined")]
    MembersAlreadyDefined { type_name: String },
    #[error("type '{name}' is not an array or collection")]
    NotAggregate { name: String },
}

/// Identity of an Open Type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKey {
    Named { namespace: String, name: String },
    Array { element: Box<TypeKey>, dimensions: u32 },
}

impl TypeKey {
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeKey::Named {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Named { name, .. } => f.write_str(name),
            TypeKey::Array {
                element,
                dimensions,
            } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

/// What an Open Type stands for.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Boxed(PrimitiveKind),
    /// `BigInteger` or `BigDecimal`.
    BigNumber(NumericKind),
    /// Domain numeric wrapper built on a numeric kind.
    Meta(NumericKind),
    String,
    /// Universal root of the reference types.
    Object,
    /// Type of the `null` literal.
    Null,
    Void,
    Class,
    Interface,
    Collection { element: TypeRef },
    Array { component: TypeRef },
    /// Type of a node that failed to bind.
    Error,
}

impl TypeKind {
    fn tag(&self) -> &'static str {
        match self {
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Boxed(_) => "boxed",
            TypeKind::BigNumber(_) => "big number",
            TypeKind::Meta(_) => "meta",
            TypeKind::String => "string",
            TypeKind::Object => "object",
            TypeKind::Null => "null",
            TypeKind::Void => "void",
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Collection { .. } => "collection",
            TypeKind::Array { .. } => "array",
            TypeKind::Error => "error",
        }
    }
}

/// Field of a datatype or module.
#[derive(Debug, Clone)]
pub struct OpenField {
    pub name: String,
    pub ty: TypeRef,
    pub declaring_type: String,
    pub is_static: bool,
    /// Value of a module-level constant field.
    pub constant: Option<Value>,
}

impl OpenField {
    pub fn new(name: impl Into<String>, ty: TypeRef, declaring_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            declaring_type: declaring_type.into(),
            is_static: false,
            constant: None,
        }
    }

    /// Static field holding a fixed value.
    pub fn constant(
        name: impl Into<String>,
        ty: TypeRef,
        declaring_type: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            declaring_type: declaring_type.into(),
            is_static: true,
            constant: Some(value),
        }
    }
}

/// Declared members of a type.
#[derive(Debug, Clone, Default)]
pub struct TypeMembers {
    pub fields: IndexMap<String, OpenField>,
    pub methods: Vec<MethodRef>,
    pub constructors: Vec<MethodRef>,
}

impl TypeMembers {
    pub fn with_field(mut self, field: OpenField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_method(mut self, method: MethodRef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: MethodRef) -> Self {
        self.constructors.push(constructor);
        self
    }
}

static EMPTY_MEMBERS: once_cell::sync::Lazy<TypeMembers> =
    once_cell::sync::Lazy::new(TypeMembers::default);

/// A semantic type descriptor.
pub struct OpenType {
    name: String,
    namespace: String,
    key: TypeKey,
    kind: TypeKind,
    supertypes: Vec<TypeRef>,
    members: OnceCell<TypeMembers>,
}

impl OpenType {
    fn build(
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: TypeKind,
        supertypes: Vec<TypeRef>,
    ) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let key = TypeKey::named(namespace.clone(), name.clone());
        Self {
            name,
            namespace,
            key,
            kind,
            supertypes,
            members: OnceCell::new(),
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> TypeRef {
        Arc::new(Self::build(
            PRIMITIVE_NAMESPACE,
            kind.name(),
            TypeKind::Primitive(kind),
            Vec::new(),
        ))
    }

    /// Datatype class with the given direct super-types.
    pub fn class(
        namespace: impl Into<String>,
        name: impl Into<String>,
        supertypes: Vec<TypeRef>,
    ) -> TypeRef {
        Arc::new(Self::build(namespace, name, TypeKind::Class, supertypes))
    }

    pub fn interface(
        namespace: impl Into<String>,
        name: impl Into<String>,
        supertypes: Vec<TypeRef>,
    ) -> TypeRef {
        Arc::new(Self::build(namespace, name, TypeKind::Interface, supertypes))
    }

    /// Nominal collection type whose elements are `element`.
    pub fn collection(
        namespace: impl Into<String>,
        name: impl Into<String>,
        element: TypeRef,
    ) -> TypeRef {
        Arc::new(Self::build(
            namespace,
            name,
            TypeKind::Collection { element },
            Vec::new(),
        ))
    }

    /// Array whose components are `component`. Prefer [`TypeSpace::array_of`].
    pub fn array(component: TypeRef) -> TypeRef {
        let key = match &component.key {
            TypeKey::Array {
                element,
                dimensions,
            } => TypeKey::Array {
                element: element.clone(),
                dimensions: dimensions + 1,
            },
            named => TypeKey::Array {
                element: Box::new(named.clone()),
                dimensions: 1,
            },
        };
        Arc::new(Self {
            name: key.to_string(),
            namespace: component.namespace.clone(),
            key,
            kind: TypeKind::Array { component },
            supertypes: Vec::new(),
            members: OnceCell::new(),
        })
    }

    pub(crate) fn special(
        namespace: &str,
        name: &str,
        kind: TypeKind,
        supertypes: Vec<TypeRef>,
    ) -> TypeRef {
        Arc::new(Self::build(namespace, name, kind, supertypes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn supertypes(&self) -> &[TypeRef] {
        &self.supertypes
    }

    /// Attaches members once; datatypes are created first so that members may
    /// refer back to their declaring type.
    pub fn define_members(&self, members: TypeMembers) -> Result<(), TypeError> {
        self.members
            .set(members)
            .map_err(|_| TypeError::MembersAlreadyDefined {
                type_name: self.name.clone(),
            })
    }

    pub fn members(&self) -> &TypeMembers {
        self.members.get().unwrap_or(&EMPTY_MEMBERS)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn boxed_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Boxed(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn meta_kind(&self) -> Option<NumericKind> {
        match self.kind {
            TypeKind::Meta(kind) => Some(kind),
            _ => None,
        }
    }

    /// Numeric kind of primitive, boxed and arbitrary-precision types.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self.kind {
            TypeKind::Primitive(kind) | TypeKind::Boxed(kind) => kind.numeric(),
            TypeKind::BigNumber(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, TypeKind::Null)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    pub fn is_object_root(&self) -> bool {
        matches!(self.kind, TypeKind::Object)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// Types whose values may be `null`.
    pub fn is_reference(&self) -> bool {
        !matches!(
            self.kind,
            TypeKind::Primitive(_) | TypeKind::Void | TypeKind::Error
        )
    }

    /// Value of an uninitialised slot of this type: zero for primitives, `null` otherwise.
    pub fn default_value(&self) -> Value {
        match self.kind {
            TypeKind::Primitive(PrimitiveKind::Boolean) => Value::Bool(false),
            TypeKind::Primitive(PrimitiveKind::Byte) => Value::Byte(0),
            TypeKind::Primitive(PrimitiveKind::Short) => Value::Short(0),
            TypeKind::Primitive(PrimitiveKind::Char) => Value::Char('\0'),
            TypeKind::Primitive(PrimitiveKind::Int) => Value::Int(0),
            TypeKind::Primitive(PrimitiveKind::Long) => Value::Long(0),
            TypeKind::Primitive(PrimitiveKind::Float) => Value::Float(0.0),
            TypeKind::Primitive(PrimitiveKind::Double) => Value::Double(0.0),
            _ => Value::Null,
        }
    }

    /// `boolean` or `Boolean`.
    pub fn is_boolean_like(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Primitive(PrimitiveKind::Boolean) | TypeKind::Boxed(PrimitiveKind::Boolean)
        )
    }

    /// Arrays and collections.
    pub fn is_aggregate(&self) -> bool {
        self.component_type().is_some()
    }

    /// Element type of an array or collection.
    pub fn component_type(&self) -> Option<TypeRef> {
        match &self.kind {
            TypeKind::Array { component } => Some(component.clone()),
            TypeKind::Collection { element } => Some(element.clone()),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> u32 {
        match &self.key {
            TypeKey::Array { dimensions, .. } => *dimensions,
            TypeKey::Named { .. } => 0,
        }
    }

    /// First direct super-type that is not an interface.
    pub fn superclass(&self) -> Option<&TypeRef> {
        self.supertypes.iter().find(|ty| !ty.is_interface())
    }

    /// Chain of superclasses, nearest first, excluding `self` and the object root.
    pub fn superclass_chain(&self) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut current = self.superclass().cloned();
        while let Some(ty) = current {
            if ty.is_object_root() || chain.iter().any(|seen: &TypeRef| seen.key == ty.key) {
                break;
            }
            current = ty.superclass().cloned();
            chain.push(ty);
        }
        chain
    }

    /// Number of inheritance levels from `self` up to `ancestor`, following
    /// classes and interfaces breadth-first. `Some(0)` for the type itself.
    pub fn ancestor_distance(&self, ancestor: &OpenType) -> Option<u32> {
        if self.key == ancestor.key {
            return Some(0);
        }
        let mut queue: VecDeque<(&TypeRef, u32)> =
            self.supertypes.iter().map(|ty| (ty, 1)).collect();
        let mut visited = FxHashSet::default();
        while let Some((ty, depth)) = queue.pop_front() {
            if ty.key == ancestor.key {
                return Some(depth);
            }
            if visited.insert(ty.key.clone()) {
                queue.extend(ty.supertypes.iter().map(|next| (next, depth + 1)));
            }
        }
        None
    }

    /// All proper ancestors with their inheritance distance, nearest first.
    pub fn ancestors(&self) -> Vec<(TypeRef, u32)> {
        let mut found: Vec<(TypeRef, u32)> = Vec::new();
        let mut queue: VecDeque<(TypeRef, u32)> =
            self.supertypes.iter().map(|ty| (ty.clone(), 1)).collect();
        while let Some((ty, depth)) = queue.pop_front() {
            if found.iter().any(|(seen, _)| seen.key == ty.key) {
                continue;
            }
            queue.extend(ty.supertypes.iter().map(|next| (next.clone(), depth + 1)));
            found.push((ty, depth));
        }
        found
    }

    /// Field declared on this type or inherited from a superclass.
    pub fn field(&self, name: &str) -> Option<&OpenField> {
        if let Some(field) = self.members().fields.get(name) {
            return Some(field);
        }
        self.supertypes.iter().find_map(|ty| ty.field(name))
    }

    /// Instance and static methods named `name`, own declarations first;
    /// inherited methods are skipped when an own method has the same key.
    pub fn methods_named(&self, name: &str) -> Vec<MethodRef> {
        let mut methods: Vec<MethodRef> = self
            .members()
            .methods
            .iter()
            .filter(|method| method.name() == name)
            .cloned()
            .collect();
        for supertype in &self.supertypes {
            for inherited in supertype.methods_named(name) {
                let key = inherited.key();
                if !methods.iter().any(|method| method.key() == key) {
                    methods.push(inherited);
                }
            }
        }
        methods
    }

    pub fn constructors(&self) -> &[MethodRef] {
        &self.members().constructors
    }

    /// Same key, same kind, same declared field layout and same super-types.
    pub fn structurally_equals(&self, other: &OpenType) -> bool {
        if self.key != other.key || self.kind.tag() != other.kind.tag() {
            return false;
        }
        let supertypes_match = self.supertypes.len() == other.supertypes.len()
            && self
                .supertypes
                .iter()
                .zip(&other.supertypes)
                .all(|(a, b)| a.key == b.key);
        let own = &self.members().fields;
        let theirs = &other.members().fields;
        let fields_match = own.len() == theirs.len()
            && own
                .iter()
                .zip(theirs)
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.ty.key == b.ty.key);
        supertypes_match && fields_match
    }
}

impl PartialEq for OpenType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for OpenType {}

impl Hash for OpenType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for OpenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenType({}:{})", self.kind.tag(), self.key)
    }
}

impl fmt::Display for OpenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// The built-in types shared by every compilation unit.
#[derive(Debug)]
pub struct Builtins {
    pub object: TypeRef,
    pub null: TypeRef,
    pub void: TypeRef,
    pub error: TypeRef,
    pub string: TypeRef,
    pub number: TypeRef,
    pub big_integer: TypeRef,
    pub big_decimal: TypeRef,
    pub list: TypeRef,
    primitives: Vec<TypeRef>,
    boxed: Vec<TypeRef>,
    meta: IndexMap<NumericKind, TypeRef>,
    by_name: FxHashMap<String, TypeRef>,
}

/// Numeric kinds with a meta wrapper type.
pub const META_KINDS: [NumericKind; 8] = [
    NumericKind::Byte,
    NumericKind::Short,
    NumericKind::Int,
    NumericKind::Long,
    NumericKind::Float,
    NumericKind::Double,
    NumericKind::BigInteger,
    NumericKind::BigDecimal,
];

impl Builtins {
    fn new() -> Self {
        let object = OpenType::special(LANG_NAMESPACE, "Object", TypeKind::Object, Vec::new());
        let null = OpenType::special(PRIMITIVE_NAMESPACE, "null", TypeKind::Null, Vec::new());
        let void = OpenType::special(PRIMITIVE_NAMESPACE, "void", TypeKind::Void, Vec::new());
        let error = OpenType::special(PRIMITIVE_NAMESPACE, "<error>", TypeKind::Error, Vec::new());
        let string = OpenType::special(LANG_NAMESPACE, "String", TypeKind::String, Vec::new());
        let number = OpenType::special(LANG_NAMESPACE, "Number", TypeKind::Class, Vec::new());
        let big_integer = OpenType::special(
            MATH_NAMESPACE,
            "BigInteger",
            TypeKind::BigNumber(NumericKind::BigInteger),
            vec![number.clone()],
        );
        let big_decimal = OpenType::special(
            MATH_NAMESPACE,
            "BigDecimal",
            TypeKind::BigNumber(NumericKind::BigDecimal),
            vec![number.clone()],
        );
        let list = OpenType::special(
            LANG_NAMESPACE,
            "List",
            TypeKind::Collection {
                element: object.clone(),
            },
            Vec::new(),
        );

        let primitives: Vec<TypeRef> = PrimitiveKind::ALL
            .into_iter()
            .map(OpenType::primitive)
            .collect();
        let boxed: Vec<TypeRef> = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| {
                let supertypes = if kind.is_numeric() {
                    vec![number.clone()]
                } else {
                    Vec::new()
                };
                OpenType::special(
                    LANG_NAMESPACE,
                    kind.boxed_name(),
                    TypeKind::Boxed(kind),
                    supertypes,
                )
            })
            .collect();
        let meta: IndexMap<NumericKind, TypeRef> = META_KINDS
            .into_iter()
            .map(|kind| {
                let ty = OpenType::special(
                    META_NAMESPACE,
                    kind.meta_name(),
                    TypeKind::Meta(kind),
                    Vec::new(),
                );
                (kind, ty)
            })
            .collect();

        let mut by_name = FxHashMap::default();
        let named = [&object, &string, &number, &big_integer, &big_decimal, &list, &void]
            .into_iter()
            .chain(primitives.iter())
            .chain(boxed.iter())
            .chain(meta.values());
        for ty in named {
            by_name.insert(ty.name().to_string(), ty.clone());
            if !ty.namespace().is_empty() {
                by_name.insert(format!("{}.{}", ty.namespace(), ty.name()), ty.clone());
            }
        }

        Self {
            object,
            null,
            void,
            error,
            string,
            number,
            big_integer,
            big_decimal,
            list,
            primitives,
            boxed,
            meta,
            by_name,
        }
    }

    fn index_of(kind: PrimitiveKind) -> usize {
        PrimitiveKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or_default()
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> TypeRef {
        self.primitives[Self::index_of(kind)].clone()
    }

    pub fn boxed(&self, kind: PrimitiveKind) -> TypeRef {
        self.boxed[Self::index_of(kind)].clone()
    }

    pub fn meta(&self, kind: NumericKind) -> Option<TypeRef> {
        self.meta.get(&kind).cloned()
    }

    pub fn meta_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.meta.values()
    }

    pub fn boolean(&self) -> TypeRef {
        self.primitive(PrimitiveKind::Boolean)
    }

    pub fn int(&self) -> TypeRef {
        self.primitive(PrimitiveKind::Int)
    }

    pub fn double(&self) -> TypeRef {
        self.primitive(PrimitiveKind::Double)
    }

    /// Type representing a numeric kind in its natural form: the primitive for
    /// primitive kinds, the arbitrary-precision class otherwise.
    pub fn numeric(&self, kind: NumericKind) -> TypeRef {
        match kind.primitive() {
            Some(primitive) => self.primitive(primitive),
            None if kind == NumericKind::BigInteger => self.big_integer.clone(),
            None => self.big_decimal.clone(),
        }
    }

    /// Boxes a primitive type; any other type is returned unchanged.
    pub fn box_type(&self, ty: &TypeRef) -> TypeRef {
        match ty.primitive_kind() {
            Some(kind) => self.boxed(kind),
            None => ty.clone(),
        }
    }

    /// Resolves a simple or namespace-qualified built-in type name.
    pub fn by_name(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).cloned()
    }
}

static BUILTINS: OnceCell<Builtins> = OnceCell::new();

/// Process-wide built-in types.
pub fn builtins() -> &'static Builtins {
    BUILTINS.get_or_init(Builtins::new)
}

/// Interned array types of one compilation unit (or shared read-only).
#[derive(Debug, Default)]
pub struct TypeSpace {
    arrays: RwLock<FxHashMap<TypeKey, TypeRef>>,
}

impl TypeSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the interned array type over `component`, creating it once.
    pub fn array_of(&self, component: &TypeRef) -> TypeRef {
        let candidate = OpenType::array(component.clone());
        if let Ok(arrays) = self.arrays.read() {
            if let Some(existing) = arrays.get(candidate.key()) {
                return existing.clone();
            }
        }
        match self.arrays.write() {
            Ok(mut arrays) => arrays
                .entry(candidate.key().clone())
                .or_insert(candidate)
                .clone(),
            Err(_) => candidate,
        }
    }

    /// Array type with `dimensions` levels over `element`.
    pub fn array_with_dimensions(&self, element: &TypeRef, dimensions: u32) -> TypeRef {
        let mut ty = element.clone();
        for _ in 0..dimensions {
            ty = self.array_of(&ty);
        }
        ty
    }

    pub fn interned_count(&self) -> usize {
        self.arrays.read().map(|arrays| arrays.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_identity_is_structural() {
        let space = TypeSpace::new();
        let int = builtins().int();
        let first = space.array_of(&int);
        let second = OpenType::array(int.clone());
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &space.array_of(&int)));
        assert_eq!(space.interned_count(), 1);

        let matrix = space.array_with_dimensions(&int, 2);
        assert_eq!(matrix.dimensions(), 2);
        assert_eq!(matrix.to_string(), "int[][]");
        assert_eq!(matrix.component_type(), Some(first));
    }

    #[test]
    fn named_identity_is_nominal() {
        let a = OpenType::class("datatype", "Person", Vec::new());
        let b = OpenType::class("datatype", "Person", vec![builtins().object.clone()]);
        let c = OpenType::class("other", "Person", Vec::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.structurally_equals(&b));
    }

    #[test]
    fn ancestor_distance_counts_levels() {
        let animal = OpenType::class("zoo", "Animal", Vec::new());
        let pet = OpenType::interface("zoo", "Pet", Vec::new());
        let dog = OpenType::class("zoo", "Dog", vec![animal.clone(), pet.clone()]);
        let puppy = OpenType::class("zoo", "Puppy", vec![dog.clone()]);
        assert_eq!(puppy.ancestor_distance(&animal), Some(2));
        assert_eq!(puppy.ancestor_distance(&pet), Some(2));
        assert_eq!(animal.ancestor_distance(&dog), None);
        assert_eq!(puppy.superclass_chain(), vec![dog, animal]);
    }

    #[test]
    fn members_are_defined_once_and_inherited() {
        let base = OpenType::class("datatype", "Base", Vec::new());
        base.define_members(TypeMembers::default().with_field(OpenField::new(
            "id",
            builtins().int(),
            "Base",
        )))
        .unwrap();
        let derived = OpenType::class("datatype", "Derived", vec![base.clone()]);
        assert_eq!(derived.field("id").map(|field| field.declaring_type.as_str()), Some("Base"));
        assert!(matches!(
            base.define_members(TypeMembers::default()),
            Err(TypeError::MembersAlreadyDefined { .. })
        ));
    }

    #[test]
    fn builtins_resolve_simple_and_qualified_names() {
        let types = builtins();
        assert_eq!(types.by_name("Integer"), Some(types.boxed(PrimitiveKind::Int)));
        assert_eq!(types.by_name("lang.Integer"), Some(types.boxed(PrimitiveKind::Int)));
        assert_eq!(types.by_name("DoubleValue"), types.meta(NumericKind::Double));
        assert_eq!(types.by_name("double"), Some(types.double()));
        assert!(types.by_name("Unknown").is_none());
        assert_eq!(types.box_type(&types.int()), types.boxed(PrimitiveKind::Int));
        assert!(types.boxed(PrimitiveKind::Int).ancestor_distance(&types.number) == Some(1));
    }
}
