//! # Type Universe
//!
//! An arena of explicit type descriptors. Types refer to each other through
//! [`TypeId`] indices, which makes self-referential and mutually recursive
//! graphs straightforward to express: declare a struct first, then define its
//! fields once every referenced type exists.

use crate::descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};
use crate::primitive::Primitive;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Index of a type inside a [`TypeUniverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// A declared struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Declared field name.
    pub name: String,
    /// Declared field type.
    pub ty: TypeId,
    /// String keyed metadata (e.g. `json` -> `"addr,omitempty"`).
    pub tags: IndexMap<String, String>,
}

impl FieldDef {
    /// Creates an untagged field.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            tags: IndexMap::new(),
        }
    }

    /// Attaches a metadata value under `key`.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Structural shape of a type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A composite with ordered fields.
    Struct(Vec<FieldDef>),
    /// `[]T`
    Slice(TypeId),
    /// `[N]T`
    Array {
        /// Declared length.
        len: usize,
        /// Element type.
        elem: TypeId,
    },
    /// `*T`
    Pointer(TypeId),
    /// `map[K]V`
    Map {
        /// Key type.
        key: TypeId,
        /// Value type.
        value: TypeId,
    },
    /// A named leaf without inner structure.
    Scalar,
}

#[derive(Debug, Clone)]
struct TypeDef {
    name: String,
    package: Option<String>,
    shape: TypeShape,
}

/// Arena holding every type definition of one descriptor graph.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    types: Vec<TypeDef>,
    primitives: HashMap<Primitive, TypeId>,
    package: Option<String>,
}

impl TypeUniverse {
    /// Creates an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualifies every named type created afterwards as `package.Name`.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing has been defined yet.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, name: String, package: Option<String>, shape: TypeShape) -> TypeId {
        self.types.push(TypeDef {
            name,
            package,
            shape,
        });
        TypeId(self.types.len() - 1)
    }

    fn push_named(&mut self, name: impl Into<String>, shape: TypeShape) -> TypeId {
        let package = self.package.clone();
        self.push(name.into(), package, shape)
    }

    fn push_unnamed(&mut self, shape: TypeShape) -> TypeId {
        self.push(String::new(), None, shape)
    }

    /// The (interned) primitive type for `primitive`.
    pub fn primitive(&mut self, primitive: Primitive) -> TypeId {
        if let Some(id) = self.primitives.get(&primitive) {
            return *id;
        }
        let id = self.push(primitive.tag().to_string(), None, TypeShape::Scalar);
        self.primitives.insert(primitive, id);
        id
    }

    /// A named leaf type such as an enum or an external type.
    pub fn named_scalar(&mut self, name: impl Into<String>) -> TypeId {
        self.push_named(name, TypeShape::Scalar)
    }

    /// A named leaf that keeps its own qualification (e.g. `chrono::DateTime<Utc>`).
    pub fn external_scalar(&mut self, name: impl Into<String>) -> TypeId {
        self.push(name.into(), None, TypeShape::Scalar)
    }

    /// Declares a named struct whose fields are supplied later.
    pub fn declare_struct(&mut self, name: impl Into<String>) -> TypeId {
        self.push_named(name, TypeShape::Struct(Vec::new()))
    }

    /// Replaces the fields of a named struct definition.
    ///
    /// Returns `false` and leaves the definition untouched for anything else.
    /// Unnamed structs are rendered from their fields, so they stay fixed once
    /// created and can never reach themselves.
    pub fn define_fields(&mut self, id: TypeId, fields: Vec<FieldDef>) -> bool {
        match self.types.get_mut(id.0) {
            Some(TypeDef {
                name,
                shape: TypeShape::Struct(existing),
                ..
            }) if !name.is_empty() => {
                *existing = fields;
                true
            }
            _ => false,
        }
    }

    /// A named struct with its fields.
    pub fn named_struct(&mut self, name: impl Into<String>, fields: Vec<FieldDef>) -> TypeId {
        self.push_named(name, TypeShape::Struct(fields))
    }

    /// An unnamed inline struct.
    pub fn anonymous_struct(&mut self, fields: Vec<FieldDef>) -> TypeId {
        self.push_unnamed(TypeShape::Struct(fields))
    }

    /// `[]elem`
    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.push_unnamed(TypeShape::Slice(elem))
    }

    /// `[len]elem`
    pub fn array_of(&mut self, len: usize, elem: TypeId) -> TypeId {
        self.push_unnamed(TypeShape::Array { len, elem })
    }

    /// `*elem`
    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.push_unnamed(TypeShape::Pointer(elem))
    }

    /// `map[key]value`
    pub fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.push_unnamed(TypeShape::Map { key, value })
    }

    /// Descriptor handle for `id`.
    ///
    /// # Panics
    ///
    /// Querying the handle panics when `id` was minted by a different universe
    /// holding more types than this one.
    pub fn get(&self, id: TypeId) -> TypeRef<'_> {
        TypeRef { universe: self, id }
    }

    fn def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0]
    }

    fn render(&self, id: TypeId) -> String {
        let def = self.def(id);
        if !def.name.is_empty() {
            return match &def.package {
                Some(package) => format!("{}.{}", package, def.name),
                None => def.name.clone(),
            };
        }
        match &def.shape {
            TypeShape::Slice(elem) => format!("[]{}", self.render(*elem)),
            TypeShape::Array { len, elem } => format!("[{}]{}", len, self.render(*elem)),
            TypeShape::Pointer(elem) => format!("*{}", self.render(*elem)),
            TypeShape::Map { key, value } => {
                format!("map[{}]{}", self.render(*key), self.render(*value))
            }
            TypeShape::Struct(fields) if fields.is_empty() => "struct {}".to_string(),
            TypeShape::Struct(fields) => {
                let body = fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, self.render(f.ty)))
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("struct {{ {} }}", body)
            }
            TypeShape::Scalar => String::new(),
        }
    }
}

/// Borrowed descriptor for one type of a [`TypeUniverse`].
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'a> {
    universe: &'a TypeUniverse,
    id: TypeId,
}

impl<'a> TypeRef<'a> {
    /// The id this handle points at.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The structural shape.
    pub fn shape(&self) -> &'a TypeShape {
        &self.universe.def(self.id).shape
    }
}

impl<'a> TypeDescriptor for TypeRef<'a> {
    type Field = FieldRef<'a>;

    fn kind(&self) -> TypeKind {
        match self.shape() {
            TypeShape::Struct(_) => TypeKind::Struct,
            TypeShape::Slice(_) => TypeKind::Slice,
            TypeShape::Array { .. } => TypeKind::Array,
            TypeShape::Pointer(_) => TypeKind::Pointer,
            TypeShape::Map { .. } | TypeShape::Scalar => TypeKind::Other,
        }
    }

    fn name(&self) -> &str {
        &self.universe.def(self.id).name
    }

    fn type_string(&self) -> String {
        self.universe.render(self.id)
    }

    fn elem(&self) -> Option<Self> {
        match self.shape() {
            TypeShape::Slice(elem) | TypeShape::Array { elem, .. } | TypeShape::Pointer(elem) => {
                Some(self.universe.get(*elem))
            }
            _ => None,
        }
    }

    fn field_count(&self) -> usize {
        match self.shape() {
            TypeShape::Struct(fields) => fields.len(),
            _ => 0,
        }
    }

    fn field(&self, i: usize) -> Option<FieldRef<'a>> {
        match self.shape() {
            TypeShape::Struct(fields) => fields.get(i).map(|def| FieldRef {
                universe: self.universe,
                def,
            }),
            _ => None,
        }
    }
}

/// Borrowed descriptor for one struct field of a [`TypeUniverse`].
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    universe: &'a TypeUniverse,
    def: &'a FieldDef,
}

impl<'a> FieldDescriptor for FieldRef<'a> {
    type Type = TypeRef<'a>;

    fn name(&self) -> &str {
        &self.def.name
    }

    fn ty(&self) -> TypeRef<'a> {
        self.universe.get(self.def.ty)
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.def.tags.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_strings() {
        let mut u = TypeUniverse::new().with_package("models");
        let string = u.primitive(Primitive::String);
        let person = u.declare_struct("Person");
        let people = u.slice_of(person);
        let grid = u.array_of(3, string);
        let maybe = u.pointer_to(person);
        let lookup = u.map_of(string, people);

        assert_eq!(u.get(string).type_string(), "string");
        assert_eq!(u.get(person).type_string(), "models.Person");
        assert_eq!(u.get(people).type_string(), "[]models.Person");
        assert_eq!(u.get(grid).type_string(), "[3]string");
        assert_eq!(u.get(maybe).type_string(), "*models.Person");
        assert_eq!(u.get(lookup).type_string(), "map[string][]models.Person");
    }

    #[test]
    fn test_anonymous_struct_rendering() {
        let mut u = TypeUniverse::new();
        let string = u.primitive(Primitive::String);
        let int = u.primitive(Primitive::Int32);
        let empty = u.anonymous_struct(vec![]);
        let point = u.anonymous_struct(vec![FieldDef::new("x", int), FieldDef::new("label", string)]);

        assert_eq!(u.get(empty).type_string(), "struct {}");
        assert_eq!(u.get(point).type_string(), "struct { x int32; label string }");
        assert_eq!(u.get(point).name(), "");
    }

    #[test]
    fn test_primitives_are_interned() {
        let mut u = TypeUniverse::new();
        let a = u.primitive(Primitive::Bool);
        let b = u.primitive(Primitive::Bool);
        assert_eq!(a, b);
        assert_eq!(u.len(), 1);
    }

    #[test]
    fn test_forward_declared_cycle() {
        let mut u = TypeUniverse::new();
        let node = u.declare_struct("Node");
        let next = u.pointer_to(node);
        assert!(u.define_fields(node, vec![FieldDef::new("next", next)]));

        let handle = u.get(node);
        assert_eq!(handle.kind(), TypeKind::Struct);
        assert_eq!(handle.field_count(), 1);
        let field = handle.field(0).expect("field");
        assert_eq!(field.name(), "next");
        assert_eq!(field.ty().kind(), TypeKind::Pointer);
        assert_eq!(field.ty().elem().map(|t| t.id()), Some(node));
    }

    #[test]
    fn test_field_tags() {
        let mut u = TypeUniverse::new();
        let string = u.primitive(Primitive::String);
        let owner = u.named_struct(
            "Owner",
            vec![FieldDef::new("Name", string).with_tag("json", "name,omitempty")],
        );
        let field = u.get(owner).field(0).expect("field");
        assert_eq!(field.tag("json"), Some("name,omitempty"));
        assert_eq!(field.tag("xml"), None);
    }

    #[test]
    fn test_define_fields_ignores_non_structs() {
        let mut u = TypeUniverse::new();
        let status = u.named_scalar("Status");
        let string = u.primitive(Primitive::String);
        assert!(!u.define_fields(status, vec![FieldDef::new("x", string)]));
        assert_eq!(u.get(status).kind(), TypeKind::Other);
        assert_eq!(u.get(status).field_count(), 0);
    }

    #[test]
    fn test_anonymous_structs_cannot_be_redefined() {
        let mut u = TypeUniverse::new();
        let int = u.primitive(Primitive::Int64);
        let anon = u.anonymous_struct(vec![]);
        let next = u.pointer_to(anon);

        assert!(!u.define_fields(anon, vec![FieldDef::new("v", int), FieldDef::new("next", next)]));
        assert_eq!(u.get(anon).field_count(), 0);
        assert_eq!(u.get(next).type_string(), "*struct {}");
    }

    #[test]
    #[should_panic]
    fn test_foreign_id_panics() {
        let mut big = TypeUniverse::new();
        big.primitive(Primitive::Bool);
        let foreign = big.primitive(Primitive::String);
        let small = TypeUniverse::new();
        small.get(foreign).kind();
    }
}
