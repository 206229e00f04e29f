//! # Type Descriptors
//!
//! The capability the model extractor needs from a type introspection
//! facility. Rust has no runtime reflection, so descriptors are supplied
//! explicitly (see [`crate::universe`]) or derived from source code
//! (see [`crate::source`]).

/// Shape classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A composite with fields.
    Struct,
    /// A variable length sequence.
    Slice,
    /// A fixed length sequence.
    Array,
    /// An optional / indirect reference to another type.
    Pointer,
    /// Scalars, maps and any other named or unnamed leaf.
    Other,
}

impl TypeKind {
    /// True for slices and arrays.
    pub fn is_list(self) -> bool {
        matches!(self, TypeKind::Slice | TypeKind::Array)
    }
}

/// Read access to one type.
pub trait TypeDescriptor: Sized {
    /// The field handle type.
    type Field: FieldDescriptor<Type = Self>;

    /// Shape classification.
    fn kind(&self) -> TypeKind;

    /// Declared name, empty for unnamed types.
    fn name(&self) -> &str;

    /// Fully qualified rendering of the type (e.g. `models.Person`, `[]string`).
    fn type_string(&self) -> String;

    /// Element type of a slice, array or pointer.
    fn elem(&self) -> Option<Self>;

    /// Number of fields of a struct; zero for anything else.
    fn field_count(&self) -> usize;

    /// The `i`-th declared field.
    fn field(&self, i: usize) -> Option<Self::Field>;
}

/// Read access to one struct field.
pub trait FieldDescriptor {
    /// The type handle type.
    type Type: TypeDescriptor;

    /// Declared field name.
    fn name(&self) -> &str;

    /// Declared field type.
    fn ty(&self) -> Self::Type;

    /// Metadata value stored under `key`, if any.
    fn tag(&self, key: &str) -> Option<&str>;
}
