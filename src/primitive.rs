//! # Primitive Tags
//!
//! The fixed set of scalar tags that are referenced by name and never receive
//! a model entry of their own.

use std::fmt::{self, Display};

/// A primitive scalar tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Platform sized integer.
    Int,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Boolean.
    Bool,
    /// String.
    String,
    /// Single byte.
    Byte,
}

impl Primitive {
    /// Every primitive tag, in canonical order.
    pub const ALL: [Primitive; 8] = [
        Primitive::Int,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Bool,
        Primitive::String,
        Primitive::Byte,
    ];

    /// The tag as it appears in model properties.
    pub fn tag(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Bool => "bool",
            Primitive::String => "string",
            Primitive::Byte => "byte",
        }
    }

    /// Looks a tag up by exact name.
    pub fn from_tag(tag: &str) -> Option<Primitive> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    /// Maps a Rust scalar type name to its tag.
    pub fn from_rust(ident: &str) -> Option<Primitive> {
        match ident {
            "bool" => Some(Primitive::Bool),
            "i8" | "i16" | "i32" | "u16" | "u32" => Some(Primitive::Int32),
            "i64" | "u64" => Some(Primitive::Int64),
            "isize" | "usize" | "i128" | "u128" => Some(Primitive::Int),
            "u8" => Some(Primitive::Byte),
            "f32" => Some(Primitive::Float32),
            "f64" => Some(Primitive::Float64),
            "String" | "str" | "char" => Some(Primitive::String),
            _ => None,
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// True when `name` is exactly one of the primitive tags.
pub fn is_primitive_type(name: &str) -> bool {
    Primitive::from_tag(name).is_some()
}
