#![deny(missing_docs)]

//! # Swagger Models
//!
//! Derives Swagger "model" definitions (named entities with typed, possibly
//! required properties and references between them) from type descriptors.
//!
//! Descriptors come from an explicit [`TypeUniverse`] or are read from Rust
//! source with [`SourceTypes`]. Extraction writes into a caller owned
//! [`ModelRegistry`], which can be rendered to JSON or YAML.
//!
//! ```
//! use swagger_models::{FieldDef, ModelRegistry, Primitive, TypeUniverse};
//!
//! let mut universe = TypeUniverse::new();
//! let string = universe.primitive(Primitive::String);
//! let address = universe.named_struct("HomeAddress", vec![FieldDef::new("City", string)]);
//! let address_ptr = universe.pointer_to(address);
//! let person = universe.named_struct(
//!     "Person",
//!     vec![
//!         FieldDef::new("Name", string),
//!         FieldDef::new("Address", address_ptr).with_tag("json", "addr,omitempty"),
//!     ],
//! );
//!
//! let mut registry = ModelRegistry::new();
//! registry.add_model(&universe.get(person), None);
//!
//! let model = registry.get("Person").unwrap();
//! assert_eq!(model.required, vec!["Name"]);
//! assert_eq!(model.properties["addr"].type_, "HomeAddress");
//! assert!(registry.contains("HomeAddress"));
//! ```

/// Shared error types.
pub mod error;

/// Primitive scalar tags.
pub mod primitive;

/// Type descriptor capability traits.
pub mod descriptor;

/// Arena-backed type descriptors.
pub mod universe;

/// Field tag parsing.
pub mod directive;

/// Output models and registry.
pub mod model;

/// Recursive model extraction.
pub mod builder;

/// Descriptors from Rust source code.
pub mod source;

pub use builder::{element_type_name, key_from, ModelBuilder};
pub use descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};
pub use directive::{FieldDirective, FieldOptions};
pub use error::{AppError, AppResult};
pub use model::{ItemsRef, Model, ModelProperty, ModelRegistry};
pub use primitive::{is_primitive_type, Primitive};
pub use source::{SourceOptions, SourceTypes};
pub use universe::{FieldDef, TypeId, TypeUniverse};
