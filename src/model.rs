//! # Models
//!
//! The output artifact: named models with typed properties, collected in a
//! registry keyed by model name. Field names of the serialized form (`id`,
//! `required`, `properties`, `type`, `items`, `$ref`, `description`) are what
//! Swagger consumers expect.

use crate::builder::ModelBuilder;
use crate::descriptor::TypeDescriptor;
use crate::error::AppResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type tag used for list-like properties.
pub const ARRAY_TYPE: &str = "array";

/// Reference from an array property to its element model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRef {
    /// Name of the element model or primitive tag.
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Schema-level description of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProperty {
    /// Primitive tag, `"array"` or the name of another model.
    #[serde(rename = "type")]
    pub type_: String,
    /// Element reference, only for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsRef>,
    /// Free text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelProperty {
    /// A property of the given type.
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            ..Self::default()
        }
    }

    /// An array property whose elements are `reference`.
    pub fn array_of(reference: impl Into<String>) -> Self {
        Self {
            type_: ARRAY_TYPE.to_string(),
            items: Some(ItemsRef {
                reference: reference.into(),
            }),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One named model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique model name.
    pub id: String,
    /// Property names that must be present, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Properties by external name.
    #[serde(default)]
    pub properties: IndexMap<String, ModelProperty>,
}

impl Model {
    /// An empty model named `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Models by name. Doubles as the visited set during extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    models: IndexMap<String, Model>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts `ty` (and everything it references) into this registry.
    pub fn add_model<T: TypeDescriptor>(&mut self, ty: &T, name_override: Option<&str>) {
        ModelBuilder::new(self).add_model(ty, name_override);
    }

    /// Looks a model up by name.
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// True when a model named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Inserts or replaces the model stored under its `id`.
    pub fn insert(&mut self, model: Model) {
        self.models.insert(model.id.clone(), model);
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Models in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the registry, returning the underlying map.
    pub fn into_inner(self) -> IndexMap<String, Model> {
        self.models
    }

    /// Pretty printed JSON rendering.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML rendering.
    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
