//! # Model Builder
//!
//! Recursive extraction of models from type descriptors.
//!
//! A model is inserted into the registry before its fields are walked, so the
//! registry doubles as the visited set: a type that reaches itself again,
//! directly or through other types, finds its own placeholder and stops.

use crate::descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};
use crate::directive::{FieldOptions, DEFAULT_TAG_KEY};
use crate::model::{Model, ModelProperty, ModelRegistry};
use crate::primitive::{is_primitive_type, Primitive};
use tracing::{debug, trace};

/// Stateful builder writing into a caller owned [`ModelRegistry`].
pub struct ModelBuilder<'r> {
    models: &'r mut ModelRegistry,
    tag_key: String,
}

/// How a field's effective type is represented.
enum FieldShape<T> {
    /// Slice, array or pointer to either; carries the element type.
    List(T),
    /// Pointer to anything that is not a list; carries the pointee.
    Pointer(T),
    /// Unnamed inline type.
    Anonymous,
    /// Referenced by its own name.
    Named,
}

impl<'r> ModelBuilder<'r> {
    /// Creates a builder reading `json` tags.
    pub fn new(models: &'r mut ModelRegistry) -> Self {
        Self {
            models,
            tag_key: DEFAULT_TAG_KEY.to_string(),
        }
    }

    /// Reads field metadata from `key` instead of `json`.
    pub fn with_tag_key(mut self, key: impl Into<String>) -> Self {
        self.tag_key = key.into();
        self
    }

    /// Adds a model for `st` and every type it references.
    ///
    /// The model is named `name_override` when given (and non-empty),
    /// otherwise [`key_from`]. Primitive tags and names already present in the
    /// registry are left alone.
    pub fn add_model<T: TypeDescriptor>(&mut self, st: &T, name_override: Option<&str>) {
        let model_name = match name_override {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => key_from(st),
        };
        if is_primitive_type(&model_name) {
            trace!(model = %model_name, "primitive, no model needed");
            return;
        }
        if self.models.contains(&model_name) {
            trace!(model = %model_name, "already visited");
            return;
        }

        debug!(model = %model_name, kind = ?st.kind(), "registering model");
        // store before walking fields
        self.models.insert(Model::new(model_name.as_str()));

        let mut model = Model::new(model_name);
        if st.kind() == TypeKind::Struct {
            for i in 0..st.field_count() {
                if let Some(field) = st.field(i) {
                    self.add_property(&mut model, &field);
                }
            }
        }

        self.models.insert(model);
    }

    fn add_property<F: FieldDescriptor>(&mut self, model: &mut Model, field: &F) {
        let options = FieldOptions::from_tag(field.tag(&self.tag_key));
        if options.skip {
            trace!(model = %model.id, field = field.name(), "skipped by tag");
            return;
        }
        let json_name = options
            .rename
            .unwrap_or_else(|| field.name().to_string());

        if !options.optional {
            model.required.push(json_name.clone());
        }

        let sft = field.ty();
        let prop = if options.as_string {
            ModelProperty::new(Primitive::String.tag())
                .with_description(format!("({} as string)", sft.type_string()))
        } else {
            self.property_for(&model.id, &json_name, &sft)
        };

        model.properties.insert(json_name, prop);
    }

    fn property_for<T: TypeDescriptor>(
        &mut self,
        model_name: &str,
        json_name: &str,
        sft: &T,
    ) -> ModelProperty {
        match classify(sft) {
            FieldShape::List(elem) => {
                let elem_name = element_type_name(model_name, json_name, &elem);
                self.add_model(&elem, Some(elem_name.as_str()));
                ModelProperty::array_of(elem_name)
            }
            FieldShape::Pointer(pointee) => {
                if pointee.name().is_empty() {
                    let elem_name = synthesized_name(model_name, json_name);
                    self.add_model(&pointee, Some(elem_name.as_str()));
                    ModelProperty::new(elem_name)
                } else {
                    self.add_model(&pointee, None);
                    ModelProperty::new(pointee.type_string())
                }
            }
            FieldShape::Anonymous => {
                let elem_name = synthesized_name(model_name, json_name);
                self.add_model(sft, Some(elem_name.as_str()));
                ModelProperty::new(elem_name)
            }
            FieldShape::Named => {
                if sft.kind() == TypeKind::Struct {
                    self.add_model(sft, None);
                }
                ModelProperty::new(sft.type_string())
            }
        }
    }
}

fn classify<T: TypeDescriptor>(sft: &T) -> FieldShape<T> {
    match sft.kind() {
        TypeKind::Slice | TypeKind::Array => sft.elem().map_or(FieldShape::Named, FieldShape::List),
        TypeKind::Pointer => match sft.elem() {
            Some(pointee) if pointee.kind().is_list() => {
                pointee.elem().map_or(FieldShape::Named, FieldShape::List)
            }
            Some(pointee) => FieldShape::Pointer(pointee),
            None => FieldShape::Named,
        },
        _ if sft.name().is_empty() => FieldShape::Anonymous,
        _ => FieldShape::Named,
    }
}

/// Canonical model name of a type.
///
/// Unnamed types have `[]` replaced by `||`, since Swagger UI gives `[` a
/// meaning of its own.
pub fn key_from<T: TypeDescriptor>(st: &T) -> String {
    let key = st.type_string();
    if st.name().is_empty() {
        key.replace("[]", "||")
    } else {
        key
    }
}

/// Reference name for the element type of a list field.
pub fn element_type_name<T: TypeDescriptor>(model_name: &str, json_name: &str, elem: &T) -> String {
    if elem.name().is_empty() {
        synthesized_name(model_name, json_name)
    } else {
        key_from(elem)
    }
}

/// `<owner>.<field>`
fn synthesized_name(model_name: &str, json_name: &str) -> String {
    format!("{}.{}", model_name, json_name)
}
