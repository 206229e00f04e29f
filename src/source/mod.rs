//! # Source Module
//!
//! Builds type descriptors from Rust source code with `syn`, so models can be
//! extracted from application data types without runtime reflection.
//! Serde attributes are translated into field tags on the way in.

pub mod attributes;
pub mod types;

use crate::builder::ModelBuilder;
use crate::descriptor::TypeDescriptor;
use crate::directive::DEFAULT_TAG_KEY;
use crate::error::{AppError, AppResult, ParseError};
use crate::model::ModelRegistry;
use crate::primitive::Primitive;
use crate::universe::{FieldDef, TypeId, TypeRef, TypeUniverse};
use attributes::{strip_raw_prefix, RenameRule, SerdeAttrs};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::{self, Visit};
use syn::{Fields, ItemEnum, ItemFn, ItemImpl, ItemMod, ItemStruct, ItemType};
use tracing::{debug, warn};
use types::{FieldSite, TypeResolver};

/// Settings for reading Rust source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Qualifier for every named type declared in the source.
    pub package: Option<String>,
    /// External type names treated as primitives.
    pub scalars: IndexMap<String, Primitive>,
    /// Metadata key the synthesized tags are stored under.
    pub tag_key: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            package: None,
            scalars: IndexMap::new(),
            tag_key: DEFAULT_TAG_KEY.to_string(),
        }
    }
}

impl SourceOptions {
    /// Default options: unqualified names, `json` tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualifies declared types as `package.Name`.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Treats the external type `name` (last path segment) as `primitive`.
    pub fn with_scalar(mut self, name: impl Into<String>, primitive: Primitive) -> Self {
        self.scalars.insert(name.into(), primitive);
        self
    }

    /// Stores tags under `key` instead of `json`.
    pub fn with_tag_key(mut self, key: impl Into<String>) -> Self {
        self.tag_key = key.into();
        self
    }
}

/// Type descriptors for every item of one Rust source file.
///
/// Structs become named structs and enums named scalars, both under their
/// serde name. Single field tuple structs and `#[serde(transparent)]`
/// containers serialize as their inner value, so they are treated like type
/// aliases: fields of that type take the inner type and no model is made for
/// the wrapper itself.
#[derive(Debug, Clone)]
pub struct SourceTypes {
    universe: TypeUniverse,
    items: IndexMap<String, TypeId>,
    structs: Vec<TypeId>,
    tag_key: String,
}

#[derive(Default)]
struct ItemCollector<'ast> {
    structs: Vec<&'ast ItemStruct>,
    enums: Vec<&'ast ItemEnum>,
    aliases: Vec<&'ast ItemType>,
}

impl<'ast> Visit<'ast> for ItemCollector<'ast> {
    fn visit_item_struct(&mut self, i: &'ast ItemStruct) {
        self.structs.push(i);
    }

    fn visit_item_enum(&mut self, i: &'ast ItemEnum) {
        self.enums.push(i);
    }

    fn visit_item_type(&mut self, i: &'ast ItemType) {
        self.aliases.push(i);
    }

    fn visit_item_mod(&mut self, i: &'ast ItemMod) {
        if !is_cfg_test(&i.attrs) {
            visit::visit_item_mod(self, i);
        }
    }

    // items local to function bodies and impls are not part of the API surface
    fn visit_item_fn(&mut self, _: &'ast ItemFn) {}

    fn visit_item_impl(&mut self, _: &'ast ItemImpl) {}
}

fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .meta
                .require_list()
                .is_ok_and(|list| list.tokens.to_string() == "test")
    })
}

impl SourceTypes {
    /// Parses Rust source code.
    pub fn parse(code: &str, options: &SourceOptions) -> AppResult<Self> {
        Self::parse_inner(code, None, options)
    }

    /// Reads and parses a Rust source file.
    pub fn from_file(path: impl AsRef<Path>, options: &SourceOptions) -> AppResult<Self> {
        let path = path.as_ref();
        let code = fs::read_to_string(path)?;
        Self::parse_inner(&code, Some(path.to_path_buf()), options)
    }

    fn parse_inner(
        code: &str,
        filepath: Option<PathBuf>,
        options: &SourceOptions,
    ) -> AppResult<Self> {
        let file = syn::parse_file(code).map_err(|error| ParseError {
            error,
            filepath,
            source_code: code.to_string(),
        })?;

        let mut collector = ItemCollector::default();
        collector.visit_file(&file);

        let universe = match &options.package {
            Some(package) => TypeUniverse::new().with_package(package.as_str()),
            None => TypeUniverse::new(),
        };
        let mut resolver = TypeResolver::new(universe, options.scalars.clone());

        // declare everything first so fields can refer to any item
        let mut schema_names = HashSet::new();
        let mut declared = Vec::with_capacity(collector.structs.len());
        for item in &collector.structs {
            let ident = item.ident.to_string();
            let attrs = SerdeAttrs::from_attributes(&item.attrs);
            if let Some(inner) = serialized_inner(item, &attrs) {
                debug!(item = %ident, "serialized as its inner type");
                if !resolver.declare_alias(ident.clone(), inner.clone()) {
                    return Err(AppError::DuplicateType(ident));
                }
                continue;
            }
            let id = resolver.universe.declare_struct(schema_name(&ident, attrs.rename));
            if !resolver.declare_item(ident.clone(), id) {
                return Err(AppError::DuplicateType(ident));
            }
            claim_schema_name(&mut schema_names, &resolver.universe, id)?;
            declared.push((*item, id));
        }
        for item in &collector.enums {
            let ident = item.ident.to_string();
            let attrs = SerdeAttrs::from_attributes(&item.attrs);
            let id = resolver.universe.named_scalar(schema_name(&ident, attrs.rename));
            if !resolver.declare_item(ident.clone(), id) {
                return Err(AppError::DuplicateType(ident));
            }
            claim_schema_name(&mut schema_names, &resolver.universe, id)?;
        }
        for item in &collector.aliases {
            let ident = item.ident.to_string();
            if !resolver.declare_alias(ident.clone(), (*item.ty).clone()) {
                return Err(AppError::DuplicateType(ident));
            }
        }

        let mut structs = Vec::with_capacity(declared.len());
        for (item, id) in declared {
            let fields = struct_fields(&mut resolver, item, &options.tag_key)?;
            resolver.universe.define_fields(id, fields);
            structs.push(id);
        }

        debug!(
            structs = collector.structs.len(),
            enums = collector.enums.len(),
            aliases = collector.aliases.len(),
            "collected source items"
        );

        Ok(Self {
            universe: resolver.universe,
            items: resolver.items,
            structs,
            tag_key: options.tag_key.clone(),
        })
    }

    /// Descriptor for the struct or enum declared as `ident`.
    ///
    /// Newtypes and transparent containers are not listed.
    pub fn get(&self, ident: &str) -> Option<TypeRef<'_>> {
        self.items.get(ident).map(|id| self.universe.get(*id))
    }

    /// Declared struct and enum identifiers, structs first.
    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// The underlying universe.
    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    /// Extracts the models reachable from `ident` into `registry`.
    pub fn extract(&self, registry: &mut ModelRegistry, ident: &str) -> AppResult<()> {
        let root = self
            .get(ident)
            .ok_or_else(|| AppError::UnknownType(ident.to_string()))?;
        ModelBuilder::new(registry)
            .with_tag_key(self.tag_key.as_str())
            .add_model(&root, None);
        Ok(())
    }

    /// Extracts every declared struct, in declaration order.
    pub fn extract_all(&self, registry: &mut ModelRegistry) {
        let mut builder = ModelBuilder::new(registry).with_tag_key(self.tag_key.as_str());
        for id in &self.structs {
            builder.add_model(&self.universe.get(*id), None);
        }
    }
}

fn schema_name(ident: &str, rename: Option<String>) -> String {
    rename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ident.to_string())
}

fn claim_schema_name(
    seen: &mut HashSet<String>,
    universe: &TypeUniverse,
    id: TypeId,
) -> AppResult<()> {
    let name = universe.get(id).type_string();
    if seen.insert(name.clone()) {
        Ok(())
    } else {
        Err(AppError::DuplicateType(name))
    }
}

/// The field type a struct serializes as, for newtypes and transparent containers.
fn serialized_inner<'a>(item: &'a ItemStruct, attrs: &SerdeAttrs) -> Option<&'a syn::Type> {
    match &item.fields {
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
            fields.unnamed.first().map(|field| &field.ty)
        }
        Fields::Named(fields) if attrs.transparent => {
            let mut kept = fields
                .named
                .iter()
                .filter(|field| !SerdeAttrs::from_attributes(&field.attrs).skip);
            match (kept.next(), kept.next()) {
                (Some(field), None) => Some(&field.ty),
                _ => {
                    warn!(item = %item.ident, "transparent needs exactly one serialized field");
                    None
                }
            }
        }
        _ => None,
    }
}

fn struct_fields(
    resolver: &mut TypeResolver,
    item: &ItemStruct,
    tag_key: &str,
) -> AppResult<Vec<FieldDef>> {
    let owner = item.ident.to_string();
    let container = SerdeAttrs::from_attributes(&item.attrs);
    let rename_all = match container.rename_all.as_deref() {
        Some(rule) => {
            let parsed = RenameRule::parse(rule);
            if parsed.is_none() {
                warn!(owner = %owner, rule, "unknown rename_all rule ignored");
            }
            parsed
        }
        None => None,
    };

    let mut fields = Vec::new();
    let named = matches!(item.fields, Fields::Named(_));
    for (i, field) in item.fields.iter().enumerate() {
        let name = match &field.ident {
            Some(ident) => strip_raw_prefix(&ident.to_string()).to_string(),
            None => i.to_string(),
        };
        let site = FieldSite {
            owner: &owner,
            field: &name,
        };
        let ty = resolver.resolve(&field.ty, site)?;

        let attrs = SerdeAttrs::from_attributes(&field.attrs);
        let rule = if named { rename_all } else { None };
        let mut def = FieldDef::new(name.as_str(), ty);
        if let Some(tag) = attrs.json_tag(&name, rule) {
            def = def.with_tag(tag_key, tag);
        }
        fields.push(def);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};

    #[test]
    fn test_collects_structs_enums_and_nested_modules() {
        let code = r#"
            pub struct User { pub id: u64 }
            pub enum Role { Admin, Guest }
            pub mod inner {
                pub struct Badge { pub label: String }
            }
            #[cfg(test)]
            mod tests {
                struct Fixture { x: i32 }
            }
            fn helper() {
                struct Local;
            }
        "#;
        let types = SourceTypes::parse(code, &SourceOptions::new()).unwrap();
        assert_eq!(types.idents().collect::<Vec<_>>(), vec!["User", "Badge", "Role"]);
        assert_eq!(types.get("Role").unwrap().kind(), TypeKind::Other);
        assert!(types.get("Fixture").is_none());
        assert!(types.get("Local").is_none());
    }

    #[test]
    fn test_field_tags_from_serde() {
        let code = r#"
            #[serde(rename_all = "camelCase")]
            pub struct Profile {
                pub display_name: String,
                #[serde(rename = "mail")]
                pub email_address: String,
                #[serde(skip)]
                pub cache: Vec<u8>,
                #[serde(default)]
                pub r#type: Option<String>,
            }
        "#;
        let types = SourceTypes::parse(code, &SourceOptions::new()).unwrap();
        let profile = types.get("Profile").unwrap();
        let tags: Vec<_> = (0..profile.field_count())
            .map(|i| {
                let field = profile.field(i).unwrap();
                (field.name().to_string(), field.tag("json").map(str::to_string))
            })
            .collect();
        assert_eq!(
            tags,
            vec![
                ("display_name".to_string(), Some("displayName".to_string())),
                ("email_address".to_string(), Some("mail".to_string())),
                ("cache".to_string(), Some("-".to_string())),
                ("type".to_string(), Some("type,omitempty".to_string())),
            ]
        );
    }

    #[test]
    fn test_struct_rename_and_package() {
        let code = r#"
            #[serde(rename = "Account")]
            pub struct User { pub id: u64 }
        "#;
        let options = SourceOptions::new().with_package("api");
        let types = SourceTypes::parse(code, &options).unwrap();
        assert_eq!(types.get("User").unwrap().type_string(), "api.Account");
    }

    #[test]
    fn test_tuple_struct_fields_are_indexed() {
        let types = SourceTypes::parse("pub struct Pair(pub i32, pub String);", &SourceOptions::new())
            .unwrap();
        let pair = types.get("Pair").unwrap();
        assert_eq!(pair.field(0).unwrap().name(), "0");
        assert_eq!(pair.field(1).unwrap().ty().type_string(), "string");
    }

    #[test]
    fn test_duplicate_items_rejected() {
        let code = r#"
            pub struct User { pub id: u64 }
            pub mod v2 { pub struct User { pub id: String } }
        "#;
        let err = SourceTypes::parse(code, &SourceOptions::new()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateType(name) if name == "User"));
    }

    #[test]
    fn test_duplicate_schema_names_rejected() {
        let code = r#"
            #[serde(rename = "B")]
            pub struct A { pub x: i64 }
            pub struct B { pub y: String }
            pub struct Root { pub a: A, pub b: B }
        "#;
        let err = SourceTypes::parse(code, &SourceOptions::new()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateType(name) if name == "B"));

        let code = r#"
            pub struct Status { pub code: i32 }
            #[serde(rename = "Status")]
            pub enum State { On, Off }
        "#;
        let options = SourceOptions::new().with_package("api");
        let err = SourceTypes::parse(code, &options).unwrap_err();
        assert!(matches!(err, AppError::DuplicateType(name) if name == "api.Status"));
    }

    #[test]
    fn test_newtypes_serialize_as_inner_type() {
        let code = r#"
            pub struct UserId(pub u64);
            #[serde(transparent)]
            pub struct Email {
                inner: String,
                #[serde(skip)]
                verified: bool,
            }
            pub struct User {
                pub id: UserId,
                pub email: Option<Email>,
                pub friends: Vec<UserId>,
            }
        "#;
        let types = SourceTypes::parse(code, &SourceOptions::new()).unwrap();
        assert!(types.get("UserId").is_none());
        assert!(types.get("Email").is_none());

        let mut registry = ModelRegistry::new();
        types.extract_all(&mut registry);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["User"]);
        let user = registry.get("User").unwrap();
        assert_eq!(user.properties["id"].type_, "int64");
        assert_eq!(user.properties["email"].type_, "string");
        assert_eq!(user.properties["friends"].type_, "array");
        assert_eq!(
            user.properties["friends"].items.as_ref().map(|i| i.reference.as_str()),
            Some("int64")
        );
    }

    #[test]
    fn test_unsupported_field_type() {
        let code = "pub struct Job { pub run: fn() }";
        let err = SourceTypes::parse(code, &SourceOptions::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported type `fn()` for field 'run' of 'Job'"
        );
    }

    #[test]
    fn test_parse_error() {
        let err = SourceTypes::parse("pub struct {", &SourceOptions::new()).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_unknown_root() {
        let types = SourceTypes::parse("pub struct A;", &SourceOptions::new()).unwrap();
        let mut registry = ModelRegistry::new();
        let err = types.extract(&mut registry, "B").unwrap_err();
        assert!(matches!(err, AppError::UnknownType(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_custom_tag_key_round_trips() {
        let code = r#"
            pub struct Doc {
                #[serde(rename = "body")]
                pub text: String,
            }
        "#;
        let options = SourceOptions::new().with_tag_key("schema");
        let types = SourceTypes::parse(code, &options).unwrap();
        let mut registry = ModelRegistry::new();
        types.extract(&mut registry, "Doc").unwrap();
        assert!(registry.get("Doc").unwrap().properties.contains_key("body"));
    }
}
