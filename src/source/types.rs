//! # Type Resolution
//!
//! Maps `syn` type syntax onto [`TypeUniverse`] descriptors.

use crate::error::{AppError, AppResult};
use crate::primitive::Primitive;
use crate::universe::{FieldDef, TypeId, TypeUniverse};
use indexmap::IndexMap;
use quote::ToTokens;
use std::collections::{HashMap, HashSet};
use syn::{Expr, ExprLit, GenericArgument, Lit, Path, PathArguments, Type};
use tracing::warn;

/// Where a type occurs, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct FieldSite<'s> {
    /// Declaring struct.
    pub owner: &'s str,
    /// Field name.
    pub field: &'s str,
}

/// Resolves type syntax against the items declared in one source file.
pub struct TypeResolver {
    pub(crate) universe: TypeUniverse,
    pub(crate) items: IndexMap<String, TypeId>,
    aliases: HashMap<String, Type>,
    scalars: IndexMap<String, Primitive>,
    external: HashMap<String, TypeId>,
    expanding: HashSet<String>,
}

impl TypeResolver {
    /// Creates a resolver over `universe` with extra scalar mappings.
    pub fn new(universe: TypeUniverse, scalars: IndexMap<String, Primitive>) -> Self {
        Self {
            universe,
            items: IndexMap::new(),
            aliases: HashMap::new(),
            scalars,
            external: HashMap::new(),
            expanding: HashSet::new(),
        }
    }

    /// Registers a local item under its Rust identifier.
    ///
    /// Returns `false` when the identifier is already taken.
    pub fn declare_item(&mut self, ident: String, id: TypeId) -> bool {
        if self.items.contains_key(&ident) || self.aliases.contains_key(&ident) {
            return false;
        }
        self.items.insert(ident, id);
        true
    }

    /// Registers a type alias under its Rust identifier.
    ///
    /// Returns `false` when the identifier is already taken.
    pub fn declare_alias(&mut self, ident: String, target: Type) -> bool {
        if self.items.contains_key(&ident) || self.aliases.contains_key(&ident) {
            return false;
        }
        self.aliases.insert(ident, target);
        true
    }

    /// Resolves a field type.
    pub fn resolve(&mut self, ty: &Type, site: FieldSite) -> AppResult<TypeId> {
        match ty {
            Type::Path(type_path) if type_path.qself.is_none() => {
                self.resolve_path(&type_path.path, ty, site)
            }
            Type::Reference(reference) => self.resolve(&reference.elem, site),
            Type::Paren(paren) => self.resolve(&paren.elem, site),
            Type::Group(group) => self.resolve(&group.elem, site),
            Type::Ptr(ptr) => {
                let elem = self.resolve(&ptr.elem, site)?;
                Ok(self.universe.pointer_to(elem))
            }
            Type::Slice(slice) => {
                let elem = self.resolve(&slice.elem, site)?;
                Ok(self.universe.slice_of(elem))
            }
            Type::Array(array) => {
                let elem = self.resolve(&array.elem, site)?;
                Ok(self.universe.array_of(array_len(&array.len), elem))
            }
            Type::Tuple(tuple) => {
                let mut fields = Vec::with_capacity(tuple.elems.len());
                for (i, elem) in tuple.elems.iter().enumerate() {
                    let elem = self.resolve(elem, site)?;
                    fields.push(FieldDef::new(i.to_string(), elem));
                }
                Ok(self.universe.anonymous_struct(fields))
            }
            _ => Err(unsupported(ty, site)),
        }
    }

    fn resolve_path(&mut self, path: &Path, ty: &Type, site: FieldSite) -> AppResult<TypeId> {
        let Some(last) = path.segments.last() else {
            return Err(unsupported(ty, site));
        };
        let ident = last.ident.to_string();
        let args = type_args(&last.arguments);

        if let Some(primitive) = self.scalars.get(&ident) {
            return Ok(self.universe.primitive(*primitive));
        }
        if args.is_empty() {
            if let Some(primitive) = Primitive::from_rust(&ident) {
                return Ok(self.universe.primitive(primitive));
            }
        }

        match (ident.as_str(), args.as_slice()) {
            ("Option", [inner, ..]) => {
                let inner = self.resolve(inner, site)?;
                return Ok(self.universe.pointer_to(inner));
            }
            ("Box" | "Rc" | "Arc" | "Cow" | "Cell" | "RefCell", [inner, ..]) => {
                return self.resolve(inner, site);
            }
            (
                "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet",
                [inner, ..],
            ) => {
                let inner = self.resolve(inner, site)?;
                return Ok(self.universe.slice_of(inner));
            }
            ("HashMap" | "BTreeMap" | "IndexMap", [key, value, ..]) => {
                let key = self.resolve(key, site)?;
                let value = self.resolve(value, site)?;
                return Ok(self.universe.map_of(key, value));
            }
            _ => {}
        }

        if let Some(id) = self.items.get(&ident) {
            if !args.is_empty() {
                warn!(
                    owner = site.owner,
                    field = site.field,
                    item = %ident,
                    "generic arguments on local types are ignored"
                );
            }
            return Ok(*id);
        }

        if let Some(target) = self.aliases.get(&ident).cloned() {
            if !self.expanding.insert(ident.clone()) {
                return Err(unsupported(ty, site));
            }
            let resolved = self.resolve(&target, site);
            self.expanding.remove(&ident);
            return resolved;
        }

        let name = render(path);
        if let Some(id) = self.external.get(&name) {
            return Ok(*id);
        }
        let id = self.universe.external_scalar(name.clone());
        self.external.insert(name, id);
        Ok(id)
    }
}

fn type_args(arguments: &PathArguments) -> Vec<&Type> {
    match arguments {
        PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Literal array lengths only; anything else (consts, expressions) renders as 0.
fn array_len(len: &Expr) -> usize {
    match len {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse().unwrap_or(0),
        _ => 0,
    }
}

/// Token rendering with whitespace removed (`chrono :: DateTime < Utc >` -> `chrono::DateTime<Utc>`).
fn render(tokens: &impl ToTokens) -> String {
    tokens
        .to_token_stream()
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn unsupported(ty: &Type, site: FieldSite) -> AppError {
    AppError::UnsupportedType {
        owner: site.owner.to_string(),
        field: site.field.to_string(),
        ty: render(ty),
    }
}
