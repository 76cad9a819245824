//! Runtime type descriptors.
//!
//! A [`TypeDescriptor`] is what the method registry hands over for every parameter and
//! return slot of a callable. Identity is the [`TypeId`]; the printed form comes from
//! [`std::any::type_name`] and is parsed with `syn` to classify the type's [`Kind`].

use log::debug;
use std::any::TypeId;
use std::fmt;

/// Structural reflection hook producing a root schema for the described type
pub type ReflectFn = fn() -> schemars::Schema;

/// Category of a described type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Char,
    String,
    Unit,
    /// References, smart pointers and `Option<T>`
    Pointer,
    /// Named structs and enums
    Struct,
    Map,
    /// `Vec<T>`, slices and sets
    Slice,
    /// Fixed-size arrays and tuples
    Array,
    /// Trait objects and dynamically typed values
    Interface,
    /// Function pointers, raw pointers and anything else without a schema
    Unsupported,
}

/// Runtime description of a parameter or result type
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    reflect: Option<ReflectFn>,
    context: bool,
}

impl TypeDescriptor {
    /// Describes `T`, with structural reflection through its [`schemars::JsonSchema`] impl
    pub fn of<T>() -> Self
    where
        T: schemars::JsonSchema + ?Sized + 'static,
    {
        let mut descriptor = Self::opaque::<T>();
        descriptor.reflect = Some(reflect_root::<T>);
        descriptor
    }

    /// Describes `T` without a reflection hook. Used for receivers, error slots and
    /// context parameters, which never end up in the document.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        let name = std::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            name,
            kind: classify(name),
            reflect: None,
            context: false,
        }
    }

    /// Describes `T` as the call context, skipped when it leads the parameter list
    pub fn context<T: ?Sized + 'static>() -> Self {
        let mut descriptor = Self::opaque::<T>();
        descriptor.context = true;
        descriptor
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified printed form, e.g. `alloc::string::String`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_context(&self) -> bool {
        self.context
    }

    /// Runs structural reflection, if this descriptor has a hook
    pub fn reflect(&self) -> Option<schemars::Schema> {
        self.reflect.map(|f| f())
    }

    /// Signature string `<package-path>:<type-name>`, prefixed with `*` for pointers.
    ///
    /// For pointer kinds the pointee is described, so `Option<my::Hash>` becomes
    /// `*my:Hash`. Primitives have an empty package path.
    pub fn signature(&self) -> String {
        if self.kind == Kind::Pointer {
            if let Some(inner) = pointee(self.name) {
                let (path, name) = split_path(&inner);
                return format!("*{}:{}", path, name);
            }
        }
        let (path, name) = split_path(self.name);
        format!("{}:{}", path, name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("reflect", &self.reflect.is_some())
            .field("context", &self.context)
            .finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.context == other.context
    }
}

fn reflect_root<T: schemars::JsonSchema + ?Sized>() -> schemars::Schema {
    schemars::generate::SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<T>()
}

/// Classifies a printed type name
pub fn classify(type_name: &str) -> Kind {
    match syn::parse_str::<syn::Type>(type_name) {
        Ok(ty) => classify_type(&ty),
        Err(e) => {
            debug!("Cannot parse type name {}: {}", type_name, e);
            Kind::Unsupported
        }
    }
}

fn classify_type(ty: &syn::Type) -> Kind {
    match ty {
        syn::Type::Path(type_path) => classify_path(&type_path.path),
        syn::Type::Reference(_) => Kind::Pointer,
        syn::Type::Slice(_) => Kind::Slice,
        syn::Type::Array(_) => Kind::Array,
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Kind::Unit,
        syn::Type::Tuple(_) => Kind::Array,
        syn::Type::TraitObject(_) => Kind::Interface,
        syn::Type::Paren(inner) => classify_type(&inner.elem),
        syn::Type::Group(inner) => classify_type(&inner.elem),
        _ => Kind::Unsupported,
    }
}

fn classify_path(path: &syn::Path) -> Kind {
    let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let Some(last) = segments.last() else {
        return Kind::Unsupported;
    };

    if segments.first().map(String::as_str) == Some("serde_json") && last == "Value" {
        return Kind::Interface;
    }

    match last.as_str() {
        "bool" => Kind::Bool,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Kind::Int,
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Kind::Uint,
        "f32" | "f64" => Kind::Float,
        "char" => Kind::Char,
        "str" | "String" => Kind::String,
        "Option" | "Box" | "Rc" | "Arc" | "Cow" => Kind::Pointer,
        "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => Kind::Slice,
        "HashMap" | "BTreeMap" => Kind::Map,
        _ => Kind::Struct,
    }
}

/// Printed form of the pointee of a pointer-like type
fn pointee(type_name: &str) -> Option<String> {
    use quote::ToTokens;

    let ty = syn::parse_str::<syn::Type>(type_name).ok()?;
    let inner = match ty {
        syn::Type::Reference(r) => *r.elem,
        syn::Type::Path(p) => {
            let segment = p.path.segments.last()?;
            match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => {
                    args.args.iter().find_map(|arg| match arg {
                        syn::GenericArgument::Type(t) => Some(t.clone()),
                        _ => None,
                    })?
                }
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(inner.to_token_stream().to_string().replace(' ', ""))
}

/// Splits `a::b::Name<..>` into (`a::b`, `Name<..>`), ignoring `::` inside generics
fn split_path(type_name: &str) -> (&str, &str) {
    let head_end = type_name.find('<').unwrap_or(type_name.len());
    match type_name[..head_end].rfind("::") {
        Some(pos) => (&type_name[..pos], &type_name[pos + 2..]),
        None => ("", type_name),
    }
}
