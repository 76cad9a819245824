//! The method registry interface and a ready-made static implementation.
//!
//! Rust has no runtime reflection over function signatures, so a registered callable
//! carries its own runtime description: the fn item's path (from
//! [`std::any::type_name`]), the declaring file (from `file!()`) and one
//! [`TypeDescriptor`] per parameter and return slot.

use crate::descriptor::TypeDescriptor;
use crate::document::{ExternalDocs, Info};
use crate::error::{Error, Result};
use crate::symbol_matcher::stable_name;
use std::collections::HashMap;
use std::path::PathBuf;

/// Source of registered methods and the document metadata that goes with them
pub trait MethodRegistry {
    /// Method name to its runtime values
    fn methods(&self) -> HashMap<String, Vec<RuntimeValue>>;

    fn info(&self) -> Info;

    fn external_docs(&self) -> ExternalDocs;
}

/// The value a method is bound to
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    ty: TypeDescriptor,
}

impl Receiver {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Receiver {
            ty: TypeDescriptor::opaque::<T>(),
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Printed form of the receiver type
    pub fn printed(&self) -> &str {
        self.ty.name()
    }
}

/// A registered function with its runtime signature.
///
/// `outputs` lists the return slots in declaration order: `T` for a plain return,
/// `T` then the error for `Result<T, E>`, one per element for tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Fully qualified runtime path, e.g. `my_node::api::EthApi::balance`
    pub path: String,
    /// File declaring the function
    pub file: PathBuf,
    pub inputs: Vec<TypeDescriptor>,
    pub outputs: Vec<TypeDescriptor>,
}

impl Function {
    /// Describes the fn item `f`, declared in `file`.
    ///
    /// ```ignore
    /// let f = Function::of(&foo_bar, file!())
    ///     .input(TypeDescriptor::of::<u64>())
    ///     .output(TypeDescriptor::of::<String>());
    /// ```
    pub fn of<F>(_f: &F, file: impl Into<PathBuf>) -> Self {
        Self::named(std::any::type_name::<F>(), file)
    }

    pub fn named(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Function {
            path: path.into(),
            file: file.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, ty: TypeDescriptor) -> Self {
        self.inputs.push(ty);
        self
    }

    pub fn output(mut self, ty: TypeDescriptor) -> Self {
        self.outputs.push(ty);
        self
    }

    /// The name used to find the declaration
    pub fn symbol(&self) -> String {
        stable_name(&self.path)
    }
}

/// One runtime value of a registry entry
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Receiver(Receiver),
    Function(Function),
}

/// A registry entry resolved into a function and its optional receiver
#[derive(Debug, Clone, Copy)]
pub struct Callable<'a> {
    pub receiver: Option<&'a Receiver>,
    pub function: &'a Function,
}

impl<'a> Callable<'a> {
    /// Resolves the runtime values of `method`. An empty list yields `None`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCallable`] for any shape other than `[Function]` or
    /// `[Receiver, Function]`.
    pub fn resolve(method: &str, values: &'a [RuntimeValue]) -> Result<Option<Self>> {
        match values {
            [] => Ok(None),
            [RuntimeValue::Function(function)] => Ok(Some(Callable {
                receiver: None,
                function,
            })),
            [RuntimeValue::Receiver(receiver), RuntimeValue::Function(function)] => {
                Ok(Some(Callable {
                    receiver: Some(receiver),
                    function,
                }))
            }
            _ => Err(Error::InvalidCallable {
                method: method.to_string(),
                message: format!(
                    "expected [function] or [receiver, function], got {} values",
                    values.len()
                ),
            }),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.receiver.is_some()
    }

    /// Runtime input slots, with the receiver first when bound
    pub fn inputs(&self) -> Vec<&'a TypeDescriptor> {
        self.receiver
            .map(Receiver::descriptor)
            .into_iter()
            .chain(self.function.inputs.iter())
            .collect()
    }

    pub fn outputs(&self) -> &'a [TypeDescriptor] {
        &self.function.outputs
    }
}

/// A registry assembled up front
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    info: Info,
    external_docs: ExternalDocs,
    methods: HashMap<String, Vec<RuntimeValue>>,
}

impl StaticRegistry {
    pub fn new(info: Info) -> Self {
        StaticRegistry {
            info,
            ..Self::default()
        }
    }

    pub fn with_external_docs(mut self, external_docs: ExternalDocs) -> Self {
        self.external_docs = external_docs;
        self
    }

    /// Registers a plain function
    pub fn register(&mut self, name: impl Into<String>, function: Function) -> &mut Self {
        self.register_values(name, vec![RuntimeValue::Function(function)])
    }

    /// Registers a function bound to `receiver`
    pub fn register_bound(
        &mut self,
        name: impl Into<String>,
        receiver: Receiver,
        function: Function,
    ) -> &mut Self {
        self.register_values(
            name,
            vec![
                RuntimeValue::Receiver(receiver),
                RuntimeValue::Function(function),
            ],
        )
    }

    /// Registers raw runtime values; the shape is checked during discovery
    pub fn register_values(
        &mut self,
        name: impl Into<String>,
        values: Vec<RuntimeValue>,
    ) -> &mut Self {
        self.methods.insert(name.into(), values);
        self
    }
}

impl MethodRegistry for StaticRegistry {
    fn methods(&self) -> HashMap<String, Vec<RuntimeValue>> {
        self.methods.clone()
    }

    fn info(&self) -> Info {
        self.info.clone()
    }

    fn external_docs(&self) -> ExternalDocs {
        self.external_docs.clone()
    }
}
