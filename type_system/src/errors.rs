//! Semantic error taxonomy.
//!
//! Structural errors (malformed type references and declarations), contract
//! errors (broken inheritance obligations) and inference errors (call-site
//! type parameter binding). All of them are recoverable: they are rendered
//! into the owning module's error list and the pass keeps building a
//! best-effort graph.

use crate::store::{ModuleId, TypeStore};
use diagnostics::{ErrorRecord, Range};
use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum SemanticError {
    #[fail(display = "type '{}' is not defined", name)]
    UnknownType { name: String },

    #[fail(display = "redefinition of {} '{}'", kind, name)]
    RedefinitionError { kind: String, name: String },

    #[fail(display = "type '{}' is not generic", name)]
    NotGeneric { name: String },

    #[fail(
        display = "type '{}' declares {} generic parameter(s), but {} type argument(s) are given",
        name, declared, given
    )]
    GenericArityMismatch {
        name: String,
        declared: usize,
        given: usize,
    },

    #[fail(display = "a primitive type cannot be used as a type argument")]
    PrimitiveTypeArgument,

    #[fail(display = "a class can only extend a class")]
    ExtendsMustBeClass,

    #[fail(display = "a class can only implement interfaces")]
    ImplementsMustBeInterface,

    #[fail(display = "an interface can only extend interfaces")]
    InterfaceExtendsMustBeInterface,

    #[fail(display = "only classes and interfaces are allowed as upper bounds of a generic type parameter")]
    UpperBoundMustBeClassOrInterface,

    #[fail(display = "only a class is allowed as lower bound of a generic type parameter")]
    LowerBoundMustBeClass,

    #[fail(display = "cyclic inheritance involving type '{}'", name)]
    CyclicInheritance { name: String },

    #[fail(
        display = "class '{}' must be declared abstract or implement: {}",
        name, methods
    )]
    AbstractMethodsNotImplemented { name: String, methods: String },

    #[fail(
        display = "method '{}' of interface '{}' is not implemented",
        method, interface
    )]
    UnimplementedInterfaceMethod { interface: String, method: String },

    #[fail(
        display = "generic type parameter '{}' cannot be determined for this call",
        name
    )]
    UndeterminedTypeParameter { name: String },

    #[fail(
        display = "generic type parameter '{}' is bound to contradictory types: {}",
        name, types
    )]
    InconsistentTypeParameter { name: String, types: String },
}

impl TypeStore {
    /// Renders the error into a record on the owning module's list: the
    /// sole channel back to the user-facing layer. Nothing is thrown.
    pub fn report(&mut self, module: ModuleId, range: Range, error: &SemanticError) {
        self.module_mut(module)
            .errors
            .push(ErrorRecord::error(error.to_string(), range));
    }
}
