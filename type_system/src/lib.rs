#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! The static type layer of the compiler.
//!
//! Represents classes, interfaces, enums, arrays, primitives and generic
//! type parameters; resolves castability (including generics and
//! wildcards); resolves field/method inheritance; and verifies that
//! abstract-method and interface contracts are satisfied.
//!
//! The graph lives in a [`TypeStore`] arena and is built in one
//! single-threaded pass: the parser's declaration records go through
//! [`resolver::resolve`], library types through [`builtins::install`], and
//! afterwards the graph is queried read-only (derived data on generic
//! variants materializes lazily, once, on first access). A recompilation
//! discards the store and builds a new one.

pub mod builtins;
pub mod casts;
pub mod contracts;
pub mod decl;
pub mod defs;
pub mod errors;
pub mod infer;
pub mod members;
pub mod resolver;
pub mod store;
pub mod subst;
pub mod ty;

pub use crate::{
    builtins::Builtins,
    defs::{ClassDef, EnumDef, InterfaceDef, ParamDef},
    errors::SemanticError,
    infer::{infer_generic_call, InferenceContext},
    members::{CallingConvention, DeclId, Field, Method, MethodHandle, Parameter, Visibility},
    store::{BodyId, ClassId, EnumId, InterfaceId, ModuleId, ParamId, TypeStore},
    subst::TypeMap,
    ty::{PrimitiveKind, Ty},
};
