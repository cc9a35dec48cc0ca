//! The built-in library types.
//!
//! Manufactured through the same attachment APIs user declarations go
//! through, so once attached nothing downstream can distinguish library
//! origin from user origin. Parsing of the compact library signature
//! strings happens outside this core; what arrives here is already the
//! skeleton-plus-members shape.

use crate::{
    defs::{ClassDef, InterfaceDef, ParamDef},
    members::{DeclId, Method, Parameter, Visibility},
    store::{ClassId, InterfaceId, ModuleId, TypeStore},
    ty::{PrimitiveKind, Ty},
};
use diagnostics::Range;
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub module: ModuleId,
    pub object: ClassId,
    pub string: ClassId,
    pub enum_base: ClassId,
    pub comparable: InterfaceId,
}

/// Installs the root class, `String`, the `Enum` base class and
/// `Comparable<T>` into a library module and wires the store's well-known
/// handles. Must run before user declarations resolve.
pub fn install(store: &mut TypeStore) -> Builtins {
    debug!("installing built-in library types");
    let module = store.add_module("stdlib", true);

    // the universal root: no superclass
    let object_sym = store.intern("Object");
    let object = store.add_class(ClassDef::new(object_sym, Range::EMPTY, module));
    store.set_root_class(object);

    let string_sym = store.intern("String");
    let string = store.add_class(ClassDef::new(string_sym, Range::EMPTY, module));
    store.class_mut(string).set_extends(Ty::Class(object));
    store.set_string_class(string);

    let string_ty = Ty::Class(string);

    // Object's methods need String, String's need Object
    {
        let owner = DeclId::Class(object);
        let to_string = native_method(store, "toString", owner, Some(string_ty.clone()), &[]);
        store.class_mut(object).add_method(to_string);

        let equals = native_method(
            store,
            "equals",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Boolean)),
            &[("other", Ty::Class(object))],
        );
        store.class_mut(object).add_method(equals);

        let hash_code = native_method(
            store,
            "hashCode",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Int)),
            &[],
        );
        store.class_mut(object).add_method(hash_code);
    }

    let comparable_sym = store.intern("Comparable");
    let comparable = store.add_interface(InterfaceDef::new(comparable_sym, Range::EMPTY, module));
    let t_sym = store.intern("T");
    let t = store.add_param(ParamDef::new(t_sym, Range::EMPTY, module));
    store.interface_mut(comparable).generics.push(t);
    {
        let owner = DeclId::Interface(comparable);
        let compare_sym = store.intern("compareTo");
        let mut compare_to = Method::new(compare_sym, Range::EMPTY, Visibility::Public, owner);
        compare_to.is_abstract = true;
        compare_to.return_ty = Some(Ty::Primitive(PrimitiveKind::Int));
        let other_sym = store.intern("other");
        compare_to
            .parameters
            .push(Parameter::new(other_sym, Range::EMPTY, Ty::TypeParam(t)));
        store.interface_mut(comparable).add_method(compare_to);
    }

    {
        let owner = DeclId::Class(string);
        let length = native_method(
            store,
            "length",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Int)),
            &[],
        );
        store.class_mut(string).add_method(length);

        let char_at = native_method(
            store,
            "charAt",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Char)),
            &[("index", Ty::Primitive(PrimitiveKind::Int))],
        );
        store.class_mut(string).add_method(char_at);

        let concat = native_method(
            store,
            "concat",
            owner,
            Some(string_ty.clone()),
            &[("other", string_ty.clone())],
        );
        store.class_mut(string).add_method(concat);

        let compare_to = native_method(
            store,
            "compareTo",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Int)),
            &[("other", string_ty.clone())],
        );
        store.class_mut(string).add_method(compare_to);

        let comparable_string = store.parameterized_interface(comparable, &[string_ty]);
        store.class_mut(string).add_implements(comparable_string);
    }

    let enum_sym = store.intern("Enum");
    let enum_base = store.add_class(ClassDef::new(enum_sym, Range::EMPTY, module));
    store.class_mut(enum_base).is_abstract = true;
    store.class_mut(enum_base).set_extends(Ty::Class(object));
    store.set_enum_base_class(enum_base);
    {
        let owner = DeclId::Class(enum_base);
        let name = native_method(store, "name", owner, Some(Ty::Class(string)), &[]);
        store.class_mut(enum_base).add_method(name);

        let ordinal = native_method(
            store,
            "ordinal",
            owner,
            Some(Ty::Primitive(PrimitiveKind::Int)),
            &[],
        );
        store.class_mut(enum_base).add_method(ordinal);
    }

    for ty in [
        Ty::Class(object),
        Ty::Class(string),
        Ty::Class(enum_base),
        Ty::Interface(comparable),
    ]
    .iter()
    {
        let name = store.simple_name(ty);
        let registered = store.try_register(&name, ty.clone());
        debug_assert!(registered, "library names are registered first");
        store.module_mut(module).types.push(ty.clone());
    }

    Builtins {
        module,
        object,
        string,
        enum_base,
        comparable,
    }
}

fn native_method(
    store: &mut TypeStore,
    identifier: &str,
    owner: DeclId,
    return_ty: Option<Ty>,
    params: &[(&str, Ty)],
) -> Method {
    let sym = store.intern(identifier);
    let mut method = Method::new(sym, Range::EMPTY, Visibility::Public, owner);
    method.has_native_implementation = true;
    method.return_ty = return_ty;
    for (name, ty) in params {
        let param_sym = store.intern(name);
        method
            .parameters
            .push(Parameter::new(param_sym, Range::EMPTY, ty.clone()));
    }
    method
}
