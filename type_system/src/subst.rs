//! Substitution and generic variants.
//!
//! A generic variant is a *view* over an origin declaration under a total
//! type-parameter-to-type map, never an independent declaration. Its derived
//! fields, methods and supertypes are computed once on first access and
//! never invalidated: a recompilation builds fresh variants instead of
//! mutating old ones.
//!
//! Substitution is pure and identity-preserving: a type with no dependency
//! on the map comes back as the very same instance, which earlier call
//! sites rely on for their cached results.

use crate::{
    members::{Field, Method},
    store::{ClassId, InterfaceId, ParamId, TypeStore},
    ty::{ArrayType, Ty},
};
use once_cell::unsync::OnceCell;
use std::rc::Rc;

/// Type-parameter-to-type binding, kept in declared-parameter order so two
/// instantiations of the same origin compare entry for entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMap {
    entries: Vec<(ParamId, Ty)>,
}

impl TypeMap {
    pub fn new() -> TypeMap {
        TypeMap::default()
    }

    pub fn insert(&mut self, param: ParamId, ty: Ty) {
        match self.entries.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = ty,
            None => self.entries.push((param, ty)),
        }
    }

    pub fn get(&self, param: ParamId) -> Option<&Ty> {
        self.entries
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &Ty)> {
        self.entries.iter().map(|(p, t)| (*p, t))
    }

    /// Applies `other` to every bound type. The `bool` reports whether any
    /// entry actually changed.
    fn substituted(&self, other: &TypeMap, store: &TypeStore) -> (TypeMap, bool) {
        let mut changed = false;
        let entries = self
            .entries
            .iter()
            .map(|(p, t)| {
                let substituted = t.substituted(other, store);
                if substituted != *t {
                    changed = true;
                }
                (*p, substituted)
            })
            .collect();
        (TypeMap { entries }, changed)
    }
}

#[derive(Debug)]
pub struct ClassVariant {
    pub origin: ClassId,
    pub map: TypeMap,
    fields: OnceCell<Vec<Field>>,
    methods: OnceCell<Vec<Method>>,
    extends: OnceCell<Option<Ty>>,
    implements: OnceCell<Vec<Ty>>,
}

impl ClassVariant {
    pub fn new(origin: ClassId, map: TypeMap) -> ClassVariant {
        ClassVariant {
            origin,
            map,
            fields: OnceCell::new(),
            methods: OnceCell::new(),
            extends: OnceCell::new(),
            implements: OnceCell::new(),
        }
    }

    pub(crate) fn fields<'a>(&'a self, store: &'a TypeStore) -> &'a [Field] {
        self.fields.get_or_init(|| {
            store
                .class(self.origin)
                .fields
                .iter()
                .map(|f| f.substituted(&self.map, store))
                .collect()
        })
    }

    pub(crate) fn methods<'a>(&'a self, store: &'a TypeStore) -> &'a [Method] {
        self.methods.get_or_init(|| {
            store
                .class(self.origin)
                .methods
                .iter()
                .map(|m| m.substituted(&self.map, store))
                .collect()
        })
    }

    pub(crate) fn extends_ty<'a>(&'a self, store: &'a TypeStore) -> Option<&'a Ty> {
        self.extends
            .get_or_init(|| {
                store
                    .class(self.origin)
                    .extends()
                    .map(|e| e.substituted(&self.map, store))
            })
            .as_ref()
    }

    pub(crate) fn implements_tys<'a>(&'a self, store: &'a TypeStore) -> &'a [Ty] {
        self.implements.get_or_init(|| {
            store
                .class(self.origin)
                .implements()
                .iter()
                .map(|i| i.substituted(&self.map, store))
                .collect()
        })
    }
}

#[derive(Debug)]
pub struct InterfaceVariant {
    pub origin: InterfaceId,
    pub map: TypeMap,
    methods: OnceCell<Vec<Method>>,
    extends: OnceCell<Vec<Ty>>,
    all_extended: OnceCell<Vec<Ty>>,
}

impl InterfaceVariant {
    pub fn new(origin: InterfaceId, map: TypeMap) -> InterfaceVariant {
        InterfaceVariant {
            origin,
            map,
            methods: OnceCell::new(),
            extends: OnceCell::new(),
            all_extended: OnceCell::new(),
        }
    }

    pub(crate) fn methods<'a>(&'a self, store: &'a TypeStore) -> &'a [Method] {
        self.methods.get_or_init(|| {
            store
                .interface(self.origin)
                .methods
                .iter()
                .map(|m| m.substituted(&self.map, store))
                .collect()
        })
    }

    pub(crate) fn extends_tys<'a>(&'a self, store: &'a TypeStore) -> &'a [Ty] {
        self.extends.get_or_init(|| {
            store
                .interface(self.origin)
                .extends()
                .iter()
                .map(|e| e.substituted(&self.map, store))
                .collect()
        })
    }

    pub(crate) fn all_extended_tys<'a>(&'a self, store: &'a TypeStore) -> &'a [Ty] {
        self.all_extended.get_or_init(|| {
            store
                .all_extended_interfaces(&Ty::Interface(self.origin))
                .iter()
                .map(|e| e.substituted(&self.map, store))
                .collect()
        })
    }
}

impl Ty {
    /// The substitution contract: returns the same instance whenever the
    /// type has no dependency on any key in `map`, a fresh variant
    /// otherwise. Unmapped type parameters come back unchanged; raw
    /// declared types have no free parameters to substitute.
    pub fn substituted(&self, map: &TypeMap, store: &TypeStore) -> Ty {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Ty::Primitive(_) | Ty::Null | Ty::Class(_) | Ty::Interface(_) | Ty::Enum(_) => {
                self.clone()
            }
            Ty::TypeParam(p) => match map.get(*p) {
                Some(bound) => bound.clone(),
                None => self.clone(),
            },
            Ty::Array(arr) => {
                let element = arr.element.substituted(map, store);
                if element == arr.element {
                    self.clone()
                } else {
                    // re-wrap with the same dimension; a bound array type
                    // flattens into the element
                    Ty::Array(Rc::new(ArrayType::new(element, arr.dimension)))
                }
            }
            Ty::ClassVariant(v) => {
                let (new_map, changed) = v.map.substituted(map, store);
                if !changed {
                    self.clone()
                } else {
                    Ty::ClassVariant(Rc::new(ClassVariant::new(v.origin, new_map)))
                }
            }
            Ty::InterfaceVariant(v) => {
                let (new_map, changed) = v.map.substituted(map, store);
                if !changed {
                    self.clone()
                } else {
                    Ty::InterfaceVariant(Rc::new(InterfaceVariant::new(v.origin, new_map)))
                }
            }
        }
    }
}

impl TypeStore {
    /// Instantiates a generic class with concrete arguments; the map is
    /// total over the declared parameters from the start.
    pub fn parameterized_class(&self, origin: ClassId, args: &[Ty]) -> Ty {
        let generics = &self.class(origin).generics;
        debug_assert_eq!(generics.len(), args.len());
        let mut map = TypeMap::new();
        for (param, arg) in generics.iter().zip(args) {
            map.insert(*param, arg.clone());
        }
        Ty::ClassVariant(Rc::new(ClassVariant::new(origin, map)))
    }

    pub fn parameterized_interface(&self, origin: InterfaceId, args: &[Ty]) -> Ty {
        let generics = &self.interface(origin).generics;
        debug_assert_eq!(generics.len(), args.len());
        let mut map = TypeMap::new();
        for (param, arg) in generics.iter().zip(args) {
            map.insert(*param, arg.clone());
        }
        Ty::InterfaceVariant(Rc::new(InterfaceVariant::new(origin, map)))
    }
}
