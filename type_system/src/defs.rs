//! Declared types: classes, interfaces, enums and generic type parameters.
//!
//! Skeletons are created by the declaration pass with empty member lists;
//! generic parameters, supertypes and members are attached through the
//! methods here. Library types are manufactured through the same calls, so
//! nothing downstream can tell user code and library code apart.

use crate::{
    members::{Field, Method},
    store::{ClassId, ModuleId, ParamId},
    ty::{Ty, UsagePosition},
};
use diagnostics::Range;
use once_cell::unsync::OnceCell;
use strtab::Symbol;

#[derive(Debug)]
pub struct MemberAlreadyDeclared;

#[derive(Debug)]
pub struct ClassDef {
    pub identifier: Symbol,
    pub range: Range,
    pub module: ModuleId,
    pub visibility: crate::members::Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub generics: Vec<ParamId>,
    extends: Option<Ty>,
    implements: Vec<Ty>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub usages: Vec<UsagePosition>,
}

impl ClassDef {
    pub fn new(identifier: Symbol, range: Range, module: ModuleId) -> ClassDef {
        ClassDef {
            identifier,
            range,
            module,
            visibility: crate::members::Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            generics: Vec::new(),
            extends: None,
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            usages: Vec::new(),
        }
    }

    /// At most one direct superclass; the root class keeps `None`.
    pub fn set_extends(&mut self, superclass: Ty) {
        debug_assert!(superclass.origin_class().is_some());
        self.extends = Some(superclass);
    }

    pub(crate) fn clear_extends(&mut self) {
        self.extends = None;
    }

    pub fn extends(&self) -> Option<&Ty> {
        self.extends.as_ref()
    }

    pub fn add_implements(&mut self, interface: Ty) {
        debug_assert!(interface.origin_interface().is_some());
        self.implements.push(interface);
    }

    pub fn implements(&self) -> &[Ty] {
        &self.implements
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), MemberAlreadyDeclared> {
        if self.fields.iter().any(|f| f.identifier == field.identifier) {
            return Err(MemberAlreadyDeclared);
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}

#[derive(Debug)]
pub struct InterfaceDef {
    pub identifier: Symbol,
    pub range: Range,
    pub module: ModuleId,
    pub visibility: crate::members::Visibility,
    pub generics: Vec<ParamId>,
    extends: Vec<Ty>,
    /// Interface fields are constants: implicitly `static final`.
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub usages: Vec<UsagePosition>,
    pub(crate) all_extended: OnceCell<Vec<Ty>>,
}

impl InterfaceDef {
    pub fn new(identifier: Symbol, range: Range, module: ModuleId) -> InterfaceDef {
        InterfaceDef {
            identifier,
            range,
            module,
            visibility: crate::members::Visibility::Public,
            generics: Vec::new(),
            extends: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            usages: Vec::new(),
            all_extended: OnceCell::new(),
        }
    }

    pub fn add_extends(&mut self, interface: Ty) {
        debug_assert!(interface.origin_interface().is_some());
        self.extends.push(interface);
    }

    pub(crate) fn remove_extends(&mut self, index: usize) {
        self.extends.remove(index);
    }

    pub fn extends(&self) -> &[Ty] {
        &self.extends
    }

    pub fn add_field(&mut self, mut field: Field) -> Result<(), MemberAlreadyDeclared> {
        field.is_static = true;
        field.is_final = true;
        if self.fields.iter().any(|f| f.identifier == field.identifier) {
            return Err(MemberAlreadyDeclared);
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }

    /// An interface with exactly one own method can be the target of a
    /// lambda literal.
    pub fn is_functional(&self) -> bool {
        self.methods.len() == 1
    }
}

#[derive(Debug)]
pub struct EnumDef {
    pub identifier: Symbol,
    pub range: Range,
    pub module: ModuleId,
    pub visibility: crate::members::Visibility,
    /// Nested enum types are implicitly static.
    pub is_static: bool,
    pub base_class: ClassId,
    /// The implicit superclass, always the library `Enum` base class.
    pub(crate) extends: Ty,
    implements: Vec<Ty>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub usages: Vec<UsagePosition>,
}

impl EnumDef {
    pub fn new(identifier: Symbol, range: Range, module: ModuleId, base_class: ClassId) -> EnumDef {
        EnumDef {
            identifier,
            range,
            module,
            visibility: crate::members::Visibility::Public,
            is_static: true,
            base_class,
            extends: Ty::Class(base_class),
            implements: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            usages: Vec::new(),
        }
    }

    pub fn add_implements(&mut self, interface: Ty) {
        debug_assert!(interface.origin_interface().is_some());
        self.implements.push(interface);
    }

    pub fn implements(&self) -> &[Ty] {
        &self.implements
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), MemberAlreadyDeclared> {
        if self.fields.iter().any(|f| f.identifier == field.identifier) {
            return Err(MemberAlreadyDeclared);
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}

/// A bound type variable or wildcard. Wildcards share the identifier `?`.
///
/// Upper bounds: `T extends B1 & B2 & ...`: `B1` may be a class or an
/// interface, the rest only interfaces. Lower bound: `? super B`.
///
/// Inference candidates gathered while checking a call are *not* stored
/// here; they live in the per-call `InferenceContext`.
#[derive(Debug)]
pub struct ParamDef {
    pub identifier: Symbol,
    pub range: Range,
    pub module: ModuleId,
    pub upper_bounds: Vec<Ty>,
    pub lower_bound: Option<Ty>,
    pub is_wildcard: bool,
    pub usages: Vec<UsagePosition>,
    pub(crate) fields_cache: OnceCell<Vec<Field>>,
    pub(crate) methods_cache: OnceCell<Vec<Method>>,
}

impl ParamDef {
    pub fn new(identifier: Symbol, range: Range, module: ModuleId) -> ParamDef {
        let is_wildcard = identifier == "?";
        ParamDef {
            identifier,
            range,
            module,
            upper_bounds: Vec::new(),
            lower_bound: None,
            is_wildcard,
            usages: Vec::new(),
            fields_cache: OnceCell::new(),
            methods_cache: OnceCell::new(),
        }
    }
}
