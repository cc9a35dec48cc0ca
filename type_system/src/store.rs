//! The type store: arena for declared types, module registry, name lookup
//! and the member-resolution walks.
//!
//! Declared types are addressed by typed indices; all cross-references
//! (supertypes, member owners, variant origins) go through these handles,
//! so the graph is cycle-safe without ownership cycles. The store is built
//! single-threaded by the declaration pass, then queried read-only; a new
//! compilation pass constructs a new store.

use crate::{
    defs::{ClassDef, EnumDef, InterfaceDef, ParamDef},
    members::{DeclId, Field, Method, MethodHandle, Visibility},
    ty::{Ty, UsagePosition},
};
use diagnostics::{ErrorRecord, Range};
use log::{debug, warn};
use std::collections::HashMap;
use strtab::{StringTable, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u32);

/// Opaque handle to an executable method body, issued by the code
/// generator. The store only carries it from generated methods to
/// synthesized default-method copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(pub u32);

/// One compilation unit. Its error list is the sole channel back to the
/// user-facing layer; recoverable type errors never surface as `Err`.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub is_library: bool,
    pub types: Vec<Ty>,
    pub errors: Vec<ErrorRecord>,
}

/// A synthesized default-method copy waiting for its interface original's
/// body to exist.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DefaultBodyLink {
    pub(crate) target: MethodHandle,
    pub(crate) source: MethodHandle,
}

#[derive(Debug, Default)]
pub struct TypeStore {
    strtab: StringTable,
    modules: Vec<Module>,
    classes: Vec<ClassDef>,
    interfaces: Vec<InterfaceDef>,
    enums: Vec<EnumDef>,
    params: Vec<ParamDef>,
    by_name: HashMap<String, Ty>,
    pending_default_bodies: Vec<DefaultBodyLink>,
    root_class: Option<ClassId>,
    string_class: Option<ClassId>,
    enum_base_class: Option<ClassId>,
}

impl TypeStore {
    pub fn new() -> TypeStore {
        use crate::ty::PrimitiveKind;
        use strum::IntoEnumIterator;

        let mut store = TypeStore::default();
        store.strtab = StringTable::new();
        for kind in PrimitiveKind::iter() {
            store
                .by_name
                .insert(kind.to_string(), Ty::Primitive(kind));
        }
        store
    }

    pub fn intern(&mut self, value: &str) -> Symbol {
        self.strtab.intern(value)
    }

    pub fn wildcard_symbol(&self) -> Symbol {
        self.strtab.wildcard_symbol()
    }

    // ------------------------------------------------------------------
    // modules

    pub fn add_module(&mut self, name: &str, is_library: bool) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name: name.to_string(),
            is_library,
            types: Vec::new(),
            errors: Vec::new(),
        });
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    /// Renders a module's diagnostics for humans.
    pub fn write_diagnostics(
        &self,
        id: ModuleId,
        writer: &mut dyn termcolor::WriteColor,
    ) -> std::io::Result<()> {
        let module = self.module(id);
        diagnostics::write_records(writer, &module.name, &module.errors)
    }

    // ------------------------------------------------------------------
    // arena

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(def);
        id
    }

    pub fn add_interface(&mut self, def: InterfaceDef) -> InterfaceId {
        let id = InterfaceId(self.interfaces.len() as u32);
        self.interfaces.push(def);
        id
    }

    pub fn add_enum(&mut self, def: EnumDef) -> EnumId {
        let id = EnumId(self.enums.len() as u32);
        self.enums.push(def);
        id
    }

    pub fn add_param(&mut self, def: ParamDef) -> ParamId {
        let id = ParamId(self.params.len() as u32);
        self.params.push(def);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceDef {
        &self.interfaces[id.0 as usize]
    }

    pub fn interface_mut(&mut self, id: InterfaceId) -> &mut InterfaceDef {
        &mut self.interfaces[id.0 as usize]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0 as usize]
    }

    pub fn enum_def_mut(&mut self, id: EnumId) -> &mut EnumDef {
        &mut self.enums[id.0 as usize]
    }

    pub fn param(&self, id: ParamId) -> &ParamDef {
        &self.params[id.0 as usize]
    }

    pub fn param_mut(&mut self, id: ParamId) -> &mut ParamDef {
        &mut self.params[id.0 as usize]
    }

    // ------------------------------------------------------------------
    // name lookup

    /// Registers a declared type under its identifier. `false` means the
    /// name was already taken; the caller reports the redefinition and the
    /// first declaration stays visible.
    pub fn try_register(&mut self, name: &str, ty: Ty) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), ty);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Ty> {
        self.by_name.get(name)
    }

    pub(crate) fn set_root_class(&mut self, id: ClassId) {
        self.root_class = Some(id);
    }

    pub(crate) fn set_string_class(&mut self, id: ClassId) {
        self.string_class = Some(id);
    }

    pub(crate) fn set_enum_base_class(&mut self, id: ClassId) {
        self.enum_base_class = Some(id);
    }

    /// The universal root type every class chains to.
    pub fn root_class(&self) -> Option<ClassId> {
        self.root_class
    }

    pub fn string_class(&self) -> Option<ClassId> {
        self.string_class
    }

    pub fn enum_base_class(&self) -> Option<ClassId> {
        self.enum_base_class
    }

    pub(crate) fn is_root_class(&self, id: ClassId) -> bool {
        self.root_class == Some(id)
    }

    // ------------------------------------------------------------------
    // declaration-level accessors through member handles

    pub fn decl_identifier(&self, decl: DeclId) -> &Symbol {
        match decl {
            DeclId::Class(id) => &self.class(id).identifier,
            DeclId::Interface(id) => &self.interface(id).identifier,
            DeclId::Enum(id) => &self.enum_def(id).identifier,
        }
    }

    pub fn decl_module(&self, decl: DeclId) -> ModuleId {
        match decl {
            DeclId::Class(id) => self.class(id).module,
            DeclId::Interface(id) => self.interface(id).module,
            DeclId::Enum(id) => self.enum_def(id).module,
        }
    }

    pub fn decl_methods(&self, decl: DeclId) -> &[Method] {
        match decl {
            DeclId::Class(id) => &self.class(id).methods,
            DeclId::Interface(id) => &self.interface(id).methods,
            DeclId::Enum(id) => &self.enum_def(id).methods,
        }
    }

    pub fn method(&self, handle: MethodHandle) -> &Method {
        &self.decl_methods(handle.owner)[handle.index]
    }

    pub fn method_mut(&mut self, handle: MethodHandle) -> &mut Method {
        match handle.owner {
            DeclId::Class(id) => &mut self.class_mut(id).methods[handle.index],
            DeclId::Interface(id) => &mut self.interface_mut(id).methods[handle.index],
            DeclId::Enum(id) => &mut self.enum_def_mut(id).methods[handle.index],
        }
    }

    // ------------------------------------------------------------------
    // member resolution

    /// The fields an expression of this type exposes. Interfaces only
    /// contribute constants on the raw declaration; their generic variants
    /// stay empty, and type parameters borrow the fields of their first
    /// upper bound.
    pub fn fields_of<'a>(&'a self, ty: &'a Ty) -> &'a [Field] {
        match ty {
            Ty::Class(id) => &self.class(*id).fields,
            Ty::Enum(id) => &self.enum_def(*id).fields,
            Ty::Interface(id) => &self.interface(*id).fields,
            Ty::ClassVariant(v) => v.fields(self),
            Ty::TypeParam(id) => {
                let param = self.param(*id);
                param.fields_cache.get_or_init(|| match param.upper_bounds.first() {
                    Some(first) => self.fields_of(first).to_vec(),
                    None => Vec::new(),
                })
            }
            _ => &[],
        }
    }

    /// The direct superclass as seen from this type: substituted for
    /// variants, the base enum class for enums.
    pub fn extends_of<'a>(&'a self, ty: &'a Ty) -> Option<&'a Ty> {
        match ty {
            Ty::Class(id) => self.class(*id).extends(),
            Ty::ClassVariant(v) => v.extends_ty(self),
            Ty::Enum(id) => Some(&self.enum_def(*id).extends),
            _ => None,
        }
    }

    /// Directly implemented interfaces of a class-like or enum type.
    pub fn implements_of<'a>(&'a self, ty: &'a Ty) -> &'a [Ty] {
        match ty {
            Ty::Class(id) => self.class(*id).implements(),
            Ty::ClassVariant(v) => v.implements_tys(self),
            Ty::Enum(id) => self.enum_def(*id).implements(),
            _ => &[],
        }
    }

    /// Directly extended interfaces of an interface-like type.
    pub fn interface_extends_of<'a>(&'a self, ty: &'a Ty) -> &'a [Ty] {
        match ty {
            Ty::Interface(id) => self.interface(*id).extends(),
            Ty::InterfaceVariant(v) => v.extends_tys(self),
            _ => &[],
        }
    }

    /// Transitive closure of extended interfaces, in discovery order.
    pub fn all_extended_interfaces<'a>(&'a self, ty: &'a Ty) -> &'a [Ty] {
        match ty {
            Ty::Interface(id) => self.interface(*id).all_extended.get_or_init(|| {
                let mut out = Vec::new();
                for direct in self.interface(*id).extends() {
                    out.push(direct.clone());
                    out.extend(self.all_extended_interfaces(direct).iter().cloned());
                }
                out
            }),
            Ty::InterfaceVariant(v) => v.all_extended_tys(self),
            _ => &[],
        }
    }

    pub fn own_methods_of<'a>(&'a self, ty: &'a Ty) -> &'a [Method] {
        match ty {
            Ty::Class(id) => &self.class(*id).methods,
            Ty::Interface(id) => &self.interface(*id).methods,
            Ty::Enum(id) => &self.enum_def(*id).methods,
            Ty::ClassVariant(v) => v.methods(self),
            Ty::InterfaceVariant(v) => v.methods(self),
            Ty::TypeParam(id) => {
                let param = self.param(*id);
                param.methods_cache.get_or_init(|| {
                    let mut out = Vec::new();
                    for upper in &param.upper_bounds {
                        out.extend(self.all_methods_of(upper).into_iter().cloned());
                    }
                    out
                })
            }
            _ => &[],
        }
    }

    /// All methods in resolution order: own methods come first, then the
    /// supertype chain's, so the first signature match wins; this ordering
    /// *is* the override-resolution rule.
    pub fn all_methods_of<'a>(&'a self, ty: &'a Ty) -> Vec<&'a Method> {
        let mut out: Vec<&Method> = self.own_methods_of(ty).iter().collect();
        match ty {
            Ty::Class(_) | Ty::ClassVariant(_) | Ty::Enum(_) => {
                if let Some(superclass) = self.extends_of(ty) {
                    out.extend(self.all_methods_of(superclass));
                }
            }
            Ty::Interface(_) | Ty::InterfaceVariant(_) => {
                for extended in self.interface_extends_of(ty) {
                    out.extend(self.all_methods_of(extended));
                }
            }
            _ => {}
        }
        out
    }

    /// Flattened inherited methods, first occurrence of each dispatch
    /// signature wins.
    pub fn all_inherited_methods<'a>(&'a self, ty: &'a Ty) -> Vec<&'a Method> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for method in self.all_methods_of(ty) {
            let key = method
                .internal_name(crate::members::CallingConvention::Java, self)
                .to_string();
            if seen.insert(key) {
                out.push(method);
            }
        }
        out
    }

    /// Field lookup with Java's visibility rule: private members are not
    /// inherited, but the search must not dead-end at the first hop, so
    /// the ceiling widens `private` to `protected` before recursing upwards.
    pub fn field<'a>(
        &'a self,
        ty: &'a Ty,
        identifier: &str,
        ceiling: Visibility,
        static_only: bool,
    ) -> Option<&'a Field> {
        let own = self.fields_of(ty).iter().find(|f| {
            f.identifier == identifier && f.visibility <= ceiling && (f.is_static || !static_only)
        });
        if own.is_some() {
            return own;
        }

        let ceiling = if ceiling == Visibility::Private {
            Visibility::Protected
        } else {
            ceiling
        };

        match ty {
            Ty::Class(_) | Ty::ClassVariant(_) | Ty::Enum(_) => self
                .extends_of(ty)
                .and_then(|superclass| self.field(superclass, identifier, ceiling, static_only)),
            Ty::Interface(_) | Ty::InterfaceVariant(_) => self
                .interface_extends_of(ty)
                .iter()
                .find_map(|extended| self.field(extended, identifier, ceiling, static_only)),
            _ => None,
        }
    }

    /// Candidate methods for call resolution. Interfaces have no
    /// constructors to offer.
    pub fn possible_methods<'a>(
        &'a self,
        ty: &'a Ty,
        identifier: &str,
        is_constructor: bool,
        static_only: bool,
    ) -> Vec<&'a Method> {
        if is_constructor && matches!(ty, Ty::Interface(_) | Ty::InterfaceVariant(_)) {
            return Vec::new();
        }
        self.all_methods_of(ty)
            .into_iter()
            .filter(|m| {
                m.identifier == identifier
                    && m.is_constructor == is_constructor
                    && (m.is_static || !static_only)
            })
            .collect()
    }

    /// Transitive search through interface extension, including the
    /// starting interface itself.
    pub fn find_implemented_interface<'a>(
        &'a self,
        ty: &'a Ty,
        identifier: &str,
    ) -> Option<&'a Ty> {
        match ty.origin_interface() {
            Some(origin) if self.interface(origin).identifier == identifier => Some(ty),
            Some(_) => self
                .interface_extends_of(ty)
                .iter()
                .find_map(|extended| self.find_implemented_interface(extended, identifier)),
            None => None,
        }
    }

    /// Does `class` have `ancestor` in its superclass chain (or is it)?
    /// Generic variants collapse to their origins; the walk is bounded by
    /// a visited set so malformed inputs cannot loop.
    pub fn has_ancestor_or_is(&self, class: ClassId, ancestor: DeclId) -> bool {
        let mut visited = std::collections::HashSet::new();
        let mut current = Some(class);
        while let Some(id) = current {
            if !visited.insert(id) {
                return false;
            }
            if DeclId::Class(id) == ancestor {
                return true;
            }
            current = self.class(id).extends().and_then(|e| e.origin_class());
        }
        false
    }

    // ------------------------------------------------------------------
    // usage positions (write-only IDE support)

    pub fn register_usage(&mut self, ty: &Ty, module: ModuleId, range: Range) {
        let usage = UsagePosition { module, range };
        match ty {
            Ty::Array(arr) => {
                let element = arr.element.clone();
                self.register_usage(&element, module, range);
            }
            Ty::TypeParam(id) => self.param_mut(*id).usages.push(usage),
            _ => match ty.decl_id() {
                Some(DeclId::Class(id)) => self.class_mut(id).usages.push(usage),
                Some(DeclId::Interface(id)) => self.interface_mut(id).usages.push(usage),
                Some(DeclId::Enum(id)) => self.enum_def_mut(id).usages.push(usage),
                None => {}
            },
        }
    }

    /// Reset of the transient IDE-facing state before a pass reruns on a
    /// reused graph. Does not touch castability or member-resolution state.
    pub fn clear_usage_positions(&mut self) {
        debug!("clearing usage positions");
        for class in &mut self.classes {
            class.usages.clear();
        }
        for interface in &mut self.interfaces {
            interface.usages.clear();
        }
        for enum_def in &mut self.enums {
            enum_def.usages.clear();
        }
        for param in &mut self.params {
            param.usages.clear();
        }
    }

    // ------------------------------------------------------------------
    // body attachment (code generator boundary)

    pub fn set_method_body(&mut self, handle: MethodHandle, body: BodyId) {
        self.method_mut(handle).body = Some(body);
    }

    pub(crate) fn defer_default_body(&mut self, target: MethodHandle, source: MethodHandle) {
        self.pending_default_bodies.push(DefaultBodyLink { target, source });
    }

    /// Invoked by the code generator once method bodies exist: every
    /// synthesized default-method copy takes over its interface original's
    /// body. The copy and the original stay distinct methods sharing one
    /// body.
    pub fn attach_generated_bodies(&mut self) {
        let links: Vec<DefaultBodyLink> = self.pending_default_bodies.drain(..).collect();
        for link in links {
            match self.method(link.source).body {
                Some(body) => self.method_mut(link.target).body = Some(body),
                None => warn!(
                    "default method '{}' has no generated body to share",
                    self.method(link.source).identifier
                ),
            }
        }
    }
}
