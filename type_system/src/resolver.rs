//! The declaration/resolution passes: from parser records to a checked
//! type graph.
//!
//! Pass order matters: skeletons with their generic parameters exist before
//! any type reference resolves, supertypes and bounds resolve before
//! members, and the inheritance contracts run last, when every member list
//! is complete. Superclass and interface-extension cycles are cut (with a
//! structural error) before anything walks the graph.

use crate::{
    decl::{ClassDecl, EnumDecl, GenericParamDecl, InterfaceDecl, MethodDecl, TypeDecl, TypeNode},
    defs::{ClassDef, EnumDef, InterfaceDef, ParamDef},
    errors::SemanticError,
    members::{DeclId, Field, Method, Parameter},
    store::{ClassId, EnumId, InterfaceId, ModuleId, ParamId, TypeStore},
    ty::Ty,
};
use diagnostics::Range;
use log::debug;
use std::collections::HashSet;
use std::mem;

pub fn resolve(store: &mut TypeStore, module: ModuleId, decls: Vec<TypeDecl>) {
    TypeResolver {
        store,
        module,
        classes: Vec::new(),
        interfaces: Vec::new(),
        enums: Vec::new(),
    }
    .run(decls)
}

struct TypeResolver<'ts> {
    store: &'ts mut TypeStore,
    module: ModuleId,
    classes: Vec<(ClassId, ClassDecl)>,
    interfaces: Vec<(InterfaceId, InterfaceDecl)>,
    enums: Vec<(EnumId, EnumDecl)>,
}

impl<'ts> TypeResolver<'ts> {
    fn run(mut self, decls: Vec<TypeDecl>) {
        debug!(
            "resolving {} declaration(s) of module '{}'",
            decls.len(),
            self.store.module(self.module).name
        );
        self.create_skeletons(decls);
        self.resolve_supertypes_and_bounds();
        self.cut_inheritance_cycles();
        self.build_members();
        self.check_contracts();
    }

    fn report(&mut self, range: Range, error: &SemanticError) {
        self.store.report(self.module, range, error);
    }

    fn root_ty(&self) -> Ty {
        match self.store.root_class() {
            Some(root) => Ty::Class(root),
            None => Ty::Null,
        }
    }

    // ------------------------------------------------------------------
    // pass 1: skeletons with declared generic parameters

    fn create_skeletons(&mut self, decls: Vec<TypeDecl>) {
        for decl in decls {
            match decl {
                TypeDecl::Class(class_decl) => self.create_class_skeleton(class_decl),
                TypeDecl::Interface(interface_decl) => {
                    self.create_interface_skeleton(interface_decl)
                }
                TypeDecl::Enum(enum_decl) => self.create_enum_skeleton(enum_decl),
            }
        }
    }

    fn create_generic_params(&mut self, decls: &[GenericParamDecl]) -> Vec<ParamId> {
        decls
            .iter()
            .map(|gp| {
                let sym = self.store.intern(&gp.identifier);
                self.store
                    .add_param(ParamDef::new(sym, gp.range, self.module))
            })
            .collect()
    }

    fn register(&mut self, kind: &str, identifier: &str, range: Range, ty: Ty) {
        if !self.store.try_register(identifier, ty.clone()) {
            self.report(
                range,
                &SemanticError::RedefinitionError {
                    kind: kind.to_string(),
                    name: identifier.to_string(),
                },
            );
        }
        self.store.module_mut(self.module).types.push(ty);
    }

    fn create_class_skeleton(&mut self, decl: ClassDecl) {
        let sym = self.store.intern(&decl.identifier);
        let mut def = ClassDef::new(sym, decl.range, self.module);
        def.visibility = decl.visibility;
        def.is_static = decl.is_static;
        def.is_abstract = decl.is_abstract;
        def.is_final = decl.is_final;
        def.generics = self.create_generic_params(&decl.generics);

        let id = self.store.add_class(def);
        self.register("class", &decl.identifier, decl.range, Ty::Class(id));
        self.classes.push((id, decl));
    }

    fn create_interface_skeleton(&mut self, decl: InterfaceDecl) {
        let sym = self.store.intern(&decl.identifier);
        let mut def = InterfaceDef::new(sym, decl.range, self.module);
        def.visibility = decl.visibility;
        def.generics = self.create_generic_params(&decl.generics);

        let id = self.store.add_interface(def);
        self.register("interface", &decl.identifier, decl.range, Ty::Interface(id));
        self.interfaces.push((id, decl));
    }

    fn create_enum_skeleton(&mut self, decl: EnumDecl) {
        let base = match self.store.enum_base_class().or_else(|| self.store.root_class()) {
            Some(base) => base,
            None => {
                self.report(
                    decl.range,
                    &SemanticError::UnknownType {
                        name: "Enum".to_string(),
                    },
                );
                return;
            }
        };
        let sym = self.store.intern(&decl.identifier);
        let mut def = EnumDef::new(sym, decl.range, self.module, base);
        def.visibility = decl.visibility;

        let id = self.store.add_enum(def);
        self.register("enum", &decl.identifier, decl.range, Ty::Enum(id));
        self.enums.push((id, decl));
    }

    // ------------------------------------------------------------------
    // type reference resolution

    /// Every wildcard occurrence is its own fresh type parameter named `?`,
    /// carrying the bounds written at the use site.
    fn resolve_wildcard(&mut self, node: &TypeNode, scope: &[ParamId]) -> Ty {
        let sym = self.store.wildcard_symbol();
        let param = self
            .store
            .add_param(ParamDef::new(sym, node.range, self.module));
        for upper in &node.wildcard_upper {
            match self.resolve_type_node(upper, scope) {
                Some(ty) if ty.origin_class().is_some() || ty.origin_interface().is_some() => {
                    self.store.param_mut(param).upper_bounds.push(ty);
                }
                Some(_) => self.report(upper.range, &SemanticError::UpperBoundMustBeClassOrInterface),
                None => {}
            }
        }
        if let Some(lower) = &node.wildcard_lower {
            match self.resolve_type_node(lower, scope) {
                Some(ty) if ty.origin_class().is_some() => {
                    self.store.param_mut(param).lower_bound = Some(ty);
                }
                Some(_) => self.report(lower.range, &SemanticError::LowerBoundMustBeClass),
                None => {}
            }
        }
        Ty::TypeParam(param)
    }

    fn find_primary(&mut self, node: &TypeNode, scope: &[ParamId]) -> Option<Ty> {
        if node.identifier == "?" {
            return Some(self.resolve_wildcard(node, scope));
        }
        // innermost generic parameters shadow outer ones
        for param in scope.iter().rev() {
            if self.store.param(*param).identifier == node.identifier.as_str() {
                return Some(Ty::TypeParam(*param));
            }
        }
        if let Some(ty) = self.store.lookup(&node.identifier) {
            return Some(ty.clone());
        }
        self.report(
            node.range,
            &SemanticError::UnknownType {
                name: node.identifier.clone(),
            },
        );
        None
    }

    fn resolve_type_args(&mut self, node: &TypeNode, scope: &[ParamId]) -> Vec<Ty> {
        node.type_args
            .iter()
            .map(|arg| match self.resolve_type_node(arg, scope) {
                Some(ty) if ty.is_primitive() => {
                    self.report(arg.range, &SemanticError::PrimitiveTypeArgument);
                    self.root_ty()
                }
                Some(ty) => ty,
                None => self.root_ty(),
            })
            .collect()
    }

    fn resolve_type_node(&mut self, node: &TypeNode, scope: &[ParamId]) -> Option<Ty> {
        let mut ty = self.find_primary(node, scope)?;

        if !node.type_args.is_empty() {
            let declared = match &ty {
                Ty::Class(id) => self.store.class(*id).generics.len(),
                Ty::Interface(id) => self.store.interface(*id).generics.len(),
                _ => 0,
            };
            if declared == 0 {
                self.report(
                    node.range,
                    &SemanticError::NotGeneric {
                        name: node.identifier.clone(),
                    },
                );
            } else if declared != node.type_args.len() {
                self.report(
                    node.range,
                    &SemanticError::GenericArityMismatch {
                        name: node.identifier.clone(),
                        declared,
                        given: node.type_args.len(),
                    },
                );
            } else {
                let args = self.resolve_type_args(node, scope);
                ty = match &ty {
                    Ty::Class(id) => self.store.parameterized_class(*id, &args),
                    Ty::Interface(id) => self.store.parameterized_interface(*id, &args),
                    _ => unreachable!("declared > 0 only for classes and interfaces"),
                };
            }
        }

        if node.array_dims > 0 {
            ty = Ty::array(ty, node.array_dims);
        }
        Some(ty)
    }

    /// Best-effort resolution: unresolvable references fall back to the
    /// root type so downstream passes still have a structure to walk.
    fn resolve_or_root(&mut self, node: &TypeNode, scope: &[ParamId]) -> Ty {
        self.resolve_type_node(node, scope)
            .unwrap_or_else(|| self.root_ty())
    }

    // ------------------------------------------------------------------
    // pass 2: bounds, extends, implements

    fn resolve_bounds(&mut self, params: &[ParamId], decls: &[GenericParamDecl], scope: &[ParamId]) {
        for (param, decl) in params.iter().zip(decls) {
            for upper in &decl.upper_bounds {
                match self.resolve_type_node(upper, scope) {
                    Some(ty)
                        if ty.origin_class().is_some() || ty.origin_interface().is_some() =>
                    {
                        self.store.param_mut(*param).upper_bounds.push(ty);
                    }
                    Some(_) => {
                        self.report(upper.range, &SemanticError::UpperBoundMustBeClassOrInterface)
                    }
                    None => {}
                }
            }
            if let Some(lower) = &decl.lower_bound {
                match self.resolve_type_node(lower, scope) {
                    Some(ty) if ty.origin_class().is_some() => {
                        self.store.param_mut(*param).lower_bound = Some(ty);
                    }
                    Some(_) => self.report(lower.range, &SemanticError::LowerBoundMustBeClass),
                    None => {}
                }
            }
        }
    }

    fn resolve_supertypes_and_bounds(&mut self) {
        let classes = mem::take(&mut self.classes);
        for (id, decl) in &classes {
            let scope = self.store.class(*id).generics.clone();
            self.resolve_bounds(&scope, &decl.generics, &scope);

            if let Some(extends_node) = &decl.extends {
                match self.resolve_type_node(extends_node, &scope) {
                    Some(ty) if ty.origin_class().is_some() => {
                        self.store.class_mut(*id).set_extends(ty);
                    }
                    Some(_) => self.report(extends_node.range, &SemanticError::ExtendsMustBeClass),
                    None => {}
                }
            }
            if self.store.class(*id).extends().is_none() && self.store.root_class() != Some(*id) {
                if let Some(root) = self.store.root_class() {
                    self.store.class_mut(*id).set_extends(Ty::Class(root));
                }
            }

            for implements_node in &decl.implements {
                match self.resolve_type_node(implements_node, &scope) {
                    Some(ty) if ty.origin_interface().is_some() => {
                        self.store.class_mut(*id).add_implements(ty);
                    }
                    Some(_) => {
                        self.report(implements_node.range, &SemanticError::ImplementsMustBeInterface)
                    }
                    None => {}
                }
            }
        }
        self.classes = classes;

        let interfaces = mem::take(&mut self.interfaces);
        for (id, decl) in &interfaces {
            let scope = self.store.interface(*id).generics.clone();
            self.resolve_bounds(&scope, &decl.generics, &scope);

            for extends_node in &decl.extends {
                match self.resolve_type_node(extends_node, &scope) {
                    Some(ty) if ty.origin_interface().is_some() => {
                        self.store.interface_mut(*id).add_extends(ty);
                    }
                    Some(_) => self
                        .report(extends_node.range, &SemanticError::InterfaceExtendsMustBeInterface),
                    None => {}
                }
            }
        }
        self.interfaces = interfaces;

        let enums = mem::take(&mut self.enums);
        for (id, decl) in &enums {
            for implements_node in &decl.implements {
                match self.resolve_type_node(implements_node, &[]) {
                    Some(ty) if ty.origin_interface().is_some() => {
                        self.store.enum_def_mut(*id).add_implements(ty);
                    }
                    Some(_) => {
                        self.report(implements_node.range, &SemanticError::ImplementsMustBeInterface)
                    }
                    None => {}
                }
            }
        }
        self.enums = enums;
    }

    // ------------------------------------------------------------------
    // cycle rejection

    fn class_in_extends_cycle(&self, class: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self
            .store
            .class(class)
            .extends()
            .and_then(|e| e.origin_class());
        while let Some(id) = current {
            if id == class {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.store.class(id).extends().and_then(|e| e.origin_class());
        }
        false
    }

    fn interface_reaches(&self, from: InterfaceId, target: InterfaceId, visited: &mut HashSet<InterfaceId>) -> bool {
        if from == target {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        self.store
            .interface(from)
            .extends()
            .iter()
            .filter_map(|e| e.origin_interface())
            .collect::<Vec<_>>()
            .into_iter()
            .any(|origin| self.interface_reaches(origin, target, visited))
    }

    /// A superclass chain revisiting a type is a structural error; the
    /// offending edge is replaced by the root class so every walk still
    /// terminates there.
    fn cut_inheritance_cycles(&mut self) {
        let classes: Vec<ClassId> = self.classes.iter().map(|(id, _)| *id).collect();
        for id in classes {
            if self.class_in_extends_cycle(id) {
                let name = self.store.class(id).identifier.to_string();
                let range = self.store.class(id).range;
                self.report(range, &SemanticError::CyclicInheritance { name });
                self.store.class_mut(id).clear_extends();
                if self.store.root_class() != Some(id) {
                    let root = self.root_ty();
                    if let Ty::Class(_) = root {
                        self.store.class_mut(id).set_extends(root);
                    }
                }
            }
        }

        let interfaces: Vec<InterfaceId> = self.interfaces.iter().map(|(id, _)| *id).collect();
        for id in interfaces {
            let mut reported = false;
            let mut index = 0;
            while index < self.store.interface(id).extends().len() {
                let origin = self.store.interface(id).extends()[index].origin_interface();
                let cyclic = match origin {
                    Some(origin) => {
                        let mut visited = HashSet::new();
                        self.interface_reaches(origin, id, &mut visited)
                    }
                    None => false,
                };
                if cyclic {
                    if !reported {
                        let name = self.store.interface(id).identifier.to_string();
                        let range = self.store.interface(id).range;
                        self.report(range, &SemanticError::CyclicInheritance { name });
                        reported = true;
                    }
                    self.store.interface_mut(id).remove_extends(index);
                } else {
                    index += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // pass 3: members

    fn build_method(&mut self, decl: &MethodDecl, owner: DeclId, outer_scope: &[ParamId]) -> Method {
        let sym = self.store.intern(&decl.identifier);
        let mut method = Method::new(sym, decl.range, decl.visibility, owner);
        method.is_static = decl.is_static;
        method.is_final = decl.is_final;
        method.is_abstract = decl.is_abstract;
        method.is_default = decl.is_default;
        method.is_constructor = decl.is_constructor;

        method.generics = self.create_generic_params(&decl.generics);
        let mut scope: Vec<ParamId> = outer_scope.to_vec();
        scope.extend(&method.generics);
        let generics = method.generics.clone();
        self.resolve_bounds(&generics, &decl.generics, &scope);

        for param_decl in &decl.params {
            // parameters with unresolvable types are dropped, the error is
            // already on the module
            if let Some(ty) = self.resolve_type_node(&param_decl.ty, &scope) {
                let param_sym = self.store.intern(&param_decl.identifier);
                let mut parameter = Parameter::new(param_sym, param_decl.range, ty);
                parameter.is_final = param_decl.is_final;
                parameter.is_ellipsis = param_decl.is_ellipsis;
                method.parameters.push(parameter);
            }
        }
        method.return_ty = decl
            .return_ty
            .as_ref()
            .map(|node| self.resolve_or_root(node, &scope));
        method
    }

    fn build_field(&mut self, decl: &crate::decl::FieldDecl, owner: DeclId, scope: &[ParamId]) -> Field {
        let ty = self.resolve_or_root(&decl.ty, scope);
        let sym = self.store.intern(&decl.identifier);
        let mut field = Field::new(sym, decl.range, ty, decl.visibility, owner);
        field.is_static = decl.is_static;
        field.is_final = decl.is_final;
        field
    }

    fn report_member_redefinition(&mut self, kind: &str, name: &str, range: Range) {
        self.report(
            range,
            &SemanticError::RedefinitionError {
                kind: kind.to_string(),
                name: name.to_string(),
            },
        );
    }

    fn build_members(&mut self) {
        let classes = mem::take(&mut self.classes);
        for (id, decl) in &classes {
            let scope = self.store.class(*id).generics.clone();
            for field_decl in &decl.fields {
                let field = self.build_field(field_decl, DeclId::Class(*id), &scope);
                if self.store.class_mut(*id).add_field(field).is_err() {
                    self.report_member_redefinition("field", &field_decl.identifier, field_decl.range);
                }
            }
            for method_decl in &decl.methods {
                let method = self.build_method(method_decl, DeclId::Class(*id), &scope);
                self.store.class_mut(*id).add_method(method);
            }
        }
        self.classes = classes;

        let interfaces = mem::take(&mut self.interfaces);
        for (id, decl) in &interfaces {
            let scope = self.store.interface(*id).generics.clone();
            for field_decl in &decl.fields {
                let field = self.build_field(field_decl, DeclId::Interface(*id), &scope);
                if self.store.interface_mut(*id).add_field(field).is_err() {
                    self.report_member_redefinition("field", &field_decl.identifier, field_decl.range);
                }
            }
            for method_decl in &decl.methods {
                let mut method = self.build_method(method_decl, DeclId::Interface(*id), &scope);
                // interface methods without a default body are abstract
                if !method.is_default && !method.is_static && !method.is_constructor {
                    method.is_abstract = true;
                }
                self.store.interface_mut(*id).add_method(method);
            }
        }
        self.interfaces = interfaces;

        let enums = mem::take(&mut self.enums);
        for (id, decl) in &enums {
            for field_decl in &decl.fields {
                let field = self.build_field(field_decl, DeclId::Enum(*id), &[]);
                if self.store.enum_def_mut(*id).add_field(field).is_err() {
                    self.report_member_redefinition("field", &field_decl.identifier, field_decl.range);
                }
            }
            for method_decl in &decl.methods {
                let method = self.build_method(method_decl, DeclId::Enum(*id), &[]);
                self.store.enum_def_mut(*id).add_method(method);
            }
            self.add_enum_constants_and_helpers(*id, decl);
        }
        self.enums = enums;
    }

    /// Each declared constant compiles to a `public static final` field of
    /// the enum type; `values()` and `valueOf(String)` come with a native
    /// implementation.
    fn add_enum_constants_and_helpers(&mut self, id: EnumId, decl: &EnumDecl) {
        for (value, range) in &decl.values {
            let sym = self.store.intern(value);
            let mut field = Field::new(
                sym,
                *range,
                Ty::Enum(id),
                crate::members::Visibility::Public,
                DeclId::Enum(id),
            );
            field.is_static = true;
            field.is_final = true;
            if self.store.enum_def_mut(id).add_field(field).is_err() {
                self.report_member_redefinition("enum constant", value, *range);
            }
        }

        let values_sym = self.store.intern("values");
        let mut values = Method::new(
            values_sym,
            Range::EMPTY,
            crate::members::Visibility::Public,
            DeclId::Enum(id),
        );
        values.is_static = true;
        values.has_native_implementation = true;
        values.return_ty = Some(Ty::array(Ty::Enum(id), 1));
        self.store.enum_def_mut(id).add_method(values);

        let value_of_sym = self.store.intern("valueOf");
        let mut value_of = Method::new(
            value_of_sym,
            Range::EMPTY,
            crate::members::Visibility::Public,
            DeclId::Enum(id),
        );
        value_of.is_static = true;
        value_of.has_native_implementation = true;
        value_of.return_ty = Some(Ty::Enum(id));
        let name_sym = self.store.intern("name");
        let name_ty = match self.store.string_class() {
            Some(string) => Ty::Class(string),
            None => self.root_ty(),
        };
        value_of
            .parameters
            .push(Parameter::new(name_sym, Range::EMPTY, name_ty));
        self.store.enum_def_mut(id).add_method(value_of);
    }

    // ------------------------------------------------------------------
    // pass 4: inheritance contracts

    fn check_contracts(&mut self) {
        let classes: Vec<ClassId> = self.classes.iter().map(|(id, _)| *id).collect();
        for id in classes {
            self.store.check_class_contracts(id);
        }
    }
}
