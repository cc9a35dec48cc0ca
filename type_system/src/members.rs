//! The member model: fields, methods, parameters and their visibility.
//!
//! Members carry a non-owning handle to the declaration they belong to.
//! Substitution copies a member only when one of its types actually changes
//! (see `subst`); a substituted method keeps its origin's dispatch name so
//! generic-parameter-derived names survive across substitution boundaries.

use crate::{
    store::{BodyId, ClassId, EnumId, InterfaceId, ParamId, TypeStore},
    subst::TypeMap,
    ty::Ty,
};
use derive_more::{Display, From};
use diagnostics::Range;
use itertools::Itertools;
use once_cell::unsync::OnceCell;
use strtab::Symbol;

/// Ordered so that a visibility ceiling check reads
/// `member.visibility <= ceiling`: a `Private` ceiling sees everything, a
/// `Public` ceiling only public members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum Visibility {
    #[display(fmt = "public")]
    Public,
    #[display(fmt = "protected")]
    Protected,
    #[display(fmt = "private")]
    Private,
}

/// Methods with a native implementation bypass the interpreter's stack
/// discipline; the distinction is baked into internal names so dynamic
/// dispatch picks the right stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    Java,
    Native,
}

impl Default for Visibility {
    fn default() -> Visibility {
        Visibility::Public
    }
}

impl CallingConvention {
    fn shorthand(self) -> char {
        match self {
            CallingConvention::Java => 'j',
            CallingConvention::Native => 'n',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            CallingConvention::Java => 0,
            CallingConvention::Native => 1,
        }
    }
}

/// Handle to the declaration a member belongs to. Non-owning by design:
/// members sit inside the arena entry they were declared on, variants hold
/// substituted copies that still point at the origin declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum DeclId {
    Class(ClassId),
    Interface(InterfaceId),
    Enum(EnumId),
}

/// Addresses one method inside its owning declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodHandle {
    pub owner: DeclId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub identifier: Symbol,
    pub range: Range,
    pub ty: Ty,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub owner: DeclId,
    internal_name: OnceCell<String>,
}

impl Field {
    pub fn new(identifier: Symbol, range: Range, ty: Ty, visibility: Visibility, owner: DeclId) -> Field {
        Field {
            identifier,
            range,
            ty,
            visibility,
            is_static: false,
            is_final: false,
            owner,
            internal_name: OnceCell::new(),
        }
    }

    /// Storage key of the field on runtime objects. Fields shadowing a
    /// superclass field of the same name get one `_` prefix per shadowed
    /// ancestor so both slots coexist on the object.
    pub fn internal_name(&self, store: &TypeStore) -> &str {
        self.internal_name.get_or_init(|| {
            let mut name = self.identifier.to_string();
            if let DeclId::Class(class) = self.owner {
                let mut parent = store.class(class).extends().cloned();
                while let Some(sup) = parent {
                    if store
                        .fields_of(&sup)
                        .iter()
                        .any(|f| f.identifier == self.identifier)
                    {
                        name.insert(0, '_');
                    }
                    parent = store.extends_of(&sup).cloned();
                }
            }
            name
        })
    }

    pub(crate) fn substituted(&self, map: &TypeMap, store: &TypeStore) -> Field {
        let new_ty = self.ty.substituted(map, store);
        if new_ty == self.ty {
            return self.clone();
        }
        Field {
            ty: new_ty,
            internal_name: self.internal_name.clone(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub identifier: Symbol,
    pub range: Range,
    pub ty: Ty,
    pub is_final: bool,
    pub is_ellipsis: bool,
}

impl Parameter {
    pub fn new(identifier: Symbol, range: Range, ty: Ty) -> Parameter {
        Parameter {
            identifier,
            range,
            ty,
            is_final: false,
            is_ellipsis: false,
        }
    }

    pub(crate) fn substituted(&self, map: &TypeMap, store: &TypeStore) -> Parameter {
        let new_ty = self.ty.substituted(map, store);
        if new_ty == self.ty {
            return self.clone();
        }
        Parameter {
            ty: new_ty,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub identifier: Symbol,
    pub range: Range,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_constructor: bool,
    pub has_native_implementation: bool,
    /// Method-level type parameters; empty for plain methods.
    pub generics: Vec<ParamId>,
    pub parameters: Vec<Parameter>,
    /// `None` is a void result.
    pub return_ty: Option<Ty>,
    pub owner: DeclId,
    /// Attached by the code generator once the executable body exists.
    pub body: Option<BodyId>,
    internal_names: [OnceCell<String>; 2],
    dispatch_names: [Option<String>; 2],
}

impl Method {
    pub fn new(identifier: Symbol, range: Range, visibility: Visibility, owner: DeclId) -> Method {
        Method {
            identifier,
            range,
            visibility,
            is_static: false,
            is_final: false,
            is_abstract: false,
            is_default: false,
            is_constructor: false,
            has_native_implementation: false,
            generics: Vec::new(),
            parameters: Vec::new(),
            return_ty: None,
            owner,
            body: None,
            internal_names: [OnceCell::new(), OnceCell::new()],
            dispatch_names: [None, None],
        }
    }

    /// Whether a call with `n` arguments fits the parameter list; a trailing
    /// ellipsis parameter absorbs any surplus.
    pub fn accepts_argument_count(&self, n: usize) -> bool {
        if self.parameters.is_empty() {
            return n == 0;
        }
        if self.parameters[self.parameters.len() - 1].is_ellipsis {
            n >= self.parameters.len() - 1
        } else {
            n == self.parameters.len()
        }
    }

    /// The mangled key this exact method is stored under at runtime:
    /// `_{m|c}{j|n}$identifier$returnType$paramTypes...`, erased type names
    /// throughout.
    pub fn internal_name(&self, convention: CallingConvention, store: &TypeStore) -> &str {
        self.internal_names[convention.index()].get_or_init(|| {
            let head = if self.is_constructor { 'c' } else { 'm' };
            let identifier = if self.is_constructor {
                "_constructor_".to_string()
            } else {
                self.identifier.as_str().replace('.', "_")
            };
            let ret = match &self.return_ty {
                Some(ty) => store.internal_type_name(ty),
                None => "void".to_string(),
            };
            let mut s = format!("_{}{}${}${}$", head, convention.shorthand(), identifier, ret);
            s.push_str(
                &self
                    .parameters
                    .iter()
                    .map(|p| store.internal_type_name(&p.ty))
                    .join("$"),
            );
            s
        })
    }

    /// The key used for dynamic dispatch: the internal name rendered with
    /// the declared generic-parameter identifiers. Stable across
    /// substitution (a substituted copy keeps its origin's) and across
    /// override boundaries (unified by the interface contract check).
    pub fn dispatch_name(&self, convention: CallingConvention, store: &TypeStore) -> String {
        match &self.dispatch_names[convention.index()] {
            Some(name) => name.clone(),
            None => self.internal_name(convention, store).to_string(),
        }
    }

    pub(crate) fn set_dispatch_name(&mut self, convention: CallingConvention, name: String) {
        self.dispatch_names[convention.index()] = Some(name);
    }

    /// Readable signature, also the string both inheritance-contract checks
    /// compare: `returnType identifier(paramTypes)`, constructors without
    /// the return type.
    pub fn signature(&self, store: &TypeStore) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| store.simple_name(&p.ty))
            .join(", ");
        if self.is_constructor {
            format!("{}({})", self.identifier, params)
        } else {
            let ret = match &self.return_ty {
                Some(ty) => store.simple_name(ty),
                None => "void".to_string(),
            };
            format!("{} {}({})", ret, self.identifier, params)
        }
    }

    /// Substitution copy. Returns an unchanged clone when no parameter or
    /// return type depends on the map; otherwise the copy gets fresh
    /// internal-name caches and inherits the origin's internal names as its
    /// dispatch names.
    pub(crate) fn substituted(&self, map: &TypeMap, store: &TypeStore) -> Method {
        let mut copy_needed = false;
        let parameters: Vec<Parameter> = self
            .parameters
            .iter()
            .map(|p| {
                let substituted = p.substituted(map, store);
                if substituted.ty != p.ty {
                    copy_needed = true;
                }
                substituted
            })
            .collect();
        let return_ty = self.return_ty.as_ref().map(|t| t.substituted(map, store));
        if return_ty != self.return_ty {
            copy_needed = true;
        }
        if !copy_needed {
            return self.clone();
        }

        let dispatch_names = [
            Some(self.dispatch_name(CallingConvention::Java, store)),
            Some(self.dispatch_name(CallingConvention::Native, store)),
        ];
        Method {
            parameters,
            return_ty,
            internal_names: [OnceCell::new(), OnceCell::new()],
            dispatch_names,
            ..self.clone()
        }
    }
}

impl TypeStore {
    /// Which members of `object` are visible from inside `context`?
    /// The object's own class sees `private`, a subclass `protected`,
    /// everyone else `public`; generic variants count as their origin.
    pub fn visibility_up_to(&self, object: &Ty, context: Option<&Ty>) -> Visibility {
        let object_decl = match object.decl_id() {
            Some(decl) => decl,
            None => return Visibility::Public,
        };
        let context = match context {
            Some(context) => context,
            None => return Visibility::Public,
        };
        let context_decl = match context.decl_id() {
            Some(decl) => decl,
            None => return Visibility::Public,
        };

        if object_decl == context_decl {
            return Visibility::Private;
        }
        if let DeclId::Class(context_class) = context_decl {
            if self.has_ancestor_or_is(context_class, object_decl) {
                return Visibility::Protected;
            }
        }
        Visibility::Public
    }
}
