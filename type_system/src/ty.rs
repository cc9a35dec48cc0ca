//! The type sum.
//!
//! Every type usable in the language is a [`Ty`]: primitives, `null`, arrays,
//! handles into the [`TypeStore`] arena for declared types, and
//! reference-counted generic variants (substituted views over a declared
//! origin, see the `subst` module). Cloning a `Ty` is cheap by construction;
//! equality is identity for variants and handle equality for declared types.

use crate::{
    store::{ClassId, EnumId, InterfaceId, ModuleId, ParamId, TypeStore},
    subst::{ClassVariant, InterfaceVariant},
};
use itertools::Itertools;
use std::{fmt, rc::Rc, str::FromStr};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The primitive kinds of the language. `null` and `void` are not listed:
/// `null` is its own [`Ty`] variant and a void result is an absent return
/// type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn parse(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::from_str(name).ok()
    }

    fn numeric_rank(self) -> Option<u8> {
        use self::PrimitiveKind::*;
        match self {
            Byte => Some(0),
            Short => Some(1),
            Int => Some(2),
            Long => Some(3),
            Float => Some(4),
            Double => Some(5),
            Boolean | Char => None,
        }
    }

    /// The widening conversions permitted without a cast operator.
    pub fn can_widen_to(self, target: PrimitiveKind) -> bool {
        use self::PrimitiveKind::*;
        if self == target {
            return true;
        }
        match (self, target) {
            (Boolean, _) | (_, Boolean) => false,
            (Char, t) => matches!(t, Int | Long | Float | Double),
            (_, Char) => false,
            (s, t) => s.numeric_rank() < t.numeric_rank(),
        }
    }

    /// The conversions permitted with an explicit cast operator.
    pub fn explicitly_converts_to(self, target: PrimitiveKind) -> bool {
        use self::PrimitiveKind::*;
        match (self, target) {
            (Boolean, Boolean) => true,
            (Boolean, _) | (_, Boolean) => false,
            // any numeric/char combination narrows or widens explicitly
            _ => true,
        }
    }
}

/// An array wraps an element type and a dimension count. Nested arrays
/// collapse on construction, so the element of an `ArrayType` is never
/// itself an array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element: Ty,
    pub dimension: usize,
}

impl ArrayType {
    pub fn new(element: Ty, dimension: usize) -> ArrayType {
        let mut element = element;
        let mut dimension = dimension;
        loop {
            let inner = match &element {
                Ty::Array(inner) => {
                    dimension += inner.dimension;
                    inner.element.clone()
                }
                _ => break,
            };
            element = inner;
        }
        ArrayType { element, dimension }
    }

    /// The type obtained by indexing once.
    pub fn element_type(&self) -> Ty {
        if self.dimension == 1 {
            self.element.clone()
        } else {
            Ty::Array(Rc::new(ArrayType {
                element: self.element.clone(),
                dimension: self.dimension - 1,
            }))
        }
    }
}

#[derive(Debug, Clone)]
pub enum Ty {
    Primitive(PrimitiveKind),
    Null,
    Array(Rc<ArrayType>),
    Class(ClassId),
    Interface(InterfaceId),
    Enum(EnumId),
    TypeParam(ParamId),
    ClassVariant(Rc<ClassVariant>),
    InterfaceVariant(Rc<InterfaceVariant>),
}

impl From<ClassId> for Ty {
    fn from(id: ClassId) -> Ty {
        Ty::Class(id)
    }
}

impl From<InterfaceId> for Ty {
    fn from(id: InterfaceId) -> Ty {
        Ty::Interface(id)
    }
}

impl From<EnumId> for Ty {
    fn from(id: EnumId) -> Ty {
        Ty::Enum(id)
    }
}

impl From<ParamId> for Ty {
    fn from(id: ParamId) -> Ty {
        Ty::TypeParam(id)
    }
}

impl From<PrimitiveKind> for Ty {
    fn from(kind: PrimitiveKind) -> Ty {
        Ty::Primitive(kind)
    }
}

impl Ty {
    pub fn array(element: Ty, dimension: usize) -> Ty {
        Ty::Array(Rc::new(ArrayType::new(element, dimension)))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Ty::Primitive(_))
    }

    /// The declaration a member of this type belongs to, collapsing generic
    /// variants to their origin. Primitives, `null`, arrays and type
    /// parameters have none.
    pub fn decl_id(&self) -> Option<crate::members::DeclId> {
        use crate::members::DeclId;
        match self {
            Ty::Class(id) => Some(DeclId::Class(*id)),
            Ty::Interface(id) => Some(DeclId::Interface(*id)),
            Ty::Enum(id) => Some(DeclId::Enum(*id)),
            Ty::ClassVariant(v) => Some(DeclId::Class(v.origin)),
            Ty::InterfaceVariant(v) => Some(DeclId::Interface(v.origin)),
            _ => None,
        }
    }

    /// Origin class handle for class-like types.
    pub(crate) fn origin_class(&self) -> Option<ClassId> {
        match self {
            Ty::Class(id) => Some(*id),
            Ty::ClassVariant(v) => Some(v.origin),
            _ => None,
        }
    }

    /// Origin interface handle for interface-like types.
    pub(crate) fn origin_interface(&self) -> Option<InterfaceId> {
        match self {
            Ty::Interface(id) => Some(*id),
            Ty::InterfaceVariant(v) => Some(v.origin),
            _ => None,
        }
    }
}

/// Identity-flavoured equality: declared types compare by handle, generic
/// variants by instance. Castability compares *renderings* where the
/// language calls for it; this impl deliberately does not.
impl PartialEq for Ty {
    fn eq(&self, other: &Ty) -> bool {
        match (self, other) {
            (Ty::Primitive(a), Ty::Primitive(b)) => a == b,
            (Ty::Null, Ty::Null) => true,
            (Ty::Array(a), Ty::Array(b)) => Rc::ptr_eq(a, b) || **a == **b,
            (Ty::Class(a), Ty::Class(b)) => a == b,
            (Ty::Interface(a), Ty::Interface(b)) => a == b,
            (Ty::Enum(a), Ty::Enum(b)) => a == b,
            (Ty::TypeParam(a), Ty::TypeParam(b)) => a == b,
            (Ty::ClassVariant(a), Ty::ClassVariant(b)) => Rc::ptr_eq(a, b),
            (Ty::InterfaceVariant(a), Ty::InterfaceVariant(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

pub struct TyDisplay<'a> {
    store: &'a TypeStore,
    ty: &'a Ty,
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.store.fmt_ty(self.ty, f)
    }
}

/// A usage of a declared type, recorded for the editor layer. Write-only
/// from this core's perspective; reset wholesale before a pass reruns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePosition {
    pub module: ModuleId,
    pub range: diagnostics::Range,
}

impl TypeStore {
    pub fn display<'a>(&'a self, ty: &'a Ty) -> TyDisplay<'a> {
        TyDisplay { store: self, ty }
    }

    /// The user-facing rendering, e.g. `List<? extends Number>`. Castability
    /// between generic variants compares these strings (see the `casts`
    /// module).
    pub fn render(&self, ty: &Ty) -> String {
        self.display(ty).to_string()
    }

    fn fmt_ty(&self, ty: &Ty, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match ty {
            Ty::Primitive(kind) => write!(f, "{}", kind),
            Ty::Null => write!(f, "null"),
            Ty::Array(arr) => {
                self.fmt_ty(&arr.element, f)?;
                for _ in 0..arr.dimension {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Ty::Class(id) => {
                let class = self.class(*id);
                write!(f, "{}", class.identifier)?;
                self.fmt_declared_params(&class.generics, f)
            }
            Ty::Interface(id) => {
                let interface = self.interface(*id);
                write!(f, "{}", interface.identifier)?;
                self.fmt_declared_params(&interface.generics, f)
            }
            Ty::Enum(id) => write!(f, "{}", self.enum_def(*id).identifier),
            Ty::TypeParam(id) => {
                let param = self.param(*id);
                write!(f, "{}", param.identifier)?;
                if let Some(lower) = &param.lower_bound {
                    write!(f, " super {}", self.simple_name(lower))?;
                }
                if !param.upper_bounds.is_empty() {
                    write!(
                        f,
                        " extends {}",
                        param
                            .upper_bounds
                            .iter()
                            .map(|ub| self.simple_name(ub))
                            .join(" & ")
                    )?;
                }
                Ok(())
            }
            Ty::ClassVariant(v) => {
                let class = self.class(v.origin);
                write!(f, "{}", class.identifier)?;
                self.fmt_bound_params(&class.generics, &v.map, f)
            }
            Ty::InterfaceVariant(v) => {
                let interface = self.interface(v.origin);
                write!(f, "{}", interface.identifier)?;
                self.fmt_bound_params(&interface.generics, &v.map, f)
            }
        }
    }

    fn fmt_declared_params(&self, generics: &[ParamId], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if generics.is_empty() {
            return Ok(());
        }
        write!(
            f,
            "<{}>",
            generics
                .iter()
                .map(|p| self.param(*p).identifier.to_string())
                .join(", ")
        )
    }

    fn fmt_bound_params(
        &self,
        generics: &[ParamId],
        map: &crate::subst::TypeMap,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if generics.is_empty() {
            return Ok(());
        }
        write!(
            f,
            "<{}>",
            generics
                .iter()
                .map(|p| match map.get(*p) {
                    Some(bound) => self.render(bound),
                    None => self.param(*p).identifier.to_string(),
                })
                .join(", ")
        )
    }

    /// The bare identifier of a type, variants collapsing to their origin's.
    /// Matches what bound renderings embed for `T extends A & B`.
    pub fn simple_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Primitive(kind) => kind.to_string(),
            Ty::Null => "null".to_string(),
            Ty::Array(arr) => {
                let mut s = self.simple_name(&arr.element);
                for _ in 0..arr.dimension {
                    s.push_str("[]");
                }
                s
            }
            Ty::Class(id) => self.class(*id).identifier.to_string(),
            Ty::Interface(id) => self.interface(*id).identifier.to_string(),
            Ty::Enum(id) => self.enum_def(*id).identifier.to_string(),
            Ty::TypeParam(id) => self.param(*id).identifier.to_string(),
            Ty::ClassVariant(v) => self.class(v.origin).identifier.to_string(),
            Ty::InterfaceVariant(v) => self.interface(v.origin).identifier.to_string(),
        }
    }

    /// The erased name a type contributes to internal method names. Arrays
    /// append one `_I` per dimension to their element's name.
    pub fn internal_type_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Array(arr) => {
                let mut s = self.internal_type_name(&arr.element);
                for _ in 0..arr.dimension {
                    s.push_str("_I");
                }
                s
            }
            _ => self.simple_name(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_is_ordered_by_rank() {
        use self::PrimitiveKind::*;
        assert!(Byte.can_widen_to(Short));
        assert!(Byte.can_widen_to(Double));
        assert!(Int.can_widen_to(Long));
        assert!(Int.can_widen_to(Int));
        assert!(!Long.can_widen_to(Int));
        assert!(!Double.can_widen_to(Float));
    }

    #[test]
    fn char_widens_to_int_but_not_back() {
        use self::PrimitiveKind::*;
        assert!(Char.can_widen_to(Int));
        assert!(Char.can_widen_to(Double));
        assert!(!Char.can_widen_to(Short));
        assert!(!Int.can_widen_to(Char));
        assert!(Int.explicitly_converts_to(Char));
    }

    #[test]
    fn boolean_is_isolated() {
        use self::PrimitiveKind::*;
        assert!(Boolean.can_widen_to(Boolean));
        assert!(!Boolean.can_widen_to(Int));
        assert!(!Int.explicitly_converts_to(Boolean));
        assert!(!Boolean.explicitly_converts_to(Int));
    }

    #[test]
    fn primitive_names_round_trip() {
        assert_eq!(PrimitiveKind::parse("int"), Some(PrimitiveKind::Int));
        assert_eq!(PrimitiveKind::Int.to_string(), "int");
        assert_eq!(PrimitiveKind::parse("Integer"), None);
    }

    #[test]
    fn nested_arrays_flatten() {
        let ints = Ty::Primitive(PrimitiveKind::Int);
        let inner = Ty::array(ints.clone(), 2);
        let outer = ArrayType::new(inner, 1);
        assert_eq!(outer.dimension, 3);
        assert_eq!(outer.element, ints);
    }

    #[test]
    fn element_type_peels_one_dimension() {
        let ints = Ty::Primitive(PrimitiveKind::Int);
        let arr = ArrayType::new(ints.clone(), 2);
        match arr.element_type() {
            Ty::Array(inner) => {
                assert_eq!(inner.dimension, 1);
                assert_eq!(inner.element, ints);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }
}
