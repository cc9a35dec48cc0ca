//! The castability engine.
//!
//! Two relations: `can_implicitly_cast` (widening/assignability) and
//! `can_explicitly_cast` (cast operator legality, which for reference types
//! is the implicit relation in either direction). An optional
//! [`InferenceContext`] rides along: whenever an implicit check against a
//! generic type parameter succeeds, the source type is recorded as a
//! candidate binding, the side effect call-site inference is built on.
//!
//! Generic variants compare per declared parameter: textual equality of the
//! two bound types' renderings, falling back to the wildcard's upper bounds.
//! This replaces true variance inference with a per-parameter check; it can
//! under- or over-accept in deeply nested scenarios and is kept as
//! observable behavior (see the tests).

use crate::{
    infer::InferenceContext,
    store::{ClassId, InterfaceId, TypeStore},
    subst::{ClassVariant, InterfaceVariant, TypeMap},
    ty::Ty,
};
use std::collections::HashSet;
use std::rc::Rc;

impl TypeStore {
    pub fn can_implicitly_cast(&self, from: &Ty, to: &Ty) -> bool {
        self.can_implicitly_cast_with(from, to, None)
    }

    pub fn can_implicitly_cast_with(
        &self,
        from: &Ty,
        to: &Ty,
        mut catches: Option<&mut InferenceContext>,
    ) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (Ty::Primitive(a), Ty::Primitive(b)) => a.can_widen_to(*b),
            // no boxing here; primitive/reference conversions are a code
            // generation concern
            (Ty::Primitive(_), _) | (_, Ty::Primitive(_)) => false,

            (Ty::Null, _) => true,
            (_, Ty::Null) => false,

            (Ty::TypeParam(p), Ty::TypeParam(q)) => {
                let target = self.param(*q);
                match &target.lower_bound {
                    None => false,
                    Some(lower) => self.param(*p).upper_bounds.iter().any(|upper| {
                        self.can_implicitly_cast_with(upper, lower, catches.as_deref_mut())
                    }),
                }
            }
            (_, Ty::TypeParam(p)) => {
                for upper in &self.param(*p).upper_bounds {
                    if !self.can_implicitly_cast_with(from, upper, catches.as_deref_mut()) {
                        return false;
                    }
                }
                if let Some(context) = catches {
                    context.record(*p, from.clone());
                }
                true
            }
            (Ty::TypeParam(p), _) => self
                .param(*p)
                .upper_bounds
                .iter()
                .any(|upper| self.can_implicitly_cast_with(upper, to, catches.as_deref_mut())),

            (Ty::Array(a), Ty::Array(b)) => {
                if a.dimension != b.dimension {
                    return false;
                }
                if self.render(&a.element) == self.render(&b.element) {
                    return true;
                }
                // reference arrays are covariant
                if a.element.is_primitive() || b.element.is_primitive() {
                    return false;
                }
                self.can_implicitly_cast_with(&a.element, &b.element, catches)
            }
            (Ty::Array(_), Ty::Class(t)) => self.is_root_class(*t),
            (Ty::Array(_), _) | (_, Ty::Array(_)) => false,

            (Ty::Enum(e), _) => match to {
                Ty::Interface(_) | Ty::InterfaceVariant(_) => self
                    .enum_def(*e)
                    .implements()
                    .iter()
                    .any(|implemented| self.can_explicitly_cast(implemented, to)),
                Ty::Class(t) => self.is_root_class(*t),
                _ => false,
            },
            (_, Ty::Enum(_)) => false,

            (_, Ty::Class(t)) => match from.origin_class() {
                Some(origin) => self.class_chain_reaches(origin, *t),
                None => false,
            },
            (_, Ty::Interface(t)) => match from {
                Ty::Class(c) => self.class_implements_reach(*c, *t),
                Ty::ClassVariant(v) => self.class_implements_reach(v.origin, *t),
                Ty::Interface(i) => self.interface_closure_reaches(*i, *t),
                Ty::InterfaceVariant(v) => self.interface_closure_reaches(v.origin, *t),
                _ => false,
            },
            (_, Ty::ClassVariant(target)) => {
                let origin = match from.origin_class() {
                    Some(origin) => origin,
                    None => return false,
                };
                if !self.class_chain_reaches(origin, target.origin) {
                    return false;
                }
                match self.class_supertype_variant(from, target.origin) {
                    Some(found) => self.variant_params_compatible(found.origin, &found.map, &target.map),
                    None => false,
                }
            }
            (_, Ty::InterfaceVariant(target)) => {
                if let Some(origin) = from.origin_class() {
                    if !self.class_implements_reach(origin, target.origin) {
                        return false;
                    }
                    match self.implemented_interface_variant(from, target.origin) {
                        Some(found) => self.interface_variant_params_compatible(found, target),
                        None => false,
                    }
                } else if let Some(origin) = from.origin_interface() {
                    if !self.interface_closure_reaches(origin, target.origin) {
                        return false;
                    }
                    match self.interface_supertype_variant(from, target.origin) {
                        Some(found) => self.interface_variant_params_compatible(found, target),
                        None => false,
                    }
                } else {
                    false
                }
            }
        }
    }

    /// Cast operator legality. Upcasts and downcasts are both expressible
    /// for reference types; primitives only convert among themselves.
    pub fn can_explicitly_cast(&self, from: &Ty, to: &Ty) -> bool {
        match (from, to) {
            (Ty::Primitive(a), Ty::Primitive(b)) => a.explicitly_converts_to(*b),
            (Ty::Primitive(_), _) | (_, Ty::Primitive(_)) => false,
            _ => self.can_implicitly_cast(from, to) || self.can_implicitly_cast(to, from),
        }
    }

    // ------------------------------------------------------------------
    // raw (unparameterized) walks

    /// Superclass chain over origins. The visited set keeps malformed
    /// inputs from looping; a class with no superclass simply fails a
    /// non-matching target.
    fn class_chain_reaches(&self, from: ClassId, target: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(from);
        while let Some(id) = current {
            if !visited.insert(id) {
                return false;
            }
            if id == target {
                return true;
            }
            current = self.class(id).extends().and_then(|e| e.origin_class());
        }
        false
    }

    /// Any *directly* implemented interface reaching the target through
    /// interface extension.
    fn class_implements_reach(&self, class: ClassId, target: InterfaceId) -> bool {
        self.class(class).implements().iter().any(|implemented| {
            implemented
                .origin_interface()
                .map_or(false, |origin| self.interface_closure_reaches(origin, target))
        })
    }

    fn interface_closure_reaches(&self, from: InterfaceId, target: InterfaceId) -> bool {
        if from == target {
            return true;
        }
        self.interface(from).extends().iter().any(|extended| {
            extended
                .origin_interface()
                .map_or(false, |origin| self.interface_closure_reaches(origin, target))
        })
    }

    // ------------------------------------------------------------------
    // locating the instantiation the source actually inherits

    /// Walks the substituted superclass chain for the variant of
    /// `target_origin` the source derives from, e.g. the `ArrayList<Integer>`
    /// inside `MyList`'s chain when checking against `ArrayList<Integer>`.
    fn class_supertype_variant<'a>(
        &'a self,
        source: &'a Ty,
        target_origin: ClassId,
    ) -> Option<&'a Rc<ClassVariant>> {
        let mut current = Some(source);
        while let Some(ty) = current {
            if let Ty::ClassVariant(v) = ty {
                if v.origin == target_origin {
                    return Some(v);
                }
            }
            current = self.extends_of(ty);
        }
        None
    }

    /// Ditto through the extended-interface closure, the source itself
    /// included.
    fn interface_supertype_variant<'a>(
        &'a self,
        source: &'a Ty,
        target_origin: InterfaceId,
    ) -> Option<&'a Rc<InterfaceVariant>> {
        if let Ty::InterfaceVariant(v) = source {
            if v.origin == target_origin {
                return Some(v);
            }
        }
        self.interface_extends_of(source)
            .iter()
            .find_map(|extended| self.interface_supertype_variant(extended, target_origin))
    }

    /// For a class-like source: the instantiation of `target_origin` found
    /// among the implemented interfaces anywhere up the superclass chain.
    fn implemented_interface_variant<'a>(
        &'a self,
        source: &'a Ty,
        target_origin: InterfaceId,
    ) -> Option<&'a Rc<InterfaceVariant>> {
        let mut current = Some(source);
        while let Some(ty) = current {
            for implemented in self.implements_of(ty) {
                if let Some(found) = self.interface_supertype_variant(implemented, target_origin) {
                    return Some(found);
                }
            }
            current = self.extends_of(ty);
        }
        None
    }

    fn interface_variant_params_compatible(
        &self,
        found: &Rc<InterfaceVariant>,
        target: &Rc<InterfaceVariant>,
    ) -> bool {
        let generics = self.interface(found.origin).generics.clone();
        self.variant_params_compatible_impl(&generics, &found.map, &target.map)
    }

    fn variant_params_compatible(
        &self,
        found_origin: ClassId,
        found_map: &TypeMap,
        target_map: &TypeMap,
    ) -> bool {
        let generics = self.class(found_origin).generics.clone();
        self.variant_params_compatible_impl(&generics, found_map, target_map)
    }

    /// Per-parameter comparison: textual equality of the two bound types'
    /// renderings, else the target's wildcard upper bounds. A parameter
    /// failing both fails the whole relation.
    fn variant_params_compatible_impl(
        &self,
        generics: &[crate::store::ParamId],
        found_map: &TypeMap,
        target_map: &TypeMap,
    ) -> bool {
        for param in generics {
            let mine = match found_map.get(*param) {
                Some(ty) => ty,
                None => return false,
            };
            let theirs = match target_map.get(*param) {
                Some(ty) => ty,
                None => return false,
            };

            if self.render(mine) == self.render(theirs) {
                continue;
            }

            if let Ty::TypeParam(q) = theirs {
                let wildcard = self.param(*q);
                if wildcard.is_wildcard
                    && wildcard
                        .upper_bounds
                        .iter()
                        .any(|upper| self.can_implicitly_cast(mine, upper))
                {
                    continue;
                }
            }

            return false;
        }
        true
    }
}
