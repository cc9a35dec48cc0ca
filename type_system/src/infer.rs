//! Call-site inference for generic methods and constructors.
//!
//! A fresh [`InferenceContext`] is created per call and threaded through the
//! implicit-cast check of every argument; each successful check against a
//! declared type parameter appends the argument's type to that parameter's
//! candidate list. `check` then validates the gathered candidates: a
//! consistency check over independently collected bindings, not a
//! unification algorithm.

use crate::{
    errors::SemanticError,
    members::Method,
    store::{ParamId, TypeStore},
    subst::TypeMap,
    ty::Ty,
};
use itertools::Itertools;
use log::debug;

/// Per-call candidate accumulator, keyed by the called method's declared
/// type parameters. Request-scoped by construction: nothing survives the
/// call, and concurrent resolutions cannot interfere.
#[derive(Debug)]
pub struct InferenceContext {
    catches: Vec<(ParamId, Vec<Ty>)>,
}

impl InferenceContext {
    /// Fresh, empty candidate lists for the given parameters.
    pub fn begin(generics: &[ParamId]) -> InferenceContext {
        InferenceContext {
            catches: generics.iter().map(|p| (*p, Vec::new())).collect(),
        }
    }

    /// Called by the cast engine on a successful implicit check against a
    /// tracked parameter. Checks against parameters of other declarations
    /// are ignored.
    pub(crate) fn record(&mut self, param: ParamId, candidate: Ty) {
        if let Some((_, candidates)) = self.catches.iter_mut().find(|(p, _)| *p == param) {
            candidates.push(candidate);
        }
    }

    pub fn candidates(&self, param: ParamId) -> &[Ty] {
        self.catches
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }

    /// Validates the gathered candidates. Empty list: the parameter is
    /// undetermined for this call. Textually differing candidates: the
    /// instantiations contradict each other, the error lists the distinct
    /// renderings. The resulting bindings always map every parameter (the
    /// first candidate, or the root class as best-effort fallback) so
    /// downstream passes keep a consistent structure to walk.
    pub fn check(&self, store: &TypeStore) -> InferenceOutcome {
        let mut errors = Vec::new();
        let mut bindings = TypeMap::new();

        for (param, candidates) in &self.catches {
            let identifier = store.param(*param).identifier.to_string();
            match candidates.first() {
                None => {
                    errors.push(SemanticError::UndeterminedTypeParameter { name: identifier });
                    if let Some(root) = store.root_class() {
                        bindings.insert(*param, Ty::Class(root));
                    }
                }
                Some(first) => {
                    let renderings: Vec<String> =
                        candidates.iter().map(|c| store.render(c)).collect();
                    let distinct: Vec<&String> = renderings.iter().unique().collect();
                    if distinct.len() > 1 {
                        errors.push(SemanticError::InconsistentTypeParameter {
                            name: identifier,
                            types: distinct.into_iter().join(", "),
                        });
                    }
                    bindings.insert(*param, first.clone());
                }
            }
        }

        InferenceOutcome { bindings, errors }
    }
}

#[derive(Debug)]
pub struct InferenceOutcome {
    pub bindings: TypeMap,
    pub errors: Vec<SemanticError>,
}

/// Resolves one call to a generic method: checks every argument against its
/// parameter (gathering candidates on the way), validates the candidates
/// and returns the method copy substituted with the agreed bindings plus
/// the inference errors to report.
pub fn infer_generic_call(
    store: &TypeStore,
    method: &Method,
    arguments: &[Ty],
) -> (Method, Vec<SemanticError>) {
    debug!(
        "inferring type parameters of '{}' for {} argument(s)",
        method.identifier,
        arguments.len()
    );
    let mut context = InferenceContext::begin(&method.generics);
    for (parameter, argument) in method.parameters.iter().zip(arguments) {
        store.can_implicitly_cast_with(argument, &parameter.ty, Some(&mut context));
    }

    let outcome = context.check(store);
    let resolved = method.substituted(&outcome.bindings, store);
    (resolved, outcome.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{defs::ParamDef, store::TypeStore};
    use diagnostics::Range;

    #[test]
    fn candidates_are_scoped_to_tracked_parameters() {
        let mut store = TypeStore::new();
        let module = store.add_module("Main.java", false);
        let t_sym = store.intern("T");
        let tracked = store.add_param(ParamDef::new(t_sym, Range::EMPTY, module));
        let u_sym = store.intern("U");
        let foreign = store.add_param(ParamDef::new(u_sym, Range::EMPTY, module));

        let mut context = InferenceContext::begin(&[tracked]);
        context.record(tracked, Ty::Null);
        context.record(foreign, Ty::Null);

        assert_eq!(context.candidates(tracked).len(), 1);
        assert!(context.candidates(foreign).is_empty());
    }

    #[test]
    fn empty_candidates_are_undetermined() {
        let mut store = TypeStore::new();
        let module = store.add_module("Main.java", false);
        let t_sym = store.intern("T");
        let t = store.add_param(ParamDef::new(t_sym, Range::EMPTY, module));

        let context = InferenceContext::begin(&[t]);
        let outcome = context.check(&store);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0]
            .to_string()
            .contains("cannot be determined"));
    }
}
