//! Inheritance contracts: abstract-method completeness and interface
//! implementation.
//!
//! Runs once per resolved class, after all members are attached. Interface
//! obligations come first so supplemented default methods count when the
//! abstract walk runs. Both checks compare rendered signatures; a method is
//! implemented only when an identical signature string exists at or below
//! the class being checked.

use crate::{
    errors::SemanticError,
    members::{CallingConvention, DeclId, Method, MethodHandle},
    store::{ClassId, TypeStore},
    ty::Ty,
};
use log::debug;
use std::collections::HashSet;

enum Action {
    Unify {
        target: MethodHandle,
        dispatch: String,
    },
    Supplement {
        method: Method,
        source: MethodHandle,
    },
    Missing {
        interface: String,
        method: String,
    },
}

impl TypeStore {
    pub fn check_class_contracts(&mut self, class: ClassId) {
        self.check_interfaces_implemented(class);
        self.check_abstract_ancestors_implemented(class);
    }

    /// For every directly implemented interface, every method the interface
    /// itself declares must resolve on the class: an existing signature is
    /// unified with the interface method's dispatch name (so
    /// generic-parameter-derived names agree across the override boundary),
    /// a missing one with a default body is synthesized onto the class, and
    /// anything else is an unimplemented-interface-method error.
    fn check_interfaces_implemented(&mut self, class: ClassId) {
        let mut actions = Vec::new();

        let implements: Vec<Ty> = self.class(class).implements().to_vec();
        for implemented in &implements {
            let origin = match implemented.origin_interface() {
                Some(origin) => origin,
                None => continue,
            };
            let method_count = self.interface(origin).methods.len();
            for index in 0..method_count {
                let interface_method = self.own_methods_of(implemented)[index].clone();
                if interface_method.is_static {
                    continue;
                }
                let signature = interface_method.signature(self);

                match self.find_method_by_signature(class, &signature) {
                    Some(found) => {
                        let dispatch =
                            interface_method.dispatch_name(CallingConvention::Java, self);
                        actions.push(Action::Unify {
                            target: found,
                            dispatch,
                        });
                    }
                    None if interface_method.is_default => {
                        let mut copy = interface_method.clone();
                        copy.owner = DeclId::Class(class);
                        copy.body = None;
                        copy.set_dispatch_name(
                            CallingConvention::Java,
                            interface_method.dispatch_name(CallingConvention::Java, self),
                        );
                        copy.set_dispatch_name(
                            CallingConvention::Native,
                            interface_method.dispatch_name(CallingConvention::Native, self),
                        );
                        actions.push(Action::Supplement {
                            method: copy,
                            source: MethodHandle {
                                owner: DeclId::Interface(origin),
                                index,
                            },
                        });
                    }
                    None => actions.push(Action::Missing {
                        interface: self.render(implemented),
                        method: signature,
                    }),
                }
            }
        }

        let module = self.class(class).module;
        let range = self.class(class).range;
        for action in actions {
            match action {
                Action::Unify { target, dispatch } => {
                    self.method_mut(target)
                        .set_dispatch_name(CallingConvention::Java, dispatch);
                }
                Action::Supplement { method, source } => {
                    debug!(
                        "supplementing default method '{}' on '{}'",
                        method.identifier,
                        self.class(class).identifier
                    );
                    let index = self.class(class).methods.len();
                    self.class_mut(class).add_method(method);
                    self.defer_default_body(
                        MethodHandle {
                            owner: DeclId::Class(class),
                            index,
                        },
                        source,
                    );
                }
                Action::Missing { interface, method } => {
                    self.report(
                        module,
                        range,
                        &SemanticError::UnimplementedInterfaceMethod { interface, method },
                    );
                }
            }
        }
    }

    /// Walks the superclass chain collecting abstract and concrete
    /// signatures. A class not declared abstract that leaves any abstract
    /// signature without a concrete match at or below it is reported once,
    /// naming all missing methods.
    fn check_abstract_ancestors_implemented(&mut self, class: ClassId) {
        if self.class(class).is_abstract {
            return;
        }

        let mut concrete: HashSet<String> = HashSet::new();
        let mut missing: Vec<String> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(Ty::Class(class));

        while let Some(ty) = current.take() {
            if let Some(decl) = ty.decl_id() {
                if !visited.insert(decl) {
                    break;
                }
            }
            for method in self.own_methods_of(&ty) {
                let signature = method.signature(self);
                if method.is_abstract {
                    if !concrete.contains(&signature) && !missing.contains(&signature) {
                        missing.push(signature);
                    }
                } else {
                    concrete.insert(signature);
                }
            }
            current = self.extends_of(&ty).cloned();
        }

        if !missing.is_empty() {
            let module = self.class(class).module;
            let range = self.class(class).range;
            let name = self.class(class).identifier.to_string();
            self.report(
                module,
                range,
                &SemanticError::AbstractMethodsNotImplemented {
                    name,
                    methods: missing.join(", "),
                },
            );
        }
    }

    /// First identical signature going up the raw superclass chain; the
    /// own-methods-first order is the override-resolution rule.
    fn find_method_by_signature(&self, class: ClassId, signature: &str) -> Option<MethodHandle> {
        let mut visited = HashSet::new();
        let mut current = Some(class);
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            for (index, method) in self.class(id).methods.iter().enumerate() {
                if !method.is_constructor && method.signature(self) == signature {
                    return Some(MethodHandle {
                        owner: DeclId::Class(id),
                        index,
                    });
                }
            }
            current = self.class(id).extends().and_then(|e| e.origin_class());
        }
        None
    }
}
