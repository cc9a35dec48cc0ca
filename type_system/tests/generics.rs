//! Generic instantiation, substitution identity, wildcard castability and
//! call-site inference.

use type_system::{
    builtins,
    decl::{ClassDecl, FieldDecl, GenericParamDecl, InterfaceDecl, MethodDecl, ParamDecl, TypeDecl, TypeNode},
    infer_generic_call, resolver, Builtins, CallingConvention, ClassId, DeclId, InterfaceId,
    ModuleId, Ty, TypeMap, TypeStore,
};

fn setup(decls: Vec<TypeDecl>) -> (TypeStore, Builtins, ModuleId) {
    let mut store = TypeStore::new();
    let installed = builtins::install(&mut store);
    let module = store.add_module("Main.java", false);
    resolver::resolve(&mut store, module, decls);
    (store, installed, module)
}

fn class_id(store: &TypeStore, name: &str) -> ClassId {
    match store.lookup(name) {
        Some(Ty::Class(id)) => *id,
        other => panic!("expected class '{}', found {:?}", name, other),
    }
}

fn interface_id(store: &TypeStore, name: &str) -> InterfaceId {
    match store.lookup(name) {
        Some(Ty::Interface(id)) => *id,
        other => panic!("expected interface '{}', found {:?}", name, other),
    }
}

/// Number, Integer extends Number, Collection<E>, List<E> extends
/// Collection<E>, Vector<E> implements List<E> with a field `head: E` and
/// a method `E get(int)`.
fn collections() -> Vec<TypeDecl> {
    let number = ClassDecl::new("Number");
    let mut integer = ClassDecl::new("Integer");
    integer.extends = Some(TypeNode::named("Number"));

    let mut collection = InterfaceDecl::new("Collection");
    collection.generics.push(GenericParamDecl::named("E"));

    let mut list = InterfaceDecl::new("List");
    list.generics.push(GenericParamDecl::named("E"));
    list.extends
        .push(TypeNode::generic("Collection", vec![TypeNode::named("E")]));
    let mut get = MethodDecl::new("get");
    get.params
        .push(ParamDecl::new("index", TypeNode::named("int")));
    get.return_ty = Some(TypeNode::named("E"));
    list.methods.push(get);

    let mut vector = ClassDecl::new("Vector");
    vector.generics.push(GenericParamDecl::named("E"));
    vector
        .implements
        .push(TypeNode::generic("List", vec![TypeNode::named("E")]));
    vector
        .fields
        .push(FieldDecl::new("head", TypeNode::named("E")));
    let mut get_impl = MethodDecl::new("get");
    get_impl
        .params
        .push(ParamDecl::new("index", TypeNode::named("int")));
    get_impl.return_ty = Some(TypeNode::named("E"));
    vector.methods.push(get_impl);

    vec![
        TypeDecl::Class(number),
        TypeDecl::Class(integer),
        TypeDecl::Interface(collection),
        TypeDecl::Interface(list),
        TypeDecl::Class(vector),
    ]
}

#[test]
fn substitution_without_dependency_returns_the_same_instance() {
    let (store, _, _) = setup(collections());
    let number = Ty::Class(class_id(&store, "Number"));
    let list = interface_id(&store, "List");
    let e = store.interface(list).generics[0];

    let mut map = TypeMap::new();
    map.insert(e, Ty::Class(class_id(&store, "Integer")));

    // a raw class has no free parameters
    assert_eq!(number.substituted(&map, &store), number);

    // a variant whose bound types do not mention the key is untouched
    let integers = store.parameterized_interface(list, &[Ty::Class(class_id(&store, "Integer"))]);
    let substituted = integers.substituted(&map, &store);
    assert_eq!(substituted, integers);

    // the empty map is the identity everywhere
    assert_eq!(integers.substituted(&TypeMap::new(), &store), integers);
}

#[test]
fn substitution_replaces_free_parameters() {
    let (store, _, _) = setup(collections());
    let list = interface_id(&store, "List");
    let e = store.interface(list).generics[0];

    let open = store.parameterized_interface(list, &[Ty::TypeParam(e)]);
    assert_eq!(store.render(&open), "List<E>");

    let mut map = TypeMap::new();
    map.insert(e, Ty::Class(class_id(&store, "Integer")));
    let closed = open.substituted(&map, &store);
    assert_ne!(closed, open);
    assert_eq!(store.render(&closed), "List<Integer>");

    // arrays substitute through their element and keep the dimension
    let open_array = Ty::array(Ty::TypeParam(e), 2);
    let closed_array = open_array.substituted(&map, &store);
    assert_eq!(store.render(&closed_array), "Integer[][]");
}

#[test]
fn equal_maps_yield_equal_cached_members() {
    let (store, _, _) = setup(collections());
    let vector = class_id(&store, "Vector");
    let integer = Ty::Class(class_id(&store, "Integer"));

    let a = store.parameterized_class(vector, &[integer.clone()]);
    let b = store.parameterized_class(vector, &[integer]);
    assert_ne!(a, b); // distinct instances

    let fields_a: Vec<String> = store.fields_of(&a).iter().map(|f| store.render(&f.ty)).collect();
    let fields_b: Vec<String> = store.fields_of(&b).iter().map(|f| store.render(&f.ty)).collect();
    assert_eq!(fields_a, vec!["Integer".to_string()]);
    assert_eq!(fields_a, fields_b);

    let methods_a: Vec<String> = store
        .own_methods_of(&a)
        .iter()
        .map(|m| m.signature(&store))
        .collect();
    let methods_b: Vec<String> = store
        .own_methods_of(&b)
        .iter()
        .map(|m| m.signature(&store))
        .collect();
    assert_eq!(methods_a, vec!["Integer get(int)".to_string()]);
    assert_eq!(methods_a, methods_b);
}

#[test]
fn wildcard_accepts_subtypes_within_its_upper_bound() {
    let mut holder = ClassDecl::new("Holder");
    holder
        .fields
        .push(FieldDecl::new("items", TypeNode::generic("List", vec![TypeNode::named("Integer")])));
    holder.fields.push(FieldDecl::new(
        "numbers",
        TypeNode::generic(
            "List",
            vec![TypeNode::wildcard_extends(TypeNode::named("Number"))],
        ),
    ));
    holder.fields.push(FieldDecl::new(
        "strings",
        TypeNode::generic(
            "List",
            vec![TypeNode::wildcard_extends(TypeNode::named("String"))],
        ),
    ));

    let mut decls = collections();
    decls.push(TypeDecl::Class(holder));
    let (store, _, module) = setup(decls);
    assert!(store.module(module).errors.is_empty());

    let holder_ty = Ty::Class(class_id(&store, "Holder"));
    let items = store.fields_of(&holder_ty)[0].ty.clone();
    let numbers = store.fields_of(&holder_ty)[1].ty.clone();
    let strings = store.fields_of(&holder_ty)[2].ty.clone();

    assert_eq!(store.render(&numbers), "List<? extends Number>");

    assert!(store.can_implicitly_cast(&items, &numbers));
    assert!(!store.can_implicitly_cast(&items, &strings));
}

#[test]
fn instantiations_flow_through_the_interface_closure() {
    let (store, _, _) = setup(collections());
    let vector = class_id(&store, "Vector");
    let collection = interface_id(&store, "Collection");
    let list = interface_id(&store, "List");
    let integer = Ty::Class(class_id(&store, "Integer"));
    let number = Ty::Class(class_id(&store, "Number"));

    let vector_of_integer = store.parameterized_class(vector, &[integer.clone()]);
    let collection_of_integer = store.parameterized_interface(collection, &[integer.clone()]);
    let collection_of_number = store.parameterized_interface(collection, &[number]);
    let list_of_integer = store.parameterized_interface(list, &[integer]);

    // Vector<Integer> reaches Collection<Integer> through List<Integer>
    assert!(store.can_implicitly_cast(&vector_of_integer, &collection_of_integer));
    assert!(store.can_implicitly_cast(&list_of_integer, &collection_of_integer));
    // but never an instantiation with a different bound type
    assert!(!store.can_implicitly_cast(&vector_of_integer, &collection_of_number));

    // raw relations hold regardless of the bindings
    assert!(store.can_implicitly_cast(&vector_of_integer, &Ty::Interface(list)));
    assert!(store.can_implicitly_cast(&Ty::Class(vector), &Ty::Interface(collection)));
}

#[test]
fn substituted_methods_keep_their_origin_dispatch_name() {
    let (store, _, _) = setup(collections());
    let list = interface_id(&store, "List");
    let integer = Ty::Class(class_id(&store, "Integer"));

    let list_of_integer = store.parameterized_interface(list, &[integer]);
    let get = &store.own_methods_of(&list_of_integer)[0];

    assert_eq!(
        get.internal_name(CallingConvention::Java, &store),
        "_mj$get$Integer$int"
    );
    assert_eq!(
        get.dispatch_name(CallingConvention::Java, &store),
        "_mj$get$E$int"
    );
}

fn util_class() -> TypeDecl {
    let mut util = ClassDecl::new("Util");

    let mut pick = MethodDecl::new("pick");
    pick.is_static = true;
    pick.generics.push(GenericParamDecl::named("T"));
    pick.params.push(ParamDecl::new("a", TypeNode::named("T")));
    pick.params.push(ParamDecl::new("b", TypeNode::named("T")));
    pick.return_ty = Some(TypeNode::named("T"));
    util.methods.push(pick);

    let mut fresh = MethodDecl::new("fresh");
    fresh.is_static = true;
    fresh.generics.push(GenericParamDecl::named("T"));
    fresh.return_ty = Some(TypeNode::named("T"));
    util.methods.push(fresh);

    TypeDecl::Class(util)
}

#[test]
fn consistent_arguments_bind_the_parameter() {
    let mut decls = collections();
    decls.push(util_class());
    let (store, _, _) = setup(decls);

    let util = class_id(&store, "Util");
    let integer = Ty::Class(class_id(&store, "Integer"));
    let pick = store.decl_methods(DeclId::Class(util))[0].clone();

    let (resolved, errors) = infer_generic_call(&store, &pick, &[integer.clone(), integer]);
    assert!(errors.is_empty());
    assert_eq!(store.render(resolved.return_ty.as_ref().unwrap()), "Integer");
}

#[test]
fn contradictory_arguments_report_both_renderings() {
    let mut decls = collections();
    decls.push(util_class());
    let (store, installed, _) = setup(decls);

    let util = class_id(&store, "Util");
    let integer = Ty::Class(class_id(&store, "Integer"));
    let string = Ty::Class(installed.string);
    let pick = store.decl_methods(DeclId::Class(util))[0].clone();

    let (_, errors) = infer_generic_call(&store, &pick, &[integer, string]);
    assert_eq!(errors.len(), 1);
    let message = errors[0].to_string();
    assert!(message.contains("contradictory"));
    assert!(message.contains("Integer"));
    assert!(message.contains("String"));
}

#[test]
fn unbound_parameters_are_undetermined_and_fall_back_to_the_root() {
    let mut decls = collections();
    decls.push(util_class());
    let (store, _, _) = setup(decls);

    let util = class_id(&store, "Util");
    let fresh = store.decl_methods(DeclId::Class(util))[1].clone();

    let (resolved, errors) = infer_generic_call(&store, &fresh, &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("cannot be determined"));
    // best-effort binding keeps the graph walkable
    assert_eq!(store.render(resolved.return_ty.as_ref().unwrap()), "Object");
}

#[test]
fn each_call_starts_from_a_clean_accumulator() {
    let mut decls = collections();
    decls.push(util_class());
    let (store, installed, _) = setup(decls);

    let util = class_id(&store, "Util");
    let integer = Ty::Class(class_id(&store, "Integer"));
    let string = Ty::Class(installed.string);
    let pick = store.decl_methods(DeclId::Class(util))[0].clone();

    let (_, errors) = infer_generic_call(&store, &pick, &[integer.clone(), string]);
    assert_eq!(errors.len(), 1);

    // the contradictory candidates above do not leak into this call
    let (resolved, errors) = infer_generic_call(&store, &pick, &[integer.clone(), integer]);
    assert!(errors.is_empty());
    assert_eq!(store.render(resolved.return_ty.as_ref().unwrap()), "Integer");
}

#[test]
fn generic_references_are_validated_structurally() {
    let mut bad = ClassDecl::new("Bad");
    bad.fields.push(FieldDecl::new(
        "a",
        TypeNode::generic("Number", vec![TypeNode::named("Integer")]),
    ));
    bad.fields.push(FieldDecl::new(
        "b",
        TypeNode::generic(
            "List",
            vec![TypeNode::named("Integer"), TypeNode::named("Integer")],
        ),
    ));
    bad.fields
        .push(FieldDecl::new("c", TypeNode::generic("List", vec![TypeNode::named("int")])));
    bad.fields.push(FieldDecl::new("d", TypeNode::named("Missing")));

    let mut decls = collections();
    decls.push(TypeDecl::Class(bad));
    let (store, _, module) = setup(decls);

    let messages: Vec<String> = store
        .module(module)
        .errors
        .iter()
        .map(|e| e.message.clone())
        .collect();
    assert!(messages.iter().any(|m| m == "type 'Number' is not generic"));
    assert!(messages
        .iter()
        .any(|m| m.contains("declares 1 generic parameter(s), but 2 type argument(s)")));
    assert!(messages
        .iter()
        .any(|m| m == "a primitive type cannot be used as a type argument"));
    assert!(messages.iter().any(|m| m == "type 'Missing' is not defined"));

    // unresolvable member types fall back to the root type
    let bad_ty = Ty::Class(class_id(&store, "Bad"));
    let fallback = store
        .field(&bad_ty, "d", type_system::Visibility::Public, false)
        .expect("field survives with fallback type");
    assert_eq!(store.render(&fallback.ty), "Object");
}
