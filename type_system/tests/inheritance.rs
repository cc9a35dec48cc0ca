//! Member resolution and inheritance-contract scenarios, driven through
//! the declaration records the parser hands over.

use diagnostics::Range;
use type_system::{
    builtins,
    decl::{ClassDecl, EnumDecl, FieldDecl, InterfaceDecl, MethodDecl, ParamDecl, TypeDecl, TypeNode},
    resolver, BodyId, Builtins, CallingConvention, ClassId, DeclId, InterfaceId, MethodHandle,
    ModuleId, Ty, TypeStore, Visibility,
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

fn error_messages(store: &TypeStore, module: ModuleId) -> Vec<String> {
    store
        .module(module)
        .errors
        .iter()
        .map(|e| e.message.clone())
        .collect()
}

fn abstract_method(identifier: &str, return_ty: &str) -> MethodDecl {
    let mut m = MethodDecl::new(identifier);
    m.is_abstract = true;
    m.return_ty = Some(TypeNode::named(return_ty));
    m
}

#[test]
fn missing_abstract_method_is_reported_by_name() {
    let mut shape = ClassDecl::new("Shape");
    shape.is_abstract = true;
    shape.methods.push(abstract_method("area", "double"));

    let mut circle = ClassDecl::new("Circle");
    circle.extends = Some(TypeNode::named("Shape"));

    let (store, _, module) = setup(vec![TypeDecl::Class(shape), TypeDecl::Class(circle)]);

    let messages = error_messages(&store, module);
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0],
        "class 'Circle' must be declared abstract or implement: double area()"
    );
}

#[test]
fn providing_the_abstract_method_removes_the_error() {
    let mut shape = ClassDecl::new("Shape");
    shape.is_abstract = true;
    shape.methods.push(abstract_method("area", "double"));

    let mut circle = ClassDecl::new("Circle");
    circle.extends = Some(TypeNode::named("Shape"));
    let mut area = MethodDecl::new("area");
    area.return_ty = Some(TypeNode::named("double"));
    circle.methods.push(area);

    let (store, _, module) = setup(vec![TypeDecl::Class(shape), TypeDecl::Class(circle)]);
    assert!(error_messages(&store, module).is_empty());
}

#[test]
fn abstract_classes_may_defer_implementation() {
    let mut shape = ClassDecl::new("Shape");
    shape.is_abstract = true;
    shape.methods.push(abstract_method("area", "double"));

    let mut partial = ClassDecl::new("Partial");
    partial.is_abstract = true;
    partial.extends = Some(TypeNode::named("Shape"));

    let (store, _, module) = setup(vec![TypeDecl::Class(shape), TypeDecl::Class(partial)]);
    assert!(error_messages(&store, module).is_empty());
}

#[test]
fn unimplemented_interface_method_names_the_interface() {
    let mut drawable = InterfaceDecl::new("Drawable");
    let mut draw = MethodDecl::new("draw");
    draw.return_ty = None;
    drawable.methods.push(draw);

    let mut board = ClassDecl::new("Board");
    board.implements.push(TypeNode::named("Drawable"));

    let (store, _, module) = setup(vec![
        TypeDecl::Interface(drawable),
        TypeDecl::Class(board),
    ]);

    let messages = error_messages(&store, module);
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0],
        "method 'void draw()' of interface 'Drawable' is not implemented"
    );
}

#[test]
fn default_method_is_synthesized_and_receives_its_body_later() {
    let mut greeter = InterfaceDecl::new("Greeter");
    let mut greet = MethodDecl::new("greet");
    greet.is_default = true;
    greet.return_ty = Some(TypeNode::named("String"));
    greeter.methods.push(greet);

    let mut host = ClassDecl::new("Host");
    host.implements.push(TypeNode::named("Greeter"));

    let (mut store, _, module) = setup(vec![
        TypeDecl::Interface(greeter),
        TypeDecl::Class(host),
    ]);
    assert!(error_messages(&store, module).is_empty());

    let host_id = class_id(&store, "Host");
    let greeter_id = interface_id(&store, "Greeter");

    let synthesized = &store.class(host_id).methods[0];
    assert!(synthesized.identifier == "greet");
    assert!(synthesized.is_default);
    assert_eq!(synthesized.body, None);
    assert_eq!(synthesized.owner, DeclId::Class(host_id));

    let original_handle = MethodHandle {
        owner: DeclId::Interface(greeter_id),
        index: 0,
    };
    let expected_name = store
        .method(original_handle)
        .internal_name(CallingConvention::Java, &store)
        .to_string();
    assert_eq!(
        store.class(host_id).methods[0].dispatch_name(CallingConvention::Java, &store),
        expected_name
    );

    // the code generator produces the interface method's body, then the
    // synthesized copy takes it over
    store.set_method_body(original_handle, BodyId(7));
    store.attach_generated_bodies();
    assert_eq!(store.class(host_id).methods[0].body, Some(BodyId(7)));
    assert_eq!(store.method(original_handle).body, Some(BodyId(7)));
}

#[test]
fn comparable_box_unifies_to_the_concrete_parameter() {
    let mut class_box = ClassDecl::new("Box");
    class_box
        .implements
        .push(TypeNode::generic("Comparable", vec![TypeNode::named("Box")]));
    let mut compare_to = MethodDecl::new("compareTo");
    compare_to
        .params
        .push(ParamDecl::new("other", TypeNode::named("Box")));
    compare_to.return_ty = Some(TypeNode::named("int"));
    class_box.methods.push(compare_to);

    let (store, installed, module) = setup(vec![TypeDecl::Class(class_box)]);
    assert!(error_messages(&store, module).is_empty());

    let box_id = class_id(&store, "Box");
    let method = &store.class(box_id).methods[0];

    // the override takes a Box, not a raw T
    assert_eq!(method.parameters[0].ty, Ty::Class(box_id));

    // and dispatches under the interface's generic-parameter-derived name
    let origin = MethodHandle {
        owner: DeclId::Interface(installed.comparable),
        index: 0,
    };
    let interface_name = store
        .method(origin)
        .internal_name(CallingConvention::Java, &store)
        .to_string();
    assert_eq!(
        method.dispatch_name(CallingConvention::Java, &store),
        interface_name
    );
    assert!(interface_name.contains("$T"));
}

#[test]
fn private_fields_are_not_inherited_but_protected_are() {
    let mut base = ClassDecl::new("Base");
    let mut hidden = FieldDecl::new("hidden", TypeNode::named("int"));
    hidden.visibility = Visibility::Private;
    base.fields.push(hidden);
    let mut shared = FieldDecl::new("shared", TypeNode::named("int"));
    shared.visibility = Visibility::Protected;
    base.fields.push(shared);

    let mut sub = ClassDecl::new("Sub");
    sub.extends = Some(TypeNode::named("Base"));

    let (store, _, _) = setup(vec![TypeDecl::Class(base), TypeDecl::Class(sub)]);

    let base_ty = Ty::Class(class_id(&store, "Base"));
    let sub_ty = Ty::Class(class_id(&store, "Sub"));

    // own private field is visible from inside the class itself
    assert!(store
        .field(&base_ty, "hidden", Visibility::Private, false)
        .is_some());
    // but never through the subclass, even with the private ceiling
    assert!(store
        .field(&sub_ty, "hidden", Visibility::Private, false)
        .is_none());
    // the protected one survives the hop
    let inherited = store
        .field(&sub_ty, "shared", Visibility::Private, false)
        .expect("protected field is inherited");
    assert_eq!(inherited.visibility, Visibility::Protected);
}

#[test]
fn override_resolution_takes_the_first_match_up_the_chain() {
    let mut base = ClassDecl::new("Base");
    let mut describe = MethodDecl::new("describe");
    describe.return_ty = Some(TypeNode::named("String"));
    base.methods.push(describe.clone());

    let mut sub = ClassDecl::new("Sub");
    sub.extends = Some(TypeNode::named("Base"));
    sub.methods.push(describe);

    let (store, _, _) = setup(vec![TypeDecl::Class(base), TypeDecl::Class(sub)]);

    let sub_id = class_id(&store, "Sub");
    let sub_ty = Ty::Class(sub_id);
    let first = store
        .all_methods_of(&sub_ty)
        .into_iter()
        .find(|m| m.identifier == "describe")
        .expect("method resolves");
    assert_eq!(first.owner, DeclId::Class(sub_id));

    // the flattened view also keeps only the override
    let inherited = store.all_inherited_methods(&sub_ty);
    assert_eq!(
        inherited
            .iter()
            .filter(|m| m.identifier == "describe")
            .count(),
        1
    );
}

#[test]
fn enum_constants_become_static_final_fields() {
    let mut color = EnumDecl::new("Color");
    color.values.push(("RED".to_string(), Range::EMPTY));
    color.values.push(("GREEN".to_string(), Range::EMPTY));

    let (store, _, module) = setup(vec![TypeDecl::Enum(color)]);
    assert!(error_messages(&store, module).is_empty());

    let color_ty = match store.lookup("Color") {
        Some(ty @ Ty::Enum(_)) => ty.clone(),
        other => panic!("expected enum, found {:?}", other),
    };

    let red = store
        .field(&color_ty, "RED", Visibility::Public, true)
        .expect("constant exists");
    assert!(red.is_static && red.is_final);
    assert_eq!(red.ty, color_ty);

    let values = store
        .possible_methods(&color_ty, "values", false, true)
        .into_iter()
        .next()
        .expect("values() exists");
    assert!(values.has_native_implementation);

    // name() and ordinal() come from the implicit Enum base class
    assert!(!store.possible_methods(&color_ty, "ordinal", false, false).is_empty());
}

#[test]
fn enum_casts_only_to_its_interfaces_and_the_root() {
    let paintable = InterfaceDecl::new("Paintable");

    let mut color = EnumDecl::new("Color");
    color.implements.push(TypeNode::named("Paintable"));
    color.values.push(("RED".to_string(), Range::EMPTY));

    let other = EnumDecl::new("Shade");

    let (store, installed, _) = setup(vec![
        TypeDecl::Interface(paintable),
        TypeDecl::Enum(color),
        TypeDecl::Enum(other),
    ]);

    let color_ty = store.lookup("Color").unwrap().clone();
    let shade_ty = store.lookup("Shade").unwrap().clone();
    let paintable_ty = store.lookup("Paintable").unwrap().clone();

    assert!(store.can_implicitly_cast(&color_ty, &paintable_ty));
    assert!(store.can_implicitly_cast(&color_ty, &Ty::Class(installed.object)));
    assert!(!store.can_implicitly_cast(&color_ty, &Ty::Class(installed.string)));
    assert!(store.can_implicitly_cast(&color_ty, &color_ty));
    assert!(!store.can_implicitly_cast(&color_ty, &shade_ty));
}

#[test]
fn every_superclass_chain_terminates_at_the_root() {
    let base = ClassDecl::new("Base");
    let mut mid = ClassDecl::new("Mid");
    mid.extends = Some(TypeNode::named("Base"));
    let mut leaf = ClassDecl::new("Leaf");
    leaf.extends = Some(TypeNode::named("Mid"));

    let (store, installed, _) = setup(vec![
        TypeDecl::Class(base),
        TypeDecl::Class(mid),
        TypeDecl::Class(leaf),
    ]);

    let mut current = Ty::Class(class_id(&store, "Leaf"));
    let mut hops = 0;
    while let Some(superclass) = store.extends_of(&current).cloned() {
        current = superclass;
        hops += 1;
        assert!(hops < 10, "chain must terminate");
    }
    assert_eq!(current, Ty::Class(installed.object));
}

#[test]
fn cyclic_inheritance_is_cut_and_reported() {
    let mut a = ClassDecl::new("A");
    a.extends = Some(TypeNode::named("B"));
    let mut b = ClassDecl::new("B");
    b.extends = Some(TypeNode::named("A"));

    let (store, installed, module) = setup(vec![TypeDecl::Class(a), TypeDecl::Class(b)]);

    let messages = error_messages(&store, module);
    assert!(messages.iter().any(|m| m.contains("cyclic inheritance")));

    // the cut chain still terminates at the root
    let a_ty = Ty::Class(class_id(&store, "A"));
    assert!(store.can_implicitly_cast(&a_ty, &Ty::Class(installed.object)));
}

#[test]
fn interface_constants_are_reachable_through_extension() {
    let mut config = InterfaceDecl::new("Config");
    let mut size = FieldDecl::new("SIZE", TypeNode::named("int"));
    size.visibility = Visibility::Public;
    config.fields.push(size);

    let mut extended = InterfaceDecl::new("Extended");
    extended.extends.push(TypeNode::named("Config"));

    let (store, _, _) = setup(vec![
        TypeDecl::Interface(config),
        TypeDecl::Interface(extended),
    ]);

    let config_ty = Ty::Interface(interface_id(&store, "Config"));
    let extended_ty = Ty::Interface(interface_id(&store, "Extended"));

    let own = store
        .field(&config_ty, "SIZE", Visibility::Public, false)
        .expect("constant on the declaring interface");
    assert!(own.is_static && own.is_final);

    assert!(store
        .field(&extended_ty, "SIZE", Visibility::Public, false)
        .is_some());
}

#[test]
fn visibility_ceiling_depends_on_the_class_context() {
    let base = ClassDecl::new("Base");
    let mut sub = ClassDecl::new("Sub");
    sub.extends = Some(TypeNode::named("Base"));
    let unrelated = ClassDecl::new("Unrelated");

    let (store, _, _) = setup(vec![
        TypeDecl::Class(base),
        TypeDecl::Class(sub),
        TypeDecl::Class(unrelated),
    ]);

    let base_ty = Ty::Class(class_id(&store, "Base"));
    let sub_ty = Ty::Class(class_id(&store, "Sub"));
    let unrelated_ty = Ty::Class(class_id(&store, "Unrelated"));

    assert_eq!(
        store.visibility_up_to(&base_ty, Some(&base_ty)),
        Visibility::Private
    );
    assert_eq!(
        store.visibility_up_to(&base_ty, Some(&sub_ty)),
        Visibility::Protected
    );
    assert_eq!(
        store.visibility_up_to(&base_ty, Some(&unrelated_ty)),
        Visibility::Public
    );
    assert_eq!(store.visibility_up_to(&base_ty, None), Visibility::Public);
}

#[test]
fn single_method_interfaces_are_functional() {
    let mut runnable = InterfaceDecl::new("Runnable");
    runnable.methods.push(MethodDecl::new("run"));
    let marker = InterfaceDecl::new("Marker");

    let (store, _, _) = setup(vec![
        TypeDecl::Interface(runnable),
        TypeDecl::Interface(marker),
    ]);

    assert!(store.interface(interface_id(&store, "Runnable")).is_functional());
    assert!(!store.interface(interface_id(&store, "Marker")).is_functional());
}

#[test]
fn shadowing_fields_get_prefixed_internal_names() {
    let mut base = ClassDecl::new("Base");
    base.fields.push(FieldDecl::new("value", TypeNode::named("int")));
    let mut sub = ClassDecl::new("Sub");
    sub.extends = Some(TypeNode::named("Base"));
    sub.fields.push(FieldDecl::new("value", TypeNode::named("int")));

    let (store, _, _) = setup(vec![TypeDecl::Class(base), TypeDecl::Class(sub)]);

    let base_id = class_id(&store, "Base");
    let sub_id = class_id(&store, "Sub");
    assert_eq!(store.class(base_id).fields[0].internal_name(&store), "value");
    assert_eq!(store.class(sub_id).fields[0].internal_name(&store), "_value");
}

#[test]
fn constructors_mangle_under_their_own_shorthand() {
    let mut point = ClassDecl::new("Point");
    let mut ctor = MethodDecl::new("Point");
    ctor.is_constructor = true;
    ctor.params.push(ParamDecl::new("x", TypeNode::named("int")));
    point.methods.push(ctor);

    let (store, _, _) = setup(vec![TypeDecl::Class(point)]);

    let point_id = class_id(&store, "Point");
    let ctor = &store.class(point_id).methods[0];
    assert_eq!(
        ctor.internal_name(CallingConvention::Java, &store),
        "_cj$_constructor_$void$int"
    );
    assert_eq!(
        ctor.internal_name(CallingConvention::Native, &store),
        "_cn$_constructor_$void$int"
    );
}

#[test]
fn diagnostics_render_with_module_and_position() {
    let mut broken = ClassDecl::new("Broken");
    broken.extends = Some(TypeNode::named("Nowhere"));

    let (store, _, module) = setup(vec![TypeDecl::Class(broken)]);

    let mut buffer = diagnostics::no_color_buffer();
    store.write_diagnostics(module, &mut buffer).unwrap();
    let rendered = String::from_utf8(buffer.into_inner()).unwrap();
    assert_eq!(
        rendered,
        "error: type 'Nowhere' is not defined (Main.java:1:1)\n"
    );
}

#[test]
fn transitivity_over_chains_of_depth_three() {
    let base = ClassDecl::new("Base");
    let mut mid = ClassDecl::new("Mid");
    mid.extends = Some(TypeNode::named("Base"));
    let mut leaf = ClassDecl::new("Leaf");
    leaf.extends = Some(TypeNode::named("Mid"));

    let (store, _, _) = setup(vec![
        TypeDecl::Class(base),
        TypeDecl::Class(mid),
        TypeDecl::Class(leaf),
    ]);

    let base_ty = Ty::Class(class_id(&store, "Base"));
    let mid_ty = Ty::Class(class_id(&store, "Mid"));
    let leaf_ty = Ty::Class(class_id(&store, "Leaf"));

    assert!(store.can_implicitly_cast(&leaf_ty, &mid_ty));
    assert!(store.can_implicitly_cast(&mid_ty, &base_ty));
    assert!(store.can_implicitly_cast(&leaf_ty, &base_ty));
    assert!(!store.can_implicitly_cast(&base_ty, &leaf_ty));
    // the cast operator may still go downward
    assert!(store.can_explicitly_cast(&base_ty, &leaf_ty));
}
