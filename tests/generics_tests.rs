use javaparse::ast::*;
use javaparse::{parse, parse_type};

#[test]
fn nested_type_arguments_split_composite_gt() {
    // the `>>` closing both lists lexes as one token and is split while
    // closing
    let ty = parse_type("Map<String, List<Integer>>").expect("failed to parse");
    let Type::Reference(map) = ty else {
        panic!("expected reference type");
    };
    let arguments = map.type_arguments.expect("type arguments");
    assert_eq!(arguments.len(), 2);
    let TypeArgument::Type(Type::Reference(list)) = &arguments[1] else {
        panic!("expected concrete argument");
    };
    assert_eq!(list.name, "List");
    assert!(list.type_arguments.is_some());
}

#[test]
fn triply_nested_type_arguments_split_urshift() {
    let ty = parse_type("List<List<List<String>>>").expect("failed to parse");
    let Type::Reference(outer) = ty else {
        panic!("expected reference type");
    };
    let outer_arguments = outer.type_arguments.expect("arguments");
    let TypeArgument::Type(Type::Reference(middle)) = &outer_arguments[0] else {
        panic!("expected middle list");
    };
    let TypeArgument::Type(Type::Reference(inner)) =
        &middle.type_arguments.as_ref().expect("arguments")[0]
    else {
        panic!("expected inner list");
    };
    assert_eq!(inner.name, "List");
}

#[test]
fn composite_gt_splits_in_declarations_too() {
    let unit = parse("class A { Map<K, Set<V>> index; }").expect("failed to parse");
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    assert!(matches!(class.body[0], MemberDeclaration::Field(_)));
}

#[test]
fn wildcards_with_bounds() {
    let ty = parse_type("Map<? extends K, ? super V>").expect("failed to parse");
    let Type::Reference(map) = ty else {
        panic!("expected reference type");
    };
    let arguments = map.type_arguments.expect("type arguments");
    let TypeArgument::Wildcard(upper) = &arguments[0] else {
        panic!("expected wildcard");
    };
    assert!(matches!(
        upper.bound,
        Some((BoundKind::Extends, _))
    ));
    let TypeArgument::Wildcard(lower) = &arguments[1] else {
        panic!("expected wildcard");
    };
    assert!(matches!(lower.bound, Some((BoundKind::Super, _))));
}

#[test]
fn unbounded_wildcard() {
    let ty = parse_type("Class<?>").expect("failed to parse");
    let Type::Reference(class) = ty else {
        panic!("expected reference type");
    };
    let arguments = class.type_arguments.expect("arguments");
    let TypeArgument::Wildcard(wildcard) = &arguments[0] else {
        panic!("expected wildcard");
    };
    assert!(wildcard.bound.is_none());
}

#[test]
fn qualified_type_with_arguments_on_both_segments() {
    let ty = parse_type("Outer<T>.Inner<U>").expect("failed to parse");
    let Type::Reference(outer) = ty else {
        panic!("expected reference type");
    };
    assert_eq!(outer.name, "Outer");
    assert!(outer.type_arguments.is_some());
    let inner = outer.sub_type.expect("sub type");
    assert_eq!(inner.name, "Inner");
    assert!(inner.type_arguments.is_some());
}

#[test]
fn array_of_parameterized_type() {
    let ty = parse_type("List<String>[][]").expect("failed to parse");
    assert_eq!(ty.dimensions(), 2);
}

#[test]
fn intersection_bounds_on_type_parameters() {
    let unit = parse("class Box<T extends Comparable<T> & Cloneable> {}")
        .expect("failed to parse");
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    assert_eq!(class.type_parameters.len(), 1);
    assert_eq!(class.type_parameters[0].bounds.len(), 2);
}

#[test]
fn generic_method_declaration_and_diamond() {
    let unit = parse(
        r#"
class Lists {
    static <E> List<E> of(E first) {
        List<E> out = new ArrayList<>();
        out.add(first);
        return out;
    }
}
"#,
    )
    .expect("failed to parse");
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    let MemberDeclaration::Method(method) = &class.body[0] else {
        panic!("expected method");
    };
    assert_eq!(method.type_parameters.len(), 1);
    let return_type = method.return_type.as_ref().expect("return type");
    let Type::Reference(reference) = return_type else {
        panic!("expected reference return type");
    };
    assert_eq!(reference.name, "List");
}

#[test]
fn less_than_stays_an_operator_in_expressions() {
    let unit = parse("class A { void f() { boolean b = a < x && y > c; } }")
        .expect("failed to parse");
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    let MemberDeclaration::Method(method) = &class.body[0] else {
        panic!("expected method");
    };
    let body = method.body.as_ref().expect("body");
    let Statement::LocalVariable(declaration) = &body.statements[0] else {
        panic!("expected declaration");
    };
    let Some(Expression::Binary(and)) = &declaration.declarators[0].initializer else {
        panic!("expected binary initializer");
    };
    assert_eq!(and.operator, BinaryOperator::LogicalAnd);
}

#[test]
fn type_arguments_versus_comparison_in_declaration() {
    // `a<b, c> d;` is a declaration when it appears in statement position
    let unit = parse("class A { void f() { a<b, c> d; } }").expect("failed to parse");
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    let MemberDeclaration::Method(method) = &class.body[0] else {
        panic!("expected method");
    };
    let body = method.body.as_ref().expect("body");
    assert!(matches!(body.statements[0], Statement::LocalVariable(_)));
}
