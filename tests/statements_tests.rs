use javaparse::ast::*;
use javaparse::parse;

fn method_body(body_source: &str) -> Vec<Statement> {
    let source = format!("class A {{ void f() {{ {} }} }}", body_source);
    let unit = parse(&source).expect("failed to parse");
    let TypeDeclaration::Class(class) = unit.types.into_iter().next().expect("one type") else {
        panic!("expected class");
    };
    let Some(MemberDeclaration::Method(method)) = class.body.into_iter().next() else {
        panic!("expected method");
    };
    method.body.expect("method body").statements
}

#[test]
fn if_else_chain() {
    let statements = method_body("if (a) x = 1; else if (b) x = 2; else x = 3;");
    let Statement::If(outer) = &statements[0] else {
        panic!("expected if");
    };
    let Some(else_branch) = &outer.else_branch else {
        panic!("expected else branch");
    };
    assert!(matches!(else_branch.as_ref(), Statement::If(_)));
}

#[test]
fn while_and_do_while() {
    let statements = method_body("while (running) step(); do { step(); } while (running);");
    assert!(matches!(statements[0], Statement::While(_)));
    let Statement::DoWhile(do_while) = &statements[1] else {
        panic!("expected do-while");
    };
    assert!(matches!(do_while.body.as_ref(), Statement::Block(_)));
}

#[test]
fn classic_for_with_declaration_init() {
    let statements = method_body("for (int i = 0, n = xs.length; i < n; i++) use(xs[i]);");
    let Statement::For(for_statement) = &statements[0] else {
        panic!("expected for");
    };
    let Some(ForInit::Declaration(declaration)) = &for_statement.init else {
        panic!("expected declaration init");
    };
    assert_eq!(declaration.declarators.len(), 2);
    assert!(for_statement.condition.is_some());
    assert_eq!(for_statement.update.len(), 1);
}

#[test]
fn for_with_expression_init_and_empty_sections() {
    let statements = method_body("for (i = 0, j = 0;;) break;");
    let Statement::For(for_statement) = &statements[0] else {
        panic!("expected for");
    };
    let Some(ForInit::Expressions(init)) = &for_statement.init else {
        panic!("expected expression init");
    };
    assert_eq!(init.len(), 2);
    assert!(for_statement.condition.is_none());
    assert!(for_statement.update.is_empty());
}

#[test]
fn foreach_over_generic_collection() {
    let statements = method_body("for (Map.Entry<K, V> e : map.entrySet()) visit(e);");
    let Statement::ForEach(foreach) = &statements[0] else {
        panic!("expected for-each");
    };
    assert_eq!(foreach.variable.name, "e");
    let Type::Reference(reference) = &foreach.variable.ty else {
        panic!("expected reference type");
    };
    assert_eq!(reference.name, "Map");
    assert!(matches!(
        foreach.iterable,
        Expression::MethodInvocation(_)
    ));
}

#[test]
fn switch_with_grouped_labels_and_default() {
    let statements = method_body(
        r#"
switch (n) {
    case 0:
    case 1:
        low();
        break;
    default:
        high();
}
"#,
    );
    let Statement::Switch(switch) = &statements[0] else {
        panic!("expected switch");
    };
    assert_eq!(switch.cases.len(), 2);
    assert_eq!(switch.cases[0].labels.len(), 2);
    assert_eq!(switch.cases[0].statements.len(), 2);
    assert!(switch.cases[1].labels.is_empty());
}

#[test]
fn try_with_resources_and_multi_catch() {
    let statements = method_body("try (R r = open()) { } catch (A | B e) { }");
    let Statement::Try(try_statement) = &statements[0] else {
        panic!("expected try");
    };
    assert_eq!(try_statement.resources.len(), 1);
    assert_eq!(try_statement.resources[0].name, "r");
    assert_eq!(try_statement.catches.len(), 1);
    let catch = &try_statement.catches[0];
    let names: Vec<_> = catch.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(catch.name, "e");
    assert!(try_statement.finally_block.is_none());
}

#[test]
fn try_finally_without_catch() {
    let statements = method_body("try { work(); } finally { cleanup(); }");
    let Statement::Try(try_statement) = &statements[0] else {
        panic!("expected try");
    };
    assert!(try_statement.catches.is_empty());
    assert!(try_statement.finally_block.is_some());
}

#[test]
fn bare_try_is_rejected() {
    let source = "class A { void f() { try { } } }";
    assert!(parse(source).is_err());
}

#[test]
fn labeled_break_and_continue() {
    let statements = method_body(
        r#"
outer:
for (;;) {
    for (;;) {
        if (done) break outer;
        continue outer;
    }
}
"#,
    );
    let Statement::Labeled(labeled) = &statements[0] else {
        panic!("expected labeled statement");
    };
    assert_eq!(labeled.label, "outer");
}

#[test]
fn synchronized_assert_throw() {
    let statements = method_body(
        r#"
synchronized (lock) { count++; }
assert count > 0 : "empty";
throw new IllegalStateException();
"#,
    );
    assert!(matches!(statements[0], Statement::Synchronized(_)));
    let Statement::Assert(assert_statement) = &statements[1] else {
        panic!("expected assert");
    };
    assert!(assert_statement.message.is_some());
    assert!(matches!(statements[2], Statement::Throw(_)));
}

#[test]
fn local_variable_versus_expression_statement() {
    let statements = method_body(
        r#"
List<String> xs = list();
xs.add("a");
int[] grid = new int[9];
grid[0] = 1;
final long mask = 0xFFL;
"#,
    );
    assert!(matches!(statements[0], Statement::LocalVariable(_)));
    assert!(matches!(statements[1], Statement::Expression(_)));
    assert!(matches!(statements[2], Statement::LocalVariable(_)));
    assert!(matches!(statements[3], Statement::Expression(_)));
    let Statement::LocalVariable(declaration) = &statements[4] else {
        panic!("expected declaration");
    };
    assert_eq!(declaration.modifiers, vec![Modifier::Final]);
}

#[test]
fn empty_statement_and_return() {
    let statements = method_body("; return;");
    assert!(matches!(statements[0], Statement::Empty(_)));
    let Statement::Return(ret) = &statements[1] else {
        panic!("expected return");
    };
    assert!(ret.value.is_none());
}

#[test]
fn missing_semicolon_is_an_error() {
    assert!(parse("class A { void f() { int x = 1 } }").is_err());
}
