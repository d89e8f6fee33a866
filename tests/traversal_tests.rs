use javaparse::ast::*;
use javaparse::parse;

const SOURCE: &str = r#"
package demo;

import java.util.List;

class Inventory {
    private List<String> items;

    int count() {
        int n = 0;
        for (String item : items) {
            n = n + 1;
        }
        return n;
    }
}
"#;

#[test]
fn walk_starts_at_the_root_with_an_empty_path() {
    let unit = parse(SOURCE).expect("failed to parse");
    let mut iter = walk(&unit);
    let (path, node) = iter.next().expect("at least the root");
    assert!(path.is_empty());
    assert_eq!(node.kind(), NodeKind::CompilationUnit);
}

#[test]
fn walk_is_preorder_with_ancestor_paths() {
    let unit = parse(SOURCE).expect("failed to parse");
    for (path, node) in walk(&unit) {
        // every ancestor's position is <= the node's position, spec
        // tree-shape invariant
        if let Some(parent) = path.last() {
            let parent_at = (parent.position().line, parent.position().column);
            let node_at = (node.position().line, node.position().column);
            assert!(parent_at <= node_at, "{:?} above {:?}", parent_at, node_at);
        }
        // the path roots at the compilation unit
        if !path.is_empty() {
            assert_eq!(path[0].kind(), NodeKind::CompilationUnit);
        }
    }
}

#[test]
fn filter_by_kind() {
    let unit = parse(SOURCE).expect("failed to parse");
    let fields = filter(&unit, &[NodeKind::FieldDeclaration]);
    assert_eq!(fields.len(), 1);
    let loops = filter(
        &unit,
        &[NodeKind::ForStatement, NodeKind::ForEachStatement],
    );
    assert_eq!(loops.len(), 1);
}

#[test]
fn collect_concrete_node_types() {
    let unit = parse(SOURCE).expect("failed to parse");
    let methods = collect::<MethodDeclaration>(&unit);
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name, "count");

    let names = collect::<Name>(&unit);
    assert!(names.iter().any(|n| n.name == "items"));

    let returns = collect::<ReturnStatement>(&unit);
    assert_eq!(returns.len(), 1);
}

#[test]
fn children_pairs_carry_attribute_names() {
    let unit = parse(SOURCE).expect("failed to parse");
    let attributes: Vec<_> = unit.children().into_iter().map(|(name, _)| name).collect();
    assert_eq!(attributes, vec!["package", "imports", "types"]);
}

#[test]
fn equality_is_structural_and_ignores_positions() {
    let compact = parse("class A{int x;void f(){x=1;}}").expect("failed to parse");
    let spread = parse("class A {\n    int x;\n\n    void f() {\n        x = 1;\n    }\n}\n")
        .expect("failed to parse");
    assert_eq!(compact, spread);
}

#[test]
fn comments_do_not_change_the_tree() {
    let plain = parse("class A { int x = 1; }").expect("failed to parse");
    let commented =
        parse("class A { /* gap */ int x = // one\n 1; }").expect("failed to parse");
    assert_eq!(plain, commented);
}

#[test]
fn different_trees_are_unequal() {
    let a = parse("class A { int x; }").expect("failed to parse");
    let b = parse("class A { long x; }").expect("failed to parse");
    assert_ne!(a, b);
}

#[test]
fn node_positions_are_set() {
    let unit = parse(SOURCE).expect("failed to parse");
    for (_, node) in walk(&unit) {
        let at = node.position();
        assert!(at.line >= 1, "{:?} has no line", node.kind());
        assert!(at.column >= 1, "{:?} has no column", node.kind());
    }
}
