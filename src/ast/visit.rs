//! Uniform AST traversal.
//!
//! Every node implements [`Node`], exposing `(attribute-name, children)`
//! pairs in declaration order. [`walk`] yields `(path, node)` pairs in
//! pre-order; [`filter`] selects by [`NodeKind`]; [`collect`] extracts
//! nodes of one concrete type.

use super::nodes::*;
use super::{CompilationUnit, Position};
use std::any::Any;

/// Runtime variant tag of a node, used for kind-based filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    PackageDeclaration,
    ImportDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    AnnotationTypeDeclaration,
    FieldDeclaration,
    VariableDeclarator,
    MethodDeclaration,
    ConstructorDeclaration,
    AnnotationMethod,
    InitializerBlock,
    EnumConstantDeclaration,
    FormalParameter,
    InferredParameter,
    LocalVariableDeclaration,
    Annotation,
    ElementValuePair,
    ElementArrayValue,
    BasicType,
    ReferenceType,
    WildcardArgument,
    TypeParameter,
    Block,
    EmptyStatement,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForEachStatement,
    SwitchStatement,
    SwitchCase,
    BreakStatement,
    ContinueStatement,
    ReturnStatement,
    ThrowStatement,
    TryStatement,
    TryResource,
    CatchClause,
    SynchronizedStatement,
    AssertStatement,
    LabeledStatement,
    Literal,
    Name,
    This,
    MemberReference,
    MethodInvocation,
    SuperMethodInvocation,
    ExplicitConstructorInvocation,
    Parenthesized,
    Cast,
    BinaryOperation,
    InstanceOf,
    UnaryOperation,
    Assignment,
    TernaryExpression,
    InstanceCreation,
    InnerClassCreation,
    ArrayCreation,
    ArrayInitializer,
    ArraySelector,
    MethodReference,
    LambdaExpression,
    ClassReference,
    VoidClassReference,
}

/// Object-safe view over any AST node.
pub trait Node {
    fn kind(&self) -> NodeKind;
    fn position(&self) -> Position;
    /// `(attribute-name, children)` pairs, in declaration order.
    fn children(&self) -> Vec<(&'static str, Vec<&dyn Node>)>;
    fn as_any(&self) -> &dyn Any;
}

fn nodes<T: Node>(items: &[T]) -> Vec<&dyn Node> {
    items.iter().map(|n| n as &dyn Node).collect()
}

fn opt<T: Node>(item: &Option<T>) -> Vec<&dyn Node> {
    item.iter().map(|n| n as &dyn Node).collect()
}

fn one<T: Node>(item: &T) -> Vec<&dyn Node> {
    vec![item as &dyn Node]
}

macro_rules! leaf_node {
    ($ty:ident, $kind:ident) => {
        impl Node for $ty {
            fn kind(&self) -> NodeKind {
                NodeKind::$kind
            }
            fn position(&self) -> Position {
                self.position
            }
            fn children(&self) -> Vec<(&'static str, Vec<&dyn Node>)> {
                Vec::new()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

macro_rules! branch_node {
    ($ty:ident, $kind:ident, |$s:ident| $children:expr) => {
        impl Node for $ty {
            fn kind(&self) -> NodeKind {
                NodeKind::$kind
            }
            fn position(&self) -> Position {
                self.position
            }
            fn children(&self) -> Vec<(&'static str, Vec<&dyn Node>)> {
                let $s = self;
                $children
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

macro_rules! enum_node {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl Node for $ty {
            fn kind(&self) -> NodeKind {
                match self { $($ty::$variant(n) => n.kind(),)+ }
            }
            fn position(&self) -> Position {
                match self { $($ty::$variant(n) => n.position(),)+ }
            }
            fn children(&self) -> Vec<(&'static str, Vec<&dyn Node>)> {
                match self { $($ty::$variant(n) => n.children(),)+ }
            }
            fn as_any(&self) -> &dyn Any {
                match self { $($ty::$variant(n) => n.as_any(),)+ }
            }
        }
    };
}

branch_node!(CompilationUnit, CompilationUnit, |n| vec![
    ("package", opt(&n.package)),
    ("imports", nodes(&n.imports)),
    ("types", nodes(&n.types)),
]);

branch_node!(PackageDeclaration, PackageDeclaration, |n| vec![(
    "annotations",
    nodes(&n.annotations)
)]);

leaf_node!(ImportDeclaration, ImportDeclaration);

enum_node!(TypeDeclaration {
    Class,
    Interface,
    Enum,
    Annotation,
});

branch_node!(ClassDeclaration, ClassDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type_parameters", nodes(&n.type_parameters)),
    ("extends", opt(&n.extends)),
    ("implements", nodes(&n.implements)),
    ("body", nodes(&n.body)),
]);

branch_node!(InterfaceDeclaration, InterfaceDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type_parameters", nodes(&n.type_parameters)),
    ("extends", nodes(&n.extends)),
    ("body", nodes(&n.body)),
]);

branch_node!(EnumDeclaration, EnumDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("implements", nodes(&n.implements)),
    ("constants", nodes(&n.constants)),
    ("body", nodes(&n.body)),
]);

branch_node!(AnnotationTypeDeclaration, AnnotationTypeDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("body", nodes(&n.body)),
]);

enum_node!(MemberDeclaration {
    Field,
    Method,
    Constructor,
    AnnotationMethod,
    Initializer,
    Type,
});

branch_node!(FieldDeclaration, FieldDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type", one(&n.ty)),
    ("declarators", nodes(&n.declarators)),
]);

branch_node!(VariableDeclarator, VariableDeclarator, |n| vec![(
    "initializer",
    opt(&n.initializer)
)]);

branch_node!(MethodDeclaration, MethodDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type_parameters", nodes(&n.type_parameters)),
    ("return_type", opt(&n.return_type)),
    ("parameters", nodes(&n.parameters)),
    ("throws", nodes(&n.throws)),
    ("body", opt(&n.body)),
]);

branch_node!(ConstructorDeclaration, ConstructorDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type_parameters", nodes(&n.type_parameters)),
    ("parameters", nodes(&n.parameters)),
    ("throws", nodes(&n.throws)),
    ("body", one(&n.body)),
]);

branch_node!(AnnotationMethod, AnnotationMethod, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("return_type", one(&n.return_type)),
    ("default_value", opt(&n.default_value)),
]);

branch_node!(InitializerBlock, InitializerBlock, |n| vec![(
    "body",
    one(&n.body)
)]);

branch_node!(EnumConstantDeclaration, EnumConstantDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("arguments", nodes(&n.arguments)),
    (
        "body",
        n.body.as_deref().map(nodes).unwrap_or_default()
    ),
]);

branch_node!(FormalParameter, FormalParameter, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type", one(&n.ty)),
]);

branch_node!(LocalVariableDeclaration, LocalVariableDeclaration, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type", one(&n.ty)),
    ("declarators", nodes(&n.declarators)),
]);

branch_node!(Annotation, Annotation, |n| vec![(
    "element",
    match &n.element {
        Some(AnnotationElement::Value(v)) => vec![v as &dyn Node],
        Some(AnnotationElement::Pairs(pairs)) => nodes(pairs),
        None => Vec::new(),
    }
)]);

branch_node!(ElementValuePair, ElementValuePair, |n| vec![(
    "value",
    one(&n.value)
)]);

branch_node!(ElementArrayValue, ElementArrayValue, |n| vec![(
    "values",
    nodes(&n.values)
)]);

enum_node!(ElementValue {
    Expression,
    Annotation,
    Array,
});

enum_node!(Type { Basic, Reference });

leaf_node!(BasicType, BasicType);

branch_node!(ReferenceType, ReferenceType, |n| vec![
    ("annotations", nodes(&n.annotations)),
    (
        "type_arguments",
        n.type_arguments.as_deref().map(nodes).unwrap_or_default()
    ),
    (
        "sub_type",
        n.sub_type.iter().map(|s| s.as_ref() as &dyn Node).collect()
    ),
]);

enum_node!(TypeArgument { Type, Wildcard });

branch_node!(WildcardArgument, WildcardArgument, |n| vec![(
    "bound",
    n.bound.iter().map(|(_, t)| t as &dyn Node).collect()
)]);

branch_node!(TypeParameter, TypeParameter, |n| vec![(
    "bounds",
    nodes(&n.bounds)
)]);

branch_node!(Block, Block, |n| vec![("statements", nodes(&n.statements))]);

enum_node!(Statement {
    Block,
    Empty,
    Expression,
    LocalVariable,
    TypeDeclaration,
    If,
    While,
    DoWhile,
    For,
    ForEach,
    Switch,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Synchronized,
    Assert,
    Labeled,
});

leaf_node!(EmptyStatement, EmptyStatement);

branch_node!(ExpressionStatement, ExpressionStatement, |n| vec![(
    "expression",
    one(&n.expression)
)]);

branch_node!(IfStatement, IfStatement, |n| vec![
    ("condition", one(&n.condition)),
    ("then_branch", one(n.then_branch.as_ref())),
    (
        "else_branch",
        n.else_branch
            .iter()
            .map(|s| s.as_ref() as &dyn Node)
            .collect()
    ),
]);

branch_node!(WhileStatement, WhileStatement, |n| vec![
    ("condition", one(&n.condition)),
    ("body", one(n.body.as_ref())),
]);

branch_node!(DoWhileStatement, DoWhileStatement, |n| vec![
    ("body", one(n.body.as_ref())),
    ("condition", one(&n.condition)),
]);

branch_node!(ForStatement, ForStatement, |n| vec![
    (
        "init",
        match &n.init {
            Some(ForInit::Declaration(d)) => vec![d as &dyn Node],
            Some(ForInit::Expressions(es)) => nodes(es),
            None => Vec::new(),
        }
    ),
    ("condition", opt(&n.condition)),
    ("update", nodes(&n.update)),
    ("body", one(n.body.as_ref())),
]);

branch_node!(ForEachStatement, ForEachStatement, |n| vec![
    ("variable", one(&n.variable)),
    ("iterable", one(&n.iterable)),
    ("body", one(n.body.as_ref())),
]);

branch_node!(SwitchStatement, SwitchStatement, |n| vec![
    ("selector", one(&n.selector)),
    ("cases", nodes(&n.cases)),
]);

branch_node!(SwitchCase, SwitchCase, |n| vec![
    ("labels", nodes(&n.labels)),
    ("statements", nodes(&n.statements)),
]);

leaf_node!(BreakStatement, BreakStatement);
leaf_node!(ContinueStatement, ContinueStatement);

branch_node!(ReturnStatement, ReturnStatement, |n| vec![(
    "value",
    opt(&n.value)
)]);

branch_node!(ThrowStatement, ThrowStatement, |n| vec![(
    "expression",
    one(&n.expression)
)]);

branch_node!(TryStatement, TryStatement, |n| vec![
    ("resources", nodes(&n.resources)),
    ("block", one(&n.block)),
    ("catches", nodes(&n.catches)),
    ("finally", opt(&n.finally_block)),
]);

branch_node!(TryResource, TryResource, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("type", one(&n.ty)),
    ("value", one(&n.value)),
]);

branch_node!(CatchClause, CatchClause, |n| vec![
    ("annotations", nodes(&n.annotations)),
    ("types", nodes(&n.types)),
    ("block", one(&n.block)),
]);

branch_node!(SynchronizedStatement, SynchronizedStatement, |n| vec![
    ("lock", one(&n.lock)),
    ("block", one(&n.block)),
]);

branch_node!(AssertStatement, AssertStatement, |n| vec![
    ("condition", one(&n.condition)),
    ("message", opt(&n.message)),
]);

branch_node!(LabeledStatement, LabeledStatement, |n| vec![(
    "statement",
    one(n.statement.as_ref())
)]);

enum_node!(Expression {
    Literal,
    Name,
    This,
    MemberReference,
    MethodInvocation,
    SuperMethodInvocation,
    ExplicitConstructorInvocation,
    Parenthesized,
    Cast,
    Binary,
    InstanceOf,
    Unary,
    Assignment,
    Ternary,
    InstanceCreation,
    InnerClassCreation,
    ArrayCreation,
    ArrayInitializer,
    ArraySelector,
    MethodReference,
    Lambda,
    ClassReference,
    VoidClassReference,
});

leaf_node!(Literal, Literal);
leaf_node!(Name, Name);
leaf_node!(ThisExpression, This);

branch_node!(MemberReference, MemberReference, |n| vec![(
    "qualifier",
    n.qualifier
        .iter()
        .map(|q| q.as_ref() as &dyn Node)
        .collect()
)]);

branch_node!(MethodInvocation, MethodInvocation, |n| vec![
    (
        "qualifier",
        n.qualifier
            .iter()
            .map(|q| q.as_ref() as &dyn Node)
            .collect()
    ),
    (
        "type_arguments",
        n.type_arguments.as_deref().map(nodes).unwrap_or_default()
    ),
    ("arguments", nodes(&n.arguments)),
]);

branch_node!(SuperMethodInvocation, SuperMethodInvocation, |n| vec![
    (
        "type_arguments",
        n.type_arguments.as_deref().map(nodes).unwrap_or_default()
    ),
    ("arguments", nodes(&n.arguments)),
]);

branch_node!(
    ExplicitConstructorInvocation,
    ExplicitConstructorInvocation,
    |n| vec![("arguments", nodes(&n.arguments))]
);

branch_node!(ParenthesizedExpression, Parenthesized, |n| vec![(
    "expression",
    one(n.expression.as_ref())
)]);

branch_node!(Cast, Cast, |n| vec![
    ("target_type", one(&n.target_type)),
    ("expression", one(n.expression.as_ref())),
]);

branch_node!(BinaryOperation, BinaryOperation, |n| vec![
    ("left", one(n.left.as_ref())),
    ("right", one(n.right.as_ref())),
]);

branch_node!(InstanceOf, InstanceOf, |n| vec![
    ("expression", one(n.expression.as_ref())),
    ("target_type", one(&n.target_type)),
]);

branch_node!(UnaryOperation, UnaryOperation, |n| vec![(
    "operand",
    one(n.operand.as_ref())
)]);

branch_node!(Assignment, Assignment, |n| vec![
    ("target", one(n.target.as_ref())),
    ("value", one(n.value.as_ref())),
]);

branch_node!(TernaryExpression, TernaryExpression, |n| vec![
    ("condition", one(n.condition.as_ref())),
    ("if_true", one(n.if_true.as_ref())),
    ("if_false", one(n.if_false.as_ref())),
]);

branch_node!(InstanceCreation, InstanceCreation, |n| vec![
    ("target_type", one(&n.target_type)),
    ("arguments", nodes(&n.arguments)),
    ("body", n.body.as_deref().map(nodes).unwrap_or_default()),
]);

branch_node!(InnerClassCreation, InnerClassCreation, |n| vec![
    ("qualifier", one(n.qualifier.as_ref())),
    ("target_type", one(&n.target_type)),
    ("arguments", nodes(&n.arguments)),
    ("body", n.body.as_deref().map(nodes).unwrap_or_default()),
]);

branch_node!(ArrayCreation, ArrayCreation, |n| vec![
    ("element_type", one(&n.element_type)),
    (
        "dimensions",
        n.dimensions
            .iter()
            .flatten()
            .map(|e| e as &dyn Node)
            .collect()
    ),
    ("initializer", opt(&n.initializer)),
]);

branch_node!(ArrayInitializer, ArrayInitializer, |n| vec![(
    "values",
    nodes(&n.values)
)]);

branch_node!(ArraySelector, ArraySelector, |n| vec![
    ("array", one(n.array.as_ref())),
    ("index", one(n.index.as_ref())),
]);

branch_node!(MethodReference, MethodReference, |n| vec![
    ("qualifier", one(n.qualifier.as_ref())),
    (
        "type_arguments",
        n.type_arguments.as_deref().map(nodes).unwrap_or_default()
    ),
]);

branch_node!(LambdaExpression, LambdaExpression, |n| vec![
    ("parameters", nodes(&n.parameters)),
    (
        "body",
        match &n.body {
            LambdaBody::Expression(e) => vec![e.as_ref() as &dyn Node],
            LambdaBody::Block(b) => vec![b as &dyn Node],
        }
    ),
]);

enum_node!(LambdaParameter { Inferred, Typed });

leaf_node!(InferredParameter, InferredParameter);

branch_node!(ClassReference, ClassReference, |n| vec![(
    "target_type",
    one(&n.target_type)
)]);

leaf_node!(VoidClassReference, VoidClassReference);

/// Pre-order iterator over a subtree, yielding each node together with
/// the list of its ancestors from the root.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a dyn Node)>,
    path: Vec<&'a dyn Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Vec<&'a dyn Node>, &'a dyn Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.path.truncate(depth);
        let path = self.path.clone();
        self.path.push(node);
        let children = node.children();
        for (_, group) in children.into_iter().rev() {
            for child in group.into_iter().rev() {
                self.stack.push((depth + 1, child));
            }
        }
        Some((path, node))
    }
}

/// Walk `root` and all descendants in pre-order.
pub fn walk(root: &dyn Node) -> Walk<'_> {
    Walk {
        stack: vec![(0, root)],
        path: Vec::new(),
    }
}

/// All nodes in the subtree (root included) whose kind is in `kinds`.
pub fn filter<'a>(root: &'a dyn Node, kinds: &[NodeKind]) -> Vec<&'a dyn Node> {
    walk(root)
        .filter(|(_, node)| kinds.contains(&node.kind()))
        .map(|(_, node)| node)
        .collect()
}

/// All nodes of the concrete type `T` in the subtree, root included.
pub fn collect<'a, T: Node + 'static>(root: &'a dyn Node) -> Vec<&'a T> {
    walk(root)
        .filter_map(|(_, node)| node.as_any().downcast_ref::<T>())
        .collect()
}
