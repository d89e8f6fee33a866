//! Abstract syntax tree for Java SE 8 source.
//!
//! Nodes are plain structs grouped by category enums (`Expression`,
//! `Statement`, `TypeDeclaration`, ...). Every node implements [`Node`],
//! which exposes its children uniformly for traversal; see [`walk`],
//! [`filter`] and [`collect`].

mod nodes;
mod visit;

pub use nodes::*;
pub use visit::{collect, filter, walk, Node, NodeKind, Walk};

use std::fmt;

/// A location in source text: 1-indexed line and column.
///
/// Positions exist for diagnostics only. Two positions always compare
/// equal, so `#[derive(PartialEq)]` on nodes yields structural equality
/// that ignores where the code came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The start of a source text.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl PartialEq for Position {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Root of the AST produced from one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub package: Option<PackageDeclaration>,
    pub imports: Vec<ImportDeclaration>,
    pub types: Vec<TypeDeclaration>,
    pub position: Position,
}
