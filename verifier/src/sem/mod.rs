//! Semantic model of a resolved compilation unit
//!
//! The engine never parses. The host compiler hands over one resolved tree
//! plus symbol and type tables per source file; this module defines that
//! read-only surface: typed id newtypes, the type and symbol tables, the
//! statement/expression variants, and the `CompilationUnit` wrapper.

pub mod id_types;
pub mod node;
pub mod symbols;
pub mod types;
pub mod unit;

pub use id_types::{NodeId, SymbolId, TypeId, UnitId};
pub use node::{
    BinaryOperator, LiteralValue, TypedCatchClause, TypedClass, TypedExpression,
    TypedExpressionKind, TypedField, TypedFunction, TypedParameter, TypedStatement,
    TypedSwitchCase, UnaryOperator,
};
pub use symbols::{Annotation, SourceLocation, Symbol, SymbolKind, SymbolTable, Visibility};
pub use types::{Type, TypeKind, TypeTable};
pub use unit::CompilationUnit;
