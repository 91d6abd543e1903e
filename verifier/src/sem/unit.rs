//! One resolved compilation unit, as handed over by the host compiler

use crate::sem::{SymbolTable, TypeTable, TypedClass, TypedFunction, UnitId};
use serde::{Deserialize, Serialize};

/// A resolved source file plus its symbol and type tables.
///
/// Units are self-contained: every `SymbolId` and `TypeId` in the tree
/// indexes into this unit's own tables. The engine treats the whole
/// structure as read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub id: UnitId,
    /// File id shared with the driver's source map
    pub file_id: u32,
    /// Unit name for logs, usually the source path
    pub name: String,
    #[serde(default)]
    pub classes: Vec<TypedClass>,
    /// Top-level functions outside any class
    #[serde(default)]
    pub functions: Vec<TypedFunction>,
    pub symbols: SymbolTable,
    pub types: TypeTable,
}

impl CompilationUnit {
    /// Every function body in the unit, in declaration order: top-level
    /// functions first, then per class its constructors and methods.
    pub fn all_functions(&self) -> impl Iterator<Item = &TypedFunction> {
        self.functions.iter().chain(self.classes.iter().flat_map(|c| {
            c.constructors.iter().chain(c.methods.iter())
        }))
    }
}
