//! Symbols, annotations, and the per-unit symbol table
//!
//! Symbols carry a `parent` pointer to their lexically enclosing declaration
//! (local → method → class), which gives the suppression resolver an
//! explicit ancestry chain to walk instead of re-deriving it per call site.

use crate::sem::{SymbolId, TypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of declaration a symbol is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Interface,
    Method,
    Constructor,
    Field,
    Parameter,
    Local,
}

/// Visibility of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    /// Rank for "at least as visible as" comparisons; higher is wider.
    pub const fn rank(self) -> u8 {
        match self {
            Visibility::Public => 3,
            Visibility::Protected => 2,
            Visibility::Internal => 1,
            Visibility::Private => 0,
        }
    }

    pub const fn at_least(self, other: Visibility) -> bool {
        self.rank() >= other.rank()
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        };
        write!(f, "{}", name)
    }
}

/// Position of a declaration or tree node in source
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourceLocation {
    pub file_id: u32,
    /// 1-based
    pub line: u32,
    /// 1-based
    pub column: u32,
    pub byte_offset: u32,
}

impl SourceLocation {
    pub const fn new(file_id: u32, line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            file_id,
            line,
            column,
            byte_offset,
        }
    }

    pub const fn unknown() -> Self {
        Self::new(u32::MAX, 0, 0, 0)
    }

    pub const fn is_valid(self) -> bool {
        self.file_id != u32::MAX
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}:{}", self.file_id, self.line, self.column)
        } else {
            write!(f, "<unknown>")
        }
    }
}

/// A resolved annotation attached to a declaration.
///
/// Markers are matched by fully qualified name. String arguments carry
/// suppression keys; the integer argument carries the object-parameter
/// position of a static initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub qualified_name: String,
    #[serde(default)]
    pub string_args: Vec<String>,
    #[serde(default)]
    pub int_arg: Option<u32>,
}

impl Annotation {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            string_args: Vec::new(),
            int_arg: None,
        }
    }

    pub fn with_strings(mut self, args: &[&str]) -> Self {
        self.string_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_int(mut self, arg: u32) -> Self {
        self.int_arg = Some(arg);
        self
    }
}

/// One resolved declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// For variables/parameters/fields: the declared type.
    /// For classes/interfaces: the type the declaration introduces.
    /// For methods: the return type.
    pub type_id: TypeId,
    pub visibility: Visibility,
    pub is_static: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Lexically enclosing declaration, if any
    pub parent: Option<SymbolId>,
    /// For members: the type that declares them
    pub declaring_type: Option<TypeId>,
    pub location: SourceLocation,
}

impl Symbol {
    /// Find an annotation by fully qualified name
    pub fn annotation(&self, qualified_name: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.qualified_name == qualified_name)
    }

    pub fn has_annotation(&self, qualified_name: &str) -> bool {
        self.annotation(qualified_name).is_some()
    }
}

/// Per-unit symbol table, Vec-backed with `SymbolId` as the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id; the caller fills in the symbol via `insert`.
    pub fn next_id(&self) -> SymbolId {
        SymbolId::from_raw(self.symbols.len() as u32)
    }

    /// Insert a symbol. Its id must be the one handed out by `next_id`.
    pub fn insert(&mut self, symbol: Symbol) -> SymbolId {
        debug_assert_eq!(symbol.id, self.next_id(), "symbol ids must be dense");
        let id = symbol.id;
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if !id.is_valid() {
            return None;
        }
        self.symbols.get(id.index())
    }

    /// Name for diagnostics, with a placeholder for unresolvable ids
    pub fn name_of(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("<unknown>")
    }

    /// Methods declared directly by `declaring_type`, in declaration order
    pub fn methods_of_type(&self, declaring_type: TypeId) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |s| {
            s.kind == SymbolKind::Method && s.declaring_type == Some(declaring_type)
        })
    }

    /// The class or interface symbol that introduces `type_id`
    pub fn type_declaration(&self, type_id: TypeId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| {
            matches!(s.kind, SymbolKind::Class | SymbolKind::Interface) && s.type_id == type_id
        })
    }

    /// Walk the lexical ancestry starting at `id` (inclusive)
    pub fn ancestry(&self, id: SymbolId) -> Ancestry<'_> {
        Ancestry {
            table: self,
            current: Some(id),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

/// Iterator over a symbol's lexical ancestry chain
pub struct Ancestry<'a> {
    table: &'a SymbolTable,
    current: Option<SymbolId>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a Symbol;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = self.table.get(self.current?)?;
        self.current = symbol.parent;
        Some(symbol)
    }
}
