//! Type table for one compilation unit
//!
//! Holds every type the unit's resolved tree refers to. Class and interface
//! types carry their direct supertypes so the verifiers can walk the full
//! inheritance closure; all lookups resolve defensively to `None` rather
//! than failing.

use crate::sem::TypeId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Kind of a resolved type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// Class type with its direct superclass/interface types
    Class {
        qualified_name: String,
        supertypes: Vec<TypeId>,
    },
    /// Interface type with its directly extended interfaces
    Interface {
        qualified_name: String,
        supertypes: Vec<TypeId>,
    },
    /// Built-in value type (int, bool, string, ...)
    Primitive { name: String },
    /// Function type, as carried by lambda expressions
    Function {
        parameters: Vec<TypeId>,
        return_type: TypeId,
    },
    /// No value
    Void,
    /// Could not be resolved by the host compiler; nothing to check
    Unknown,
}

/// One entry in the type table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub id: TypeId,
    pub kind: TypeKind,
}

impl Type {
    /// Fully qualified name, for class-like and primitive types
    pub fn qualified_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Class { qualified_name, .. } | TypeKind::Interface { qualified_name, .. } => {
                Some(qualified_name)
            }
            TypeKind::Primitive { name } => Some(name),
            _ => None,
        }
    }

    /// Direct supertypes, empty for non-class types
    pub fn supertypes(&self) -> &[TypeId] {
        match &self.kind {
            TypeKind::Class { supertypes, .. } | TypeKind::Interface { supertypes, .. } => {
                supertypes
            }
            _ => &[],
        }
    }
}

/// Per-unit registry of resolved types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type and return its id
    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(Type { id, kind });
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        if !id.is_valid() {
            return None;
        }
        self.types.get(id.index())
    }

    /// Resolve a fully qualified name to a type id. Units are small, so a
    /// linear scan is cheaper than maintaining an index across serde.
    pub fn lookup(&self, qualified_name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .find(|t| t.qualified_name() == Some(qualified_name))
            .map(|t| t.id)
    }

    /// Short display name: the segment after the last `.`, or a placeholder
    pub fn display_name(&self, id: TypeId) -> &str {
        self.get(id)
            .and_then(|t| t.qualified_name())
            .map(|q| q.rsplit('.').next().unwrap_or(q))
            .unwrap_or("<unresolved>")
    }

    /// The type itself plus every supertype reachable through extends /
    /// implements edges, breadth-first, deduplicated, deterministic order.
    pub fn supertype_closure(&self, id: TypeId) -> Vec<TypeId> {
        let mut closure = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !current.is_valid() || closure.contains(&current) {
                continue;
            }
            let Some(ty) = self.get(current) else {
                continue;
            };
            closure.push(current);
            for &sup in ty.supertypes() {
                queue.push_back(sup);
            }
        }
        closure
    }

    /// Does `id`'s supertype closure contain the type named `qualified_name`?
    pub fn closure_contains(&self, id: TypeId, qualified_name: &str) -> bool {
        let Some(marker) = self.lookup(qualified_name) else {
            return false;
        };
        self.supertype_closure(id).contains(&marker)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
