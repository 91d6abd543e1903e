//! Typed id newtypes for the semantic model
//!
//! Lightweight u32 wrappers that keep the different identifier spaces from
//! being mixed up. `u32::MAX` is reserved as the invalid sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn as_raw(self) -> u32 {
                self.0
            }

            /// Index into a Vec-backed table
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }

            pub const fn invalid() -> Self {
                Self(u32::MAX)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(<invalid>)", stringify!($name))
                }
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self::from_raw(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.as_raw()
            }
        }
    };
}

define_id_type! {
    /// Identifier for symbols (classes, methods, fields, parameters, locals)
    SymbolId
}

define_id_type! {
    /// Identifier for entries in the type table
    TypeId
}

define_id_type! {
    /// Identifier for tree nodes, used as diagnostic anchors and for
    /// at-most-one-report-per-site bookkeeping
    NodeId
}

define_id_type! {
    /// Identity of a compilation unit within one build, used by the driver's
    /// visited set
    UnitId
}
