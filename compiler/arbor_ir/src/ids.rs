//! Handles into a [`NodeArena`](crate::NodeArena).
//!
//! Nodes, variables, labels and patterns each live in their own index
//! space. Identity is the handle value: two variables with the same name and
//! type are still different variables if their handles differ.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel value indicating "no handle".
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if *self == Self::INVALID {
                    write!(f, concat!(stringify!($name), "::INVALID"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

arena_id!(
    /// A node in the arena.
    NodeId
);
arena_id!(
    /// A variable identity (local, loop variable, lambda parameter, temporary).
    VarId
);
arena_id!(
    /// A jump target identity.
    LabelId
);
arena_id!(
    /// A pattern in the arena's pattern table.
    PatternId
);
