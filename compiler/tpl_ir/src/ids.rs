//! Handle newtypes for the template tree arenas.
//!
//! Every node lives in one of four arenas owned by [`Tree`](crate::Tree).
//! A handle is a `u32` index into its arena; handles of different kinds
//! cannot be mixed up. Handles are stable: the tree never frees or moves a
//! node, so a handle stays valid for the tree's whole lifetime and doubles
//! as the node's identity.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a raw arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Index into the owning arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a [`Stmt`](crate::Stmt). Also the statement's identity for splicing.
    StmtId
);
define_id!(
    /// Handle to a [`Pipe`](crate::Pipe).
    PipeId
);
define_id!(
    /// Handle to a [`Command`](crate::Command).
    CmdId
);
define_id!(
    /// Handle to an [`Expr`](crate::Expr).
    ExprId
);

/// Convert an arena length to a `u32` handle index.
///
/// Panics if the arena outgrew the handle space.
pub(crate) fn to_u32(len: usize, what: &str) -> u32 {
    match u32::try_from(len) {
        Ok(raw) => raw,
        Err(_) => panic!("{what} arena exceeded u32::MAX entries"),
    }
}
