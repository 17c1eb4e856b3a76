//! Identifiers for display-tree entries.

use serde::{Deserialize, Serialize};

/// Handle to a display node owned by a [`crate::stage::Stage`].
///
/// Dense indices into the stage arena; opaque externally.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index, useful for diagnostics and stable ordering.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
