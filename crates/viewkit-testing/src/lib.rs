//! Testing utilities and fixtures for viewkit

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use viewkit_core::{
        recycle_views, MemoryViewTree, RecyclerState, Tag, View, ViewError, ViewId,
        ViewRecycler, ViewTree, UNTAGGED,
    };
}
