//! Map and set types backing the recycling pools.
//!
//! `hashbrown` is used unless the `std-hash` feature asks for the standard
//! library collections instead.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}
