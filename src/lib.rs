//! An ordered map backed by a treap whose structure is maintained purely by rotations.
//!
//! Nodes own their children and keep a non-owning link to their parent, so insertion, removal,
//! split and join are all expressed with constant-time left and right rotations.

mod entry;
pub mod error;
pub mod ordered_map;
pub mod treap;

pub use crate::error::{Error, Result};
pub use crate::ordered_map::{BalanceFactor, Difference, Meld, OrderedMap};
pub use crate::treap::TreapMap;
