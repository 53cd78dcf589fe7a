//! Probabilistic binary search tree where each node also maintains the heap invariant, kept in
//! shape by rotations over parent-linked nodes.

mod map;
mod node;
mod priority;
mod serialize;
mod tree;

pub use self::map::{Keys, TreapMap, TreapMapIntoIter, TreapMapIter, TreapMapIterMut, Values};
pub use self::node::NodeRef;
pub use self::priority::{
    default_allocator, PriorityAllocator, SharedAllocator, DEFAULT_POOL_CAPACITY, JOIN_SENTINEL,
    MAX_DRAW_ATTEMPTS, SPLIT_SENTINEL,
};
