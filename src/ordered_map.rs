//! The contract shared by ordered maps that can be split and joined, and the optional
//! capabilities an implementation may add on top of it.
//!
//! A capability that an implementation does not support is simply a trait it does not implement,
//! so calling it is rejected at compile time rather than failing at runtime.

use crate::error::Result;

/// An ordered key-value container whose key ranges can be split apart and joined back together.
pub trait OrderedMap<K, V>: Sized
where
    K: Ord,
{
    /// Returns the value associated with `key`, or `None` if `key` is absent.
    fn lookup(&self, key: &K) -> Option<&V>;

    /// Associates `value` with `key`, returning the value it replaced.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Removes `key`, returning its value, or `None` if `key` is absent.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Partitions the map into the keys less than `threshold` and the keys greater than or equal
    /// to `threshold`.
    fn split(self, threshold: &K) -> (Self, Self);

    /// Appends `other`, whose keys must all be greater than this map's keys, leaving it empty.
    fn join(&mut self, other: &mut Self) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys in ascending order.
    fn keys<'a>(&'a self) -> Box<dyn Iterator<Item = &'a K> + 'a>;
}

/// Set-style union of two maps.
pub trait Meld {
    /// Adds every entry of `other` to this map. Values from `other` win on duplicate keys.
    fn meld(&mut self, other: Self);
}

/// Set-style subtraction of two maps.
pub trait Difference {
    /// Removes every key of `other` from this map.
    fn difference(&mut self, other: &Self);
}

/// A diagnostic measure of how far a tree is from perfect balance.
pub trait BalanceFactor {
    /// Returns the tree's height divided by the minimum height for its size. `1.0` is optimal.
    fn balance_factor(&self) -> f64;
}
