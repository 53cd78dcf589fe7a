use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::ordered_map::{BalanceFactor, Difference, Meld, OrderedMap};
use crate::treap::node::{Link, Node, NodeRef};
use crate::treap::priority::{self, SharedAllocator};
use crate::treap::tree;
use log::debug;
use std::borrow::Borrow;
use std::fmt;
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::ops::{Add, Index, Sub};
use std::ptr::NonNull;
use std::rc::Rc;

/// An ordered map implemented by a treap whose nodes link back to their parents.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a key, a value, and a priority. The key of any node is greater than all keys in its
/// left subtree and less than all keys occuring in its right subtree. The priority of a node is
/// greater than the priority of all nodes in its subtrees. By randomly generating priorities, the
/// expected height of the tree is proportional to the logarithm of the number of keys.
///
/// Every mutation is carried out with left and right rotations. Insertion bubbles a new leaf up,
/// removal rotates a node down to a leaf, and splits and joins drive a temporary sentinel node up
/// to the root or down to a leaf. Priorities are drawn from a `PriorityAllocator`; maps that share
/// an allocator can be joined.
///
/// # Examples
///
/// ```
/// use treap_map::treap::TreapMap;
///
/// let mut map = TreapMap::new();
/// map.insert(0, 1);
/// map.insert(3, 4);
///
/// assert_eq!(map[&0], 1);
/// assert_eq!(map.get(&1), None);
/// assert_eq!(map.len(), 2);
///
/// assert_eq!(map.min(), Some(&0));
/// assert_eq!(map.ceil(&2), Some(&3));
///
/// *map.get_mut(&0).unwrap() = 2;
/// assert_eq!(map.remove(&0), Some(2));
/// assert_eq!(map.remove(&1), None);
/// ```
pub struct TreapMap<K, V> {
    root: Link<K, V>,
    allocator: SharedAllocator,
}

impl<K, V> TreapMap<K, V> {
    /// Constructs a new, empty `TreapMap<K, V>` drawing priorities from the current thread's
    /// default allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let map: TreapMap<u32, u32> = TreapMap::new();
    /// ```
    pub fn new() -> Self {
        Self::with_allocator(priority::default_allocator())
    }

    /// Constructs a new, empty `TreapMap<K, V>` drawing priorities from `allocator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::{PriorityAllocator, TreapMap};
    ///
    /// let allocator = PriorityAllocator::with_seed([1, 2, 3, 4]).into_shared();
    /// let mut map = TreapMap::with_allocator(allocator.clone());
    /// map.insert(1, 1);
    /// assert_eq!(allocator.borrow().live(), 1);
    /// ```
    pub fn with_allocator(allocator: SharedAllocator) -> Self {
        TreapMap {
            root: None,
            allocator,
        }
    }

    /// Returns the allocator this map draws priorities from.
    pub fn allocator(&self) -> SharedAllocator {
        Rc::clone(&self.allocator)
    }

    fn from_root(root: Link<K, V>, allocator: SharedAllocator) -> Self {
        TreapMap { root, allocator }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        tree::len(&self.root)
    }

    /// Returns `true` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let map: TreapMap<u32, u32> = TreapMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Clears the map, removing all entries and releasing their priorities.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.clear();
    /// assert_eq!(map.is_empty(), true);
    /// ```
    pub fn clear(&mut self) {
        let TreapMap { root, allocator } = self;
        // release before `node` drops, its value may own a map on this allocator
        tree::clear(root, |node| {
            allocator.borrow_mut().release(node.priority);
        });
    }

    /// Returns a read-only view of the root node, or `None` if the map is empty.
    ///
    /// This exposes the internal structure of the treap so that its invariants can be verified.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// for i in 0..10 {
    ///     map.insert(i, i);
    /// }
    /// let root = map.root_node().unwrap();
    /// assert!(root.parent().is_none());
    /// assert!(root.left().is_some() || root.right().is_some());
    /// ```
    pub fn root_node(&self) -> Option<NodeRef<'_, K, V>> {
        NodeRef::from_link(self.root)
    }

    /// Returns the minimum key of the map. Returns `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.min(), Some(&1));
    /// ```
    pub fn min(&self) -> Option<&K> {
        tree::min(&self.root).map(|entry| &entry.key)
    }

    /// Returns the maximum key of the map. Returns `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.max(), Some(&3));
    /// ```
    pub fn max(&self) -> Option<&K> {
        tree::max(&self.root).map(|entry| &entry.key)
    }

    /// Returns the height of the treap, counted in nodes along the longest root-to-leaf path.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// assert_eq!(map.height(), 0);
    /// map.insert(1, 1);
    /// assert_eq!(map.height(), 1);
    /// ```
    pub fn height(&self) -> usize {
        tree::height(&self.root)
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs in ascending key
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&1, &1)));
    /// assert_eq!(iterator.next(), Some((&3, &3)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> TreapMapIter<'_, K, V> {
        TreapMapIter {
            current: self.root,
            stack: Vec::new(),
            remaining: self.len(),
            _marker: PhantomData,
        }
    }

    /// Returns a mutable iterator over the map. The iterator will yield key-value pairs in
    /// ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    ///
    /// for (_, value) in &mut map {
    ///     *value += 1;
    /// }
    ///
    /// let mut iterator = map.iter_mut();
    /// assert_eq!(iterator.next(), Some((&1, &mut 2)));
    /// assert_eq!(iterator.next(), Some((&3, &mut 4)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter_mut(&mut self) -> TreapMapIterMut<'_, K, V> {
        TreapMapIterMut {
            current: self.root,
            stack: Vec::new(),
            remaining: self.len(),
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over the keys of the map in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(3, 3);
    /// map.insert(1, 1);
    /// assert_eq!(map.keys().collect::<Vec<&u32>>(), vec![&1, &3]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V> TreapMap<K, V>
where
    K: Ord,
{
    /// Inserts a key-value pair into the map. If the key already exists in the map, its value is
    /// replaced in place and the old value is returned. Otherwise a new node is created with a
    /// fresh priority and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// assert_eq!(map.insert(1, 1), None);
    /// assert_eq!(map.get(&1), Some(&1));
    /// assert_eq!(map.insert(1, 2), Some(1));
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let TreapMap { root, allocator } = self;
        tree::insert(root, key, value, || allocator.borrow_mut().allocate())
    }

    /// Removes a key from the map. If the key exists in the map, it will return the associated
    /// value. Otherwise it will return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.remove(&1), Some(1));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        tree::remove(&mut self.root, key).map(|node| {
            let Node {
                entry, priority, ..
            } = *node;
            self.allocator.borrow_mut().release(priority);
            entry
                .expect("Expected a keyed node outside of split and join.")
                .value
        })
    }

    /// Checks if a key exists in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert!(!map.contains_key(&0));
    /// assert!(map.contains_key(&1));
    /// ```
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns an immutable reference to the value associated with a particular key. It will
    /// return `None` if the key does not exist in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.get(&0), None);
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        tree::get(&self.root, key).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value associated with a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// *map.get_mut(&1).unwrap() = 2;
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        tree::get_mut(&mut self.root, key).map(|entry| &mut entry.value)
    }

    /// Returns a key in the map that is greater than or equal to a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.ceil(&0), Some(&1));
    /// assert_eq!(map.ceil(&2), None);
    /// ```
    pub fn ceil<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        tree::ceil(&self.root, key).map(|entry| &entry.key)
    }

    /// Returns a key in the map that is less than or equal to a particular key. Returns `None` if
    /// such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.floor(&0), None);
    /// assert_eq!(map.floor(&2), Some(&1));
    /// ```
    pub fn floor<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        tree::floor(&self.root, key).map(|entry| &entry.key)
    }

    /// Splits the map into two maps: the first holds every key less than `threshold` and the
    /// second holds every key greater than or equal to `threshold`. Nodes are moved, not copied,
    /// and both maps keep drawing priorities from this map's allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// for i in 0..11 {
    ///     map.insert(i, i);
    /// }
    ///
    /// let (left, right) = map.split(&5);
    /// assert_eq!(left.keys().cloned().collect::<Vec<u32>>(), vec![0, 1, 2, 3, 4]);
    /// assert_eq!(right.keys().cloned().collect::<Vec<u32>>(), vec![5, 6, 7, 8, 9, 10]);
    /// ```
    pub fn split<Q>(mut self, threshold: &Q) -> (Self, Self)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let len = self.len();
        let (left, right) = tree::split(&mut self.root, threshold);
        let left = Self::from_root(left, self.allocator());
        let right = Self::from_root(right, self.allocator());
        debug!(
            "split {} entries into {} and {}",
            len,
            left.len(),
            right.len(),
        );
        (left, right)
    }

    /// Appends every entry of `other` to this map, leaving `other` empty. Every key of this map
    /// must be less than every key of `other`, and both maps must share an allocator. If either
    /// condition fails, an error is returned and neither map is modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut left = TreapMap::new();
    /// left.insert(1, 1);
    /// let mut right = TreapMap::new();
    /// right.insert(2, 2);
    ///
    /// left.join(&mut right).unwrap();
    /// assert_eq!(left.keys().cloned().collect::<Vec<u32>>(), vec![1, 2]);
    /// assert!(right.is_empty());
    ///
    /// let mut overlapping = TreapMap::new();
    /// overlapping.insert(0, 0);
    /// assert!(left.join(&mut overlapping).is_err());
    /// ```
    pub fn join(&mut self, other: &mut Self) -> Result<()> {
        if !Rc::ptr_eq(&self.allocator, &other.allocator) {
            return Err(Error::AllocatorMismatch);
        }
        if let (Some(max), Some(min)) = (self.max(), other.min()) {
            if max >= min {
                return Err(Error::OverlappingRanges);
            }
        }

        let (left_len, right_len) = (self.len(), other.len());
        self.root = tree::join(self.root.take(), other.root.take());
        debug!("joined {} and {} entries", left_len, right_len);
        Ok(())
    }
}

impl<K, V> Drop for TreapMap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Meld for TreapMap<K, V>
where
    K: Ord,
{
    /// Inserts every entry of `other` into this map in ascending order. Values from `other`
    /// replace the values of duplicate keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    /// use treap_map::Meld;
    ///
    /// let mut n = TreapMap::new();
    /// n.insert(1, 1);
    /// n.insert(2, 2);
    ///
    /// let mut m = TreapMap::new();
    /// m.insert(2, 3);
    /// m.insert(3, 3);
    ///
    /// n.meld(m);
    /// assert_eq!(
    ///     n.iter().collect::<Vec<(&u32, &u32)>>(),
    ///     vec![(&1, &1), (&2, &3), (&3, &3)],
    /// );
    /// ```
    fn meld(&mut self, other: Self) {
        let (len, other_len) = (self.len(), other.len());
        for (key, value) in other {
            self.insert(key, value);
        }
        debug!(
            "melded {} entries into {}, now {}",
            other_len,
            len,
            self.len(),
        );
    }
}

impl<K, V> Difference for TreapMap<K, V>
where
    K: Ord,
{
    /// Removes every key of `other` from this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    /// use treap_map::Difference;
    ///
    /// let mut n = TreapMap::new();
    /// n.insert(1, 1);
    /// n.insert(2, 2);
    ///
    /// let mut m = TreapMap::new();
    /// m.insert(2, 3);
    /// m.insert(3, 3);
    ///
    /// n.difference(&m);
    /// assert_eq!(n.iter().collect::<Vec<(&u32, &u32)>>(), vec![(&1, &1)]);
    /// ```
    fn difference(&mut self, other: &Self) {
        let len = self.len();
        for key in other.keys() {
            self.remove(key);
        }
        debug!("difference removed {} entries", len - self.len());
    }
}

impl<K, V> BalanceFactor for TreapMap<K, V> {
    /// Returns the height of the treap divided by `log2(len + 1)`, the height of a perfectly
    /// balanced tree of the same size. An empty map has a balance factor of `1.0`.
    ///
    /// Height counts nodes rather than edges along the longest path, so that a perfectly balanced
    /// treap scores exactly `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::TreapMap;
    /// use treap_map::BalanceFactor;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.balance_factor(), 1.0);
    /// ```
    fn balance_factor(&self) -> f64 {
        let len = self.len();
        if len == 0 {
            return 1.0;
        }
        self.height() as f64 / ((len + 1) as f64).log2()
    }
}

impl<K, V> OrderedMap<K, V> for TreapMap<K, V>
where
    K: Ord,
{
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        TreapMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        TreapMap::remove(self, key)
    }

    fn split(self, threshold: &K) -> (Self, Self) {
        TreapMap::split(self, threshold)
    }

    fn join(&mut self, other: &mut Self) -> Result<()> {
        TreapMap::join(self, other)
    }

    fn len(&self) -> usize {
        TreapMap::len(self)
    }

    fn keys<'a>(&'a self) -> Box<dyn Iterator<Item = &'a K> + 'a> {
        Box::new(TreapMap::keys(self))
    }
}

impl<K, V> IntoIterator for TreapMap<K, V> {
    type Item = (K, V);
    type IntoIter = TreapMapIntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        TreapMapIntoIter {
            remaining: self.len(),
            current: self.root.take(),
            stack: Vec::new(),
            allocator: self.allocator(),
        }
    }
}

impl<'a, K: 'a, V: 'a> IntoIterator for &'a TreapMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = TreapMapIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: 'a, V: 'a> IntoIterator for &'a mut TreapMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = TreapMapIterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An owning iterator for `TreapMap<K, V>`.
///
/// This iterator traverses the elements of a treap in-order and yields owned entries. Priorities
/// are released as their nodes are consumed.
pub struct TreapMapIntoIter<K, V> {
    current: Link<K, V>,
    stack: Vec<Box<Node<K, V>>>,
    remaining: usize,
    allocator: SharedAllocator,
}

impl<K, V> Iterator for TreapMapIntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current.take() {
            let mut node = unsafe { Node::from_link(node) };
            self.current = node.left.take();
            self.stack.push(node);
        }
        self.stack.pop().map(|node| {
            let Node {
                entry,
                priority,
                right,
                ..
            } = *node;
            self.current = right;
            self.remaining -= 1;
            self.allocator.borrow_mut().release(priority);
            let Entry { key, value } =
                entry.expect("Expected a keyed node outside of split and join.");
            (key, value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for TreapMapIntoIter<K, V> {}

impl<K, V> FusedIterator for TreapMapIntoIter<K, V> {}

impl<K, V> Drop for TreapMapIntoIter<K, V> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}

/// An iterator for `TreapMap<K, V>`.
///
/// This iterator traverses the elements of a treap in-order and yields immutable references.
pub struct TreapMapIter<'a, K: 'a, V: 'a> {
    current: Link<K, V>,
    stack: Vec<NonNull<Node<K, V>>>,
    remaining: usize,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K: 'a, V: 'a> Iterator for TreapMapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current {
            self.current = unsafe { node.as_ref().left };
            self.stack.push(node);
        }
        self.stack.pop().map(|node| {
            let node: &'a Node<K, V> = unsafe { &*node.as_ptr() };
            self.current = node.right;
            self.remaining -= 1;
            let Entry { key, value } = node.entry();
            (key, value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for TreapMapIter<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for TreapMapIter<'a, K, V> {}

/// A mutable iterator for `TreapMap<K, V>`.
///
/// This iterator traverses the elements of a treap in-order and yields mutable references.
pub struct TreapMapIterMut<'a, K: 'a, V: 'a> {
    current: Link<K, V>,
    stack: Vec<NonNull<Node<K, V>>>,
    remaining: usize,
    _marker: PhantomData<&'a mut Node<K, V>>,
}

impl<'a, K: 'a, V: 'a> Iterator for TreapMapIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current {
            self.current = unsafe { node.as_ref().left };
            self.stack.push(node);
        }
        self.stack.pop().map(|node| {
            let node: &'a mut Node<K, V> = unsafe { &mut *node.as_ptr() };
            self.current = node.right;
            self.remaining -= 1;
            let Entry { key, value } = node.entry_mut();
            (&*key, value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for TreapMapIterMut<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for TreapMapIterMut<'a, K, V> {}

/// An iterator over the keys of a `TreapMap<K, V>` in ascending order.
pub struct Keys<'a, K: 'a, V: 'a> {
    inner: TreapMapIter<'a, K, V>,
}

impl<'a, K: 'a, V: 'a> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> FusedIterator for Keys<'a, K, V> {}

/// An iterator over the values of a `TreapMap<K, V>` in ascending key order.
pub struct Values<'a, K: 'a, V: 'a> {
    inner: TreapMapIter<'a, K, V>,
}

impl<'a, K: 'a, V: 'a> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> FusedIterator for Values<'a, K, V> {}

impl<K, V> Default for TreapMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Add for TreapMap<K, V>
where
    K: Ord,
{
    type Output = TreapMap<K, V>;

    fn add(mut self, other: TreapMap<K, V>) -> TreapMap<K, V> {
        self.meld(other);
        self
    }
}

impl<K, V> Sub for TreapMap<K, V>
where
    K: Ord,
{
    type Output = TreapMap<K, V>;

    fn sub(mut self, other: TreapMap<K, V>) -> TreapMap<K, V> {
        self.difference(&other);
        self
    }
}

impl<'a, K, V, Q> Index<&'a Q> for TreapMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    fn index(&self, key: &Q) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<K, V> Extend<(K, V)> for TreapMap<K, V>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TreapMap<K, V>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreapMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> PartialEq for TreapMap<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &TreapMap<K, V>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V> Eq for TreapMap<K, V>
where
    K: Eq,
    V: Eq,
{
}

impl<K, V> fmt::Debug for TreapMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders the treap in pre-order, one `[priority] <key, value>` line per node, with each node
/// indented one tab deeper than its parent.
///
/// # Examples
///
/// ```
/// use treap_map::treap::{PriorityAllocator, TreapMap};
///
/// let mut map = TreapMap::with_allocator(PriorityAllocator::with_pool(1).into_shared());
/// map.insert(1, "a");
/// assert_eq!(map.to_string(), "[1] <1, a>");
/// ```
impl<K, V> fmt::Display for TreapMap<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack: Vec<(NonNull<Node<K, V>>, usize)> =
            self.root.iter().map(|node| (*node, 0)).collect();
        let mut first = true;
        while let Some((node, depth)) = stack.pop() {
            let node = unsafe { node.as_ref() };
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            for _ in 0..depth {
                f.write_str("\t")?;
            }
            let Entry { key, value } = node.entry();
            write!(f, "[{}] <{}, {}>", node.priority, key, value)?;
            stack.extend(node.right.map(|child| (child, depth + 1)));
            stack.extend(node.left.map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TreapMap;
    use crate::error::Error;
    use crate::ordered_map::{BalanceFactor, Difference, Meld};
    use crate::treap::priority::PriorityAllocator;

    fn seeded<K: Ord, V>() -> TreapMap<K, V> {
        TreapMap::with_allocator(PriorityAllocator::with_seed([1, 2, 3, 4]).into_shared())
    }

    #[test]
    fn test_len_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_min_max_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.min(), None);
        assert_eq!(map.max(), None);
    }

    #[test]
    fn test_insert() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        assert!(map.contains_key(&1));
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_insert_replace() {
        let mut map = TreapMap::new();
        let ret_1 = map.insert(1, 1);
        let ret_2 = map.insert(1, 3);
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(ret_1, None);
        assert_eq!(ret_2, Some(1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_replace_keeps_node() {
        let mut map = seeded();
        for i in 0..10 {
            map.insert(i, i);
        }
        let before = {
            let root = map.root_node().unwrap();
            (root.priority(), root.len())
        };
        map.insert(5, 50);
        let root = map.root_node().unwrap();
        assert_eq!((root.priority(), root.len()), before);
        assert_eq!(map.get(&5), Some(&50));
    }

    #[test]
    fn test_remove() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        let ret = map.remove(&1);
        assert!(!map.contains_key(&1));
        assert_eq!(ret, Some(1));
    }

    #[test]
    fn test_remove_empty() {
        let mut map: TreapMap<&str, u32> = TreapMap::new();
        assert_eq!(map.remove("hi"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_releases_priority() {
        let allocator = PriorityAllocator::new().into_shared();
        let mut map = TreapMap::with_allocator(allocator.clone());
        map.insert(1, 1);
        map.insert(2, 2);
        assert_eq!(allocator.borrow().live(), 2);
        map.remove(&1);
        assert_eq!(allocator.borrow().live(), 1);
        drop(map);
        assert_eq!(allocator.borrow().live(), 0);
    }

    #[test]
    fn test_drop_nested_maps() {
        let mut outer: TreapMap<u32, TreapMap<u32, u32>> = TreapMap::new();
        for i in 0..10 {
            let mut inner = TreapMap::new();
            inner.insert(i, i);
            inner.insert(i + 10, i);
            outer.insert(i, inner);
        }
        drop(outer);
    }

    #[test]
    fn test_clear_nested_maps() {
        let allocator = PriorityAllocator::new().into_shared();
        let mut outer = TreapMap::with_allocator(allocator.clone());
        for i in 0..10u32 {
            let mut inner = TreapMap::with_allocator(allocator.clone());
            inner.insert(i, i);
            outer.insert(i, inner);
        }
        assert_eq!(allocator.borrow().live(), 20);
        outer.clear();
        assert!(outer.is_empty());
        assert_eq!(allocator.borrow().live(), 0);
    }

    #[test]
    fn test_min_max() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        map.insert(3, 3);
        map.insert(5, 5);

        assert_eq!(map.min(), Some(&1));
        assert_eq!(map.max(), Some(&5));
    }

    #[test]
    fn test_get_mut() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        {
            let value = map.get_mut(&1);
            *value.unwrap() = 3;
        }
        assert_eq!(map.get(&1), Some(&3));
    }

    #[test]
    fn test_floor_ceil() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        map.insert(3, 3);
        map.insert(5, 5);

        assert_eq!(map.floor(&0), None);
        assert_eq!(map.floor(&2), Some(&1));
        assert_eq!(map.floor(&4), Some(&3));
        assert_eq!(map.floor(&6), Some(&5));

        assert_eq!(map.ceil(&0), Some(&1));
        assert_eq!(map.ceil(&2), Some(&3));
        assert_eq!(map.ceil(&4), Some(&5));
        assert_eq!(map.ceil(&6), None);
    }

    #[test]
    fn test_split() {
        let mut map = seeded();
        for i in 0..11 {
            map.insert(i, i.to_string());
        }
        let (left, right) = map.split(&5);
        assert_eq!(left.keys().cloned().collect::<Vec<u32>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(
            right.keys().cloned().collect::<Vec<u32>>(),
            vec![5, 6, 7, 8, 9, 10],
        );
        assert_eq!(left.len(), 5);
        assert_eq!(right.len(), 6);
        assert_eq!(right.get(&5), Some(&String::from("5")));
    }

    #[test]
    fn test_split_out_of_range() {
        let mut map = seeded();
        for i in 1..5 {
            map.insert(i, i);
        }
        let (left, right) = map.split(&0);
        assert!(left.is_empty());
        assert_eq!(right.len(), 4);

        let (left, right) = right.split(&10);
        assert_eq!(left.len(), 4);
        assert!(right.is_empty());
    }

    #[test]
    fn test_split_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        let (left, right) = map.split(&0);
        assert!(left.is_empty());
        assert!(right.is_empty());
    }

    #[test]
    fn test_join() {
        let mut left = TreapMap::new();
        let mut right = TreapMap::new();
        for i in 0..5 {
            left.insert(i, i);
            right.insert(i + 5, i + 5);
        }
        left.join(&mut right).unwrap();
        assert_eq!(
            left.keys().cloned().collect::<Vec<u32>>(),
            (0..10).collect::<Vec<u32>>(),
        );
        assert_eq!(left.len(), 10);
        assert!(right.is_empty());
    }

    #[test]
    fn test_join_overlapping() {
        let mut left = TreapMap::new();
        let mut right = TreapMap::new();
        left.insert(1, 1);
        left.insert(5, 5);
        right.insert(5, 5);
        assert_eq!(left.join(&mut right), Err(Error::OverlappingRanges));
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_join_allocator_mismatch() {
        let mut left = seeded();
        let mut right = TreapMap::new();
        left.insert(1, 1);
        right.insert(2, 2);
        assert_eq!(left.join(&mut right), Err(Error::AllocatorMismatch));
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_meld() {
        let mut n = TreapMap::new();
        n.insert(1, 1);
        n.insert(2, 2);
        n.insert(3, 3);

        let mut m = TreapMap::new();
        m.insert(3, 5);
        m.insert(4, 4);
        m.insert(5, 5);

        n.meld(m);

        assert_eq!(
            n.iter().collect::<Vec<(&u32, &u32)>>(),
            vec![(&1, &1), (&2, &2), (&3, &5), (&4, &4), (&5, &5)],
        );
        assert_eq!(n.len(), 5);
    }

    #[test]
    fn test_add() {
        let mut n = TreapMap::new();
        n.insert(1, 1);
        let mut m = seeded();
        m.insert(2, 2);

        let union = n + m;
        assert_eq!(
            union.iter().collect::<Vec<(&u32, &u32)>>(),
            vec![(&1, &1), (&2, &2)],
        );
    }

    #[test]
    fn test_difference() {
        let mut n = TreapMap::new();
        for i in 1..6 {
            n.insert(i, i);
        }

        let mut m = TreapMap::new();
        m.insert(2, 0);
        m.insert(4, 0);
        m.insert(6, 0);

        n.difference(&m);

        assert_eq!(n.keys().cloned().collect::<Vec<u32>>(), vec![1, 3, 5]);
        assert_eq!(n.len(), 3);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_sub() {
        let mut n = TreapMap::new();
        n.insert(1, 1);
        n.insert(2, 2);
        let mut m = TreapMap::new();
        m.insert(2, 2);

        let sub = n - m;
        assert_eq!(sub.iter().collect::<Vec<(&u32, &u32)>>(), vec![(&1, &1)]);
    }

    #[test]
    fn test_balance_factor() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.balance_factor(), 1.0);

        let mut map = seeded();
        for i in 0..3 {
            map.insert(i, i);
        }
        let expected = map.height() as f64 / 2.0;
        assert_eq!(map.balance_factor(), expected);
        assert!(map.balance_factor() >= 1.0);
    }

    #[test]
    fn test_into_iter() {
        let mut map = TreapMap::new();
        map.insert(1, 2);
        map.insert(5, 6);
        map.insert(3, 4);

        assert_eq!(
            map.into_iter().collect::<Vec<(u32, u32)>>(),
            vec![(1, 2), (3, 4), (5, 6)],
        );
    }

    #[test]
    fn test_into_iter_partial_releases_priorities() {
        let allocator = PriorityAllocator::new().into_shared();
        let mut map = TreapMap::with_allocator(allocator.clone());
        for i in 0..10 {
            map.insert(i, i);
        }
        let mut iter = map.into_iter();
        assert_eq!(iter.next(), Some((0, 0)));
        assert_eq!(iter.len(), 9);
        drop(iter);
        assert_eq!(allocator.borrow().live(), 0);
    }

    #[test]
    fn test_iter() {
        let mut map = TreapMap::new();
        map.insert(1, 2);
        map.insert(5, 6);
        map.insert(3, 4);

        assert_eq!(
            map.iter().collect::<Vec<(&u32, &u32)>>(),
            vec![(&1, &2), (&3, &4), (&5, &6)],
        );
    }

    #[test]
    fn test_iter_exhausted() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        let mut iter = map.iter();
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_restartable() {
        let mut map = TreapMap::new();
        map.insert(2, 2);
        map.insert(1, 1);
        assert_eq!(map.keys().count(), 2);
        assert_eq!(map.keys().collect::<Vec<&u32>>(), vec![&1, &2]);
    }

    #[test]
    fn test_iter_mut() {
        let mut map = TreapMap::new();
        map.insert(1, 2);
        map.insert(5, 6);
        map.insert(3, 4);

        for (_, value) in &mut map {
            *value += 1;
        }

        assert_eq!(
            map.iter().collect::<Vec<(&u32, &u32)>>(),
            vec![(&1, &3), (&3, &5), (&5, &7)],
        );
    }

    #[test]
    fn test_values() {
        let map: TreapMap<u32, &str> = vec![(2, "b"), (1, "a")].into_iter().collect();
        assert_eq!(map.values().cloned().collect::<Vec<&str>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_index() {
        let mut map = TreapMap::new();
        map.insert(String::from("one"), 1);
        assert_eq!(map["one"], 1);
    }

    #[test]
    #[should_panic]
    fn test_index_missing() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        map[&0];
    }

    #[test]
    fn test_display() {
        let mut map = seeded();
        for i in 0..50u32 {
            map.insert(i, i * 2);
        }

        let mut expected = Vec::new();
        let mut stack = vec![(map.root_node().unwrap(), 0)];
        while let Some((node, depth)) = stack.pop() {
            expected.push(format!(
                "{}[{}] <{}, {}>",
                "\t".repeat(depth),
                node.priority(),
                node.key(),
                node.value(),
            ));
            stack.extend(node.right().map(|child| (child, depth + 1)));
            stack.extend(node.left().map(|child| (child, depth + 1)));
        }

        let rendered = map.to_string();
        assert_eq!(rendered, expected.join("\n"));
        assert!(rendered.lines().any(|line| line.starts_with("\t\t[")));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_display_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.to_string(), "");
    }

    #[test]
    fn test_debug() {
        let mut map = TreapMap::new();
        map.insert(2, 3);
        map.insert(1, 2);
        assert_eq!(format!("{:?}", map), "{1: 2, 2: 3}");
    }
}
