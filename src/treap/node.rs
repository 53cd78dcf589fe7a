use crate::entry::Entry;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// A link to a node. Child links own the node they point to; parent links never do.
pub type Link<K, V> = Option<NonNull<Node<K, V>>>;

/// A struct representing an internal node of a treap.
pub struct Node<K, V> {
    pub entry: Option<Entry<K, V>>,
    pub priority: u64,
    pub len: usize,
    pub left: Link<K, V>,
    pub right: Link<K, V>,
    pub parent: Link<K, V>,
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, value: V, priority: u64) -> Self {
        Node {
            entry: Some(Entry { key, value }),
            priority,
            len: 1,
            left: None,
            right: None,
            parent: None,
        }
    }

    /// A keyless node that only exists while a split or join is in progress.
    pub fn sentinel(priority: u64) -> Self {
        Node {
            entry: None,
            priority,
            len: 1,
            left: None,
            right: None,
            parent: None,
        }
    }

    /// Moves the node onto the heap and returns an owning link to it.
    pub fn into_link(self) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(self)))
    }

    /// Reclaims ownership of a node previously leaked by `into_link`.
    ///
    /// # Safety
    ///
    /// `link` must come from `into_link`, and no other link may be used to reclaim it.
    pub unsafe fn from_link(link: NonNull<Self>) -> Box<Self> {
        Box::from_raw(link.as_ptr())
    }

    pub fn entry(&self) -> &Entry<K, V> {
        self.entry
            .as_ref()
            .expect("Expected a keyed node outside of split and join.")
    }

    pub fn entry_mut(&mut self) -> &mut Entry<K, V> {
        self.entry
            .as_mut()
            .expect("Expected a keyed node outside of split and join.")
    }

    pub fn key(&self) -> &K {
        &self.entry().key
    }

    pub fn update(&mut self) {
        let Node {
            ref mut len,
            ref left,
            ref right,
            ..
        } = self;
        *len = 1;
        if let Some(left_node) = left {
            *len += unsafe { left_node.as_ref().len };
        }
        if let Some(right_node) = right {
            *len += unsafe { right_node.as_ref().len };
        }
    }
}

/// A read-only view of a node inside a `TreapMap`, used to inspect the shape of the treap.
///
/// A real map would not expose its nodes. The view exists so that the binary search tree
/// property, the heap property and the parent links can be verified from the outside.
///
/// # Examples
///
/// ```
/// use treap_map::treap::TreapMap;
///
/// let mut map = TreapMap::new();
/// map.insert(1, "a");
/// map.insert(2, "b");
///
/// let root = map.root_node().unwrap();
/// assert!(root.parent().is_none());
/// assert_eq!(root.len(), 2);
/// for child in root.left().into_iter().chain(root.right()) {
///     assert!(root.priority() >= child.priority());
///     assert_eq!(child.parent().map(|node| node.key()), Some(root.key()));
/// }
/// ```
pub struct NodeRef<'a, K: 'a, V: 'a> {
    node: NonNull<Node<K, V>>,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K: 'a, V: 'a> NodeRef<'a, K, V> {
    pub(crate) fn from_link(link: Link<K, V>) -> Option<Self> {
        link.map(|node| NodeRef {
            node,
            _marker: PhantomData,
        })
    }

    fn get(&self) -> &'a Node<K, V> {
        unsafe { &*self.node.as_ptr() }
    }

    pub fn key(&self) -> &'a K {
        self.get().key()
    }

    pub fn value(&self) -> &'a V {
        &self.get().entry().value
    }

    pub fn priority(&self) -> u64 {
        self.get().priority
    }

    /// Returns the number of nodes in the subtree rooted at this node.
    pub fn len(&self) -> usize {
        self.get().len
    }

    pub fn left(&self) -> Option<NodeRef<'a, K, V>> {
        Self::from_link(self.get().left)
    }

    pub fn right(&self) -> Option<NodeRef<'a, K, V>> {
        Self::from_link(self.get().right)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        Self::from_link(self.get().parent)
    }

    /// Returns `true` if both views refer to the same node.
    pub fn ptr_eq(&self, other: &NodeRef<'a, K, V>) -> bool {
        self.node == other.node
    }
}

impl<'a, K: 'a, V: 'a> Clone for NodeRef<'a, K, V> {
    fn clone(&self) -> Self {
        NodeRef {
            node: self.node,
            _marker: PhantomData,
        }
    }
}

impl<'a, K: 'a, V: 'a> Copy for NodeRef<'a, K, V> {}
