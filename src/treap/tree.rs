//! Rotation engine and tree algorithms shared by the treap containers.
//!
//! Every `Link` handed to these functions must be the root slot of a well-formed tree owned by
//! the caller: child links own their nodes, parent links point back at the owner, and each `len`
//! counts its subtree. Each function leaves the tree well-formed again when it returns.

use crate::entry::Entry;
use crate::treap::node::{Link, Node};
use crate::treap::priority::{JOIN_SENTINEL, SPLIT_SENTINEL};
use log::trace;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;
use std::ptr::NonNull;

type NodePtr<K, V> = NonNull<Node<K, V>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Side {
    Left,
    Right,
}

enum Slot<K, V> {
    Occupied(NodePtr<K, V>),
    Vacant { parent: Link<K, V>, side: Side },
}

fn locate<K, V, Q>(root: Link<K, V>, key: &Q) -> Slot<K, V>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut parent = None;
    let mut side = Side::Left;
    let mut curr = root;
    while let Some(node) = curr {
        let node_ref = unsafe { node.as_ref() };
        match key.cmp(node_ref.key().borrow()) {
            Ordering::Less => {
                parent = curr;
                side = Side::Left;
                curr = node_ref.left;
            }
            Ordering::Greater => {
                parent = curr;
                side = Side::Right;
                curr = node_ref.right;
            }
            Ordering::Equal => return Slot::Occupied(node),
        }
    }
    Slot::Vacant { parent, side }
}

// points `parent`'s link to `old` (or the root slot when `parent` is absent) at `new`
fn replace_child<K, V>(
    root: &mut Link<K, V>,
    parent: Link<K, V>,
    old: NodePtr<K, V>,
    new: Link<K, V>,
) {
    match parent {
        None => *root = new,
        Some(mut parent_node) => {
            let parent_node = unsafe { parent_node.as_mut() };
            if parent_node.left == Some(old) {
                parent_node.left = new;
            } else {
                parent_node.right = new;
            }
        }
    }
}

/// Promotes the right child of `x` into the position of `x`. `x` must have a right child.
pub fn rotate_left<K, V>(root: &mut Link<K, V>, mut x: NodePtr<K, V>) {
    unsafe {
        let mut y = x.as_ref().right.expect("Expected a right child to rotate left.");
        let across = y.as_ref().left;
        x.as_mut().right = across;
        if let Some(mut across_node) = across {
            across_node.as_mut().parent = Some(x);
        }

        let parent = x.as_ref().parent;
        y.as_mut().parent = parent;
        replace_child(root, parent, x, Some(y));

        y.as_mut().left = Some(x);
        x.as_mut().parent = Some(y);
        x.as_mut().update();
        y.as_mut().update();
    }
}

/// Promotes the left child of `y` into the position of `y`. `y` must have a left child.
pub fn rotate_right<K, V>(root: &mut Link<K, V>, mut y: NodePtr<K, V>) {
    unsafe {
        let mut x = y.as_ref().left.expect("Expected a left child to rotate right.");
        let across = x.as_ref().right;
        y.as_mut().left = across;
        if let Some(mut across_node) = across {
            across_node.as_mut().parent = Some(y);
        }

        let parent = y.as_ref().parent;
        x.as_mut().parent = parent;
        replace_child(root, parent, y, Some(x));

        x.as_mut().right = Some(y);
        y.as_mut().parent = Some(x);
        y.as_mut().update();
        x.as_mut().update();
    }
}

// rotates `node` so that its child on `side` takes its place
fn rotate_towards<K, V>(root: &mut Link<K, V>, node: NodePtr<K, V>, side: Side) {
    match side {
        Side::Left => rotate_right(root, node),
        Side::Right => rotate_left(root, node),
    }
}

fn higher_child<K, V>(node: NodePtr<K, V>) -> Option<(u64, Side)> {
    let node = unsafe { node.as_ref() };
    let priority = |link: NodePtr<K, V>| unsafe { link.as_ref().priority };
    match (node.left, node.right) {
        (Some(left_node), Some(right_node)) => {
            if priority(left_node) > priority(right_node) {
                Some((priority(left_node), Side::Left))
            } else {
                Some((priority(right_node), Side::Right))
            }
        }
        (Some(left_node), None) => Some((priority(left_node), Side::Left)),
        (None, Some(right_node)) => Some((priority(right_node), Side::Right)),
        (None, None) => None,
    }
}

/// Rotates `node` upwards until its parent outranks it or it becomes the root.
pub fn bubble_up<K, V>(root: &mut Link<K, V>, node: NodePtr<K, V>) {
    unsafe {
        while let Some(parent) = node.as_ref().parent {
            if node.as_ref().priority <= parent.as_ref().priority {
                break;
            }
            if parent.as_ref().left == Some(node) {
                rotate_right(root, parent);
            } else {
                rotate_left(root, parent);
            }
        }
    }
}

/// Rotates `node` downwards until it outranks both of its children.
pub fn sift_down<K, V>(root: &mut Link<K, V>, node: NodePtr<K, V>) {
    let priority = unsafe { node.as_ref().priority };
    while let Some((child_priority, side)) = higher_child(node) {
        if child_priority <= priority {
            break;
        }
        rotate_towards(root, node, side);
    }
}

/// Rotates `node` down to a leaf, always promoting its higher-priority child, then detaches it
/// and returns ownership of it.
pub fn unlink<K, V>(root: &mut Link<K, V>, node: NodePtr<K, V>) -> Box<Node<K, V>> {
    while let Some((_, side)) = higher_child(node) {
        rotate_towards(root, node, side);
    }
    unsafe {
        let parent = node.as_ref().parent;
        replace_child(root, parent, node, None);
        let mut curr = parent;
        while let Some(mut ancestor) = curr {
            ancestor.as_mut().len -= 1;
            curr = ancestor.as_ref().parent;
        }
        let mut boxed = Node::from_link(node);
        boxed.parent = None;
        boxed
    }
}

// hangs `node` off `parent` (or the root slot), then restores the heap property
fn attach<K, V>(
    root: &mut Link<K, V>,
    parent: Link<K, V>,
    side: Side,
    node: Node<K, V>,
) -> NodePtr<K, V> {
    let mut link = node.into_link();
    unsafe {
        link.as_mut().parent = parent;
        match parent {
            None => *root = Some(link),
            Some(mut parent_node) => match side {
                Side::Left => parent_node.as_mut().left = Some(link),
                Side::Right => parent_node.as_mut().right = Some(link),
            },
        }
        let mut curr = parent;
        while let Some(mut ancestor) = curr {
            ancestor.as_mut().len += 1;
            curr = ancestor.as_ref().parent;
        }
    }
    bubble_up(root, link);
    link
}

// detaches the child of `node` on `side` as a standalone tree
fn take_child<K, V>(mut node: NodePtr<K, V>, side: Side) -> Link<K, V> {
    unsafe {
        let node = node.as_mut();
        let child = match side {
            Side::Left => node.left.take(),
            Side::Right => node.right.take(),
        };
        if let Some(mut child_node) = child {
            child_node.as_mut().parent = None;
        }
        node.update();
        child
    }
}

/// Inserts a key-value pair. An existing key has its value replaced in place and the old value
/// is returned; otherwise a new leaf with priority `new_priority()` is bubbled into position.
pub fn insert<K, V, F>(root: &mut Link<K, V>, key: K, value: V, new_priority: F) -> Option<V>
where
    K: Ord,
    F: FnOnce() -> u64,
{
    match locate(*root, &key) {
        Slot::Occupied(mut node) => {
            let entry = unsafe { node.as_mut().entry_mut() };
            Some(mem::replace(&mut entry.value, value))
        }
        Slot::Vacant { parent, side } => {
            attach(root, parent, side, Node::new(key, value, new_priority()));
            None
        }
    }
}

/// Removes the node holding `key` and returns it, or `None` if no such node exists.
pub fn remove<K, V, Q>(root: &mut Link<K, V>, key: &Q) -> Option<Box<Node<K, V>>>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    match locate(*root, key) {
        Slot::Occupied(node) => Some(unlink(root, node)),
        Slot::Vacant { .. } => None,
    }
}

/// Splits a tree into the keys less than `threshold` and the keys greater than or equal to it.
pub fn split<K, V, Q>(root: &mut Link<K, V>, threshold: &Q) -> (Link<K, V>, Link<K, V>)
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    match locate(*root, threshold) {
        Slot::Occupied(mut node) => {
            let priority = unsafe { node.as_ref().priority };
            unsafe { node.as_mut().priority = SPLIT_SENTINEL };
            bubble_up(root, node);
            trace!("promoted existing threshold node to the root");
            debug_assert!(*root == Some(node));

            let left = take_child(node, Side::Left);
            unsafe { node.as_mut().priority = priority };
            sift_down(root, node);
            (left, root.take())
        }
        Slot::Vacant { parent, side } => {
            let sentinel = attach(root, parent, side, Node::sentinel(SPLIT_SENTINEL));
            trace!("promoted split sentinel to the root");
            debug_assert!(*root == Some(sentinel));

            let left = take_child(sentinel, Side::Left);
            let right = take_child(sentinel, Side::Right);
            *root = None;
            drop(unsafe { Node::from_link(sentinel) });
            (left, right)
        }
    }
}

/// Concatenates two trees. Every key in `left` must be less than every key in `right`.
pub fn join<K, V>(left: Link<K, V>, right: Link<K, V>) -> Link<K, V> {
    match (left, right) {
        (Some(mut left_node), Some(mut right_node)) => {
            let mut sentinel = Node::sentinel(JOIN_SENTINEL);
            sentinel.left = Some(left_node);
            sentinel.right = Some(right_node);
            sentinel.update();
            let sentinel = sentinel.into_link();
            unsafe {
                left_node.as_mut().parent = Some(sentinel);
                right_node.as_mut().parent = Some(sentinel);
            }

            let mut root = Some(sentinel);
            drop(unlink(&mut root, sentinel));
            root
        }
        (tree, None) | (None, tree) => tree,
    }
}

pub fn get<'a, K, V, Q>(root: &'a Link<K, V>, key: &Q) -> Option<&'a Entry<K, V>>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    match locate(*root, key) {
        Slot::Occupied(node) => Some(unsafe { &*node.as_ptr() }.entry()),
        Slot::Vacant { .. } => None,
    }
}

pub fn get_mut<'a, K, V, Q>(root: &'a mut Link<K, V>, key: &Q) -> Option<&'a mut Entry<K, V>>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    match locate(*root, key) {
        Slot::Occupied(node) => Some(unsafe { &mut *node.as_ptr() }.entry_mut()),
        Slot::Vacant { .. } => None,
    }
}

pub fn ceil<'a, K, V, Q>(root: &'a Link<K, V>, key: &Q) -> Option<&'a Entry<K, V>>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut curr = *root;
    let mut ret = None;
    while let Some(node) = curr {
        let node = unsafe { &*node.as_ptr() };
        match key.cmp(node.key().borrow()) {
            Ordering::Greater => curr = node.right,
            Ordering::Less => {
                ret = Some(node.entry());
                curr = node.left;
            }
            Ordering::Equal => return Some(node.entry()),
        }
    }
    ret
}

pub fn floor<'a, K, V, Q>(root: &'a Link<K, V>, key: &Q) -> Option<&'a Entry<K, V>>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut curr = *root;
    let mut ret = None;
    while let Some(node) = curr {
        let node = unsafe { &*node.as_ptr() };
        match key.cmp(node.key().borrow()) {
            Ordering::Less => curr = node.left,
            Ordering::Greater => {
                ret = Some(node.entry());
                curr = node.right;
            }
            Ordering::Equal => return Some(node.entry()),
        }
    }
    ret
}

pub fn min<K, V>(root: &Link<K, V>) -> Option<&Entry<K, V>> {
    root.map(|node| {
        let mut curr = unsafe { &*node.as_ptr() };
        while let Some(left_node) = curr.left {
            curr = unsafe { &*left_node.as_ptr() };
        }
        curr.entry()
    })
}

pub fn max<K, V>(root: &Link<K, V>) -> Option<&Entry<K, V>> {
    root.map(|node| {
        let mut curr = unsafe { &*node.as_ptr() };
        while let Some(right_node) = curr.right {
            curr = unsafe { &*right_node.as_ptr() };
        }
        curr.entry()
    })
}

/// Returns the number of nodes on the longest path from the root to a leaf.
pub fn height<K, V>(root: &Link<K, V>) -> usize {
    let mut stack: Vec<(NodePtr<K, V>, usize)> = root.iter().map(|node| (*node, 1)).collect();
    let mut ret = 0;
    while let Some((node, depth)) = stack.pop() {
        ret = ret.max(depth);
        let node = unsafe { node.as_ref() };
        stack.extend(node.left.map(|child| (child, depth + 1)));
        stack.extend(node.right.map(|child| (child, depth + 1)));
    }
    ret
}

pub fn len<K, V>(root: &Link<K, V>) -> usize {
    root.map_or(0, |node| unsafe { node.as_ref().len })
}

/// Frees every node of the tree, handing each one to `on_free` first.
pub fn clear<K, V, F>(root: &mut Link<K, V>, mut on_free: F)
where
    F: FnMut(Box<Node<K, V>>),
{
    let mut stack: Vec<NodePtr<K, V>> = root.take().into_iter().collect();
    while let Some(node) = stack.pop() {
        let mut boxed = unsafe { Node::from_link(node) };
        stack.extend(boxed.left.take());
        stack.extend(boxed.right.take());
        on_free(boxed);
    }
}
