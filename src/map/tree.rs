//! Persistent Tree Module
//!
//! Immutable ordered map backed by a path-copying AVL tree.
//!
//! Every update copies only the nodes on the path from the root to the
//! touched position; all other subtrees are shared through `Arc` between the
//! old and the new version. Older versions stay valid and unchanged.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type Link<K, V> = Option<Arc<Node<K, V>>>;

// == Node ==
struct Node<K, V> {
    key: K,
    value: V,
    height: u8,
    /// Number of nodes in this subtree (including self)
    size: usize,
    left: Link<K, V>,
    right: Link<K, V>,
}

fn height<K, V>(link: &Link<K, V>) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

fn size<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

fn make<K, V>(key: K, value: V, left: Link<K, V>, right: Link<K, V>) -> Arc<Node<K, V>> {
    Arc::new(Node {
        key,
        value,
        height: height(&left).max(height(&right)) + 1,
        size: size(&left) + size(&right) + 1,
        left,
        right,
    })
}

// == Rebalancing ==
/// Builds a node from its parts, rotating when the subtree heights differ
/// by more than one. Callers only ever unbalance a node by a single level.
fn balance<K: Clone, V: Clone>(
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
) -> Arc<Node<K, V>> {
    let hl = height(&left);
    let hr = height(&right);

    if hl > hr + 1 {
        if let Some(l) = &left {
            if height(&l.left) >= height(&l.right) {
                return make(
                    l.key.clone(),
                    l.value.clone(),
                    l.left.clone(),
                    Some(make(key, value, l.right.clone(), right)),
                );
            }
            if let Some(lr) = &l.right {
                return make(
                    lr.key.clone(),
                    lr.value.clone(),
                    Some(make(
                        l.key.clone(),
                        l.value.clone(),
                        l.left.clone(),
                        lr.left.clone(),
                    )),
                    Some(make(key, value, lr.right.clone(), right)),
                );
            }
        }
    } else if hr > hl + 1 {
        if let Some(r) = &right {
            if height(&r.right) >= height(&r.left) {
                return make(
                    r.key.clone(),
                    r.value.clone(),
                    Some(make(key, value, left, r.left.clone())),
                    r.right.clone(),
                );
            }
            if let Some(rl) = &r.left {
                return make(
                    rl.key.clone(),
                    rl.value.clone(),
                    Some(make(key, value, left, rl.left.clone())),
                    Some(make(
                        r.key.clone(),
                        r.value.clone(),
                        rl.right.clone(),
                        r.right.clone(),
                    )),
                );
            }
        }
    }

    make(key, value, left, right)
}

fn insert_node<K: Ord + Clone, V: Clone>(link: &Link<K, V>, key: K, value: V) -> Arc<Node<K, V>> {
    match link {
        None => make(key, value, None, None),
        Some(node) => match key.cmp(&node.key) {
            Ordering::Less => balance(
                node.key.clone(),
                node.value.clone(),
                Some(insert_node(&node.left, key, value)),
                node.right.clone(),
            ),
            Ordering::Greater => balance(
                node.key.clone(),
                node.value.clone(),
                node.left.clone(),
                Some(insert_node(&node.right, key, value)),
            ),
            Ordering::Equal => make(key, value, node.left.clone(), node.right.clone()),
        },
    }
}

/// Removes `key` below `link`. Returns `None` when the key is absent so the
/// caller can hand back the original version untouched.
fn remove_node<K: Ord + Clone, V: Clone>(link: &Link<K, V>, key: &K) -> Option<(Link<K, V>, V)> {
    let node = link.as_ref()?;
    match key.cmp(&node.key) {
        Ordering::Less => {
            let (left, removed) = remove_node(&node.left, key)?;
            let rebuilt = balance(node.key.clone(), node.value.clone(), left, node.right.clone());
            Some((Some(rebuilt), removed))
        }
        Ordering::Greater => {
            let (right, removed) = remove_node(&node.right, key)?;
            let rebuilt = balance(node.key.clone(), node.value.clone(), node.left.clone(), right);
            Some((Some(rebuilt), removed))
        }
        Ordering::Equal => {
            let merged = match (&node.left, &node.right) {
                (None, right) => right.clone(),
                (left, None) => left.clone(),
                (left, Some(right)) => {
                    let (rest, (min_key, min_value)) = take_min(right);
                    Some(balance(min_key, min_value, left.clone(), rest))
                }
            };
            Some((merged, node.value.clone()))
        }
    }
}

fn take_min<K: Clone, V: Clone>(node: &Arc<Node<K, V>>) -> (Link<K, V>, (K, V)) {
    match &node.left {
        None => (
            node.right.clone(),
            (node.key.clone(), node.value.clone()),
        ),
        Some(left) => {
            let (rest, min) = take_min(left);
            let rebuilt = balance(node.key.clone(), node.value.clone(), rest, node.right.clone());
            (Some(rebuilt), min)
        }
    }
}

// == Persistent Tree ==
/// Immutable ordered map with structural sharing.
///
/// `insert`, `remove` and `extract_min` are O(log n) and return a new tree;
/// `len` is O(1); cloning a tree is O(1).
pub struct PersistentTree<K, V> {
    root: Link<K, V>,
}

impl<K, V> PersistentTree<K, V> {
    // == Constructor ==
    /// Creates an empty tree. Allocates nothing.
    pub const fn new() -> Self {
        Self { root: None }
    }

    pub fn len(&self) -> usize {
        size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns true when both trees share the same root node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the entry with the smallest key.
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_ref()?;
        while let Some(left) = &node.left {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the largest key.
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_ref()?;
        while let Some(right) = &node.right {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// In-order traversal, smallest key first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            front: Vec::new(),
            back: Vec::new(),
            remaining: self.len(),
        };
        iter.push_left_spine(self.root.as_ref());
        iter.push_right_spine(self.root.as_ref());
        iter
    }

    #[cfg(test)]
    fn depth(&self) -> u8 {
        height(&self.root)
    }
}

impl<K: Ord, V> PersistentTree<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut link = &self.root;
        while let Some(node) = link {
            link = match key.cmp(&node.key) {
                Ordering::Less => &node.left,
                Ordering::Greater => &node.right,
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

impl<K: Ord + Clone, V: Clone> PersistentTree<K, V> {
    // == Insert ==
    /// Returns a new tree with `key` mapped to `value`, replacing any
    /// previous mapping.
    pub fn insert(&self, key: K, value: V) -> Self {
        Self {
            root: Some(insert_node(&self.root, key, value)),
        }
    }

    // == Remove ==
    /// Returns the removed value and the tree without `key`, or `None` when
    /// `key` is absent.
    pub fn remove(&self, key: &K) -> Option<(V, Self)> {
        let (root, removed) = remove_node(&self.root, key)?;
        Some((removed, Self { root }))
    }

    // == Extract Minimum ==
    /// Splits off the entry with the smallest key.
    pub fn extract_min(&self) -> Option<((K, V), Self)> {
        let root = self.root.as_ref()?;
        let (rest, min) = take_min(root);
        Some((min, Self { root: rest }))
    }
}

impl<K, V> Clone for PersistentTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for PersistentTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for PersistentTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq> Eq for PersistentTree<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// == Iterator ==
/// Double-ended in-order iterator over a [`PersistentTree`].
pub struct Iter<'a, K, V> {
    front: Vec<&'a Node<K, V>>,
    back: Vec<&'a Node<K, V>>,
    /// Entries not yet yielded from either end; stops the two cursors from
    /// crossing.
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left_spine(&mut self, mut link: Option<&'a Arc<Node<K, V>>>) {
        while let Some(node) = link {
            self.front.push(node);
            link = node.left.as_ref();
        }
    }

    fn push_right_spine(&mut self, mut link: Option<&'a Arc<Node<K, V>>>) {
        while let Some(node) = link {
            self.back.push(node);
            link = node.right.as_ref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front.pop()?;
        self.push_left_spine(node.right.as_ref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back.pop()?;
        self.push_right_spine(node.left.as_ref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
