use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, MutexGuard};

use crate::check::Violation;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::index::{DefaultIx, IndexType};
use crate::iter::ReadGuard;
use crate::policy::{Natural, Policy};
use crate::raw::RawTree;

/// A thread-safe red-black tree of values ordered by a [`Policy`].
///
/// Every method takes `&self` and holds the tree's mutex for the length of
/// the call, so a tree can be shared across threads behind an `Arc`.
/// Duplicates are kept. The tree carries one built-in cursor, driven by
/// [`start`](Self::start), [`forth`](Self::forth) and friends; more are made
/// with [`cursor`](Self::cursor).
///
/// Dropping the tree releases its values in order, as [`dispose`](Self::dispose) does.
pub struct RedBlackTree<V, P = Natural, Ix = DefaultIx>
where
    Ix: IndexType,
{
    pub(crate) raw: Arc<Mutex<RawTree<V, P, Ix>>>,
}

impl<V> RedBlackTree<V>
where
    Natural: Policy<V>,
{
    /// Create an empty `RedBlackTree`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a tree holding every value of `values`.
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::from_array([4, 2, 6, 1]);
    /// assert_eq!(tree.as_array(), [1, 2, 4, 6]);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_array<I>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        values.into_iter().collect()
    }
}

impl<V, P, Ix> RedBlackTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    /// Creates a new `RedBlackTree` with estimated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RedBlackTree {
            raw: Arc::new(Mutex::new(RawTree::with_capacity(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RawTree<V, P, Ix>> {
        self.raw.lock()
    }

    /// Lock the tree for borrowing iteration.
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::from_array(["b", "c", "a"]);
    /// let joined: String = tree.read().iter().copied().collect();
    /// assert_eq!(joined, "abc");
    /// ```
    #[inline]
    pub fn read(&self) -> ReadGuard<'_, V, P, Ix> {
        ReadGuard::new(self.lock())
    }

    /// Make a cursor on this tree, positioned off.
    #[inline]
    pub fn cursor(&self) -> Cursor<V, P, Ix> {
        Cursor::new(&self.raw)
    }

    /// Insert a value. Equivalent values are kept, the new one before the old.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::new();
    /// tree.put(2);
    /// tree.put(1);
    /// tree.put(2);
    /// assert_eq!(tree.occurrences(&2), 2);
    /// assert_eq!(tree.count(), 3);
    /// ```
    #[inline]
    pub fn put(&self, value: V) {
        let _ignore = self.lock().put(value);
    }

    /// Remove the value at the zero-based position `index`.
    pub fn remove(&self, index: usize) -> Result<V> {
        let mut raw = self.lock();
        let node = raw
            .node_for_index(index)
            .ok_or_else(|| Error::out_of_bounds(index, raw.count))?;
        Ok(raw.remove(node))
    }

    /// Remove the value at `index` and dispose of it.
    #[inline]
    pub fn remove_and_dispose(&self, index: usize) -> Result<()> {
        self.remove(index).map(P::deep_dispose)
    }

    /// Remove the first value, in order, that is deep-equal to `value`.
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::{Error, RedBlackTree};
    ///
    /// let tree = RedBlackTree::from_array([2, 1, 3]);
    /// assert_eq!(tree.remove_value(&2), Ok(2));
    /// assert_eq!(tree.remove_value(&2), Err(Error::ValueNotFound));
    /// assert_eq!(tree.as_array(), [1, 3]);
    /// ```
    pub fn remove_value(&self, value: &V) -> Result<V> {
        let mut raw = self.lock();
        let node = raw
            .find(|v| P::is_deep_equal(v, value))
            .ok_or(Error::ValueNotFound)?;
        Ok(raw.remove(node))
    }

    /// Remove the first value deep-equal to `value` and dispose of it.
    #[inline]
    pub fn remove_value_and_dispose(&self, value: &V) -> Result<()> {
        self.remove_value(value).map(P::deep_dispose)
    }

    /// Remove the value under the built-in cursor, which moves on to the next value.
    pub fn remove_at(&self) -> Result<V> {
        let mut raw = self.lock();
        let item = raw.first_cursor;
        if !item.is_value() {
            return Err(Error::CursorOff);
        }
        Ok(raw.remove(item))
    }

    /// Remove the value under the built-in cursor and dispose of it.
    #[inline]
    pub fn remove_at_and_dispose(&self) -> Result<()> {
        self.remove_at().map(P::deep_dispose)
    }

    /// Remove all values. Every cursor goes off.
    #[inline]
    pub fn wipe_out(&self) {
        let values = self.lock().wipe_out();
        debug!("wiped out {} values", values.len());
    }

    /// Remove all values and dispose of each, in order.
    #[inline]
    pub fn wipe_out_and_dispose(&self) {
        let values = self.lock().wipe_out();
        debug!("wiped out and disposing {} values", values.len());
        values.into_iter().for_each(P::deep_dispose);
    }

    /// Drop the tree, releasing its values in order. Cursors on it detach.
    #[inline]
    pub fn dispose(self) {
        self.wipe_out();
    }

    /// Drop the tree, disposing of each value in order. Cursors on it detach.
    #[inline]
    pub fn deep_dispose(self) {
        self.wipe_out_and_dispose();
    }

    /// Return the number of values in the tree.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().count
    }

    /// Number of nodes on the longest root-to-leaf path.
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::from_array([1, 2, 3]);
    /// assert_eq!(tree.height(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.lock().height()
    }

    /// Return `true` if the tree contains no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether some value is deep-equal to `value`. O(n).
    #[inline]
    pub fn has(&self, value: &V) -> bool {
        self.has_by(value, P::is_deep_equal)
    }

    /// Whether some value `v` satisfies `equal(v, value)`. O(n).
    pub fn has_by<F>(&self, value: &V, mut equal: F) -> bool
    where
        F: FnMut(&V, &V) -> bool,
    {
        self.lock().find(|v| equal(v, value)).is_some()
    }

    /// Number of values deep-equal to `value`. O(n).
    #[inline]
    pub fn occurrences(&self, value: &V) -> usize {
        self.occurrences_by(value, P::is_deep_equal)
    }

    /// Number of values `v` satisfying `equal(v, value)`. O(n).
    pub fn occurrences_by<F>(&self, value: &V, mut equal: F) -> usize
    where
        F: FnMut(&V, &V) -> bool,
    {
        self.lock().values().filter(|v| equal(*v, value)).count()
    }

    /// Move the built-in cursor to the smallest value.
    #[inline]
    pub fn start(&self) {
        let mut raw = self.lock();
        let first = raw.first_node();
        raw.first_cursor = first;
    }

    /// Move the built-in cursor to the largest value.
    #[inline]
    pub fn finish(&self) {
        let mut raw = self.lock();
        let last = raw.last_node();
        raw.first_cursor = last;
    }

    /// Move the built-in cursor to the next value. No-op when off.
    #[inline]
    pub fn forth(&self) {
        let mut raw = self.lock();
        let next = raw.successor(raw.first_cursor);
        raw.first_cursor = next;
    }

    /// Move the built-in cursor to the previous value. No-op when off.
    #[inline]
    pub fn back(&self) {
        let mut raw = self.lock();
        let prev = raw.predecessor(raw.first_cursor);
        raw.first_cursor = prev;
    }

    /// Move the built-in cursor to the zero-based position `index`.
    pub fn go(&self, index: usize) -> Result<()> {
        let mut raw = self.lock();
        let node = raw
            .node_for_index(index)
            .ok_or_else(|| Error::out_of_bounds(index, raw.count))?;
        raw.first_cursor = node;
        Ok(())
    }

    /// Move the built-in cursor to the first value equivalent to `value`;
    /// failing that, to the greatest value before it; failing that, off.
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::from_array([10, 20, 30]);
    /// tree.go_to_value(&25);
    /// assert_eq!(tree.item_at(), Ok(20));
    /// tree.go_to_value(&5);
    /// assert!(tree.off());
    /// ```
    #[inline]
    pub fn go_to_value(&self, value: &V) {
        let mut raw = self.lock();
        let node = raw.node_for_value(value);
        raw.first_cursor = node;
    }

    /// Whether the built-in cursor is not on a value.
    #[inline]
    #[must_use]
    pub fn off(&self) -> bool {
        !self.lock().first_cursor.is_value()
    }

    /// Whether the built-in cursor is on the smallest value.
    #[inline]
    #[must_use]
    pub fn is_first(&self) -> bool {
        let raw = self.lock();
        raw.first_cursor.is_value() && raw.first_cursor == raw.first_node()
    }

    /// Whether the built-in cursor is on the largest value.
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        let raw = self.lock();
        raw.first_cursor.is_value() && raw.first_cursor == raw.last_node()
    }

    /// Zero-based position of the built-in cursor. O(n).
    pub fn index(&self) -> Result<usize> {
        let raw = self.lock();
        if raw.first_cursor.is_value() {
            Ok(raw.index_for_node(raw.first_cursor))
        } else {
            Err(Error::CursorOff)
        }
    }

    /// Whether `other` is this very tree, or a tree with the identical node
    /// layout holding deep-equal values slot by slot (e.g. a shallow clone
    /// nobody has mutated since).
    ///
    /// # Example
    /// ```rust
    /// use rb_cursor_tree::RedBlackTree;
    ///
    /// let a = RedBlackTree::from_array([1, 2, 3]);
    /// let b = RedBlackTree::from_array([3, 2, 1]);
    /// assert!(a.is_deep_equal(&b));
    /// assert!(!a.is_equal(&b));
    /// assert!(a.is_equal(&a.clone()));
    /// ```
    pub fn is_equal(&self, other: &Self) -> bool {
        self.with_both(other, |a, b| {
            a.count == b.count
                && a.nodes.len() == b.nodes.len()
                && a.nodes.iter().zip(b.nodes.iter()).all(|(x, y)| {
                    x.left == y.left
                        && x.right == y.right
                        && x.parent == y.parent
                        && x.color == y.color
                        && match (&x.value, &y.value) {
                            (Some(xv), Some(yv)) => P::is_deep_equal(xv, yv),
                            (None, None) => true,
                            _ => false,
                        }
                })
        })
    }

    /// Whether both trees hold deep-equal values in the same order.
    pub fn is_deep_equal(&self, other: &Self) -> bool {
        self.with_both(other, |a, b| {
            a.count == b.count
                && a
                    .values()
                    .zip(b.values())
                    .all(|(x, y)| P::is_deep_equal(x, y))
        })
    }

    /// Run `op` on both trees locked, in address order so that two threads
    /// comparing the same pair cannot deadlock.
    fn with_both<F>(&self, other: &Self, op: F) -> bool
    where
        F: FnOnce(&RawTree<V, P, Ix>, &RawTree<V, P, Ix>) -> bool,
    {
        if Arc::ptr_eq(&self.raw, &other.raw) {
            return true;
        }
        let (a, b) = if Arc::as_ptr(&self.raw) < Arc::as_ptr(&other.raw) {
            let a = self.lock();
            (a, other.lock())
        } else {
            let b = other.lock();
            (self.lock(), b)
        };
        op(&*a, &*b)
    }

    /// A tree with the same shape whose values are [`Policy::deep_clone`]s.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        RedBlackTree {
            raw: Arc::new(Mutex::new(self.lock().map_values(P::deep_clone))),
        }
    }

    /// Check every structural invariant: red-black coloring, black height,
    /// ordering, count, parent links and cursor validity. O(n).
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), Violation> {
        self.lock().validate()
    }
}

impl<V, P, Ix> RedBlackTree<V, P, Ix>
where
    V: Clone,
    P: Policy<V>,
    Ix: IndexType,
{
    /// Clone of the value at the zero-based position `index`. O(n).
    pub fn item(&self, index: usize) -> Result<V> {
        let raw = self.lock();
        raw.node_for_index(index)
            .and_then(|x| raw.value(x))
            .cloned()
            .ok_or_else(|| Error::out_of_bounds(index, raw.count))
    }

    /// Clone of the value under the built-in cursor.
    pub fn item_at(&self) -> Result<V> {
        let raw = self.lock();
        raw.value(raw.first_cursor).cloned().ok_or(Error::CursorOff)
    }

    /// Clone of the value under the built-in cursor, or the policy default when off.
    #[inline]
    pub fn item_at_or_default(&self) -> V {
        self.item_at().unwrap_or_else(|_| P::default_value())
    }

    /// Clone of the smallest value.
    pub fn first(&self) -> Result<V> {
        let raw = self.lock();
        raw.value(raw.first_node()).cloned().ok_or(Error::Empty)
    }

    /// Clone of the largest value.
    pub fn last(&self) -> Result<V> {
        let raw = self.lock();
        raw.value(raw.last_node()).cloned().ok_or(Error::Empty)
    }

    /// Clones of all values, in order.
    pub fn as_array(&self) -> Vec<V> {
        self.lock().values().cloned().collect()
    }
}

impl<V, P, Ix> Clone for RedBlackTree<V, P, Ix>
where
    V: Clone,
    P: Policy<V>,
    Ix: IndexType,
{
    /// A new tree with the identical node layout and cloned values.
    fn clone(&self) -> Self {
        RedBlackTree {
            raw: Arc::new(Mutex::new(self.lock().map_values(V::clone))),
        }
    }
}

impl<V, P, Ix> Default for RedBlackTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<V, P, Ix> FromIterator<V> for RedBlackTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut raw = RawTree::with_capacity(iter.size_hint().0);
        for value in iter {
            let _ignore = raw.put(value);
        }
        RedBlackTree {
            raw: Arc::new(Mutex::new(raw)),
        }
    }
}

impl<V, P, Ix> Extend<V> for RedBlackTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        let mut raw = self.lock();
        for value in iter {
            let _ignore = raw.put(value);
        }
    }
}

impl<V, P, Ix> fmt::Debug for RedBlackTree<V, P, Ix>
where
    V: fmt::Debug,
    P: Policy<V>,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.lock();
        f.debug_struct("RedBlackTree")
            .field("count", &raw.count)
            .field("values", &raw.values().collect::<Vec<_>>())
            .field("cursor", &raw.first_cursor)
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<V, P, Ix> serde::Serialize for RedBlackTree<V, P, Ix>
where
    V: serde::Serialize,
    P: Policy<V>,
    Ix: IndexType,
{
    /// Serializes the values in order.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.lock().values())
    }
}

#[cfg(feature = "serde")]
impl<'de, V, P, Ix> serde::Deserialize<'de> for RedBlackTree<V, P, Ix>
where
    V: serde::Deserialize<'de>,
    P: Policy<V>,
    Ix: IndexType,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<V>::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}
