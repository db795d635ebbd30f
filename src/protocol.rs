//! Container-independent access.
//!
//! [`Collection`] is the surface every container of this family shares, so
//! callers can hold a `Box<dyn Collection<V>>` without knowing which
//! structure backs it.

use crate::error::Result;
use crate::index::IndexType;
use crate::policy::Policy;
use crate::tree::RedBlackTree;

/// Uniform access to a container of `V`.
///
/// # Example
/// ```rust
/// use rb_cursor_tree::{Collection, RedBlackTree};
///
/// let boxed: Box<dyn Collection<i32>> = Box::new(RedBlackTree::new());
/// boxed.put(3);
/// boxed.put(1);
/// assert_eq!(boxed.to_vec(), [1, 3]);
/// assert!(boxed.has(&3));
/// ```
pub trait Collection<V> {
    /// Number of values held.
    fn count(&self) -> usize;

    /// Return `true` if nothing is held.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether some held value is deep-equal to `value`.
    fn has(&self, value: &V) -> bool;

    /// Number of held values deep-equal to `value`.
    fn occurrences(&self, value: &V) -> usize;

    /// Add a value.
    fn put(&self, value: V);

    /// Remove one value deep-equal to `value`.
    fn remove_value(&self, value: &V) -> Result<V>;

    /// Remove everything.
    fn wipe_out(&self);

    /// Clones of the held values, in the container's own order.
    fn to_vec(&self) -> Vec<V>;
}

impl<V, P, Ix> Collection<V> for RedBlackTree<V, P, Ix>
where
    V: Clone,
    P: Policy<V>,
    Ix: IndexType,
{
    #[inline]
    fn count(&self) -> usize {
        RedBlackTree::count(self)
    }

    #[inline]
    fn has(&self, value: &V) -> bool {
        RedBlackTree::has(self, value)
    }

    #[inline]
    fn occurrences(&self, value: &V) -> usize {
        RedBlackTree::occurrences(self, value)
    }

    #[inline]
    fn put(&self, value: V) {
        RedBlackTree::put(self, value);
    }

    #[inline]
    fn remove_value(&self, value: &V) -> Result<V> {
        RedBlackTree::remove_value(self, value)
    }

    #[inline]
    fn wipe_out(&self) {
        RedBlackTree::wipe_out(self);
    }

    #[inline]
    fn to_vec(&self) -> Vec<V> {
        self.as_array()
    }
}
