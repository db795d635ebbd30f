use std::fmt;
use std::iter::FusedIterator;

use parking_lot::MutexGuard;

use crate::index::{IndexType, NodeIndex};
use crate::node::Node;
use crate::policy::Policy;
use crate::raw::RawTree;

/// The tree's lock, held for borrowing reads.
///
/// Every other call on the same tree, and every cursor call on it, waits
/// until the guard is dropped.
pub struct ReadGuard<'a, V, P, Ix>
where
    Ix: IndexType,
{
    raw: MutexGuard<'a, RawTree<V, P, Ix>>,
}

impl<'a, V, P, Ix> ReadGuard<'a, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    pub(crate) fn new(raw: MutexGuard<'a, RawTree<V, P, Ix>>) -> Self {
        ReadGuard { raw }
    }

    /// Get an iterator over the values of the tree, in order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, V, P, Ix> {
        Iter::new(&self.raw)
    }

    /// Number of values in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.count
    }

    /// Return `true` if the tree contains no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.count == 0
    }

    /// The smallest value.
    #[inline]
    pub fn first(&self) -> Option<&V> {
        self.raw.value(self.raw.first_node())
    }

    /// The largest value.
    #[inline]
    pub fn last(&self) -> Option<&V> {
        self.raw.value(self.raw.last_node())
    }
}

impl<'g, V, P, Ix> IntoIterator for &'g ReadGuard<'_, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    type Item = &'g V;
    type IntoIter = Iter<'g, V, P, Ix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a `RedBlackTree`, walking parent links.
pub struct Iter<'a, V, P, Ix>
where
    Ix: IndexType,
{
    /// Reference to the tree
    tree_ref: &'a RawTree<V, P, Ix>,
    /// Next node from the front
    front: NodeIndex<Ix>,
    /// Next node from the back
    back: NodeIndex<Ix>,
    /// Values not yet yielded from either end
    remaining: usize,
}

impl<'a, V, P, Ix> Iter<'a, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    fn new(tree_ref: &'a RawTree<V, P, Ix>) -> Self {
        Iter {
            tree_ref,
            front: tree_ref.first_node(),
            back: tree_ref.last_node(),
            remaining: tree_ref.count,
        }
    }
}

impl<'a, V, P, Ix> Iterator for Iter<'a, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.front = self.tree_ref.successor(x);
        self.remaining -= 1;
        Some(self.tree_ref.node_ref(x, Node::value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, P, Ix> DoubleEndedIterator for Iter<'_, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.back = self.tree_ref.predecessor(x);
        self.remaining -= 1;
        Some(self.tree_ref.node_ref(x, Node::value))
    }
}

impl<V, P, Ix> ExactSizeIterator for Iter<'_, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
}

impl<V, P, Ix> FusedIterator for Iter<'_, V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
}

impl<V, P, Ix> fmt::Debug for Iter<'_, V, P, Ix>
where
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("remaining", &self.remaining)
            .finish()
    }
}
