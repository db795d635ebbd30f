use std::fmt;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::policy::{Natural, Policy};
use crate::raw::{CursorSlot, RawTree};

/// A position in a [`RedBlackTree`](crate::RedBlackTree), independent of the
/// tree's built-in cursor and of every other cursor on the same tree.
///
/// A cursor starts off. Removing the value it sits on moves it to the next
/// value first, so it never dangles. Dropping the cursor unlinks it from its
/// tree; dropping the tree detaches the cursor, after which every operation
/// returns [`Error::TreeDisposed`].
///
/// Each call locks the tree, then the cursor. Dropping a cursor while holding
/// a [`ReadGuard`](crate::ReadGuard) of its tree on the same thread deadlocks.
///
/// # Example
/// ```rust
/// use rb_cursor_tree::RedBlackTree;
///
/// let tree = RedBlackTree::from_array([3, 1, 2]);
/// let cursor = tree.cursor();
/// assert!(cursor.off());
/// cursor.start()?;
/// assert_eq!(cursor.item_at()?, 1);
/// cursor.forth()?;
/// assert_eq!(cursor.item_at()?, 2);
/// tree.remove_value(&2)?;
/// assert_eq!(cursor.item_at()?, 3);
/// # Ok::<(), rb_cursor_tree::Error>(())
/// ```
pub struct Cursor<V, P = Natural, Ix = DefaultIx>
where
    Ix: IndexType,
{
    /// Tree this cursor walks
    tree: Weak<Mutex<RawTree<V, P, Ix>>>,
    /// Current node, the sentinel when off
    item: Arc<CursorSlot<Ix>>,
}

impl<V, P, Ix> Cursor<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    /// Registers a new cursor, positioned off, with the tree.
    pub(crate) fn new(tree: &Arc<Mutex<RawTree<V, P, Ix>>>) -> Self {
        let item = Arc::new(Mutex::new(NodeIndex::sentinel()));
        let mut raw = tree.lock();
        raw.cursors.push(Arc::downgrade(&item));
        debug!("cursor made, {} external cursors", raw.cursors.len());
        drop(raw);
        Cursor {
            tree: Arc::downgrade(tree),
            item,
        }
    }

    /// Run `op` with the tree lock held, then the cursor lock.
    fn with_locked<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut RawTree<V, P, Ix>, &mut NodeIndex<Ix>) -> R,
    {
        let Some(tree) = self.tree.upgrade() else {
            warn!("cursor used after its tree was dropped");
            return Err(Error::TreeDisposed);
        };
        let mut raw = tree.lock();
        let mut item = self.item.lock();
        Ok(op(&mut *raw, &mut *item))
    }

    /// Move to the smallest value, or off if the tree is empty.
    #[inline]
    pub fn start(&self) -> Result<()> {
        self.with_locked(|raw, item| *item = raw.first_node())
    }

    /// Move to the largest value, or off if the tree is empty.
    #[inline]
    pub fn finish(&self) -> Result<()> {
        self.with_locked(|raw, item| *item = raw.last_node())
    }

    /// Move to the next value in order, or off past the end. No-op when off.
    #[inline]
    pub fn forth(&self) -> Result<()> {
        self.with_locked(|raw, item| *item = raw.successor(*item))
    }

    /// Move to the previous value in order, or off before the start. No-op when off.
    #[inline]
    pub fn back(&self) -> Result<()> {
        self.with_locked(|raw, item| *item = raw.predecessor(*item))
    }

    /// Move to the zero-based position `index`.
    pub fn go(&self, index: usize) -> Result<()> {
        self.with_locked(|raw, item| {
            *item = raw
                .node_for_index(index)
                .ok_or_else(|| Error::out_of_bounds(index, raw.count))?;
            Ok(())
        })?
    }

    /// Move to the first value equivalent to `value`; failing that, to the
    /// greatest value before it; failing that, off.
    pub fn go_to_value(&self, value: &V) -> Result<()> {
        self.with_locked(|raw, item| *item = raw.node_for_value(value))
    }

    /// Whether the cursor is not on a value. A detached cursor is off.
    #[inline]
    pub fn off(&self) -> bool {
        self.with_locked(|_, item| !item.is_value()).unwrap_or(true)
    }

    /// Whether the cursor is on the smallest value.
    #[inline]
    pub fn is_first(&self) -> bool {
        self.with_locked(|raw, item| item.is_value() && *item == raw.first_node())
            .unwrap_or(false)
    }

    /// Whether the cursor is on the largest value.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.with_locked(|raw, item| item.is_value() && *item == raw.last_node())
            .unwrap_or(false)
    }

    /// Zero-based position of the cursor. O(n).
    pub fn index(&self) -> Result<usize> {
        self.with_locked(|raw, item| {
            if item.is_value() {
                Ok(raw.index_for_node(*item))
            } else {
                Err(Error::CursorOff)
            }
        })?
    }

    /// Remove the value under the cursor, which moves on to the next value.
    pub fn remove_at(&self) -> Result<V> {
        let Some(tree) = self.tree.upgrade() else {
            warn!("cursor used after its tree was dropped");
            return Err(Error::TreeDisposed);
        };
        let mut raw = tree.lock();
        // released before the removal, which retargets this cursor too
        let item = *self.item.lock();
        if !item.is_value() {
            return Err(Error::CursorOff);
        }
        Ok(raw.remove(item))
    }

    /// Remove the value under the cursor and dispose of it.
    #[inline]
    pub fn remove_at_and_dispose(&self) -> Result<()> {
        self.remove_at().map(P::deep_dispose)
    }

    /// Unlink the cursor from its tree.
    #[inline]
    pub fn dispose(self) {
        drop(self);
    }
}

impl<V, P, Ix> Cursor<V, P, Ix>
where
    V: Clone,
    P: Policy<V>,
    Ix: IndexType,
{
    /// Clone of the value under the cursor.
    pub fn item_at(&self) -> Result<V> {
        self.with_locked(|raw, item| raw.value(*item).cloned().ok_or(Error::CursorOff))?
    }

    /// Clone of the value under the cursor, or the policy default when off.
    pub fn item_at_or_default(&self) -> V {
        self.item_at().unwrap_or_else(|_| P::default_value())
    }
}

impl<V, P, Ix> Drop for Cursor<V, P, Ix>
where
    Ix: IndexType,
{
    fn drop(&mut self) {
        if let Some(tree) = self.tree.upgrade() {
            let mut raw = tree.lock();
            let me = Arc::as_ptr(&self.item);
            raw.cursors.retain(|slot| slot.as_ptr() != me);
            debug!("cursor disposed, {} external cursors", raw.cursors.len());
        }
    }
}

impl<V, P, Ix> fmt::Debug for Cursor<V, P, Ix>
where
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("item", &*self.item.lock())
            .field("attached", &(self.tree.strong_count() > 0))
            .finish()
    }
}
