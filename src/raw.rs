use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use log::trace;
use parking_lot::Mutex;

use crate::index::{IndexType, NodeIndex};
use crate::node::{Color, Node};
use crate::policy::Policy;

/// Position of an external cursor, owned by the cursor and observed by its tree.
pub(crate) type CursorSlot<Ix> = Mutex<NodeIndex<Ix>>;

/// The unlocked red-black tree.
///
/// Nodes live in `nodes`; slot 0 is the sentinel and slot 1 the pseudo-root,
/// whose left child is the real root. Every public operation reaches this
/// type through the tree mutex.
pub(crate) struct RawTree<V, P, Ix>
where
    Ix: IndexType,
{
    /// Vector that stores nodes
    pub(crate) nodes: Vec<Node<V, Ix>>,
    /// Number of values in the tree
    pub(crate) count: usize,
    /// Position of the built-in cursor
    pub(crate) first_cursor: NodeIndex<Ix>,
    /// Membership list of the external cursors
    pub(crate) cursors: Vec<Weak<CursorSlot<Ix>>>,
    _policy: PhantomData<fn() -> P>,
}

impl<V, P, Ix> fmt::Debug for RawTree<V, P, Ix>
where
    V: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTree")
            .field("nodes", &self.nodes)
            .field("count", &self.count)
            .field("first_cursor", &self.first_cursor)
            .field("cursors", &self.cursors.len())
            .finish()
    }
}

impl<V, P, Ix> RawTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    /// Creates an empty tree with room for `capacity` values.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.saturating_add(2));
        nodes.push(Node::placeholder());
        nodes.push(Node::placeholder());
        RawTree {
            nodes,
            count: 0,
            first_cursor: NodeIndex::sentinel(),
            cursors: Vec::new(),
            _policy: PhantomData,
        }
    }

    /// Builds a tree with the same slot layout whose values are produced by `op`.
    ///
    /// The built-in cursor keeps its position, external cursors are not carried over.
    pub(crate) fn map_values<F>(&self, mut op: F) -> Self
    where
        F: FnMut(&V) -> V,
    {
        let nodes = self
            .nodes
            .iter()
            .map(|node| Node {
                left: node.left,
                right: node.right,
                parent: node.parent,
                color: node.color,
                value: node.value.as_ref().map(&mut op),
            })
            .collect();
        RawTree {
            nodes,
            count: self.count,
            first_cursor: self.first_cursor,
            cursors: Vec::new(),
            _policy: PhantomData,
        }
    }

    /// Value stored at a value node.
    #[inline]
    pub(crate) fn value(&self, node: NodeIndex<Ix>) -> Option<&V> {
        if node.is_value() {
            self.nodes[node.index()].value.as_ref()
        } else {
            None
        }
    }

    /// Insert a value, returning the node that now holds it.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    pub(crate) fn put(&mut self, value: V) -> NodeIndex<Ix> {
        let z = NodeIndex::new(self.nodes.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != z,
            "Reached maximum number of nodes"
        );

        let mut y = NodeIndex::pseudo_root();
        let mut x = self.root();
        let mut to_left = true;
        while !x.is_sentinel() {
            y = x;
            to_left = !P::order(self.node_ref(x, Node::value), &value);
            x = if to_left {
                self.node_ref(x, Node::left)
            } else {
                self.node_ref(x, Node::right)
            };
        }

        self.nodes.push(Node::leaf(value, y));
        if to_left {
            self.node_mut(y, Node::set_left(z));
        } else {
            self.node_mut(y, Node::set_right(z));
        }

        self.repair_put(z);
        self.node_mut(self.root(), Node::set_color(Color::Black));

        self.count = self.count.wrapping_add(1);
        trace!("put {z:?}, count {}", self.count);
        z
    }

    /// Remove a value node, returning its value.
    ///
    /// Cursors on the node move to its in-order successor first.
    pub(crate) fn remove(&mut self, node: NodeIndex<Ix>) -> V {
        debug_assert!(node.is_value(), "remove on {node:?}");
        let successor = self.successor(node);
        self.retarget(node, successor);

        let mut z = node;
        let (left, right) = self.node_ref(z, |n| (n.left(), n.right()));
        if !left.is_sentinel() && !right.is_sentinel() {
            let predecessor = self.rightmost(left);
            self.swap_values(z, predecessor);
            self.retarget(predecessor, z);
            z = predecessor;
        }

        let left = self.node_ref(z, Node::left);
        let pull_up = if left.is_sentinel() {
            self.node_ref(z, Node::right)
        } else {
            left
        };

        if self.node_ref(z, Node::is_black) {
            if !pull_up.is_sentinel() {
                self.splice(z, pull_up);
                self.repair_remove(pull_up);
            } else if z != self.root() {
                // the fixup needs the leaf's position, so it runs before the unlink
                self.repair_remove(z);
                self.splice(z, pull_up);
            } else {
                self.splice(z, pull_up);
            }
        } else {
            self.splice(z, pull_up);
        }

        self.count = self.count.wrapping_sub(1);
        trace!("remove {node:?} via {z:?}, count {}", self.count);
        self.release(z)
    }

    /// Restore red-black tree properties after an insert.
    fn repair_put(&mut self, mut z: NodeIndex<Ix>) {
        while z != self.root() && self.parent_ref(z, Node::is_red) {
            let p = self.node_ref(z, Node::parent);
            let g = self.node_ref(p, Node::parent);
            if !g.is_value() {
                break;
            }
            if self.is_left_child(p) {
                let y = self.node_ref(g, Node::right);
                if self.node_ref(y, Node::is_red) {
                    self.node_mut(p, Node::set_color(Color::Black));
                    self.node_mut(y, Node::set_color(Color::Black));
                    self.node_mut(g, Node::set_color(Color::Red));
                    z = g;
                } else {
                    if self.is_right_child(z) {
                        z = p;
                        self.rotate_left(z);
                    }
                    self.parent_mut(z, Node::set_color(Color::Black));
                    let g = self.grand_parent(z);
                    if g.is_value() {
                        self.node_mut(g, Node::set_color(Color::Red));
                        self.rotate_right(g);
                    }
                }
            } else {
                let y = self.node_ref(g, Node::left);
                if self.node_ref(y, Node::is_red) {
                    self.node_mut(p, Node::set_color(Color::Black));
                    self.node_mut(y, Node::set_color(Color::Black));
                    self.node_mut(g, Node::set_color(Color::Red));
                    z = g;
                } else {
                    if self.is_left_child(z) {
                        z = p;
                        self.rotate_right(z);
                    }
                    self.parent_mut(z, Node::set_color(Color::Black));
                    let g = self.grand_parent(z);
                    if g.is_value() {
                        self.node_mut(g, Node::set_color(Color::Red));
                        self.rotate_left(g);
                    }
                }
            }
        }
    }

    /// Restore red-black tree properties after a remove.
    ///
    /// `x` is a value node carrying the missing black: either the pulled-up
    /// child or the black leaf that is about to be unlinked.
    fn repair_remove(&mut self, mut x: NodeIndex<Ix>) {
        while x != self.root() && self.node_ref(x, Node::is_black) {
            let p = self.node_ref(x, Node::parent);
            if self.is_left_child(x) {
                let mut w = self.node_ref(p, Node::right);
                if self.node_ref(w, Node::is_red) {
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.node_mut(p, Node::set_color(Color::Red));
                    self.rotate_left(p);
                    w = self.node_ref(p, Node::right);
                }
                // a black non-root node always has a sibling
                debug_assert!(!w.is_sentinel(), "black {x:?} without sibling");
                if w.is_sentinel() {
                    break;
                }
                if self.left_ref(w, Node::is_black) && self.right_ref(w, Node::is_black) {
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = p;
                } else {
                    if self.right_ref(w, Node::is_black) {
                        self.left_mut(w, Node::set_color(Color::Black));
                        self.node_mut(w, Node::set_color(Color::Red));
                        self.rotate_right(w);
                        w = self.node_ref(p, Node::right);
                    }
                    self.node_mut(w, Node::set_color(self.node_ref(p, Node::color)));
                    self.node_mut(p, Node::set_color(Color::Black));
                    self.right_mut(w, Node::set_color(Color::Black));
                    self.rotate_left(p);
                    x = self.root();
                }
            } else {
                let mut w = self.node_ref(p, Node::left);
                if self.node_ref(w, Node::is_red) {
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.node_mut(p, Node::set_color(Color::Red));
                    self.rotate_right(p);
                    w = self.node_ref(p, Node::left);
                }
                debug_assert!(!w.is_sentinel(), "black {x:?} without sibling");
                if w.is_sentinel() {
                    break;
                }
                if self.right_ref(w, Node::is_black) && self.left_ref(w, Node::is_black) {
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = p;
                } else {
                    if self.left_ref(w, Node::is_black) {
                        self.right_mut(w, Node::set_color(Color::Black));
                        self.node_mut(w, Node::set_color(Color::Red));
                        self.rotate_left(w);
                        w = self.node_ref(p, Node::left);
                    }
                    self.node_mut(w, Node::set_color(self.node_ref(p, Node::color)));
                    self.node_mut(p, Node::set_color(Color::Black));
                    self.left_mut(w, Node::set_color(Color::Black));
                    self.rotate_right(p);
                    x = self.root();
                }
            }
        }
        self.node_mut(x, Node::set_color(Color::Black));
    }

    /// Binary tree left rotate.
    fn rotate_left(&mut self, x: NodeIndex<Ix>) {
        if self.node_ref(x, Node::right).is_sentinel() {
            return;
        }
        let y = self.node_ref(x, Node::right);
        let y_left = self.node_ref(y, Node::left);
        self.node_mut(x, Node::set_right(y_left));
        if !y_left.is_sentinel() {
            self.node_mut(y_left, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_left(x));
    }

    /// Binary tree right rotate.
    fn rotate_right(&mut self, x: NodeIndex<Ix>) {
        if self.node_ref(x, Node::left).is_sentinel() {
            return;
        }
        let y = self.node_ref(x, Node::left);
        let y_right = self.node_ref(y, Node::right);
        self.node_mut(x, Node::set_left(y_right));
        if !y_right.is_sentinel() {
            self.node_mut(y_right, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_right(x));
    }

    /// Replace parent during a rotation.
    ///
    /// The real root hangs off the pseudo-root, so `x` always has a parent to relink.
    fn replace_parent(&mut self, x: NodeIndex<Ix>, y: NodeIndex<Ix>) {
        let p = self.node_ref(x, Node::parent);
        self.node_mut(y, Node::set_parent(p));
        if self.node_ref(p, Node::left) == x {
            self.node_mut(p, Node::set_left(y));
        } else {
            self.node_mut(p, Node::set_right(y));
        }
        self.node_mut(x, Node::set_parent(y));
    }

    /// Point the parent of `z` at `pull_up` instead.
    fn splice(&mut self, z: NodeIndex<Ix>, pull_up: NodeIndex<Ix>) {
        let p = self.node_ref(z, Node::parent);
        if self.node_ref(p, Node::left) == z {
            self.node_mut(p, Node::set_left(pull_up));
        } else {
            self.node_mut(p, Node::set_right(pull_up));
        }
        if !pull_up.is_sentinel() {
            self.node_mut(pull_up, Node::set_parent(p));
        }
    }

    fn swap_values(&mut self, a: NodeIndex<Ix>, b: NodeIndex<Ix>) {
        let va = self.nodes[a.index()].value.take();
        let vb = std::mem::replace(&mut self.nodes[b.index()].value, va);
        self.nodes[a.index()].value = vb;
    }

    /// Drop a detached node from the arena and hand back its value.
    ///
    /// The last slot is moved into the hole, so every link and cursor that
    /// pointed at it is re-indexed.
    fn release(&mut self, z: NodeIndex<Ix>) -> V {
        let mut node = self.nodes.swap_remove(z.index());
        let old = NodeIndex::new(self.nodes.len());
        if old != z {
            self.update_idx(old, z);
        }
        node.take_value()
    }

    /// Update links and cursors after the node at `old` moved to `new`.
    fn update_idx(&mut self, old: NodeIndex<Ix>, new: NodeIndex<Ix>) {
        let (parent, left, right) = self.node_ref(new, |n| (n.parent(), n.left(), n.right()));
        if self.node_ref(parent, Node::left) == old {
            self.node_mut(parent, Node::set_left(new));
        } else {
            self.node_mut(parent, Node::set_right(new));
        }
        if !left.is_sentinel() {
            self.node_mut(left, Node::set_parent(new));
        }
        if !right.is_sentinel() {
            self.node_mut(right, Node::set_parent(new));
        }
        self.retarget(old, new);
    }

    /// Move every cursor on `from`, built-in or external, to `to`.
    pub(crate) fn retarget(&mut self, from: NodeIndex<Ix>, to: NodeIndex<Ix>) {
        if self.first_cursor == from {
            self.first_cursor = to;
        }
        self.cursors.retain(|slot| match slot.upgrade() {
            Some(slot) => {
                let mut item = slot.lock();
                if *item == from {
                    *item = to;
                }
                true
            }
            None => false,
        });
    }

    /// Node holding `value`, or the floor of it.
    ///
    /// An equivalent value yields the leftmost equivalent node; otherwise the
    /// greatest node strictly less than `value`; otherwise the sentinel.
    pub(crate) fn node_for_value(&self, value: &V) -> NodeIndex<Ix> {
        let mut x = self.root();
        let mut floor = NodeIndex::sentinel();
        let mut exact = NodeIndex::sentinel();
        while !x.is_sentinel() {
            let xv = self.node_ref(x, Node::value);
            if P::order(xv, value) {
                floor = x;
                x = self.node_ref(x, Node::right);
            } else {
                if !P::order(value, xv) {
                    exact = x;
                }
                x = self.node_ref(x, Node::left);
            }
        }
        if exact.is_sentinel() {
            floor
        } else {
            exact
        }
    }
}

// Navigation and release, independent of the value policy
impl<V, P, Ix> RawTree<V, P, Ix>
where
    Ix: IndexType,
{
    /// The real root, the sentinel when the tree is empty.
    #[inline]
    pub(crate) fn root(&self) -> NodeIndex<Ix> {
        self.node_ref(NodeIndex::pseudo_root(), Node::left)
    }

    /// Take every value out in order and reset the tree to empty.
    pub(crate) fn wipe_out(&mut self) -> Vec<V> {
        let order: Vec<_> = self.in_order().collect();
        let values = order
            .into_iter()
            .map(|x| self.nodes[x.index()].take_value())
            .collect();
        self.nodes.truncate(2);
        self.nodes[NodeIndex::<Ix>::pseudo_root().index()] = Node::placeholder();
        self.count = 0;
        self.park_cursors();
        values
    }

    /// Turn every cursor off.
    fn park_cursors(&mut self) {
        self.first_cursor = NodeIndex::sentinel();
        self.cursors.retain(|slot| match slot.upgrade() {
            Some(slot) => {
                *slot.lock() = NodeIndex::sentinel();
                true
            }
            None => false,
        });
    }

    /// Leftmost node of the subtree rooted at value node `x`.
    pub(crate) fn leftmost(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.node_ref(x, Node::left).is_sentinel() {
            x = self.node_ref(x, Node::left);
        }
        x
    }

    /// Rightmost node of the subtree rooted at value node `x`.
    pub(crate) fn rightmost(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.node_ref(x, Node::right).is_sentinel() {
            x = self.node_ref(x, Node::right);
        }
        x
    }

    /// Smallest node, the sentinel when empty.
    pub(crate) fn first_node(&self) -> NodeIndex<Ix> {
        let root = self.root();
        if root.is_sentinel() {
            root
        } else {
            self.leftmost(root)
        }
    }

    /// Largest node, the sentinel when empty.
    pub(crate) fn last_node(&self) -> NodeIndex<Ix> {
        let root = self.root();
        if root.is_sentinel() {
            root
        } else {
            self.rightmost(root)
        }
    }

    /// In-order successor by parent links, the sentinel past the end.
    /// Positions that are off stay where they are.
    pub(crate) fn successor(&self, x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        if !x.is_value() {
            return x;
        }
        let right = self.node_ref(x, Node::right);
        if !right.is_sentinel() {
            return self.leftmost(right);
        }
        let mut x = x;
        let mut p = self.node_ref(x, Node::parent);
        while p.is_value() && self.node_ref(p, Node::right) == x {
            x = p;
            p = self.node_ref(p, Node::parent);
        }
        if p.is_value() {
            p
        } else {
            NodeIndex::sentinel()
        }
    }

    /// In-order predecessor by parent links, the sentinel before the start.
    pub(crate) fn predecessor(&self, x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        if !x.is_value() {
            return x;
        }
        let left = self.node_ref(x, Node::left);
        if !left.is_sentinel() {
            return self.rightmost(left);
        }
        let mut x = x;
        let mut p = self.node_ref(x, Node::parent);
        while p.is_value() && self.node_ref(p, Node::left) == x {
            x = p;
            p = self.node_ref(p, Node::parent);
        }
        if p.is_value() {
            p
        } else {
            NodeIndex::sentinel()
        }
    }

    /// Value nodes in order.
    pub(crate) fn in_order(&self) -> impl Iterator<Item = NodeIndex<Ix>> + '_ {
        let first = Some(self.first_node()).filter(|x| x.is_value());
        std::iter::successors(first, move |&x| Some(self.successor(x)).filter(|y| y.is_value()))
    }

    /// Values in order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.in_order().map(move |x| self.node_ref(x, Node::value))
    }

    /// First node in order whose value satisfies `pred`.
    pub(crate) fn find<F>(&self, mut pred: F) -> Option<NodeIndex<Ix>>
    where
        F: FnMut(&V) -> bool,
    {
        self.in_order().find(|&x| pred(self.node_ref(x, Node::value)))
    }

    pub(crate) fn node_for_index(&self, index: usize) -> Option<NodeIndex<Ix>> {
        if index >= self.count {
            return None;
        }
        self.in_order().nth(index)
    }

    /// Zero-based position of value node `x`.
    pub(crate) fn index_for_node(&self, x: NodeIndex<Ix>) -> usize {
        let mut index = 0;
        let mut y = self.first_node();
        while y != x && y.is_value() {
            y = self.successor(y);
            index += 1;
        }
        index
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        self.height_inner(self.root())
    }

    fn height_inner(&self, x: NodeIndex<Ix>) -> usize {
        if x.is_sentinel() {
            return 0;
        }
        let left = self.height_inner(self.node_ref(x, Node::left));
        let right = self.height_inner(self.node_ref(x, Node::right));
        left.max(right) + 1
    }

    fn grand_parent(&self, x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        self.parent_ref(x, Node::parent)
    }

    /// Check if a node is a left child of its parent.
    fn is_left_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::left) == node
    }

    /// Check if a node is a right child of its parent.
    fn is_right_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::right) == node
    }
}

impl<V, P, Ix> Drop for RawTree<V, P, Ix>
where
    Ix: IndexType,
{
    /// Values are released in order.
    fn drop(&mut self) {
        // links may be mid-rotation while unwinding
        if std::thread::panicking() {
            return;
        }
        drop(self.wipe_out());
    }
}

// Convenient methods for reference or mutate current/parent/left/right node
impl<'a, V, P, Ix> RawTree<V, P, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn node_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<V, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    /// The sentinel is never handed out for mutation.
    fn node_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<V, Ix>) -> R,
    {
        debug_assert!(!node.is_sentinel(), "sentinel is immutable");
        op(&mut self.nodes[node.index()])
    }

    fn left_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&self.nodes[idx])
    }

    fn right_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&self.nodes[idx])
    }

    fn parent_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent().index();
        op(&self.nodes[idx])
    }

    fn left_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left();
        debug_assert!(!idx.is_sentinel(), "sentinel is immutable");
        op(&mut self.nodes[idx.index()])
    }

    fn right_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right();
        debug_assert!(!idx.is_sentinel(), "sentinel is immutable");
        op(&mut self.nodes[idx.index()])
    }

    fn parent_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent();
        debug_assert!(!idx.is_sentinel(), "sentinel is immutable");
        op(&mut self.nodes[idx.index()])
    }
}
