//! Structural oracle for a tree.
//!
//! `validate` walks the whole arena in O(n) and reports the first broken
//! property. Correct code never produces a [`Violation`]; the test suite
//! calls it after mutations to catch engine defects.

use thiserror::Error;

use crate::index::{IndexType, NodeIndex};
use crate::node::Node;
use crate::policy::Policy;
use crate::raw::RawTree;

/// A red-black, ordering, bookkeeping or cursor property that does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Violation {
    /// The sentinel is not black, carries a value, or links away from itself
    #[error("sentinel has been modified")]
    Sentinel,

    /// The pseudo-root is red, carries a value, or has a right child
    #[error("pseudo-root has been modified")]
    PseudoRoot,

    /// 2. The root is black.
    #[error("root {node} is red")]
    RedRoot {
        /// Arena slot of the root
        node: usize,
    },

    /// 4. If a node is red, then both its children are black.
    #[error("red node {node} has a red child")]
    RedChild {
        /// Arena slot of the red parent
        node: usize,
    },

    /// 5. All simple paths from a node to descendant leaves contain the same
    /// number of black nodes.
    #[error("node {node} has black heights {left} on the left and {right} on the right")]
    BlackHeight {
        /// Arena slot of the unbalanced node
        node: usize,
        /// Black height of the left subtree
        left: usize,
        /// Black height of the right subtree
        right: usize,
    },

    /// A child does not point back at its parent, or a link leaves the arena
    #[error("broken link at node {node}")]
    Link {
        /// Arena slot with the bad link
        node: usize,
    },

    /// In-order traversal decreases
    #[error("value at position {position} precedes its predecessor")]
    Order {
        /// Zero-based position of the out-of-order value
        position: usize,
    },

    /// The stored count disagrees with the reachable nodes
    #[error("count is {count} but {reachable} nodes are reachable")]
    Count {
        /// Stored count
        count: usize,
        /// Value nodes reachable from the root
        reachable: usize,
    },

    /// A cursor points at a node that is not in the tree
    #[error("cursor points at unreachable node {node}")]
    Cursor {
        /// Arena slot the cursor points at
        node: usize,
    },
}

impl<V, P, Ix> RawTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    /// Check every structural invariant of the tree.
    pub(crate) fn validate(&self) -> Result<(), Violation> {
        self.check_placeholders()?;

        let root = self.root();
        if self.node_ref(root, Node::is_red) {
            return Err(Violation::RedRoot { node: root.index() });
        }

        let mut reached = vec![false; self.nodes.len()];
        let _black_height = self.check_subtree(root, NodeIndex::pseudo_root(), &mut reached)?;

        let reachable = reached.iter().filter(|r| **r).count();
        if reachable != self.count || reachable + 2 != self.nodes.len() {
            return Err(Violation::Count {
                count: self.count,
                reachable,
            });
        }

        self.check_order()?;
        self.check_cursors(&reached)
    }

    fn check_placeholders(&self) -> Result<(), Violation> {
        let sentinel = NodeIndex::<Ix>::sentinel();
        let s = self.node_ref(sentinel, |n| n);
        if !s.is_black()
            || s.value.is_some()
            || s.left != sentinel
            || s.right != sentinel
            || s.parent != sentinel
        {
            return Err(Violation::Sentinel);
        }
        let pr = self.node_ref(NodeIndex::pseudo_root(), |n| n);
        if !pr.is_black() || pr.value.is_some() || !pr.right.is_sentinel() {
            return Err(Violation::PseudoRoot);
        }
        Ok(())
    }

    /// Returns the black height of the subtree at `x`.
    fn check_subtree(
        &self,
        x: NodeIndex<Ix>,
        parent: NodeIndex<Ix>,
        reached: &mut [bool],
    ) -> Result<usize, Violation> {
        if x.is_sentinel() {
            return Ok(0);
        }
        let link = Violation::Link { node: x.index() };
        if !x.is_value() || x.index() >= self.nodes.len() || reached[x.index()] {
            return Err(link);
        }
        reached[x.index()] = true;

        let node = self.node_ref(x, |n| n);
        if node.parent != parent
            || node.value.is_none()
            || node.left.index() >= self.nodes.len()
            || node.right.index() >= self.nodes.len()
        {
            return Err(link);
        }
        if node.is_red()
            && (self.node_ref(node.left, Node::is_red) || self.node_ref(node.right, Node::is_red))
        {
            return Err(Violation::RedChild { node: x.index() });
        }

        let left = self.check_subtree(node.left, x, reached)?;
        let right = self.check_subtree(node.right, x, reached)?;
        if left != right {
            return Err(Violation::BlackHeight {
                node: x.index(),
                left,
                right,
            });
        }
        Ok(if node.is_black() { left + 1 } else { left })
    }

    fn check_order(&self) -> Result<(), Violation> {
        let mut prev: Option<&V> = None;
        for (position, value) in self.values().enumerate() {
            if prev.is_some_and(|p| P::order(value, p)) {
                return Err(Violation::Order { position });
            }
            prev = Some(value);
        }
        Ok(())
    }

    fn check_cursors(&self, reached: &[bool]) -> Result<(), Violation> {
        let valid = |x: NodeIndex<Ix>| !x.is_value() || reached.get(x.index()) == Some(&true);
        if !valid(self.first_cursor) {
            return Err(Violation::Cursor {
                node: self.first_cursor.index(),
            });
        }
        for slot in self.cursors.iter().filter_map(|w| w.upgrade()) {
            let item = *slot.lock();
            if !valid(item) {
                return Err(Violation::Cursor { node: item.index() });
            }
        }
        Ok(())
    }
}
