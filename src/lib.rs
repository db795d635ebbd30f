//! `rb_cursor_tree` is a thread-safe red-black tree with multi-cursor iteration.
//!
//! It fully implements the insertion and deletion functionality of a red-black tree,
//! ensuring that each modification operation requires at most O(logN) time complexity.
//!
//! Nodes live in an array and parent/child links are array indices. Slot 0 is a
//! per-tree sentinel standing in for "no node", and slot 1 is a pseudo-root whose
//! left child is the real root, so rotations never special-case the root.
//! Cursors walk the tree through parent links and are retargeted by the tree when
//! the node under them is removed.
//!
//! Each tree is guarded by its own mutex and every method takes `&self`, so a tree can
//! be shared between threads behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use rb_cursor_tree::RedBlackTree;
//!
//! let tree = RedBlackTree::new();
//! tree.put(2);
//! tree.put(1);
//! tree.put(3);
//! assert_eq!(tree.as_array(), [1, 2, 3]);
//!
//! tree.start();
//! assert_eq!(tree.item_at(), Ok(1));
//! tree.forth();
//! assert_eq!(tree.item_at(), Ok(2));
//! ```
//!

mod check;
mod cursor;
mod error;
#[cfg(feature = "graphviz")]
mod graphviz;
mod index;
mod iter;
mod node;
mod policy;
mod protocol;
mod raw;
mod tree;

#[cfg(test)]
mod tests;

pub use check::Violation;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use index::{DefaultIx, IndexType};
pub use iter::{Iter, ReadGuard};
pub use policy::{Natural, Policy};
pub use protocol::Collection;
pub use tree::RedBlackTree;
