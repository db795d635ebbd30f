use crate::index::{IndexType, NodeIndex};

/// Node of the red-black tree
#[derive(Debug, Clone)]
pub struct Node<V, Ix> {
    /// Left child, the sentinel when absent
    pub left: NodeIndex<Ix>,
    /// Right child, the sentinel when absent
    pub right: NodeIndex<Ix>,
    /// Parent, the pseudo-root for the real root
    pub parent: NodeIndex<Ix>,
    /// Color of the node
    pub color: Color,

    /// Value of the node, `None` only for the sentinel and the pseudo-root
    pub value: Option<V>,
}

impl<V, Ix> Node<V, Ix>
where
    Ix: IndexType,
{
    /// The sentinel and the pseudo-root are both black, valueless and
    /// linked to the sentinel.
    pub fn placeholder() -> Self {
        Node {
            left: NodeIndex::sentinel(),
            right: NodeIndex::sentinel(),
            parent: NodeIndex::sentinel(),
            color: Color::Black,
            value: None,
        }
    }

    /// A fresh red leaf.
    pub fn leaf(value: V, parent: NodeIndex<Ix>) -> Self {
        Node {
            left: NodeIndex::sentinel(),
            right: NodeIndex::sentinel(),
            parent,
            color: Color::Red,
            value: Some(value),
        }
    }
}

// Convenient getter/setter methods
impl<V, Ix> Node<V, Ix>
where
    Ix: IndexType,
{
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn left(&self) -> NodeIndex<Ix> {
        self.left
    }

    pub fn right(&self) -> NodeIndex<Ix> {
        self.right
    }

    pub fn parent(&self) -> NodeIndex<Ix> {
        self.parent
    }

    pub fn is_black(&self) -> bool {
        matches!(self.color, Color::Black)
    }

    pub fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }

    /// # Panics
    ///
    /// Panics on the sentinel or the pseudo-root, which never carry a value.
    pub fn value(&self) -> &V {
        self.value.as_ref().expect("value slot")
    }

    pub fn take_value(&mut self) -> V {
        self.value.take().expect("value slot")
    }

    pub fn set_color(color: Color) -> impl FnOnce(&mut Node<V, Ix>) {
        move |node: &mut Node<V, Ix>| {
            node.color = color;
        }
    }

    pub fn set_left(left: NodeIndex<Ix>) -> impl FnOnce(&mut Node<V, Ix>) {
        move |node: &mut Node<V, Ix>| {
            node.left = left;
        }
    }

    pub fn set_right(right: NodeIndex<Ix>) -> impl FnOnce(&mut Node<V, Ix>) {
        move |node: &mut Node<V, Ix>| {
            node.right = right;
        }
    }

    pub fn set_parent(parent: NodeIndex<Ix>) -> impl FnOnce(&mut Node<V, Ix>) {
        move |node: &mut Node<V, Ix>| {
            node.parent = parent;
        }
    }
}

/// The color of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red node
    Red,
    /// Black node
    Black,
}
