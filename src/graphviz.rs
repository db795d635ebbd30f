//! DOT dump of the tree shape, for eyeballing balance and colors.

use std::fmt::{Debug, Write as _};
use std::fs;
use std::io;
use std::path::Path;

use crate::index::{IndexType, NodeIndex};
use crate::node::Node;
use crate::policy::Policy;
use crate::raw::RawTree;
use crate::tree::RedBlackTree;

impl<V, P, Ix> RedBlackTree<V, P, Ix>
where
    V: Debug,
    P: Policy<V>,
    Ix: IndexType,
{
    /// Write the tree to `path` in Graphviz DOT, labelling nodes with their values.
    pub fn draw(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let dot = self
            .raw
            .lock()
            .to_dot(|raw, x| format!("{:?}", raw.node_ref(x, Node::value)));
        fs::write(path, dot)
    }
}

impl<V, P, Ix> RedBlackTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    /// Write the tree to `path` in Graphviz DOT, labelling nodes with their arena slot.
    pub fn draw_without_value(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let dot = self.raw.lock().to_dot(|_, x| format!("#{}", x.index()));
        fs::write(path, dot)
    }
}

impl<V, P, Ix> RawTree<V, P, Ix>
where
    P: Policy<V>,
    Ix: IndexType,
{
    fn to_dot<F>(&self, label: F) -> String
    where
        F: Fn(&Self, NodeIndex<Ix>) -> String,
    {
        let mut dot = String::from("digraph {\n    node [style=filled, fontcolor=white];\n");
        for x in self.in_order() {
            let color = if self.node_ref(x, Node::is_red) {
                "red"
            } else {
                "black"
            };
            let _ignore = writeln!(
                dot,
                "    n{} [label={:?}, fillcolor={color}];",
                x.index(),
                label(self, x)
            );
            for child in [self.node_ref(x, Node::left), self.node_ref(x, Node::right)] {
                if !child.is_sentinel() {
                    let _ignore = writeln!(dot, "    n{} -> n{};", x.index(), child.index());
                }
            }
        }
        dot.push_str("}\n");
        dot
    }
}
