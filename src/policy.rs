//! Per-instantiation value behaviour.
//!
//! A tree is parameterized by its value type and by a [`Policy`] that decides
//! how those values are ordered, compared, cloned and disposed of. The policy
//! is a type, not a value, so every choice is fixed at compile time.

/// Capabilities a tree needs from its values.
///
/// # Example
/// ```rust
/// use rb_cursor_tree::{Policy, RedBlackTree};
///
/// /// Orders strings by length, shortest first.
/// struct ByLen;
///
/// impl Policy<String> for ByLen {
///     fn order(a: &String, b: &String) -> bool {
///         a.len() < b.len()
///     }
///     fn is_deep_equal(a: &String, b: &String) -> bool {
///         a == b
///     }
///     fn deep_clone(v: &String) -> String {
///         v.clone()
///     }
///     fn default_value() -> String {
///         String::new()
///     }
/// }
///
/// let tree: RedBlackTree<String, ByLen> = RedBlackTree::default();
/// tree.put("ccc".to_string());
/// tree.put("a".to_string());
/// tree.put("bb".to_string());
/// assert_eq!(tree.as_array(), ["a", "bb", "ccc"]);
/// ```
pub trait Policy<V> {
    /// `true` when `a` strictly precedes `b`. Must be a strict weak order;
    /// values for which neither precedes the other are equivalent and may
    /// coexist in the tree.
    fn order(a: &V, b: &V) -> bool;

    /// Value equality used by `has`, `occurrences`, `remove_value` and
    /// `is_deep_equal`.
    fn is_deep_equal(a: &V, b: &V) -> bool;

    /// Clone used by `deep_clone`.
    fn deep_clone(v: &V) -> V;

    /// Release used by the `_and_dispose` operations.
    #[inline]
    fn deep_dispose(v: V) {
        drop(v);
    }

    /// Value reported by a cursor that is off.
    fn default_value() -> V;

    /// Neither value precedes the other.
    #[inline]
    fn is_equivalent(a: &V, b: &V) -> bool {
        !Self::order(a, b) && !Self::order(b, a)
    }
}

/// The policy derived from the value's own `Ord`, `Clone` and `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<V> Policy<V> for Natural
where
    V: Ord + Clone + Default,
{
    #[inline]
    fn order(a: &V, b: &V) -> bool {
        a < b
    }

    #[inline]
    fn is_deep_equal(a: &V, b: &V) -> bool {
        a == b
    }

    #[inline]
    fn deep_clone(v: &V) -> V {
        v.clone()
    }

    #[inline]
    fn default_value() -> V {
        V::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn natural_policy_follows_ord() {
        assert!(<Natural as Policy<i32>>::order(&1, &2));
        assert!(!<Natural as Policy<i32>>::order(&2, &2));
        assert!(<Natural as Policy<i32>>::is_equivalent(&2, &2));
        assert_eq!(<Natural as Policy<String>>::default_value(), "");
    }
}
