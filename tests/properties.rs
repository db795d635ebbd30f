//! Property-based checks of the tree against a sorted `Vec` model.

use proptest::prelude::*;
use rb_cursor_tree::{Error, RedBlackTree};

#[derive(Debug, Clone)]
enum Op {
    Put(u8),
    RemoveValue(u8),
    Remove(usize),
    Go(usize),
    Forth,
    Back,
    RemoveAt,
    WipeOut,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            6 => any::<u8>().prop_map(Op::Put),
            2 => any::<u8>().prop_map(Op::RemoveValue),
            1 => (0..64_usize).prop_map(Op::Remove),
            1 => (0..64_usize).prop_map(Op::Go),
            1 => Just(Op::Forth),
            1 => Just(Op::Back),
            1 => Just(Op::RemoveAt),
            1 => Just(Op::WipeOut),
        ],
        0..300,
    )
}

/// Model of the tree: sorted values plus the built-in cursor position.
#[derive(Debug, Default)]
struct Model {
    values: Vec<u8>,
    cursor: Option<usize>,
}

impl Model {
    fn put(&mut self, v: u8) {
        // new values go before their equals
        let at = self.values.partition_point(|&x| x < v);
        self.values.insert(at, v);
        if let Some(c) = self.cursor.as_mut() {
            if *c >= at {
                *c += 1;
            }
        }
    }

    fn remove(&mut self, at: usize) -> u8 {
        let v = self.values.remove(at);
        self.cursor = match self.cursor {
            Some(c) if c > at => Some(c - 1),
            Some(c) if c == at && at < self.values.len() => Some(at),
            Some(c) if c == at => None,
            other => other,
        };
        v
    }
}

proptest! {
    #[test]
    fn prop_tree_matches_sorted_vec(ops in ops_strategy()) {
        let tree = RedBlackTree::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Put(v) => {
                    tree.put(v);
                    model.put(v);
                }
                Op::RemoveValue(v) => match model.values.iter().position(|&x| x == v) {
                    Some(at) => {
                        prop_assert_eq!(tree.remove_value(&v), Ok(v));
                        let _ = model.remove(at);
                    }
                    None => prop_assert_eq!(tree.remove_value(&v), Err(Error::ValueNotFound)),
                },
                Op::Remove(at) => {
                    if at < model.values.len() {
                        let expected = model.remove(at);
                        prop_assert_eq!(tree.remove(at), Ok(expected));
                    } else {
                        prop_assert_eq!(
                            tree.remove(at),
                            Err(Error::out_of_bounds(at, model.values.len()))
                        );
                    }
                }
                Op::Go(at) => {
                    let result = tree.go(at);
                    if at < model.values.len() {
                        prop_assert_eq!(result, Ok(()));
                        model.cursor = Some(at);
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::Forth => {
                    tree.forth();
                    model.cursor = model.cursor.map(|c| c + 1).filter(|&c| c < model.values.len());
                }
                Op::Back => {
                    tree.back();
                    model.cursor = model.cursor.and_then(|c| c.checked_sub(1));
                }
                Op::RemoveAt => match model.cursor {
                    Some(at) => {
                        let expected = model.remove(at);
                        prop_assert_eq!(tree.remove_at(), Ok(expected));
                    }
                    None => prop_assert_eq!(tree.remove_at(), Err(Error::CursorOff)),
                },
                Op::WipeOut => {
                    tree.wipe_out();
                    model = Model::default();
                }
            }

            prop_assert_eq!(tree.validate(), Ok(()));
            prop_assert_eq!(tree.count(), model.values.len());
            prop_assert_eq!(tree.off(), model.cursor.is_none());
            if let Some(c) = model.cursor {
                prop_assert_eq!(tree.item_at(), Ok(model.values[c]));
            }
        }

        prop_assert_eq!(tree.as_array(), model.values);
    }

    #[test]
    fn prop_height_is_logarithmic(values in prop::collection::vec(any::<u32>(), 1..2000)) {
        let tree = RedBlackTree::from_array(values.iter().copied());
        let bound = 2.0 * ((values.len() + 1) as f64).log2();
        prop_assert!(tree.height() as f64 <= bound);
    }

    #[test]
    fn prop_go_to_value_lands_on_floor(
        values in prop::collection::vec(0..100_u16, 0..200),
        target in 0..110_u16,
    ) {
        let tree = RedBlackTree::from_array(values.iter().copied());
        let mut sorted = values;
        sorted.sort_unstable();

        tree.go_to_value(&target);
        let expected = match sorted.binary_search(&target) {
            Ok(_) => Some(sorted.partition_point(|&x| x < target)),
            Err(0) => None,
            Err(at) => Some(at - 1),
        };
        prop_assert_eq!(tree.index().ok(), expected);
    }

    #[test]
    fn prop_cursor_index_matches_position(
        values in prop::collection::vec(any::<i64>(), 1..300),
        at in any::<prop::sample::Index>(),
    ) {
        let tree = RedBlackTree::from_array(values.iter().copied());
        let at = at.index(values.len());
        let cursor = tree.cursor();
        cursor.go(at).unwrap();
        prop_assert_eq!(cursor.index(), Ok(at));
        prop_assert_eq!(cursor.is_first(), at == 0);
        prop_assert_eq!(cursor.is_last(), at + 1 == values.len());
        prop_assert_eq!(cursor.item_at(), tree.item(at));
    }
}
