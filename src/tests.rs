use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::*;

fn init_logger() {
    let _ignore = simplelog::TestLogger::init(log::LevelFilter::Trace, simplelog::Config::default());
}

struct ValueGenerator {
    rng: StdRng,
    unique: HashSet<i32>,
    limit: i32,
}

impl ValueGenerator {
    fn new(seed: [u8; 32]) -> Self {
        const LIMIT: i32 = 100_000;
        Self {
            rng: SeedableRng::from_seed(seed),
            unique: HashSet::new(),
            limit: LIMIT,
        }
    }

    fn next(&mut self) -> i32 {
        self.rng.gen_range(0..self.limit)
    }

    fn next_unique(&mut self) -> i32 {
        let mut value = self.next();
        while self.unique.contains(&value) {
            value = self.next();
        }
        self.unique.insert(value);
        value
    }

    fn next_with_range(&mut self, range: i32) -> i32 {
        self.rng.gen_range(0..range)
    }
}

fn with_tree_and_generator(test_fn: impl Fn(RedBlackTree<i32>, ValueGenerator)) {
    init_logger();
    let seeds = vec![[0; 32], [1; 32], [2; 32]];
    for seed in seeds {
        let gen = ValueGenerator::new(seed);
        let tree = RedBlackTree::new();
        test_fn(tree, gen);
    }
}

#[test]
fn red_black_tree_properties_is_satisfied() {
    with_tree_and_generator(|tree, mut gen| {
        let values: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for v in values {
            tree.put(v);
        }
        assert_eq!(tree.validate(), Ok(()));
    });
}

#[test]
fn red_black_tree_properties_hold_after_every_remove() {
    with_tree_and_generator(|tree, mut gen| {
        let mut values: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(50))
            .take(300)
            .collect();
        for v in values.clone() {
            tree.put(v);
            assert_eq!(tree.validate(), Ok(()));
        }
        values.shuffle(&mut gen.rng);
        for v in values {
            assert_eq!(tree.remove_value(&v), Ok(v));
            assert_eq!(tree.validate(), Ok(()));
        }
        assert!(tree.is_empty());
    });
}

#[test]
fn tree_count_will_update() {
    with_tree_and_generator(|tree, mut gen| {
        let values: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for v in values.clone() {
            tree.put(v);
        }
        assert_eq!(tree.count(), 100);
        for v in values {
            let _ignore = tree.remove_value(&v);
        }
        assert_eq!(tree.count(), 0);
        assert!(tree.is_empty());
    });
}

#[test]
fn remove_non_exist_value_will_report_it() {
    with_tree_and_generator(|tree, mut gen| {
        let values: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for v in values {
            tree.put(v);
        }
        let to_remove: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for v in to_remove {
            assert_eq!(tree.remove_value(&v), Err(Error::ValueNotFound));
        }
        assert_eq!(tree.count(), 1000);
    });
}

#[test]
fn iterate_through_tree_is_sorted() {
    with_tree_and_generator(|tree, mut gen| {
        let mut values: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(500))
            .take(1000)
            .collect();
        for v in values.clone() {
            tree.put(v);
        }
        values.sort_unstable();
        assert_eq!(tree.as_array(), values);

        let guard = tree.read();
        assert!(guard.iter().eq(values.iter()));
        assert!(guard.iter().rev().eq(values.iter().rev()));
        assert_eq!(guard.iter().len(), values.len());
    });
}

#[test]
fn cursor_walks_visit_every_value_once() {
    with_tree_and_generator(|tree, mut gen| {
        let mut values: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(200))
            .take(500)
            .collect();
        for v in values.clone() {
            tree.put(v);
        }
        values.sort_unstable();

        let cursor = tree.cursor();
        let mut forward = Vec::new();
        cursor.start().unwrap();
        while !cursor.off() {
            forward.push(cursor.item_at().unwrap());
            cursor.forth().unwrap();
        }
        assert_eq!(forward, values);

        let mut backward = Vec::new();
        tree.finish();
        while !tree.off() {
            backward.push(tree.item_at().unwrap());
            tree.back();
        }
        values.reverse();
        assert_eq!(backward, values);
    });
}

#[test]
fn duplicates_are_counted_and_removed_one_at_a_time() {
    with_tree_and_generator(|tree, mut gen| {
        for _ in 0..200 {
            tree.put(gen.next_with_range(10));
        }
        for v in 0..10 {
            let before = tree.occurrences(&v);
            if before == 0 {
                continue;
            }
            tree.put(v);
            assert_eq!(tree.occurrences(&v), before + 1);
            tree.remove_value(&v).unwrap();
            assert_eq!(tree.occurrences(&v), before);
        }
        assert_eq!(tree.validate(), Ok(()));
    });
}

#[test]
fn removing_under_cursors_advances_them() {
    with_tree_and_generator(|tree, mut gen| {
        let values: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for v in values.clone() {
            tree.put(v);
        }
        let cursors: Vec<_> = (0..8).map(|_| tree.cursor()).collect();
        for (i, cursor) in cursors.iter().enumerate() {
            cursor.go(i * 30).unwrap();
        }

        for v in values {
            let expected: Vec<_> = cursors
                .iter()
                .map(|c| {
                    let here = c.item_at().ok();
                    if here == Some(v) {
                        c.index().ok().and_then(|i| tree.item(i + 1).ok())
                    } else {
                        here
                    }
                })
                .collect();
            tree.remove_value(&v).unwrap();
            let actual: Vec<_> = cursors.iter().map(|c| c.item_at().ok()).collect();
            assert_eq!(actual, expected);
            assert_eq!(tree.validate(), Ok(()));
        }
        assert!(cursors.iter().all(|c| c.off()));
    });
}

#[test]
fn tree_wipe_out_is_ok() {
    let tree = RedBlackTree::from_array([1, 3, 2, 6]);
    let cursor = tree.cursor();
    cursor.finish().unwrap();
    tree.start();
    assert_eq!(tree.count(), 4);
    tree.wipe_out();
    assert_eq!(tree.count(), 0);
    assert!(tree.is_empty());
    assert!(tree.off());
    assert!(cursor.off());
    assert_eq!(tree.raw.lock().nodes.len(), 2);
    assert_eq!(tree.validate(), Ok(()));
    tree.put(5);
    assert_eq!(tree.as_array(), [5]);
}

// Scenario checks with integers ordered by `<`

#[test]
fn put_three_values_balances() {
    let tree = RedBlackTree::new();
    tree.put(2);
    tree.put(1);
    tree.put(3);
    assert_eq!(tree.as_array(), [1, 2, 3]);
    assert_eq!(tree.height(), 2);
}

#[test]
fn put_four_values_is_in_order() {
    let tree = RedBlackTree::from_array([4, 2, 6, 1]);
    assert_eq!(tree.as_array(), [1, 2, 4, 6]);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn ascending_insert_does_not_degenerate() {
    let tree = RedBlackTree::from_array([1, 2, 3]);
    assert!(tree.height() <= 2);

    let tree = RedBlackTree::from_array(0..1024);
    // 2 * log2(n + 1)
    assert!(tree.height() <= 20);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn remove_root_of_three() {
    let tree = RedBlackTree::from_array([2, 1, 3]);
    assert_eq!(tree.remove_value(&2), Ok(2));
    assert!(!tree.has(&2));
    assert_eq!(tree.count(), 2);
    assert!(tree.has(&1));
    assert!(tree.has(&3));
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn remove_two_child_root_takes_predecessor() {
    let tree = RedBlackTree::from_array([4, 2, 6, 1, 3, 5, 7]);
    {
        let raw = tree.raw.lock();
        assert_eq!(raw.value(raw.root()), Some(&4));
    }
    assert_eq!(tree.remove_value(&4), Ok(4));
    {
        let raw = tree.raw.lock();
        assert_eq!(raw.value(raw.root()), Some(&3));
    }
    assert_eq!(tree.as_array(), [1, 2, 3, 5, 6, 7]);
    assert_eq!(tree.count(), 6);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn trees_with_same_values_are_deep_equal_only() {
    let a = RedBlackTree::from_array([1, 2, 3, 4, 5]);
    let b = RedBlackTree::from_array([5, 4, 3, 2, 1]);
    assert!(a.is_deep_equal(&b));
    assert!(!a.is_equal(&b));
    assert!(a.is_equal(&a));

    let c = a.clone();
    assert!(a.is_equal(&c));
    c.put(6);
    assert!(!a.is_equal(&c));
    assert!(!a.is_deep_equal(&c));
}

#[test]
fn remove_sole_value_empties_tree() {
    let tree = RedBlackTree::new();
    tree.put(7);
    tree.start();
    assert_eq!(tree.remove_at(), Ok(7));
    assert!(tree.is_empty());
    assert!(tree.off());
    assert!(tree.raw.lock().root().is_sentinel());
    assert_eq!(tree.first(), Err(Error::Empty));
    assert_eq!(tree.last(), Err(Error::Empty));
}

#[test]
fn indexed_access_and_errors() {
    let tree = RedBlackTree::from_array([50, 10, 40, 20, 30]);
    assert_eq!(tree.item(0), Ok(10));
    assert_eq!(tree.item(4), Ok(50));
    assert_eq!(tree.item(5), Err(Error::out_of_bounds(5, 5)));
    assert_eq!(tree.first(), Ok(10));
    assert_eq!(tree.last(), Ok(50));

    tree.go(2).unwrap();
    assert_eq!(tree.item_at(), Ok(30));
    assert_eq!(tree.index(), Ok(2));
    assert_eq!(tree.go(9), Err(Error::out_of_bounds(9, 5)));
    // a failed go leaves the cursor where it was
    assert_eq!(tree.index(), Ok(2));

    assert_eq!(tree.remove(1), Ok(20));
    assert_eq!(tree.remove(4), Err(Error::out_of_bounds(4, 4)));
    assert_eq!(tree.as_array(), [10, 30, 40, 50]);
    assert_eq!(tree.index(), Ok(1));
}

#[test]
fn built_in_cursor_edges() {
    let tree = RedBlackTree::from_array([1, 2, 3]);
    assert!(tree.off());
    assert_eq!(tree.item_at(), Err(Error::CursorOff));
    assert_eq!(tree.item_at_or_default(), 0);
    assert_eq!(tree.index(), Err(Error::CursorOff));
    assert_eq!(tree.remove_at(), Err(Error::CursorOff));
    tree.forth();
    assert!(tree.off());

    tree.start();
    assert!(tree.is_first());
    assert!(!tree.is_last());
    tree.back();
    assert!(tree.off());
    // off stays off
    tree.forth();
    assert!(tree.off());

    tree.finish();
    assert!(tree.is_last());
    tree.forth();
    assert!(tree.off());
    assert!(!tree.is_first());
    assert!(!tree.is_last());
}

#[test]
fn go_to_value_uses_floor() {
    let tree = RedBlackTree::from_array([10, 20, 20, 30, 40]);
    tree.go_to_value(&20);
    assert_eq!(tree.index(), Ok(1));
    tree.go_to_value(&35);
    assert_eq!(tree.item_at(), Ok(30));
    tree.go_to_value(&100);
    assert_eq!(tree.item_at(), Ok(40));
    tree.go_to_value(&10);
    assert!(tree.is_first());
    tree.go_to_value(&9);
    assert!(tree.off());

    let cursor = tree.cursor();
    cursor.go_to_value(&25).unwrap();
    assert_eq!(cursor.index(), Ok(2));
}

#[test]
fn remove_at_moves_to_successor() {
    let tree = RedBlackTree::from_array(1..=10);
    let cursor = tree.cursor();
    cursor.go(3).unwrap();
    assert_eq!(cursor.remove_at(), Ok(4));
    assert_eq!(cursor.item_at(), Ok(5));
    cursor.finish().unwrap();
    assert_eq!(cursor.remove_at(), Ok(10));
    assert!(cursor.off());
    assert_eq!(cursor.remove_at(), Err(Error::CursorOff));

    // removing every other value through the built-in cursor
    tree.start();
    while !tree.off() {
        tree.remove_at().unwrap();
        tree.forth();
    }
    assert_eq!(tree.as_array(), [2, 5, 7, 9]);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn cursor_on_predecessor_follows_its_value() {
    // removing 4 moves 3 into 4's node
    let tree = RedBlackTree::from_array([4, 2, 6, 1, 3, 5, 7]);
    let on_three = tree.cursor();
    let on_four = tree.cursor();
    on_three.go_to_value(&3).unwrap();
    on_four.go_to_value(&4).unwrap();
    tree.remove_value(&4).unwrap();
    assert_eq!(on_three.item_at(), Ok(3));
    assert_eq!(on_four.item_at(), Ok(5));
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn arena_compaction_keeps_cursors() {
    let tree = RedBlackTree::from_array(0..64);
    let cursors: Vec<_> = (0..64)
        .map(|i| {
            let c = tree.cursor();
            c.go(i).unwrap();
            c
        })
        .collect();
    for v in (0..64).step_by(3) {
        tree.remove_value(&v).unwrap();
    }
    for (v, c) in cursors.iter().enumerate() {
        let v = v as i32;
        let expected = if v % 3 == 0 {
            (v + 1 < 64).then_some(v + 1)
        } else {
            Some(v)
        };
        assert_eq!(c.item_at().ok(), expected);
    }
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn cursors_detach_when_tree_is_dropped() {
    let tree = RedBlackTree::from_array([1, 2]);
    let cursor = tree.cursor();
    cursor.start().unwrap();
    tree.dispose();
    assert!(cursor.off());
    assert_eq!(cursor.start(), Err(Error::TreeDisposed));
    assert_eq!(cursor.item_at(), Err(Error::TreeDisposed));
    assert_eq!(cursor.remove_at(), Err(Error::TreeDisposed));
    assert_eq!(cursor.item_at_or_default(), 0);
}

#[test]
fn disposed_cursors_leave_the_list() {
    let tree = RedBlackTree::from_array([1, 2, 3]);
    let a = tree.cursor();
    let b = tree.cursor();
    assert_eq!(tree.raw.lock().cursors.len(), 2);
    a.dispose();
    assert_eq!(tree.raw.lock().cursors.len(), 1);
    drop(b);
    assert!(tree.raw.lock().cursors.is_empty());
}

#[test]
fn has_and_occurrences_by_predicate() {
    let tree = RedBlackTree::from_array([1, 2, 3, 4, 5, 6]);
    let same_parity = |a: &i32, b: &i32| a % 2 == b % 2;
    assert!(tree.has_by(&8, same_parity));
    assert_eq!(tree.occurrences_by(&8, same_parity), 3);
    assert!(!tree.has_by(&8, |a, b| a == b));
}

#[derive(Debug, Clone, PartialEq)]
struct Tracked(i32);

static DISPOSED: AtomicUsize = AtomicUsize::new(0);

/// Orders by value, counts disposals.
struct Counting;

impl Policy<Tracked> for Counting {
    fn order(a: &Tracked, b: &Tracked) -> bool {
        a.0 < b.0
    }
    fn is_deep_equal(a: &Tracked, b: &Tracked) -> bool {
        a == b
    }
    fn deep_clone(v: &Tracked) -> Tracked {
        Tracked(v.0)
    }
    fn deep_dispose(_v: Tracked) {
        let _ignore = DISPOSED.fetch_add(1, Ordering::SeqCst);
    }
    fn default_value() -> Tracked {
        Tracked(-1)
    }
}

#[test]
fn dispose_variants_use_the_policy() {
    let tree: RedBlackTree<Tracked, Counting> = (0..10).map(Tracked).collect();
    let before = DISPOSED.load(Ordering::SeqCst);

    tree.remove_and_dispose(0).unwrap();
    tree.remove_value_and_dispose(&Tracked(5)).unwrap();
    tree.start();
    tree.remove_at_and_dispose().unwrap();
    let cursor = tree.cursor();
    cursor.finish().unwrap();
    cursor.remove_at_and_dispose().unwrap();
    assert_eq!(DISPOSED.load(Ordering::SeqCst) - before, 4);
    assert_eq!(cursor.item_at_or_default(), Tracked(-1));

    let copy = tree.deep_clone();
    assert!(copy.is_deep_equal(&tree));
    copy.wipe_out_and_dispose();
    assert_eq!(DISPOSED.load(Ordering::SeqCst) - before, 10);
    tree.deep_dispose();
    assert_eq!(DISPOSED.load(Ordering::SeqCst) - before, 16);
}

#[test]
fn custom_order_is_respected() {
    struct Descending;
    impl Policy<i32> for Descending {
        fn order(a: &i32, b: &i32) -> bool {
            a > b
        }
        fn is_deep_equal(a: &i32, b: &i32) -> bool {
            a == b
        }
        fn deep_clone(v: &i32) -> i32 {
            *v
        }
        fn default_value() -> i32 {
            0
        }
    }
    let tree: RedBlackTree<i32, Descending, u16> = [3, 9, 1, 7].into_iter().collect();
    assert_eq!(tree.as_array(), [9, 7, 3, 1]);
    tree.go_to_value(&5);
    assert_eq!(tree.item_at(), Ok(7));
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn collection_trait_object_is_usable() {
    let boxed: Box<dyn Collection<i32>> = Box::new(RedBlackTree::from_array([5, 1]));
    boxed.put(3);
    assert_eq!(boxed.count(), 3);
    assert_eq!(boxed.occurrences(&3), 1);
    assert_eq!(boxed.remove_value(&1), Ok(1));
    assert_eq!(boxed.to_vec(), [3, 5]);
    boxed.wipe_out();
    assert!(boxed.is_empty());
}

#[test]
fn debug_shows_values_in_order() {
    let tree = RedBlackTree::from_array([2, 1]);
    let printed = format!("{tree:?}");
    assert!(printed.contains("values: [1, 2]"), "{printed}");
}

#[test]
fn iter_debug_shows_remaining() {
    let tree = RedBlackTree::from_array([3, 1, 2]);
    let guard = tree.read();
    let mut iter = guard.iter();
    assert_eq!(iter.next(), Some(&1));
    let printed = format!("{iter:?}");
    assert!(printed.starts_with("Iter {"), "{printed}");
    assert!(printed.contains("remaining: 2"), "{printed}");
}

/// Records its key when dropped.
#[derive(Debug)]
struct Logged {
    key: i32,
    log: Arc<parking_lot::Mutex<Vec<i32>>>,
}

impl Drop for Logged {
    fn drop(&mut self) {
        self.log.lock().push(self.key);
    }
}

struct ByKey;

impl Policy<Logged> for ByKey {
    fn order(a: &Logged, b: &Logged) -> bool {
        a.key < b.key
    }
    fn is_deep_equal(a: &Logged, b: &Logged) -> bool {
        a.key == b.key
    }
    fn deep_clone(v: &Logged) -> Logged {
        Logged {
            key: v.key,
            log: Arc::clone(&v.log),
        }
    }
    fn default_value() -> Logged {
        Logged {
            key: -1,
            log: Arc::default(),
        }
    }
}

#[test]
fn dropped_tree_releases_values_in_order() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let tree: RedBlackTree<Logged, ByKey> = [5, 3, 8, 1, 4, 9, 2]
        .into_iter()
        .map(|key| Logged {
            key,
            log: Arc::clone(&log),
        })
        .collect();
    assert!(log.lock().is_empty());

    let cursor = tree.cursor();
    cursor.finish().unwrap();
    drop(tree);
    assert_eq!(*log.lock(), [1, 2, 3, 4, 5, 8, 9]);
    assert!(cursor.off());
}

#[cfg(feature = "graphviz")]
#[test]
fn tree_draw_is_ok() {
    let tree = RedBlackTree::from_array([16, 8, 0, 5, 6, 15, 17, 25, 26, 19]);
    let path = std::env::temp_dir().join("rb_cursor_tree_test.dot");
    tree.draw(&path).unwrap();
    let dot = std::fs::read_to_string(&path).unwrap();
    assert!(dot.starts_with("digraph {"));
    assert_eq!(dot.matches("fillcolor").count(), 10);
    tree.draw_without_value(&path).unwrap();
    let _ = std::fs::remove_file(path);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_red_black_tree() {
    use serde_json::{json, Value};

    let tree = RedBlackTree::<i32>::from_array([5, 10, 1, 5]);

    let serialized = serde_json::to_string(&tree).unwrap();
    let actual: Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(actual, json!([1, 5, 5, 10]));

    let deserialized: RedBlackTree<i32> = serde_json::from_str(&serialized).unwrap();
    assert!(deserialized.is_deep_equal(&tree));
    assert_eq!(deserialized.validate(), Ok(()));
}
