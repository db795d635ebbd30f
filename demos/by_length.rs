use rb_cursor_tree::{Policy, RedBlackTree};

/// Orders words by length, shortest first.
struct ByLength;

impl Policy<String> for ByLength {
    fn order(a: &String, b: &String) -> bool {
        a.len() < b.len()
    }
    fn is_deep_equal(a: &String, b: &String) -> bool {
        a == b
    }
    fn deep_clone(v: &String) -> String {
        v.clone()
    }
    fn default_value() -> String {
        String::new()
    }
}

fn main() {
    let words: RedBlackTree<String, ByLength> = ["pear", "fig", "banana", "kiwi", "apple"]
        .into_iter()
        .map(String::from)
        .collect();

    // two readers, each with its own position
    let shortest = words.cursor();
    let longest = words.cursor();
    shortest.start().unwrap();
    longest.finish().unwrap();
    assert_eq!(shortest.item_at().unwrap(), "fig");
    assert_eq!(longest.item_at().unwrap(), "banana");

    // same length as "pear", so it lands on the first four-letter word
    words.go_to_value(&"plum".to_string());
    assert_eq!(words.item_at().unwrap().len(), 4);

    words.remove_value(&"fig".to_string()).unwrap();
    assert_eq!(shortest.item_at().unwrap().len(), 4);
    assert_eq!(words.count(), 4);
    assert_eq!(words.validate(), Ok(()));
}
