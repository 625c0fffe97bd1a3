use page_path::{decode, encode, find, Path, PathPattern};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_segment() -> impl Strategy<Value = (String, Option<usize>)> {
    (
        "[a-zA-Z0-9_.\\[\\]\\\\ é*]{1,8}",
        proptest::option::of(0usize..10_000),
    )
}

fn arb_path() -> impl Strategy<Value = Path> {
    proptest::collection::vec(arb_segment(), 0..6).prop_map(|segments| {
        let mut path = Path::root();
        for (name, idx) in segments {
            path.push_field(name).unwrap();
            if let Some(idx) = idx {
                path.push_index(idx).unwrap();
            }
        }
        path
    })
}

/// Build the smallest tree in which `path` resolves to `leaf`.
fn tree_for(path: &Path, leaf: Value) -> Value {
    let mut node = leaf;
    for step in path.steps().iter().rev() {
        node = match step {
            page_path::Step::Field(name) => {
                let mut map = serde_json::Map::new();
                map.insert(name.clone(), node);
                Value::Object(map)
            }
            page_path::Step::Index(idx) => {
                let mut arr = vec![Value::Null; *idx];
                arr.push(node);
                Value::Array(arr)
            }
        };
    }
    node
}

proptest! {
    #[test]
    fn decode_inverts_encode(path in arb_path()) {
        let text = encode(&path);
        prop_assert_eq!(decode(&text).unwrap(), path);
    }

    #[test]
    fn distinct_paths_have_distinct_text(a in arb_path(), b in arb_path()) {
        if a != b {
            prop_assert_ne!(encode(&a), encode(&b));
        }
    }

    #[test]
    fn encoded_path_matches_itself_as_pattern(path in arb_path()) {
        let text = encode(&path);
        // A bare `*` field would become a wildcard; it still matches itself.
        let pattern = PathPattern::parse(&text).unwrap();
        prop_assert!(pattern.matches(&path));
    }

    #[test]
    fn path_resolves_in_generated_tree(path in arb_path().prop_filter("short indices", |p| {
        p.steps().iter().all(|s| s.as_index().map_or(true, |i| i < 64))
    })) {
        let tree = tree_for(&path, json!("leaf"));
        let leaf = json!("leaf");
        prop_assert_eq!(find(&tree, &path), Ok(&leaf));
    }
}
