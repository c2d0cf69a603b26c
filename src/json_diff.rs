use serde_json::{Map, Value};

use crate::patch_format::PatchOp;

/// Compute the structural difference between two parsed JSON documents.
///
/// Objects are compared key by key: removed keys first, then added keys, then
/// a recursive comparison of shared keys, each group in sorted key order.
/// Arrays are compared by index only (no move or LCS detection): the common
/// prefix is diffed element-wise, surplus baseline elements are removed from
/// the end backwards and extra modified elements are appended in order.
/// Anything else that differs, including a change of JSON type, becomes a
/// single `replace` of the whole value.
pub fn compute_diff(left: &Value, right: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_value(left, right, "", &mut ops);
    ops
}

fn diff_value(left: &Value, right: &Value, path: &str, ops: &mut Vec<PatchOp>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => diff_object(l, r, path, ops),
        (Value::Array(l), Value::Array(r)) => diff_array(l, r, path, ops),
        _ if left == right => {}
        _ => ops.push(PatchOp::Replace {
            path: path.to_string(),
            value: right.clone(),
        }),
    }
}

fn diff_object(left: &Map<String, Value>, right: &Map<String, Value>, path: &str, ops: &mut Vec<PatchOp>) {
    let mut left_keys: Vec<&String> = left.keys().collect();
    let mut right_keys: Vec<&String> = right.keys().collect();
    left_keys.sort();
    right_keys.sort();

    for key in left_keys.iter().filter(|k| !right.contains_key(k.as_str())) {
        ops.push(PatchOp::Remove {
            path: extend(path, key),
        });
    }

    for key in right_keys.iter().filter(|k| !left.contains_key(k.as_str())) {
        ops.push(PatchOp::Add {
            path: extend(path, key),
            value: right[key.as_str()].clone(),
        });
    }

    for key in left_keys.iter().filter(|k| right.contains_key(k.as_str())) {
        diff_value(&left[key.as_str()], &right[key.as_str()], &extend(path, key), ops);
    }
}

fn diff_array(left: &[Value], right: &[Value], path: &str, ops: &mut Vec<PatchOp>) {
    let common = left.len().min(right.len());

    for i in 0..common {
        diff_value(&left[i], &right[i], &extend(path, &i.to_string()), ops);
    }

    // Highest index first so earlier removals don't shift later ones.
    for i in (common..left.len()).rev() {
        ops.push(PatchOp::Remove {
            path: extend(path, &i.to_string()),
        });
    }

    for (i, value) in right.iter().enumerate().skip(common) {
        ops.push(PatchOp::Add {
            path: extend(path, &i.to_string()),
            value: value.clone(),
        });
    }
}

/// Append one reference token to a JSON pointer, escaping `~` and `/`.
fn extend(path: &str, token: &str) -> String {
    format!("{}/{}", path, token.replace('~', "~0").replace('/', "~1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_apply::apply_ops;
    use serde_json::json;

    fn assert_replays(left: Value, right: Value) {
        let ops = compute_diff(&left, &right);
        let result = apply_ops(&left, &ops).unwrap();
        assert_eq!(result, right, "ops: {:?}", ops);
    }

    #[test]
    fn test_identical_documents() {
        let doc = json!({"code": "soil", "variants": [1, 2, 3]});
        assert!(compute_diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_single_scalar_replace() {
        let ops = compute_diff(&json!({"a": 1, "b": 2}), &json!({"a": 1, "b": 3}));
        assert_eq!(
            ops,
            vec![PatchOp::Replace {
                path: "/b".into(),
                value: json!(3)
            }]
        );
    }

    #[test]
    fn test_object_key_order_removed_added_then_nested() {
        let left = json!({"keep": {"x": 1}, "gone": true, "also_gone": 0});
        let right = json!({"keep": {"x": 2}, "new": "yes"});
        let ops = compute_diff(&left, &right);
        let paths: Vec<&str> = ops.iter().map(PatchOp::path).collect();
        assert_eq!(paths, vec!["/also_gone", "/gone", "/new", "/keep/x"]);
        assert_replays(left, right);
    }

    #[test]
    fn test_array_shrink_removes_from_end() {
        let ops = compute_diff(&json!([1, 2, 3, 4]), &json!([1, 2]));
        assert_eq!(
            ops,
            vec![
                PatchOp::Remove { path: "/3".into() },
                PatchOp::Remove { path: "/2".into() },
            ]
        );
    }

    #[test]
    fn test_array_grow_and_change_replays() {
        assert_replays(json!({"list": [1, {"a": 1}]}), json!({"list": [0, {"a": 2}, 5, 6]}));
        assert_replays(json!([[1, 2], 3]), json!([[1], 3, [4]]));
    }

    #[test]
    fn test_type_change_is_whole_replace() {
        let ops = compute_diff(&json!({"a": [1]}), &json!({"a": {"0": 1}}));
        assert_eq!(
            ops,
            vec![PatchOp::Replace {
                path: "/a".into(),
                value: json!({"0": 1})
            }]
        );
    }

    #[test]
    fn test_root_replace_uses_empty_pointer() {
        let ops = compute_diff(&json!(1), &json!("one"));
        assert_eq!(ops[0].path(), "");
        assert_replays(json!(1), json!("one"));
    }

    #[test]
    fn test_keys_needing_escapes() {
        let left = json!({"a/b": 1, "c~d": 2});
        let right = json!({"a/b": 2, "c~d": 3});
        let ops = compute_diff(&left, &right);
        let paths: Vec<&str> = ops.iter().map(PatchOp::path).collect();
        assert_eq!(paths, vec!["/a~1b", "/c~0d"]);
        assert_replays(left, right);
    }
}
