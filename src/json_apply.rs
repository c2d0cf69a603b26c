use anyhow::{anyhow, bail, Result};
use serde_json::Value;

use crate::patch_format::PatchOp;

/// Replay patch operations against a copy of `base` and return the result.
pub fn apply_ops(base: &Value, ops: &[PatchOp]) -> Result<Value> {
    let mut doc = base.clone();
    for op in ops {
        apply_op(&mut doc, op)?;
    }
    Ok(doc)
}

fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<()> {
    let tokens = parse_pointer(op.path())?;

    let Some((last, parents)) = tokens.split_last() else {
        // Empty pointer addresses the whole document.
        match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => *doc = value.clone(),
            PatchOp::Remove { .. } => bail!("cannot remove the document root"),
        }
        return Ok(());
    };

    let mut target = &mut *doc;
    for token in parents {
        target = child_mut(target, token)
            .ok_or_else(|| anyhow!("path {} does not exist", op.path()))?;
    }

    match (target, op) {
        (Value::Object(map), PatchOp::Add { value, .. }) => {
            map.insert(last.clone(), value.clone());
        }
        (Value::Object(map), PatchOp::Replace { value, .. }) => {
            let slot = map
                .get_mut(last.as_str())
                .ok_or_else(|| anyhow!("cannot replace missing key {}", op.path()))?;
            *slot = value.clone();
        }
        (Value::Object(map), PatchOp::Remove { .. }) => {
            map.remove(last.as_str())
                .ok_or_else(|| anyhow!("cannot remove missing key {}", op.path()))?;
        }
        (Value::Array(items), PatchOp::Add { value, .. }) => {
            let index = if last == "-" { items.len() } else { array_index(last)? };
            if index > items.len() {
                bail!("index out of range in {}", op.path());
            }
            items.insert(index, value.clone());
        }
        (Value::Array(items), PatchOp::Replace { value, .. }) => {
            let index = array_index(last)?;
            let slot = items
                .get_mut(index)
                .ok_or_else(|| anyhow!("index out of range in {}", op.path()))?;
            *slot = value.clone();
        }
        (Value::Array(items), PatchOp::Remove { .. }) => {
            let index = array_index(last)?;
            if index >= items.len() {
                bail!("index out of range in {}", op.path());
            }
            items.remove(index);
        }
        _ => bail!("parent of {} is not a container", op.path()),
    }

    Ok(())
}

fn child_mut<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

fn array_index(token: &str) -> Result<usize> {
    token
        .parse()
        .map_err(|_| anyhow!("{:?} is not an array index", token))
}

/// Split a JSON pointer into unescaped reference tokens.
fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        bail!("pointer {:?} must start with '/'", pointer);
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}
