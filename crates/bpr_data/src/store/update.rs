//! Update-operator application for a single document.
//!
//! # Invariants
//! - Update documents contain operators only; whole-document replacement is
//!   not an update.
//! - `$addToSet` never introduces an element equal to an existing one.
//! - `$pull` removes every matching element, not just the first.
//! - A positional `field.$` path resolves against the filter that selected
//!   the document; no matching element is an error.

use super::query::{element_matches, first_matching_index, values_equal};
use super::{expect_mapping, split_path, StoreError, StoreResult};
use crate::record::Mapping;
use serde_json::Value;

const POSITIONAL: &str = "$";
/// Largest number of null slots an indexed path may append past an array's end.
const MAX_INDEX_GAP: usize = 1024;

/// Applies `update` to `document`; returns whether the document changed.
pub fn apply_update(document: &mut Mapping, filter: &Mapping, update: &Mapping) -> StoreResult<bool> {
    if update.is_empty() {
        return Err(StoreError::InvalidQuery("update document is empty".to_string()));
    }

    let original = document.clone();
    let mut root = Value::Object(document.clone());

    for (operator, fields) in update {
        let fields = expect_mapping(fields, operator)?;
        for (path, argument) in fields {
            let path = resolve_positional(&original, filter, path)?;
            let segments = split_path(&path);
            match operator.as_str() {
                "$set" => set_in(&mut root, &segments, argument.clone())?,
                "$unset" => unset_in(&mut root, &segments),
                "$addToSet" => {
                    let items = each_items(argument);
                    let array = array_at(&mut root, &segments, &path)?;
                    for item in items {
                        if !array.iter().any(|existing| values_equal(existing, &item)) {
                            array.push(item);
                        }
                    }
                }
                "$push" => {
                    let items = each_items(argument);
                    array_at(&mut root, &segments, &path)?.extend(items);
                }
                "$pull" => {
                    if let Some(Value::Array(array)) = value_at_mut(&mut root, &segments) {
                        let mut kept = Vec::with_capacity(array.len());
                        for element in array.drain(..) {
                            if !element_matches(&element, argument)? {
                                kept.push(element);
                            }
                        }
                        *array = kept;
                    }
                }
                other => {
                    return Err(StoreError::InvalidQuery(format!(
                        "unsupported update operator `{other}`"
                    )));
                }
            }
        }
    }

    let Value::Object(updated) = root else {
        return Err(StoreError::InvalidDocument("update replaced the document root".to_string()));
    };
    let changed = updated != original;
    *document = updated;
    Ok(changed)
}

/// Replaces a `$` segment with the index of the element matched by `filter`.
fn resolve_positional(document: &Mapping, filter: &Mapping, path: &str) -> StoreResult<String> {
    let segments = split_path(path);
    let Some(position) = segments.iter().position(|segment| *segment == POSITIONAL) else {
        return Ok(path.to_string());
    };
    let array_path = segments[..position].join(".");
    let index = first_matching_index(document, filter, &array_path)?.ok_or_else(|| {
        StoreError::InvalidQuery(format!(
            "positional update `{path}` found no matching element in `{array_path}`"
        ))
    })?;
    let mut resolved = segments.iter().map(|segment| segment.to_string()).collect::<Vec<_>>();
    resolved[position] = index.to_string();
    Ok(resolved.join("."))
}

fn each_items(argument: &Value) -> Vec<Value> {
    match argument {
        Value::Object(map) if map.len() == 1 => match map.get("$each") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![argument.clone()],
        },
        _ => vec![argument.clone()],
    }
}

pub(crate) fn set_in(target: &mut Value, segments: &[&str], value: Value) -> StoreResult<()> {
    let Some((head, tail)) = segments.split_first() else {
        return Err(StoreError::InvalidQuery("empty update path".to_string()));
    };
    match target {
        Value::Object(map) => {
            if tail.is_empty() {
                map.insert(head.to_string(), value);
                return Ok(());
            }
            let next = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Mapping::new()));
            set_in(next, tail, value)
        }
        Value::Array(items) => {
            let index = head.parse::<usize>().map_err(|_| {
                StoreError::InvalidQuery(format!("`{head}` is not an array index"))
            })?;
            let required_len = index
                .checked_add(1)
                .filter(|len| *len <= items.len().saturating_add(MAX_INDEX_GAP))
                .ok_or_else(|| {
                    StoreError::InvalidQuery(format!(
                        "array index `{head}` is too far past the end of a {}-element array",
                        items.len()
                    ))
                })?;
            if items.len() < required_len {
                items.resize(required_len, Value::Null);
            }
            if tail.is_empty() {
                items[index] = value;
                return Ok(());
            }
            if items[index].is_null() {
                items[index] = Value::Object(Mapping::new());
            }
            set_in(&mut items[index], tail, value)
        }
        _ => Err(StoreError::InvalidQuery(format!(
            "cannot create field `{head}` inside a scalar value"
        ))),
    }
}

fn unset_in(target: &mut Value, segments: &[&str]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    match value_at_mut(target, parents) {
        Some(Value::Object(map)) => {
            map.remove(*last);
        }
        Some(Value::Array(items)) => {
            if let Some(slot) = last.parse::<usize>().ok().and_then(|index| items.get_mut(index)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

fn value_at_mut<'a>(target: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut cursor = target;
    for segment in segments {
        cursor = match cursor {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

/// Array at `segments`, created empty when the field is absent.
fn array_at<'a>(root: &'a mut Value, segments: &[&str], path: &str) -> StoreResult<&'a mut Vec<Value>> {
    if value_at_mut(root, segments).is_none() {
        set_in(root, segments, Value::Array(Vec::new()))?;
    }
    match value_at_mut(root, segments) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(StoreError::InvalidQuery(format!("field `{path}` is not an array"))),
    }
}
