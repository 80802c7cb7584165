//! Aggregation pipeline execution.
//!
//! Supported stages: `$match`, `$lookup`, `$unwind`, `$sort`, `$skip`,
//! `$limit`. Stages run in order over the output of the previous stage.

use super::query::{matches, resolve, resolve_exact, sort_cmp, values_equal};
use super::update::set_in;
use super::{expect_mapping, split_path, StoreError, StoreResult};
use crate::record::Mapping;
use serde_json::Value;

/// Runs `pipeline` over `documents`.
///
/// `load_collection` supplies the documents of a foreign collection for
/// `$lookup`.
pub fn run_pipeline(
    documents: Vec<Mapping>,
    pipeline: &[Mapping],
    load_collection: &mut dyn FnMut(&str) -> StoreResult<Vec<Mapping>>,
) -> StoreResult<Vec<Mapping>> {
    let mut current = documents;
    for stage in pipeline {
        let mut entries = stage.iter();
        let (Some((name, spec)), None) = (entries.next(), entries.next()) else {
            return Err(StoreError::InvalidQuery(
                "each pipeline stage must hold exactly one operator".to_string(),
            ));
        };
        current = match name.as_str() {
            "$match" => match_stage(current, expect_mapping(spec, name)?)?,
            "$lookup" => lookup_stage(current, expect_mapping(spec, name)?, load_collection)?,
            "$unwind" => unwind_stage(current, spec)?,
            "$sort" => sort_stage(current, expect_mapping(spec, name)?)?,
            "$skip" => current.into_iter().skip(count_argument(spec, name)?).collect(),
            "$limit" => current.into_iter().take(count_argument(spec, name)?).collect(),
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported pipeline stage `{other}`"
                )));
            }
        };
    }
    Ok(current)
}

fn match_stage(documents: Vec<Mapping>, filter: &Mapping) -> StoreResult<Vec<Mapping>> {
    let mut kept = Vec::with_capacity(documents.len());
    for document in documents {
        if matches(&document, filter)? {
            kept.push(document);
        }
    }
    Ok(kept)
}

fn lookup_stage(
    documents: Vec<Mapping>,
    spec: &Mapping,
    load_collection: &mut dyn FnMut(&str) -> StoreResult<Vec<Mapping>>,
) -> StoreResult<Vec<Mapping>> {
    let from = string_argument(spec, "from")?;
    let local_field = string_argument(spec, "localField")?;
    let foreign_field = string_argument(spec, "foreignField")?;
    let target = string_argument(spec, "as")?;

    let foreign = load_collection(from)?;
    let mut joined_documents = Vec::with_capacity(documents.len());
    for document in documents {
        let local_keys = join_keys(&document, local_field);
        let joined = foreign
            .iter()
            .filter(|candidate| {
                join_keys(candidate, foreign_field)
                    .iter()
                    .any(|key| local_keys.iter().any(|local| values_equal(local, key)))
            })
            .cloned()
            .map(Value::Object)
            .collect::<Vec<_>>();

        let mut root = Value::Object(document);
        set_in(&mut root, &split_path(target), Value::Array(joined))?;
        if let Value::Object(document) = root {
            joined_documents.push(document);
        }
    }
    Ok(joined_documents)
}

/// Join keys of a document: array values contribute each element, and a
/// missing field joins as null.
fn join_keys(document: &Mapping, path: &str) -> Vec<Value> {
    let mut keys = Vec::new();
    for value in resolve(document, path) {
        match value {
            Value::Array(items) => keys.extend(items.iter().cloned()),
            other => keys.push(other.clone()),
        }
    }
    if keys.is_empty() {
        keys.push(Value::Null);
    }
    keys
}

fn unwind_stage(documents: Vec<Mapping>, spec: &Value) -> StoreResult<Vec<Mapping>> {
    let (path, preserve) = match spec {
        Value::String(path) => (path.as_str(), false),
        Value::Object(options) => (
            string_argument(options, "path")?,
            options
                .get("preserveNullAndEmptyArrays")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        ),
        _ => {
            return Err(StoreError::InvalidQuery(
                "`$unwind` expects a field path or options mapping".to_string(),
            ));
        }
    };
    let path = path.strip_prefix('$').ok_or_else(|| {
        StoreError::InvalidQuery(format!("`$unwind` path `{path}` must start with `$`"))
    })?;
    let segments = split_path(path);

    let mut unwound = Vec::new();
    for document in documents {
        match resolve_exact(&document, path) {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in items.clone() {
                    let mut root = Value::Object(document.clone());
                    set_in(&mut root, &segments, item)?;
                    if let Value::Object(row) = root {
                        unwound.push(row);
                    }
                }
            }
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if preserve {
                    unwound.push(document);
                }
            }
            Some(_) => unwound.push(document),
        }
    }
    Ok(unwound)
}

fn sort_stage(mut documents: Vec<Mapping>, spec: &Mapping) -> StoreResult<Vec<Mapping>> {
    let mut keys = Vec::with_capacity(spec.len());
    for (path, direction) in spec {
        let descending = match direction.as_i64() {
            Some(1) => false,
            Some(-1) => true,
            _ => {
                return Err(StoreError::InvalidQuery(format!(
                    "`$sort` direction for `{path}` must be 1 or -1"
                )));
            }
        };
        keys.push((path.as_str(), descending));
    }
    documents.sort_by(|left, right| {
        keys.iter()
            .map(|(path, descending)| {
                let ordering = sort_cmp(resolve_exact(left, path), resolve_exact(right, path));
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(documents)
}

fn string_argument<'a>(spec: &'a Mapping, key: &str) -> StoreResult<&'a str> {
    spec.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidQuery(format!("missing string argument `{key}`")))
}

fn count_argument(spec: &Value, stage: &str) -> StoreResult<usize> {
    spec.as_u64()
        .map(|count| count as usize)
        .ok_or_else(|| StoreError::InvalidQuery(format!("`{stage}` expects a non-negative integer")))
}
