//! Filter evaluation over JSON documents.
//!
//! # Responsibility
//! - Decide whether a document matches a filter written in the store's
//!   operator syntax.
//! - Locate the array element a filter matched, for positional updates.
//!
//! # Invariants
//! - A path traversing an array matches when any element matches.
//! - Numbers compare by value regardless of integer/float representation.
//! - Unknown operators are rejected instead of being treated as field names.

use super::{expect_mapping, split_path, StoreError, StoreResult};
use crate::model::object_id::{self, ObjectId};
use crate::record::Mapping;
use regex::RegexBuilder;
use serde_json::Value;
use std::cmp::Ordering;

/// Whether `document` satisfies every clause of `filter`.
pub fn matches(document: &Mapping, filter: &Mapping) -> StoreResult<bool> {
    for (key, condition) in filter {
        let satisfied = match key.as_str() {
            "$and" => all_clauses(document, logical_clauses(condition, key)?)?,
            "$or" => any_clause(document, logical_clauses(condition, key)?)?,
            "$nor" => !any_clause(document, logical_clauses(condition, key)?)?,
            operator if operator.starts_with('$') => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported top-level operator `{operator}`"
                )));
            }
            path => matches_condition(document, path, condition)?,
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Values reached by a dotted path, expanding arrays along the way.
pub fn resolve<'a>(document: &'a Mapping, path: &str) -> Vec<&'a Value> {
    let segments = split_path(path);
    let mut found = Vec::new();
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = document.get(*first) {
            collect_path(value, rest, &mut found);
        }
    }
    found
}

/// Value at a dotted path following mappings only.
pub fn resolve_exact<'a>(document: &'a Mapping, path: &str) -> Option<&'a Value> {
    let segments = split_path(path);
    let (first, rest) = segments.split_first()?;
    let mut cursor = document.get(*first)?;
    for segment in rest {
        cursor = cursor.as_object()?.get(*segment)?;
    }
    Some(cursor)
}

/// Index of the first element of the array at `array_path` matched by the
/// clauses of `filter` that address that array.
pub fn first_matching_index(
    document: &Mapping,
    filter: &Mapping,
    array_path: &str,
) -> StoreResult<Option<usize>> {
    let Some(Value::Array(items)) = resolve_exact(document, array_path) else {
        return Ok(None);
    };
    let nested_prefix = format!("{array_path}.");
    let clauses = filter
        .iter()
        .filter_map(|(key, condition)| {
            if key == array_path {
                Some(("", condition))
            } else {
                key.strip_prefix(nested_prefix.as_str())
                    .map(|rest| (rest, condition))
            }
        })
        .collect::<Vec<_>>();
    if clauses.is_empty() {
        return Ok(None);
    }

    for (index, item) in items.iter().enumerate() {
        let mut all = true;
        for (rest, condition) in &clauses {
            let satisfied = if rest.is_empty() {
                element_matches_condition(item, condition)?
            } else {
                match item {
                    Value::Object(map) => matches_condition(map, rest, condition)?,
                    _ => false,
                }
            };
            if !satisfied {
                all = false;
                break;
            }
        }
        if all {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Whether a single array element satisfies `condition`.
///
/// A plain mapping condition is a query on the element's fields; an operator
/// expression applies to the element itself; anything else is equality.
pub fn element_matches(element: &Value, condition: &Value) -> StoreResult<bool> {
    if is_operator_expression(condition) {
        let operators = expect_mapping(condition, "operator expression")?;
        return apply_operators(&[element], operators);
    }
    match (element, condition) {
        (Value::Object(map), Value::Object(query)) if !object_id::is_native(condition) => {
            matches(map, query)
        }
        _ => Ok(values_equal(element, condition)),
    }
}

fn element_matches_condition(element: &Value, condition: &Value) -> StoreResult<bool> {
    if is_operator_expression(condition) {
        let operators = expect_mapping(condition, "operator expression")?;
        if let Some(inner) = operators.get("$elemMatch") {
            return element_matches(element, inner);
        }
        return apply_operators(&[element], operators);
    }
    Ok(values_equal(element, condition))
}

fn collect_path<'a>(value: &'a Value, rest: &[&str], found: &mut Vec<&'a Value>) {
    let Some((head, tail)) = rest.split_first() else {
        found.push(value);
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                collect_path(next, tail, found);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    collect_path(item, tail, found);
                }
            }
            for item in items.iter().filter(|item| item.is_object()) {
                collect_path(item, rest, found);
            }
        }
        _ => {}
    }
}

fn logical_clauses<'a>(condition: &'a Value, operator: &str) -> StoreResult<Vec<&'a Mapping>> {
    let Value::Array(clauses) = condition else {
        return Err(StoreError::InvalidQuery(format!(
            "`{operator}` expects a list of filters"
        )));
    };
    clauses
        .iter()
        .map(|clause| expect_mapping(clause, operator))
        .collect()
}

fn all_clauses(document: &Mapping, clauses: Vec<&Mapping>) -> StoreResult<bool> {
    for clause in clauses {
        if !matches(document, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_clause(document: &Mapping, clauses: Vec<&Mapping>) -> StoreResult<bool> {
    for clause in clauses {
        if matches(document, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn matches_condition(document: &Mapping, path: &str, condition: &Value) -> StoreResult<bool> {
    let values = resolve(document, path);
    if is_operator_expression(condition) {
        let operators = expect_mapping(condition, path)?;
        return apply_operators(&values, operators);
    }
    Ok(equality_matches(&values, condition))
}

fn is_operator_expression(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            !map.is_empty()
                && map.keys().all(|key| key.starts_with('$'))
                && !object_id::is_native(value)
        }
        _ => false,
    }
}

fn apply_operators(values: &[&Value], operators: &Mapping) -> StoreResult<bool> {
    for (operator, argument) in operators {
        let satisfied = match operator.as_str() {
            "$eq" => equality_matches(values, argument),
            "$ne" => !equality_matches(values, argument),
            "$gt" => ordered_matches(values, argument, |ord| ord == Ordering::Greater),
            "$gte" => ordered_matches(values, argument, |ord| ord != Ordering::Less),
            "$lt" => ordered_matches(values, argument, |ord| ord == Ordering::Less),
            "$lte" => ordered_matches(values, argument, |ord| ord != Ordering::Greater),
            "$in" => in_list(values, argument, operator)?,
            "$nin" => !in_list(values, argument, operator)?,
            "$exists" => {
                let expected = argument.as_bool().ok_or_else(|| {
                    StoreError::InvalidQuery("`$exists` expects a boolean".to_string())
                })?;
                values.is_empty() != expected
            }
            "$elemMatch" => {
                let mut any = false;
                for value in values {
                    if let Value::Array(items) = value {
                        for item in items {
                            if element_matches(item, argument)? {
                                any = true;
                                break;
                            }
                        }
                    }
                    if any {
                        break;
                    }
                }
                any
            }
            "$size" => {
                let expected = argument.as_u64().ok_or_else(|| {
                    StoreError::InvalidQuery("`$size` expects a non-negative integer".to_string())
                })?;
                values
                    .iter()
                    .any(|value| matches!(value, Value::Array(items) if items.len() as u64 == expected))
            }
            "$regex" => regex_matches(values, argument, operators.get("$options"))?,
            "$options" => true,
            "$not" => {
                let inner = expect_mapping(argument, "`$not`")?;
                !apply_operators(values, inner)?
            }
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported operator `{other}`"
                )));
            }
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality against resolved values; arrays match when they contain `target`.
/// A null target also matches a missing field.
fn equality_matches(values: &[&Value], target: &Value) -> bool {
    if values.is_empty() {
        return target.is_null();
    }
    values.iter().any(|value| {
        values_equal(value, target)
            || matches!(value, Value::Array(items) if items.iter().any(|item| values_equal(item, target)))
    })
}

fn ordered_matches(values: &[&Value], target: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    values.iter().any(|value| {
        let direct = compare_values(value, target).is_some_and(&accept);
        direct
            || matches!(value, Value::Array(items)
                if items.iter().any(|item| compare_values(item, target).is_some_and(&accept)))
    })
}

fn in_list(values: &[&Value], argument: &Value, operator: &str) -> StoreResult<bool> {
    let Value::Array(candidates) = argument else {
        return Err(StoreError::InvalidQuery(format!("`{operator}` expects a list")));
    };
    Ok(candidates
        .iter()
        .any(|candidate| equality_matches(values, candidate)))
}

fn regex_matches(values: &[&Value], pattern: &Value, options: Option<&Value>) -> StoreResult<bool> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| StoreError::InvalidQuery("`$regex` expects a string".to_string()))?;
    let options = options.and_then(Value::as_str).unwrap_or("");
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .build()
        .map_err(|err| StoreError::InvalidQuery(format!("invalid `$regex`: {err}")))?;

    let is_match = |value: &Value| value.as_str().is_some_and(|text| regex.is_match(text));
    Ok(values.iter().any(|value| {
        is_match(value) || matches!(value, Value::Array(items) if items.iter().any(is_match))
    }))
}

/// Structural equality with numeric normalization.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Ordering between values of the same comparable kind.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => match (object_id::from_value(left), object_id::from_value(right)) {
            (Some(a), Some(b)) => Some(a.bytes().cmp(&b.bytes())),
            _ => None,
        },
    }
}

/// Total order used for sorting: missing/null, numbers, strings, identifiers,
/// other mappings, lists, booleans. Values of one rank compare by content
/// where a content order exists and are otherwise equal.
pub(crate) fn sort_cmp(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(value @ Value::Object(_)) if object_id::is_native(value) => 3,
            Some(Value::Object(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Bool(_)) => 6,
        }
    }
    match rank(left).cmp(&rank(right)) {
        Ordering::Equal => match (left, right) {
            (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        unequal => unequal,
    }
}

#[cfg(test)]
mod tests {
    use super::{first_matching_index, matches, resolve, sort_cmp};
    use std::cmp::Ordering;
    use crate::model::object_id::{self, ObjectId};
    use crate::record::Mapping;
    use serde_json::{json, Value};

    fn mapping(value: Value) -> Mapping {
        value.as_object().cloned().expect("fixture must be a mapping")
    }

    #[test]
    fn equality_matches_scalars_and_array_members() {
        let doc = mapping(json!({ "name": "Acme", "tags": ["a", "b"], "n": 1 }));
        assert!(matches(&doc, &mapping(json!({ "name": "Acme" }))).unwrap());
        assert!(matches(&doc, &mapping(json!({ "tags": "b" }))).unwrap());
        assert!(matches(&doc, &mapping(json!({ "n": 1.0 }))).unwrap());
        assert!(!matches(&doc, &mapping(json!({ "name": "Other" }))).unwrap());
    }

    #[test]
    fn null_matches_missing_fields() {
        let doc = mapping(json!({ "name": "Acme" }));
        assert!(matches(&doc, &mapping(json!({ "missing": null }))).unwrap());
        assert!(!matches(&doc, &mapping(json!({ "missing": { "$exists": true } }))).unwrap());
    }

    #[test]
    fn dotted_paths_traverse_arrays_of_documents() {
        let doc = mapping(json!({ "users": [{ "userId": "u1" }, { "userId": "u2" }] }));
        assert_eq!(resolve(&doc, "users.userId").len(), 2);
        assert!(matches(&doc, &mapping(json!({ "users.userId": "u2" }))).unwrap());
    }

    #[test]
    fn elem_match_and_comparisons() {
        let doc = mapping(json!({ "users": [{ "id": 1, "editor": true }, { "id": 2, "editor": false }] }));
        let filter = mapping(json!({ "users": { "$elemMatch": { "id": 2, "editor": false } } }));
        assert!(matches(&doc, &filter).unwrap());
        let filter = mapping(json!({ "users": { "$elemMatch": { "id": { "$gt": 2 } } } }));
        assert!(!matches(&doc, &filter).unwrap());
    }

    #[test]
    fn identifiers_compare_as_values_not_operators() {
        let id = ObjectId::new();
        let doc = mapping(json!({ "_id": object_id::to_value(&id) }));
        let filter = mapping(json!({ "_id": object_id::to_value(&id) }));
        assert!(matches(&doc, &filter).unwrap());
    }

    #[test]
    fn logical_and_regex_operators() {
        let doc = mapping(json!({ "name": "Acme Corp", "size": 10 }));
        let filter = mapping(json!({
            "$or": [{ "size": { "$lt": 5 } }, { "name": { "$regex": "^acme", "$options": "i" } }]
        }));
        assert!(matches(&doc, &filter).unwrap());
        let filter = mapping(json!({ "$nor": [{ "size": 10 }] }));
        assert!(!matches(&doc, &filter).unwrap());
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let doc = mapping(json!({ "a": 1 }));
        assert!(matches(&doc, &mapping(json!({ "a": { "$near": 1 } }))).is_err());
        assert!(matches(&doc, &mapping(json!({ "$where": "1" }))).is_err());
    }

    #[test]
    fn first_matching_index_uses_nested_clauses() {
        let doc = mapping(json!({ "items": [{ "id": "1" }, { "id": "2" }, { "id": "2" }] }));
        let filter = mapping(json!({ "items.id": "2" }));
        assert_eq!(first_matching_index(&doc, &filter, "items").unwrap(), Some(1));
        let filter = mapping(json!({ "other": 1 }));
        assert_eq!(first_matching_index(&doc, &filter, "items").unwrap(), None);
    }

    #[test]
    fn sort_order_places_identifiers_before_other_mappings() {
        let low = object_id::to_value(&ObjectId::parse_str("000000000000000000000001").unwrap());
        let high = object_id::to_value(&ObjectId::parse_str("ffffffffffffffffffffffff").unwrap());
        let plain = json!({ "a": 1 });

        assert_eq!(sort_cmp(Some(&low), Some(&high)), Ordering::Less);
        assert_eq!(sort_cmp(Some(&high), Some(&plain)), Ordering::Less);
        assert_eq!(sort_cmp(Some(&low), Some(&plain)), Ordering::Less);
        assert_eq!(sort_cmp(Some(&plain), Some(&json!({ "b": 2 }))), Ordering::Equal);

        let mut values = vec![plain.clone(), high.clone(), json!("text"), low.clone(), Value::Null];
        values.sort_by(|a, b| sort_cmp(Some(a), Some(b)));
        assert_eq!(values, vec![Value::Null, json!("text"), low, high, plain]);
    }
}
