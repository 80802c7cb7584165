//! Store-native document identifier.
//!
//! # Invariants
//! - Inside mappings the identifier is kept in extended-JSON form
//!   (`{"$oid": <hex>}`) so it stays distinguishable from ordinary strings.
//! - Plain hex strings are never read as identifiers here; textual coercion
//!   is an explicit step of record conversion.

use serde_json::{Map, Value};

pub use bson::oid::{Error as ObjectIdParseError, ObjectId};

/// Key used by the extended-JSON identifier form.
pub const OID_KEY: &str = "$oid";

/// Extended-JSON form of `id`.
pub fn to_value(id: &ObjectId) -> Value {
    let mut map = Map::new();
    map.insert(OID_KEY.to_string(), Value::String(id.to_hex()));
    Value::Object(map)
}

/// Identifier stored in extended-JSON form, if `value` is one.
pub fn from_value(value: &Value) -> Option<ObjectId> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(OID_KEY)
        .and_then(Value::as_str)
        .and_then(|text| ObjectId::parse_str(text).ok())
}

pub fn is_native(value: &Value) -> bool {
    from_value(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::{from_value, is_native, to_value, ObjectId};
    use serde_json::json;

    #[test]
    fn serde_form_matches_extended_json_helpers() {
        let id = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, json!({ "$oid": "64b7f0c2a1b2c3d4e5f60718" }));
        assert_eq!(value, to_value(&id));

        let decoded: ObjectId = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn from_value_only_accepts_extended_form() {
        let id = ObjectId::new();
        assert_eq!(from_value(&to_value(&id)), Some(id));
        assert_eq!(from_value(&json!(id.to_hex())), None);
        assert!(!is_native(&json!({ "$oid": id.to_hex(), "extra": 1 })));
        assert!(!is_native(&json!({ "$oid": "not-hex" })));
    }
}
