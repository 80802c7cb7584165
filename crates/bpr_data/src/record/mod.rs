//! Serializable record contract.
//!
//! # Responsibility
//! - Convert typed records to and from generic key-value mappings and JSON text.
//! - Describe each record's declared fields through an explicit schema.
//!
//! # Invariants
//! - Unknown keys in an input mapping are dropped, never an error.
//! - A required field missing from the input is an error unless fill-missing
//!   mode is requested, in which case every absent field becomes null.
//! - Textual values of identifier-typed fields are parsed into `ObjectId`
//!   before deserialization; malformed text is reported, not passed through.

use crate::model::object_id::{self, ObjectId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dispatch;
pub mod document;

pub use dispatch::Discriminated;
pub use document::{Document, ID_FIELD};

/// Generic key-ordered mapping records convert to and from.
pub type Mapping = serde_json::Map<String, Value>;

pub type RecordResult<T> = Result<T, RecordError>;

/// Errors raised by record conversion and variant dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field is absent and fill-missing was not requested.
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    /// Input is neither a mapping nor JSON text, or does not fit the record shape.
    TypeConversion {
        record: &'static str,
        message: String,
    },
    /// An identifier-typed field holds text that is not a valid identifier.
    InvalidIdentifier {
        record: &'static str,
        field: &'static str,
        value: String,
    },
    /// Dispatch input lacks the family's discriminator key.
    MissingDiscriminator {
        family: &'static str,
        discriminator: &'static str,
    },
    /// Discriminator value matches no variant and the family has no catch-all.
    UnknownVariant { family: &'static str, value: String },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { record, field } => {
                write!(f, "{record}: missing required field `{field}`")
            }
            Self::TypeConversion { record, message } => {
                write!(f, "{record}: cannot convert input: {message}")
            }
            Self::InvalidIdentifier {
                record,
                field,
                value,
            } => write!(f, "{record}: field `{field}` has invalid identifier `{value}`"),
            Self::MissingDiscriminator {
                family,
                discriminator,
            } => write!(f, "{family}: missing discriminator `{discriminator}`"),
            Self::UnknownVariant { family, value } => {
                write!(f, "{family}: unknown variant `{value}`")
            }
        }
    }
}

impl Error for RecordError {}

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Store-native identifier; text input is coerced.
    ObjectId,
    Text,
    Integer,
    Float,
    Boolean,
    List,
    Mapping,
    /// Untyped JSON value.
    Any,
}

/// One entry of a record's schema descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    /// `false` when the field has a default and may be absent from input.
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// Bidirectional conversion between a typed record and mapping/JSON forms.
///
/// Implementors derive serde and list their fields in `FIELDS`; every
/// conversion routine is provided.
pub trait Record: Serialize + DeserializeOwned + Sized {
    /// Record name used in error reports.
    const NAME: &'static str;
    /// Declared fields in wire order.
    const FIELDS: &'static [FieldSpec];

    fn fields() -> &'static [FieldSpec] {
        Self::FIELDS
    }

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }

    fn has_field(name: &str) -> bool {
        Self::field(name).is_some()
    }

    /// Projects every declared field into a mapping.
    fn as_mapping(&self) -> RecordResult<Mapping> {
        match serde_json::to_value(self).map_err(|err| conversion_error::<Self>(err))? {
            Value::Object(mapping) => Ok(mapping),
            other => Err(RecordError::TypeConversion {
                record: Self::NAME,
                message: format!("serialized to {} instead of a mapping", kind_of(&other)),
            }),
        }
    }

    /// Serializes to JSON text; identifiers render as plain hex strings.
    fn as_text(&self) -> RecordResult<String> {
        let plain = to_plain_json(Value::Object(self.as_mapping()?));
        serde_json::to_string(&plain).map_err(|err| conversion_error::<Self>(err))
    }

    /// Builds a record from a mapping, ignoring undeclared keys.
    fn from_mapping(mapping: &Mapping, fill_missing: bool) -> RecordResult<Self> {
        let prepared = prepare_mapping(Self::NAME, Self::FIELDS, mapping, fill_missing)?;
        serde_json::from_value(Value::Object(prepared)).map_err(|err| conversion_error::<Self>(err))
    }

    /// Builds a record from a JSON object or a JSON string holding one.
    fn from_value(value: Value, fill_missing: bool) -> RecordResult<Self> {
        let mapping = into_mapping(Self::NAME, value)?;
        Self::from_mapping(&mapping, fill_missing)
    }

    fn from_text(text: &str) -> RecordResult<Self> {
        let mapping = parse_mapping(Self::NAME, text)?;
        Self::from_mapping(&mapping, false)
    }

    fn as_mapping_list(items: &[Self]) -> RecordResult<Vec<Mapping>> {
        items.iter().map(Record::as_mapping).collect()
    }

    fn as_text_list(items: &[Self]) -> RecordResult<String> {
        let values = Self::as_mapping_list(items)?
            .into_iter()
            .map(|mapping| to_plain_json(Value::Object(mapping)))
            .collect::<Vec<_>>();
        serde_json::to_string(&values).map_err(|err| conversion_error::<Self>(err))
    }

    fn from_mapping_list(mappings: &[Mapping]) -> RecordResult<Vec<Self>> {
        mappings
            .iter()
            .map(|mapping| Self::from_mapping(mapping, false))
            .collect()
    }

    fn from_text_list(text: &str) -> RecordResult<Vec<Self>> {
        let parsed: Value = serde_json::from_str(text).map_err(|err| conversion_error::<Self>(err))?;
        let Value::Array(items) = parsed else {
            return Err(RecordError::TypeConversion {
                record: Self::NAME,
                message: format!("expected a JSON list, got {}", kind_of(&parsed)),
            });
        };
        items
            .into_iter()
            .map(|item| {
                let mapping = into_mapping(Self::NAME, item)?;
                Self::from_mapping(&mapping, false)
            })
            .collect()
    }
}

/// Filters, null-fills and coerces `mapping` against a schema descriptor.
pub(crate) fn prepare_mapping(
    record: &'static str,
    fields: &'static [FieldSpec],
    mapping: &Mapping,
    fill_missing: bool,
) -> RecordResult<Mapping> {
    let mut prepared = Mapping::new();
    for spec in fields {
        match mapping.get(spec.name) {
            Some(value) => {
                let value = match (spec.ty, value) {
                    (FieldType::ObjectId, Value::String(text)) => coerce_identifier(record, spec, text)?,
                    _ => value.clone(),
                };
                prepared.insert(spec.name.to_string(), value);
            }
            None if fill_missing => {
                prepared.insert(spec.name.to_string(), Value::Null);
            }
            None if spec.required => {
                return Err(RecordError::MissingField {
                    record,
                    field: spec.name,
                });
            }
            None => {}
        }
    }
    Ok(prepared)
}

fn coerce_identifier(record: &'static str, spec: &FieldSpec, text: &str) -> RecordResult<Value> {
    ObjectId::parse_str(text)
        .map(|id| object_id::to_value(&id))
        .map_err(|_| RecordError::InvalidIdentifier {
            record,
            field: spec.name,
            value: text.to_string(),
        })
}

/// Accepts a JSON object, or a JSON string whose content parses to an object.
pub(crate) fn into_mapping(record: &'static str, value: Value) -> RecordResult<Mapping> {
    match value {
        Value::Object(mapping) => Ok(mapping),
        Value::String(text) => parse_mapping(record, &text),
        other => Err(RecordError::TypeConversion {
            record,
            message: format!("expected a mapping or JSON text, got {}", kind_of(&other)),
        }),
    }
}

pub(crate) fn parse_mapping(record: &'static str, text: &str) -> RecordResult<Mapping> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mapping)) => Ok(mapping),
        Ok(other) => Err(RecordError::TypeConversion {
            record,
            message: format!("JSON text holds {}, not a mapping", kind_of(&other)),
        }),
        Err(err) => Err(RecordError::TypeConversion {
            record,
            message: err.to_string(),
        }),
    }
}

/// Replaces extended-JSON identifiers with their hex text, recursively.
pub fn to_plain_json(value: Value) -> Value {
    if let Some(id) = object_id::from_value(&value) {
        return Value::String(id.to_hex());
    }
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(to_plain_json).collect()),
        Value::Object(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (key, to_plain_json(value)))
                .collect(),
        ),
        other => other,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn conversion_error<R: Record>(err: serde_json::Error) -> RecordError {
    RecordError::TypeConversion {
        record: R::NAME,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{to_plain_json, FieldSpec, FieldType, Record, RecordError};
    use crate::model::object_id::{self, ObjectId};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(rename = "ownerId")]
        owner_id: Option<ObjectId>,
        label: Option<String>,
        #[serde(default)]
        note: Option<String>,
    }

    impl Record for Sample {
        const NAME: &'static str = "Sample";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::required("ownerId", FieldType::ObjectId),
            FieldSpec::required("label", FieldType::Text),
            FieldSpec::optional("note", FieldType::Text),
        ];
    }

    #[test]
    fn optional_fields_may_be_absent_without_fill() {
        let mapping = json!({ "ownerId": null, "label": "x" });
        let sample = Sample::from_value(mapping, false).unwrap();
        assert_eq!(sample.note, None);
    }

    #[test]
    fn malformed_identifier_text_is_reported() {
        let err = Sample::from_value(json!({ "ownerId": "not-an-id", "label": "x" }), false)
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidIdentifier {
                record: "Sample",
                field: "ownerId",
                value: "not-an-id".to_string(),
            }
        );
    }

    #[test]
    fn non_mapping_input_is_a_type_conversion_error() {
        let err = Sample::from_value(json!(42), false).unwrap_err();
        assert!(matches!(err, RecordError::TypeConversion { .. }));

        let err = Sample::from_value(json!("[1, 2]"), false).unwrap_err();
        assert!(matches!(err, RecordError::TypeConversion { .. }));
    }

    #[test]
    fn shape_mismatch_is_a_type_conversion_error() {
        let err = Sample::from_value(json!({ "ownerId": null, "label": 7 }), false).unwrap_err();
        assert!(matches!(err, RecordError::TypeConversion { record: "Sample", .. }));
    }

    #[test]
    fn plain_json_flattens_nested_identifiers() {
        let id = ObjectId::new();
        let value = json!({ "a": [object_id::to_value(&id)], "b": { "c": object_id::to_value(&id) } });
        assert_eq!(
            to_plain_json(value),
            json!({ "a": [id.to_hex()], "b": { "c": id.to_hex() } })
        );
    }

    #[test]
    fn introspection_lists_declared_fields() {
        assert!(Sample::has_field("ownerId"));
        assert!(!Sample::has_field("owner_id"));
        assert_eq!(Sample::field("label").map(|spec| spec.ty), Some(FieldType::Text));
        assert_eq!(Sample::fields().len(), 3);
    }
}
