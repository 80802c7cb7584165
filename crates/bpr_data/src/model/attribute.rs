//! Attribute family attached to class models.
//!
//! # Responsibility
//! - Resolve stored attribute mappings into their concrete shape by `kind`.
//!
//! # Invariants
//! - `field` and `method` map to their dedicated shapes.
//! - Every other `kind` falls back to `Property`, which keeps the raw tag.

use super::object_id::ObjectId;
use crate::record::dispatch::discriminated_serde;
use crate::record::{Discriminated, FieldSpec, FieldType, Mapping, Record, RecordResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A member or property of a class model.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Field(Field),
    Method(Method),
    /// Catch-all for any other `kind`.
    Property(Property),
}

impl Attribute {
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Self::Field(field) => field.id,
            Self::Method(method) => method.id,
            Self::Property(property) => property.id,
        }
    }
}

impl Discriminated for Attribute {
    const FAMILY: &'static str = "Attribute";
    const DISCRIMINATOR: &'static str = "kind";

    fn tag(&self) -> &str {
        match self {
            Self::Field(_) => Field::KIND,
            Self::Method(_) => Method::KIND,
            Self::Property(property) => property.kind.as_deref().unwrap_or(""),
        }
    }

    fn construct(tag: &str, mapping: &Mapping, fill_missing: bool) -> Option<RecordResult<Self>> {
        let attribute = match tag {
            Field::KIND => Field::from_mapping(mapping, fill_missing).map(Self::Field),
            Method::KIND => Method::from_mapping(mapping, fill_missing).map(Self::Method),
            _ => Property::from_mapping(mapping, fill_missing).map(Self::Property),
        };
        Some(attribute)
    }

    fn variant_mapping(&self) -> RecordResult<Mapping> {
        match self {
            Self::Field(field) => field.as_mapping(),
            Self::Method(method) => method.as_mapping(),
            Self::Property(property) => property.as_mapping(),
        }
    }
}

discriminated_serde!(Attribute);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(rename = "accessModifier")]
    pub access_modifier: Option<String>,
}

impl Field {
    pub const KIND: &'static str = "field";
}

impl Record for Field {
    const NAME: &'static str = "Field";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("name", FieldType::Text),
        FieldSpec::required("type", FieldType::Text),
        FieldSpec::required("accessModifier", FieldType::Text),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    /// Return type.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(rename = "accessModifier")]
    pub access_modifier: Option<String>,
    pub parameters: Option<Vec<MethodParameter>>,
}

impl Method {
    pub const KIND: &'static str = "method";
}

impl Record for Method {
    const NAME: &'static str = "Method";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("name", FieldType::Text),
        FieldSpec::required("type", FieldType::Text),
        FieldSpec::required("accessModifier", FieldType::Text),
        FieldSpec::required("parameters", FieldType::List),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

impl Record for MethodParameter {
    const NAME: &'static str = "MethodParameter";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", FieldType::Text),
        FieldSpec::required("type", FieldType::Text),
    ];
}

/// Generic key/value property; its `kind` is whatever tag the store held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub value: Value,
    pub kind: Option<String>,
}

impl Record for Property {
    const NAME: &'static str = "Property";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("value", FieldType::Any),
        FieldSpec::required("kind", FieldType::Text),
    ];
}
