//! Application log entries persisted to the `application_log` collection.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogItem {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    /// Local wall-clock time as formatted by the producer.
    pub timestamp: Option<String>,
    #[serde(rename = "utcTimestamp")]
    pub utc_timestamp: Option<String>,
    #[serde(rename = "logLevel")]
    pub log_level: Option<String>,
    pub note: Option<String>,
    pub content: Option<String>,
}

impl Record for LogItem {
    const NAME: &'static str = "LogItem";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("timestamp", FieldType::Text),
        FieldSpec::required("utcTimestamp", FieldType::Text),
        FieldSpec::required("logLevel", FieldType::Text),
        FieldSpec::required("note", FieldType::Text),
        FieldSpec::required("content", FieldType::Text),
    ];
}

impl_document!(LogItem);
