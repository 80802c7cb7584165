//! Workspace document.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level container grouping users, teams and projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    /// Member entries, e.g. `{"userId": ..., "permissions": [...]}`.
    pub users: Option<Vec<Value>>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            users: Some(Vec::new()),
        }
    }
}

impl Record for Workspace {
    const NAME: &'static str = "Workspace";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("name", FieldType::Text),
        FieldSpec::required("users", FieldType::List),
    ];
}

impl_document!(Workspace);
