//! Diagram document.

use super::impl_document;
use super::modeling::ModelRepresentation;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub title: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<ObjectId>,
    /// Slash-separated location inside the project tree.
    pub path: Option<String>,
    /// Placed model representations.
    pub models: Option<Vec<ModelRepresentation>>,
}

impl Diagram {
    pub fn new(title: impl Into<String>, project_id: ObjectId, path: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            project_id: Some(project_id),
            path: Some(path.into()),
            models: Some(Vec::new()),
        }
    }
}

impl Record for Diagram {
    const NAME: &'static str = "Diagram";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("projectId", FieldType::ObjectId),
        FieldSpec::required("path", FieldType::Text),
        FieldSpec::required("models", FieldType::List),
    ];
}

impl_document!(Diagram);
