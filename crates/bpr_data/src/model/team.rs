//! Team document.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "teamName")]
    pub team_name: Option<String>,
    #[serde(rename = "workspaceId")]
    pub workspace_id: Option<ObjectId>,
    pub users: Option<Vec<Value>>,
}

impl Team {
    pub fn new(team_name: impl Into<String>, workspace_id: ObjectId) -> Self {
        Self {
            id: None,
            team_name: Some(team_name.into()),
            workspace_id: Some(workspace_id),
            users: Some(Vec::new()),
        }
    }
}

impl Record for Team {
    const NAME: &'static str = "Team";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("teamName", FieldType::Text),
        FieldSpec::required("workspaceId", FieldType::ObjectId),
        FieldSpec::required("users", FieldType::List),
    ];
}

impl_document!(Team);
