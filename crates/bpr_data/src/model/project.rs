//! Project document and its member references.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub title: Option<String>,
    #[serde(rename = "workspaceId")]
    pub workspace_id: Option<ObjectId>,
    pub users: Option<Vec<ProjectUser>>,
    pub teams: Option<Vec<ProjectTeam>>,
}

impl Project {
    pub fn new(title: impl Into<String>, workspace_id: ObjectId) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            workspace_id: Some(workspace_id),
            users: Some(Vec::new()),
            teams: Some(Vec::new()),
        }
    }
}

impl Record for Project {
    const NAME: &'static str = "Project";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("workspaceId", FieldType::ObjectId),
        FieldSpec::required("users", FieldType::List),
        FieldSpec::required("teams", FieldType::List),
    ];
}

impl_document!(Project);

/// A user's membership entry inside `Project::users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUser {
    #[serde(rename = "userId")]
    pub user_id: Option<ObjectId>,
    #[serde(rename = "isEditor")]
    pub is_editor: Option<bool>,
}

impl ProjectUser {
    pub fn new(user_id: ObjectId, is_editor: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_editor: Some(is_editor),
        }
    }
}

impl Record for ProjectUser {
    const NAME: &'static str = "ProjectUser";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("userId", FieldType::ObjectId),
        FieldSpec::required("isEditor", FieldType::Boolean),
    ];
}

/// A team's membership entry inside `Project::teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTeam {
    #[serde(rename = "teamId")]
    pub team_id: Option<ObjectId>,
    #[serde(rename = "isEditor")]
    pub is_editor: Option<bool>,
}

impl ProjectTeam {
    pub fn new(team_id: ObjectId, is_editor: bool) -> Self {
        Self {
            team_id: Some(team_id),
            is_editor: Some(is_editor),
        }
    }
}

impl Record for ProjectTeam {
    const NAME: &'static str = "ProjectTeam";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("teamId", FieldType::ObjectId),
        FieldSpec::required("isEditor", FieldType::Boolean),
    ];
}
