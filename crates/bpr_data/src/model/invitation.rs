//! Workspace invitations.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

/// Pending invitation of an e-mail address into a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "inviterId")]
    pub inviter_id: Option<ObjectId>,
    #[serde(rename = "workspaceId")]
    pub workspace_id: Option<ObjectId>,
    #[serde(rename = "inviteeEmailAddress")]
    pub invitee_email_address: Option<String>,
}

impl Invitation {
    pub fn new(
        inviter_id: ObjectId,
        workspace_id: ObjectId,
        invitee_email_address: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            inviter_id: Some(inviter_id),
            workspace_id: Some(workspace_id),
            invitee_email_address: Some(invitee_email_address.into()),
        }
    }
}

impl Record for Invitation {
    const NAME: &'static str = "Invitation";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("inviterId", FieldType::ObjectId),
        FieldSpec::required("workspaceId", FieldType::ObjectId),
        FieldSpec::required("inviteeEmailAddress", FieldType::Text),
    ];
}

/// Invitation joined with display names for listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationGetModel {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "inviterId")]
    pub inviter_id: Option<ObjectId>,
    #[serde(rename = "workspaceId")]
    pub workspace_id: Option<ObjectId>,
    #[serde(rename = "inviteeEmailAddress")]
    pub invitee_email_address: Option<String>,
    #[serde(rename = "inviterUserName")]
    pub inviter_user_name: Option<String>,
    #[serde(rename = "workspaceName")]
    pub workspace_name: Option<String>,
}

impl Record for InvitationGetModel {
    const NAME: &'static str = "InvitationGetModel";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("inviterId", FieldType::ObjectId),
        FieldSpec::required("workspaceId", FieldType::ObjectId),
        FieldSpec::required("inviteeEmailAddress", FieldType::Text),
        FieldSpec::required("inviterUserName", FieldType::Text),
        FieldSpec::required("workspaceName", FieldType::Text),
    ];
}

impl_document!(Invitation, InvitationGetModel);
