//! User document.

use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Identity-provider subject the account was created from.
    #[serde(rename = "firebaseId")]
    pub firebase_id: Option<String>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        firebase_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            email: Some(email.into()),
            firebase_id: Some(firebase_id.into()),
        }
    }
}

impl Record for User {
    const NAME: &'static str = "User";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("name", FieldType::Text),
        FieldSpec::required("email", FieldType::Text),
        FieldSpec::required("firebaseId", FieldType::Text),
    ];
}

impl_document!(User);
