//! History log actions recorded on class models.
//!
//! # Invariants
//! - The `action` tag set is closed; unknown tags are rejected.

use super::attribute::Attribute;
use super::object_id::ObjectId;
use crate::record::dispatch::discriminated_serde;
use crate::record::{Discriminated, FieldSpec, FieldType, Mapping, Record, RecordResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    CreateModel(CreateModelAction),
    AddAttribute(AddAttributeAction),
    RemoveAttribute(RemoveAttributeAction),
    SetAttribute(SetAttributeAction),
}

impl HistoryAction {
    pub const CREATE_MODEL: &'static str = "createModel";
    pub const ADD_ATTRIBUTE: &'static str = "addAttribute";
    pub const REMOVE_ATTRIBUTE: &'static str = "removeAttribute";
    pub const SET_ATTRIBUTE: &'static str = "setAttribute";

    pub fn user_id(&self) -> Option<ObjectId> {
        match self {
            Self::CreateModel(action) => action.user_id,
            Self::AddAttribute(action) => action.user_id,
            Self::RemoveAttribute(action) => action.user_id,
            Self::SetAttribute(action) => action.user_id,
        }
    }
}

impl Discriminated for HistoryAction {
    const FAMILY: &'static str = "HistoryAction";
    const DISCRIMINATOR: &'static str = "action";

    fn tag(&self) -> &str {
        match self {
            Self::CreateModel(_) => Self::CREATE_MODEL,
            Self::AddAttribute(_) => Self::ADD_ATTRIBUTE,
            Self::RemoveAttribute(_) => Self::REMOVE_ATTRIBUTE,
            Self::SetAttribute(_) => Self::SET_ATTRIBUTE,
        }
    }

    fn construct(tag: &str, mapping: &Mapping, fill_missing: bool) -> Option<RecordResult<Self>> {
        let action = match tag {
            Self::CREATE_MODEL => {
                CreateModelAction::from_mapping(mapping, fill_missing).map(Self::CreateModel)
            }
            Self::ADD_ATTRIBUTE => {
                AddAttributeAction::from_mapping(mapping, fill_missing).map(Self::AddAttribute)
            }
            Self::REMOVE_ATTRIBUTE => {
                RemoveAttributeAction::from_mapping(mapping, fill_missing).map(Self::RemoveAttribute)
            }
            Self::SET_ATTRIBUTE => {
                SetAttributeAction::from_mapping(mapping, fill_missing).map(Self::SetAttribute)
            }
            _ => return None,
        };
        Some(action)
    }

    fn variant_mapping(&self) -> RecordResult<Mapping> {
        match self {
            Self::CreateModel(action) => action.as_mapping(),
            Self::AddAttribute(action) => action.as_mapping(),
            Self::RemoveAttribute(action) => action.as_mapping(),
            Self::SetAttribute(action) => action.as_mapping(),
        }
    }
}

discriminated_serde!(HistoryAction);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelAction {
    pub timestamp: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<ObjectId>,
}

impl Record for CreateModelAction {
    const NAME: &'static str = "CreateModelAction";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("timestamp", FieldType::Text),
        FieldSpec::required("userId", FieldType::ObjectId),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddAttributeAction {
    pub timestamp: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<ObjectId>,
    pub item: Option<Attribute>,
}

impl Record for AddAttributeAction {
    const NAME: &'static str = "AddAttributeAction";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("timestamp", FieldType::Text),
        FieldSpec::required("userId", FieldType::ObjectId),
        FieldSpec::required("item", FieldType::Mapping),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveAttributeAction {
    pub timestamp: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<ObjectId>,
    pub item: Option<Attribute>,
    #[serde(rename = "itemId")]
    pub item_id: Option<ObjectId>,
}

impl Record for RemoveAttributeAction {
    const NAME: &'static str = "RemoveAttributeAction";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("timestamp", FieldType::Text),
        FieldSpec::required("userId", FieldType::ObjectId),
        FieldSpec::required("item", FieldType::Mapping),
        FieldSpec::required("itemId", FieldType::ObjectId),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAttributeAction {
    pub timestamp: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<ObjectId>,
    #[serde(rename = "oldItem")]
    pub old_item: Option<Attribute>,
    #[serde(rename = "newItem")]
    pub new_item: Option<Attribute>,
}

impl Record for SetAttributeAction {
    const NAME: &'static str = "SetAttributeAction";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("timestamp", FieldType::Text),
        FieldSpec::required("userId", FieldType::ObjectId),
        FieldSpec::required("oldItem", FieldType::Mapping),
        FieldSpec::required("newItem", FieldType::Mapping),
    ];
}
