//! Class models, their relations and their placements on diagrams.

use super::attribute::Attribute;
use super::history::HistoryAction;
use super::impl_document;
use super::object_id::ObjectId;
use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

/// A class-like model with its change history, relations and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<ObjectId>,
    pub path: Option<String>,
    pub history: Option<Vec<HistoryAction>>,
    pub relations: Option<Vec<Relation>>,
    pub attributes: Option<Vec<Attribute>>,
}

impl Model {
    pub fn new(type_name: impl Into<String>, project_id: ObjectId, path: impl Into<String>) -> Self {
        Self {
            id: None,
            type_name: Some(type_name.into()),
            project_id: Some(project_id),
            path: Some(path.into()),
            history: Some(Vec::new()),
            relations: Some(Vec::new()),
            attributes: Some(Vec::new()),
        }
    }
}

impl Record for Model {
    const NAME: &'static str = "Model";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("type", FieldType::Text),
        FieldSpec::required("projectId", FieldType::ObjectId),
        FieldSpec::required("path", FieldType::Text),
        FieldSpec::required("history", FieldType::List),
        FieldSpec::required("relations", FieldType::List),
        FieldSpec::required("attributes", FieldType::List),
    ];
}

/// Placement and size of a model on one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRepresentation {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "modelId")]
    pub model_id: Option<ObjectId>,
    #[serde(rename = "diagramId")]
    pub diagram_id: Option<ObjectId>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
}

impl Record for ModelRepresentation {
    const NAME: &'static str = "ModelRepresentation";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("modelId", FieldType::ObjectId),
        FieldSpec::required("diagramId", FieldType::ObjectId),
        FieldSpec::required("x", FieldType::Float),
        FieldSpec::required("y", FieldType::Float),
        FieldSpec::required("w", FieldType::Float),
        FieldSpec::required("h", FieldType::Float),
    ];
}

/// A representation joined with the model it places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullModelRepresentation {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    #[serde(rename = "modelId")]
    pub model_id: Option<ObjectId>,
    #[serde(rename = "diagramId")]
    pub diagram_id: Option<ObjectId>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub model: Option<Model>,
}

impl Record for FullModelRepresentation {
    const NAME: &'static str = "FullModelRepresentation";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("modelId", FieldType::ObjectId),
        FieldSpec::required("diagramId", FieldType::ObjectId),
        FieldSpec::required("x", FieldType::Float),
        FieldSpec::required("y", FieldType::Float),
        FieldSpec::required("w", FieldType::Float),
        FieldSpec::required("h", FieldType::Float),
        FieldSpec::required("model", FieldType::Mapping),
    ];
}

/// Directed association from the owning model to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub target: Option<ObjectId>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(rename = "accessModifier")]
    pub access_modifier: Option<String>,
    #[serde(rename = "parentCardinality")]
    pub parent_cardinality: Option<String>,
    #[serde(rename = "childCardinality")]
    pub child_cardinality: Option<String>,
    #[serde(rename = "parentName")]
    pub parent_name: Option<String>,
    #[serde(rename = "childName")]
    pub child_name: Option<String>,
    pub name: Option<String>,
}

impl Record for Relation {
    const NAME: &'static str = "Relation";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("_id", FieldType::ObjectId),
        FieldSpec::required("target", FieldType::ObjectId),
        FieldSpec::required("type", FieldType::Text),
        FieldSpec::required("accessModifier", FieldType::Text),
        FieldSpec::required("parentCardinality", FieldType::Text),
        FieldSpec::required("childCardinality", FieldType::Text),
        FieldSpec::required("parentName", FieldType::Text),
        FieldSpec::required("childName", FieldType::Text),
        FieldSpec::required("name", FieldType::Text),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRepresentation {
    #[serde(rename = "relationId")]
    pub relation_id: Option<ObjectId>,
}

impl Record for RelationRepresentation {
    const NAME: &'static str = "RelationRepresentation";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::required("relationId", FieldType::ObjectId)];
}

impl_document!(Model, ModelRepresentation, FullModelRepresentation, Relation);
