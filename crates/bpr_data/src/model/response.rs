//! Plain response envelope shared with the service layer.

use crate::record::{FieldSpec, FieldType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub response: Option<String>,
}

impl ApiResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }
}

impl Record for ApiResponse {
    const NAME: &'static str = "ApiResponse";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::required("response", FieldType::Text)];
}
