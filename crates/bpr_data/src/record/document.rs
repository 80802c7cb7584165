//! Records persisted as top-level store documents.

use super::Record;
use crate::model::object_id::ObjectId;

/// Name of the exclusive identifier field.
pub const ID_FIELD: &str = "_id";

/// A record carrying the store-assigned identifier in `_id`.
pub trait Document: Record {
    /// `None` until the store has assigned an identifier.
    fn id(&self) -> Option<ObjectId>;
}
