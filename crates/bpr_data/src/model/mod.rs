//! Domain record shapes persisted through the repository.
//!
//! # Responsibility
//! - Declare the data-only documents stored per collection.
//! - Declare the closed attribute and history-action families.
//!
//! # Invariants
//! - Top-level documents carry `_id` as `Option<ObjectId>`; it is `None` only
//!   before the store assigns one.
//! - Data fields are nullable so fill-missing conversion can always succeed.
//! - Wire names follow the stored camelCase keys.

pub mod attribute;
pub mod diagram;
pub mod history;
pub mod invitation;
pub mod log_item;
pub mod modeling;
pub mod object_id;
pub mod permission;
pub mod project;
pub mod response;
pub mod team;
pub mod user;
pub mod workspace;

/// Implements `Document` for records whose identifier lives in `id`.
macro_rules! impl_document {
    ($($record:ty),+ $(,)?) => {
        $(
            impl $crate::record::Document for $record {
                fn id(&self) -> Option<$crate::model::object_id::ObjectId> {
                    self.id
                }
            }
        )+
    };
}

pub(crate) use impl_document;
