//! Fixed registry of logical collections.

use std::fmt::{Display, Formatter};

/// Logical partition of the store; the only accepted collection selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    ApplicationLog,
    Workspace,
    User,
    Team,
    Invitation,
    Project,
    Testing,
    Diagram,
    Model,
    ModelRepresentation,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Self::ApplicationLog,
        Self::Workspace,
        Self::User,
        Self::Team,
        Self::Invitation,
        Self::Project,
        Self::Testing,
        Self::Diagram,
        Self::Model,
        Self::ModelRepresentation,
    ];

    /// Collection name as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationLog => "application_log",
            Self::Workspace => "workspace",
            Self::User => "user",
            Self::Team => "team",
            Self::Invitation => "invitation",
            Self::Project => "project",
            Self::Testing => "testing",
            Self::Diagram => "diagram",
            Self::Model => "model",
            Self::ModelRepresentation => "model_representation",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
