//! Workspace permission flags.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspacePermission {
    ManageTeams,
    ManagePermissions,
    ManageWorkspace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl Display for UnknownPermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown workspace permission `{}`", self.0)
    }
}

impl Error for UnknownPermission {}

impl WorkspacePermission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageTeams => "MANAGE_TEAMS",
            Self::ManagePermissions => "MANAGE_PERMISSIONS",
            Self::ManageWorkspace => "MANAGE_WORKSPACE",
        }
    }

    /// Converts stored permission strings, failing on the first unknown value.
    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>, UnknownPermission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|value| value.as_ref().parse())
            .collect()
    }
}

impl FromStr for WorkspacePermission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MANAGE_TEAMS" => Ok(Self::ManageTeams),
            "MANAGE_PERMISSIONS" => Ok(Self::ManagePermissions),
            "MANAGE_WORKSPACE" => Ok(Self::ManageWorkspace),
            other => Err(UnknownPermission(other.to_string())),
        }
    }
}

impl Display for WorkspacePermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
