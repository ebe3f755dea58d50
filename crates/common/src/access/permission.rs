use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How much a principal may do with a share.
///
/// Levels form a total order: `None < Read < Write < Owner`. Holding a level
/// implies every level below it, so every check reduces to one comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// No access at all.
    #[default]
    None,
    /// May list and download files.
    Read,
    /// May add and remove files.
    Write,
    /// Full control: metadata, grants, deletion, audit log.
    Owner,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::None => "none",
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Owner => "owner",
        }
    }

    /// Whether this level satisfies `required`.
    pub fn satisfies(&self, required: Requirement) -> bool {
        *self >= required.level()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The level stored on an access grant.
///
/// Only `read` and `write` are grantable. Ownership comes from the share
/// record itself, and `none` is the absence of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantLevel {
    Read,
    Write,
}

impl GrantLevel {
    /// The permission a holder of this grant resolves to.
    pub fn permission(&self) -> Permission {
        match self {
            GrantLevel::Read => Permission::Read,
            GrantLevel::Write => Permission::Write,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GrantLevel::Read => "read",
            GrantLevel::Write => "write",
        }
    }
}

impl fmt::Display for GrantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GrantLevel {
    type Err = InvalidPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(GrantLevel::Read),
            "write" => Ok(GrantLevel::Write),
            _ => Err(InvalidPermission(s.to_string())),
        }
    }
}

/// What an operation demands of the caller.
///
/// Parsed at the boundary so that an unknown level is rejected before any
/// authorization logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    Read,
    Write,
    Owner,
}

impl Requirement {
    /// The minimum permission that satisfies this requirement.
    ///
    /// `Owner` sits at the top of the order, so an owner requirement is met
    /// only by the owner themselves.
    pub fn level(&self) -> Permission {
        match self {
            Requirement::Read => Permission::Read,
            Requirement::Write => Permission::Write,
            Requirement::Owner => Permission::Owner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::Read => "read",
            Requirement::Write => "write",
            Requirement::Owner => "owner",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Requirement {
    type Err = InvalidPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Requirement::Read),
            "write" => Ok(Requirement::Write),
            "owner" => Ok(Requirement::Owner),
            _ => Err(InvalidPermission(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission level: {0}")]
pub struct InvalidPermission(pub String);
