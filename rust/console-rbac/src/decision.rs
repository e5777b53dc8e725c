use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Answer to an authorization query.
///
/// `UnknownResource` is kept apart from `Denied` so callers can tell an
/// explicit denial from a resource whose metadata was never modeled; both
/// are fail-closed, see [`Decision::is_granted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// The operator holds the privilege.
    Granted,
    /// The operator does not hold the privilege.
    Denied,
    /// No constraints were recorded for the queried resource.
    UnknownResource,
}

impl Decision {
    /// Whether the action may proceed. Only [`Decision::Granted`] does.
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    pub(crate) fn from_flag(granted: bool) -> Self {
        if granted { Self::Granted } else { Self::Denied }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::UnknownResource => write!(f, "unknown resource"),
        }
    }
}

/// Something an operator may want to do with a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "privilege", content = "name")]
pub enum Privilege {
    /// See that the resource exists at all.
    Address,
    /// Read the resource.
    Read,
    /// Modify the resource.
    Write,
    /// Read one attribute.
    ReadAttribute(String),
    /// Modify one attribute.
    WriteAttribute(String),
    /// Execute one operation.
    Execute(String),
}

impl Privilege {
    /// Whether the privilege modifies state.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write | Self::WriteAttribute(_) | Self::Execute(_))
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::ReadAttribute(name) => write!(f, "read attribute '{name}'"),
            Self::WriteAttribute(name) => write!(f, "write attribute '{name}'"),
            Self::Execute(name) => write!(f, "execute operation '{name}'"),
        }
    }
}
