use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The behavioral mode a view operates in.
///
/// The facet decides which resource-level flag pair answers read and write
/// queries: administration views consult the configuration flags,
/// read-only monitoring views consult the runtime flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Facet {
    /// Runtime monitoring.
    #[serde(alias = "runtime")]
    ReadOnly,
    /// Full administration of the configuration model.
    #[default]
    #[serde(alias = "configuration")]
    Administrable,
}

impl Display for Facet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Administrable => write!(f, "administrable"),
        }
    }
}
