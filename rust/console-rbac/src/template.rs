//! Address templates and the navigation context they are resolved against.
//!
//! Views declare the resources they need as templates such as
//! `{selected.profile}/subsystem=datasources/data-source={selected.entity}`.
//! A whole-segment placeholder resolves to a `type=name` tuple (and is
//! dropped when the navigation context has nothing selected for it, as in a
//! standalone server without profiles). A value placeholder resolves to an
//! instance name, or to [`WILDCARD`] when nothing is selected.

use crate::{AccessControlError, ResourceAddress, Segment, WILDCARD};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// The placeholder for the entity selected in a view's master list.
pub const SELECTED_ENTITY: &str = "selected.entity";

/// Source of placeholder values while resolving an [`AddressTemplate`].
pub trait StatementContext {
    /// Value for a placeholder used as a segment's instance name.
    fn resolve(&self, key: &str) -> Option<String>;

    /// `type=name` tuple for a placeholder used as a whole segment.
    fn resolve_tuple(&self, key: &str) -> Option<(String, String)>;
}

impl<S: StatementContext + ?Sized> StatementContext for &S {
    fn resolve(&self, key: &str) -> Option<String> {
        (**self).resolve(key)
    }

    fn resolve_tuple(&self, key: &str) -> Option<(String, String)> {
        (**self).resolve_tuple(key)
    }
}

/// Resolves [`SELECTED_ENTITY`] to a wildcard and defers everything else.
///
/// Security contexts are built per view rather than per selected entity,
/// so the selection must widen to "any instance".
#[derive(Debug, Clone)]
pub struct EntityWildcard<S>(pub S);

impl<S: StatementContext> StatementContext for EntityWildcard<S> {
    fn resolve(&self, key: &str) -> Option<String> {
        if key == SELECTED_ENTITY {
            Some(WILDCARD.to_string())
        } else {
            self.0.resolve(key)
        }
    }

    fn resolve_tuple(&self, key: &str) -> Option<(String, String)> {
        self.0.resolve_tuple(key)
    }
}

#[derive(Debug, Default)]
struct Selections {
    values: BTreeMap<String, String>,
    tuples: BTreeMap<String, (String, String)>,
}

/// What the operator currently has selected in the console.
///
/// Clones share the same selections, so the navigation layer can keep one
/// handle and update it while the context cache holds another.
#[derive(Debug, Clone, Default)]
pub struct NavigationContext {
    selections: Arc<RwLock<Selections>>,
}

impl NavigationContext {
    /// An empty navigation context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a value for a value placeholder, e.g. `selected.server`.
    pub fn select(&self, key: impl Into<String>, value: impl Into<String>) {
        self.selections
            .write()
            .values
            .insert(key.into(), value.into());
    }

    /// Select a `type=name` tuple for a segment placeholder, e.g.
    /// `selected.profile` → `profile=full`.
    pub fn select_tuple(
        &self,
        key: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) {
        self.selections
            .write()
            .tuples
            .insert(key.into(), (resource_type.into(), name.into()));
    }

    /// Forget any selection made for `key`.
    pub fn clear(&self, key: &str) {
        let mut selections = self.selections.write();
        selections.values.remove(key);
        selections.tuples.remove(key);
    }
}

impl StatementContext for NavigationContext {
    fn resolve(&self, key: &str) -> Option<String> {
        self.selections.read().values.get(key).cloned()
    }

    fn resolve_tuple(&self, key: &str) -> Option<(String, String)> {
        self.selections.read().tuples.get(key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Tuple(String),
    Literal { key: String, value: String },
    Placeholder { key: String, placeholder: String },
}

fn placeholder(text: &str) -> Option<&str> {
    text.strip_prefix('{')?.strip_suffix('}')
}

/// A resource address that may contain `{placeholder}` segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressTemplate {
    source: String,
    parts: Vec<Part>,
}

impl AddressTemplate {
    /// Expand the placeholders against `context`.
    pub fn resolve(
        &self,
        context: &impl StatementContext,
    ) -> Result<ResourceAddress, AccessControlError> {
        let mut segments = Vec::with_capacity(self.parts.len());

        for part in &self.parts {
            let segment = match part {
                Part::Tuple(key) => match context.resolve_tuple(key) {
                    Some((resource_type, name)) => Segment::new(resource_type, name),
                    None => {
                        tracing::debug!(template = %self, placeholder = %key, "Dropping unresolved segment");
                        continue;
                    }
                },
                Part::Literal { key, value } => Segment::new(key.as_str(), value.as_str()),
                Part::Placeholder { key, placeholder } => Segment::new(
                    key.as_str(),
                    context
                        .resolve(placeholder)
                        .unwrap_or_else(|| WILDCARD.to_string()),
                ),
            };

            if segment.key().is_empty() || segment.value().is_empty() {
                return Err(AccessControlError::InvalidAddress {
                    address: self.source.clone(),
                    reason: format!("placeholder resolved to an empty segment '{segment}'"),
                });
            }
            if [segment.key(), segment.value()]
                .iter()
                .any(|text| text.contains(['/', '=']))
            {
                return Err(AccessControlError::InvalidAddress {
                    address: self.source.clone(),
                    reason: format!("placeholder resolved to a malformed segment '{segment}'"),
                });
            }
            segments.push(segment);
        }

        Ok(ResourceAddress::from(segments))
    }
}

impl PartialEq for AddressTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for AddressTemplate {}

impl PartialOrd for AddressTemplate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AddressTemplate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.source.cmp(&other.source)
    }
}

impl std::hash::Hash for AddressTemplate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl FromStr for AddressTemplate {
    type Err = AccessControlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AccessControlError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let source = input.trim();
        if source.is_empty() {
            return Err(invalid("template is empty"));
        }

        let path = source.strip_prefix('/').unwrap_or(source);
        let mut parts = Vec::new();
        if !path.is_empty() {
            for text in path.split('/') {
                if text.is_empty() {
                    return Err(invalid("empty segment"));
                }
                if let Some(key) = placeholder(text) {
                    parts.push(Part::Tuple(key.to_string()));
                    continue;
                }
                let (key, value) = text
                    .split_once('=')
                    .ok_or_else(|| invalid("segment is not of the form type=name"))?;
                if key.is_empty() || value.is_empty() || placeholder(key).is_some() {
                    return Err(invalid("segment has an empty or placeholder type"));
                }
                parts.push(match placeholder(value) {
                    Some(name) => Part::Placeholder {
                        key: key.to_string(),
                        placeholder: name.to_string(),
                    },
                    None => Part::Literal {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                });
            }
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }
}

impl TryFrom<String> for AddressTemplate {
    type Error = AccessControlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AddressTemplate> for String {
    fn from(template: AddressTemplate) -> Self {
        template.source
    }
}

impl Display for AddressTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
