use crate::{AddressTemplate, ConditionalSync, Facet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Knows which resources each console view touches.
pub trait ResourceRegistry: ConditionalSync {
    /// Address templates of the resources the view needs.
    fn resources(&self, id: &str) -> BTreeSet<AddressTemplate>;

    /// Whether child resources of the view's resources should be described
    /// as well.
    fn is_recursive(&self, id: &str) -> bool;

    /// The facet the view operates in.
    fn facet(&self, id: &str) -> Facet;
}

impl<R> ResourceRegistry for Arc<R>
where
    R: ResourceRegistry + ?Sized,
{
    fn resources(&self, id: &str) -> BTreeSet<AddressTemplate> {
        (**self).resources(id)
    }

    fn is_recursive(&self, id: &str) -> bool {
        (**self).is_recursive(id)
    }

    fn facet(&self, id: &str) -> Facet {
        (**self).facet(id)
    }
}

/// Registry entry for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewResources {
    /// Address templates of the resources the view needs.
    pub resources: BTreeSet<AddressTemplate>,
    /// Whether child resources are discovered as well.
    pub recursive: bool,
    /// The facet the view operates in.
    pub facet: Facet,
}

/// A [`ResourceRegistry`] backed by a fixed table, typically loaded from
/// JSON:
///
/// ```json
/// { "views": { "logging-view": { "resources": ["subsystem=logging"] } } }
/// ```
///
/// Unknown views need no resources, are not recursive and are
/// administrable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRegistry {
    views: HashMap<String, ViewResources>,
}

impl StaticRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, view: ViewResources) -> &mut Self {
        self.views.insert(id.into(), view);
        self
    }

    /// The entry for a view, if registered.
    pub fn view(&self, id: &str) -> Option<&ViewResources> {
        self.views.get(id)
    }

    /// Identifiers of all registered views.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }
}

impl ResourceRegistry for StaticRegistry {
    fn resources(&self, id: &str) -> BTreeSet<AddressTemplate> {
        self.view(id)
            .map(|view| view.resources.clone())
            .unwrap_or_default()
    }

    fn is_recursive(&self, id: &str) -> bool {
        self.view(id).is_some_and(|view| view.recursive)
    }

    fn facet(&self, id: &str) -> Facet {
        self.view(id).map(|view| view.facet).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_loads_views_from_json() -> TestResult {
        let registry: StaticRegistry = serde_json::from_str(
            r#"{
                "views": {
                    "logging-view": { "resources": ["subsystem=logging"] },
                    "datasources": {
                        "resources": [
                            "{selected.profile}/subsystem=datasources/data-source={selected.entity}",
                            "{selected.profile}/subsystem=datasources/xa-data-source={selected.entity}"
                        ],
                        "recursive": true,
                        "facet": "runtime"
                    }
                }
            }"#,
        )?;

        assert_eq!(registry.resources("logging-view").len(), 1);
        assert!(!registry.is_recursive("logging-view"));
        assert_eq!(registry.facet("logging-view"), Facet::Administrable);

        assert_eq!(registry.resources("datasources").len(), 2);
        assert!(registry.is_recursive("datasources"));
        assert_eq!(registry.facet("datasources"), Facet::ReadOnly);

        assert!(registry.resources("unknown").is_empty());
        assert!(!registry.is_recursive("unknown"));
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_templates() {
        let result = serde_json::from_str::<StaticRegistry>(
            r#"{ "views": { "broken": { "resources": ["subsystem"] } } }"#,
        );
        assert!(result.is_err());
    }
}
