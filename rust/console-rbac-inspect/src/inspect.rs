use std::path::Path;

use console_rbac::{
    ContextBuilder, ContextCache, Decision, Dispatcher, NavigationContext, Privilege,
    ResourceAddress, Settings, StaticRegistry,
};

use crate::{InspectCli, ReplayDispatcher};

/// Resolves views the way the console does, against recorded responses
/// instead of a live backend.
pub struct Inspector {
    registry: StaticRegistry,
    navigation: NavigationContext,
    settings: Settings,
}

impl Inspector {
    /// An inspector over `registry` with nothing selected.
    pub fn new(registry: StaticRegistry, settings: Settings) -> Self {
        Self {
            registry,
            navigation: NavigationContext::new(),
            settings,
        }
    }

    /// Load the registry, settings and selections named on the command line.
    pub async fn load(cli: &InspectCli) -> anyhow::Result<Self> {
        let registry = read_json(&cli.registry).await?;
        let settings = match &cli.settings {
            Some(path) => read_json(path).await?,
            None => Settings::default(),
        };

        let inspector = Self::new(registry, settings);
        for selection in &cli.selections {
            selection.apply(inspector.navigation());
        }
        Ok(inspector)
    }

    /// The selections templates are resolved against.
    pub fn navigation(&self) -> &NavigationContext {
        &self.navigation
    }

    fn known(&self, view: &str) -> anyhow::Result<()> {
        if self.registry.view(view).is_none() {
            let mut ids: Vec<_> = self.registry.ids().collect();
            ids.sort_unstable();
            anyhow::bail!("Unknown view '{view}', registered views: {}", ids.join(", "));
        }
        Ok(())
    }

    fn cache<D>(&self, dispatcher: D) -> ContextCache<D, StaticRegistry, NavigationContext>
    where
        D: Dispatcher,
    {
        ContextCache::new(
            ContextBuilder::new(dispatcher).with_settings(self.settings.clone()),
            self.registry.clone(),
            self.navigation.clone(),
        )
    }

    /// The composite request view `view` would send, as pretty JSON.
    pub fn request(&self, view: &str) -> anyhow::Result<String> {
        self.known(view)?;
        let cache = self.cache(ReplayDispatcher::new(serde_json::Value::Null));
        let operation = cache.builder().operation(&cache.request(view)?);
        Ok(serde_json::to_string_pretty(&operation)?)
    }

    /// Build the context of `view` from `dispatcher` and render it.
    pub async fn dump<D>(&self, view: &str, dispatcher: D) -> anyhow::Result<String>
    where
        D: Dispatcher,
    {
        self.known(view)?;
        let context = self.cache(dispatcher).get_or_create(view).await?;
        Ok(context.dump().to_string())
    }

    /// Build the context of `view` from `dispatcher` and decide one
    /// privilege.
    pub async fn check<D>(
        &self,
        view: &str,
        dispatcher: D,
        address: &ResourceAddress,
        privilege: &Privilege,
    ) -> anyhow::Result<Decision>
    where
        D: Dispatcher,
    {
        self.known(view)?;
        let context = self.cache(dispatcher).get_or_create(view).await?;
        Ok(context.check(address, privilege))
    }
}

async fn read_json<T>(path: &Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    fn inspector() -> TestResult<Inspector> {
        let registry = serde_json::from_value(json!({
            "views": {
                "logging-view": { "resources": ["subsystem=logging"], "recursive": true },
                "datasources": {
                    "resources": ["{selected.profile}/subsystem=datasources/data-source={selected.entity}"]
                }
            }
        }))?;
        Ok(Inspector::new(registry, Settings::default()))
    }

    fn recorded() -> ReplayDispatcher {
        ReplayDispatcher::new(json!({
            "outcome": "success",
            "result": {
                "step-1": {
                    "outcome": "success",
                    "result": {
                        "access-control": {
                            "default": {
                                "read": true,
                                "write": false,
                                "attributes": { "level": { "read": true, "write": false } },
                                "operations": { "add": { "execute": false } }
                            }
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn it_prints_the_request() -> TestResult {
        let inspector = inspector()?;
        inspector
            .navigation()
            .select_tuple("selected.profile", "profile", "full");

        let request: serde_json::Value = serde_json::from_str(&inspector.request("datasources")?)?;

        assert_eq!(
            request["steps"][0]["address"],
            json!([{"profile": "full"}, {"subsystem": "datasources"}, {"data-source": "*"}])
        );
        assert_eq!(request["steps"][0].get("recursive-depth"), None);

        let request: serde_json::Value = serde_json::from_str(&inspector.request("logging-view")?)?;
        assert_eq!(request["steps"][0]["recursive-depth"], json!(2));
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_views() -> TestResult {
        let error = inspector()?.request("deployments").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unknown view 'deployments', registered views: datasources, logging-view"
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_dumps_a_recorded_context() -> TestResult {
        let dump = inspector()?.dump("logging-view", recorded()).await?;

        assert_eq!(
            dump,
            "Required resources for: logging-view (administrable)\n\
             \x20 - subsystem=logging\n\
             Constraints\n\
             \x20 subsystem=logging\n\
             \x20   address: true\n\
             \x20   read-config: true\n\
             \x20   write-config: false\n\
             \x20   read-runtime: true\n\
             \x20   write-runtime: false\n\
             \x20   Attributes\n\
             \x20     level: read=true write=false\n\
             \x20   Operations\n\
             \x20     add: exec=false\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_checks_a_privilege() -> TestResult {
        let inspector = inspector()?;
        let logging: ResourceAddress = "subsystem=logging".parse()?;

        assert_eq!(
            inspector
                .check("logging-view", recorded(), &logging, &Privilege::Read)
                .await?,
            Decision::Granted
        );
        assert_eq!(
            inspector
                .check(
                    "logging-view",
                    recorded(),
                    &logging,
                    &Privilege::WriteAttribute("level".into())
                )
                .await?,
            Decision::Denied
        );
        Ok(())
    }
}
