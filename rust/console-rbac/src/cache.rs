use crate::{
    AccessControlError, Clock, ConditionalSync, ContextBuilder, ContextRequest, Dispatcher,
    EntityWildcard, ResourceAddress, ResourceRegistry, SecurityContext, StatementContext,
    SystemClock,
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<SecurityContext>>>;

/// Security contexts by view id.
///
/// Contexts are built on first use and kept until they are invalidated;
/// nothing expires on its own. Concurrent requests for the same id share a
/// single in-flight build, and a failed build leaves nothing behind, so the
/// next request tries again.
pub struct ContextCache<D, R, S, C = SystemClock>
where
    D: Dispatcher,
    R: ResourceRegistry,
    S: StatementContext + ConditionalSync,
    C: Clock,
{
    builder: ContextBuilder<D, C>,
    registry: R,
    statements: S,
    contexts: Mutex<HashMap<String, Slot>>,
}

impl<D, R, S, C> ContextCache<D, R, S, C>
where
    D: Dispatcher,
    R: ResourceRegistry,
    S: StatementContext + ConditionalSync,
    C: Clock,
{
    /// Resolve view resources from `registry` against `statements` and
    /// build contexts with `builder`.
    pub fn new(builder: ContextBuilder<D, C>, registry: R, statements: S) -> Self {
        Self {
            builder,
            registry,
            statements,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// The context builder.
    pub fn builder(&self) -> &ContextBuilder<D, C> {
        &self.builder
    }

    /// The cached context for `id`, building it first if necessary.
    pub async fn get_or_create(&self, id: &str) -> Result<Arc<SecurityContext>, AccessControlError> {
        let slot = self.contexts.lock().entry(id.to_string()).or_default().clone();

        if let Some(context) = slot.get() {
            tracing::debug!(%id, "Security context cache hit");
            return Ok(context.clone());
        }

        // A failed build leaves the cell empty, so a waiter or the next
        // caller runs its own build into the same slot.
        slot.get_or_try_init(|| self.create(id)).await.cloned()
    }

    /// Drop the context for `id`; the next [`Self::get_or_create`] rebuilds it.
    pub fn invalidate(&self, id: &str) {
        if self.contexts.lock().remove(id).is_some() {
            tracing::debug!(%id, "Security context invalidated");
        }
    }

    /// Whether a built context for `id` is cached.
    pub fn has_context(&self, id: &str) -> bool {
        self.contexts
            .lock()
            .get(id)
            .is_some_and(|slot| slot.initialized())
    }

    /// The cached context for `id`, if it has been built.
    pub fn get(&self, id: &str) -> Option<Arc<SecurityContext>> {
        self.contexts
            .lock()
            .get(id)
            .and_then(|slot| slot.get().cloned())
    }

    /// The cached context for `id`, which must have been created upfront.
    pub fn security_context(&self, id: &str) -> Result<Arc<SecurityContext>, AccessControlError> {
        self.get(id).ok_or_else(|| AccessControlError::MissingContext { id: id.to_string() })
    }

    /// The concrete or wildcard addresses view `id` requires, with the
    /// selected entity widened to any instance.
    pub fn required_resources(&self, id: &str) -> Result<BTreeSet<ResourceAddress>, AccessControlError> {
        let statements = EntityWildcard(&self.statements);
        self.registry
            .resources(id)
            .iter()
            .map(|template| template.resolve(&statements))
            .collect()
    }

    /// The build request for view `id` under the current selections.
    pub fn request(&self, id: &str) -> Result<ContextRequest, AccessControlError> {
        Ok(ContextRequest {
            id: id.to_string(),
            required_resources: self.required_resources(id)?,
            facet: self.registry.facet(id),
            recursive: self.registry.is_recursive(id),
        })
    }

    async fn create(&self, id: &str) -> Result<Arc<SecurityContext>, AccessControlError> {
        tracing::debug!(%id, "Creating security context");
        let request = self.request(id)?;
        Ok(Arc::new(self.builder.build(request).await?))
    }
}
