use std::path::Path;

use async_trait::async_trait;
use console_rbac::{DispatchError, Dispatcher, Operation};
use serde_json::Value;

/// A [`Dispatcher`] that answers with a composite response recorded from a
/// live backend.
///
/// The recording must come from the same request, since step results are
/// matched to resources by position.
pub struct ReplayDispatcher {
    response: Value,
}

impl ReplayDispatcher {
    /// Replay `response`.
    pub fn new(response: Value) -> Self {
        Self { response }
    }

    /// Replay the response stored in `path`.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(serde_json::from_str(&text)?))
    }
}

#[async_trait]
impl Dispatcher for ReplayDispatcher {
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError> {
        let recorded = self
            .response
            .get("result")
            .and_then(Value::as_object)
            .map_or(0, |result| result.len());
        if recorded != operation.steps().len() {
            tracing::warn!(
                requested = operation.steps().len(),
                recorded,
                "Recorded response does not match the request"
            );
        }
        Ok(self.response.clone())
    }
}
