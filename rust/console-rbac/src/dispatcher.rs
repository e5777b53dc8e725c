use crate::{ConditionalSync, DispatchError, Operation};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Executes management operations against the backend.
///
/// The transport and its serialization are the implementer's concern: a
/// dispatcher receives the [`Operation`] and hands back the backend's
/// response tree, or a [`DispatchError`] if the round trip could not be
/// completed. A response that reports `"outcome": "failed"` is still a
/// successful round trip.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Dispatcher: ConditionalSync {
    /// Perform one round trip.
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<D> Dispatcher for Arc<D>
where
    D: Dispatcher + ?Sized,
{
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError> {
        (**self).execute(operation).await
    }
}

/// A [MeasuredDispatcher] acts as a proxy over a [Dispatcher] that counts
/// round trips.
#[derive(Clone)]
pub struct MeasuredDispatcher<D>
where
    D: Dispatcher,
{
    round_trips: Arc<AtomicUsize>,
    dispatcher: D,
}

impl<D> MeasuredDispatcher<D>
where
    D: Dispatcher,
{
    /// Wrap the provided [Dispatcher] so its round trips may be counted.
    pub fn new(dispatcher: D) -> Self {
        Self {
            round_trips: Arc::new(AtomicUsize::default()),
            dispatcher,
        }
    }

    /// The aggregate number of round trips through the wrapped [Dispatcher]
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::Relaxed)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<D> Dispatcher for MeasuredDispatcher<D>
where
    D: Dispatcher,
{
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(steps = operation.steps().len(), "Dispatching composite operation");
        self.dispatcher.execute(operation).await
    }
}
