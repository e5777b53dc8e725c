//! Test doubles and response fixtures.

use crate::{DispatchError, Dispatcher, Operation};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

/// A [`Dispatcher`] that answers every operation with the same canned
/// response and remembers the operations it saw.
pub struct ScriptedDispatcher {
    response: Result<Value, DispatchError>,
    received: Mutex<Vec<Operation>>,
}

impl ScriptedDispatcher {
    /// Answer with `response`.
    pub fn new(response: Value) -> Self {
        Self {
            response: Ok(response),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Fail every round trip with `reason`.
    pub fn failing(reason: impl std::fmt::Display) -> Self {
        Self {
            response: Err(DispatchError::new(reason)),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Every operation executed so far.
    pub fn received(&self) -> Vec<Operation> {
        self.received.lock().clone()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Dispatcher for ScriptedDispatcher {
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError> {
        self.received.lock().push(operation.clone());
        self.response.clone()
    }
}

/// An access-control section whose default grants `read` and `write`.
pub fn access_control(read: bool, write: bool) -> Value {
    json!({ "default": { "read": read, "write": write } })
}

/// A resource description carrying `access_control`.
pub fn describe(access_control: Value) -> Value {
    json!({
        "description": "A management resource",
        "access-control": access_control,
        "operations": {}
    })
}

/// A successful step result.
pub fn step_success(result: Value) -> Value {
    json!({ "outcome": "success", "result": result })
}

/// One entry of a wildcard expansion.
pub fn instance(address: Value, result: Value) -> Value {
    json!({ "address": address, "outcome": "success", "result": result })
}

/// The result of a wildcard step.
pub fn expansion(instances: Vec<Value>) -> Value {
    Value::Array(instances)
}

/// A successful composite response with the given step results, keyed
/// `step-1`, `step-2`, ...
pub fn composite_success(steps: Vec<Value>) -> Value {
    let result: Map<String, Value> = steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| (Operation::step_key(index), step))
        .collect();
    json!({ "outcome": "success", "result": result })
}

/// A failed composite response.
pub fn composite_failure(description: &str) -> Value {
    json!({
        "outcome": "failed",
        "failure-description": description,
        "rolled-back": true
    })
}
