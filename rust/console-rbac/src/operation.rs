//! The composite request sent to the management backend.

use crate::{ResourceAddress, Settings};
use serde::Serialize;

/// Name of the composite operation.
pub const COMPOSITE: &str = "composite";

/// Name of the per-resource description operation.
pub const READ_RESOURCE_DESCRIPTION: &str = "read-resource-description";

const TRIM_DESCRIPTIONS: &str = "trim-descriptions";
const COMBINED_DESCRIPTIONS: &str = "combined-descriptions";

/// One `read-resource-description` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    operation: &'static str,
    address: ResourceAddress,
    operations: bool,
    access_control: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recursive_depth: Option<u32>,
}

impl Step {
    /// Describe `address`, its operations and its access control; with
    /// `recursive` set, child descriptions are requested as well.
    pub fn describe(address: ResourceAddress, settings: &Settings, recursive: bool) -> Self {
        Self {
            operation: READ_RESOURCE_DESCRIPTION,
            address,
            operations: true,
            access_control: if settings.trim_descriptions {
                TRIM_DESCRIPTIONS
            } else {
                COMBINED_DESCRIPTIONS
            },
            recursive_depth: recursive.then_some(settings.recursive_depth),
        }
    }

    /// The described resource.
    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }

    /// Requested depth of child descriptions, if any.
    pub fn recursive_depth(&self) -> Option<u32> {
        self.recursive_depth
    }
}

/// A composite management operation: an ordered list of steps executed
/// atomically by the backend and answered with one keyed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    operation: &'static str,
    address: ResourceAddress,
    steps: Vec<Step>,
}

impl Operation {
    /// Bundle `steps` into one composite operation.
    pub fn composite(steps: Vec<Step>) -> Self {
        Self {
            operation: COMPOSITE,
            address: ResourceAddress::root(),
            steps,
        }
    }

    /// The steps, in request order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Key of the `index`-th step's result in the composite response.
    pub fn step_key(index: usize) -> String {
        format!("step-{}", index + 1)
    }

    /// Step keys paired with the resource each step describes. Composite
    /// responses are keyed by step, not by address, so this is how results
    /// are traced back to resources.
    pub fn step_table(&self) -> Vec<(String, &ResourceAddress)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| (Self::step_key(index), step.address()))
            .collect()
    }
}
