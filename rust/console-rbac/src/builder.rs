//! Builds a [`SecurityContext`] from a single composite description request.

use crate::metadata::{
    FAILED, FAILURE_DESCRIPTION, OUTCOME, RESULT, StepPayload, child_descriptions, defined,
    description, parse_access_control, step_payload,
};
use crate::{
    AccessControlError, Clock, Diagnostic, Dispatcher, Facet, MetadataError, Operation,
    ResourceAddress, SecurityContext, Settings, Step, SystemClock, WILDCARD,
};
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};
use web_time::Instant;

/// What to build a context for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    /// The view identifier.
    pub id: String,
    /// Concrete or wildcard addresses the view touches.
    pub required_resources: BTreeSet<ResourceAddress>,
    /// The facet the view operates in.
    pub facet: Facet,
    /// Whether child resources are described and modeled as well.
    pub recursive: bool,
}

impl ContextRequest {
    /// A non-recursive, administrable request.
    pub fn new(
        id: impl Into<String>,
        required_resources: impl IntoIterator<Item = ResourceAddress>,
    ) -> Self {
        Self {
            id: id.into(),
            required_resources: required_resources.into_iter().collect(),
            facet: Facet::default(),
            recursive: false,
        }
    }

    /// Use the given facet.
    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facet = facet;
        self
    }

    /// Describe child resources as well.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Turns a [`ContextRequest`] into a sealed [`SecurityContext`] with exactly
/// one round trip through the [`Dispatcher`].
pub struct ContextBuilder<D, C = SystemClock>
where
    D: Dispatcher,
    C: Clock,
{
    dispatcher: D,
    settings: Settings,
    clock: C,
}

impl<D> ContextBuilder<D>
where
    D: Dispatcher,
{
    /// A builder with default [`Settings`] and the system clock.
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            settings: Settings::default(),
            clock: SystemClock,
        }
    }
}

impl<D, C> ContextBuilder<D, C>
where
    D: Dispatcher,
    C: Clock,
{
    /// Replace the request settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the time source of context timestamps.
    pub fn with_clock<T>(self, clock: T) -> ContextBuilder<D, T>
    where
        T: Clock,
    {
        ContextBuilder {
            dispatcher: self.dispatcher,
            settings: self.settings,
            clock,
        }
    }

    /// The wrapped dispatcher.
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// The request settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The composite operation that describes every required resource of
    /// `request`, one step per resource.
    pub fn operation(&self, request: &ContextRequest) -> Operation {
        Operation::composite(
            request
                .required_resources
                .iter()
                .map(|address| Step::describe(address.clone(), &self.settings, request.recursive))
                .collect(),
        )
    }

    /// Build and seal the context for `request`.
    ///
    /// A transport failure, a failed composite outcome or malformed
    /// metadata abort the build; no partial context is returned. Resources
    /// without usable metadata are recorded as [`Diagnostic`]s and answer
    /// [`crate::Decision::UnknownResource`].
    pub async fn build(&self, request: ContextRequest) -> Result<SecurityContext, AccessControlError> {
        let started = Instant::now();
        let mut context = SecurityContext::new(
            request.id.clone(),
            request.facet,
            request.required_resources.clone(),
            self.clock.now(),
        );

        if request.required_resources.is_empty() {
            tracing::debug!(id = %request.id, "No resources required");
            context.seal()?;
            return Ok(context);
        }

        let operation = self.operation(&request);
        let response = self
            .dispatcher
            .execute(&operation)
            .await
            .map_err(|error| AccessControlError::Transport {
                id: request.id.clone(),
                error,
            })?;

        if response.get(OUTCOME).and_then(Value::as_str) == Some(FAILED) {
            let description = match defined(response.get(FAILURE_DESCRIPTION)) {
                Some(Value::String(description)) => description.clone(),
                Some(description) => description.to_string(),
                None => "unknown failure".to_string(),
            };
            return Err(AccessControlError::Protocol {
                id: request.id,
                description,
            });
        }

        let parse = |error: MetadataError| AccessControlError::Parse {
            id: request.id.clone(),
            error,
        };

        let result = defined(response.get(RESULT))
            .and_then(Value::as_object)
            .ok_or(MetadataError::MissingResult)
            .map_err(parse)?;

        let mut walk = Walk::new(&request.required_resources);
        for (step, address) in operation.step_table() {
            let Some(step_result) = defined(result.get(&step)) else {
                tracing::warn!(id = %request.id, %step, %address, "No result for step");
                context.record(Diagnostic::MissingStep {
                    step,
                    address: address.clone(),
                })?;
                continue;
            };

            match step_payload(address, step_result).map_err(parse)? {
                StepPayload::Node(node) => walk.push(address.clone(), description(node)),
                StepPayload::Empty => {
                    tracing::warn!(id = %request.id, %address, "No instances found");
                    context.record(Diagnostic::EmptyExpansion {
                        address: address.clone(),
                    })?;
                }
                StepPayload::Missing => {
                    tracing::warn!(id = %request.id, %address, "Access-control meta data missing");
                    context.record(Diagnostic::MissingMetadata {
                        address: address.clone(),
                    })?;
                }
            }
        }

        for address in walk.run(&mut context)? {
            context.require(address)?;
        }
        context.seal()?;

        tracing::info!(
            id = %request.id,
            steps = operation.steps().len(),
            resources = context.resources().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Context created"
        );

        Ok(context)
    }
}

/// Worklist over description nodes. Every address enters the list at most
/// once, so discovery terminates on any finite response.
struct Walk<'a> {
    visited: BTreeSet<ResourceAddress>,
    pending: VecDeque<(ResourceAddress, &'a Value)>,
}

impl<'a> Walk<'a> {
    fn new(required: &BTreeSet<ResourceAddress>) -> Self {
        Self {
            visited: required.clone(),
            pending: VecDeque::new(),
        }
    }

    fn push(&mut self, address: ResourceAddress, description: &'a Value) {
        self.pending.push_back((address, description));
    }

    /// Parse every pending description into `context`, following child
    /// descriptions. Returns the discovered child addresses in discovery
    /// order.
    fn run(mut self, context: &mut SecurityContext) -> Result<Vec<ResourceAddress>, AccessControlError> {
        let id = context.id().to_string();
        let parse = |error: MetadataError| AccessControlError::Parse {
            id: id.clone(),
            error,
        };
        let mut discovered = Vec::new();

        while let Some((address, node)) = self.pending.pop_front() {
            match parse_access_control(&address, node).map_err(parse)? {
                Some(constraints) => context.update_constraints(address.clone(), constraints)?,
                None => {
                    tracing::warn!(%id, %address, "Access-control meta data missing");
                    context.record(Diagnostic::MissingMetadata {
                        address: address.clone(),
                    })?;
                }
            }

            for (child_type, child) in child_descriptions(&address, node).map_err(parse)? {
                let child_address = address.child(child_type, WILDCARD);
                if self.visited.insert(child_address.clone()) {
                    tracing::debug!(%id, address = %child_address, "Discovered child resource");
                    discovered.push(child_address.clone());
                    self.pending.push_back((child_address, description(child)));
                }
            }
        }

        Ok(discovered)
    }
}
