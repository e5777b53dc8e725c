use thiserror::Error;

/// Errors that can occur while resolving access control for a view.
///
/// The type is [`Clone`] so that a single failed build can be reported to
/// every caller that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum AccessControlError {
    /// A resource address or address template could not be parsed.
    #[error("Invalid resource address '{address}': {reason}")]
    InvalidAddress {
        /// The offending input.
        address: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The dispatcher could not complete the round trip.
    #[error("Failed to create security context for {id}: {error}")]
    Transport {
        /// The view the context was built for.
        id: String,
        /// The underlying dispatcher failure.
        #[source]
        error: DispatchError,
    },

    /// The backend reported a failure for the composite operation.
    #[error("Failed to retrieve access control meta data for {id}: {description}")]
    Protocol {
        /// The view the context was built for.
        id: String,
        /// The backend's failure description.
        description: String,
    },

    /// The access control meta data had an unexpected shape.
    #[error("Failed to parse access control meta data for {id}: {error}")]
    Parse {
        /// The view the context was built for.
        id: String,
        /// What was malformed, and where.
        #[source]
        error: MetadataError,
    },

    /// A mutation was attempted on a sealed security context.
    #[error("Security context '{id}' is sealed")]
    Sealed {
        /// The view the context belongs to.
        id: String,
    },

    /// A context was requested that has not been created yet.
    #[error("Security context should have been created upfront: {id}")]
    MissingContext {
        /// The view that was requested.
        id: String,
    },
}

/// Malformed access control meta data, reported against the resource
/// address whose description was being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The composite response carried no `result` object.
    #[error("Composite response has no result")]
    MissingResult,

    /// A node had a different JSON type than the protocol prescribes.
    #[error("Unexpected shape at {address} ({path}): expected {expected}")]
    UnexpectedShape {
        /// Resource whose description was being parsed.
        address: String,
        /// Location of the node inside the description.
        path: String,
        /// The JSON type that was expected.
        expected: &'static str,
    },

    /// A permission flag that must always be present was missing.
    #[error("Missing flag '{flag}' at {address} ({path})")]
    MissingFlag {
        /// Resource whose description was being parsed.
        address: String,
        /// Location of the permission set inside the description.
        path: String,
        /// The flag that was expected.
        flag: &'static str,
    },

    /// A child resource advertised an empty `model-description`.
    #[error("Child {child} of {address} has an empty model description")]
    EmptyModelDescription {
        /// Parent resource.
        address: String,
        /// Child resource type.
        child: String,
    },
}

/// Failure reported by a [`crate::Dispatcher`] when the request could not
/// be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Dispatch failed: {0}")]
pub struct DispatchError(pub String);

impl DispatchError {
    /// Create a dispatch error from any displayable reason.
    pub fn new(reason: impl std::fmt::Display) -> Self {
        Self(reason.to_string())
    }
}
