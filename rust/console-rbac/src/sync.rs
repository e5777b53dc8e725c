//! Cross-target bounds for the collaborator traits.
//!
//! The console runs natively and on `wasm32-unknown-unknown`. On native
//! targets collaborators may be shared across threads and must be
//! `Send + Sync`; in the browser there is only one thread and the bounds
//! disappear.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSync for S {}
