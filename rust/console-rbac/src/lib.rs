#![warn(missing_docs)]

//! Access-control resolution for management console views.
//!
//! Each console view declares the management resources it touches. Before
//! the view is shown, the engine fetches the operator's authorization
//! metadata for all of them in a single composite round trip, turns the
//! metadata into per-resource [Constraints] and seals them into a
//! [SecurityContext]. The view then asks fast, synchronous questions of
//! the context: may this resource be seen, read or written, may this
//! attribute be edited, may this operation be executed.
//!
//! ```rust
//! # async fn example(dispatcher: impl console_rbac::Dispatcher) -> Result<(), console_rbac::AccessControlError> {
//! use console_rbac::{ContextBuilder, ContextRequest, ResourceAddress};
//!
//! let logging: ResourceAddress = "subsystem=logging".parse()?;
//! let context = ContextBuilder::new(dispatcher)
//!     .build(ContextRequest::new("logging-view", [logging.clone()]))
//!     .await?;
//!
//! if context.can_write(&logging).is_granted() {
//!     // enable the edit button
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Contexts are normally obtained through a [ContextCache], which resolves
//! a view's [AddressTemplate]s through a [ResourceRegistry] and the current
//! navigation selections, and shares one build between concurrent callers.

mod sync;
pub use sync::*;

mod error;
pub use error::*;

mod address;
pub use address::*;

mod template;
pub use template::*;

mod facet;
pub use facet::*;

mod decision;
pub use decision::*;

mod constraints;
pub use constraints::*;

mod context;
pub use context::*;

mod settings;
pub use settings::*;

mod operation;
pub use operation::*;

mod dispatcher;
pub use dispatcher::*;

mod registry;
pub use registry::*;

mod clock;
pub use clock::*;

pub mod metadata;

mod builder;
pub use builder::*;

mod cache;
pub use cache::*;

mod gate;
pub use gate::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
